// 错误类型模块
// 核心错误分类：区分"不存在"与真正的失败，存储错误永不吞掉

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// 核心错误分类
#[derive(Debug, Error)]
pub enum Error {
    /// 题目不存在（缓存、存储、远端均未命中）
    #[error("question not found: {slug}")]
    NotFound {
        slug: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// 按题号查找失败（题号只能在存储层解析）
    #[error("no stored question with frontend id {0}")]
    FrontendIdNotFound(u32),

    /// 网络传输失败
    #[error("network error: {0}")]
    Network(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// 存储层 I/O 失败
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    /// 缺少测试夹具输入文件，整个运行视为配置错误
    #[error("fixture missing: {0}")]
    FixtureMissing(PathBuf),

    /// 配置错误，尽早报出
    #[error("config error: {0}")]
    Config(String),

    /// 解法执行失败（运行器内部捕获后记录，不向外传播）
    #[error("solution error: {0}")]
    Solution(String),
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Network(Box::new(e))
    }
}
