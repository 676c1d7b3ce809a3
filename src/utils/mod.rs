// 工具模块
// 项目本地数据目录与数据库文件路径

use std::path::PathBuf;

const STORE_DIR: &str = ".neetcode/leetcode_datasource/store";
const DB_FILE: &str = "leetcode.sqlite3";

/// 项目本地存储目录（相对当前工作目录）
pub fn get_store_dir() -> PathBuf {
    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(STORE_DIR)
}

/// 默认数据库文件路径
pub fn get_database_path() -> PathBuf {
    get_store_dir().join(DB_FILE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_path_layout() {
        let path = get_database_path();
        assert!(path.ends_with(".neetcode/leetcode_datasource/store/leetcode.sqlite3"));
    }
}
