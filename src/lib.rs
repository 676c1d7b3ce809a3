// 刷题数据与执行核心
// 题目目录（存储/缓存/抓取/导入/挑题）与解法执行（运行器/复杂度估计）

pub mod error;
pub mod models;
pub mod runner;
pub mod services;
pub mod utils;

pub use error::{Error, Result};
