// 服务模块
// 题目元数据目录：存储、缓存、抓取、门面、批量导入与挑题

pub mod cache;
pub mod database;
pub mod datasource;
pub mod fetcher;
pub mod importer;
pub mod picker;

pub use cache::QuestionCache;
pub use database::{CandidateRow, QuestionStore};
pub use datasource::{DataSource, DataSourceConfig, DataSourceStats};
pub use fetcher::{BulkFileFetcher, FetchConfig, Fetcher, HttpFetcher};
pub use importer::{import_bulk_file, ImportOptions, ImportReport};
pub use picker::{pick_next, NextProblem, PickerOptions, NEETCODE_IDS};
