// 批量导入模块
// 一次性把快照 JSON 规范化写入存储；单条失败只计数不中断

use log::{info, warn};
use serde::Serialize;
use std::path::Path;

use crate::error::{Error, Result};
use crate::models::Question;
use crate::services::database::QuestionStore;
use crate::services::fetcher::bulk_records;

/// 导入过滤配置
#[derive(Debug, Clone)]
pub struct ImportOptions {
    /// 跳过付费题
    pub skip_paid: bool,
    /// 跳过空题面的记录
    pub skip_empty_body: bool,
    /// 只解析计数，不落库
    pub dry_run: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            skip_paid: true,
            skip_empty_body: true,
            dry_run: false,
        }
    }
}

/// 导入结果统计
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub total: usize,
    pub imported: usize,
    pub skipped_paid: usize,
    pub skipped_empty: usize,
    pub errors: usize,
}

/// 把一份快照文件导入存储
pub fn import_bulk_file<P: AsRef<Path>>(
    store: &QuestionStore,
    path: P,
    options: &ImportOptions,
) -> Result<ImportReport> {
    let text = std::fs::read_to_string(path.as_ref()).map_err(|e| {
        Error::Config(format!(
            "failed to read bulk file {}: {}",
            path.as_ref().display(),
            e
        ))
    })?;
    let dump: serde_json::Value = serde_json::from_str(&text)
        .map_err(|e| Error::Config(format!("invalid bulk file JSON: {}", e)))?;

    let mut report = ImportReport::default();
    for record in bulk_records(&dump) {
        report.total += 1;

        let question = match Question::from_source(record) {
            Ok(q) => q,
            Err(e) => {
                warn!("skipping malformed record #{}: {}", report.total, e);
                report.errors += 1;
                continue;
            }
        };

        if options.skip_paid && question.is_paid_only {
            report.skipped_paid += 1;
            continue;
        }
        if options.skip_empty_body && question.body.trim().is_empty() {
            report.skipped_empty += 1;
            continue;
        }

        if !options.dry_run {
            if let Err(e) = store.put(&question) {
                warn!("failed to store {}: {}", question.title_slug, e);
                report.errors += 1;
                continue;
            }
        }
        report.imported += 1;
    }

    info!(
        "import finished: {} total, {} imported, {} paid skipped, {} empty skipped, {} errors",
        report.total, report.imported, report.skipped_paid, report.skipped_empty, report.errors
    );
    Ok(report)
}
