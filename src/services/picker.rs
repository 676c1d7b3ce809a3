// 挑题模块
// 从存储里选出通过率最低的未刷题目，通过率按原始计数本地重算

use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashSet;

use crate::error::Result;
use crate::models::Difficulty;
use crate::services::database::QuestionStore;

/// 已刷过的 NeetCode 清单（按公开题号）
pub const NEETCODE_IDS: &[u32] = &[
    1, 2, 3, 4, 5, 11, 15, 17, 19, 20, 21, 22, 23, 25, 33, 36, 39, 40, 42, 43, 45, 46, 48, 49,
    50, 53, 54, 55, 56, 57, 62, 66, 70, 72, 73, 74, 76, 78, 79, 84, 90, 91, 97, 98, 100, 102,
    104, 105, 110, 121, 124, 125, 127, 128, 130, 131, 133, 134, 136, 138, 139, 141, 143, 146,
    150, 152, 153, 155, 167, 169, 190, 191, 198, 199, 200, 202, 206, 207, 208, 210, 211, 212,
    213, 215, 217, 226, 230, 235, 238, 239, 242, 268, 287, 295, 297, 300, 322, 332, 338, 347,
    371, 416, 417, 424, 435, 494, 543, 567, 572, 621, 647, 695, 703, 704, 739, 743, 746, 763,
    778, 787, 846, 853, 875, 973, 981, 994, 1046, 1143, 1448, 1584, 1899,
];

/// 挑题选项
#[derive(Debug, Clone)]
pub struct PickerOptions {
    pub count: usize,
    pub include_paid: bool,
    pub exclude_neetcode: bool,
    /// 额外排除的题号
    pub exclude: Vec<u32>,
}

impl Default for PickerOptions {
    fn default() -> Self {
        Self {
            count: 5,
            include_paid: false,
            exclude_neetcode: false,
            exclude: Vec::new(),
        }
    }
}

/// 挑题结果行
#[derive(Debug, Clone, Serialize)]
pub struct NextProblem {
    pub frontend_id: u32,
    pub title: String,
    pub title_slug: String,
    pub difficulty: Difficulty,
    pub acceptance_rate: f64,
}

/// 选出前 N 道：通过率升序，同率按难度降序
pub fn pick_next(store: &QuestionStore, options: &PickerOptions) -> Result<Vec<NextProblem>> {
    let mut blocklist: HashSet<u32> = options.exclude.iter().copied().collect();
    if options.exclude_neetcode {
        blocklist.extend(NEETCODE_IDS.iter().copied());
    }

    let mut picks: Vec<NextProblem> = store
        .candidates()?
        .into_iter()
        .filter(|c| options.include_paid || !c.is_paid_only)
        .filter(|c| !blocklist.contains(&c.frontend_id))
        .map(|c| NextProblem {
            frontend_id: c.frontend_id,
            title: c.title,
            title_slug: c.title_slug,
            difficulty: c.difficulty,
            acceptance_rate: 100.0 * c.total_accepted as f64 / c.total_submitted as f64,
        })
        .collect();

    picks.sort_by(|a, b| {
        a.acceptance_rate
            .partial_cmp(&b.acceptance_rate)
            .unwrap_or(Ordering::Equal)
            .then(b.difficulty.cmp(&a.difficulty))
            .then(a.frontend_id.cmp(&b.frontend_id))
    });
    picks.truncate(options.count);
    Ok(picks)
}
