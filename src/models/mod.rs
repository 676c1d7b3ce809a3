// 数据模型模块
// 题目元数据的不可变值类型，相等性只看 title_slug

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::str::FromStr;

use crate::error::{Error, Result};

/// 当前持久化记录的模式版本
pub const SCHEMA_VERSION: &str = "1";

/// 题目难度
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Difficulty {
    Unknown,
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
            Difficulty::Unknown => "Unknown",
        }
    }
}

impl FromStr for Difficulty {
    type Err = String;

    /// 同时接受显示名与批量快照里的数字等级 1/2/3
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim() {
            "Easy" | "easy" | "1" => Ok(Difficulty::Easy),
            "Medium" | "medium" | "2" => Ok(Difficulty::Medium),
            "Hard" | "hard" | "3" => Ok(Difficulty::Hard),
            _ => Ok(Difficulty::Unknown),
        }
    }
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 题目元数据记录
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub internal_id: i64,
    pub frontend_id: u32,
    pub title: String,
    pub title_slug: String,
    pub difficulty: Difficulty,
    pub body: String,
    pub code_stub: String,
    pub hints: Vec<String>,
    pub acceptance_rate: f64,
    pub topic_tags: String,
    pub category_slug: String,
    pub is_paid_only: bool,
    pub similar_questions: BTreeSet<u32>,
    pub companies: Option<Vec<String>>,
    #[serde(default = "default_schema_version")]
    pub schema_version: String,
    #[serde(default)]
    pub total_accepted: u64,
    #[serde(default)]
    pub total_submitted: u64,
    #[serde(default)]
    pub cached_at: Option<DateTime<Utc>>,
}

fn default_schema_version() -> String {
    SCHEMA_VERSION.to_string()
}

/// 相等性只比较规范化主键 title_slug
impl PartialEq for Question {
    fn eq(&self, other: &Self) -> bool {
        self.title_slug == other.title_slug
    }
}

impl Eq for Question {}

/// 规范化 slug：去除首尾空白并小写
pub fn normalize_slug(slug: &str) -> String {
    slug.trim().to_lowercase()
}

impl Question {
    /// 校验记录不变量，持久化与适配入口都要先过这一关
    pub fn validate(&self) -> Result<()> {
        let slug_pattern = Regex::new(r"^[a-z0-9]+(-[a-z0-9]+)*$").unwrap();
        if !slug_pattern.is_match(&self.title_slug) {
            return Err(Error::Config(format!(
                "invalid title_slug: {:?}",
                self.title_slug
            )));
        }
        if self.frontend_id == 0 {
            return Err(Error::Config(format!(
                "frontend_id must be positive for {}",
                self.title_slug
            )));
        }
        if self.schema_version.is_empty() {
            return Err(Error::Config(format!(
                "empty schema_version for {}",
                self.title_slug
            )));
        }
        if !(0.0..=100.0).contains(&self.acceptance_rate) {
            return Err(Error::Config(format!(
                "acceptance_rate out of range for {}: {}",
                self.title_slug, self.acceptance_rate
            )));
        }
        Ok(())
    }

    /// 从外部数据源记录适配为 Question
    /// 支持两种形状：GraphQL 单题记录与 /api/problems/all 快照条目
    pub fn from_source(record: &Value) -> Result<Question> {
        let question = if record.get("stat").is_some() {
            Self::from_bulk_record(record)?
        } else {
            Self::from_graphql(record)?
        };
        question.validate()?;
        Ok(question)
    }

    /// GraphQL 形状：camelCase 键，stats 与 similarQuestions 为内嵌 JSON 字符串
    fn from_graphql(record: &Value) -> Result<Question> {
        let title_slug = normalize_slug(str_field(record, "titleSlug")?);
        let frontend_id = int_field(record, "questionFrontendId")? as u32;
        let internal_id = int_field(record, "questionId").unwrap_or(0);

        let difficulty = record
            .get("difficulty")
            .and_then(Value::as_str)
            .map(|s| Difficulty::from_str(s).unwrap_or(Difficulty::Unknown))
            .unwrap_or(Difficulty::Unknown);

        let body = record
            .get("content")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string();

        let code_stub = code_stub_from_snippets(record.get("codeSnippets"));

        let hints = record
            .get("hints")
            .and_then(Value::as_array)
            .map(|arr| {
                arr.iter()
                    .filter_map(Value::as_str)
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        // stats 字段是 JSON 字符串，里面才有原始提交计数
        let stats: Value = record
            .get("stats")
            .and_then(Value::as_str)
            .and_then(|s| serde_json::from_str(s).ok())
            .unwrap_or(Value::Null);
        let total_accepted = stats
            .get("totalAcceptedRaw")
            .and_then(Value::as_u64)
            .unwrap_or(0);
        let total_submitted = stats
            .get("totalSubmissionRaw")
            .and_then(Value::as_u64)
            .unwrap_or(0);
        let acceptance_rate = if total_submitted > 0 {
            100.0 * total_accepted as f64 / total_submitted as f64
        } else {
            stats
                .get("acRate")
                .and_then(Value::as_str)
                .and_then(|s| s.trim_end_matches('%').parse::<f64>().ok())
                .unwrap_or(0.0)
        };

        let topic_tags = record
            .get("topicTags")
            .and_then(Value::as_array)
            .map(|arr| {
                arr.iter()
                    .filter_map(|t| t.get("slug").and_then(Value::as_str))
                    .collect::<Vec<_>>()
                    .join(",")
            })
            .unwrap_or_default();

        let category_slug = record
            .get("categoryTitle")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_lowercase();

        let is_paid_only = record
            .get("isPaidOnly")
            .and_then(Value::as_bool)
            .unwrap_or(false);

        let similar_questions = similar_ids(record.get("similarQuestions"));

        let companies = record.get("companyTags").and_then(Value::as_array).map(|arr| {
            arr.iter()
                .filter_map(|t| {
                    t.get("slug")
                        .or_else(|| t.get("name"))
                        .and_then(Value::as_str)
                })
                .map(String::from)
                .collect()
        });

        Ok(Question {
            internal_id,
            frontend_id,
            title: str_field(record, "title")?.to_string(),
            title_slug,
            difficulty,
            body,
            code_stub,
            hints,
            acceptance_rate,
            topic_tags,
            category_slug,
            is_paid_only,
            similar_questions,
            companies,
            schema_version: SCHEMA_VERSION.to_string(),
            total_accepted,
            total_submitted,
            cached_at: Some(Utc::now()),
        })
    }

    /// 批量快照形状：stat 子对象携带 slug、题号与提交计数，没有题面和代码桩
    fn from_bulk_record(record: &Value) -> Result<Question> {
        let stat = record
            .get("stat")
            .ok_or_else(|| Error::Config("bulk record missing stat".to_string()))?;

        let title_slug = normalize_slug(str_field(stat, "question__title_slug")?);
        let frontend_id = int_field(stat, "frontend_question_id")? as u32;
        let internal_id = int_field(stat, "question_id").unwrap_or(0);
        let total_accepted = stat.get("total_acs").and_then(Value::as_u64).unwrap_or(0);
        let total_submitted = stat
            .get("total_submitted")
            .and_then(Value::as_u64)
            .unwrap_or(0);
        let acceptance_rate = if total_submitted > 0 {
            100.0 * total_accepted as f64 / total_submitted as f64
        } else {
            0.0
        };

        let difficulty = record
            .get("difficulty")
            .and_then(|d| d.get("level"))
            .and_then(Value::as_i64)
            .map(|l| Difficulty::from_str(&l.to_string()).unwrap_or(Difficulty::Unknown))
            .unwrap_or(Difficulty::Unknown);

        let is_paid_only = record
            .get("paid_only")
            .and_then(Value::as_bool)
            .unwrap_or(false);

        Ok(Question {
            internal_id,
            frontend_id,
            title: str_field(stat, "question__title")?.to_string(),
            title_slug,
            difficulty,
            body: String::new(),
            code_stub: String::new(),
            hints: Vec::new(),
            acceptance_rate,
            topic_tags: String::new(),
            category_slug: record
                .get("category_slug")
                .and_then(Value::as_str)
                .unwrap_or("algorithms")
                .to_string(),
            is_paid_only,
            similar_questions: BTreeSet::new(),
            companies: None,
            schema_version: SCHEMA_VERSION.to_string(),
            total_accepted,
            total_submitted,
            cached_at: Some(Utc::now()),
        })
    }
}

fn str_field<'a>(record: &'a Value, key: &str) -> Result<&'a str> {
    record
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| Error::Config(format!("source record missing field {:?}", key)))
}

/// 数字字段在两种形状里既可能是数字也可能是字符串
fn int_field(record: &Value, key: &str) -> Result<i64> {
    let value = record
        .get(key)
        .ok_or_else(|| Error::Config(format!("source record missing field {:?}", key)))?;
    match value {
        Value::Number(n) => n
            .as_i64()
            .ok_or_else(|| Error::Config(format!("field {:?} is not an integer", key))),
        Value::String(s) => s
            .parse::<i64>()
            .map_err(|_| Error::Config(format!("field {:?} is not an integer: {:?}", key, s))),
        _ => Err(Error::Config(format!("field {:?} is not an integer", key))),
    }
}

/// 优先取 python3 代码桩，没有就取第一个
fn code_stub_from_snippets(snippets: Option<&Value>) -> String {
    let arr = match snippets.and_then(Value::as_array) {
        Some(arr) if !arr.is_empty() => arr,
        _ => return String::new(),
    };
    let preferred = arr
        .iter()
        .find(|s| s.get("langSlug").and_then(Value::as_str) == Some("python3"))
        .or_else(|| arr.first());
    preferred
        .and_then(|s| s.get("code").and_then(Value::as_str))
        .unwrap_or("")
        .to_string()
}

/// similarQuestions 既可能是内嵌 JSON 字符串也可能已经是数组
fn similar_ids(field: Option<&Value>) -> BTreeSet<u32> {
    let parsed;
    let arr = match field {
        Some(Value::String(s)) => {
            parsed = serde_json::from_str::<Value>(s).unwrap_or(Value::Null);
            parsed.as_array().cloned().unwrap_or_default()
        }
        Some(Value::Array(arr)) => arr.clone(),
        _ => return BTreeSet::new(),
    };
    arr.iter()
        .filter_map(|entry| {
            entry
                .get("questionFrontendId")
                .or_else(|| entry.get("frontend_id"))
                .and_then(|v| match v {
                    Value::Number(n) => n.as_u64(),
                    Value::String(s) => s.parse::<u64>().ok(),
                    _ => None,
                })
        })
        .map(|id| id as u32)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_question(slug: &str, frontend_id: u32) -> Question {
        Question {
            internal_id: frontend_id as i64,
            frontend_id,
            title: slug.to_string(),
            title_slug: slug.to_string(),
            difficulty: Difficulty::Easy,
            body: "<p>stub</p>".to_string(),
            code_stub: String::new(),
            hints: Vec::new(),
            acceptance_rate: 50.0,
            topic_tags: "array".to_string(),
            category_slug: "algorithms".to_string(),
            is_paid_only: false,
            similar_questions: BTreeSet::new(),
            companies: None,
            schema_version: SCHEMA_VERSION.to_string(),
            total_accepted: 10,
            total_submitted: 20,
            cached_at: None,
        }
    }

    #[test]
    fn test_difficulty_from_str() {
        assert_eq!("Easy".parse::<Difficulty>().unwrap(), Difficulty::Easy);
        assert_eq!("2".parse::<Difficulty>().unwrap(), Difficulty::Medium);
        assert_eq!("hard".parse::<Difficulty>().unwrap(), Difficulty::Hard);
        assert_eq!("???".parse::<Difficulty>().unwrap(), Difficulty::Unknown);
    }

    #[test]
    fn test_difficulty_ordering() {
        assert!(Difficulty::Hard > Difficulty::Medium);
        assert!(Difficulty::Medium > Difficulty::Easy);
        assert!(Difficulty::Easy > Difficulty::Unknown);
    }

    #[test]
    fn test_normalize_slug() {
        assert_eq!(normalize_slug("  Two-Sum "), "two-sum");
    }

    #[test]
    fn test_equality_is_slug_only() {
        let mut a = sample_question("two-sum", 1);
        let b = sample_question("two-sum", 1);
        a.acceptance_rate = 99.0;
        assert_eq!(a, b);
        assert_ne!(a, sample_question("add-two-numbers", 2));
    }

    #[test]
    fn test_validate_rejects_bad_slug() {
        let mut q = sample_question("two-sum", 1);
        q.title_slug = "Two Sum".to_string();
        assert!(q.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_frontend_id() {
        let mut q = sample_question("two-sum", 1);
        q.frontend_id = 0;
        assert!(q.validate().is_err());
    }

    #[test]
    fn test_from_graphql_record() {
        let record = json!({
            "questionId": "1",
            "questionFrontendId": "1",
            "title": "Two Sum",
            "titleSlug": "Two-Sum",
            "difficulty": "Easy",
            "content": "<p>Given an array...</p>",
            "isPaidOnly": false,
            "codeSnippets": [
                {"langSlug": "cpp", "code": "class Solution {};"},
                {"langSlug": "python3", "code": "class Solution: pass"}
            ],
            "hints": ["try a hash map"],
            "stats": "{\"totalAcceptedRaw\": 500, \"totalSubmissionRaw\": 1000, \"acRate\": \"50.0%\"}",
            "topicTags": [{"slug": "array"}, {"slug": "hash-table"}],
            "categoryTitle": "Algorithms",
            "similarQuestions": "[{\"titleSlug\": \"3sum\", \"questionFrontendId\": \"15\"}]"
        });
        let q = Question::from_source(&record).unwrap();
        assert_eq!(q.title_slug, "two-sum");
        assert_eq!(q.frontend_id, 1);
        assert_eq!(q.difficulty, Difficulty::Easy);
        assert_eq!(q.code_stub, "class Solution: pass");
        assert_eq!(q.hints, vec!["try a hash map".to_string()]);
        assert_eq!(q.acceptance_rate, 50.0);
        assert_eq!(q.topic_tags, "array,hash-table");
        assert_eq!(q.category_slug, "algorithms");
        assert!(q.similar_questions.contains(&15));
        assert_eq!(q.total_submitted, 1000);
    }

    #[test]
    fn test_from_bulk_record() {
        let record = json!({
            "stat": {
                "question_id": 100,
                "frontend_question_id": 100,
                "question__title": "Same Tree",
                "question__title_slug": "same-tree",
                "total_acs": 40,
                "total_submitted": 100
            },
            "difficulty": {"level": 1},
            "paid_only": false
        });
        let q = Question::from_source(&record).unwrap();
        assert_eq!(q.title_slug, "same-tree");
        assert_eq!(q.frontend_id, 100);
        assert_eq!(q.difficulty, Difficulty::Easy);
        assert_eq!(q.acceptance_rate, 40.0);
        assert!(q.body.is_empty());
    }

    #[test]
    fn test_from_source_rejects_malformed_record() {
        let record = json!({"titleSlug": "x"});
        assert!(Question::from_source(&record).is_err());
    }
}
