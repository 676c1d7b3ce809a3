// 抓取模块
// 从外部数据源获取题目原始记录的可插拔适配器
// 在线抓取与离线快照实现同一个单操作接口，门面层无须区分

use log::debug;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Mutex;
use std::thread;
use std::time::{Duration, Instant};

use crate::error::{Error, Result};
use crate::models::normalize_slug;

const GRAPHQL_ENDPOINT: &str = "https://leetcode.com/graphql";

const QUESTION_QUERY: &str = "query questionData($titleSlug: String!) {\
  question(titleSlug: $titleSlug) {\
    questionId questionFrontendId title titleSlug difficulty content isPaidOnly \
    codeSnippets { langSlug code } hints stats \
    topicTags { slug } categoryTitle similarQuestions \
  }\
}";

/// 抓取接口：None 表示数据源没有这道题，传输失败报 Network 错误
pub trait Fetcher {
    fn fetch(&self, slug: &str) -> Result<Option<Value>>;
}

/// 在线抓取配置
#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub endpoint: String,
    pub timeout: Duration,
    /// 两次请求之间的最小间隔
    pub request_delay: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            endpoint: GRAPHQL_ENDPOINT.to_string(),
            timeout: Duration::from_secs(15),
            request_delay: Duration::from_secs(2),
        }
    }
}

/// GraphQL 在线抓取器
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
    config: FetchConfig,
    last_request: Mutex<Option<Instant>>,
}

impl HttpFetcher {
    pub fn new(config: FetchConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("neetcode/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            config,
            last_request: Mutex::new(None),
        })
    }

    /// 限速：距上次请求不足最小间隔就睡够再发
    fn throttle(&self) {
        let mut last = self.last_request.lock().unwrap();
        if let Some(at) = *last {
            let elapsed = at.elapsed();
            if elapsed < self.config.request_delay {
                thread::sleep(self.config.request_delay - elapsed);
            }
        }
        *last = Some(Instant::now());
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, slug: &str) -> Result<Option<Value>> {
        let slug = normalize_slug(slug);
        self.throttle();
        debug!("fetching {} from {}", slug, self.config.endpoint);

        let body = json!({
            "query": QUESTION_QUERY,
            "variables": {"titleSlug": slug},
        });
        let response = self
            .client
            .post(&self.config.endpoint)
            .json(&body)
            .send()?
            .error_for_status()?;
        let payload: Value = response.json()?;

        match payload.get("data").and_then(|d| d.get("question")) {
            Some(Value::Null) | None => Ok(None),
            Some(question) => Ok(Some(question.clone())),
        }
    }
}

/// 离线快照抓取器：启动时把整份 JSON 转成 slug 索引
pub struct BulkFileFetcher {
    records: HashMap<String, Value>,
}

impl BulkFileFetcher {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path.as_ref()).map_err(|e| {
            Error::Config(format!(
                "failed to read bulk file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        let dump: Value = serde_json::from_str(&text)
            .map_err(|e| Error::Config(format!("invalid bulk file JSON: {}", e)))?;

        let mut records = HashMap::new();
        for record in bulk_records(&dump) {
            if let Some(slug) = record_slug(record) {
                records.insert(slug, record.clone());
            }
        }
        debug!("loaded {} bulk records", records.len());
        Ok(Self { records })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl Fetcher for BulkFileFetcher {
    fn fetch(&self, slug: &str) -> Result<Option<Value>> {
        Ok(self.records.get(&normalize_slug(slug)).cloned())
    }
}

/// 快照既可能是记录数组，也可能包在 stat_status_pairs / questions 里
pub fn bulk_records(dump: &Value) -> &[Value] {
    dump.as_array()
        .or_else(|| {
            dump.get("stat_status_pairs")
                .or_else(|| dump.get("questions"))
                .and_then(Value::as_array)
        })
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// 从任一形状的记录里取规范化 slug
pub fn record_slug(record: &Value) -> Option<String> {
    record
        .get("titleSlug")
        .or_else(|| {
            record
                .get("stat")
                .and_then(|s| s.get("question__title_slug"))
        })
        .and_then(Value::as_str)
        .map(normalize_slug)
}
