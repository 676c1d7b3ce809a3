// 数据源门面模块
// 协调缓存、存储与抓取三层：缓存 → 存储 → 远端，命中逐层向上回填

use log::{debug, warn};
use serde::Serialize;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::models::{normalize_slug, Question};
use crate::services::cache::{QuestionCache, DEFAULT_TTL};
use crate::services::database::QuestionStore;
use crate::services::fetcher::Fetcher;

/// 门面配置
#[derive(Debug, Clone)]
pub struct DataSourceConfig {
    pub cache_enabled: bool,
    pub cache_ttl: Duration,
}

impl Default for DataSourceConfig {
    fn default() -> Self {
        Self {
            cache_enabled: true,
            cache_ttl: DEFAULT_TTL,
        }
    }
}

/// 读写计数与配置摘要
#[derive(Debug, Clone, Serialize)]
pub struct DataSourceStats {
    pub cache_hits: u64,
    pub store_hits: u64,
    pub network_fetches: u64,
    pub misses: u64,
    pub cache_enabled: bool,
    pub cache_len: usize,
    pub store_count: u64,
}

/// 题目数据源门面
pub struct DataSource {
    store: QuestionStore,
    cache: Option<QuestionCache>,
    fetcher: Option<Box<dyn Fetcher>>,
    cache_hits: u64,
    store_hits: u64,
    network_fetches: u64,
    misses: u64,
}

impl DataSource {
    pub fn new(
        store: QuestionStore,
        fetcher: Option<Box<dyn Fetcher>>,
        config: DataSourceConfig,
    ) -> Self {
        let cache = if config.cache_enabled {
            Some(QuestionCache::new(config.cache_ttl))
        } else {
            None
        };
        Self {
            store,
            cache,
            fetcher,
            cache_hits: 0,
            store_hits: 0,
            network_fetches: 0,
            misses: 0,
        }
    }

    pub fn store(&self) -> &QuestionStore {
        &self.store
    }

    /// 按 slug 读取；refresh 跳过缓存与存储直接走远端
    pub fn get_by_slug(&mut self, slug: &str, refresh: bool) -> Result<Question> {
        let slug = normalize_slug(slug);

        if !refresh {
            if let Some(cache) = &mut self.cache {
                if let Some(question) = cache.get(&slug) {
                    self.cache_hits += 1;
                    return Ok(question);
                }
            }
            if let Some(question) = self.store.get_by_slug(&slug)? {
                self.store_hits += 1;
                if let Some(cache) = &mut self.cache {
                    cache.put(question.clone());
                }
                return Ok(question);
            }
        }

        self.fetch_and_persist(&slug)
    }

    /// 按题号读取：题号只在存储层可解析，远端不接受数字键
    pub fn get_by_frontend_id(&mut self, frontend_id: u32, refresh: bool) -> Result<Question> {
        match self.store.get_by_frontend_id(frontend_id)? {
            Some(question) if refresh => self.get_by_slug(&question.title_slug, true),
            Some(question) => {
                self.store_hits += 1;
                if let Some(cache) = &mut self.cache {
                    cache.put(question.clone());
                }
                Ok(question)
            }
            None => {
                self.misses += 1;
                Err(Error::FrontendIdNotFound(frontend_id))
            }
        }
    }

    pub fn exists(&self, slug: &str) -> Result<bool> {
        self.store.exists(slug)
    }

    /// 失效单个缓存条目，不影响存储
    pub fn invalidate(&mut self, slug: &str) {
        if let Some(cache) = &mut self.cache {
            cache.invalidate(slug);
        }
    }

    pub fn clear_cache(&mut self) {
        if let Some(cache) = &mut self.cache {
            cache.clear();
        }
    }

    pub fn stats(&self) -> Result<DataSourceStats> {
        Ok(DataSourceStats {
            cache_hits: self.cache_hits,
            store_hits: self.store_hits,
            network_fetches: self.network_fetches,
            misses: self.misses,
            cache_enabled: self.cache.is_some(),
            cache_len: self.cache.as_ref().map(QuestionCache::len).unwrap_or(0),
            store_count: self.store.count()?,
        })
    }

    /// 远端抓取成功则持久化并回填缓存；缺题与网络失败都折算为 NotFound
    fn fetch_and_persist(&mut self, slug: &str) -> Result<Question> {
        let fetcher = match &self.fetcher {
            Some(fetcher) => fetcher,
            None => {
                self.misses += 1;
                return Err(Error::NotFound {
                    slug: slug.to_string(),
                    source: None,
                });
            }
        };

        match fetcher.fetch(slug) {
            Ok(Some(raw)) => {
                let question = Question::from_source(&raw)?;
                self.network_fetches += 1;
                self.store.put(&question)?;
                if let Some(cache) = &mut self.cache {
                    cache.put(question.clone());
                }
                debug!("fetched and persisted {}", slug);
                Ok(question)
            }
            Ok(None) => {
                self.misses += 1;
                Err(Error::NotFound {
                    slug: slug.to_string(),
                    source: None,
                })
            }
            Err(network @ Error::Network(_)) => {
                self.misses += 1;
                warn!("fetch failed for {}: {}", slug, network);
                Err(Error::NotFound {
                    slug: slug.to_string(),
                    source: Some(Box::new(network)),
                })
            }
            Err(other) => Err(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    /// 确定性桩抓取器
    struct StubFetcher {
        known: Vec<&'static str>,
        fail: bool,
    }

    impl Fetcher for StubFetcher {
        fn fetch(&self, slug: &str) -> Result<Option<Value>> {
            if self.fail {
                return Err(Error::Network("stub transport failure".into()));
            }
            if self.known.contains(&slug) {
                Ok(Some(json!({
                    "questionId": "1",
                    "questionFrontendId": "1",
                    "title": "Alpha",
                    "titleSlug": slug,
                    "difficulty": "Easy",
                    "content": "<p>alpha</p>",
                    "isPaidOnly": false,
                    "stats": "{\"totalAcceptedRaw\": 1, \"totalSubmissionRaw\": 2}"
                })))
            } else {
                Ok(None)
            }
        }
    }

    fn datasource(fail: bool, cache_enabled: bool) -> DataSource {
        let store = QuestionStore::open_in_memory().unwrap();
        let fetcher = StubFetcher {
            known: vec!["alpha"],
            fail,
        };
        DataSource::new(
            store,
            Some(Box::new(fetcher)),
            DataSourceConfig {
                cache_enabled,
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_miss_fetch_and_store() {
        let mut ds = datasource(false, true);
        let q = ds.get_by_slug("alpha", false).unwrap();
        assert_eq!(q.title_slug, "alpha");
        assert!(ds.store().exists("alpha").unwrap());

        let err = ds.get_by_slug("beta", false).unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
        assert!(!ds.store().exists("beta").unwrap());
    }

    #[test]
    fn test_read_path_counters() {
        let mut ds = datasource(false, true);
        ds.get_by_slug("alpha", false).unwrap(); // 远端
        ds.get_by_slug("alpha", false).unwrap(); // 缓存
        ds.clear_cache();
        ds.get_by_slug("alpha", false).unwrap(); // 存储

        let stats = ds.stats().unwrap();
        assert_eq!(stats.network_fetches, 1);
        assert_eq!(stats.cache_hits, 1);
        assert_eq!(stats.store_hits, 1);
        assert_eq!(stats.store_count, 1);
    }

    #[test]
    fn test_slug_normalized_before_lookup() {
        let mut ds = datasource(false, true);
        ds.get_by_slug("Alpha", false).unwrap();
        assert!(ds.store().exists("alpha").unwrap());
    }

    #[test]
    fn test_get_by_frontend_id_store_only() {
        let mut ds = datasource(false, true);
        ds.get_by_slug("alpha", false).unwrap();

        let q = ds.get_by_frontend_id(1, false).unwrap();
        assert_eq!(q.title_slug, "alpha");

        let err = ds.get_by_frontend_id(999, false).unwrap_err();
        assert!(matches!(err, Error::FrontendIdNotFound(999)));
    }

    #[test]
    fn test_refresh_bypasses_cache_and_store() {
        let mut ds = datasource(false, true);
        ds.get_by_slug("alpha", false).unwrap();
        ds.get_by_slug("alpha", true).unwrap();
        let stats = ds.stats().unwrap();
        assert_eq!(stats.network_fetches, 2);
    }

    #[test]
    fn test_cache_transparency() {
        // 开关缓存只改变计数，不改变结果
        let mut with_cache = datasource(false, true);
        let mut without_cache = datasource(false, false);

        let a = with_cache.get_by_slug("alpha", false).unwrap();
        let b = without_cache.get_by_slug("alpha", false).unwrap();
        assert_eq!(a, b);

        let a = with_cache.get_by_slug("alpha", false).unwrap();
        let b = without_cache.get_by_slug("alpha", false).unwrap();
        assert_eq!(a, b);
        assert_eq!(with_cache.stats().unwrap().cache_hits, 1);
        assert_eq!(without_cache.stats().unwrap().cache_hits, 0);
    }

    #[test]
    fn test_invalidate_does_not_touch_store() {
        let mut ds = datasource(false, true);
        ds.get_by_slug("alpha", false).unwrap();
        ds.invalidate("alpha");
        assert!(ds.store().exists("alpha").unwrap());
        ds.get_by_slug("alpha", false).unwrap();
        assert_eq!(ds.stats().unwrap().store_hits, 1);
    }

    #[test]
    fn test_network_error_wrapped_as_not_found() {
        let mut ds = datasource(true, true);
        let err = ds.get_by_slug("alpha", false).unwrap_err();
        match err {
            Error::NotFound { slug, source } => {
                assert_eq!(slug, "alpha");
                assert!(source.is_some());
            }
            other => panic!("expected NotFound, got {:?}", other),
        }
        assert!(!ds.store().exists("alpha").unwrap());
        assert_eq!(ds.stats().unwrap().misses, 1);
    }

    #[test]
    fn test_no_fetcher_means_not_found() {
        let store = QuestionStore::open_in_memory().unwrap();
        let mut ds = DataSource::new(store, None, DataSourceConfig::default());
        let err = ds.get_by_slug("anything", false).unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }
}
