// 缓存模块
// 存储层前面的短 TTL 内存缓存，过期条目视同不存在

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::models::{normalize_slug, Question};

/// 默认缓存 TTL
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

struct CacheEntry {
    question: Question,
    stored_at: Instant,
}

/// 按 slug 键控的题目缓存
pub struct QuestionCache {
    entries: HashMap<String, CacheEntry>,
    ttl: Duration,
    hits: u64,
    misses: u64,
}

impl QuestionCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            ttl,
            hits: 0,
            misses: 0,
        }
    }

    /// 命中返回克隆；过期条目当场移除并按未命中计
    pub fn get(&mut self, slug: &str) -> Option<Question> {
        let slug = normalize_slug(slug);
        match self.entries.get(&slug) {
            Some(entry) if entry.stored_at.elapsed() < self.ttl => {
                self.hits += 1;
                Some(entry.question.clone())
            }
            Some(_) => {
                self.entries.remove(&slug);
                self.misses += 1;
                None
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    pub fn put(&mut self, question: Question) {
        let slug = normalize_slug(&question.title_slug);
        self.entries.insert(
            slug,
            CacheEntry {
                question,
                stored_at: Instant::now(),
            },
        );
    }

    /// 移除单个条目，返回是否确有移除
    pub fn invalidate(&mut self, slug: &str) -> bool {
        self.entries.remove(&normalize_slug(slug)).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }
}

impl Default for QuestionCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Difficulty, SCHEMA_VERSION};
    use std::collections::BTreeSet;

    fn sample_question(slug: &str) -> Question {
        Question {
            internal_id: 1,
            frontend_id: 1,
            title: slug.to_string(),
            title_slug: slug.to_string(),
            difficulty: Difficulty::Easy,
            body: String::new(),
            code_stub: String::new(),
            hints: Vec::new(),
            acceptance_rate: 50.0,
            topic_tags: String::new(),
            category_slug: "algorithms".to_string(),
            is_paid_only: false,
            similar_questions: BTreeSet::new(),
            companies: None,
            schema_version: SCHEMA_VERSION.to_string(),
            total_accepted: 0,
            total_submitted: 0,
            cached_at: None,
        }
    }

    #[test]
    fn test_hit_and_miss_counters() {
        let mut cache = QuestionCache::new(Duration::from_secs(60));
        assert!(cache.get("two-sum").is_none());
        cache.put(sample_question("two-sum"));
        assert!(cache.get("two-sum").is_some());
        assert_eq!(cache.hits(), 1);
        assert_eq!(cache.misses(), 1);
    }

    #[test]
    fn test_get_normalizes_slug() {
        let mut cache = QuestionCache::new(Duration::from_secs(60));
        cache.put(sample_question("two-sum"));
        assert!(cache.get("Two-Sum").is_some());
    }

    #[test]
    fn test_expired_entry_is_absent() {
        let mut cache = QuestionCache::new(Duration::from_secs(0));
        cache.put(sample_question("two-sum"));
        assert!(cache.get("two-sum").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_invalidate_and_clear() {
        let mut cache = QuestionCache::new(Duration::from_secs(60));
        cache.put(sample_question("a"));
        cache.put(sample_question("b"));
        assert!(cache.invalidate("a"));
        assert!(!cache.invalidate("a"));
        assert_eq!(cache.len(), 1);
        cache.clear();
        assert!(cache.is_empty());
    }
}
