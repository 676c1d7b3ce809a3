// 持久化存储模块
// 题目元数据的 SQLite 持久化，slug 与题号双键索引，put 为原子 upsert

use chrono::{DateTime, Utc};
use log::debug;
use rusqlite::{Connection, OpenFlags, Row};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use crate::error::Result;
use crate::models::{normalize_slug, Difficulty, Question};
use crate::utils;

const SELECT_COLUMNS: &str = "internal_id, frontend_id, title, title_slug, difficulty, \
     body, code_stub, hints, acceptance_rate, topic_tags, category_slug, is_paid_only, \
     similar_questions, companies, schema_version, total_accepted, total_submitted, cached_at";

/// 挑题查询用的候选行，只取计数与标识字段
#[derive(Debug, Clone)]
pub struct CandidateRow {
    pub frontend_id: u32,
    pub title: String,
    pub title_slug: String,
    pub difficulty: Difficulty,
    pub is_paid_only: bool,
    pub total_accepted: u64,
    pub total_submitted: u64,
}

/// 题目存储服务
pub struct QuestionStore {
    pool: Arc<Mutex<Connection>>,
    db_path: Option<PathBuf>,
}

impl QuestionStore {
    /// 在指定路径打开（或创建）存储文件
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let db_path = path.as_ref().to_path_buf();
        if let Some(parent) = db_path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| {
                    crate::error::Error::Config(format!(
                        "failed to create store dir {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        let conn = Connection::open_with_flags(
            &db_path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE,
        )?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
        ",
        )?;

        let store = Self {
            pool: Arc::new(Mutex::new(conn)),
            db_path: Some(db_path),
        };
        store.initialize()?;
        Ok(store)
    }

    /// 默认项目本地路径
    pub fn open_default() -> Result<Self> {
        Self::open(utils::get_database_path())
    }

    /// 内存库，测试用
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            pool: Arc::new(Mutex::new(conn)),
            db_path: None,
        };
        store.initialize()?;
        Ok(store)
    }

    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    /// 初始化表结构，幂等
    pub fn initialize(&self) -> Result<()> {
        let conn = self.pool.lock().unwrap();
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS questions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                internal_id INTEGER NOT NULL,
                frontend_id INTEGER NOT NULL,
                title TEXT NOT NULL,
                title_slug TEXT NOT NULL UNIQUE,
                difficulty TEXT NOT NULL,
                body TEXT NOT NULL DEFAULT '',
                code_stub TEXT NOT NULL DEFAULT '',
                hints TEXT NOT NULL DEFAULT '[]',
                acceptance_rate REAL NOT NULL DEFAULT 0,
                topic_tags TEXT NOT NULL DEFAULT '',
                category_slug TEXT NOT NULL DEFAULT '',
                is_paid_only INTEGER NOT NULL DEFAULT 0,
                similar_questions TEXT NOT NULL DEFAULT '[]',
                companies TEXT,
                schema_version TEXT NOT NULL,
                total_accepted INTEGER NOT NULL DEFAULT 0,
                total_submitted INTEGER NOT NULL DEFAULT 0,
                cached_at TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE UNIQUE INDEX IF NOT EXISTS idx_questions_slug ON questions(title_slug);
            CREATE INDEX IF NOT EXISTS idx_questions_frontend_id ON questions(frontend_id);",
        )?;
        Ok(())
    }

    // ==================== 题目 CRUD ====================

    /// 按规范化 slug upsert，单次调用原子；重复导入保留 created_at
    pub fn put(&self, question: &Question) -> Result<()> {
        question.validate()?;
        let slug = normalize_slug(&question.title_slug);
        let now = Utc::now().to_rfc3339();

        let hints = serde_json::to_string(&question.hints).unwrap_or_else(|_| "[]".to_string());
        let similar = serde_json::to_string(&question.similar_questions)
            .unwrap_or_else(|_| "[]".to_string());
        let companies = question
            .companies
            .as_ref()
            .and_then(|c| serde_json::to_string(c).ok());
        let cached_at = question.cached_at.map(|t| t.to_rfc3339());

        let conn = self.pool.lock().unwrap();
        conn.execute(
            "INSERT INTO questions
                 (internal_id, frontend_id, title, title_slug, difficulty, body, code_stub,
                  hints, acceptance_rate, topic_tags, category_slug, is_paid_only,
                  similar_questions, companies, schema_version, total_accepted,
                  total_submitted, cached_at, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?19)
             ON CONFLICT(title_slug) DO UPDATE SET
                 internal_id = excluded.internal_id,
                 frontend_id = excluded.frontend_id,
                 title = excluded.title,
                 difficulty = excluded.difficulty,
                 body = excluded.body,
                 code_stub = excluded.code_stub,
                 hints = excluded.hints,
                 acceptance_rate = excluded.acceptance_rate,
                 topic_tags = excluded.topic_tags,
                 category_slug = excluded.category_slug,
                 is_paid_only = excluded.is_paid_only,
                 similar_questions = excluded.similar_questions,
                 companies = excluded.companies,
                 schema_version = excluded.schema_version,
                 total_accepted = excluded.total_accepted,
                 total_submitted = excluded.total_submitted,
                 cached_at = excluded.cached_at,
                 updated_at = excluded.updated_at",
            rusqlite::params![
                question.internal_id,
                question.frontend_id,
                question.title,
                slug,
                question.difficulty.as_str(),
                question.body,
                question.code_stub,
                hints,
                question.acceptance_rate,
                question.topic_tags,
                question.category_slug,
                question.is_paid_only as i32,
                similar,
                companies,
                question.schema_version,
                question.total_accepted as i64,
                question.total_submitted as i64,
                cached_at,
                now,
            ],
        )?;
        debug!("stored question {}", slug);
        Ok(())
    }

    /// 按 slug 查找，不存在不是错误
    pub fn get_by_slug(&self, slug: &str) -> Result<Option<Question>> {
        let slug = normalize_slug(slug);
        let conn = self.pool.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM questions WHERE title_slug = ?",
            SELECT_COLUMNS
        ))?;
        let mut rows = stmt.query(rusqlite::params![slug])?;
        match rows.next()? {
            Some(row) => Ok(Some(row_to_question(row)?)),
            None => Ok(None),
        }
    }

    /// 按公开题号查找
    pub fn get_by_frontend_id(&self, frontend_id: u32) -> Result<Option<Question>> {
        let conn = self.pool.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM questions WHERE frontend_id = ?",
            SELECT_COLUMNS
        ))?;
        let mut rows = stmt.query(rusqlite::params![frontend_id])?;
        match rows.next()? {
            Some(row) => Ok(Some(row_to_question(row)?)),
            None => Ok(None),
        }
    }

    /// 删除一条记录，返回是否确有删除
    pub fn delete(&self, slug: &str) -> Result<bool> {
        let slug = normalize_slug(slug);
        let conn = self.pool.lock().unwrap();
        let affected = conn.execute(
            "DELETE FROM questions WHERE title_slug = ?",
            rusqlite::params![slug],
        )?;
        Ok(affected > 0)
    }

    pub fn exists(&self, slug: &str) -> Result<bool> {
        let slug = normalize_slug(slug);
        let conn = self.pool.lock().unwrap();
        let mut stmt = conn.prepare("SELECT 1 FROM questions WHERE title_slug = ?")?;
        let mut rows = stmt.query(rusqlite::params![slug])?;
        Ok(rows.next()?.is_some())
    }

    pub fn count(&self) -> Result<u64> {
        let conn = self.pool.lock().unwrap();
        let mut stmt = conn.prepare("SELECT COUNT(*) FROM questions")?;
        let mut rows = stmt.query([])?;
        match rows.next()? {
            Some(row) => Ok(row.get::<_, i64>(0)? as u64),
            None => Ok(0),
        }
    }

    /// 所有已存 slug，按题号排序
    pub fn list_slugs(&self) -> Result<Vec<String>> {
        let conn = self.pool.lock().unwrap();
        let mut stmt = conn.prepare("SELECT title_slug FROM questions ORDER BY frontend_id")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut slugs = Vec::new();
        for row in rows {
            slugs.push(row?);
        }
        Ok(slugs)
    }

    // ==================== 挑题候选 ====================

    /// 有提交记录的题目候选行，通过率由调用方按计数自行计算
    pub fn candidates(&self) -> Result<Vec<CandidateRow>> {
        let conn = self.pool.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT frontend_id, title, title_slug, difficulty, is_paid_only,
                    total_accepted, total_submitted
             FROM questions WHERE total_submitted > 0",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(CandidateRow {
                frontend_id: row.get::<_, i64>(0)? as u32,
                title: row.get(1)?,
                title_slug: row.get(2)?,
                difficulty: Difficulty::from_str(&row.get::<_, String>(3)?)
                    .unwrap_or(Difficulty::Unknown),
                is_paid_only: row.get::<_, i64>(4)? != 0,
                total_accepted: row.get::<_, i64>(5)? as u64,
                total_submitted: row.get::<_, i64>(6)? as u64,
            })
        })?;

        let mut candidates = Vec::new();
        for row in rows {
            candidates.push(row?);
        }
        Ok(candidates)
    }
}

// ==================== 辅助方法 ====================

/// 从数据库行还原 Question；JSON 列与时间戳容错解析，未知脏值按默认处理
fn row_to_question(row: &Row) -> rusqlite::Result<Question> {
    let hints: Vec<String> =
        serde_json::from_str(&row.get::<_, String>(7)?).unwrap_or_default();
    let similar_questions: BTreeSet<u32> =
        serde_json::from_str(&row.get::<_, String>(12)?).unwrap_or_default();
    let companies: Option<Vec<String>> = row
        .get::<_, Option<String>>(13)?
        .and_then(|s| serde_json::from_str(&s).ok());
    let cached_at: Option<DateTime<Utc>> = row
        .get::<_, Option<String>>(17)?
        .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
        .map(|t| t.with_timezone(&Utc));

    Ok(Question {
        internal_id: row.get(0)?,
        frontend_id: row.get::<_, i64>(1)? as u32,
        title: row.get(2)?,
        title_slug: row.get(3)?,
        difficulty: Difficulty::from_str(&row.get::<_, String>(4)?)
            .unwrap_or(Difficulty::Unknown),
        body: row.get(5)?,
        code_stub: row.get(6)?,
        hints,
        acceptance_rate: row.get(8)?,
        topic_tags: row.get(9)?,
        category_slug: row.get(10)?,
        is_paid_only: row.get::<_, i64>(11)? != 0,
        similar_questions,
        companies,
        schema_version: row.get(14)?,
        total_accepted: row.get::<_, i64>(15)? as u64,
        total_submitted: row.get::<_, i64>(16)? as u64,
        cached_at,
    })
}
