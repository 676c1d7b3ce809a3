// 解法注册表模块
// 每道题以数据表声明多个算法变体；表是数据，选择器是唯一的动态环节

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use serde_json::Value;
use std::io::{BufRead, Write};

use crate::error::{Error, Result};

/// 必备变体键
pub const DEFAULT_VARIANT: &str = "default";

/// 变体元信息，complexity_note 只是自述，真实复杂度由估计器测量
#[derive(Debug, Clone, Serialize)]
pub struct SolutionMeta {
    pub class_name: String,
    pub method_name: String,
    pub complexity_note: String,
    pub description: String,
}

impl SolutionMeta {
    pub fn new(class_name: &str, method_name: &str, complexity_note: &str, description: &str) -> Self {
        Self {
            class_name: class_name.to_string(),
            method_name: method_name.to_string(),
            complexity_note: complexity_note.to_string(),
            description: description.to_string(),
        }
    }
}

/// 解法入口：从输入句柄读题，向输出句柄写单行 JSON 字面量
pub trait Solver {
    fn solve(&mut self, input: &mut dyn BufRead, output: &mut dyn Write) -> anyhow::Result<()>;
}

/// 注册表条目：元信息加变体构造函数
#[derive(Debug)]
pub struct SolutionEntry {
    pub meta: SolutionMeta,
    pub make: fn() -> Box<dyn Solver>,
}

/// 变体键 → 条目的有序映射
#[derive(Debug)]
pub struct SolutionTable {
    entries: Vec<(String, SolutionEntry)>,
}

impl SolutionTable {
    /// 构造时校验：default 必备，键不重复
    pub fn new(entries: Vec<(&str, SolutionEntry)>) -> Result<Self> {
        let mut table = Vec::with_capacity(entries.len());
        for (key, entry) in entries {
            if table.iter().any(|(k, _): &(String, _)| k == key) {
                return Err(Error::Config(format!("duplicate variant key {:?}", key)));
            }
            table.push((key.to_string(), entry));
        }
        if !table.iter().any(|(k, _)| k == DEFAULT_VARIANT) {
            return Err(Error::Config(
                "solution table must declare a \"default\" variant".to_string(),
            ));
        }
        Ok(Self { entries: table })
    }

    pub fn get(&self, key: &str) -> Option<&SolutionEntry> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, entry)| entry)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// 判题函数：等值比较不够用时由题目自带
pub type JudgeFn = fn(actual: &Value, expected: &Value, input_text: &str) -> bool;

/// 复杂度估计用的输入生成器
pub trait InputGenerator {
    /// 随机出题，用于测试夹具生成
    fn generate(&self, count: usize, seed: Option<u64>) -> Vec<String>;
    /// 生成一份"规模为 n"的输入
    fn generate_for_complexity(&self, n: usize) -> String;
}

/// 通用生成器：每份输入一行 JSON 整数数组，够覆盖一大类数组题
pub struct UniformArrayGenerator {
    pub min: i64,
    pub max: i64,
    /// generate 随机出题时的数组长度
    pub len: usize,
}

impl Default for UniformArrayGenerator {
    fn default() -> Self {
        Self {
            min: -1000,
            max: 1000,
            len: 20,
        }
    }
}

impl UniformArrayGenerator {
    fn array(&self, rng: &mut StdRng, len: usize) -> String {
        let values: Vec<i64> = (0..len).map(|_| rng.gen_range(self.min..=self.max)).collect();
        let mut line = serde_json::to_string(&values).unwrap_or_else(|_| "[]".to_string());
        line.push('\n');
        line
    }
}

impl InputGenerator for UniformArrayGenerator {
    fn generate(&self, count: usize, seed: Option<u64>) -> Vec<String> {
        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        (0..count).map(|_| self.array(&mut rng, self.len)).collect()
    }

    fn generate_for_complexity(&self, n: usize) -> String {
        // 规模档位必须可复现，固定种子
        let mut rng = StdRng::seed_from_u64(n as u64);
        self.array(&mut rng, n)
    }
}

/// 题目模块契约
pub trait ProblemModule {
    /// 题目标识，同时是夹具文件名前缀
    fn problem_id(&self) -> &str;
    fn solutions(&self) -> &SolutionTable;
    fn judge(&self) -> Option<JudgeFn> {
        None
    }
    fn generator(&self) -> Option<&dyn InputGenerator> {
        None
    }
}
