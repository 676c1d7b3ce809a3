// 测试运行器模块
// 把解法跑在成对的输入/期望夹具上；输入输出句柄按作用域替换，异常路径不泄漏

use log::{debug, info};
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::io::Cursor;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::runner::registry::{ProblemModule, SolutionEntry};
use crate::runner::selector;

/// 单个夹具的执行结果
#[derive(Debug, Clone, Serialize)]
pub struct FixtureResult {
    pub index: String,
    pub variant: String,
    pub passed: bool,
    pub actual: String,
    pub expected: Option<String>,
    /// 失败时的诊断信息
    pub detail: Option<String>,
}

/// 一次运行的汇总
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub passed: usize,
    pub failed: usize,
    pub details: Vec<FixtureResult>,
}

impl RunReport {
    fn record(&mut self, result: FixtureResult) {
        if result.passed {
            self.passed += 1;
        } else {
            self.failed += 1;
        }
        self.details.push(result);
    }
}

/// 夹具目录上的测试运行器
pub struct TestRunner {
    fixtures_dir: PathBuf,
}

impl TestRunner {
    pub fn new<P: AsRef<Path>>(fixtures_dir: P) -> Self {
        Self {
            fixtures_dir: fixtures_dir.as_ref().to_path_buf(),
        }
    }

    /// 跑一个变体：index 为 None 时按字典序跑全部夹具
    pub fn run(
        &self,
        module: &dyn ProblemModule,
        index: Option<&str>,
        variant: Option<&str>,
    ) -> Result<RunReport> {
        let (variant_key, entry) = selector::resolve_variant(module.solutions(), variant)?;

        let indices = match index {
            Some(index) => vec![index.to_string()],
            None => self.discover_indices(module.problem_id())?,
        };

        let mut report = RunReport::default();
        for index in &indices {
            let result = self.run_fixture(module, index, &variant_key, entry)?;
            report.record(result);
        }
        info!(
            "{} [{}]: {} passed, {} failed",
            module.problem_id(),
            variant_key,
            report.passed,
            report.failed
        );
        Ok(report)
    }

    /// 逐个变体各跑一轮完整夹具
    pub fn run_all_variants(&self, module: &dyn ProblemModule, index: Option<&str>) -> Result<RunReport> {
        let keys: Vec<String> = module.solutions().keys().map(String::from).collect();
        let mut combined = RunReport::default();
        for key in keys {
            let report = self.run(module, index, Some(&key))?;
            combined.passed += report.passed;
            combined.failed += report.failed;
            combined.details.extend(report.details);
        }
        Ok(combined)
    }

    /// 按字典序列出该题的夹具编号；一个都没有视为配置错误
    fn discover_indices(&self, problem_id: &str) -> Result<Vec<String>> {
        let pattern = regex::Regex::new(&format!(
            "^{}_([0-9]+)\\.in$",
            regex::escape(problem_id)
        ))
        .unwrap();

        let entries = fs::read_dir(&self.fixtures_dir).map_err(|e| {
            Error::Config(format!(
                "cannot read fixtures dir {}: {}",
                self.fixtures_dir.display(),
                e
            ))
        })?;

        let mut indices = Vec::new();
        for entry in entries.flatten() {
            let name = entry.file_name();
            if let Some(caps) = name.to_str().and_then(|n| pattern.captures(n)) {
                indices.push(caps[1].to_string());
            }
        }
        if indices.is_empty() {
            return Err(Error::FixtureMissing(
                self.fixtures_dir.join(format!("{}_*.in", problem_id)),
            ));
        }
        indices.sort();
        Ok(indices)
    }

    fn run_fixture(
        &self,
        module: &dyn ProblemModule,
        index: &str,
        variant_key: &str,
        entry: &SolutionEntry,
    ) -> Result<FixtureResult> {
        let in_path = self
            .fixtures_dir
            .join(format!("{}_{}.in", module.problem_id(), index));
        let input_text =
            fs::read_to_string(&in_path).map_err(|_| Error::FixtureMissing(in_path.clone()))?;

        let out_path = self
            .fixtures_dir
            .join(format!("{}_{}.out", module.problem_id(), index));
        let expected_text = fs::read_to_string(&out_path).ok();

        let judge = module.judge();
        if expected_text.is_none() && judge.is_none() {
            return Err(Error::Config(format!(
                "fixture {} has no .out and problem {} declares no judge",
                index,
                module.problem_id()
            )));
        }

        selector::report_shapes(module.problem_id(), &input_text);
        debug!("running {} fixture {} [{}]", module.problem_id(), index, variant_key);

        let mut solver = (entry.make)();
        let mut output: Vec<u8> = Vec::new();
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            let mut reader = Cursor::new(input_text.as_bytes());
            solver.solve(&mut reader, &mut output)
        }));

        let failure = match outcome {
            Ok(Ok(())) => None,
            Ok(Err(e)) => Some(format!("solution error: {:#}", e)),
            Err(panic) => Some(format!("solution panicked: {}", panic_message(&panic))),
        };

        let actual_text = String::from_utf8_lossy(&output).trim().to_string();
        if let Some(detail) = failure {
            return Ok(FixtureResult {
                index: index.to_string(),
                variant: variant_key.to_string(),
                passed: false,
                actual: actual_text,
                expected: expected_text.map(|s| s.trim().to_string()),
                detail: Some(detail),
            });
        }

        let actual_value = parse_literal(&actual_text);
        let expected_trimmed = expected_text.as_deref().map(str::trim);
        let expected_value = expected_trimmed.map(parse_literal).unwrap_or(Value::Null);

        let passed = match judge {
            Some(judge) => judge(&actual_value, &expected_value, &input_text),
            None => actual_value == expected_value,
        };

        Ok(FixtureResult {
            index: index.to_string(),
            variant: variant_key.to_string(),
            passed,
            actual: actual_text,
            expected: expected_trimmed.map(String::from),
            detail: if passed {
                None
            } else {
                Some("output mismatch".to_string())
            },
        })
    }
}

/// 能解析成 JSON 字面量就解析，否则按字符串比较
fn parse_literal(text: &str) -> Value {
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

fn panic_message(panic: &Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
