// 解法选择器模块
// 把"跑哪个变体"从环境解析成可调用对象；显式参数优先于环境变量

use log::{debug, warn};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::runner::registry::{SolutionEntry, SolutionTable, Solver, DEFAULT_VARIANT};

/// 变体选择环境变量
pub const SOLUTION_METHOD_ENV: &str = "SOLUTION_METHOD";
/// 形状报告开关环境变量（0/1，默认 0）
pub const SHAPE_REPORT_ENV: &str = "NEETCODE_SHAPE_REPORT";

/// 解析变体键：显式参数 → 环境变量 → default；未知键回退 default 并告警
pub fn resolve_variant<'a>(
    table: &'a SolutionTable,
    requested: Option<&str>,
) -> Result<(String, &'a SolutionEntry)> {
    let from_env;
    let key = match requested {
        Some(key) => key,
        None => {
            from_env = std::env::var(SOLUTION_METHOD_ENV).unwrap_or_default();
            if from_env.is_empty() {
                DEFAULT_VARIANT
            } else {
                from_env.as_str()
            }
        }
    };

    if let Some(entry) = table.get(key) {
        return Ok((key.to_string(), entry));
    }

    warn!("unknown solution variant {:?}, falling back to default", key);
    table
        .get(DEFAULT_VARIANT)
        .map(|entry| (DEFAULT_VARIANT.to_string(), entry))
        .ok_or_else(|| Error::Config("solution table has no default variant".to_string()))
}

/// 解析并实例化解法
pub fn get_solver(
    table: &SolutionTable,
    requested: Option<&str>,
) -> Result<(String, Box<dyn Solver>)> {
    let (key, entry) = resolve_variant(table, requested)?;
    debug!(
        "selected variant {:?} ({}.{})",
        key, entry.meta.class_name, entry.meta.method_name
    );
    Ok((key, (entry.make)()))
}

/// 形状报告是否开启
pub fn shape_report_enabled() -> bool {
    std::env::var(SHAPE_REPORT_ENV).map(|v| v == "1").unwrap_or(false)
}

/// 诊断用：描述即将喂给解法的输入各行的维度结构，不影响行为
pub fn report_shapes(problem_id: &str, input_text: &str) {
    if !shape_report_enabled() {
        return;
    }
    for (index, line) in input_text.lines().enumerate() {
        let shape = match serde_json::from_str::<Value>(line) {
            Ok(value) => describe_shape(&value),
            Err(_) => "raw text".to_string(),
        };
        debug!("[shape] {} line {}: {}", problem_id, index, shape);
    }
}

fn describe_shape(value: &Value) -> String {
    match value {
        Value::Array(items) => match items.first() {
            Some(first) => format!("array[{}] of {}", items.len(), describe_shape(first)),
            None => "array[0]".to_string(),
        },
        Value::Object(map) => format!("object[{}]", map.len()),
        Value::String(_) => "string".to_string(),
        Value::Number(_) => "number".to_string(),
        Value::Bool(_) => "bool".to_string(),
        Value::Null => "null".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::registry::SolutionMeta;
    use std::io::{BufRead, Write};

    struct TaggedSolver(&'static str);

    impl Solver for TaggedSolver {
        fn solve(&mut self, _input: &mut dyn BufRead, output: &mut dyn Write) -> anyhow::Result<()> {
            writeln!(output, "{:?}", self.0)?;
            Ok(())
        }
    }

    fn table() -> SolutionTable {
        SolutionTable::new(vec![
            (
                "default",
                crate::runner::registry::SolutionEntry {
                    meta: SolutionMeta::new("Solution", "solve", "O(n)", "default"),
                    make: || Box::new(TaggedSolver("default")),
                },
            ),
            (
                "bfs",
                crate::runner::registry::SolutionEntry {
                    meta: SolutionMeta::new("SolutionBfs", "solve", "O(n)", "bfs"),
                    make: || Box::new(TaggedSolver("bfs")),
                },
            ),
        ])
        .unwrap()
    }

    #[test]
    fn test_explicit_variant_wins() {
        let table = table();
        let (key, _) = resolve_variant(&table, Some("bfs")).unwrap();
        assert_eq!(key, "bfs");
    }

    #[test]
    fn test_default_when_nothing_requested() {
        let table = table();
        std::env::remove_var(SOLUTION_METHOD_ENV);
        let (key, _) = resolve_variant(&table, None).unwrap();
        assert_eq!(key, "default");
    }

    #[test]
    fn test_unknown_key_falls_back_to_default() {
        let table = table();
        let (key, _) = resolve_variant(&table, Some("no-such-variant")).unwrap();
        assert_eq!(key, "default");
    }

    #[test]
    fn test_get_solver_instantiates() {
        let table = table();
        let (key, mut solver) = get_solver(&table, Some("bfs")).unwrap();
        assert_eq!(key, "bfs");

        let mut output = Vec::new();
        let mut input = std::io::Cursor::new(b"" as &[u8]);
        solver.solve(&mut input, &mut output).unwrap();
        assert_eq!(String::from_utf8(output).unwrap().trim(), "\"bfs\"");
    }

    #[test]
    fn test_describe_shape() {
        let value: Value = serde_json::from_str("[[1,3],[-2,2]]").unwrap();
        assert_eq!(describe_shape(&value), "array[2] of array[2] of number");
    }
}
