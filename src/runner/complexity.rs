// 复杂度估计模块
// 对多档输入规模计时，用最小二乘在候选曲线族里选残差最小的一条

use log::{debug, warn};
use serde::Serialize;
use std::io::Cursor;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::Instant;

use crate::error::Result;
use crate::runner::registry::ProblemModule;
use crate::runner::selector;

/// 候选复杂度类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ComplexityClass {
    Constant,
    Logarithmic,
    Linear,
    Linearithmic,
    Quadratic,
    Cubic,
    Exponential,
}

impl ComplexityClass {
    pub fn label(&self) -> &'static str {
        match self {
            ComplexityClass::Constant => "O(1)",
            ComplexityClass::Logarithmic => "O(log n)",
            ComplexityClass::Linear => "O(n)",
            ComplexityClass::Linearithmic => "O(n log n)",
            ComplexityClass::Quadratic => "O(n^2)",
            ComplexityClass::Cubic => "O(n^3)",
            ComplexityClass::Exponential => "O(2^n)",
        }
    }

    /// 基函数 f(n)，拟合 t ≈ a·f(n)
    pub fn basis(&self, n: f64) -> f64 {
        match self {
            ComplexityClass::Constant => 1.0,
            ComplexityClass::Logarithmic => n.max(2.0).ln(),
            ComplexityClass::Linear => n,
            ComplexityClass::Linearithmic => n * n.max(2.0).ln(),
            ComplexityClass::Quadratic => n * n,
            ComplexityClass::Cubic => n * n * n,
            ComplexityClass::Exponential => 2f64.powf(n),
        }
    }
}

const POLYNOMIAL_CANDIDATES: &[ComplexityClass] = &[
    ComplexityClass::Constant,
    ComplexityClass::Logarithmic,
    ComplexityClass::Linear,
    ComplexityClass::Linearithmic,
    ComplexityClass::Quadratic,
    ComplexityClass::Cubic,
];

/// 指数曲线只在小规模下还有意义
const EXPONENTIAL_MAX_N: usize = 30;

/// 拟合结果：最优曲线、比例系数与均方根残差
#[derive(Debug, Clone, Serialize)]
pub struct FitResult {
    pub class: ComplexityClass,
    pub scale: f64,
    pub residual: f64,
}

/// 曲线拟合器；samples 为 (规模, 毫秒)
pub trait CurveFitter {
    fn fit(&self, samples: &[(usize, f64)], candidates: &[ComplexityClass]) -> Option<FitResult>;
}

/// 单参数最小二乘：对每个候选解 a = Σ(t·f)/Σ(f²)，取 RMSE 最小者
pub struct LeastSquaresFitter;

impl CurveFitter for LeastSquaresFitter {
    fn fit(&self, samples: &[(usize, f64)], candidates: &[ComplexityClass]) -> Option<FitResult> {
        if samples.is_empty() {
            return None;
        }

        let mut best: Option<FitResult> = None;
        for &class in candidates {
            let mut tf = 0.0;
            let mut ff = 0.0;
            for &(n, t) in samples {
                let f = class.basis(n as f64);
                tf += t * f;
                ff += f * f;
            }
            if ff == 0.0 {
                continue;
            }
            let scale = tf / ff;

            let sq_sum: f64 = samples
                .iter()
                .map(|&(n, t)| {
                    let e = t - scale * class.basis(n as f64);
                    e * e
                })
                .sum();
            let residual = (sq_sum / samples.len() as f64).sqrt();

            if best.as_ref().map(|b| residual < b.residual).unwrap_or(true) {
                best = Some(FitResult {
                    class,
                    scale,
                    residual,
                });
            }
        }
        best
    }
}

/// 估计器配置
#[derive(Debug, Clone)]
pub struct EstimatorConfig {
    /// 递增的输入规模档位
    pub sizes: Vec<usize>,
    /// 每档重复次数，取均值抵抗抖动
    pub repetitions: usize,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            sizes: vec![10, 20, 50, 100, 200, 500, 1000, 2000],
            repetitions: 3,
        }
    }
}

/// 估计结果
#[derive(Debug, Clone, Serialize)]
pub enum ComplexityEstimate {
    Fitted {
        class: ComplexityClass,
        /// 0..=1，残差相对平均耗时越小越可信
        confidence: f64,
        samples: Vec<(usize, f64)>,
    },
    InsufficientData {
        samples: Vec<(usize, f64)>,
    },
    Unavailable {
        reason: String,
    },
}

/// 复杂度估计器
pub struct ComplexityEstimator {
    config: EstimatorConfig,
    fitter: Option<Box<dyn CurveFitter>>,
}

impl ComplexityEstimator {
    pub fn new(config: EstimatorConfig) -> Self {
        Self {
            config,
            fitter: Some(Box::new(LeastSquaresFitter)),
        }
    }

    pub fn with_fitter(config: EstimatorConfig, fitter: Box<dyn CurveFitter>) -> Self {
        Self {
            config,
            fitter: Some(fitter),
        }
    }

    /// 无拟合器的估计器只会报 Unavailable
    pub fn without_fitter(config: EstimatorConfig) -> Self {
        Self {
            config,
            fitter: None,
        }
    }

    /// 对指定变体计时并拟合；失败档位丢弃，存活样本不足 3 个时不下结论
    pub fn estimate(
        &self,
        module: &dyn ProblemModule,
        variant: Option<&str>,
    ) -> Result<ComplexityEstimate> {
        let generator = match module.generator() {
            Some(generator) => generator,
            None => {
                return Ok(ComplexityEstimate::Unavailable {
                    reason: format!("problem {} has no input generator", module.problem_id()),
                })
            }
        };
        let fitter = match &self.fitter {
            Some(fitter) => fitter,
            None => {
                return Ok(ComplexityEstimate::Unavailable {
                    reason: "no curve fitter configured".to_string(),
                })
            }
        };

        let (variant_key, entry) = selector::resolve_variant(module.solutions(), variant)?;

        let mut samples: Vec<(usize, f64)> = Vec::with_capacity(self.config.sizes.len());
        for &n in &self.config.sizes {
            let payload = generator.generate_for_complexity(n);
            let mut total_ms = 0.0;
            let mut survivors = 0usize;

            for _ in 0..self.config.repetitions.max(1) {
                let mut solver = (entry.make)();
                let payload = payload.clone();
                let started = Instant::now();
                let outcome = catch_unwind(AssertUnwindSafe(|| {
                    let mut reader = Cursor::new(payload.into_bytes());
                    let mut sink = std::io::sink();
                    solver.solve(&mut reader, &mut sink)
                }));
                let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;

                match outcome {
                    Ok(Ok(())) => {
                        total_ms += elapsed_ms;
                        survivors += 1;
                    }
                    Ok(Err(e)) => warn!(
                        "{} [{}] failed at n={}: {:#}",
                        module.problem_id(),
                        variant_key,
                        n,
                        e
                    ),
                    Err(_) => warn!(
                        "{} [{}] panicked at n={}",
                        module.problem_id(),
                        variant_key,
                        n
                    ),
                }
            }

            if survivors > 0 {
                let mean = total_ms / survivors as f64;
                debug!("{} [{}] n={} mean={:.3}ms", module.problem_id(), variant_key, n, mean);
                samples.push((n, mean));
            }
        }

        if samples.len() < 3 {
            return Ok(ComplexityEstimate::InsufficientData { samples });
        }

        let max_n = samples.iter().map(|&(n, _)| n).max().unwrap_or(0);
        let mut candidates = POLYNOMIAL_CANDIDATES.to_vec();
        if max_n <= EXPONENTIAL_MAX_N {
            candidates.push(ComplexityClass::Exponential);
        }

        match fitter.fit(&samples, &candidates) {
            Some(fit) => {
                let mean_t = samples.iter().map(|&(_, t)| t).sum::<f64>() / samples.len() as f64;
                let confidence = if mean_t > 0.0 {
                    (1.0 - fit.residual / mean_t).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                Ok(ComplexityEstimate::Fitted {
                    class: fit.class,
                    confidence,
                    samples,
                })
            }
            None => Ok(ComplexityEstimate::InsufficientData { samples }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::registry::{
        InputGenerator, SolutionEntry, SolutionMeta, SolutionTable, Solver,
    };
    use std::hint::black_box;
    use std::io::{BufRead, Write};

    #[test]
    fn test_fitter_identifies_linear() {
        let samples: Vec<(usize, f64)> =
            vec![(10, 2.0), (100, 20.0), (1000, 200.0), (10000, 2000.0)];
        let fit = LeastSquaresFitter
            .fit(&samples, POLYNOMIAL_CANDIDATES)
            .unwrap();
        assert_eq!(fit.class, ComplexityClass::Linear);
        assert!((fit.scale - 0.2).abs() < 1e-9);
        assert!(fit.residual < 1e-9);
    }

    #[test]
    fn test_fitter_identifies_quadratic() {
        let samples: Vec<(usize, f64)> = [10usize, 50, 100, 500, 1000]
            .iter()
            .map(|&n| (n, 0.003 * (n * n) as f64))
            .collect();
        let fit = LeastSquaresFitter
            .fit(&samples, POLYNOMIAL_CANDIDATES)
            .unwrap();
        assert_eq!(fit.class, ComplexityClass::Quadratic);
    }

    #[test]
    fn test_fitter_identifies_constant() {
        let samples: Vec<(usize, f64)> =
            vec![(10, 5.0), (100, 5.0), (1000, 5.0), (10000, 5.0)];
        let fit = LeastSquaresFitter
            .fit(&samples, POLYNOMIAL_CANDIDATES)
            .unwrap();
        assert_eq!(fit.class, ComplexityClass::Constant);
    }

    #[test]
    fn test_fitter_empty_samples() {
        assert!(LeastSquaresFitter.fit(&[], POLYNOMIAL_CANDIDATES).is_none());
    }

    /// 线性工作量解法：读一行 n，做 n 份不可折叠的工作
    struct LinearWorkSolver;

    impl Solver for LinearWorkSolver {
        fn solve(&mut self, input: &mut dyn BufRead, output: &mut dyn Write) -> anyhow::Result<()> {
            let mut line = String::new();
            input.read_line(&mut line)?;
            let n: u64 = line.trim().parse()?;
            let mut acc = 0u64;
            for i in 0..n * 50_000 {
                acc = acc.wrapping_add(black_box(i));
            }
            writeln!(output, "{}", acc)?;
            Ok(())
        }
    }

    struct SizeLineGenerator;

    impl InputGenerator for SizeLineGenerator {
        fn generate(&self, count: usize, _seed: Option<u64>) -> Vec<String> {
            (1..=count).map(|i| format!("{}\n", i)).collect()
        }
        fn generate_for_complexity(&self, n: usize) -> String {
            format!("{}\n", n)
        }
    }

    struct LinearWorkProblem {
        table: SolutionTable,
        generator: SizeLineGenerator,
    }

    impl LinearWorkProblem {
        fn new() -> Self {
            let table = SolutionTable::new(vec![(
                "default",
                SolutionEntry {
                    meta: SolutionMeta::new("LinearWork", "solve", "O(n)", "linear loop"),
                    make: || Box::new(LinearWorkSolver),
                },
            )])
            .unwrap();
            Self {
                table,
                generator: SizeLineGenerator,
            }
        }
    }

    impl ProblemModule for LinearWorkProblem {
        fn problem_id(&self) -> &str {
            "linear_work"
        }
        fn solutions(&self) -> &SolutionTable {
            &self.table
        }
        fn generator(&self) -> Option<&dyn InputGenerator> {
            Some(&self.generator)
        }
    }

    struct GeneratorlessProblem {
        table: SolutionTable,
    }

    impl ProblemModule for GeneratorlessProblem {
        fn problem_id(&self) -> &str {
            "no_gen"
        }
        fn solutions(&self) -> &SolutionTable {
            &self.table
        }
    }

    #[test]
    fn test_unavailable_without_generator() {
        let problem = GeneratorlessProblem {
            table: SolutionTable::new(vec![(
                "default",
                SolutionEntry {
                    meta: SolutionMeta::new("S", "solve", "O(1)", ""),
                    make: || Box::new(LinearWorkSolver),
                },
            )])
            .unwrap(),
        };
        let estimator = ComplexityEstimator::new(EstimatorConfig::default());
        let estimate = estimator.estimate(&problem, None).unwrap();
        assert!(matches!(estimate, ComplexityEstimate::Unavailable { .. }));
    }

    #[test]
    fn test_unavailable_without_fitter() {
        let estimator = ComplexityEstimator::without_fitter(EstimatorConfig::default());
        let estimate = estimator.estimate(&LinearWorkProblem::new(), None).unwrap();
        assert!(matches!(estimate, ComplexityEstimate::Unavailable { .. }));
    }

    #[test]
    fn test_insufficient_data_with_too_few_sizes() {
        let estimator = ComplexityEstimator::new(EstimatorConfig {
            sizes: vec![10, 20],
            repetitions: 1,
        });
        let estimate = estimator.estimate(&LinearWorkProblem::new(), None).unwrap();
        assert!(matches!(
            estimate,
            ComplexityEstimate::InsufficientData { .. }
        ));
    }

    #[test]
    fn test_estimates_linear_work_as_linear() {
        let estimator = ComplexityEstimator::new(EstimatorConfig {
            sizes: vec![50, 100, 200, 400, 800],
            repetitions: 3,
        });
        let estimate = estimator.estimate(&LinearWorkProblem::new(), None).unwrap();
        match estimate {
            ComplexityEstimate::Fitted {
                class, confidence, ..
            } => {
                assert_eq!(class, ComplexityClass::Linear);
                assert!(confidence > 0.5, "confidence {}", confidence);
            }
            other => panic!("expected a fitted estimate, got {:?}", other),
        }
    }

    #[test]
    fn test_exponential_only_for_small_n() {
        // 大规模样本不该把 2^n 放进候选；这里直接验证基函数取舍
        let samples: Vec<(usize, f64)> = vec![(5, 32.0), (10, 1024.0), (15, 32768.0)];
        let mut candidates = POLYNOMIAL_CANDIDATES.to_vec();
        candidates.push(ComplexityClass::Exponential);
        let fit = LeastSquaresFitter.fit(&samples, &candidates).unwrap();
        assert_eq!(fit.class, ComplexityClass::Exponential);
    }
}
