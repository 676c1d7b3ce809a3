// 运行器模块
// 解法注册、变体选择、夹具执行与复杂度测量

pub mod complexity;
pub mod registry;
pub mod runner;
pub mod selector;

pub use complexity::{
    ComplexityClass, ComplexityEstimate, ComplexityEstimator, CurveFitter, EstimatorConfig,
    FitResult, LeastSquaresFitter,
};
pub use registry::{
    InputGenerator, JudgeFn, ProblemModule, SolutionEntry, SolutionMeta, SolutionTable, Solver,
    UniformArrayGenerator, DEFAULT_VARIANT,
};
pub use runner::{FixtureResult, RunReport, TestRunner};
pub use selector::{get_solver, resolve_variant, SHAPE_REPORT_ENV, SOLUTION_METHOD_ENV};
