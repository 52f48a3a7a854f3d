// ==========================================
// 晶圆生产计划 - 引擎层
// ==========================================
// 流程: PlanningInputs → ModelBuilder → PlanningSolver → extract
//       ScenarioOrchestrator 负责多情景并发与失败隔离
// 红线: 模型求解器无关; 每个情景独立构建变量与约束, 不共享可变状态
// ==========================================

pub mod error;
pub mod events;
pub mod extractor;
pub mod model;
pub mod model_builder;
pub mod orchestrator;
pub mod solver;

// 重导出核心类型
pub use error::{ExtractError, ModelError, ScenarioError, SolverError};
pub use events::{
    NoOpEventPublisher, OptionalEventPublisher, ScenarioEvent, ScenarioEventPublisher,
    ScenarioEventType,
};
pub use extractor::extract;
pub use model::{
    CellVariables, Constraint, ConstraintKey, LinearExpr, Objective, ObjectiveSense,
    PlanningModel, VarId, Variable, Violation,
};
pub use model_builder::{ModelBuilder, PlanningInputs};
pub use orchestrator::{BatchReport, ScenarioBatch, ScenarioOrchestrator, ScenarioOutcome, ScenarioReport};
pub use solver::{MicroLpSolver, PlanningSolver, SolverOutcome};
