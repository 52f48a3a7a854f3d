// ==========================================
// 晶圆生产计划 - 核心库
// ==========================================
// 流程: 工作簿 → 参数规整 → 参数索引 → 建模 → 求解 → 结果提取
// 多情景: 期初库存为 0 / 实际值等情景独立并发运行
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 周期轴、参数记录、变量/约束类型、结果结构
pub mod domain;

// 导入层 - 工作簿读取与参数规整
pub mod importer;

// 配置层 - 建模参数与情景定义
pub mod config;

// 引擎层 - 建模、求解、提取、情景编排
pub mod engine;

// 日志系统
pub mod logging;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::{
    FlatRow, ParameterRecord, PeriodAxis, PlanTable, ResultBundle, SolveStatus, SolveSummary,
    VariableKind,
};

// 导入
pub use importer::{ImportError, ParameterIndex, ParameterTable, RawSheet, SheetLayout, WorkbookLoader};

// 配置
pub use config::{InitialInventoryMode, ModelConfig, ModelVariant, PlannerConfig, ScenarioConfig};

// 引擎
pub use engine::{
    extract, MicroLpSolver, ModelBuilder, ModelError, PlanningInputs, PlanningModel,
    PlanningSolver, ScenarioBatch, ScenarioError, ScenarioOrchestrator,
};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "晶圆生产计划优化";
