// ==========================================
// 晶圆生产计划 - 领域模型层
// ==========================================
// 职责: 定义周期轴、参数记录、变量/约束类型、求解结果
// 红线: 不含解析逻辑, 不含建模逻辑
// ==========================================

pub mod parameter;
pub mod period;
pub mod result;
pub mod types;

// 重导出核心类型
pub use parameter::{normalize_label, ParameterRecord};
pub use period::PeriodAxis;
pub use result::{FlatRow, PlanRow, PlanTable, ResultBundle, SolveSummary};
pub use types::{ConstraintKind, Sense, SolveStatus, VariableDomain, VariableKind};
