// ==========================================
// 晶圆生产计划 - 配置层
// ==========================================
// 职责: 建模参数、参数来源、工作表版式、情景定义
// 来源: 默认值 → JSON 配置文件 → 环境变量覆写
// ==========================================

pub mod config_manager;
pub mod model_config;
pub mod model_variant;

// 重导出核心配置类型
pub use config_manager::{config_keys, ConfigError, ParameterSource, ParameterSources, PlannerConfig};
pub use model_config::{CostWeights, InitialInventoryMode, ModelConfig, SafetyStockBand, ScenarioConfig};
pub use model_variant::{ConstraintGroups, ModelVariant, ObjectiveScheme};
