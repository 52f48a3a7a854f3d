// ==========================================
// 晶圆生产计划 - 引擎层错误类型
// ==========================================
// 分层: 建模 → 求解 → 提取 → 情景编排
// 非最优求解状态 (不可行/无界) 不是错误, 写入结果摘要
// ==========================================

use crate::importer::error::IndexError;
use thiserror::Error;

/// 建模错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("必需参数缺失 (sheet: {sheet}, attribute: {attribute})")]
    MissingParameter { sheet: String, attribute: String },

    #[error("产品/周期集合为空 (产品数: {products}, 周期数: {periods})")]
    EmptyUniverse { products: usize, periods: usize },

    #[error("产品 {product} 的周期轴与参考轴不一致: 期望 {expected:?}, 实际 {actual:?}")]
    InconsistentPeriodAxis {
        product: String,
        expected: Vec<String>,
        actual: Vec<String>,
    },

    #[error("BIGM 过小: {big_m} 未超过输入数据最大量级 {required}")]
    BigMTooSmall { big_m: f64, required: f64 },

    #[error("建模参数非法: {0}")]
    InvalidConfig(String),
}

impl From<IndexError> for ModelError {
    fn from(err: IndexError) -> Self {
        match err {
            IndexError::MissingAttribute { sheet, attribute } => {
                ModelError::MissingParameter { sheet, attribute }
            }
        }
    }
}

/// 求解器后端错误 (不含不可行/无界等求解状态)
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverError {
    #[error("求解器后端错误 ({solver}): {message}")]
    Backend { solver: String, message: String },
}

/// 结果提取错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExtractError {
    #[error("变量没有求解值: {variable}")]
    MissingSolution { variable: String },
}

/// 单情景失败原因
#[derive(Error, Debug)]
pub enum ScenarioError {
    #[error("模型构建失败: {0}")]
    Model(#[from] ModelError),

    #[error("求解失败: {0}")]
    Solver(#[from] SolverError),

    #[error("结果提取失败: {0}")]
    Extract(#[from] ExtractError),

    #[error("求解超时 ({millis} 毫秒)")]
    Timeout { millis: u64 },

    #[error("情景任务异常终止: {0}")]
    TaskFailed(String),

    #[error("情景名称重复: {0}")]
    DuplicateScenario(String),
}

impl ScenarioError {
    /// 是否为输入数据问题 (重跑不会改变结果)
    pub fn is_input_error(&self) -> bool {
        matches!(self, ScenarioError::Model(_) | ScenarioError::DuplicateScenario(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_attribute_maps_to_missing_parameter() {
        let err: ModelError = IndexError::MissingAttribute {
            sheet: "Supply_Demand".to_string(),
            attribute: "EffectiveDemand".to_string(),
        }
        .into();
        assert_eq!(
            err,
            ModelError::MissingParameter {
                sheet: "Supply_Demand".to_string(),
                attribute: "EffectiveDemand".to_string(),
            }
        );
        assert!(err.to_string().contains("EffectiveDemand"));
    }

    #[test]
    fn test_scenario_error_classification() {
        let err = ScenarioError::from(ModelError::EmptyUniverse {
            products: 0,
            periods: 0,
        });
        assert!(err.is_input_error());
        assert!(!ScenarioError::Timeout { millis: 200 }.is_input_error());
        assert_eq!(
            ScenarioError::Timeout { millis: 200 }.to_string(),
            "求解超时 (200 毫秒)"
        );
    }
}
