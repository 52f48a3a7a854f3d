// ==========================================
// 晶圆生产计划 - 配置管理器
// ==========================================
// 职责: 配置加载 (默认值 → JSON 文件 → 环境变量覆写)、校验
// ==========================================

use crate::config::model_config::{ModelConfig, ScenarioConfig};
use crate::importer::normalizer::{SheetLayout, DENSITY_ATTRIBUTE};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

// ==========================================
// 配置键
// ==========================================
pub mod config_keys {
    // 环境变量覆写
    pub const ENV_BIG_M: &str = "WAFER_PLAN_BIG_M";
    pub const ENV_SOLVE_TIMEOUT_SECS: &str = "WAFER_PLAN_SOLVE_TIMEOUT_SECS";

    // 工作表名
    pub const SHEET_SUPPLY_DEMAND: &str = "Supply_Demand";
    pub const SHEET_YIELD: &str = "Yield";
    pub const SHEET_WAFER_PLAN: &str = "Wafer Plan";
    pub const SHEET_BOUNDARY: &str = "Boundary Conditions";
    pub const SHEET_DENSITY: &str = "Density per Wafer";

    // Supply_Demand 属性
    pub const ATTR_EFFECTIVE_DEMAND: &str = "EffectiveDemand";
    pub const ATTR_YIELDED_SUPPLY: &str = "Yielded Supply";
    pub const ATTR_SAFETY_STOCK: &str = "Safety Stock Target";
    pub const ATTR_INITIAL_INVENTORY: &str = "Total Projected Inventory Balance";

    // 单属性表约定属性
    pub const ATTR_AVAILABLE_CAPACITY: &str = "Available Capacity";
}

/// 配置错误
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置文件读取失败: {0}")]
    FileReadError(String),

    #[error("配置解析失败: {0}")]
    ParseError(String),

    #[error("配置值非法 (key: {key}, value: {value}): {message}")]
    InvalidValue {
        key: String,
        value: String,
        message: String,
    },
}

// ==========================================
// ParameterSource - 参数来源 (工作表 + 属性)
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterSource {
    pub sheet: String,
    #[serde(default)]
    pub attribute: Option<String>,
}

impl ParameterSource {
    pub fn new(sheet: &str, attribute: Option<&str>) -> Self {
        Self {
            sheet: sheet.to_string(),
            attribute: attribute.map(str::to_string),
        }
    }
}

/// 建模所需各参数的来源
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParameterSources {
    pub demand: ParameterSource,
    pub yielded_supply: ParameterSource,
    pub safety_stock: ParameterSource,
    pub initial_inventory: ParameterSource,
    pub yield_factor: ParameterSource,
    pub wafer_plan: ParameterSource,
    pub boundary: ParameterSource,
    pub density: ParameterSource,
}

impl Default for ParameterSources {
    fn default() -> Self {
        use config_keys::*;
        Self {
            demand: ParameterSource::new(SHEET_SUPPLY_DEMAND, Some(ATTR_EFFECTIVE_DEMAND)),
            yielded_supply: ParameterSource::new(SHEET_SUPPLY_DEMAND, Some(ATTR_YIELDED_SUPPLY)),
            safety_stock: ParameterSource::new(SHEET_SUPPLY_DEMAND, Some(ATTR_SAFETY_STOCK)),
            initial_inventory: ParameterSource::new(SHEET_SUPPLY_DEMAND, Some(ATTR_INITIAL_INVENTORY)),
            yield_factor: ParameterSource::new(SHEET_YIELD, None),
            wafer_plan: ParameterSource::new(SHEET_WAFER_PLAN, None),
            boundary: ParameterSource::new(SHEET_BOUNDARY, None),
            density: ParameterSource::new(SHEET_DENSITY, Some(DENSITY_ATTRIBUTE)),
        }
    }
}

// ==========================================
// PlannerConfig - 顶层配置
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    pub model: ModelConfig,
    pub sources: ParameterSources,

    /// 需要规整的工作表 (缺失即报错)
    pub required_sheets: Vec<String>,

    /// 工作表版式 (未配置的工作表按通用版式)
    pub layouts: HashMap<String, SheetLayout>,

    /// 每张表顶部剥离的标题行数
    pub title_rows: usize,

    /// 单情景求解超时 (秒)
    pub solve_timeout_secs: u64,

    pub scenarios: Vec<ScenarioConfig>,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        use config_keys::*;

        let mut layouts = HashMap::new();
        layouts.insert(SHEET_DENSITY.to_string(), SheetLayout::SingleRowDensity);
        layouts.insert(SHEET_SUPPLY_DEMAND.to_string(), SheetLayout::AttributeKeyed);
        layouts.insert(
            SHEET_WAFER_PLAN.to_string(),
            SheetLayout::SingleAttribute {
                attribute: ATTR_AVAILABLE_CAPACITY.to_string(),
            },
        );

        Self {
            model: ModelConfig::default(),
            sources: ParameterSources::default(),
            required_sheets: [
                SHEET_SUPPLY_DEMAND,
                SHEET_YIELD,
                SHEET_WAFER_PLAN,
                SHEET_BOUNDARY,
                SHEET_DENSITY,
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            layouts,
            title_rows: 1,
            solve_timeout_secs: 120,
            scenarios: ScenarioConfig::defaults(),
        }
    }
}

impl PlannerConfig {
    /// 从 JSON 文件加载 (缺省字段取默认值)
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileReadError(format!("{}: {}", path.display(), e)))?;
        let config: PlannerConfig =
            serde_json::from_str(&raw).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        info!(path = %path.display(), scenarios = config.scenarios.len(), "配置文件加载完成");
        Ok(config)
    }

    /// 加载配置: 文件 (可选) → 环境变量覆写 → 校验
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(p) => Self::from_json_file(p)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// 按键读取覆写值
    ///
    /// # 参数
    /// - `lookup`: 键 → 原始值 (通常为环境变量读取)
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(config_keys::ENV_BIG_M) {
            self.model.big_m = parse_value(config_keys::ENV_BIG_M, &raw)?;
            info!(big_m = self.model.big_m, "big_m 由环境变量覆写");
        }
        if let Some(raw) = lookup(config_keys::ENV_SOLVE_TIMEOUT_SECS) {
            self.solve_timeout_secs = parse_value(config_keys::ENV_SOLVE_TIMEOUT_SECS, &raw)?;
            info!(
                solve_timeout_secs = self.solve_timeout_secs,
                "求解超时由环境变量覆写"
            );
        }
        Ok(())
    }

    /// 配置校验
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.model.validate().map_err(|message| ConfigError::InvalidValue {
            key: "model".to_string(),
            value: String::new(),
            message,
        })?;

        if self.solve_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "solve_timeout_secs".to_string(),
                value: "0".to_string(),
                message: "求解超时必须大于 0".to_string(),
            });
        }

        let mut names = HashSet::new();
        for scenario in &self.scenarios {
            if scenario.name.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    key: "scenarios.name".to_string(),
                    value: scenario.name.clone(),
                    message: "情景名称不能为空".to_string(),
                });
            }
            if !names.insert(scenario.name.as_str()) {
                return Err(ConfigError::InvalidValue {
                    key: "scenarios.name".to_string(),
                    value: scenario.name.clone(),
                    message: "情景名称重复".to_string(),
                });
            }
        }

        if self.scenarios.is_empty() {
            warn!("未配置任何情景");
        }
        Ok(())
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse::<T>().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: raw.to_string(),
        message: "无法解析".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::model_config::InitialInventoryMode;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config_is_valid() {
        let config = PlannerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.required_sheets.len(), 5);
        assert_eq!(config.scenarios.len(), 2);
        assert_eq!(
            config.layouts.get(config_keys::SHEET_DENSITY),
            Some(&SheetLayout::SingleRowDensity)
        );
    }

    #[test]
    fn test_from_json_file_partial() {
        let mut temp_file = NamedTempFile::new().unwrap();
        write!(
            temp_file,
            r#"{{
                "model": {{"big_m": 1e9, "priority_weights": {{"22B": 3, "23C": 5}}}},
                "scenarios": [{{"name": "zero", "initial_inventory": "zero", "variant": "inventory_excess"}}]
            }}"#
        )
        .unwrap();

        let config = PlannerConfig::from_json_file(temp_file.path()).unwrap();
        assert_eq!(config.model.big_m, 1e9);
        assert_eq!(config.model.priority_weight("23C"), 5.0);
        assert_eq!(config.model.ramp_up_limit, 560.0);
        assert_eq!(config.scenarios.len(), 1);
        assert_eq!(config.scenarios[0].initial_inventory, InitialInventoryMode::Zero);
        assert_eq!(config.title_rows, 1);
    }

    #[test]
    fn test_from_json_file_parse_error() {
        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "{{ not json").unwrap();
        let err = PlannerConfig::from_json_file(temp_file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_overrides() {
        let mut config = PlannerConfig::default();
        config
            .apply_overrides(|key| match key {
                config_keys::ENV_BIG_M => Some("5e8".to_string()),
                config_keys::ENV_SOLVE_TIMEOUT_SECS => Some(" 30 ".to_string()),
                _ => None,
            })
            .unwrap();
        assert_eq!(config.model.big_m, 5e8);
        assert_eq!(config.solve_timeout_secs, 30);

        let err = config
            .apply_overrides(|key| (key == config_keys::ENV_BIG_M).then(|| "huge".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_duplicate_scenario_names_rejected() {
        let mut config = PlannerConfig::default();
        config.scenarios.push(ScenarioConfig::new("initial_inventory_zero"));
        assert!(config.validate().is_err());
    }
}
