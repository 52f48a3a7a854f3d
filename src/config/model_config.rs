// ==========================================
// 晶圆生产计划 - 建模参数与情景配置
// ==========================================
// 职责: 建模常量 (BIGM、爬坡上限、批量、最小投片量、安全库存区间)、
//       目标函数系数、产品优先级、情景定义
// ==========================================

use crate::config::model_variant::{ConstraintGroups, ModelVariant, ObjectiveScheme};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ==========================================
// CostWeights - 加权成本目标系数
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostWeights {
    pub shortage: f64,  // α 缺货成本
    pub excess: f64,    // β 超量成本
    pub violation: f64, // δ 安全库存违反罚 (主导项)
    pub holding: f64,   // γ 持有成本
}

impl Default for CostWeights {
    fn default() -> Self {
        Self {
            shortage: 10.0,
            excess: 5.0,
            violation: 1000.0,
            holding: 1.0,
        }
    }
}

// ==========================================
// SafetyStockBand - 安全库存硬区间
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SafetyStockBand {
    pub lower: f64,
    pub upper: f64,
}

impl Default for SafetyStockBand {
    fn default() -> Self {
        Self {
            lower: 70_000_000.0,
            upper: 140_000_000.0,
        }
    }
}

// ==========================================
// ModelConfig - 建模参数
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub big_m: f64,
    pub ramp_up_limit: f64,
    pub lot_size: f64,
    pub min_wafer_throughput: f64,
    pub safety_stock_band: SafetyStockBand,
    pub cost: CostWeights,

    /// 产品优先级权重 (未列出的产品为 1)
    pub priority_weights: HashMap<String, f64>,

    /// 产品超量罚系数 (库存与超量方案使用, 未列出的产品为 1)
    pub excess_penalties: HashMap<String, f64>,

    /// 默认冻结周期 (情景可覆写)
    pub frozen_periods: Vec<String>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            big_m: 1e6,
            ramp_up_limit: 560.0,
            lot_size: 5.0,
            min_wafer_throughput: 350.0,
            safety_stock_band: SafetyStockBand::default(),
            cost: CostWeights::default(),
            priority_weights: HashMap::new(),
            excess_penalties: HashMap::new(),
            frozen_periods: Vec::new(),
        }
    }
}

impl ModelConfig {
    pub fn priority_weight(&self, product: &str) -> f64 {
        self.priority_weights.get(product).copied().unwrap_or(1.0)
    }

    pub fn excess_penalty(&self, product: &str) -> f64 {
        self.excess_penalties.get(product).copied().unwrap_or(1.0)
    }

    /// 参数合法性校验
    pub fn validate(&self) -> Result<(), String> {
        if !(self.big_m.is_finite() && self.big_m > 0.0) {
            return Err(format!("big_m 必须为正数: {}", self.big_m));
        }
        if !(self.lot_size.is_finite() && self.lot_size > 0.0) {
            return Err(format!("lot_size 必须为正数: {}", self.lot_size));
        }
        if self.ramp_up_limit < 0.0 {
            return Err(format!("ramp_up_limit 不能为负: {}", self.ramp_up_limit));
        }
        if self.min_wafer_throughput < 0.0 {
            return Err(format!(
                "min_wafer_throughput 不能为负: {}",
                self.min_wafer_throughput
            ));
        }
        let band = self.safety_stock_band;
        if band.lower < 0.0 || band.lower > band.upper {
            return Err(format!(
                "safety_stock_band 区间非法: [{}, {}]",
                band.lower, band.upper
            ));
        }
        let c = self.cost;
        if [c.shortage, c.excess, c.violation, c.holding]
            .iter()
            .any(|w| *w < 0.0)
        {
            return Err("目标函数系数不能为负".to_string());
        }
        if let Some((p, w)) = self
            .priority_weights
            .iter()
            .chain(self.excess_penalties.iter())
            .find(|(_, w)| **w < 0.0)
        {
            return Err(format!("产品 {} 的权重不能为负: {}", p, w));
        }
        Ok(())
    }
}

// ==========================================
// InitialInventoryMode - 期初库存处理
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InitialInventoryMode {
    /// 期初库存 = 0
    Zero,
    /// 期初库存取参数表中的实际值
    Actual,
}

impl Default for InitialInventoryMode {
    fn default() -> Self {
        InitialInventoryMode::Actual
    }
}

// ==========================================
// ScenarioConfig - 情景配置
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioConfig {
    pub name: String,

    #[serde(default)]
    pub variant: ModelVariant,

    #[serde(default)]
    pub initial_inventory: InitialInventoryMode,

    /// 覆写默认冻结周期
    #[serde(default)]
    pub frozen_periods: Option<Vec<String>>,

    /// 覆写变体的约束组
    #[serde(default)]
    pub groups: Option<ConstraintGroups>,
}

impl ScenarioConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            variant: ModelVariant::default(),
            initial_inventory: InitialInventoryMode::default(),
            frozen_periods: None,
            groups: None,
        }
    }

    pub fn with_variant(mut self, variant: ModelVariant) -> Self {
        self.variant = variant;
        self
    }

    pub fn with_initial_inventory(mut self, mode: InitialInventoryMode) -> Self {
        self.initial_inventory = mode;
        self
    }

    pub fn with_frozen_periods(mut self, periods: Vec<String>) -> Self {
        self.frozen_periods = Some(periods);
        self
    }

    pub fn with_groups(mut self, groups: ConstraintGroups) -> Self {
        self.groups = Some(groups);
        self
    }

    /// 生效的约束组 (情景覆写优先)
    pub fn constraint_groups(&self) -> ConstraintGroups {
        self.groups.unwrap_or_else(|| self.variant.constraint_groups())
    }

    pub fn objective_scheme(&self) -> ObjectiveScheme {
        self.variant.objective_scheme()
    }

    /// 生效的冻结周期 (情景覆写优先)
    pub fn frozen_periods<'a>(&'a self, model: &'a ModelConfig) -> &'a [String] {
        self.frozen_periods
            .as_deref()
            .unwrap_or(model.frozen_periods.as_slice())
    }

    /// 默认情景: 期初库存为 0 / 期初库存为实际值
    pub fn defaults() -> Vec<ScenarioConfig> {
        vec![
            ScenarioConfig::new("initial_inventory_zero")
                .with_initial_inventory(InitialInventoryMode::Zero),
            ScenarioConfig::new("initial_inventory_actual")
                .with_initial_inventory(InitialInventoryMode::Actual),
        ]
    }
}
