// ==========================================
// 晶圆生产计划 - 模型变体定义
// ==========================================
// 用途：
// - 同一建模器的不同配置变体 (可选约束组 + 目标函数加权方案);
// - 多情景对比时按名称选择, 保证结果可复现。

use serde::{Deserialize, Serialize};

/// 目标函数加权方案
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectiveScheme {
    /// Σ 优先级·α·缺货 + β·超量 + δ·违反 + γ·库存
    WeightedCost,
    /// Σ 优先级·库存 + 超量罚系数·超量 (不含缺货/违反项)
    InventoryExcess,
}

/// 可选约束组开关
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct ConstraintGroups {
    pub yielded_supply_cap: bool,  // x ≤ 良品供给
    pub wafer_plan_cap: bool,      // W ≤ 投片计划产能
    pub boundary_limits: bool,     // W ≤ 边界条件
    pub shortage_slack: bool,      // 库存平衡含缺货松弛 + 缺货下界
    pub soft_safety_stock: bool,   // 安全库存软下限 (带违反指示)
    pub safety_stock_band: bool,   // 安全库存硬区间
    pub anti_overproduction: bool, // 防超产上限
    pub ramp_up: bool,             // 投片爬坡上限
    pub min_throughput: bool,      // 每周期最小投片总量
    pub terminal_inventory: bool,  // 末期库存归零
    pub frozen_horizon: bool,      // 冻结区
}

impl ConstraintGroups {
    /// 全部约束组开启
    pub fn all() -> Self {
        Self {
            yielded_supply_cap: true,
            wafer_plan_cap: true,
            boundary_limits: true,
            shortage_slack: true,
            soft_safety_stock: true,
            safety_stock_band: true,
            anti_overproduction: true,
            ramp_up: true,
            min_throughput: true,
            terminal_inventory: true,
            frozen_horizon: true,
        }
    }
}

impl Default for ConstraintGroups {
    fn default() -> Self {
        Self::all()
    }
}

/// 模型变体（情景对比时的策略化入口）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelVariant {
    /// 完整约束 + 加权成本目标
    CostWeighted,
    /// 库存 + 超量目标, 不含缺货松弛与安全库存违反指示
    InventoryExcess,
    /// 加权成本目标, 不含边界条件与爬坡约束
    Relaxed,
}

impl ModelVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelVariant::CostWeighted => "cost_weighted",
            ModelVariant::InventoryExcess => "inventory_excess",
            ModelVariant::Relaxed => "relaxed",
        }
    }

    pub fn title_cn(&self) -> &'static str {
        match self {
            ModelVariant::CostWeighted => "加权成本",
            ModelVariant::InventoryExcess => "库存与超量",
            ModelVariant::Relaxed => "放宽产能",
        }
    }

    /// 该变体启用的约束组
    pub fn constraint_groups(&self) -> ConstraintGroups {
        match self {
            ModelVariant::CostWeighted => ConstraintGroups::all(),
            ModelVariant::InventoryExcess => ConstraintGroups {
                shortage_slack: false,
                soft_safety_stock: false,
                anti_overproduction: false,
                ..ConstraintGroups::all()
            },
            ModelVariant::Relaxed => ConstraintGroups {
                boundary_limits: false,
                ramp_up: false,
                ..ConstraintGroups::all()
            },
        }
    }

    /// 该变体的目标函数方案
    pub fn objective_scheme(&self) -> ObjectiveScheme {
        match self {
            ModelVariant::InventoryExcess => ObjectiveScheme::InventoryExcess,
            ModelVariant::CostWeighted | ModelVariant::Relaxed => ObjectiveScheme::WeightedCost,
        }
    }
}

impl Default for ModelVariant {
    fn default() -> Self {
        ModelVariant::CostWeighted
    }
}

impl std::fmt::Display for ModelVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ModelVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cost_weighted" | "cost-weighted" => Ok(ModelVariant::CostWeighted),
            "inventory_excess" | "inventory-excess" => Ok(ModelVariant::InventoryExcess),
            "relaxed" => Ok(ModelVariant::Relaxed),
            other => Err(format!("未知模型变体: {}", other)),
        }
    }
}
