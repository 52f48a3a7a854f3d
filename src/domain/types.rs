// ==========================================
// 晶圆生产计划 - 领域类型定义
// ==========================================
// 职责: 决策变量种类、变量定义域、约束种类、求解状态
// 红线: 所有决策变量非负; 整数性在声明时确定, 不做事后取整
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 决策变量种类 (Variable Kind)
// ==========================================
// 每个 (产品, 周期) 各有一个实例, 被所有相关约束共享
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariableKind {
    Production,           // x   成品产量
    Inventory,            // I   期末库存
    WaferCount,           // W   投片数
    WaferMultiple,        // W5  投片批量倍数 (整数)
    Shortage,             // S   缺货松弛
    Excess,               // E   超出安全库存部分
    SafetyStockViolation, // SSV 安全库存违反指示 (0/1)
}

impl VariableKind {
    /// 全部变量种类（按结果表输出顺序）
    pub const ALL: [VariableKind; 7] = [
        VariableKind::Production,
        VariableKind::Inventory,
        VariableKind::WaferCount,
        VariableKind::WaferMultiple,
        VariableKind::Shortage,
        VariableKind::Excess,
        VariableKind::SafetyStockViolation,
    ];

    /// 模型中的短符号（用于变量命名与扁平导出）
    pub fn symbol(&self) -> &'static str {
        match self {
            VariableKind::Production => "x",
            VariableKind::Inventory => "I",
            VariableKind::WaferCount => "W",
            VariableKind::WaferMultiple => "W5",
            VariableKind::Shortage => "S",
            VariableKind::Excess => "E",
            VariableKind::SafetyStockViolation => "SSV",
        }
    }

    /// 变量定义域
    pub fn domain(&self) -> VariableDomain {
        match self {
            VariableKind::WaferMultiple => VariableDomain::Integer,
            VariableKind::SafetyStockViolation => VariableDomain::Binary,
            _ => VariableDomain::Continuous,
        }
    }
}

impl fmt::Display for VariableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

// ==========================================
// 变量定义域 (Variable Domain)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariableDomain {
    Continuous,
    Integer,
    Binary,
}

impl VariableDomain {
    pub fn is_integral(&self) -> bool {
        !matches!(self, VariableDomain::Continuous)
    }
}

// ==========================================
// 约束方向 (Sense)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sense {
    Le, // <=
    Ge, // >=
    Eq, // ==
}

impl fmt::Display for Sense {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sense::Le => write!(f, "<="),
            Sense::Ge => write!(f, ">="),
            Sense::Eq => write!(f, "=="),
        }
    }
}

// ==========================================
// 约束种类 (Constraint Kind)
// ==========================================
// 同一 (种类, 产品, 周期) 至多一条约束
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintKind {
    // ===== 可选产能上限 =====
    YieldedSupplyCap,
    WaferPlanCap,
    BoundaryLimit,

    // ===== 库存与安全库存 =====
    InventoryBalance,
    SafetyStockFloor,
    ShortageBound,
    ExcessDefinition,
    SafetyStockBandLower,
    SafetyStockBandUpper,
    AntiOverproduction,

    // ===== 投片换算 =====
    YieldConversion,
    LotSize,
    RampUp,

    // ===== 冻结区 =====
    FrozenProduction,
    FrozenWafer,
    FrozenWaferMultiple,

    // ===== 跨产品/跨周期 =====
    MinWaferThroughput,
    TerminalInventory,
}

impl ConstraintKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConstraintKind::YieldedSupplyCap => "yielded_supply_cap",
            ConstraintKind::WaferPlanCap => "wafer_plan_cap",
            ConstraintKind::BoundaryLimit => "boundary_limit",
            ConstraintKind::InventoryBalance => "inventory_balance",
            ConstraintKind::SafetyStockFloor => "safety_stock_floor",
            ConstraintKind::ShortageBound => "shortage_bound",
            ConstraintKind::ExcessDefinition => "excess_definition",
            ConstraintKind::SafetyStockBandLower => "safety_stock_band_lower",
            ConstraintKind::SafetyStockBandUpper => "safety_stock_band_upper",
            ConstraintKind::AntiOverproduction => "anti_overproduction",
            ConstraintKind::YieldConversion => "yield_conversion",
            ConstraintKind::LotSize => "lot_size",
            ConstraintKind::RampUp => "ramp_up",
            ConstraintKind::FrozenProduction => "frozen_production",
            ConstraintKind::FrozenWafer => "frozen_wafer",
            ConstraintKind::FrozenWaferMultiple => "frozen_wafer_multiple",
            ConstraintKind::MinWaferThroughput => "min_wafer_throughput",
            ConstraintKind::TerminalInventory => "terminal_inventory",
        }
    }
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 求解状态 (Solve Status)
// ==========================================
// 非最优状态写入结果摘要, 不作为错误抛出
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SolveStatus {
    Optimal,
    Feasible,
    Infeasible,
    Unbounded,
    TimedOut,
    NotSolved,
}

impl SolveStatus {
    /// 是否携带可读取的变量取值
    pub fn has_solution(&self) -> bool {
        matches!(self, SolveStatus::Optimal | SolveStatus::Feasible)
    }
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolveStatus::Optimal => write!(f, "OPTIMAL"),
            SolveStatus::Feasible => write!(f, "FEASIBLE"),
            SolveStatus::Infeasible => write!(f, "INFEASIBLE"),
            SolveStatus::Unbounded => write!(f, "UNBOUNDED"),
            SolveStatus::TimedOut => write!(f, "TIMED_OUT"),
            SolveStatus::NotSolved => write!(f, "NOT_SOLVED"),
        }
    }
}
