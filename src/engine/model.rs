// ==========================================
// 晶圆生产计划 - 规划模型 (求解器无关)
// ==========================================
// 职责: 决策变量、带键约束、线性目标的纯值表示
// 约束键: (种类, 产品, 周期), 同键至多一条, 重复写入覆盖
// 红线: 不依赖具体求解器; 变量只声明一次, 被所有约束共享
// ==========================================

use crate::config::model_variant::ModelVariant;
use crate::domain::period::PeriodAxis;
use crate::domain::types::{ConstraintKind, Sense, VariableDomain, VariableKind};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

// ==========================================
// VarId - 变量句柄
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct VarId(usize);

impl VarId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// 决策变量声明
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Variable {
    pub id: VarId,
    pub kind: VariableKind,
    pub product: String,
    pub period: String,
    pub domain: VariableDomain,
    pub lower: f64,
    pub upper: Option<f64>,
}

impl Variable {
    /// 诊断名, 如 `W[21A,Q4 03]`
    pub fn name(&self) -> String {
        format!("{}[{},{}]", self.kind.symbol(), self.product, self.period)
    }
}

// ==========================================
// LinearExpr - 线性表达式
// ==========================================
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct LinearExpr {
    terms: Vec<(VarId, f64)>,
    constant: f64,
}

impl LinearExpr {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn constant(value: f64) -> Self {
        Self {
            terms: Vec::new(),
            constant: value,
        }
    }

    pub fn var(var: VarId) -> Self {
        Self::new().plus(var, 1.0)
    }

    /// 由互不重复的项直接构造 (不做合并检查)
    pub(crate) fn from_distinct_terms(terms: Vec<(VarId, f64)>) -> Self {
        Self {
            terms,
            constant: 0.0,
        }
        .without_zero_terms()
    }

    /// 追加 coef · var (同一变量的系数合并)
    pub fn plus(mut self, var: VarId, coef: f64) -> Self {
        match self.terms.iter_mut().find(|(v, _)| *v == var) {
            Some((_, c)) => *c += coef,
            None => self.terms.push((var, coef)),
        }
        self
    }

    pub fn plus_constant(mut self, value: f64) -> Self {
        self.constant += value;
        self
    }

    /// self + factor · other
    pub fn plus_expr(mut self, other: &LinearExpr, factor: f64) -> Self {
        for (var, coef) in &other.terms {
            self = self.plus(*var, coef * factor);
        }
        self.constant += other.constant * factor;
        self
    }

    pub fn terms(&self) -> &[(VarId, f64)] {
        &self.terms
    }

    pub fn offset(&self) -> f64 {
        self.constant
    }

    /// 按变量取值求表达式值
    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.terms
            .iter()
            .map(|(var, coef)| coef * values.get(var.index()).copied().unwrap_or(0.0))
            .sum::<f64>()
            + self.constant
    }

    fn without_zero_terms(mut self) -> Self {
        self.terms.retain(|(_, c)| *c != 0.0);
        self
    }
}

// ==========================================
// Constraint - 带键线性约束
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ConstraintKey {
    pub kind: ConstraintKind,
    pub product: Option<String>,
    pub period: Option<String>,
}

impl ConstraintKey {
    pub fn new(kind: ConstraintKind, product: Option<&str>, period: Option<&str>) -> Self {
        Self {
            kind,
            product: product.map(str::to_string),
            period: period.map(str::to_string),
        }
    }
}

impl fmt::Display for ConstraintKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}[{},{}]",
            self.kind,
            self.product.as_deref().unwrap_or("*"),
            self.period.as_deref().unwrap_or("*")
        )
    }
}

/// 规范形式: Σ coef·var (sense) rhs
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Constraint {
    pub key: ConstraintKey,
    pub lhs: LinearExpr,
    pub sense: Sense,
    pub rhs: f64,
}

impl Constraint {
    /// 由 `lhs (sense) rhs` 两侧表达式构造, 变量移至左侧、常数移至右侧
    pub fn new(key: ConstraintKey, lhs: LinearExpr, sense: Sense, rhs: LinearExpr) -> Self {
        let (lhs_offset, rhs_offset) = (lhs.offset(), rhs.offset());
        let rhs_value = rhs_offset - lhs_offset;
        let lhs = lhs
            .plus_constant(-lhs_offset)
            .plus_expr(&rhs.plus_constant(-rhs_offset), -1.0)
            .without_zero_terms();
        Self {
            key,
            lhs,
            sense,
            rhs: rhs_value,
        }
    }

    /// 违反量 (满足时为 0)
    pub fn violation(&self, values: &[f64]) -> f64 {
        let lhs = self.lhs.evaluate(values);
        match self.sense {
            Sense::Le => (lhs - self.rhs).max(0.0),
            Sense::Ge => (self.rhs - lhs).max(0.0),
            Sense::Eq => (lhs - self.rhs).abs(),
        }
    }
}

// ==========================================
// Objective - 目标函数
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ObjectiveSense {
    Minimize,
    Maximize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Objective {
    pub sense: ObjectiveSense,
    pub expr: LinearExpr,
}

impl Default for Objective {
    fn default() -> Self {
        Self {
            sense: ObjectiveSense::Minimize,
            expr: LinearExpr::new(),
        }
    }
}

// ==========================================
// CellVariables - 单个 (产品, 周期) 的全部变量
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellVariables {
    pub production: VarId,
    pub inventory: VarId,
    pub wafers: VarId,
    pub wafer_multiples: VarId,
    pub shortage: VarId,
    pub excess: VarId,
    pub violation: VarId,
}

impl CellVariables {
    pub fn get(&self, kind: VariableKind) -> VarId {
        match kind {
            VariableKind::Production => self.production,
            VariableKind::Inventory => self.inventory,
            VariableKind::WaferCount => self.wafers,
            VariableKind::WaferMultiple => self.wafer_multiples,
            VariableKind::Shortage => self.shortage,
            VariableKind::Excess => self.excess,
            VariableKind::SafetyStockViolation => self.violation,
        }
    }
}

/// 候选解的违反项
#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    /// 约束键或变量名
    pub subject: String,
    /// 约束种类 (变量界/整数性违反时为 None)
    pub kind: Option<ConstraintKind>,
    pub amount: f64,
}

// ==========================================
// PlanningModel - 单情景规划模型
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct PlanningModel {
    scenario: String,
    variant: ModelVariant,
    products: Vec<String>,
    periods: PeriodAxis,
    variables: Vec<Variable>,
    cells: Vec<CellVariables>,
    constraints: Vec<Constraint>,
    constraint_slots: HashMap<ConstraintKey, usize>,
    objective: Objective,
}

impl PlanningModel {
    /// 为每个 (产品, 周期) 声明全部变量种类, 下界 0, 定义域按种类
    pub(crate) fn new(
        scenario: &str,
        variant: ModelVariant,
        products: Vec<String>,
        periods: PeriodAxis,
    ) -> Self {
        let mut variables = Vec::with_capacity(products.len() * periods.len() * VariableKind::ALL.len());
        let mut cells = Vec::with_capacity(products.len() * periods.len());

        for product in &products {
            for period in periods.iter() {
                let mut declare = |kind: VariableKind| {
                    let id = VarId(variables.len());
                    variables.push(Variable {
                        id,
                        kind,
                        product: product.clone(),
                        period: period.to_string(),
                        domain: kind.domain(),
                        lower: 0.0,
                        upper: None,
                    });
                    id
                };
                cells.push(CellVariables {
                    production: declare(VariableKind::Production),
                    inventory: declare(VariableKind::Inventory),
                    wafers: declare(VariableKind::WaferCount),
                    wafer_multiples: declare(VariableKind::WaferMultiple),
                    shortage: declare(VariableKind::Shortage),
                    excess: declare(VariableKind::Excess),
                    violation: declare(VariableKind::SafetyStockViolation),
                });
            }
        }

        Self {
            scenario: scenario.to_string(),
            variant,
            products,
            periods,
            variables,
            cells,
            constraints: Vec::new(),
            constraint_slots: HashMap::new(),
            objective: Objective::default(),
        }
    }

    // ===== 构建期写入 =====

    /// 写入约束; 同键已存在时覆盖并返回 true
    pub(crate) fn add_constraint(&mut self, constraint: Constraint) -> bool {
        match self.constraint_slots.get(&constraint.key) {
            Some(&slot) => {
                self.constraints[slot] = constraint;
                true
            }
            None => {
                self.constraint_slots
                    .insert(constraint.key.clone(), self.constraints.len());
                self.constraints.push(constraint);
                false
            }
        }
    }

    pub(crate) fn set_upper(&mut self, var: VarId, upper: f64) {
        if let Some(v) = self.variables.get_mut(var.index()) {
            v.upper = Some(upper);
        }
    }

    pub(crate) fn set_objective(&mut self, objective: Objective) {
        self.objective = objective;
    }

    // ===== 只读访问 =====

    pub fn scenario(&self) -> &str {
        &self.scenario
    }

    pub fn variant(&self) -> ModelVariant {
        self.variant
    }

    pub fn products(&self) -> &[String] {
        &self.products
    }

    pub fn periods(&self) -> &PeriodAxis {
        &self.periods
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn variable(&self, id: VarId) -> Option<&Variable> {
        self.variables.get(id.index())
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn objective(&self) -> &Objective {
        &self.objective
    }

    pub fn variable_count(&self) -> usize {
        self.variables.len()
    }

    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    pub fn integer_variable_count(&self) -> usize {
        self.variables
            .iter()
            .filter(|v| v.domain.is_integral())
            .count()
    }

    /// 按下标取单元格变量
    pub fn cell(&self, product_idx: usize, period_idx: usize) -> &CellVariables {
        &self.cells[product_idx * self.periods.len() + period_idx]
    }

    /// 按名称取变量句柄
    pub fn var(&self, kind: VariableKind, product: &str, period: &str) -> Option<VarId> {
        let p = self.products.iter().position(|x| x == product)?;
        let t = self.periods.position(period)?;
        Some(self.cell(p, t).get(kind))
    }

    /// 按键取约束
    pub fn constraint(
        &self,
        kind: ConstraintKind,
        product: Option<&str>,
        period: Option<&str>,
    ) -> Option<&Constraint> {
        let key = ConstraintKey::new(kind, product, period);
        self.constraint_slots
            .get(&key)
            .map(|&slot| &self.constraints[slot])
    }

    pub fn count_constraints(&self, kind: ConstraintKind) -> usize {
        self.constraints.iter().filter(|c| c.key.kind == kind).count()
    }

    // ===== 可行性检查 =====

    /// 检查候选解: 约束、变量界、整数性
    ///
    /// # 参数
    /// - `assignment`: 按 VarId 下标排列的变量取值 (缺失视为 0)
    /// - `tolerance`: 数值容差
    ///
    /// # 返回
    /// 全部违反项 (空表示可行)
    pub fn violations(&self, assignment: &[f64], tolerance: f64) -> Vec<Violation> {
        let mut found = Vec::new();

        for var in &self.variables {
            let value = assignment.get(var.id.index()).copied().unwrap_or(0.0);
            let below = var.lower - value;
            let above = var.upper.map(|u| value - u).unwrap_or(0.0);
            let fractional = if var.domain.is_integral() {
                (value - value.round()).abs()
            } else {
                0.0
            };
            let amount = below.max(above).max(fractional);
            if amount > tolerance {
                found.push(Violation {
                    subject: var.name(),
                    kind: None,
                    amount,
                });
            }
        }

        for constraint in &self.constraints {
            let amount = constraint.violation(assignment);
            if amount > tolerance {
                found.push(Violation {
                    subject: constraint.key.to_string(),
                    kind: Some(constraint.key.kind),
                    amount,
                });
            }
        }

        found
    }
}
