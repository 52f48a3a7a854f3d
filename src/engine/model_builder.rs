// ==========================================
// 晶圆生产计划 - 模型构建器
// ==========================================
// 职责: 由参数索引声明决策变量, 生成约束集与加权目标函数
// 输入: PlanningInputs (只读) + ScenarioConfig
// 输出: PlanningModel (求解器无关)
// 红线: 构建过程确定性, 无隐藏状态; 相同输入得到相同模型
// ==========================================

use crate::config::config_manager::{ParameterSource, ParameterSources};
use crate::config::model_config::{InitialInventoryMode, ModelConfig, ScenarioConfig};
use crate::config::model_variant::{ConstraintGroups, ObjectiveScheme};
use crate::domain::period::PeriodAxis;
use crate::domain::types::{ConstraintKind, Sense};
use crate::engine::error::ModelError;
use crate::engine::model::{
    CellVariables, Constraint, ConstraintKey, LinearExpr, Objective, ObjectiveSense, PlanningModel,
};
use crate::importer::parameter_index::{ParameterIndex, ParameterTable};
use tracing::{debug, info, instrument, trace, warn};

// ==========================================
// PlanningInputs - 单情景建模输入
// ==========================================
// 必需参数: 有效需求、安全库存目标
// 可选参数: None 表示"不约束", 对应约束不生成或取默认值
#[derive(Debug, Clone, PartialEq)]
pub struct PlanningInputs {
    pub demand: ParameterIndex,
    pub safety_stock: ParameterIndex,
    pub yielded_supply: Option<ParameterIndex>,
    pub initial_inventory: Option<ParameterIndex>,
    pub yield_factor: Option<ParameterIndex>,
    pub wafer_plan: Option<ParameterIndex>,
    pub boundary: Option<ParameterIndex>,
    pub density: Option<ParameterIndex>,
    pub initial_inventory_mode: InitialInventoryMode,
}

impl PlanningInputs {
    /// 仅含必需参数的输入
    pub fn new(demand: ParameterIndex, safety_stock: ParameterIndex) -> Self {
        Self {
            demand,
            safety_stock,
            yielded_supply: None,
            initial_inventory: None,
            yield_factor: None,
            wafer_plan: None,
            boundary: None,
            density: None,
            initial_inventory_mode: InitialInventoryMode::Actual,
        }
    }

    /// 从参数表解析建模输入
    ///
    /// # 参数
    /// - `table`: 规整后的参数表
    /// - `sources`: 各参数的 (工作表, 属性) 来源
    /// - `mode`: 期初库存处理方式; Zero 时不读取期初库存
    ///
    /// # 返回
    /// - Err(MissingParameter): 必需参数缺失
    pub fn resolve(
        table: &ParameterTable,
        sources: &ParameterSources,
        mode: InitialInventoryMode,
    ) -> Result<Self, ModelError> {
        let required = |source: &ParameterSource| {
            table
                .index(&source.sheet, source.attribute.as_deref())
                .map_err(ModelError::from)
        };
        let optional = |name: &str, source: &ParameterSource| {
            let index = table.lookup(&source.sheet, source.attribute.as_deref());
            if index.is_none() {
                debug!(
                    parameter = name,
                    sheet = %source.sheet,
                    attribute = ?source.attribute,
                    "可选参数缺失, 按不约束处理"
                );
            }
            index
        };

        let initial_inventory = match mode {
            InitialInventoryMode::Zero => None,
            InitialInventoryMode::Actual => optional("initial_inventory", &sources.initial_inventory),
        };

        Ok(Self {
            demand: required(&sources.demand)?,
            safety_stock: required(&sources.safety_stock)?,
            yielded_supply: optional("yielded_supply", &sources.yielded_supply),
            initial_inventory,
            yield_factor: optional("yield", &sources.yield_factor),
            wafer_plan: optional("wafer_plan", &sources.wafer_plan),
            boundary: optional("boundary", &sources.boundary),
            density: optional("density", &sources.density),
            initial_inventory_mode: mode,
        })
    }

    pub fn with_yielded_supply(mut self, index: ParameterIndex) -> Self {
        self.yielded_supply = Some(index);
        self
    }

    pub fn with_initial_inventory(mut self, index: ParameterIndex) -> Self {
        self.initial_inventory = Some(index);
        self
    }

    pub fn with_yield_factor(mut self, index: ParameterIndex) -> Self {
        self.yield_factor = Some(index);
        self
    }

    pub fn with_wafer_plan(mut self, index: ParameterIndex) -> Self {
        self.wafer_plan = Some(index);
        self
    }

    pub fn with_boundary(mut self, index: ParameterIndex) -> Self {
        self.boundary = Some(index);
        self
    }

    pub fn with_density(mut self, index: ParameterIndex) -> Self {
        self.density = Some(index);
        self
    }

    pub fn with_initial_inventory_mode(mut self, mode: InitialInventoryMode) -> Self {
        self.initial_inventory_mode = mode;
        self
    }

    // ===== 单元格取值 (含默认值) =====

    pub fn demand_at(&self, product: &str, period: &str) -> f64 {
        self.demand.get_or(product, period, 0.0)
    }

    pub fn safety_stock_at(&self, product: &str, period: &str) -> f64 {
        self.safety_stock.get_or(product, period, 0.0)
    }

    /// 首周期期初库存 (Zero 模式或缺失时为 0)
    pub fn opening_inventory(&self, product: &str, first_period: &str) -> f64 {
        match self.initial_inventory_mode {
            InitialInventoryMode::Zero => 0.0,
            InitialInventoryMode::Actual => self
                .initial_inventory
                .as_ref()
                .and_then(|idx| idx.get(product, first_period))
                .unwrap_or(0.0),
        }
    }

    /// 良率 (缺失为 1)
    pub fn yield_at(&self, product: &str, period: &str) -> f64 {
        optional_value(&self.yield_factor, product, period).unwrap_or(1.0)
    }

    /// 单片密度 (产品级, 缺失为 1)
    pub fn density_of(&self, product: &str) -> f64 {
        self.density
            .as_ref()
            .and_then(|idx| idx.scalar(product))
            .unwrap_or(1.0)
    }

    /// 输入数据的最大量级 (BIGM 校验用)
    pub fn max_magnitude(&self) -> f64 {
        let opening = match self.initial_inventory_mode {
            InitialInventoryMode::Zero => None,
            InitialInventoryMode::Actual => self.initial_inventory.as_ref(),
        };
        [Some(&self.demand), Some(&self.safety_stock), self.yielded_supply.as_ref(), opening]
            .into_iter()
            .flatten()
            .map(ParameterIndex::max_abs)
            .fold(0.0, f64::max)
    }
}

fn optional_value(index: &Option<ParameterIndex>, product: &str, period: &str) -> Option<f64> {
    index.as_ref().and_then(|idx| idx.get(product, period))
}

// ==========================================
// ModelBuilder - 模型构建器
// ==========================================
pub struct ModelBuilder<'a> {
    config: &'a ModelConfig,
}

impl<'a> ModelBuilder<'a> {
    pub fn new(config: &'a ModelConfig) -> Self {
        Self { config }
    }

    /// 构建单情景规划模型
    ///
    /// 流程:
    /// 1) 由有效需求确定产品集合与周期轴 (各产品周期轴必须一致)
    /// 2) BIGM 量级校验
    /// 3) 声明变量 (禁用约束组对应的松弛变量固定为 0)
    /// 4) 逐 (产品, 周期) 生成单元格约束
    /// 5) 生成跨产品/跨周期约束
    /// 6) 按变体的加权方案生成目标函数
    ///
    /// # 返回
    /// - Err(EmptyUniverse): 需求中无产品或无周期
    /// - Err(InconsistentPeriodAxis): 某产品的周期与参考轴不一致
    /// - Err(BigMTooSmall): BIGM 不足以松弛约束
    #[instrument(skip(self, inputs, scenario), fields(
        scenario = %scenario.name,
        variant = %scenario.variant,
        initial_inventory = ?inputs.initial_inventory_mode
    ))]
    pub fn build(
        &self,
        inputs: &PlanningInputs,
        scenario: &ScenarioConfig,
    ) -> Result<PlanningModel, ModelError> {
        self.config.validate().map_err(ModelError::InvalidConfig)?;

        let (products, axis) = resolve_universe(&inputs.demand)?;
        self.check_big_m(inputs)?;

        let groups = scenario.constraint_groups();
        let frozen = self.frozen_mask(&axis, scenario, groups);

        let mut model = PlanningModel::new(&scenario.name, scenario.variant, products, axis);
        pin_disabled_variables(&mut model, groups);

        for product_idx in 0..model.products().len() {
            for period_idx in 0..model.periods().len() {
                self.add_cell_constraints(
                    &mut model,
                    inputs,
                    groups,
                    product_idx,
                    period_idx,
                    frozen[period_idx],
                );
            }
        }
        self.add_cross_constraints(&mut model, groups, &frozen);

        let objective = self.objective(&model, scenario.objective_scheme());
        model.set_objective(objective);

        info!(
            variant_title = scenario.variant.title_cn(),
            products = model.products().len(),
            periods = model.periods().len(),
            variables = model.variable_count(),
            integer_variables = model.integer_variable_count(),
            constraints = model.constraint_count(),
            frozen_periods = frozen.iter().filter(|f| **f).count(),
            "模型构建完成"
        );
        Ok(model)
    }

    fn check_big_m(&self, inputs: &PlanningInputs) -> Result<(), ModelError> {
        let required = inputs.max_magnitude();
        if self.config.big_m <= required {
            return Err(ModelError::BigMTooSmall {
                big_m: self.config.big_m,
                required,
            });
        }
        Ok(())
    }

    /// 冻结周期标记 (不在周期轴上的冻结周期忽略)
    fn frozen_mask(
        &self,
        axis: &PeriodAxis,
        scenario: &ScenarioConfig,
        groups: ConstraintGroups,
    ) -> Vec<bool> {
        let mut mask = vec![false; axis.len()];
        if !groups.frozen_horizon {
            return mask;
        }
        for label in scenario.frozen_periods(self.config) {
            match axis.position(label) {
                Some(idx) => mask[idx] = true,
                None => warn!(period = %label, "冻结周期不在周期轴上, 已忽略"),
            }
        }
        mask
    }

    // ==========================================
    // 单元格约束
    // ==========================================

    fn add_cell_constraints(
        &self,
        model: &mut PlanningModel,
        inputs: &PlanningInputs,
        groups: ConstraintGroups,
        product_idx: usize,
        period_idx: usize,
        frozen: bool,
    ) {
        let product = model.products()[product_idx].clone();
        let periods = model.periods().clone();
        let period = periods.as_slice()[period_idx].as_str();

        let cell = *model.cell(product_idx, period_idx);
        let prev: Option<CellVariables> =
            (period_idx > 0).then(|| *model.cell(product_idx, period_idx - 1));

        let demand = inputs.demand_at(&product, period);
        let target = inputs.safety_stock_at(&product, period);
        let big_m = self.config.big_m;

        // 上期库存: 首周期取期初库存
        let inventory_prev = match prev {
            Some(p) => LinearExpr::var(p.inventory),
            None => LinearExpr::constant(inputs.opening_inventory(&product, period)),
        };

        let mut emit = |kind: ConstraintKind, lhs: LinearExpr, sense: Sense, rhs: LinearExpr| {
            model.add_constraint(Constraint::new(
                ConstraintKey::new(kind, Some(&product), Some(period)),
                lhs,
                sense,
                rhs,
            ));
        };

        trace!(product = %product, period = %period, demand, target, frozen, "生成单元格约束");

        // ===== 生产侧约束 (冻结单元格只保留 x = W = W5 = 0) =====
        if frozen {
            for (kind, var) in [
                (ConstraintKind::FrozenProduction, cell.production),
                (ConstraintKind::FrozenWafer, cell.wafers),
                (ConstraintKind::FrozenWaferMultiple, cell.wafer_multiples),
            ] {
                emit(kind, LinearExpr::var(var), Sense::Eq, LinearExpr::constant(0.0));
            }
        } else {
            // 可选产能上限 (参数存在才生成)
            if groups.yielded_supply_cap {
                if let Some(cap) = optional_value(&inputs.yielded_supply, &product, period) {
                    emit(
                        ConstraintKind::YieldedSupplyCap,
                        LinearExpr::var(cell.production),
                        Sense::Le,
                        LinearExpr::constant(cap),
                    );
                }
            }
            if groups.wafer_plan_cap {
                if let Some(cap) = optional_value(&inputs.wafer_plan, &product, period) {
                    emit(
                        ConstraintKind::WaferPlanCap,
                        LinearExpr::var(cell.wafers),
                        Sense::Le,
                        LinearExpr::constant(cap),
                    );
                }
            }
            if groups.boundary_limits {
                if let Some(limit) = optional_value(&inputs.boundary, &product, period) {
                    emit(
                        ConstraintKind::BoundaryLimit,
                        LinearExpr::var(cell.wafers),
                        Sense::Le,
                        LinearExpr::constant(limit),
                    );
                }
            }

            // x = 良率 · 密度 · W
            let factor = inputs.yield_at(&product, period) * inputs.density_of(&product);
            emit(
                ConstraintKind::YieldConversion,
                LinearExpr::var(cell.production),
                Sense::Eq,
                LinearExpr::new().plus(cell.wafers, factor),
            );

            // W = 批量 · W5
            emit(
                ConstraintKind::LotSize,
                LinearExpr::var(cell.wafers),
                Sense::Eq,
                LinearExpr::new().plus(cell.wafer_multiples, self.config.lot_size),
            );

            // W - W_prev ≤ 爬坡上限 (首周期不生成)
            if let (true, Some(p)) = (groups.ramp_up, prev) {
                emit(
                    ConstraintKind::RampUp,
                    LinearExpr::var(cell.wafers).plus(p.wafers, -1.0),
                    Sense::Le,
                    LinearExpr::constant(self.config.ramp_up_limit),
                );
            }

            // x ≤ D + SST - I_prev + M·SSV
            if groups.anti_overproduction && demand > 0.0 && target > 0.0 {
                emit(
                    ConstraintKind::AntiOverproduction,
                    LinearExpr::var(cell.production),
                    Sense::Le,
                    LinearExpr::constant(demand + target)
                        .plus_expr(&inventory_prev, -1.0)
                        .plus(cell.violation, big_m),
                );
            }
        }

        // ===== 库存侧约束 =====

        // I = I_prev + x - D (+ S)
        let mut balance = inventory_prev
            .clone()
            .plus(cell.production, 1.0)
            .plus_constant(-demand);
        if groups.shortage_slack {
            balance = balance.plus(cell.shortage, 1.0);
        }
        emit(
            ConstraintKind::InventoryBalance,
            LinearExpr::var(cell.inventory),
            Sense::Eq,
            balance,
        );

        // I ≥ SST - M·SSV
        if groups.soft_safety_stock {
            emit(
                ConstraintKind::SafetyStockFloor,
                LinearExpr::var(cell.inventory),
                Sense::Ge,
                LinearExpr::constant(target).plus(cell.violation, -big_m),
            );
        }

        // S ≥ D - (x + I_prev)
        if groups.shortage_slack {
            emit(
                ConstraintKind::ShortageBound,
                LinearExpr::var(cell.shortage),
                Sense::Ge,
                LinearExpr::constant(demand)
                    .plus(cell.production, -1.0)
                    .plus_expr(&inventory_prev, -1.0),
            );
        }

        // E ≥ I - SST
        emit(
            ConstraintKind::ExcessDefinition,
            LinearExpr::var(cell.excess),
            Sense::Ge,
            LinearExpr::var(cell.inventory).plus_constant(-target),
        );

        // 受安全库存管理的产品: 库存硬区间
        if groups.safety_stock_band && target > 0.0 {
            let band = self.config.safety_stock_band;
            emit(
                ConstraintKind::SafetyStockBandLower,
                LinearExpr::var(cell.inventory),
                Sense::Ge,
                LinearExpr::constant(band.lower),
            );
            emit(
                ConstraintKind::SafetyStockBandUpper,
                LinearExpr::var(cell.inventory),
                Sense::Le,
                LinearExpr::constant(band.upper),
            );
        }
    }

    // ==========================================
    // 跨产品/跨周期约束
    // ==========================================

    fn add_cross_constraints(
        &self,
        model: &mut PlanningModel,
        groups: ConstraintGroups,
        frozen: &[bool],
    ) {
        let products = model.products().to_vec();
        let periods = model.periods().clone();

        // 每周期投片总量下限 (冻结周期除外)
        if groups.min_throughput && self.config.min_wafer_throughput > 0.0 {
            for (period_idx, period) in periods.iter().enumerate() {
                if frozen[period_idx] {
                    continue;
                }
                let total = (0..products.len()).fold(LinearExpr::new(), |acc, product_idx| {
                    acc.plus(model.cell(product_idx, period_idx).wafers, 1.0)
                });
                model.add_constraint(Constraint::new(
                    ConstraintKey::new(ConstraintKind::MinWaferThroughput, None, Some(period)),
                    total,
                    Sense::Ge,
                    LinearExpr::constant(self.config.min_wafer_throughput),
                ));
            }
        }

        // 末期库存归零
        if groups.terminal_inventory {
            let last_idx = periods.len() - 1;
            for (product_idx, product) in products.iter().enumerate() {
                let inventory = model.cell(product_idx, last_idx).inventory;
                model.add_constraint(Constraint::new(
                    ConstraintKey::new(
                        ConstraintKind::TerminalInventory,
                        Some(product),
                        Some(periods.last()),
                    ),
                    LinearExpr::var(inventory),
                    Sense::Eq,
                    LinearExpr::constant(0.0),
                ));
            }
        }
    }

    // ==========================================
    // 目标函数
    // ==========================================

    fn objective(&self, model: &PlanningModel, scheme: ObjectiveScheme) -> Objective {
        let cost = self.config.cost;
        let mut terms = Vec::with_capacity(model.products().len() * model.periods().len() * 4);

        for (product_idx, product) in model.products().iter().enumerate() {
            let weight = self.config.priority_weight(product);
            let penalty = self.config.excess_penalty(product);

            for period_idx in 0..model.periods().len() {
                let cell = model.cell(product_idx, period_idx);
                match scheme {
                    ObjectiveScheme::WeightedCost => terms.extend([
                        (cell.shortage, weight * cost.shortage),
                        (cell.excess, cost.excess),
                        (cell.violation, cost.violation),
                        (cell.inventory, cost.holding),
                    ]),
                    ObjectiveScheme::InventoryExcess => {
                        terms.extend([(cell.inventory, weight), (cell.excess, penalty)])
                    }
                }
            }
        }

        Objective {
            sense: ObjectiveSense::Minimize,
            expr: LinearExpr::from_distinct_terms(terms),
        }
    }
}

// ==========================================
// 辅助函数
// ==========================================

/// 产品集合与周期轴 (取自有效需求, 各产品周期轴须一致)
fn resolve_universe(demand: &ParameterIndex) -> Result<(Vec<String>, PeriodAxis), ModelError> {
    let products = demand.products().to_vec();
    let reference: &[String] = products
        .first()
        .and_then(|p| demand.periods(p))
        .unwrap_or(&[]);

    if products.is_empty() || reference.is_empty() {
        return Err(ModelError::EmptyUniverse {
            products: products.len(),
            periods: reference.len(),
        });
    }

    for product in products.iter().skip(1) {
        let actual = demand.periods(product).unwrap_or(&[]);
        if actual != reference {
            return Err(ModelError::InconsistentPeriodAxis {
                product: product.clone(),
                expected: reference.to_vec(),
                actual: actual.to_vec(),
            });
        }
    }

    let axis = PeriodAxis::new(reference.to_vec()).map_err(ModelError::InvalidConfig)?;
    Ok((products, axis))
}

/// 约束组关闭时, 对应松弛变量上界固定为 0
fn pin_disabled_variables(model: &mut PlanningModel, groups: ConstraintGroups) {
    let pin_shortage = !groups.shortage_slack;
    let pin_violation = !groups.soft_safety_stock && !groups.anti_overproduction;
    if !pin_shortage && !pin_violation {
        return;
    }

    for product_idx in 0..model.products().len() {
        for period_idx in 0..model.periods().len() {
            let cell = *model.cell(product_idx, period_idx);
            if pin_shortage {
                model.set_upper(cell.shortage, 0.0);
            }
            if pin_violation {
                model.set_upper(cell.violation, 0.0);
            }
        }
    }
}
