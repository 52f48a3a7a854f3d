// ==========================================
// 求解端到端测试
// ==========================================
// 职责: 建模 → microlp 求解 → 结果提取, 校验解的可行性与结构性质
// ==========================================

mod test_helpers;

use test_helpers::*;
use wafer_plan::config::{
    InitialInventoryMode, ModelConfig, ModelVariant, ParameterSources, ScenarioConfig,
};
use wafer_plan::domain::{SolveStatus, VariableKind};
use wafer_plan::engine::{
    extract, MicroLpSolver, ModelBuilder, PlanningInputs, PlanningModel, PlanningSolver,
    SolverOutcome,
};
use wafer_plan::{ParameterTable, ResultBundle};

fn solve(
    table: &ParameterTable,
    config: &ModelConfig,
    scenario: &ScenarioConfig,
) -> (PlanningModel, SolverOutcome, ResultBundle) {
    let inputs = PlanningInputs::resolve(
        table,
        &ParameterSources::default(),
        scenario.initial_inventory,
    )
    .unwrap();
    let model = ModelBuilder::new(config).build(&inputs, scenario).unwrap();
    let outcome = MicroLpSolver::new().solve(&model).unwrap();
    let bundle = extract(&model, &outcome, scenario).unwrap();
    (model, outcome, bundle)
}

/// 求得的解满足全部约束、变量界与整数性
fn assert_feasible(model: &PlanningModel, outcome: &SolverOutcome) {
    let violations = model.violations(&outcome.values, TOL);
    assert!(violations.is_empty(), "解不可行: {violations:?}");
}

// ==========================================
// 边界情况
// ==========================================

#[test]
fn test_zero_demand_single_cell_is_trivial() {
    logging_init();
    let table = TableBuilder::new()
        .demand("A", &[("P1", 0.0)])
        .safety_stock("A", &[("P1", 0.0)])
        .build();
    let (model, outcome, bundle) = solve(&table, &test_model_config(), &ScenarioConfig::new("s"));

    assert_eq!(bundle.summary.status, SolveStatus::Optimal);
    assert!(approx_eq(bundle.summary.objective.unwrap(), 0.0));
    assert_feasible(&model, &outcome);
    for kind in VariableKind::ALL {
        assert!(approx_eq(bundle.table(kind).get("A", "P1").unwrap(), 0.0), "{kind:?}");
    }
}

// ==========================================
// 两周期单产品
// ==========================================

#[test]
fn test_two_period_plan_meets_demand_and_clears_inventory() {
    let (model, outcome, bundle) = solve(
        &two_period_table(),
        &test_model_config(),
        &ScenarioConfig::new("s"),
    );

    assert_eq!(bundle.summary.status, SolveStatus::Optimal);
    assert_feasible(&model, &outcome);

    // 需求可由投片满足, 最优解无缺货无库存
    assert!(approx_eq(bundle.summary.objective.unwrap(), 0.0));
    assert!(approx_eq(bundle.production_plan.get("A", "P1").unwrap(), 100.0));
    assert!(approx_eq(bundle.production_plan.get("A", "P2").unwrap(), 100.0));
    assert!(approx_eq(bundle.inventory.get("A", "P2").unwrap(), 0.0));
    assert!(approx_eq(bundle.wafer_multiples.get("A", "P1").unwrap(), 20.0));
    assert!(approx_eq(bundle.shortage.get("A", "P1").unwrap(), 0.0));
}

#[test]
fn test_production_follows_yield_and_density() {
    let table = TableBuilder::new()
        .demand("A", &[("P1", 90.0), ("P2", 90.0)])
        .safety_stock("A", &[("P1", 0.0), ("P2", 0.0)])
        .yield_factor("A", &[("P1", 0.9), ("P2", 0.9)])
        .density("A", 2.0)
        .build();
    let (model, outcome, bundle) = solve(&table, &test_model_config(), &ScenarioConfig::new("s"));

    assert_eq!(bundle.summary.status, SolveStatus::Optimal);
    assert_feasible(&model, &outcome);
    for period in ["P1", "P2"] {
        let x = bundle.production_plan.get("A", period).unwrap();
        let w = bundle.wafer_production.get("A", period).unwrap();
        let w5 = bundle.wafer_multiples.get("A", period).unwrap();
        assert!(approx_eq(x, 1.8 * w));
        assert!(approx_eq(w, 5.0 * w5));
        assert_eq!(w5.fract(), 0.0);
    }
    assert!(approx_eq(bundle.wafer_production.get("A", "P1").unwrap(), 50.0));
}

#[test]
fn test_capacity_shortfall_becomes_shortage() {
    let table = TableBuilder::new()
        .demand("A", &[("P1", 100.0), ("P2", 100.0)])
        .safety_stock("A", &[("P1", 0.0), ("P2", 0.0)])
        .wafer_plan("A", &[("P1", 0.0), ("P2", 0.0)])
        .build();
    let (model, outcome, bundle) = solve(&table, &test_model_config(), &ScenarioConfig::new("s"));

    assert_eq!(bundle.summary.status, SolveStatus::Optimal);
    assert_feasible(&model, &outcome);
    assert!(approx_eq(bundle.production_plan.get("A", "P1").unwrap(), 0.0));
    assert!(approx_eq(bundle.shortage.get("A", "P1").unwrap(), 100.0));
    assert!(approx_eq(bundle.shortage.get("A", "P2").unwrap(), 100.0));
    // 缺货单价 10
    assert!(approx_eq(bundle.summary.objective.unwrap(), 2000.0));
}

#[test]
fn test_all_values_non_negative_and_integral_where_declared() {
    let table = TableBuilder::new()
        .demand("A", &[("P1", 37.0), ("P2", 81.0), ("P3", 12.0)])
        .demand("B", &[("P1", 5.0), ("P2", 0.0), ("P3", 44.0)])
        .safety_stock("A", &[("P1", 0.0), ("P2", 0.0), ("P3", 0.0)])
        .safety_stock("B", &[("P1", 0.0), ("P2", 0.0), ("P3", 0.0)])
        .yield_factor("B", &[("P1", 0.8), ("P2", 0.8), ("P3", 0.8)])
        .build();
    let (model, outcome, bundle) = solve(&table, &test_model_config(), &ScenarioConfig::new("s"));

    assert!(bundle.is_solved());
    assert_feasible(&model, &outcome);
    for row in bundle.flat_rows() {
        assert!(row.value >= -TOL, "{row:?}");
    }
    for (_, _, value) in bundle.wafer_multiples.cells() {
        assert_eq!(value.fract(), 0.0);
    }
    for (_, _, value) in bundle.safety_stock_violation.cells() {
        assert!(value == 0.0 || value == 1.0);
    }
    // 末期库存归零
    assert!(approx_eq(bundle.inventory.get("A", "P3").unwrap(), 0.0));
    assert!(approx_eq(bundle.inventory.get("B", "P3").unwrap(), 0.0));
}

// ==========================================
// 期初库存
// ==========================================

fn on_hand_table() -> ParameterTable {
    TableBuilder::new()
        .demand("A", &[("P1", 100.0), ("P2", 100.0)])
        .safety_stock("A", &[("P1", 0.0), ("P2", 0.0)])
        .initial_inventory("A", &[("P1", 30.0)])
        .build()
}

#[test]
fn test_on_hand_stock_offsets_first_period_production() {
    let scenario = ScenarioConfig::new("actual").with_initial_inventory(InitialInventoryMode::Actual);
    let (model, outcome, bundle) = solve(&on_hand_table(), &test_model_config(), &scenario);

    assert_eq!(bundle.summary.status, SolveStatus::Optimal);
    assert_feasible(&model, &outcome);
    assert!(approx_eq(bundle.summary.objective.unwrap(), 0.0));

    // x(A,P1) + 30 ≥ 100, 无多余库存
    let x1 = bundle.production_plan.get("A", "P1").unwrap();
    assert!(x1 + 30.0 >= 100.0 - TOL);
    assert!(approx_eq(x1, 70.0));
    assert!(approx_eq(bundle.inventory.get("A", "P1").unwrap(), 0.0));
    assert!(approx_eq(bundle.shortage.get("A", "P1").unwrap(), 0.0));
    assert!(approx_eq(bundle.production_plan.get("A", "P2").unwrap(), 100.0));
}

#[test]
fn test_zero_mode_override_ignores_on_hand_stock() {
    let inputs = PlanningInputs::resolve(
        &on_hand_table(),
        &ParameterSources::default(),
        InitialInventoryMode::Actual,
    )
    .unwrap()
    .with_initial_inventory_mode(InitialInventoryMode::Zero);
    assert_eq!(inputs.opening_inventory("A", "P1"), 0.0);

    let scenario = ScenarioConfig::new("zero");
    let model = ModelBuilder::new(&test_model_config())
        .build(&inputs, &scenario)
        .unwrap();
    let outcome = MicroLpSolver::new().solve(&model).unwrap();
    let bundle = extract(&model, &outcome, &scenario).unwrap();

    assert_eq!(bundle.summary.status, SolveStatus::Optimal);
    assert_feasible(&model, &outcome);
    assert!(approx_eq(bundle.production_plan.get("A", "P1").unwrap(), 100.0));
}

// ==========================================
// 投片爬坡
// ==========================================

/// 首期投片被计划上限钉在 100, 无缺货松弛
fn ramp_up_table(second_demand: f64) -> ParameterTable {
    TableBuilder::new()
        .demand("A", &[("P1", 100.0), ("P2", second_demand)])
        .safety_stock("A", &[("P1", 0.0), ("P2", 0.0)])
        .wafer_plan("A", &[("P1", 100.0)])
        .build()
}

#[test]
fn test_ramp_up_limit_makes_steep_growth_infeasible() {
    let scenario = ScenarioConfig::new("ramp").with_variant(ModelVariant::InventoryExcess);

    // W(P2) ≥ 2000 > 100 + 560
    let (_, outcome, bundle) = solve(&ramp_up_table(2000.0), &test_model_config(), &scenario);
    assert_eq!(outcome.status, SolveStatus::Infeasible);
    assert!(!bundle.is_solved());

    // 恰好达到爬坡上限时可行
    let (model, outcome, bundle) = solve(&ramp_up_table(660.0), &test_model_config(), &scenario);
    assert_eq!(outcome.status, SolveStatus::Optimal);
    assert_feasible(&model, &outcome);
    assert!(approx_eq(bundle.wafer_production.get("A", "P1").unwrap(), 100.0));
    assert!(approx_eq(bundle.wafer_production.get("A", "P2").unwrap(), 660.0));
}

// ==========================================
// 非最优状态
// ==========================================

#[test]
fn test_infeasible_model_is_status_not_error() {
    // 无缺货松弛且产能为 0: 库存平衡无法满足
    let table = TableBuilder::new()
        .demand("A", &[("P1", 100.0)])
        .safety_stock("A", &[("P1", 0.0)])
        .wafer_plan("A", &[("P1", 0.0)])
        .build();
    let scenario = ScenarioConfig::new("ie").with_variant(ModelVariant::InventoryExcess);
    let (_, outcome, bundle) = solve(&table, &test_model_config(), &scenario);

    assert_eq!(outcome.status, SolveStatus::Infeasible);
    assert!(outcome.values.is_empty());
    assert!(!bundle.is_solved());
    assert_eq!(bundle.summary.objective, None);
    assert!(bundle.production_plan.is_empty());
    assert_eq!(bundle.production_plan.periods(), &["P1".to_string()]);
}

#[test]
fn test_summary_reports_model_size_and_solver() {
    let (model, _, bundle) = solve(
        &two_period_table(),
        &test_model_config(),
        &ScenarioConfig::new("named"),
    );
    assert_eq!(bundle.summary.scenario, "named");
    assert_eq!(bundle.summary.variant, "cost_weighted");
    assert_eq!(bundle.summary.solver, MicroLpSolver::NAME);
    assert_eq!(bundle.summary.variable_count, model.variable_count());
    assert_eq!(bundle.summary.constraint_count, model.constraint_count());
}

fn logging_init() {
    wafer_plan::logging::init_test();
}
