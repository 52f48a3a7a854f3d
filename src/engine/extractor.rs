// ==========================================
// 晶圆生产计划 - 求解结果提取
// ==========================================
// 职责: 求解值 → 按变量种类的 (产品 × 周期) 结果表 + 结果摘要
// 红线: 有解状态下任一变量缺值即报错, 不返回部分结果
// ==========================================

use crate::config::model_config::ScenarioConfig;
use crate::domain::result::{PlanTable, ResultBundle, SolveSummary};
use crate::domain::types::VariableKind;
use crate::engine::error::ExtractError;
use crate::engine::model::PlanningModel;
use crate::engine::solver::SolverOutcome;
use chrono::Utc;
use tracing::{debug, warn};
use uuid::Uuid;

/// 提取单情景结果
///
/// # 参数
/// - `model`: 已求解的规划模型
/// - `outcome`: 求解器输出
/// - `scenario`: 情景配置 (写入摘要)
///
/// # 返回
/// - 非有解状态: 摘要带状态, 结果表为空
/// - Err(MissingSolution): 有解状态但某变量无求解值
pub fn extract(
    model: &PlanningModel,
    outcome: &SolverOutcome,
    scenario: &ScenarioConfig,
) -> Result<ResultBundle, ExtractError> {
    let periods = model.periods().as_slice().to_vec();
    let mut tables: Vec<PlanTable> = VariableKind::ALL
        .iter()
        .map(|_| PlanTable::new(periods.clone()))
        .collect();

    let objective = if outcome.status.has_solution() {
        for (product_idx, product) in model.products().iter().enumerate() {
            for (kind_idx, kind) in VariableKind::ALL.iter().enumerate() {
                let mut row = Vec::with_capacity(periods.len());
                for period_idx in 0..periods.len() {
                    let var = model.cell(product_idx, period_idx).get(*kind);
                    let value = outcome.value(var).ok_or_else(|| ExtractError::MissingSolution {
                        variable: model
                            .variable(var)
                            .map(|v| v.name())
                            .unwrap_or_else(|| format!("#{}", var.index())),
                    })?;
                    row.push(clean(value, kind.domain().is_integral()));
                }
                tables[kind_idx].push_row(product.clone(), row);
            }
        }
        Some(model.objective().expr.evaluate(&outcome.values))
    } else {
        warn!(
            scenario = %scenario.name,
            status = %outcome.status,
            "求解无可用解, 结果表为空"
        );
        None
    };

    let summary = SolveSummary {
        run_id: Uuid::new_v4(),
        scenario: scenario.name.clone(),
        variant: scenario.variant.as_str().to_string(),
        status: outcome.status,
        objective,
        solver: outcome.solver.clone(),
        variable_count: model.variable_count(),
        constraint_count: model.constraint_count(),
        solve_millis: outcome.solve_millis,
        generated_at: Utc::now(),
    };

    debug!(
        scenario = %summary.scenario,
        status = %summary.status,
        objective = ?summary.objective,
        "结果提取完成"
    );

    // 顺序与 VariableKind::ALL 一致
    let mut tables = tables.into_iter();
    let mut next = || tables.next().unwrap_or_default();
    Ok(ResultBundle {
        summary,
        production_plan: next(),
        inventory: next(),
        wafer_production: next(),
        wafer_multiples: next(),
        shortage: next(),
        excess: next(),
        safety_stock_violation: next(),
    })
}

/// 整数变量取整、消除 -0.0 与微小负值
fn clean(value: f64, integral: bool) -> f64 {
    let v = if integral { value.round() } else { value };
    if v.abs() < 1e-9 {
        0.0
    } else {
        v
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::model_variant::ModelVariant;
    use crate::domain::period::PeriodAxis;
    use crate::domain::types::SolveStatus;

    fn model() -> PlanningModel {
        PlanningModel::new(
            "s",
            ModelVariant::CostWeighted,
            vec!["A".to_string()],
            PeriodAxis::new(vec!["P1".to_string(), "P2".to_string()]).unwrap(),
        )
    }

    #[test]
    fn test_extract_tables() {
        let m = model();
        let mut values = vec![0.0; m.variable_count()];
        values[m.var(VariableKind::Production, "A", "P2").unwrap().index()] = 100.0;
        values[m.var(VariableKind::WaferMultiple, "A", "P2").unwrap().index()] = 19.999_999_9;
        values[m.var(VariableKind::Inventory, "A", "P1").unwrap().index()] = -1e-12;

        let outcome = SolverOutcome::solved(SolveStatus::Optimal, values, "test", 3);
        let bundle = extract(&m, &outcome, &ScenarioConfig::new("s")).unwrap();

        assert!(bundle.is_solved());
        assert_eq!(bundle.production_plan.get("A", "P2"), Some(100.0));
        assert_eq!(bundle.wafer_multiples.get("A", "P2"), Some(20.0));
        assert_eq!(bundle.inventory.get("A", "P1"), Some(0.0));
        assert_eq!(bundle.summary.objective, Some(0.0));
        assert_eq!(bundle.summary.variable_count, 14);
        assert_eq!(bundle.flat_rows().len(), 14);
    }

    #[test]
    fn test_extract_without_solution() {
        let m = model();
        let outcome = SolverOutcome::without_solution(SolveStatus::Infeasible, "test", 1);
        let bundle = extract(&m, &outcome, &ScenarioConfig::new("s")).unwrap();

        assert!(!bundle.is_solved());
        assert_eq!(bundle.summary.status, SolveStatus::Infeasible);
        assert!(bundle.summary.objective.is_none());
        assert!(bundle.production_plan.is_empty());
        assert_eq!(bundle.production_plan.periods().len(), 2);
    }

    #[test]
    fn test_missing_value_is_fatal() {
        let m = model();
        // 只有前 3 个变量有值
        let outcome = SolverOutcome::solved(SolveStatus::Optimal, vec![0.0; 3], "test", 1);
        let err = extract(&m, &outcome, &ScenarioConfig::new("s")).unwrap_err();
        assert!(matches!(err, ExtractError::MissingSolution { .. }));
    }
}
