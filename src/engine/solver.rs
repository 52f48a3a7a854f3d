// ==========================================
// 晶圆生产计划 - 求解器桥接
// ==========================================
// 职责: 将求解器无关的 PlanningModel 交给外部 LP/MIP 求解器
// 默认实现: good_lp + microlp (纯 Rust, 每次调用独立实例, 可并发)
// 红线: 不可行/无界是求解状态, 不是错误
// ==========================================

use crate::domain::types::{Sense, SolveStatus, VariableDomain};
use crate::engine::error::SolverError;
use crate::engine::model::{LinearExpr, ObjectiveSense, PlanningModel, VarId};
use good_lp::{
    constraint, variable, Expression, ProblemVariables, ResolutionError, Solution, SolverModel,
    Variable as LpVariable,
};
use std::time::Instant;
use tracing::{debug, info, warn};

// ==========================================
// SolverOutcome - 求解结果
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct SolverOutcome {
    pub status: SolveStatus,
    /// 按 VarId 下标排列的变量取值 (无解时为空)
    pub values: Vec<f64>,
    pub solver: String,
    pub solve_millis: u64,
}

impl SolverOutcome {
    pub fn solved(status: SolveStatus, values: Vec<f64>, solver: &str, solve_millis: u64) -> Self {
        Self {
            status,
            values,
            solver: solver.to_string(),
            solve_millis,
        }
    }

    pub fn without_solution(status: SolveStatus, solver: &str, solve_millis: u64) -> Self {
        Self::solved(status, Vec::new(), solver, solve_millis)
    }

    /// 变量取值 (未求得或非有限值时为 None)
    pub fn value(&self, var: VarId) -> Option<f64> {
        self.values
            .get(var.index())
            .copied()
            .filter(|v| v.is_finite())
    }
}

// ==========================================
// PlanningSolver Trait
// ==========================================

/// 外部 LP/MIP 求解器
///
/// 实现必须线程安全或每次调用独立实例化, 以便多情景并发求解
pub trait PlanningSolver: Send + Sync {
    fn name(&self) -> &str;

    /// 求解模型 (阻塞调用)
    ///
    /// # 返回
    /// - Ok(outcome): 含终止状态; 有解时携带全部变量取值
    /// - Err(SolverError): 求解器后端自身故障
    fn solve(&self, model: &PlanningModel) -> Result<SolverOutcome, SolverError>;
}

// ==========================================
// MicroLpSolver - good_lp + microlp 实现
// ==========================================
#[derive(Debug, Clone, Copy, Default)]
pub struct MicroLpSolver;

impl MicroLpSolver {
    pub const NAME: &'static str = "microlp";

    pub fn new() -> Self {
        Self
    }
}

fn to_expression(expr: &LinearExpr, vars: &[LpVariable]) -> Expression {
    let mut out = Expression::from(expr.offset());
    for (var, coef) in expr.terms() {
        out += vars[var.index()] * *coef;
    }
    out
}

impl PlanningSolver for MicroLpSolver {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn solve(&self, model: &PlanningModel) -> Result<SolverOutcome, SolverError> {
        let started = Instant::now();

        // 1. 变量声明 (定义域 + 上下界)
        let mut problem_vars = ProblemVariables::new();
        let lp_vars: Vec<LpVariable> = model
            .variables()
            .iter()
            .map(|v| {
                let mut def = match v.domain {
                    VariableDomain::Continuous => variable(),
                    VariableDomain::Integer => variable().integer(),
                    VariableDomain::Binary => variable().binary(),
                };
                def = def.min(v.lower);
                if let Some(upper) = v.upper {
                    def = def.max(upper);
                }
                problem_vars.add(def)
            })
            .collect();

        // 2. 目标函数
        let objective = to_expression(&model.objective().expr, &lp_vars);
        let unsolved = match model.objective().sense {
            ObjectiveSense::Minimize => problem_vars.minimise(objective),
            ObjectiveSense::Maximize => problem_vars.maximise(objective),
        };
        let mut problem = unsolved.using(good_lp::solvers::microlp::microlp);

        // 3. 约束
        for c in model.constraints() {
            let lhs = to_expression(&c.lhs, &lp_vars);
            let rhs = c.rhs;
            problem = match c.sense {
                Sense::Le => problem.with(constraint!(lhs <= rhs)),
                Sense::Ge => problem.with(constraint!(lhs >= rhs)),
                Sense::Eq => problem.with(constraint!(lhs == rhs)),
            };
        }

        debug!(
            scenario = %model.scenario(),
            variables = model.variable_count(),
            constraints = model.constraint_count(),
            "提交求解器"
        );

        // 4. 求解
        let result = problem.solve();
        let solve_millis = started.elapsed().as_millis() as u64;

        match result {
            Ok(solution) => {
                let values: Vec<f64> = lp_vars.iter().map(|v| solution.value(*v)).collect();
                info!(scenario = %model.scenario(), solve_millis, "求解完成: 最优");
                Ok(SolverOutcome::solved(
                    SolveStatus::Optimal,
                    values,
                    Self::NAME,
                    solve_millis,
                ))
            }
            Err(ResolutionError::Infeasible) => {
                warn!(scenario = %model.scenario(), solve_millis, "求解完成: 不可行");
                Ok(SolverOutcome::without_solution(
                    SolveStatus::Infeasible,
                    Self::NAME,
                    solve_millis,
                ))
            }
            Err(ResolutionError::Unbounded) => {
                warn!(scenario = %model.scenario(), solve_millis, "求解完成: 无界");
                Ok(SolverOutcome::without_solution(
                    SolveStatus::Unbounded,
                    Self::NAME,
                    solve_millis,
                ))
            }
            Err(e) => Err(SolverError::Backend {
                solver: Self::NAME.to_string(),
                message: e.to_string(),
            }),
        }
    }
}
