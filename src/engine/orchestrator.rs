// ==========================================
// 晶圆生产计划 - 情景编排器
// ==========================================
// 职责: 逐情景执行 建模 → 求解 → 提取, 汇总多情景结果
// 并发: 各情景在阻塞线程池上独立运行, 只读共享参数表
// 隔离: 单情景失败 (含超时) 不影响其他情景
// ==========================================

use crate::config::config_manager::{ParameterSources, PlannerConfig};
use crate::config::model_config::{ModelConfig, ScenarioConfig};
use crate::domain::result::ResultBundle;
use crate::engine::error::ScenarioError;
use crate::engine::events::{OptionalEventPublisher, ScenarioEvent, ScenarioEventPublisher};
use crate::engine::extractor::extract;
use crate::engine::model_builder::{ModelBuilder, PlanningInputs};
use crate::engine::solver::{MicroLpSolver, PlanningSolver};
use crate::importer::parameter_index::ParameterTable;
use futures::future::join_all;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, instrument};
use uuid::Uuid;

// ==========================================
// ScenarioBatch - 多情景结果
// ==========================================

/// 单情景结果
#[derive(Debug)]
pub struct ScenarioOutcome {
    pub name: String,
    pub result: Result<ResultBundle, ScenarioError>,
}

/// 一次 run_scenarios 的结果 (按输入顺序)
#[derive(Debug)]
pub struct ScenarioBatch {
    pub batch_id: String,
    pub outcomes: Vec<ScenarioOutcome>,
}

impl ScenarioBatch {
    pub fn get(&self, name: &str) -> Option<&Result<ResultBundle, ScenarioError>> {
        self.outcomes
            .iter()
            .find(|o| o.name == name)
            .map(|o| &o.result)
    }

    pub fn succeeded(&self) -> impl Iterator<Item = (&str, &ResultBundle)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().ok().map(|b| (o.name.as_str(), b)))
    }

    pub fn failed(&self) -> impl Iterator<Item = (&str, &ScenarioError)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (o.name.as_str(), e)))
    }

    pub fn is_all_ok(&self) -> bool {
        self.outcomes.iter().all(|o| o.result.is_ok())
    }

    /// 可序列化报告 (失败情景只保留错误信息)
    pub fn report(&self) -> BatchReport<'_> {
        BatchReport {
            batch_id: &self.batch_id,
            scenarios: self
                .outcomes
                .iter()
                .map(|o| match &o.result {
                    Ok(bundle) => ScenarioReport {
                        scenario: &o.name,
                        result: Some(bundle),
                        error: None,
                    },
                    Err(e) => ScenarioReport {
                        scenario: &o.name,
                        result: None,
                        error: Some(e.to_string()),
                    },
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BatchReport<'a> {
    pub batch_id: &'a str,
    pub scenarios: Vec<ScenarioReport<'a>>,
}

#[derive(Debug, Serialize)]
pub struct ScenarioReport<'a> {
    pub scenario: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<&'a ResultBundle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// ==========================================
// ScenarioOrchestrator - 情景编排器
// ==========================================
#[derive(Clone)]
pub struct ScenarioOrchestrator {
    model_config: Arc<ModelConfig>,
    sources: Arc<ParameterSources>,
    solve_timeout: Duration,
    solver: Arc<dyn PlanningSolver>,
    events: OptionalEventPublisher,
}

impl ScenarioOrchestrator {
    /// 按配置创建编排器 (默认 microlp 求解器, 不发布事件)
    pub fn new(config: &PlannerConfig) -> Self {
        Self {
            model_config: Arc::new(config.model.clone()),
            sources: Arc::new(config.sources.clone()),
            solve_timeout: Duration::from_secs(config.solve_timeout_secs),
            solver: Arc::new(MicroLpSolver::new()),
            events: OptionalEventPublisher::none(),
        }
    }

    pub fn with_solver(mut self, solver: Arc<dyn PlanningSolver>) -> Self {
        self.solver = solver;
        self
    }

    pub fn with_event_publisher(mut self, publisher: Arc<dyn ScenarioEventPublisher>) -> Self {
        self.events = OptionalEventPublisher::with_publisher(publisher);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.solve_timeout = timeout;
        self
    }

    pub fn solver_name(&self) -> &str {
        self.solver.name()
    }

    // ==========================================
    // 单情景 (同步, 在当前线程执行)
    // ==========================================

    /// 运行单个情景: 解析输入 → 建模 → 求解 → 提取
    ///
    /// 不可行/无界以结果摘要状态返回, 不作为错误
    #[instrument(skip(self, table, scenario), fields(scenario = %scenario.name, variant = %scenario.variant))]
    pub fn run_scenario(
        &self,
        table: &ParameterTable,
        scenario: &ScenarioConfig,
    ) -> Result<ResultBundle, ScenarioError> {
        let inputs = PlanningInputs::resolve(table, &self.sources, scenario.initial_inventory)?;
        let model = ModelBuilder::new(&self.model_config).build(&inputs, scenario)?;
        let outcome = self.solver.solve(&model)?;
        let bundle = extract(&model, &outcome, scenario)?;

        info!(
            status = %bundle.summary.status,
            objective = ?bundle.summary.objective,
            solve_millis = bundle.summary.solve_millis,
            "情景运行完成"
        );
        Ok(bundle)
    }

    // ==========================================
    // 多情景 (并发)
    // ==========================================

    /// 并发运行多个情景
    ///
    /// - 每个情景在阻塞线程池上独立执行, 受求解超时约束
    /// - 重名情景只运行首个, 其余报 DuplicateScenario
    /// - 任一情景失败不影响其他情景
    ///
    /// # 返回
    /// 按输入顺序排列的各情景结果
    #[instrument(skip(self, table, scenarios), fields(scenarios = scenarios.len()))]
    pub async fn run_scenarios(
        &self,
        table: Arc<ParameterTable>,
        scenarios: &[ScenarioConfig],
    ) -> ScenarioBatch {
        let batch_id = Uuid::new_v4().to_string();

        let mut first_seen: HashMap<&str, usize> = HashMap::new();
        for (idx, scenario) in scenarios.iter().enumerate() {
            first_seen.entry(scenario.name.as_str()).or_insert(idx);
        }

        let runs = scenarios.iter().enumerate().map(|(idx, scenario)| {
            let duplicate = first_seen.get(scenario.name.as_str()) != Some(&idx);
            let table = Arc::clone(&table);
            let scenario = scenario.clone();
            let batch_id = batch_id.clone();
            async move {
                let result = if duplicate {
                    Err(ScenarioError::DuplicateScenario(scenario.name.clone()))
                } else {
                    self.run_isolated(table, scenario.clone(), &batch_id).await
                };
                ScenarioOutcome {
                    name: scenario.name,
                    result,
                }
            }
        });
        let outcomes = join_all(runs).await;

        let batch = ScenarioBatch { batch_id, outcomes };
        info!(
            batch_id = %batch.batch_id,
            succeeded = batch.succeeded().count(),
            failed = batch.failed().count(),
            "情景批次完成"
        );
        batch
    }

    /// 在独立运行时上运行多个情景 (同步调用方入口)
    ///
    /// 返回前以 shutdown_background 关闭运行时, 超时情景遗留的求解线程
    /// 被分离, 调用方不再等待其结束
    ///
    /// # 返回
    /// 运行时创建失败时返回 io 错误
    pub fn run_scenarios_blocking(
        &self,
        table: Arc<ParameterTable>,
        scenarios: &[ScenarioConfig],
    ) -> std::io::Result<ScenarioBatch> {
        let runtime = tokio::runtime::Runtime::new()?;
        let batch = runtime.block_on(self.run_scenarios(table, scenarios));
        runtime.shutdown_background();
        Ok(batch)
    }

    /// 单情景隔离运行 (阻塞线程 + 超时)
    ///
    /// 超时后不再等待求解线程, 情景按失败上报
    async fn run_isolated(
        &self,
        table: Arc<ParameterTable>,
        scenario: ScenarioConfig,
        batch_id: &str,
    ) -> Result<ResultBundle, ScenarioError> {
        self.events
            .publish(ScenarioEvent::started(batch_id, &scenario.name));

        let runner = self.clone();
        let task_scenario = scenario.clone();
        let handle =
            tokio::task::spawn_blocking(move || runner.run_scenario(&table, &task_scenario));

        let result = match tokio::time::timeout(self.solve_timeout, handle).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_err)) => Err(ScenarioError::TaskFailed(join_err.to_string())),
            Err(_) => Err(ScenarioError::Timeout {
                millis: self.solve_timeout.as_millis() as u64,
            }),
        };

        match &result {
            Ok(bundle) => self.events.publish(ScenarioEvent::completed(
                batch_id,
                &scenario.name,
                bundle.summary.status,
            )),
            Err(e) => {
                error!(scenario = %scenario.name, error = %e, "情景运行失败");
                self.events
                    .publish(ScenarioEvent::failed(batch_id, &scenario.name, e.to_string()));
            }
        }
        result
    }
}
