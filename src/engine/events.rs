// ==========================================
// 晶圆生产计划 - 情景事件发布
// ==========================================
// 职责: 定义情景运行事件发布 trait, 编排器通过它通知下游
// 说明: 引擎层只定义 trait, 调用方按需实现 (进度展示、审计等)
// ==========================================

use crate::domain::types::SolveStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::sync::Arc;

// ==========================================
// 情景事件类型
// ==========================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScenarioEventType {
    /// 情景开始
    Started,
    /// 情景完成 (含非最优状态)
    Completed,
    /// 情景失败 (建模错误、超时等)
    Failed,
}

impl ScenarioEventType {
    pub fn as_str(&self) -> &str {
        match self {
            ScenarioEventType::Started => "Started",
            ScenarioEventType::Completed => "Completed",
            ScenarioEventType::Failed => "Failed",
        }
    }
}

/// 情景事件
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioEvent {
    /// 批次 ID (同一次 run_scenarios 共享)
    pub batch_id: String,
    pub scenario: String,
    pub event_type: ScenarioEventType,
    /// 完成时的求解状态
    pub status: Option<SolveStatus>,
    /// 失败原因
    pub message: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

impl ScenarioEvent {
    pub fn started(batch_id: &str, scenario: &str) -> Self {
        Self::new(batch_id, scenario, ScenarioEventType::Started, None, None)
    }

    pub fn completed(batch_id: &str, scenario: &str, status: SolveStatus) -> Self {
        Self::new(batch_id, scenario, ScenarioEventType::Completed, Some(status), None)
    }

    pub fn failed(batch_id: &str, scenario: &str, message: String) -> Self {
        Self::new(batch_id, scenario, ScenarioEventType::Failed, None, Some(message))
    }

    fn new(
        batch_id: &str,
        scenario: &str,
        event_type: ScenarioEventType,
        status: Option<SolveStatus>,
        message: Option<String>,
    ) -> Self {
        Self {
            batch_id: batch_id.to_string(),
            scenario: scenario.to_string(),
            event_type,
            status,
            message,
            occurred_at: Utc::now(),
        }
    }
}

// ==========================================
// 事件发布 Trait
// ==========================================

/// 情景事件发布者
///
/// 发布失败只记日志, 不影响情景结果
pub trait ScenarioEventPublisher: Send + Sync {
    /// 发布情景事件
    ///
    /// # 返回
    /// - `Ok(id)`: 发布者分配的 ID (不支持时为空字符串)
    /// - `Err`: 发布失败
    fn publish(&self, event: ScenarioEvent) -> Result<String, Box<dyn Error + Send + Sync>>;
}

/// 空操作事件发布者
#[derive(Debug, Clone, Default)]
pub struct NoOpEventPublisher;

impl ScenarioEventPublisher for NoOpEventPublisher {
    fn publish(&self, event: ScenarioEvent) -> Result<String, Box<dyn Error + Send + Sync>> {
        tracing::debug!(
            "NoOpEventPublisher: 跳过事件发布 - scenario={}, event_type={}",
            event.scenario,
            event.event_type.as_str()
        );
        Ok(String::new())
    }
}

/// 可选的事件发布者包装
#[derive(Clone)]
pub struct OptionalEventPublisher {
    inner: Option<Arc<dyn ScenarioEventPublisher>>,
}

impl OptionalEventPublisher {
    pub fn with_publisher(publisher: Arc<dyn ScenarioEventPublisher>) -> Self {
        Self {
            inner: Some(publisher),
        }
    }

    pub fn none() -> Self {
        Self { inner: None }
    }

    /// 发布事件 (未配置发布者时跳过; 发布失败记 warn)
    pub fn publish(&self, event: ScenarioEvent) {
        match &self.inner {
            Some(publisher) => {
                let scenario = event.scenario.clone();
                let event_type = event.event_type;
                if let Err(e) = publisher.publish(event) {
                    tracing::warn!(
                        scenario = %scenario,
                        event_type = event_type.as_str(),
                        error = %e,
                        "情景事件发布失败"
                    );
                }
            }
            None => {
                tracing::debug!(
                    "OptionalEventPublisher: 未配置发布者，跳过事件 - scenario={}, event_type={}",
                    event.scenario,
                    event.event_type.as_str()
                );
            }
        }
    }

    pub fn is_configured(&self) -> bool {
        self.inner.is_some()
    }
}

impl Default for OptionalEventPublisher {
    fn default() -> Self {
        Self::none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct FailingPublisher;

    impl ScenarioEventPublisher for FailingPublisher {
        fn publish(&self, _event: ScenarioEvent) -> Result<String, Box<dyn Error + Send + Sync>> {
            Err("下游不可用".into())
        }
    }

    #[derive(Default)]
    struct Recorder(Mutex<Vec<ScenarioEventType>>);

    impl ScenarioEventPublisher for Recorder {
        fn publish(&self, event: ScenarioEvent) -> Result<String, Box<dyn Error + Send + Sync>> {
            self.0.lock().unwrap().push(event.event_type);
            Ok("1".to_string())
        }
    }

    #[test]
    fn test_event_constructors() {
        let event = ScenarioEvent::completed("B1", "zero", SolveStatus::Optimal);
        assert_eq!(event.event_type, ScenarioEventType::Completed);
        assert_eq!(event.status, Some(SolveStatus::Optimal));
        assert!(event.message.is_none());

        let event = ScenarioEvent::failed("B1", "zero", "超时".to_string());
        assert_eq!(event.event_type.as_str(), "Failed");
        assert_eq!(event.message.as_deref(), Some("超时"));
    }

    #[test]
    fn test_noop_publisher() {
        let result = NoOpEventPublisher.publish(ScenarioEvent::started("B1", "zero"));
        assert!(result.unwrap().is_empty());
    }

    #[test]
    fn test_optional_publisher_swallows_errors() {
        let publisher = OptionalEventPublisher::with_publisher(Arc::new(FailingPublisher));
        assert!(publisher.is_configured());
        publisher.publish(ScenarioEvent::started("B1", "zero"));

        assert!(!OptionalEventPublisher::default().is_configured());
    }

    #[test]
    fn test_optional_publisher_forwards() {
        let recorder = Arc::new(Recorder::default());
        let publisher = OptionalEventPublisher::with_publisher(recorder.clone());
        publisher.publish(ScenarioEvent::started("B1", "zero"));
        publisher.publish(ScenarioEvent::completed("B1", "zero", SolveStatus::Infeasible));

        assert_eq!(
            *recorder.0.lock().unwrap(),
            vec![ScenarioEventType::Started, ScenarioEventType::Completed]
        );
    }
}
