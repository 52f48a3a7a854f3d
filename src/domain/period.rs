// ==========================================
// 晶圆生产计划 - 周期轴
// ==========================================
// 红线: 周期顺序是显式输入, 不依赖字典插入顺序
// 用途: 结转约束 (库存、投片爬坡) 与期末库存约束
// ==========================================

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// 有序周期轴（非空、无重复）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct PeriodAxis {
    periods: Vec<String>,
}

impl PeriodAxis {
    /// 由有序周期标签构造
    ///
    /// # 返回
    /// - Err: 轴为空或存在重复标签
    pub fn new(periods: Vec<String>) -> Result<Self, String> {
        if periods.is_empty() {
            return Err("周期轴为空".to_string());
        }
        let mut seen = HashSet::with_capacity(periods.len());
        for period in &periods {
            if !seen.insert(period.as_str()) {
                return Err(format!("周期重复: {}", period));
            }
        }
        Ok(Self { periods })
    }

    pub fn len(&self) -> usize {
        self.periods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.periods
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.periods.iter().map(|p| p.as_str())
    }

    pub fn position(&self, period: &str) -> Option<usize> {
        self.periods.iter().position(|p| p == period)
    }

    /// 前一周期（首周期返回 None）
    pub fn predecessor(&self, index: usize) -> Option<&str> {
        index
            .checked_sub(1)
            .and_then(|i| self.periods.get(i))
            .map(|p| p.as_str())
    }

    /// 末周期（期末库存约束目标）
    pub fn last(&self) -> &str {
        // 构造时已保证非空
        self.periods.last().map(|p| p.as_str()).unwrap_or_default()
    }
}

impl TryFrom<Vec<String>> for PeriodAxis {
    type Error = String;

    fn try_from(value: Vec<String>) -> Result<Self, Self::Error> {
        PeriodAxis::new(value)
    }
}

impl From<PeriodAxis> for Vec<String> {
    fn from(axis: PeriodAxis) -> Self {
        axis.periods
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn axis(labels: &[&str]) -> Result<PeriodAxis, String> {
        PeriodAxis::new(labels.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_axis_keeps_given_order() {
        let axis = axis(&["Q4 03", "Q1 04", "Q2 04"]).unwrap();
        assert_eq!(axis.last(), "Q2 04");
        assert_eq!(axis.position("Q1 04"), Some(1));
        assert_eq!(axis.predecessor(0), None);
        assert_eq!(axis.predecessor(2), Some("Q1 04"));
    }

    #[test]
    fn test_axis_rejects_empty_and_duplicates() {
        assert!(axis(&[]).is_err());
        assert!(axis(&["P1", "P2", "P1"]).is_err());
    }

    #[test]
    fn test_axis_deserialize_validates() {
        let ok: PeriodAxis = serde_json::from_str(r#"["P1","P2"]"#).unwrap();
        assert_eq!(ok.len(), 2);
        assert!(serde_json::from_str::<PeriodAxis>("[]").is_err());
    }
}
