// ==========================================
// 晶圆生产计划 - 求解结果结构
// ==========================================
// 职责: 结果摘要 + 按变量种类的 (产品 × 周期) 数值表
// 红线: 不暴露建模器内部变量对象; 结果归调用方所有
// ==========================================

use crate::domain::types::{SolveStatus, VariableKind};
use chrono::{DateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use uuid::Uuid;

// ==========================================
// SolveSummary - 结果摘要
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SolveSummary {
    pub run_id: Uuid,                // 本次运行ID
    pub scenario: String,            // 情景名称
    pub variant: String,             // 模型变体
    pub status: SolveStatus,         // 求解状态
    pub objective: Option<f64>,      // 目标函数值 (无解时为 None)
    pub solver: String,              // 求解器名称
    pub variable_count: usize,
    pub constraint_count: usize,
    pub solve_millis: u64,           // 求解耗时 (毫秒)
    pub generated_at: DateTime<Utc>, // 结果生成时间
}

// ==========================================
// PlanTable - 产品 × 周期 数值表
// ==========================================
// 序列化为嵌套映射 {产品: {周期: 数值}}, 保持周期顺序
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlanTable {
    periods: Vec<String>,
    rows: Vec<PlanRow>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlanRow {
    pub product: String,
    pub values: Vec<f64>,
}

impl PlanTable {
    pub fn new(periods: Vec<String>) -> Self {
        Self {
            periods,
            rows: Vec::new(),
        }
    }

    /// 追加一行（值个数须与周期数一致）
    pub fn push_row(&mut self, product: impl Into<String>, values: Vec<f64>) {
        debug_assert_eq!(values.len(), self.periods.len());
        self.rows.push(PlanRow {
            product: product.into(),
            values,
        });
    }

    pub fn periods(&self) -> &[String] {
        &self.periods
    }

    pub fn rows(&self) -> &[PlanRow] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, product: &str, period: &str) -> Option<f64> {
        let col = self.periods.iter().position(|p| p == period)?;
        self.rows
            .iter()
            .find(|row| row.product == product)
            .and_then(|row| row.values.get(col).copied())
    }

    /// 所有单元格 (产品, 周期, 数值)
    pub fn cells(&self) -> impl Iterator<Item = (&str, &str, f64)> + '_ {
        self.rows.iter().flat_map(move |row| {
            self.periods
                .iter()
                .zip(row.values.iter())
                .map(move |(period, value)| (row.product.as_str(), period.as_str(), *value))
        })
    }
}

struct PeriodValues<'a> {
    periods: &'a [String],
    values: &'a [f64],
}

impl Serialize for PeriodValues<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (period, value) in self.periods.iter().zip(self.values.iter()) {
            map.serialize_entry(period, value)?;
        }
        map.end()
    }
}

impl Serialize for PlanTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.rows.len()))?;
        for row in &self.rows {
            map.serialize_entry(
                &row.product,
                &PeriodValues {
                    periods: &self.periods,
                    values: &row.values,
                },
            )?;
        }
        map.end()
    }
}

// ==========================================
// FlatRow - 扁平导出行
// ==========================================
// 每个 (产品, 周期, 变量) 一行, 供列式报表导出
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlatRow {
    #[serde(rename = "Product ID")]
    pub product: String,
    #[serde(rename = "Period")]
    pub period: String,
    #[serde(rename = "Variable")]
    pub variable: String,
    #[serde(rename = "Value")]
    pub value: f64,
}

// ==========================================
// ResultBundle - 单情景求解结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultBundle {
    pub summary: SolveSummary,
    pub production_plan: PlanTable,
    pub inventory: PlanTable,
    pub wafer_production: PlanTable,
    pub wafer_multiples: PlanTable,
    pub shortage: PlanTable,
    pub excess: PlanTable,
    pub safety_stock_violation: PlanTable,
}

impl ResultBundle {
    /// 按变量种类取结果表
    pub fn table(&self, kind: VariableKind) -> &PlanTable {
        match kind {
            VariableKind::Production => &self.production_plan,
            VariableKind::Inventory => &self.inventory,
            VariableKind::WaferCount => &self.wafer_production,
            VariableKind::WaferMultiple => &self.wafer_multiples,
            VariableKind::Shortage => &self.shortage,
            VariableKind::Excess => &self.excess,
            VariableKind::SafetyStockViolation => &self.safety_stock_violation,
        }
    }

    pub fn is_solved(&self) -> bool {
        self.summary.status.has_solution()
    }

    /// 扁平化为 (产品, 周期, 变量, 数值) 行
    ///
    /// 行顺序: 产品 → 周期 → 变量种类
    pub fn flat_rows(&self) -> Vec<FlatRow> {
        let mut rows = Vec::new();
        let base = &self.production_plan;
        for (row_idx, row) in base.rows().iter().enumerate() {
            for (col, period) in base.periods().iter().enumerate() {
                for kind in VariableKind::ALL {
                    let value = self
                        .table(kind)
                        .rows()
                        .get(row_idx)
                        .and_then(|r| r.values.get(col))
                        .copied();
                    if let Some(value) = value {
                        rows.push(FlatRow {
                            product: row.product.clone(),
                            period: period.clone(),
                            variable: kind.symbol().to_string(),
                            value,
                        });
                    }
                }
            }
        }
        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(values: &[(&str, &[f64])]) -> PlanTable {
        let mut t = PlanTable::new(vec!["Q4 03".to_string(), "Q1 04".to_string()]);
        for (product, row) in values {
            t.push_row(*product, row.to_vec());
        }
        t
    }

    #[test]
    fn test_plan_table_lookup() {
        let t = table(&[("21A", &[1.0, 2.0]), ("22B", &[3.0, 4.0])]);
        assert_eq!(t.get("22B", "Q1 04"), Some(4.0));
        assert_eq!(t.get("22B", "Q2 04"), None);
        assert_eq!(t.get("23C", "Q4 03"), None);
        assert_eq!(t.cells().count(), 4);
    }

    #[test]
    fn test_plan_table_serializes_in_period_order() {
        let t = table(&[("21A", &[1.0, 2.0])]);
        let json = serde_json::to_string(&t).unwrap();
        // Q4 03 在 Q1 04 之前 (不是字典序)
        assert_eq!(json, r#"{"21A":{"Q4 03":1.0,"Q1 04":2.0}}"#);
    }
}
