// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 构造参数表、CSV 工作簿目录、测试用配置
// ==========================================

#![allow(dead_code)]

use std::fs;
use std::path::Path;
use wafer_plan::config::config_keys::*;
use wafer_plan::config::ModelConfig;
use wafer_plan::domain::ParameterRecord;
use wafer_plan::engine::PlanningModel;
use wafer_plan::{ParameterTable, PlannerConfig};

/// 数值容差
pub const TOL: f64 = 1e-6;

pub fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() <= TOL * (1.0 + a.abs().max(b.abs()))
}

// ==========================================
// ParameterTable 构造器
// ==========================================

#[derive(Default)]
pub struct TableBuilder {
    records: Vec<ParameterRecord>,
}

impl TableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn series(
        mut self,
        sheet: &str,
        attribute: Option<&str>,
        product: &str,
        values: &[(&str, f64)],
    ) -> Self {
        for (period, value) in values {
            self.records.push(ParameterRecord::new(
                product,
                Some(period.to_string()),
                attribute.map(str::to_string),
                *value,
                sheet,
            ));
        }
        self
    }

    pub fn demand(self, product: &str, values: &[(&str, f64)]) -> Self {
        self.series(SHEET_SUPPLY_DEMAND, Some(ATTR_EFFECTIVE_DEMAND), product, values)
    }

    pub fn safety_stock(self, product: &str, values: &[(&str, f64)]) -> Self {
        self.series(SHEET_SUPPLY_DEMAND, Some(ATTR_SAFETY_STOCK), product, values)
    }

    pub fn yielded_supply(self, product: &str, values: &[(&str, f64)]) -> Self {
        self.series(SHEET_SUPPLY_DEMAND, Some(ATTR_YIELDED_SUPPLY), product, values)
    }

    pub fn initial_inventory(self, product: &str, values: &[(&str, f64)]) -> Self {
        self.series(SHEET_SUPPLY_DEMAND, Some(ATTR_INITIAL_INVENTORY), product, values)
    }

    pub fn yield_factor(self, product: &str, values: &[(&str, f64)]) -> Self {
        self.series(SHEET_YIELD, None, product, values)
    }

    pub fn wafer_plan(self, product: &str, values: &[(&str, f64)]) -> Self {
        self.series(SHEET_WAFER_PLAN, Some(ATTR_AVAILABLE_CAPACITY), product, values)
    }

    pub fn boundary(self, product: &str, values: &[(&str, f64)]) -> Self {
        self.series(SHEET_BOUNDARY, None, product, values)
    }

    pub fn density(mut self, product: &str, value: f64) -> Self {
        self.records.push(ParameterRecord::new(
            product,
            None,
            Some("Density".to_string()),
            value,
            SHEET_DENSITY,
        ));
        self
    }

    pub fn build(self) -> ParameterTable {
        ParameterTable::new(self.records)
    }
}

/// 单产品两周期 (P1, P2), 需求各 100, 安全库存 0
pub fn two_period_table() -> ParameterTable {
    TableBuilder::new()
        .demand("A", &[("P1", 100.0), ("P2", 100.0)])
        .safety_stock("A", &[("P1", 0.0), ("P2", 0.0)])
        .build()
}

// ==========================================
// 配置
// ==========================================

/// 关闭每周期最小投片量 (小规模测试数据无法满足 350 片)
pub fn test_model_config() -> ModelConfig {
    ModelConfig {
        min_wafer_throughput: 0.0,
        ..ModelConfig::default()
    }
}

pub fn test_planner_config() -> PlannerConfig {
    PlannerConfig {
        model: test_model_config(),
        ..PlannerConfig::default()
    }
}

// ==========================================
// 求解值辅助
// ==========================================

/// 按变量下标构造全零取值
pub fn zero_assignment(model: &PlanningModel) -> Vec<f64> {
    vec![0.0; model.variable_count()]
}

// ==========================================
// CSV 工作簿目录
// ==========================================

/// 写入一张 CSV 工作表 (第一行为标题行, 加载时剥离)
pub fn write_sheet(dir: &Path, sheet: &str, lines: &[&str]) {
    let mut content = format!("{} 标题\n", sheet);
    for line in lines {
        content.push_str(line);
        content.push('\n');
    }
    fs::write(dir.join(format!("{}.csv", sheet)), content).unwrap();
}

/// 写入完整的五张必需工作表
pub fn write_workbook(dir: &Path) {
    write_sheet(
        dir,
        SHEET_SUPPLY_DEMAND,
        &[
            "Supply Demand,,,",
            "Product ID,Attribute,Q1 24,Q2 24",
            "21A,EffectiveDemand,100,100",
            "21A,Safety Stock Target,0,0",
            "21A,Total Projected Inventory Balance,20,0",
            "22B,EffectiveDemand,50,0",
            "22B,Safety Stock Target,0,0",
            ",EffectiveDemand,999,999",
        ],
    );
    write_sheet(
        dir,
        SHEET_YIELD,
        &["Yield,,", "Product ID,Q1 24,Q2 24", "21A,1,1", "22B,0.5,0.5"],
    );
    write_sheet(
        dir,
        SHEET_WAFER_PLAN,
        &["Wafer Plan,,", "Product ID,Q1 24,Q2 24", "21A,500,500", "22B,n/a,500"],
    );
    write_sheet(
        dir,
        SHEET_BOUNDARY,
        &["Boundary,,", "Product ID,Q1 24,Q2 24", "21A,1000,1000"],
    );
    write_sheet(dir, SHEET_DENSITY, &["21A,22B", "1,2"]);
}
