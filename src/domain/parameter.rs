// ==========================================
// 晶圆生产计划 - 规整后的参数记录
// ==========================================
// 用途: 参数规整器输出的长表记录, 参数索引的输入
// ==========================================

use serde::{Deserialize, Serialize};

/// 长表参数记录: (产品, 周期?, 属性?, 数值, 来源工作表)
///
/// 单行密度表没有周期列, `period` 为 None;
/// 单属性表的 `attribute` 由工作表约定给出.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterRecord {
    pub product: String,
    pub period: Option<String>,
    pub attribute: Option<String>,
    pub value: f64,
    pub sheet: String,
}

impl ParameterRecord {
    pub fn new(
        product: impl Into<String>,
        period: Option<String>,
        attribute: Option<String>,
        value: f64,
        sheet: impl Into<String>,
    ) -> Self {
        Self {
            product: product.into(),
            period,
            attribute,
            value,
            sheet: sheet.into(),
        }
    }
}

/// 标签归一化: 忽略大小写与空白
///
/// "Effective Demand" 与 "EffectiveDemand" 视为同一属性
pub fn normalize_label(label: &str) -> String {
    label
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(|c| c.to_lowercase())
        .collect()
}
