// ==========================================
// 晶圆生产计划 - 参数表与参数索引
// ==========================================
// 职责: 汇总各工作表的长表记录 (ParameterTable),
//       按 (工作表, 属性) 建立 产品 → 周期 → 数值 索引
// 红线: 参数表构造后只读; 可选参数缺失由调用方决定替代或报错
// ==========================================

use crate::domain::parameter::{normalize_label, ParameterRecord};
use crate::importer::error::{ImportError, ImportResult, IndexError};
use crate::importer::normalizer::{normalize_sheet, SheetLayout};
use crate::importer::raw_sheet::RawSheet;
use std::collections::HashMap;
use tracing::{debug, info};

// ==========================================
// ParameterIndex - 产品 → 周期 → 数值
// ==========================================
// 保持产品、周期的首次出现顺序; 重复键后写覆盖先写
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParameterIndex {
    products: Vec<String>,
    series: HashMap<String, ProductSeries>,
}

#[derive(Debug, Clone, PartialEq, Default)]
struct ProductSeries {
    periods: Vec<String>,
    values: HashMap<String, f64>,
    // 无周期记录 (如单行密度表)
    scalar: Option<f64>,
}

impl ParameterIndex {
    /// 空索引 (表示"不约束")
    pub fn empty() -> Self {
        Self::default()
    }

    fn insert(&mut self, record: &ParameterRecord) {
        if !self.series.contains_key(&record.product) {
            self.products.push(record.product.clone());
        }
        let series = self.series.entry(record.product.clone()).or_default();

        match &record.period {
            Some(period) => {
                if series.values.insert(period.clone(), record.value).is_none() {
                    series.periods.push(period.clone());
                }
            }
            None => series.scalar = Some(record.value),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// 产品列表（首次出现顺序）
    pub fn products(&self) -> &[String] {
        &self.products
    }

    /// 某产品的周期列表（首次出现顺序）
    pub fn periods(&self, product: &str) -> Option<&[String]> {
        self.series.get(product).map(|s| s.periods.as_slice())
    }

    pub fn contains_product(&self, product: &str) -> bool {
        self.series.contains_key(product)
    }

    /// 取 (产品, 周期) 数值
    pub fn get(&self, product: &str, period: &str) -> Option<f64> {
        self.series
            .get(product)
            .and_then(|s| s.values.get(period))
            .copied()
    }

    /// 取 (产品, 周期) 数值, 缺失时取默认值
    pub fn get_or(&self, product: &str, period: &str, default: f64) -> f64 {
        self.get(product, period).unwrap_or(default)
    }

    /// 产品级标量: 无周期记录优先, 否则取第一个周期的值
    pub fn scalar(&self, product: &str) -> Option<f64> {
        let series = self.series.get(product)?;
        series.scalar.or_else(|| {
            series
                .periods
                .first()
                .and_then(|p| series.values.get(p))
                .copied()
        })
    }

    /// 所有数值的最大绝对值（空索引为 0）
    pub fn max_abs(&self) -> f64 {
        self.series
            .values()
            .flat_map(|s| s.values.values().copied().chain(s.scalar))
            .map(f64::abs)
            .fold(0.0, f64::max)
    }
}

// ==========================================
// 索引构建
// ==========================================

fn matches(record: &ParameterRecord, sheet_key: &str, attribute_key: Option<&str>) -> bool {
    if normalize_label(&record.sheet) != sheet_key {
        return false;
    }
    match attribute_key {
        None => true,
        Some(key) => record
            .attribute
            .as_deref()
            .map(|a| normalize_label(a) == key)
            .unwrap_or(false),
    }
}

/// 构建参数索引
///
/// # 参数
/// - `records`: 长表记录
/// - `sheet`: 工作表名
/// - `attribute`: 属性名 (None 表示不按属性过滤); 忽略大小写与空白
///
/// # 返回
/// - Ok(index): 非空索引
/// - Err(MissingAttribute): 过滤后无记录
pub fn build_index(
    records: &[ParameterRecord],
    sheet: &str,
    attribute: Option<&str>,
) -> Result<ParameterIndex, IndexError> {
    let sheet_key = normalize_label(sheet);
    let attribute_key = attribute.map(normalize_label);

    let mut index = ParameterIndex::empty();
    for record in records
        .iter()
        .filter(|r| matches(r, &sheet_key, attribute_key.as_deref()))
    {
        index.insert(record);
    }

    if index.is_empty() {
        return Err(IndexError::MissingAttribute {
            sheet: sheet.to_string(),
            attribute: attribute.unwrap_or("*").to_string(),
        });
    }
    Ok(index)
}

// ==========================================
// ParameterTable - 单次运行的只读参数表
// ==========================================
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParameterTable {
    records: Vec<ParameterRecord>,
}

impl ParameterTable {
    pub fn new(records: Vec<ParameterRecord>) -> Self {
        Self { records }
    }

    /// 规整多张工作表并汇总
    ///
    /// # 参数
    /// - `sheets`: 工作表名 → 原始工作表
    /// - `sheet_names`: 需要规整的工作表 (缺失即报错)
    /// - `layouts`: 工作表名 → 版式 (未配置时用通用版式)
    pub fn from_sheets(
        sheets: &HashMap<String, RawSheet>,
        sheet_names: &[String],
        layouts: &HashMap<String, SheetLayout>,
    ) -> ImportResult<Self> {
        let mut records = Vec::new();

        for name in sheet_names {
            let sheet = sheets
                .get(name)
                .ok_or_else(|| ImportError::MissingSheet(name.clone()))?;
            let layout = layouts.get(name).cloned().unwrap_or_default();

            debug!(sheet = %name, rows = sheet.row_count(), layout = ?layout, "规整工作表");
            let sheet_records = normalize_sheet(sheet, &layout)?;
            debug!(sheet = %name, records = sheet_records.len(), "工作表规整完成");

            records.extend(sheet_records);
        }

        info!(
            sheets = sheet_names.len(),
            records = records.len(),
            "参数表构建完成"
        );

        Ok(Self { records })
    }

    pub fn records(&self) -> &[ParameterRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// 必需参数索引: 缺失即报错
    pub fn index(&self, sheet: &str, attribute: Option<&str>) -> Result<ParameterIndex, IndexError> {
        build_index(&self.records, sheet, attribute)
    }

    /// 可选参数索引: 缺失返回 None, 由调用方替换为"不约束"
    pub fn lookup(&self, sheet: &str, attribute: Option<&str>) -> Option<ParameterIndex> {
        self.index(sheet, attribute).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(product: &str, period: Option<&str>, attr: Option<&str>, value: f64, sheet: &str) -> ParameterRecord {
        ParameterRecord::new(
            product,
            period.map(str::to_string),
            attr.map(str::to_string),
            value,
            sheet,
        )
    }

    fn sample() -> Vec<ParameterRecord> {
        vec![
            rec("22B", Some("Q4 03"), Some("EffectiveDemand"), 10.0, "Supply_Demand"),
            rec("22B", Some("Q1 04"), Some("EffectiveDemand"), 20.0, "Supply_Demand"),
            rec("21A", Some("Q4 03"), Some("EffectiveDemand"), 30.0, "Supply_Demand"),
            rec("21A", Some("Q4 03"), Some("Safety Stock Target"), 5.0, "Supply_Demand"),
            rec("21A", Some("Q4 03"), Some("EffectiveDemand"), 35.0, "Supply_Demand"),
            rec("21A", None, Some("Density"), 1200.0, "Density per Wafer"),
        ]
    }

    #[test]
    fn test_build_index_filters_and_keeps_order() {
        let index = build_index(&sample(), "Supply_Demand", Some("EffectiveDemand")).unwrap();
        assert_eq!(index.products(), &["22B".to_string(), "21A".to_string()]);
        assert_eq!(
            index.periods("22B").unwrap(),
            &["Q4 03".to_string(), "Q1 04".to_string()]
        );
        // 后写覆盖
        assert_eq!(index.get("21A", "Q4 03"), Some(35.0));
        assert_eq!(index.get("21A", "Q1 04"), None);
        assert_eq!(index.get_or("21A", "Q1 04", 1.0), 1.0);
    }

    #[test]
    fn test_attribute_match_ignores_case_and_whitespace() {
        let index = build_index(&sample(), "supply_demand", Some("effective demand")).unwrap();
        assert_eq!(index.products().len(), 2);
    }

    #[test]
    fn test_missing_attribute_is_error() {
        let err = build_index(&sample(), "Supply_Demand", Some("Yielded Supply")).unwrap_err();
        assert_eq!(
            err,
            IndexError::MissingAttribute {
                sheet: "Supply_Demand".to_string(),
                attribute: "Yielded Supply".to_string(),
            }
        );

        let table = ParameterTable::new(sample());
        assert!(table.lookup("Wafer Plan", None).is_none());
    }

    #[test]
    fn test_scalar_and_max_abs() {
        let table = ParameterTable::new(sample());
        let density = table.lookup("Density per Wafer", None).unwrap();
        assert_eq!(density.scalar("21A"), Some(1200.0));
        assert_eq!(density.scalar("22B"), None);
        assert_eq!(density.max_abs(), 1200.0);

        let demand = table.index("Supply_Demand", Some("EffectiveDemand")).unwrap();
        assert_eq!(demand.scalar("22B"), Some(10.0));
    }

    #[test]
    fn test_from_sheets_reports_missing_sheet() {
        let sheets = HashMap::new();
        let err = ParameterTable::from_sheets(&sheets, &["Yield".to_string()], &HashMap::new())
            .unwrap_err();
        assert!(matches!(err, ImportError::MissingSheet(ref s) if s == "Yield"));
    }
}
