// ==========================================
// 晶圆生产计划 - 参数规整器
// ==========================================
// 职责: 将单张宽表工作表规整为长表参数记录
// 输入: RawSheet + 版式类别
// 输出: Vec<ParameterRecord>
// 红线: 纯变换, 无副作用; 单元格数值化失败只丢弃该单元格
// ==========================================

use crate::domain::parameter::{normalize_label, ParameterRecord};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::raw_sheet::RawSheet;
use serde::{Deserialize, Serialize};

/// 单行密度表的固定属性名
pub const DENSITY_ATTRIBUTE: &str = "Density";

/// 属性列表头
pub const ATTRIBUTE_HEADER: &str = "Attribute";

// 表格版式: 第 0 行为横幅行 (忽略), 第 1 行为列表头, 其后为数据
const TABULAR_HEADER_ROW: usize = 1;
const TABULAR_MIN_ROWS: usize = 2;
const DENSITY_MIN_ROWS: usize = 1;

// ==========================================
// SheetLayout - 工作表版式类别
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SheetLayout {
    /// 单行密度表: 第一行为产品ID表头, 第二行为数值 (缺失时全 0)
    SingleRowDensity,
    /// 属性键表: 产品列 + 属性列 + 每周期一列
    AttributeKeyed,
    /// 单属性表: 产品列 + 每周期一列, 属性名按约定给出
    SingleAttribute { attribute: String },
    /// 通用表: 检测到属性列时按属性键表处理, 否则按单属性表处理
    Generic {
        #[serde(default)]
        fallback_attribute: Option<String>,
    },
}

impl Default for SheetLayout {
    fn default() -> Self {
        SheetLayout::Generic {
            fallback_attribute: None,
        }
    }
}

impl SheetLayout {
    /// 该版式要求的最少行数
    pub fn min_rows(&self) -> usize {
        match self {
            SheetLayout::SingleRowDensity => DENSITY_MIN_ROWS,
            _ => TABULAR_MIN_ROWS,
        }
    }
}

// ==========================================
// 核心方法
// ==========================================

/// 规整单张工作表
///
/// # 参数
/// - `sheet`: 原始工作表 (不含标题行)
/// - `layout`: 版式类别
///
/// # 返回
/// - Ok(records): 长表记录, 顺序为 行 → 列
/// - Err(InsufficientData): 行数不足
/// - Err(MissingColumn): 属性键表缺少属性列
pub fn normalize_sheet(sheet: &RawSheet, layout: &SheetLayout) -> ImportResult<Vec<ParameterRecord>> {
    let required = layout.min_rows();
    if sheet.row_count() < required {
        return Err(ImportError::InsufficientData {
            sheet: sheet.name.clone(),
            required,
            actual: sheet.row_count(),
        });
    }

    match layout {
        SheetLayout::SingleRowDensity => Ok(normalize_density(sheet)),
        SheetLayout::AttributeKeyed => {
            let header = TabularHeader::read(sheet, true);
            if header.attribute_col.is_none() {
                return Err(ImportError::MissingColumn {
                    sheet: sheet.name.clone(),
                    column: ATTRIBUTE_HEADER.to_string(),
                });
            }
            Ok(melt(sheet, &header, None))
        }
        SheetLayout::SingleAttribute { attribute } => {
            let header = TabularHeader::read(sheet, false);
            Ok(melt(sheet, &header, Some(attribute.as_str())))
        }
        SheetLayout::Generic { fallback_attribute } => {
            let header = TabularHeader::read(sheet, true);
            Ok(melt(sheet, &header, fallback_attribute.as_deref()))
        }
    }
}

/// 单行密度表: 表头与数值行按列位置配对
fn normalize_density(sheet: &RawSheet) -> Vec<ParameterRecord> {
    let headers = &sheet.rows[0];
    let values = sheet.rows.get(1);

    headers
        .iter()
        .enumerate()
        .filter_map(|(col, header)| {
            let product = header.as_label()?;
            let value = match values {
                Some(row) => row.get(col)?.as_number()?,
                None => 0.0,
            };
            Some(ParameterRecord::new(
                product,
                None,
                Some(DENSITY_ATTRIBUTE.to_string()),
                value,
                sheet.name.clone(),
            ))
        })
        .collect()
}

// ==========================================
// TabularHeader - 表头解析结果
// ==========================================
struct TabularHeader {
    attribute_col: Option<usize>,
    period_cols: Vec<(usize, String)>,
}

impl TabularHeader {
    /// 读取列表头
    ///
    /// `detect_attribute` 为 false 时 (单属性表) 第 2 列起全部视为周期列
    fn read(sheet: &RawSheet, detect_attribute: bool) -> Self {
        let labels: Vec<Option<String>> = sheet.rows[TABULAR_HEADER_ROW]
            .iter()
            .map(|c| c.as_label())
            .collect();

        let attribute_key = normalize_label(ATTRIBUTE_HEADER);
        let has_attribute = detect_attribute
            && labels
                .iter()
                .flatten()
                .any(|label| normalize_label(label) == attribute_key);

        // 属性列存在时按位置取第 2 列, 与产品列 (第 1 列) 一同作为标识列
        let attribute_col = has_attribute.then_some(1);
        let first_period_col = if has_attribute { 2 } else { 1 };

        let period_cols = labels
            .iter()
            .enumerate()
            .skip(first_period_col)
            .filter_map(|(col, label)| label.clone().map(|l| (col, l)))
            .collect();

        Self {
            attribute_col,
            period_cols,
        }
    }
}

/// 宽表转长表
fn melt(sheet: &RawSheet, header: &TabularHeader, fixed_attribute: Option<&str>) -> Vec<ParameterRecord> {
    let mut records = Vec::new();

    for row in sheet.rows.iter().skip(TABULAR_HEADER_ROW + 1) {
        let product = match row.first().and_then(|c| c.as_label()) {
            Some(p) => p,
            None => continue,
        };

        let attribute = match header.attribute_col {
            Some(col) => match row.get(col).and_then(|c| c.as_label()) {
                Some(a) => Some(a),
                None => continue,
            },
            None => fixed_attribute.map(str::to_string),
        };

        for (col, period) in &header.period_cols {
            let value = match row.get(*col).and_then(|c| c.as_number()) {
                Some(v) => v,
                None => continue,
            };
            records.push(ParameterRecord::new(
                product.clone(),
                Some(period.clone()),
                attribute.clone(),
                value,
                sheet.name.clone(),
            ));
        }
    }

    records
}
