// ==========================================
// 晶圆生产计划 - 导入层
// ==========================================
// 职责: 外部工作簿读取 → 单表规整 → 参数表 / 参数索引
// 支持: Excel 工作簿, CSV 目录
// ==========================================

// 模块声明
pub mod error;
pub mod file_parser;
pub mod normalizer;
pub mod parameter_index;
pub mod raw_sheet;
pub mod workbook_loader;

// 重导出核心类型
pub use error::{ImportError, ImportResult, IndexError};
pub use file_parser::{CsvDirectoryParser, ExcelParser, UniversalWorkbookParser, WorkbookParser};
pub use normalizer::{normalize_sheet, SheetLayout, ATTRIBUTE_HEADER, DENSITY_ATTRIBUTE};
pub use parameter_index::{build_index, ParameterIndex, ParameterTable};
pub use raw_sheet::{Cell, RawSheet};
pub use workbook_loader::WorkbookLoader;
