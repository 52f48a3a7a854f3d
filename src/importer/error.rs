// ==========================================
// 晶圆生产计划 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================

use thiserror::Error;

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件相关错误 =====
    #[error("文件不存在: {0}")]
    FileNotFound(String),

    #[error("文件格式不支持: {0}（仅支持 .xlsx/.xls 或 CSV 目录）")]
    UnsupportedFormat(String),

    #[error("文件读取失败: {0}")]
    FileReadError(String),

    #[error("Excel 解析失败: {0}")]
    ExcelParseError(String),

    #[error("CSV 解析失败: {0}")]
    CsvParseError(String),

    // ===== 表格版式错误 =====
    #[error("缺少工作表: {0}")]
    MissingSheet(String),

    #[error("工作表 '{sheet}' 数据不足: 至少需要 {required} 行, 实际 {actual} 行")]
    InsufficientData {
        sheet: String,
        required: usize,
        actual: usize,
    },

    #[error("工作表 '{sheet}' 缺少列: {column}")]
    MissingColumn { sheet: String, column: String },

    // ===== 通用错误 =====
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ImportError {
    /// 是否为表格版式错误（单表致命, 终止该情景建模）
    pub fn is_layout_error(&self) -> bool {
        matches!(
            self,
            ImportError::MissingSheet(_)
                | ImportError::InsufficientData { .. }
                | ImportError::MissingColumn { .. }
        )
    }
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}

// 实现 From<csv::Error>
impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParseError(err.to_string())
    }
}

// 实现 From<calamine::Error>
impl From<calamine::Error> for ImportError {
    fn from(err: calamine::Error) -> Self {
        ImportError::ExcelParseError(err.to_string())
    }
}

/// 参数索引错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IndexError {
    #[error("参数缺失: sheet={sheet}, attribute={attribute}")]
    MissingAttribute { sheet: String, attribute: String },
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;
