// ==========================================
// 晶圆生产计划 - 工作簿解析器实现
// ==========================================
// 支持: Excel 工作簿 (.xlsx/.xls/.xlsm/.ods) / CSV 目录 (每个 <sheet>.csv 一张表)
// 输出: 工作表名 → RawSheet (已剥离标题行)
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use crate::importer::raw_sheet::{Cell, RawSheet};
use calamine::{open_workbook_auto, Data, Reader};
use csv::ReaderBuilder;
use std::collections::HashMap;
use std::fs::{self, File};
use std::path::Path;
use tracing::debug;

// ==========================================
// WorkbookParser Trait
// ==========================================
pub trait WorkbookParser {
    /// 解析为 工作表名 → RawSheet
    ///
    /// # 参数
    /// - `path`: 工作簿文件或 CSV 目录
    /// - `title_rows`: 每张表顶部需剥离的标题行数
    fn parse_sheets(&self, path: &Path, title_rows: usize) -> ImportResult<HashMap<String, RawSheet>>;
}

fn strip_title_rows(rows: Vec<Vec<Cell>>, title_rows: usize) -> Vec<Vec<Cell>> {
    rows.into_iter().skip(title_rows).collect()
}

// ==========================================
// CSV 目录 Parser 实现
// ==========================================
pub struct CsvDirectoryParser;

impl CsvDirectoryParser {
    fn parse_file(path: &Path) -> ImportResult<Vec<Vec<Cell>>> {
        let file = File::open(path)?;
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true) // 允许行长度不一致
            .from_reader(file);

        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result?;
            rows.push(record.iter().map(Cell::from).collect());
        }
        Ok(rows)
    }
}

impl WorkbookParser for CsvDirectoryParser {
    fn parse_sheets(&self, path: &Path, title_rows: usize) -> ImportResult<HashMap<String, RawSheet>> {
        // 检查目录存在
        if !path.is_dir() {
            return Err(ImportError::FileNotFound(path.display().to_string()));
        }

        let mut sheets = HashMap::new();
        for entry in fs::read_dir(path)? {
            let file_path = entry?.path();
            let is_csv = file_path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| e.eq_ignore_ascii_case("csv"))
                .unwrap_or(false);
            if !is_csv {
                continue;
            }

            let name = match file_path.file_stem().and_then(|s| s.to_str()) {
                Some(stem) => stem.to_string(),
                None => continue,
            };

            let rows = strip_title_rows(Self::parse_file(&file_path)?, title_rows);
            debug!(sheet = %name, rows = rows.len(), "读取 CSV 工作表");
            sheets.insert(name.clone(), RawSheet::new(name, rows));
        }

        Ok(sheets)
    }
}

// ==========================================
// Excel Parser 实现
// ==========================================
pub struct ExcelParser;

fn convert_cell(data: &Data) -> Cell {
    match data {
        Data::Empty | Data::Error(_) => Cell::Empty,
        Data::Int(v) => Cell::Number(*v as f64),
        Data::Float(v) => Cell::Number(*v),
        Data::Bool(b) => Cell::Bool(*b),
        Data::String(s) => Cell::from(s.as_str()),
        other => Cell::Text(other.to_string()),
    }
}

impl WorkbookParser for ExcelParser {
    fn parse_sheets(&self, path: &Path, title_rows: usize) -> ImportResult<HashMap<String, RawSheet>> {
        // 检查文件存在
        if !path.exists() {
            return Err(ImportError::FileNotFound(path.display().to_string()));
        }

        // 打开 Excel 文件
        let mut workbook = open_workbook_auto(path)?;

        let sheet_names = workbook.sheet_names();
        if sheet_names.is_empty() {
            return Err(ImportError::ExcelParseError("Excel 文件无工作表".to_string()));
        }

        let mut sheets = HashMap::new();
        for name in sheet_names {
            let range = workbook.worksheet_range(&name)?;

            // calamine 的区域从首个非空单元格开始, 补齐前导空行/空列以保留位置
            let (start_row, start_col) = range
                .start()
                .map(|(r, c)| (r as usize, c as usize))
                .unwrap_or((0, 0));

            let mut rows: Vec<Vec<Cell>> = vec![Vec::new(); start_row];
            for data_row in range.rows() {
                let mut cells = vec![Cell::Empty; start_col];
                cells.extend(data_row.iter().map(convert_cell));
                rows.push(cells);
            }

            let rows = strip_title_rows(rows, title_rows);
            debug!(sheet = %name, rows = rows.len(), "读取 Excel 工作表");
            sheets.insert(name.clone(), RawSheet::new(name, rows));
        }

        Ok(sheets)
    }
}

// ==========================================
// 通用工作簿解析器（根据路径自动选择）
// ==========================================
pub struct UniversalWorkbookParser;

impl WorkbookParser for UniversalWorkbookParser {
    fn parse_sheets(&self, path: &Path, title_rows: usize) -> ImportResult<HashMap<String, RawSheet>> {
        if path.is_dir() {
            return CsvDirectoryParser.parse_sheets(path, title_rows);
        }
        if !path.exists() {
            return Err(ImportError::FileNotFound(path.display().to_string()));
        }

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match ext.as_str() {
            "xlsx" | "xls" | "xlsm" | "xlsb" | "ods" => ExcelParser.parse_sheets(path, title_rows),
            _ => Err(ImportError::UnsupportedFormat(ext)),
        }
    }
}
