// ==========================================
// 晶圆生产计划 - 工作簿加载器
// ==========================================
// 流程: 解析工作簿 → 检查必需工作表 → 逐表规整 → ParameterTable
// ==========================================

use crate::config::config_manager::PlannerConfig;
use crate::importer::error::ImportResult;
use crate::importer::file_parser::{UniversalWorkbookParser, WorkbookParser};
use crate::importer::normalizer::SheetLayout;
use crate::importer::parameter_index::ParameterTable;
use std::collections::HashMap;
use std::path::Path;
use tracing::{info, instrument};

pub struct WorkbookLoader<P = UniversalWorkbookParser>
where
    P: WorkbookParser,
{
    parser: P,
    title_rows: usize,
    required_sheets: Vec<String>,
    layouts: HashMap<String, SheetLayout>,
}

impl WorkbookLoader<UniversalWorkbookParser> {
    /// 按配置创建 (自动识别 Excel / CSV 目录)
    pub fn from_config(config: &PlannerConfig) -> Self {
        Self::with_parser(UniversalWorkbookParser, config)
    }
}

impl<P: WorkbookParser> WorkbookLoader<P> {
    pub fn with_parser(parser: P, config: &PlannerConfig) -> Self {
        Self {
            parser,
            title_rows: config.title_rows,
            required_sheets: config.required_sheets.clone(),
            layouts: config.layouts.clone(),
        }
    }

    /// 加载并规整为参数表
    ///
    /// # 返回
    /// - Err(FileNotFound / UnsupportedFormat): 路径问题
    /// - Err(MissingSheet): 缺少必需工作表
    /// - Err(InsufficientData / MissingColumn): 版式不满足
    #[instrument(skip(self, path), fields(path = %path.as_ref().display()))]
    pub fn load<Q: AsRef<Path>>(&self, path: Q) -> ImportResult<ParameterTable> {
        let sheets = self.parser.parse_sheets(path.as_ref(), self.title_rows)?;
        info!(sheets = sheets.len(), "工作簿解析完成");

        ParameterTable::from_sheets(&sheets, &self.required_sheets, &self.layouts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::config_manager::config_keys;
    use crate::importer::error::ImportError;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_load_csv_directory() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("Supply_Demand.csv"),
            "title\nbanner,,,\nProduct ID,Attribute,Q1,Q2\n21A,EffectiveDemand,100,200\n21A,Safety Stock Target,0,0\n",
        )
        .unwrap();
        fs::write(dir.path().join("Density per Wafer.csv"), "title\n21A\n2.5\n").unwrap();

        let config = PlannerConfig {
            required_sheets: vec![
                config_keys::SHEET_SUPPLY_DEMAND.to_string(),
                config_keys::SHEET_DENSITY.to_string(),
            ],
            ..PlannerConfig::default()
        };

        let table = WorkbookLoader::from_config(&config).load(dir.path()).unwrap();
        let demand = table
            .index(config_keys::SHEET_SUPPLY_DEMAND, Some(config_keys::ATTR_EFFECTIVE_DEMAND))
            .unwrap();
        assert_eq!(demand.get("21A", "Q2"), Some(200.0));

        let density = table.index(config_keys::SHEET_DENSITY, Some("density")).unwrap();
        assert_eq!(density.scalar("21A"), Some(2.5));
    }

    #[test]
    fn test_missing_required_sheet() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("Yield.csv"), "title\nbanner\nProduct ID,Q1\n21A,1\n").unwrap();

        let err = WorkbookLoader::from_config(&PlannerConfig::default())
            .load(dir.path())
            .unwrap_err();
        assert!(matches!(err, ImportError::MissingSheet(_)));
    }
}
