// ==========================================
// 晶圆生产计划 - 命令行入口
// ==========================================
// 用法:
//   wafer-plan <workbook.xlsx|csv目录> [--config cfg.json] [--output results.json]
//              [--csv rows.csv] [--json-log]
// 输出: 各情景结果 JSON (默认 stdout); 可选扁平 CSV
// ==========================================

use anyhow::{bail, Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use wafer_plan::{logging, PlannerConfig, ScenarioBatch, ScenarioOrchestrator, WorkbookLoader};

#[derive(Debug, Default)]
struct CliArgs {
    input: PathBuf,
    config: Option<PathBuf>,
    output: Option<PathBuf>,
    csv: Option<PathBuf>,
    json_log: bool,
}

fn parse_args() -> Result<CliArgs> {
    let mut args = std::env::args().skip(1);
    let mut input = None;
    let mut parsed = CliArgs::default();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => parsed.config = Some(args.next().context("--config 缺少路径")?.into()),
            "--output" => parsed.output = Some(args.next().context("--output 缺少路径")?.into()),
            "--csv" => parsed.csv = Some(args.next().context("--csv 缺少路径")?.into()),
            "--json-log" => parsed.json_log = true,
            flag if flag.starts_with("--") => bail!("未知参数: {}", flag),
            path => input = Some(PathBuf::from(path)),
        }
    }

    parsed.input = input.context(
        "用法: wafer-plan <workbook.xlsx|csv目录> [--config cfg.json] [--output results.json] [--csv rows.csv] [--json-log]",
    )?;
    Ok(parsed)
}

/// CSV 导出行 (带情景名)
#[derive(Serialize)]
struct CsvRow<'a> {
    #[serde(rename = "Scenario")]
    scenario: &'a str,
    #[serde(rename = "Product ID")]
    product: &'a str,
    #[serde(rename = "Period")]
    period: &'a str,
    #[serde(rename = "Variable")]
    variable: &'a str,
    #[serde(rename = "Value")]
    value: f64,
}

fn write_csv(batch: &ScenarioBatch, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("无法创建 CSV 文件: {}", path.display()))?;

    for (scenario, bundle) in batch.succeeded() {
        for row in bundle.flat_rows() {
            writer.serialize(CsvRow {
                scenario,
                product: &row.product,
                period: &row.period,
                variable: &row.variable,
                value: row.value,
            })?;
        }
    }
    writer.flush()?;
    Ok(())
}

fn main() -> Result<()> {
    let args = parse_args()?;

    if args.json_log {
        logging::init_json();
    } else {
        logging::init();
    }

    tracing::info!("==================================================");
    tracing::info!("{} v{}", wafer_plan::APP_NAME, wafer_plan::VERSION);
    tracing::info!("==================================================");

    let config = PlannerConfig::load(args.config.as_deref()).context("配置加载失败")?;

    let table = WorkbookLoader::from_config(&config)
        .load(&args.input)
        .with_context(|| format!("参数读取失败: {}", args.input.display()))?;

    let orchestrator = ScenarioOrchestrator::new(&config);
    tracing::info!(
        scenarios = config.scenarios.len(),
        solver = orchestrator.solver_name(),
        "开始运行情景"
    );
    let batch = orchestrator
        .run_scenarios_blocking(Arc::new(table), &config.scenarios)
        .context("异步运行时创建失败")?;

    for (name, err) in batch.failed() {
        tracing::error!(scenario = %name, error = %err, "情景失败");
    }

    let json = serde_json::to_string_pretty(&batch.report())?;
    match &args.output {
        Some(path) => std::fs::write(path, json)
            .with_context(|| format!("无法写入结果文件: {}", path.display()))?,
        None => println!("{}", json),
    }

    if let Some(path) = &args.csv {
        write_csv(&batch, path)?;
        tracing::info!(path = %path.display(), "扁平结果已导出");
    }

    if batch.is_all_ok() {
        Ok(())
    } else {
        bail!("{} 个情景失败", batch.failed().count())
    }
}
