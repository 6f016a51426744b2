//! Command-line front end: picks the statement files, runs one analysis and
//! prints the reports and chart data.

use anyhow::Result;
use clap::{Parser, ValueEnum};
use dotenv::dotenv;
use financial_decoder::{
    AnalysisMode, AnalysisRun, AppConfig, Chart, DecoderError, DocumentContent, DocumentFormat,
    FinancialDecoder, GeminiClient, LoadFailure, Persona, ReportGenerator, ReportOutcome,
    StatementKind, StatementSet, StatementUpload, Visualization,
};
use log::{debug, info, warn};
use std::path::{Path, PathBuf};

const RULE: &str = "------------------------------------------------------------------";

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliMode {
    /// One report per statement
    PerStatement,
    /// One combined report across all statements
    FullDiagnosis,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliPersona {
    Analyst,
    Executive,
    Journalist,
}

impl From<CliPersona> for Persona {
    fn from(cli: CliPersona) -> Self {
        match cli {
            CliPersona::Analyst => Persona::Analyst,
            CliPersona::Executive => Persona::Executive,
            CliPersona::Journalist => Persona::Journalist,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Gemini Financial Decoder: AI analysis of financial statements",
    long_about = "Transforms balance sheets, profit & loss and cash flow statements into \
                  written analysis and trend charts.\n\n\
                  ENVIRONMENT VARIABLES:\n  \
                  GOOGLE_API_KEY    Gemini API key (required, may be set in .env)\n  \
                  GEMINI_MODEL      Model identifier override (optional)\n\n\
                  Supported files: csv, tsv, xlsx, xlsm, xls, ods, txt"
)]
struct Args {
    /// Balance sheet file
    #[arg(long, value_parser = parse_upload_path)]
    balance_sheet: Option<PathBuf>,

    /// Profit & loss statement file
    #[arg(long, value_parser = parse_upload_path)]
    profit_loss: Option<PathBuf>,

    /// Cash flow statement file
    #[arg(long, value_parser = parse_upload_path)]
    cash_flow: Option<PathBuf>,

    /// Prompt composition mode
    #[arg(long, value_enum, default_value = "per-statement")]
    mode: CliMode,

    /// Viewpoint of the report (full diagnosis defaults to analyst)
    #[arg(long, value_enum)]
    persona: Option<CliPersona>,

    /// Model identifier, overriding GEMINI_MODEL
    #[arg(long)]
    model: Option<String>,

    /// Directory to write one SVG chart per statement into
    #[arg(long)]
    chart_dir: Option<PathBuf>,

    /// Print the first rows of each tabular statement
    #[arg(long)]
    preview: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "warn")]
    log_level: String,
}

fn parse_upload_path(value: &str) -> std::result::Result<PathBuf, String> {
    DocumentFormat::from_file_name(value).map_err(|e| e.to_string())?;
    Ok(PathBuf::from(value))
}

fn init_logging(level: &str) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_target(false)
        .init();
}

impl Args {
    fn uploads(&self) -> Vec<StatementUpload> {
        [
            (StatementKind::BalanceSheet, &self.balance_sheet),
            (StatementKind::ProfitLoss, &self.profit_loss),
            (StatementKind::CashFlow, &self.cash_flow),
        ]
        .into_iter()
        .filter_map(|(kind, path)| path.as_ref().map(|p| StatementUpload::new(kind, p)))
        .collect()
    }

    fn analysis_mode(&self) -> AnalysisMode {
        let persona = self.persona.map(Persona::from);
        match self.mode {
            CliMode::PerStatement => AnalysisMode::PerStatement { persona },
            CliMode::FullDiagnosis => AnalysisMode::FullDiagnosis {
                persona: persona.unwrap_or(Persona::Analyst),
            },
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    dotenv().ok();
    init_logging(&args.log_level);

    // The credential is checked once, before anything is shown.
    let mut config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    };
    if let Some(model) = &args.model {
        config = config.with_model(model.clone());
    }
    debug!("Using {:?}", config);

    println!("💰 Gemini Financial Decoder");
    println!("Transforming Complex Financial Data into Actionable Insights");
    println!("{}", RULE);

    let (statements, failures) = StatementSet::load(&args.uploads());
    print_load_failures(&failures);

    if args.preview {
        print_previews(&statements);
    }

    let generator = ReportGenerator::new(GeminiClient::new(&config), config.model.clone());
    let decoder = FinancialDecoder::new(generator).with_mode(args.analysis_mode());

    println!("\n⏳ Analyzing financial documents using Gemini AI...");
    let run = match decoder.analyze(&statements).await {
        Ok(run) => run,
        Err(DecoderError::NothingToAnalyze) => {
            println!("⚠️  {}", DecoderError::NothingToAnalyze);
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    print_run(&run, args.chart_dir.as_deref());

    println!("\n{}", RULE);
    println!("Developed using Google Gemini + Rust");
    Ok(())
}

fn print_load_failures(failures: &[LoadFailure]) {
    for failure in failures {
        println!(
            "⚠️  {} could not be loaded and will be skipped: {}",
            failure.kind, failure.message
        );
    }
}

fn print_previews(statements: &StatementSet) {
    for document in statements.iter() {
        if let DocumentContent::Table(table) = &document.content {
            println!("\n{} preview ({}):", document.kind, document.source_name);
            println!("{}", table.preview(5));
        }
    }
}

fn print_run(run: &AnalysisRun, chart_dir: Option<&Path>) {
    if let Some(outcome) = &run.diagnosis {
        if let AnalysisMode::FullDiagnosis { persona } = run.mode {
            println!("\n📘 Full Financial Diagnosis ({} view)", persona);
        }
        print_outcome(outcome);
    }

    for analysis in &run.statements {
        println!("\n{}", RULE);
        println!("📗 {}", analysis.kind.analysis_heading());
        println!("{}", RULE);

        if let Some(outcome) = &analysis.report {
            print_outcome(outcome);
        }

        print_visualization(&analysis.visualization, analysis.kind, chart_dir);
    }
}

fn print_outcome(outcome: &ReportOutcome) {
    match outcome {
        ReportOutcome::Generated(report) => println!("\n{}\n", report.text.trim_end()),
        ReportOutcome::Failed { message } => eprintln!("\n❌ Error: {}\n", message),
    }
}

fn print_visualization(
    visualization: &Visualization,
    kind: StatementKind,
    chart_dir: Option<&Path>,
) {
    println!("📊 {}", visualization.title());

    let chart = match visualization {
        Visualization::Chart(chart) => chart,
        Visualization::InsufficientData { .. } => {
            println!("ℹ️  Not enough numerical data for visualization.");
            return;
        }
    };

    println!("Extracted Numerical Data:");
    for series in &chart.series {
        println!("  {}:", series.label);
        for (index, value) in series.values.iter().enumerate() {
            println!("    {:>4}  {}", index, value);
        }
    }

    if let Some(dir) = chart_dir {
        match save_chart(chart, kind, dir) {
            Ok(path) => println!("Chart saved to {}", path.display()),
            Err(e) => {
                warn!("Chart for {} not written: {}", kind, e);
                eprintln!("❌ Chart could not be saved: {}", e);
            }
        }
    }
}

/// Writes `chart` as `<dir>/<kind>.svg`, creating `dir` if needed.
fn save_chart(chart: &Chart, kind: StatementKind, dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(format!("{}.svg", kind.block_label().to_lowercase()));
    std::fs::write(&path, chart.render_svg()?)?;
    info!("Wrote chart to {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use financial_decoder::{NumericSeries, StatementAnalysis};

    fn line_chart(title: &str, values: Vec<f64>) -> Chart {
        Chart {
            title: title.to_string(),
            series: vec![NumericSeries {
                label: "Amount".to_string(),
                values,
            }],
        }
    }

    #[test]
    fn test_save_chart_writes_svg() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("charts");

        let path = save_chart(
            &line_chart("Cash Flow Trends", vec![1.0, 2.0]),
            StatementKind::CashFlow,
            &target,
        )
        .unwrap();

        assert_eq!(path, target.join("cash_flow.svg"));
        assert!(std::fs::read_to_string(path).unwrap().contains("<svg"));
    }

    #[test]
    fn test_chart_failures_do_not_stop_later_statements() {
        let dir = tempfile::tempdir().unwrap();
        // A regular file where the chart directory should be.
        let blocked = dir.path().join("blocked");
        std::fs::write(&blocked, "").unwrap();

        let chart = line_chart("Balance Sheet Trends", vec![1.0, 2.0]);
        assert!(save_chart(&chart, StatementKind::BalanceSheet, &blocked).is_err());

        let run = AnalysisRun {
            mode: AnalysisMode::default(),
            statements: StatementKind::ALL
                .iter()
                .map(|&kind| StatementAnalysis {
                    kind,
                    source_name: format!("{}.csv", kind.block_label().to_lowercase()),
                    report: Some(ReportOutcome::Failed {
                        message: "quota exceeded".to_string(),
                    }),
                    visualization: Visualization::Chart(line_chart(
                        &kind.chart_title(),
                        vec![3.0, 4.0],
                    )),
                })
                .collect(),
            diagnosis: None,
        };
        print_run(&run, Some(&blocked));

        let extreme = line_chart("Extremes", vec![1e308, -1e308]);
        let good_dir = dir.path().join("charts");
        assert!(save_chart(&extreme, StatementKind::ProfitLoss, &good_dir).is_err());
        assert!(!good_dir.join("profit_loss.svg").exists());
    }
}
