//! # Talus CLI
//!
//! Runs slope stability analyses from JSON case files or `.slp` projects and
//! prints a text report or the JSON result.
//!
//! ```text
//! slope_cli                                   # built-in demonstration slope
//! slope_cli --case cut.json --method compare
//! slope_cli --project site.slp --json
//! RUST_LOG=slope_core=debug slope_cli --case cut.json --method bishop
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use serde::Serialize;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use slope_core::calculations::{compare_methods, run, AnalysisInput, AnalysisOutcome, Method};
use slope_core::file_io::{load_case, load_project, load_settings};
use slope_core::report::{bishop_report, comparison_report, fellenius_report};
use slope_core::{AnalysisSettings, CalcError, CalcResult};

#[derive(Parser)]
#[command(name = "slope_cli")]
#[command(about = "Slope stability analysis by Fellenius and Bishop Modified")]
struct Cli {
    /// Analysis case (JSON)
    #[arg(long, conflicts_with = "project")]
    case: Option<PathBuf>,

    /// Project file (.slp); every case is analyzed
    #[arg(long)]
    project: Option<PathBuf>,

    /// Settings file (JSON); overrides project settings
    #[arg(long)]
    settings: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = MethodArg::Compare)]
    method: MethodArg,

    /// Print JSON instead of the text report
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum MethodArg {
    Fellenius,
    Bishop,
    Compare,
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "slope_core=info,slope_cli=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Cases to analyze with the settings that apply to them.
fn load_inputs(cli: &Cli) -> CalcResult<(Vec<AnalysisInput>, AnalysisSettings)> {
    let (cases, mut settings) = if let Some(path) = &cli.project {
        let project = load_project(path)?;
        let mut cases: Vec<AnalysisInput> = project.cases.into_values().collect();
        cases.sort_by(|a, b| a.label.cmp(&b.label));
        if cases.is_empty() {
            return Err(CalcError::invalid_input(
                "project",
                path.display().to_string(),
                "Project contains no cases",
            ));
        }
        (cases, project.settings)
    } else if let Some(path) = &cli.case {
        (vec![load_case(path)?], AnalysisSettings::default())
    } else {
        info!("No case given, analyzing the demonstration slope");
        (vec![AnalysisInput::demo()?], AnalysisSettings::default())
    };

    if let Some(path) = &cli.settings {
        settings = load_settings(path)?;
    }
    Ok((cases, settings))
}

fn print_json<T: Serialize>(value: &T) -> CalcResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn analyze(input: &AnalysisInput, settings: &AnalysisSettings, cli: &Cli) -> CalcResult<()> {
    let method = match cli.method {
        MethodArg::Fellenius => Method::Fellenius,
        MethodArg::Bishop => Method::Bishop,
        MethodArg::Compare => {
            let comparison = compare_methods(input, settings)?;
            if cli.json {
                return print_json(&comparison);
            }
            println!("Case: {}", input.label);
            print!("{}", comparison_report(&comparison));
            return Ok(());
        }
    };

    let outcome = run(input, method, settings)?;
    if cli.json {
        return print_json(&outcome);
    }
    println!("Case: {}", input.label);
    match &outcome {
        AnalysisOutcome::Fellenius(r) => print!("{}", fellenius_report(r)),
        AnalysisOutcome::Bishop(r) => print!("{}", bishop_report(r)),
    }
    Ok(())
}

fn report_error(e: &CalcError) {
    error!(code = e.error_code(), "Analysis failed");
    eprintln!("Error [{}]: {}", e.error_code(), e);
    if let Ok(json) = serde_json::to_string_pretty(e) {
        eprintln!();
        eprintln!("Error JSON:");
        eprintln!("{}", json);
    }
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let (cases, settings) = match load_inputs(&cli) {
        Ok(loaded) => loaded,
        Err(e) => {
            report_error(&e);
            return ExitCode::FAILURE;
        }
    };

    let mut failed = 0;
    for (i, case) in cases.iter().enumerate() {
        if i > 0 {
            println!();
        }
        if let Err(e) = analyze(case, &settings, &cli) {
            report_error(&e);
            failed += 1;
        }
    }

    if failed > 0 {
        error!(failed, total = cases.len(), "Some cases failed");
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
