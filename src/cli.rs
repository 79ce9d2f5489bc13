//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{info, warn};

use crate::adapters::csv_price_source::CsvPriceSource;
use crate::adapters::csv_table_sink::CsvTableSink;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::engine::{Failure, IndicatorEngine, RunReport, SecurityInput};
use crate::domain::error::TaError;
use crate::domain::indicator_config::build_indicator_config;
use crate::ports::price_source::PriceSource;
use crate::ports::table_sink::TableSink;

/// Exit code of a run that wrote its output but recorded failures.
pub const PARTIAL_FAILURE_EXIT: u8 = 6;

#[derive(Parser, Debug)]
#[command(name = "brvmta", about = "Technical indicators for BRVM price histories")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compute indicator tables for every (or the given) security
    Run {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long = "security")]
        securities: Vec<String>,
        #[arg(long)]
        dry_run: bool,
    },
    /// Validate the indicator configuration and print the planned columns
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// List securities available in the input directory
    List {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show data range for security(ies)
    Info {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long = "security")]
        securities: Vec<String>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Run {
            config,
            securities,
            dry_run,
        } => run_compute(&config, &securities, dry_run),
        Command::Validate { config } => run_validate(&config),
        Command::List { config } => run_list(&config),
        Command::Info { config, securities } => run_info(&config, &securities),
    }
}

fn fail(err: &TaError) -> ExitCode {
    eprintln!("error: {err}");
    err.into()
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| match e {
        TaError::Io(io) => fail(&TaError::ConfigParse {
            file: path.display().to_string(),
            reason: io.to_string(),
        }),
        other => fail(&other),
    })
}

/// Load the config and run the validation pass, logging every rejection.
fn load_engine(config_path: &PathBuf) -> Result<(FileConfigAdapter, IndicatorEngine), ExitCode> {
    info!(path = %config_path.display(), "loading config");
    let adapter = load_config(config_path)?;
    let indicator_config = build_indicator_config(&adapter).map_err(|e| fail(&e))?;
    let engine = IndicatorEngine::new(&indicator_config);

    for rejection in engine.rejected() {
        warn!(indicator = %rejection.indicator, "rejected: {}", rejection.error);
    }
    Ok((adapter, engine))
}

fn print_plan(engine: &IndicatorEngine) {
    println!("Indicators:");
    for indicator in engine.plan() {
        println!("  {:<20} {}", indicator.to_string(), indicator.column_names().join(", "));
    }
    match engine.signal_params() {
        Some(params) => println!(
            "Signals: one decision per computed indicator, plus {} when SMA({}) and SMA({}) are computed",
            params.ma_cross_name(),
            params.ma_fast,
            params.ma_slow
        ),
        None => println!("Signals: disabled"),
    }
    if !engine.rejected().is_empty() {
        println!("Rejected:");
        for rejection in engine.rejected() {
            println!("  {}", rejection.error);
        }
    }
}

fn run_compute(config_path: &PathBuf, overrides: &[String], dry_run: bool) -> ExitCode {
    // Stage 1: config and validation pass
    let (adapter, engine) = match load_engine(config_path) {
        Ok(loaded) => loaded,
        Err(code) => return code,
    };

    if dry_run {
        print_plan(&engine);
        return if engine.rejected().is_empty() {
            ExitCode::SUCCESS
        } else {
            ExitCode::from(4)
        };
    }

    // Stage 2: collaborators
    let source = match CsvPriceSource::from_config(&adapter) {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };
    let sink = match CsvTableSink::from_config(&adapter) {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };

    // Stage 3: resolve securities
    let securities = match resolve_securities(&source, overrides) {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };
    if securities.is_empty() {
        eprintln!("error: no securities to process");
        return ExitCode::from(5);
    }

    run_pipeline(&source, &sink, &engine, &securities)
}

/// Securities named on the command line, or everything the source exposes.
pub fn resolve_securities(
    source: &dyn PriceSource,
    overrides: &[String],
) -> Result<Vec<String>, TaError> {
    if overrides.is_empty() {
        return source.list_securities();
    }
    let mut securities: Vec<String> = Vec::with_capacity(overrides.len());
    for code in overrides.iter().map(|c| c.trim()).filter(|c| !c.is_empty()) {
        if !securities.iter().any(|s| s == code) {
            securities.push(code.to_string());
        }
    }
    Ok(securities)
}

/// Read every security, run the engine and merge read failures into the
/// report, ordered by security.
pub fn compute_all(
    source: &dyn PriceSource,
    engine: &IndicatorEngine,
    securities: &[String],
) -> RunReport {
    let mut inputs = Vec::with_capacity(securities.len());
    let mut read_failures = Vec::new();

    for security in securities {
        match source.fetch_prices(security) {
            Ok(points) => {
                if points.is_empty() {
                    warn!(security = %security, "no price rows; all indicator values will be absent");
                }
                inputs.push(SecurityInput {
                    security: security.clone(),
                    points,
                });
            }
            Err(TaError::Indicator(e)) => {
                warn!(security = %security, "skipping: {e}");
                read_failures.push(Failure::from_error(security, None, &e));
            }
            Err(e) => {
                warn!(security = %security, "skipping: {e}");
                read_failures.push(Failure::data_source(security, e.to_string()));
            }
        }
    }

    info!(securities = inputs.len(), indicators = engine.plan().len(), "computing indicators");
    let mut report = engine.run(inputs);
    report.failures.extend(read_failures);
    report
        .failures
        .sort_by_key(|f| securities.iter().position(|s| *s == f.security));
    report
}

pub fn run_pipeline(
    source: &dyn PriceSource,
    sink: &dyn TableSink,
    engine: &IndicatorEngine,
    securities: &[String],
) -> ExitCode {
    let report = compute_all(source, engine, securities);

    for failure in &report.failures {
        warn!(kind = %failure.kind, "{failure}");
    }

    if let Err(e) = sink.write_all(&report.tables, &report.failures) {
        return fail(&e);
    }

    println!(
        "{} tables written, {} failures",
        report.tables.len(),
        report.failures.len()
    );
    for table in &report.tables {
        println!(
            "  {}: {} rows, {} columns, {} signals",
            table.security(),
            table.row_count(),
            table.columns().len(),
            table.signals().len()
        );
    }

    if report.is_clean() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(PARTIAL_FAILURE_EXIT)
    }
}

fn run_validate(config_path: &PathBuf) -> ExitCode {
    let (_, engine) = match load_engine(config_path) {
        Ok(loaded) => loaded,
        Err(code) => return code,
    };

    print_plan(&engine);

    if engine.rejected().is_empty() {
        println!("Indicator configuration is valid.");
        ExitCode::SUCCESS
    } else {
        let first = &engine.rejected()[0];
        fail(&TaError::Indicator(first.error.clone()))
    }
}

fn run_list(config_path: &PathBuf) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    let source = match CsvPriceSource::from_config(&adapter) {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };

    let securities = match source.list_securities() {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };

    if securities.is_empty() {
        eprintln!("No securities found");
    } else {
        for security in &securities {
            println!("{}", security);
        }
        eprintln!("{} securities found", securities.len());
    }
    ExitCode::SUCCESS
}

fn run_info(config_path: &PathBuf, overrides: &[String]) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    let source = match CsvPriceSource::from_config(&adapter) {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };
    let securities = match resolve_securities(&source, overrides) {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };

    let mut exit = ExitCode::SUCCESS;
    for security in &securities {
        match source.data_range(security) {
            Ok(Some((first, last, count))) => {
                println!("{}: {} bars, {} to {}", security, count, first, last)
            }
            Ok(None) => {
                println!("{}: no data", security);
                exit = ExitCode::from(&TaError::NoData {
                    security: security.clone(),
                });
            }
            Err(e) => exit = fail(&e),
        }
    }
    exit
}
