//! CLI definition and dispatch.

use chrono::{NaiveDate, TimeDelta};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info, warn};

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::backtest::{self as backtest_engine, BacktestConfig, BacktestResult};
use crate::domain::config_validation::{
    parse_date, validate_backtest_config, validate_data_config, validate_strategy_config,
    DEFAULT_LOOKBACK_DAYS,
};
use crate::domain::error::MultipassError;
use crate::domain::metrics::Metrics;
use crate::domain::strategy::{MaCrossover, Strategy, DEFAULT_FAST_PERIOD, DEFAULT_SLOW_PERIOD};
use crate::domain::universe::{load_panel, parse_assets, SkippedAsset};
use crate::domain::weights::{check_weights, WeightViolation};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "multipass", about = "Rolling-window multi-pass portfolio backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest and write the weight series
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Comma-separated assets, overriding [data] assets
        #[arg(long)]
        assets: Option<String>,
        /// Skip the single-pass forward-looking comparison
        #[arg(long)]
        no_check: bool,
    },
    /// Validate a configuration without loading data
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// List assets available in the data directory
    ListAssets {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show data range for asset(s)
    Info {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        assets: Option<String>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let outcome = match cli.command {
        Command::Backtest {
            config,
            output,
            assets,
            no_check,
        } => run_backtest(&config, output.as_deref(), assets.as_deref(), no_check),
        Command::Validate { config } => run_validate(&config),
        Command::ListAssets { config } => run_list_assets(&config),
        Command::Info { config, assets } => run_info(&config, assets.as_deref()),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, MultipassError> {
    info!("loading config from {}", path.display());
    FileConfigAdapter::from_file(path)
}

/// Runs every validator in order: data, backtest, strategy.
pub fn validate_config(config: &dyn ConfigPort) -> Result<(), MultipassError> {
    validate_data_config(config)?;
    validate_backtest_config(config)?;
    validate_strategy_config(config)?;
    Ok(())
}

pub fn build_backtest_config(config: &dyn ConfigPort) -> Result<BacktestConfig, MultipassError> {
    let start_date = parse_date(
        config.get_string("backtest", "start_date").as_deref(),
        "start_date",
    )?;
    let end_date = parse_date(config.get_string("backtest", "end_date").as_deref(), "end_date")?;

    Ok(BacktestConfig {
        start_date,
        end_date,
        lookback_days: config.get_int("backtest", "lookback_days", DEFAULT_LOOKBACK_DAYS),
        risk_free_rate: config.get_double("backtest", "risk_free_rate", 0.0),
        check_forward_looking: config.get_bool("backtest", "check_forward_looking", true),
    })
}

pub fn build_strategy(config: &dyn ConfigPort) -> Result<MaCrossover, MultipassError> {
    let fast = config.get_int("strategy", "fast_period", DEFAULT_FAST_PERIOD as i64);
    let slow = config.get_int("strategy", "slow_period", DEFAULT_SLOW_PERIOD as i64);
    let fast = usize::try_from(fast)
        .map_err(|_| MultipassError::invalid("strategy", "fast_period", "must be positive"))?;
    let slow = usize::try_from(slow)
        .map_err(|_| MultipassError::invalid("strategy", "slow_period", "must be positive"))?;
    Ok(MaCrossover::new(fast, slow))
}

/// Asset list from the override, then `[data] assets`, then everything the port offers.
pub fn resolve_assets(
    asset_override: Option<&str>,
    config: &dyn ConfigPort,
    data_port: &dyn DataPort,
) -> Result<Vec<String>, MultipassError> {
    let listed = asset_override
        .map(str::to_string)
        .or_else(|| config.get_string("data", "assets"))
        .filter(|s| !s.trim().is_empty());

    match listed {
        Some(list) => {
            parse_assets(&list).map_err(|e| MultipassError::invalid("data", "assets", e.to_string()))
        }
        None => data_port.list_assets(),
    }
}

/// First date to fetch so the first evaluation sees a full lookback window.
fn load_start(bt_config: &BacktestConfig) -> Result<NaiveDate, MultipassError> {
    TimeDelta::try_days(bt_config.lookback_days)
        .and_then(|lookback| bt_config.start_date.checked_sub_signed(lookback))
        .ok_or_else(|| {
            MultipassError::invalid(
                "backtest",
                "lookback_days",
                format!(
                    "{} days before {} is out of range",
                    bt_config.lookback_days, bt_config.start_date
                ),
            )
        })
}

pub struct PipelineOutput {
    pub result: BacktestResult,
    pub metrics: Metrics,
    pub violations: Vec<WeightViolation>,
    pub skipped: Vec<SkippedAsset>,
}

/// Load, evaluate, check and score. Writing output is left to the caller.
pub fn run_backtest_pipeline(
    data_port: &dyn DataPort,
    strategy: &dyn Strategy,
    bt_config: &BacktestConfig,
    assets: &[String],
) -> Result<PipelineOutput, MultipassError> {
    let load_start = load_start(bt_config)?;
    info!(
        assets = assets.len(),
        from = %load_start,
        to = %bt_config.end_date,
        "loading data"
    );
    let universe = load_panel(data_port, assets, load_start, bt_config.end_date)?;
    let panel = universe.panel;
    let skipped = universe.skipped;

    let result = backtest_engine::run_backtest(&panel, strategy, bt_config)?;

    let violations = check_weights(&result.weights, &panel);
    for v in &violations {
        warn!(?v, "weight check failed");
    }

    let metrics = Metrics::compute(&result.weights, &panel, bt_config.risk_free_rate);

    Ok(PipelineOutput {
        result,
        metrics,
        violations,
        skipped,
    })
}

pub fn print_summary(output: &PipelineOutput) {
    let m = &output.metrics;
    println!("=== {} ===", output.result.strategy);
    println!("Evaluations:      {}", output.result.passes);
    println!(
        "Look-ahead check: {}",
        if output.result.forward_looking_checked {
            "passed"
        } else {
            "skipped"
        }
    );
    println!("Total Return:     {:.2}%", m.total_return * 100.0);
    println!("Annualized:       {:.2}%", m.annualized_return * 100.0);
    println!("Volatility:       {:.2}%", m.volatility * 100.0);
    println!("Sharpe Ratio:     {:.2}", m.sharpe_ratio);
    println!("Sortino Ratio:    {:.2}", m.sortino_ratio);
    println!("Max Drawdown:     -{:.1}%", m.max_drawdown * 100.0);
    println!("Mean Turnover:    {:.3}", m.mean_turnover);
    if !output.skipped.is_empty() {
        println!("Skipped assets:");
        for s in &output.skipped {
            println!("  {}: {}", s.asset, s.reason);
        }
    }
}

fn run_backtest(
    config_path: &Path,
    output_path: Option<&Path>,
    asset_override: Option<&str>,
    no_check: bool,
) -> Result<(), MultipassError> {
    // Stage 1: load and validate config
    let config = load_config(config_path)?;
    validate_config(&config)?;

    // Stage 2: build engine inputs
    let mut bt_config = build_backtest_config(&config)?;
    if no_check {
        bt_config.check_forward_looking = false;
    }
    let strategy = build_strategy(&config)?;

    // Stage 3: resolve universe
    let data_port = data_port_from_config(&config)?;
    let assets = resolve_assets(asset_override, &config, &data_port)?;

    // Stage 4: evaluate
    let output = run_backtest_pipeline(&data_port, &strategy, &bt_config, &assets)?;
    print_summary(&output);

    // Stage 5: write weights
    let output_path = output_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("weights.csv"));
    CsvReportAdapter::new().write(&output.result, &output_path)?;
    info!("weights written to {}", output_path.display());
    Ok(())
}

fn run_validate(config_path: &Path) -> Result<(), MultipassError> {
    let config = load_config(config_path)?;
    validate_config(&config)?;

    let bt_config = build_backtest_config(&config)?;
    let strategy = build_strategy(&config)?;

    println!("Configuration is valid");
    println!("  data path:     {}", config.get_string("data", "path").unwrap_or_default());
    println!(
        "  assets:        {}",
        config
            .get_string("data", "assets")
            .unwrap_or_else(|| "(all in data path)".to_string())
    );
    println!("  range:         {} to {}", bt_config.start_date, bt_config.end_date);
    println!("  lookback:      {} days", bt_config.lookback_days);
    println!(
        "  strategy:      ma_crossover({}, {})",
        strategy.fast_period, strategy.slow_period
    );
    println!("  look-ahead:    {}", bt_config.check_forward_looking);
    Ok(())
}

fn run_list_assets(config_path: &Path) -> Result<(), MultipassError> {
    let config = load_config(config_path)?;
    validate_data_config(&config)?;
    let data_port = data_port_from_config(&config)?;

    let assets = data_port.list_assets()?;
    if assets.is_empty() {
        warn!("no assets found");
    }
    for asset in &assets {
        println!("{}", asset);
    }
    Ok(())
}

fn run_info(config_path: &Path, asset_override: Option<&str>) -> Result<(), MultipassError> {
    let config = load_config(config_path)?;
    validate_data_config(&config)?;
    let data_port = data_port_from_config(&config)?;
    let assets = resolve_assets(asset_override, &config, &data_port)?;

    for asset in &assets {
        match data_port.get_data_range(asset) {
            Ok(Some((first, last, count))) => {
                println!("{}: {} bars, {} to {}", asset, count, first, last);
            }
            Ok(None) => println!("{}: no data found", asset),
            Err(e) => warn!(%asset, error = %e, "failed to read data range"),
        }
    }
    Ok(())
}

fn data_port_from_config(config: &dyn ConfigPort) -> Result<CsvAdapter, MultipassError> {
    let path = config
        .get_string("data", "path")
        .ok_or_else(|| MultipassError::ConfigMissing {
            section: "data".into(),
            key: "path".into(),
        })?;
    Ok(CsvAdapter::new(PathBuf::from(path.trim())))
}
