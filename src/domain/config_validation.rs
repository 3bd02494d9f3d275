//! Configuration validation.
//!
//! Validates every config field before any data is loaded.

use crate::domain::error::MultipassError;
use crate::domain::strategy::{DEFAULT_FAST_PERIOD, DEFAULT_SLOW_PERIOD};
use crate::domain::universe::parse_assets;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

pub const DEFAULT_LOOKBACK_DAYS: i64 = 365;
/// One hundred years.
pub const MAX_LOOKBACK_DAYS: i64 = 36_500;
pub const KNOWN_STRATEGIES: [&str; 1] = ["ma_crossover"];

pub fn validate_data_config(config: &dyn ConfigPort) -> Result<(), MultipassError> {
    match config.get_string("data", "path") {
        Some(s) if !s.trim().is_empty() => {}
        _ => {
            return Err(MultipassError::ConfigMissing {
                section: "data".to_string(),
                key: "path".to_string(),
            });
        }
    }
    if let Some(assets) = config.get_string("data", "assets") {
        parse_assets(&assets).map_err(|e| MultipassError::invalid("data", "assets", e.to_string()))?;
    }
    Ok(())
}

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), MultipassError> {
    validate_dates(config)?;
    validate_lookback(config)?;
    validate_risk_free_rate(config)?;
    Ok(())
}

pub fn validate_strategy_config(config: &dyn ConfigPort) -> Result<(), MultipassError> {
    let name = config
        .get_string("strategy", "name")
        .unwrap_or_else(|| KNOWN_STRATEGIES[0].to_string());
    if !KNOWN_STRATEGIES.contains(&name.trim()) {
        return Err(MultipassError::invalid(
            "strategy",
            "name",
            format!("unknown strategy {:?}", name),
        ));
    }

    let fast = config.get_int("strategy", "fast_period", DEFAULT_FAST_PERIOD as i64);
    let slow = config.get_int("strategy", "slow_period", DEFAULT_SLOW_PERIOD as i64);
    if fast < 1 {
        return Err(MultipassError::invalid(
            "strategy",
            "fast_period",
            "fast_period must be at least 1",
        ));
    }
    if slow <= fast {
        return Err(MultipassError::invalid(
            "strategy",
            "slow_period",
            "slow_period must be greater than fast_period",
        ));
    }
    Ok(())
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), MultipassError> {
    let start_date = parse_date(config.get_string("backtest", "start_date").as_deref(), "start_date")?;
    let end_date = parse_date(config.get_string("backtest", "end_date").as_deref(), "end_date")?;

    if start_date > end_date {
        return Err(MultipassError::invalid(
            "backtest",
            "start_date",
            "start_date must not be after end_date",
        ));
    }
    Ok(())
}

pub fn parse_date(value: Option<&str>, field: &str) -> Result<NaiveDate, MultipassError> {
    match value {
        None => Err(MultipassError::ConfigMissing {
            section: "backtest".to_string(),
            key: field.to_string(),
        }),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| {
            MultipassError::invalid(
                "backtest",
                field,
                format!("invalid {} format, expected YYYY-MM-DD", field),
            )
        }),
    }
}

fn validate_lookback(config: &dyn ConfigPort) -> Result<(), MultipassError> {
    let value = config.get_int("backtest", "lookback_days", DEFAULT_LOOKBACK_DAYS);
    if value < 1 {
        return Err(MultipassError::invalid(
            "backtest",
            "lookback_days",
            "lookback_days must be at least 1",
        ));
    }
    if value > MAX_LOOKBACK_DAYS {
        return Err(MultipassError::invalid(
            "backtest",
            "lookback_days",
            format!("lookback_days must be at most {}", MAX_LOOKBACK_DAYS),
        ));
    }
    Ok(())
}

fn validate_risk_free_rate(config: &dyn ConfigPort) -> Result<(), MultipassError> {
    let value = config.get_double("backtest", "risk_free_rate", 0.0);
    if !(0.0..1.0).contains(&value) {
        return Err(MultipassError::invalid(
            "backtest",
            "risk_free_rate",
            "risk_free_rate must be between 0 and 1",
        ));
    }
    Ok(())
}
