//! Multi-pass backtest engine.
//!
//! The strategy is invoked once per evaluation date with a window that ends
//! on that date, strictly in chronological order. Each returned vector is
//! cleaned against the date's liquidity mask and appended to the series.

use crate::domain::error::MultipassError;
use crate::domain::panel::Panel;
use crate::domain::strategy::Strategy;
use crate::domain::weights::WeightSeries;
use crate::domain::window::RollingCursor;
use chrono::NaiveDate;
use tracing::{debug, info};

/// Largest per-asset difference tolerated between multi-pass and single-pass output.
pub const LOOK_AHEAD_TOLERANCE: f64 = 1e-7;

#[derive(Debug, Clone)]
pub struct BacktestConfig {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub lookback_days: i64,
    pub risk_free_rate: f64,
    pub check_forward_looking: bool,
}

#[derive(Debug, Clone)]
pub struct BacktestResult {
    pub strategy: String,
    pub weights: WeightSeries,
    /// Number of strategy invocations made.
    pub passes: usize,
    /// Whether the single-pass comparison ran and agreed.
    pub forward_looking_checked: bool,
}

/// Runs `strategy` over every panel date in the configured range.
pub fn run_multi_pass(
    panel: &Panel,
    strategy: &dyn Strategy,
    config: &BacktestConfig,
) -> Result<WeightSeries, MultipassError> {
    let cursor = RollingCursor::new(
        panel,
        config.lookback_days,
        config.start_date,
        config.end_date,
    );
    let total = cursor.len();
    let mut series = WeightSeries::new(panel.assets().to_vec());

    for (i, window) in cursor.enumerate() {
        let raw = strategy.weights(&window)?;
        if raw.len() != panel.asset_count() {
            return Err(MultipassError::WeightShape {
                expected: panel.asset_count(),
                actual: raw.len(),
            });
        }
        let cleaned = raw.clean(&window.liquidity_mask());
        debug!(
            date = %window.as_of(),
            pass = i + 1,
            total,
            window_len = window.len(),
            gross = cleaned.gross_exposure(),
            "evaluated"
        );
        series.push(window.as_of(), cleaned);
    }

    Ok(series)
}

/// Evaluates the strategy's single-pass form and cleans it over the configured range.
pub fn run_single_pass(
    panel: &Panel,
    strategy: &dyn Strategy,
    config: &BacktestConfig,
) -> Result<WeightSeries, MultipassError> {
    let full = strategy
        .weights_full(panel, config.lookback_days)
        .ok_or_else(|| MultipassError::UnsupportedMode {
            strategy: strategy.name().to_string(),
        })??;

    let mut series = WeightSeries::new(panel.assets().to_vec());
    for (date, raw) in full.iter() {
        if date < config.start_date || date > config.end_date {
            continue;
        }
        if raw.len() != panel.asset_count() {
            return Err(MultipassError::WeightShape {
                expected: panel.asset_count(),
                actual: raw.len(),
            });
        }
        let Some(t) = panel.date_index(date) else {
            continue;
        };
        series.push(date, raw.clone().clean(&panel.liquidity_mask(t)));
    }
    Ok(series)
}

/// Fails on the first date and asset where the two series disagree.
///
/// The multi-pass series only ever saw data up to each date, so any
/// difference means the single-pass computation used later data.
pub fn check_forward_looking(
    multi_pass: &WeightSeries,
    single_pass: &WeightSeries,
) -> Result<(), MultipassError> {
    for (date, multi_row) in multi_pass.iter() {
        let single_row = single_pass.get(date);
        for (a, asset) in multi_pass.assets().iter().enumerate() {
            let m = multi_row.get(a).unwrap_or(0.0);
            let s = single_row.and_then(|r| r.get(a)).unwrap_or(0.0);
            if (m - s).abs() > LOOK_AHEAD_TOLERANCE {
                return Err(MultipassError::LookAheadDetected {
                    date,
                    asset: asset.clone(),
                    multi_pass: m,
                    single_pass: s,
                });
            }
        }
    }
    Ok(())
}

/// Multi-pass run, followed by the forward-looking check when the config
/// asks for it and the strategy has a single-pass form.
pub fn run_backtest(
    panel: &Panel,
    strategy: &dyn Strategy,
    config: &BacktestConfig,
) -> Result<BacktestResult, MultipassError> {
    info!(
        strategy = strategy.name(),
        start = %config.start_date,
        end = %config.end_date,
        lookback_days = config.lookback_days,
        assets = panel.asset_count(),
        "running multi-pass backtest"
    );

    let weights = run_multi_pass(panel, strategy, config)?;
    let passes = weights.len();

    let mut forward_looking_checked = false;
    if config.check_forward_looking {
        match run_single_pass(panel, strategy, config) {
            Ok(single) => {
                check_forward_looking(&weights, &single)?;
                forward_looking_checked = true;
                info!("single-pass output matches multi-pass output");
            }
            Err(MultipassError::UnsupportedMode { strategy }) => {
                info!(%strategy, "no single-pass form; forward-looking comparison skipped");
            }
            Err(e) => return Err(e),
        }
    }

    info!(passes, "backtest complete");

    Ok(BacktestResult {
        strategy: strategy.name().to_string(),
        weights,
        passes,
        forward_looking_checked,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::bar::Bar;
    use crate::domain::panel::Field;
    use crate::domain::strategy::{FnStrategy, MaCrossover};
    use crate::domain::weights::{WeightVector, check_weights};
    use crate::domain::window::PanelWindow;
    use chrono::Duration;

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    fn sample_panel(days: usize) -> Panel {
        let assets = vec!["AAA".to_string(), "BBB".to_string(), "CCC".to_string()];
        let bars = (0..days).flat_map(|i| {
            let date = start() + Duration::days(i as i64);
            [
                ("AAA", 100.0 + i as f64, true),
                ("BBB", 200.0 - i as f64, true),
                ("CCC", 50.0 + (i % 7) as f64, i % 5 != 0),
            ]
            .into_iter()
            .map(move |(asset, close, is_liquid)| Bar {
                asset: asset.into(),
                date,
                open: close,
                high: close,
                low: close,
                close,
                volume: 1000.0,
                is_liquid,
            })
        });
        Panel::from_bars(assets, bars)
    }

    fn sample_config() -> BacktestConfig {
        BacktestConfig {
            start_date: start() + Duration::days(10),
            end_date: start() + Duration::days(59),
            lookback_days: 30,
            risk_free_rate: 0.0,
            check_forward_looking: true,
        }
    }

    #[test]
    fn one_pass_per_date_in_range() {
        let panel = sample_panel(60);
        let result = run_backtest(&panel, &MaCrossover::new(3, 10), &sample_config()).unwrap();
        assert_eq!(result.passes, 50);
        assert_eq!(result.weights.dates()[0], start() + Duration::days(10));
        assert!(result.forward_looking_checked);
    }

    #[test]
    fn output_respects_exposure_and_liquidity() {
        let panel = sample_panel(60);
        let result = run_backtest(&panel, &MaCrossover::new(3, 10), &sample_config()).unwrap();
        assert!(check_weights(&result.weights, &panel).is_empty());
    }

    #[test]
    fn rerun_is_identical() {
        let panel = sample_panel(60);
        let strategy = MaCrossover::new(3, 10);
        let a = run_backtest(&panel, &strategy, &sample_config()).unwrap();
        let b = run_backtest(&panel, &strategy, &sample_config()).unwrap();
        assert_eq!(a.weights, b.weights);
    }

    #[test]
    fn strategy_never_sees_future_rows() {
        let panel = sample_panel(40);
        let strategy = FnStrategy::new("probe", |w: &PanelWindow<'_>| {
            assert!(w.dates().iter().all(|d| *d <= w.as_of()));
            Ok(WeightVector::zeros(w.asset_count()))
        });
        run_multi_pass(&panel, &strategy, &sample_config()).unwrap();
    }

    #[test]
    fn peeking_strategy_is_reported() {
        let panel = sample_panel(40);
        let strategy = FnStrategy::new("peek", |w: &PanelWindow<'_>| {
            let tomorrow = w.as_of() + Duration::days(1);
            let close = w.get(tomorrow, Field::Close, 0)?;
            Ok(WeightVector::new(vec![close.unwrap_or(0.0); w.asset_count()]))
        });
        let err = run_multi_pass(&panel, &strategy, &sample_config()).unwrap_err();
        assert!(matches!(err, MultipassError::ForwardLooking { .. }));
    }

    #[test]
    fn wrong_length_is_rejected() {
        let panel = sample_panel(20);
        let strategy = FnStrategy::new("short", |_: &PanelWindow<'_>| {
            Ok(WeightVector::new(vec![0.1]))
        });
        let err = run_multi_pass(&panel, &strategy, &sample_config()).unwrap_err();
        assert!(matches!(
            err,
            MultipassError::WeightShape {
                expected: 3,
                actual: 1
            }
        ));
    }

    #[test]
    fn single_pass_unsupported_skips_check() {
        let panel = sample_panel(20);
        let strategy = FnStrategy::new("flat", |w: &PanelWindow<'_>| {
            Ok(WeightVector::zeros(w.asset_count()))
        });
        let result = run_backtest(&panel, &strategy, &sample_config()).unwrap();
        assert!(!result.forward_looking_checked);
        assert!(matches!(
            run_single_pass(&panel, &strategy, &sample_config()),
            Err(MultipassError::UnsupportedMode { .. })
        ));
    }

    /// Single-pass form that reads the next day's close: it diverges from
    /// the multi-pass run, which cannot see tomorrow.
    struct Clairvoyant;

    impl Strategy for Clairvoyant {
        fn name(&self) -> &str {
            "clairvoyant"
        }

        fn weights(&self, window: &PanelWindow<'_>) -> Result<WeightVector, MultipassError> {
            Ok(WeightVector::zeros(window.asset_count()))
        }

        fn weights_full(
            &self,
            panel: &Panel,
            _lookback_days: i64,
        ) -> Option<Result<WeightSeries, MultipassError>> {
            let mut series = WeightSeries::new(panel.assets().to_vec());
            for (t, &date) in panel.dates().iter().enumerate() {
                let row = (0..panel.asset_count())
                    .map(|a| {
                        match (panel.get(t, Field::Close, a), panel.get(t + 1, Field::Close, a)) {
                            (Some(today), Some(next)) if next > today => 0.1,
                            _ => 0.0,
                        }
                    })
                    .collect();
                series.push(date, WeightVector::new(row));
            }
            Some(Ok(series))
        }
    }

    #[test]
    fn divergent_single_pass_is_look_ahead() {
        let panel = sample_panel(60);
        let err = run_backtest(&panel, &Clairvoyant, &sample_config()).unwrap_err();
        assert!(matches!(
            err,
            MultipassError::LookAheadDetected { ref asset, .. } if asset == "AAA"
        ));
    }

    #[test]
    fn check_disabled_skips_comparison() {
        let panel = sample_panel(60);
        let config = BacktestConfig {
            check_forward_looking: false,
            ..sample_config()
        };
        let result = run_backtest(&panel, &Clairvoyant, &config).unwrap();
        assert!(!result.forward_looking_checked);
    }
}
