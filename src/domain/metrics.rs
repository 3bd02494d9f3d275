//! Performance statistics of a weight series.
//!
//! Weights decided on one date earn the close-to-close return of the next
//! date in the series. Equity starts at 1.0.

use crate::domain::panel::{Field, Panel};
use crate::domain::weights::{WeightSeries, WeightVector};
use chrono::NaiveDate;

const TRADING_DAYS_PER_YEAR: f64 = 252.0;

#[derive(Debug, Clone, PartialEq)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub equity: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Metrics {
    pub total_return: f64,
    pub annualized_return: f64,
    pub volatility: f64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    pub max_drawdown: f64,
    pub max_drawdown_duration: i64,
    pub mean_turnover: f64,
    pub trading_days: usize,
}

/// Compounds the series' daily portfolio returns into an equity curve.
/// Null or non-positive prices contribute nothing on that day.
pub fn equity_curve(weights: &WeightSeries, panel: &Panel) -> Vec<EquityPoint> {
    let mut curve = Vec::with_capacity(weights.len());
    let asset_idx: Vec<Option<usize>> = weights
        .assets()
        .iter()
        .map(|a| panel.asset_index(a))
        .collect();

    let mut equity = 1.0;
    let mut prev: Option<(usize, &WeightVector)> = None;

    for (date, row) in weights.iter() {
        let Some(t) = panel.date_index(date) else {
            continue;
        };
        if let Some((prev_t, prev_row)) = prev {
            let day_return: f64 = asset_idx
                .iter()
                .enumerate()
                .filter_map(|(i, a)| {
                    let a = (*a)?;
                    let w = prev_row.get(i)?;
                    let before = panel.get(prev_t, Field::Close, a)?;
                    let after = panel.get(t, Field::Close, a)?;
                    (before > 0.0 && after > 0.0).then(|| w * (after / before - 1.0))
                })
                .sum();
            equity *= 1.0 + day_return;
        }
        curve.push(EquityPoint { date, equity });
        prev = Some((t, row));
    }

    curve
}

/// Mean over consecutive steps of the summed absolute weight change.
pub fn mean_turnover(weights: &WeightSeries) -> f64 {
    if weights.len() < 2 {
        return 0.0;
    }
    let mut total = 0.0;
    for i in 1..weights.len() {
        let (Some(prev), Some(curr)) = (weights.row(i - 1), weights.row(i)) else {
            continue;
        };
        total += (0..curr.len())
            .map(|a| (curr.get(a).unwrap_or(0.0) - prev.get(a).unwrap_or(0.0)).abs())
            .sum::<f64>();
    }
    total / (weights.len() - 1) as f64
}

impl Metrics {
    pub fn compute(weights: &WeightSeries, panel: &Panel, risk_free_rate: f64) -> Self {
        let curve = equity_curve(weights, panel);

        let final_equity = curve.last().map(|p| p.equity).unwrap_or(1.0);
        let total_return = final_equity - 1.0;

        let trading_days = curve.len();
        let years = trading_days as f64 / TRADING_DAYS_PER_YEAR;
        let annualized_return = if years > 0.0 && total_return.is_finite() && final_equity > 0.0 {
            final_equity.powf(1.0 / years) - 1.0
        } else {
            0.0
        };

        let (max_drawdown, max_drawdown_duration) = compute_drawdown(&curve);

        let daily_rf = risk_free_rate / TRADING_DAYS_PER_YEAR;
        let (volatility, sharpe_ratio, sortino_ratio) = compute_risk_adjusted(&curve, daily_rf);

        Metrics {
            total_return,
            annualized_return,
            volatility,
            sharpe_ratio,
            sortino_ratio,
            max_drawdown,
            max_drawdown_duration,
            mean_turnover: mean_turnover(weights),
            trading_days,
        }
    }
}

fn compute_drawdown(equity_curve: &[EquityPoint]) -> (f64, i64) {
    let Some(first) = equity_curve.first() else {
        return (0.0, 0);
    };

    let mut peak = first.equity;
    let mut max_dd = 0.0_f64;
    let mut max_dd_duration = 0i64;
    let mut current_dd_duration = 0i64;

    for point in equity_curve {
        if point.equity >= peak {
            peak = point.equity;
            current_dd_duration = 0;
        } else if peak > 0.0 {
            let dd = (peak - point.equity) / peak;
            max_dd = max_dd.max(dd);
            current_dd_duration += 1;
            max_dd_duration = max_dd_duration.max(current_dd_duration);
        }
    }

    (max_dd, max_dd_duration)
}

/// Annualized volatility, Sharpe and Sortino ratios of daily returns.
fn compute_risk_adjusted(equity_curve: &[EquityPoint], daily_rf: f64) -> (f64, f64, f64) {
    if equity_curve.len() < 2 {
        return (0.0, 0.0, 0.0);
    }

    let returns: Vec<f64> = equity_curve
        .windows(2)
        .map(|w| {
            let prev = w[0].equity;
            if prev > 0.0 {
                (w[1].equity - prev) / prev
            } else {
                0.0
            }
        })
        .collect();

    let n = returns.len() as f64;
    let mean: f64 = returns.iter().sum::<f64>() / n;
    let variance: f64 = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
    let stddev = variance.sqrt();
    let annualizer = TRADING_DAYS_PER_YEAR.sqrt();

    let excess_return = mean - daily_rf;
    let sharpe = if stddev > 0.0 {
        excess_return / stddev * annualizer
    } else {
        0.0
    };

    let downside: f64 = returns
        .iter()
        .filter(|&&r| r < daily_rf)
        .map(|&r| (r - daily_rf).powi(2))
        .sum();
    let downside_stddev = (downside / n).sqrt();
    let sortino = if downside_stddev > 0.0 {
        excess_return / downside_stddev * annualizer
    } else {
        0.0
    };

    (stddev * annualizer, sharpe, sortino)
}
