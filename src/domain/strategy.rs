//! Strategy contract and the moving-average crossover strategy.

use crate::domain::error::MultipassError;
use crate::domain::indicator::sma::{rolling_sma, sma_last};
use crate::domain::panel::{Field, Panel};
use crate::domain::weights::{WeightSeries, WeightVector};
use crate::domain::window::PanelWindow;

/// A pure function from a window to the weights for the window's last date.
///
/// Implementations take `&self` and must not carry state between calls: the
/// engine may evaluate the same window more than once and expects identical
/// output each time.
pub trait Strategy {
    fn name(&self) -> &str;

    /// Raw weights for `window.as_of()`, one per asset on the panel's axis.
    fn weights(&self, window: &PanelWindow<'_>) -> Result<WeightVector, MultipassError>;

    /// Raw weights for every date of `panel` in one pass, each computed as if
    /// from a `lookback_days` window. `None` when the strategy has no
    /// single-pass form.
    fn weights_full(
        &self,
        _panel: &Panel,
        _lookback_days: i64,
    ) -> Option<Result<WeightSeries, MultipassError>> {
        None
    }
}

/// Adapts a closure into a [`Strategy`] without a single-pass form.
pub struct FnStrategy<F> {
    name: String,
    func: F,
}

impl<F> FnStrategy<F>
where
    F: Fn(&PanelWindow<'_>) -> Result<WeightVector, MultipassError>,
{
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

impl<F> Strategy for FnStrategy<F>
where
    F: Fn(&PanelWindow<'_>) -> Result<WeightVector, MultipassError>,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn weights(&self, window: &PanelWindow<'_>) -> Result<WeightVector, MultipassError> {
        (self.func)(window)
    }
}

pub const DEFAULT_FAST_PERIOD: usize = 20;
pub const DEFAULT_SLOW_PERIOD: usize = 200;

/// Long when the fast close SMA is above the slow one, short otherwise.
/// Illiquid assets and assets without enough history get zero weight.
#[derive(Debug, Clone, PartialEq)]
pub struct MaCrossover {
    pub fast_period: usize,
    pub slow_period: usize,
}

impl Default for MaCrossover {
    fn default() -> Self {
        Self {
            fast_period: DEFAULT_FAST_PERIOD,
            slow_period: DEFAULT_SLOW_PERIOD,
        }
    }
}

impl MaCrossover {
    pub fn new(fast_period: usize, slow_period: usize) -> Self {
        Self {
            fast_period,
            slow_period,
        }
    }

    fn signal(fast: Option<f64>, slow: Option<f64>, liquid: bool) -> f64 {
        match (fast, slow) {
            _ if !liquid => 0.0,
            (Some(fast), Some(slow)) if fast > slow => 1.0,
            (Some(_), Some(_)) => -1.0,
            _ => 0.0,
        }
    }
}

impl Strategy for MaCrossover {
    fn name(&self) -> &str {
        "ma_crossover"
    }

    fn weights(&self, window: &PanelWindow<'_>) -> Result<WeightVector, MultipassError> {
        let weights = (0..window.asset_count())
            .map(|a| {
                let closes = window.series(Field::Close, a);
                Self::signal(
                    sma_last(&closes, self.fast_period),
                    sma_last(&closes, self.slow_period),
                    window.is_liquid(a),
                )
            })
            .collect();
        Ok(WeightVector::new(weights))
    }

    fn weights_full(
        &self,
        panel: &Panel,
        lookback_days: i64,
    ) -> Option<Result<WeightSeries, MultipassError>> {
        let averages: Vec<(Vec<Option<f64>>, Vec<Option<f64>>)> = (0..panel.asset_count())
            .map(|a| {
                let closes: Vec<Option<f64>> =
                    (0..panel.len()).map(|t| panel.get(t, Field::Close, a)).collect();
                (
                    rolling_sma(&closes, self.fast_period),
                    rolling_sma(&closes, self.slow_period),
                )
            })
            .collect();

        let mut series = WeightSeries::new(panel.assets().to_vec());
        for (t, &date) in panel.dates().iter().enumerate() {
            // an average only counts once the calendar window holds its full period
            let rows = t - panel.window_start(date, lookback_days).min(t) + 1;
            let within = |sma: &[Option<f64>], period: usize| sma[t].filter(|_| rows >= period);
            let row = averages
                .iter()
                .enumerate()
                .map(|(a, (fast, slow))| {
                    Self::signal(
                        within(fast, self.fast_period),
                        within(slow, self.slow_period),
                        panel.is_liquid(t, a),
                    )
                })
                .collect();
            series.push(date, WeightVector::new(row));
        }
        Some(Ok(series))
    }
}
