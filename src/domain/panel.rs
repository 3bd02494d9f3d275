//! Time × field × asset store with an aligned calendar.
//!
//! Every asset shares one time axis: the union of all bar dates. An asset
//! with no bar on a date holds null in every field, and its liquidity flag
//! reads as false.

use crate::domain::bar::Bar;
use chrono::{NaiveDate, TimeDelta};
use std::collections::{BTreeSet, HashMap};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Open,
    High,
    Low,
    Close,
    Volume,
    IsLiquid,
}

impl Field {
    pub const ALL: [Field; 6] = [
        Field::Open,
        Field::High,
        Field::Low,
        Field::Close,
        Field::Volume,
        Field::IsLiquid,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Field::Open => "open",
            Field::High => "high",
            Field::Low => "low",
            Field::Close => "close",
            Field::Volume => "volume",
            Field::IsLiquid => "is_liquid",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone)]
pub struct Panel {
    dates: Vec<NaiveDate>,
    assets: Vec<String>,
    asset_index: HashMap<String, usize>,
    // Laid out as [time][field][asset]; NaN is null.
    values: Vec<f64>,
}

impl Panel {
    /// An all-null panel over the given calendar. Dates are sorted and deduplicated.
    pub fn new(dates: Vec<NaiveDate>, assets: Vec<String>) -> Self {
        let dates: Vec<NaiveDate> = dates
            .into_iter()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let asset_index = assets
            .iter()
            .enumerate()
            .map(|(i, a)| (a.clone(), i))
            .collect();
        let values = vec![f64::NAN; dates.len() * Field::ALL.len() * assets.len()];
        Self {
            dates,
            assets,
            asset_index,
            values,
        }
    }

    /// Builds the unified timeline from `bars` and fills the panel.
    /// Bars for assets outside `assets` are ignored.
    pub fn from_bars<I>(assets: Vec<String>, bars: I) -> Self
    where
        I: IntoIterator<Item = Bar>,
    {
        let bars: Vec<Bar> = bars.into_iter().collect();
        let dates = bars.iter().map(|b| b.date).collect();
        let mut panel = Panel::new(dates, assets);

        for bar in &bars {
            let (Some(t), Some(a)) = (panel.date_index(bar.date), panel.asset_index(&bar.asset))
            else {
                continue;
            };
            for field in Field::ALL {
                panel.set(t, field, a, bar.field(field));
            }
        }
        panel
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn assets(&self) -> &[String] {
        &self.assets
    }

    /// Number of time steps.
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn asset_count(&self) -> usize {
        self.assets.len()
    }

    pub fn asset_index(&self, asset: &str) -> Option<usize> {
        self.asset_index.get(asset).copied()
    }

    pub fn date_index(&self, date: NaiveDate) -> Option<usize> {
        self.dates.binary_search(&date).ok()
    }

    /// Index of the first date `>= date`.
    pub fn lower_bound(&self, date: NaiveDate) -> usize {
        self.dates.partition_point(|d| *d < date)
    }

    /// Index of the first date `> date`.
    pub fn upper_bound(&self, date: NaiveDate) -> usize {
        self.dates.partition_point(|d| *d <= date)
    }

    /// Index of the first row inside the calendar window (as_of - lookback, as_of].
    /// A horizon before the earliest representable date starts at row 0.
    pub fn window_start(&self, as_of: NaiveDate, lookback_days: i64) -> usize {
        TimeDelta::try_days(lookback_days)
            .and_then(|lookback| as_of.checked_sub_signed(lookback))
            .map_or(0, |horizon| self.upper_bound(horizon))
    }

    fn offset(&self, t: usize, field: Field, asset: usize) -> usize {
        (t * Field::ALL.len() + field.index()) * self.assets.len() + asset
    }

    /// Value at (t, field, asset); `None` when null or out of range.
    pub fn get(&self, t: usize, field: Field, asset: usize) -> Option<f64> {
        if t >= self.dates.len() || asset >= self.assets.len() {
            return None;
        }
        let v = self.values[self.offset(t, field, asset)];
        if v.is_nan() { None } else { Some(v) }
    }

    /// Stores `value` at (t, field, asset). Out-of-range writes are ignored.
    pub fn set(&mut self, t: usize, field: Field, asset: usize, value: f64) {
        if t >= self.dates.len() || asset >= self.assets.len() {
            return;
        }
        let i = self.offset(t, field, asset);
        self.values[i] = value;
    }

    pub fn is_liquid(&self, t: usize, asset: usize) -> bool {
        matches!(self.get(t, Field::IsLiquid, asset), Some(v) if v > 0.0)
    }

    /// Liquidity flags of every asset at time `t`.
    pub fn liquidity_mask(&self, t: usize) -> Vec<bool> {
        (0..self.assets.len()).map(|a| self.is_liquid(t, a)).collect()
    }
}
