#![allow(dead_code)]

use chrono::{Duration, NaiveDate};
use multipass::domain::backtest::BacktestConfig;
pub use multipass::domain::bar::Bar;
use multipass::domain::error::MultipassError;
use multipass::domain::panel::Panel;
use multipass::ports::data_port::DataPort;
use std::collections::HashMap;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<Bar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, asset: &str, bars: Vec<Bar>) -> Self {
        self.data.insert(asset.to_string(), bars);
        self
    }

    pub fn with_error(mut self, asset: &str, reason: &str) -> Self {
        self.errors.insert(asset.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_bars(
        &self,
        asset: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<Bar>, MultipassError> {
        if let Some(reason) = self.errors.get(asset) {
            return Err(MultipassError::Data {
                reason: reason.clone(),
            });
        }
        Ok(self
            .data
            .get(asset)
            .map(|bars| {
                bars.iter()
                    .filter(|b| b.date >= start_date && b.date <= end_date)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn list_assets(&self) -> Result<Vec<String>, MultipassError> {
        let mut assets: Vec<String> = self.data.keys().cloned().collect();
        assets.sort();
        Ok(assets)
    }

    fn get_data_range(
        &self,
        asset: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, MultipassError> {
        match self.data.get(asset) {
            Some(bars) if !bars.is_empty() => {
                let min = bars.iter().map(|b| b.date).min().unwrap();
                let max = bars.iter().map(|b| b.date).max().unwrap();
                Ok(Some((min, max, bars.len())))
            }
            _ => Ok(None),
        }
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn make_bar(asset: &str, date: NaiveDate, close: f64, is_liquid: bool) -> Bar {
    Bar {
        asset: asset.to_string(),
        date,
        open: close,
        high: close + 1.0,
        low: close - 1.0,
        close,
        volume: 1000.0,
        is_liquid,
    }
}

/// One bar per calendar day starting at `start`, close given by `price(i)`.
pub fn generate_bars(
    asset: &str,
    start: NaiveDate,
    count: usize,
    price: impl Fn(usize) -> f64,
) -> Vec<Bar> {
    (0..count)
        .map(|i| make_bar(asset, start + Duration::days(i as i64), price(i), true))
        .collect()
}

pub fn panel_of(assets: &[&str], bars: Vec<Bar>) -> Panel {
    Panel::from_bars(assets.iter().map(|a| a.to_string()).collect(), bars)
}

pub fn sample_config(start: NaiveDate, end: NaiveDate) -> BacktestConfig {
    BacktestConfig {
        start_date: start,
        end_date: end,
        lookback_days: 365,
        risk_free_rate: 0.0,
        check_forward_looking: true,
    }
}
