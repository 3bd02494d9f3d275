//! Weight vectors, the assembled weight series, and the normalizer.
//!
//! Normalization follows one rule: null weights and weights on illiquid
//! assets become zero, then a step whose gross exposure (sum of absolute
//! weights) exceeds 1 is divided by that sum. Steps at or below 1 are left
//! as they are, so partial investment is allowed.

use crate::domain::panel::Panel;
use chrono::NaiveDate;

/// Slack allowed when checking the exposure bound.
pub const EXPOSURE_EPSILON: f64 = 1e-9;

/// Per-asset signed capital fractions for one time step, aligned with the
/// panel's asset axis. Non-finite entries are null.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightVector {
    weights: Vec<f64>,
}

impl WeightVector {
    pub fn new(weights: Vec<f64>) -> Self {
        Self { weights }
    }

    pub fn zeros(asset_count: usize) -> Self {
        Self {
            weights: vec![0.0; asset_count],
        }
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Weight of the asset at `index`; null and out-of-range read as `None`.
    pub fn get(&self, index: usize) -> Option<f64> {
        self.weights.get(index).copied().filter(|w| w.is_finite())
    }

    pub fn set(&mut self, index: usize, weight: f64) {
        if let Some(w) = self.weights.get_mut(index) {
            *w = weight;
        }
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.weights
    }

    /// Sum of absolute weights, ignoring nulls.
    pub fn gross_exposure(&self) -> f64 {
        self.weights
            .iter()
            .filter(|w| w.is_finite())
            .map(|w| w.abs())
            .sum()
    }

    /// Zeroes nulls and illiquid assets, then caps gross exposure at 1.
    pub fn clean(mut self, liquid: &[bool]) -> Self {
        for (i, w) in self.weights.iter_mut().enumerate() {
            let is_liquid = liquid.get(i).copied().unwrap_or(false);
            if !w.is_finite() || !is_liquid {
                *w = 0.0;
            }
        }
        normalize(&mut self.weights);
        self
    }
}

impl From<Vec<f64>> for WeightVector {
    fn from(weights: Vec<f64>) -> Self {
        Self::new(weights)
    }
}

/// Divides every weight by the gross exposure when it exceeds 1.
pub fn normalize(weights: &mut [f64]) {
    let gross: f64 = weights.iter().map(|w| w.abs()).sum();
    if gross > 1.0 {
        for w in weights.iter_mut() {
            *w /= gross;
        }
    }
}

/// Time-indexed weight vectors over a fixed asset axis.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightSeries {
    assets: Vec<String>,
    dates: Vec<NaiveDate>,
    rows: Vec<WeightVector>,
}

impl WeightSeries {
    pub fn new(assets: Vec<String>) -> Self {
        Self {
            assets,
            dates: Vec::new(),
            rows: Vec::new(),
        }
    }

    /// Appends the vector for `date`. Dates must be pushed in increasing order.
    pub fn push(&mut self, date: NaiveDate, weights: WeightVector) {
        debug_assert!(self.dates.last().is_none_or(|last| *last < date));
        debug_assert_eq!(weights.len(), self.assets.len());
        self.dates.push(date);
        self.rows.push(weights);
    }

    pub fn assets(&self) -> &[String] {
        &self.assets
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, index: usize) -> Option<&WeightVector> {
        self.rows.get(index)
    }

    pub fn get(&self, date: NaiveDate) -> Option<&WeightVector> {
        self.dates
            .binary_search(&date)
            .ok()
            .map(|i| &self.rows[i])
    }

    /// Weight of `asset` on `date`, if both exist.
    pub fn weight(&self, date: NaiveDate, asset: &str) -> Option<f64> {
        let a = self.assets.iter().position(|x| x == asset)?;
        self.get(date)?.get(a)
    }

    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, &WeightVector)> {
        self.dates.iter().copied().zip(self.rows.iter())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WeightViolation {
    ExposureExceeded {
        date: NaiveDate,
        gross: f64,
    },
    IlliquidHolding {
        date: NaiveDate,
        asset: String,
        weight: f64,
    },
}

/// Lists every step where the series breaks the exposure bound or holds an
/// asset that is illiquid on that date in `panel`.
pub fn check_weights(series: &WeightSeries, panel: &Panel) -> Vec<WeightViolation> {
    let mut violations = Vec::new();

    for (date, row) in series.iter() {
        let gross = row.gross_exposure();
        if gross > 1.0 + EXPOSURE_EPSILON {
            violations.push(WeightViolation::ExposureExceeded { date, gross });
        }

        let t = panel.date_index(date);
        for (i, asset) in series.assets().iter().enumerate() {
            let weight = row.get(i).unwrap_or(0.0);
            if weight == 0.0 {
                continue;
            }
            let liquid = match (t, panel.asset_index(asset)) {
                (Some(t), Some(a)) => panel.is_liquid(t, a),
                _ => false,
            };
            if !liquid {
                violations.push(WeightViolation::IlliquidHolding {
                    date,
                    asset: asset.clone(),
                    weight,
                });
            }
        }
    }

    violations
}
