//! Rolling-window cursor over a panel.
//!
//! For every evaluation date t the cursor yields a [`PanelWindow`] covering
//! the calendar range (t - lookback, t]. A window can only address rows up
//! to and including t; asking for a later date is an error, asking for an
//! earlier date outside the window yields null.

use crate::domain::error::MultipassError;
use crate::domain::panel::{Field, Panel};
use chrono::NaiveDate;

/// Read-only view of rows `start..=end` of a panel, evaluated as of row `end`.
#[derive(Debug, Clone, Copy)]
pub struct PanelWindow<'a> {
    panel: &'a Panel,
    start: usize,
    end: usize,
}

impl<'a> PanelWindow<'a> {
    /// Window evaluated as of row `as_of`, reaching back `lookback_days`
    /// calendar days. `None` when `as_of` is not a row of `panel`.
    pub fn at(panel: &'a Panel, as_of: usize, lookback_days: i64) -> Option<Self> {
        let as_of_date = *panel.dates().get(as_of)?;
        let start = panel.window_start(as_of_date, lookback_days).min(as_of);
        Some(Self {
            panel,
            start,
            end: as_of,
        })
    }

    /// The evaluation date: the last date in the window.
    pub fn as_of(&self) -> NaiveDate {
        self.panel.dates()[self.end]
    }

    pub fn dates(&self) -> &'a [NaiveDate] {
        &self.panel.dates()[self.start..=self.end]
    }

    /// Number of time steps in the window.
    pub fn len(&self) -> usize {
        self.end - self.start + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn assets(&self) -> &'a [String] {
        self.panel.assets()
    }

    pub fn asset_count(&self) -> usize {
        self.panel.asset_count()
    }

    /// Reads a field on `date`. Dates after the evaluation date are a
    /// forward-looking read and fail; dates absent from the window read as null.
    pub fn get(
        &self,
        date: NaiveDate,
        field: Field,
        asset: usize,
    ) -> Result<Option<f64>, MultipassError> {
        let as_of = self.as_of();
        if date > as_of {
            return Err(MultipassError::ForwardLooking {
                requested: date,
                as_of,
            });
        }
        match self.panel.date_index(date) {
            Some(t) if t >= self.start => Ok(self.panel.get(t, field, asset)),
            _ => Ok(None),
        }
    }

    /// Reads a field `offset` rows back from the evaluation date (0 is the
    /// evaluation date itself). Offsets past the window start read as null.
    pub fn lag(&self, offset: usize, field: Field, asset: usize) -> Option<f64> {
        if offset >= self.len() {
            return None;
        }
        self.panel.get(self.end - offset, field, asset)
    }

    /// Value on the evaluation date.
    pub fn last(&self, field: Field, asset: usize) -> Option<f64> {
        self.lag(0, field, asset)
    }

    /// The field's values across the window, oldest first.
    pub fn series(&self, field: Field, asset: usize) -> Vec<Option<f64>> {
        (self.start..=self.end)
            .map(|t| self.panel.get(t, field, asset))
            .collect()
    }

    /// Liquidity flag on the evaluation date.
    pub fn is_liquid(&self, asset: usize) -> bool {
        self.panel.is_liquid(self.end, asset)
    }

    pub fn liquidity_mask(&self) -> Vec<bool> {
        self.panel.liquidity_mask(self.end)
    }
}

/// Chronological iterator of windows for every panel date in `[start, end]`.
#[derive(Debug, Clone)]
pub struct RollingCursor<'a> {
    panel: &'a Panel,
    lookback_days: i64,
    next: usize,
    stop: usize,
}

impl<'a> RollingCursor<'a> {
    pub fn new(panel: &'a Panel, lookback_days: i64, start: NaiveDate, end: NaiveDate) -> Self {
        let next = panel.lower_bound(start);
        let stop = panel.upper_bound(end).max(next);
        Self {
            panel,
            lookback_days,
            next,
            stop,
        }
    }

    /// Dates the cursor will visit, in order.
    pub fn dates(&self) -> &'a [NaiveDate] {
        &self.panel.dates()[self.next..self.stop]
    }
}

impl<'a> Iterator for RollingCursor<'a> {
    type Item = PanelWindow<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.stop {
            return None;
        }
        let window = PanelWindow::at(self.panel, self.next, self.lookback_days)?;
        self.next += 1;
        Some(window)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.stop - self.next;
        (n, Some(n))
    }
}

impl ExactSizeIterator for RollingCursor<'_> {}
