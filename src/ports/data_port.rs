//! Bar source port.

use crate::domain::bar::Bar;
use crate::domain::error::MultipassError;
use chrono::NaiveDate;

pub trait DataPort {
    /// Bars for `asset` with dates in `[start_date, end_date]`, sorted by date.
    fn fetch_bars(
        &self,
        asset: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<Bar>, MultipassError>;

    fn list_assets(&self) -> Result<Vec<String>, MultipassError>;

    /// First date, last date and bar count for `asset`, or `None` without data.
    fn get_data_range(
        &self,
        asset: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, MultipassError>;
}
