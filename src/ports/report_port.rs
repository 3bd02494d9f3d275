//! Weight series output port.

use crate::domain::backtest::BacktestResult;
use crate::domain::error::MultipassError;
use std::path::Path;

/// Port for persisting a backtest's weight series.
pub trait ReportPort {
    fn write(&self, result: &BacktestResult, output_path: &Path) -> Result<(), MultipassError>;
}
