//! CSV weight series writer: `date,<asset>...`, one row per evaluation date.

use crate::domain::backtest::BacktestResult;
use crate::domain::error::MultipassError;
use crate::domain::weights::WeightSeries;
use crate::ports::report_port::ReportPort;
use std::io::Write;
use std::path::Path;

#[derive(Debug, Default)]
pub struct CsvReportAdapter;

impl CsvReportAdapter {
    pub fn new() -> Self {
        Self
    }

    /// Writes `series` to any writer.
    pub fn write_series<W: Write>(series: &WeightSeries, out: W) -> Result<(), MultipassError> {
        let mut wtr = csv::Writer::from_writer(out);

        let mut header = vec!["date".to_string()];
        header.extend(series.assets().iter().cloned());
        wtr.write_record(&header)?;

        for (date, row) in series.iter() {
            let mut record = Vec::with_capacity(row.len() + 1);
            record.push(date.format("%Y-%m-%d").to_string());
            record.extend((0..row.len()).map(|a| row.get(a).unwrap_or(0.0).to_string()));
            wtr.write_record(&record)?;
        }

        wtr.flush()?;
        Ok(())
    }
}

impl ReportPort for CsvReportAdapter {
    fn write(&self, result: &BacktestResult, output_path: &Path) -> Result<(), MultipassError> {
        let file = std::fs::File::create(output_path)?;
        Self::write_series(&result.weights, file)
    }
}
