//! CSV directory data adapter.
//!
//! One file per asset, `<ASSET>.csv`, with a header row naming at least
//! `date,open,high,low,close,volume`. An optional `is_liquid` column holds
//! `1/0/true/false/yes/no`; a bar without it is liquid. Empty price cells
//! are null.

use crate::domain::bar::Bar;
use crate::domain::error::MultipassError;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;

const REQUIRED_COLUMNS: [&str; 6] = ["date", "open", "high", "low", "close", "volume"];

pub struct CsvAdapter {
    base_path: PathBuf,
}

struct Columns {
    date: usize,
    open: usize,
    high: usize,
    low: usize,
    close: usize,
    volume: usize,
    is_liquid: Option<usize>,
}

impl Columns {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self, MultipassError> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
        };
        let require = |name: &str| {
            find(name).ok_or_else(|| MultipassError::Data {
                reason: format!("missing {} column", name),
            })
        };
        Ok(Self {
            date: require(REQUIRED_COLUMNS[0])?,
            open: require(REQUIRED_COLUMNS[1])?,
            high: require(REQUIRED_COLUMNS[2])?,
            low: require(REQUIRED_COLUMNS[3])?,
            close: require(REQUIRED_COLUMNS[4])?,
            volume: require(REQUIRED_COLUMNS[5])?,
            is_liquid: find("is_liquid"),
        })
    }
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    /// `<asset>.csv`, falling back to a case-insensitive match on the file stem.
    fn csv_path(&self, asset: &str) -> PathBuf {
        let exact = self.base_path.join(format!("{}.csv", asset));
        if exact.exists() {
            return exact;
        }
        self.csv_files()
            .into_iter()
            .find(|(stem, _)| stem.eq_ignore_ascii_case(asset))
            .map_or(exact, |(_, path)| path)
    }

    /// Every `*.csv` file in the directory with its stem. Unreadable
    /// directories list nothing.
    fn csv_files(&self) -> Vec<(String, PathBuf)> {
        let Ok(entries) = fs::read_dir(&self.base_path) else {
            return Vec::new();
        };
        entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.extension().and_then(|e| e.to_str()) == Some("csv"))
            .filter_map(|path| {
                let stem = path.file_stem()?.to_str()?.to_string();
                Some((stem, path))
            })
            .collect()
    }

    fn read_all(&self, asset: &str) -> Result<Vec<Bar>, MultipassError> {
        let path = self.csv_path(asset);
        let content = fs::read_to_string(&path).map_err(|e| MultipassError::Data {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let columns = Columns::from_headers(rdr.headers()?)?;
        let mut bars = Vec::new();

        for result in rdr.records() {
            let record = result?;

            let date_str = record.get(columns.date).unwrap_or("").trim();
            let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d").map_err(|e| {
                MultipassError::Data {
                    reason: format!("invalid date {:?} in {}: {}", date_str, path.display(), e),
                }
            })?;

            let is_liquid = match columns.is_liquid {
                Some(i) => parse_flag(record.get(i).unwrap_or(""))?,
                None => true,
            };

            bars.push(Bar {
                asset: asset.to_string(),
                date,
                open: parse_value(&record, columns.open, "open")?,
                high: parse_value(&record, columns.high, "high")?,
                low: parse_value(&record, columns.low, "low")?,
                close: parse_value(&record, columns.close, "close")?,
                volume: parse_value(&record, columns.volume, "volume")?,
                is_liquid,
            });
        }

        bars.sort_by_key(|b| b.date);
        Ok(bars)
    }
}

fn parse_value(record: &csv::StringRecord, index: usize, name: &str) -> Result<f64, MultipassError> {
    let raw = record.get(index).unwrap_or("").trim();
    if raw.is_empty() || raw.eq_ignore_ascii_case("nan") {
        return Ok(f64::NAN);
    }
    raw.parse().map_err(|e| MultipassError::Data {
        reason: format!("invalid {} value {:?}: {}", name, raw, e),
    })
}

fn parse_flag(raw: &str) -> Result<bool, MultipassError> {
    match raw.trim().to_lowercase().as_str() {
        "" | "1" | "1.0" | "true" | "yes" => Ok(true),
        "0" | "0.0" | "false" | "no" => Ok(false),
        other => Err(MultipassError::Data {
            reason: format!("invalid is_liquid value {:?}", other),
        }),
    }
}

impl DataPort for CsvAdapter {
    fn fetch_bars(
        &self,
        asset: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<Bar>, MultipassError> {
        let mut bars = self.read_all(asset)?;
        bars.retain(|b| b.date >= start_date && b.date <= end_date);
        Ok(bars)
    }

    fn list_assets(&self) -> Result<Vec<String>, MultipassError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| MultipassError::Data {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut assets = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("csv") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                assets.push(stem.to_uppercase());
            }
        }

        assets.sort();
        assets.dedup();
        Ok(assets)
    }

    fn get_data_range(
        &self,
        asset: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, MultipassError> {
        if !self.csv_path(asset).exists() {
            return Ok(None);
        }
        let bars = self.read_all(asset)?;
        Ok(match (bars.first(), bars.last()) {
            (Some(first), Some(last)) => Some((first.date, last.date, bars.len())),
            _ => None,
        })
    }
}
