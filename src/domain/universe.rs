//! Asset universe: parse asset lists and load their bars into a panel.
//!
//! Assets that fail to load or have no bars in range are skipped with a
//! warning; the load only fails when nothing is left.

use crate::domain::bar::Bar;
use crate::domain::error::MultipassError;
use crate::domain::panel::Panel;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::collections::HashSet;
use std::fmt;
use tracing::{info, warn};

#[derive(Debug, Clone, thiserror::Error)]
pub enum UniverseError {
    #[error("empty token in asset list")]
    EmptyToken,

    #[error("duplicate asset: {0}")]
    DuplicateAsset(String),
}

pub fn parse_assets(input: &str) -> Result<Vec<String>, UniverseError> {
    let mut assets = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(UniverseError::EmptyToken);
        }
        let asset = trimmed.to_uppercase();
        if !seen.insert(asset.clone()) {
            return Err(UniverseError::DuplicateAsset(asset));
        }
        assets.push(asset);
    }

    Ok(assets)
}

#[derive(Debug, Clone)]
pub struct SkippedAsset {
    pub asset: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone)]
pub enum SkipReason {
    NoData,
    FetchFailed(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NoData => f.write_str("no data in range"),
            SkipReason::FetchFailed(reason) => write!(f, "fetch failed: {}", reason),
        }
    }
}

#[derive(Debug)]
pub struct LoadedUniverse {
    pub panel: Panel,
    pub skipped: Vec<SkippedAsset>,
}

/// Fetches every asset's bars in `[start, end]` and assembles the panel.
pub fn load_panel(
    data_port: &dyn DataPort,
    assets: &[String],
    start: NaiveDate,
    end: NaiveDate,
) -> Result<LoadedUniverse, MultipassError> {
    let mut loaded = Vec::new();
    let mut bars: Vec<Bar> = Vec::new();
    let mut skipped = Vec::new();

    for asset in assets {
        match data_port.fetch_bars(asset, start, end) {
            Ok(asset_bars) if asset_bars.is_empty() => {
                warn!(%asset, "skipping asset: no data in range");
                skipped.push(SkippedAsset {
                    asset: asset.clone(),
                    reason: SkipReason::NoData,
                });
            }
            Ok(asset_bars) => {
                info!(%asset, bars = asset_bars.len(), "loaded");
                loaded.push(asset.clone());
                bars.extend(asset_bars);
            }
            Err(e) => {
                warn!(%asset, error = %e, "skipping asset");
                skipped.push(SkippedAsset {
                    asset: asset.clone(),
                    reason: SkipReason::FetchFailed(e.to_string()),
                });
            }
        }
    }

    if loaded.is_empty() {
        return Err(MultipassError::EmptyUniverse { start, end });
    }

    if !skipped.is_empty() {
        warn!(
            loaded = loaded.len(),
            requested = assets.len(),
            "backtesting a partial universe"
        );
    }

    Ok(LoadedUniverse {
        panel: Panel::from_bars(loaded, bars),
        skipped,
    })
}
