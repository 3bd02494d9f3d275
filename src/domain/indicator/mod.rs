//! Indicators over nullable price series.
//!
//! Inputs are `Option<f64>` slices oldest first, as produced by
//! [`PanelWindow::series`](crate::domain::window::PanelWindow::series).
//! A null anywhere inside an indicator's lookback makes that point null.

pub mod sma;
