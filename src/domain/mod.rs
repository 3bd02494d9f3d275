//! Core domain types and logic.

pub mod bar;
pub mod panel;
pub mod window;
pub mod weights;
pub mod indicator;
pub mod strategy;
pub mod backtest;
pub mod metrics;
pub mod universe;
pub mod config_validation;
pub mod error;
