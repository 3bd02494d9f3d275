//! Daily bar representation.

use crate::domain::panel::Field;
use chrono::NaiveDate;

/// One asset's fields on one trading day.
#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub asset: String,
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub is_liquid: bool,
}

impl Bar {
    /// Value of `field` as stored on the panel. The liquidity flag maps to 1.0 / 0.0.
    pub fn field(&self, field: Field) -> f64 {
        match field {
            Field::Open => self.open,
            Field::High => self.high,
            Field::Low => self.low,
            Field::Close => self.close,
            Field::Volume => self.volume,
            Field::IsLiquid => {
                if self.is_liquid {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }
}
