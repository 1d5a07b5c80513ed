//! Delivery fee calculation.
//!
//! A quote is the city/vehicle base rate plus the weather surcharge, or
//! [`FeeQuote::VehicleForbidden`] when the applicable weather rules out the
//! vehicle altogether.

mod engine;
mod rates;
mod resolver;
mod surcharge;
mod tables;

pub use engine::*;
pub use rates::*;
pub use resolver::*;
pub use surcharge::*;
pub use tables::*;

use serde::Serialize;
use std::fmt;
use time::PrimitiveDateTime;

use crate::db;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FeeQuote {
    Fee(f64),
    VehicleForbidden,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RuleKind {
    Temperature,
    Wind,
    Phenomenon,
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleKind::Temperature => write!(f, "air temperature"),
            RuleKind::Wind => write!(f, "wind speed"),
            RuleKind::Phenomenon => write!(f, "weather phenomenon"),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("{0}")]
    BadInput(String),
    #[error("No weather observation for {station} near timestamp {timestamp}")]
    WeatherDataUnavailable { station: String, timestamp: i64 },
    #[error("Date-time {0} has no ingestion slot")]
    InstantOutOfRange(PrimitiveDateTime),
    #[error("Extra fee conditions for {0} are not configured")]
    NotConfigured(RuleKind),
    #[error("Could not find regional base fee for city {0}")]
    CityNotFound(String),
    #[error("Failed to read fee data: {0}")]
    Storage(#[from] db::Error),
}

impl Error {
    /// Configuration faults need an operator, not a different request.
    pub fn is_configuration_fault(&self) -> bool {
        matches!(self, Error::NotConfigured(_) | Error::CityNotFound(_))
    }
}
