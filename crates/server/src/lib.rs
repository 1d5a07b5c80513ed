pub mod db;
pub mod fees;
mod routes;
mod startup;
mod utils;

pub use db::*;
pub use fees::{FeeCalculator, FeeQuote, Vehicle};
pub use routes::*;
pub use startup::*;
pub use utils::*;
