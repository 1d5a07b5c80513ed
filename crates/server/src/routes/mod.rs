pub mod base_fees;
pub mod error;
pub mod extra_fees;
pub mod fee;
pub mod weather;

pub use base_fees::*;
pub use error::*;
pub use extra_fees::*;
pub use fee::*;
pub use weather::*;
