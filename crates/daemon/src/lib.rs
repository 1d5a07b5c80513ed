mod domains;
mod upload;
mod utils;

pub use domains::*;
pub use upload::*;
pub use utils::*;
