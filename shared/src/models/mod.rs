//! Domain models for the crop advisor

mod crop;
mod history;
mod soil;
mod weather;

pub use crop::*;
pub use history::*;
pub use soil::*;
pub use weather::*;
