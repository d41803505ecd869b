mod config;
mod constants;
mod data;
mod error;

pub use config::*;
pub use constants::*;
pub use data::*;
pub use error::*;
