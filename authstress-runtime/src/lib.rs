//! Command line runner for [`authstress`].
mod cli;
mod error;
pub mod runtime;

pub use crate::error::RuntimeError;
pub use crate::runtime::AuthstressRuntime;
