//! Schema module - Configuration types for result reports.

mod config;

pub use crate::error::ConfigError;
pub use config::*;
