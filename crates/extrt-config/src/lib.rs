//! Runtime configuration (spec §6.3) and logging initialization.

pub mod config;
pub mod logging;

pub use config::{Config, LogFormat, LoggingConfig, LoadingConfig, SecurityConfig, Timeouts};
