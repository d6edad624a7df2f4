//! Logging utilities.
//!
//! Everything in the engine and the demo logs through the `log` facade;
//! this module only decides how `env_logger` is configured.

mod init;

pub use init::{init_logging, LoggingConfig, DEFAULT_FILTER};
