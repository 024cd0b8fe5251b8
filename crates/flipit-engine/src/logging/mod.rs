//! Logging setup.
//!
//! Everything in the workspace logs through the `log` facade; this module only
//! decides which `env_logger` filter is installed at startup.

mod init;

pub use init::{init_logging, LoggingConfig, DEFAULT_FILTER};
