//! Shared services for the climbing runtimes: scoped logging and timing helpers.

pub mod logging;
pub mod macros;

pub use logging::{get_log_config, init_logging, LogConfig};
