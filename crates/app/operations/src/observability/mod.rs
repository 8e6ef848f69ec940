//! Logging setup.

pub mod logging;

pub use logging::{init_tracing, init_tracing_from_config, parse_level, LogFormat};
