//! Operational plumbing for the `chainetl` binary.
//!
//! - **Config**: YAML configuration with fail-fast validation
//! - **Observability**: `tracing` subscriber setup
//! - **Shutdown**: SIGTERM/SIGINT fan-out over a watch channel
//!
//! # Example
//!
//! ```no_run
//! use chainetl_operations::{config::load_config, init_tracing_from_config, SignalHandler};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("config.yaml")?;
//!     init_tracing_from_config(&config.observability);
//!
//!     let signal_handler = SignalHandler::new();
//!     signal_handler.start();
//!
//!     let mut rx = signal_handler.subscribe();
//!     rx.changed().await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod errors;
pub mod observability;
pub mod shutdown;

pub use config::{load_config, EtlConfig, NodeConfig, ObservabilityConfig, StreamConfig};
pub use errors::ConfigError;
pub use observability::{init_tracing, init_tracing_from_config, parse_level, LogFormat};
pub use shutdown::SignalHandler;
