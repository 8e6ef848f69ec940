//! Shutdown on SIGTERM/SIGINT.

mod signals;

pub use signals::SignalHandler;
