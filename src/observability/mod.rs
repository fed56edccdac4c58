//! Logging setup.
//!
//! Store calls and handler outcomes are emitted as `tracing` events; the
//! binary installs a subscriber once at startup through [`LoggingConfig`].

mod logging;

pub use logging::{LogFormat, LogLevel, LoggingConfig};
