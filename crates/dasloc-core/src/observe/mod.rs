//! # Observability
//!
//! Structured logging via `tracing`. The engine emits `debug` events when
//! a scan starts and finishes and a `trace` event for every scan step;
//! [`init_logging`] decides where, and whether, they are printed.

pub mod logging;

pub use logging::{init_logging, LogConfig, LogFormat, LogLevel};
