//! Common utilities shared across ezsearch crates.
//!
//! Right now this is only the [`observability`] module: one place that
//! installs the global `tracing` subscriber for the binary and for tests.
//!
//! # Examples
//!
//! ```rust
//! use ezsearch_common::observability::{LogConfig, LogFormat};
//!
//! let cfg = LogConfig {
//!     format: LogFormat::Json,
//!     ..LogConfig::default()
//! };
//! assert!(cfg.emit_stderr);
//! assert!(!cfg.emit_file);
//! ```

pub mod observability;
