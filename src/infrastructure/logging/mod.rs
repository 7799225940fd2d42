//! Logging infrastructure
//!
//! Structured logging using tracing and tracing-subscriber:
//! - Pretty or JSON console output on stderr
//! - Optional daily-rotated JSON log files with retention
pub mod logger;

pub use logger::{LogFormat, LoggerImpl};
