//! Infrastructure layer module
//!
//! Configuration loading and logging setup. Storage adapters live in
//! `adapters`.

pub mod config;
pub mod logging;
