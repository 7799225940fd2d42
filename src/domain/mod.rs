//! Domain layer for the prediction pattern engine
//!
//! This module contains the pattern model, its errors, and the port traits
//! that storage and prediction-source adapters implement.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{DomainError, DomainResult};
