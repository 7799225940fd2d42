//! Infrastructure adapters for external systems.

pub mod ingestion;
pub mod json_file;
pub mod memory;
pub mod sqlite;
