//! In-memory adapters.
//!
//! Used by tests and by hosts that embed the engine without a database.

mod checkpoint_store;
mod pattern_repository;
mod prediction_source;

pub use checkpoint_store::InMemoryCheckpointStore;
pub use pattern_repository::InMemoryPatternRepository;
pub use prediction_source::InMemoryPredictionSource;
