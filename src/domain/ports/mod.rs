//! Port trait definitions (Hexagonal Architecture)
//!
//! This module defines async trait interfaces that infrastructure adapters must implement:
//! - PatternRepository: persistence of pattern records with optimistic writes
//! - PredictionSource: read access to resolved predictions owned by the host application
//! - CheckpointStore: persistence of the learning cursor and deferred stats

pub mod checkpoint_store;
pub mod pattern_repository;
pub mod prediction_source;

pub use checkpoint_store::{CheckpointStore, LearningCheckpoint};
pub use pattern_repository::PatternRepository;
pub use prediction_source::{PredictionCursor, PredictionPage, PredictionSource};
