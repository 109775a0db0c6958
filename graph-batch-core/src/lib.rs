//! Core data model for flattened graph batches
//!
//! This crate provides the foundational pieces for fixed-shape graph
//! processing: structural schemas, typed feature columns, and the
//! `GraphBatch` container that holds many graph components flattened
//! into one value with per-component `sizes` accounting.

#![warn(missing_docs)]

pub mod error;
pub mod feature;
pub mod graph;
pub mod schema;

// Re-export key types for convenience
pub use error::{Error, Result};
pub use feature::{FeatureColumn, FeatureValues};
pub use graph::{Adjacency, Context, EdgeSet, GraphBatch, NodeSet};
pub use schema::{DataType, EdgeSetSpec, FeatureSpec, GraphSchema, NodeSetSpec};
