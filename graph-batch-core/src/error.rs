//! Error types for graph-batch operations

use std::io;
use thiserror::Error;

/// Result type for graph-batch operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for graph-batch operations
#[derive(Error, Debug)]
pub enum Error {
    /// IO error during file operations
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// A node-set or edge-set name does not exist in the batch's schema
    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    /// Actual content exceeds a declared size ceiling
    #[error("Capacity exceeded for {piece}: actual total {actual} does not fit ceiling {ceiling}")]
    CapacityExceeded {
        /// The graph piece whose ceiling was exceeded
        piece: String,
        /// Actual total size of the piece
        actual: i64,
        /// Declared ceiling for the piece
        ceiling: i64,
    },

    /// A size ceiling is not a plain integer nor a single-element numeric container
    #[error("Malformed ceiling: {0}")]
    MalformedCeiling(String),

    /// Index out of bounds
    #[error("Index out of bounds")]
    IndexOutOfBounds,

    /// Invalid argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Invalid operation
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),
}
