//! Transformations over graph batches
//!
//! The central transform is [`PadToTotalSizes`], which grows a flattened
//! graph batch to pre-declared total sizes so downstream fixed-shape
//! computation never has to reshape per batch.

#![warn(missing_docs)]

pub mod constraints;
pub mod padding;
pub mod transform;

// Re-export key types for convenience
pub use constraints::{SizeConstraints, SizeValue};
pub use padding::PadToTotalSizes;
pub use transform::{GraphBatchTransform, TransformChain};
