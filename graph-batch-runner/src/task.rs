//! Task abstraction: the ancillary pieces that adapt a model to a training objective

use std::path::Path;

use graph_batch_core::{FeatureColumn, GraphBatch, Result};

use crate::preprocess::GraphProcessor;

/// A trained or trainable model over graph batches.
///
/// Model internals belong to the host ML stack; this seam only needs
/// application to a batch and export to a directory.
pub trait Model: Send + Sync {
    /// Apply the model to one batch, producing one prediction column
    fn apply(&self, batch: &GraphBatch) -> Result<FeatureColumn>;

    /// Save this model under the given directory
    fn save(&self, dir: &Path) -> Result<()>;
}

/// A loss over (ground truth, prediction) columns
pub type LossFn = Box<dyn Fn(&FeatureColumn, &FeatureColumn) -> Result<f64> + Send + Sync>;

/// A metric over (ground truth, prediction) columns
pub type MetricFn = Box<dyn Fn(&FeatureColumn, &FeatureColumn) -> Result<f64> + Send + Sync>;

/// Collects the supporting pieces that specialize a base model to a task
pub trait Task: Send + Sync {
    /// Adapt a model to this task by appending arbitrary head(s)
    fn adapt(&self, model: Box<dyn Model>) -> Result<Box<dyn Model>>;

    /// Task-specific batch processing, e.g. label extraction
    fn preprocessors(&self) -> Vec<Box<dyn GraphProcessor>>;

    /// Losses matching any head(s)
    fn losses(&self) -> Vec<LossFn>;

    /// Task-specific metrics
    fn metrics(&self) -> Vec<MetricFn>;
}
