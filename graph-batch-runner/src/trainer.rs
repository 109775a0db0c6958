//! Trainer abstraction: training and validation execution

use std::path::Path;

use graph_batch_core::Result;

use crate::provider::TrainingProvider;
use crate::task::Model;

/// A factory producing a fresh, task-adapted model per training run
pub type ModelFn<'a> = &'a (dyn Fn() -> Result<Box<dyn Model>> + Send + Sync);

/// Executes training and validation, including any distribution strategy
pub trait Trainer: Send + Sync {
    /// Directory for checkpoints and exports
    fn model_dir(&self) -> &Path;

    /// Train a model with optional validation.
    ///
    /// `train_provider` and `valid_provider` yield per-replica training
    /// items; how replicas are scheduled is the trainer's concern.
    fn train(
        &self,
        model_fn: ModelFn<'_>,
        train_provider: &dyn TrainingProvider,
        epochs: usize,
        valid_provider: Option<&dyn TrainingProvider>,
    ) -> Result<Box<dyn Model>>;
}
