//! Orchestration glue for training models over graph batches
//!
//! This crate composes the narrow external seams of a training run —
//! dataset providers, a preprocessing stage, a task, and a trainer —
//! around the graph-batch data model. None of it carries modeling logic;
//! `run` is configuration and composition only.

#![warn(missing_docs)]

pub mod orchestration;
pub mod preprocess;
pub mod provider;
pub mod task;
pub mod trainer;

// Re-export key types for convenience
pub use orchestration::{run, RunOptions};
pub use preprocess::{GraphProcessor, PreprocessModel, ProcessorOutput};
pub use provider::{
    DatasetProvider, GraphBatchSource, InputContext, TrainingItem, TrainingProvider, VecSource,
    WrappedDatasetProvider,
};
pub use task::{LossFn, MetricFn, Model, Task};
pub use trainer::{ModelFn, Trainer};
