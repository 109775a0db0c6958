//! Dataset providers and per-replica batching

use std::collections::VecDeque;
use std::sync::Arc;

use graph_batch_core::{Error, FeatureColumn, GraphBatch, Result};

use crate::preprocess::PreprocessModel;

/// Per-replica input context handed to dataset providers
#[derive(Debug, Clone)]
pub struct InputContext {
    /// Number of replicas pulling input
    num_replicas: usize,

    /// Index of the replica this context belongs to
    replica_index: usize,
}

impl InputContext {
    /// Create a context for one replica out of `num_replicas`
    pub fn new(num_replicas: usize, replica_index: usize) -> Result<Self> {
        if num_replicas == 0 || replica_index >= num_replicas {
            return Err(Error::InvalidArgument(format!(
                "replica {} of {} is not a valid input context",
                replica_index, num_replicas
            )));
        }
        Ok(Self {
            num_replicas,
            replica_index,
        })
    }

    /// Number of replicas pulling input
    pub fn num_replicas(&self) -> usize {
        self.num_replicas
    }

    /// Index of this replica
    pub fn replica_index(&self) -> usize {
        self.replica_index
    }

    /// Split a global batch size evenly across replicas
    pub fn per_replica_batch_size(&self, global_batch_size: usize) -> Result<usize> {
        if global_batch_size % self.num_replicas != 0 {
            return Err(Error::InvalidArgument(format!(
                "global batch size {} is not divisible by {} replicas",
                global_batch_size, self.num_replicas
            )));
        }
        Ok(global_batch_size / self.num_replicas)
    }
}

impl Default for InputContext {
    fn default() -> Self {
        Self {
            num_replicas: 1,
            replica_index: 0,
        }
    }
}

/// A source of scalar (single flattened value, unbatched) graph batches
pub trait GraphBatchSource: Send {
    /// Retrieve the next batch from this source.
    /// Returns None when exhausted.
    fn next_batch(&mut self) -> Result<Option<GraphBatch>>;
}

/// One training item: a merged graph batch and an optional label column
pub type TrainingItem = (GraphBatch, Option<FeatureColumn>);

/// A source of batched, preprocessed training items
pub trait TrainingSource: Send {
    /// Retrieve the next training item from this source.
    /// Returns None when exhausted.
    fn next_item(&mut self) -> Result<Option<TrainingItem>>;
}

/// Provides a dataset of scalar graph batches per replica
pub trait DatasetProvider: Send + Sync {
    /// Get a source of scalar graph batches for the given replica context
    fn get_dataset(&self, context: &InputContext) -> Result<Box<dyn GraphBatchSource>>;
}

/// Provides a dataset of training items per replica
pub trait TrainingProvider: Send + Sync {
    /// Get a source of training items for the given replica context
    fn get_dataset(&self, context: &InputContext) -> Result<Box<dyn TrainingSource>>;
}

/// An in-memory source backed by a queue of batches
pub struct VecSource {
    batches: VecDeque<GraphBatch>,
}

impl VecSource {
    /// Create a source that yields the given batches in order
    pub fn new(batches: Vec<GraphBatch>) -> Self {
        Self {
            batches: batches.into(),
        }
    }
}

impl GraphBatchSource for VecSource {
    fn next_batch(&mut self) -> Result<Option<GraphBatch>> {
        Ok(self.batches.pop_front())
    }
}

/// Wraps a `DatasetProvider` with per-replica batching and preprocessing
pub struct WrappedDatasetProvider {
    delegate: Arc<dyn DatasetProvider>,
    preprocess: Arc<PreprocessModel>,
    drop_remainder: bool,
    global_batch_size: usize,
}

impl WrappedDatasetProvider {
    /// Wrap `delegate`, merging `global_batch_size / num_replicas` scalar
    /// batches into one flattened value and applying `preprocess` to it
    pub fn new(
        delegate: Arc<dyn DatasetProvider>,
        preprocess: Arc<PreprocessModel>,
        drop_remainder: bool,
        global_batch_size: usize,
    ) -> Self {
        Self {
            delegate,
            preprocess,
            drop_remainder,
            global_batch_size,
        }
    }
}

impl TrainingProvider for WrappedDatasetProvider {
    fn get_dataset(&self, context: &InputContext) -> Result<Box<dyn TrainingSource>> {
        let inner = self.delegate.get_dataset(context)?;
        let batch_size = context.per_replica_batch_size(self.global_batch_size)?;
        Ok(Box::new(BatchedSource {
            inner,
            batch_size,
            drop_remainder: self.drop_remainder,
            preprocess: self.preprocess.clone(),
        }))
    }
}

struct BatchedSource {
    inner: Box<dyn GraphBatchSource>,
    batch_size: usize,
    drop_remainder: bool,
    preprocess: Arc<PreprocessModel>,
}

impl TrainingSource for BatchedSource {
    fn next_item(&mut self) -> Result<Option<TrainingItem>> {
        let mut scalars = Vec::with_capacity(self.batch_size);
        while scalars.len() < self.batch_size {
            match self.inner.next_batch()? {
                Some(batch) => scalars.push(batch),
                None => break,
            }
        }
        if scalars.is_empty() || (scalars.len() < self.batch_size && self.drop_remainder) {
            return Ok(None);
        }

        let merged = GraphBatch::merge(scalars)?;
        self.preprocess.apply(merged).map(Some)
    }
}
