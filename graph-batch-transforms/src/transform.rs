//! Transform trait for graph-batch processing

use graph_batch_core::{GraphBatch, GraphSchema, Result};

/// A transformation that processes graph batches
pub trait GraphBatchTransform: Send + Sync {
    /// Transform a graph batch
    fn transform(&self, batch: GraphBatch) -> Result<GraphBatch>;

    /// Get the output schema for this transform when applied to the given input schema
    fn output_schema(&self, input_schema: &GraphSchema) -> Result<GraphSchema> {
        Ok(input_schema.clone())
    }

    /// Whether this transform keeps the component count unchanged
    fn preserves_components(&self) -> bool {
        true
    }
}

/// A chain of transforms that can be executed as a single transform
pub struct TransformChain {
    /// The transforms in this chain
    transforms: Vec<Box<dyn GraphBatchTransform>>,
}

impl TransformChain {
    /// Create a new transform chain
    pub fn new(transforms: Vec<Box<dyn GraphBatchTransform>>) -> Self {
        Self { transforms }
    }

    /// Get a reference to the transforms in this chain
    pub fn transforms(&self) -> &[Box<dyn GraphBatchTransform>] {
        &self.transforms
    }
}

impl GraphBatchTransform for TransformChain {
    fn transform(&self, batch: GraphBatch) -> Result<GraphBatch> {
        let mut current = batch;

        for transform in &self.transforms {
            current = transform.transform(current)?;
        }

        Ok(current)
    }

    fn output_schema(&self, input_schema: &GraphSchema) -> Result<GraphSchema> {
        let mut current = input_schema.clone();

        for transform in &self.transforms {
            current = transform.output_schema(&current)?;
        }

        Ok(current)
    }

    fn preserves_components(&self) -> bool {
        self.transforms.iter().all(|t| t.preserves_components())
    }
}
