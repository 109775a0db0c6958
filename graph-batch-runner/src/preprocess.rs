//! Composition of graph processors into a preprocessing stage

use graph_batch_core::{Error, FeatureColumn, GraphBatch, Result};
use graph_batch_transforms::PadToTotalSizes;

use crate::provider::TrainingItem;

/// Output of one graph processor
pub enum ProcessorOutput {
    /// A processed graph batch
    Graph(GraphBatch),

    /// A processed graph batch plus a label column extracted from it
    WithLabel(GraphBatch, FeatureColumn),
}

/// A per-batch processing step applied before training
pub trait GraphProcessor: Send + Sync {
    /// Process one flattened graph batch
    fn process(&self, batch: GraphBatch) -> Result<ProcessorOutput>;
}

impl<F> GraphProcessor for F
where
    F: Fn(GraphBatch) -> Result<ProcessorOutput> + Send + Sync,
{
    fn process(&self, batch: GraphBatch) -> Result<ProcessorOutput> {
        self(batch)
    }
}

/// Padding drops into a preprocessing chain directly; the component mask
/// comes out as the label column (0/1 per component) for loss weighting.
impl GraphProcessor for PadToTotalSizes {
    fn process(&self, batch: GraphBatch) -> Result<ProcessorOutput> {
        let (padded, mask) = self.pad(&batch)?;
        let mask_column = FeatureColumn::from_i64(
            "component_mask",
            mask.iter().map(|&m| i64::from(m)).collect(),
        );
        Ok(ProcessorOutput::WithLabel(padded, mask_column))
    }
}

/// A fixed sequence of processors folded over each batch in order.
///
/// At most one processor may emit a label; a second label is an error.
pub struct PreprocessModel {
    processors: Vec<Box<dyn GraphProcessor>>,
}

impl PreprocessModel {
    /// Create a preprocessing stage from processors applied in order
    pub fn new(processors: Vec<Box<dyn GraphProcessor>>) -> Self {
        Self { processors }
    }

    /// Apply all processors to one batch
    pub fn apply(&self, batch: GraphBatch) -> Result<TrainingItem> {
        let mut current = batch;
        let mut label: Option<FeatureColumn> = None;

        for processor in &self.processors {
            match processor.process(current)? {
                ProcessorOutput::Graph(graph) => current = graph,
                ProcessorOutput::WithLabel(graph, new_label) => {
                    if let Some(existing) = &label {
                        return Err(Error::InvalidArgument(format!(
                            "received more than one label: '{}' and '{}'",
                            existing.name(),
                            new_label.name()
                        )));
                    }
                    current = graph;
                    label = Some(new_label);
                }
            }
        }

        Ok((current, label))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use graph_batch_core::Context;
    use graph_batch_transforms::{SizeConstraints, SizeValue};

    fn context_batch(labels: Vec<i64>) -> GraphBatch {
        let context = Context::new(
            labels.len(),
            BTreeMap::from([(
                "label".to_string(),
                FeatureColumn::from_i64("label", labels),
            )]),
        )
        .unwrap();
        GraphBatch::new(context, BTreeMap::new(), BTreeMap::new()).unwrap()
    }

    fn label_extractor(batch: GraphBatch) -> Result<ProcessorOutput> {
        let label = batch.context().feature("label")?.clone();
        Ok(ProcessorOutput::WithLabel(batch, label))
    }

    #[test]
    fn test_processors_fold_in_order() {
        let model = PreprocessModel::new(vec![Box::new(label_extractor)]);
        let (batch, label) = model.apply(context_batch(vec![5, 6])).unwrap();
        assert_eq!(batch.num_components(), 2);
        assert_eq!(label.unwrap().as_i64().unwrap(), &[5, 6]);
    }

    #[test]
    fn test_second_label_rejected() {
        let model = PreprocessModel::new(vec![
            Box::new(label_extractor),
            Box::new(label_extractor),
        ]);
        let result = model.apply(context_batch(vec![5]));
        assert!(matches!(result, Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_padding_as_processor_emits_mask_label() {
        let constraints = SizeConstraints {
            total_num_components: SizeValue::Int(3),
            total_num_nodes: BTreeMap::new(),
            total_num_edges: BTreeMap::new(),
        };
        let model = PreprocessModel::new(vec![Box::new(PadToTotalSizes::new(constraints))]);

        let (padded, label) = model.apply(context_batch(vec![9])).unwrap();
        assert_eq!(padded.num_components(), 3);
        assert_eq!(label.unwrap().as_i64().unwrap(), &[1, 0, 0]);
    }
}
