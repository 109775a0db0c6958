//! The runner entry point: wires providers, preprocessing, task, and trainer

use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;

use graph_batch_core::{Error, GraphSchema, Result};

use crate::preprocess::{GraphProcessor, PreprocessModel};
use crate::provider::{DatasetProvider, TrainingProvider, WrappedDatasetProvider};
use crate::task::{Model, Task};
use crate::trainer::Trainer;

/// Options for a training run
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Global batch size across all replicas, for training and validation
    pub global_batch_size: usize,

    /// The epochs to train
    pub epochs: usize,

    /// Whether to drop a trailing partial batch
    pub drop_remainder: bool,

    /// Directories for exports; defaults to `<model_dir>/export`
    pub export_dirs: Option<Vec<PathBuf>>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            global_batch_size: 1,
            epochs: 1,
            drop_remainder: true,
            export_dirs: None,
        }
    }
}

/// Runs training (and validation) of a model on a task with the given data.
///
/// Composes `feature_processors` with the task's own preprocessors, wraps
/// both dataset providers with per-replica batching and that preprocessing,
/// trains through the `Trainer`, and exports the trained model together with
/// a JSON manifest of its input schema.
#[allow(clippy::too_many_arguments)]
pub fn run(
    train_ds_provider: Arc<dyn DatasetProvider>,
    model_fn: &(dyn Fn(&GraphSchema) -> Result<Box<dyn Model>> + Send + Sync),
    trainer: &dyn Trainer,
    task: &dyn Task,
    schema: &GraphSchema,
    feature_processors: Vec<Box<dyn GraphProcessor>>,
    valid_ds_provider: Option<Arc<dyn DatasetProvider>>,
    options: RunOptions,
) -> Result<Box<dyn Model>> {
    let mut processors = feature_processors;
    processors.extend(task.preprocessors());
    let preprocess = Arc::new(PreprocessModel::new(processors));

    let train_provider = WrappedDatasetProvider::new(
        train_ds_provider,
        preprocess.clone(),
        options.drop_remainder,
        options.global_batch_size,
    );
    let valid_provider = valid_ds_provider.map(|provider| {
        WrappedDatasetProvider::new(
            provider,
            preprocess.clone(),
            options.drop_remainder,
            options.global_batch_size,
        )
    });

    let adapted_model_fn = || -> Result<Box<dyn Model>> { task.adapt(model_fn(schema)?) };

    info!(
        epochs = options.epochs,
        global_batch_size = options.global_batch_size,
        "starting training run"
    );
    let model = trainer.train(
        &adapted_model_fn,
        &train_provider,
        options.epochs,
        valid_provider
            .as_ref()
            .map(|provider| provider as &dyn TrainingProvider),
    )?;

    let export_dirs = options
        .export_dirs
        .unwrap_or_else(|| vec![trainer.model_dir().join("export")]);
    for dir in &export_dirs {
        std::fs::create_dir_all(dir)?;
        model.save(dir)?;
        let manifest = serde_json::to_vec_pretty(schema)
            .map_err(|e| Error::InvalidOperation(format!("schema manifest: {}", e)))?;
        std::fs::write(dir.join("input-schema.json"), manifest)?;
        info!(export_dir = %dir.display(), "exported trained model");
    }

    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use graph_batch_core::{Context, FeatureColumn, GraphBatch};

    use crate::preprocess::ProcessorOutput;
    use crate::provider::{GraphBatchSource, InputContext, VecSource};
    use crate::task::{LossFn, MetricFn};
    use crate::trainer::ModelFn;

    fn scalar_batch(label: i64) -> GraphBatch {
        let context = Context::new(
            1,
            BTreeMap::from([(
                "label".to_string(),
                FeatureColumn::from_i64("label", vec![label]),
            )]),
        )
        .unwrap();
        GraphBatch::new(context, BTreeMap::new(), BTreeMap::new()).unwrap()
    }

    fn test_schema() -> GraphSchema {
        GraphSchema::new(
            vec![graph_batch_core::FeatureSpec::new(
                "label",
                graph_batch_core::DataType::Int64,
                vec![],
            )],
            BTreeMap::new(),
            BTreeMap::new(),
        )
        .unwrap()
    }

    struct FixedProvider;

    impl DatasetProvider for FixedProvider {
        fn get_dataset(&self, _context: &InputContext) -> Result<Box<dyn GraphBatchSource>> {
            Ok(Box::new(VecSource::new(
                (0..4).map(scalar_batch).collect(),
            )))
        }
    }

    struct ConstantModel;

    impl Model for ConstantModel {
        fn apply(&self, batch: &GraphBatch) -> Result<FeatureColumn> {
            Ok(FeatureColumn::from_f32(
                "prediction",
                vec![0.0; batch.num_components()],
            ))
        }

        fn save(&self, dir: &Path) -> Result<()> {
            std::fs::write(dir.join("saved-model.bin"), b"constant")?;
            Ok(())
        }
    }

    struct LabelTask;

    impl Task for LabelTask {
        fn adapt(&self, model: Box<dyn Model>) -> Result<Box<dyn Model>> {
            Ok(model)
        }

        fn preprocessors(&self) -> Vec<Box<dyn GraphProcessor>> {
            vec![Box::new(|batch: GraphBatch| {
                let label = batch.context().feature("label")?.clone();
                Ok(ProcessorOutput::WithLabel(batch, label))
            })]
        }

        fn losses(&self) -> Vec<LossFn> {
            vec![]
        }

        fn metrics(&self) -> Vec<MetricFn> {
            vec![]
        }
    }

    struct CountingTrainer {
        dir: PathBuf,
        items_seen: AtomicUsize,
    }

    impl Trainer for CountingTrainer {
        fn model_dir(&self) -> &Path {
            &self.dir
        }

        fn train(
            &self,
            model_fn: ModelFn<'_>,
            train_provider: &dyn TrainingProvider,
            epochs: usize,
            valid_provider: Option<&dyn TrainingProvider>,
        ) -> Result<Box<dyn Model>> {
            assert!(valid_provider.is_none());
            for _ in 0..epochs {
                let mut source = train_provider.get_dataset(&InputContext::default())?;
                while let Some((batch, label)) = source.next_item()? {
                    assert_eq!(batch.num_components(), 2);
                    assert!(label.is_some());
                    self.items_seen.fetch_add(1, Ordering::Relaxed);
                }
            }
            model_fn()
        }
    }

    #[test]
    fn test_run_trains_and_exports() {
        let tmp = tempfile::tempdir().unwrap();
        let trainer = CountingTrainer {
            dir: tmp.path().to_path_buf(),
            items_seen: AtomicUsize::new(0),
        };

        let model = run(
            Arc::new(FixedProvider),
            &|_schema| Ok(Box::new(ConstantModel) as Box<dyn Model>),
            &trainer,
            &LabelTask,
            &test_schema(),
            vec![],
            None,
            RunOptions {
                global_batch_size: 2,
                epochs: 3,
                ..Default::default()
            },
        )
        .unwrap();

        // 4 scalar batches per epoch, merged two at a time, over 3 epochs.
        assert_eq!(trainer.items_seen.load(Ordering::Relaxed), 6);

        let export = tmp.path().join("export");
        assert!(export.join("saved-model.bin").exists());
        assert!(export.join("input-schema.json").exists());

        let prediction = model.apply(&scalar_batch(1)).unwrap();
        assert_eq!(prediction.num_rows(), 1);
    }
}
