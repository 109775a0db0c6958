//! Padding of graph batches up to declared total sizes
//!
//! `PadToTotalSizes` grows every piece of a batch to a fixed ceiling so the
//! result can flow through shape-compiled computation. Real content keeps its
//! position; synthetic components, nodes, and edges are appended after it
//! with zero-valued features. A boolean component mask separates the two.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use graph_batch_core::{
    Context, EdgeSet, Error, GraphBatch, GraphSchema, NodeSet, Result,
};

use crate::constraints::SizeConstraints;
use crate::transform::GraphBatchTransform;

/// Pads a graph batch up to the totals declared in its [`SizeConstraints`].
///
/// Synthetic edges need a valid endpoint: they point at the first padding
/// node of their incident node set when that set gained padding rows, and
/// at node 0 otherwise. Padding never rewrites real adjacency entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PadToTotalSizes {
    constraints: SizeConstraints,
}

impl PadToTotalSizes {
    /// Create a padder for the given size constraints
    pub fn new(constraints: SizeConstraints) -> Self {
        Self { constraints }
    }

    /// The constraints this padder enforces
    pub fn constraints(&self) -> &SizeConstraints {
        &self.constraints
    }

    /// Pad `batch` to the declared totals.
    ///
    /// Returns the padded batch and a component mask of length
    /// `total_num_components` whose `true` prefix marks the original
    /// components. Fails with `SchemaMismatch` when constraint names and the
    /// batch's sets disagree, and with `CapacityExceeded` when real content
    /// does not fit a ceiling; data is never truncated.
    pub fn pad(&self, batch: &GraphBatch) -> Result<(GraphBatch, Vec<bool>)> {
        let target_components = self.constraints.total_num_components.to_int()?;
        let num_components = batch.num_components() as i64;
        if num_components > target_components {
            return Err(Error::CapacityExceeded {
                piece: "components".to_string(),
                actual: num_components,
                ceiling: target_components,
            });
        }
        let components_to_pad = (target_components - num_components) as usize;

        self.check_names(batch)?;

        // Context columns gain one zero row per padding component.
        let mut context_features = batch.context().features().clone();
        for column in context_features.values_mut() {
            column.append_zero_rows(components_to_pad);
        }
        let context = Context::new(target_components as usize, context_features)?;

        // Node sets first: edge padding needs to know where padding nodes start.
        let mut padded_node_sets = BTreeMap::new();
        let mut node_deficits = BTreeMap::new();
        let mut node_totals = BTreeMap::new();

        for (name, set) in batch.node_sets() {
            let ceiling = self.constraints.total_num_nodes[name].to_int()?;
            let actual = set.total_size();
            if actual > ceiling {
                return Err(Error::CapacityExceeded {
                    piece: format!("node set '{}'", name),
                    actual,
                    ceiling,
                });
            }
            let deficit = ceiling - actual;
            if deficit > 0 && components_to_pad == 0 {
                return Err(Error::InvalidArgument(format!(
                    "node set '{}' needs {} padding nodes but no padding component absorbs them",
                    name, deficit
                )));
            }

            let sizes = pad_sizes(set.sizes(), deficit, components_to_pad);
            let mut features = set.features().clone();
            for column in features.values_mut() {
                column.append_zero_rows(deficit as usize);
            }

            node_deficits.insert(name.clone(), deficit);
            node_totals.insert(name.clone(), (actual, ceiling));
            padded_node_sets.insert(name.clone(), NodeSet::new(sizes, features)?);
        }

        let mut padded_edge_sets = BTreeMap::new();
        for (name, set) in batch.edge_sets() {
            let ceiling = self.constraints.total_num_edges[name].to_int()?;
            let actual = set.total_size();
            if actual > ceiling {
                return Err(Error::CapacityExceeded {
                    piece: format!("edge set '{}'", name),
                    actual,
                    ceiling,
                });
            }
            let deficit = ceiling - actual;
            if deficit > 0 && components_to_pad == 0 {
                return Err(Error::InvalidArgument(format!(
                    "edge set '{}' needs {} padding edges but no padding component absorbs them",
                    name, deficit
                )));
            }

            let sizes = pad_sizes(set.sizes(), deficit, components_to_pad);
            let mut features = set.features().clone();
            for column in features.values_mut() {
                column.append_zero_rows(deficit as usize);
            }

            let adjacency = set.adjacency();
            let mut endpoints = Vec::with_capacity(2);
            for endpoint_set in [adjacency.source_set(), adjacency.target_set()] {
                endpoints.push(synthetic_endpoint(
                    name,
                    endpoint_set,
                    deficit,
                    &node_deficits,
                    &node_totals,
                )?);
            }

            let mut source_indices = adjacency.source_indices().to_vec();
            let mut target_indices = adjacency.target_indices().to_vec();
            source_indices.extend(std::iter::repeat(endpoints[0]).take(deficit as usize));
            target_indices.extend(std::iter::repeat(endpoints[1]).take(deficit as usize));
            let adjacency = graph_batch_core::Adjacency::from_indices(
                (adjacency.source_set(), source_indices),
                (adjacency.target_set(), target_indices),
            )?;

            padded_edge_sets.insert(name.clone(), EdgeSet::new(sizes, adjacency, features)?);
        }

        debug!(
            components = num_components,
            padded_components = target_components,
            "padded graph batch to total sizes"
        );

        let padded = GraphBatch::new(context, padded_node_sets, padded_edge_sets)?;
        let mut mask = vec![true; num_components as usize];
        mask.resize(target_components as usize, false);
        Ok((padded, mask))
    }

    /// Constraint names and batch sets must agree in both directions: the
    /// padded output has to declare a total for every piece it contains.
    fn check_names(&self, batch: &GraphBatch) -> Result<()> {
        for name in self.constraints.total_num_nodes.keys() {
            batch.node_set(name)?;
        }
        for name in self.constraints.total_num_edges.keys() {
            batch.edge_set(name)?;
        }
        for name in batch.node_sets().keys() {
            if !self.constraints.total_num_nodes.contains_key(name) {
                return Err(Error::SchemaMismatch(format!(
                    "no node ceiling declared for node set '{}'",
                    name
                )));
            }
        }
        for name in batch.edge_sets().keys() {
            if !self.constraints.total_num_edges.contains_key(name) {
                return Err(Error::SchemaMismatch(format!(
                    "no edge ceiling declared for edge set '{}'",
                    name
                )));
            }
        }
        Ok(())
    }

    /// Serialize this padder to a binary format
    pub fn serialize(&self) -> Result<Vec<u8>> {
        bincode::serialize(self).map_err(Error::Serialization)
    }

    /// Deserialize a padder from a binary format
    pub fn deserialize(data: &[u8]) -> Result<Self> {
        bincode::deserialize(data).map_err(Error::Serialization)
    }
}

/// Extend `sizes` so the first padding component absorbs the whole deficit
/// and the remaining padding components are empty.
fn pad_sizes(sizes: &[i64], deficit: i64, components_to_pad: usize) -> Vec<i64> {
    let mut padded = sizes.to_vec();
    for i in 0..components_to_pad {
        padded.push(if i == 0 { deficit } else { 0 });
    }
    padded
}

/// Pick the node index synthetic edges point at: the first padding node of
/// the incident node set if it gained any, node 0 otherwise.
fn synthetic_endpoint(
    edge_set: &str,
    node_set: &str,
    edge_deficit: i64,
    node_deficits: &BTreeMap<String, i64>,
    node_totals: &BTreeMap<String, (i64, i64)>,
) -> Result<i64> {
    if edge_deficit == 0 {
        return Ok(0);
    }
    let deficit = node_deficits.get(node_set).ok_or(Error::IndexOutOfBounds)?;
    let (actual, ceiling) = node_totals.get(node_set).ok_or(Error::IndexOutOfBounds)?;
    if *deficit > 0 {
        // First padding node sits right after the real nodes.
        Ok(*actual)
    } else if *ceiling > 0 {
        Ok(0)
    } else {
        Err(Error::InvalidArgument(format!(
            "edge set '{}' needs synthetic edges but node set '{}' is empty",
            edge_set, node_set
        )))
    }
}

impl GraphBatchTransform for PadToTotalSizes {
    fn transform(&self, batch: GraphBatch) -> Result<GraphBatch> {
        let (padded, _mask) = self.pad(&batch)?;
        Ok(padded)
    }

    fn output_schema(&self, input_schema: &GraphSchema) -> Result<GraphSchema> {
        Ok(input_schema.clone())
    }

    fn preserves_components(&self) -> bool {
        false
    }
}
