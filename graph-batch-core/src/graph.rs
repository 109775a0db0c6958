//! Flattened graph batches: context, node sets, edge sets, and adjacency
//!
//! A `GraphBatch` holds one or more graph components merged into a single
//! flattened container. Per-component boundaries are recovered from the
//! `sizes` arrays of each node and edge set.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::feature::FeatureColumn;
use crate::schema::{EdgeSetSpec, FeatureSpec, GraphSchema, NodeSetSpec};

/// Per-component features shared across one graph component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Context {
    /// Number of components in the batch
    num_components: usize,

    /// Features indexed by component
    features: BTreeMap<String, FeatureColumn>,
}

impl Context {
    /// Create a context piece, validating one row per component in every column
    pub fn new(num_components: usize, features: BTreeMap<String, FeatureColumn>) -> Result<Self> {
        for (name, column) in &features {
            if column.num_rows() != num_components {
                return Err(Error::InvalidArgument(format!(
                    "context feature '{}' has {} rows for {} components",
                    name,
                    column.num_rows(),
                    num_components
                )));
            }
        }

        Ok(Self {
            num_components,
            features,
        })
    }

    /// Number of components
    pub fn num_components(&self) -> usize {
        self.num_components
    }

    /// Get all features
    pub fn features(&self) -> &BTreeMap<String, FeatureColumn> {
        &self.features
    }

    /// Get a feature by name
    pub fn feature(&self, name: &str) -> Result<&FeatureColumn> {
        self.features
            .get(name)
            .ok_or_else(|| Error::SchemaMismatch(format!("context feature not found: {}", name)))
    }
}

/// Adjacency: per-edge endpoint indices into named node sets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Adjacency {
    source_set: String,
    source_indices: Vec<i64>,
    target_set: String,
    target_indices: Vec<i64>,
}

impl Adjacency {
    /// Create an adjacency from (node set, indices) pairs for source and target
    pub fn from_indices(source: (&str, Vec<i64>), target: (&str, Vec<i64>)) -> Result<Self> {
        if source.1.len() != target.1.len() {
            return Err(Error::InvalidArgument(format!(
                "adjacency has {} source indices but {} target indices",
                source.1.len(),
                target.1.len()
            )));
        }

        Ok(Self {
            source_set: source.0.to_string(),
            source_indices: source.1,
            target_set: target.0.to_string(),
            target_indices: target.1,
        })
    }

    /// Name of the source node set
    pub fn source_set(&self) -> &str {
        &self.source_set
    }

    /// Per-edge indices into the source node set
    pub fn source_indices(&self) -> &[i64] {
        &self.source_indices
    }

    /// Name of the target node set
    pub fn target_set(&self) -> &str {
        &self.target_set
    }

    /// Per-edge indices into the target node set
    pub fn target_indices(&self) -> &[i64] {
        &self.target_indices
    }

    /// Number of edges covered by this adjacency
    pub fn len(&self) -> usize {
        self.source_indices.len()
    }

    /// Check whether this adjacency covers no edges
    pub fn is_empty(&self) -> bool {
        self.source_indices.is_empty()
    }
}

/// A named homogeneous collection of nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSet {
    /// Node count per component
    sizes: Vec<i64>,

    /// Features indexed by flattened node
    features: BTreeMap<String, FeatureColumn>,
}

impl NodeSet {
    /// Create a node set, validating feature row counts against `sizes`
    pub fn new(sizes: Vec<i64>, features: BTreeMap<String, FeatureColumn>) -> Result<Self> {
        let total = total_size(&sizes)?;
        for (name, column) in &features {
            if column.num_rows() as i64 != total {
                return Err(Error::InvalidArgument(format!(
                    "node feature '{}' has {} rows for {} nodes",
                    name,
                    column.num_rows(),
                    total
                )));
            }
        }

        Ok(Self { sizes, features })
    }

    /// Node count per component
    pub fn sizes(&self) -> &[i64] {
        &self.sizes
    }

    /// Total node count across all components
    pub fn total_size(&self) -> i64 {
        self.sizes.iter().sum()
    }

    /// Get all features
    pub fn features(&self) -> &BTreeMap<String, FeatureColumn> {
        &self.features
    }

    /// Get a feature by name
    pub fn feature(&self, name: &str) -> Result<&FeatureColumn> {
        self.features
            .get(name)
            .ok_or_else(|| Error::SchemaMismatch(format!("node feature not found: {}", name)))
    }
}

/// A named homogeneous collection of edges with its adjacency
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeSet {
    /// Edge count per component
    sizes: Vec<i64>,

    /// Endpoint indices for every edge
    adjacency: Adjacency,

    /// Features indexed by flattened edge
    features: BTreeMap<String, FeatureColumn>,
}

impl EdgeSet {
    /// Create an edge set, validating feature rows and adjacency length against `sizes`
    pub fn new(
        sizes: Vec<i64>,
        adjacency: Adjacency,
        features: BTreeMap<String, FeatureColumn>,
    ) -> Result<Self> {
        let total = total_size(&sizes)?;
        if adjacency.len() as i64 != total {
            return Err(Error::InvalidArgument(format!(
                "adjacency covers {} edges but sizes sum to {}",
                adjacency.len(),
                total
            )));
        }
        for (name, column) in &features {
            if column.num_rows() as i64 != total {
                return Err(Error::InvalidArgument(format!(
                    "edge feature '{}' has {} rows for {} edges",
                    name,
                    column.num_rows(),
                    total
                )));
            }
        }

        Ok(Self {
            sizes,
            adjacency,
            features,
        })
    }

    /// Edge count per component
    pub fn sizes(&self) -> &[i64] {
        &self.sizes
    }

    /// Total edge count across all components
    pub fn total_size(&self) -> i64 {
        self.sizes.iter().sum()
    }

    /// The adjacency of this edge set
    pub fn adjacency(&self) -> &Adjacency {
        &self.adjacency
    }

    /// Get all features
    pub fn features(&self) -> &BTreeMap<String, FeatureColumn> {
        &self.features
    }

    /// Get a feature by name
    pub fn feature(&self, name: &str) -> Result<&FeatureColumn> {
        self.features
            .get(name)
            .ok_or_else(|| Error::SchemaMismatch(format!("edge feature not found: {}", name)))
    }
}

fn total_size(sizes: &[i64]) -> Result<i64> {
    if sizes.iter().any(|&s| s < 0) {
        return Err(Error::InvalidArgument("negative entry in sizes".into()));
    }
    Ok(sizes.iter().sum())
}

/// A batch of graph components flattened into one container
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphBatch {
    context: Context,
    node_sets: BTreeMap<String, NodeSet>,
    edge_sets: BTreeMap<String, EdgeSet>,
}

impl GraphBatch {
    /// Create a graph batch, enforcing the structural invariants:
    /// one `sizes` entry per component in every set, and adjacency endpoints
    /// that name existing node sets with all indices in range.
    pub fn new(
        context: Context,
        node_sets: BTreeMap<String, NodeSet>,
        edge_sets: BTreeMap<String, EdgeSet>,
    ) -> Result<Self> {
        let num_components = context.num_components();
        if num_components == 0 {
            return Err(Error::InvalidArgument(
                "a graph batch must hold at least one component".into(),
            ));
        }

        for (name, set) in &node_sets {
            if set.sizes().len() != num_components {
                return Err(Error::InvalidArgument(format!(
                    "node set '{}' has {} size entries for {} components",
                    name,
                    set.sizes().len(),
                    num_components
                )));
            }
        }

        for (name, set) in &edge_sets {
            if set.sizes().len() != num_components {
                return Err(Error::InvalidArgument(format!(
                    "edge set '{}' has {} size entries for {} components",
                    name,
                    set.sizes().len(),
                    num_components
                )));
            }

            let adjacency = set.adjacency();
            for (endpoint, indices) in [
                (adjacency.source_set(), adjacency.source_indices()),
                (adjacency.target_set(), adjacency.target_indices()),
            ] {
                let nodes = node_sets.get(endpoint).ok_or_else(|| {
                    Error::SchemaMismatch(format!(
                        "edge set '{}' references unknown node set '{}'",
                        name, endpoint
                    ))
                })?;
                let node_total = nodes.total_size();
                if indices.iter().any(|&i| i < 0 || i >= node_total) {
                    return Err(Error::IndexOutOfBounds);
                }
            }
        }

        Ok(Self {
            context,
            node_sets,
            edge_sets,
        })
    }

    /// Number of components in this batch
    pub fn num_components(&self) -> usize {
        self.context.num_components()
    }

    /// The context piece
    pub fn context(&self) -> &Context {
        &self.context
    }

    /// All node sets
    pub fn node_sets(&self) -> &BTreeMap<String, NodeSet> {
        &self.node_sets
    }

    /// All edge sets
    pub fn edge_sets(&self) -> &BTreeMap<String, EdgeSet> {
        &self.edge_sets
    }

    /// Get a node set by name
    pub fn node_set(&self, name: &str) -> Result<&NodeSet> {
        self.node_sets
            .get(name)
            .ok_or_else(|| Error::SchemaMismatch(format!("node set not found: {}", name)))
    }

    /// Get an edge set by name
    pub fn edge_set(&self, name: &str) -> Result<&EdgeSet> {
        self.edge_sets
            .get(name)
            .ok_or_else(|| Error::SchemaMismatch(format!("edge set not found: {}", name)))
    }

    /// Total node count of a named node set
    pub fn total_num_nodes(&self, name: &str) -> Result<i64> {
        Ok(self.node_set(name)?.total_size())
    }

    /// Total edge count of a named edge set
    pub fn total_num_edges(&self, name: &str) -> Result<i64> {
        Ok(self.edge_set(name)?.total_size())
    }

    /// Derive the structural schema of this batch
    pub fn schema(&self) -> Result<GraphSchema> {
        let context = self
            .context
            .features()
            .values()
            .map(feature_spec_of)
            .collect();

        let node_sets = self
            .node_sets
            .iter()
            .map(|(name, set)| {
                let features = set.features().values().map(feature_spec_of).collect();
                (name.clone(), NodeSetSpec { features })
            })
            .collect();

        let edge_sets = self
            .edge_sets
            .iter()
            .map(|(name, set)| {
                let features = set.features().values().map(feature_spec_of).collect();
                (
                    name.clone(),
                    EdgeSetSpec {
                        features,
                        source: set.adjacency().source_set().to_string(),
                        target: set.adjacency().target_set().to_string(),
                    },
                )
            })
            .collect();

        GraphSchema::new(context, node_sets, edge_sets)
    }

    /// Merge several batches into one flattened container.
    ///
    /// Component-indexed columns and `sizes` arrays are concatenated in
    /// order; adjacency indices of later batches are offset by the node
    /// totals accumulated before them.
    pub fn merge(batches: Vec<GraphBatch>) -> Result<GraphBatch> {
        let mut iter = batches.into_iter();
        let first = iter.next().ok_or_else(|| {
            Error::InvalidArgument("cannot merge an empty list of batches".into())
        })?;

        let mut num_components = first.context.num_components;
        let mut context_features = first.context.features;
        let mut node_sets = first.node_sets;
        let mut edge_sets = first.edge_sets;

        for batch in iter {
            // Offsets come from the node totals accumulated so far.
            let node_offsets: BTreeMap<String, i64> = node_sets
                .iter()
                .map(|(name, set)| (name.clone(), set.total_size()))
                .collect();

            num_components += batch.context.num_components;

            for (name, column) in &batch.context.features {
                let existing = context_features.get_mut(name).ok_or_else(|| {
                    Error::SchemaMismatch(format!("context feature not found: {}", name))
                })?;
                existing.extend_from(column)?;
            }

            for (name, set) in batch.node_sets {
                let existing = node_sets.get_mut(&name).ok_or_else(|| {
                    Error::SchemaMismatch(format!("node set not found: {}", name))
                })?;
                existing.sizes.extend_from_slice(&set.sizes);
                for (feature_name, column) in &set.features {
                    let target = existing.features.get_mut(feature_name).ok_or_else(|| {
                        Error::SchemaMismatch(format!(
                            "node feature not found: {}/{}",
                            name, feature_name
                        ))
                    })?;
                    target.extend_from(column)?;
                }
            }

            for (name, set) in batch.edge_sets {
                let existing = edge_sets.get_mut(&name).ok_or_else(|| {
                    Error::SchemaMismatch(format!("edge set not found: {}", name))
                })?;
                if existing.adjacency.source_set != set.adjacency.source_set
                    || existing.adjacency.target_set != set.adjacency.target_set
                {
                    return Err(Error::SchemaMismatch(format!(
                        "edge set '{}' has diverging adjacency endpoints",
                        name
                    )));
                }

                let source_offset = *node_offsets
                    .get(&set.adjacency.source_set)
                    .ok_or(Error::IndexOutOfBounds)?;
                let target_offset = *node_offsets
                    .get(&set.adjacency.target_set)
                    .ok_or(Error::IndexOutOfBounds)?;

                existing.sizes.extend_from_slice(&set.sizes);
                existing
                    .adjacency
                    .source_indices
                    .extend(set.adjacency.source_indices.iter().map(|i| i + source_offset));
                existing
                    .adjacency
                    .target_indices
                    .extend(set.adjacency.target_indices.iter().map(|i| i + target_offset));
                for (feature_name, column) in &set.features {
                    let target = existing.features.get_mut(feature_name).ok_or_else(|| {
                        Error::SchemaMismatch(format!(
                            "edge feature not found: {}/{}",
                            name, feature_name
                        ))
                    })?;
                    target.extend_from(column)?;
                }
            }
        }

        debug!(num_components, "merged batches into one flattened container");
        let context = Context::new(num_components, context_features)?;
        GraphBatch::new(context, node_sets, edge_sets)
    }

    /// Serialize this batch to a binary format
    pub fn serialize(&self) -> Result<Vec<u8>> {
        bincode::serialize(self).map_err(Error::Serialization)
    }

    /// Deserialize a batch from a binary format
    pub fn deserialize(data: &[u8]) -> Result<Self> {
        bincode::deserialize(data).map_err(Error::Serialization)
    }
}

fn feature_spec_of(column: &FeatureColumn) -> FeatureSpec {
    let shape = if column.row_width() == 1 {
        vec![]
    } else {
        vec![column.row_width()]
    };
    FeatureSpec::new(column.name(), column.data_type(), shape)
}

impl fmt::Display for GraphBatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "GraphBatch: {} components, {} node sets, {} edge sets",
            self.num_components(),
            self.node_sets.len(),
            self.edge_sets.len()
        )?;
        for (name, set) in &self.node_sets {
            writeln!(f, "  nodes/{}: sizes={:?}", name, set.sizes())?;
        }
        for (name, set) in &self.edge_sets {
            writeln!(
                f,
                "  edges/{}: sizes={:?} ({} -> {})",
                name,
                set.sizes(),
                set.adjacency().source_set(),
                set.adjacency().target_set()
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::FeatureValues;

    fn single_component_batch() -> GraphBatch {
        let context = Context::new(
            1,
            BTreeMap::from([("label".to_string(), FeatureColumn::from_i64("label", vec![42]))]),
        )
        .unwrap();

        let nodes = NodeSet::new(
            vec![1],
            BTreeMap::from([(
                "feature".to_string(),
                FeatureColumn::new("feature", 2, FeatureValues::Float32(vec![1.0, 2.0])).unwrap(),
            )]),
        )
        .unwrap();

        let edges = EdgeSet::new(
            vec![1],
            Adjacency::from_indices(("nodes", vec![0]), ("nodes", vec![0])).unwrap(),
            BTreeMap::from([(
                "weight".to_string(),
                FeatureColumn::from_f32("weight", vec![1.0]),
            )]),
        )
        .unwrap();

        GraphBatch::new(
            context,
            BTreeMap::from([("nodes".to_string(), nodes)]),
            BTreeMap::from([("edges".to_string(), edges)]),
        )
        .unwrap()
    }

    #[test]
    fn test_size_invariants() {
        let batch = single_component_batch();
        assert_eq!(batch.num_components(), 1);
        assert_eq!(batch.total_num_nodes("nodes").unwrap(), 1);
        assert_eq!(batch.total_num_edges("edges").unwrap(), 1);
    }

    #[test]
    fn test_feature_rows_must_match_sizes() {
        let result = NodeSet::new(
            vec![2],
            BTreeMap::from([(
                "feature".to_string(),
                FeatureColumn::from_f32("feature", vec![1.0]),
            )]),
        );
        assert!(matches!(result, Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_adjacency_out_of_range_rejected() {
        let context = Context::new(1, BTreeMap::new()).unwrap();
        let nodes = NodeSet::new(vec![1], BTreeMap::new()).unwrap();
        let edges = EdgeSet::new(
            vec![1],
            Adjacency::from_indices(("nodes", vec![5]), ("nodes", vec![0])).unwrap(),
            BTreeMap::new(),
        )
        .unwrap();
        let result = GraphBatch::new(
            context,
            BTreeMap::from([("nodes".to_string(), nodes)]),
            BTreeMap::from([("edges".to_string(), edges)]),
        );
        assert!(matches!(result, Err(Error::IndexOutOfBounds)));
    }

    #[test]
    fn test_merge_offsets_adjacency() {
        let a = single_component_batch();
        let b = single_component_batch();
        let merged = GraphBatch::merge(vec![a, b]).unwrap();

        assert_eq!(merged.num_components(), 2);
        let nodes = merged.node_set("nodes").unwrap();
        assert_eq!(nodes.sizes(), &[1, 1]);
        let edges = merged.edge_set("edges").unwrap();
        assert_eq!(edges.sizes(), &[1, 1]);
        // Second component's self-loop now points at the second node.
        assert_eq!(edges.adjacency().source_indices(), &[0, 1]);
        assert_eq!(edges.adjacency().target_indices(), &[0, 1]);
        assert_eq!(
            merged.context().feature("label").unwrap().as_i64().unwrap(),
            &[42, 42]
        );
    }

    #[test]
    fn test_serialize_round_trip() {
        let batch = single_component_batch();
        let bytes = batch.serialize().unwrap();
        let restored = GraphBatch::deserialize(&bytes).unwrap();
        assert_eq!(batch, restored);
    }
}
