//! Schema definition for graph batches

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Element type for feature values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    /// 32-bit signed integer
    Int32,

    /// 64-bit signed integer
    Int64,

    /// 32-bit floating point
    Float32,

    /// 64-bit floating point
    Float64,
}

impl DataType {
    /// Get the size of this type in bytes
    pub fn size_bytes(&self) -> usize {
        match self {
            DataType::Int32 | DataType::Float32 => 4,
            DataType::Int64 | DataType::Float64 => 8,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Int32 => write!(f, "Int32"),
            DataType::Int64 => write!(f, "Int64"),
            DataType::Float32 => write!(f, "Float32"),
            DataType::Float64 => write!(f, "Float64"),
        }
    }
}

/// Declaration of one feature: name, element type, and per-entity inner shape
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSpec {
    /// Name of the feature
    pub name: String,

    /// Element type of the feature values
    pub data_type: DataType,

    /// Inner dimensions of one row; empty means one scalar per entity
    pub shape: Vec<usize>,
}

impl FeatureSpec {
    /// Create a new feature spec
    pub fn new(name: &str, data_type: DataType, shape: Vec<usize>) -> Self {
        Self {
            name: name.to_string(),
            data_type,
            shape,
        }
    }

    /// Number of elements one entity contributes to the flattened values
    pub fn row_width(&self) -> usize {
        self.shape.iter().product()
    }
}

impl fmt::Display for FeatureSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} {:?}", self.name, self.data_type, self.shape)
    }
}

/// Declaration of a node set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSetSpec {
    /// Features carried by every node of the set
    pub features: Vec<FeatureSpec>,
}

/// Declaration of an edge set, including its adjacency endpoints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeSetSpec {
    /// Features carried by every edge of the set
    pub features: Vec<FeatureSpec>,

    /// Node set the edges originate from
    pub source: String,

    /// Node set the edges point into
    pub target: String,
}

/// A schema describing the structure of a graph batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphSchema {
    /// Per-component context features
    context: Vec<FeatureSpec>,

    /// Node sets by name
    node_sets: BTreeMap<String, NodeSetSpec>,

    /// Edge sets by name
    edge_sets: BTreeMap<String, EdgeSetSpec>,
}

impl GraphSchema {
    /// Create a new schema, validating adjacency endpoint declarations
    pub fn new(
        context: Vec<FeatureSpec>,
        node_sets: BTreeMap<String, NodeSetSpec>,
        edge_sets: BTreeMap<String, EdgeSetSpec>,
    ) -> Result<Self> {
        for (name, spec) in &edge_sets {
            for endpoint in [&spec.source, &spec.target] {
                if !node_sets.contains_key(endpoint) {
                    return Err(Error::SchemaMismatch(format!(
                        "edge set '{}' references unknown node set '{}'",
                        name, endpoint
                    )));
                }
            }
        }

        Ok(Self {
            context,
            node_sets,
            edge_sets,
        })
    }

    /// Get the context feature specs
    pub fn context(&self) -> &[FeatureSpec] {
        &self.context
    }

    /// Get all node sets
    pub fn node_sets(&self) -> &BTreeMap<String, NodeSetSpec> {
        &self.node_sets
    }

    /// Get all edge sets
    pub fn edge_sets(&self) -> &BTreeMap<String, EdgeSetSpec> {
        &self.edge_sets
    }

    /// Get a node set by name
    pub fn node_set(&self, name: &str) -> Result<&NodeSetSpec> {
        self.node_sets
            .get(name)
            .ok_or_else(|| Error::SchemaMismatch(format!("node set not found: {}", name)))
    }

    /// Get an edge set by name
    pub fn edge_set(&self, name: &str) -> Result<&EdgeSetSpec> {
        self.edge_sets
            .get(name)
            .ok_or_else(|| Error::SchemaMismatch(format!("edge set not found: {}", name)))
    }

    /// Serialize this schema to a binary format
    pub fn serialize(&self) -> Result<Vec<u8>> {
        bincode::serialize(self).map_err(Error::Serialization)
    }

    /// Deserialize a schema from a binary format
    pub fn deserialize(data: &[u8]) -> Result<Self> {
        bincode::deserialize(data).map_err(Error::Serialization)
    }
}

impl fmt::Display for GraphSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "GraphSchema: {} node sets, {} edge sets",
            self.node_sets.len(),
            self.edge_sets.len()
        )?;
        for spec in &self.context {
            writeln!(f, "  context/{}", spec)?;
        }
        for (name, set) in &self.node_sets {
            for spec in &set.features {
                writeln!(f, "  nodes/{}/{}", name, spec)?;
            }
        }
        for (name, set) in &self.edge_sets {
            writeln!(f, "  edges/{} ({} -> {})", name, set.source, set.target)?;
            for spec in &set.features {
                writeln!(f, "  edges/{}/{}", name, spec)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema_with_self_loop() -> GraphSchema {
        let mut node_sets = BTreeMap::new();
        node_sets.insert(
            "nodes".to_string(),
            NodeSetSpec {
                features: vec![FeatureSpec::new("feature", DataType::Float32, vec![2])],
            },
        );
        let mut edge_sets = BTreeMap::new();
        edge_sets.insert(
            "edges".to_string(),
            EdgeSetSpec {
                features: vec![FeatureSpec::new("weight", DataType::Float32, vec![])],
                source: "nodes".to_string(),
                target: "nodes".to_string(),
            },
        );
        GraphSchema::new(
            vec![FeatureSpec::new("label", DataType::Int64, vec![])],
            node_sets,
            edge_sets,
        )
        .unwrap()
    }

    #[test]
    fn test_lookup_by_name() {
        let schema = schema_with_self_loop();
        assert_eq!(schema.node_set("nodes").unwrap().features.len(), 1);
        assert_eq!(schema.edge_set("edges").unwrap().source, "nodes");
        assert!(matches!(
            schema.node_set("missing"),
            Err(Error::SchemaMismatch(_))
        ));
    }

    #[test]
    fn test_unknown_endpoint_rejected() {
        let mut edge_sets = BTreeMap::new();
        edge_sets.insert(
            "edges".to_string(),
            EdgeSetSpec {
                features: vec![],
                source: "nodes".to_string(),
                target: "nodes".to_string(),
            },
        );
        let result = GraphSchema::new(vec![], BTreeMap::new(), edge_sets);
        assert!(matches!(result, Err(Error::SchemaMismatch(_))));
    }

    #[test]
    fn test_serde_round_trip() {
        let schema = schema_with_self_loop();
        let bytes = schema.serialize().unwrap();
        let restored = GraphSchema::deserialize(&bytes).unwrap();
        assert_eq!(schema, restored);
    }

    #[test]
    fn test_row_width() {
        assert_eq!(FeatureSpec::new("f", DataType::Float32, vec![]).row_width(), 1);
        assert_eq!(FeatureSpec::new("f", DataType::Float32, vec![2, 3]).row_width(), 6);
    }
}
