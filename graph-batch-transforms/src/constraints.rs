//! Size constraints: declared ceilings for every piece of a padded batch

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use graph_batch_core::{Error, Result};

/// A declared size ceiling, as supplied by configuration.
///
/// Callers hand ceilings over either as bare integers or as small numeric
/// containers (a rank-0 or size-1 tensor read back from a size histogram).
/// All consumers normalize through [`SizeValue::to_int`] at ingress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SizeValue {
    /// A plain integer ceiling
    Int(i64),

    /// A single-element numeric container
    Tensor(Vec<i64>),
}

impl SizeValue {
    /// Normalize to a plain integer.
    ///
    /// Accepts `Int` and one-element `Tensor` values; anything else is a
    /// `MalformedCeiling` error, as is a negative ceiling.
    pub fn to_int(&self) -> Result<i64> {
        let value = match self {
            SizeValue::Int(v) => *v,
            SizeValue::Tensor(values) if values.len() == 1 => values[0],
            SizeValue::Tensor(values) => {
                return Err(Error::MalformedCeiling(format!(
                    "expected a single-element container, got {} elements",
                    values.len()
                )))
            }
        };
        if value < 0 {
            return Err(Error::MalformedCeiling(format!(
                "ceiling must be non-negative, got {}",
                value
            )));
        }
        Ok(value)
    }
}

impl From<i64> for SizeValue {
    fn from(value: i64) -> Self {
        SizeValue::Int(value)
    }
}

impl From<Vec<i64>> for SizeValue {
    fn from(values: Vec<i64>) -> Self {
        SizeValue::Tensor(values)
    }
}

/// Declared target sizes for a padded graph batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeConstraints {
    /// Target total component count
    pub total_num_components: SizeValue,

    /// Target total node count per node set
    pub total_num_nodes: BTreeMap<String, SizeValue>,

    /// Target total edge count per edge set
    pub total_num_edges: BTreeMap<String, SizeValue>,
}

impl SizeConstraints {
    /// Create size constraints from plain integers
    pub fn new(
        total_num_components: i64,
        total_num_nodes: BTreeMap<String, SizeValue>,
        total_num_edges: BTreeMap<String, SizeValue>,
    ) -> Self {
        Self {
            total_num_components: SizeValue::Int(total_num_components),
            total_num_nodes,
            total_num_edges,
        }
    }
}
