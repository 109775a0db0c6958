//! Feature columns: flattened, row-major values for one feature of a graph piece

use std::fmt;

use bytemuck::Zeroable;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::schema::DataType;

fn zero_rows<T: Zeroable + Clone>(count: usize) -> Vec<T> {
    vec![T::zeroed(); count]
}

/// Typed storage for one feature's flattened values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FeatureValues {
    /// 32-bit integer values
    Int32(Vec<i32>),

    /// 64-bit integer values
    Int64(Vec<i64>),

    /// 32-bit float values
    Float32(Vec<f32>),

    /// 64-bit float values
    Float64(Vec<f64>),
}

impl FeatureValues {
    /// Number of flattened elements
    pub fn len(&self) -> usize {
        match self {
            FeatureValues::Int32(v) => v.len(),
            FeatureValues::Int64(v) => v.len(),
            FeatureValues::Float32(v) => v.len(),
            FeatureValues::Float64(v) => v.len(),
        }
    }

    /// Check whether there are no elements
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Element type of the stored values
    pub fn data_type(&self) -> DataType {
        match self {
            FeatureValues::Int32(_) => DataType::Int32,
            FeatureValues::Int64(_) => DataType::Int64,
            FeatureValues::Float32(_) => DataType::Float32,
            FeatureValues::Float64(_) => DataType::Float64,
        }
    }

    fn append_zeros(&mut self, count: usize) {
        match self {
            FeatureValues::Int32(v) => v.extend(zero_rows::<i32>(count)),
            FeatureValues::Int64(v) => v.extend(zero_rows::<i64>(count)),
            FeatureValues::Float32(v) => v.extend(zero_rows::<f32>(count)),
            FeatureValues::Float64(v) => v.extend(zero_rows::<f64>(count)),
        }
    }

    fn extend_from(&mut self, other: &FeatureValues) -> Result<()> {
        match (self, other) {
            (FeatureValues::Int32(a), FeatureValues::Int32(b)) => a.extend_from_slice(b),
            (FeatureValues::Int64(a), FeatureValues::Int64(b)) => a.extend_from_slice(b),
            (FeatureValues::Float32(a), FeatureValues::Float32(b)) => a.extend_from_slice(b),
            (FeatureValues::Float64(a), FeatureValues::Float64(b)) => a.extend_from_slice(b),
            (a, b) => {
                return Err(Error::InvalidArgument(format!(
                    "cannot extend {} values with {} values",
                    a.data_type(),
                    b.data_type()
                )))
            }
        }
        Ok(())
    }
}

/// A column of feature values with a fixed per-row width
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureColumn {
    /// Name of the feature
    name: String,

    /// Flattened elements per row
    row_width: usize,

    /// The flattened values
    values: FeatureValues,
}

impl FeatureColumn {
    /// Create a new column, validating that the value length is a whole number of rows
    pub fn new(name: &str, row_width: usize, values: FeatureValues) -> Result<Self> {
        if row_width == 0 {
            return Err(Error::InvalidArgument(format!(
                "feature '{}' has zero row width",
                name
            )));
        }
        if values.len() % row_width != 0 {
            return Err(Error::InvalidArgument(format!(
                "feature '{}' has {} values, not a multiple of row width {}",
                name,
                values.len(),
                row_width
            )));
        }

        Ok(Self {
            name: name.to_string(),
            row_width,
            values,
        })
    }

    /// Create a scalar-per-row column from 32-bit floats
    pub fn from_f32(name: &str, values: Vec<f32>) -> Self {
        Self {
            name: name.to_string(),
            row_width: 1,
            values: FeatureValues::Float32(values),
        }
    }

    /// Create a scalar-per-row column from 64-bit integers
    pub fn from_i64(name: &str, values: Vec<i64>) -> Self {
        Self {
            name: name.to_string(),
            row_width: 1,
            values: FeatureValues::Int64(values),
        }
    }

    /// Get the name of this column
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the element type of this column
    pub fn data_type(&self) -> DataType {
        self.values.data_type()
    }

    /// Flattened elements per row
    pub fn row_width(&self) -> usize {
        self.row_width
    }

    /// Number of logical rows in this column
    pub fn num_rows(&self) -> usize {
        self.values.len() / self.row_width
    }

    /// Get the flattened values
    pub fn values(&self) -> &FeatureValues {
        &self.values
    }

    /// Append `count` default-valued (zero) rows
    pub fn append_zero_rows(&mut self, count: usize) {
        self.values.append_zeros(count * self.row_width);
    }

    /// Append all rows of another column of the same type and width
    pub fn extend_from(&mut self, other: &FeatureColumn) -> Result<()> {
        if self.row_width != other.row_width {
            return Err(Error::InvalidArgument(format!(
                "feature '{}' row width mismatch: {} vs {}",
                self.name, self.row_width, other.row_width
            )));
        }
        self.values.extend_from(&other.values)
    }

    /// Get the values as a 32-bit float slice
    pub fn as_f32(&self) -> Result<&[f32]> {
        match &self.values {
            FeatureValues::Float32(v) => Ok(v),
            other => Err(Error::InvalidArgument(format!(
                "feature '{}' holds {} values, not Float32",
                self.name,
                other.data_type()
            ))),
        }
    }

    /// Get the values as a 64-bit integer slice
    pub fn as_i64(&self) -> Result<&[i64]> {
        match &self.values {
            FeatureValues::Int64(v) => Ok(v),
            other => Err(Error::InvalidArgument(format!(
                "feature '{}' holds {} values, not Int64",
                self.name,
                other.data_type()
            ))),
        }
    }
}

impl fmt::Display for FeatureColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} x{} ({} rows)",
            self.name,
            self.data_type(),
            self.row_width,
            self.num_rows()
        )
    }
}
