//! # Column Declarations
//!
//! Analyses declare every column they read as a [`ColumnSpec`]: a name plus a
//! [`ColumnKind`] (one value per entry, or a variable-length list per entry)
//! over an [`ElementType`].
//!
//! ## Arrow mapping
//!
//! | Declaration | Arrow type |
//! |-------------|------------|
//! | `Scalar(Int32)` | Int32 (UInt32 accepted, same width) |
//! | `Scalar(Float32)` | Float32 |
//! | `Scalar(Float64)` | Float64 |
//! | `List(T)` | List<T> (i32 offsets) or LargeList<T> (i64 offsets) |

use std::fmt;
use std::sync::Arc;

use arrow::datatypes::{DataType, Field};
use serde::{Deserialize, Serialize};

/// Fixed-width numeric element type of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementType {
    /// 32-bit signed integer
    Int32,
    /// 32-bit float
    Float32,
    /// 64-bit float
    Float64,
}

impl ElementType {
    /// Arrow type used to store this element
    pub fn data_type(&self) -> DataType {
        match self {
            ElementType::Int32 => DataType::Int32,
            ElementType::Float32 => DataType::Float32,
            ElementType::Float64 => DataType::Float64,
        }
    }
}

/// Shape of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "shape", content = "element", rename_all = "lowercase")]
pub enum ColumnKind {
    /// One value per entry
    Scalar(ElementType),
    /// Zero or more values per entry
    List(ElementType),
}

impl ColumnKind {
    /// Arrow type of a column of this kind
    pub fn data_type(&self) -> DataType {
        match self {
            ColumnKind::Scalar(e) => e.data_type(),
            ColumnKind::List(e) => {
                DataType::List(Arc::new(Field::new("item", e.data_type(), true)))
            }
        }
    }
}

/// A named, typed column required by an analysis
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnSpec {
    /// Column name in the source
    pub name: String,
    /// Declared shape and element type
    pub kind: ColumnKind,
}

impl ColumnSpec {
    /// Scalar column
    pub fn scalar(name: impl Into<String>, element: ElementType) -> Self {
        Self {
            name: name.into(),
            kind: ColumnKind::Scalar(element),
        }
    }

    /// List column
    pub fn list(name: impl Into<String>, element: ElementType) -> Self {
        Self {
            name: name.into(),
            kind: ColumnKind::List(element),
        }
    }
}

impl fmt::Display for ColumnSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ColumnKind::Scalar(e) => write!(f, "{}: {:?}", self.name, e),
            ColumnKind::List(e) => write!(f, "{}: List<{:?}>", self.name, e),
        }
    }
}
