//! # Entry View
//!
//! Typed, per-entry access to the columns of one record batch.
//!
//! A [`ScalarView`] returns one value per row by value. A [`ListView`]
//! returns a borrowed slice per row, located through the list's offsets
//! buffer and bounds-checked against the backing values before it is handed
//! out. Both views share the batch's buffers; nothing is copied.
//!
//! Binding is strict: the stored element type must be the declared one, or
//! an integer type of the same width (reinterpreted, never cast).
//!
//! ```rust
//! use std::sync::Arc;
//! use arrow::array::{ArrayRef, Int32Array, ListArray};
//! use arrow::datatypes::{Float32Type, Int32Type};
//! use arrow::record_batch::RecordBatch;
//! use colbench::view::{ListView, ScalarView};
//!
//! let counts = Int32Array::from(vec![2, 0]);
//! let pts = ListArray::from_iter_primitive::<Float32Type, _, _>(vec![
//!     Some(vec![Some(20.0), Some(25.0)]),
//!     Some(vec![]),
//! ]);
//! let batch = RecordBatch::try_from_iter(vec![
//!     ("nMuon", Arc::new(counts) as ArrayRef),
//!     ("Muon_pt", Arc::new(pts) as ArrayRef),
//! ])?;
//!
//! let n = ScalarView::<Int32Type>::bind(&batch, "nMuon")?;
//! let pt = ListView::<Float32Type>::bind(&batch, "Muon_pt")?;
//! assert_eq!(n.value(0), 2);
//! assert_eq!(pt.value(0)?, &[20.0, 25.0]);
//! assert!(pt.value(1)?.is_empty());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::marker::PhantomData;
use std::sync::Arc;

use arrow::array::{Array, ArrayRef, AsArray};
use arrow::buffer::{OffsetBuffer, ScalarBuffer};
use arrow::datatypes::{
    ArrowPrimitiveType, DataType, Field, Float32Type, Float64Type, Int32Type,
};
use arrow::record_batch::RecordBatch;

use crate::reader::ReaderError;
use crate::schema::{ColumnKind, ColumnSpec, ElementType};

fn type_mismatch(name: &str, expected: &DataType, found: &DataType) -> ReaderError {
    ReaderError::TypeMismatch {
        column: name.to_string(),
        expected: expected.to_string(),
        found: found.to_string(),
    }
}

fn column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a ArrayRef, ReaderError> {
    batch
        .column_by_name(name)
        .ok_or_else(|| ReaderError::ColumnNotFound(name.to_string()))
}

/// View the values of a primitive array as `T`, sharing its buffer.
fn primitive_values<T: ArrowPrimitiveType>(
    name: &str,
    array: &dyn Array,
) -> Result<ScalarBuffer<T::Native>, ReaderError> {
    let found = array.data_type();
    if found == &T::DATA_TYPE {
        return Ok(array.as_primitive::<T>().values().clone());
    }

    let same_width_integers = found.is_integer()
        && T::DATA_TYPE.is_integer()
        && found.primitive_width() == T::DATA_TYPE.primitive_width();
    if !same_width_integers {
        return Err(type_mismatch(name, &T::DATA_TYPE, found));
    }

    let data = array.to_data();
    let buffer = data
        .buffers()
        .first()
        .cloned()
        .ok_or_else(|| type_mismatch(name, &T::DATA_TYPE, found))?;
    Ok(ScalarBuffer::new(buffer, data.offset(), data.len()))
}

/// One value per row from a named column of one batch
#[derive(Debug)]
pub struct ScalarView<'a, T: ArrowPrimitiveType> {
    values: ScalarBuffer<T::Native>,
    _batch: PhantomData<&'a RecordBatch>,
}

impl<'a, T: ArrowPrimitiveType> ScalarView<'a, T> {
    /// Bind to column `name` of `batch`
    pub fn bind(batch: &'a RecordBatch, name: &str) -> Result<Self, ReaderError> {
        let values = primitive_values::<T>(name, column(batch, name)?.as_ref())?;
        Ok(Self {
            values,
            _batch: PhantomData,
        })
    }

    /// Value at `row`
    #[inline]
    pub fn value(&self, row: usize) -> T::Native {
        self.values[row]
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the column has no rows
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Offsets of a `List` (i32) or `LargeList` (i64) column
#[derive(Debug)]
enum ListOffsets {
    Small(OffsetBuffer<i32>),
    Large(OffsetBuffer<i64>),
}

impl ListOffsets {
    fn len(&self) -> usize {
        match self {
            ListOffsets::Small(o) => o.len(),
            ListOffsets::Large(o) => o.len(),
        }
    }

    #[inline]
    fn get(&self, i: usize) -> Option<i64> {
        match self {
            ListOffsets::Small(o) => o.get(i).map(|&v| i64::from(v)),
            ListOffsets::Large(o) => o.get(i).copied(),
        }
    }
}

/// A variable-length list per row from a named column of one batch.
///
/// Both 32-bit (`List`) and 64-bit (`LargeList`) offsets are accepted.
#[derive(Debug)]
pub struct ListView<'a, T: ArrowPrimitiveType> {
    name: String,
    offsets: ListOffsets,
    values: ScalarBuffer<T::Native>,
    _batch: PhantomData<&'a RecordBatch>,
}

impl<'a, T: ArrowPrimitiveType> ListView<'a, T> {
    /// Bind to list column `name` of `batch`
    pub fn bind(batch: &'a RecordBatch, name: &str) -> Result<Self, ReaderError> {
        let array = column(batch, name)?;
        let (offsets, items) = if let Some(list) = array.as_list_opt::<i32>() {
            (ListOffsets::Small(list.offsets().clone()), list.values())
        } else if let Some(list) = array.as_list_opt::<i64>() {
            (ListOffsets::Large(list.offsets().clone()), list.values())
        } else {
            let item = Field::new("item", T::DATA_TYPE, true);
            return Err(type_mismatch(
                name,
                &DataType::List(Arc::new(item)),
                array.data_type(),
            ));
        };
        let values = primitive_values::<T>(name, items.as_ref())?;
        Ok(Self {
            name: name.to_string(),
            offsets,
            values,
            _batch: PhantomData,
        })
    }

    fn corrupt(&self, row: usize, detail: String) -> ReaderError {
        ReaderError::Corrupt {
            column: self.name.clone(),
            row,
            detail,
        }
    }

    /// Elements recorded for `row`.
    ///
    /// Fails with [`ReaderError::Corrupt`] when the row's span does not lie
    /// within the backing values.
    pub fn value(&self, row: usize) -> Result<&[T::Native], ReaderError> {
        let (start, end) = match (self.offsets.get(row), self.offsets.get(row + 1)) {
            (Some(start), Some(end)) => (start, end),
            _ => {
                return Err(self.corrupt(
                    row,
                    format!("no offsets for row ({} rows)", self.len()),
                ))
            }
        };
        if start < 0 || end < start || end as usize > self.values.len() {
            return Err(self.corrupt(
                row,
                format!(
                    "span {}..{} outside {} values",
                    start,
                    end,
                    self.values.len()
                ),
            ));
        }
        Ok(&self.values[start as usize..end as usize])
    }

    /// Elements of `row`, which must number exactly `arity`
    pub fn exact(&self, row: usize, arity: usize) -> Result<&[T::Native], ReaderError> {
        let values = self.value(row)?;
        if values.len() != arity {
            return Err(ReaderError::MalformedEntry {
                column: self.name.clone(),
                row,
                expected: arity,
                found: values.len(),
            });
        }
        Ok(values)
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.offsets.len().saturating_sub(1)
    }

    /// Whether the column has no rows
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A column of one batch bound to its declared type
#[derive(Debug)]
pub enum BoundColumn<'a> {
    /// Scalar i32
    Int32(ScalarView<'a, Int32Type>),
    /// Scalar f32
    Float32(ScalarView<'a, Float32Type>),
    /// Scalar f64
    Float64(ScalarView<'a, Float64Type>),
    /// List of i32
    ListInt32(ListView<'a, Int32Type>),
    /// List of f32
    ListFloat32(ListView<'a, Float32Type>),
    /// List of f64
    ListFloat64(ListView<'a, Float64Type>),
}

impl<'a> BoundColumn<'a> {
    /// Bind `spec` against `batch`
    pub fn bind(batch: &'a RecordBatch, spec: &ColumnSpec) -> Result<Self, ReaderError> {
        let name = spec.name.as_str();
        Ok(match spec.kind {
            ColumnKind::Scalar(ElementType::Int32) => Self::Int32(ScalarView::bind(batch, name)?),
            ColumnKind::Scalar(ElementType::Float32) => {
                Self::Float32(ScalarView::bind(batch, name)?)
            }
            ColumnKind::Scalar(ElementType::Float64) => {
                Self::Float64(ScalarView::bind(batch, name)?)
            }
            ColumnKind::List(ElementType::Int32) => Self::ListInt32(ListView::bind(batch, name)?),
            ColumnKind::List(ElementType::Float32) => {
                Self::ListFloat32(ListView::bind(batch, name)?)
            }
            ColumnKind::List(ElementType::Float64) => {
                Self::ListFloat64(ListView::bind(batch, name)?)
            }
        })
    }
}

/// All columns a pipeline needs, bound against one batch.
///
/// Columns are addressed by their position in the declaration list the batch
/// was bound with.
#[derive(Debug)]
pub struct EntryBatch<'a> {
    batch: &'a RecordBatch,
    specs: &'a [ColumnSpec],
    columns: Vec<BoundColumn<'a>>,
}

impl<'a> EntryBatch<'a> {
    /// Bind every declared column; fails on the first missing or mistyped one
    pub fn bind(batch: &'a RecordBatch, specs: &'a [ColumnSpec]) -> Result<Self, ReaderError> {
        let columns = specs
            .iter()
            .map(|spec| BoundColumn::bind(batch, spec))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            batch,
            specs,
            columns,
        })
    }

    /// Number of entries in the batch
    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    /// Underlying record batch
    pub fn record_batch(&self) -> &'a RecordBatch {
        self.batch
    }

    /// Entry at `row`
    pub fn entry(&self, row: usize) -> Entry<'_, 'a> {
        Entry { batch: self, row }
    }

    fn mismatch(&self, column: usize, expected: &str) -> ReaderError {
        let spec = &self.specs[column];
        ReaderError::TypeMismatch {
            column: spec.name.clone(),
            expected: expected.to_string(),
            found: spec.kind.data_type().to_string(),
        }
    }

    /// Scalar at `(column, row)` widened to f64
    #[inline]
    pub fn scalar(&self, column: usize, row: usize) -> Result<f64, ReaderError> {
        match &self.columns[column] {
            BoundColumn::Int32(v) => Ok(f64::from(v.value(row))),
            BoundColumn::Float32(v) => Ok(f64::from(v.value(row))),
            BoundColumn::Float64(v) => Ok(v.value(row)),
            _ => Err(self.mismatch(column, "scalar")),
        }
    }

    /// Integer list at `(column, row)` with exactly `arity` elements
    #[inline]
    pub fn int_list(&self, column: usize, row: usize, arity: usize) -> Result<&[i32], ReaderError> {
        match &self.columns[column] {
            BoundColumn::ListInt32(v) => v.exact(row, arity),
            _ => Err(self.mismatch(column, "List<Int32>")),
        }
    }

    /// Floating-point list at `(column, row)` with exactly `arity` elements,
    /// widened to f64 into `out`
    #[inline]
    pub fn float_list_into(
        &self,
        column: usize,
        row: usize,
        arity: usize,
        out: &mut Vec<f64>,
    ) -> Result<(), ReaderError> {
        out.clear();
        match &self.columns[column] {
            BoundColumn::ListFloat32(v) => {
                out.extend(v.exact(row, arity)?.iter().map(|&x| f64::from(x)))
            }
            BoundColumn::ListFloat64(v) => out.extend_from_slice(v.exact(row, arity)?),
            _ => return Err(self.mismatch(column, "List<Float32|Float64>")),
        }
        Ok(())
    }
}

/// A `(batch, row)` coordinate, valid while its batch is alive
#[derive(Debug, Clone, Copy)]
pub struct Entry<'b, 'a> {
    batch: &'b EntryBatch<'a>,
    row: usize,
}

impl<'b, 'a> Entry<'b, 'a> {
    /// Row index within the batch
    pub fn row(&self) -> usize {
        self.row
    }

    /// Scalar column value widened to f64
    #[inline]
    pub fn scalar(&self, column: usize) -> Result<f64, ReaderError> {
        self.batch.scalar(column, self.row)
    }

    /// Integer list with exactly `arity` elements
    #[inline]
    pub fn int_list(&self, column: usize, arity: usize) -> Result<&'b [i32], ReaderError> {
        self.batch.int_list(column, self.row, arity)
    }

    /// Floating-point list with exactly `arity` elements, widened into `out`
    #[inline]
    pub fn float_list_into(
        &self,
        column: usize,
        arity: usize,
        out: &mut Vec<f64>,
    ) -> Result<(), ReaderError> {
        self.batch.float_list_into(column, self.row, arity, out)
    }
}
