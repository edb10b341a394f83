//! Native ROOT trees decoded into Arrow arrays.
//!
//! ROOT files do not carry an Arrow schema, so each branch is decoded
//! according to its [`ColumnSpec`]. The whole tree becomes one table which the
//! source then hands out in zero-copy slices.

use std::path::Path;
use std::sync::Arc;

use arrow::array::{ArrayRef, Float32Array, Float64Array, Int32Array, ListArray, UInt32Array};
use arrow::buffer::OffsetBuffer;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use oxyroot::{Branch, Named, ReaderTree, RootFile};

use crate::schema::{ColumnKind, ColumnSpec, ElementType};

use super::ReaderError;

fn root_error<E: std::fmt::Display>(context: &str, err: E) -> ReaderError {
    ReaderError::RootError(format!("{context}: {err}"))
}

/// Names of the trees stored in a ROOT file
pub(crate) fn tree_names(file: &mut RootFile) -> Vec<String> {
    file.keys()
        .into_iter()
        .filter(|key| key.class_name() == "TTree")
        .map(|key| key.name().to_string())
        .collect()
}

/// Open `requested`, or the only tree in the file when unset
pub(crate) fn resolve_tree(
    file: &mut RootFile,
    requested: Option<&str>,
) -> Result<(ReaderTree, String), ReaderError> {
    let name = match requested {
        Some(name) => name.to_string(),
        None => {
            let names = tree_names(file);
            match names.as_slice() {
                [single] => single.clone(),
                [] => {
                    return Err(ReaderError::RootError(
                        "ROOT file does not contain any TTrees".to_string(),
                    ))
                }
                _ => {
                    return Err(ReaderError::RootError(format!(
                        "Multiple TTrees found ({:?}); set the tree name to disambiguate",
                        names
                    )))
                }
            }
        }
    };
    let tree = file
        .get_tree(&name)
        .map_err(|err| root_error(&format!("Failed to open ROOT tree '{name}'"), err))?;
    Ok((tree, name))
}

fn find_branch<'a>(tree: &'a ReaderTree, name: &str) -> Result<&'a Branch, ReaderError> {
    tree.branches()
        .find(|b| b.name() == name)
        .ok_or_else(|| ReaderError::ColumnNotFound(name.to_string()))
}

fn is_unsigned_int(type_name: &str) -> bool {
    matches!(
        type_name.to_ascii_lowercase().as_str(),
        "unsigned int" | "uint_t" | "uint32_t"
    )
}

fn decode_scalar(branch: &Branch, spec: &ColumnSpec, element: ElementType) -> Result<ArrayRef, ReaderError> {
    let context = format!("Failed to read branch '{}'", spec.name);
    let array: ArrayRef = match element {
        ElementType::Int32 if is_unsigned_int(&branch.item_type_name()) => Arc::new(
            UInt32Array::from_iter_values(branch.as_iter::<u32>().map_err(|e| root_error(&context, e))?),
        ),
        ElementType::Int32 => Arc::new(Int32Array::from_iter_values(
            branch.as_iter::<i32>().map_err(|e| root_error(&context, e))?,
        )),
        ElementType::Float32 => Arc::new(Float32Array::from_iter_values(
            branch.as_iter::<f32>().map_err(|e| root_error(&context, e))?,
        )),
        ElementType::Float64 => Arc::new(Float64Array::from_iter_values(
            branch.as_iter::<f64>().map_err(|e| root_error(&context, e))?,
        )),
    };
    Ok(array)
}

/// Flatten per-entry vectors into an Arrow list with i32 offsets
fn list_array<T, A>(rows: impl Iterator<Item = Vec<T>>, element: DataType, build: impl FnOnce(Vec<T>) -> A) -> ArrayRef
where
    A: arrow::array::Array + 'static,
{
    let mut lengths = Vec::new();
    let mut values = Vec::new();
    for row in rows {
        lengths.push(row.len());
        values.extend(row);
    }
    let field = Arc::new(Field::new("item", element, true));
    Arc::new(ListArray::new(
        field,
        OffsetBuffer::from_lengths(lengths),
        Arc::new(build(values)),
        None,
    ))
}

fn decode_list(branch: &Branch, spec: &ColumnSpec, element: ElementType) -> Result<ArrayRef, ReaderError> {
    let context = format!("Failed to read branch '{}'", spec.name);
    let array = match element {
        ElementType::Int32 => list_array(
            branch.as_iter::<Vec<i32>>().map_err(|e| root_error(&context, e))?,
            DataType::Int32,
            Int32Array::from,
        ),
        ElementType::Float32 => list_array(
            branch.as_iter::<Vec<f32>>().map_err(|e| root_error(&context, e))?,
            DataType::Float32,
            Float32Array::from,
        ),
        ElementType::Float64 => list_array(
            branch.as_iter::<Vec<f64>>().map_err(|e| root_error(&context, e))?,
            DataType::Float64,
            Float64Array::from,
        ),
    };
    Ok(array)
}

/// Decode the declared columns of a tree into one record batch
pub(crate) fn read_tree(
    path: &Path,
    tree: Option<&str>,
    columns: &[ColumnSpec],
) -> Result<RecordBatch, ReaderError> {
    let mut file = RootFile::open(path).map_err(|err| {
        root_error(&format!("Failed to open ROOT file '{}'", path.display()), err)
    })?;
    let (tree, tree_name) = resolve_tree(&mut file, tree)?;
    log::debug!("Decoding {} branches of tree '{}'", columns.len(), tree_name);

    let mut fields = Vec::with_capacity(columns.len());
    let mut arrays = Vec::with_capacity(columns.len());
    for spec in columns {
        let branch = find_branch(&tree, &spec.name)?;
        let array = match spec.kind {
            ColumnKind::Scalar(e) => decode_scalar(branch, spec, e)?,
            ColumnKind::List(e) => decode_list(branch, spec, e)?,
        };
        fields.push(Field::new(&spec.name, array.data_type().clone(), false));
        arrays.push(array);
    }

    if let Some(first) = arrays.first() {
        let rows = first.len();
        if let Some((spec, array)) = columns.iter().zip(&arrays).find(|(_, a)| a.len() != rows) {
            return Err(ReaderError::Corrupt {
                column: spec.name.clone(),
                row: array.len().min(rows),
                detail: format!("branch has {} entries, tree has {}", array.len(), rows),
            });
        }
    }

    Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays)?)
}

/// Entry count and `(branch, type)` pairs of a tree
pub(crate) fn describe_tree(
    path: &Path,
    tree: Option<&str>,
) -> Result<(i64, Vec<(String, String)>), ReaderError> {
    let mut file = RootFile::open(path).map_err(|err| {
        root_error(&format!("Failed to open ROOT file '{}'", path.display()), err)
    })?;
    let (tree, _) = resolve_tree(&mut file, tree)?;
    let branches = tree
        .branches()
        .map(|b| (b.name().to_string(), b.item_type_name().to_string()))
        .collect();
    Ok((tree.entries(), branches))
}
