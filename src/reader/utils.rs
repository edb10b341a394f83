use arrow::datatypes::{DataType, Schema};

use crate::schema::{ColumnKind, ColumnSpec, ElementType};

use super::ReaderError;

/// Whether a stored element type can be viewed as the declared one.
///
/// Integers of identical width share a machine representation and are
/// reinterpreted; floats must match exactly.
pub(crate) fn element_compatible(declared: ElementType, found: &DataType) -> bool {
    match declared {
        ElementType::Int32 => matches!(found, DataType::Int32 | DataType::UInt32),
        ElementType::Float32 => matches!(found, DataType::Float32),
        ElementType::Float64 => matches!(found, DataType::Float64),
    }
}

/// Whether a stored column type satisfies a declaration
pub(crate) fn kind_compatible(declared: ColumnKind, found: &DataType) -> bool {
    match (declared, found) {
        (ColumnKind::Scalar(e), t) => element_compatible(e, t),
        (ColumnKind::List(e), DataType::List(item) | DataType::LargeList(item)) => {
            element_compatible(e, item.data_type())
        }
        _ => false,
    }
}

/// Check that `schema` carries `spec` with a compatible type.
pub(crate) fn check_column(schema: &Schema, spec: &ColumnSpec) -> Result<(), ReaderError> {
    let field = schema
        .field_with_name(&spec.name)
        .map_err(|_| ReaderError::ColumnNotFound(spec.name.clone()))?;
    if kind_compatible(spec.kind, field.data_type()) {
        Ok(())
    } else {
        Err(ReaderError::TypeMismatch {
            column: spec.name.clone(),
            expected: spec.kind.data_type().to_string(),
            found: field.data_type().to_string(),
        })
    }
}

/// Check every declared column before any entry is read
pub(crate) fn check_columns(schema: &Schema, specs: &[ColumnSpec]) -> Result<(), ReaderError> {
    specs.iter().try_for_each(|spec| check_column(schema, spec))
}

/// Indices of the named top-level fields, in schema order
pub(crate) fn root_indices<S: AsRef<str>>(
    field_names: &[String],
    names: &[S],
) -> Result<Vec<usize>, ReaderError> {
    let mut indices = names
        .iter()
        .map(|name| {
            field_names
                .iter()
                .position(|f| f == name.as_ref())
                .ok_or_else(|| ReaderError::ColumnNotFound(name.as_ref().to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;
    indices.sort_unstable();
    indices.dedup();
    Ok(indices)
}
