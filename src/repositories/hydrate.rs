//! Row-to-record hydration.

use crate::error::AppError;
use crate::graph::{Row, Value};
use crate::mapping::{EntityMetadata, GraphEntity};

/// Builds a record from one result row.
///
/// When the row carries a node (the first one in column order wins), every
/// mapped field is read from its property bag. Otherwise each field is taken
/// from the first column named exactly after its property or ending in
/// `.<property>`. Missing and null values leave the field at its default.
pub(crate) fn hydrate<T: GraphEntity>(row: &Row, metadata: &EntityMetadata) -> Result<T, AppError> {
    let mut entity = T::default();

    match row.values().find_map(Value::as_node) {
        Some(node) => {
            for (field, property) in &metadata.field_to_property {
                assign(&mut entity, field, node.property(property))?;
            }
        }
        None => {
            for (field, property) in &metadata.field_to_property {
                assign(&mut entity, field, column_for(row, property))?;
            }
        }
    }

    Ok(entity)
}

fn column_for<'a>(row: &'a Row, property: &str) -> Option<&'a Value> {
    row.iter()
        .find(|(column, _)| {
            *column == property
                || column
                    .strip_suffix(property)
                    .is_some_and(|prefix| prefix.ends_with('.'))
        })
        .map(|(_, value)| value)
}

fn assign<T: GraphEntity>(entity: &mut T, field: &str, value: Option<&Value>) -> Result<(), AppError> {
    match value {
        Some(value) if !value.is_null() => Ok(entity.write_field(field, value.to_json())?),
        _ => Ok(()),
    }
}
