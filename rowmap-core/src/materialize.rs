//! Conversion of result rows into scalars, dynamic records and entities

use crate::entity::{Accessor, Catalog};
use crate::row::Row;
use crate::{Entity, FromValue, Result, Value};
use std::sync::Arc;

/// Untyped result: a bare value for single-column rows, the whole row
/// otherwise
#[derive(Debug, Clone, PartialEq)]
pub enum Dynamic {
    Scalar { column: String, value: Value },
    Record(Row),
}

impl Dynamic {
    pub fn from_row(row: Row) -> Self {
        if row.len() == 1 {
            let column = row.columns().first().cloned().unwrap_or_default();
            let value = row.into_values().into_iter().next().unwrap_or(Value::Null);
            Dynamic::Scalar { column, value }
        } else {
            Dynamic::Record(row)
        }
    }

    pub fn as_scalar(&self) -> Option<&Value> {
        match self {
            Dynamic::Scalar { value, .. } => Some(value),
            Dynamic::Record(_) => None,
        }
    }

    pub fn as_record(&self) -> Option<&Row> {
        match self {
            Dynamic::Record(row) => Some(row),
            Dynamic::Scalar { .. } => None,
        }
    }

    /// Value by column name, ignoring ASCII case
    pub fn get(&self, name: &str) -> Option<&Value> {
        match self {
            Dynamic::Scalar { column, value } if column.eq_ignore_ascii_case(name) => Some(value),
            Dynamic::Scalar { .. } => None,
            Dynamic::Record(row) => row.get_by_name(name),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Dynamic::Scalar { value, .. } => crate::row::value_to_json(value),
            Dynamic::Record(row) => row.to_json(),
        }
    }
}

/// Coerce the first column of a result into `T`. A missing value reads as
/// NULL, so only `Option<T>` targets accept it.
pub fn scalar<T: FromValue>(value: Option<Value>) -> Result<T> {
    T::from_value(value.unwrap_or(Value::Null))
}

/// First column of a row as `T`
pub fn first_column<T: FromValue>(row: Row) -> Result<T> {
    scalar(row.into_values().into_iter().next())
}

/// Column-to-member plan for one result set.
///
/// Columns are matched to members by name ignoring case, then by mapped
/// column name. Columns matching neither are skipped.
pub struct EntityReader<E> {
    slots: Vec<Option<Arc<Accessor<E>>>>,
}

impl<E: Entity> EntityReader<E> {
    pub fn new(catalog: &Catalog, columns: &[String]) -> Result<Self> {
        let info = catalog.entity::<E>()?;
        let slots = columns
            .iter()
            .map(|column| match info.resolve_result_column(column) {
                Some(member) => catalog.accessor::<E>(&member.name).map(Some),
                None => Ok(None),
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { slots })
    }

    /// Fresh entity with every non-NULL mapped column assigned
    pub fn read(&self, row: Row) -> Result<E> {
        let mut entity = E::default();
        for (slot, value) in self.slots.iter().zip(row.into_values()) {
            let Some(accessor) = slot else { continue };
            if value.is_null() {
                continue;
            }
            accessor.set(&mut entity, value)?;
        }
        Ok(entity)
    }
}
