//! Database gateway contract
//!
//! The session never talks to a driver directly: everything it sends goes
//! through [`Database`], and everything it reads comes back through a
//! [`RowCursor`].

use crate::dialect::{dialect_for, DatabaseKind, Dialect};
use crate::row::Row;
use crate::value::DataType;
use crate::{BoxError, Value};
use std::sync::Arc;
use std::time::Duration;

/// Named value bound to a statement
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    /// Name without the dialect prefix
    pub name: String,
    pub value: Value,
    pub type_hint: Option<DataType>,
}

impl Parameter {
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            type_hint: None,
        }
    }

    pub fn with_type(mut self, hint: DataType) -> Self {
        self.type_hint = Some(hint);
        self
    }
}

/// Transaction isolation levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IsolationLevel {
    ReadUncommitted,
    ReadCommitted,
    RepeatableRead,
    Serializable,
}

impl IsolationLevel {
    pub fn to_sql(&self) -> &'static str {
        match self {
            IsolationLevel::ReadUncommitted => "READ UNCOMMITTED",
            IsolationLevel::ReadCommitted => "READ COMMITTED",
            IsolationLevel::RepeatableRead => "REPEATABLE READ",
            IsolationLevel::Serializable => "SERIALIZABLE",
        }
    }
}

/// Forward-only result reader. Dropping it releases the underlying result.
pub trait RowCursor {
    fn columns(&self) -> &[String];

    fn next_row(&mut self) -> Result<Option<Row>, BoxError>;
}

/// Cursor over rows already held in memory
pub struct VecCursor {
    columns: Arc<[String]>,
    rows: std::vec::IntoIter<Vec<Value>>,
}

impl VecCursor {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self {
            columns: columns.into(),
            rows: rows.into_iter(),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new(), Vec::new())
    }
}

impl RowCursor for VecCursor {
    fn columns(&self) -> &[String] {
        &self.columns
    }

    fn next_row(&mut self) -> Result<Option<Row>, BoxError> {
        Ok(self
            .rows
            .next()
            .map(|values| Row::new(self.columns.clone(), values)))
    }
}

/// Connection-level operations the mapping layer relies on
pub trait Database {
    fn kind(&self) -> DatabaseKind;

    fn dialect(&self) -> &'static dyn Dialect {
        dialect_for(self.kind())
    }

    fn parameter_prefix(&self) -> &str {
        self.dialect().parameter_prefix()
    }

    /// Final form of a parameter before it is sent. The default encodes
    /// booleans as 0/1 on engines without a native boolean type.
    fn make_parameter(&self, name: &str, value: Value, hint: Option<DataType>) -> Parameter {
        Parameter {
            name: name.to_string(),
            value: self.dialect().encode(value),
            type_hint: hint,
        }
    }

    /// Rows affected, summed over every statement in `sql`
    fn execute_non_query(
        &mut self,
        sql: &str,
        params: &[Parameter],
        timeout: Option<Duration>,
    ) -> Result<u64, BoxError>;

    /// First column of the last row produced, if any
    fn execute_scalar(
        &mut self,
        sql: &str,
        params: &[Parameter],
        timeout: Option<Duration>,
    ) -> Result<Option<Value>, BoxError>;

    fn execute_reader(
        &mut self,
        sql: &str,
        params: &[Parameter],
        timeout: Option<Duration>,
    ) -> Result<Box<dyn RowCursor + '_>, BoxError>;

    fn begin(&mut self, isolation: Option<IsolationLevel>) -> Result<(), BoxError>;

    fn commit(&mut self) -> Result<(), BoxError>;

    fn rollback(&mut self) -> Result<(), BoxError>;

    fn in_transaction(&self) -> bool;
}
