//! Rowmap Core - typed CRUD and predicate queries without hand-written SQL
//!
//! Entity types declare how their members map to a table. The crate turns
//! those mappings, together with predicate, projection and ordering
//! expressions, into parameterized SQL for the configured dialect and runs
//! it through a [`Database`] gateway.

pub mod dialect;
pub mod entity;
pub mod error;
pub mod expr;
pub mod gateway;
pub mod materialize;
pub mod operator;
pub mod options;
pub mod row;
pub mod session;
pub mod statement;
pub mod value;
pub mod visitor;

// Re-export main types
pub use dialect::{dialect_for, DatabaseKind, Dialect};
pub use entity::{Catalog, Entity, EntityInfo, Mapping, MemberKind};
pub use error::{BoxError, Error, Result};
pub use expr::{field, OrderBy, Predicate, Projection, SelectKind, UpdateSet};
pub use gateway::{Database, IsolationLevel, Parameter, RowCursor, VecCursor};
pub use materialize::Dynamic;
pub use operator::{op, ArithOp, Operator};
pub use options::Options;
pub use row::Row;
pub use session::{Inserted, Page, Session};
pub use statement::{Statement, StatementBuilder};
pub use value::{list, DataType, FromValue, Value};
