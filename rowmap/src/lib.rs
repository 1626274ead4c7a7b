//! Rowmap - typed CRUD and predicate queries over SQL databases
//!
//! Declare how an entity maps to a table once, then insert, update, delete
//! and query it through a [`Session`] without writing SQL by hand:
//!
//! ```no_run
//! use rowmap::sqlite::SqliteDatabase;
//! use rowmap::{field, Entity, Mapping, OrderBy, Session};
//!
//! #[derive(Debug, Default)]
//! struct Book {
//!     id: i64,
//!     title: String,
//!     pages: i32,
//! }
//!
//! impl Entity for Book {
//!     fn mapping() -> Mapping<Self> {
//!         Mapping::<Self>::table("BOOKS")
//!             .auto_key("id", "BOOK_ID", |b| &b.id, |b| &mut b.id)
//!             .field("title", |b| &b.title, |b| &mut b.title)
//!             .field("pages", |b| &b.pages, |b| &mut b.pages)
//!     }
//! }
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//! let mut session = Session::new(SqliteDatabase::in_memory()?);
//! session.execute_sql(
//!     "CREATE TABLE BOOKS (BOOK_ID INTEGER PRIMARY KEY, title TEXT, pages INTEGER)",
//!     &[],
//! )?;
//! session.insert(&Book { id: 0, title: "Dune".into(), pages: 412 })?;
//! let long: Vec<Book> = session.select_where(
//!     Some(&field("pages").gt(300)),
//!     Some(&OrderBy::new().asc("title")),
//! )?;
//! # Ok(())
//! # }
//! ```

pub use rowmap_core::*;

#[cfg(feature = "sqlite")]
pub mod sqlite;
