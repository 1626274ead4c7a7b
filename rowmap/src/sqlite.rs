//! SQLite gateway backed by sqlx.
//!
//! Statements arrive with named placeholders (`@name`). They are rewritten
//! to positional `?` markers and the values bound in order of appearance,
//! so a name used twice is bound twice.
//!
//! A statement that runs past its command timeout is dropped while the
//! driver is still working on it. The connection may then be inside a
//! half-finished statement or an implicit transaction, so the gateway is
//! marked abandoned: every later call fails and a new gateway has to be
//! opened.

use rowmap_core::{BoxError, Database, DatabaseKind, IsolationLevel, Parameter, RowCursor, Value, VecCursor};
use sqlx::query::Query;
use sqlx::sqlite::{SqliteArguments, SqliteConnection, SqliteRow};
use sqlx::{Column, Connection, Executor, Row as _, Sqlite, TypeInfo, ValueRef};
use std::future::Future;
use std::time::Duration;
use tokio::runtime::Runtime;

/// Single SQLite connection driven by a private current-thread runtime
pub struct SqliteDatabase {
    runtime: Runtime,
    conn: SqliteConnection,
    in_tx: bool,
    abandoned: bool,
}

impl SqliteDatabase {
    /// Connect to `url`, e.g. `sqlite::memory:` or `sqlite://app.db?mode=rwc`
    pub fn open(url: &str) -> Result<Self, BoxError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let conn = runtime.block_on(SqliteConnection::connect(url))?;
        log::debug!("connected to {}", url);
        Ok(Self {
            runtime,
            conn,
            in_tx: false,
            abandoned: false,
        })
    }

    /// Private in-memory database
    pub fn in_memory() -> Result<Self, BoxError> {
        Self::open("sqlite::memory:")
    }

    /// True once a statement has timed out on this connection
    pub fn is_abandoned(&self) -> bool {
        self.abandoned
    }

    fn ensure_usable(&self) -> Result<(), BoxError> {
        if self.abandoned {
            return Err("connection abandoned after a statement timeout".into());
        }
        Ok(())
    }

    fn settle<T>(
        &mut self,
        outcome: Option<Result<T, sqlx::Error>>,
        timeout: Option<Duration>,
    ) -> Result<T, BoxError> {
        match outcome {
            Some(result) => result.map_err(BoxError::from),
            None => {
                let limit = timeout.unwrap_or_default();
                log::warn!("statement timed out after {:?}, abandoning connection", limit);
                self.abandoned = true;
                self.in_tx = false;
                Err(format!("statement timed out after {:?}", limit).into())
            }
        }
    }

    fn raw(&mut self, sql: &str) -> Result<(), BoxError> {
        self.ensure_usable()?;
        let conn = &mut self.conn;
        let outcome = block_on(&self.runtime, None, async move { conn.execute(sql).await });
        self.settle(outcome, None)?;
        Ok(())
    }

    fn fetch(
        &mut self,
        sql: &str,
        params: &[Parameter],
        timeout: Option<Duration>,
    ) -> Result<Vec<SqliteRow>, BoxError> {
        self.ensure_usable()?;
        let (sql, values) = positional(sql, self.parameter_prefix(), params)?;
        let conn = &mut self.conn;
        let outcome = block_on(&self.runtime, timeout, async move {
            bind_values_to_query(sqlx::query(&sql), &values)
                .fetch_all(conn)
                .await
        });
        self.settle(outcome, timeout)
    }
}

impl Database for SqliteDatabase {
    fn kind(&self) -> DatabaseKind {
        DatabaseKind::Sqlite
    }

    fn execute_non_query(
        &mut self,
        sql: &str,
        params: &[Parameter],
        timeout: Option<Duration>,
    ) -> Result<u64, BoxError> {
        self.ensure_usable()?;
        let (sql, values) = positional(sql, self.parameter_prefix(), params)?;
        let conn = &mut self.conn;
        let outcome = block_on(&self.runtime, timeout, async move {
            bind_values_to_query(sqlx::query(&sql), &values)
                .execute(conn)
                .await
        });
        Ok(self.settle(outcome, timeout)?.rows_affected())
    }

    fn execute_scalar(
        &mut self,
        sql: &str,
        params: &[Parameter],
        timeout: Option<Duration>,
    ) -> Result<Option<Value>, BoxError> {
        let rows = self.fetch(sql, params, timeout)?;
        match rows.last() {
            Some(row) if !row.columns().is_empty() => Ok(Some(read_value(row, 0)?)),
            _ => Ok(None),
        }
    }

    fn execute_reader(
        &mut self,
        sql: &str,
        params: &[Parameter],
        timeout: Option<Duration>,
    ) -> Result<Box<dyn RowCursor + '_>, BoxError> {
        let rows = self.fetch(sql, params, timeout)?;
        let columns: Vec<String> = rows
            .first()
            .map(|row| row.columns().iter().map(|c| c.name().to_string()).collect())
            .unwrap_or_default();
        let values = rows
            .iter()
            .map(|row| (0..row.len()).map(|i| read_value(row, i)).collect())
            .collect::<Result<Vec<Vec<Value>>, BoxError>>()?;
        Ok(Box::new(VecCursor::new(columns, values)))
    }

    fn begin(&mut self, isolation: Option<IsolationLevel>) -> Result<(), BoxError> {
        // SQLite only distinguishes deferred and immediate locking
        let sql = match isolation {
            Some(IsolationLevel::Serializable) => "BEGIN IMMEDIATE",
            _ => "BEGIN",
        };
        self.raw(sql)?;
        self.in_tx = true;
        Ok(())
    }

    fn commit(&mut self) -> Result<(), BoxError> {
        self.raw("COMMIT")?;
        self.in_tx = false;
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), BoxError> {
        let result = self.raw("ROLLBACK");
        self.in_tx = false;
        result
    }

    fn in_transaction(&self) -> bool {
        self.in_tx
    }
}

/// Drive `future` on the private runtime. `None` when `timeout` elapsed first.
fn block_on<T, F>(
    runtime: &Runtime,
    timeout: Option<Duration>,
    future: F,
) -> Option<Result<T, sqlx::Error>>
where
    F: Future<Output = Result<T, sqlx::Error>>,
{
    runtime.block_on(async move {
        match timeout {
            Some(limit) => tokio::time::timeout(limit, future).await.ok(),
            None => Some(future.await),
        }
    })
}

/// Rewrite `{prefix}name` placeholders into `?` and collect the matching
/// values in order. Quoted text is left untouched.
fn positional(sql: &str, prefix: &str, params: &[Parameter]) -> Result<(String, Vec<Value>), BoxError> {
    let Some(marker) = prefix.chars().next() else {
        return Ok((sql.to_string(), params.iter().map(|p| p.value.clone()).collect()));
    };
    let mut out = String::with_capacity(sql.len());
    let mut values = Vec::new();
    let mut quote: Option<char> = None;
    let mut chars = sql.char_indices().peekable();

    while let Some((at, c)) = chars.next() {
        if let Some(q) = quote {
            out.push(c);
            if c == q {
                quote = None;
            }
            continue;
        }
        if c == '\'' || c == '"' {
            quote = Some(c);
            out.push(c);
            continue;
        }
        let starts_name = chars
            .peek()
            .map_or(false, |(_, next)| next.is_ascii_alphabetic() || *next == '_');
        if c != marker || !starts_name {
            out.push(c);
            continue;
        }

        let start = at + c.len_utf8();
        let mut end = start;
        while let Some((i, next)) = chars.peek().copied() {
            if next.is_ascii_alphanumeric() || next == '_' {
                end = i + next.len_utf8();
                chars.next();
            } else {
                break;
            }
        }
        let name = &sql[start..end];
        let param = params
            .iter()
            .find(|p| p.name == name)
            .ok_or_else(|| format!("no value supplied for parameter '{}{}'", marker, name))?;
        out.push('?');
        values.push(param.value.clone());
    }
    Ok((out, values))
}

fn bind_values_to_query<'q>(
    mut query: Query<'q, Sqlite, SqliteArguments<'q>>,
    params: &[Value],
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    for param in params {
        query = match param {
            Value::Null => query.bind(None::<i64>),
            Value::Bool(b) => query.bind(*b),
            Value::I32(i) => query.bind(*i),
            Value::I64(i) => query.bind(*i),
            Value::F32(f) => query.bind(*f),
            Value::F64(f) => query.bind(*f),
            Value::String(s) => query.bind(s.clone()),
            Value::Bytes(b) => query.bind(b.clone()),
            Value::Json(j) => query.bind(j.to_string()),
            Value::Array(_) => query.bind(rowmap_core::row::value_to_json(param).to_string()),
            // timestamps, decimals and uuids are stored as text
            other => query.bind(other.to_string()),
        };
    }
    query
}

/// Column `index` of `row` by its storage class
fn read_value(row: &SqliteRow, index: usize) -> Result<Value, BoxError> {
    let raw = row.try_get_raw(index)?;
    if raw.is_null() {
        return Ok(Value::Null);
    }
    let storage = raw.type_info().name().to_ascii_uppercase();
    let value = match storage.as_str() {
        "INTEGER" | "INT" | "INT8" | "BIGINT" | "BOOLEAN" => Value::I64(row.try_get_unchecked::<i64, _>(index)?),
        "REAL" | "FLOAT" | "DOUBLE" | "NUMERIC" => Value::F64(row.try_get_unchecked::<f64, _>(index)?),
        "BLOB" => Value::Bytes(row.try_get_unchecked::<Vec<u8>, _>(index)?),
        _ => Value::String(row.try_get_unchecked::<String, _>(index)?),
    };
    Ok(value)
}
