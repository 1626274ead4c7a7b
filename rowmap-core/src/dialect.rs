//! Per-engine SQL differences

use crate::Value;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

/// Supported database engines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DatabaseKind {
    SqlServer,
    Oracle,
    MySql,
    PostgreSql,
    Sqlite,
}

impl Display for DatabaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DatabaseKind::SqlServer => "SQL Server",
            DatabaseKind::Oracle => "Oracle",
            DatabaseKind::MySql => "MySQL",
            DatabaseKind::PostgreSql => "PostgreSQL",
            DatabaseKind::Sqlite => "SQLite",
        };
        f.write_str(name)
    }
}

/// Engine specific pieces of SQL text.
///
/// Implementations are stateless; `dialect_for` hands out shared instances.
pub trait Dialect: Send + Sync {
    fn kind(&self) -> DatabaseKind;

    /// Marker placed before every parameter name
    fn parameter_prefix(&self) -> &'static str {
        "@"
    }

    /// SQL appended to an INSERT so that the same round trip returns the
    /// generated key
    fn identity_select(&self, table: &str) -> String;

    /// Wrap `inner` so that only rows in `(start, end]` are returned.
    /// `order` is the bare ORDER BY list, without the keyword.
    fn paginate(&self, inner: &str, order: Option<&str>, start: u64, end: u64) -> String;

    /// Text following an ORDER BY list
    fn order_suffix(&self) -> &'static str {
        ""
    }

    /// Whether booleans are bound as booleans rather than 0/1
    fn native_boolean(&self) -> bool {
        false
    }

    fn statement_terminator(&self) -> &'static str {
        ";"
    }

    /// Value in the form it is bound on this engine
    fn encode(&self, value: Value) -> Value {
        if self.native_boolean() {
            value
        } else {
            value.encode_bool()
        }
    }

    /// ` ORDER BY <order><suffix>`, or nothing when there is no order
    fn order_clause(&self, order: Option<&str>) -> String {
        match order.map(str::trim).filter(|o| !o.is_empty()) {
            Some(order) => format!(" ORDER BY {}{}", order, self.order_suffix()),
            None => String::new(),
        }
    }
}

pub struct SqlServerDialect;

impl Dialect for SqlServerDialect {
    fn kind(&self) -> DatabaseKind {
        DatabaseKind::SqlServer
    }

    fn identity_select(&self, _table: &str) -> String {
        "; SELECT SCOPE_IDENTITY()".to_string()
    }

    fn paginate(&self, inner: &str, order: Option<&str>, start: u64, end: u64) -> String {
        let order = order
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .unwrap_or("(SELECT 0)");
        format!(
            "SELECT * FROM (SELECT ROW_NUMBER() OVER(ORDER BY {}) rn, tt1.* FROM ({}) tt1) tt2 WHERE rn > {} AND rn <= {}",
            order, inner, start, end
        )
    }
}

pub struct OracleDialect;

impl Dialect for OracleDialect {
    fn kind(&self) -> DatabaseKind {
        DatabaseKind::Oracle
    }

    fn parameter_prefix(&self) -> &'static str {
        ":"
    }

    fn identity_select(&self, table: &str) -> String {
        format!("; SELECT {}_SEQ.CURRVAL FROM DUAL", table)
    }

    fn paginate(&self, inner: &str, order: Option<&str>, start: u64, end: u64) -> String {
        format!(
            "SELECT * FROM (SELECT tt1.*, ROWNUM rn FROM ({}{}) tt1 WHERE ROWNUM <= {}) tt2 WHERE rn > {}",
            inner,
            self.order_clause(order),
            end,
            start
        )
    }

    fn order_suffix(&self) -> &'static str {
        " NULLS LAST"
    }
}

pub struct MySqlDialect;

impl Dialect for MySqlDialect {
    fn kind(&self) -> DatabaseKind {
        DatabaseKind::MySql
    }

    fn identity_select(&self, _table: &str) -> String {
        "; SELECT LAST_INSERT_ID()".to_string()
    }

    fn paginate(&self, inner: &str, order: Option<&str>, start: u64, end: u64) -> String {
        format!(
            "{}{} LIMIT {}, {}",
            inner,
            self.order_clause(order),
            start,
            end.saturating_sub(start)
        )
    }
}

pub struct PostgreSqlDialect;

impl Dialect for PostgreSqlDialect {
    fn kind(&self) -> DatabaseKind {
        DatabaseKind::PostgreSql
    }

    fn identity_select(&self, _table: &str) -> String {
        "; SELECT LASTVAL()".to_string()
    }

    fn paginate(&self, inner: &str, order: Option<&str>, start: u64, end: u64) -> String {
        limit_offset(inner, &self.order_clause(order), start, end)
    }

    fn native_boolean(&self) -> bool {
        true
    }
}

pub struct SqliteDialect;

impl Dialect for SqliteDialect {
    fn kind(&self) -> DatabaseKind {
        DatabaseKind::Sqlite
    }

    fn identity_select(&self, _table: &str) -> String {
        "; SELECT last_insert_rowid()".to_string()
    }

    fn paginate(&self, inner: &str, order: Option<&str>, start: u64, end: u64) -> String {
        limit_offset(inner, &self.order_clause(order), start, end)
    }
}

fn limit_offset(inner: &str, order_clause: &str, start: u64, end: u64) -> String {
    format!(
        "{}{} LIMIT {} OFFSET {}",
        inner,
        order_clause,
        end.saturating_sub(start),
        start
    )
}

/// Shared dialect instance for an engine
pub fn dialect_for(kind: DatabaseKind) -> &'static dyn Dialect {
    match kind {
        DatabaseKind::SqlServer => &SqlServerDialect,
        DatabaseKind::Oracle => &OracleDialect,
        DatabaseKind::MySql => &MySqlDialect,
        DatabaseKind::PostgreSql => &PostgreSqlDialect,
        DatabaseKind::Sqlite => &SqliteDialect,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INNER: &str = "SELECT ID, NAME FROM T_USER";

    #[test]
    fn test_dialect_for_kind() {
        for kind in [
            DatabaseKind::SqlServer,
            DatabaseKind::Oracle,
            DatabaseKind::MySql,
            DatabaseKind::PostgreSql,
            DatabaseKind::Sqlite,
        ] {
            assert_eq!(dialect_for(kind).kind(), kind);
        }
    }

    #[test]
    fn test_parameter_prefixes() {
        assert_eq!(dialect_for(DatabaseKind::Oracle).parameter_prefix(), ":");
        assert_eq!(dialect_for(DatabaseKind::SqlServer).parameter_prefix(), "@");
        assert_eq!(dialect_for(DatabaseKind::Sqlite).parameter_prefix(), "@");
    }

    #[test]
    fn test_identity_select() {
        assert_eq!(
            SqlServerDialect.identity_select("T_USER"),
            "; SELECT SCOPE_IDENTITY()"
        );
        assert_eq!(
            OracleDialect.identity_select("T_USER"),
            "; SELECT T_USER_SEQ.CURRVAL FROM DUAL"
        );
        assert_eq!(
            SqliteDialect.identity_select("T_USER"),
            "; SELECT last_insert_rowid()"
        );
    }

    #[test]
    fn test_oracle_rownum_window() {
        let sql = OracleDialect.paginate(INNER, Some("NAME ASC"), 10, 20);
        assert_eq!(
            sql,
            "SELECT * FROM (SELECT tt1.*, ROWNUM rn FROM (SELECT ID, NAME FROM T_USER ORDER BY NAME ASC NULLS LAST) tt1 WHERE ROWNUM <= 20) tt2 WHERE rn > 10"
        );
    }

    #[test]
    fn test_sql_server_window_without_order() {
        let sql = SqlServerDialect.paginate(INNER, None, 0, 10);
        assert_eq!(
            sql,
            "SELECT * FROM (SELECT ROW_NUMBER() OVER(ORDER BY (SELECT 0)) rn, tt1.* FROM (SELECT ID, NAME FROM T_USER) tt1) tt2 WHERE rn > 0 AND rn <= 10"
        );
    }

    #[test]
    fn test_limit_forms() {
        assert_eq!(
            MySqlDialect.paginate(INNER, Some("ID DESC"), 20, 30),
            "SELECT ID, NAME FROM T_USER ORDER BY ID DESC LIMIT 20, 10"
        );
        assert_eq!(
            SqliteDialect.paginate(INNER, Some("  "), 20, 30),
            "SELECT ID, NAME FROM T_USER LIMIT 10 OFFSET 20"
        );
        assert_eq!(
            PostgreSqlDialect.paginate(INNER, Some("ID"), 0, 5),
            "SELECT ID, NAME FROM T_USER ORDER BY ID LIMIT 5 OFFSET 0"
        );
    }

    #[test]
    fn test_boolean_encoding() {
        assert!(PostgreSqlDialect.native_boolean());
        assert!(!SqlServerDialect.native_boolean());
        assert!(!OracleDialect.native_boolean());
        assert_eq!(OracleDialect.encode(Value::Bool(false)), Value::I32(0));
        assert_eq!(PostgreSqlDialect.encode(Value::Bool(false)), Value::Bool(false));
    }
}
