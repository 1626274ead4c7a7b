//! Application-facing operations over one database gateway

use crate::entity::Catalog;
use crate::expr::{OrderBy, Predicate, Projection, SelectKind, UpdateSet};
use crate::gateway::{Database, IsolationLevel, Parameter};
use crate::materialize::{first_column, scalar, Dynamic, EntityReader};
use crate::options::Options;
use crate::row::Row;
use crate::statement::{page_window, PageWindow, Statement, StatementBuilder};
use crate::{BoxError, Entity, Error, FromValue, Result, Value};
use std::sync::Arc;

const RAW_SQL: &str = "sql";

/// Outcome of a single insert
#[derive(Debug, Clone, PartialEq)]
pub enum Inserted {
    /// Rows written, for types without a generated key
    Affected(u64),
    /// Key generated by the database
    Generated(Value),
}

impl Inserted {
    pub fn affected(&self) -> u64 {
        match self {
            Inserted::Affected(rows) => *rows,
            Inserted::Generated(_) => 1,
        }
    }

    pub fn generated(&self) -> Option<&Value> {
        match self {
            Inserted::Generated(value) => Some(value),
            Inserted::Affected(_) => None,
        }
    }
}

/// One page of results and the normalized paging figures
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub rows: Vec<T>,
    pub record_count: u64,
    pub page_count: u64,
    pub page_index: u64,
    pub page_size: u64,
}

impl<T> Page<T> {
    fn new(rows: Vec<T>, window: &PageWindow) -> Self {
        Self {
            rows,
            record_count: window.record_count,
            page_count: window.page_count,
            page_index: window.page_index,
            page_size: window.page_size,
        }
    }
}

/// Typed CRUD and query operations for mapped entities.
///
/// ```no_run
/// # use rowmap_core::{Database, Entity, Mapping, Session, Result};
/// # use rowmap_core::expr::field;
/// # #[derive(Default)]
/// # struct User { id: i64, name: String }
/// # impl Entity for User {
/// #     fn mapping() -> Mapping<Self> {
/// #         Mapping::<Self>::table("T_USER")
/// #             .auto_key("id", "USER_ID", |u| &u.id, |u| &mut u.id)
/// #             .field("name", |u| &u.name, |u| &mut u.name)
/// #     }
/// # }
/// # fn demo<D: Database>(db: D) -> Result<()> {
/// let mut session = Session::new(db);
/// session.insert(&User { id: 0, name: "ann".into() })?;
/// let found: Vec<User> = session.select_where(Some(&field("name").eq("ann")), None)?;
/// # Ok(())
/// # }
/// ```
pub struct Session<D: Database> {
    db: D,
    catalog: Arc<Catalog>,
    options: Options,
}

impl<D: Database> Session<D> {
    /// Session with a catalog of its own
    pub fn new(db: D) -> Self {
        Self::with_catalog(db, Catalog::shared())
    }

    /// Session sharing `catalog` with other sessions
    pub fn with_catalog(db: D, catalog: Arc<Catalog>) -> Self {
        Self {
            db,
            catalog,
            options: Options::default(),
        }
    }

    pub fn with_options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn database(&self) -> &D {
        &self.db
    }

    pub fn database_mut(&mut self) -> &mut D {
        &mut self.db
    }

    pub fn into_database(self) -> D {
        self.db
    }

    fn build<T>(&self, f: impl FnOnce(StatementBuilder<'_>) -> Result<T>) -> Result<T> {
        f(StatementBuilder::new(&self.catalog, self.db.dialect()))
    }

    // ----- writes -----

    /// Insert one entity. Types with a generated key report it back.
    pub fn insert<E: Entity>(&mut self, entity: &E) -> Result<Inserted> {
        let info = self.catalog.entity::<E>()?;
        let statement = self.build(|b| b.insert(entity))?;
        if info.auto_key().is_some() {
            let key = self.scalar_value("insert", info.entity(), statement)?;
            Ok(Inserted::Generated(key.unwrap_or(Value::Null)))
        } else {
            self.non_query("insert", info.entity(), statement).map(Inserted::Affected)
        }
    }

    /// Insert one entity and write the generated key, if any, back into it
    pub fn insert_assign<E: Entity>(&mut self, entity: &mut E) -> Result<Inserted> {
        let inserted = self.insert(&*entity)?;
        if let Inserted::Generated(key) = &inserted {
            let info = self.catalog.entity::<E>()?;
            if let Some(member) = info.auto_key() {
                if !key.is_null() {
                    self.catalog.accessor::<E>(&member.name)?.set(entity, key.clone())?;
                }
            }
        }
        Ok(inserted)
    }

    /// Insert in chunks of `Options::batch_size`; returns rows written
    pub fn insert_batch<E: Entity>(&mut self, entities: &[E]) -> Result<u64> {
        let size = self.options.batch_size;
        let statements = self.build(|b| b.insert_batch(entities, size))?;
        self.run_batch::<E>("insert_batch", statements)
    }

    pub fn update<E: Entity>(&mut self, entity: &E) -> Result<u64> {
        let statement = self.build(|b| b.update(entity))?;
        self.non_query("update", E::entity_name(), statement)
    }

    pub fn update_where<E: Entity>(&mut self, entity: &E, predicate: Option<&Predicate>) -> Result<u64> {
        let statement = self.build(|b| b.update_where(entity, predicate))?;
        self.non_query("update_where", E::entity_name(), statement)
    }

    pub fn update_set<E: Entity>(
        &mut self,
        set: &UpdateSet,
        predicate: Option<&Predicate>,
    ) -> Result<u64> {
        let statement = self.build(|b| b.update_set::<E>(set, predicate))?;
        self.non_query("update_set", E::entity_name(), statement)
    }

    pub fn update_fields<E: Entity>(
        &mut self,
        entity: &E,
        fields: &[&str],
        predicate: Option<&Predicate>,
    ) -> Result<u64> {
        let statement = self.build(|b| b.update_fields(entity, fields, predicate))?;
        self.non_query("update_fields", E::entity_name(), statement)
    }

    pub fn update_ignoring<E: Entity>(
        &mut self,
        entity: &E,
        ignored: &[&str],
        predicate: Option<&Predicate>,
    ) -> Result<u64> {
        let statement = self.build(|b| b.update_ignoring(entity, ignored, predicate))?;
        self.non_query("update_ignoring", E::entity_name(), statement)
    }

    pub fn update_batch<E: Entity>(&mut self, entities: &[E]) -> Result<u64> {
        let size = self.options.batch_size;
        let statements = self.build(|b| b.update_batch(entities, size))?;
        self.run_batch::<E>("update_batch", statements)
    }

    pub fn delete<E: Entity>(&mut self, entity: &E) -> Result<u64> {
        let statement = self.build(|b| b.delete(entity))?;
        self.non_query("delete", E::entity_name(), statement)
    }

    pub fn delete_where<E: Entity>(&mut self, predicate: Option<&Predicate>) -> Result<u64> {
        let statement = self.build(|b| b.delete_where::<E>(predicate))?;
        self.non_query("delete_where", E::entity_name(), statement)
    }

    pub fn delete_batch<E: Entity>(&mut self, entities: &[E]) -> Result<u64> {
        let size = self.options.batch_size;
        let statements = self.build(|b| b.delete_batch(entities, size))?;
        self.run_batch::<E>("delete_batch", statements)
    }

    // ----- reads -----

    /// Entities matching `predicate` (all rows when absent)
    pub fn select_where<E: Entity>(
        &mut self,
        predicate: Option<&Predicate>,
        order: Option<&OrderBy>,
    ) -> Result<Vec<E>> {
        let statement = self.build(|b| b.select::<E>(predicate, order))?;
        self.entities("select_where", statement)
    }

    /// First entity in `order` matching `predicate`
    pub fn first<E: Entity>(&mut self, predicate: Option<&Predicate>, order: Option<&OrderBy>) -> Result<Option<E>> {
        let statement = self.build(|b| {
            let inner = b.select::<E>(predicate, None)?;
            let order = order.map(|o| b.order_text::<E>(o)).transpose()?;
            let window = page_window(1, 1, 1, 1);
            Ok(b.page_rows(&inner, order.as_deref(), &window))
        })?;
        Ok(self.entities("first", statement)?.into_iter().next())
    }

    /// First projected column of every matching row
    pub fn select_fields<E: Entity, T: FromValue>(
        &mut self,
        predicate: Option<&Predicate>,
        projection: &Projection,
    ) -> Result<Vec<T>> {
        let statement = self.build(|b| b.select_projection::<E>(predicate, projection, SelectKind::Rows))?;
        let (_, rows) = self.rows("select_fields", E::entity_name(), statement)?;
        rows.into_iter().map(first_column).collect()
    }

    /// Projected rows as scalars or records
    pub fn select_dynamic<E: Entity>(
        &mut self,
        predicate: Option<&Predicate>,
        projection: &Projection,
        kind: SelectKind,
    ) -> Result<Vec<Dynamic>> {
        let statement = self.build(|b| b.select_projection::<E>(predicate, projection, kind))?;
        let (_, rows) = self.rows("select_dynamic", E::entity_name(), statement)?;
        Ok(rows.into_iter().map(Dynamic::from_row).collect())
    }

    /// Single value of a MAX, MIN, COUNT or DISTINCT projection
    pub fn select_aggregate<E: Entity, T: FromValue>(
        &mut self,
        predicate: Option<&Predicate>,
        projection: &Projection,
        kind: SelectKind,
    ) -> Result<T> {
        let statement = self.build(|b| b.select_projection::<E>(predicate, projection, kind))?;
        let value = self.scalar_value("select_aggregate", E::entity_name(), statement)?;
        scalar(value)
    }

    /// One page of matching entities
    pub fn select_page<E: Entity>(
        &mut self,
        predicate: Option<&Predicate>,
        order: Option<&OrderBy>,
        page_index: i64,
        page_size: i64,
    ) -> Result<Page<E>> {
        let (inner, order) = self.build(|b| {
            let inner = b.select::<E>(predicate, None)?;
            let order = order.map(|o| b.order_text::<E>(o)).transpose()?;
            Ok((inner, order))
        })?;
        let entity = E::entity_name();
        let window = self.window("select_page", entity, &inner, page_index, page_size)?;
        if window.record_count == 0 {
            return Ok(Page::new(Vec::new(), &window));
        }
        let statement = self.build(|b| Ok(b.page_rows(&inner, order.as_deref(), &window)))?;
        let rows = self.entities("select_page", statement)?;
        Ok(Page::new(rows, &window))
    }

    pub fn count<E: Entity>(&mut self, predicate: Option<&Predicate>) -> Result<u64> {
        let statement = self.build(|b| b.count::<E>(predicate))?;
        let value = self.scalar_value("count", E::entity_name(), statement)?;
        count_of(value)
    }

    pub fn exists<E: Entity>(&mut self, predicate: Option<&Predicate>) -> Result<bool> {
        let statement = self.build(|b| b.count::<E>(predicate))?;
        let value = self.scalar_value("exists", E::entity_name(), statement)?;
        Ok(count_of(value)? > 0)
    }

    // ----- raw SQL -----

    pub fn execute_sql(&mut self, sql: &str, params: &[Parameter]) -> Result<u64> {
        self.non_query("execute_sql", RAW_SQL, Statement::new(sql, params.to_vec()))
    }

    pub fn query_rows(&mut self, sql: &str, params: &[Parameter]) -> Result<Vec<Row>> {
        let (_, rows) = self.rows("query_rows", RAW_SQL, Statement::new(sql, params.to_vec()))?;
        Ok(rows)
    }

    /// Raw query materialized into entities
    pub fn query_entities<E: Entity>(&mut self, sql: &str, params: &[Parameter]) -> Result<Vec<E>> {
        self.entities("query_entities", Statement::new(sql, params.to_vec()))
    }

    pub fn query_scalar<T: FromValue>(&mut self, sql: &str, params: &[Parameter]) -> Result<T> {
        let value = self.scalar_value("query_scalar", RAW_SQL, Statement::new(sql, params.to_vec()))?;
        scalar(value)
    }

    /// Page of a raw query. `order` is a bare ORDER BY list in column terms.
    pub fn query_page(
        &mut self,
        sql: &str,
        params: &[Parameter],
        order: Option<&str>,
        page_index: i64,
        page_size: i64,
    ) -> Result<Page<Row>> {
        let inner = Statement::new(sql, params.to_vec());
        let window = self.window("query_page", RAW_SQL, &inner, page_index, page_size)?;
        if window.record_count == 0 {
            return Ok(Page::new(Vec::new(), &window));
        }
        let statement = self.build(|b| Ok(b.page_rows(&inner, order, &window)))?;
        let (_, rows) = self.rows("query_page", RAW_SQL, statement)?;
        Ok(Page::new(rows, &window))
    }

    // ----- transactions -----

    pub fn begin(&mut self) -> Result<()> {
        self.start(None)
    }

    pub fn begin_with_isolation(&mut self, isolation: IsolationLevel) -> Result<()> {
        self.start(Some(isolation))
    }

    pub fn commit(&mut self) -> Result<()> {
        if !self.db.in_transaction() {
            return Err(Error::transaction("commit without an active transaction"));
        }
        log::debug!("commit");
        self.db.commit().map_err(|e| gateway_error("commit", RAW_SQL, e))
    }

    pub fn rollback(&mut self) -> Result<()> {
        if !self.db.in_transaction() {
            return Err(Error::transaction("rollback without an active transaction"));
        }
        log::debug!("rollback");
        self.db.rollback().map_err(|e| gateway_error("rollback", RAW_SQL, e))
    }

    pub fn in_transaction(&self) -> bool {
        self.db.in_transaction()
    }

    /// Run `f` inside a transaction: committed when it returns `Ok`, rolled
    /// back when it returns `Err`
    pub fn transaction<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Self) -> Result<T>,
    {
        self.begin()?;
        match f(self) {
            Ok(value) => {
                self.commit()?;
                Ok(value)
            }
            Err(error) => {
                if self.db.in_transaction() {
                    if let Err(rollback) = self.rollback() {
                        log::warn!("rollback after failed transaction also failed: {}", rollback);
                    }
                }
                Err(error)
            }
        }
    }

    fn start(&mut self, isolation: Option<IsolationLevel>) -> Result<()> {
        if self.db.in_transaction() {
            return Err(Error::transaction("a transaction is already active"));
        }
        log::debug!("begin {}", isolation.map(|i| i.to_sql()).unwrap_or("transaction"));
        self.db
            .begin(isolation)
            .map_err(|e| gateway_error("begin", RAW_SQL, e))
    }

    // ----- execution -----

    fn run_batch<E: Entity>(&mut self, operation: &'static str, statements: Vec<Statement>) -> Result<u64> {
        let entity = E::entity_name();
        let atomic = self.options.atomic_batches && statements.len() > 1 && !self.db.in_transaction();
        if atomic {
            self.start(None)?;
        }

        let mut affected = 0;
        for statement in statements {
            match self.non_query(operation, entity, statement) {
                Ok(rows) => affected += rows,
                Err(error) => {
                    if atomic {
                        log::warn!("{} on {} failed, rolling back the batch", operation, entity);
                        if let Err(rollback) = self.rollback() {
                            log::warn!("batch rollback failed: {}", rollback);
                        }
                    }
                    return Err(error);
                }
            }
        }

        if atomic {
            self.commit()?;
        }
        Ok(affected)
    }

    fn window(
        &mut self,
        operation: &'static str,
        entity: &str,
        inner: &Statement,
        page_index: i64,
        page_size: i64,
    ) -> Result<PageWindow> {
        let statement = self.build(|b| Ok(b.page_count(inner)))?;
        let record_count = count_of(self.scalar_value(operation, entity, statement)?)?;
        Ok(page_window(
            record_count,
            page_index,
            page_size,
            self.options.default_page_size,
        ))
    }

    fn prepare(&self, operation: &str, statement: Statement) -> (String, Vec<Parameter>) {
        log::debug!(
            "{}: {} ({} parameters)",
            operation,
            statement.sql,
            statement.parameters.len()
        );
        let parameters = statement
            .parameters
            .into_iter()
            .map(|p| self.db.make_parameter(&p.name, p.value, p.type_hint))
            .collect();
        (statement.sql, parameters)
    }

    fn non_query(&mut self, operation: &'static str, entity: &str, statement: Statement) -> Result<u64> {
        let (sql, parameters) = self.prepare(operation, statement);
        let timeout = self.options.timeout();
        self.db
            .execute_non_query(&sql, &parameters, timeout)
            .map_err(|e| gateway_error(operation, entity, e))
    }

    fn scalar_value(&mut self, operation: &'static str, entity: &str, statement: Statement) -> Result<Option<Value>> {
        let (sql, parameters) = self.prepare(operation, statement);
        let timeout = self.options.timeout();
        self.db
            .execute_scalar(&sql, &parameters, timeout)
            .map_err(|e| gateway_error(operation, entity, e))
    }

    fn rows(&mut self, operation: &'static str, entity: &str, statement: Statement) -> Result<(Vec<String>, Vec<Row>)> {
        let (sql, parameters) = self.prepare(operation, statement);
        let timeout = self.options.timeout();
        let mut cursor = self
            .db
            .execute_reader(&sql, &parameters, timeout)
            .map_err(|e| gateway_error(operation, entity, e))?;
        let columns = cursor.columns().to_vec();
        let mut rows = Vec::new();
        while let Some(row) = cursor
            .next_row()
            .map_err(|e| gateway_error(operation, entity, e))?
        {
            rows.push(row);
        }
        Ok((columns, rows))
    }

    fn entities<E: Entity>(&mut self, operation: &'static str, statement: Statement) -> Result<Vec<E>> {
        let (columns, rows) = self.rows(operation, E::entity_name(), statement)?;
        let reader = EntityReader::<E>::new(&self.catalog, &columns)?;
        rows.into_iter().map(|row| reader.read(row)).collect()
    }
}

fn gateway_error(operation: &'static str, entity: &str, source: BoxError) -> Error {
    log::error!("{} on {} failed: {}", operation, entity, source);
    Error::data_access(operation, entity, source)
}

fn count_of(value: Option<Value>) -> Result<u64> {
    let count: Option<i64> = scalar(value)?;
    Ok(count.unwrap_or(0).max(0) as u64)
}
