//! SQL assembly for entity operations
//!
//! Everything here is pure: statements are built from the catalog metadata
//! and the dialect, nothing is executed.

mod delete;
mod insert;
mod page;
mod select;
mod update;

pub use page::{count_wrapper, page_window, PageWindow, DEFAULT_PAGE_SIZE};

use crate::dialect::Dialect;
use crate::entity::{Accessor, Catalog, EntityInfo, MemberInfo};
use crate::expr::Predicate;
use crate::gateway::Parameter;
use crate::visitor::Translator;
use crate::{Entity, Error, Result, Value};
use std::sync::Arc;

/// Default number of entities per batch round trip
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// SQL text and the parameters it references
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Statement {
    pub sql: String,
    pub parameters: Vec<Parameter>,
}

impl Statement {
    pub fn new(sql: impl Into<String>, parameters: Vec<Parameter>) -> Self {
        Self {
            sql: sql.into(),
            parameters,
        }
    }
}

/// Builds statements for mapped types
#[derive(Clone, Copy)]
pub struct StatementBuilder<'a> {
    catalog: &'a Catalog,
    dialect: &'a dyn Dialect,
}

impl<'a> StatementBuilder<'a> {
    pub fn new(catalog: &'a Catalog, dialect: &'a dyn Dialect) -> Self {
        Self { catalog, dialect }
    }

    pub fn dialect(&self) -> &'a dyn Dialect {
        self.dialect
    }

    fn bind(&self, name: String, value: Value, parameters: &mut Vec<Parameter>) -> String {
        let placeholder = format!("{}{}", self.dialect.parameter_prefix(), name);
        let value = self.dialect.encode(value);
        parameters.push(Parameter {
            name,
            type_hint: value.data_type(),
            value,
        });
        placeholder
    }

    /// `k1=@k1 AND k2=@k2` for the key members of `entity`
    fn key_clause<E: Entity>(
        &self,
        info: &EntityInfo,
        keys: &[(&MemberInfo, Arc<Accessor<E>>)],
        entity: &E,
        suffix: &str,
        parameters: &mut Vec<Parameter>,
    ) -> Result<String> {
        let mut parts = Vec::with_capacity(keys.len());
        for (member, accessor) in keys {
            let value = accessor.get(entity);
            if value.is_null() {
                return Err(Error::mapping(
                    info.entity(),
                    format!("key member '{}' has no value", member.name),
                ));
            }
            let placeholder = self.bind(format!("{}{}", member.name, suffix), value, parameters);
            parts.push(format!("{}={}", member.column, placeholder));
        }
        Ok(parts.join(" AND "))
    }

    /// Append ` WHERE <predicate>` translated with names not in `parameters`
    fn where_clause(
        &self,
        info: &EntityInfo,
        predicate: &Predicate,
        sql: &mut String,
        parameters: &mut Vec<Parameter>,
    ) -> Result<()> {
        let mut translator = Translator::new(info, self.dialect)
            .reserve(parameters.iter().map(|p| p.name.as_str()));
        let condition = translator.predicate(predicate)?;
        sql.push_str(" WHERE ");
        sql.push_str(&condition);
        parameters.extend(translator.into_parameters());
        Ok(())
    }

    fn optional_where(
        &self,
        info: &EntityInfo,
        predicate: Option<&Predicate>,
        sql: &mut String,
        parameters: &mut Vec<Parameter>,
    ) -> Result<()> {
        match predicate {
            Some(predicate) => self.where_clause(info, predicate, sql, parameters),
            None => Ok(()),
        }
    }
}

/// Members paired with their accessors, in member order
fn with_accessors<'m, E: Entity>(
    catalog: &Catalog,
    members: impl Iterator<Item = &'m MemberInfo>,
) -> Result<Vec<(&'m MemberInfo, Arc<Accessor<E>>)>> {
    members
        .map(|member| Ok((member, catalog.accessor::<E>(&member.name)?)))
        .collect()
}

/// Split `items` into chunks of at most `batch_size`, keeping each item's
/// position in the full list
/// Parameter-name suffix for the entity at `index` of a batch. The separator
/// keeps `address` at 11 apart from `address1` at 1.
fn batch_suffix(index: usize) -> String {
    format!("_{}", index)
}

fn chunks<E>(items: &[E], batch_size: usize) -> impl Iterator<Item = (usize, &[E])> {
    let size = batch_size.max(1);
    items
        .chunks(size)
        .enumerate()
        .map(move |(i, chunk)| (i * size, chunk))
}
