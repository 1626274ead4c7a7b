//! INSERT statements

use super::{batch_suffix, chunks, with_accessors, Statement, StatementBuilder};
use crate::entity::{Accessor, EntityInfo, MemberInfo, MemberKind};
use crate::gateway::Parameter;
use crate::{Entity, Error, Result};
use std::sync::Arc;

impl StatementBuilder<'_> {
    /// INSERT of every non-null column except the generated key. When the type
    /// has a generated key, the dialect's identity query is appended.
    pub fn insert<E: Entity>(&self, entity: &E) -> Result<Statement> {
        let info = self.catalog.entity::<E>()?;
        let members = insertable::<E>(self, &info)?;
        let mut parameters = Vec::new();
        let mut sql = self.insert_one(&info, &members, entity, "", &mut parameters)?;
        if info.auto_key().is_some() {
            sql.push_str(&self.dialect.identity_select(info.table()));
        }
        Ok(Statement::new(sql, parameters))
    }

    /// One statement per chunk of `batch_size` entities. Parameter names carry
    /// the entity's position in `entities`.
    pub fn insert_batch<E: Entity>(&self, entities: &[E], batch_size: usize) -> Result<Vec<Statement>> {
        let info = self.catalog.entity::<E>()?;
        let members = insertable::<E>(self, &info)?;
        let terminator = self.dialect.statement_terminator();

        let mut statements = Vec::new();
        for (offset, chunk) in chunks(entities, batch_size) {
            let mut parameters = Vec::new();
            let mut parts = Vec::with_capacity(chunk.len());
            for (i, entity) in chunk.iter().enumerate() {
                let suffix = batch_suffix(offset + i);
                parts.push(self.insert_one(&info, &members, entity, &suffix, &mut parameters)?);
            }
            statements.push(Statement::new(parts.join(terminator), parameters));
        }
        Ok(statements)
    }

    fn insert_one<E: Entity>(
        &self,
        info: &EntityInfo,
        members: &[(&MemberInfo, Arc<Accessor<E>>)],
        entity: &E,
        suffix: &str,
        parameters: &mut Vec<Parameter>,
    ) -> Result<String> {
        let mut columns = Vec::with_capacity(members.len());
        let mut values = Vec::with_capacity(members.len());
        for (member, accessor) in members {
            let value = accessor.get(entity);
            if value.is_null() {
                continue;
            }
            columns.push(member.column.as_str());
            values.push(self.bind(format!("{}{}", member.name, suffix), value, parameters));
        }
        if columns.is_empty() {
            return Err(Error::mapping(info.entity(), "no column has a value to insert"));
        }
        Ok(format!(
            "INSERT INTO {} ({}) VALUES ({})",
            info.table(),
            columns.join(", "),
            values.join(", ")
        ))
    }
}

fn insertable<'i, E: Entity>(
    builder: &StatementBuilder<'_>,
    info: &'i EntityInfo,
) -> Result<Vec<(&'i MemberInfo, Arc<Accessor<E>>)>> {
    with_accessors::<E>(
        builder.catalog,
        info.column_members().filter(|m| m.kind != MemberKind::AutoKey),
    )
}
