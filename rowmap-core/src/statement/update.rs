//! UPDATE statements

use super::{batch_suffix, chunks, with_accessors, Statement, StatementBuilder};
use crate::entity::{Accessor, EntityInfo, MemberInfo};
use crate::expr::{Predicate, UpdateSet};
use crate::gateway::Parameter;
use crate::visitor::Translator;
use crate::{Entity, Error, Result};
use std::sync::Arc;

impl StatementBuilder<'_> {
    /// Update the non-key columns of `entity`, located by its key
    pub fn update<E: Entity>(&self, entity: &E) -> Result<Statement> {
        let info = self.catalog.entity::<E>()?;
        info.require_keys("update")?;
        let columns = with_accessors::<E>(self.catalog, info.non_key_column_members())?;
        let keys = with_accessors::<E>(self.catalog, info.key_members())?;

        let mut parameters = Vec::new();
        let sql = self.update_one(&info, &columns, &keys, entity, "", &mut parameters)?;
        Ok(Statement::new(sql, parameters))
    }

    /// Update the non-key, non-null columns of `entity` on every row matching
    /// `predicate`
    pub fn update_where<E: Entity>(&self, entity: &E, predicate: Option<&Predicate>) -> Result<Statement> {
        self.update_matching(entity, "update_where", predicate, |_| true)
    }

    /// Like `update_where`, leaving the `ignored` members out of the SET list
    pub fn update_ignoring<E: Entity>(
        &self,
        entity: &E,
        ignored: &[&str],
        predicate: Option<&Predicate>,
    ) -> Result<Statement> {
        self.update_matching(entity, "update_ignoring", predicate, |member| {
            !ignored.iter().any(|i| i.eq_ignore_ascii_case(&member.name))
        })
    }

    /// Assign the listed members of `entity`, nulls included, on every row
    /// matching `predicate`
    pub fn update_fields<E: Entity>(
        &self,
        entity: &E,
        fields: &[&str],
        predicate: Option<&Predicate>,
    ) -> Result<Statement> {
        let info = self.catalog.entity::<E>()?;
        let predicate = predicate.ok_or_else(|| Error::predicate_required(info.entity(), "update_fields"))?;
        if fields.is_empty() {
            return Err(Error::translation("update fields", "no members listed"));
        }
        if let Some(unknown) = fields.iter().find(|f| info.member(f).is_none()) {
            return Err(Error::translation(
                "member reference",
                format!("unknown member '{}' on '{}'", unknown, info.entity()),
            ));
        }
        let members = with_accessors::<E>(
            self.catalog,
            info.column_members()
                .filter(|m| fields.iter().any(|f| f.eq_ignore_ascii_case(&m.name))),
        )?;

        let mut parameters = Vec::new();
        let mut assignments = Vec::with_capacity(members.len());
        for (member, accessor) in &members {
            let value = accessor.get(entity);
            if value.is_null() {
                assignments.push(format!("{}=NULL", member.column));
            } else {
                let placeholder = self.bind(member.name.clone(), value, &mut parameters);
                assignments.push(format!("{}={}", member.column, placeholder));
            }
        }
        if assignments.is_empty() {
            return Err(Error::translation(
                "update fields",
                "only computed members were listed",
            ));
        }

        let mut sql = format!("UPDATE {} SET {}", info.table(), assignments.join(", "));
        self.where_clause(&info, predicate, &mut sql, &mut parameters)?;
        Ok(Statement::new(sql, parameters))
    }

    /// UPDATE driven entirely by expressions
    pub fn update_set<E: Entity>(&self, set: &UpdateSet, predicate: Option<&Predicate>) -> Result<Statement> {
        let info = self.catalog.entity::<E>()?;
        let predicate = predicate.ok_or_else(|| Error::predicate_required(info.entity(), "update_set"))?;

        let mut translator = Translator::new(&info, self.dialect);
        let assignments = translator.update_set(set)?;
        let mut parameters = translator.into_parameters();

        let mut sql = format!("UPDATE {} SET {}", info.table(), assignments);
        self.where_clause(&info, predicate, &mut sql, &mut parameters)?;
        Ok(Statement::new(sql, parameters))
    }

    /// One statement per chunk, each entity located by its key. Fails before
    /// building anything when the type has no key.
    pub fn update_batch<E: Entity>(&self, entities: &[E], batch_size: usize) -> Result<Vec<Statement>> {
        let info = self.catalog.entity::<E>()?;
        info.require_keys("update_batch")?;
        let columns = with_accessors::<E>(self.catalog, info.non_key_column_members())?;
        let keys = with_accessors::<E>(self.catalog, info.key_members())?;
        let terminator = self.dialect.statement_terminator();

        let mut statements = Vec::new();
        for (offset, chunk) in chunks(entities, batch_size) {
            let mut parameters = Vec::new();
            let mut parts = Vec::with_capacity(chunk.len());
            for (i, entity) in chunk.iter().enumerate() {
                let suffix = batch_suffix(offset + i);
                parts.push(self.update_one(&info, &columns, &keys, entity, &suffix, &mut parameters)?);
            }
            statements.push(Statement::new(parts.join(terminator), parameters));
        }
        Ok(statements)
    }

    fn update_one<E: Entity>(
        &self,
        info: &EntityInfo,
        columns: &[(&MemberInfo, Arc<Accessor<E>>)],
        keys: &[(&MemberInfo, Arc<Accessor<E>>)],
        entity: &E,
        suffix: &str,
        parameters: &mut Vec<Parameter>,
    ) -> Result<String> {
        let assignments = self.assignments(info, columns, entity, suffix, parameters)?;
        let condition = self.key_clause(info, keys, entity, suffix, parameters)?;
        Ok(format!("UPDATE {} SET {} WHERE {}", info.table(), assignments, condition))
    }

    fn update_matching<E: Entity>(
        &self,
        entity: &E,
        operation: &'static str,
        predicate: Option<&Predicate>,
        keep: impl Fn(&MemberInfo) -> bool,
    ) -> Result<Statement> {
        let info = self.catalog.entity::<E>()?;
        let predicate = predicate.ok_or_else(|| Error::predicate_required(info.entity(), operation))?;
        let columns = with_accessors::<E>(
            self.catalog,
            info.non_key_column_members().filter(|m| keep(m)),
        )?;

        let mut parameters = Vec::new();
        let assignments = self.assignments(&info, &columns, entity, "", &mut parameters)?;
        let mut sql = format!("UPDATE {} SET {}", info.table(), assignments);
        self.where_clause(&info, predicate, &mut sql, &mut parameters)?;
        Ok(Statement::new(sql, parameters))
    }

    /// `col=@member` for every non-null member
    fn assignments<E: Entity>(
        &self,
        info: &EntityInfo,
        columns: &[(&MemberInfo, Arc<Accessor<E>>)],
        entity: &E,
        suffix: &str,
        parameters: &mut Vec<Parameter>,
    ) -> Result<String> {
        let mut parts = Vec::with_capacity(columns.len());
        for (member, accessor) in columns {
            let value = accessor.get(entity);
            if value.is_null() {
                continue;
            }
            let placeholder = self.bind(format!("{}{}", member.name, suffix), value, parameters);
            parts.push(format!("{}={}", member.column, placeholder));
        }
        if parts.is_empty() {
            return Err(Error::mapping(info.entity(), "no column has a value to update"));
        }
        Ok(parts.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::{user, AuditLog, Membership, User};
    use super::*;
    use crate::dialect::{SqlServerDialect, SqliteDialect};
    use crate::entity::Catalog;
    use crate::expr::field;
    use crate::Value;

    #[test]
    fn test_update_by_key() {
        let catalog = Catalog::new();
        let builder = StatementBuilder::new(&catalog, &SqlServerDialect);
        let statement = builder.update(&user(9, "ann")).unwrap();
        assert_eq!(
            statement.sql,
            "UPDATE T_USER SET USER_NAME=@name, AGE=@age, IS_ACTIVE=@active WHERE USER_ID=@id"
        );
        assert_eq!(statement.parameters.last().unwrap().value, Value::I64(9));
    }

    #[test]
    fn test_update_composite_key() {
        let catalog = Catalog::new();
        let builder = StatementBuilder::new(&catalog, &SqlServerDialect);
        let statement = builder
            .update(&Membership {
                group_id: 1,
                user_id: 2,
                role: Some("owner".into()),
            })
            .unwrap();
        assert_eq!(
            statement.sql,
            "UPDATE T_MEMBERSHIP SET role=@role WHERE GROUP_ID=@group_id AND USER_ID=@user_id"
        );
    }

    #[test]
    fn test_update_keyless_type() {
        let catalog = Catalog::new();
        let builder = StatementBuilder::new(&catalog, &SqlServerDialect);
        let err = builder.update(&AuditLog::default()).unwrap_err();
        assert!(matches!(err, Error::KeyRequired { operation: "update", .. }));
    }

    #[test]
    fn test_update_where_names_do_not_collide() {
        let catalog = Catalog::new();
        let builder = StatementBuilder::new(&catalog, &SqlServerDialect);
        let predicate = field("age").lt(18);
        let statement = builder.update_where(&user(1, "kid"), Some(&predicate)).unwrap();
        assert_eq!(
            statement.sql,
            "UPDATE T_USER SET USER_NAME=@name, AGE=@age, IS_ACTIVE=@active WHERE AGE < @age_1"
        );
        assert_eq!(statement.parameters.len(), 4);
    }

    #[test]
    fn test_predicate_required() {
        let catalog = Catalog::new();
        let builder = StatementBuilder::new(&catalog, &SqlServerDialect);
        let entity = user(1, "a");
        let set = UpdateSet::new().set("age", 1);
        let errors = vec![
            builder.update_where(&entity, None).unwrap_err(),
            builder.update_ignoring(&entity, &["age"], None).unwrap_err(),
            builder.update_fields(&entity, &["age"], None).unwrap_err(),
            builder.update_set::<User>(&set, None).unwrap_err(),
        ];
        for err in errors {
            assert!(matches!(err, Error::PredicateRequired { .. }), "{}", err);
        }
    }

    #[test]
    fn test_update_fields_writes_nulls() {
        let catalog = Catalog::new();
        let builder = StatementBuilder::new(&catalog, &SqlServerDialect);
        let predicate = field("id").eq(3i64);
        let statement = builder
            .update_fields(&user(3, "x"), &["email", "name"], Some(&predicate))
            .unwrap();
        assert_eq!(
            statement.sql,
            "UPDATE T_USER SET USER_NAME=@name, email=NULL WHERE USER_ID = @id"
        );
        assert!(builder
            .update_fields(&user(3, "x"), &["nickname"], Some(&predicate))
            .is_err());
    }

    #[test]
    fn test_update_ignoring() {
        let catalog = Catalog::new();
        let builder = StatementBuilder::new(&catalog, &SqlServerDialect);
        let predicate = field("id").eq(3i64);
        let statement = builder
            .update_ignoring(&user(3, "x"), &["age", "active"], Some(&predicate))
            .unwrap();
        assert_eq!(statement.sql, "UPDATE T_USER SET USER_NAME=@name WHERE USER_ID = @id");
    }

    #[test]
    fn test_update_set_expression() {
        let catalog = Catalog::new();
        let builder = StatementBuilder::new(&catalog, &SqlServerDialect);
        let set = UpdateSet::new().set("age", field("age") + 1);
        let predicate = field("age").ge(65);
        let statement = builder.update_set::<User>(&set, Some(&predicate)).unwrap();
        assert_eq!(
            statement.sql,
            "UPDATE T_USER SET AGE=(AGE + @age) WHERE AGE >= @age_1"
        );
        assert_eq!(statement.parameters[0].value, Value::I32(1));
        assert_eq!(statement.parameters[1].value, Value::I32(65));
    }

    #[test]
    fn test_update_batch() {
        let catalog = Catalog::new();
        let builder = StatementBuilder::new(&catalog, &SqliteDialect);
        let users: Vec<User> = (1..=3).map(|i| user(i, "n")).collect();
        let statements = builder.update_batch(&users, 2).unwrap();
        assert_eq!(statements.len(), 2);
        assert_eq!(
            statements[1].sql,
            "UPDATE T_USER SET USER_NAME=@name_2, AGE=@age_2, IS_ACTIVE=@active_2 WHERE USER_ID=@id_2"
        );
    }

    #[test]
    fn test_update_batch_keyless_fails_before_building() {
        let catalog = Catalog::new();
        let builder = StatementBuilder::new(&catalog, &SqliteDialect);
        let err = builder.update_batch(&[AuditLog::default()], 10).unwrap_err();
        assert!(matches!(err, Error::KeyRequired { operation: "update_batch", .. }));
    }
}
