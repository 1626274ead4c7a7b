//! DELETE statements

use super::{batch_suffix, chunks, with_accessors, Statement, StatementBuilder};
use crate::expr::Predicate;
use crate::{Entity, Error, Result};

impl StatementBuilder<'_> {
    /// Delete the row holding `entity`'s key
    pub fn delete<E: Entity>(&self, entity: &E) -> Result<Statement> {
        let info = self.catalog.entity::<E>()?;
        info.require_keys("delete")?;
        let keys = with_accessors::<E>(self.catalog, info.key_members())?;

        let mut parameters = Vec::new();
        let condition = self.key_clause(&info, &keys, entity, "", &mut parameters)?;
        Ok(Statement::new(
            format!("DELETE FROM {} WHERE {}", info.table(), condition),
            parameters,
        ))
    }

    pub fn delete_where<E: Entity>(&self, predicate: Option<&Predicate>) -> Result<Statement> {
        let info = self.catalog.entity::<E>()?;
        let predicate = predicate.ok_or_else(|| Error::predicate_required(info.entity(), "delete_where"))?;

        let mut parameters = Vec::new();
        let mut sql = format!("DELETE FROM {}", info.table());
        self.where_clause(&info, predicate, &mut sql, &mut parameters)?;
        Ok(Statement::new(sql, parameters))
    }

    pub fn delete_batch<E: Entity>(&self, entities: &[E], batch_size: usize) -> Result<Vec<Statement>> {
        let info = self.catalog.entity::<E>()?;
        info.require_keys("delete_batch")?;
        let keys = with_accessors::<E>(self.catalog, info.key_members())?;
        let terminator = self.dialect.statement_terminator();

        let mut statements = Vec::new();
        for (offset, chunk) in chunks(entities, batch_size) {
            let mut parameters = Vec::new();
            let mut parts = Vec::with_capacity(chunk.len());
            for (i, entity) in chunk.iter().enumerate() {
                let suffix = batch_suffix(offset + i);
                let condition = self.key_clause(&info, &keys, entity, &suffix, &mut parameters)?;
                parts.push(format!("DELETE FROM {} WHERE {}", info.table(), condition));
            }
            statements.push(Statement::new(parts.join(terminator), parameters));
        }
        Ok(statements)
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::{user, AuditLog, Membership, User};
    use super::*;
    use crate::dialect::{OracleDialect, SqlServerDialect};
    use crate::entity::Catalog;
    use crate::expr::field;

    #[test]
    fn test_delete_by_key() {
        let catalog = Catalog::new();
        let builder = StatementBuilder::new(&catalog, &OracleDialect);
        let statement = builder.delete(&user(4, "x")).unwrap();
        assert_eq!(statement.sql, "DELETE FROM T_USER WHERE USER_ID=:id");
    }

    #[test]
    fn test_delete_keyless_type() {
        let catalog = Catalog::new();
        let builder = StatementBuilder::new(&catalog, &SqlServerDialect);
        let err = builder.delete(&AuditLog::default()).unwrap_err();
        assert!(matches!(err, Error::KeyRequired { operation: "delete", .. }));
    }

    #[test]
    fn test_delete_where() {
        let catalog = Catalog::new();
        let builder = StatementBuilder::new(&catalog, &SqlServerDialect);
        let predicate = field("active").eq(false).or(field("email").is_null());
        let statement = builder.delete_where::<User>(Some(&predicate)).unwrap();
        assert_eq!(
            statement.sql,
            "DELETE FROM T_USER WHERE (IS_ACTIVE = @active OR email IS NULL)"
        );
        let err = builder.delete_where::<User>(None).unwrap_err();
        assert!(matches!(err, Error::PredicateRequired { operation: "delete_where", .. }));
    }

    #[test]
    fn test_delete_batch() {
        let catalog = Catalog::new();
        let builder = StatementBuilder::new(&catalog, &SqlServerDialect);
        let rows: Vec<Membership> = (0..3)
            .map(|i| Membership {
                group_id: 7,
                user_id: i,
                role: None,
            })
            .collect();
        let statements = builder.delete_batch(&rows, 100).unwrap();
        assert_eq!(statements.len(), 1);
        assert_eq!(statements[0].parameters.len(), 6);
        assert!(statements[0]
            .sql
            .ends_with("DELETE FROM T_MEMBERSHIP WHERE GROUP_ID=@group_id_2 AND USER_ID=@user_id_2"));
    }

    #[test]
    fn test_delete_batch_keyless_fails_before_building() {
        let catalog = Catalog::new();
        let builder = StatementBuilder::new(&catalog, &SqlServerDialect);
        let err = builder.delete_batch(&[AuditLog::default()], 1).unwrap_err();
        assert!(matches!(err, Error::KeyRequired { operation: "delete_batch", .. }));
    }
}
