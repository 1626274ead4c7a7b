//! SELECT statements

use super::{Statement, StatementBuilder};
use crate::expr::{OrderBy, Predicate, Projection, SelectKind};
use crate::visitor::Translator;
use crate::{Entity, Error, Result};

impl StatementBuilder<'_> {
    /// Every persisted column of the rows matching `predicate`
    pub fn select<E: Entity>(&self, predicate: Option<&Predicate>, order: Option<&OrderBy>) -> Result<Statement> {
        let info = self.catalog.entity::<E>()?;
        let mut parameters = Vec::new();
        let mut sql = format!("SELECT {} FROM {}", info.select_fields(), info.table());
        self.optional_where(&info, predicate, &mut sql, &mut parameters)?;
        if let Some(order) = order {
            let order = self.order_text::<E>(order)?;
            sql.push_str(&self.dialect.order_clause(Some(&order)));
        }
        Ok(Statement::new(sql, parameters))
    }

    /// Projection of the matching rows, optionally wrapped in DISTINCT, an
    /// aggregate or a row count
    pub fn select_projection<E: Entity>(
        &self,
        predicate: Option<&Predicate>,
        projection: &Projection,
        kind: SelectKind,
    ) -> Result<Statement> {
        let info = self.catalog.entity::<E>()?;
        let mut translator = Translator::new(&info, self.dialect);
        let columns = translator.projection(projection)?;
        let selected = match kind {
            SelectKind::Rows => columns,
            SelectKind::Distinct => format!("DISTINCT {}", columns),
            SelectKind::Max | SelectKind::Min if projection.members().len() != 1 => {
                return Err(Error::translation(
                    "aggregate",
                    "MAX and MIN take exactly one member",
                ))
            }
            SelectKind::Max => format!("MAX({})", columns),
            SelectKind::Min => format!("MIN({})", columns),
            SelectKind::Count => "COUNT(1) CT".to_string(),
        };

        let mut parameters = translator.into_parameters();
        let mut sql = format!("SELECT {} FROM {}", selected, info.table());
        self.optional_where(&info, predicate, &mut sql, &mut parameters)?;
        Ok(Statement::new(sql, parameters))
    }

    /// `SELECT COUNT(1) CT` over the matching rows
    pub fn count<E: Entity>(&self, predicate: Option<&Predicate>) -> Result<Statement> {
        let info = self.catalog.entity::<E>()?;
        let mut parameters = Vec::new();
        let mut sql = format!("SELECT COUNT(1) CT FROM {}", info.table());
        self.optional_where(&info, predicate, &mut sql, &mut parameters)?;
        Ok(Statement::new(sql, parameters))
    }

    /// Bare ORDER BY list for `E`
    pub fn order_text<E: Entity>(&self, order: &OrderBy) -> Result<String> {
        let info = self.catalog.entity::<E>()?;
        Translator::new(&info, self.dialect).order_by(order)
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::User;
    use super::*;
    use crate::dialect::{OracleDialect, SqlServerDialect};
    use crate::entity::Catalog;
    use crate::expr::field;

    #[test]
    fn test_select_all_columns() {
        let catalog = Catalog::new();
        let builder = StatementBuilder::new(&catalog, &SqlServerDialect);
        let statement = builder.select::<User>(None, None).unwrap();
        assert_eq!(
            statement.sql,
            "SELECT USER_ID, USER_NAME, email, AGE, IS_ACTIVE FROM T_USER"
        );
        assert!(statement.parameters.is_empty());
    }

    #[test]
    fn test_select_with_predicate_and_order() {
        let catalog = Catalog::new();
        let builder = StatementBuilder::new(&catalog, &OracleDialect);
        let predicate = field("age").ge(21);
        let order = OrderBy::new().desc("age").asc("name");
        let statement = builder.select::<User>(Some(&predicate), Some(&order)).unwrap();
        assert_eq!(
            statement.sql,
            "SELECT USER_ID, USER_NAME, email, AGE, IS_ACTIVE FROM T_USER WHERE AGE >= :age ORDER BY AGE DESC, USER_NAME ASC NULLS LAST"
        );
    }

    #[test]
    fn test_projection_kinds() {
        let catalog = Catalog::new();
        let builder = StatementBuilder::new(&catalog, &SqlServerDialect);
        let age = Projection::field("age");
        let sql = |kind| builder.select_projection::<User>(None, &age, kind).unwrap().sql;
        assert_eq!(sql(SelectKind::Rows), "SELECT AGE FROM T_USER");
        assert_eq!(sql(SelectKind::Distinct), "SELECT DISTINCT AGE FROM T_USER");
        assert_eq!(sql(SelectKind::Max), "SELECT MAX(AGE) FROM T_USER");
        assert_eq!(sql(SelectKind::Min), "SELECT MIN(AGE) FROM T_USER");
        assert_eq!(sql(SelectKind::Count), "SELECT COUNT(1) CT FROM T_USER");
    }

    #[test]
    fn test_aggregate_of_many_members_rejected() {
        let catalog = Catalog::new();
        let builder = StatementBuilder::new(&catalog, &SqlServerDialect);
        let both = Projection::fields(["age", "name"]);
        let err = builder
            .select_projection::<User>(None, &both, SelectKind::Max)
            .unwrap_err();
        assert!(matches!(err, Error::Translation { .. }));
    }

    #[test]
    fn test_count_query() {
        let catalog = Catalog::new();
        let builder = StatementBuilder::new(&catalog, &SqlServerDialect);
        let predicate = field("name").eq("ann");
        let statement = builder.count::<User>(Some(&predicate)).unwrap();
        assert_eq!(
            statement.sql,
            "SELECT COUNT(1) CT FROM T_USER WHERE USER_NAME = @name"
        );
    }
}
