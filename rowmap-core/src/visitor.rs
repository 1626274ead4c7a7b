//! Translation of expressions into parameterized SQL fragments

use crate::dialect::Dialect;
use crate::entity::EntityInfo;
use crate::expr::{Operand, OrderBy, Predicate, Projection, SetValue, UpdateSet};
use crate::gateway::Parameter;
use crate::operator::Operator;
use crate::{Error, Result, Value};
use std::collections::HashSet;

/// SQL text plus the parameters it introduced
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Fragment {
    pub sql: String,
    pub parameters: Vec<Parameter>,
}

/// Walks expressions for one entity and collects bound parameters.
///
/// Parameter names are the member name followed by the scope suffix. A name
/// already taken in this translator, or reserved by the caller, gets `_1`,
/// `_2`, ... appended.
pub struct Translator<'a> {
    info: &'a EntityInfo,
    dialect: &'a dyn Dialect,
    scope: String,
    taken: HashSet<String>,
    parameters: Vec<Parameter>,
}

impl<'a> Translator<'a> {
    pub fn new(info: &'a EntityInfo, dialect: &'a dyn Dialect) -> Self {
        Self {
            info,
            dialect,
            scope: String::new(),
            taken: HashSet::new(),
            parameters: Vec::new(),
        }
    }

    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }

    /// Names already used elsewhere in the statement
    pub fn reserve<'n>(mut self, names: impl IntoIterator<Item = &'n str>) -> Self {
        self.taken
            .extend(names.into_iter().map(|n| n.to_ascii_lowercase()));
        self
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn into_parameters(self) -> Vec<Parameter> {
        self.parameters
    }

    /// Translate a WHERE condition
    pub fn predicate(&mut self, predicate: &Predicate) -> Result<String> {
        match predicate {
            Predicate::And(lhs, rhs) => Ok(format!(
                "({} AND {})",
                self.predicate(lhs)?,
                self.predicate(rhs)?
            )),
            Predicate::Or(lhs, rhs) => Ok(format!(
                "({} OR {})",
                self.predicate(lhs)?,
                self.predicate(rhs)?
            )),
            Predicate::Not(inner) => Ok(format!("(NOT {})", self.predicate(inner)?)),
            Predicate::Compare(lhs, op, rhs) => self.compare(lhs, *op, rhs),
            Predicate::IsNull(member) => Ok(format!("{} IS NULL", self.column(member)?)),
            Predicate::IsNotNull(member) => Ok(format!("{} IS NOT NULL", self.column(member)?)),
            Predicate::Like(member, kind, value) => {
                let column = self.column(member)?;
                let text = match value {
                    Value::String(s) => s.clone(),
                    Value::Null | Value::Array(_) => {
                        return Err(Error::translation(
                            "LIKE",
                            format!("pattern for '{}' must be a scalar value", member),
                        ))
                    }
                    other => other.to_string(),
                };
                let name = self.bind(member, Value::String(kind.pattern(&text)));
                Ok(format!("{} LIKE {}", column, name))
            }
            Predicate::In(member, values) => {
                let column = self.column(member)?;
                let Value::Array(values) = values else {
                    return Err(Error::translation(
                        "IN list",
                        format!("'{}' must be compared against a list of values", member),
                    ));
                };
                if values.is_empty() {
                    return Err(Error::translation(
                        "IN list",
                        format!("empty value list for '{}'", member),
                    ));
                }
                let mut names = Vec::with_capacity(values.len());
                for value in values {
                    if matches!(value, Value::Array(_)) {
                        return Err(Error::translation("IN list", "nested lists are not supported"));
                    }
                    names.push(self.bind(member, value.clone()));
                }
                Ok(format!("{} IN ({})", column, names.join(", ")))
            }
            Predicate::Const(true) => Ok("1=1".to_string()),
            Predicate::Const(false) => Ok("1=0".to_string()),
        }
    }

    fn compare(&mut self, lhs: &Operand, op: Operator, rhs: &Operand) -> Result<String> {
        match (lhs, rhs) {
            (Operand::Field(left), Operand::Field(right)) => Ok(format!(
                "{} {} {}",
                self.column(left)?,
                op,
                self.column(right)?
            )),
            (Operand::Field(member), Operand::Value(value)) => {
                self.compare_value(member, op, value)
            }
            (Operand::Value(value), Operand::Field(member)) => {
                self.compare_value(member, op.flipped(), value)
            }
            (Operand::Value(left), Operand::Value(right)) => Err(Error::translation(
                "comparison",
                format!("both sides are constants ({} {} {})", left, op, right),
            )),
        }
    }

    fn compare_value(&mut self, member: &str, op: Operator, value: &Value) -> Result<String> {
        let column = self.column(member)?;
        match value {
            Value::Null if op == Operator::EQ => Ok(format!("{} IS NULL", column)),
            Value::Null if op == Operator::NEQ => Ok(format!("{} IS NOT NULL", column)),
            Value::Null => Err(Error::translation(
                "comparison",
                format!("'{}' cannot be compared to NULL with '{}'", member, op),
            )),
            Value::Array(_) => Err(Error::translation(
                "comparison",
                format!("list operand for '{}' is only valid in IN", member),
            )),
            other => {
                let name = self.bind(member, other.clone());
                Ok(format!("{} {} {}", column, op, name))
            }
        }
    }

    /// Comma-joined column list
    pub fn projection(&mut self, projection: &Projection) -> Result<String> {
        let members = projection.members();
        if members.is_empty() {
            return Err(Error::translation("projection", "no members selected"));
        }
        let columns = members
            .iter()
            .map(|m| self.column(m).map(str::to_string))
            .collect::<Result<Vec<_>>>()?;
        Ok(columns.join(", "))
    }

    /// `column = expr` list of an UPDATE
    pub fn update_set(&mut self, set: &UpdateSet) -> Result<String> {
        if set.is_empty() {
            return Err(Error::translation("update set", "no assignments"));
        }
        let mut parts = Vec::with_capacity(set.assignments.len());
        for assignment in &set.assignments {
            let member = self.member(&assignment.member)?;
            if !member.kind.is_persisted() {
                return Err(Error::translation(
                    "update set",
                    format!("'{}' is computed and cannot be assigned", member.name),
                ));
            }
            let column = member.column.clone();
            let name = member.name.clone();
            let value = self.set_value(&name, &assignment.value)?;
            parts.push(format!("{}={}", column, value));
        }
        Ok(parts.join(", "))
    }

    fn set_value(&mut self, member: &str, value: &SetValue) -> Result<String> {
        match value {
            SetValue::Value(Value::Null) => Ok("NULL".to_string()),
            SetValue::Value(Value::Array(_)) => Err(Error::translation(
                "update set",
                format!("list value for '{}' is only valid in IN", member),
            )),
            SetValue::Value(value) => Ok(self.bind(member, value.clone())),
            SetValue::Field(other) => self.column(other).map(str::to_string),
            SetValue::Binary(lhs, op, rhs) => Ok(format!(
                "({} {} {})",
                self.set_value(member, lhs)?,
                op.as_str(),
                self.set_value(member, rhs)?
            )),
        }
    }

    /// Bare ORDER BY list
    pub fn order_by(&mut self, order: &OrderBy) -> Result<String> {
        if order.is_empty() {
            return Err(Error::translation("order by", "no sort keys"));
        }
        let keys = order
            .keys
            .iter()
            .map(|key| Ok(format!("{} {}", self.column(&key.member)?, key.direction.as_str())))
            .collect::<Result<Vec<_>>>()?;
        Ok(keys.join(", "))
    }

    fn member(&self, name: &str) -> Result<&'a crate::entity::MemberInfo> {
        self.info.member(name).ok_or_else(|| {
            Error::translation(
                "member reference",
                format!("unknown member '{}' on '{}'", name, self.info.entity()),
            )
        })
    }

    fn column(&self, member: &str) -> Result<&'a str> {
        self.member(member).map(|m| m.column.as_str())
    }

    fn bind(&mut self, member: &str, value: Value) -> String {
        let base = format!("{}{}", member, self.scope);
        let mut name = base.clone();
        let mut repeat = 0;
        while !self.taken.insert(name.to_ascii_lowercase()) {
            repeat += 1;
            name = format!("{}_{}", base, repeat);
        }
        let value = self.dialect.encode(value);
        let placeholder = format!("{}{}", self.dialect.parameter_prefix(), name);
        self.parameters.push(Parameter {
            name,
            type_hint: value.data_type(),
            value,
        });
        placeholder
    }
}

/// Translate a standalone predicate
pub fn translate_predicate(
    info: &EntityInfo,
    dialect: &dyn Dialect,
    predicate: &Predicate,
    scope: &str,
) -> Result<Fragment> {
    let mut translator = Translator::new(info, dialect).with_scope(scope);
    let sql = translator.predicate(predicate)?;
    Ok(Fragment {
        sql,
        parameters: translator.into_parameters(),
    })
}
