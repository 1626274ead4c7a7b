//! Query expressions: predicates, projections, update sets and orderings
//!
//! Expressions refer to members by name and are checked against the entity
//! metadata when they are translated.
//!
//! ```
//! use rowmap_core::expr::{field, OrderBy, UpdateSet};
//!
//! let adults = field("age").ge(18).and(field("name").starts_with("A"));
//! let order = OrderBy::new().desc("age").asc("name");
//! let bump = UpdateSet::new().set("visits", field("visits") + 1);
//! # let _ = (adults, order, bump);
//! ```

use crate::operator::{ArithOp, Operator};
use crate::Value;
use std::ops;

/// One side of a comparison
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// A mapped member
    Field(String),
    /// A value bound as a parameter
    Value(Value),
}

/// Placement of the wildcard in a LIKE pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeKind {
    Contains,
    StartsWith,
    EndsWith,
}

impl LikeKind {
    pub(crate) fn pattern(&self, text: &str) -> String {
        match self {
            LikeKind::Contains => format!("%{}%", text),
            LikeKind::StartsWith => format!("{}%", text),
            LikeKind::EndsWith => format!("%{}", text),
        }
    }
}

/// Boolean condition over the members of one entity
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    And(Box<Predicate>, Box<Predicate>),
    Or(Box<Predicate>, Box<Predicate>),
    Not(Box<Predicate>),
    Compare(Operand, Operator, Operand),
    IsNull(String),
    IsNotNull(String),
    Like(String, LikeKind, Value),
    In(String, Value),
    Const(bool),
}

impl Predicate {
    pub fn compare(lhs: impl Into<Operand>, op: Operator, rhs: impl Into<Operand>) -> Self {
        Predicate::Compare(lhs.into(), op, rhs.into())
    }

    pub fn and(self, other: Predicate) -> Self {
        Predicate::And(Box::new(self), Box::new(other))
    }

    pub fn or(self, other: Predicate) -> Self {
        Predicate::Or(Box::new(self), Box::new(other))
    }

    /// Conjunction of every predicate, `None` when the iterator is empty
    pub fn all(predicates: impl IntoIterator<Item = Predicate>) -> Option<Self> {
        predicates.into_iter().reduce(Predicate::and)
    }
}

impl ops::Not for Predicate {
    type Output = Predicate;

    fn not(self) -> Self::Output {
        Predicate::Not(Box::new(self))
    }
}

impl ops::BitAnd for Predicate {
    type Output = Predicate;

    fn bitand(self, rhs: Self) -> Self::Output {
        self.and(rhs)
    }
}

impl ops::BitOr for Predicate {
    type Output = Predicate;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.or(rhs)
    }
}

/// Reference to a member, the entry point of the fluent API
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRef(String);

/// Start an expression on `member`
pub fn field(member: impl Into<String>) -> FieldRef {
    FieldRef(member.into())
}

impl FieldRef {
    pub fn name(&self) -> &str {
        &self.0
    }

    fn compare(self, op: Operator, rhs: impl Into<Operand>) -> Predicate {
        Predicate::Compare(Operand::Field(self.0), op, rhs.into())
    }

    pub fn eq(self, rhs: impl Into<Operand>) -> Predicate {
        self.compare(Operator::EQ, rhs)
    }

    pub fn ne(self, rhs: impl Into<Operand>) -> Predicate {
        self.compare(Operator::NEQ, rhs)
    }

    pub fn lt(self, rhs: impl Into<Operand>) -> Predicate {
        self.compare(Operator::LT, rhs)
    }

    pub fn le(self, rhs: impl Into<Operand>) -> Predicate {
        self.compare(Operator::LTE, rhs)
    }

    pub fn gt(self, rhs: impl Into<Operand>) -> Predicate {
        self.compare(Operator::GT, rhs)
    }

    pub fn ge(self, rhs: impl Into<Operand>) -> Predicate {
        self.compare(Operator::GTE, rhs)
    }

    pub fn is_null(self) -> Predicate {
        Predicate::IsNull(self.0)
    }

    pub fn is_not_null(self) -> Predicate {
        Predicate::IsNotNull(self.0)
    }

    pub fn contains(self, text: impl Into<String>) -> Predicate {
        Predicate::Like(self.0, LikeKind::Contains, Value::String(text.into()))
    }

    pub fn starts_with(self, text: impl Into<String>) -> Predicate {
        Predicate::Like(self.0, LikeKind::StartsWith, Value::String(text.into()))
    }

    pub fn ends_with(self, text: impl Into<String>) -> Predicate {
        Predicate::Like(self.0, LikeKind::EndsWith, Value::String(text.into()))
    }

    /// Membership test against a list of values
    pub fn is_in<I, T>(self, values: I) -> Predicate
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        Predicate::In(self.0, crate::value::list(values))
    }

    pub fn asc(self) -> OrderKey {
        OrderKey {
            member: self.0,
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(self) -> OrderKey {
        OrderKey {
            member: self.0,
            direction: SortDirection::Desc,
        }
    }
}

impl From<FieldRef> for Operand {
    fn from(field: FieldRef) -> Self {
        Operand::Field(field.0)
    }
}

impl From<Value> for Operand {
    fn from(value: Value) -> Self {
        Operand::Value(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Operand {
    fn from(value: Option<T>) -> Self {
        Operand::Value(value.into())
    }
}

macro_rules! impl_value_conversions {
    ($($ty:ty),*) => {$(
        impl From<$ty> for Operand {
            fn from(value: $ty) -> Self {
                Operand::Value(value.into())
            }
        }

        impl From<$ty> for SetValue {
            fn from(value: $ty) -> Self {
                SetValue::Value(value.into())
            }
        }
    )*};
}

impl_value_conversions!(bool, i16, i32, i64, f32, f64, String, &str, Vec<u8>, serde_json::Value);

#[cfg(feature = "datetime-support")]
impl_value_conversions!(chrono::NaiveDateTime);

#[cfg(feature = "decimal-support")]
impl_value_conversions!(rust_decimal::Decimal);

#[cfg(feature = "uuid-support")]
impl_value_conversions!(uuid::Uuid);

/// Columns read by a projection query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Projection {
    Field(String),
    Fields(Vec<String>),
}

impl Projection {
    pub fn field(member: impl Into<String>) -> Self {
        Projection::Field(member.into())
    }

    pub fn fields<I, S>(members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Projection::Fields(members.into_iter().map(Into::into).collect())
    }

    pub fn members(&self) -> &[String] {
        match self {
            Projection::Field(member) => std::slice::from_ref(member),
            Projection::Fields(members) => members,
        }
    }
}

impl From<FieldRef> for Projection {
    fn from(field: FieldRef) -> Self {
        Projection::Field(field.0)
    }
}

/// How a projection is wrapped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectKind {
    #[default]
    Rows,
    Distinct,
    Max,
    Min,
    Count,
}

/// Right-hand side of an update assignment
#[derive(Debug, Clone, PartialEq)]
pub enum SetValue {
    Value(Value),
    Field(String),
    Binary(Box<SetValue>, ArithOp, Box<SetValue>),
}

impl SetValue {
    fn binary(self, op: ArithOp, rhs: impl Into<SetValue>) -> Self {
        SetValue::Binary(Box::new(self), op, Box::new(rhs.into()))
    }
}

impl From<Value> for SetValue {
    fn from(value: Value) -> Self {
        SetValue::Value(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for SetValue {
    fn from(value: Option<T>) -> Self {
        SetValue::Value(value.into())
    }
}

impl From<FieldRef> for SetValue {
    fn from(field: FieldRef) -> Self {
        SetValue::Field(field.0)
    }
}

macro_rules! impl_arith {
    ($($trait:ident :: $method:ident => $op:expr),*) => {$(
        impl<T: Into<SetValue>> ops::$trait<T> for SetValue {
            type Output = SetValue;

            fn $method(self, rhs: T) -> SetValue {
                self.binary($op, rhs)
            }
        }

        impl<T: Into<SetValue>> ops::$trait<T> for FieldRef {
            type Output = SetValue;

            fn $method(self, rhs: T) -> SetValue {
                SetValue::from(self).binary($op, rhs)
            }
        }
    )*};
}

impl_arith!(
    Add::add => ArithOp::Add,
    Sub::sub => ArithOp::Sub,
    Mul::mul => ArithOp::Mul,
    Div::div => ArithOp::Div
);

#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub member: String,
    pub value: SetValue,
}

/// Ordered list of `member = value` assignments
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UpdateSet {
    pub assignments: Vec<Assignment>,
}

impl UpdateSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, member: impl Into<String>, value: impl Into<SetValue>) -> Self {
        self.assignments.push(Assignment {
            member: member.into(),
            value: value.into(),
        });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderKey {
    pub member: String,
    pub direction: SortDirection,
}

/// Ordered sort keys
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OrderBy {
    pub keys: Vec<OrderKey>,
}

impl OrderBy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn asc(self, member: impl Into<String>) -> Self {
        self.then(field(member).asc())
    }

    pub fn desc(self, member: impl Into<String>) -> Self {
        self.then(field(member).desc())
    }

    pub fn then(mut self, key: OrderKey) -> Self {
        self.keys.push(key);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl From<OrderKey> for OrderBy {
    fn from(key: OrderKey) -> Self {
        OrderBy { keys: vec![key] }
    }
}

impl From<Vec<OrderKey>> for OrderBy {
    fn from(keys: Vec<OrderKey>) -> Self {
        OrderBy { keys }
    }
}
