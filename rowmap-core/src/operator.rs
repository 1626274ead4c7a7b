//! SQL operator types

use std::fmt::{self, Display};

/// Comparison operator used by predicate nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Operator(&'static str);

impl Operator {
    pub const EQ: Self = Operator("=");
    pub const NEQ: Self = Operator("<>");
    pub const LT: Self = Operator("<");
    pub const LTE: Self = Operator("<=");
    pub const GT: Self = Operator(">");
    pub const GTE: Self = Operator(">=");

    /// Get the string representation of the operator
    pub fn as_str(&self) -> &'static str {
        self.0
    }

    /// True for <, <=, > and >=, which have no meaning against NULL
    pub fn is_ordering(&self) -> bool {
        matches!(self.0, "<" | "<=" | ">" | ">=")
    }

    /// The operator that holds when the operands are swapped
    pub fn flipped(&self) -> Self {
        match self.0 {
            "<" => Operator::GT,
            "<=" => Operator::GTE,
            ">" => Operator::LT,
            ">=" => Operator::LTE,
            _ => *self,
        }
    }
}

impl Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Arithmetic operator used on the right-hand side of update assignments
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl ArithOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArithOp::Add => "+",
            ArithOp::Sub => "-",
            ArithOp::Mul => "*",
            ArithOp::Div => "/",
        }
    }
}

/// Convenience module for operator constants
pub mod op {
    use super::Operator;

    pub const EQ: Operator = Operator::EQ;
    pub const NEQ: Operator = Operator::NEQ;
    pub const LT: Operator = Operator::LT;
    pub const LTE: Operator = Operator::LTE;
    pub const GT: Operator = Operator::GT;
    pub const GTE: Operator = Operator::GTE;
}
