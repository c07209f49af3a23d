//! Query filter conditions.
//!
//! A filter is a [`Condition`]: either a leaf [`Comparison`] or a
//! [`GroupCondition`] combining children with AND/OR. Rendering is for
//! diagnostics; execution works on the structured values.

use std::fmt;

use serde_json::Value;

/// Comparison and grouping operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// `=`
    Equal,
    /// `!=`
    NotEqual,
    /// `<`
    LessThan,
    /// `<=`
    LessOrEqual,
    /// `>`
    GreaterThan,
    /// `>=`
    GreaterOrEqual,
    /// `IN`
    In,
    /// `AND` (grouping)
    And,
    /// `OR` (grouping)
    Or,
}

impl Operator {
    /// The literal token of this operator.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Operator::Equal => "=",
            Operator::NotEqual => "!=",
            Operator::LessThan => "<",
            Operator::LessOrEqual => "<=",
            Operator::GreaterThan => ">",
            Operator::GreaterOrEqual => ">=",
            Operator::In => "IN",
            Operator::And => "AND",
            Operator::Or => "OR",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A leaf comparison: `field operator value`.
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    /// Field name on the left-hand side.
    pub field: String,
    /// Comparison operator.
    pub operator: Operator,
    /// Right-hand-side value.
    pub value: Value,
}

impl Comparison {
    /// Creates a comparison.
    pub fn new(field: impl Into<String>, operator: Operator, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            operator,
            value: value.into(),
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.field, self.operator, self.value)
    }
}

/// An AND/OR grouping of conditions.
///
/// By convention the first element is the condition being extended when
/// a group is derived from an existing query filter.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupCondition {
    /// `And` or `Or`.
    pub operator: Operator,
    /// Ordered child conditions.
    pub conditions: Vec<Condition>,
}

impl fmt::Display for GroupCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, condition) in self.conditions.iter().enumerate() {
            if i > 0 {
                write!(f, " {} ", self.operator)?;
            }
            write!(f, "{condition}")?;
        }
        f.write_str(")")
    }
}

/// A query filter: a leaf comparison or an AND/OR group.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Leaf comparison.
    Comparison(Comparison),
    /// AND/OR grouping.
    Group(GroupCondition),
}

impl Condition {
    /// Shorthand for an equality comparison.
    pub fn equal(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Condition::Comparison(Comparison::new(field, Operator::Equal, value))
    }

    /// Shorthand for an arbitrary comparison.
    pub fn compare(field: impl Into<String>, operator: Operator, value: impl Into<Value>) -> Self {
        Condition::Comparison(Comparison::new(field, operator, value))
    }

    /// True if this is a bare comparison, not a group.
    #[must_use]
    pub fn is_comparison(&self) -> bool {
        matches!(self, Condition::Comparison(_))
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Comparison(comparison) => write!(f, "{comparison}"),
            Condition::Group(group) => write!(f, "{group}"),
        }
    }
}

impl From<Comparison> for Condition {
    fn from(comparison: Comparison) -> Self {
        Condition::Comparison(comparison)
    }
}

impl From<GroupCondition> for Condition {
    fn from(group: GroupCondition) -> Self {
        Condition::Group(group)
    }
}
