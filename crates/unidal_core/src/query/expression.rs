//! Projection and ordering expressions.

use std::fmt;

use serde_json::Value;

/// A renderable query expression: a field reference or a constant.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// A field of the source collection.
    Field(String),
    /// A constant value.
    Constant(Value),
}

impl Expression {
    /// A field reference.
    pub fn field(name: impl Into<String>) -> Self {
        Expression::Field(name.into())
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Field(name) => f.write_str(name),
            Expression::Constant(value) => write!(f, "{value}"),
        }
    }
}

/// A projected column, optionally aliased.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    /// Projected expression.
    pub expression: Expression,
    /// Optional output alias.
    pub alias: Option<String>,
}

impl Column {
    /// A plain field column.
    pub fn field(name: impl Into<String>) -> Self {
        Self {
            expression: Expression::field(name),
            alias: None,
        }
    }

    /// Attaches an alias.
    #[must_use]
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.alias {
            Some(alias) => write!(f, "{} AS {alias}", self.expression),
            None => write!(f, "{}", self.expression),
        }
    }
}

/// Sort direction of an [`OrderExpression`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    /// Ascending order; the default, rendered without a suffix.
    #[default]
    Ascending,
    /// Descending order, rendered with a `DESC` suffix.
    Descending,
}

/// An ordering term of a query.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderExpression {
    /// Expression to order by.
    pub expression: Expression,
    /// Sort direction.
    pub direction: SortDirection,
}

impl fmt::Display for OrderExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.direction {
            SortDirection::Ascending => write!(f, "{}", self.expression),
            SortDirection::Descending => write!(f, "{} DESC", self.expression),
        }
    }
}

/// Orders by a field, ascending.
pub fn ascending(field: impl Into<String>) -> OrderExpression {
    OrderExpression {
        expression: Expression::field(field),
        direction: SortDirection::Ascending,
    }
}

/// Orders by a field, descending.
pub fn descending(field: impl Into<String>) -> OrderExpression {
    OrderExpression {
        expression: Expression::field(field),
        direction: SortDirection::Descending,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_renders_alias() {
        assert_eq!(Column::field("email").to_string(), "email");
        assert_eq!(
            Column::field("email").with_alias("e").to_string(),
            "email AS e"
        );
    }

    #[test]
    fn order_expression_renders_direction() {
        assert_eq!(ascending("age").to_string(), "age");
        assert_eq!(descending("age").to_string(), "age DESC");
    }
}
