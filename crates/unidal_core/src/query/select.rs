//! The select descriptor and its canonical rendering.

use std::fmt;
use std::sync::Arc;

use super::condition::{Condition, GroupCondition, Operator};
use super::expression::{Column, Expression, OrderExpression};
use crate::key::{IdKind, Key};
use crate::record::Record;

/// Points to a collection (table) in a database, optionally scoped
/// under a parent key for nested collections.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionRef {
    /// Collection name.
    pub name: String,
    /// Parent key when the collection is nested.
    pub parent: Option<Key>,
}

impl CollectionRef {
    /// A root-level collection.
    pub fn root(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
        }
    }

    /// A collection nested under a parent key.
    pub fn nested(name: impl Into<String>, parent: Key) -> Self {
        Self {
            name: name.into(),
            parent: Some(parent),
        }
    }

    /// The collection path: the parent key path joined with the name.
    #[must_use]
    pub fn path(&self) -> String {
        match &self.parent {
            Some(parent) => format!("{parent}/{}", self.name),
            None => self.name.clone(),
        }
    }
}

impl fmt::Display for CollectionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// An opaque position in a result set, handed back by backends that
/// support resumable iteration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor(String);

impl Cursor {
    /// Wraps a backend-provided cursor token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw cursor token.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Factory producing a fresh result holder per yielded row.
pub type RecordFactory = Arc<dyn Fn() -> Record + Send + Sync>;

/// Definition of a query: source collection, filter, ordering,
/// grouping, projection, and paging.
///
/// A select is constructed once by chaining builder methods, consumed
/// by exactly one `select` call, and never mutated afterwards; the
/// [`Select::and`]/[`Select::or`] combinators derive new values.
#[derive(Clone)]
pub struct Select {
    /// Target collection.
    pub from: Option<CollectionRef>,
    /// Filter condition.
    pub filter: Option<Condition>,
    /// Expressions to group by.
    pub group_by: Vec<Expression>,
    /// Expressions to order by.
    pub order_by: Vec<OrderExpression>,
    /// Columns to return; empty means all.
    pub columns: Vec<Column>,
    /// Factory for fresh result holders.
    pub into: Option<RecordFactory>,
    /// Maximum number of records to return; non-positive means no cap.
    pub limit: i64,
    /// Number of records to skip.
    pub offset: i64,
    /// Position to resume from.
    pub start_cursor: Option<Cursor>,
    /// What kind of identifiers the result keys use.
    pub id_kind: IdKind,
}

impl Default for Select {
    fn default() -> Self {
        Self {
            from: None,
            filter: None,
            group_by: Vec::new(),
            order_by: Vec::new(),
            columns: Vec::new(),
            into: None,
            limit: 0,
            offset: 0,
            start_cursor: None,
            id_kind: IdKind::default(),
        }
    }
}

impl Select {
    /// Starts a query against a collection.
    #[must_use]
    pub fn from(collection: CollectionRef) -> Self {
        Self {
            from: Some(collection),
            ..Self::default()
        }
    }

    /// Sets the filter condition.
    #[must_use]
    pub fn filter(mut self, condition: Condition) -> Self {
        self.filter = Some(condition);
        self
    }

    /// Sets the projected columns.
    #[must_use]
    pub fn columns(mut self, columns: Vec<Column>) -> Self {
        self.columns = columns;
        self
    }

    /// Sets the ordering terms.
    #[must_use]
    pub fn order_by(mut self, order_by: Vec<OrderExpression>) -> Self {
        self.order_by = order_by;
        self
    }

    /// Sets the grouping expressions.
    #[must_use]
    pub fn group_by(mut self, group_by: Vec<Expression>) -> Self {
        self.group_by = group_by;
        self
    }

    /// Caps the number of returned records.
    #[must_use]
    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = limit;
        self
    }

    /// Skips the first `offset` records.
    #[must_use]
    pub fn offset(mut self, offset: i64) -> Self {
        self.offset = offset;
        self
    }

    /// Resumes iteration from a cursor.
    #[must_use]
    pub fn start_from(mut self, cursor: Cursor) -> Self {
        self.start_cursor = Some(cursor);
        self
    }

    /// Declares what kind of identifiers the result keys use.
    #[must_use]
    pub fn id_kind(mut self, id_kind: IdKind) -> Self {
        self.id_kind = id_kind;
        self
    }

    /// Sets the factory for fresh result holders.
    #[must_use]
    pub fn into_factory(mut self, factory: RecordFactory) -> Self {
        self.into = Some(factory);
        self
    }

    /// Derives a query whose filter is `(previous AND conditions...)`.
    ///
    /// The original query is never mutated; the derived query carries
    /// the source collection and the new filter group, whose first
    /// element is the previous filter.
    #[must_use]
    pub fn and(&self, conditions: impl IntoIterator<Item = Condition>) -> Select {
        self.group_with_conditions(Operator::And, conditions)
    }

    /// Derives a query whose filter is `(previous OR conditions...)`.
    #[must_use]
    pub fn or(&self, conditions: impl IntoIterator<Item = Condition>) -> Select {
        self.group_with_conditions(Operator::Or, conditions)
    }

    fn group_with_conditions(
        &self,
        operator: Operator,
        conditions: impl IntoIterator<Item = Condition>,
    ) -> Select {
        let mut grouped = Vec::new();
        if let Some(filter) = &self.filter {
            grouped.push(filter.clone());
        }
        grouped.extend(conditions);
        Select {
            from: self.from.clone(),
            filter: Some(Condition::Group(GroupCondition {
                operator,
                conditions: grouped,
            })),
            ..Self::default()
        }
    }
}

impl fmt::Display for Select {
    /// Deterministic diagnostic rendering.
    ///
    /// The layout is a one-liner iff there is at most one column and
    /// the filter is absent or a bare comparison; otherwise `FROM` and
    /// `WHERE` go on their own lines. `ORDER BY` and `GROUP BY` always
    /// start a new line.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SELECT")?;
        if self.limit > 0 {
            write!(f, " TOP {}", self.limit)?;
        }
        match self.columns.len() {
            0 => f.write_str(" *")?,
            1 => write!(f, " {}", self.columns[0])?,
            _ => {
                for column in &self.columns {
                    write!(f, "\n\t{column}")?;
                }
            }
        }
        let one_liner = self.columns.len() <= 1
            && self.filter.as_ref().map_or(true, Condition::is_comparison);
        let clause_sep = if one_liner { " " } else { "\n" };
        if let Some(from) = &self.from {
            write!(f, "{clause_sep}FROM [{}]", from.path())?;
        }
        if let Some(filter) = &self.filter {
            write!(f, "{clause_sep}WHERE {filter}")?;
        }
        if !self.order_by.is_empty() {
            f.write_str("\nORDER BY ")?;
            for (i, expr) in self.order_by.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{expr}")?;
            }
        }
        if !self.group_by.is_empty() {
            f.write_str("\nGROUP BY ")?;
            for (i, expr) in self.group_by.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{expr}")?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Select {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Select")
            .field("from", &self.from)
            .field("filter", &self.filter)
            .field("group_by", &self.group_by)
            .field("order_by", &self.order_by)
            .field("columns", &self.columns)
            .field("into", &self.into.as_ref().map(|_| "<factory>"))
            .field("limit", &self.limit)
            .field("offset", &self.offset)
            .field("start_cursor", &self.start_cursor)
            .field("id_kind", &self.id_kind)
            .finish()
    }
}
