//! Structured query model: conditions, expressions, and the select
//! descriptor with its canonical textual rendering.

mod condition;
mod expression;
mod select;

pub use condition::{Comparison, Condition, GroupCondition, Operator};
pub use expression::{ascending, descending, Column, Expression, OrderExpression, SortDirection};
pub use select::{CollectionRef, Cursor, RecordFactory, Select};
