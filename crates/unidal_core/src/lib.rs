//! # unidal_core
//!
//! Database-agnostic data-access core: one programming surface across
//! heterogeneous storage backends (document stores, key-value stores,
//! relational engines) without committing to any one of them.
//!
//! This crate provides:
//! - Hierarchical record keys with validation and path rendering
//! - Records with an explicit found/not-found/errored lifecycle
//! - A structured query model with a canonical textual rendering
//! - Pull-based result readers and bulk collection helpers
//! - Session and transaction capability traits drivers implement
//! - A bounded generate-check-insert loop for collision-free ids
//! - Call-scoped propagation of the current transaction
//!
//! It implements no storage of its own; storage drivers implement the
//! session contracts and callers stay backend-agnostic.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod context;
pub mod error;
pub mod insert;
pub mod key;
pub mod query;
pub mod reader;
pub mod record;
pub mod session;
pub mod transaction;

pub use context::{Context, SharedTransaction};
pub use error::{DalError, DalResult};
pub use insert::{
    insert_with_random_id, random_string_id, random_uuid_id, IdGenerator, InsertOptions,
    RandomStringId,
};
pub use key::{FieldVal, IdKind, IdValue, Key, KeyBuilder, KeyError};
pub use query::{
    ascending, descending, CollectionRef, Column, Comparison, Condition, Cursor, Expression,
    GroupCondition, Operator, OrderExpression, RecordFactory, Select, SortDirection,
};
pub use reader::{read_all_ids, read_all_records, Reader};
pub use record::Record;
pub use session::{
    Deleter, Getter, Inserter, MultiDeleter, MultiGetter, MultiSetter, MultiUpdater, Precondition,
    ReadonlySession, ReadwriteSession, Selector, Setter, Update, Updater, Upserter,
};
pub use transaction::{
    Database, IsolationLevel, ReadonlyTransaction, ReadwriteTransaction, RoTxWorker, RwTxWorker,
    Transaction, TransactionCoordinator, TransactionOptions,
};
