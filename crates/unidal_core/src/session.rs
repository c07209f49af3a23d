//! Session capability traits implemented by storage drivers.
//!
//! Capabilities are independent, composable traits rather than one
//! monolithic interface: a driver implements the single-record and
//! batch variants it supports, and the [`ReadonlySession`] /
//! [`ReadwriteSession`] bundles come for free through blanket impls.

use serde_json::Value;

use crate::context::Context;
use crate::error::DalResult;
use crate::insert::InsertOptions;
use crate::key::Key;
use crate::query::Select;
use crate::reader::Reader;
use crate::record::Record;

/// A single field mutation applied by [`Updater::update`].
#[derive(Debug, Clone, PartialEq)]
pub struct Update {
    /// Field to set.
    pub field: String,
    /// New value.
    pub value: Value,
}

impl Update {
    /// Creates a field update.
    pub fn set(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }
}

/// A condition a driver checks before applying an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precondition {
    /// The record must already exist.
    Exists,
}

/// Gets a single record by key.
pub trait Getter {
    /// Looks the record up and marks its outcome; absence is reported
    /// through the record state, not as a returned error.
    fn get(&self, ctx: &Context, record: &mut Record) -> DalResult<()>;
}

/// Gets multiple records at once (batch mode).
pub trait MultiGetter {
    /// Looks up every record, marking each outcome individually.
    fn get_multi(&self, ctx: &Context, records: &mut [Record]) -> DalResult<()>;
}

/// Executes queries.
pub trait Selector {
    /// Runs a query and returns a reader over the results.
    fn select(&self, ctx: &Context, query: &Select) -> DalResult<Box<dyn Reader>>;
}

/// Inserts a single record.
pub trait Inserter {
    /// Inserts the record, generating an identifier first if the
    /// options carry a generator.
    fn insert(&self, ctx: &Context, record: &mut Record, options: InsertOptions) -> DalResult<()>;
}

/// Inserts or replaces a single record.
pub trait Upserter {
    /// Stores the record whether or not it already exists.
    fn upsert(&self, ctx: &Context, record: &mut Record) -> DalResult<()>;
}

/// Sets a single record by key.
pub trait Setter {
    /// Stores the record unconditionally.
    fn set(&self, ctx: &Context, record: &mut Record) -> DalResult<()>;
}

/// Sets multiple records at once (batch mode).
pub trait MultiSetter {
    /// Stores every record unconditionally.
    fn set_multi(&self, ctx: &Context, records: &mut [Record]) -> DalResult<()>;
}

/// Updates a single existing record by key.
pub trait Updater {
    /// Applies field updates to the addressed record, subject to the
    /// preconditions.
    fn update(
        &self,
        ctx: &Context,
        key: &Key,
        updates: &[Update],
        preconditions: &[Precondition],
    ) -> DalResult<()>;
}

/// Updates multiple existing records at once (batch mode).
pub trait MultiUpdater {
    /// Applies the same field updates to every addressed record.
    fn update_multi(
        &self,
        ctx: &Context,
        keys: &[Key],
        updates: &[Update],
        preconditions: &[Precondition],
    ) -> DalResult<()>;
}

/// Deletes a single record by key.
pub trait Deleter {
    /// Deletes the addressed record.
    fn delete(&self, ctx: &Context, key: &Key) -> DalResult<()>;
}

/// Deletes multiple records at once (batch mode).
pub trait MultiDeleter {
    /// Deletes every addressed record.
    fn delete_multi(&self, ctx: &Context, keys: &[Key]) -> DalResult<()>;
}

/// Operations that do not modify the database.
pub trait ReadonlySession: Getter + MultiGetter + Selector {}

impl<T: Getter + MultiGetter + Selector + ?Sized> ReadonlySession for T {}

/// Operations that can modify the database, on top of the read-only
/// ones.
pub trait ReadwriteSession:
    ReadonlySession
    + Inserter
    + Upserter
    + Setter
    + MultiSetter
    + Updater
    + MultiUpdater
    + Deleter
    + MultiDeleter
{
}

impl<T> ReadwriteSession for T where
    T: ReadonlySession
        + Inserter
        + Upserter
        + Setter
        + MultiSetter
        + Updater
        + MultiUpdater
        + Deleter
        + MultiDeleter
        + ?Sized
{
}
