//! Records: a key plus payload plus load state.
//!
//! A [`Record`] is the unit passed to and returned from session
//! operations. Its state machine has a single entry point,
//! [`Record::set_result`], called by drivers after a lookup or write:
//! Unpopulated moves to Found, NotFound, or Errored, and never back.

use std::fmt;

use serde_json::Value;

use crate::error::DalError;
use crate::key::{IdValue, Key};

/// Load state of a record. Reachable only through `set_result`.
#[derive(Debug)]
enum LoadState {
    /// Created, never submitted to a database operation.
    Unpopulated,
    /// A lookup or write succeeded and a value is present.
    Found,
    /// A lookup determined the record does not exist.
    NotFound,
    /// Any other failure.
    Errored(DalError),
}

/// A gateway to a single database record.
///
/// A record exclusively owns its key and payload. Absence is a
/// non-error outcome: [`Record::error`] is `None` for both Found and
/// NotFound, and [`Record::exists`] answers the absence question.
#[derive(Debug)]
pub struct Record {
    key: Key,
    state: LoadState,
    changed: bool,
    data: Value,
}

impl Record {
    /// Creates an unpopulated record for the given key.
    ///
    /// # Panics
    ///
    /// Panics if the key is invalid; handing an unvalidated key to a
    /// record is a caller bug.
    #[must_use]
    pub fn new(key: Key) -> Self {
        if let Err(err) = key.validate() {
            panic!("invalid key for a new record: {err}");
        }
        Self::new_unchecked(key)
    }

    /// Creates an unpopulated record carrying a payload, for insert
    /// and set operations.
    ///
    /// # Panics
    ///
    /// Panics if the key is invalid.
    #[must_use]
    pub fn with_data(key: Key, data: Value) -> Self {
        let mut record = Self::new(key);
        record.data = data;
        record
    }

    /// Internal constructor that skips key validation; used for record
    /// views over keys still under construction.
    pub(crate) fn new_unchecked(key: Key) -> Self {
        Self {
            key,
            state: LoadState::Unpopulated,
            changed: false,
            data: Value::Null,
        }
    }

    /// The key addressing this record.
    #[must_use]
    pub fn key(&self) -> &Key {
        &self.key
    }

    /// Rewrites the identifier of the leaf key.
    ///
    /// Used by identifier generators and by drivers that assign
    /// storage-generated identifiers after an insert.
    pub fn set_id(&mut self, id: IdValue) {
        self.key.set_id(id);
    }

    pub(crate) fn into_key(self) -> Key {
        self.key
    }

    /// The error of the last operation on this record, if any.
    ///
    /// Not-found is not an error: this returns `None` for both Found
    /// and NotFound, so callers only handle hard failures here and ask
    /// [`Record::exists`] about absence.
    #[must_use]
    pub fn error(&self) -> Option<&DalError> {
        match &self.state {
            LoadState::Errored(err) => Some(err),
            _ => None,
        }
    }

    /// Whether the record was found in the database.
    ///
    /// # Panics
    ///
    /// Panics if the record was never submitted to a database operation,
    /// or if the last operation failed; both indicate the caller skipped
    /// the required lookup or error check.
    #[must_use]
    pub fn exists(&self) -> bool {
        match &self.state {
            LoadState::Found => true,
            LoadState::NotFound => false,
            LoadState::Unpopulated => panic!(
                "an attempt to check if a record exists before it was retrieved from the database"
            ),
            LoadState::Errored(err) => {
                panic!("an attempt to check if a record exists on a record with an error: {err}")
            }
        }
    }

    /// The record payload, without its key.
    ///
    /// # Panics
    ///
    /// Panics if the record was never submitted to a database operation
    /// or if the last operation failed.
    #[must_use]
    pub fn data(&self) -> &Value {
        match &self.state {
            LoadState::Found | LoadState::NotFound => &self.data,
            LoadState::Unpopulated => panic!(
                "an attempt to read record data before it was retrieved from the database"
            ),
            LoadState::Errored(err) => {
                panic!("an attempt to read data from a record with an error: {err}")
            }
        }
    }

    /// Replaces the payload. Drivers fill the payload before marking
    /// the operation outcome with [`Record::set_result`].
    pub fn set_data(&mut self, data: Value) {
        self.data = data;
    }

    /// Records the outcome of a database operation.
    ///
    /// `Ok` moves the record to Found. An error matching
    /// [`DalError::is_not_found`] moves it to NotFound; any other error
    /// moves it to Errored.
    pub fn set_result(&mut self, outcome: Result<(), DalError>) {
        self.state = match outcome {
            Ok(()) => LoadState::Found,
            Err(err) if err.is_not_found() => LoadState::NotFound,
            Err(err) => LoadState::Errored(err),
        };
    }

    /// Whether the payload was mutated since loading.
    #[must_use]
    pub fn has_changed(&self) -> bool {
        self.changed
    }

    /// Marks the payload as mutated since loading, for optimistic
    /// write paths built on top of this core.
    pub fn mark_as_changed(&mut self) {
        self.changed = true;
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key)
    }
}
