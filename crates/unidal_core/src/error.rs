//! Error types for the data-access layer.
//!
//! Two tiers are distinguished. Contract violations (reading record state
//! before population, building a key with no identifier, rendering an
//! invalid key) are caller bugs and panic at the point of misuse. Runtime
//! conditions are returned as [`DalError`] values and keep their cause
//! chain intact as they are wrapped across boundaries.

use std::error::Error as StdError;
use std::fmt;

use thiserror::Error;

use crate::key::KeyError;

/// Result type for data-access operations.
pub type DalResult<T> = Result<T, DalError>;

/// Errors that can occur in data-access operations.
#[derive(Debug, Error)]
pub enum DalError {
    /// A lookup determined that the addressed record does not exist.
    ///
    /// Absence is not a hard failure: [`Record::error`](crate::Record::error)
    /// folds it to `None` and callers discover it through
    /// [`Record::exists`](crate::Record::exists). Match it with
    /// [`DalError::is_not_found`], never by identity.
    #[error("record not found: {key}")]
    RecordNotFound {
        /// Path of the key that was looked up.
        key: String,
    },

    /// A reader has no more records to yield.
    ///
    /// Consumed internally by the bulk collectors; end callers of
    /// [`read_all_records`](crate::reader::read_all_records) never see it.
    #[error("no more records")]
    NoMoreRecords,

    /// A key or one of its ancestors violates a key invariant.
    #[error("invalid key: {0}")]
    InvalidKey(#[from] KeyError),

    /// The insert-retry loop exhausted its attempt budget without
    /// finding a collision-free identifier.
    #[error("not able to generate a unique id in {attempts} attempts")]
    UniqueIdExhausted {
        /// The configured attempt bound.
        attempts: u32,
    },

    /// An error reported by a storage driver.
    #[error("backend error: {0}")]
    Backend(#[source] Box<dyn StdError + Send + Sync>),

    /// An error wrapped with context as it crossed a boundary.
    ///
    /// The underlying cause stays reachable through `source()` and the
    /// sentinel predicates.
    #[error("{message}: {source}")]
    Context {
        /// What the failing call was doing.
        message: String,
        /// The underlying error.
        source: Box<DalError>,
    },
}

impl DalError {
    /// Creates a not-found error for the given key path.
    pub fn record_not_found(key: impl fmt::Display) -> Self {
        DalError::RecordNotFound {
            key: key.to_string(),
        }
    }

    /// Wraps a driver error.
    pub fn backend(err: impl Into<Box<dyn StdError + Send + Sync>>) -> Self {
        DalError::Backend(err.into())
    }

    /// Wraps an error with context, preserving the cause chain.
    pub fn wrap(message: impl Into<String>, source: DalError) -> Self {
        DalError::Context {
            message: message.into(),
            source: Box::new(source),
        }
    }

    /// Returns true if this error, or any cause under context wraps,
    /// is the not-found condition.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        match self {
            DalError::RecordNotFound { .. } => true,
            DalError::Context { source, .. } => source.is_not_found(),
            _ => false,
        }
    }

    /// Returns true if this error, or any cause under context wraps,
    /// is the reader-exhaustion condition.
    #[must_use]
    pub fn is_no_more_records(&self) -> bool {
        match self {
            DalError::NoMoreRecords => true,
            DalError::Context { source, .. } => source.is_no_more_records(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_matched_through_wraps() {
        let err = DalError::wrap(
            "failed to check if record exists",
            DalError::wrap("probe", DalError::record_not_found("users/u1")),
        );
        assert!(err.is_not_found());
        assert!(!err.is_no_more_records());
    }

    #[test]
    fn other_errors_are_not_not_found() {
        assert!(!DalError::NoMoreRecords.is_not_found());
        assert!(!DalError::backend("boom").is_not_found());
        assert!(DalError::NoMoreRecords.is_no_more_records());
    }

    #[test]
    fn wrap_keeps_cause_reachable() {
        let err = DalError::wrap("outer", DalError::record_not_found("users/u1"));
        let source = StdError::source(&err).expect("source");
        assert_eq!(source.to_string(), "record not found: users/u1");
        assert_eq!(err.to_string(), "outer: record not found: users/u1");
    }
}
