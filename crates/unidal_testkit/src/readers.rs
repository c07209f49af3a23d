//! Canned readers for caller and driver tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use unidal_core::{DalError, DalResult, Reader, Record};

/// Observation handle reporting whether a reader was closed.
#[derive(Debug, Clone, Default)]
pub struct CloseFlag(Arc<AtomicBool>);

impl CloseFlag {
    /// Creates an unset flag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the owning reader's `close` was called.
    #[must_use]
    pub fn was_closed(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn set(&self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

/// A reader yielding a fixed list of records, then the exhaustion
/// signal.
pub struct RecordsReader {
    records: std::vec::IntoIter<Record>,
    closed: CloseFlag,
}

impl RecordsReader {
    /// A reader over the given records.
    #[must_use]
    pub fn new(records: Vec<Record>) -> Self {
        Self {
            records: records.into_iter(),
            closed: CloseFlag::new(),
        }
    }

    /// A reader with no records at all.
    #[must_use]
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// A handle observing whether this reader gets closed.
    #[must_use]
    pub fn close_flag(&self) -> CloseFlag {
        self.closed.clone()
    }
}

impl Reader for RecordsReader {
    fn next(&mut self) -> DalResult<Record> {
        self.records.next().ok_or(DalError::NoMoreRecords)
    }

    fn close(&mut self) -> DalResult<()> {
        self.closed.set();
        Ok(())
    }
}

/// A reader yielding some records and then a configured error instead
/// of the exhaustion signal.
pub struct FailingReader {
    records: std::vec::IntoIter<Record>,
    error: Option<DalError>,
    closed: CloseFlag,
}

impl FailingReader {
    /// A reader that yields `records`, then fails with `error` once,
    /// then reports exhaustion.
    #[must_use]
    pub fn new(records: Vec<Record>, error: DalError) -> Self {
        Self {
            records: records.into_iter(),
            error: Some(error),
            closed: CloseFlag::new(),
        }
    }

    /// A handle observing whether this reader gets closed.
    #[must_use]
    pub fn close_flag(&self) -> CloseFlag {
        self.closed.clone()
    }
}

impl Reader for FailingReader {
    fn next(&mut self) -> DalResult<Record> {
        if let Some(record) = self.records.next() {
            return Ok(record);
        }
        Err(self.error.take().unwrap_or(DalError::NoMoreRecords))
    }

    fn close(&mut self) -> DalResult<()> {
        self.closed.set();
        Ok(())
    }
}
