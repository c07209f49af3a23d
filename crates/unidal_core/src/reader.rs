//! Pull-based result readers and bulk collection helpers.

use tracing::debug;

use crate::error::{DalError, DalResult};
use crate::key::IdValue;
use crate::record::Record;

/// Sequential iterator over query results.
///
/// `next` yields one record per call and signals exhaustion with
/// [`DalError::NoMoreRecords`]; any other error terminates iteration.
/// `close` must be called exactly once when iteration ends, whether it
/// ended successfully or not, to release backend resources.
pub trait Reader {
    /// Returns the next record, or [`DalError::NoMoreRecords`] when the
    /// result set is exhausted.
    fn next(&mut self) -> DalResult<Record>;

    /// Releases backend resources held by the reader.
    fn close(&mut self) -> DalResult<()>;
}

/// Collects up to `limit` records from a reader.
///
/// A non-positive limit collects until exhaustion. Exhaustion is
/// success; every other error is propagated unchanged. The reader is
/// closed on every terminating path.
pub fn read_all_records(reader: &mut dyn Reader, limit: i64) -> DalResult<Vec<Record>> {
    let mut records = Vec::new();
    let outcome = collect(reader, limit, |record| records.push(record));
    let closed = reader.close();
    outcome?;
    closed?;
    debug!(count = records.len(), "collected records from reader");
    Ok(records)
}

/// Collects up to `limit` leaf identifiers from a reader.
///
/// Same termination and closing rules as [`read_all_records`].
pub fn read_all_ids(reader: &mut dyn Reader, limit: i64) -> DalResult<Vec<IdValue>> {
    let mut ids = Vec::new();
    let outcome = collect(reader, limit, |record| ids.push(record.key().id().clone()));
    let closed = reader.close();
    outcome?;
    closed?;
    debug!(count = ids.len(), "collected ids from reader");
    Ok(ids)
}

fn collect(
    reader: &mut dyn Reader,
    limit: i64,
    mut push: impl FnMut(Record),
) -> DalResult<()> {
    let mut remaining = if limit > 0 { limit } else { i64::MAX };
    while remaining > 0 {
        match reader.next() {
            Ok(record) => push(record),
            Err(err) if err.is_no_more_records() => return Ok(()),
            Err(err) => return Err(err),
        }
        remaining -= 1;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::Key;

    struct FakeReader {
        records: Vec<Record>,
        error: Option<DalError>,
        closed: bool,
    }

    impl FakeReader {
        fn with_records(count: usize) -> Self {
            let records = (0..count)
                .map(|i| Record::new(Key::with_int_id("users", i as i64)))
                .collect();
            Self {
                records,
                error: None,
                closed: false,
            }
        }

        fn failing_after(count: usize, error: DalError) -> Self {
            let mut reader = Self::with_records(count);
            reader.error = Some(error);
            reader
        }
    }

    impl Reader for FakeReader {
        fn next(&mut self) -> DalResult<Record> {
            if self.records.is_empty() {
                return Err(self.error.take().unwrap_or(DalError::NoMoreRecords));
            }
            Ok(self.records.remove(0))
        }

        fn close(&mut self) -> DalResult<()> {
            assert!(!self.closed, "reader closed twice");
            self.closed = true;
            Ok(())
        }
    }

    #[test]
    fn unbounded_collects_until_exhaustion_and_closes() {
        let mut reader = FakeReader::with_records(3);
        let records = read_all_records(&mut reader, -1).unwrap();
        assert_eq!(records.len(), 3);
        assert!(reader.closed);
    }

    #[test]
    fn positive_limit_caps_next_calls() {
        let mut reader = FakeReader::with_records(5);
        let records = read_all_records(&mut reader, 2).unwrap();
        assert_eq!(records.len(), 2);
        assert!(reader.closed);
        // The remaining records were never pulled.
        assert_eq!(reader.records.len(), 3);
    }

    #[test]
    fn non_exhaustion_errors_propagate_and_still_close() {
        let mut reader = FakeReader::failing_after(1, DalError::backend("socket closed"));
        let err = read_all_records(&mut reader, 0).unwrap_err();
        assert!(matches!(err, DalError::Backend(_)));
        assert!(reader.closed);
    }

    #[test]
    fn ids_are_collected_from_leaf_keys() {
        let mut reader = FakeReader::with_records(2);
        let ids = read_all_ids(&mut reader, -1).unwrap();
        assert_eq!(ids, vec![IdValue::Int(0), IdValue::Int(1)]);
        assert!(reader.closed);
    }

    #[test]
    fn zero_limit_is_unbounded() {
        let mut reader = FakeReader::with_records(4);
        let records = read_all_records(&mut reader, 0).unwrap();
        assert_eq!(records.len(), 4);
    }
}
