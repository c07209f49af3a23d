//! Transactions and the coordinator contract.
//!
//! A transaction is a session scoped to an isolation level. The
//! coordinator runs a unit-of-work callback inside a transaction,
//! hands it a session of the chosen flavor, and owns commit/rollback
//! mechanics; those mechanics are the driver's concern, not this
//! crate's.

use crate::context::Context;
use crate::error::DalResult;
use crate::session::{ReadonlySession, ReadwriteSession};

/// Isolation level a transaction runs under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IsolationLevel {
    /// Readers see a consistent snapshot taken at transaction start.
    #[default]
    Snapshot,
    /// Readers see only committed data, re-read per statement.
    ReadCommitted,
    /// Full serializability.
    Serializable,
}

/// Options for entering a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionOptions {
    /// Whether the transaction is read-only.
    pub readonly: bool,
    /// Whether the transaction may span partitions/entity groups.
    pub cross_group: bool,
    /// Requested isolation level.
    pub isolation_level: IsolationLevel,
    /// How many times the driver may retry the unit of work on
    /// contention.
    pub attempts: u32,
}

impl Default for TransactionOptions {
    fn default() -> Self {
        Self {
            readonly: false,
            cross_group: false,
            isolation_level: IsolationLevel::default(),
            attempts: 1,
        }
    }
}

impl TransactionOptions {
    /// Creates options with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the transaction read-only.
    #[must_use]
    pub const fn readonly(mut self) -> Self {
        self.readonly = true;
        self
    }

    /// Allows the transaction to span partitions/entity groups.
    #[must_use]
    pub const fn cross_group(mut self) -> Self {
        self.cross_group = true;
        self
    }

    /// Sets the isolation level.
    #[must_use]
    pub const fn isolation_level(mut self, level: IsolationLevel) -> Self {
        self.isolation_level = level;
        self
    }

    /// Sets the contention retry budget.
    #[must_use]
    pub const fn attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts;
        self
    }

    /// Whether the transaction is read-only.
    #[must_use]
    pub const fn is_readonly(self) -> bool {
        self.readonly
    }

    /// Whether the transaction may span partitions/entity groups.
    #[must_use]
    pub const fn is_cross_group(self) -> bool {
        self.cross_group
    }
}

/// An entered transaction, whatever its session flavor.
pub trait Transaction {
    /// The options this transaction was entered with.
    fn options(&self) -> &TransactionOptions;

    /// The isolation level this transaction runs under.
    fn isolation_level(&self) -> IsolationLevel {
        self.options().isolation_level
    }
}

/// A transaction granting read-only session capabilities.
pub trait ReadonlyTransaction: Transaction + ReadonlySession {}

impl<T: Transaction + ReadonlySession + ?Sized> ReadonlyTransaction for T {}

/// A transaction granting read-write session capabilities.
pub trait ReadwriteTransaction: Transaction + ReadwriteSession {}

impl<T: Transaction + ReadwriteSession + ?Sized> ReadwriteTransaction for T {}

/// Unit of work run inside a read-only transaction.
pub type RoTxWorker<'a> =
    dyn FnMut(&Context, &dyn ReadonlyTransaction) -> DalResult<()> + 'a;

/// Unit of work run inside a read-write transaction.
pub type RwTxWorker<'a> =
    dyn FnMut(&Context, &dyn ReadwriteTransaction) -> DalResult<()> + 'a;

/// Runs units of work inside transactions.
///
/// The coordinator supplies the worker with a session scoped to the
/// chosen isolation level and a context that carries the transaction
/// marker (see [`Context::with_transaction`]).
pub trait TransactionCoordinator {
    /// Runs a unit of work inside a read-only transaction.
    fn run_readonly_transaction(
        &self,
        ctx: &Context,
        worker: &mut RoTxWorker<'_>,
        options: TransactionOptions,
    ) -> DalResult<()>;

    /// Runs a unit of work inside a read-write transaction.
    fn run_readwrite_transaction(
        &self,
        ctx: &Context,
        worker: &mut RwTxWorker<'_>,
        options: TransactionOptions,
    ) -> DalResult<()>;
}

/// A full database driver: a transaction coordinator that is also a
/// read-write session for non-transactional use.
pub trait Database: TransactionCoordinator + ReadwriteSession {}

impl<T: TransactionCoordinator + ReadwriteSession + ?Sized> Database for T {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options_are_readwrite_single_group() {
        let options = TransactionOptions::new();
        assert!(!options.is_readonly());
        assert!(!options.is_cross_group());
        assert_eq!(options.isolation_level, IsolationLevel::Snapshot);
        assert_eq!(options.attempts, 1);
    }

    #[test]
    fn readonly_option() {
        assert!(TransactionOptions::new().readonly().is_readonly());
        assert!(!TransactionOptions::new().is_readonly());
    }

    #[test]
    fn cross_group_option() {
        assert!(TransactionOptions::new().cross_group().is_cross_group());
        assert!(!TransactionOptions::new().is_cross_group());
    }

    #[test]
    fn options_compose() {
        let options = TransactionOptions::new()
            .readonly()
            .cross_group()
            .isolation_level(IsolationLevel::Serializable)
            .attempts(3);
        assert!(options.is_readonly());
        assert!(options.is_cross_group());
        assert_eq!(options.isolation_level, IsolationLevel::Serializable);
        assert_eq!(options.attempts, 3);
    }
}
