//! Call-scoped context carrying the current transaction.
//!
//! A [`Context`] is an immutable scope chain threaded through a call
//! chain, so concurrent calls each see their own transaction scope and
//! there is no process-wide state. Entering a transaction derives a
//! child context that remembers both the transaction and the context
//! as it was before entering it.

use std::fmt;
use std::sync::Arc;

use crate::transaction::Transaction;

/// A shareable handle to an entered transaction.
pub type SharedTransaction = Arc<dyn Transaction + Send + Sync>;

struct Scope {
    transaction: Option<SharedTransaction>,
    parent: Option<Context>,
}

/// An immutable scope chain propagating the "current transaction"
/// marker through a call chain.
///
/// Equality is identity: two contexts compare equal iff they are the
/// same scope, which lets callers check they got back exactly the
/// context they had before entering a transaction.
#[derive(Clone)]
pub struct Context {
    inner: Arc<Scope>,
}

impl Context {
    /// The root context: no transaction, no parent.
    #[must_use]
    pub fn background() -> Self {
        Self {
            inner: Arc::new(Scope {
                transaction: None,
                parent: None,
            }),
        }
    }

    /// Derives a context scoped to an entered transaction.
    ///
    /// Coordinators call this before invoking a unit of work, so the
    /// whole chain below the worker can discover the transaction.
    /// Nested entry is allowed; this core neither forbids nor flattens
    /// it.
    #[must_use]
    pub fn with_transaction(&self, transaction: SharedTransaction) -> Self {
        Self {
            inner: Arc::new(Scope {
                transaction: Some(transaction),
                parent: Some(self.clone()),
            }),
        }
    }

    /// The nearest enclosing transaction, if any.
    #[must_use]
    pub fn transaction(&self) -> Option<&SharedTransaction> {
        if let Some(transaction) = &self.inner.transaction {
            return Some(transaction);
        }
        self.inner.parent.as_ref().and_then(Context::transaction)
    }

    /// Whether some enclosing scope entered a transaction.
    #[must_use]
    pub fn in_transaction(&self) -> bool {
        self.transaction().is_some()
    }

    /// The context as it was before entering the current transaction.
    ///
    /// Outside any transaction this returns the context itself.
    #[must_use]
    pub fn non_transactional(&self) -> Context {
        match (&self.inner.transaction, &self.inner.parent) {
            (Some(_), Some(parent)) => parent.clone(),
            _ => self.clone(),
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::background()
    }
}

impl PartialEq for Context {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Context {}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("in_transaction", &self.in_transaction())
            .finish()
    }
}
