//! # unidal_testkit
//!
//! Test doubles for the unidal data-access core:
//! - Canned [`Reader`](unidal_core::Reader) implementations for
//!   exercising callers of `select`
//! - [`MemoryDb`], an in-memory database implementing the full
//!   read-write session and transaction-coordinator contracts
//!
//! Intended for tests of code written against the session traits and
//! for driver authors checking their understanding of the contracts.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod memory;
mod readers;

pub use memory::{MemoryDb, MemoryTransaction};
pub use readers::{CloseFlag, FailingReader, RecordsReader};
