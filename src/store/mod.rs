//! Alert record persistence.
//!
//! The store, not the in-process gate, is what guarantees at most one
//! pending alert per hazard: `insert_pending` is a conditional insert that
//! reports `AlreadyPending` instead of writing a duplicate. Several monitors
//! (say, an operator console and a field simulator) can share one store.
//!
//! Implementations:
//! - `memory::MemoryAlertStore`: in-process, for tests and local runs.
//! - `pg::PgAlertStore`: PostgreSQL, uniqueness via a partial index.

pub mod memory;
pub mod pg;

use std::fmt;

use crate::model::{AlertRecord, Hazard, NewAlert};

pub use memory::MemoryAlertStore;
pub use pg::PgAlertStore;

/// Result of a conditional insert.
#[derive(Debug, Clone, PartialEq)]
pub enum InsertOutcome {
    Created(AlertRecord),
    /// An unapproved alert of the same hazard already exists; nothing written.
    AlreadyPending,
}

/// Alert record store offered by the persistence collaborator.
pub trait AlertStore {
    /// Whether an unapproved, undeclined alert of this hazard exists.
    fn has_pending(&mut self, hazard: Hazard) -> Result<bool, StoreError>;

    /// Writes the alert unless one is already pending for its hazard.
    fn insert_pending(&mut self, alert: NewAlert) -> Result<InsertOutcome, StoreError>;

    /// Operator approval. Fails if the alert is not pending.
    fn approve(&mut self, id: i64) -> Result<AlertRecord, StoreError>;

    /// Operator decline. Fails if the alert is not pending.
    fn decline(&mut self, id: i64) -> Result<AlertRecord, StoreError>;

    /// All pending alerts, newest first.
    fn pending(&mut self) -> Result<Vec<AlertRecord>, StoreError>;
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum StoreError {
    /// The backing database could not be reached or dropped the connection.
    Connection(String),
    /// A statement failed, or returned rows that could not be decoded.
    Query(String),
    /// No pending alert with this id (unknown, or already resolved).
    NotPending(i64),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Connection(msg) => write!(f, "Connection error: {}", msg),
            StoreError::Query(msg) => write!(f, "Query error: {}", msg),
            StoreError::NotPending(id) => write!(f, "Alert {} is not pending", id),
        }
    }
}

impl std::error::Error for StoreError {}
