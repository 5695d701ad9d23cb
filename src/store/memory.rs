/// In-memory alert store.
///
/// Enforces the same "one pending alert per hazard" rule as the database
/// index, so monitor tests exercise the real conditional-insert semantics.

use chrono::Utc;

use super::{AlertStore, InsertOutcome, StoreError};
use crate::model::{AlertRecord, Hazard, NewAlert};

#[derive(Debug, Default)]
pub struct MemoryAlertStore {
    records: Vec<AlertRecord>,
    next_id: i64,
}

impl MemoryAlertStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every record ever inserted, oldest first.
    pub fn all(&self) -> &[AlertRecord] {
        &self.records
    }

    fn resolve(&mut self, id: i64, approve: bool) -> Result<AlertRecord, StoreError> {
        let record = self
            .records
            .iter_mut()
            .find(|r| r.id == id && r.is_pending())
            .ok_or(StoreError::NotPending(id))?;
        if approve {
            record.approved = true;
        } else {
            record.declined = true;
        }
        Ok(record.clone())
    }
}

impl AlertStore for MemoryAlertStore {
    fn has_pending(&mut self, hazard: Hazard) -> Result<bool, StoreError> {
        Ok(self.records.iter().any(|r| r.hazard == hazard && r.is_pending()))
    }

    fn insert_pending(&mut self, alert: NewAlert) -> Result<InsertOutcome, StoreError> {
        if self.has_pending(alert.hazard)? {
            return Ok(InsertOutcome::AlreadyPending);
        }
        self.next_id += 1;
        let record = AlertRecord {
            id: self.next_id,
            hazard: alert.hazard,
            severity: alert.severity,
            message: alert.message,
            location: alert.location,
            approved: false,
            declined: false,
            created_at: Utc::now(),
        };
        self.records.push(record.clone());
        Ok(InsertOutcome::Created(record))
    }

    fn approve(&mut self, id: i64) -> Result<AlertRecord, StoreError> {
        self.resolve(id, true)
    }

    fn decline(&mut self, id: i64) -> Result<AlertRecord, StoreError> {
        self.resolve(id, false)
    }

    fn pending(&mut self) -> Result<Vec<AlertRecord>, StoreError> {
        Ok(self
            .records
            .iter()
            .rev()
            .filter(|r| r.is_pending())
            .cloned()
            .collect())
    }
}
