/// PostgreSQL alert store.
///
/// Schema lives in `sql/001_alerts.sql`. The partial unique index
/// `alerts_one_pending_per_hazard` turns `insert_pending` into a conditional
/// insert: `ON CONFLICT ... DO NOTHING RETURNING` yields no row when another
/// writer already holds the pending slot for the hazard.

use chrono::{DateTime, Utc};
use postgres::{Client, NoTls, Row};

use super::{AlertStore, InsertOutcome, StoreError};
use crate::model::{AlertRecord, Hazard, NewAlert, Severity};

pub const SCHEMA_SQL: &str = include_str!("../../sql/001_alerts.sql");

const RECORD_COLUMNS: &str =
    "id, hazard, severity, message, location, approved, declined, created_at";

pub struct PgAlertStore {
    client: Client,
}

impl From<postgres::Error> for StoreError {
    fn from(err: postgres::Error) -> Self {
        if err.is_closed() {
            StoreError::Connection(err.to_string())
        } else {
            StoreError::Query(err.to_string())
        }
    }
}

impl PgAlertStore {
    /// Connects without TLS, matching the local/dev deployment.
    pub fn connect(database_url: &str) -> Result<Self, StoreError> {
        let client = Client::connect(database_url, NoTls)
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        Ok(Self { client })
    }

    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    /// Creates the table and index if they do not exist yet.
    pub fn ensure_schema(&mut self) -> Result<(), StoreError> {
        self.client.batch_execute(SCHEMA_SQL)?;
        Ok(())
    }

    fn resolve(&mut self, id: i64, column: &str) -> Result<AlertRecord, StoreError> {
        let sql = format!(
            "UPDATE alerts SET {} = TRUE
             WHERE id = $1 AND NOT approved AND NOT declined
             RETURNING {}",
            column, RECORD_COLUMNS
        );
        match self.client.query_opt(sql.as_str(), &[&id])? {
            Some(row) => record_from_row(&row),
            None => Err(StoreError::NotPending(id)),
        }
    }
}

fn record_from_row(row: &Row) -> Result<AlertRecord, StoreError> {
    let hazard: String = row.try_get(1)?;
    let severity: String = row.try_get(2)?;
    let created_at: DateTime<Utc> = row.try_get(7)?;
    Ok(AlertRecord {
        id: row.try_get(0)?,
        hazard: Hazard::parse(&hazard)
            .ok_or_else(|| StoreError::Query(format!("unknown hazard '{}'", hazard)))?,
        severity: Severity::parse(&severity)
            .ok_or_else(|| StoreError::Query(format!("unknown severity '{}'", severity)))?,
        message: row.try_get(3)?,
        location: row.try_get(4)?,
        approved: row.try_get(5)?,
        declined: row.try_get(6)?,
        created_at,
    })
}

impl AlertStore for PgAlertStore {
    fn has_pending(&mut self, hazard: Hazard) -> Result<bool, StoreError> {
        let row = self.client.query_one(
            "SELECT EXISTS (
                 SELECT 1 FROM alerts
                 WHERE hazard = $1 AND NOT approved AND NOT declined
             )",
            &[&hazard.as_str()],
        )?;
        Ok(row.try_get(0)?)
    }

    fn insert_pending(&mut self, alert: NewAlert) -> Result<InsertOutcome, StoreError> {
        let sql = format!(
            "INSERT INTO alerts (hazard, severity, message, location)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (hazard) WHERE NOT approved AND NOT declined DO NOTHING
             RETURNING {}",
            RECORD_COLUMNS
        );
        let row = self.client.query_opt(
            sql.as_str(),
            &[
                &alert.hazard.as_str(),
                &alert.severity.as_str(),
                &alert.message,
                &alert.location,
            ],
        )?;
        match row {
            Some(row) => Ok(InsertOutcome::Created(record_from_row(&row)?)),
            None => Ok(InsertOutcome::AlreadyPending),
        }
    }

    fn approve(&mut self, id: i64) -> Result<AlertRecord, StoreError> {
        self.resolve(id, "approved")
    }

    fn decline(&mut self, id: i64) -> Result<AlertRecord, StoreError> {
        self.resolve(id, "declined")
    }

    fn pending(&mut self) -> Result<Vec<AlertRecord>, StoreError> {
        let sql = format!(
            "SELECT {} FROM alerts
             WHERE NOT approved AND NOT declined
             ORDER BY created_at DESC, id DESC",
            RECORD_COLUMNS
        );
        self.client
            .query(sql.as_str(), &[])?
            .iter()
            .map(record_from_row)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_declares_partial_unique_index() {
        assert!(
            SCHEMA_SQL.contains("CREATE UNIQUE INDEX IF NOT EXISTS alerts_one_pending_per_hazard")
        );
        assert!(SCHEMA_SQL.contains("WHERE NOT approved AND NOT declined"));
    }

    #[test]
    fn test_schema_hazard_check_matches_model() {
        for hazard in Hazard::ALL {
            assert!(
                SCHEMA_SQL.contains(&format!("'{}'", hazard.as_str())),
                "schema CHECK constraint missing '{}'",
                hazard
            );
        }
    }
}
