/// Integration tests for the PostgreSQL alert store
///
/// Tests verify:
/// 1. Schema creation is idempotent
/// 2. The partial unique index allows one pending alert per hazard
/// 3. Approve/decline free the slot for the next breach
/// 4. A monitor running against the database deduplicates the same way
///
/// Prerequisites:
/// - PostgreSQL running and reachable
/// - DATABASE_URL set in .env
///
/// Run with: cargo test --test postgres_store -- --ignored --test-threads=1

use chrono::{TimeZone, Utc};
use postgres::{Client, NoTls};
use std::env;

use hazmon_service::analysis::risk::NoJitter;
use hazmon_service::hazards::HazardThresholds;
use hazmon_service::model::{Hazard, NewAlert, SensorReading, Severity};
use hazmon_service::monitor::Monitor;
use hazmon_service::store::{AlertStore, InsertOutcome, PgAlertStore, StoreError};

// ---------------------------------------------------------------------------
// Test Helpers
// ---------------------------------------------------------------------------

fn database_url() -> String {
    dotenv::dotenv().ok();
    env::var("DATABASE_URL").expect("DATABASE_URL must be set")
}

fn setup_store() -> PgAlertStore {
    let mut client =
        Client::connect(&database_url(), NoTls).expect("Failed to connect to test database");
    client
        .batch_execute(hazmon_service::store::pg::SCHEMA_SQL)
        .expect("Failed to apply alerts schema");
    client.execute("DELETE FROM alerts", &[]).expect("Failed to clear alerts");
    PgAlertStore::from_client(client)
}

// ---------------------------------------------------------------------------
// Store behavior
// ---------------------------------------------------------------------------

#[test]
#[ignore] // Requires a running PostgreSQL instance
fn test_schema_is_idempotent() {
    let mut store = setup_store();
    store.ensure_schema().expect("first run");
    store.ensure_schema().expect("second run");
}

#[test]
#[ignore] // Requires a running PostgreSQL instance
fn test_second_pending_insert_is_refused() {
    let mut store = setup_store();
    let first = store
        .insert_pending(NewAlert::threshold_breach(Hazard::Flood, 74.0, Severity::High))
        .unwrap();
    let record = match first {
        InsertOutcome::Created(record) => record,
        other => panic!("expected Created, got {:?}", other),
    };
    assert_eq!(record.hazard, Hazard::Flood);
    assert_eq!(record.message, "Flood threshold breached: 74.0");
    assert!(record.is_pending());

    let second = store
        .insert_pending(NewAlert::threshold_breach(Hazard::Flood, 90.0, Severity::Critical))
        .unwrap();
    assert_eq!(second, InsertOutcome::AlreadyPending);

    // Other hazards have their own slot.
    let fire = store
        .insert_pending(NewAlert::threshold_breach(Hazard::Fire, 81.0, Severity::High))
        .unwrap();
    assert!(matches!(fire, InsertOutcome::Created(_)));
    assert_eq!(store.pending().unwrap().len(), 2);
}

#[test]
#[ignore] // Requires a running PostgreSQL instance
fn test_resolution_frees_the_slot() {
    let mut store = setup_store();
    let id = match store
        .insert_pending(NewAlert::threshold_breach(Hazard::Earthquake, 5.5, Severity::High))
        .unwrap()
    {
        InsertOutcome::Created(record) => record.id,
        other => panic!("expected Created, got {:?}", other),
    };

    let approved = store.approve(id).unwrap();
    assert!(approved.approved);
    assert!(!store.has_pending(Hazard::Earthquake).unwrap());
    assert_eq!(store.decline(id), Err(StoreError::NotPending(id)));

    let again = store
        .insert_pending(NewAlert::threshold_breach(Hazard::Earthquake, 6.1, Severity::Critical))
        .unwrap();
    assert!(matches!(again, InsertOutcome::Created(_)));
}

#[test]
#[ignore] // Requires a running PostgreSQL instance
fn test_monitor_against_database() {
    let store = setup_store();
    let mut monitor = Monitor::new(HazardThresholds::default(), store, Box::new(NoJitter), 60);
    let start = Utc.with_ymd_and_hms(2024, 7, 14, 9, 30, 0).unwrap();

    for i in 0..10 {
        let reading = SensorReading::new(1.0, 20.0, 88.0, start + chrono::Duration::seconds(i * 2));
        monitor.tick(&reading, None).unwrap();
    }

    let pending = monitor.store_mut().pending().unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].hazard, Hazard::Fire);
    assert_eq!(monitor.stats().store_failures, 0);
}

#[test]
#[ignore] // Requires a running PostgreSQL instance
fn test_unreachable_database_is_connection_error() {
    let url = "host=127.0.0.1 port=1 user=nobody dbname=none connect_timeout=1";
    let result = PgAlertStore::connect(url);
    assert!(matches!(result, Err(StoreError::Connection(_))));
}
