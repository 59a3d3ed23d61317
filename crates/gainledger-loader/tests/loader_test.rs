//! Integration tests for the loader crate.

use chrono::{TimeZone, Utc};
use gainledger_core::{normalize_records, CommodityStandard, LocationId, TimeRange};
use gainledger_loader::{CsvStore, SourceError, TransactionSource};
use std::io::Write;
use std::path::{Path, PathBuf};

fn fixtures_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn open_fixtures() -> CsvStore {
    CsvStore::open(&fixtures_path("exchanges.csv"), &fixtures_path("warehouses.csv"))
        .expect("fixtures should load")
}

#[test]
fn test_fetch_for_location() {
    let store = open_fixtures();
    let records = store
        .fetch_transactions(&[LocationId::from("WH_A")], &TimeRange::all())
        .unwrap();

    let ids: Vec<_> = records.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["EX_001", "EX_002", "EX_004"]);
    assert_eq!(records[0].brand.as_deref(), Some("Prairie Co"));
    assert_eq!(records[0].unit.as_deref(), Some("bushels"));
    assert!(records[0].batch_id.is_none());
}

#[test]
fn test_fetch_with_range() {
    let store = open_fixtures();
    let range = TimeRange::new(
        Some(Utc.with_ymd_and_hms(2023, 6, 10, 0, 0, 0).unwrap()),
        Some(Utc.with_ymd_and_hms(2023, 7, 5, 0, 0, 0).unwrap()),
    );
    let records = store
        .fetch_transactions(&[LocationId::from("WH_A"), LocationId::from("WH_B")], &range)
        .unwrap();

    let ids: Vec<_> = records.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["EX_002", "EX_003"]);
}

#[test]
fn test_fetched_records_normalize() {
    let store = open_fixtures();
    let records = store
        .fetch_transactions(&[LocationId::from("WH_B")], &TimeRange::all())
        .unwrap();
    let txns = normalize_records(records).unwrap();

    assert_eq!(txns.len(), 2);
    assert_eq!(txns[0].standard, CommodityStandard::Serialized);
    assert_eq!(txns[0].serial_ids, vec!["VIN-1", "VIN-2"]);
}

#[test]
fn test_directory_lookups() {
    let store = open_fixtures();
    assert!(store.location_exists(&LocationId::from("WH_A")).unwrap());
    assert!(!store.location_exists(&LocationId::from("WH_OTHER")).unwrap());
    assert!(!store.location_exists(&LocationId::sentinel()).unwrap());

    let acme = store.resolve_entity("ACME").unwrap().unwrap();
    assert_eq!(acme.name, "Acme Storage");
    assert!(acme.owns(&LocationId::from("WH_B")));
    assert!(store.resolve_entity("INITECH").unwrap().is_none());
}

#[test]
fn test_closed_store() {
    let mut store = open_fixtures();
    assert!(store.is_open());
    store.close();
    assert!(!store.is_open());
    assert!(matches!(
        store.fetch_transactions(&[LocationId::from("WH_A")], &TimeRange::all()),
        Err(SourceError::Closed)
    ));
    assert!(matches!(store.resolve_entity("ACME"), Err(SourceError::Closed)));
    // Closing twice is fine
    store.close();
}

#[test]
fn test_json_transactions() {
    let store = CsvStore::open(&fixtures_path("exchanges.json"), &fixtures_path("warehouses.csv")).unwrap();
    let records = store
        .fetch_transactions(&[LocationId::from("WH_A")], &TimeRange::all())
        .unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].batch_id.as_deref(), Some("B-2021"));

    let txns = normalize_records(records).unwrap();
    assert!(txns[0].is_batched());
}

#[test]
fn test_json_export_with_numbers_and_id_lists() {
    let records = CsvStore::read_records(&fixtures_path("exchanges_export.json")).unwrap();
    assert_eq!(records.len(), 3);
    assert_eq!(records[0].quantity, "2");
    assert_eq!(records[0].total_price, "400000.5");
    assert_eq!(records[0].serial_ids.as_deref(), Some("VIN-10;VIN-11"));
    assert_eq!(records[2].serial_ids, None);

    let txns = normalize_records(records).unwrap();
    assert_eq!(txns.len(), 3);
    assert_eq!(txns[0].serial_ids, vec!["VIN-10".to_string(), "VIN-11".to_string()]);
    assert_eq!(txns[0].total_price.to_string(), "400000.5");
    assert_eq!(txns[1].total_price.to_string(), "250000.00");
    assert_eq!(txns[2].quantity.to_string(), "100.5");
}

#[test]
fn test_read_records_without_directory() {
    let records = CsvStore::read_records(&fixtures_path("exchanges.csv")).unwrap();
    assert_eq!(records.len(), 5);
}

#[test]
fn test_missing_file() {
    let err = CsvStore::open(Path::new("/nonexistent/exchanges.csv"), &fixtures_path("warehouses.csv"))
        .unwrap_err();
    assert!(matches!(err, SourceError::Io { .. }));
    assert!(err.to_string().contains("/nonexistent/exchanges.csv"));
}

#[test]
fn test_malformed_csv() {
    let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    writeln!(file, "id,source,destination,item_type,standard,quantity,total_price,timestamp").unwrap();
    writeln!(file, "EX1,0x0000,WH_A,Wheat,bulk,10").unwrap();
    file.flush().unwrap();

    let err = CsvStore::open(file.path(), &fixtures_path("warehouses.csv")).unwrap_err();
    assert!(matches!(err, SourceError::Csv { .. }));
}

#[test]
fn test_conflicting_directory() {
    let mut dir = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    writeln!(dir, "location_id,entity_id,entity_name").unwrap();
    writeln!(dir, "WH_A,ACME,Acme").unwrap();
    writeln!(dir, "WH_A,GLOBEX,Globex").unwrap();
    dir.flush().unwrap();

    let err = CsvStore::open(&fixtures_path("exchanges.csv"), dir.path()).unwrap_err();
    assert!(matches!(err, SourceError::ConflictingOwner { .. }));
}
