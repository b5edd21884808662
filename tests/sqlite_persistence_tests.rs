#![cfg(feature = "sqlite")]

use estimate_tool::{
    ElementCatalog, ElementRequest, EstimateBuilder, EstimateStore, EstimatorError,
    MemoryEstimateStore, PersistenceError, ProjectEstimate, SqliteEstimateStore, UnitPrediction,
};
use tempfile::NamedTempFile;

fn committed_estimate() -> ProjectEstimate {
    let catalog = ElementCatalog::sample();
    let estimator = |_quantity: f64, _crew: u32| -> Result<UnitPrediction, EstimatorError> {
        Ok(UnitPrediction::new(1.0, 80.0))
    };
    let requests = vec![
        ElementRequest::new("Brickwork", 10.0, 2),
        ElementRequest::new("Flooring", 20.0, 1),
    ];
    EstimateBuilder::new(&catalog, &estimator)
        .build("SQLite Project", &requests, 15.0)
        .unwrap()
}

#[test]
fn sqlite_store_round_trip_estimate() {
    let file = NamedTempFile::new().unwrap();
    let store = SqliteEstimateStore::new(file.path()).unwrap();
    let estimate = committed_estimate();

    let id = store.save_estimate(&estimate).expect("save estimate");
    let loaded = store
        .load_estimate(id)
        .expect("load estimate")
        .expect("estimate exists");

    assert_eq!(loaded.id, id);
    assert_eq!(loaded.estimate, estimate);
    assert!(store.load_estimate(id + 1).unwrap().is_none());

    let listings = store.list_estimates().unwrap();
    assert_eq!(listings.len(), 1);
    assert_eq!(listings[0].summary.project_name, "SQLite Project");
    assert_eq!(listings[0].summary.peak_crew_size, 4);
}

#[test]
fn committing_creates_progress_records() {
    let store = SqliteEstimateStore::in_memory().unwrap();
    let id = store.save_estimate(&committed_estimate()).unwrap();

    let records = store.progress_records(id).unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].element_id, "Brickwork");
    assert_eq!(records[0].allocated_days, 5.0);
    assert_eq!(records[1].element_id, "Flooring");
    assert_eq!(records[1].allocated_days, 10.0);
    assert!(records.iter().all(|r| !r.deviation_notified));
}

#[test]
fn deviation_latch_survives_reopening_the_database() {
    let file = NamedTempFile::new().unwrap();
    let id = {
        let store = SqliteEstimateStore::new(file.path()).unwrap();
        let id = store.save_estimate(&committed_estimate()).unwrap();

        let update = store.update_progress(id, "Brickwork", 6.0).unwrap().unwrap();
        assert!(update.event.is_some());
        assert!(update.record.deviation_notified);
        id
    };

    let store = SqliteEstimateStore::new(file.path()).unwrap();
    let update = store.update_progress(id, "Brickwork", 9.0).unwrap().unwrap();
    assert!(update.event.is_none());
    assert_eq!(update.record.actual_days, 9.0);

    let records = store.progress_records(id).unwrap();
    assert!(records[0].deviation_notified);
    assert!(!records[1].deviation_notified);
}

#[test]
fn unknown_element_and_estimate_are_reported() {
    let store = SqliteEstimateStore::in_memory().unwrap();
    let id = store.save_estimate(&committed_estimate()).unwrap();

    assert!(store.update_progress(id, "Windows", 1.0).unwrap().is_none());
    assert!(matches!(
        store.update_progress(id + 7, "Brickwork", 1.0),
        Err(PersistenceError::NotFound(_))
    ));
    assert!(matches!(
        store.progress_records(id + 7),
        Err(PersistenceError::NotFound(_))
    ));
    assert!(matches!(
        store.update_progress(id, "Brickwork", -1.0),
        Err(PersistenceError::InvalidData(_))
    ));
}

#[test]
fn memory_store_applies_the_same_latch() {
    let store = MemoryEstimateStore::new();
    let id = store.save_estimate(&committed_estimate()).unwrap();

    let first = store.update_progress(id, "Flooring", 12.0).unwrap().unwrap();
    let second = store.update_progress(id, "Flooring", 15.0).unwrap().unwrap();
    assert!(first.event.is_some());
    assert!(second.event.is_none());
    assert_eq!(store.progress_records(id).unwrap()[1].actual_days, 15.0);
}

#[test]
fn concurrent_reports_notify_once() {
    let store = std::sync::Arc::new(SqliteEstimateStore::in_memory().unwrap());
    let id = store.save_estimate(&committed_estimate()).unwrap();

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let store = store.clone();
            std::thread::spawn(move || {
                store
                    .update_progress(id, "Brickwork", 6.0 + f64::from(i))
                    .unwrap()
                    .unwrap()
                    .event
                    .is_some()
            })
        })
        .collect();
    let events = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|emitted| *emitted)
        .count();
    assert_eq!(events, 1);
}
