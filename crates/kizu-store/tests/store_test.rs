//! Integration tests for the vehicle store

use tempfile::tempdir;

use kizu_domain::VehicleRecordRepository;
use kizu_store::{MemoryKvStore, VehicleStore, VEHICLES_KEY};
use kizu_types::{AnalysisResult, Severity, StoreError, VehicleStatus};

fn clean_result() -> AnalysisResult {
    AnalysisResult {
        description: "No visible damage".to_string(),
        ..Default::default()
    }
}

/// Create -> upload photos -> record analysis lifecycle
#[test]
fn test_record_lifecycle() {
    let mut store = VehicleStore::in_memory();

    // New records start pending with no photos or stages
    let id = store
        .create("Toyota", "Camry", "ABC123")
        .expect("create should succeed");
    let record = store.get(&id).expect("record should exist");
    assert_eq!(record.make, "Toyota");
    assert_eq!(record.status, VehicleStatus::PendingPhotos);
    assert!(record.photos.is_empty());
    assert!(record.stages.is_empty());

    // Uploading photos completes the record but records no stage
    let photos = vec!["p1".to_string(), "p2".to_string(), "p3".to_string()];
    store
        .set_photos(&id, photos.clone())
        .expect("set_photos should succeed");
    let record = store.get(&id).expect("record should exist");
    assert_eq!(record.status, VehicleStatus::Completed);
    assert_eq!(record.photos, photos);
    assert!(record.stages.is_empty());

    // Submitting analysis appends stage 1 with a frozen photo snapshot
    let results = vec![clean_result(), clean_result(), clean_result()];
    let stage_number = store
        .record_analysis(&id, results)
        .expect("record_analysis should succeed");
    assert_eq!(stage_number, 1);

    let record = store.get(&id).expect("record should exist");
    assert_eq!(record.status, VehicleStatus::Analyzed);
    assert_eq!(record.stages.len(), 1);
    assert_eq!(record.stages[0].stage_number, 1);
    assert_eq!(record.stages[0].photos, photos);
    assert!(record.stages[0]
        .results
        .iter()
        .all(|r| !r.has_damage && r.severity == Severity::None));
}

/// Status equals analyzed exactly when stages exist
#[test]
fn test_status_tracks_stage_count() {
    let mut store = VehicleStore::in_memory();
    let id = store.create("Honda", "Fit", "XYZ789").expect("create");

    for pass in 1..=3u32 {
        store
            .set_photos(&id, vec![format!("photo-{}", pass)])
            .expect("set_photos");
        let record = store.get(&id).expect("record");
        assert_eq!(
            record.status == VehicleStatus::Analyzed,
            !record.stages.is_empty()
        );

        let n = store
            .record_analysis(&id, vec![clean_result()])
            .expect("record_analysis");
        assert_eq!(n, pass);
        let record = store.get(&id).expect("record");
        assert_eq!(record.status, VehicleStatus::Analyzed);
    }
}

/// Stage numbers increase strictly and photo snapshots stay frozen
#[test]
fn test_stage_snapshots_are_immutable() {
    let mut store = VehicleStore::in_memory();
    let id = store.create("Mazda", "Demio", "DEF456").expect("create");

    store
        .set_photos(&id, vec!["p1".to_string(), "p2".to_string(), "p3".to_string()])
        .expect("set_photos");
    store
        .record_analysis(&id, vec![clean_result(); 3])
        .expect("first analysis");

    // Replace one photo; the recorded stage must keep the original set
    store
        .set_photos(&id, vec!["p1".to_string(), "p2".to_string(), "p4".to_string()])
        .expect("set_photos");
    store
        .record_analysis(&id, vec![clean_result(); 3])
        .expect("second analysis");

    let record = store.get(&id).expect("record");
    assert_eq!(record.stages[0].stage_number, 1);
    assert_eq!(record.stages[1].stage_number, 2);
    assert_eq!(record.stages[0].photos[2], "p3");
    assert_eq!(record.stages[1].photos[2], "p4");
}

/// Severity is normalized to none when no damage was reported
#[test]
fn test_record_analysis_normalizes_severity() {
    let mut store = VehicleStore::in_memory();
    let id = store.create("Suzuki", "Swift", "GHI789").expect("create");
    store.set_photos(&id, vec!["p1".to_string()]).expect("set_photos");

    let denormalized = AnalysisResult {
        has_damage: false,
        severity: Severity::Severe,
        ..Default::default()
    };
    store
        .record_analysis(&id, vec![denormalized])
        .expect("record_analysis");

    let record = store.get(&id).expect("record");
    assert_eq!(record.stages[0].results[0].severity, Severity::None);
}

/// Comparison lands on the latest stage only
#[test]
fn test_set_latest_comparison_targets_last_stage() {
    let mut store = VehicleStore::in_memory();
    let id = store.create("Nissan", "Note", "JKL012").expect("create");

    // Zero stages: documented no-op
    store
        .set_latest_comparison(&id, "nothing yet")
        .expect("no-op on zero stages");
    assert!(store.get(&id).expect("record").stages.is_empty());

    store.set_photos(&id, vec!["p1".to_string()]).expect("set_photos");
    store.record_analysis(&id, vec![clean_result()]).expect("stage 1");
    store.record_analysis(&id, vec![clean_result()]).expect("stage 2");

    store
        .set_latest_comparison(&id, "second pass")
        .expect("set_latest_comparison");

    let record = store.get(&id).expect("record");
    assert_eq!(record.stages[0].comparison, None);
    assert_eq!(record.stages[1].comparison.as_deref(), Some("second pass"));
}

/// Unlike the legacy app, every id-addressed mutator reports NotFound for an
/// unknown id; setLatestComparison no longer fails silently.
#[test]
fn test_mutators_report_not_found_consistently() {
    let mut store = VehicleStore::in_memory();

    assert!(matches!(
        store.set_photos("missing", vec![]),
        Err(StoreError::NotFound(_))
    ));
    assert!(matches!(
        store.record_analysis("missing", vec![]),
        Err(StoreError::NotFound(_))
    ));
    assert!(matches!(
        store.set_latest_comparison("missing", "text"),
        Err(StoreError::NotFound(_))
    ));
}

/// Removing an unknown id is a no-op, not an error
#[test]
fn test_remove_unknown_id_is_noop() {
    let mut store = VehicleStore::in_memory();
    let id = store.create("Toyota", "Camry", "ABC123").expect("create");

    let removed = store.remove("no-such-id").expect("remove should not error");
    assert!(!removed);
    assert_eq!(store.count(), 1);

    let removed = store.remove(&id).expect("remove");
    assert!(removed);
    assert!(store.is_empty());
}

/// Duplicate registration numbers are permitted
#[test]
fn test_duplicate_registration_numbers_allowed() {
    let mut store = VehicleStore::in_memory();
    let first = store.create("Toyota", "Camry", "SAME123").expect("create");
    let second = store.create("Toyota", "Camry", "SAME123").expect("create");
    assert_ne!(first, second);
    assert_eq!(store.count(), 2);
}

/// Full collection survives reopen, in insertion order
#[test]
fn test_persistence_roundtrip() {
    let dir = tempdir().expect("tempdir");
    let first_id;
    let second_id;

    {
        let mut store = VehicleStore::open(dir.path().to_path_buf()).expect("open");
        first_id = store.create("Toyota", "Camry", "ABC123").expect("create");
        second_id = store.create("Honda", "Fit", "XYZ789").expect("create");
        store
            .set_photos(&first_id, vec!["p1".to_string()])
            .expect("set_photos");
        store
            .record_analysis(&first_id, vec![clean_result()])
            .expect("record_analysis");
        store.flush();
    }

    let store = VehicleStore::open(dir.path().to_path_buf()).expect("reopen");
    assert_eq!(store.count(), 2);

    let ids: Vec<String> = store.all().iter().map(|r| r.id.clone()).collect();
    assert_eq!(ids, vec![first_id.clone(), second_id]);

    let record = store.get(&first_id).expect("record");
    assert_eq!(record.status, VehicleStatus::Analyzed);
    assert_eq!(record.stages.len(), 1);
}

/// Corrupt stored blob initializes an empty repository instead of failing
#[test]
fn test_corrupt_blob_yields_empty_store() {
    let dir = tempdir().expect("tempdir");
    std::fs::write(dir.path().join("vehicles.json"), "{not json at all")
        .expect("write corrupt blob");

    let store = VehicleStore::open(dir.path().to_path_buf()).expect("open");
    assert!(store.is_empty());
}

/// Legacy blobs with double-encoded stage results still load
#[test]
fn test_legacy_double_encoded_results_load() {
    let legacy = r#"[{
        "id": "legacy-1",
        "make": "Toyota",
        "model": "Vitz",
        "registrationNumber": "OLD001",
        "photos": ["p1"],
        "status": "analyzed",
        "createdAt": "2024-11-20T09:00:00Z",
        "stages": [{
            "stageNumber": 1,
            "timestamp": "2024-11-20T09:05:00Z",
            "photos": ["p1"],
            "results": "[{\"hasDamage\":true,\"damageType\":\"Scratch\",\"severity\":\"minor\",\"description\":\"door scratch\"}]"
        }]
    }]"#;

    let store = VehicleStore::with_kv(MemoryKvStore::with_entry(VEHICLES_KEY, legacy));
    let record = store.get("legacy-1").expect("legacy record");
    assert_eq!(record.stages[0].results.len(), 1);
    assert_eq!(record.stages[0].results[0].severity, Severity::Minor);
}

/// clear() empties the repository and persists the empty state
#[test]
fn test_clear_all() {
    let dir = tempdir().expect("tempdir");

    {
        let mut store = VehicleStore::open(dir.path().to_path_buf()).expect("open");
        store.create("Toyota", "Camry", "ABC123").expect("create");
        store.create("Honda", "Fit", "XYZ789").expect("create");
        store.clear().expect("clear");
        store.flush();
    }

    let store = VehicleStore::open(dir.path().to_path_buf()).expect("reopen");
    assert!(store.is_empty());
}
