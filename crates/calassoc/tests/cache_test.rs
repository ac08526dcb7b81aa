//! Integration tests for the calibration cache: persistence, hand edits and
//! incremental resolution across runs.

use std::cell::RefCell;
use std::fs;

use tempfile::TempDir;

use calassoc::{
    Association, CalError, CalibrationStore, DependencyGraph, LookupTable, Match, Resolver,
    StoreIssue, resolve,
};

/// Helper to write a cache file with given content.
fn write_cache(dir: &TempDir, content: &str) -> std::path::PathBuf {
    let path = dir.path().join("calibrations.json");
    fs::write(&path, content).expect("Failed to write cache file");
    path
}

/// A GMOS-like night: one science frame, a standard star, flats, arcs, biases.
fn night_table() -> LookupTable {
    let bias = || vec![Match::new("bias2.fits", None), Match::new("bias1.fits", None)];
    LookupTable::new()
        .with("sci1.fits", "specphot", vec![Match::new("std1.fits", Some("s1"))])
        .with("sci1.fits", "flat", vec![Match::new("flat1.fits", Some("f1"))])
        .with("sci1.fits", "arc", vec![Match::new("arc1.fits", None)])
        .with("sci1.fits", "bias", bias())
        .with("std1.fits", "flat", vec![Match::new("flat2.fits", None)])
        .with("flat2.fits", "arc", vec![Match::new("arc1.fits", None)])
        .with("std1.fits", "arc", vec![Match::new("arc1.fits", None)])
        .with("std1.fits", "bias", bias())
        .with("flat1.fits", "arc", vec![Match::new("arc1.fits", None)])
        .with("flat1.fits", "bias", bias())
        .with("flat2.fits", "bias", bias())
        .with("arc1.fits", "bias", bias())
}

// =============================================================================
// Persistence Tests
// =============================================================================

#[test]
fn test_save_load_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("calibrations.json");

    let mut store = CalibrationStore::new();
    resolve(
        "sci1.fits",
        "target",
        &DependencyGraph::gmos_spectroscopy(),
        night_table(),
        &mut store,
    )
    .unwrap();
    store.save(&path).unwrap();

    let loaded = CalibrationStore::init(Some(&path)).unwrap();
    assert_eq!(loaded, store);
}

#[test]
fn test_repeated_saves_are_byte_identical() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("calibrations.json");

    let mut store = CalibrationStore::new();
    resolve(
        "sci1.fits",
        "target",
        &DependencyGraph::gmos_spectroscopy(),
        night_table(),
        &mut store,
    )
    .unwrap();

    store.save(&path).unwrap();
    let first = fs::read(&path).unwrap();

    CalibrationStore::load(&path).unwrap().save(&path).unwrap();
    let second = fs::read(&path).unwrap();

    assert_eq!(first, second);
}

#[test]
fn test_saved_format_is_editable() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("calibrations.json");

    let mut store = CalibrationStore::new();
    store.record("sci1.fits", "arc", &[]);
    store.record("sci1.fits", "bias", &[Match::new("bias1.fits", Some("abc"))]);
    store.save(&path).unwrap();

    let expected = r#"{
    "associations": {
        "sci1.fits": {
            "arc": null,
            "bias": "bias1_bias.fits"
        }
    },
    "calibrations": {
        "bias1_bias.fits": [
            "bias1.fits"
        ]
    },
    "checksums": {
        "bias1.fits": "abc"
    }
}"#;
    assert_eq!(fs::read_to_string(&path).unwrap(), expected);
}

#[test]
fn test_malformed_cache_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write_cache(
        &dir,
        r#"{"associations": {"sci1.fits": "bias1_bias.fits"}, "calibrations": {}, "checksums": {}}"#,
    );

    match CalibrationStore::init(Some(&path)) {
        Err(CalError::MalformedStore { snapshot, reason }) => {
            assert!(snapshot.ends_with("calibrations.json"));
            assert!(reason.contains("sci1.fits"));
        }
        other => panic!("expected MalformedStore, got {other:?}"),
    }
}

#[test]
fn test_cache_with_wrong_keys_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write_cache(&dir, r#"{"associations": {}, "calibrations": {}, "checksum": {}}"#);

    assert!(matches!(
        CalibrationStore::load(&path),
        Err(CalError::MalformedStore { .. })
    ));
}

#[test]
fn test_missing_cache_file_is_io_error_on_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("absent.json");

    assert!(matches!(CalibrationStore::load(&path), Err(CalError::Io { .. })));
    assert!(CalibrationStore::init(Some(&path)).unwrap().is_empty());
}

// =============================================================================
// Resolution Tests
// =============================================================================

#[test]
fn test_gmos_night_resolution() {
    let graph = DependencyGraph::gmos_spectroscopy();
    let mut store = CalibrationStore::new();

    let report = resolve("sci1.fits", "target", &graph, night_table(), &mut store).unwrap();

    let sci = &store.associations["sci1.fits"];
    assert_eq!(sci["specphot"], Association::Group("std1_specphot.fits".to_string()));
    assert_eq!(sci["flat"], Association::Group("flat1_flat.fits".to_string()));
    assert_eq!(sci["arc"], Association::Group("arc1_arc.fits".to_string()));
    assert_eq!(sci["bias"], Association::Group("bias1_bias.fits".to_string()));

    // Every file shares the one bias group, listed in sorted order
    assert_eq!(store.extract_all("bias").len(), 1);
    assert_eq!(
        store.calibrations["bias1_bias.fits"],
        ["bias1.fits", "bias2.fits"]
    );

    // The standard's flat differs from the science flat
    assert_eq!(store.extract_all("flat").len(), 2);
    assert_eq!(
        store.extract("flat", ["std1.fits"]).keys().collect::<Vec<_>>(),
        ["flat2_flat.fits"]
    );

    assert_eq!(store.checksum("std1.fits"), Some("s1"));
    assert_eq!(store.checksum("flat1.fits"), Some("f1"));
    assert!(report.not_found.is_empty());
    assert!(store.validate().iter().all(|issue| !issue.is_error()));
}

#[test]
fn test_hand_filled_placeholder_survives_rerun() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("calibrations.json");
    let graph = DependencyGraph::new()
        .with("target", ["arc", "bias"])
        .with("arc", ["bias"]);

    // First run: no arc found
    let table = LookupTable::new()
        .with("sci1.fits", "bias", vec![Match::new("bias1.fits", None)])
        .with("arc9.fits", "bias", vec![Match::new("bias1.fits", None)]);
    let mut store = CalibrationStore::new();
    let report = resolve("sci1.fits", "target", &graph, table.clone(), &mut store).unwrap();
    assert_eq!(
        report.not_found,
        [("sci1.fits".to_string(), "arc".to_string())]
    );
    assert_eq!(
        store.validate(),
        [StoreIssue::AwaitingEntry {
            file: "sci1.fits".to_string(),
            cal_type: "arc".to_string(),
        }]
    );
    store.save(&path).unwrap();

    // The user fills in the placeholder by hand
    let edited = fs::read_to_string(&path)
        .unwrap()
        .replace("\"arc\": null", "\"arc\": \"arc9_arc.fits\"")
        .replace(
            "\"calibrations\": {",
            "\"calibrations\": {\n        \"arc9_arc.fits\": [\"arc9.fits\"],",
        );
    fs::write(&path, edited).unwrap();

    // Second run follows the manual association into the arc's own needs
    let mut store = CalibrationStore::init(Some(&path)).unwrap();
    let calls = RefCell::new(Vec::new());
    let lookup = |file: &str, cal_type: &str| -> Result<Vec<Match>, String> {
        calls.borrow_mut().push(format!("{file}/{cal_type}"));
        Ok(table.get(file, cal_type).to_vec())
    };
    resolve("sci1.fits", "target", &graph, lookup, &mut store).unwrap();

    assert_eq!(calls.into_inner(), ["arc9.fits/bias"]);
    assert_eq!(
        store.association("sci1.fits", "arc").and_then(Association::label),
        Some("arc9_arc.fits")
    );
    assert_eq!(
        store.association("arc9.fits", "bias").and_then(Association::label),
        Some("bias1_bias.fits")
    );
}

#[test]
fn test_resolution_is_idempotent_across_saves() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("calibrations.json");
    let graph = DependencyGraph::gmos_spectroscopy();

    let mut store = CalibrationStore::init(Some(&path)).unwrap();
    resolve("sci1.fits", "target", &graph, night_table(), &mut store).unwrap();
    store.save(&path).unwrap();
    let before = fs::read(&path).unwrap();

    let mut store = CalibrationStore::init(Some(&path)).unwrap();
    let mut resolver = Resolver::new(&graph, night_table());
    resolver.resolve(&mut store, "sci1.fits", "target").unwrap();
    assert_eq!(resolver.report().lookups, 0);
    store.save(&path).unwrap();

    assert_eq!(fs::read(&path).unwrap(), before);
}

#[test]
fn test_lookup_table_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("matches.json");
    fs::write(
        &path,
        r#"{"sci1.fits": {"bias": [["bias1.fits", null]], "flat": []}}"#,
    )
    .unwrap();

    let table = LookupTable::load(&path).unwrap();
    let graph = DependencyGraph::new().with("target", ["flat", "bias"]);
    let mut store = CalibrationStore::new();
    resolve("sci1.fits", "target", &graph, table, &mut store).unwrap();

    assert_eq!(store.missing(), [("sci1.fits", "flat")]);
    assert_eq!(store.extract_all("bias").len(), 1);
}

#[test]
fn test_lookup_table_file_with_bad_shape() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("matches.json");
    fs::write(&path, r#"{"sci1.fits": {"bias": ["bias1.fits"]}}"#).unwrap();

    assert!(matches!(
        LookupTable::load(&path),
        Err(CalError::InvalidMatchShape(_))
    ));
}
