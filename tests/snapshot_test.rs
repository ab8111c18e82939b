use chrono::{TimeZone, Utc};
use rally_mapper_wasm::clock::FixedClock;
use rally_mapper_wasm::draft::MemoryDraftStore;
use rally_mapper_wasm::options::SessionOptions;
use rally_mapper_wasm::route_types::Fix;
use rally_mapper_wasm::session::{SectionExport, Session};
use std::path::Path;

/// Record the "Stage 1" section used by every snapshot: two waypoints,
/// three tracking samples, all at a frozen clock.
fn record_stage1() -> SectionExport {
    let clock = FixedClock(Utc.with_ymd_and_hms(2025, 1, 1, 6, 0, 0).unwrap());
    let mut session = Session::new(
        SessionOptions::default(),
        Box::new(clock),
        Box::new(MemoryDraftStore::new()),
    );

    session.update_position(Fix::new(-35.0, 138.75, Some(4.0)));
    let started = session.start_section().unwrap();

    session.add_waypoint().unwrap();
    session.select_icon("Left");
    session.annotate_last_waypoint("keep out of ditch");

    for lon in [138.75, 138.755, 138.76] {
        assert!(session.record_tracking_point(started.generation, Fix::new(-35.0, lon, None)));
    }

    session.add_waypoint().unwrap();
    session.edit_waypoint(1, "Caution & <care>", "").unwrap();

    session.end_section("Stage 1").unwrap()
}

fn file_content<'a>(export: &'a SectionExport, filename: &str) -> &'a str {
    &export
        .files
        .iter()
        .find(|f| f.filename == filename)
        .unwrap_or_else(|| panic!("no export file {filename}"))
        .content
}

fn update_requested() -> bool {
    matches!(std::env::var("UPDATE_SNAPSHOTS").as_deref(), Ok("1"))
}

fn write_snapshot(path: &str, content: &str) {
    let dir = Path::new(path).parent().unwrap();
    std::fs::create_dir_all(dir).unwrap();
    std::fs::write(path, content.as_bytes()).unwrap();
    eprintln!("Updated snapshot: {path}");
}

fn read_snapshot(path: &str) -> String {
    std::fs::read_to_string(path).unwrap_or_else(|_| {
        panic!("Expected file not found: {path}. Run with UPDATE_SNAPSHOTS=1 to generate.")
    })
}

/// Compare exact text output against the expected snapshot file.
/// When `UPDATE_SNAPSHOTS=1` is set, write/overwrite the expected file instead.
fn assert_text_snapshot(actual: &str, expected_path: &str) {
    let path = format!("tests/fixtures/expected/{expected_path}");
    if update_requested() {
        write_snapshot(&path, actual);
        return;
    }

    let expected = read_snapshot(&path);
    assert_eq!(
        actual, expected,
        "Snapshot mismatch for {path}.\nRun with UPDATE_SNAPSHOTS=1 to update."
    );
}

/// Compare JSON output structurally against the expected snapshot file.
fn assert_json_snapshot(actual: &serde_json::Value, expected_path: &str) {
    let path = format!("tests/fixtures/expected/{expected_path}");
    if update_requested() {
        write_snapshot(&path, &serde_json::to_string_pretty(actual).unwrap());
        return;
    }

    let expected: serde_json::Value = serde_json::from_str(&read_snapshot(&path))
        .unwrap_or_else(|e| panic!("Failed to parse {path}: {e}"));
    assert_eq!(
        *actual, expected,
        "Snapshot mismatch for {path}.\nRun with UPDATE_SNAPSHOTS=1 to update."
    );
}

#[test]
fn snapshot_stage1_gpx() {
    let export = record_stage1();
    assert_text_snapshot(file_content(&export, "Stage 1.gpx"), "stage1.gpx");
}

#[test]
fn snapshot_stage1_kml() {
    let export = record_stage1();
    assert_text_snapshot(file_content(&export, "Stage 1.kml"), "stage1.kml");
}

#[test]
fn snapshot_stage1_json() {
    let export = record_stage1();
    let actual: serde_json::Value =
        serde_json::from_str(file_content(&export, "Stage 1.json")).unwrap();
    assert_json_snapshot(&actual, "stage1.json");
}

#[test]
fn snapshot_stage1_summary() {
    let export = record_stage1();
    let actual = serde_json::to_value(&export.summary).unwrap();
    assert_json_snapshot(&actual, "stage1_summary.json");
}

#[test]
fn snapshot_is_stable_across_runs() {
    let a = record_stage1();
    let b = record_stage1();
    assert_eq!(a.files, b.files);
}
