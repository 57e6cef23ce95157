//! Tests for writing exported history files

use chrono::{TimeZone, Utc};
use head_pose_monitor::{
    export::{CsvSchema, HistoryExporter},
    pose_estimation::Pose,
    recorder::PoseHistoryRecorder,
    Error,
};

fn sample_history() -> Vec<Pose> {
    vec![
        Pose::new(1.005, -2.0, 90.004, 1000),
        Pose::new(-0.001, 0.125, -45.5, 1_700_000_000_123),
    ]
}

#[test]
fn test_detailed_file_contents() {
    let dir = tempfile::tempdir().unwrap();
    let now = Utc.with_ymd_and_hms(2024, 3, 5, 14, 7, 9).unwrap();

    let path = HistoryExporter::new(CsvSchema::Detailed)
        .write_to_dir(dir.path(), &sample_history(), now)
        .unwrap();

    assert_eq!(
        path.file_name().unwrap().to_str().unwrap(),
        "head_pose_history_20240305_140709_000.csv"
    );
    let content = std::fs::read_to_string(&path).unwrap();
    assert_eq!(
        content,
        "Timestamp,Date,Roll,Pitch,Yaw\n\
         1000,1970-01-01T00:00:01.000Z,1.01,-2.00,90.00\n\
         1700000000123,2023-11-14T22:13:20.123Z,0.00,0.13,-45.50\n"
    );
}

#[test]
fn test_simple_file_contents() {
    let dir = tempfile::tempdir().unwrap();
    let path = HistoryExporter::new(CsvSchema::Simple)
        .write_to_dir(dir.path(), &sample_history(), Utc::now())
        .unwrap();

    let content = std::fs::read_to_string(path).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(
        lines,
        vec![
            "Timestamp,Roll,Pitch,Yaw",
            "1000,1.01,-2.00,90.00",
            "1700000000123,0.00,0.13,-45.50"
        ]
    );
}

#[test]
fn test_same_instant_never_overwrites() {
    let dir = tempfile::tempdir().unwrap();
    let now = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
    let exporter = HistoryExporter::default();

    let first = exporter.write_to_dir(dir.path(), &sample_history(), now).unwrap();
    let second = exporter.write_to_dir(dir.path(), &sample_history()[..1], now).unwrap();
    let third = exporter.write_to_dir(dir.path(), &sample_history(), now).unwrap();

    assert_ne!(first, second);
    assert_ne!(second, third);
    assert!(second.to_str().unwrap().ends_with("-1.csv"));
    assert!(third.to_str().unwrap().ends_with("-2.csv"));

    // The first file still holds both rows
    assert_eq!(std::fs::read_to_string(first).unwrap().lines().count(), 3);
    assert_eq!(std::fs::read_to_string(second).unwrap().lines().count(), 2);
}

#[test]
fn test_empty_history_creates_no_file() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("out");

    let result = HistoryExporter::default().write_to_dir(&target, &[], Utc::now());
    assert!(matches!(result, Err(Error::EmptyHistory)));
    assert!(!target.exists() || std::fs::read_dir(&target).unwrap().next().is_none());
}

#[test]
fn test_missing_directory_is_created() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("nested").join("exports");

    let path = HistoryExporter::default()
        .write_to_dir(&target, &sample_history(), Utc::now())
        .unwrap();
    assert!(path.starts_with(&target));
    assert!(path.exists());
}

#[test]
fn test_export_matches_recorded_rows_only() {
    let mut recorder = PoseHistoryRecorder::new(2.0);
    for (i, yaw) in [0.0, 1.0, 1.9, 2.5, 3.0, 5.0].into_iter().enumerate() {
        recorder.record(Pose::new(0.0, 0.0, yaw, i as i64));
    }

    let csv = HistoryExporter::new(CsvSchema::Simple).export(recorder.history()).unwrap();
    assert_eq!(csv, "Timestamp,Roll,Pitch,Yaw\n0,0.00,0.00,0.00\n3,0.00,0.00,2.50\n5,0.00,0.00,5.00\n");
}
