use std::fs;

use rem_engine::{ensure_output_dir, write_atomic, PersistError};
use tempfile::TempDir;

#[test]
fn creates_missing_output_dir_once() {
    let temp = TempDir::new().unwrap();
    let out = temp.path().join("nested").join("out");

    assert!(ensure_output_dir(&out).unwrap());
    assert!(out.is_dir());
    assert!(!ensure_output_dir(&out).unwrap());
    // The probe file does not linger.
    assert_eq!(fs::read_dir(&out).unwrap().count(), 0);
}

#[test]
fn file_in_place_of_output_dir_is_rejected() {
    let temp = TempDir::new().unwrap();
    let file = temp.path().join("out");
    fs::write(&file, "x").unwrap();

    let err = ensure_output_dir(&file).unwrap_err();
    assert!(matches!(err, PersistError::OutputDir(_)));
}

#[test]
fn atomic_write_replaces_existing_content() {
    let temp = TempDir::new().unwrap();
    let target = temp.path().join("rem_settings.ron");

    write_atomic(&target, b"first").unwrap();
    write_atomic(&target, b"second").unwrap();

    assert_eq!(fs::read_to_string(&target).unwrap(), "second");
    assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 1);
}

#[test]
fn no_partial_file_when_parent_is_not_a_directory() {
    let temp = TempDir::new().unwrap();
    let blocker = temp.path().join("not_a_dir");
    fs::write(&blocker, "x").unwrap();

    assert!(write_atomic(&blocker.join("settings.ron"), b"data").is_err());
    assert_eq!(fs::read_to_string(&blocker).unwrap(), "x");
}
