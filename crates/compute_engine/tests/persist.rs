use std::fs;

use compute_engine::{ensure_store_dir, AtomicFileWriter};
use tempfile::TempDir;

#[test]
fn creates_missing_store_dir() {
    let temp = TempDir::new().unwrap();
    let new_dir = temp.path().join("store");
    assert!(!new_dir.exists());
    ensure_store_dir(&new_dir).unwrap();
    assert!(new_dir.is_dir());
}

#[test]
fn atomic_write_replaces_existing() {
    let temp = TempDir::new().unwrap();
    let writer = AtomicFileWriter::new(temp.path().to_path_buf());

    let first = writer.write("entry.json", b"hello").unwrap();
    assert_eq!(first.file_name().unwrap(), "entry.json");
    assert_eq!(fs::read_to_string(&first).unwrap(), "hello");

    let second = writer.write("entry.json", b"world").unwrap();
    assert_eq!(first, second);
    assert_eq!(fs::read_to_string(&second).unwrap(), "world");
    assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 1);
}

#[test]
fn no_partial_file_on_error() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("not_a_dir");
    fs::write(&file_path, "x").unwrap();

    let writer = AtomicFileWriter::new(file_path.clone());
    let result = writer.write("entry.json", b"data");
    assert!(result.is_err());
    assert!(!file_path.with_file_name("entry.json").exists());
}
