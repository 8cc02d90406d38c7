//! Tests for StorageHandle
//!
//! These tests verify:
//! - Positional reads and writes
//! - Append offsets, truncation and tail copies
//! - Renaming an open file
//! - Sidecar lock files and release on drop
//! - Removal of the backing file

use std::fs;
use std::io::Read;
use std::path::PathBuf;

use flatseq::config::LockMode;
use flatseq::storage::{lock_path, FileLock, StorageHandle};
use flatseq::{Config, SeqError};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_file() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("test.dat");
    (temp_dir, path)
}

// =============================================================================
// Open Tests
// =============================================================================

#[test]
fn test_open_creates_empty_file() {
    let (_temp, path) = setup_temp_file();

    let handle = StorageHandle::open_or_create(&path, &Config::default()).unwrap();

    assert!(path.exists());
    assert_eq!(handle.size().unwrap(), 0);
    assert_eq!(handle.path(), path);
}

#[test]
fn test_open_keeps_existing_contents() {
    let (_temp, path) = setup_temp_file();
    fs::write(&path, b"existing").unwrap();

    let handle = StorageHandle::open_or_create(&path, &Config::default()).unwrap();
    assert_eq!(handle.size().unwrap(), 8);
}

#[test]
fn test_create_truncates() {
    let (_temp, path) = setup_temp_file();
    fs::write(&path, b"stale contents").unwrap();

    let handle = StorageHandle::create(&path, &Config::default()).unwrap();
    assert_eq!(handle.size().unwrap(), 0);
}

// =============================================================================
// Read/Write Tests
// =============================================================================

#[test]
fn test_append_returns_offsets() {
    let (_temp, path) = setup_temp_file();
    let mut handle = StorageHandle::open_or_create(&path, &Config::default()).unwrap();

    assert_eq!(handle.append(b"hello").unwrap(), 0);
    assert_eq!(handle.append(b" world").unwrap(), 5);
    assert_eq!(handle.size().unwrap(), 11);
    assert_eq!(handle.read_at(0, 11).unwrap(), b"hello world");
}

#[test]
fn test_write_at_overwrites_in_place() {
    let (_temp, path) = setup_temp_file();
    let mut handle = StorageHandle::open_or_create(&path, &Config::default()).unwrap();

    handle.append(b"aaaa-tail").unwrap();
    handle.write_at(0, b"bbbb").unwrap();

    assert_eq!(handle.read_at(0, 9).unwrap(), b"bbbb-tail");
    assert_eq!(handle.size().unwrap(), 9);
}

#[test]
fn test_write_then_append_goes_to_end() {
    let (_temp, path) = setup_temp_file();
    let mut handle = StorageHandle::open_or_create(&path, &Config::default()).unwrap();

    handle.append(b"0123456789").unwrap();
    handle.write_at(2, b"xx").unwrap();
    let offset = handle.append(b"!").unwrap();

    assert_eq!(offset, 10);
    assert_eq!(handle.read_at(0, 11).unwrap(), b"01xx456789!");
}

#[test]
fn test_read_past_end_fails() {
    let (_temp, path) = setup_temp_file();
    let mut handle = StorageHandle::open_or_create(&path, &Config::default()).unwrap();
    handle.append(b"abc").unwrap();

    let result = handle.read_at(1, 5);
    assert!(matches!(result, Err(SeqError::Corrupted(_))));
}

#[test]
fn test_reader_at_starts_at_offset() {
    let (_temp, path) = setup_temp_file();
    let mut handle = StorageHandle::open_or_create(&path, &Config::default()).unwrap();
    handle.append(b"skip|read me").unwrap();

    let mut out = String::new();
    handle.reader_at(5).unwrap().read_to_string(&mut out).unwrap();
    assert_eq!(out, "read me");
}

#[test]
fn test_truncate() {
    let (_temp, path) = setup_temp_file();
    let mut handle = StorageHandle::open_or_create(&path, &Config::default()).unwrap();
    handle.append(b"keep|drop").unwrap();

    handle.truncate(4).unwrap();
    assert_eq!(handle.size().unwrap(), 4);
    assert_eq!(handle.read_at(0, 4).unwrap(), b"keep");

    assert!(handle.truncate(10).is_err());
}

#[test]
fn test_copy_tail_to() {
    let (temp, path) = setup_temp_file();
    let dest_path = temp.path().join("dest.dat");

    let mut source = StorageHandle::open_or_create(&path, &Config::default()).unwrap();
    source.append(b"consumed|remaining").unwrap();

    let mut dest = StorageHandle::create(&dest_path, &Config::default()).unwrap();
    dest.append(b"HDR:").unwrap();

    let copied = source.copy_tail_to(9, &mut dest).unwrap();
    assert_eq!(copied, 9);
    assert_eq!(dest.read_at(0, 13).unwrap(), b"HDR:remaining");
    assert_eq!(source.size().unwrap(), 18);
}

#[test]
fn test_rename_to_keeps_handle_open() {
    let (temp, path) = setup_temp_file();
    let target = temp.path().join("renamed.dat");
    fs::write(&target, b"old contents").unwrap();

    let mut handle = StorageHandle::create(&path, &Config::default()).unwrap();
    handle.append(b"new").unwrap();
    handle.rename_to(&target).unwrap();

    assert!(!path.exists());
    assert_eq!(handle.path(), target);
    assert_eq!(fs::read(&target).unwrap(), b"new");

    handle.append(b"er").unwrap();
    assert_eq!(fs::read(&target).unwrap(), b"newer");
}

#[test]
fn test_rename_to_failure_keeps_old_path() {
    let (temp, path) = setup_temp_file();
    let blocked = temp.path().join("blocked");
    fs::create_dir(&blocked).unwrap();
    fs::write(blocked.join("occupant"), b"x").unwrap();

    let mut handle = StorageHandle::create(&path, &Config::default()).unwrap();
    handle.append(b"data").unwrap();

    assert!(handle.rename_to(&blocked).is_err());
    assert_eq!(handle.path(), path);
    assert_eq!(fs::read(&path).unwrap(), b"data");
}

// =============================================================================
// Lock Tests
// =============================================================================

#[test]
fn test_lock_prevents_second_acquire() {
    let (_temp, path) = setup_temp_file();

    let _first = FileLock::acquire(&path).unwrap();
    let second = FileLock::acquire(&path);

    assert!(matches!(second, Err(SeqError::Locked(p)) if p == path));
}

#[test]
fn test_lock_lives_beside_data_file() {
    let (temp, path) = setup_temp_file();

    let lock = FileLock::acquire(&path).unwrap();

    assert_eq!(lock.path(), temp.path().join("test.dat.lock"));
    assert_eq!(lock_path(&path), lock.path());
    assert!(lock.path().exists());
    // The data file is not touched
    assert!(!path.exists());
}

#[test]
fn test_lock_released_on_drop() {
    let (_temp, path) = setup_temp_file();

    let first = FileLock::acquire(&path).unwrap();
    drop(first);

    assert!(FileLock::acquire(&path).is_ok());
}

#[test]
fn test_lock_survives_data_file_removal() {
    let (_temp, path) = setup_temp_file();
    let _lock = FileLock::acquire(&path).unwrap();

    let handle = StorageHandle::open_or_create(&path, &Config::default()).unwrap();
    handle.remove().unwrap();

    assert!(matches!(FileLock::acquire(&path), Err(SeqError::Locked(_))));
}

#[test]
fn test_lock_mode_none_skips_lock() {
    let (_temp, path) = setup_temp_file();
    let config = Config::builder().lock_mode(LockMode::None).build();

    assert!(FileLock::for_config(&path, &config).unwrap().is_none());
    assert!(FileLock::for_config(&path, &config).unwrap().is_none());

    let _held = FileLock::for_config(&path, &Config::default()).unwrap();
    assert!(matches!(
        FileLock::for_config(&path, &Config::default()),
        Err(SeqError::Locked(_))
    ));
}

// =============================================================================
// Remove Tests
// =============================================================================

#[test]
fn test_remove_deletes_file() {
    let (_temp, path) = setup_temp_file();

    let mut handle = StorageHandle::open_or_create(&path, &Config::default()).unwrap();
    handle.append(b"bye").unwrap();
    handle.remove().unwrap();

    assert!(!path.exists());
    assert!(StorageHandle::open_or_create(&path, &Config::default()).is_ok());
}
