//! Integration tests for flatseq
//!
//! Longer queue/stack workloads plus the `flatseq` binary end to end.

use std::path::Path;
use std::process::{Command, Output};

use flatseq::{DiskQueue, DiskStack, VacuumOutcome};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn flatseq(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_flatseq"))
        .args(args)
        .env("RUST_LOG", "off")
        .output()
        .unwrap()
}

fn path_str(path: &Path) -> &str {
    path.to_str().unwrap()
}

fn stdout_lines(output: &Output) -> Vec<String> {
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(str::to_string)
        .collect()
}

// =============================================================================
// Library Workloads
// =============================================================================

#[test]
fn test_queue_producer_consumer_with_periodic_vacuum() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("work.queue");
    let mut queue = DiskQueue::open_path(&path).unwrap();

    let mut next_in = 0;
    let mut next_out = 0;
    for round in 0..20 {
        let batch: Vec<String> = (next_in..next_in + 50).map(|i| format!("job-{}", i)).collect();
        queue.add_all(&batch).unwrap();
        next_in += 50;

        for record in queue.get_many(37).unwrap() {
            assert_eq!(record, format!("job-{}", next_out).as_str());
            next_out += 1;
        }

        if round % 5 == 4 {
            assert!(matches!(
                queue.vacuum().unwrap(),
                VacuumOutcome::Compacted { .. }
            ));
            assert_eq!(queue.stats().unwrap().stale_bytes, 0);
        }
    }

    // Drain the rest after a reopen
    drop(queue);
    let mut queue = DiskQueue::open_path(&path).unwrap();
    while let Some(record) = queue.get().unwrap() {
        assert_eq!(record, format!("job-{}", next_out).as_str());
        next_out += 1;
    }
    assert_eq!(next_out, next_in);

    assert!(matches!(
        queue.vacuum().unwrap(),
        VacuumOutcome::Removed { .. }
    ));
    assert!(!path.exists());
}

#[test]
fn test_stack_deep_push_pop() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("deep.stack");
    let mut stack = DiskStack::open_path(&path).unwrap();

    for i in 0..1000 {
        stack.push(format!("frame-{}", i)).unwrap();
    }
    assert_eq!(stack.depth().unwrap(), 1000);

    drop(stack);
    let mut stack = DiskStack::open_path(&path).unwrap();
    for i in (0..1000).rev() {
        let record = stack.pop().unwrap().unwrap();
        assert_eq!(record, format!("frame-{}", i).as_str());
    }
    assert!(stack.pop().unwrap().is_none());
    assert_eq!(std::fs::metadata(&path).unwrap().len(), 4);
}

// =============================================================================
// CLI Tests
// =============================================================================

#[test]
fn test_cli_queue_roundtrip() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("cli.queue");
    let file = path_str(&path);

    let output = flatseq(&["queue", file, "add", "a", "b", "c"]);
    assert!(output.status.success());

    let output = flatseq(&["queue", file, "get", "-n", "2"]);
    assert!(output.status.success());
    assert_eq!(stdout_lines(&output), vec!["a", "b"]);

    let output = flatseq(&["queue", file, "stats"]);
    assert!(output.status.success());
    assert!(stdout_lines(&output).contains(&"cursor:        8".to_string()));

    let output = flatseq(&["queue", file, "vacuum"]);
    assert!(output.status.success());

    let output = flatseq(&["queue", file, "get"]);
    assert_eq!(stdout_lines(&output), vec!["c"]);

    let output = flatseq(&["queue", file, "get"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(output.stdout.is_empty());
}

#[test]
fn test_cli_stack_roundtrip() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("cli.stack");
    let file = path_str(&path);

    let output = flatseq(&["--bits", "64", "stack", file, "push", "x", "y"]);
    assert!(output.status.success());

    let output = flatseq(&["--bits", "64", "stack", file, "depth"]);
    assert_eq!(stdout_lines(&output), vec!["2"]);

    let output = flatseq(&["--bits", "64", "stack", file, "peek"]);
    assert_eq!(stdout_lines(&output), vec!["y"]);

    let output = flatseq(&["--bits", "64", "stack", file, "pop"]);
    assert_eq!(stdout_lines(&output), vec!["y"]);

    let output = flatseq(&["--bits", "64", "stack", file, "pop"]);
    assert_eq!(stdout_lines(&output), vec!["x"]);

    let output = flatseq(&["--bits", "64", "stack", file, "pop"]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_cli_rejects_bad_width() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("bad.queue");

    let output = flatseq(&["--bits", "16", "queue", path_str(&path), "stats"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(!path.exists());
}
