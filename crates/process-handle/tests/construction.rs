//! Tests for building handles from already spawned processes

#![cfg(unix)]

mod common;

use async_process::Child;
use process_handle::{Command, Error, ProcessHandle};

fn spawn_child(command_line: &str) -> Child {
    Command::new(command_line)
        .prepare()
        .spawn()
        .expect("failed to spawn test child")
}

#[test]
fn test_valid_parts_are_exposed() {
    common::init_tracing();

    let mut child = spawn_child("cat");
    let pid = child.id();
    let stdin = child.stdin.take();
    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    let mut handle = ProcessHandle::new(Some(child), stdin, stdout, stderr).unwrap();

    assert_eq!(handle.process().map(Child::id), Some(pid));
    assert!(handle.stdin().is_some());
    assert!(handle.stdout().is_some());
    assert!(handle.stderr().is_some());
    assert!(handle.streams_open());
    assert!(!handle.process_closed());

    // Not spawned through the factory, so no command line is known
    assert_eq!(handle.command().unwrap(), "");
    assert_eq!(handle.pid().unwrap(), pid);
}

#[test]
fn test_missing_process_is_rejected() {
    let mut child = spawn_child("true");
    let result = ProcessHandle::new(
        None,
        child.stdin.take(),
        child.stdout.take(),
        child.stderr.take(),
    );

    let err = result.unwrap_err();
    assert_eq!(err.parameter(), Some("process"));
    assert!(matches!(err, Error::InvalidConstructionArgument { received: "nothing", .. }));
}

#[test]
fn test_each_missing_stream_is_named() {
    for missing in ["stdin", "stdout", "stderr"] {
        let mut child = spawn_child("true");
        let mut stdin = child.stdin.take();
        let mut stdout = child.stdout.take();
        let mut stderr = child.stderr.take();

        match missing {
            "stdin" => drop(stdin.take()),
            "stdout" => drop(stdout.take()),
            _ => drop(stderr.take()),
        }

        let err = ProcessHandle::new(Some(child), stdin, stdout, stderr).unwrap_err();
        assert_eq!(err.parameter(), Some(missing));
        assert!(err.to_string().contains(missing), "unexpected message: {}", err);
    }
}

#[test]
fn test_process_is_checked_before_streams() {
    let err = ProcessHandle::new(None, None, None, None).unwrap_err();
    assert_eq!(err.parameter(), Some("process"));
}

#[test]
fn test_from_child_without_pipes_fails() {
    let mut cmd = async_process::Command::new("true");
    cmd.stdin(async_process::Stdio::null())
        .stdout(async_process::Stdio::piped())
        .stderr(async_process::Stdio::piped());
    let child = cmd.spawn().unwrap();

    let err = ProcessHandle::from_child(child, "true").unwrap_err();
    assert_eq!(err.parameter(), Some("stdin"));
}

#[test]
fn test_from_child_keeps_command_line() {
    let child = spawn_child("echo foo");
    let mut handle = ProcessHandle::from_child(child, "echo foo").unwrap();

    assert_eq!(handle.command().unwrap(), "echo foo");
    assert_eq!(handle.read_to_end().unwrap(), b"foo\n");
}
