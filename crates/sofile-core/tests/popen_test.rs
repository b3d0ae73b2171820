//! Integration tests: subprocess-backed streams.
//!
//! Run: cargo test -p sofile-core --test popen_test

use std::fs;
use std::path::PathBuf;

use sofile_core::{Config, Direction, IoMode, Stream, StreamError, WaitStatus, sys};

fn read_all(stream: &mut Stream) -> Vec<u8> {
    let mut out = Vec::new();
    loop {
        match stream.read_byte() {
            Ok(b) => out.push(b),
            Err(StreamError::EndOfStream) => break,
            Err(e) => panic!("unexpected read error: {e}"),
        }
    }
    out
}

fn scratch(tag: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("sofile-popen-{tag}-{}", std::process::id()));
    let _ = fs::remove_file(&path);
    path
}

#[test]
fn echo_hello_reads_back() {
    let mut stream = Stream::spawn("echo hello", "r").expect("spawn");
    assert!(stream.child_pid().is_some());
    assert_eq!(read_all(&mut stream), b"hello\n");
    assert!(stream.is_eof());
    assert!(!stream.has_error());
    let status = stream.reap().expect("reap");
    assert!(status.success());
    assert_eq!(status.raw(), 0);
}

#[test]
fn exit_code_is_reported() {
    let mut stream = Stream::spawn("exit 3", "r").expect("spawn");
    assert!(read_all(&mut stream).is_empty());
    let status = stream.reap().expect("reap");
    assert_eq!(status.code(), Some(3));
    assert_eq!(status.raw(), 3 << 8);
}

#[test]
fn large_output_spans_refills() {
    let mut stream = Stream::spawn("head -c 10000 /dev/zero", "r").expect("spawn");
    let out = read_all(&mut stream);
    assert_eq!(out.len(), 10_000);
    assert!(out.iter().all(|&b| b == 0));
    assert!(stream.reap().unwrap().success());
}

#[test]
fn write_direction_feeds_child_stdin() {
    let out = scratch("stdin");
    let cmd = format!("cat > '{}'", out.display());
    let mut stream = Stream::spawn(&cmd, "w").expect("spawn");
    let payload: Vec<u8> = (0..5000u32).map(|i| (i % 256) as u8).collect();
    assert_eq!(stream.write_block(&payload, 1, payload.len()), payload.len());
    assert_eq!(stream.mode(), IoMode::Writing);
    // reap closes (and drains) before waiting, so cat sees EOF.
    let status = stream.reap().expect("reap");
    assert!(status.success());
    assert_eq!(fs::read(&out).unwrap(), payload);
    let _ = fs::remove_file(&out);
}

#[test]
fn invalid_direction_is_rejected() {
    for bad in ["", "rw", "r+", "x"] {
        let err = Stream::spawn("true", bad).unwrap_err();
        assert!(matches!(err, StreamError::InvalidMode { .. }), "{bad:?}");
    }
}

#[test]
fn missing_command_exits_127() {
    let mut stream = Stream::spawn("definitely-not-a-command-sofile 2>/dev/null", "r").expect("spawn");
    let _ = read_all(&mut stream);
    assert_eq!(stream.reap().unwrap().code(), Some(127));
}

#[test]
fn missing_shell_exits_127() {
    let cfg = Config {
        shell: "/nonexistent/sofile-shell".to_string(),
        ..Config::default()
    };
    let mut stream = Stream::spawn_with(&cfg, "echo hi", Direction::Read).expect("spawn");
    assert!(read_all(&mut stream).is_empty());
    assert_eq!(stream.reap().unwrap().code(), Some(127));
}

#[test]
fn nul_in_command_fails_to_spawn() {
    let err = Stream::spawn("echo a\0b", "r").unwrap_err();
    assert!(matches!(err, StreamError::SpawnFailed { .. }));
    assert_eq!(err.errno(), libc::EINVAL);
}

#[test]
fn reap_on_plain_file_stream_fails() {
    let path = scratch("plain");
    let stream = Stream::open(&path, "w").expect("open");
    let err = stream.reap().unwrap_err();
    assert!(matches!(err, StreamError::WaitFailed { .. }));
    assert_eq!(err.errno(), libc::ECHILD);
    let _ = fs::remove_file(&path);
}

#[test]
fn seek_on_pipe_fails() {
    let mut stream = Stream::spawn("echo x", "r").expect("spawn");
    let err = stream.tell().unwrap_err();
    assert_eq!(err.errno(), libc::ESPIPE);
    let _ = read_all(&mut stream);
    stream.reap().unwrap();
}

#[test]
fn write_after_read_on_pipe_fails() {
    let mut stream = Stream::spawn("printf abc", "r").expect("spawn");
    assert_eq!(stream.read_byte().unwrap(), b'a');
    // Unread read-ahead cannot be handed back to a pipe.
    let err = stream.write_byte(b'x').unwrap_err();
    assert!(matches!(err, StreamError::WriteFailed { .. }));
    assert_eq!(err.errno(), libc::ESPIPE);
    assert!(stream.has_error());
    assert_eq!(stream.mode(), IoMode::Reading);
    assert!(stream.reap().unwrap().success());
}

#[test]
fn dropping_unreaped_stream_leaves_child_to_caller() {
    let stream = Stream::spawn("exit 9", "r").expect("spawn");
    let pid = stream.child_pid().expect("child pid");
    drop(stream);
    let status = WaitStatus::from_raw(sys::sys_waitpid(pid).expect("child still waitable"));
    assert_eq!(status.code(), Some(9));
}
