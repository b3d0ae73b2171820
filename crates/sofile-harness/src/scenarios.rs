//! Scenario matrix for the stream contract.
//!
//! Each scenario drives real files (inside a scratch directory owned by the
//! runner) or real shell subprocesses and checks one observable property.

use std::fs;
use std::path::Path;

use sofile_core::{BUFSIZ, OpenMode, Stream, StreamError, Whence};

use crate::error::{HarnessError, ensure_eq};

/// What a passing scenario observed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Observation {
    /// Bytes moved through streams.
    pub bytes: u64,
    /// Exit code of a spawned child, if any.
    pub exit_code: Option<i32>,
}

impl Observation {
    fn bytes(bytes: usize) -> Self {
        Self {
            bytes: bytes as u64,
            exit_code: None,
        }
    }
}

type ScenarioFn = fn(&Path) -> Result<Observation, HarnessError>;

/// A named contract check.
pub struct Scenario {
    pub name: &'static str,
    /// Stream operation the scenario is centered on.
    pub operation: &'static str,
    pub summary: &'static str,
    run: ScenarioFn,
}

impl Scenario {
    /// Run inside `scratch`, an existing empty directory.
    pub fn run(&self, scratch: &Path) -> Result<Observation, HarnessError> {
        (self.run)(scratch)
    }
}

/// Every scenario, in execution order.
#[must_use]
pub fn catalog() -> Vec<Scenario> {
    vec![
        Scenario {
            name: "invalid_modes_rejected",
            operation: "open",
            summary: "unknown mode strings fail with InvalidMode and create nothing",
            run: invalid_modes_rejected,
        },
        Scenario {
            name: "mode_access_table",
            operation: "open",
            summary: "each mode string grants the documented read/write/truncate/append access",
            run: mode_access_table,
        },
        Scenario {
            name: "flush_at_buffer_edges",
            operation: "write_byte",
            summary: "N written bytes land on disk after flush for N around the buffer capacity",
            run: flush_at_buffer_edges,
        },
        Scenario {
            name: "tell_after_unflushed_write",
            operation: "tell",
            summary: "tell counts bytes still sitting in the write buffer",
            run: tell_after_unflushed_write,
        },
        Scenario {
            name: "tell_after_partial_read",
            operation: "tell",
            summary: "tell subtracts read-ahead that has not been consumed",
            run: tell_after_partial_read,
        },
        Scenario {
            name: "empty_file_eof",
            operation: "read_byte",
            summary: "reading an empty file yields EndOfStream and sets only the eof flag",
            run: empty_file_eof,
        },
        Scenario {
            name: "write_seek_read",
            operation: "seek",
            summary: "64 bytes written, rewound and read back unchanged",
            run: write_seek_read,
        },
        Scenario {
            name: "block_matches_bytes",
            operation: "read_block",
            summary: "block transfers with element size 1 match byte-at-a-time transfers",
            run: block_matches_bytes,
        },
        Scenario {
            name: "spawn_echo_hello",
            operation: "spawn",
            summary: "reading `echo hello` yields hello\\n and a zero exit status",
            run: spawn_echo_hello,
        },
        Scenario {
            name: "spawn_feeds_stdin",
            operation: "spawn",
            summary: "bytes written to a \"w\" pipe reach the child's stdin",
            run: spawn_feeds_stdin,
        },
        Scenario {
            name: "reap_reports_exit_code",
            operation: "reap",
            summary: "reap returns the child's exit code",
            run: reap_reports_exit_code,
        },
    ]
}

fn pattern(n: usize) -> Vec<u8> {
    (0..n).map(|i| (i * 31 % 251) as u8).collect()
}

fn read_to_end(stream: &mut Stream) -> Result<Vec<u8>, HarnessError> {
    let mut out = Vec::new();
    loop {
        match stream.read_byte() {
            Ok(b) => out.push(b),
            Err(StreamError::EndOfStream) => return Ok(out),
            Err(err) => return Err(err.into()),
        }
    }
}

// ---------------------------------------------------------------------------
// open
// ---------------------------------------------------------------------------

fn invalid_modes_rejected(scratch: &Path) -> Result<Observation, HarnessError> {
    let path = scratch.join("never-created");
    for bad in ["", "rw", "R", "r+b", "wa", "+"] {
        match Stream::open(&path, bad) {
            Err(StreamError::InvalidMode { .. }) => {}
            Err(other) => return Err(HarnessError::mismatch(bad, "InvalidMode", other.to_string())),
            Ok(_) => return Err(HarnessError::mismatch(bad, "InvalidMode", "opened")),
        }
    }
    ensure_eq("file created", false, path.exists())?;
    Ok(Observation::default())
}

fn mode_access_table(scratch: &Path) -> Result<Observation, HarnessError> {
    let path = scratch.join("modes");
    for mode in OpenMode::ALL {
        let label = mode.as_str();

        fs::write(&path, b"seed")?;
        let mut stream = Stream::open(&path, label)?;
        let first = stream.read_byte();
        let expected_first = match mode {
            OpenMode::Read | OpenMode::ReadUpdate | OpenMode::AppendUpdate => "Ok(115)",
            OpenMode::WriteUpdate => "EndOfStream",
            OpenMode::Write | OpenMode::Append => "ReadFailed",
        };
        let observed = match &first {
            Ok(b) => format!("Ok({b})"),
            Err(StreamError::EndOfStream) => "EndOfStream".to_string(),
            Err(StreamError::ReadFailed { .. }) => "ReadFailed".to_string(),
            Err(other) => other.to_string(),
        };
        ensure_eq(&format!("{label}: first read"), expected_first, observed.as_str())?;
        ensure_eq(&format!("{label}: readable"), mode.readable(), first.is_ok() || stream.is_eof())?;
        let _ = stream.close();

        fs::write(&path, b"seed")?;
        let mut stream = Stream::open(&path, label)?;
        stream.write_byte(b'!')?;
        let closed = stream.close();
        ensure_eq(&format!("{label}: writable"), mode.writable(), closed.is_ok())?;

        let expected: &[u8] = match mode {
            OpenMode::Read => b"seed",
            OpenMode::ReadUpdate => b"!eed",
            OpenMode::Write | OpenMode::WriteUpdate => b"!",
            OpenMode::Append | OpenMode::AppendUpdate => b"seed!",
        };
        ensure_eq(&format!("{label}: contents"), expected, fs::read(&path)?.as_slice())?;
    }
    Ok(Observation::default())
}

// ---------------------------------------------------------------------------
// write / tell
// ---------------------------------------------------------------------------

fn flush_at_buffer_edges(scratch: &Path) -> Result<Observation, HarnessError> {
    let sizes = [0, 1, BUFSIZ - 1, BUFSIZ, BUFSIZ + 1, 2 * BUFSIZ, 3 * BUFSIZ + 17];
    let mut moved = 0;
    for n in sizes {
        let path = scratch.join(format!("edge-{n}"));
        let data = pattern(n);
        let mut stream = Stream::open(&path, "w")?;
        for &b in &data {
            stream.write_byte(b)?;
        }
        if n > 0 {
            stream.flush()?;
        }
        ensure_eq(&format!("n={n}: bytes on disk"), data.len(), fs::read(&path)?.len())?;
        ensure_eq(&format!("n={n}: contents"), true, fs::read(&path)? == data)?;
        stream.close()?;
        moved += n;
    }
    Ok(Observation::bytes(moved))
}

fn tell_after_unflushed_write(scratch: &Path) -> Result<Observation, HarnessError> {
    let path = scratch.join("tell-write");
    let mut stream = Stream::open(&path, "w")?;
    for (k, checkpoint) in [(100usize, 100i64), (BUFSIZ + 50, (BUFSIZ + 150) as i64)] {
        for b in pattern(k) {
            stream.write_byte(b)?;
        }
        ensure_eq(&format!("tell after {checkpoint} bytes"), checkpoint, stream.tell()?)?;
    }
    stream.close()?;
    Ok(Observation::bytes(BUFSIZ + 150))
}

fn tell_after_partial_read(scratch: &Path) -> Result<Observation, HarnessError> {
    let path = scratch.join("tell-read");
    fs::write(&path, pattern(3 * BUFSIZ))?;
    let mut stream = Stream::open(&path, "r")?;
    for _ in 0..10 {
        stream.read_byte()?;
    }
    ensure_eq("buffered read-ahead", BUFSIZ - 10, stream.buffered_len())?;
    ensure_eq("tell after 10 reads", 10, stream.tell()?)?;
    for _ in 10..BUFSIZ + 5 {
        stream.read_byte()?;
    }
    ensure_eq("tell after second refill", (BUFSIZ + 5) as i64, stream.tell()?)?;
    stream.close()?;
    Ok(Observation::bytes(BUFSIZ + 5))
}

// ---------------------------------------------------------------------------
// read / seek / block
// ---------------------------------------------------------------------------

fn empty_file_eof(scratch: &Path) -> Result<Observation, HarnessError> {
    let path = scratch.join("empty");
    fs::write(&path, b"")?;
    let mut stream = Stream::open(&path, "r")?;
    let first = stream.read_byte();
    ensure_eq("first read is end of stream", true, matches!(first, Err(StreamError::EndOfStream)))?;
    ensure_eq("eof flag", true, stream.is_eof())?;
    ensure_eq("error flag", false, stream.has_error())?;
    stream.close()?;
    Ok(Observation::default())
}

fn write_seek_read(scratch: &Path) -> Result<Observation, HarnessError> {
    let path = scratch.join("roundtrip");
    let data = pattern(64);
    let mut stream = Stream::open(&path, "w+")?;
    for &b in &data {
        stream.write_byte(b)?;
    }
    stream.seek(0, Whence::Start)?;
    let mut back = Vec::with_capacity(data.len());
    for _ in 0..data.len() {
        back.push(stream.read_byte()?);
    }
    ensure_eq("round trip", data.as_slice(), back.as_slice())?;
    stream.close()?;
    Ok(Observation::bytes(128))
}

fn block_matches_bytes(scratch: &Path) -> Result<Observation, HarnessError> {
    let n = 2 * BUFSIZ + 333;
    let data = pattern(n);
    let by_block = scratch.join("block");
    let by_byte = scratch.join("byte");

    let mut stream = Stream::open(&by_block, "w")?;
    ensure_eq("write_block count", n, stream.write_block(&data, 1, n))?;
    stream.close()?;
    let mut stream = Stream::open(&by_byte, "w")?;
    for &b in &data {
        stream.write_byte(b)?;
    }
    stream.close()?;
    ensure_eq("files identical", true, fs::read(&by_block)? == fs::read(&by_byte)?)?;

    let mut stream = Stream::open(&by_block, "r")?;
    let mut blocked = vec![0u8; n + 10];
    let got = stream.read_block(&mut blocked, 1, n + 10);
    ensure_eq("read_block count", n, got)?;
    ensure_eq("eof after short block", true, stream.is_eof())?;
    stream.close()?;
    let mut stream = Stream::open(&by_byte, "r")?;
    let bytewise = read_to_end(&mut stream)?;
    stream.close()?;
    ensure_eq("block equals bytes", true, blocked[..got] == bytewise[..])?;
    Ok(Observation::bytes(4 * n))
}

// ---------------------------------------------------------------------------
// spawn / reap
// ---------------------------------------------------------------------------

fn spawn_echo_hello(_scratch: &Path) -> Result<Observation, HarnessError> {
    let mut stream = Stream::spawn("echo hello", "r")?;
    let out = read_to_end(&mut stream)?;
    ensure_eq("child output", b"hello\n".as_slice(), out.as_slice())?;
    let status = stream.reap()?;
    ensure_eq("wait status", 0, status.raw())?;
    Ok(Observation {
        bytes: out.len() as u64,
        exit_code: status.code(),
    })
}

fn spawn_feeds_stdin(scratch: &Path) -> Result<Observation, HarnessError> {
    let target = scratch.join("from-child");
    let data = pattern(BUFSIZ + 99);
    let mut stream = Stream::spawn(&format!("cat > '{}'", target.display()), "w")?;
    ensure_eq("write_block count", data.len(), stream.write_block(&data, 1, data.len()))?;
    let status = stream.reap()?;
    ensure_eq("child success", true, status.success())?;
    ensure_eq("child wrote input", true, fs::read(&target)? == data)?;
    Ok(Observation {
        bytes: data.len() as u64,
        exit_code: status.code(),
    })
}

fn reap_reports_exit_code(_scratch: &Path) -> Result<Observation, HarnessError> {
    let mut stream = Stream::spawn("exit 5", "r")?;
    read_to_end(&mut stream)?;
    let status = stream.reap()?;
    ensure_eq("exit code", Some(5), status.code())?;
    Ok(Observation {
        bytes: 0,
        exit_code: status.code(),
    })
}
