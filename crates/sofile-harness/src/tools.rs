//! Stream-backed helpers behind the `copy` and `spawn` subcommands.

use std::io::Write;
use std::path::Path;

use sofile_core::{BUFSIZ, Stream, StreamError, WaitStatus};

use crate::error::HarnessError;

/// Copy `src` to `dst` one byte at a time through two streams.
///
/// Returns the number of bytes copied.
pub fn copy_file(src: &Path, dst: &Path) -> Result<u64, HarnessError> {
    let mut input = Stream::open(src, "r")?;
    let mut output = Stream::open(dst, "w")?;
    let mut copied = 0u64;
    loop {
        match input.read_byte() {
            Ok(byte) => {
                output.write_byte(byte)?;
                copied += 1;
            }
            Err(StreamError::EndOfStream) => break,
            Err(err) => return Err(err.into()),
        }
    }
    input.close()?;
    output.close()?;
    Ok(copied)
}

/// Run `command` through the shell and copy its stdout to `out`.
///
/// Returns the byte count and the child's wait status.
pub fn spawn_echo(command: &str, out: &mut impl Write) -> Result<(u64, WaitStatus), HarnessError> {
    let mut stream = Stream::spawn(command, "r")?;
    let mut chunk = [0u8; BUFSIZ];
    let mut total = 0u64;
    loop {
        let n = stream.read_block(&mut chunk, 1, BUFSIZ);
        out.write_all(&chunk[..n])?;
        total += n as u64;
        if n < BUFSIZ {
            break;
        }
    }
    if stream.has_error() {
        let status = stream.reap()?;
        return Err(HarnessError::mismatch("pipe read", "clean end of stream", status.to_string()));
    }
    let status = stream.reap()?;
    Ok((total, status))
}
