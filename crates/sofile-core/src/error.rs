//! Stream error taxonomy.
//!
//! Single-byte and control operations fail with a [`StreamError`]. Block
//! operations never do; they report a short element count and leave the
//! detail in the stream's sticky eof/error flags.

use std::io;

use thiserror::Error;

/// Errors produced by stream operations.
#[derive(Debug, Error)]
pub enum StreamError {
    /// Mode string is not one of `r`, `r+`, `w`, `w+`, `a`, `a+` (or `r`/`w`
    /// for a subprocess pipe).
    #[error("invalid mode string {mode:?}")]
    InvalidMode { mode: String },
    /// The OS rejected the descriptor open.
    #[error("open failed: {source}")]
    OpenFailed {
        #[source]
        source: io::Error,
    },
    /// A refill read returned an error.
    #[error("read failed: {source}")]
    ReadFailed {
        #[source]
        source: io::Error,
    },
    /// A drain write returned an error, or the buffer could not accept a byte.
    #[error("write failed: {source}")]
    WriteFailed {
        #[source]
        source: io::Error,
    },
    /// Repositioning or querying the descriptor offset failed.
    #[error("seek failed: {source}")]
    SeekFailed {
        #[source]
        source: io::Error,
    },
    /// Pending writes could not be drained at close, or `close(2)` failed.
    #[error("close failed: {source}")]
    CloseFailed {
        #[source]
        source: io::Error,
    },
    /// Clean end of input.
    #[error("end of stream")]
    EndOfStream,
    /// `flush` was requested outside a write sequence.
    #[error("stream is not in a write sequence")]
    NotWriting,
    /// Pipe creation, fork, or argument preparation failed.
    #[error("spawn failed: {source}")]
    SpawnFailed {
        #[source]
        source: io::Error,
    },
    /// Reaping the child process failed.
    #[error("wait failed: {source}")]
    WaitFailed {
        #[source]
        source: io::Error,
    },
}

impl StreamError {
    /// Build an `InvalidMode` error for the given mode text.
    pub fn invalid_mode(mode: &str) -> Self {
        Self::InvalidMode {
            mode: mode.to_string(),
        }
    }

    /// Raw errno for the C boundary.
    ///
    /// OS-originated variants report the errno of their source. The rest map
    /// to a fixed value: `EINVAL` for a bad mode, `EBADF` for a flush outside
    /// a write sequence, and `0` for a clean end of stream.
    #[must_use]
    pub fn errno(&self) -> i32 {
        match self {
            Self::InvalidMode { .. } => libc::EINVAL,
            Self::EndOfStream => 0,
            Self::NotWriting => libc::EBADF,
            Self::OpenFailed { source }
            | Self::ReadFailed { source }
            | Self::WriteFailed { source }
            | Self::SeekFailed { source }
            | Self::CloseFailed { source }
            | Self::SpawnFailed { source }
            | Self::WaitFailed { source } => source.raw_os_error().unwrap_or(libc::EIO),
        }
    }

    /// Unwrap the underlying OS error, synthesizing one for the variants
    /// that have none.
    #[must_use]
    pub fn into_io_error(self) -> io::Error {
        match self {
            Self::OpenFailed { source }
            | Self::ReadFailed { source }
            | Self::WriteFailed { source }
            | Self::SeekFailed { source }
            | Self::CloseFailed { source }
            | Self::SpawnFailed { source }
            | Self::WaitFailed { source } => source,
            Self::EndOfStream => io::Error::from(io::ErrorKind::UnexpectedEof),
            other => io::Error::from_raw_os_error(other.errno()),
        }
    }

    /// True for a clean end of input.
    #[must_use]
    pub fn is_end_of_stream(&self) -> bool {
        matches!(self, Self::EndOfStream)
    }
}
