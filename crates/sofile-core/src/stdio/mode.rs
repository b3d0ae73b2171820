//! Mode-string parsing.
//!
//! Stream opens accept exactly six mode strings; subprocess pipes accept
//! `r` and `w`. Anything else is rejected before the filesystem is touched.

use crate::error::StreamError;

/// Open mode for a file-backed stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpenMode {
    /// `r`: read-only.
    Read,
    /// `r+`: read-write.
    ReadUpdate,
    /// `w`: write-only, create, truncate.
    Write,
    /// `w+`: read-write, create, truncate.
    WriteUpdate,
    /// `a`: write-only, create, append.
    Append,
    /// `a+`: read-write, create, append.
    AppendUpdate,
}

impl OpenMode {
    /// Every accepted mode, in mode-string order.
    pub const ALL: [OpenMode; 6] = [
        OpenMode::Read,
        OpenMode::ReadUpdate,
        OpenMode::Write,
        OpenMode::WriteUpdate,
        OpenMode::Append,
        OpenMode::AppendUpdate,
    ];

    /// Parse a mode string. Only exact matches are accepted.
    pub fn parse(mode: &str) -> Result<Self, StreamError> {
        match mode {
            "r" => Ok(Self::Read),
            "r+" => Ok(Self::ReadUpdate),
            "w" => Ok(Self::Write),
            "w+" => Ok(Self::WriteUpdate),
            "a" => Ok(Self::Append),
            "a+" => Ok(Self::AppendUpdate),
            _ => Err(StreamError::invalid_mode(mode)),
        }
    }

    /// The mode string this variant parses from.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Read => "r",
            Self::ReadUpdate => "r+",
            Self::Write => "w",
            Self::WriteUpdate => "w+",
            Self::Append => "a",
            Self::AppendUpdate => "a+",
        }
    }

    /// Whether the descriptor is opened for reading.
    #[must_use]
    pub const fn readable(self) -> bool {
        !matches!(self, Self::Write | Self::Append)
    }

    /// Whether the descriptor is opened for writing.
    #[must_use]
    pub const fn writable(self) -> bool {
        !matches!(self, Self::Read)
    }

    /// `O_*` flags for `open(2)`.
    #[must_use]
    pub const fn oflags(self) -> i32 {
        match self {
            Self::Read => libc::O_RDONLY,
            Self::ReadUpdate => libc::O_RDWR,
            Self::Write => libc::O_WRONLY | libc::O_CREAT | libc::O_TRUNC,
            Self::WriteUpdate => libc::O_RDWR | libc::O_CREAT | libc::O_TRUNC,
            Self::Append => libc::O_WRONLY | libc::O_CREAT | libc::O_APPEND,
            Self::AppendUpdate => libc::O_RDWR | libc::O_CREAT | libc::O_APPEND,
        }
    }
}

/// Which way bytes flow through a subprocess pipe, seen from the parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// `r`: the child's stdout feeds the parent.
    Read,
    /// `w`: the parent feeds the child's stdin.
    Write,
}

impl Direction {
    /// Parse `r` or `w`.
    pub fn parse(direction: &str) -> Result<Self, StreamError> {
        match direction {
            "r" => Ok(Self::Read),
            "w" => Ok(Self::Write),
            _ => Err(StreamError::invalid_mode(direction)),
        }
    }

    /// Standard descriptor of the child that the pipe is attached to.
    #[must_use]
    pub const fn child_fd(self) -> i32 {
        match self {
            Self::Read => libc::STDOUT_FILENO,
            Self::Write => libc::STDIN_FILENO,
        }
    }
}
