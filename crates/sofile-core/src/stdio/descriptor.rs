//! Descriptor seam between the buffer engine and the OS.

use std::io;

use crate::sys;

/// Reference point for a seek.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Whence {
    /// `SEEK_SET`
    Start,
    /// `SEEK_CUR`
    Current,
    /// `SEEK_END`
    End,
}

impl Whence {
    /// Convert from a POSIX `SEEK_*` constant.
    #[must_use]
    pub fn from_posix(whence: i32) -> Option<Self> {
        match whence {
            libc::SEEK_SET => Some(Self::Start),
            libc::SEEK_CUR => Some(Self::Current),
            libc::SEEK_END => Some(Self::End),
            _ => None,
        }
    }

    /// The POSIX `SEEK_*` constant.
    #[must_use]
    pub const fn to_posix(self) -> i32 {
        match self {
            Self::Start => libc::SEEK_SET,
            Self::Current => libc::SEEK_CUR,
            Self::End => libc::SEEK_END,
        }
    }
}

/// The raw I/O primitives a stream is built on.
///
/// Implementations follow the `read(2)`/`write(2)`/`lseek(2)`/`close(2)`
/// contracts: short reads and writes are legal, a zero-byte read means end
/// of input, and no call retries on its own.
pub trait Descriptor {
    /// Read up to `buf.len()` bytes.
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Write up to `buf.len()` bytes, returning how many were accepted.
    fn write(&mut self, buf: &[u8]) -> io::Result<usize>;

    /// Reposition the offset, returning the new absolute position.
    fn seek(&mut self, offset: i64, whence: Whence) -> io::Result<i64>;

    /// Release the descriptor. Called at most once.
    fn close(&mut self) -> io::Result<()>;

    /// Native handle, for introspection.
    fn raw(&self) -> i32;
}

/// An owned OS file descriptor.
///
/// Closing is explicit (the owning [`Stream`](super::Stream) decides when);
/// dropping a `FileDescriptor` on its own does not close it.
#[derive(Debug)]
pub struct FileDescriptor {
    /// `-1` once closed.
    fd: i32,
}

impl FileDescriptor {
    /// Take ownership of a raw descriptor.
    #[must_use]
    pub fn from_raw(fd: i32) -> Self {
        Self { fd }
    }

    /// True once `close` has run.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.fd < 0
    }
}

impl Descriptor for FileDescriptor {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        sys::sys_read(self.fd, buf).map_err(io::Error::from_raw_os_error)
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        sys::sys_write(self.fd, buf).map_err(io::Error::from_raw_os_error)
    }

    fn seek(&mut self, offset: i64, whence: Whence) -> io::Result<i64> {
        sys::sys_lseek(self.fd, offset, whence.to_posix()).map_err(io::Error::from_raw_os_error)
    }

    fn close(&mut self) -> io::Result<()> {
        if self.is_closed() {
            return Err(io::Error::from_raw_os_error(libc::EBADF));
        }
        let fd = std::mem::replace(&mut self.fd, -1);
        sys::sys_close(fd).map_err(io::Error::from_raw_os_error)
    }

    fn raw(&self) -> i32 {
        self.fd
    }
}
