//! Stream state management.
//!
//! `Stream` is the buffered handle: one descriptor, one [`StreamBuffer`],
//! the sticky eof/error flags, and (for subprocess pipes) the child pid.
//!
//! Every byte-level operation goes through the buffer engine. Switching
//! between reading and writing always settles the buffer first: dirty bytes
//! are drained before reading, and unread read-ahead is given back to the
//! descriptor (by seeking backwards) before writing.

use std::ffi::CString;
use std::io;
use std::os::unix::ffi::OsStrExt;
use std::path::Path;

use super::buffer::{IoMode, StreamBuffer};
use super::descriptor::{Descriptor, FileDescriptor, Whence};
use super::mode::OpenMode;
use crate::config::config;
use crate::error::StreamError;
use crate::sys;

/// Sticky status flags. Set by failing operations, never cleared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamFlags {
    pub eof: bool,
    pub error: bool,
}

/// Buffered I/O handle over a single descriptor.
#[derive(Debug)]
pub struct Stream<D: Descriptor = FileDescriptor> {
    descriptor: D,
    buffer: StreamBuffer,
    flags: StreamFlags,
    /// Present only for subprocess pipes; consumed by `reap`.
    child: Option<i32>,
    /// Set once the descriptor has been released (or abandoned) by `close`.
    released: bool,
}

impl Stream<FileDescriptor> {
    /// Open `path` with one of the mode strings `r`, `r+`, `w`, `w+`, `a`,
    /// `a+`. Created files get the configured permission bits.
    pub fn open(path: impl AsRef<Path>, mode: &str) -> Result<Self, StreamError> {
        Self::open_with_permissions(path, mode, config().create_mode)
    }

    /// [`open`](Self::open) with explicit permission bits for file creation.
    pub fn open_with_permissions(
        path: impl AsRef<Path>,
        mode: &str,
        permissions: u32,
    ) -> Result<Self, StreamError> {
        let mode = OpenMode::parse(mode)?;
        let c_path = CString::new(path.as_ref().as_os_str().as_bytes()).map_err(|_| {
            StreamError::OpenFailed {
                source: io::Error::from_raw_os_error(libc::EINVAL),
            }
        })?;
        let fd = sys::sys_open(&c_path, mode.oflags(), permissions).map_err(|errno| {
            StreamError::OpenFailed {
                source: io::Error::from_raw_os_error(errno),
            }
        })?;
        Ok(Self::from_descriptor(FileDescriptor::from_raw(fd)))
    }
}

impl<D: Descriptor> Stream<D> {
    /// Wrap an already-open descriptor. The stream takes ownership.
    pub fn from_descriptor(descriptor: D) -> Self {
        Self {
            descriptor,
            buffer: StreamBuffer::new(),
            flags: StreamFlags::default(),
            child: None,
            released: false,
        }
    }

    pub(crate) fn with_child(descriptor: D, pid: i32) -> Self {
        let mut stream = Self::from_descriptor(descriptor);
        stream.child = Some(pid);
        stream
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// Native handle of the underlying descriptor.
    pub fn descriptor(&self) -> i32 {
        self.descriptor.raw()
    }

    /// Active buffering discipline.
    pub fn mode(&self) -> IoMode {
        self.buffer.mode()
    }

    /// True once a refill has hit end of input.
    pub fn is_eof(&self) -> bool {
        self.flags.eof
    }

    /// True once any I/O operation has failed.
    pub fn has_error(&self) -> bool {
        self.flags.error
    }

    /// Both sticky flags.
    pub fn flags(&self) -> StreamFlags {
        self.flags
    }

    /// Pid of the spawned child, for subprocess pipes.
    pub fn child_pid(&self) -> Option<i32> {
        self.child
    }

    /// Bytes currently held in the buffer: unread read-ahead while reading,
    /// dirty bytes while writing.
    pub fn buffered_len(&self) -> usize {
        match self.buffer.mode() {
            IoMode::Idle => 0,
            IoMode::Reading => self.buffer.unread(),
            IoMode::Writing => self.buffer.cursor(),
        }
    }

    // -----------------------------------------------------------------------
    // Single-byte operations
    // -----------------------------------------------------------------------

    /// Read one byte, refilling the buffer from the descriptor when empty.
    ///
    /// A refill that returns no bytes latches the eof flag and yields
    /// [`StreamError::EndOfStream`]; a failed refill latches the error flag.
    pub fn read_byte(&mut self) -> Result<u8, StreamError> {
        self.enter_reading()?;
        if let Some(byte) = self.buffer.take_byte() {
            return Ok(byte);
        }
        self.refill()?;
        self.buffer.take_byte().ok_or(StreamError::EndOfStream)
    }

    /// Buffer one byte for writing, draining first if the buffer is full.
    /// Returns the byte stored.
    pub fn write_byte(&mut self, byte: u8) -> Result<u8, StreamError> {
        self.enter_writing()?;
        if self.buffer.is_full() {
            self.drain()?;
        }
        let stored = self.buffer.push(byte);
        debug_assert!(stored, "buffer has room after a successful drain");
        Ok(byte)
    }

    // -----------------------------------------------------------------------
    // Block operations
    // -----------------------------------------------------------------------

    /// Read up to `element_count` elements of `element_size` bytes into
    /// `dest` and return how many complete elements were filled.
    ///
    /// Stops at the first end of input or error; the sticky flags tell the
    /// two apart. The byte total is clamped to `dest.len()`.
    pub fn read_block(&mut self, dest: &mut [u8], element_size: usize, element_count: usize) -> usize {
        if element_size == 0 {
            return 0;
        }
        let total = element_size.saturating_mul(element_count).min(dest.len());
        let mut done = 0;
        for slot in &mut dest[..total] {
            match self.read_byte() {
                Ok(byte) => {
                    *slot = byte;
                    done += 1;
                }
                Err(_) => break,
            }
        }
        done / element_size
    }

    /// Write `element_count` elements of `element_size` bytes from `src`.
    ///
    /// Returns the number of complete elements written, or zero if any byte
    /// failed: a failure anywhere in the call voids its accounting. The byte
    /// total is clamped to `src.len()`.
    pub fn write_block(&mut self, src: &[u8], element_size: usize, element_count: usize) -> usize {
        if element_size == 0 {
            return 0;
        }
        let total = element_size.saturating_mul(element_count).min(src.len());
        for &byte in &src[..total] {
            if self.write_byte(byte).is_err() {
                return 0;
            }
        }
        total / element_size
    }

    // -----------------------------------------------------------------------
    // Control operations
    // -----------------------------------------------------------------------

    /// Push every dirty byte to the descriptor.
    ///
    /// Only meaningful inside a write sequence; otherwise fails with
    /// [`StreamError::NotWriting`].
    pub fn flush(&mut self) -> Result<(), StreamError> {
        if self.buffer.mode() != IoMode::Writing {
            return Err(StreamError::NotWriting);
        }
        self.drain()
    }

    /// Reposition the stream.
    ///
    /// Read-ahead is discarded without touching the descriptor; a
    /// [`Whence::Current`] offset is taken relative to the logical position,
    /// not the prefetched one. Dirty bytes are drained first; a failed drain
    /// is already latched in the error flag and does not stop the
    /// reposition.
    pub fn seek(&mut self, mut offset: i64, whence: Whence) -> Result<(), StreamError> {
        match self.buffer.mode() {
            IoMode::Reading => {
                if whence == Whence::Current {
                    offset = offset
                        .checked_sub(self.buffer.unread() as i64)
                        .ok_or_else(|| StreamError::SeekFailed {
                            source: io::Error::from_raw_os_error(libc::EINVAL),
                        })?;
                }
                self.buffer.discard_read_ahead();
            }
            IoMode::Writing => {
                let _ = self.drain();
            }
            IoMode::Idle => {}
        }
        self.descriptor
            .seek(offset, whence)
            .map(|_| ())
            .map_err(|source| StreamError::SeekFailed { source })
    }

    /// Logical offset: the descriptor position reconciled with the bytes
    /// still sitting in the buffer.
    pub fn tell(&mut self) -> Result<i64, StreamError> {
        let physical = self
            .descriptor
            .seek(0, Whence::Current)
            .map_err(|source| StreamError::SeekFailed { source })?;
        Ok(self.buffer.logical_offset(physical))
    }

    /// Drain pending writes and release the descriptor.
    ///
    /// If the drain fails the descriptor is abandoned without `close(2)` and
    /// the call fails with [`StreamError::CloseFailed`].
    pub fn close(mut self) -> Result<(), StreamError> {
        self.release()
    }

    // -----------------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------------

    pub(crate) fn take_child(&mut self) -> Option<i32> {
        self.child.take()
    }

    pub(crate) fn release(&mut self) -> Result<(), StreamError> {
        if self.released {
            return Err(StreamError::CloseFailed {
                source: io::Error::from_raw_os_error(libc::EBADF),
            });
        }
        self.released = true;
        if self.buffer.mode() == IoMode::Writing
            && let Err(err) = self.drain()
        {
            return Err(StreamError::CloseFailed {
                source: err.into_io_error(),
            });
        }
        self.descriptor
            .close()
            .map_err(|source| StreamError::CloseFailed { source })
    }

    fn enter_reading(&mut self) -> Result<(), StreamError> {
        match self.buffer.mode() {
            IoMode::Reading => Ok(()),
            IoMode::Idle => {
                self.buffer.enter_reading();
                Ok(())
            }
            IoMode::Writing => {
                self.drain()?;
                self.buffer.enter_reading();
                Ok(())
            }
        }
    }

    fn enter_writing(&mut self) -> Result<(), StreamError> {
        match self.buffer.mode() {
            IoMode::Writing => Ok(()),
            IoMode::Idle => {
                self.buffer.enter_writing();
                Ok(())
            }
            IoMode::Reading => {
                let unread = self.buffer.unread();
                if unread > 0 {
                    // Give the read-ahead back so the write lands at the
                    // logical position.
                    if let Err(source) = self.descriptor.seek(-(unread as i64), Whence::Current) {
                        self.flags.error = true;
                        return Err(StreamError::WriteFailed { source });
                    }
                }
                self.buffer.enter_writing();
                Ok(())
            }
        }
    }

    fn refill(&mut self) -> Result<(), StreamError> {
        match self.descriptor.read(self.buffer.refill_target()) {
            Ok(0) => {
                self.buffer.filled(0);
                self.flags.eof = true;
                Err(StreamError::EndOfStream)
            }
            Ok(n) => {
                self.buffer.filled(n);
                Ok(())
            }
            Err(source) => {
                self.buffer.filled(0);
                self.flags.error = true;
                Err(StreamError::ReadFailed { source })
            }
        }
    }

    /// Write out `buffer[..cursor]`, looping over short writes.
    ///
    /// On failure the remaining bytes are abandoned and the error flag set.
    fn drain(&mut self) -> Result<(), StreamError> {
        let mut written = 0;
        let result = loop {
            let pending = self.buffer.pending_write_data();
            if written >= pending.len() {
                break Ok(());
            }
            match self.descriptor.write(&pending[written..]) {
                Ok(0) => break Err(io::Error::from(io::ErrorKind::WriteZero)),
                Ok(n) => written += n,
                Err(source) => break Err(source),
            }
        };
        self.buffer.mark_flushed();
        result.map_err(|source| {
            self.flags.error = true;
            StreamError::WriteFailed { source }
        })
    }
}

/// Dropping a spawned stream closes its pipe end but does not wait for the
/// child; call [`Stream::reap`] to collect it.
impl<D: Descriptor> Drop for Stream<D> {
    fn drop(&mut self) {
        if !self.released {
            let _ = self.release();
        }
    }
}

/// Native handle of a stream's descriptor.
pub fn descriptor_of<D: Descriptor>(stream: &Stream<D>) -> i32 {
    stream.descriptor()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
