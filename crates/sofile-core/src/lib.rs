//! # sofile-core
//!
//! Minimal buffered I/O over raw file descriptors.
//!
//! A [`Stream`] owns one descriptor and one fixed 4096-byte buffer. The
//! buffer serves as a read-ahead cache or a write-coalescing cache depending
//! on the most recent operation, and every switch between the two drains
//! pending writes first. Streams can also be backed by one end of a pipe to
//! a shell subprocess ([`Stream::spawn`] / [`Stream::reap`]).
//!
//! No `unsafe` code is permitted at the crate level; only the [`sys`]
//! syscall veneer opts in.

#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod process;
pub mod stdio;
#[allow(unsafe_code)]
pub mod sys;

pub use config::{Config, config};
pub use error::StreamError;
pub use process::WaitStatus;
pub use stdio::{
    BUFSIZ, Descriptor, Direction, FileDescriptor, IoMode, OpenMode, Stream, Whence,
    descriptor_of,
};
