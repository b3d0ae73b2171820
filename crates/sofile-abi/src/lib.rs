// All extern "C" exports accept raw pointers from C callers and document
// their pointer contract once at module level.
#![allow(clippy::missing_safety_doc)]
//! # sofile-abi
//!
//! `extern "C"` boundary exposing the `so_*` stream API over `sofile-core`.
//!
//! ```text
//! C caller -> so_* entry (this crate) -> Stream (sofile-core) -> libc syscalls
//! ```
//!
//! `SO_FILE*` is an opaque pointer to a heap-allocated [`Stream`]. Failures
//! return [`SO_EOF`] (or a null pointer / zero count) and set `errno` from
//! the underlying [`StreamError`](sofile_core::StreamError).

pub mod stdio_abi;

pub use sofile_core::Stream;
pub use stdio_abi::*;
