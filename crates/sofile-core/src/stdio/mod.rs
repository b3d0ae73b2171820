//! Buffered stream I/O.
//!
//! Implements the stream surface: open by mode string, single-byte get/put,
//! block read/write, seek, tell, flush, close, and the subprocess-backed
//! variant (spawn/reap).

pub mod buffer;
pub mod descriptor;
pub mod file;
pub mod mode;
pub mod popen;

pub use buffer::{BUFSIZ, IoMode, StreamBuffer};
pub use descriptor::{Descriptor, FileDescriptor, Whence};
pub use file::{Stream, descriptor_of};
pub use mode::{Direction, OpenMode};
