//! Subprocess-backed streams.
//!
//! `spawn` runs `<shell> -c <command>` with one end of a pipe on the child's
//! stdin or stdout and wraps the other end in a [`Stream`]. `reap` closes
//! that stream and collects the child's wait status.

use std::ffi::{CString, c_char};
use std::io;

use super::descriptor::{Descriptor, FileDescriptor};
use super::file::Stream;
use super::mode::Direction;
use crate::config::{Config, config};
use crate::error::StreamError;
use crate::process::WaitStatus;
use crate::sys;

fn spawn_error(errno: i32) -> StreamError {
    StreamError::SpawnFailed {
        source: io::Error::from_raw_os_error(errno),
    }
}

impl Stream<FileDescriptor> {
    /// Run `command` through the configured shell.
    ///
    /// `direction` is `"r"` to read the child's stdout or `"w"` to write its
    /// stdin. Any other value fails with [`StreamError::InvalidMode`] before
    /// a pipe is created.
    ///
    /// The child must be collected with [`reap`](Self::reap); dropping the
    /// stream only closes the pipe and leaves the child unreaped.
    pub fn spawn(command: &str, direction: &str) -> Result<Self, StreamError> {
        let direction = Direction::parse(direction)?;
        Self::spawn_with(config(), command, direction)
    }

    /// [`spawn`](Self::spawn) with an explicit configuration.
    pub fn spawn_with(cfg: &Config, command: &str, direction: Direction) -> Result<Self, StreamError> {
        // Everything the child touches is allocated before fork.
        let shell = CString::new(cfg.shell.as_str()).map_err(|_| spawn_error(libc::EINVAL))?;
        let command = CString::new(command).map_err(|_| spawn_error(libc::EINVAL))?;
        let argv: [*const c_char; 4] = [
            shell.as_ptr(),
            c"-c".as_ptr(),
            command.as_ptr(),
            std::ptr::null(),
        ];

        let [read_end, write_end] = sys::sys_pipe_cloexec().map_err(spawn_error)?;
        let (parent_end, child_end) = match direction {
            Direction::Read => (read_end, write_end),
            Direction::Write => (write_end, read_end),
        };

        let pid = match sys::sys_fork() {
            Ok(pid) => pid,
            Err(errno) => {
                let _ = sys::sys_close(read_end);
                let _ = sys::sys_close(write_end);
                return Err(spawn_error(errno));
            }
        };

        if pid == 0 {
            sys::exec_shell_child(parent_end, child_end, direction.child_fd(), &argv);
        }

        // The reading side never sees EOF while any copy of the write end
        // stays open, so the parent drops the child's end immediately.
        let _ = sys::sys_close(child_end);
        Ok(Self::with_child(FileDescriptor::from_raw(parent_end), pid))
    }
}

impl<D: Descriptor> Stream<D> {
    /// Close the stream and wait for the spawned child.
    ///
    /// The pid is captured before the stream is released; the stream is
    /// closed before waiting so a child reading its stdin sees EOF. The
    /// close result does not affect the returned status. Fails with
    /// [`StreamError::WaitFailed`] if the stream has no child or `waitpid`
    /// fails; `EINTR` is retried.
    pub fn reap(mut self) -> Result<WaitStatus, StreamError> {
        let pid = self.take_child();
        let _ = self.release();
        let Some(pid) = pid else {
            return Err(StreamError::WaitFailed {
                source: io::Error::from_raw_os_error(libc::ECHILD),
            });
        };
        loop {
            match sys::sys_waitpid(pid) {
                Ok(status) => return Ok(WaitStatus::from_raw(status)),
                Err(libc::EINTR) => continue,
                Err(errno) => {
                    return Err(StreamError::WaitFailed {
                        source: io::Error::from_raw_os_error(errno),
                    });
                }
            }
        }
    }
}
