//! Typed syscall wrappers.
//!
//! Thin veneer over `libc` for the primitives the stream layer orchestrates:
//! open/read/write/lseek/close on descriptors, plus pipe/fork/exec/wait for
//! subprocess pipes. Every wrapper returns `Err(errno)` on failure; nothing
//! here retries.

use std::ffi::{CStr, c_char};

/// Read the calling thread's `errno`, defaulting to `EIO`.
#[inline]
fn last_errno() -> i32 {
    std::io::Error::last_os_error()
        .raw_os_error()
        .unwrap_or(libc::EIO)
}

/// `open(path, flags, mode)`.
pub fn sys_open(path: &CStr, flags: i32, mode: u32) -> Result<i32, i32> {
    // SAFETY: path is a valid NUL-terminated string for the duration of the call.
    let fd = unsafe { libc::open(path.as_ptr(), flags, mode as libc::c_uint) };
    if fd < 0 { Err(last_errno()) } else { Ok(fd) }
}

/// `read(fd, buf, buf.len())`.
pub fn sys_read(fd: i32, buf: &mut [u8]) -> Result<usize, i32> {
    // SAFETY: buf is a valid writable region of buf.len() bytes.
    let rc = unsafe { libc::read(fd, buf.as_mut_ptr().cast(), buf.len()) };
    if rc < 0 { Err(last_errno()) } else { Ok(rc as usize) }
}

/// `write(fd, buf, buf.len())`.
pub fn sys_write(fd: i32, buf: &[u8]) -> Result<usize, i32> {
    // SAFETY: buf is a valid readable region of buf.len() bytes.
    let rc = unsafe { libc::write(fd, buf.as_ptr().cast(), buf.len()) };
    if rc < 0 { Err(last_errno()) } else { Ok(rc as usize) }
}

/// `lseek(fd, offset, whence)`.
pub fn sys_lseek(fd: i32, offset: i64, whence: i32) -> Result<i64, i32> {
    // SAFETY: lseek takes no pointers; a bad fd just yields EBADF.
    let rc = unsafe { libc::lseek(fd, offset as libc::off_t, whence) };
    if rc < 0 { Err(last_errno()) } else { Ok(rc as i64) }
}

/// `close(fd)`.
pub fn sys_close(fd: i32) -> Result<(), i32> {
    // SAFETY: close takes no pointers; a bad fd just yields EBADF.
    let rc = unsafe { libc::close(fd) };
    if rc < 0 { Err(last_errno()) } else { Ok(()) }
}

/// `pipe2(fds, O_CLOEXEC)`, returning `[read_end, write_end]`.
pub fn sys_pipe_cloexec() -> Result<[i32; 2], i32> {
    let mut fds = [-1i32; 2];
    // SAFETY: fds is a valid array of two c_ints.
    let rc = unsafe { libc::pipe2(fds.as_mut_ptr(), libc::O_CLOEXEC) };
    if rc < 0 { Err(last_errno()) } else { Ok(fds) }
}

/// `fork()`. Returns 0 in the child and the child's pid in the parent.
pub fn sys_fork() -> Result<i32, i32> {
    // SAFETY: the child only calls async-signal-safe functions
    // (see `exec_shell_child`) before exec or _exit.
    let pid = unsafe { libc::fork() };
    if pid < 0 { Err(last_errno()) } else { Ok(pid) }
}

/// Blocking `waitpid(pid, &status, 0)`, returning the raw wait status.
pub fn sys_waitpid(pid: i32) -> Result<i32, i32> {
    let mut status: libc::c_int = 0;
    // SAFETY: status is a valid c_int out-parameter.
    let rc = unsafe { libc::waitpid(pid, &mut status, 0) };
    if rc < 0 { Err(last_errno()) } else { Ok(status) }
}

/// Child half of a subprocess pipe. Never returns.
///
/// Closes the parent's pipe end, moves `child_end` onto `target_fd`, and
/// execs `argv[0]` with `PATH` search. Exits with status 127 if exec fails.
/// Only async-signal-safe calls are made; `argv` must be NUL-terminated and
/// built before `fork`.
pub fn exec_shell_child(parent_end: i32, child_end: i32, target_fd: i32, argv: &[*const c_char]) -> ! {
    // SAFETY: plain descriptor calls plus execvp on pointers that the caller
    // keeps alive across fork; _exit never returns.
    unsafe {
        libc::close(parent_end);
        if child_end != target_fd {
            libc::dup2(child_end, target_fd);
            libc::close(child_end);
        } else {
            // Same slot: clear the close-on-exec flag dup2 would have cleared.
            let flags = libc::fcntl(child_end, libc::F_GETFD);
            if flags >= 0 {
                libc::fcntl(child_end, libc::F_SETFD, flags & !libc::FD_CLOEXEC);
            }
        }
        libc::execvp(argv[0], argv.as_ptr());
        libc::_exit(127)
    }
}
