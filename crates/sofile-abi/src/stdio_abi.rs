//! ABI layer for the `so_*` stream functions.
//!
//! Provides stream management (so_fopen/so_fclose/so_fileno), buffered I/O
//! (so_fgetc/so_fputc/so_fread/so_fwrite), positioning (so_fseek/so_ftell),
//! flushing (so_fflush), status (so_feof/so_ferror), and subprocess pipes
//! (so_popen/so_pclose).
//!
//! Pointer contract: every `*mut SoFile` argument must be null or a pointer
//! returned by `so_fopen`/`so_popen` that has not yet been passed to
//! `so_fclose`/`so_pclose`. String arguments must be null or NUL-terminated.

use std::ffi::{CStr, OsStr, c_char, c_int, c_long, c_void};
use std::os::unix::ffi::OsStrExt;

use sofile_core::{Stream, StreamError, Whence};

/// Opaque C `SO_FILE`.
pub type SoFile = Stream;

/// Returned by int-valued functions on failure or end of stream.
pub const SO_EOF: c_int = -1;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

#[inline]
unsafe fn set_abi_errno(val: c_int) {
    // SAFETY: __errno_location returns this thread's errno slot.
    unsafe { *libc::__errno_location() = val };
}

#[inline]
unsafe fn fail_with(err: &StreamError) {
    let errno = err.errno();
    if errno != 0 {
        unsafe { set_abi_errno(errno) };
    }
}

#[inline]
unsafe fn stream_mut<'a>(stream: *mut SoFile) -> Option<&'a mut SoFile> {
    // SAFETY: caller upholds the module pointer contract.
    unsafe { stream.as_mut() }
}

unsafe fn c_str<'a>(ptr: *const c_char) -> Option<&'a CStr> {
    if ptr.is_null() {
        None
    } else {
        // SAFETY: caller guarantees NUL termination.
        Some(unsafe { CStr::from_ptr(ptr) })
    }
}

fn into_handle(stream: Stream) -> *mut SoFile {
    Box::into_raw(Box::new(stream))
}

unsafe fn take_handle(stream: *mut SoFile) -> Stream {
    // SAFETY: pointer came from into_handle and is released exactly once.
    *unsafe { Box::from_raw(stream) }
}

// ---------------------------------------------------------------------------
// so_fopen / so_fclose / so_fileno
// ---------------------------------------------------------------------------

/// Open `pathname` with mode `r`, `r+`, `w`, `w+`, `a` or `a+`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn so_fopen(pathname: *const c_char, mode: *const c_char) -> *mut SoFile {
    let (Some(path), Some(mode)) = (unsafe { c_str(pathname) }, unsafe { c_str(mode) }) else {
        unsafe { set_abi_errno(libc::EINVAL) };
        return std::ptr::null_mut();
    };
    let Ok(mode) = mode.to_str() else {
        unsafe { set_abi_errno(libc::EINVAL) };
        return std::ptr::null_mut();
    };
    match Stream::open(OsStr::from_bytes(path.to_bytes()), mode) {
        Ok(stream) => into_handle(stream),
        Err(err) => {
            unsafe { fail_with(&err) };
            std::ptr::null_mut()
        }
    }
}

/// Drain, close and free a stream. The pointer is invalid afterwards.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn so_fclose(stream: *mut SoFile) -> c_int {
    if stream.is_null() {
        unsafe { set_abi_errno(libc::EBADF) };
        return SO_EOF;
    }
    match unsafe { take_handle(stream) }.close() {
        Ok(()) => 0,
        Err(err) => {
            unsafe { fail_with(&err) };
            SO_EOF
        }
    }
}

/// Underlying file descriptor.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn so_fileno(stream: *mut SoFile) -> c_int {
    match unsafe { stream_mut(stream) } {
        Some(s) => s.descriptor(),
        None => {
            unsafe { set_abi_errno(libc::EBADF) };
            -1
        }
    }
}

// ---------------------------------------------------------------------------
// so_fflush / so_fseek / so_ftell
// ---------------------------------------------------------------------------

/// Write out buffered bytes. Fails outside a write sequence.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn so_fflush(stream: *mut SoFile) -> c_int {
    let Some(s) = (unsafe { stream_mut(stream) }) else {
        unsafe { set_abi_errno(libc::EBADF) };
        return SO_EOF;
    };
    match s.flush() {
        Ok(()) => 0,
        Err(err) => {
            unsafe { fail_with(&err) };
            SO_EOF
        }
    }
}

/// Reposition; `whence` is `SEEK_SET`, `SEEK_CUR` or `SEEK_END`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn so_fseek(stream: *mut SoFile, offset: c_long, whence: c_int) -> c_int {
    let Some(s) = (unsafe { stream_mut(stream) }) else {
        unsafe { set_abi_errno(libc::EBADF) };
        return -1;
    };
    let Some(whence) = Whence::from_posix(whence) else {
        unsafe { set_abi_errno(libc::EINVAL) };
        return -1;
    };
    match s.seek(offset as i64, whence) {
        Ok(()) => 0,
        Err(err) => {
            unsafe { fail_with(&err) };
            -1
        }
    }
}

/// Logical offset, or -1.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn so_ftell(stream: *mut SoFile) -> c_long {
    let Some(s) = (unsafe { stream_mut(stream) }) else {
        unsafe { set_abi_errno(libc::EBADF) };
        return -1;
    };
    match s.tell() {
        Ok(pos) => pos as c_long,
        Err(err) => {
            unsafe { fail_with(&err) };
            -1
        }
    }
}

// ---------------------------------------------------------------------------
// so_feof / so_ferror
// ---------------------------------------------------------------------------

/// Nonzero once end of input was reached.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn so_feof(stream: *mut SoFile) -> c_int {
    unsafe { stream_mut(stream) }.is_some_and(|s| s.is_eof()) as c_int
}

/// Nonzero once any I/O error occurred.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn so_ferror(stream: *mut SoFile) -> c_int {
    unsafe { stream_mut(stream) }.is_some_and(|s| s.has_error()) as c_int
}

// ---------------------------------------------------------------------------
// so_fgetc / so_fputc
// ---------------------------------------------------------------------------

/// Next byte as an unsigned value, or `SO_EOF`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn so_fgetc(stream: *mut SoFile) -> c_int {
    let Some(s) = (unsafe { stream_mut(stream) }) else {
        unsafe { set_abi_errno(libc::EBADF) };
        return SO_EOF;
    };
    match s.read_byte() {
        Ok(byte) => byte as c_int,
        Err(err) => {
            unsafe { fail_with(&err) };
            SO_EOF
        }
    }
}

/// Buffer `(unsigned char) c`; returns it, or `SO_EOF`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn so_fputc(c: c_int, stream: *mut SoFile) -> c_int {
    let Some(s) = (unsafe { stream_mut(stream) }) else {
        unsafe { set_abi_errno(libc::EBADF) };
        return SO_EOF;
    };
    match s.write_byte(c as u8) {
        Ok(byte) => byte as c_int,
        Err(err) => {
            unsafe { fail_with(&err) };
            SO_EOF
        }
    }
}

// ---------------------------------------------------------------------------
// so_fread / so_fwrite
// ---------------------------------------------------------------------------

/// Read up to `nmemb` elements of `size` bytes; returns complete elements.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn so_fread(ptr: *mut c_void, size: usize, nmemb: usize, stream: *mut SoFile) -> usize {
    let Some(s) = (unsafe { stream_mut(stream) }) else {
        return 0;
    };
    let Some(total) = size.checked_mul(nmemb) else {
        unsafe { set_abi_errno(libc::EOVERFLOW) };
        return 0;
    };
    if ptr.is_null() || total == 0 {
        return 0;
    }
    // SAFETY: caller guarantees ptr is writable for size * nmemb bytes.
    let dest = unsafe { std::slice::from_raw_parts_mut(ptr.cast::<u8>(), total) };
    s.read_block(dest, size, nmemb)
}

/// Write `nmemb` elements of `size` bytes; returns 0 if any byte failed.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn so_fwrite(ptr: *const c_void, size: usize, nmemb: usize, stream: *mut SoFile) -> usize {
    let Some(s) = (unsafe { stream_mut(stream) }) else {
        return 0;
    };
    let Some(total) = size.checked_mul(nmemb) else {
        unsafe { set_abi_errno(libc::EOVERFLOW) };
        return 0;
    };
    if ptr.is_null() || total == 0 {
        return 0;
    }
    // SAFETY: caller guarantees ptr is readable for size * nmemb bytes.
    let src = unsafe { std::slice::from_raw_parts(ptr.cast::<u8>(), total) };
    s.write_block(src, size, nmemb)
}

// ---------------------------------------------------------------------------
// so_popen / so_pclose
// ---------------------------------------------------------------------------

/// Run `command` through the shell; `type` is `"r"` or `"w"`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn so_popen(command: *const c_char, r#type: *const c_char) -> *mut SoFile {
    let (Some(command), Some(direction)) = (unsafe { c_str(command) }, unsafe { c_str(r#type) }) else {
        unsafe { set_abi_errno(libc::EINVAL) };
        return std::ptr::null_mut();
    };
    let (Ok(command), Ok(direction)) = (command.to_str(), direction.to_str()) else {
        unsafe { set_abi_errno(libc::EINVAL) };
        return std::ptr::null_mut();
    };
    match Stream::spawn(command, direction) {
        Ok(stream) => into_handle(stream),
        Err(err) => {
            unsafe { fail_with(&err) };
            std::ptr::null_mut()
        }
    }
}

/// Close a `so_popen` stream and wait for its child. Returns the raw wait
/// status, or -1.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn so_pclose(stream: *mut SoFile) -> c_int {
    if stream.is_null() {
        unsafe { set_abi_errno(libc::EINVAL) };
        return -1;
    }
    match unsafe { take_handle(stream) }.reap() {
        Ok(status) => status.raw(),
        Err(err) => {
            unsafe { fail_with(&err) };
            -1
        }
    }
}
