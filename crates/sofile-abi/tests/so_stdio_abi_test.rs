//! Integration tests for the `so_*` C entry points.
//!
//! Run: cargo test -p sofile-abi --test so_stdio_abi_test

use std::ffi::{CString, c_int, c_void};
use std::fs;
use std::path::PathBuf;
use std::ptr;

use sofile_abi::stdio_abi::{
    SO_EOF, so_fclose, so_feof, so_ferror, so_fflush, so_fgetc, so_fileno, so_fopen, so_fputc,
    so_fread, so_fseek, so_ftell, so_fwrite, so_pclose, so_popen,
};

fn abi_errno() -> c_int {
    // SAFETY: libc returns this thread's errno slot.
    unsafe { *libc::__errno_location() }
}

fn reset_errno() {
    // SAFETY: same slot as above.
    unsafe { *libc::__errno_location() = 0 };
}

fn scratch(tag: &str) -> (PathBuf, CString) {
    let path = std::env::temp_dir().join(format!("sofile-abi-{tag}-{}", std::process::id()));
    let _ = fs::remove_file(&path);
    let c = CString::new(path.to_str().unwrap()).unwrap();
    (path, c)
}

fn c(s: &str) -> CString {
    CString::new(s).unwrap()
}

#[test]
fn fopen_rejects_unknown_mode_with_einval() {
    let (_path, cpath) = scratch("badmode");
    reset_errno();
    let s = unsafe { so_fopen(cpath.as_ptr(), c("rw").as_ptr()) };
    assert!(s.is_null());
    assert_eq!(abi_errno(), libc::EINVAL);
}

#[test]
fn fopen_missing_file_sets_enoent() {
    reset_errno();
    let s = unsafe { so_fopen(c("/nonexistent/sofile/abi").as_ptr(), c("r").as_ptr()) };
    assert!(s.is_null());
    assert_eq!(abi_errno(), libc::ENOENT);
}

#[test]
fn fopen_null_arguments_fail() {
    let s = unsafe { so_fopen(ptr::null(), c("r").as_ptr()) };
    assert!(s.is_null());
    assert_eq!(abi_errno(), libc::EINVAL);
}

#[test]
fn putc_getc_round_trip_through_file() {
    let (path, cpath) = scratch("putc");
    unsafe {
        let w = so_fopen(cpath.as_ptr(), c("w").as_ptr());
        assert!(!w.is_null());
        assert!(so_fileno(w) >= 0);
        for &b in b"abc\xff" {
            assert_eq!(so_fputc(b as c_int, w), b as c_int);
        }
        assert_eq!(so_ftell(w), 4);
        assert_eq!(so_fclose(w), 0);

        let r = so_fopen(cpath.as_ptr(), c("r").as_ptr());
        assert!(!r.is_null());
        assert_eq!(so_fgetc(r), b'a' as c_int);
        assert_eq!(so_fgetc(r), b'b' as c_int);
        assert_eq!(so_fgetc(r), b'c' as c_int);
        // 0xff must not be confused with SO_EOF.
        assert_eq!(so_fgetc(r), 0xff);
        assert_eq!(so_feof(r), 0);
        assert_eq!(so_fgetc(r), SO_EOF);
        assert_ne!(so_feof(r), 0);
        assert_eq!(so_ferror(r), 0);
        assert_eq!(so_fclose(r), 0);
    }
    let _ = fs::remove_file(&path);
}

#[test]
fn fwrite_fread_elements_and_seek() {
    let (path, cpath) = scratch("block");
    let data: Vec<u32> = (0..3000).collect();
    unsafe {
        let s = so_fopen(cpath.as_ptr(), c("w+").as_ptr());
        assert!(!s.is_null());
        let n = so_fwrite(data.as_ptr().cast::<c_void>(), 4, data.len(), s);
        assert_eq!(n, data.len());
        assert_eq!(so_fseek(s, 0, libc::SEEK_SET), 0);

        let mut back = vec![0u32; data.len()];
        let n = so_fread(back.as_mut_ptr().cast::<c_void>(), 4, back.len(), s);
        assert_eq!(n, data.len());
        assert_eq!(back, data);

        assert_eq!(so_fseek(s, -8, libc::SEEK_END), 0);
        assert_eq!(so_ftell(s), (data.len() * 4 - 8) as libc::c_long);
        assert_eq!(so_fclose(s), 0);
    }
    let _ = fs::remove_file(&path);
}

#[test]
fn fseek_rejects_bad_whence() {
    let (path, cpath) = scratch("whence");
    unsafe {
        let s = so_fopen(cpath.as_ptr(), c("w").as_ptr());
        assert!(!s.is_null());
        reset_errno();
        assert_eq!(so_fseek(s, 0, 42), -1);
        assert_eq!(abi_errno(), libc::EINVAL);
        assert_eq!(so_fclose(s), 0);
    }
    let _ = fs::remove_file(&path);
}

#[test]
fn fseek_current_with_read_ahead_rejects_long_min() {
    let (path, cpath) = scratch("longmin");
    fs::write(&path, b"abcdef").unwrap();
    unsafe {
        let s = so_fopen(cpath.as_ptr(), c("r").as_ptr());
        assert!(!s.is_null());
        assert_eq!(so_fgetc(s), b'a' as c_int);
        reset_errno();
        assert_eq!(so_fseek(s, libc::c_long::MIN, libc::SEEK_CUR), -1);
        assert_eq!(abi_errno(), libc::EINVAL);
        assert_eq!(so_fgetc(s), b'b' as c_int);
        assert_eq!(so_fclose(s), 0);
    }
    let _ = fs::remove_file(&path);
}

#[test]
fn fflush_outside_write_sequence_fails() {
    let (path, cpath) = scratch("flush");
    fs::write(&path, b"xyz").unwrap();
    unsafe {
        let s = so_fopen(cpath.as_ptr(), c("r+").as_ptr());
        assert!(!s.is_null());
        assert_eq!(so_fflush(s), SO_EOF);
        assert_eq!(so_fputc(b'Q' as c_int, s), b'Q' as c_int);
        assert_eq!(so_fflush(s), 0);
        assert_eq!(so_fclose(s), 0);
    }
    assert_eq!(fs::read(&path).unwrap(), b"Qyz");
    let _ = fs::remove_file(&path);
}

#[test]
fn read_on_write_only_stream_sets_error_flag() {
    let (path, cpath) = scratch("wronly");
    unsafe {
        let s = so_fopen(cpath.as_ptr(), c("w").as_ptr());
        assert!(!s.is_null());
        reset_errno();
        assert_eq!(so_fgetc(s), SO_EOF);
        assert_eq!(abi_errno(), libc::EBADF);
        assert_ne!(so_ferror(s), 0);
        assert_eq!(so_fclose(s), 0);
    }
    let _ = fs::remove_file(&path);
}

#[test]
fn null_stream_is_handled() {
    unsafe {
        assert_eq!(so_fclose(ptr::null_mut()), SO_EOF);
        assert_eq!(so_fileno(ptr::null_mut()), -1);
        assert_eq!(so_fgetc(ptr::null_mut()), SO_EOF);
        assert_eq!(so_feof(ptr::null_mut()), 0);
        assert_eq!(so_ferror(ptr::null_mut()), 0);
        assert_eq!(so_fread(ptr::null_mut(), 1, 1, ptr::null_mut()), 0);
        assert_eq!(so_pclose(ptr::null_mut()), -1);
    }
}

#[test]
fn popen_read_and_pclose_status() {
    unsafe {
        let s = so_popen(c("printf abc; exit 2").as_ptr(), c("r").as_ptr());
        assert!(!s.is_null());
        let mut buf = [0u8; 16];
        let n = so_fread(buf.as_mut_ptr().cast::<c_void>(), 1, buf.len(), s);
        assert_eq!(&buf[..n], b"abc");
        assert_ne!(so_feof(s), 0);
        let status = so_pclose(s);
        assert!(libc::WIFEXITED(status));
        assert_eq!(libc::WEXITSTATUS(status), 2);
    }
}

#[test]
fn popen_write_feeds_child() {
    let (path, _) = scratch("popenw");
    let cmd = c(&format!("cat > '{}'", path.display()));
    unsafe {
        let s = so_popen(cmd.as_ptr(), c("w").as_ptr());
        assert!(!s.is_null());
        let msg = b"through the pipe\n";
        assert_eq!(so_fwrite(msg.as_ptr().cast::<c_void>(), 1, msg.len(), s), msg.len());
        assert_eq!(so_pclose(s), 0);
    }
    assert_eq!(fs::read(&path).unwrap(), b"through the pipe\n");
    let _ = fs::remove_file(&path);
}

#[test]
fn popen_rejects_bad_type() {
    reset_errno();
    let s = unsafe { so_popen(c("true").as_ptr(), c("rw").as_ptr()) };
    assert!(s.is_null());
    assert_eq!(abi_errno(), libc::EINVAL);
}

#[test]
fn pclose_on_regular_file_fails_with_echild() {
    let (path, cpath) = scratch("pclose");
    unsafe {
        let s = so_fopen(cpath.as_ptr(), c("w").as_ptr());
        assert!(!s.is_null());
        reset_errno();
        assert_eq!(so_pclose(s), -1);
        assert_eq!(abi_errno(), libc::ECHILD);
    }
    let _ = fs::remove_file(&path);
}
