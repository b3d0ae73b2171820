//! Wait-status decoding for reaped subprocess pipes.
//!
//! Bit layout matches the Linux/glibc `wait(2)` status word.

/// Raw status reported by `waitpid` for a spawned child.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WaitStatus(i32);

impl WaitStatus {
    /// Wrap a raw status word.
    #[must_use]
    pub const fn from_raw(status: i32) -> Self {
        Self(status)
    }

    /// The raw status word, as a C `pclose` would return it.
    #[must_use]
    pub const fn raw(self) -> i32 {
        self.0
    }

    /// True if the child terminated normally (via `_exit` or `exit`).
    #[must_use]
    pub const fn exited(self) -> bool {
        (self.0 & 0x7f) == 0
    }

    /// Exit code of a normally-terminated child.
    #[must_use]
    pub const fn code(self) -> Option<i32> {
        if self.exited() {
            Some((self.0 >> 8) & 0xff)
        } else {
            None
        }
    }

    /// True if the child was killed by a signal.
    #[must_use]
    pub const fn signaled(self) -> bool {
        let low7 = self.0 & 0x7f;
        low7 != 0 && low7 != 0x7f
    }

    /// Signal that killed the child.
    #[must_use]
    pub const fn signal(self) -> Option<i32> {
        if self.signaled() {
            Some(self.0 & 0x7f)
        } else {
            None
        }
    }

    /// True for a normal exit with code 0.
    #[must_use]
    pub const fn success(self) -> bool {
        self.0 == 0
    }
}

impl std::fmt::Display for WaitStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.code(), self.signal()) {
            (Some(code), _) => write!(f, "exit status {code}"),
            (None, Some(sig)) => write!(f, "killed by signal {sig}"),
            (None, None) => write!(f, "wait status {:#x}", self.0),
        }
    }
}
