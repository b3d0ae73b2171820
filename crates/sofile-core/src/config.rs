//! Runtime configuration.
//!
//! Resolved once from the environment and cached for the life of the process:
//! - `SOFILE_SHELL`: program run by [`Stream::spawn`](crate::Stream::spawn) as
//!   `<shell> -c <command>`. Looked up through `PATH`. Default `sh`.
//! - `SOFILE_CREATE_MODE`: octal permission bits for files created by
//!   [`Stream::open`](crate::Stream::open). Default `0644`. Values that do not
//!   parse as octal, or that carry bits outside `0o7777`, fall back to the
//!   default.

use std::sync::OnceLock;

/// Environment variable naming the spawn shell.
pub const ENV_SHELL: &str = "SOFILE_SHELL";
/// Environment variable holding octal create-mode bits.
pub const ENV_CREATE_MODE: &str = "SOFILE_CREATE_MODE";

/// Shell used when `SOFILE_SHELL` is unset or empty.
pub const DEFAULT_SHELL: &str = "sh";
/// Permission bits used when `SOFILE_CREATE_MODE` is unset or invalid.
pub const DEFAULT_CREATE_MODE: u32 = 0o644;

/// Stream runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Shell program for subprocess pipes.
    pub shell: String,
    /// Permission bits passed to `open(2)` when a file is created.
    pub create_mode: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            shell: DEFAULT_SHELL.to_string(),
            create_mode: DEFAULT_CREATE_MODE,
        }
    }
}

impl Config {
    /// Read the configuration from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let shell = lookup(ENV_SHELL)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_SHELL.to_string());
        let create_mode = lookup(ENV_CREATE_MODE)
            .and_then(|raw| parse_create_mode(&raw))
            .unwrap_or(DEFAULT_CREATE_MODE);
        Self { shell, create_mode }
    }
}

fn parse_create_mode(raw: &str) -> Option<u32> {
    let digits = raw.trim();
    let digits = digits
        .strip_prefix("0o")
        .or_else(|| digits.strip_prefix("0O"))
        .unwrap_or(digits);
    if digits.is_empty() {
        return None;
    }
    u32::from_str_radix(digits, 8)
        .ok()
        .filter(|bits| bits & !0o7777 == 0)
}

static CONFIG: OnceLock<Config> = OnceLock::new();

/// Process-wide configuration (reads the environment on first call).
pub fn config() -> &'static Config {
    CONFIG.get_or_init(Config::from_env)
}
