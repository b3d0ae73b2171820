use thiserror::Error;

use sofile_core::StreamError;

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("stream: {0}")]
    Stream(#[from] StreamError),
    /// A scenario observed something other than what the contract requires.
    #[error("{what}: expected {expected}, got {actual}")]
    Mismatch {
        what: String,
        expected: String,
        actual: String,
    },
    #[error("no scenario matches filter {filter:?}")]
    NoScenarios { filter: String },
}

impl HarnessError {
    pub fn mismatch(
        what: impl Into<String>,
        expected: impl std::fmt::Debug,
        actual: impl std::fmt::Debug,
    ) -> Self {
        Self::Mismatch {
            what: what.into(),
            expected: format!("{expected:?}"),
            actual: format!("{actual:?}"),
        }
    }

    /// errno carried by an underlying stream or OS failure, if any.
    #[must_use]
    pub fn errno(&self) -> Option<i32> {
        match self {
            Self::Io(err) => err.raw_os_error(),
            Self::Stream(err) => Some(err.errno()).filter(|&e| e != 0),
            _ => None,
        }
    }
}

/// Fail with [`HarnessError::Mismatch`] unless `expected == actual`.
pub fn ensure_eq<T: PartialEq + std::fmt::Debug>(
    what: &str,
    expected: T,
    actual: T,
) -> Result<(), HarnessError> {
    if expected == actual {
        Ok(())
    } else {
        Err(HarnessError::mismatch(what, expected, actual))
    }
}
