//! Error types for the calassoc library.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for calibration store operations.
#[derive(Debug, Error)]
pub enum CalError {
    /// Error reading or writing a file.
    #[error("IO error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A persisted calibration snapshot failed shape validation.
    #[error("Bad calibration dict format in {snapshot}: {reason}")]
    MalformedStore { snapshot: String, reason: String },

    /// Matches were not a list of (filename, checksum) pairs.
    #[error("matches should be a list of (filename, checksum): {0}")]
    InvalidMatchShape(String),

    /// An association names a calibration group that does not exist.
    #[error("'{file}' is associated with {cal_type} group '{label}', which has no calibrations entry")]
    DanglingLabel {
        file: String,
        cal_type: String,
        label: String,
    },

    /// No built-in dependency graph with this name.
    #[error("Unknown dependency preset: {0}")]
    UnknownPreset(String),

    /// Error managing saved snapshot history.
    #[error("History error: {0}")]
    History(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CalError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CalError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn malformed(snapshot: impl Into<String>, reason: impl Into<String>) -> Self {
        CalError::MalformedStore {
            snapshot: snapshot.into(),
            reason: reason.into(),
        }
    }
}

/// Error from a resolution pass.
///
/// Lookup failures are carried as-is so the caller can tell "the lookup found
/// nothing" (recorded as [`Association::Missing`](crate::Association::Missing))
/// apart from "the lookup itself failed".
#[derive(Debug, Error)]
pub enum ResolveError<E> {
    /// The caller-supplied lookup returned an error.
    #[error("Calibration lookup failed: {0}")]
    Lookup(E),

    /// The store could not be walked.
    #[error(transparent)]
    Store(#[from] CalError),
}

impl<E> ResolveError<E> {
    /// The lookup error, if that is what failed.
    pub fn into_lookup(self) -> Option<E> {
        match self {
            ResolveError::Lookup(e) => Some(e),
            ResolveError::Store(_) => None,
        }
    }
}

/// Result type alias for calassoc operations.
pub type Result<T> = std::result::Result<T, CalError>;
