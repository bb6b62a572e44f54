//! Centralized error types for msgview.

use std::path::PathBuf;
use thiserror::Error;

/// Errors a parse can report.
///
/// Failures of individual message fields are never errors; the adapter
/// resolves them to absence.
#[derive(Error, Debug)]
pub enum MsgError {
    /// The external decoding capability could not be loaded for this context.
    #[error("MSG decoder not available: {0}")]
    CapabilityUnavailable(String),

    /// The decoder could not open the given file as a message.
    #[error("Failed to open MSG file: {}: {reason}", path.display())]
    OpenFailed { path: PathBuf, reason: String },
}

/// Convenience alias for `Result<T, MsgError>`.
pub type Result<T> = std::result::Result<T, MsgError>;

impl MsgError {
    /// Create an `OpenFailed` variant from a path and any displayable reason.
    pub fn open_failed(path: impl Into<PathBuf>, reason: impl std::fmt::Display) -> Self {
        Self::OpenFailed {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// `true` when the decoder itself is missing rather than the file being bad.
    pub fn is_capability_error(&self) -> bool {
        matches!(self, Self::CapabilityUnavailable(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_failed_message_carries_path() {
        let err = MsgError::open_failed("/tmp/missing.msg", "no such file");
        let text = err.to_string();
        assert!(text.contains("/tmp/missing.msg"));
        assert!(text.contains("no such file"));
        assert!(!err.is_capability_error());
    }

    #[test]
    fn test_capability_message() {
        let err = MsgError::CapabilityUnavailable("probe exited with 127".into());
        assert_eq!(
            err.to_string(),
            "MSG decoder not available: probe exited with 127"
        );
        assert!(err.is_capability_error());
    }
}
