//! error types for tessera

use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    // === shamir errors ===
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("not enough shares: have {have}, need at least 2")]
    NotEnoughShares { have: usize },

    #[error("all shares must be the same length: expected {expected}, got {got}")]
    ShareLengthMismatch { expected: usize, got: usize },

    #[error("shares must be at least 2 bytes, got {len}")]
    ShareTooShort { len: usize },

    #[error("duplicate share x-coordinate {x}")]
    DuplicateShare { x: u8 },

    // === sink errors ===
    #[error("filesystem unavailable at {}: {source}", .path.display())]
    FilesystemUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("write to {} failed: {source}", .path.display())]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("rename onto {} failed: {source}", .path.display())]
    RenameFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("close of {} failed: {source}", .path.display())]
    CloseFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("permission denied at {}: {source}", .path.display())]
    PermissionDenied {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("mode {mode:#o} is not a regular file permission")]
    BadMode { mode: u32 },

    // === randomness ===
    #[error("randomness unavailable: {0}")]
    RandomnessUnavailable(String),
}

impl Error {
    /// true for every error raised by the atomic sink
    pub fn is_filesystem(&self) -> bool {
        matches!(
            self,
            Error::FilesystemUnavailable { .. }
                | Error::WriteFailed { .. }
                | Error::RenameFailed { .. }
                | Error::CloseFailed { .. }
                | Error::PermissionDenied { .. }
                | Error::BadMode { .. }
        )
    }

    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Error::InvalidParameters(reason.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filesystem_classification() {
        let e = Error::WriteFailed {
            path: PathBuf::from("/tmp/x"),
            source: io::Error::new(io::ErrorKind::Other, "disk full"),
        };
        assert!(e.is_filesystem());
        assert!(e.to_string().contains("/tmp/x"));
        assert!(!Error::DuplicateShare { x: 3 }.is_filesystem());
    }

    #[test]
    fn test_bad_mode_is_octal() {
        let e = Error::BadMode { mode: 0o100644 };
        assert_eq!(e.to_string(), "mode 0o100644 is not a regular file permission");
    }
}
