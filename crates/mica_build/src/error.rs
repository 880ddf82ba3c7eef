//! Error types for build driver operations.

use std::path::PathBuf;

/// Errors that can occur while driving a build.
///
/// Reads are fail-safe (a corrupt manifest or an unreadable source degrades
/// to "rebuild"), so this enum covers only the failures that would leave
/// state inconsistent if swallowed: artifact and manifest writes.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// An I/O error occurred while reading or writing build state.
    #[error("build I/O error at {path}: {source}")]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Manifest serialization failed.
    #[error("manifest serialization error: {reason}")]
    Serialization {
        /// Description of the serialization failure.
        reason: String,
    },
}

impl BuildError {
    /// Wraps an I/O error with the path it occurred at.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_display() {
        let err = BuildError::io(
            "/proj/_build/mica.manifest",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        let msg = err.to_string();
        assert!(msg.contains("build I/O error"));
        assert!(msg.contains("mica.manifest"));
    }

    #[test]
    fn serialization_display() {
        let err = BuildError::Serialization {
            reason: "truncated record".to_string(),
        };
        assert!(err.to_string().contains("truncated record"));
    }
}
