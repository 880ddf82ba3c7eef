//! The uniform diagnostic record handed to the shell.

use crate::severity::Severity;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Name of the compiler reported in diagnostics it produces.
pub const MICA_COMPILER: &str = "mica";

/// A normalized compiler warning or error.
///
/// Every diagnostic carries an absolute file path so the shell can render
/// it without knowing the project layout. `position` is a one-based line
/// number; `0` means the diagnostic applies to the file as a whole.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Absolute path of the file the diagnostic refers to.
    pub file: PathBuf,
    /// One-based line number, or `0` for a whole-file diagnostic.
    pub position: u32,
    /// The diagnostic message.
    pub message: String,
    /// Warning or error.
    pub severity: Severity,
    /// Name of the compiler that produced the diagnostic.
    pub compiler_name: String,
}

impl Diagnostic {
    /// Creates an error diagnostic from the Mica compiler.
    pub fn error(file: impl Into<PathBuf>, position: u32, message: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            position,
            message: message.into(),
            severity: Severity::Error,
            compiler_name: MICA_COMPILER.to_string(),
        }
    }

    /// Creates a warning diagnostic from the Mica compiler.
    pub fn warning(file: impl Into<PathBuf>, position: u32, message: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            position,
            message: message.into(),
            severity: Severity::Warning,
            compiler_name: MICA_COMPILER.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_error() {
        let d = Diagnostic::error("/proj/lib/a.mica", 3, "undefined function");
        assert_eq!(d.severity, Severity::Error);
        assert_eq!(d.position, 3);
        assert_eq!(d.compiler_name, "mica");
    }

    #[test]
    fn create_warning() {
        let d = Diagnostic::warning("/proj/lib/a.mica", 0, "unused alias");
        assert_eq!(d.severity, Severity::Warning);
        assert_eq!(d.position, 0);
    }

    #[test]
    fn serde_roundtrip() {
        let d = Diagnostic::warning("/proj/lib/a.mica", 12, "unused variable x");
        let json = serde_json::to_string(&d).unwrap();
        let back: Diagnostic = serde_json::from_str(&json).unwrap();
        assert_eq!(d, back);
    }
}
