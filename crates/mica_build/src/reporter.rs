//! Progress events surfaced to the shell.
//!
//! The build core never prints. Everything a user might want to see while
//! a build runs — per-file compile notifications, long-compilation
//! warnings, the manifest landing on disk — flows through a [`Reporter`].
//! The shell decides rendering; the dependency system listens for
//! [`manifest_written`](Reporter::manifest_written) to refresh its
//! toolchain lock.

use std::path::Path;
use std::time::Duration;

/// Receiver for build progress events. All methods default to no-ops.
///
/// Implementations must be `Sync`: compile notifications fire from the
/// parallel compiler's worker threads.
pub trait Reporter: Sync {
    /// A source file finished compiling (fired only in verbose builds).
    fn compiled(&self, source: &Path) {
        let _ = source;
    }

    /// A source file has been compiling for longer than `threshold`.
    fn long_compilation(&self, source: &Path, threshold: Duration) {
        let _ = (source, threshold);
    }

    /// The manifest was written; upstream lock state should be refreshed.
    fn manifest_written(&self, manifest: &Path) {
        let _ = manifest;
    }
}

/// A reporter that ignores every event.
pub struct NullReporter;

impl Reporter for NullReporter {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_reporter_accepts_events() {
        let reporter = NullReporter;
        reporter.compiled(Path::new("lib/a.mica"));
        reporter.long_compilation(Path::new("lib/a.mica"), Duration::from_secs(10));
        reporter.manifest_written(Path::new("_build/mica.manifest"));
    }
}
