//! Build configuration and options.

use crate::depscan::UpstreamDep;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Where a build reads from and writes to.
///
/// Assembled by the project resolver; the build core treats it as ground
/// truth and never discovers paths on its own beyond walking `roots`.
#[derive(Clone, Debug)]
pub struct CompileConfig {
    /// The project root. Source and external paths are stored in the
    /// manifest relative to it.
    pub project_root: PathBuf,
    /// Directories to enumerate sources under, relative to the root.
    pub roots: Vec<PathBuf>,
    /// Source file extensions to pick up, without the leading dot.
    pub extensions: Vec<String>,
    /// Path of the build manifest.
    pub manifest: PathBuf,
    /// Destination directory for compiled artifacts.
    pub compile_dir: PathBuf,
    /// Resolved upstream dependencies to scan for staleness.
    pub deps: Vec<UpstreamDep>,
}

/// Default long-compilation threshold, in seconds.
const DEFAULT_LONG_COMPILATION_THRESHOLD: u64 = 10;

/// Caller-facing build options.
///
/// Deserializable so a shell can embed a `[build]` table in its project
/// file. Unknown compiler options are forwarded by the shell directly to
/// the compiler and never pass through here.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct BuildOptions {
    /// Recompile everything regardless of staleness.
    pub force: bool,
    /// Emit a per-file notification as each source compiles.
    pub verbose: bool,
    /// Seconds before a file's compilation is reported as long-running.
    pub long_compilation_threshold: u64,
    /// Re-emit stored warnings from unchanged sources at build start.
    pub all_warnings: bool,
}

impl BuildOptions {
    /// The long-compilation threshold as a [`Duration`].
    pub fn threshold(&self) -> Duration {
        Duration::from_secs(self.long_compilation_threshold)
    }
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            force: false,
            verbose: false,
            long_compilation_threshold: DEFAULT_LONG_COMPILATION_THRESHOLD,
            all_warnings: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let options = BuildOptions::default();
        assert!(!options.force);
        assert!(!options.verbose);
        assert!(!options.all_warnings);
        assert_eq!(options.threshold(), Duration::from_secs(10));
    }

    #[test]
    fn parse_from_project_file_snippet() {
        let options: BuildOptions = toml::from_str(
            r#"
force = false
verbose = true
long_compilation_threshold = 30
"#,
        )
        .unwrap();
        assert!(options.verbose);
        assert_eq!(options.threshold(), Duration::from_secs(30));
        assert!(!options.all_warnings);
    }

    #[test]
    fn parse_empty_snippet_uses_defaults() {
        let options: BuildOptions = toml::from_str("").unwrap();
        assert_eq!(
            options.long_compilation_threshold,
            DEFAULT_LONG_COMPILATION_THRESHOLD
        );
    }
}
