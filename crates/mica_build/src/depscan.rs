//! Upstream dependency scanner.
//!
//! Local path dependencies are built into their own compile directories by
//! their own builds. When such a dependency has been rebuilt since our
//! manifest was written, every artifact of it that is newer than our
//! manifest seeds the staleness solver: any module here whose compile-time
//! references reach one of those ids must recompile.

use crate::probe;
use crate::records::ARTIFACT_EXT;
use mica_common::ModuleId;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// A resolved upstream dependency, as reported by the project resolver.
#[derive(Clone, Debug)]
pub struct UpstreamDep {
    /// Dependency name, for reporting.
    pub name: String,
    /// `true` for dependencies managed by a source fetcher. Fetched deps
    /// are rebuilt through the fetcher's own lock handling and are not
    /// scanned here.
    pub fetchable: bool,
    /// The dependency's build directory, holding its own manifest.
    pub build_path: PathBuf,
    /// Directories its compiled artifacts are loaded from.
    pub load_paths: Vec<PathBuf>,
}

/// Returns module ids in local upstream dependencies whose artifacts are
/// newer than `manifest_mtime`.
///
/// A dependency is only scanned when its own build manifest (same basename
/// as ours, in the dep's build dir) is newer than our manifest; then every
/// artifact in its load paths with a newer mtime is included, keyed by the
/// artifact basename. With no previous manifest the set is empty — there
/// is nothing incremental to invalidate.
pub fn stale_upstream_modules(
    manifest: &Path,
    manifest_mtime: Option<SystemTime>,
    deps: &[UpstreamDep],
) -> BTreeSet<ModuleId> {
    let Some(cutoff) = manifest_mtime else {
        return BTreeSet::new();
    };
    let Some(manifest_name) = manifest.file_name() else {
        return BTreeSet::new();
    };

    let mut stale = BTreeSet::new();
    for dep in deps.iter().filter(|d| !d.fetchable) {
        let dep_manifest = dep.build_path.join(manifest_name);
        match probe::mtime(&dep_manifest) {
            Some(mtime) if mtime > cutoff => {}
            _ => continue,
        }

        for load_path in &dep.load_paths {
            for module in newer_artifacts(load_path, cutoff) {
                stale.insert(module);
            }
        }
    }
    stale
}

/// Scans a directory for `*.mx` artifacts newer than `cutoff`.
fn newer_artifacts(dir: &Path, cutoff: SystemTime) -> Vec<ModuleId> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut modules = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some(ARTIFACT_EXT) {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        if matches!(probe::mtime(&path), Some(mtime) if mtime > cutoff) {
            modules.push(ModuleId::new(stem));
        }
    }
    modules
}
