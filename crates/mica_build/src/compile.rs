//! Top-level build orchestration.
//!
//! [`compile`] is the single public entry point of the incremental driver:
//!
//! 1. Capture the build timestamp (before any file is read, so writes that
//!    race this build are caught next time)
//! 2. Enumerate sources under the configured roots
//! 3. Read the previous manifest
//! 4. Diff against disk: removed, new, size- or mtime-changed sources,
//!    stale external resources
//! 5. Seed module staleness from rebuilt upstream dependencies
//! 6. Run the staleness solver to a fixed point
//! 7. Hand the stale sources to the parallel compiler via the coordinator
//! 8. Persist the updated manifest, pinned to the build timestamp

use crate::coordinator::{self, CoordinatorOutcome};
use crate::compiler::ParallelCompiler;
use crate::depscan;
use crate::error::BuildError;
use crate::manifest;
use crate::options::{BuildOptions, CompileConfig};
use crate::probe::{self, Stat};
use crate::records::{ModuleRecord, SourceRecord};
use crate::reporter::Reporter;
use crate::solver;
use mica_diagnostics::Diagnostic;
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// The result of a build that did not fail on I/O.
#[derive(Debug)]
pub enum Outcome {
    /// Something was compiled or the manifest was rewritten.
    Ok(Vec<Diagnostic>),
    /// Nothing to do; the manifest was left untouched.
    Noop(Vec<Diagnostic>),
    /// The compiler reported errors; the previous manifest remains
    /// authoritative.
    Errors(Vec<Diagnostic>),
}

impl Outcome {
    /// The diagnostics carried by this outcome.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            Outcome::Ok(d) | Outcome::Noop(d) | Outcome::Errors(d) => d,
        }
    }
}

/// Runs an incremental build.
///
/// Returns `Err` only for failures that would leave state inconsistent if
/// ignored (artifact or manifest writes). Compiler failures come back as
/// [`Outcome::Errors`] with the previous manifest still on disk.
pub fn compile(
    compiler: &dyn ParallelCompiler,
    config: &CompileConfig,
    options: &BuildOptions,
    reporter: &dyn Reporter,
) -> Result<Outcome, BuildError> {
    let root = &config.project_root;
    let timestamp = SystemTime::now();

    let current = extract_sources(config)?;
    let (all_modules, all_sources) = manifest::read(&config.manifest, &config.compile_dir);
    let manifest_mtime = probe::mtime(&config.manifest);

    let current_set: BTreeSet<PathBuf> = current.iter().cloned().collect();
    let removed: BTreeSet<PathBuf> = all_sources
        .iter()
        .map(|record| record.source.clone())
        .filter(|path| !current_set.contains(path))
        .collect();

    let changed = if options.force {
        current_set.clone()
    } else {
        let stats = probe::probe_all(root, &current, &all_sources);
        detect_changed(&current, &all_sources, &stats, manifest_mtime)
    };

    let stale_seed = depscan::stale_upstream_modules(&config.manifest, manifest_mtime, &config.deps);

    let source_index: HashMap<PathBuf, SourceRecord> = all_sources
        .iter()
        .map(|record| (record.source.clone(), record.clone()))
        .collect();
    let mut seed = changed;
    seed.extend(removed.iter().cloned());
    let solution = solver::solve(all_modules, &source_index, seed, stale_seed);

    // Dropped records are about to be recompiled (or are gone for good);
    // purge their artifacts best-effort.
    for module in &solution.dropped {
        let _ = fs::remove_file(&module.artifact);
    }

    let stale_to_compile: Vec<PathBuf> = solution
        .changed
        .iter()
        .filter(|path| !removed.contains(*path))
        .cloned()
        .collect();

    // Rebuild the source records: drop removed files, keep untouched
    // records, and start changed files from an empty skeleton for the
    // coordinator to refill.
    let mut sources: Vec<SourceRecord> = all_sources
        .into_iter()
        .filter(|record| {
            !removed.contains(&record.source) && !solution.changed.contains(&record.source)
        })
        .collect();
    for path in &stale_to_compile {
        let size = probe::stat(&probe::absolutize(root, path)).map_or(0, |(_, size)| size);
        sources.push(SourceRecord::skeleton(path.clone(), size));
    }

    let mut diagnostics = Vec::new();
    if options.all_warnings {
        for record in &sources {
            for (line, message) in &record.warnings {
                diagnostics.push(Diagnostic::warning(
                    probe::absolutize(root, &record.source),
                    *line,
                    message.clone(),
                ));
            }
        }
    }

    if !stale_to_compile.is_empty() {
        match coordinator::run(
            compiler,
            &stale_to_compile,
            solution.surviving,
            sources,
            config,
            options,
            reporter,
        ) {
            CoordinatorOutcome::Ok {
                modules,
                sources,
                warnings,
            } => {
                manifest::write(&config.manifest, modules, sources, &config.compile_dir, timestamp)?;
                reporter.manifest_written(&config.manifest);
                diagnostics.extend(warnings);
                Ok(Outcome::Ok(diagnostics))
            }
            CoordinatorOutcome::Errors {
                diagnostics: compile_diagnostics,
            } => {
                diagnostics.extend(compile_diagnostics);
                Ok(Outcome::Errors(diagnostics))
            }
        }
    } else if !removed.is_empty() {
        manifest::write(
            &config.manifest,
            solution.surviving,
            sources,
            &config.compile_dir,
            timestamp,
        )?;
        reporter.manifest_written(&config.manifest);
        Ok(Outcome::Ok(diagnostics))
    } else {
        Ok(Outcome::Noop(diagnostics))
    }
}

/// Deletes every artifact listed in the manifest, then the manifest
/// itself. All removals are best-effort.
pub fn clean(manifest: &Path, compile_dir: &Path) {
    let (modules, _) = manifest::read(manifest, compile_dir);
    for module in modules {
        let _ = fs::remove_file(&module.artifact);
    }
    let _ = fs::remove_file(manifest);
}

/// Reads the manifest, returning records with artifact paths expanded
/// under `compile_dir`.
pub fn read_manifest(
    manifest: &Path,
    compile_dir: &Path,
) -> (Vec<ModuleRecord>, Vec<SourceRecord>) {
    manifest::read(manifest, compile_dir)
}

/// Returns the module records of protocols and protocol implementations.
///
/// Artifact paths are already joined under `compile_dir`; callers must
/// not join them again.
pub fn protocols_and_impls(manifest: &Path, compile_dir: &Path) -> Vec<ModuleRecord> {
    let (modules, _) = manifest::read(manifest, compile_dir);
    modules
        .into_iter()
        .filter(|module| module.kind.is_protocol_or_impl())
        .collect()
}

/// Enumerates source files under the configured roots, returning sorted
/// root-relative paths.
fn extract_sources(config: &CompileConfig) -> Result<Vec<PathBuf>, BuildError> {
    let mut found = Vec::new();
    for dir in &config.roots {
        let dir = probe::absolutize(&config.project_root, dir);
        if dir.is_dir() {
            walk(&dir, &config.extensions, &mut found)?;
        }
    }
    let mut found: Vec<PathBuf> = found
        .into_iter()
        .map(|path| probe::relativize(&config.project_root, &path))
        .collect();
    found.sort();
    found.dedup();
    Ok(found)
}

/// Recursively collects files whose extension is in `extensions`.
fn walk(dir: &Path, extensions: &[String], found: &mut Vec<PathBuf>) -> Result<(), BuildError> {
    let entries = fs::read_dir(dir).map_err(|e| BuildError::io(dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| BuildError::io(dir, e))?;
        let path = entry.path();
        if path.is_dir() {
            walk(&path, extensions, found)?;
        } else if path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| extensions.iter().any(|wanted| wanted == e))
        {
            found.push(path);
        }
    }
    Ok(())
}

/// Classifies current sources against the previous manifest.
///
/// A source is changed when it is new, its stat failed, its size differs
/// from the recorded size, or its own mtime or any of its externals'
/// mtimes exceed the manifest's.
fn detect_changed(
    current: &[PathBuf],
    previous: &[SourceRecord],
    stats: &HashMap<PathBuf, Option<Stat>>,
    manifest_mtime: Option<SystemTime>,
) -> BTreeSet<PathBuf> {
    let by_path: HashMap<&PathBuf, &SourceRecord> =
        previous.iter().map(|record| (&record.source, record)).collect();

    let mut changed = BTreeSet::new();
    for path in current {
        let Some(record) = by_path.get(path) else {
            changed.insert(path.clone());
            continue;
        };
        let Some(cutoff) = manifest_mtime else {
            changed.insert(path.clone());
            continue;
        };

        let fresh = match stats.get(path) {
            Some(Some((mtime, size))) => *size == record.size && *mtime <= cutoff,
            _ => false,
        };
        let externals_fresh = record.external.iter().all(|external| {
            matches!(stats.get(external), Some(Some((mtime, _))) if *mtime <= cutoff)
        });

        if !fresh || !externals_fresh {
            changed.insert(path.clone());
        }
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::depscan::UpstreamDep;
    use std::time::Duration;

    fn config(root: &Path) -> CompileConfig {
        CompileConfig {
            project_root: root.to_path_buf(),
            roots: vec![PathBuf::from("lib")],
            extensions: vec!["mica".to_string()],
            manifest: root.join("_build/mica.manifest"),
            compile_dir: root.join("_build/lib"),
            deps: Vec::<UpstreamDep>::new(),
        }
    }

    #[test]
    fn extract_sources_recursive_sorted() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("lib/nested")).unwrap();
        fs::write(dir.path().join("lib/b.mica"), "module B").unwrap();
        fs::write(dir.path().join("lib/nested/a.mica"), "module A").unwrap();
        fs::write(dir.path().join("lib/readme.txt"), "not source").unwrap();

        let sources = extract_sources(&config(dir.path())).unwrap();
        assert_eq!(
            sources,
            vec![
                PathBuf::from("lib/b.mica"),
                PathBuf::from("lib/nested/a.mica")
            ]
        );
    }

    #[test]
    fn extract_sources_missing_root_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let sources = extract_sources(&config(dir.path())).unwrap();
        assert!(sources.is_empty());
    }

    #[test]
    fn detect_changed_new_file() {
        let current = vec![PathBuf::from("lib/a.mica")];
        let stats = HashMap::new();
        let changed = detect_changed(&current, &[], &stats, Some(SystemTime::now()));
        assert!(changed.contains(&PathBuf::from("lib/a.mica")));
    }

    #[test]
    fn detect_changed_size_mismatch() {
        let cutoff = SystemTime::now();
        let old = cutoff - Duration::from_secs(100);
        let current = vec![PathBuf::from("lib/a.mica")];
        let previous = vec![SourceRecord::skeleton(PathBuf::from("lib/a.mica"), 10)];
        let mut stats: HashMap<PathBuf, Option<Stat>> = HashMap::new();
        stats.insert(PathBuf::from("lib/a.mica"), Some((old, 11)));

        let changed = detect_changed(&current, &previous, &stats, Some(cutoff));
        assert_eq!(changed.len(), 1);
    }

    #[test]
    fn detect_changed_fresh_file_is_clean() {
        let cutoff = SystemTime::now();
        let old = cutoff - Duration::from_secs(100);
        let current = vec![PathBuf::from("lib/a.mica")];
        let previous = vec![SourceRecord::skeleton(PathBuf::from("lib/a.mica"), 10)];
        let mut stats: HashMap<PathBuf, Option<Stat>> = HashMap::new();
        stats.insert(PathBuf::from("lib/a.mica"), Some((old, 10)));

        let changed = detect_changed(&current, &previous, &stats, Some(cutoff));
        assert!(changed.is_empty());
    }

    #[test]
    fn detect_changed_stale_external() {
        let cutoff = SystemTime::now();
        let old = cutoff - Duration::from_secs(100);
        let newer = cutoff + Duration::from_secs(100);
        let current = vec![PathBuf::from("lib/a.mica")];
        let mut record = SourceRecord::skeleton(PathBuf::from("lib/a.mica"), 10);
        record.external = vec![PathBuf::from("priv/schema.json")];
        let mut stats: HashMap<PathBuf, Option<Stat>> = HashMap::new();
        stats.insert(PathBuf::from("lib/a.mica"), Some((old, 10)));
        stats.insert(PathBuf::from("priv/schema.json"), Some((newer, 3)));

        let changed = detect_changed(&current, &[record], &stats, Some(cutoff));
        assert_eq!(changed.len(), 1);
    }

    #[test]
    fn detect_changed_missing_external() {
        let cutoff = SystemTime::now();
        let old = cutoff - Duration::from_secs(100);
        let current = vec![PathBuf::from("lib/a.mica")];
        let mut record = SourceRecord::skeleton(PathBuf::from("lib/a.mica"), 10);
        record.external = vec![PathBuf::from("priv/gone.json")];
        let mut stats: HashMap<PathBuf, Option<Stat>> = HashMap::new();
        stats.insert(PathBuf::from("lib/a.mica"), Some((old, 10)));
        stats.insert(PathBuf::from("priv/gone.json"), None);

        let changed = detect_changed(&current, &[record], &stats, Some(cutoff));
        assert_eq!(changed.len(), 1);
    }
}
