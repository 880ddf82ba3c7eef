//! Compile coordinator: serialized record updates under a parallel compiler.
//!
//! While the external compiler runs files across worker threads, the
//! working `(modules, sources)` pair lives behind a mutex and is mutated
//! only through [`BuildState::apply`], one completion event at a time.
//! Updates for different modules commute; for the same module the last
//! writer wins; externals accumulate per source by set union. Nothing
//! reads the state until the compiler has returned.

use crate::compiler::{CompileOutput, CompileRequest, ModuleCompletion, ParallelCompiler};
use crate::options::{BuildOptions, CompileConfig};
use crate::probe;
use crate::records::{ModuleKind, ModuleRecord, SourceRecord};
use crate::reporter::Reporter;
use mica_common::{Dispatch, ModuleId};
use mica_diagnostics::Diagnostic;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Mutex;

/// What the coordinator hands back to the orchestrator.
pub(crate) enum CoordinatorOutcome {
    /// Compilation succeeded; the updated records are ready to persist.
    Ok {
        /// All module records, surviving and freshly compiled.
        modules: Vec<ModuleRecord>,
        /// All source records, sorted by path, with warnings attached.
        sources: Vec<SourceRecord>,
        /// Shaped warning diagnostics.
        warnings: Vec<Diagnostic>,
    },
    /// Compilation failed; in-memory updates were discarded.
    Errors {
        /// Shaped error and warning diagnostics, errors first.
        diagnostics: Vec<Diagnostic>,
    },
}

/// The mutex-guarded working state.
struct BuildState {
    modules: Vec<ModuleRecord>,
    sources: HashMap<PathBuf, SourceRecord>,
    announced: HashSet<PathBuf>,
}

impl BuildState {
    /// Applies one module completion. Returns `true` the first time a
    /// given source file completes, for verbose announcements.
    fn apply(&mut self, completion: ModuleCompletion, config: &CompileConfig) -> bool {
        let root = &config.project_root;
        let rel_source = probe::relativize(root, &completion.source);

        let kind = if completion.protocol {
            ModuleKind::Protocol
        } else if let Some(of) = completion.protocol_impl {
            ModuleKind::Impl { of }
        } else {
            ModuleKind::Module
        };

        let this = completion.module.clone();
        let compile_references = filter_references(completion.compile_references, &this);
        let runtime_references = filter_references(completion.runtime_references, &this);
        let compile_dispatches = filter_dispatches(completion.compile_dispatches, &this);
        let runtime_dispatches = filter_dispatches(completion.runtime_dispatches, &this);
        let external: Vec<PathBuf> = completion
            .external_resources
            .iter()
            .map(|path| probe::relativize(root, path))
            .collect();

        // Replace the module record, moving this source to the head of
        // its source list.
        let prior_sources = match self.modules.iter().position(|m| m.module == this) {
            Some(index) => self.modules.remove(index).sources,
            None => Vec::new(),
        };
        let mut module_sources = Vec::with_capacity(prior_sources.len() + 1);
        module_sources.push(rel_source.clone());
        module_sources.extend(prior_sources.into_iter().filter(|s| *s != rel_source));
        self.modules.push(ModuleRecord {
            module: this,
            kind,
            sources: module_sources,
            artifact: PathBuf::new(),
            binary: completion.binary,
        });

        let record = self.sources.entry(rel_source.clone()).or_insert_with(|| {
            let size = probe::stat(&completion.source).map_or(0, |(_, size)| size);
            SourceRecord::skeleton(rel_source.clone(), size)
        });
        record.compile_references = compile_references;
        record.runtime_references = runtime_references;
        record.compile_dispatches = compile_dispatches;
        record.runtime_dispatches = runtime_dispatches;
        for path in external {
            if !record.external.contains(&path) {
                record.external.push(path);
            }
        }
        record.warnings = Vec::new();

        self.announced.insert(rel_source)
    }
}

/// Drops self-references and toolchain-internal modules; sorts for
/// deterministic manifests.
fn filter_references(references: Vec<ModuleId>, this: &ModuleId) -> Vec<ModuleId> {
    let mut references: Vec<ModuleId> = references
        .into_iter()
        .filter(|r| r != this && !r.is_toolchain_internal())
        .collect();
    references.sort();
    references.dedup();
    references
}

fn filter_dispatches(dispatches: Vec<Dispatch>, this: &ModuleId) -> Vec<Dispatch> {
    let mut dispatches: Vec<Dispatch> = dispatches
        .into_iter()
        .filter(|d| d.module != *this && !d.module.is_toolchain_internal())
        .collect();
    dispatches.sort();
    dispatches.dedup();
    dispatches
}

/// Runs the compiler over the stale sources and assembles updated records.
pub(crate) fn run(
    compiler: &dyn ParallelCompiler,
    stale: &[PathBuf],
    modules: Vec<ModuleRecord>,
    sources: Vec<SourceRecord>,
    config: &CompileConfig,
    options: &BuildOptions,
    reporter: &dyn Reporter,
) -> CoordinatorOutcome {
    let root = &config.project_root;
    let threshold = options.threshold();
    let verbose = options.verbose;

    let state = Mutex::new(BuildState {
        modules,
        sources: sources
            .into_iter()
            .map(|record| (record.source.clone(), record))
            .collect(),
        announced: HashSet::new(),
    });

    let each_module = |completion: ModuleCompletion| {
        let source = completion.source.clone();
        let first_completion = state.lock().unwrap().apply(completion, config);
        if verbose && first_completion {
            reporter.compiled(&source);
        }
    };
    let each_long_compilation = |source: &std::path::Path| {
        reporter.long_compilation(source, threshold);
    };

    let files: Vec<PathBuf> = stale
        .iter()
        .map(|path| probe::absolutize(root, path))
        .collect();
    let request = CompileRequest {
        dest: &config.compile_dir,
        long_compilation_threshold: threshold,
        each_module: &each_module,
        each_long_compilation: &each_long_compilation,
    };

    match compiler.compile(&files, &request) {
        CompileOutput::Ok { warnings, .. } => {
            let state = state.into_inner().unwrap();
            let modules = state.modules;
            let mut sources = state.sources;

            // Attach warnings to their owning source records by absolute
            // path, and shape them for the shell.
            let mut diagnostics = Vec::with_capacity(warnings.len());
            for warning in warnings {
                let rel = probe::relativize(root, &warning.file);
                if let Some(record) = sources.get_mut(&rel) {
                    record.warnings.push((warning.line, warning.message.clone()));
                }
                diagnostics.push(Diagnostic::warning(
                    warning.file,
                    warning.line,
                    warning.message,
                ));
            }

            let mut sources: Vec<SourceRecord> = sources.into_values().collect();
            sources.sort_by(|a, b| a.source.cmp(&b.source));

            CoordinatorOutcome::Ok {
                modules,
                sources,
                warnings: diagnostics,
            }
        }
        CompileOutput::Errors { errors, warnings } => {
            let mut diagnostics = Vec::with_capacity(errors.len() + warnings.len());
            for error in errors {
                diagnostics.push(Diagnostic::error(error.file, error.line, error.message));
            }
            for warning in warnings {
                diagnostics.push(Diagnostic::warning(
                    warning.file,
                    warning.line,
                    warning.message,
                ));
            }
            CoordinatorOutcome::Errors { diagnostics }
        }
    }
}
