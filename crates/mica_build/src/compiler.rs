//! Interface to the external parallel compiler.
//!
//! The build core does not compile anything itself. It hands the stale
//! source list to a [`ParallelCompiler`] and receives module-completion
//! events through the [`CompileRequest`] callbacks, possibly from many
//! worker threads at once. The completion payload carries the *raw*
//! attribute values and reference report; deriving the module kind and
//! filtering references is the coordinator's job.

use mica_common::{Dispatch, ModuleId};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Everything the compiler reports when one module finishes compiling.
///
/// References and dispatches come straight from the compiler's lexical
/// tracker: they still include self-references and toolchain-internal
/// modules. Attribute values (`protocol`, `protocol_impl`,
/// `external_resources`) are passed through unmodified.
#[derive(Clone, Debug)]
pub struct ModuleCompletion {
    /// Absolute path of the source file the module was compiled from.
    pub source: PathBuf,
    /// The compiled module.
    pub module: ModuleId,
    /// The compiled artifact bytes.
    pub binary: Vec<u8>,
    /// `true` if the module declares itself a protocol.
    pub protocol: bool,
    /// Set if the module declares itself an implementation of a protocol.
    pub protocol_impl: Option<ModuleId>,
    /// External resource paths the module declares.
    pub external_resources: Vec<PathBuf>,
    /// Modules referenced at compile time (raw).
    pub compile_references: Vec<ModuleId>,
    /// Modules referenced only at runtime (raw).
    pub runtime_references: Vec<ModuleId>,
    /// Compile-time dispatches (raw).
    pub compile_dispatches: Vec<Dispatch>,
    /// Runtime dispatches (raw).
    pub runtime_dispatches: Vec<Dispatch>,
}

/// A warning or error produced by the compiler front-end.
#[derive(Clone, Debug)]
pub struct CompilerDiagnostic {
    /// Absolute path of the offending file.
    pub file: PathBuf,
    /// One-based line number, or `0` for a whole-file diagnostic.
    pub line: u32,
    /// The message text.
    pub message: String,
}

/// The compiler's overall verdict for one batch of files.
#[derive(Debug)]
pub enum CompileOutput {
    /// Every file compiled.
    Ok {
        /// Ids of all modules produced.
        modules: Vec<ModuleId>,
        /// Warnings across all files.
        warnings: Vec<CompilerDiagnostic>,
    },
    /// At least one file failed.
    Errors {
        /// The errors encountered.
        errors: Vec<CompilerDiagnostic>,
        /// Warnings gathered before the failure.
        warnings: Vec<CompilerDiagnostic>,
    },
}

/// Options and callbacks for one compiler invocation.
///
/// Callbacks must be `Sync`: the compiler schedules files across worker
/// threads and fires them from whichever worker finishes.
pub struct CompileRequest<'a> {
    /// Destination directory for compiled artifacts.
    pub dest: &'a Path,
    /// Fire `each_long_compilation` for files compiling longer than this.
    pub long_compilation_threshold: Duration,
    /// Fired once per module as its compilation completes.
    pub each_module: &'a (dyn Fn(ModuleCompletion) + Sync),
    /// Fired when a file crosses the long-compilation threshold.
    pub each_long_compilation: &'a (dyn Fn(&Path) + Sync),
}

/// The external parallel compiler consumed by the build core.
pub trait ParallelCompiler {
    /// Compiles `files` (absolute paths), firing the request callbacks as
    /// modules complete. Blocks until every file has been processed or
    /// compilation has failed.
    fn compile(&self, files: &[PathBuf], request: &CompileRequest<'_>) -> CompileOutput;
}
