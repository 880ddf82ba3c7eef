//! Manifest records linking modules, sources, and external resources.
//!
//! Two record kinds populate the manifest: one [`ModuleRecord`] per compiled
//! module and one [`SourceRecord`] per source file. Module records point at
//! the sources that contributed code to them; source records carry the
//! reference edges the staleness solver walks.

use mica_common::{Dispatch, ModuleId};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// File extension of compiled module artifacts.
pub const ARTIFACT_EXT: &str = "mx";

/// What kind of compiled unit a module record describes.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum ModuleKind {
    /// A plain module.
    Module,
    /// A protocol definition.
    Protocol,
    /// An implementation of a protocol for some data kind.
    Impl {
        /// The protocol this module implements.
        of: ModuleId,
    },
}

impl ModuleKind {
    /// Returns `true` for protocol definitions and protocol implementations.
    pub fn is_protocol_or_impl(&self) -> bool {
        matches!(self, ModuleKind::Protocol | ModuleKind::Impl { .. })
    }
}

/// Manifest record for one compiled module.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ModuleRecord {
    /// The module identifier. Unique across the manifest.
    pub module: ModuleId,

    /// Module, protocol, or protocol implementation.
    pub kind: ModuleKind,

    /// Source paths that contributed code to this module, most recent
    /// first. A single module may be defined across multiple files.
    pub sources: Vec<PathBuf>,

    /// The compiled artifact. Persisted as a filename relative to the
    /// compile directory; expanded to the joined path after loading.
    pub artifact: PathBuf,

    /// In-memory artifact bytes, present only between compile completion
    /// and manifest write. Never persisted.
    #[serde(skip)]
    pub binary: Vec<u8>,
}

impl ModuleRecord {
    /// Returns the artifact filename for a module id, e.g. `App.Repo.mx`.
    pub fn artifact_file_name(module: &ModuleId) -> String {
        format!("{module}.{ARTIFACT_EXT}")
    }
}

/// Manifest record for one source file.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SourceRecord {
    /// Source file path, relative to the project root.
    pub source: PathBuf,

    /// Byte size of the file at its last successful compile.
    pub size: u64,

    /// Modules referenced at compile time by code in this file.
    pub compile_references: Vec<ModuleId>,

    /// Modules referenced only at runtime by code in this file.
    pub runtime_references: Vec<ModuleId>,

    /// Compile-time dispatches at module/function/arity granularity.
    pub compile_dispatches: Vec<Dispatch>,

    /// Runtime dispatches at module/function/arity granularity.
    pub runtime_dispatches: Vec<Dispatch>,

    /// External resource paths declared by modules compiled from this
    /// file. Staleness of any such path forces a recompile.
    pub external: Vec<PathBuf>,

    /// `(line, message)` warnings from the most recent compilation.
    pub warnings: Vec<(u32, String)>,
}

impl SourceRecord {
    /// Creates an empty record for a source about to be (re)compiled.
    ///
    /// The compile coordinator refills references, externals, and warnings
    /// from module completion events.
    pub fn skeleton(source: PathBuf, size: u64) -> Self {
        Self {
            source,
            size,
            compile_references: Vec::new(),
            runtime_references: Vec::new(),
            compile_dispatches: Vec::new(),
            runtime_dispatches: Vec::new(),
            external: Vec::new(),
            warnings: Vec::new(),
        }
    }
}
