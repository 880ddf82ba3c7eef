//! Incremental compilation driver for the Mica toolchain.
//!
//! This crate decides, given a set of source files, the persisted manifest
//! of the previous build, and the on-disk state of sources, artifacts, and
//! upstream dependencies, which sources must be recompiled. It then drives
//! the external parallel compiler over them and updates the manifest
//! atomically and consistently.
//!
//! The driver has four moving parts:
//! 1. **Diffing**: the filesystem probe and upstream dep scanner turn
//!    disk state into a set of changed sources and stale modules
//! 2. **Solving**: the staleness solver propagates those seeds through
//!    compile-time and runtime reference edges to a fixed point
//! 3. **Coordinating**: the compile coordinator collects per-module
//!    completion events from the parallel compiler under a single writer
//! 4. **Persisting**: the manifest codec writes artifacts and records,
//!    pinned to the build timestamp
//!
//! The compiler front-end itself, path discovery, the project resolver,
//! and the shell are external collaborators reached through the
//! [`ParallelCompiler`] and [`Reporter`] traits.

#![warn(missing_docs)]

pub mod compile;
pub mod compiler;
mod coordinator;
pub mod depscan;
pub mod error;
pub mod manifest;
pub mod options;
pub mod probe;
pub mod records;
pub mod reporter;
pub mod solver;

pub use compile::{clean, compile, protocols_and_impls, read_manifest, Outcome};
pub use compiler::{
    CompileOutput, CompileRequest, CompilerDiagnostic, ModuleCompletion, ParallelCompiler,
};
pub use depscan::UpstreamDep;
pub use error::BuildError;
pub use options::{BuildOptions, CompileConfig};
pub use records::{ModuleKind, ModuleRecord, SourceRecord, ARTIFACT_EXT};
pub use reporter::{NullReporter, Reporter};
