//! Staleness solver: the fixed point over module reference edges.
//!
//! Given the sources known dirty and the modules known stale (from
//! upstream deps), the solver decides which module records survive and
//! which sources must recompile, by propagating staleness through the
//! reference graph:
//!
//! - a **compile-time** reference to a stale module makes the referer
//!   dirty — its record is dropped and its sources recompile;
//! - a **runtime** reference to a stale module marks the referer stale for
//!   its own consumers but keeps its record: a runtime edge only embeds
//!   the referent's name, so the referer's artifact stays valid.
//!
//! The iteration is monotone over finite sets (both `changed` and `stale`
//! only grow), so cyclic reference graphs converge without special casing.
//! The solver performs no I/O; the orchestrator purges the artifacts of
//! dropped records.

use crate::records::{ModuleRecord, SourceRecord};
use mica_common::ModuleId;
use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;

/// The solver's verdict.
#[derive(Debug)]
pub struct Solution {
    /// Module records that do not need recompiling.
    pub surviving: Vec<ModuleRecord>,
    /// Module records that must be rebuilt; their artifacts are no longer
    /// trustworthy and should be purged.
    pub dropped: Vec<ModuleRecord>,
    /// All source paths requiring recompile (including removed ones, which
    /// the orchestrator subtracts back out).
    pub changed: BTreeSet<PathBuf>,
    /// All module ids marked stale, including runtime-stale survivors.
    pub stale: BTreeSet<ModuleId>,
}

/// Runs the staleness fixed point.
///
/// `changed` seeds with new files, size/mtime-dirty files, and removed
/// files; `stale` seeds with upstream dependency modules. `sources` is the
/// previous manifest's source records, keyed by path.
pub fn solve(
    modules: Vec<ModuleRecord>,
    sources: &HashMap<PathBuf, SourceRecord>,
    mut changed: BTreeSet<PathBuf>,
    mut stale: BTreeSet<ModuleId>,
) -> Solution {
    let mut dropped = vec![false; modules.len()];

    loop {
        let mut grew = false;

        for (index, module) in modules.iter().enumerate() {
            if dropped[index] {
                continue;
            }

            let mut source_changed = false;
            let mut compile_stale = false;
            let mut runtime_stale = false;

            for source in &module.sources {
                if changed.contains(source) {
                    source_changed = true;
                }
                if let Some(record) = sources.get(source) {
                    if record.compile_references.iter().any(|r| stale.contains(r)) {
                        compile_stale = true;
                    }
                    if record.runtime_references.iter().any(|r| stale.contains(r)) {
                        runtime_stale = true;
                    }
                }
            }

            if source_changed || compile_stale {
                // Dirty: the record dies, all its sources recompile, and
                // its id propagates staleness to consumers.
                dropped[index] = true;
                grew = true;
                stale.insert(module.module.clone());
                for source in &module.sources {
                    changed.insert(source.clone());
                }
            } else if runtime_stale && stale.insert(module.module.clone()) {
                grew = true;
            }
        }

        if !grew {
            break;
        }
    }

    let mut surviving = Vec::new();
    let mut dead = Vec::new();
    for (module, was_dropped) in modules.into_iter().zip(dropped) {
        if was_dropped {
            dead.push(module);
        } else {
            surviving.push(module);
        }
    }

    Solution {
        surviving,
        dropped: dead,
        changed,
        stale,
    }
}
