//! Versioned build manifest codec.
//!
//! The manifest is a single binary file: 4 magic bytes, a little-endian
//! `u32` format version, and a zlib-compressed bincode payload. The payload
//! leads with an index of artifact filenames so that *any* newer reader can
//! clean up a stale compile directory without decoding full records, then
//! carries the module and source records.
//!
//! Reads are fail-safe: a missing, corrupt, or unknown-version manifest
//! yields empty state (full rebuild). A manifest with a recognized older
//! version additionally deletes every artifact it lists before yielding
//! empty state, so the forced rebuild starts from a clean compile
//! directory.

use crate::error::BuildError;
use crate::records::{ModuleRecord, SourceRecord};
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Magic bytes identifying a Mica build manifest.
pub const MANIFEST_MAGIC: [u8; 4] = *b"MICA";

/// Current manifest format version. Increment on breaking record changes.
pub const MANIFEST_VERSION: u32 = 3;

/// Older versions we still recognize, for the narrow purpose of deleting
/// their artifacts before a full rebuild.
const CLEANUP_VERSIONS: [u32; 2] = [1, 2];

/// The record portion of the payload, after the artifact index.
#[derive(Serialize, Deserialize)]
struct Records {
    modules: Vec<ModuleRecord>,
    sources: Vec<SourceRecord>,
}

/// Reads the manifest, returning `(modules, sources)` with artifact paths
/// expanded under `compile_dir`.
///
/// Any failure — missing file, bad magic, unknown version, truncated or
/// corrupt payload — returns empty state. A recognized old version deletes
/// the artifacts it lists (best-effort) and returns empty state.
pub fn read(path: &Path, compile_dir: &Path) -> (Vec<ModuleRecord>, Vec<SourceRecord>) {
    let Ok(bytes) = fs::read(path) else {
        return (Vec::new(), Vec::new());
    };
    decode(&bytes, compile_dir).unwrap_or_default()
}

fn decode(bytes: &[u8], compile_dir: &Path) -> Option<(Vec<ModuleRecord>, Vec<SourceRecord>)> {
    if bytes.len() < 8 || bytes[..4] != MANIFEST_MAGIC {
        return None;
    }
    let version = u32::from_le_bytes(bytes[4..8].try_into().ok()?);

    let mut payload = Vec::new();
    ZlibDecoder::new(&bytes[8..])
        .read_to_end(&mut payload)
        .ok()?;

    let config = bincode::config::standard();
    let (artifacts, consumed): (Vec<String>, usize) =
        bincode::serde::decode_from_slice(&payload, config).ok()?;

    if version == MANIFEST_VERSION {
        let (mut records, _): (Records, usize) =
            bincode::serde::decode_from_slice(&payload[consumed..], config).ok()?;
        for module in &mut records.modules {
            module.artifact = compile_dir.join(&module.artifact);
        }
        Some((records.modules, records.sources))
    } else if CLEANUP_VERSIONS.contains(&version) {
        for name in artifacts {
            let _ = fs::remove_file(compile_dir.join(name));
        }
        None
    } else {
        None
    }
}

/// Writes the manifest, materializing freshly compiled artifacts first.
///
/// If both record lists are empty the manifest file is deleted instead.
/// Otherwise: every module carrying in-memory `binary` bytes is written to
/// `<compile_dir>/<module>.mx` with its mtime pinned to `timestamp`, the
/// binary is stripped and the `artifact` field rewritten to the relative
/// filename, and the whole state is serialized with the manifest's own
/// mtime pinned to `timestamp` as well. The manifest mtime is the
/// canonical "build completed" instant that the next build compares
/// against.
///
/// Artifact and manifest write failures are fatal for the build.
pub fn write(
    path: &Path,
    mut modules: Vec<ModuleRecord>,
    sources: Vec<SourceRecord>,
    compile_dir: &Path,
    timestamp: SystemTime,
) -> Result<(), BuildError> {
    if modules.is_empty() && sources.is_empty() {
        let _ = fs::remove_file(path);
        return Ok(());
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| BuildError::io(parent, e))?;
    }
    fs::create_dir_all(compile_dir).map_err(|e| BuildError::io(compile_dir, e))?;

    let mut artifacts = Vec::with_capacity(modules.len());
    for module in &mut modules {
        let file_name = ModuleRecord::artifact_file_name(&module.module);
        if !module.binary.is_empty() {
            let artifact_path = compile_dir.join(&file_name);
            fs::write(&artifact_path, &module.binary)
                .map_err(|e| BuildError::io(&artifact_path, e))?;
            set_mtime(&artifact_path, timestamp)?;
            module.binary = Vec::new();
        }
        module.artifact = PathBuf::from(&file_name);
        artifacts.push(file_name);
    }

    let config = bincode::config::standard();
    let mut payload = bincode::serde::encode_to_vec(&artifacts, config).map_err(serialization)?;
    let records = Records { modules, sources };
    payload.extend(bincode::serde::encode_to_vec(&records, config).map_err(serialization)?);

    let mut bytes = Vec::with_capacity(8 + payload.len());
    bytes.extend_from_slice(&MANIFEST_MAGIC);
    bytes.extend_from_slice(&MANIFEST_VERSION.to_le_bytes());

    let mut encoder = ZlibEncoder::new(bytes, Compression::default());
    encoder
        .write_all(&payload)
        .map_err(|e| BuildError::io(path, e))?;
    let bytes = encoder.finish().map_err(|e| BuildError::io(path, e))?;

    fs::write(path, bytes).map_err(|e| BuildError::io(path, e))?;
    set_mtime(path, timestamp)
}

/// Pins a file's mtime to the build timestamp.
fn set_mtime(path: &Path, timestamp: SystemTime) -> Result<(), BuildError> {
    let file = fs::OpenOptions::new()
        .write(true)
        .open(path)
        .map_err(|e| BuildError::io(path, e))?;
    file.set_modified(timestamp)
        .map_err(|e| BuildError::io(path, e))
}

fn serialization(e: bincode::error::EncodeError) -> BuildError {
    BuildError::Serialization {
        reason: e.to_string(),
    }
}
