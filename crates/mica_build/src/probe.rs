//! Filesystem probe: `(mtime, size)` for sources and external resources.
//!
//! The probe is read-only and fail-safe. A path that cannot be stat'd maps
//! to `None`, which the change detector treats as stale.

use crate::records::SourceRecord;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Modification time and byte size of a file.
pub type Stat = (SystemTime, u64);

/// Returns the mtime and size of a file, or `None` if it cannot be stat'd.
pub fn stat(path: &Path) -> Option<Stat> {
    let meta = fs::metadata(path).ok()?;
    let mtime = meta.modified().ok()?;
    Some((mtime, meta.len()))
}

/// Returns the mtime of a file, or `None` if it cannot be stat'd.
pub fn mtime(path: &Path) -> Option<SystemTime> {
    stat(path).map(|(mtime, _)| mtime)
}

/// Joins a project-root-relative path under the root. Absolute paths pass
/// through unchanged.
pub fn absolutize(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

/// Strips the project root prefix from a path when it lies under the root.
/// Paths outside the root (or already relative) pass through unchanged.
pub fn relativize(root: &Path, path: &Path) -> PathBuf {
    match path.strip_prefix(root) {
        Ok(stripped) => stripped.to_path_buf(),
        Err(_) => path.to_path_buf(),
    }
}

/// Stats every current source and every external resource referenced by
/// the given source records.
///
/// Keys are the record-form (root-relative) paths; each distinct path is
/// stat'd at most once even when many sources share an external. Missing
/// files map to `None`.
pub fn probe_all(
    root: &Path,
    current: &[PathBuf],
    sources: &[SourceRecord],
) -> HashMap<PathBuf, Option<Stat>> {
    let mut stats = HashMap::with_capacity(current.len());

    for path in current {
        stats
            .entry(path.clone())
            .or_insert_with(|| stat(&absolutize(root, path)));
    }

    for record in sources {
        for external in &record.external {
            stats
                .entry(external.clone())
                .or_insert_with(|| stat(&absolutize(root, external)));
        }
    }

    stats
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stat_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.mica");
        fs::write(&path, "module A").unwrap();

        let (_, size) = stat(&path).unwrap();
        assert_eq!(size, 8);
    }

    #[test]
    fn stat_missing_file() {
        assert!(stat(Path::new("/nonexistent/a.mica")).is_none());
    }

    #[test]
    fn absolutize_and_relativize() {
        let root = Path::new("/proj");
        assert_eq!(
            absolutize(root, Path::new("lib/a.mica")),
            PathBuf::from("/proj/lib/a.mica")
        );
        assert_eq!(
            absolutize(root, Path::new("/elsewhere/b.mica")),
            PathBuf::from("/elsewhere/b.mica")
        );
        assert_eq!(
            relativize(root, Path::new("/proj/lib/a.mica")),
            PathBuf::from("lib/a.mica")
        );
        assert_eq!(
            relativize(root, Path::new("/elsewhere/b.mica")),
            PathBuf::from("/elsewhere/b.mica")
        );
    }

    #[test]
    fn probe_covers_sources_and_externals() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("lib")).unwrap();
        fs::create_dir_all(dir.path().join("priv")).unwrap();
        fs::write(dir.path().join("lib/a.mica"), "module A").unwrap();
        fs::write(dir.path().join("priv/schema.json"), "{}").unwrap();

        let current = vec![PathBuf::from("lib/a.mica")];
        let mut record = SourceRecord::skeleton(PathBuf::from("lib/a.mica"), 8);
        record.external = vec![PathBuf::from("priv/schema.json")];

        let stats = probe_all(dir.path(), &current, &[record]);
        assert_eq!(stats.len(), 2);
        assert!(stats[&PathBuf::from("lib/a.mica")].is_some());
        assert!(stats[&PathBuf::from("priv/schema.json")].is_some());
    }

    #[test]
    fn probe_missing_external_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let mut record = SourceRecord::skeleton(PathBuf::from("lib/a.mica"), 0);
        record.external = vec![PathBuf::from("priv/gone.json")];

        let stats = probe_all(dir.path(), &[], &[record]);
        assert_eq!(stats.len(), 1);
        assert!(stats[&PathBuf::from("priv/gone.json")].is_none());
    }

    #[test]
    fn probe_dedups_shared_externals() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("shared.dat"), "x").unwrap();

        let mut a = SourceRecord::skeleton(PathBuf::from("lib/a.mica"), 0);
        a.external = vec![PathBuf::from("shared.dat")];
        let mut b = SourceRecord::skeleton(PathBuf::from("lib/b.mica"), 0);
        b.external = vec![PathBuf::from("shared.dat")];

        let stats = probe_all(dir.path(), &[], &[a, b]);
        assert_eq!(stats.len(), 1);
    }
}
