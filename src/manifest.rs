use std::collections::{BTreeMap, BTreeSet};
use std::fs::{self, File};
use std::io;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

use crate::driver::ChangeSet;
use crate::error::ManifestError;

/// Default manifest location, relative to the output directory. Living
/// inside the output directory means a wipe also drops the manifest, which
/// degrades the next run to a full rebuild.
pub(crate) const MANIFEST_FILE: &str = ".thriftbuild.state";

const VERSION: u32 = 1;

/// A 32-byte BLAKE3 hash used to fingerprint source files between runs.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub(crate) struct Hash32([u8; 32]);

impl Hash32 {
    fn hash_file(path: impl AsRef<std::path::Path>) -> io::Result<Self> {
        Ok(Hash32(
            blake3::Hasher::new().update_mmap(path)?.finalize().into(),
        ))
    }
}

impl std::fmt::Debug for Hash32 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Hash32(")?;
        for byte in self.0 {
            write!(f, "{byte:02x}")?;
        }
        write!(f, ")")
    }
}

/// Fingerprints every resolved source file.
pub(crate) fn fingerprint(
    sources: &BTreeSet<Utf8PathBuf>,
) -> Result<BTreeMap<Utf8PathBuf, Hash32>, ManifestError> {
    let mut entries = BTreeMap::new();

    for path in sources {
        let hash = Hash32::hash_file(path).map_err(|source| ManifestError::Fingerprint {
            path: path.clone(),
            source,
        })?;
        entries.insert(path.clone(), hash);
    }

    Ok(entries)
}

/// Persisted snapshot of the source set as it looked after the last
/// successful run. Stands in for a host build tool's input tracking.
#[derive(Debug, Default, Serialize, Deserialize)]
pub(crate) struct Manifest {
    version: u32,
    entries: BTreeMap<Utf8PathBuf, Hash32>,
}

impl Manifest {
    pub(crate) fn new(entries: BTreeMap<Utf8PathBuf, Hash32>) -> Self {
        Self {
            version: VERSION,
            entries,
        }
    }

    /// Returns `None` when there is no usable manifest: missing file,
    /// unreadable contents, or an unknown version. All of these mean the
    /// incremental history is gone, not that the run should fail.
    pub(crate) fn load(path: &Utf8Path) -> Option<Self> {
        let file = File::open(path).ok()?;
        let manifest: Manifest = ciborium::from_reader(file).ok()?;

        (manifest.version == VERSION).then_some(manifest)
    }

    pub(crate) fn store(&self, path: &Utf8Path) -> Result<(), ManifestError> {
        let store_err = |source: io::Error| ManifestError::Store {
            path: path.to_owned(),
            source,
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(store_err)?;
        }

        let file = File::create(path).map_err(store_err)?;
        ciborium::into_writer(self, file).map_err(|e| store_err(io::Error::other(e)))
    }

    /// Computes the tracked-input delta against the current source set.
    /// New files and files whose content hash differs count as changed;
    /// any previously tracked file absent from `current` sets `removed`.
    pub(crate) fn diff(&self, current: &BTreeMap<Utf8PathBuf, Hash32>) -> ChangeSet {
        let removed = self
            .entries
            .keys()
            .any(|path| !current.contains_key(path));

        let changed = current
            .iter()
            .filter(|(path, hash)| self.entries.get(*path) != Some(*hash))
            .map(|(path, _)| path.clone())
            .collect();

        ChangeSet { changed, removed }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn fixture(root: &Utf8Path, name: &str, content: &str) -> Utf8PathBuf {
        let path = root.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    fn current(paths: &[Utf8PathBuf]) -> BTreeMap<Utf8PathBuf, Hash32> {
        fingerprint(&paths.iter().cloned().collect()).unwrap()
    }

    #[test]
    fn test_diff_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8Path::from_path(dir.path()).unwrap();

        let a = fixture(root, "a.thrift", "struct A {}");
        let snapshot = current(&[a]);

        let delta = Manifest::new(snapshot.clone()).diff(&snapshot);
        assert_eq!(delta, ChangeSet::default());
    }

    #[test]
    fn test_diff_detects_content_change() {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8Path::from_path(dir.path()).unwrap();

        let a = fixture(root, "a.thrift", "struct A {}");
        let b = fixture(root, "b.thrift", "struct B {}");
        let manifest = Manifest::new(current(&[a.clone(), b.clone()]));

        fs::write(&a, "struct A { 1: i32 id }").unwrap();

        let delta = manifest.diff(&current(&[a.clone(), b]));
        assert_eq!(delta.changed, vec![a]);
        assert!(!delta.removed);
    }

    #[test]
    fn test_diff_detects_new_file() {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8Path::from_path(dir.path()).unwrap();

        let a = fixture(root, "a.thrift", "struct A {}");
        let manifest = Manifest::new(current(&[a.clone()]));

        let b = fixture(root, "b.thrift", "struct B {}");

        let delta = manifest.diff(&current(&[a, b.clone()]));
        assert_eq!(delta.changed, vec![b]);
        assert!(!delta.removed);
    }

    #[test]
    fn test_diff_detects_removal() {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8Path::from_path(dir.path()).unwrap();

        let a = fixture(root, "a.thrift", "struct A {}");
        let b = fixture(root, "b.thrift", "struct B {}");
        let manifest = Manifest::new(current(&[a.clone(), b]));

        let delta = manifest.diff(&current(&[a]));
        assert!(delta.changed.is_empty());
        assert!(delta.removed);
    }

    #[test]
    fn test_store_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8Path::from_path(dir.path()).unwrap();

        let a = fixture(root, "a.thrift", "struct A {}");
        let snapshot = current(&[a]);
        let path = root.join("state/manifest.bin");

        Manifest::new(snapshot.clone()).store(&path).unwrap();

        let loaded = Manifest::load(&path).unwrap();
        assert_eq!(loaded.entries, snapshot);
    }

    #[test]
    fn test_load_missing_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8Path::from_path(dir.path()).unwrap();

        assert!(Manifest::load(&root.join("nope.bin")).is_none());
    }

    #[test]
    fn test_load_garbage_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8Path::from_path(dir.path()).unwrap();

        let path = fixture(root, "garbage.bin", "not cbor at all");
        assert!(Manifest::load(&path).is_none());
    }
}
