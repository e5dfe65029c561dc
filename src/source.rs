use std::collections::BTreeSet;

use camino::{Utf8Path, Utf8PathBuf};
use glob::Pattern;

use crate::config::to_path;

/// File extension recognized as a compiler input.
pub(crate) const SOURCE_EXT: &str = "thrift";

/// Expands configured source entries into a sorted, deduplicated set of
/// absolute paths. File entries are trusted as-is, directory entries are
/// scanned recursively for `*.thrift` files. Entries which are missing or
/// neither file nor directory are skipped with a warning.
pub(crate) fn resolve(entries: &[Utf8PathBuf], base: &Utf8Path) -> BTreeSet<Utf8PathBuf> {
    let mut found = BTreeSet::new();

    for entry in entries {
        let path = to_path(entry, base);

        if path.is_file() {
            found.insert(path);
        } else if path.is_dir() {
            scan_dir(&path, &mut found);
        } else {
            tracing::warn!("Could not find {path}, will skip it");
        }
    }

    found
}

/// Collects every `*.thrift` file directly or transitively under `dir`.
fn scan_dir(dir: &Utf8Path, found: &mut BTreeSet<Utf8PathBuf>) {
    let pattern = format!("{}/**/*.{SOURCE_EXT}", Pattern::escape(dir.as_str()));

    let paths = match glob::glob(&pattern) {
        Ok(paths) => paths,
        Err(e) => {
            tracing::warn!("Couldn't scan directory {dir}, will skip it.\n{e}");
            return;
        }
    };

    for entry in paths {
        let path = match entry {
            Ok(path) => path,
            Err(e) => {
                tracing::warn!("Skipping unreadable path under {dir}.\n{e}");
                continue;
            }
        };

        let path = match Utf8PathBuf::try_from(path) {
            Ok(path) => path,
            Err(e) => {
                tracing::warn!("Skipping non-UTF-8 path under {dir}.\n{e}");
                continue;
            }
        };

        // The glob also matches directories with a matching name.
        if path.is_file() {
            found.insert(path);
        }
    }
}
