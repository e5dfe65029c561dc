use std::collections::HashSet;
use std::time::Duration;

use camino::Utf8PathBuf;
use notify::{EventKind, RecursiveMode};
use notify_debouncer_full::new_debouncer;

use crate::Compiler;
use crate::config::{CompileConfig, to_path};
use crate::driver::{ChangeSet, InputChanges};
use crate::error::{ThriftBuildError, WatchError};
use crate::source::SOURCE_EXT;

/// Performs an initial full build, then keeps recompiling whatever changes
/// on disk. Build failures are reported and the loop carries on; only
/// watcher-level failures end it.
pub(crate) fn watch(compiler: &Compiler) -> Result<(), ThriftBuildError> {
    let (tx, rx) = std::sync::mpsc::channel();
    let mut debouncer =
        new_debouncer(Duration::from_millis(250), None, tx).map_err(WatchError::Notify)?;

    for root in watch_roots(&compiler.config) {
        debouncer
            .watch(root.as_std_path(), RecursiveMode::Recursive)
            .map_err(WatchError::Notify)?;
    }

    compiler.run(InputChanges::Unknown)?;

    while let Ok(events) = rx.recv().map_err(WatchError::Recv)? {
        let paths: HashSet<Utf8PathBuf> = events
            .iter()
            .filter(|de| {
                matches!(
                    de.event.kind,
                    EventKind::Create(..) | EventKind::Modify(..) | EventKind::Remove(..)
                )
            })
            .flat_map(|de| &de.event.paths)
            .filter_map(|path| Utf8PathBuf::try_from(path.clone()).ok())
            .filter(|path| path.extension() == Some(SOURCE_EXT))
            .collect();

        if paths.is_empty() {
            continue;
        }

        let removed = paths.iter().any(|path| !path.exists());
        let changed = paths.into_iter().filter(|path| path.exists()).collect();

        let delta = ChangeSet { changed, removed };
        if let Err(e) = compiler.run(InputChanges::Incremental(delta)) {
            eprintln!("{e}");
        }
    }

    Ok(())
}

/// The set of directories worth watching: source directories as-is, parent
/// directories for explicit file entries. Entries missing from disk are
/// skipped, the initial build has already warned about them.
pub(crate) fn watch_roots(config: &CompileConfig) -> HashSet<Utf8PathBuf> {
    config
        .sources
        .iter()
        .map(|entry| to_path(entry, &config.base_dir))
        .filter_map(|path| {
            if path.is_dir() {
                return Some(path);
            }

            if path.is_file() {
                return path.parent().map(|parent| parent.to_owned());
            }

            None
        })
        .collect()
}
