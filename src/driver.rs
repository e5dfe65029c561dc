use std::collections::BTreeSet;
use std::fmt::Display;
use std::sync::LazyLock;
use std::time::Instant;
use std::{fs, io};

use camino::{Utf8Path, Utf8PathBuf};
use console::Style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::command::Invocation;
use crate::config::CompileConfig;
use crate::error::{OutputDirError, ThriftBuildError};
use crate::source::{self, SOURCE_EXT};

const ANSI_BLUE: Style = Style::new().blue();

static PROGRESS_STYLE: LazyLock<ProgressStyle> = LazyLock::new(|| {
    ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        .expect("Error setting progress bar template")
        .progress_chars("#>-")
});

/// Tracked-input delta since the last successful run, as reported by the
/// embedding build tool or by the bundled source manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    /// Tracked files which changed, as absolute paths.
    pub changed: Vec<Utf8PathBuf>,
    /// Whether any previously tracked file was removed.
    pub removed: bool,
}

/// What is known about tracked inputs at the start of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputChanges {
    /// No usable incremental information, everything must be rebuilt.
    Unknown,
    /// A precise delta of tracked inputs.
    Incremental(ChangeSet),
}

/// Strategy chosen for a single run, mutually exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunKind {
    /// Resolve the full source set and compile all of it.
    Full,
    /// Delete the output directory, then rebuild everything. Removed
    /// sources may have left generated artifacts behind, and without a
    /// source-to-artifact mapping a full wipe is the only safe
    /// invalidation.
    WipeAndRebuild,
    /// Compile only the changed sources.
    Incremental,
}

/// Outcome of a completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub kind: RunKind,
    /// Number of compiler invocations issued.
    pub compiled: usize,
}

pub(crate) fn plan(changes: &InputChanges) -> RunKind {
    match changes {
        InputChanges::Unknown => RunKind::Full,
        InputChanges::Incremental(delta) if delta.removed => RunKind::WipeAndRebuild,
        InputChanges::Incremental(_) => RunKind::Incremental,
    }
}

/// Runs the compiler over whatever `changes` calls for. Invocations are
/// strictly sequential and the first failure aborts the rest of the run.
pub(crate) fn run(
    config: &CompileConfig,
    changes: InputChanges,
) -> Result<Summary, ThriftBuildError> {
    let kind = plan(&changes);

    match kind {
        RunKind::Full => {
            tracing::info!("Compiling all Thrift sources");
        }
        RunKind::WipeAndRebuild => {
            tracing::info!("Tracked sources were removed, clearing {}", config.output_dir);
            clear_output_dir(&config.output_dir)?;
        }
        RunKind::Incremental => {}
    }

    ensure_output_dir(&config.output_dir)?;

    let compiled = match changes {
        InputChanges::Incremental(delta) if !delta.removed => {
            compile_changed(config, &delta.changed)?
        }
        _ => {
            let sources = source::resolve(&config.sources, &config.base_dir);
            compile_all(config, &sources)?
        }
    };

    Ok(Summary { kind, compiled })
}

fn compile_all(
    config: &CompileConfig,
    sources: &BTreeSet<Utf8PathBuf>,
) -> Result<usize, ThriftBuildError> {
    let s = Instant::now();
    let pb = ProgressBar::new(sources.len() as u64);
    pb.set_style(PROGRESS_STYLE.clone());
    pb.set_message("Compiling Thrift sources...");

    for path in sources {
        tracing::debug!("Compiling {path}");
        Invocation::assemble(config, path).execute()?;
        pb.inc(1);
    }

    pb.finish_with_message(format!(
        "Compiled {} Thrift sources! {}",
        sources.len(),
        as_overhead(s)
    ));

    Ok(sources.len())
}

fn compile_changed(
    config: &CompileConfig,
    changed: &[Utf8PathBuf],
) -> Result<usize, ThriftBuildError> {
    let mut compiled = 0;

    for path in changed {
        // Tracked inputs may include files the compiler never consumes.
        if path.extension() != Some(SOURCE_EXT) {
            continue;
        }

        tracing::info!("Compiling changed source {path}");
        Invocation::assemble(config, path).execute()?;
        compiled += 1;
    }

    Ok(compiled)
}

fn ensure_output_dir(path: &Utf8Path) -> Result<(), OutputDirError> {
    fs::create_dir_all(path).map_err(|source| OutputDirError::Create {
        path: path.to_owned(),
        source,
    })
}

/// Missing directories count as already cleared.
fn clear_output_dir(path: &Utf8Path) -> Result<(), OutputDirError> {
    match fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(OutputDirError::Remove {
            path: path.to_owned(),
            source,
        }),
    }
}

fn as_overhead(s: Instant) -> impl Display {
    let e = Instant::now();
    let f = format!("(+{}ms)", e.duration_since(s).as_millis());
    ANSI_BLUE.apply_to(f)
}
