#![forbid(unsafe_code)]
#![doc = include_str!("../README.md")]

mod command;
mod config;
mod driver;
mod error;
#[cfg(feature = "track")]
mod manifest;
mod source;
mod utils;
#[cfg(feature = "watch")]
mod watch;

use camino::{Utf8Path, Utf8PathBuf};

pub use crate::config::{CompileConfig, Flags, Generator};
pub use crate::driver::{ChangeSet, InputChanges, RunKind, Summary};
pub use crate::error::*;

/// Hook invoked whenever the directory receiving generated sources is
/// decided or changes, so an embedding compile step can repoint its own
/// source roots. Errors returned here fail the reconfiguration.
pub type CompanionHook = Box<dyn Fn(&Utf8Path) -> anyhow::Result<()> + Send + Sync>;

struct Companion {
    lang: String,
    hook: CompanionHook,
}

/// Drives an external `thrift` compiler binary over a configured set of IDL
/// sources. The individual settings can be set by calling the
/// [`setup`](Compiler::setup) function.
///
/// The compiler itself never parses IDL; it resolves which sources exist,
/// decides which of them need recompiling, and shells out once per source
/// file.
pub struct Compiler {
    pub(crate) config: CompileConfig,
    #[cfg(feature = "track")]
    manifest_path: Option<Utf8PathBuf>,
    companion: Option<Companion>,
}

impl Compiler {
    pub fn setup() -> CompilerCreator {
        CompilerCreator::new()
    }

    /// Runs the driver once with the given tracked-input information.
    /// Embedders with their own change tracking feed deltas through here.
    pub fn run(&self, changes: InputChanges) -> Result<Summary, ThriftBuildError> {
        #[cfg(feature = "logging")]
        crate::utils::init_logging();

        driver::run(&self.config, changes)
    }

    /// Compiles everything from scratch, ignoring any incremental state.
    pub fn build(&self) -> Result<Summary, ThriftBuildError> {
        self.run(InputChanges::Unknown)
    }

    /// Runs with the bundled fingerprint manifest supplying the change
    /// information: resolves the source set, diffs it against the manifest
    /// from the last successful run, compiles what the diff calls for, and
    /// rewrites the manifest afterwards. A failed run leaves the previous
    /// manifest in place, so the next run retries the same delta.
    #[cfg(feature = "track")]
    pub fn run_tracked(&self) -> Result<Summary, ThriftBuildError> {
        use crate::manifest::Manifest;

        let sources = source::resolve(&self.config.sources, &self.config.base_dir);
        let current = manifest::fingerprint(&sources)?;

        let changes = match Manifest::load(&self.manifest_path()) {
            Some(previous) => {
                let delta = previous.diff(&current);

                if !delta.removed && delta.changed.is_empty() {
                    tracing::info!("All Thrift sources up to date");
                    return Ok(Summary {
                        kind: RunKind::Incremental,
                        compiled: 0,
                    });
                }

                InputChanges::Incremental(delta)
            }
            None => InputChanges::Unknown,
        };

        let summary = self.run(changes)?;

        Manifest::new(current).store(&self.manifest_path())?;

        Ok(summary)
    }

    /// Watches the configured source roots and recompiles on change, after
    /// an initial full build. Blocks the calling thread.
    #[cfg(feature = "watch")]
    pub fn watch(&self) -> Result<(), ThriftBuildError> {
        #[cfg(feature = "logging")]
        crate::utils::init_logging();

        watch::watch(self)
    }

    /// The directory which will receive sources generated for `lang` under
    /// the current configuration.
    pub fn generated_sources_dir(&self, lang: &str) -> Utf8PathBuf {
        self.config.generated_sources_dir(lang)
    }

    /// Repoints the output directory and re-publishes the derived
    /// generated-sources location to the companion hook, if any.
    pub fn set_output_dir(&mut self, dir: impl AsRef<Utf8Path>) -> Result<(), ThriftBuildError> {
        self.config.output_dir = config::to_path(dir.as_ref(), &self.config.base_dir);
        self.notify_companion()
    }

    /// Switches between the compiler's flat and nested `gen-<language>`
    /// output conventions and re-publishes the derived generated-sources
    /// location to the companion hook, if any.
    pub fn set_create_gen_folder(&mut self, enabled: bool) -> Result<(), ThriftBuildError> {
        self.config.create_gen_folder = enabled;
        self.notify_companion()
    }

    #[cfg(feature = "track")]
    fn manifest_path(&self) -> Utf8PathBuf {
        match &self.manifest_path {
            Some(path) => path.clone(),
            None => self.config.output_dir.join(manifest::MANIFEST_FILE),
        }
    }

    fn notify_companion(&self) -> Result<(), ThriftBuildError> {
        let Some(companion) = &self.companion else {
            return Ok(());
        };

        let dir = self.config.generated_sources_dir(&companion.lang);
        (companion.hook)(&dir).map_err(ThriftBuildError::Companion)
    }
}

/// A builder struct for creating a [`Compiler`] with specified settings.
pub struct CompilerCreator {
    executable: String,
    base_dir: Option<Utf8PathBuf>,
    output_dir: Option<Utf8PathBuf>,
    create_gen_folder: bool,
    sources: Vec<Utf8PathBuf>,
    includes: Vec<Utf8PathBuf>,
    generators: Vec<Generator>,
    flags: Flags,
    #[cfg(feature = "track")]
    manifest_path: Option<Utf8PathBuf>,
    companion: Option<Companion>,
}

impl CompilerCreator {
    fn new() -> Self {
        Self {
            executable: String::from("thrift"),
            base_dir: None,
            output_dir: None,
            create_gen_folder: false,
            sources: Vec::new(),
            includes: Vec::new(),
            generators: Vec::new(),
            flags: Flags::default(),
            #[cfg(feature = "track")]
            manifest_path: None,
            companion: None,
        }
    }

    /// Name or path of the compiler binary, `thrift` by default.
    pub fn set_executable(mut self, executable: impl Into<String>) -> Self {
        self.executable = executable.into();
        self
    }

    /// Directory against which relative paths are resolved. Defaults to the
    /// current working directory.
    pub fn set_base_dir(mut self, dir: impl Into<Utf8PathBuf>) -> Self {
        self.base_dir = Some(dir.into());
        self
    }

    /// Directory receiving the generated bindings. Required.
    pub fn set_output_dir(mut self, dir: impl Into<Utf8PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    /// Selects the compiler's nested `gen-<language>` output convention
    /// (`-o`) over the flat one (`-out`).
    pub fn set_create_gen_folder(mut self, enabled: bool) -> Self {
        self.create_gen_folder = enabled;
        self
    }

    /// Adds source entries: `.thrift` files, or directories to scan for
    /// them recursively.
    pub fn add_sources<I, P>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Utf8PathBuf>,
    {
        self.sources.extend(entries.into_iter().map(Into::into));
        self
    }

    /// Adds include directories passed to the compiler with `-I`.
    pub fn add_includes<I, P>(mut self, dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Utf8PathBuf>,
    {
        self.includes.extend(dirs.into_iter().map(Into::into));
        self
    }

    /// Adds a generator. Order of addition is preserved on the command
    /// line.
    pub fn add_generator(mut self, name: impl Into<String>, options: impl Into<String>) -> Self {
        self.generators.push(Generator::new(name, options));
        self
    }

    pub fn set_flags(mut self, flags: Flags) -> Self {
        self.flags = flags;
        self
    }

    /// Overrides where the source manifest is stored. Defaults to
    /// `.thriftbuild.state` inside the output directory, which makes a
    /// wiped output directory degrade cleanly to a full rebuild.
    #[cfg(feature = "track")]
    pub fn set_manifest_path(mut self, path: impl Into<Utf8PathBuf>) -> Self {
        self.manifest_path = Some(path.into());
        self
    }

    /// Registers a companion compile step. Its hook receives the
    /// generated-sources directory for `lang` once at `finish` and again on
    /// every reconfiguration which moves it. When a companion is present
    /// and no generator was configured, a single `lang` generator is used
    /// by default.
    pub fn set_companion<F>(mut self, lang: impl Into<String>, hook: F) -> Self
    where
        F: Fn(&Utf8Path) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.companion = Some(Companion {
            lang: lang.into(),
            hook: Box::new(hook),
        });
        self
    }

    pub fn finish(self) -> Result<Compiler, ThriftBuildError> {
        let base_dir = match self.base_dir {
            Some(dir) => dir,
            None => std::env::current_dir()
                .map_err(anyhow::Error::from)
                .and_then(|dir| Utf8PathBuf::try_from(dir).map_err(anyhow::Error::from))
                .map_err(ThriftBuildError::BaseDir)?,
        };

        let output_dir = self.output_dir.ok_or(ThriftBuildError::MissingOutputDir)?;
        let output_dir = config::to_path(&output_dir, &base_dir);

        let mut generators = self.generators;
        if generators.is_empty()
            && let Some(companion) = &self.companion
        {
            generators.push(Generator::new(companion.lang.clone(), ""));
        }

        let config = CompileConfig {
            executable: self.executable,
            sources: self.sources,
            includes: self
                .includes
                .iter()
                .map(|dir| config::to_path(dir, &base_dir))
                .collect(),
            generators,
            flags: self.flags,
            create_gen_folder: self.create_gen_folder,
            output_dir,
            base_dir,
        };

        let compiler = Compiler {
            config,
            #[cfg(feature = "track")]
            manifest_path: self.manifest_path,
            companion: self.companion,
        };

        compiler.notify_companion()?;

        Ok(compiler)
    }
}
