use camino::{Utf8Path, Utf8PathBuf};

/// A named code-generation backend of the external compiler, together with
/// its comma-separated options string. `Generator::new("java", "")` maps to
/// `--gen java`, `Generator::new("html", "private-members")` to
/// `--gen html:private-members`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generator {
    pub name: String,
    pub options: String,
}

impl Generator {
    pub fn new(name: impl Into<String>, options: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            options: options.into(),
        }
    }

    pub(crate) fn to_arg(&self) -> String {
        if self.options.is_empty() {
            self.name.clone()
        } else {
            format!("{}:{}", self.name, self.options)
        }
    }
}

/// Boolean switches forwarded to the external compiler, all off by default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Flags {
    /// Also generate code for included files (`-r`).
    pub recurse: bool,
    /// Suppress compiler warnings (`-nowarn`).
    pub nowarn: bool,
    /// Strict compiler warnings (`-strict`).
    pub strict: bool,
    /// Verbose compiler output (`-v`).
    pub verbose: bool,
    /// Parser debug output (`-debug`).
    pub debug: bool,
    /// Accepted for compatibility with existing build configurations; the
    /// compiler switch is currently not emitted.
    pub allow_neg_keys: bool,
    /// Accepted for compatibility with existing build configurations; the
    /// compiler switch is currently not emitted.
    pub allow_64bit_consts: bool,
}

/// Everything needed to assemble compiler invocations for one run. Built
/// once by [`CompilerCreator::finish`](crate::CompilerCreator::finish) and
/// read-only while a run is in progress.
#[derive(Debug, Clone)]
pub struct CompileConfig {
    pub(crate) executable: String,
    pub(crate) base_dir: Utf8PathBuf,
    pub(crate) output_dir: Utf8PathBuf,
    /// Selects the compiler's nested `gen-<language>` output convention
    /// (`-o`) over the flat one (`-out`).
    pub(crate) create_gen_folder: bool,
    /// Source entries in configured order, files or directories.
    pub(crate) sources: Vec<Utf8PathBuf>,
    pub(crate) includes: Vec<Utf8PathBuf>,
    /// Generators in configured order, which is also argument order.
    pub(crate) generators: Vec<Generator>,
    pub(crate) flags: Flags,
}

impl CompileConfig {
    pub fn output_dir(&self) -> &Utf8Path {
        &self.output_dir
    }

    /// The directory which will receive sources generated for `lang`,
    /// accounting for the compiler's output-placement convention.
    pub fn generated_sources_dir(&self, lang: &str) -> Utf8PathBuf {
        if self.create_gen_folder {
            self.output_dir.join(format!("gen-{lang}"))
        } else {
            self.output_dir.clone()
        }
    }
}

/// Normalizes a configured path-like value. Absolute paths are used as-is,
/// anything else is resolved against `base`. This is the single conversion
/// point for every user-facing path setting.
pub(crate) fn to_path(value: &Utf8Path, base: &Utf8Path) -> Utf8PathBuf {
    if value.is_absolute() {
        value.to_owned()
    } else {
        base.join(value)
    }
}
