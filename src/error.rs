use camino::Utf8PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ThriftBuildError {
    #[error("No output directory configured")]
    MissingOutputDir,

    #[error("Couldn't determine the base directory.\n{0}")]
    BaseDir(anyhow::Error),

    #[error("Error while preparing the output directory:\n{0}")]
    OutputDir(#[from] OutputDirError),

    #[error(transparent)]
    Compiler(#[from] CompilerError),

    #[error("Companion hook failed.\n{0}")]
    Companion(anyhow::Error),

    #[cfg(feature = "track")]
    #[error("Error while updating the source manifest:\n{0}")]
    Manifest(#[from] ManifestError),

    #[cfg(feature = "watch")]
    #[error("Error while watching for file changes:\n{0}")]
    Watch(#[from] WatchError),
}

#[derive(Debug, Error)]
pub enum OutputDirError {
    #[error("Couldn't create output directory '{path}'.\n{source}")]
    Create {
        path: Utf8PathBuf,
        source: std::io::Error,
    },

    #[error("Couldn't delete output directory '{path}'.\n{source}")]
    Remove {
        path: Utf8PathBuf,
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum CompilerError {
    #[error("Couldn't spawn compiler '{exe}'.\n{source}")]
    Spawn {
        exe: String,
        source: std::io::Error,
    },

    #[error("Compiler invocation for '{file}' failed ({status})")]
    Exit {
        file: Utf8PathBuf,
        status: std::process::ExitStatus,
    },
}

#[cfg(feature = "track")]
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("Couldn't fingerprint source '{path}'.\n{source}")]
    Fingerprint {
        path: Utf8PathBuf,
        source: std::io::Error,
    },

    #[error("Couldn't write manifest '{path}'.\n{source}")]
    Store {
        path: Utf8PathBuf,
        source: std::io::Error,
    },
}

#[cfg(feature = "watch")]
#[derive(Debug, Error)]
pub enum WatchError {
    #[error(transparent)]
    Notify(#[from] notify::Error),

    #[error(transparent)]
    Recv(#[from] std::sync::mpsc::RecvError),
}
