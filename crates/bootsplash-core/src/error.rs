use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Every failure the helper can report across the broker boundary.
///
/// Components translate their failures into one of these at their own
/// boundary; nothing else crosses the dispatcher.
#[derive(Debug, Error)]
pub enum HelperError {
    #[error("no {name} specified in helper arguments")]
    EmptyArgument { name: &'static str },

    #[error("themes directory {path} does not exist")]
    MissingThemesRoot { path: PathBuf },

    #[error("could not determine the archive type of {path}")]
    UnknownFormat { path: PathBuf },

    #[error("failed to open archive {path}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("archive {path} has no entries")]
    EmptyArchive { path: PathBuf },

    #[error("failed to unpack archive entry '{entry}'")]
    Extract {
        entry: String,
        #[source]
        source: io::Error,
    },

    #[error("archive entry '{entry}' resolves outside the themes directory")]
    UnsafePath { entry: String },

    #[error("theme '{name}' already exists at {path}")]
    AlreadyExists { name: String, path: PathBuf },

    #[error("no theme named '{name}'")]
    NotFound { name: String },

    #[error("failed to remove theme '{name}'")]
    RemovalFailed {
        name: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to update config store {path}")]
    Config {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to start {command}")]
    StartFailed {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("{command} did not finish within {seconds}s")]
    TimedOut { command: String, seconds: u64 },

    #[error("{command} exited with code {code}")]
    CommandFailed { command: String, code: i32 },

    #[error("{context}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },
}

impl HelperError {
    /// Full human-readable description, source chain included.
    pub fn description(&self) -> String {
        let mut message = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        message
    }
}
