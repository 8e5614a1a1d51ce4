use std::io::Error as IoError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: IoError,
    },
    #[error("Failed to parse INI file {}: {source}", path.display())]
    Ini {
        path: PathBuf,
        #[source]
        source: ini::Error,
    },
    #[error("Missing key [{section}] {key} in {}", path.display())]
    MissingKey {
        path: PathBuf,
        section: String,
        key: String,
    },
    #[error("Invalid value for [{section}] {key}: {value:?}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
    },
    #[error("Failed to parse JSON from {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Download of {url} failed: {reason}")]
    Fetch { url: String, reason: String },
    #[error("Failed to execute: {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: IoError,
    },
    #[error("Command failed ({status}): {command}\n{stderr}")]
    CommandFailed {
        command: String,
        status: std::process::ExitStatus,
        stderr: String,
    },
    #[error("Refusing unsafe package file name {0:?}")]
    UnsafeFileName(String),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: IoError) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
