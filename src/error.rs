use std::path::PathBuf;

use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    /// No cached host matches the query. Callers fall back to prompting.
    #[error("no cached host matches {0}")]
    NotFound(String),

    /// The cache file exists but cannot be read or written.
    #[error("cache file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("index {index} is out of range, {len} hosts cached")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("invalid target {0:?}, expected user@hostname")]
    InvalidTarget(String),

    #[error("{0} cannot be empty")]
    EmptyField(&'static str),

    /// Reading from the terminal failed.
    #[error("terminal error: {0}")]
    Terminal(#[from] std::io::Error),

    #[error("could not find `{0}` in PATH")]
    MissingBinary(&'static str),

    #[error("`{program}` failed: {stderr}")]
    Command { program: String, stderr: String },

    #[error("failed to run `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}
