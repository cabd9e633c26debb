use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SherlockError>;

#[derive(Debug, Error)]
pub enum SherlockError {
    #[error("I/O failure while {operation}: {source}")]
    Io {
        operation: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("git command failed: `{program}` {args:?}, exit_code={exit_code:?}, stderr={stderr}")]
    GitCommandFailed {
        program: String,
        args: Vec<String>,
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("invalid git repository: {0}")]
    InvalidRepository(PathBuf),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("unknown file status {0:?}")]
    UnknownFileStatus(String),

    #[error("missing required placeholder value: {0}")]
    MissingPlaceholder(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("plugin `{name}` failed: {message}")]
    Plugin { name: String, message: String },

    #[error("navigation misuse: {0}")]
    Navigation(String),
}

impl SherlockError {
    pub fn io(operation: &'static str, source: std::io::Error) -> Self {
        Self::Io { operation, source }
    }

    pub fn plugin(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Plugin {
            name: name.into(),
            message: message.into(),
        }
    }
}
