pub mod config;
pub mod error;
pub mod format;
pub mod git;
pub mod log_parser;
pub mod models;
pub mod plugins;
pub mod source;

pub use config::{Config, ConfigStore, DEFAULT_MAX_COUNT};
pub use error::{Result, SherlockError};
pub use git::{GitOutput, GitRunner};
pub use models::{ChangedFile, CommitRecord, FileStatus};
pub use plugins::{Plugin, PluginContext, PluginRegistry, PluginRunner, PluginSpec};
pub use source::{CommitSource, GitCommitSource};
