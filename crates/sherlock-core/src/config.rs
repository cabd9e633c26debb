use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SherlockError};
use crate::plugins::PluginSpec;

const DEFAULT_CONFIG_FILENAME: &str = "config.toml";
const DEFAULT_LOG_FILENAME: &str = "git-sherlock.log";
pub const DEFAULT_MAX_COUNT: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Commits listed when `--number` is not given.
    pub max_count: usize,
    pub git_binary: String,
    pub log_file: Option<PathBuf>,
    pub plugins: Vec<PluginSpec>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_count: DEFAULT_MAX_COUNT,
            git_binary: "git".to_string(),
            log_file: None,
            plugins: Vec::new(),
        }
    }
}

impl Config {
    /// Configured log file, falling back to the per-user cache directory.
    pub fn resolved_log_file(&self) -> Option<PathBuf> {
        self.log_file.clone().or_else(|| {
            project_dirs().map(|dirs| dirs.cache_dir().join(DEFAULT_LOG_FILENAME))
        })
    }
}

#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn at(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn default_location() -> Result<PathBuf> {
        let dirs = project_dirs()
            .ok_or_else(|| SherlockError::Config("cannot resolve project directories".to_string()))?;
        Ok(dirs.config_dir().join(DEFAULT_CONFIG_FILENAME))
    }

    pub fn default_store() -> Result<Self> {
        Ok(Self {
            path: Self::default_location()?,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Config> {
        if !self.path.exists() {
            return Ok(Config::default());
        }
        let text = fs::read_to_string(&self.path)
            .map_err(|source| SherlockError::io("reading config file", source))?;
        toml::from_str(&text).map_err(|e| {
            SherlockError::Config(format!("invalid config {}: {}", self.path.display(), e))
        })
    }

    pub fn save(&self, config: &Config) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|source| SherlockError::io("creating config directory", source))?;
        }
        let text = toml::to_string_pretty(config)
            .map_err(|e| SherlockError::Config(format!("serialize config failed: {}", e)))?;
        fs::write(&self.path, text).map_err(|source| SherlockError::io("writing config file", source))
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("dev", "GitSherlock", "git-sherlock")
}
