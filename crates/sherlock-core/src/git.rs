use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::debug;

use crate::error::{Result, SherlockError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
}

/// Runs the `git` executable and captures its output.
#[derive(Debug, Clone)]
pub struct GitRunner {
    git_binary: String,
    env: BTreeMap<String, String>,
}

impl Default for GitRunner {
    fn default() -> Self {
        Self::new("git")
    }
}

impl GitRunner {
    pub fn new(git_binary: impl Into<String>) -> Self {
        Self {
            git_binary: git_binary.into(),
            env: BTreeMap::new(),
        }
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn git_binary(&self) -> &str {
        &self.git_binary
    }

    pub fn validate_repo(&self, repo_path: &Path) -> Result<()> {
        if !repo_path.is_dir() {
            return Err(SherlockError::InvalidRepository(repo_path.to_path_buf()));
        }
        let out = self.exec(repo_path, &["rev-parse", "--is-inside-work-tree"], true)?;
        if out.exit_code == Some(0) && out.stdout.trim() == "true" {
            return Ok(());
        }
        Err(SherlockError::InvalidRepository(repo_path.to_path_buf()))
    }

    pub fn discover_repo_root(&self, start_path: &Path) -> Result<PathBuf> {
        let out = self.exec(start_path, &["rev-parse", "--show-toplevel"], false)?;
        let root = out.stdout.trim();
        if root.is_empty() {
            return Err(SherlockError::InvalidRepository(start_path.to_path_buf()));
        }
        Ok(PathBuf::from(root))
    }

    pub fn exec<S: AsRef<str>>(
        &self,
        repo_path: &Path,
        args: &[S],
        allow_non_zero: bool,
    ) -> Result<GitOutput> {
        let args: Vec<&str> = args.iter().map(AsRef::as_ref).collect();
        debug!(git = %self.git_binary, ?args, repo = %repo_path.display(), "running git");

        let mut cmd = Command::new(&self.git_binary);
        cmd.current_dir(repo_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        for (k, v) in &self.env {
            cmd.env(k, v);
        }

        let output = cmd
            .output()
            .map_err(|source| SherlockError::io("running git command", source))?;
        let result = GitOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            exit_code: output.status.code(),
        };
        if output.status.success() || allow_non_zero {
            return Ok(result);
        }
        Err(SherlockError::GitCommandFailed {
            program: self.git_binary.clone(),
            args: args.iter().map(ToString::to_string).collect(),
            exit_code: result.exit_code,
            stderr: result.stderr,
        })
    }
}
