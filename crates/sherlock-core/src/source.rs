use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::Result;
use crate::git::GitRunner;
use crate::log_parser::{LOG_FORMAT, parse_log_records, parse_name_status};
use crate::models::{ChangedFile, CommitRecord};

/// Read-only access to a repository's history.
pub trait CommitSource {
    /// Most recent commits reachable from HEAD, newest first.
    fn list_recent_commits(&self, max_count: usize) -> Result<Vec<CommitRecord>>;

    /// Files touched by `commit`, compared against its first parent.
    fn changed_files(&self, commit: &CommitRecord) -> Result<Vec<ChangedFile>>;

    /// Patch text of `commit` against its first parent, optionally limited
    /// to one path.
    fn diff_for_commit(&self, commit: &CommitRecord, file_path: Option<&str>) -> Result<String>;
}

/// [`CommitSource`] backed by the `git` executable.
#[derive(Debug, Clone)]
pub struct GitCommitSource {
    git: GitRunner,
    repo_root: PathBuf,
}

impl GitCommitSource {
    /// Validates `repo_path` and binds the source to its top-level directory.
    pub fn open(git: GitRunner, repo_path: &Path) -> Result<Self> {
        git.validate_repo(repo_path)?;
        let repo_root = git.discover_repo_root(repo_path)?;
        debug!(repo = %repo_root.display(), "opened repository");
        Ok(Self { git, repo_root })
    }

    pub fn repo_root(&self) -> &Path {
        &self.repo_root
    }

    fn base_args() -> Vec<String> {
        vec![
            "-c".to_string(),
            "color.ui=never".to_string(),
            "-c".to_string(),
            "core.quotePath=false".to_string(),
        ]
    }
}

impl CommitSource for GitCommitSource {
    fn list_recent_commits(&self, max_count: usize) -> Result<Vec<CommitRecord>> {
        let mut args = Self::base_args();
        args.extend([
            "log".to_string(),
            "--no-show-signature".to_string(),
            "--no-notes".to_string(),
            LOG_FORMAT.to_string(),
            "-n".to_string(),
            max_count.to_string(),
        ]);
        let out = self.git.exec(&self.repo_root, &args, false)?;
        parse_log_records(&out.stdout)
    }

    fn changed_files(&self, commit: &CommitRecord) -> Result<Vec<ChangedFile>> {
        let mut args = Self::base_args();
        args.extend([
            "show".to_string(),
            "--name-status".to_string(),
            "--no-color".to_string(),
            "--no-ext-diff".to_string(),
            "--format=".to_string(),
            "--find-renames".to_string(),
            "--diff-merges=first-parent".to_string(),
            commit.id.clone(),
        ]);
        let out = self.git.exec(&self.repo_root, &args, false)?;
        parse_name_status(&out.stdout)
    }

    fn diff_for_commit(&self, commit: &CommitRecord, file_path: Option<&str>) -> Result<String> {
        let mut args = Self::base_args();
        match commit.first_parent() {
            Some(parent) => args.extend([
                "diff".to_string(),
                "--no-color".to_string(),
                "--no-ext-diff".to_string(),
                parent.to_string(),
                commit.id.clone(),
            ]),
            None => args.extend([
                "show".to_string(),
                "--root".to_string(),
                "--patch".to_string(),
                "--no-color".to_string(),
                "--no-ext-diff".to_string(),
                "--format=".to_string(),
                commit.id.clone(),
            ]),
        }
        if let Some(path) = file_path {
            args.push("--".to_string());
            args.push(path.to_string());
        }
        let out = self.git.exec(&self.repo_root, &args, false)?;
        Ok(out.stdout)
    }
}
