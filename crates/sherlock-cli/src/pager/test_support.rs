use std::collections::VecDeque;
use std::io::{self, Write};

use sherlock_core::{ChangedFile, CommitRecord, CommitSource, FileStatus, SherlockError};

use super::terminal::{Terminal, TerminalSize};

/// In-memory terminal: replays queued keys and records everything written.
#[derive(Debug)]
pub struct ScriptedTerminal {
    size: TerminalSize,
    keys: VecDeque<char>,
    output: Vec<u8>,
}

impl ScriptedTerminal {
    pub fn new(columns: u16, rows: u16) -> Self {
        Self {
            size: TerminalSize { columns, rows },
            keys: VecDeque::new(),
            output: Vec::new(),
        }
    }

    pub fn push_keys(&mut self, keys: &str) {
        self.keys.extend(keys.chars());
    }

    pub fn take_output(&mut self) -> String {
        String::from_utf8_lossy(&std::mem::take(&mut self.output)).to_string()
    }
}

impl Write for ScriptedTerminal {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.output.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Terminal for ScriptedTerminal {
    fn size(&self) -> TerminalSize {
        self.size
    }

    fn read_char(&mut self) -> io::Result<Option<char>> {
        Ok(self.keys.pop_front())
    }
}

/// History backed by memory: `n` commits, newest first, each touching two
/// files.
#[derive(Debug, Default)]
pub struct FakeSource {
    pub commits: Vec<CommitRecord>,
    pub fail_listing: bool,
}

impl FakeSource {
    pub fn with_commits(count: usize) -> Self {
        let commits = (0..count)
            .map(|i| {
                let id = format!("{:040x}", count - i);
                let parent_ids = if i + 1 < count {
                    vec![format!("{:040x}", count - i - 1)]
                } else {
                    Vec::new()
                };
                CommitRecord {
                    short_id: id[..7].to_string(),
                    id,
                    parent_ids,
                    author_name: "Test".to_string(),
                    author_email: "test@example.com".to_string(),
                    timestamp: 1_700_000_000 + i as i64,
                    message: format!("commit number {i}\n"),
                }
            })
            .collect();
        Self {
            commits,
            fail_listing: false,
        }
    }
}

impl CommitSource for FakeSource {
    fn list_recent_commits(&self, max_count: usize) -> sherlock_core::Result<Vec<CommitRecord>> {
        if self.fail_listing {
            return Err(SherlockError::Parse("scripted failure".to_string()));
        }
        Ok(self.commits.iter().take(max_count).cloned().collect())
    }

    fn changed_files(&self, _commit: &CommitRecord) -> sherlock_core::Result<Vec<ChangedFile>> {
        Ok(vec![
            ChangedFile {
                status: FileStatus::Modified,
                raw_status: "M".to_string(),
                path: "src/lib.rs".to_string(),
                old_path: None,
            },
            ChangedFile {
                status: FileStatus::Added,
                raw_status: "A".to_string(),
                path: "notes.txt".to_string(),
                old_path: None,
            },
        ])
    }

    fn diff_for_commit(
        &self,
        commit: &CommitRecord,
        file_path: Option<&str>,
    ) -> sherlock_core::Result<String> {
        let path = file_path.unwrap_or("all");
        Ok(format!(
            "diff --git a/{path} b/{path}\n@@ -1 +1 @@\n-old {short}\n+new {short}\n",
            short = commit.short_id
        ))
    }
}
