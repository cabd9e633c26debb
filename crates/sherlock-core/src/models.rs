use serde::{Deserialize, Serialize};

use crate::error::{Result, SherlockError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRecord {
    pub id: String,
    pub short_id: String,
    pub parent_ids: Vec<String>,
    pub author_name: String,
    pub author_email: String,
    /// Committer timestamp, seconds since the unix epoch.
    pub timestamp: i64,
    pub message: String,
}

impl CommitRecord {
    /// First line of the message, trimmed.
    pub fn summary(&self) -> &str {
        self.message.lines().next().unwrap_or_default().trim()
    }

    pub fn first_parent(&self) -> Option<&str> {
        self.parent_ids.first().map(String::as_str)
    }

    pub fn is_merge(&self) -> bool {
        self.parent_ids.len() > 1
    }
}

/// Status letter reported by `git show --name-status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileStatus {
    Unspecified,
    Modified,
    TypeChanged,
    Added,
    Deleted,
    Renamed(u8),
    Copied(u8),
    Unmerged,
}

impl FileStatus {
    /// Parses a raw status code.
    ///
    /// Renames and copies carry a similarity score (`R100`, `C075`); every
    /// other code must be a single known letter.
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        let mut chars = raw.chars();
        let Some(first) = chars.next() else {
            return Ok(Self::Unspecified);
        };
        let rest = chars.as_str();

        if rest.is_empty() {
            return match first {
                'M' => Ok(Self::Modified),
                'T' => Ok(Self::TypeChanged),
                'A' => Ok(Self::Added),
                'D' => Ok(Self::Deleted),
                'R' => Ok(Self::Renamed(0)),
                'C' => Ok(Self::Copied(0)),
                'U' => Ok(Self::Unmerged),
                _ => Err(SherlockError::UnknownFileStatus(raw.to_string())),
            };
        }

        let score = rest
            .parse::<u8>()
            .ok()
            .filter(|score| *score <= 100 && rest.chars().all(|c| c.is_ascii_digit()));
        match (first, score) {
            ('R', Some(score)) => Ok(Self::Renamed(score)),
            ('C', Some(score)) => Ok(Self::Copied(score)),
            _ => Err(SherlockError::UnknownFileStatus(raw.to_string())),
        }
    }

    pub fn letter(self) -> char {
        match self {
            Self::Unspecified | Self::Unmerged => 'U',
            Self::Modified => 'M',
            Self::TypeChanged => 'T',
            Self::Added => 'A',
            Self::Deleted => 'D',
            Self::Renamed(_) => 'R',
            Self::Copied(_) => 'C',
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangedFile {
    pub status: FileStatus,
    pub raw_status: String,
    pub path: String,
    /// Source path of a rename or copy.
    pub old_path: Option<String>,
}
