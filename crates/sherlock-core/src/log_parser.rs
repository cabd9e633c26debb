use crate::error::{Result, SherlockError};
use crate::models::{ChangedFile, CommitRecord, FileStatus};

pub const FIELD_SEP: char = '\u{001f}';
pub const RECORD_SEP: char = '\u{001e}';

/// `--pretty` format matching [`parse_log_records`].
pub const LOG_FORMAT: &str = "--pretty=format:%H%x1f%h%x1f%P%x1f%an%x1f%ae%x1f%ct%x1f%B%x1e";

const LOG_FIELDS: usize = 7;

pub fn parse_log_records(stdout: &str) -> Result<Vec<CommitRecord>> {
    let mut commits = Vec::new();
    for raw_record in stdout.split(RECORD_SEP) {
        let record = raw_record.trim_matches(['\r', '\n', ' ']);
        if record.is_empty() {
            continue;
        }
        let fields: Vec<&str> = record.splitn(LOG_FIELDS, FIELD_SEP).collect();
        if fields.len() != LOG_FIELDS {
            return Err(SherlockError::Parse(format!(
                "expected {} fields, got {} in record {:?}",
                LOG_FIELDS,
                fields.len(),
                record
            )));
        }
        let timestamp = fields[5].trim().parse::<i64>().map_err(|e| {
            SherlockError::Parse(format!(
                "invalid committer unix timestamp {:?}: {}",
                fields[5], e
            ))
        })?;

        commits.push(CommitRecord {
            id: fields[0].to_string(),
            short_id: fields[1].to_string(),
            parent_ids: fields[2]
                .split_whitespace()
                .map(ToString::to_string)
                .collect(),
            author_name: fields[3].to_string(),
            author_email: fields[4].to_string(),
            timestamp,
            message: fields[6].trim_end().to_string(),
        });
    }
    Ok(commits)
}

/// Parses `git show --name-status --format=` output.
///
/// Rename and copy lines carry both paths; the destination is the last
/// field.
pub fn parse_name_status(stdout: &str) -> Result<Vec<ChangedFile>> {
    let mut files = Vec::new();
    for line in stdout.lines() {
        if line.trim().is_empty() {
            continue;
        }
        let parts: Vec<&str> = line.split('\t').collect();
        let (raw_status, paths) = match parts.split_first() {
            Some((status, paths)) if !paths.is_empty() => (*status, paths),
            _ => {
                return Err(SherlockError::Parse(format!(
                    "expected tab separated name-status line, got {:?}",
                    line
                )));
            }
        };
        let status = FileStatus::parse(raw_status)?;
        let path = paths[paths.len() - 1].to_string();
        let old_path = (paths.len() > 1).then(|| paths[0].to_string());
        files.push(ChangedFile {
            status,
            raw_status: raw_status.trim().to_string(),
            path,
            old_path,
        });
    }
    Ok(files)
}
