use std::fmt::Display;

use chrono::{DateTime, Local, TimeZone};
use crossterm::style::{Color, Stylize, style};

use crate::models::{ChangedFile, CommitRecord, FileStatus};

const LIST_DATE_FORMAT: &str = "%d-%m-%Y";
const HEADER_DATE_FORMAT: &str = "%a %b %e %H:%M:%S %Y %z";

/// `dd-mm-YYYY <short id> <summary>` in local time.
pub fn commit_line(commit: &CommitRecord) -> String {
    commit_line_in(commit, &Local)
}

pub fn commit_line_in<Tz>(commit: &CommitRecord, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    format!(
        "{} {} {}",
        format_timestamp(commit.timestamp, tz, LIST_DATE_FORMAT),
        style(short_id(commit)).with(Color::DarkGrey),
        sanitize_terminal_text(commit.summary())
    )
}

/// Header block of the commit detail view, shaped like `git show`.
pub fn commit_header_lines(commit: &CommitRecord) -> Vec<String> {
    commit_header_lines_in(commit, &Local)
}

pub fn commit_header_lines_in<Tz>(commit: &CommitRecord, tz: &Tz) -> Vec<String>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let mut lines = vec![format!(
        "{}",
        style(format!("commit {}", commit.id)).with(Color::DarkYellow)
    )];
    if commit.is_merge() {
        let parents = commit
            .parent_ids
            .iter()
            .map(|p| p.chars().take(7).collect::<String>())
            .collect::<Vec<_>>()
            .join(" ");
        lines.push(format!("Merge: {parents}"));
    }
    lines.push(format!(
        "Author: {} <{}>",
        sanitize_terminal_text(&commit.author_name),
        sanitize_terminal_text(&commit.author_email)
    ));
    lines.push(format!(
        "Date:   {}",
        format_timestamp(commit.timestamp, tz, HEADER_DATE_FORMAT)
    ));
    lines.push(String::new());
    for line in commit.message.lines() {
        lines.push(format!("    {}", sanitize_terminal_text(line)));
    }
    lines.push(String::new());
    lines
}

/// One colored status letter.
pub fn status_label(status: FileStatus) -> String {
    let color = match status {
        FileStatus::Unspecified => Color::DarkGrey,
        FileStatus::Modified => Color::Cyan,
        FileStatus::TypeChanged => Color::DarkYellow,
        FileStatus::Added => Color::Green,
        FileStatus::Deleted => Color::Red,
        FileStatus::Renamed(_) => Color::Magenta,
        FileStatus::Copied(_) => Color::Blue,
        FileStatus::Unmerged => Color::Yellow,
    };
    style(status.letter()).with(color).to_string()
}

/// `<status>\t<path>` line of the commit detail view.
pub fn changed_file_line(file: &ChangedFile) -> String {
    format!(
        "{}\t{}",
        status_label(file.status),
        sanitize_terminal_text(&file.path)
    )
}

/// Patch text split into colored display lines.
pub fn diff_lines(patch: &str) -> Vec<String> {
    if patch.trim().is_empty() {
        return vec![style("(no diff output)").with(Color::DarkGrey).to_string()];
    }

    patch
        .lines()
        .map(|raw| {
            let cleaned = sanitize_terminal_text(raw);
            if cleaned.starts_with("+++ ")
                || cleaned.starts_with("--- ")
                || cleaned.starts_with("diff --git")
                || cleaned.starts_with("index ")
            {
                style(cleaned).with(Color::Cyan).to_string()
            } else if cleaned.starts_with('+') {
                style(cleaned).with(Color::Green).to_string()
            } else if cleaned.starts_with('-') {
                style(cleaned).with(Color::Red).to_string()
            } else if cleaned.starts_with("@@") {
                style(cleaned).with(Color::Yellow).bold().to_string()
            } else {
                cleaned
            }
        })
        .collect()
}

/// Strips escape sequences and control characters, expanding tabs.
pub fn sanitize_terminal_text(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut in_escape = false;
    let mut in_csi = false;

    for ch in input.chars() {
        if in_escape {
            in_escape = false;
            in_csi = ch == '[';
            continue;
        }
        if in_csi {
            if ('@'..='~').contains(&ch) {
                in_csi = false;
            }
            continue;
        }

        if ch == '\u{1b}' {
            in_escape = true;
            continue;
        }
        if ch == '\t' {
            out.push_str("    ");
            continue;
        }
        if ch.is_control() {
            continue;
        }
        out.push(ch);
    }
    out
}

fn short_id(commit: &CommitRecord) -> String {
    if commit.short_id.is_empty() {
        commit.id.chars().take(7).collect()
    } else {
        commit.short_id.clone()
    }
}

fn format_timestamp<Tz>(timestamp: i64, tz: &Tz, fmt: &str) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    DateTime::from_timestamp(timestamp, 0).map_or_else(
        || timestamp.to_string(),
        |utc| utc.with_timezone(tz).format(fmt).to_string(),
    )
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::{
        changed_file_line, commit_header_lines_in, commit_line_in, diff_lines,
        sanitize_terminal_text, status_label,
    };
    use crate::models::{ChangedFile, CommitRecord, FileStatus};

    fn commit(parents: &[&str]) -> CommitRecord {
        CommitRecord {
            id: "0123456789abcdef0123456789abcdef01234567".to_string(),
            short_id: "0123456".to_string(),
            parent_ids: parents.iter().map(ToString::to_string).collect(),
            author_name: "Alice".to_string(),
            author_email: "alice@example.com".to_string(),
            // 2023-11-14 22:13:20 UTC
            timestamp: 1_700_000_000,
            message: "Fix the parser\n\nIt was broken.".to_string(),
        }
    }

    #[test]
    fn commit_line_has_date_id_and_summary() {
        let line = commit_line_in(&commit(&[]), &Utc);
        assert!(line.starts_with("14-11-2023 "), "{line:?}");
        assert!(line.contains("0123456"));
        assert!(line.ends_with(" Fix the parser"));
    }

    #[test]
    fn header_lines_follow_git_show_layout() {
        let lines = commit_header_lines_in(&commit(&["aaaaaaaaaa", "bbbbbbbbbb"]), &Utc);
        assert!(lines[0].contains("commit 0123456789abcdef"));
        assert_eq!(lines[1], "Merge: aaaaaaa bbbbbbb");
        assert_eq!(lines[2], "Author: Alice <alice@example.com>");
        assert!(lines[3].starts_with("Date:   Tue Nov 14 22:13:20 2023"));
        assert_eq!(lines[4], "");
        assert_eq!(lines[5], "    Fix the parser");
        assert_eq!(lines[6], "    ");
        assert_eq!(lines[7], "    It was broken.");
        assert_eq!(lines.last().map(String::as_str), Some(""));
    }

    #[test]
    fn non_merge_header_has_no_merge_line() {
        let lines = commit_header_lines_in(&commit(&["aaaaaaaaaa"]), &Utc);
        assert!(lines.iter().all(|l| !l.starts_with("Merge:")));
    }

    #[test]
    fn status_labels_show_their_letter() {
        assert!(status_label(FileStatus::Modified).contains('M'));
        assert!(status_label(FileStatus::Deleted).contains('D'));
        assert!(status_label(FileStatus::Renamed(90)).contains('R'));
        assert!(status_label(FileStatus::Unspecified).contains('U'));
    }

    #[test]
    fn changed_file_line_is_tab_separated() {
        let line = changed_file_line(&ChangedFile {
            status: FileStatus::Added,
            raw_status: "A".to_string(),
            path: "src/main.rs".to_string(),
            old_path: None,
        });
        let (status, path) = line.split_once('\t').expect("tab");
        assert!(status.contains('A'));
        assert_eq!(path, "src/main.rs");
    }

    #[test]
    fn diff_lines_keep_content() {
        let lines = diff_lines("diff --git a/x b/x\n@@ -1 +1 @@\n-old\n+new\n context");
        assert_eq!(lines.len(), 5);
        assert!(lines[2].contains("-old"));
        assert!(lines[3].contains("+new"));
        assert_eq!(lines[4], " context");
    }

    #[test]
    fn empty_diff_has_placeholder() {
        let lines = diff_lines("  \n");
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("(no diff output)"));
    }

    #[test]
    fn sanitize_strips_escapes_and_controls() {
        assert_eq!(sanitize_terminal_text("\u{1b}[31mred\u{1b}[0m"), "red");
        assert_eq!(sanitize_terminal_text("a\tb"), "a    b");
        assert_eq!(sanitize_terminal_text("bell\u{7}"), "bell");
        assert_eq!(sanitize_terminal_text("\u{1b}Mx"), "x");
    }
}
