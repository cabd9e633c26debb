use std::path::PathBuf;

use anyhow::{Context, Result};
use crossterm::style::{Color, Stylize, style};
use sherlock_core::format::{changed_file_line, commit_header_lines, commit_line, diff_lines};
use sherlock_core::{
    CommitRecord, CommitSource, PluginContext, PluginRegistry, PluginRunner, SherlockError,
};
use tracing::{debug, warn};

use super::session::{QuitAction, Session};
use super::terminal::Terminal;

pub const LIST_VIEW: &str = "commit-list";
pub const DETAIL_VIEW: &str = "commit-detail";
pub const DIFF_VIEW: &str = "diff";

/// What activating a line (or quitting a view) does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewAction {
    ShowCommits,
    ShowCommit(usize),
    ShowDiff { commit: usize, path: String },
}

impl ViewAction {
    /// Name under which the view this action opens saves its viewport.
    pub fn view_name(&self) -> &'static str {
        match self {
            ViewAction::ShowCommits => LIST_VIEW,
            ViewAction::ShowCommit(_) => DETAIL_VIEW,
            ViewAction::ShowDiff { .. } => DIFF_VIEW,
        }
    }
}

pub struct Browser<'a, S> {
    source: &'a S,
    repo_root: PathBuf,
    commits: Option<Vec<CommitRecord>>,
    plugins: PluginRegistry,
    runner: PluginRunner,
    /// Action that re-opens the view on screen; `None` inside plugin output.
    current: Option<ViewAction>,
}

impl<'a, S: CommitSource> Browser<'a, S> {
    pub fn new(source: &'a S, repo_root: PathBuf, plugins: PluginRegistry) -> Self {
        Self {
            source,
            repo_root,
            commits: None,
            plugins,
            runner: PluginRunner,
            current: None,
        }
    }

    pub fn load_commits(&mut self, max_count: usize) -> Result<usize> {
        let commits = self
            .source
            .list_recent_commits(max_count)
            .context("failed to list recent commits")?;
        let count = commits.len();
        self.commits = Some(commits);
        Ok(count)
    }

    #[cfg(test)]
    pub fn current_view(&self) -> Option<&ViewAction> {
        self.current.as_ref()
    }

    pub fn perform<T: Terminal>(
        &mut self,
        session: &mut Session<T, ViewAction>,
        action: ViewAction,
    ) -> Result<()> {
        debug!(?action, "performing view action");
        match action {
            ViewAction::ShowCommits => self.display_commits(session),
            ViewAction::ShowCommit(index) => self.display_commit(session, index),
            ViewAction::ShowDiff { commit, path } => self.display_diff(session, commit, &path),
        }
    }

    pub fn display_commits<T: Terminal>(
        &mut self,
        session: &mut Session<T, ViewAction>,
    ) -> Result<()> {
        let commits = self.commits.as_ref().ok_or_else(|| {
            SherlockError::Navigation("commit list shown before commits were loaded".to_string())
        })?;

        session.clear()?;
        session.restore(LIST_VIEW);
        session.define_quit_action(QuitAction::Terminate);
        for (index, commit) in commits.iter().enumerate() {
            session.add_line(commit_line(commit), Some(ViewAction::ShowCommit(index)));
        }
        session.set_status(format!(
            "{} commits  enter: open  q: quit",
            commits.len()
        ));
        self.current = Some(ViewAction::ShowCommits);
        Ok(())
    }

    pub fn display_commit<T: Terminal>(
        &mut self,
        session: &mut Session<T, ViewAction>,
        index: usize,
    ) -> Result<()> {
        let commit = self.commit(index)?;
        let files = self
            .source
            .changed_files(commit)
            .with_context(|| format!("failed to list files of commit {}", commit.id))?;
        let header = commit_header_lines(commit);
        let short_id = commit.short_id.clone();

        session.backup(LIST_VIEW);
        session.define_quit_action(QuitAction::Run(ViewAction::ShowCommits));
        session.clear()?;
        session.restore(DETAIL_VIEW);
        for line in header {
            session.add_line(line, None);
        }
        for file in &files {
            session.add_line(
                changed_file_line(file),
                Some(ViewAction::ShowDiff {
                    commit: index,
                    path: file.path.clone(),
                }),
            );
        }
        session.set_status(format!(
            "commit {short_id}  {} files  enter: diff  q: back",
            files.len()
        ));
        self.current = Some(ViewAction::ShowCommit(index));
        Ok(())
    }

    pub fn display_diff<T: Terminal>(
        &mut self,
        session: &mut Session<T, ViewAction>,
        index: usize,
        path: &str,
    ) -> Result<()> {
        let commit = self.commit(index)?;
        let patch = self
            .source
            .diff_for_commit(commit, Some(path))
            .with_context(|| format!("failed to diff {path} in commit {}", commit.id))?;
        let short_id = commit.short_id.clone();

        session.backup(DETAIL_VIEW);
        session.define_quit_action(QuitAction::Run(ViewAction::ShowCommit(index)));
        session.clear()?;
        session.restore(DIFF_VIEW);
        for line in diff_lines(&patch) {
            session.add_line(line, None);
        }
        session.set_status(format!("{short_id} {path}  q: back"));
        self.current = Some(ViewAction::ShowDiff {
            commit: index,
            path: path.to_string(),
        });
        Ok(())
    }

    /// Runs the plugin at `index` against the selection and shows its output.
    ///
    /// A failing plugin is reported in the view rather than as an error.
    pub fn run_plugin<T: Terminal>(
        &mut self,
        session: &mut Session<T, ViewAction>,
        index: usize,
    ) -> Result<()> {
        let Some(origin) = self.current.clone() else {
            debug!(index, "plugin key ignored outside browsing views");
            return Ok(());
        };
        let plugin = self
            .plugins
            .get(index)
            .cloned()
            .ok_or_else(|| SherlockError::Navigation(format!("no plugin at index {index}")))?;
        let context = self.plugin_context(session, &origin);

        let lines = match self.runner.invoke(&plugin, &context) {
            Ok(lines) => lines,
            Err(err) => {
                warn!(plugin = %plugin.name, error = %err, "plugin failed");
                let mut lines = vec![
                    style(format!("plugin `{}` failed", plugin.name))
                        .with(Color::Red)
                        .to_string(),
                ];
                lines.extend(err.to_string().lines().map(ToString::to_string));
                lines
            }
        };

        session.backup(origin.view_name());
        session.define_quit_action(QuitAction::Run(origin));
        session.clear()?;
        for line in lines {
            session.add_line(line, None);
        }
        session.set_status(format!("{}  q: back", plugin.name));
        self.current = None;
        Ok(())
    }

    fn plugin_context<T: Terminal>(
        &self,
        session: &Session<T, ViewAction>,
        origin: &ViewAction,
    ) -> PluginContext {
        let (commit, file_path) = match (origin, session.current_action()) {
            (ViewAction::ShowCommits, Some(ViewAction::ShowCommit(i))) => (Some(*i), None),
            (ViewAction::ShowCommits, _) => (None, None),
            (ViewAction::ShowCommit(i), Some(ViewAction::ShowDiff { path, .. })) => {
                (Some(*i), Some(path.clone()))
            }
            (ViewAction::ShowCommit(i), _) => (Some(*i), None),
            (ViewAction::ShowDiff { commit, path }, _) => (Some(*commit), Some(path.clone())),
        };
        let commit = commit.and_then(|i| self.commit(i).ok());
        PluginContext {
            repository: self.repo_root.clone(),
            commit_id: commit.map(|c| c.id.clone()),
            short_commit_id: commit.map(|c| c.short_id.clone()),
            file_path,
        }
    }

    fn commit(&self, index: usize) -> Result<&CommitRecord, SherlockError> {
        let commits = self.commits.as_ref().ok_or_else(|| {
            SherlockError::Navigation("commit shown before commits were loaded".to_string())
        })?;
        commits.get(index).ok_or_else(|| {
            SherlockError::Navigation(format!(
                "commit index {index} out of range ({} loaded)",
                commits.len()
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use sherlock_core::{PluginRegistry, PluginSpec, SherlockError};

    use super::{Browser, DETAIL_VIEW, ViewAction};
    use crate::pager::session::{Cursor, QuitAction, Session};
    use crate::pager::test_support::{FakeSource, ScriptedTerminal};

    fn session() -> Session<ScriptedTerminal, ViewAction> {
        Session::new(ScriptedTerminal::new(80, 30)).expect("session")
    }

    fn browser(source: &FakeSource) -> Browser<'_, FakeSource> {
        Browser::new(source, PathBuf::from("."), PluginRegistry::default())
    }

    fn is_navigation(err: &anyhow::Error) -> bool {
        matches!(
            err.downcast_ref::<SherlockError>(),
            Some(SherlockError::Navigation(_))
        )
    }

    #[test]
    fn list_view_binds_each_commit() {
        let source = FakeSource::with_commits(5);
        let mut browser = browser(&source);
        let mut session = session();
        assert_eq!(browser.load_commits(3).expect("load"), 3);
        browser.display_commits(&mut session).expect("list");

        assert_eq!(session.lines().len(), 3);
        assert_eq!(session.lines()[2].action, Some(ViewAction::ShowCommit(2)));
        assert!(session.lines()[0].text.ends_with("commit number 0"));
        assert_eq!(session.quit_action(), &QuitAction::Terminate);
        assert_eq!(browser.current_view(), Some(&ViewAction::ShowCommits));
    }

    #[test]
    fn detail_before_loading_is_a_navigation_error() {
        let source = FakeSource::with_commits(2);
        let mut browser = browser(&source);
        let mut session = session();
        let err = browser.display_commit(&mut session, 0).expect_err("not loaded");
        assert!(is_navigation(&err));
        let err = browser.display_commits(&mut session).expect_err("not loaded");
        assert!(is_navigation(&err));
    }

    #[test]
    fn detail_out_of_range_is_a_navigation_error() {
        let source = FakeSource::with_commits(2);
        let mut browser = browser(&source);
        let mut session = session();
        browser.load_commits(10).expect("load");
        let err = browser.display_commit(&mut session, 2).expect_err("range");
        assert!(is_navigation(&err));
    }

    #[test]
    fn listing_failure_carries_context() {
        let source = FakeSource {
            fail_listing: true,
            ..FakeSource::with_commits(1)
        };
        let err = browser(&source).load_commits(5).expect_err("fails");
        assert!(format!("{err:#}").contains("failed to list recent commits"));
    }

    #[test]
    fn detail_view_has_header_then_file_lines() {
        let source = FakeSource::with_commits(3);
        let mut browser = browser(&source);
        let mut session = session();
        browser.load_commits(10).expect("load");
        browser.display_commits(&mut session).expect("list");
        browser.display_commit(&mut session, 1).expect("detail");

        let lines = session.lines();
        assert!(lines[0].text.contains(&source.commits[1].id));
        let actions: Vec<_> = lines.iter().filter_map(|l| l.action.clone()).collect();
        assert_eq!(
            actions,
            vec![
                ViewAction::ShowDiff {
                    commit: 1,
                    path: "src/lib.rs".to_string()
                },
                ViewAction::ShowDiff {
                    commit: 1,
                    path: "notes.txt".to_string()
                },
            ]
        );
        assert!(lines.iter().take(6).all(|l| l.action.is_none()));
        assert!(lines[6].text.ends_with("\tsrc/lib.rs"));
        assert_eq!(
            session.quit_action(),
            &QuitAction::Run(ViewAction::ShowCommits)
        );
    }

    #[test]
    fn returning_to_list_restores_cursor() {
        let source = FakeSource::with_commits(8);
        let mut browser = browser(&source);
        let mut session = session();
        browser.load_commits(10).expect("load");
        browser.display_commits(&mut session).expect("list");
        session.move_cursor(1, 5).expect("move");
        assert_eq!(session.current_action(), Some(&ViewAction::ShowCommit(4)));

        browser.display_commit(&mut session, 4).expect("detail");
        assert_eq!(session.cursor(), Cursor::HOME);
        browser.display_commits(&mut session).expect("back");
        assert_eq!(session.cursor(), Cursor { column: 1, row: 5 });
        assert_eq!(session.current_action(), Some(&ViewAction::ShowCommit(4)));
    }

    #[test]
    fn diff_view_quits_back_to_its_commit() {
        let source = FakeSource::with_commits(3);
        let mut browser = browser(&source);
        let mut session = session();
        browser.load_commits(10).expect("load");
        browser.display_commits(&mut session).expect("list");
        browser.display_commit(&mut session, 2).expect("detail");
        session.move_cursor(1, 8).expect("move");
        browser
            .display_diff(&mut session, 2, "notes.txt")
            .expect("diff");

        assert!(session.lines().iter().all(|l| l.action.is_none()));
        assert!(session.lines().iter().any(|l| l.text.contains("+new")));
        assert_eq!(
            session.quit_action(),
            &QuitAction::Run(ViewAction::ShowCommit(2))
        );

        browser.display_commit(&mut session, 2).expect("detail again");
        assert_eq!(session.cursor().row, 8);
    }

    #[test]
    fn view_names_follow_actions() {
        assert_eq!(ViewAction::ShowCommit(3).view_name(), DETAIL_VIEW);
        assert_eq!(ViewAction::ShowCommits.view_name(), "commit-list");
        assert_eq!(
            ViewAction::ShowDiff {
                commit: 0,
                path: String::new()
            }
            .view_name(),
            "diff"
        );
    }

    #[cfg(unix)]
    fn plugin_browser<'a>(source: &'a FakeSource, command: &str) -> Browser<'a, FakeSource> {
        let registry = PluginRegistry::from_specs(&[PluginSpec {
            name: "probe".to_string(),
            key: 'p',
            command: command.to_string(),
            description: String::new(),
        }])
        .expect("registry");
        Browser::new(source, std::env::temp_dir(), registry)
    }

    #[cfg(unix)]
    #[test]
    fn plugin_output_becomes_a_view_that_quits_to_origin() {
        let source = FakeSource::with_commits(4);
        let mut browser = plugin_browser(&source, "sh -c 'echo picked $0' {SHORT_COMMIT}");
        let mut session = session();
        browser.load_commits(10).expect("load");
        browser.display_commits(&mut session).expect("list");
        session.move_cursor(1, 3).expect("move");

        browser.run_plugin(&mut session, 0).expect("plugin");
        assert_eq!(
            session.lines()[0].text,
            format!("picked {}", source.commits[2].short_id)
        );
        assert_eq!(
            session.quit_action(),
            &QuitAction::Run(ViewAction::ShowCommits)
        );
        assert_eq!(browser.current_view(), None);

        browser.display_commits(&mut session).expect("back");
        assert_eq!(session.cursor().row, 3);
    }

    #[cfg(unix)]
    #[test]
    fn plugin_failure_is_rendered() {
        let source = FakeSource::with_commits(1);
        let mut browser = plugin_browser(&source, "sh -c 'exit 4'");
        let mut session = session();
        browser.load_commits(10).expect("load");
        browser.display_commits(&mut session).expect("list");

        browser.run_plugin(&mut session, 0).expect("failure is not an error");
        assert!(session.lines()[0].text.contains("plugin `probe` failed"));
    }

    #[cfg(unix)]
    #[test]
    fn plugin_without_selection_reports_missing_placeholder() {
        let source = FakeSource::with_commits(1);
        let mut browser = plugin_browser(&source, "echo {FILE}");
        let mut session = session();
        browser.load_commits(10).expect("load");
        browser.display_commits(&mut session).expect("list");

        browser.run_plugin(&mut session, 0).expect("rendered");
        assert!(session.lines().iter().any(|l| l.text.contains("FILE")));
    }
}
