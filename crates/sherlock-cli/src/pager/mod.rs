pub mod keymap;
pub mod session;
pub mod terminal;
pub mod views;

#[cfg(test)]
pub(crate) mod test_support;

use std::path::Path;

use anyhow::{Context, Result};
use sherlock_core::{CommitSource, PluginRegistry};
use tracing::{debug, error, info};

use self::keymap::{Command, Keymap};
use self::session::{QuitAction, Session};
use self::terminal::{CrosstermTerminal, Terminal};
use self::views::{Browser, ViewAction};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

pub struct Pager<'a, T, S> {
    session: Session<T, ViewAction>,
    browser: Browser<'a, S>,
    keymap: Keymap,
}

impl<'a, T: Terminal, S: CommitSource> Pager<'a, T, S> {
    pub fn new(terminal: T, browser: Browser<'a, S>, keymap: Keymap) -> Result<Self> {
        let session = Session::new(terminal).context("failed to prepare the screen")?;
        Ok(Self {
            session,
            browser,
            keymap,
        })
    }

    pub fn start(&mut self) -> Result<()> {
        self.browser.display_commits(&mut self.session)
    }

    /// Redraws, waits for a key and runs its command until the user quits
    /// from the commit list or input closes.
    pub fn run_loop(&mut self) -> Result<()> {
        loop {
            self.session.update().context("failed to draw the screen")?;
            let Some(key) = self
                .session
                .terminal_mut()
                .read_char()
                .context("failed to read a key")?
            else {
                debug!("input closed");
                return Ok(());
            };
            let Some(command) = self.keymap.resolve(key) else {
                continue;
            };
            if self.execute(command)? == Flow::Exit {
                return Ok(());
            }
        }
    }

    pub fn execute(&mut self, command: Command) -> Result<Flow> {
        match command {
            Command::Move { columns, rows } => {
                self.session
                    .move_by(columns, rows)
                    .context("failed to move the cursor")?;
            }
            Command::Activate => {
                if let Some(action) = self.session.current_action().cloned() {
                    self.browser.perform(&mut self.session, action)?;
                }
            }
            Command::Quit => match self.session.quit_action().clone() {
                QuitAction::Terminate => {
                    self.session.clear().context("failed to clear the screen")?;
                    return Ok(Flow::Exit);
                }
                QuitAction::Run(action) => self.browser.perform(&mut self.session, action)?,
            },
            Command::Plugin(index) => self.browser.run_plugin(&mut self.session, index)?,
        }
        Ok(Flow::Continue)
    }

    #[cfg(test)]
    pub fn session(&self) -> &Session<T, ViewAction> {
        &self.session
    }

    #[cfg(test)]
    pub fn session_mut(&mut self) -> &mut Session<T, ViewAction> {
        &mut self.session
    }
}

/// Loads history, then runs the pager on the process terminal.
///
/// Loading happens before raw mode so startup failures print normally.
pub fn run<S: CommitSource>(
    source: &S,
    repo_root: &Path,
    plugins: PluginRegistry,
    max_count: usize,
) -> Result<()> {
    if !plugins.is_empty() {
        info!(plugins = plugins.plugins().len(), "plugins registered");
    }
    let keymap = Keymap::new(&plugins);
    let mut browser = Browser::new(source, repo_root.to_path_buf(), plugins);
    let count = browser.load_commits(max_count)?;
    info!(count, max_count, repo = %repo_root.display(), "loaded commits");

    let terminal = CrosstermTerminal::enter()?;
    let mut pager = Pager::new(terminal, browser, keymap)?;
    let result = pager.start().and_then(|()| pager.run_loop());
    if let Err(err) = &result {
        error!(error = ?err, "pager stopped");
    }
    result
}
