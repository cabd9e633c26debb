use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use sherlock_core::{Config, ConfigStore, GitCommitSource, GitRunner, PluginRegistry};
use tracing::info;

mod logging;
mod pager;

#[derive(Debug, Parser)]
#[command(name = "git-sherlock")]
#[command(about = "Browse recent git commits in a terminal pager", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Page through the most recent commits (default)
    Recent(RecentCmd),
    /// Print the configured plugins as JSON
    Plugins,
    /// Print the config file location and effective settings as JSON
    Config,
}

#[derive(Debug, Args)]
struct RecentCmd {
    /// Repository to browse
    #[arg(short, long, default_value = ".")]
    repo: PathBuf,
    /// Number of commits to list
    #[arg(short = 'n', long)]
    number: Option<usize>,
}

impl Default for RecentCmd {
    fn default() -> Self {
        Self {
            repo: PathBuf::from("."),
            number: None,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    run(cli)
}

fn run(cli: Cli) -> Result<()> {
    let store = ConfigStore::default_store().context("failed to resolve config path")?;
    let config = store.load().context("failed to load config")?;
    init_logging(&config);
    let plugins =
        PluginRegistry::from_specs(&config.plugins).context("invalid plugin configuration")?;

    let command = cli.command.unwrap_or(Commands::Recent(RecentCmd::default()));

    match command {
        Commands::Recent(cmd) => {
            // Browsing never needs to refresh the index.
            let runner =
                GitRunner::new(config.git_binary.clone()).with_env("GIT_OPTIONAL_LOCKS", "0");
            info!(git = runner.git_binary(), repo = %cmd.repo.display(), "opening repository");
            let source = GitCommitSource::open(runner, &cmd.repo)
                .with_context(|| format!("failed to open repository {}", cmd.repo.display()))?;
            let max_count = effective_max_count(cmd.number, &config);
            pager::run(&source, source.repo_root(), plugins, max_count).with_context(|| {
                format!("failed browsing history of {}", source.repo_root().display())
            })?;
        }
        Commands::Plugins => {
            println!("{}", serde_json::to_string_pretty(&plugins)?);
        }
        Commands::Config => {
            let report = serde_json::json!({
                "path": store.path(),
                "config": config,
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}

fn effective_max_count(flag: Option<usize>, config: &Config) -> usize {
    flag.unwrap_or(config.max_count)
}

fn init_logging(config: &Config) {
    let Some(path) = config.resolved_log_file() else {
        eprintln!("warning: no log file location available, logging disabled");
        return;
    };
    if let Err(err) = logging::init(&path) {
        eprintln!("warning: logging disabled: {err}");
    }
}
