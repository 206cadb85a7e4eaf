use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use jql_explorer::config::{self, Config};
use jql_explorer::explorer::{provider::render_text, JqlTreeProvider};
use jql_explorer::jira::{JiraClient, RestClient, SiteManager, SiteProbe};
use jql_explorer::monitor::{starting_watermark, NewIssueMonitor, StdoutSink};
use jql_explorer::tui;
use std::sync::Arc;
use tokio::sync::watch;

#[derive(Parser, Debug)]
#[command(name = "jql-explorer")]
#[command(about = "Browse Jira saved queries as issue trees and watch for new issues")]
#[command(version)]
struct Args {
    /// Initialize configuration
    #[arg(long)]
    init: bool,

    /// Path to config file
    #[arg(long, short)]
    config: Option<std::path::PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print every query's issue tree and exit
    Tree,
    /// Poll for newly created issues and print notifications
    Monitor {
        /// Run a single check instead of polling
        #[arg(long, requires = "since")]
        once: bool,
        /// Also report issues created in the last N minutes
        #[arg(long, value_name = "MINUTES")]
        since: Option<u32>,
    },
}

fn env_filter() -> Result<tracing_subscriber::EnvFilter> {
    Ok(tracing_subscriber::EnvFilter::from_default_env()
        .add_directive("jql_explorer=info".parse()?))
}

/// Log to stderr for the command-line modes.
fn init_stderr_logging() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter()?)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

/// The TUI owns the terminal, so logs go to a file instead.
fn init_file_logging() -> Result<()> {
    let path = config::log_file_path()?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Failed to open log file {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter()?)
        .with_writer(std::sync::Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

async fn print_tree(config: &Config) -> Result<()> {
    let client: Arc<dyn JiraClient> = Arc::new(RestClient::new());
    let mut provider = JqlTreeProvider::new(client, config);
    provider.refresh().await;
    for line in render_text(&provider) {
        println!("{}", line);
    }
    Ok(())
}

async fn run_monitor(config: Config, once: bool, since: Option<u32>) -> Result<()> {
    let sites = SiteManager::new(config.sites.clone());
    if !sites.has_authenticated_site() {
        anyhow::bail!("No authenticated Jira site. Run `jql-explorer --init` to add one.");
    }

    // Sender stays alive for the whole run so the monitor loop never sees a closed channel
    let (_config_tx, config_rx) = watch::channel(Arc::new(config));
    let monitor = NewIssueMonitor::with_watermark(
        Arc::new(RestClient::new()),
        Arc::new(SiteProbe::new(sites)),
        Arc::new(StdoutSink),
        config_rx,
        starting_watermark(chrono::Utc::now(), since),
    );

    if once || since.is_some() {
        monitor.check_for_new_issues().await;
    }
    if !once {
        tracing::info!("Watching for new issues");
        monitor.run().await;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.init {
        init_stderr_logging()?;
        config::init_wizard(args.config.as_deref()).await?;
        return Ok(());
    }

    let config_path = config::resolve_path(args.config.as_deref())?;

    match args.command {
        Some(Command::Tree) => {
            init_stderr_logging()?;
            let config = config::load(Some(config_path.as_path()))?;
            print_tree(&config).await
        }
        Some(Command::Monitor { once, since }) => {
            init_stderr_logging()?;
            let config = config::load(Some(config_path.as_path()))?;
            run_monitor(config, once, since).await
        }
        None => {
            init_file_logging()?;
            let config = config::load(Some(config_path.as_path()))?;
            tui::run(config, &config_path).await
        }
    }
}
