mod app;
pub mod input;
mod message;
mod ui;

use crate::config::watcher::ConfigWatcher;
use crate::config::Config;
use crate::jira::{JiraClient, RestClient, SiteManager, SiteProbe};
use crate::monitor::{ChannelSink, NewIssueMonitor};
use anyhow::Result;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};

pub use app::{App, RefreshResult, Row};
pub use message::Message;

pub async fn run(config: Config, config_path: &Path) -> Result<()> {
    // Check if stdout is a terminal
    if !std::io::IsTerminal::is_terminal(&io::stdout()) {
        anyhow::bail!("jql-explorer requires an interactive terminal");
    }

    let client: Arc<dyn JiraClient> = Arc::new(RestClient::new());

    // Background monitor reports new issues over a channel and follows config reloads
    let (config_tx, config_rx) = watch::channel(Arc::new(config.clone()));
    let (notify_tx, notify_rx) = mpsc::channel(16);
    let monitor = NewIssueMonitor::new(
        Arc::clone(&client),
        Arc::new(SiteProbe::new(SiteManager::new(config.sites.clone()))),
        Arc::new(ChannelSink::new(notify_tx)),
        config_rx,
    );
    let monitor_task = tokio::spawn(async move { monitor.run().await });

    let watcher = match ConfigWatcher::new(config_path) {
        Ok(watcher) => Some(watcher),
        Err(e) => {
            tracing::warn!(error = %e, "Config hot-reload disabled");
            None
        }
    };

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Create app state
    let mut app = App::new(client, &config, config_tx, notify_rx, watcher);

    // Initial data fetch (non-blocking - UI shows immediately with loading state)
    app.start_background_refresh();

    let result = run_app(&mut terminal, &mut app).await;

    monitor_task.abort();

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = std::time::Instant::now();
    let mut input_state = input::InputState::new();

    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        let timeout = tick_rate.saturating_sub(last_tick.elapsed());

        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                let msg = input::dispatch(app, &mut input_state, key);
                if app.update(msg).await? {
                    return Ok(()); // Quit requested
                }
            }
        }

        // Handle pending chord timeout (non-blocking)
        if input_state.has_timed_out() {
            input_state.clear();
        }

        if last_tick.elapsed() >= tick_rate {
            app.on_tick();
            last_tick = std::time::Instant::now();
        }
    }
}
