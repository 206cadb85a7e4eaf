use crate::config::watcher::ConfigWatcher;
use crate::config::Config;
use crate::data::Issue;
use crate::explorer::node::{Collapsible, Node, NodeCommand};
use crate::explorer::search::{IssueSearch, SearchHit};
use crate::explorer::{JqlTreeProvider, QueryOutcome};
use crate::jira::JiraClient;
use crate::monitor::{NewIssueNotification, NotificationAction};
use anyhow::Result;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};

/// Braille spinner frames for loading animation
pub const SPINNER_FRAMES: &[char] = &['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];

/// Rows moved by PageUp / PageDown.
const PAGE_SIZE: usize = 10;

/// Result from background refresh task
pub enum RefreshResult {
    Complete(Vec<QueryOutcome>),
}

/// One visible line of the tree.
#[derive(Debug, Clone)]
pub struct Row {
    pub node: Node,
    pub depth: usize,
    pub expandable: bool,
    pub expanded: bool,
}

pub struct App {
    pub provider: JqlTreeProvider,
    pub rows: Vec<Row>,
    pub selected: usize,
    /// Nodes whose expansion the user flipped from the default.
    toggled: HashSet<String>,

    // Search state
    pub search_mode: bool,
    pub search_query: String,
    pub search_hits: Vec<SearchHit>,
    searcher: IssueSearch,

    // UI state
    pub notification: Option<NewIssueNotification>,
    pub error_message: Option<String>,
    pub is_loading: bool,
    pub spinner_frame: usize,
    pub last_refresh: Option<DateTime<Utc>>,

    /// Channel receiver for background refresh results
    refresh_rx: Option<mpsc::Receiver<RefreshResult>>,
    /// Refresh requested while another was running
    refresh_queued: bool,
    notification_rx: mpsc::Receiver<NewIssueNotification>,
    changes: watch::Receiver<u64>,
    config_tx: watch::Sender<Arc<Config>>,
    config_watcher: Option<ConfigWatcher>,
}

impl App {
    pub fn new(
        client: Arc<dyn JiraClient>,
        config: &Config,
        config_tx: watch::Sender<Arc<Config>>,
        notification_rx: mpsc::Receiver<NewIssueNotification>,
        config_watcher: Option<ConfigWatcher>,
    ) -> Self {
        let provider = JqlTreeProvider::new(client, config);
        let changes = provider.on_change();
        let mut app = Self {
            provider,
            rows: Vec::new(),
            selected: 0,
            toggled: HashSet::new(),
            search_mode: false,
            search_query: String::new(),
            search_hits: Vec::new(),
            searcher: IssueSearch::new(),
            notification: None,
            error_message: None,
            is_loading: false,
            spinner_frame: 0,
            last_refresh: None,
            refresh_rx: None,
            refresh_queued: false,
            notification_rx,
            changes,
            config_tx,
            config_watcher,
        };
        app.rebuild_rows();
        app
    }

    /// Process a message and update app state (Elm Architecture update function).
    ///
    /// Returns `Ok(true)` if the app should quit, `Ok(false)` to continue.
    pub async fn update(&mut self, msg: super::Message) -> Result<bool> {
        use super::Message;
        match msg {
            Message::Quit => return Ok(true),
            Message::Refresh => self.start_background_refresh(),
            Message::MoveUp => self.move_selection(-1),
            Message::MoveDown => self.move_selection(1),
            Message::PageUp => self.move_selection(-(PAGE_SIZE as i32)),
            Message::PageDown => self.move_selection(PAGE_SIZE as i32),
            Message::GotoTop => self.selected = 0,
            Message::GotoBottom => self.selected = self.visible_len().saturating_sub(1),
            Message::Expand => self.set_expanded(true),
            Message::Collapse => self.collapse_or_select_parent(),
            Message::Activate => self.activate()?,
            Message::EnterSearch => self.enter_search(),
            Message::ExitSearch => self.exit_search(),
            Message::SearchInput(c) => {
                self.search_query.push(c);
                self.update_search();
            }
            Message::SearchBackspace => {
                self.search_query.pop();
                self.update_search();
            }
            Message::OpenNotification => self.open_notification()?,
            Message::DismissNotification => {
                self.notification = None;
                self.error_message = None;
            }
            Message::None => {}
        }
        Ok(false)
    }

    pub fn on_tick(&mut self) {
        if self.is_loading {
            self.spinner_frame = (self.spinner_frame + 1) % SPINNER_FRAMES.len();
        }

        self.poll_refresh();
        self.poll_notifications();
        self.poll_config();

        if self.changes.has_changed().unwrap_or(false) {
            self.changes.borrow_and_update();
            self.rebuild_rows();
            if self.search_mode {
                self.update_search();
            }
        }
    }

    pub fn spinner_char(&self) -> char {
        SPINNER_FRAMES[self.spinner_frame]
    }

    /// Start refresh in background (non-blocking)
    ///
    /// While a refresh is running, another request is queued and started
    /// once the current one completes.
    pub fn start_background_refresh(&mut self) {
        if self.refresh_rx.is_some() {
            self.refresh_queued = true;
            return;
        }
        self.refresh_queued = false;

        self.is_loading = true;
        let (tx, rx) = mpsc::channel(1);
        self.refresh_rx = Some(rx);

        let job = self.provider.refresh_job();
        tokio::spawn(async move {
            let outcomes = job.run().await;
            if tx.send(RefreshResult::Complete(outcomes)).await.is_err() {
                tracing::warn!("Refresh result dropped, app closed");
            }
        });
    }

    /// Poll for refresh results (non-blocking, call from event loop tick)
    pub fn poll_refresh(&mut self) -> bool {
        let Some(mut rx) = self.refresh_rx.take() else {
            return false;
        };

        match rx.try_recv() {
            Ok(RefreshResult::Complete(outcomes)) => {
                self.provider.apply(outcomes);
                self.is_loading = false;
                self.last_refresh = Some(Utc::now());
                self.error_message = None;
            }
            Err(mpsc::error::TryRecvError::Empty) => {
                self.refresh_rx = Some(rx);
                return false;
            }
            Err(mpsc::error::TryRecvError::Disconnected) => {
                self.is_loading = false;
                self.error_message = Some("Refresh task ended unexpectedly".to_string());
            }
        }

        if self.refresh_queued {
            self.start_background_refresh();
        }
        true
    }

    /// Whether another refresh will start when the running one completes.
    pub fn refresh_queued(&self) -> bool {
        self.refresh_queued
    }

    fn poll_notifications(&mut self) {
        let mut received = false;
        while let Ok(notification) = self.notification_rx.try_recv() {
            self.notification = Some(notification);
            received = true;
        }
        // New issues should show up in the tree as well
        if received {
            self.start_background_refresh();
        }
    }

    fn poll_config(&mut self) {
        let Some(config) = self.config_watcher.as_ref().and_then(ConfigWatcher::poll) else {
            return;
        };
        self.provider.apply_config(&config);
        self.config_tx.send_replace(Arc::new(config));
        self.start_background_refresh();
    }

    /// Rebuild the visible rows from the provider (call after any tree change)
    pub fn rebuild_rows(&mut self) {
        let selected_id = self.rows.get(self.selected).map(|r| r.node.id.clone());

        let mut rows = Vec::new();
        for node in self.provider.get_children(None) {
            self.push_rows(node, 0, &mut rows);
        }
        self.rows = rows;

        // Stay on the same node if it is still visible
        self.selected = selected_id
            .and_then(|id| self.rows.iter().position(|r| r.node.id == id))
            .unwrap_or(self.selected)
            .min(self.rows.len().saturating_sub(1));
    }

    fn push_rows(&self, node: Node, depth: usize, rows: &mut Vec<Row>) {
        let item = self.provider.get_tree_item(&node);
        let default_expanded = item.collapsible == Collapsible::Expanded;
        let expandable = item.collapsible != Collapsible::None;
        let expanded = expandable && (default_expanded ^ self.toggled.contains(&node.id));

        let children = if expanded {
            self.provider.get_children(Some(&node))
        } else {
            Vec::new()
        };

        rows.push(Row {
            node,
            depth,
            expandable,
            expanded,
        });
        for child in children {
            self.push_rows(child, depth + 1, rows);
        }
    }

    fn visible_len(&self) -> usize {
        if self.search_mode {
            self.search_hits.len()
        } else {
            self.rows.len()
        }
    }

    pub fn move_selection(&mut self, delta: i32) {
        let len = self.visible_len();
        if len == 0 {
            self.selected = 0;
            return;
        }
        let next = self.selected as i64 + delta as i64;
        self.selected = next.clamp(0, len as i64 - 1) as usize;
    }

    pub fn selected_row(&self) -> Option<&Row> {
        if self.search_mode {
            return None;
        }
        self.rows.get(self.selected)
    }

    pub fn selected_hit(&self) -> Option<&Issue> {
        if !self.search_mode {
            return None;
        }
        self.search_hits
            .get(self.selected)
            .and_then(|hit| self.provider.search_index().get(hit.index))
    }

    fn set_expanded(&mut self, expand: bool) {
        let Some(row) = self.selected_row() else {
            return;
        };
        if !row.expandable || row.expanded == expand {
            return;
        }
        let id = row.node.id.clone();
        if !self.toggled.remove(&id) {
            self.toggled.insert(id);
        }
        self.rebuild_rows();
    }

    fn collapse_or_select_parent(&mut self) {
        let Some(row) = self.selected_row() else {
            return;
        };
        if row.expanded {
            self.set_expanded(false);
            return;
        }
        let depth = row.depth;
        if depth == 0 {
            return;
        }
        if let Some(parent) = self.rows[..self.selected]
            .iter()
            .rposition(|r| r.depth < depth)
        {
            self.selected = parent;
        }
    }

    fn activate(&mut self) -> Result<()> {
        if self.search_mode {
            if let Some(issue) = self.selected_hit() {
                open_url(&issue.url)?;
            }
            return Ok(());
        }

        let Some(row) = self.selected_row() else {
            return Ok(());
        };
        let item = self.provider.get_tree_item(&row.node);
        match item.command {
            Some(NodeCommand::OpenIssue { url, .. }) | Some(NodeCommand::OpenUrl(url)) => {
                open_url(&url)?
            }
            Some(NodeCommand::SearchIssues) => self.enter_search(),
            None => {
                let expanded = row.expanded;
                self.set_expanded(!expanded);
            }
        }
        Ok(())
    }

    pub fn enter_search(&mut self) {
        self.search_mode = true;
        self.search_query.clear();
        self.search_hits.clear();
        self.selected = 0;
    }

    pub fn exit_search(&mut self) {
        self.search_mode = false;
        self.search_query.clear();
        self.search_hits.clear();
        self.selected = 0;
    }

    pub fn update_search(&mut self) {
        self.search_hits = self
            .searcher
            .search(self.provider.search_index(), &self.search_query);
        self.selected = self.selected.min(self.search_hits.len().saturating_sub(1));
    }

    fn open_notification(&mut self) -> Result<()> {
        let Some(notification) = self.notification.take() else {
            return Ok(());
        };
        match notification.action {
            NotificationAction::OpenIssue(issue) => open_url(&issue.url)?,
            NotificationAction::ShowExplorer => {
                self.exit_search();
                self.start_background_refresh();
            }
        }
        Ok(())
    }
}

fn open_url(url: &str) -> Result<()> {
    // Use xdg-open on Linux, which works in WSL
    std::process::Command::new("xdg-open")
        .arg(url)
        .spawn()
        .or_else(|_| {
            // Fallback to wslview for WSL
            std::process::Command::new("wslview").arg(url).spawn()
        })?;
    Ok(())
}
