//! Background monitor that reports issues created since the last poll.
//!
//! Every enabled saved query with monitoring on is re-run with a `created > "<watermark>"`
//! clause. Results are merged across queries and turned into one notification
//! per poll. The watermark only moves forward.

use crate::config::Config;
use crate::data::{Issue, JqlEntry};
use crate::explorer::query::fetch_all;
use crate::jira::{Connectivity, JiraClient, SiteManager};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch, Mutex};

static ORDER_BY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)ORDER BY").expect("valid ORDER BY pattern"));

/// What selecting a notification does.
#[derive(Debug, Clone, PartialEq)]
pub enum NotificationAction {
    OpenIssue(Issue),
    ShowExplorer,
}

impl NotificationAction {
    pub fn label(&self) -> &'static str {
        match self {
            Self::OpenIssue(_) => "Open Issue",
            Self::ShowExplorer => "View Explorer",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewIssueNotification {
    pub message: String,
    pub action: NotificationAction,
    pub issues: Vec<Issue>,
}

impl NewIssueNotification {
    /// Build the coalesced notification for a set of new issues.
    pub fn for_issues(issues: Vec<Issue>) -> Option<Self> {
        let labels: Vec<String> = issues.iter().map(Issue::quoted_label).collect();
        let (message, action) = match issues.len() {
            0 => return None,
            1 => (
                format!("{} added to explorer", labels[0]),
                NotificationAction::OpenIssue(issues[0].clone()),
            ),
            2 | 3 => (
                format!(
                    "{} and {} added to explorer",
                    labels[..labels.len() - 1].join(", "),
                    labels[labels.len() - 1]
                ),
                NotificationAction::ShowExplorer,
            ),
            n => (
                format!(
                    "{} and {} other new issues added to explorer",
                    labels[..2].join(", "),
                    n - 2
                ),
                NotificationAction::ShowExplorer,
            ),
        };

        Some(Self {
            message,
            action,
            issues,
        })
    }
}

/// Where notifications are shown.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(&self, notification: NewIssueNotification) -> Result<()>;
}

/// Prints notifications to stdout, used by the `monitor` command.
#[derive(Debug, Default)]
pub struct StdoutSink;

#[async_trait]
impl NotificationSink for StdoutSink {
    async fn notify(&self, notification: NewIssueNotification) -> Result<()> {
        let target = match &notification.action {
            NotificationAction::OpenIssue(issue) => issue.url.clone(),
            NotificationAction::ShowExplorer => "run `jql-explorer` to browse".to_string(),
        };
        println!(
            "{}  [{}: {}]",
            notification.message,
            notification.action.label(),
            target
        );
        Ok(())
    }
}

/// Forwards notifications to the terminal UI.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::Sender<NewIssueNotification>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::Sender<NewIssueNotification>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl NotificationSink for ChannelSink {
    async fn notify(&self, notification: NewIssueNotification) -> Result<()> {
        self.tx
            .send(notification)
            .await
            .context("Notification receiver closed")
    }
}

/// `yyyy-MM-dd HH:mm`, the resolution JQL date comparisons accept.
pub fn format_watermark(watermark: DateTime<Utc>) -> String {
    watermark.format("%Y-%m-%d %H:%M").to_string()
}

/// Watermark for a monitor that should also report issues created in the
/// last `since_mins` minutes. `None` starts from `now`.
pub fn starting_watermark(now: DateTime<Utc>, since_mins: Option<u32>) -> DateTime<Utc> {
    match since_mins {
        Some(mins) => now - chrono::Duration::minutes(i64::from(mins)),
        None => now,
    }
}

/// Add `created > "<timestamp>"` to a query, ahead of any `ORDER BY`.
pub fn add_created_filter(jql: &str, timestamp: &str) -> String {
    let clause = format!("created > \"{}\"", timestamp);
    let (head, order) = match ORDER_BY.find(jql) {
        Some(m) => jql.split_at(m.start()),
        None => (jql, ""),
    };
    let head = head.trim();

    let filtered = if head.is_empty() {
        clause
    } else {
        format!("{} and {}", head, clause)
    };
    if order.is_empty() {
        filtered
    } else {
        format!("{} {}", filtered, order.trim_end())
    }
}

/// Drop repeats of the same issue on the same site; first occurrence wins.
pub fn dedupe_by_site_and_key(issues: Vec<Issue>) -> Vec<Issue> {
    let mut seen = HashSet::new();
    issues
        .into_iter()
        .filter(|issue| seen.insert((issue.site_id.clone(), issue.key.clone())))
        .collect()
}

pub struct NewIssueMonitor {
    client: Arc<dyn JiraClient>,
    connectivity: Arc<dyn Connectivity>,
    sink: Arc<dyn NotificationSink>,
    config: watch::Receiver<Arc<Config>>,
    watermark: Mutex<DateTime<Utc>>,
}

impl NewIssueMonitor {
    pub fn new(
        client: Arc<dyn JiraClient>,
        connectivity: Arc<dyn Connectivity>,
        sink: Arc<dyn NotificationSink>,
        config: watch::Receiver<Arc<Config>>,
    ) -> Self {
        Self::with_watermark(client, connectivity, sink, config, Utc::now())
    }

    pub fn with_watermark(
        client: Arc<dyn JiraClient>,
        connectivity: Arc<dyn Connectivity>,
        sink: Arc<dyn NotificationSink>,
        config: watch::Receiver<Arc<Config>>,
        watermark: DateTime<Utc>,
    ) -> Self {
        Self {
            client,
            connectivity,
            sink,
            config,
            watermark: Mutex::new(watermark),
        }
    }

    pub async fn watermark(&self) -> DateTime<Utc> {
        *self.watermark.lock().await
    }

    /// Poll every monitored query once.
    ///
    /// Failures are logged, never surfaced: background polling must not
    /// interrupt the user. Returns the notification that was delivered.
    pub async fn check_for_new_issues(&self) -> Option<NewIssueNotification> {
        match self.poll().await {
            Ok(notification) => notification,
            Err(e) => {
                tracing::error!("New issue check failed: {:#}", e);
                None
            }
        }
    }

    async fn poll(&self) -> Result<Option<NewIssueNotification>> {
        let config = Arc::clone(&*self.config.borrow());
        let sites = SiteManager::new(config.sites.clone());

        if !config.explorer.monitor_enabled || !sites.has_authenticated_site() {
            return Ok(None);
        }
        if !self.connectivity.is_online().await {
            tracing::debug!("Offline, skipping new issue check");
            return Ok(None);
        }

        let watermark = self.watermark().await;
        let timestamp = format_watermark(watermark);
        let entries: Vec<&JqlEntry> = config.monitored_queries().collect();

        let results = join_all(entries.iter().map(|entry| {
            self.query_since(
                &sites,
                entry,
                &timestamp,
                config.explorer.fetch_all_query_results,
            )
        }))
        .await;

        let mut found = Vec::new();
        for (entry, result) in entries.iter().zip(results) {
            match result {
                Ok(issues) => found.extend(issues.into_iter().filter(|i| i.created > watermark)),
                Err(e) => tracing::warn!("Monitor query {} failed: {:#}", entry.name, e),
            }
        }

        if let Some(newest) = found.iter().map(|i| i.created).max() {
            let mut guard = self.watermark.lock().await;
            if newest > *guard {
                *guard = newest;
            }
        }

        let Some(notification) = NewIssueNotification::for_issues(dedupe_by_site_and_key(found))
        else {
            return Ok(None);
        };

        tracing::info!("{}", notification.message);
        self.sink.notify(notification.clone()).await?;
        Ok(Some(notification))
    }

    async fn query_since(
        &self,
        sites: &SiteManager,
        entry: &JqlEntry,
        timestamp: &str,
        fetch_all_pages: bool,
    ) -> Result<Vec<Issue>> {
        let site = sites
            .get_site_for_id(&entry.site_id)
            .with_context(|| format!("Site {} not found", entry.site_id))?;
        let jql = add_created_filter(&entry.query, timestamp);
        fetch_all(&*self.client, site, &jql, fetch_all_pages).await
    }

    /// Poll on the configured interval until the config channel closes.
    ///
    /// An interval of 0 pauses polling until the config changes.
    pub async fn run(&self) {
        let mut config = self.config.clone();
        loop {
            let minutes = config.borrow().explorer.refresh_interval_mins;
            if minutes == 0 {
                if config.changed().await.is_err() {
                    return;
                }
                continue;
            }

            tokio::select! {
                _ = tokio::time::sleep(Duration::from_secs(minutes * 60)) => {
                    self.check_for_new_issues().await;
                }
                changed = config.changed() => {
                    // Re-read the interval
                    if changed.is_err() {
                        return;
                    }
                }
            }
        }
    }
}
