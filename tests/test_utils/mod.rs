//! Test utilities and fixtures for jql-explorer tests

#![allow(dead_code)]

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use jql_explorer::config::{Config, ExplorerConfig};
use jql_explorer::data::{Issue, JqlEntry, SiteDetails, StatusCategory};
use jql_explorer::jira::{Connectivity, JiraClient, SearchPage};
use jql_explorer::monitor::{NewIssueNotification, NotificationSink};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

pub const SITE_ID: &str = "acme";

/// Authenticated test site
pub fn site() -> SiteDetails {
    SiteDetails {
        id: SITE_ID.to_string(),
        name: "Acme".to_string(),
        base_url: "https://acme.atlassian.net".to_string(),
        email: "dev@acme.test".to_string(),
        api_token: "token".to_string(),
        epic_link_field: "customfield_10014".to_string(),
        epic_name_field: "customfield_10011".to_string(),
    }
}

pub fn entry(id: &str, query: &str) -> JqlEntry {
    JqlEntry {
        id: id.to_string(),
        name: format!("Query {}", id),
        query: query.to_string(),
        site_id: SITE_ID.to_string(),
        enabled: true,
        monitor_enabled: true,
    }
}

pub fn config(entries: Vec<JqlEntry>) -> Config {
    Config {
        explorer: ExplorerConfig::default(),
        sites: vec![site()],
        jql: entries,
    }
}

pub fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, hour, minute, 0).unwrap()
}

/// Plain issue with no parent, created at the epoch
pub fn issue(key: &str) -> Issue {
    Issue {
        key: key.to_string(),
        summary: format!("Summary of {}", key),
        status: "To Do".to_string(),
        status_category: StatusCategory::ToDo,
        priority: None,
        issue_type: "Task".to_string(),
        is_subtask: false,
        is_epic: false,
        created: DateTime::UNIX_EPOCH,
        parent_key: None,
        epic_link: None,
        url: format!("https://acme.atlassian.net/browse/{}", key),
        site_id: SITE_ID.to_string(),
        subtasks: Vec::new(),
        epic_children: Vec::new(),
    }
}

pub fn subtask(key: &str, parent: &str) -> Issue {
    Issue {
        is_subtask: true,
        issue_type: "Sub-task".to_string(),
        parent_key: Some(parent.to_string()),
        ..issue(key)
    }
}

pub fn in_epic(key: &str, epic: &str) -> Issue {
    Issue {
        epic_link: Some(epic.to_string()),
        ..issue(key)
    }
}

pub fn epic(key: &str) -> Issue {
    Issue {
        is_epic: true,
        issue_type: "Epic".to_string(),
        ..issue(key)
    }
}

pub fn created_at(key: &str, created: DateTime<Utc>) -> Issue {
    Issue {
        created,
        ..issue(key)
    }
}

pub fn keys(issues: &[Issue]) -> Vec<&str> {
    issues.iter().map(|i| i.key.as_str()).collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchCall {
    pub jql: String,
    pub fields: Vec<String>,
    pub max_results: usize,
    pub start_at: usize,
}

/// In-memory Jira: search results per JQL, issues by key for single lookups.
///
/// A search matches the registered JQL exactly, or the longest registered
/// JQL the request starts with (so a query with an appended filter still
/// hits its base results).
#[derive(Default)]
pub struct FakeJira {
    results: HashMap<String, Vec<Issue>>,
    failing: HashSet<String>,
    by_key: HashMap<String, Issue>,
    page_cap: Option<usize>,
    total: Option<usize>,
    search_calls: Mutex<Vec<SearchCall>>,
    fetch_calls: Mutex<Vec<String>>,
}

impl FakeJira {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_results(mut self, jql: &str, issues: Vec<Issue>) -> Self {
        self.results.insert(jql.to_string(), issues);
        self
    }

    pub fn with_failing_query(mut self, jql: &str) -> Self {
        self.failing.insert(jql.to_string());
        self
    }

    /// Make an issue available to `fetch_issue`
    pub fn with_issue(mut self, issue: Issue) -> Self {
        self.by_key.insert(issue.key.clone(), issue);
        self
    }

    /// Serve at most `cap` issues per page regardless of `max_results`
    pub fn with_page_cap(mut self, cap: usize) -> Self {
        self.page_cap = Some(cap);
        self
    }

    /// Report this total instead of the real result count
    pub fn with_total(mut self, total: usize) -> Self {
        self.total = Some(total);
        self
    }

    pub fn search_calls(&self) -> Vec<SearchCall> {
        self.search_calls.lock().unwrap().clone()
    }

    pub fn fetch_calls(&self) -> Vec<String> {
        self.fetch_calls.lock().unwrap().clone()
    }

    fn lookup(&self, jql: &str) -> Option<(&String, &Vec<Issue>)> {
        if let Some(found) = self.results.get_key_value(jql) {
            return Some(found);
        }
        self.results
            .iter()
            .filter(|(registered, _)| jql.starts_with(registered.as_str()))
            .max_by_key(|(registered, _)| registered.len())
    }
}

#[async_trait]
impl JiraClient for FakeJira {
    async fn search(
        &self,
        _site: &SiteDetails,
        jql: &str,
        fields: &[String],
        max_results: usize,
        start_at: usize,
    ) -> Result<SearchPage> {
        self.search_calls.lock().unwrap().push(SearchCall {
            jql: jql.to_string(),
            fields: fields.to_vec(),
            max_results,
            start_at,
        });

        let Some((registered, issues)) = self.lookup(jql) else {
            bail!("Unexpected JQL: {}", jql);
        };
        if self.failing.contains(registered) {
            bail!("Search failed with status 400");
        }

        let size = self.page_cap.map_or(max_results, |cap| cap.min(max_results));
        let page: Vec<Issue> = issues.iter().skip(start_at).take(size).cloned().collect();
        Ok(SearchPage {
            issues: page,
            total: self.total.unwrap_or(issues.len()),
        })
    }

    async fn fetch_issue(&self, _site: &SiteDetails, key: &str) -> Result<Issue> {
        self.fetch_calls.lock().unwrap().push(key.to_string());
        match self.by_key.get(key) {
            Some(issue) => Ok(issue.clone()),
            None => bail!("Issue {} does not exist", key),
        }
    }
}

pub struct FakeConnectivity {
    online: AtomicBool,
}

impl FakeConnectivity {
    pub fn online() -> Self {
        Self {
            online: AtomicBool::new(true),
        }
    }

    pub fn offline() -> Self {
        Self {
            online: AtomicBool::new(false),
        }
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }
}

#[async_trait]
impl Connectivity for FakeConnectivity {
    async fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }
}

/// Sink that keeps every notification it receives
#[derive(Default)]
pub struct RecordingSink {
    sent: Mutex<Vec<NewIssueNotification>>,
}

impl RecordingSink {
    pub fn sent(&self) -> Vec<NewIssueNotification> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn notify(&self, notification: NewIssueNotification) -> Result<()> {
        self.sent.lock().unwrap().push(notification);
        Ok(())
    }
}
