pub mod connectivity;
pub mod rest;
pub mod sites;

use crate::data::{Issue, SiteDetails};
use anyhow::Result;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use std::time::Duration;

pub use connectivity::{Connectivity, SiteProbe};
pub use rest::RestClient;
pub use sites::SiteManager;

/// Shared HTTP client for all API requests to enable connection pooling
pub static HTTP_CLIENT: Lazy<reqwest::Client> = Lazy::new(|| {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .pool_max_idle_per_host(5)
        .build()
        .expect("Failed to create HTTP client")
});

/// Fields every search and single-issue lookup asks for.
const BASE_FIELDS: &[&str] = &[
    "summary",
    "status",
    "priority",
    "issuetype",
    "created",
    "parent",
    "subtasks",
];

/// Field list for a site, including its epic custom fields.
pub fn search_fields(site: &SiteDetails) -> Vec<String> {
    BASE_FIELDS
        .iter()
        .map(|f| f.to_string())
        .chain([site.epic_link_field.clone(), site.epic_name_field.clone()])
        .collect()
}

/// One page of search results.
#[derive(Debug, Clone, Default)]
pub struct SearchPage {
    pub issues: Vec<Issue>,
    /// Total number of matches the server reports for the query.
    pub total: usize,
}

/// The issue endpoints the explorer consumes.
#[async_trait]
pub trait JiraClient: Send + Sync {
    async fn search(
        &self,
        site: &SiteDetails,
        jql: &str,
        fields: &[String],
        max_results: usize,
        start_at: usize,
    ) -> Result<SearchPage>;

    async fn fetch_issue(&self, site: &SiteDetails, key: &str) -> Result<Issue>;
}
