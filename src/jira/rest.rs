use crate::data::{Issue, SiteDetails, StatusCategory};
use crate::jira::{search_fields, JiraClient, SearchPage, HTTP_CLIENT};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

// Type-safe response structures for the Jira REST v2 API
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    issues: Vec<RawIssue>,
    #[serde(default)]
    total: usize,
}

#[derive(Debug, Deserialize)]
struct RawIssue {
    key: String,
    #[serde(default)]
    fields: RawFields,
}

#[derive(Debug, Default, Deserialize)]
struct RawFields {
    summary: Option<String>,
    status: Option<StatusNode>,
    priority: Option<NamedNode>,
    issuetype: Option<IssueTypeNode>,
    created: Option<String>,
    parent: Option<KeyNode>,
    /// Custom fields (epic link / epic name) vary per site
    #[serde(flatten)]
    custom: HashMap<String, Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatusNode {
    name: String,
    status_category: Option<StatusCategoryNode>,
}

#[derive(Debug, Deserialize)]
struct StatusCategoryNode {
    key: String,
}

#[derive(Debug, Deserialize)]
struct NamedNode {
    name: String,
}

#[derive(Debug, Deserialize)]
struct IssueTypeNode {
    name: String,
    #[serde(default)]
    subtask: bool,
}

#[derive(Debug, Deserialize)]
struct KeyNode {
    key: String,
}

/// Jira REST client using the shared HTTP client and basic auth per site.
#[derive(Debug, Clone, Copy, Default)]
pub struct RestClient;

impl RestClient {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl JiraClient for RestClient {
    async fn search(
        &self,
        site: &SiteDetails,
        jql: &str,
        fields: &[String],
        max_results: usize,
        start_at: usize,
    ) -> Result<SearchPage> {
        let client = &*HTTP_CLIENT;

        let response = client
            .get(site.api_url("search"))
            .basic_auth(&site.email, Some(&site.api_token))
            .header("Accept", "application/json")
            .query(&[
                ("jql", jql.to_string()),
                ("fields", fields.join(",")),
                ("maxResults", max_results.to_string()),
                ("startAt", start_at.to_string()),
            ])
            .send()
            .await
            .with_context(|| format!("Search request to {} failed", site.display_name()))?
            .error_for_status()
            .with_context(|| format!("Search rejected by {}", site.display_name()))?;

        let body: SearchResponse = response
            .json()
            .await
            .context("Failed to decode search response")?;

        tracing::debug!(
            "Search on {} returned {} of {} issues (startAt {})",
            site.display_name(),
            body.issues.len(),
            body.total,
            start_at
        );

        Ok(SearchPage {
            issues: body.issues.into_iter().map(|raw| into_issue(raw, site)).collect(),
            total: body.total,
        })
    }

    async fn fetch_issue(&self, site: &SiteDetails, key: &str) -> Result<Issue> {
        let client = &*HTTP_CLIENT;
        let url = site.api_url(&format!("issue/{}", urlencoding::encode(key)));

        let response = client
            .get(url)
            .basic_auth(&site.email, Some(&site.api_token))
            .header("Accept", "application/json")
            .query(&[("fields", search_fields(site).join(","))])
            .send()
            .await
            .with_context(|| format!("Request for {} failed", key))?
            .error_for_status()
            .with_context(|| format!("Could not fetch {}", key))?;

        let raw: RawIssue = response
            .json()
            .await
            .with_context(|| format!("Failed to decode {}", key))?;

        Ok(into_issue(raw, site))
    }
}

/// Parse one issue as returned by the REST API.
pub fn parse_issue(value: Value, site: &SiteDetails) -> Result<Issue> {
    let raw: RawIssue = serde_json::from_value(value).context("Malformed issue JSON")?;
    Ok(into_issue(raw, site))
}

fn into_issue(raw: RawIssue, site: &SiteDetails) -> Issue {
    let fields = raw.fields;

    let (status, status_category) = match fields.status {
        Some(s) => {
            let category = s
                .status_category
                .map(|c| StatusCategory::from_key(&c.key))
                .unwrap_or_default();
            (s.name, category)
        }
        None => (String::new(), StatusCategory::Unknown),
    };

    let (issue_type, is_subtask) = fields
        .issuetype
        .map(|t| (t.name, t.subtask))
        .unwrap_or_default();

    let epic_link = fields
        .custom
        .get(&site.epic_link_field)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(String::from);

    let has_epic_name = fields
        .custom
        .get(&site.epic_name_field)
        .is_some_and(|v| !v.is_null());
    let is_epic = has_epic_name || issue_type.eq_ignore_ascii_case("epic");

    Issue {
        url: site.browse_url(&raw.key),
        key: raw.key,
        summary: fields.summary.unwrap_or_default(),
        status,
        status_category,
        priority: fields.priority.map(|p| p.name),
        issue_type,
        is_subtask,
        is_epic,
        created: fields
            .created
            .as_deref()
            .and_then(parse_jira_timestamp)
            .unwrap_or(DateTime::UNIX_EPOCH),
        parent_key: fields.parent.map(|p| p.key),
        epic_link,
        site_id: site.id.clone(),
        // Embedded subtasks are discarded: they may not match the query
        subtasks: Vec::new(),
        epic_children: Vec::new(),
    }
}

/// Jira timestamps look like `2024-01-01T10:00:00.000+0000`.
pub fn parse_jira_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f%z")
        .or_else(|_| DateTime::parse_from_rfc3339(s))
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
