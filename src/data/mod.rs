use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A Jira issue projected to the fields the explorer works with.
///
/// `subtasks` and `epic_children` are empty when an issue comes off the wire;
/// they are only populated by forest reconstruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub key: String, // e.g., "PROJ-123"
    pub summary: String,
    pub status: String,
    pub status_category: StatusCategory,
    pub priority: Option<String>,
    pub issue_type: String,
    pub is_subtask: bool,
    pub is_epic: bool,
    pub created: DateTime<Utc>,
    pub parent_key: Option<String>,
    pub epic_link: Option<String>,
    pub url: String,
    pub site_id: String,
    #[serde(default)]
    pub subtasks: Vec<Issue>,
    #[serde(default)]
    pub epic_children: Vec<Issue>,
}

impl Issue {
    /// The key this issue hangs under in a forest.
    ///
    /// NextGen projects store the epic in `parent`, classic projects use the
    /// epic link field, so both count as parent pointers.
    pub fn effective_parent_key(&self) -> Option<&str> {
        self.parent_key.as_deref().or(self.epic_link.as_deref())
    }

    /// Copy of this issue with both child lists empty.
    pub fn without_children(&self) -> Issue {
        Issue {
            subtasks: Vec::new(),
            epic_children: Vec::new(),
            ..self.clone()
        }
    }

    pub fn has_children(&self) -> bool {
        !self.subtasks.is_empty() || !self.epic_children.is_empty()
    }

    /// `[KEY] "summary"`, the form used in notifications.
    pub fn quoted_label(&self) -> String {
        format!("[{}] \"{}\"", self.key, self.summary)
    }
}

/// Jira's coarse status grouping (`statusCategory.key`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum StatusCategory {
    ToDo,
    InProgress,
    Done,
    #[default]
    Unknown,
}

impl StatusCategory {
    pub fn from_key(key: &str) -> Self {
        match key {
            "new" => Self::ToDo,
            "indeterminate" => Self::InProgress,
            "done" => Self::Done,
            _ => Self::Unknown,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::ToDo => "To Do",
            Self::InProgress => "In Progress",
            Self::Done => "Done",
            Self::Unknown => "Unknown",
        }
    }
}

/// A Jira site (cloud or server instance) the explorer can query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteDetails {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub base_url: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub api_token: String,
    /// Custom field holding the epic link on classic projects.
    #[serde(default = "default_epic_link_field")]
    pub epic_link_field: String,
    /// Custom field holding the epic name; only epics carry a value.
    #[serde(default = "default_epic_name_field")]
    pub epic_name_field: String,
}

fn default_epic_link_field() -> String {
    "customfield_10014".to_string()
}

fn default_epic_name_field() -> String {
    "customfield_10011".to_string()
}

impl SiteDetails {
    pub fn is_authenticated(&self) -> bool {
        !self.email.trim().is_empty() && !self.api_token.trim().is_empty()
    }

    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.base_url
        } else {
            &self.name
        }
    }

    fn base(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    pub fn api_url(&self, path: &str) -> String {
        format!("{}/rest/api/2/{}", self.base(), path)
    }

    pub fn browse_url(&self, key: &str) -> String {
        format!("{}/browse/{}", self.base(), key)
    }

    pub fn search_url(&self, jql: &str) -> String {
        format!("{}/issues/?jql={}", self.base(), urlencoding::encode(jql))
    }

    pub fn create_issue_url(&self) -> String {
        format!("{}/secure/CreateIssue!default.jspa", self.base())
    }
}

/// A saved, named JQL query bound to one site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JqlEntry {
    pub id: String,
    pub name: String,
    pub query: String,
    pub site_id: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_true")]
    pub monitor_enabled: bool,
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issue(parent: Option<&str>, epic: Option<&str>) -> Issue {
        Issue {
            key: "TEST-1".to_string(),
            summary: "Test issue".to_string(),
            status: "Open".to_string(),
            status_category: StatusCategory::ToDo,
            priority: None,
            issue_type: "Task".to_string(),
            is_subtask: false,
            is_epic: false,
            created: DateTime::UNIX_EPOCH,
            parent_key: parent.map(String::from),
            epic_link: epic.map(String::from),
            url: String::new(),
            site_id: "site".to_string(),
            subtasks: Vec::new(),
            epic_children: Vec::new(),
        }
    }

    #[test]
    fn test_parent_key_takes_precedence_over_epic_link() {
        assert_eq!(
            issue(Some("TEST-2"), Some("EPIC-1")).effective_parent_key(),
            Some("TEST-2")
        );
        assert_eq!(issue(None, Some("EPIC-1")).effective_parent_key(), Some("EPIC-1"));
        assert_eq!(issue(None, None).effective_parent_key(), None);
    }

    #[test]
    fn test_site_urls_ignore_trailing_slash() {
        let site = SiteDetails {
            id: "s".to_string(),
            name: String::new(),
            base_url: "https://example.atlassian.net/".to_string(),
            email: String::new(),
            api_token: String::new(),
            epic_link_field: default_epic_link_field(),
            epic_name_field: default_epic_name_field(),
        };
        assert_eq!(
            site.browse_url("A-1"),
            "https://example.atlassian.net/browse/A-1"
        );
        assert_eq!(
            site.api_url("search"),
            "https://example.atlassian.net/rest/api/2/search"
        );
        assert_eq!(
            site.search_url("project = A"),
            "https://example.atlassian.net/issues/?jql=project%20%3D%20A"
        );
        assert!(!site.is_authenticated());
        assert_eq!(site.display_name(), "https://example.atlassian.net/");
    }
}
