//! Tree nodes shown by the explorer and how each kind renders.

use crate::data::Issue;

/// A node in the explorer tree.
///
/// `id` is a path from the root (`query:<id>/KEY-1/KEY-2`) so an issue that
/// appears under several queries still has a distinct node per placement.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: String,
    pub kind: NodeKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// An issue with its reconstructed descendants.
    Issue(Issue),
    /// A saved query; its children are the query's root issues.
    Query { entry_id: String, name: String, jql: String },
    /// Opens a URL, e.g. the full result list in Jira.
    Link { label: String, url: String },
    /// Fixed action entries at the top of the tree.
    Header(HeaderAction),
    /// Informational leaf such as "No issues match this query".
    Placeholder(String),
    /// A query or site that failed to load.
    Error { label: String, detail: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum HeaderAction {
    /// Create-issue page of the first authenticated site.
    CreateIssue { url: String },
    SearchIssues,
}

/// What to do when a node is activated.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeCommand {
    OpenIssue { key: String, url: String },
    OpenUrl(String),
    SearchIssues,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collapsible {
    None,
    Collapsed,
    Expanded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeIcon {
    Epic,
    Subtask,
    Issue,
    Query,
    Link,
    Add,
    Search,
    Info,
    Error,
}

/// Rendering of a node for a tree-view host.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeItem {
    pub label: String,
    pub tooltip: Option<String>,
    pub icon: NodeIcon,
    pub command: Option<NodeCommand>,
    pub collapsible: Collapsible,
}

impl Node {
    pub fn issue(parent_id: &str, issue: Issue) -> Self {
        Self {
            id: format!("{}/{}", parent_id, issue.key),
            kind: NodeKind::Issue(issue),
        }
    }

    pub fn placeholder(parent_id: &str, text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            id: format!("{}/placeholder:{}", parent_id, text),
            kind: NodeKind::Placeholder(text),
        }
    }

    pub fn error(parent_id: &str, label: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            id: format!("{}/error", parent_id),
            kind: NodeKind::Error {
                label: label.into(),
                detail: detail.into(),
            },
        }
    }

    pub fn as_issue(&self) -> Option<&Issue> {
        match &self.kind {
            NodeKind::Issue(issue) => Some(issue),
            _ => None,
        }
    }

    pub fn tree_item(&self) -> TreeItem {
        tree_item(&self.kind)
    }
}

pub fn tree_item(kind: &NodeKind) -> TreeItem {
    match kind {
        NodeKind::Issue(issue) => TreeItem {
            label: format!("{} {}", issue.key, issue.summary),
            tooltip: Some(issue_tooltip(issue)),
            icon: if issue.is_epic {
                NodeIcon::Epic
            } else if issue.is_subtask {
                NodeIcon::Subtask
            } else {
                NodeIcon::Issue
            },
            command: Some(NodeCommand::OpenIssue {
                key: issue.key.clone(),
                url: issue.url.clone(),
            }),
            collapsible: if issue.has_children() {
                Collapsible::Expanded
            } else {
                Collapsible::None
            },
        },
        NodeKind::Query { name, jql, .. } => TreeItem {
            label: name.clone(),
            tooltip: Some(jql.clone()),
            icon: NodeIcon::Query,
            command: None,
            collapsible: Collapsible::Expanded,
        },
        NodeKind::Link { label, url } => TreeItem {
            label: label.clone(),
            tooltip: Some(url.clone()),
            icon: NodeIcon::Link,
            command: Some(NodeCommand::OpenUrl(url.clone())),
            collapsible: Collapsible::None,
        },
        NodeKind::Header(HeaderAction::CreateIssue { url }) => TreeItem {
            label: "Create issue...".to_string(),
            tooltip: Some("Open the Jira create issue page".to_string()),
            icon: NodeIcon::Add,
            command: Some(NodeCommand::OpenUrl(url.clone())),
            collapsible: Collapsible::None,
        },
        NodeKind::Header(HeaderAction::SearchIssues) => TreeItem {
            label: "Search issues...".to_string(),
            tooltip: Some("Fuzzy search every issue in the explorer".to_string()),
            icon: NodeIcon::Search,
            command: Some(NodeCommand::SearchIssues),
            collapsible: Collapsible::None,
        },
        NodeKind::Placeholder(text) => TreeItem {
            label: text.clone(),
            tooltip: None,
            icon: NodeIcon::Info,
            command: None,
            collapsible: Collapsible::None,
        },
        NodeKind::Error { label, detail } => TreeItem {
            label: label.clone(),
            tooltip: Some(detail.clone()),
            icon: NodeIcon::Error,
            command: None,
            collapsible: Collapsible::None,
        },
    }
}

fn issue_tooltip(issue: &Issue) -> String {
    let mut lines = vec![
        format!("{}: {}", issue.key, issue.summary),
        format!("{} · {}", issue.issue_type, issue.status),
    ];
    if let Some(priority) = &issue.priority {
        lines.push(format!("Priority: {}", priority));
    }
    lines.push(format!("Created {}", issue.created.format("%Y-%m-%d %H:%M")));
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::StatusCategory;
    use chrono::{TimeZone, Utc};

    fn issue(key: &str) -> Issue {
        Issue {
            key: key.to_string(),
            summary: "Fix login".to_string(),
            status: "In Progress".to_string(),
            status_category: StatusCategory::InProgress,
            priority: Some("High".to_string()),
            issue_type: "Bug".to_string(),
            is_subtask: false,
            is_epic: false,
            created: Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap(),
            parent_key: None,
            epic_link: None,
            url: format!("https://jira.example.com/browse/{}", key),
            site_id: "site".to_string(),
            subtasks: Vec::new(),
            epic_children: Vec::new(),
        }
    }

    #[test]
    fn test_issue_item() {
        let node = Node::issue("query:mine", issue("BUG-1"));
        let item = node.tree_item();

        assert_eq!(node.id, "query:mine/BUG-1");
        assert_eq!(item.label, "BUG-1 Fix login");
        assert_eq!(item.icon, NodeIcon::Issue);
        assert_eq!(item.collapsible, Collapsible::None);
        assert_eq!(
            item.command,
            Some(NodeCommand::OpenIssue {
                key: "BUG-1".to_string(),
                url: "https://jira.example.com/browse/BUG-1".to_string()
            })
        );
        let tooltip = item.tooltip.unwrap();
        assert!(tooltip.contains("Bug · In Progress"));
        assert!(tooltip.contains("Priority: High"));
        assert!(tooltip.contains("2024-03-01 09:30"));
    }

    #[test]
    fn test_issue_with_children_is_expandable() {
        let mut parent = issue("EPIC-1");
        parent.is_epic = true;
        parent.subtasks.push(issue("BUG-1"));

        let item = tree_item(&NodeKind::Issue(parent));
        assert_eq!(item.icon, NodeIcon::Epic);
        assert_eq!(item.collapsible, Collapsible::Expanded);
    }

    #[test]
    fn test_error_and_placeholder_have_no_command() {
        let error = Node::error("query:x", "Failed to load", "401 Unauthorized");
        let placeholder = Node::placeholder("query:x", "No issues match this query");

        assert_eq!(error.tree_item().command, None);
        assert_eq!(error.tree_item().tooltip.as_deref(), Some("401 Unauthorized"));
        assert_eq!(placeholder.tree_item().icon, NodeIcon::Info);
        assert!(placeholder.as_issue().is_none());
    }
}
