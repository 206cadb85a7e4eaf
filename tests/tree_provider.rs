//! Tests for the JQL tree provider
//!
//! Covers the node layout a tree-view host sees (headers, queries, issue
//! children, placeholders, errors) and the cross-query search index.

mod test_utils;

use jql_explorer::config::Config;
use jql_explorer::explorer::node::{HeaderAction, NodeCommand};
use jql_explorer::explorer::provider::render_text;
use jql_explorer::explorer::{JqlTreeProvider, Node, NodeKind, QueryState};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use test_utils::{config, entry, epic, in_epic, issue, keys, subtask, FakeJira};

fn provider(client: FakeJira, config: &Config) -> JqlTreeProvider {
    JqlTreeProvider::new(Arc::new(client), config)
}

fn query_node(provider: &JqlTreeProvider, entry_id: &str) -> Node {
    provider
        .get_children(None)
        .into_iter()
        .find(|n| matches!(&n.kind, NodeKind::Query { entry_id: id, .. } if id == entry_id))
        .unwrap()
}

fn labels(provider: &JqlTreeProvider, nodes: &[Node]) -> Vec<String> {
    nodes
        .iter()
        .map(|n| provider.get_tree_item(n).label)
        .collect()
}

mod root_children {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_headers_then_queries() {
        let cfg = config(vec![entry("mine", "assignee = me"), entry("bugs", "type = Bug")]);
        let provider = provider(FakeJira::new(), &cfg);

        let roots = provider.get_children(None);
        let ids: Vec<&str> = roots.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(
            ids,
            vec!["header:create", "header:search", "query:mine", "query:bugs"]
        );
        assert!(matches!(
            &roots[0].kind,
            NodeKind::Header(HeaderAction::CreateIssue { url })
                if url == "https://acme.atlassian.net/secure/CreateIssue!default.jspa"
        ));
    }

    #[test]
    fn test_no_authenticated_site() {
        let mut cfg = config(vec![entry("mine", "assignee = me")]);
        cfg.sites[0].api_token.clear();
        let provider = provider(FakeJira::new(), &cfg);

        let roots = provider.get_children(None);
        assert_eq!(roots.len(), 1);
        assert!(matches!(&roots[0].kind, NodeKind::Placeholder(text) if text.contains("--init")));
    }

    #[test]
    fn test_no_queries_configured() {
        let provider = provider(FakeJira::new(), &config(Vec::new()));

        let roots = provider.get_children(None);
        assert_eq!(
            labels(&provider, &roots),
            vec!["Create issue...", "Search issues...", "No JQL queries configured"]
        );
    }

    #[test]
    fn test_disabled_queries_hidden() {
        let mut hidden = entry("old", "project = OLD");
        hidden.enabled = false;
        let provider = provider(FakeJira::new(), &config(vec![hidden]));

        assert!(provider.queries().is_empty());
    }
}

mod query_children {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_unloaded_query_asks_for_refresh() {
        let cfg = config(vec![entry("mine", "assignee = me")]);
        let provider = provider(FakeJira::new(), &cfg);

        let query = query_node(&provider, "mine");
        let children = provider.get_children(Some(&query));
        assert_eq!(labels(&provider, &children), vec!["Refresh to load issues"]);
    }

    #[tokio::test]
    async fn test_nested_tree_under_query() {
        let client = FakeJira::new()
            .with_results(
                "project = PROJ",
                vec![subtask("PROJ-2", "PROJ-1"), in_epic("PROJ-1", "EPIC-1")],
            )
            .with_issue(epic("EPIC-1"));
        let cfg = config(vec![entry("proj", "project = PROJ")]);
        let mut provider = provider(client, &cfg);
        provider.refresh().await;

        let query = query_node(&provider, "proj");
        let roots = provider.get_children(Some(&query));
        assert_eq!(roots.len(), 1);
        assert_eq!(roots[0].id, "query:proj/EPIC-1");

        let level1 = provider.get_children(Some(&roots[0]));
        assert_eq!(level1[0].id, "query:proj/EPIC-1/PROJ-1");
        let level2 = provider.get_children(Some(&level1[0]));
        assert_eq!(level2[0].id, "query:proj/EPIC-1/PROJ-1/PROJ-2");
        assert!(provider.get_children(Some(&level2[0])).is_empty());

        let item = provider.get_tree_item(&level2[0]);
        assert_eq!(
            item.command,
            Some(NodeCommand::OpenIssue {
                key: "PROJ-2".to_string(),
                url: "https://acme.atlassian.net/browse/PROJ-2".to_string(),
            })
        );
    }

    #[tokio::test]
    async fn test_flat_list_without_nesting() {
        let client = FakeJira::new().with_results(
            "project = PROJ",
            vec![issue("PROJ-1"), subtask("PROJ-2", "PROJ-1")],
        );
        let mut cfg = config(vec![entry("proj", "project = PROJ")]);
        cfg.explorer.nest_subtasks = false;
        let mut provider = provider(client, &cfg);
        provider.refresh().await;

        let query = query_node(&provider, "proj");
        let roots = provider.get_children(Some(&query));
        let ids: Vec<&str> = roots.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["query:proj/PROJ-1", "query:proj/PROJ-2"]);
    }

    #[tokio::test]
    async fn test_empty_result_placeholder() {
        let client = FakeJira::new().with_results("project = NONE", Vec::new());
        let cfg = config(vec![entry("none", "project = NONE")]);
        let mut provider = provider(client, &cfg);
        provider.refresh().await;

        let query = query_node(&provider, "none");
        let children = provider.get_children(Some(&query));
        assert_eq!(labels(&provider, &children), vec!["No issues match this query"]);
    }

    #[tokio::test]
    async fn test_failed_query_shows_error_node() {
        let client = FakeJira::new()
            .with_results("project = BAD", Vec::new())
            .with_failing_query("project = BAD");
        let cfg = config(vec![entry("bad", "project = BAD")]);
        let mut provider = provider(client, &cfg);
        provider.refresh().await;

        assert!(matches!(provider.query_state("bad"), Some(QueryState::Failed(_))));
        let query = query_node(&provider, "bad");
        let children = provider.get_children(Some(&query));
        assert!(matches!(
            &children[0].kind,
            NodeKind::Error { label, detail }
                if label == "Failed to load issues" && detail.contains("400")
        ));
    }

    #[tokio::test]
    async fn test_unknown_site_is_an_error() {
        let mut orphan_entry = entry("other", "project = X");
        orphan_entry.site_id = "missing".to_string();
        let mut provider = provider(FakeJira::new(), &config(vec![orphan_entry]));
        provider.refresh().await;

        let query = query_node(&provider, "other");
        let children = provider.get_children(Some(&query));
        assert!(matches!(
            &children[0].kind,
            NodeKind::Error { detail, .. } if detail.contains("missing")
        ));
    }

    #[tokio::test]
    async fn test_more_link_when_first_page_is_full() {
        let issues = (1..=100).map(|n| issue(&format!("BIG-{}", n))).collect();
        let client = FakeJira::new().with_results("project = BIG", issues);
        let cfg = config(vec![entry("big", "project = BIG")]);
        let mut provider = provider(client, &cfg);
        provider.refresh().await;

        let query = query_node(&provider, "big");
        let children = provider.get_children(Some(&query));
        assert_eq!(children.len(), 101);
        let last = &children[100];
        assert_eq!(last.id, "query:big/more");
        assert!(matches!(
            &last.kind,
            NodeKind::Link { url, .. } if url.starts_with("https://acme.atlassian.net/issues/?jql=")
        ));
    }
}

mod search_index {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_issue_in_two_queries_indexed_once() {
        let client = FakeJira::new()
            .with_results("assignee = me", vec![issue("PROJ-1"), issue("PROJ-2")])
            .with_results("type = Bug", vec![issue("PROJ-2"), issue("PROJ-3")]);
        let cfg = config(vec![entry("mine", "assignee = me"), entry("bugs", "type = Bug")]);
        let mut provider = provider(client, &cfg);
        provider.refresh().await;

        assert_eq!(
            keys(provider.search_index()),
            vec!["PROJ-1", "PROJ-2", "PROJ-3"]
        );
        assert_eq!(provider.issue_count(), 3);
    }

    #[tokio::test]
    async fn test_nested_issues_are_indexed_without_children() {
        let client = FakeJira::new().with_results(
            "project = PROJ",
            vec![issue("PROJ-1"), subtask("PROJ-2", "PROJ-1")],
        );
        let cfg = config(vec![entry("proj", "project = PROJ")]);
        let mut provider = provider(client, &cfg);
        provider.refresh().await;

        let index = provider.search_index();
        assert_eq!(keys(index), vec!["PROJ-1", "PROJ-2"]);
        assert!(index.iter().all(|i| !i.has_children()));
    }

    #[tokio::test]
    async fn test_refresh_notifies_listeners() {
        let client = FakeJira::new().with_results("project = PROJ", vec![issue("PROJ-1")]);
        let cfg = config(vec![entry("proj", "project = PROJ")]);
        let mut provider = provider(client, &cfg);
        let mut changes = provider.on_change();
        changes.borrow_and_update();

        provider.refresh().await;

        assert!(changes.has_changed().unwrap());
    }
}

mod config_reload {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_removed_query_drops_its_results() {
        let client = FakeJira::new()
            .with_results("assignee = me", vec![issue("PROJ-1")])
            .with_results("type = Bug", vec![issue("PROJ-2")]);
        let cfg = config(vec![entry("mine", "assignee = me"), entry("bugs", "type = Bug")]);
        let mut provider = provider(client, &cfg);
        provider.refresh().await;

        provider.apply_config(&config(vec![entry("mine", "assignee = me")]));

        assert_eq!(keys(provider.search_index()), vec!["PROJ-1"]);
        assert!(provider.query_state("bugs").is_none());
        assert!(provider.query_state("mine").is_some());
    }
}

#[tokio::test]
async fn test_render_text_indents_levels() {
    let client = FakeJira::new().with_results(
        "project = PROJ",
        vec![issue("PROJ-1"), subtask("PROJ-2", "PROJ-1")],
    );
    let cfg = config(vec![entry("proj", "project = PROJ")]);
    let mut provider = provider(client, &cfg);
    provider.refresh().await;

    let lines = render_text(&provider);
    assert!(lines.contains(&"Query proj".to_string()));
    assert!(lines
        .iter()
        .any(|l| l.starts_with("  PROJ-1 Summary of PROJ-1")));
    assert!(lines
        .iter()
        .any(|l| l.starts_with("    PROJ-2 Summary of PROJ-2")));
}
