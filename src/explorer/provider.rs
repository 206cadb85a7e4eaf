//! JQL tree data provider.
//!
//! Evaluates every enabled saved query (search, ancestor resolution, forest
//! reconstruction) and answers `get_children` / `get_tree_item` for a
//! tree-view host. Evaluation is split into an owned [`RefreshJob`] so a host
//! can run it on a background task and hand the outcomes back via
//! [`JqlTreeProvider::apply`].

use super::ancestors::resolve_ancestors;
use super::forest::{build_forest, dedupe_by_key, flatten};
use super::node::{HeaderAction, Node, NodeKind, TreeItem};
use super::query::{fetch_all, PAGE_SIZE};
use crate::config::{Config, ExplorerConfig};
use crate::data::{Issue, JqlEntry};
use crate::jira::{JiraClient, SiteManager};
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::watch;

const ROOT_ID: &str = "root";

/// Evaluated state of one saved query.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryState {
    Loaded {
        roots: Vec<Issue>,
        /// Set when only the first page was fetched and more may exist.
        more_url: Option<String>,
    },
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryOutcome {
    pub entry_id: String,
    pub state: QueryState,
}

/// Everything needed to evaluate the saved queries, detached from the provider.
#[derive(Clone)]
pub struct RefreshJob {
    client: Arc<dyn JiraClient>,
    sites: SiteManager,
    settings: ExplorerConfig,
    queries: Vec<JqlEntry>,
}

impl RefreshJob {
    pub async fn run(self) -> Vec<QueryOutcome> {
        let states = join_all(
            self.queries
                .iter()
                .map(|entry| evaluate_query(&*self.client, &self.sites, &self.settings, entry)),
        )
        .await;

        self.queries
            .iter()
            .zip(states)
            .map(|(entry, state)| QueryOutcome {
                entry_id: entry.id.clone(),
                state,
            })
            .collect()
    }
}

/// Run one saved query and shape its result for the tree.
pub async fn evaluate_query(
    client: &dyn JiraClient,
    sites: &SiteManager,
    settings: &ExplorerConfig,
    entry: &JqlEntry,
) -> QueryState {
    let Some(site) = sites.get_site_for_id(&entry.site_id) else {
        tracing::warn!("Query {} skipped: site {} not found", entry.name, entry.site_id);
        return QueryState::Failed(format!(
            "Site '{}' is not configured or has no credentials",
            entry.site_id
        ));
    };

    let issues = match fetch_all(client, site, &entry.query, settings.fetch_all_query_results).await
    {
        Ok(issues) => issues,
        Err(e) => {
            tracing::warn!("Query {} failed: {:#}", entry.name, e);
            return QueryState::Failed(format!("{:#}", e));
        }
    };

    let more_url = (!settings.fetch_all_query_results && issues.len() >= PAGE_SIZE)
        .then(|| site.search_url(&entry.query));

    let roots = if settings.nest_subtasks {
        let ancestors = resolve_ancestors(client, site, &issues).await;
        let forest = build_forest(issues.into_iter().chain(ancestors).collect());
        if !forest.orphans.is_empty() {
            let keys: Vec<&str> = forest.orphans.iter().map(|i| i.key.as_str()).collect();
            tracing::warn!(
                "Query {}: {} issues hidden, ancestors unavailable: {}",
                entry.name,
                keys.len(),
                keys.join(", ")
            );
        }
        forest.roots
    } else {
        issues
    };

    QueryState::Loaded { roots, more_url }
}

pub struct JqlTreeProvider {
    client: Arc<dyn JiraClient>,
    sites: SiteManager,
    settings: ExplorerConfig,
    queries: Vec<JqlEntry>,
    headers: Vec<Node>,
    outcomes: HashMap<String, QueryState>,
    search_index: Vec<Issue>,
    revision: watch::Sender<u64>,
}

impl JqlTreeProvider {
    pub fn new(client: Arc<dyn JiraClient>, config: &Config) -> Self {
        let (revision, _) = watch::channel(0);
        let mut provider = Self {
            client,
            sites: SiteManager::default(),
            settings: ExplorerConfig::default(),
            queries: Vec::new(),
            headers: Vec::new(),
            outcomes: HashMap::new(),
            search_index: Vec::new(),
            revision,
        };
        provider.apply_config(config);
        provider
    }

    /// Re-read sites, settings and saved queries after a config change.
    ///
    /// Results of queries that are still enabled are kept until the next refresh.
    pub fn apply_config(&mut self, config: &Config) {
        self.sites = SiteManager::new(config.sites.clone());
        self.settings = config.explorer.clone();
        self.queries = config.enabled_queries().cloned().collect();
        self.outcomes
            .retain(|id, _| self.queries.iter().any(|entry| &entry.id == id));
        self.headers = self.build_headers();
        self.rebuild_search_index();
        self.notify_changed();
    }

    fn build_headers(&self) -> Vec<Node> {
        let mut headers = Vec::new();
        if let Some(site) = self.sites.first_authenticated() {
            headers.push(Node {
                id: "header:create".to_string(),
                kind: NodeKind::Header(HeaderAction::CreateIssue {
                    url: site.create_issue_url(),
                }),
            });
        }
        headers.push(Node {
            id: "header:search".to_string(),
            kind: NodeKind::Header(HeaderAction::SearchIssues),
        });
        headers
    }

    pub fn queries(&self) -> &[JqlEntry] {
        &self.queries
    }

    pub fn refresh_job(&self) -> RefreshJob {
        RefreshJob {
            client: Arc::clone(&self.client),
            sites: self.sites.clone(),
            settings: self.settings.clone(),
            queries: self.queries.clone(),
        }
    }

    /// Evaluate all enabled queries in place.
    pub async fn refresh(&mut self) {
        let outcomes = self.refresh_job().run().await;
        self.apply(outcomes);
    }

    /// Install evaluated outcomes and rebuild the search index.
    pub fn apply(&mut self, outcomes: Vec<QueryOutcome>) {
        for outcome in outcomes {
            if self.queries.iter().any(|entry| entry.id == outcome.entry_id) {
                self.outcomes.insert(outcome.entry_id, outcome.state);
            }
        }
        self.rebuild_search_index();
        self.notify_changed();
    }

    fn rebuild_search_index(&mut self) {
        let flattened = self.queries.iter().flat_map(|entry| {
            match self.outcomes.get(&entry.id) {
                Some(QueryState::Loaded { roots, .. }) => flatten(roots),
                _ => Vec::new(),
            }
        });
        self.search_index = dedupe_by_key(flattened.collect::<Vec<_>>());
    }

    fn notify_changed(&self) {
        self.revision.send_modify(|rev| *rev += 1);
    }

    /// Receiver that changes on every refresh or config change.
    pub fn on_change(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    /// Every issue across all queries, one entry per key.
    pub fn search_index(&self) -> &[Issue] {
        &self.search_index
    }

    pub fn issue_count(&self) -> usize {
        self.search_index.len()
    }

    pub fn query_state(&self, entry_id: &str) -> Option<&QueryState> {
        self.outcomes.get(entry_id)
    }

    pub fn get_children(&self, parent: Option<&Node>) -> Vec<Node> {
        let Some(parent) = parent else {
            return self.root_children();
        };

        match &parent.kind {
            NodeKind::Query { entry_id, .. } => self.query_children(&parent.id, entry_id),
            NodeKind::Issue(issue) => issue
                .subtasks
                .iter()
                .chain(issue.epic_children.iter())
                .map(|child| Node::issue(&parent.id, child.clone()))
                .collect(),
            NodeKind::Link { .. }
            | NodeKind::Header(_)
            | NodeKind::Placeholder(_)
            | NodeKind::Error { .. } => Vec::new(),
        }
    }

    pub fn get_tree_item(&self, node: &Node) -> TreeItem {
        node.tree_item()
    }

    fn root_children(&self) -> Vec<Node> {
        if !self.sites.has_authenticated_site() {
            return vec![Node::placeholder(
                ROOT_ID,
                "No authenticated Jira site. Run `jql-explorer --init`.",
            )];
        }

        let mut nodes = self.headers.clone();
        if self.queries.is_empty() {
            nodes.push(Node::placeholder(ROOT_ID, "No JQL queries configured"));
            return nodes;
        }

        nodes.extend(self.queries.iter().map(|entry| Node {
            id: format!("query:{}", entry.id),
            kind: NodeKind::Query {
                entry_id: entry.id.clone(),
                name: entry.name.clone(),
                jql: entry.query.clone(),
            },
        }));
        nodes
    }

    fn query_children(&self, parent_id: &str, entry_id: &str) -> Vec<Node> {
        match self.outcomes.get(entry_id) {
            None => vec![Node::placeholder(parent_id, "Refresh to load issues")],
            Some(QueryState::Failed(detail)) => {
                vec![Node::error(parent_id, "Failed to load issues", detail.clone())]
            }
            Some(QueryState::Loaded { roots, .. }) if roots.is_empty() => {
                vec![Node::placeholder(parent_id, "No issues match this query")]
            }
            Some(QueryState::Loaded { roots, more_url }) => {
                let mut nodes: Vec<Node> = roots
                    .iter()
                    .map(|issue| Node::issue(parent_id, issue.clone()))
                    .collect();
                if let Some(url) = more_url {
                    nodes.push(Node {
                        id: format!("{}/more", parent_id),
                        kind: NodeKind::Link {
                            label: "View all results in Jira".to_string(),
                            url: url.clone(),
                        },
                    });
                }
                nodes
            }
        }
    }
}

/// Indented plain-text rendering of the whole tree, as the `tree` command prints it.
pub fn render_text(provider: &JqlTreeProvider) -> Vec<String> {
    let mut lines = Vec::new();
    for node in provider.get_children(None) {
        render_node(provider, &node, 0, &mut lines);
    }
    lines
}

fn render_node(provider: &JqlTreeProvider, node: &Node, depth: usize, lines: &mut Vec<String>) {
    let item = provider.get_tree_item(node);
    let detail = match &node.kind {
        NodeKind::Issue(issue) => format!("  [{}]", issue.status),
        NodeKind::Error { detail, .. } => format!(": {}", detail),
        _ => String::new(),
    };
    lines.push(format!("{}{}{}", "  ".repeat(depth), item.label, detail));
    for child in provider.get_children(Some(node)) {
        render_node(provider, &child, depth + 1, lines);
    }
}
