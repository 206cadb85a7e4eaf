//! Fetches parents and epics that a result set points at but does not contain.

use crate::data::{Issue, SiteDetails};
use crate::jira::JiraClient;
use futures::future::join_all;
use std::collections::HashSet;

/// Fetch the ancestors missing from `issues`, two levels deep.
///
/// The first pass fetches missing parents, the second pass fetches parents
/// of those that are still missing (grandparents). Deeper chains are not
/// followed. Returns only the fetched issues, parents first.
pub async fn resolve_ancestors(
    client: &dyn JiraClient,
    site: &SiteDetails,
    issues: &[Issue],
) -> Vec<Issue> {
    if issues.is_empty() {
        return Vec::new();
    }

    let parents = fetch_missing(client, site, issues.iter()).await;
    let grandparents = fetch_missing(client, site, issues.iter().chain(parents.iter())).await;

    parents.into_iter().chain(grandparents).collect()
}

/// Keys referenced through `parent_key` or `epic_link` that no issue in the
/// batch carries, in order of first reference.
pub fn missing_parent_keys<'a, I>(issues: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a Issue>,
{
    let issues: Vec<&Issue> = issues.into_iter().collect();
    let present: HashSet<&str> = issues.iter().map(|i| i.key.as_str()).collect();

    let mut seen = HashSet::new();
    issues
        .iter()
        .flat_map(|i| [i.parent_key.as_deref(), i.epic_link.as_deref()])
        .flatten()
        .filter(|key| !present.contains(key) && seen.insert(*key))
        .map(String::from)
        .collect()
}

async fn fetch_missing<'a, I>(client: &dyn JiraClient, site: &SiteDetails, issues: I) -> Vec<Issue>
where
    I: IntoIterator<Item = &'a Issue>,
{
    let keys = missing_parent_keys(issues);
    if keys.is_empty() {
        return Vec::new();
    }

    let results = join_all(keys.iter().map(|key| client.fetch_issue(site, key))).await;

    keys.iter()
        .zip(results)
        .filter_map(|(key, result)| match result {
            Ok(mut issue) => {
                // Only the ancestor itself matters, not its other children
                issue.subtasks.clear();
                Some(issue)
            }
            Err(e) => {
                tracing::warn!("Could not fetch ancestor {}: {:#}", key, e);
                None
            }
        })
        .collect()
}
