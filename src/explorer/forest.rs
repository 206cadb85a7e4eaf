//! Rebuilds the parent/epic hierarchy from a flat batch of issues and
//! flattens it back into a searchable list.

use crate::data::Issue;
use std::collections::HashMap;

/// Result of [`build_forest`].
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Forest {
    /// Issues without a parent pointer, with descendants attached.
    pub roots: Vec<Issue>,
    /// Issues that could not be placed: their parent is not in the batch,
    /// or they sit on a parent cycle. These are not part of the tree.
    pub orphans: Vec<Issue>,
}

/// Attach every issue under the issue named by its effective parent key.
///
/// Children always go into `subtasks`, appended in input order. When a key
/// occurs more than once, the first occurrence is used.
pub fn build_forest(issues: Vec<Issue>) -> Forest {
    let mut order: Vec<String> = Vec::with_capacity(issues.len());
    let mut arena: HashMap<String, Issue> = HashMap::with_capacity(issues.len());
    for issue in issues {
        if arena.contains_key(&issue.key) {
            continue;
        }
        order.push(issue.key.clone());
        arena.insert(issue.key.clone(), issue);
    }

    let mut children: HashMap<String, Vec<String>> = HashMap::new();
    let mut root_keys = Vec::new();
    for key in &order {
        let Some(issue) = arena.get(key) else {
            continue;
        };
        match issue.effective_parent_key() {
            None => root_keys.push(key.clone()),
            Some(parent) if arena.contains_key(parent) => {
                children.entry(parent.to_string()).or_default().push(key.clone());
            }
            Some(parent) => {
                tracing::warn!("{} left out of the tree: parent {} not found", key, parent);
            }
        }
    }

    let roots = root_keys
        .iter()
        .filter_map(|key| assemble(key, &mut arena, &mut children))
        .collect();

    // Whatever was not reached from a root could not be placed
    let orphans: Vec<Issue> = order.iter().filter_map(|key| arena.remove(key)).collect();
    if !orphans.is_empty() {
        tracing::debug!("{} issues could not be placed in the tree", orphans.len());
    }

    Forest { roots, orphans }
}

fn assemble(
    key: &str,
    arena: &mut HashMap<String, Issue>,
    children: &mut HashMap<String, Vec<String>>,
) -> Option<Issue> {
    let mut issue = arena.remove(key)?;
    let child_keys = children.remove(key).unwrap_or_default();
    let attached: Vec<Issue> = child_keys
        .iter()
        .filter_map(|child| assemble(child, arena, children))
        .collect();
    issue.subtasks.extend(attached);
    Some(issue)
}

/// Depth-first pre-order walk: each issue, then its subtasks, then its epic
/// children. Emitted issues carry no children.
pub fn flatten(forest: &[Issue]) -> Vec<Issue> {
    let mut out = Vec::new();
    for issue in forest {
        flatten_into(issue, &mut out);
    }
    out
}

fn flatten_into(issue: &Issue, out: &mut Vec<Issue>) {
    out.push(issue.without_children());
    for child in &issue.subtasks {
        flatten_into(child, out);
    }
    for child in &issue.epic_children {
        flatten_into(child, out);
    }
}

/// Collapse issues sharing a key.
///
/// A key keeps the position where it was first seen and the value of its
/// last occurrence, so the query processed last wins.
pub fn dedupe_by_key<I>(issues: I) -> Vec<Issue>
where
    I: IntoIterator<Item = Issue>,
{
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut out: Vec<Issue> = Vec::new();
    for issue in issues {
        match positions.get(&issue.key) {
            Some(&idx) => out[idx] = issue,
            None => {
                positions.insert(issue.key.clone(), out.len());
                out.push(issue);
            }
        }
    }
    out
}
