//! Issue tree synchronization.
//!
//! Data flows leaf to root: [`query::fetch_all`] pages through a JQL search,
//! [`ancestors::resolve_ancestors`] fills in missing parents and epics,
//! [`forest::build_forest`] nests the batch, and [`forest::flatten`] plus
//! [`forest::dedupe_by_key`] produce the cross-query search index that the
//! [`provider::JqlTreeProvider`] serves to a tree-view host.

pub mod ancestors;
pub mod forest;
pub mod node;
pub mod provider;
pub mod query;
pub mod search;

pub use forest::{build_forest, dedupe_by_key, flatten, Forest};
pub use node::{Node, NodeCommand, NodeKind, TreeItem};
pub use provider::{JqlTreeProvider, QueryOutcome, QueryState, RefreshJob};
