//! Nerd Font icons used throughout the UI.

use crate::explorer::node::NodeIcon;

// Node icons
pub const NODE_EPIC: &str = "󰮄"; // nf-md-lightning_bolt_outline
pub const NODE_SUBTASK: &str = "󰘍"; // nf-md-subdirectory_arrow_right
pub const NODE_ISSUE: &str = ""; // nf-cod-issue_opened (ticket)
pub const NODE_QUERY: &str = "󰈲"; // nf-md-filter
pub const NODE_LINK: &str = "󰌷"; // nf-md-link
pub const NODE_ADD: &str = "󰐕"; // nf-md-plus
pub const NODE_SEARCH: &str = "󰍉"; // nf-md-magnify
pub const NODE_INFO: &str = "󰋽"; // nf-md-information_outline
pub const NODE_ERROR: &str = "󰅚"; // nf-md-close_circle

// Jira status categories
pub const STATUS_TODO: &str = "○"; // Empty circle
pub const STATUS_IN_PROGRESS: &str = "◑"; // 1/2 filled
pub const STATUS_DONE: &str = "●"; // Full circle
pub const STATUS_UNKNOWN: &str = "◌"; // Dotted circle

// Section indicators
pub const EXPANDED: &str = "▼";
pub const COLLAPSED: &str = "▶";

// Notification
pub const BELL: &str = "󰂚"; // nf-md-bell

pub fn node_icon(icon: NodeIcon) -> &'static str {
    match icon {
        NodeIcon::Epic => NODE_EPIC,
        NodeIcon::Subtask => NODE_SUBTASK,
        NodeIcon::Issue => NODE_ISSUE,
        NodeIcon::Query => NODE_QUERY,
        NodeIcon::Link => NODE_LINK,
        NodeIcon::Add => NODE_ADD,
        NodeIcon::Search => NODE_SEARCH,
        NodeIcon::Info => NODE_INFO,
        NodeIcon::Error => NODE_ERROR,
    }
}
