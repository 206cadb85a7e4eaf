//! jql-explorer - Jira saved-query issue tree explorer
//!
//! This library crate exposes internal modules for integration testing.

pub mod config;
pub mod data;
pub mod explorer;
pub mod jira;
pub mod monitor;
pub mod tui;
