//! Message enum for Elm Architecture (TEA) pattern.
//!
//! All user actions are represented as messages, dispatched from key events
//! and processed by `App::update()`.

#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    // ─────────────────────────────────────────────────────────────────────────
    // App lifecycle
    // ─────────────────────────────────────────────────────────────────────────
    /// Quit the application
    Quit,
    /// Re-run every saved query in the background
    Refresh,

    // ─────────────────────────────────────────────────────────────────────────
    // Navigation
    // ─────────────────────────────────────────────────────────────────────────
    MoveUp,
    MoveDown,
    GotoTop,
    GotoBottom,
    PageUp,
    PageDown,

    // ─────────────────────────────────────────────────────────────────────────
    // Tree actions
    // ─────────────────────────────────────────────────────────────────────────
    /// Expand the selected node
    Expand,
    /// Collapse the selected node, or jump to its parent
    Collapse,
    /// Run the selected node's command, or toggle it
    Activate,

    // ─────────────────────────────────────────────────────────────────────────
    // Search mode
    // ─────────────────────────────────────────────────────────────────────────
    EnterSearch,
    ExitSearch,
    SearchInput(char),
    SearchBackspace,

    // ─────────────────────────────────────────────────────────────────────────
    // Notifications
    // ─────────────────────────────────────────────────────────────────────────
    /// Perform the latest notification's action
    OpenNotification,
    DismissNotification,

    /// Key with no binding in the current mode
    None,
}
