//! Input dispatch layer for Elm Architecture (TEA) pattern.
//!
//! Maps key events to messages based on current app mode.
//! Handles the `gg` chord with a non-blocking state machine.

use super::{App, Message};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::time::Instant;

/// Pending first key of a chord and when it was pressed.
#[derive(Debug, Default)]
pub struct InputState {
    pub pending: Option<KeyCode>,
    pub pending_since: Option<Instant>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if there's a pending chord that has timed out (500ms).
    pub fn has_timed_out(&self) -> bool {
        self.pending_since
            .is_some_and(|since| since.elapsed().as_millis() > 500)
    }

    pub fn clear(&mut self) {
        self.pending = None;
        self.pending_since = None;
    }

    pub fn set_pending(&mut self, key: KeyCode) {
        self.pending = Some(key);
        self.pending_since = Some(Instant::now());
    }
}

/// Map a key event to a message for the current mode.
pub fn dispatch(app: &App, input: &mut InputState, key: KeyEvent) -> Message {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Message::Quit;
    }

    if let Some(pending) = input.pending.take() {
        input.pending_since = None;
        if pending == KeyCode::Char('g') && key.code == KeyCode::Char('g') {
            return Message::GotoTop;
        }
    }

    if app.search_mode {
        dispatch_search_mode(key)
    } else {
        dispatch_normal_mode(input, key)
    }
}

fn dispatch_search_mode(key: KeyEvent) -> Message {
    match key.code {
        KeyCode::Esc => Message::ExitSearch,
        KeyCode::Enter => Message::Activate,
        KeyCode::Up => Message::MoveUp,
        KeyCode::Down => Message::MoveDown,
        KeyCode::Backspace => Message::SearchBackspace,
        KeyCode::Char(c) => Message::SearchInput(c),
        _ => Message::None,
    }
}

fn dispatch_normal_mode(input: &mut InputState, key: KeyEvent) -> Message {
    match key.code {
        KeyCode::Char('q') => Message::Quit,
        KeyCode::Char('r') => Message::Refresh,
        KeyCode::Char('j') | KeyCode::Down => Message::MoveDown,
        KeyCode::Char('k') | KeyCode::Up => Message::MoveUp,
        KeyCode::Char('g') => {
            input.set_pending(KeyCode::Char('g'));
            Message::None
        }
        KeyCode::Char('G') | KeyCode::End => Message::GotoBottom,
        KeyCode::Home => Message::GotoTop,
        KeyCode::PageDown => Message::PageDown,
        KeyCode::PageUp => Message::PageUp,
        KeyCode::Char('l') | KeyCode::Right => Message::Expand,
        KeyCode::Char('h') | KeyCode::Left => Message::Collapse,
        KeyCode::Char('o') | KeyCode::Enter => Message::Activate,
        KeyCode::Char('/') => Message::EnterSearch,
        KeyCode::Char('n') => Message::OpenNotification,
        KeyCode::Char('x') | KeyCode::Esc => Message::DismissNotification,
        _ => Message::None,
    }
}
