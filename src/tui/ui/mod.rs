//! TUI rendering module.
//!
//! - `icons` - Nerd Font icons used throughout the UI
//! - `layout` - Text width utilities
//! - `status` - Status category styles and status bar rendering
//! - `tree` - Header, explorer tree and search result rendering

pub mod icons;
pub mod layout;
mod status;
mod tree;

// Re-export the main draw function
pub use self::draw::draw;

mod draw {

    use super::status::draw_status_bar;
    use super::tree::{draw_header, draw_search_results, draw_tree};
    use crate::tui::App;
    use ratatui::{
        layout::{Constraint, Direction, Layout},
        Frame,
    };

    /// Main draw function - renders the entire TUI.
    pub fn draw(f: &mut Frame, app: &App) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Header/search
                Constraint::Min(0),    // Main content
                Constraint::Length(1), // Status bar
            ])
            .split(f.area());

        draw_header(f, app, chunks[0]);
        if app.search_mode {
            draw_search_results(f, app, chunks[1]);
        } else {
            draw_tree(f, app, chunks[1]);
        }
        draw_status_bar(f, app, chunks[2]);
    }
}
