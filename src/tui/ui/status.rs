//! Status configuration and status bar rendering.

use super::icons;
use crate::data::StatusCategory;
use crate::tui::App;
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

/// Unified status configuration - single source of truth for icon and style.
pub struct StatusConfig {
    pub icon: &'static str,
    pub style: Style,
}

pub fn status_category_config(category: StatusCategory) -> StatusConfig {
    match category {
        StatusCategory::ToDo => StatusConfig {
            icon: icons::STATUS_TODO,
            style: Style::default().fg(Color::Cyan),
        },
        StatusCategory::InProgress => StatusConfig {
            icon: icons::STATUS_IN_PROGRESS,
            style: Style::default().fg(Color::Yellow),
        },
        StatusCategory::Done => StatusConfig {
            icon: icons::STATUS_DONE,
            style: Style::default().fg(Color::Green),
        },
        StatusCategory::Unknown => StatusConfig {
            icon: icons::STATUS_UNKNOWN,
            style: Style::default().fg(Color::DarkGray),
        },
    }
}

/// Draw the status bar at the bottom of the screen.
pub fn draw_status_bar(f: &mut Frame, app: &App, area: Rect) {
    let width = area.width as usize;

    let status = if let Some(err) = &app.error_message {
        Span::styled(format!(" {} ", err), Style::default().fg(Color::Red))
    } else if let Some(notification) = &app.notification {
        let text = if width >= 60 {
            format!(
                " {} {} | n: {} | x: dismiss ",
                icons::BELL,
                notification.message,
                notification.action.label()
            )
        } else {
            format!(" {} {} ", icons::BELL, notification.message)
        };
        Span::styled(
            text,
            Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
        )
    } else if app.search_mode {
        let text = if width >= 55 {
            " Type to search | ↑/↓: navigate | Enter: open | Esc: exit "
        } else if width >= 35 {
            " ↑/↓:nav Enter:open Esc:exit "
        } else {
            " Search "
        };
        Span::styled(text, Style::default().fg(Color::Yellow))
    } else {
        let text = if width >= 90 {
            " j/k: nav | l/h: expand/collapse | o/Enter: open | /: search | r: refresh | q: quit "
        } else if width >= 65 {
            " j/k:nav l/h:fold o:open /:search r:refresh q:quit "
        } else if width >= 40 {
            " j/k l/h o / r q "
        } else {
            " q quit "
        };
        Span::styled(text, Style::default().fg(Color::DarkGray))
    };

    let paragraph = Paragraph::new(Line::from(status));
    f.render_widget(paragraph, area);
}
