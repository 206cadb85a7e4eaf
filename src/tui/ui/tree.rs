//! Explorer tree and search result rendering.

use super::icons;
use super::layout::{fit_line_to_width, indent};
use super::status::status_category_config;
use crate::explorer::node::{NodeIcon, NodeKind};
use crate::tui::{App, Row};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

pub fn draw_header(f: &mut Frame, app: &App, area: Rect) {
    let border_style = if app.search_mode {
        Style::default().fg(Color::Yellow)
    } else if app.is_loading {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style);

    let inner = block.inner(area);
    f.render_widget(block, area);

    let title = Span::styled(
        "JQL Explorer ",
        Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::BOLD),
    );

    let text = if app.search_mode {
        Line::from(vec![
            Span::styled(
                format!("{} Search: ", icons::NODE_SEARCH),
                Style::default().fg(Color::Yellow),
            ),
            Span::styled(
                &app.search_query,
                Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            ),
        ])
    } else if app.is_loading {
        Line::from(vec![
            title,
            Span::styled(
                format!("{} Loading...", app.spinner_char()),
                Style::default().fg(Color::Cyan),
            ),
        ])
    } else {
        let refreshed = app
            .last_refresh
            .map(|t| {
                format!(
                    " refreshed {}",
                    t.with_timezone(&chrono::Local).format("%H:%M")
                )
            })
            .unwrap_or_default();
        Line::from(vec![
            title,
            Span::styled(
                format!(
                    "[{} queries, {} issues]",
                    app.provider.queries().len(),
                    app.provider.issue_count()
                ),
                Style::default().fg(Color::Green),
            ),
            Span::styled(refreshed, Style::default().fg(Color::DarkGray)),
        ])
    };

    let line = fit_line_to_width(text, inner.width as usize);
    f.render_widget(Paragraph::new(line), inner);
}

pub fn draw_tree(f: &mut Frame, app: &App, area: Rect) {
    let width = area.width as usize;
    let items: Vec<ListItem> = app
        .rows
        .iter()
        .map(|row| ListItem::new(fit_line_to_width(row_line(app, row), width)))
        .collect();

    draw_list(f, items, app.selected, area);
}

fn row_line(app: &App, row: &Row) -> Line<'static> {
    let item = app.provider.get_tree_item(&row.node);

    let fold = if !row.expandable {
        "  ".to_string()
    } else if row.expanded {
        format!("{} ", icons::EXPANDED)
    } else {
        format!("{} ", icons::COLLAPSED)
    };

    let icon_style = match item.icon {
        NodeIcon::Error => Style::default().fg(Color::Red),
        NodeIcon::Epic => Style::default().fg(Color::Magenta),
        NodeIcon::Query => Style::default().fg(Color::Cyan),
        NodeIcon::Add | NodeIcon::Search | NodeIcon::Link => Style::default().fg(Color::Blue),
        _ => Style::default(),
    };

    let mut spans = vec![
        Span::raw(indent(row.depth)),
        Span::styled(fold, Style::default().fg(Color::DarkGray)),
        Span::styled(format!("{} ", icons::node_icon(item.icon)), icon_style),
    ];

    match &row.node.kind {
        NodeKind::Issue(issue) => {
            let status = status_category_config(issue.status_category);
            spans.push(Span::styled(format!("{} ", status.icon), status.style));
            spans.push(Span::styled(
                format!("{} ", issue.key),
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ));
            spans.push(Span::raw(issue.summary.clone()));
        }
        NodeKind::Placeholder(_) => {
            spans.push(Span::styled(item.label, Style::default().fg(Color::DarkGray)));
        }
        NodeKind::Error { .. } => {
            spans.push(Span::styled(item.label, Style::default().fg(Color::Red)));
            if let Some(detail) = item.tooltip {
                spans.push(Span::styled(
                    format!(": {}", detail),
                    Style::default().fg(Color::DarkGray),
                ));
            }
        }
        NodeKind::Query { .. } => {
            spans.push(Span::styled(
                item.label,
                Style::default().add_modifier(Modifier::BOLD),
            ));
        }
        NodeKind::Link { .. } | NodeKind::Header(_) => {
            spans.push(Span::styled(item.label, Style::default().fg(Color::Blue)));
        }
    }

    Line::from(spans)
}

pub fn draw_search_results(f: &mut Frame, app: &App, area: Rect) {
    let width = area.width as usize;
    let index = app.provider.search_index();

    if app.search_hits.is_empty() {
        let text = if app.search_query.is_empty() {
            format!("  Search {} loaded issues", index.len())
        } else {
            "  No matching issues".to_string()
        };
        let line = Line::from(Span::styled(text, Style::default().fg(Color::DarkGray)));
        f.render_widget(Paragraph::new(line), area);
        return;
    }

    let items: Vec<ListItem> = app
        .search_hits
        .iter()
        .filter_map(|hit| index.get(hit.index).map(|issue| (hit, issue)))
        .map(|(hit, issue)| {
            let status = status_category_config(issue.status_category);
            let line = Line::from(vec![
                Span::styled(format!("  {} ", status.icon), status.style),
                Span::styled(
                    format!("{} ", issue.key),
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::raw(issue.summary.clone()),
                Span::styled(
                    format!("  [{}: {}]", hit.matched_field, issue.status),
                    Style::default().fg(Color::DarkGray),
                ),
            ]);
            ListItem::new(fit_line_to_width(line, width))
        })
        .collect();

    draw_list(f, items, app.selected, area);
}

fn draw_list(f: &mut Frame, items: Vec<ListItem>, selected: usize, area: Rect) {
    let list = List::new(items).highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    );
    let mut state = ListState::default();
    state.select(Some(selected));
    f.render_stateful_widget(list, area, &mut state);
}
