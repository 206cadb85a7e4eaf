//! Text width utilities for the TUI.

use ratatui::text::{Line, Span};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Columns of indentation per tree level.
pub const INDENT_WIDTH: usize = 2;

/// Calculate the display width of text (accounting for Unicode).
pub fn display_width(text: &str) -> usize {
    UnicodeWidthStr::width(text)
}

/// Truncate text to a maximum display width.
pub fn truncate_to_width(text: &str, max_width: usize) -> String {
    if max_width == 0 {
        return String::new();
    }
    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let ch_width = UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + ch_width > max_width {
            break;
        }
        out.push(ch);
        used += ch_width;
    }
    out
}

/// Truncate text with an ellipsis if it exceeds max width.
pub fn truncate_with_ellipsis(text: &str, max_width: usize) -> String {
    if max_width == 0 {
        return String::new();
    }
    if display_width(text) <= max_width {
        return text.to_string();
    }
    if max_width == 1 {
        return "…".to_string();
    }
    let truncated = truncate_to_width(text, max_width.saturating_sub(1));
    format!("{truncated}…")
}

/// Fit a Line to a maximum width, ending the last visible span with an ellipsis.
pub fn fit_line_to_width<'a>(line: Line<'a>, max_width: usize) -> Line<'a> {
    if max_width == 0 {
        return Line::from(Vec::<Span>::new());
    }

    let Line {
        spans,
        alignment,
        style,
    } = line;
    let mut out: Vec<Span<'a>> = Vec::new();
    let mut used = 0usize;

    for span in spans {
        if used >= max_width {
            break;
        }
        let content = span.content.as_ref();
        let span_width = display_width(content);
        if used + span_width <= max_width {
            used += span_width;
            out.push(span);
        } else {
            let remaining = max_width.saturating_sub(used);
            let truncated = truncate_with_ellipsis(content, remaining);
            if !truncated.is_empty() {
                out.push(Span::styled(truncated, span.style));
            }
            break;
        }
    }

    Line {
        spans: out,
        alignment,
        style,
    }
}

/// Leading whitespace for a row at `depth`.
pub fn indent(depth: usize) -> String {
    " ".repeat(depth * INDENT_WIDTH)
}
