use ratatui::layout::{Constraint, Direction, Layout, Rect};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Helper function to calculate centered popup position
pub fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

/// Box of a fixed size hanging below `anchor`, kept inside `bounds`.
pub fn dropdown_rect(anchor: Rect, width: u16, height: u16, bounds: Rect) -> Rect {
    let width = width.min(bounds.width);
    let height = height.min(bounds.height.saturating_sub(1));
    let right_edge = bounds.x.saturating_add(bounds.width);
    let x = anchor
        .x
        .saturating_add(anchor.width)
        .saturating_sub(width)
        .clamp(bounds.x, right_edge.saturating_sub(width));
    let y = anchor.y.saturating_add(anchor.height);
    Rect {
        x,
        y,
        width,
        height,
    }
}

/// Cuts `text` to at most `max_width` display columns, ending with an ellipsis.
pub fn truncate_to_width(text: &str, max_width: usize) -> String {
    if UnicodeWidthStr::width(text) <= max_width {
        return text.to_string();
    }
    if max_width == 0 {
        return String::new();
    }

    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let w = UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + w + 1 > max_width {
            break;
        }
        used += w;
        out.push(ch);
    }
    out.push('…');
    out
}

/// Wraps task text for a matrix cell, keeping at most `max_lines` lines.
pub fn wrap_cell(text: &str, width: usize, max_lines: usize) -> Vec<String> {
    if width == 0 || max_lines == 0 {
        return Vec::new();
    }
    let mut lines: Vec<String> = textwrap::wrap(text, width)
        .into_iter()
        .map(|line| line.into_owned())
        .collect();
    if lines.len() > max_lines {
        lines.truncate(max_lines);
        if let Some(last) = lines.last_mut() {
            let shortened = truncate_to_width(last, width.saturating_sub(1));
            *last = if shortened.ends_with('…') {
                shortened
            } else {
                format!("{shortened}…")
            };
        }
    }
    lines
}

/// Horizontal offset for the slide-in of a view transition.
pub fn slide_offset(width: u16, progress: f64) -> u16 {
    let remaining = (1.0 - progress.clamp(0.0, 1.0)) * (width as f64) / 4.0;
    remaining.round() as u16
}
