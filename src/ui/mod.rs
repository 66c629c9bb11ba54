use chrono::Local;
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph},
};
use unicode_width::UnicodeWidthStr;

use crate::app::App;
use crate::models::{InputMode, Quadrant, Task, ToastKind};
use crate::runtime::dispatch::Control;
use crate::view::ViewMode;

pub mod components;
pub mod popups;
pub mod theme;

use components::{slide_offset, truncate_to_width, wrap_cell};
use popups::{render_delete_task_popup, render_help_popup, render_user_menu};
use theme::ThemeTokens;

const APP_TITLE: &str = " Task Matrix ";
const ADD_BUTTON_WIDTH: u16 = 9;
const CHECKBOX_WIDTH: u16 = 4;
const MATRIX_CELL_LINES: usize = 2;

pub fn ui(f: &mut Frame, app: &mut App) {
    let tokens = ThemeTokens::from_theme(&app.config.theme);
    app.hit_areas.clear();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(f.area());

    render_header(f, chunks[0], app, &tokens);
    render_composer(f, chunks[1], app, &tokens);
    render_tasks(f, chunks[2], app, &tokens);
    render_status_bar(f, chunks[3], app, &tokens);

    if app.menu.open {
        render_user_menu(f, app, &tokens);
    }

    if app.delete_target.is_some() {
        render_delete_task_popup(f, app);
    }

    if app.show_help_popup {
        render_help_popup(f, app, &tokens);
    }
}

fn loading_spinner() -> &'static str {
    const FRAMES: [&str; 4] = ["-", "\\", "|", "/"];
    let idx = (Local::now().timestamp_subsec_millis() / 250) as usize % FRAMES.len();
    FRAMES[idx]
}

/// Lays spans left to right and returns the rect each one landed on.
struct HeaderCursor {
    area: Rect,
    x: u16,
    spans: Vec<Span<'static>>,
}

impl HeaderCursor {
    fn new(area: Rect) -> Self {
        Self {
            area,
            x: area.x,
            spans: Vec::new(),
        }
    }

    fn push(&mut self, text: String, style: Style) -> Option<Rect> {
        let width = UnicodeWidthStr::width(text.as_str()) as u16;
        let right = self.area.x.saturating_add(self.area.width);
        if width == 0 || self.x.saturating_add(width) > right {
            return None;
        }
        let rect = Rect::new(self.x, self.area.y, width, 1);
        self.x = self.x.saturating_add(width);
        self.spans.push(Span::styled(text, style));
        Some(rect)
    }

    fn gap(&mut self) {
        self.push(" ".to_string(), Style::default());
    }
}

fn render_header(f: &mut Frame, area: Rect, app: &mut App, tokens: &ThemeTokens) {
    if area.width == 0 || area.height == 0 {
        return;
    }

    let avatar_text = format!(
        " ({}) {} ▾ ",
        app.config.user.initial(),
        truncate_to_width(app.config.user.display_name(), 16)
    );
    let avatar_width = (UnicodeWidthStr::width(avatar_text.as_str()) as u16).min(area.width);
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(0), Constraint::Length(avatar_width)])
        .split(area);

    let accent = Style::default()
        .fg(tokens.ui_accent)
        .add_modifier(Modifier::BOLD);
    let muted = Style::default().fg(tokens.ui_muted);
    let mut cursor = HeaderCursor::new(chunks[0]);

    cursor.push(APP_TITLE.to_string(), accent);
    cursor.gap();

    let mode = app.view.mode();
    let matrix_style = if !app.view.matrix_available() {
        muted.add_modifier(Modifier::DIM)
    } else if mode == ViewMode::Matrix {
        accent.add_modifier(Modifier::REVERSED)
    } else {
        Style::default()
    };
    let list_style = if mode == ViewMode::List {
        accent.add_modifier(Modifier::REVERSED)
    } else {
        Style::default()
    };
    let toggle_start = cursor.push("[".to_string(), muted);
    cursor.push(format!(" {} ", ViewMode::List.label()), list_style);
    cursor.push("|".to_string(), muted);
    cursor.push(format!(" {} ", ViewMode::Matrix.label()), matrix_style);
    let toggle_end = cursor.push("]".to_string(), muted);
    if let (Some(start), Some(end)) = (toggle_start, toggle_end) {
        app.hit_areas.view_toggle = Some(Rect::new(start.x, start.y, end.x + end.width - start.x, 1));
    }
    cursor.gap();

    let sorting = app.busy.is_busy(&Control::MagicSort);
    let sort_label = if sorting {
        format!("[{} Sorting…]", loading_spinner())
    } else {
        "[Magic sort]".to_string()
    };
    app.hit_areas.sort_button = cursor.push(sort_label, if sorting { muted } else { accent });
    cursor.gap();

    let syncing = app.busy.is_busy(&Control::Sync);
    let sync_label = if syncing {
        format!("[{} Syncing…]", loading_spinner())
    } else {
        "[Sync]".to_string()
    };
    app.hit_areas.sync_button = cursor.push(sync_label, if syncing { muted } else { accent });

    f.render_widget(Paragraph::new(Line::from(cursor.spans)), chunks[0]);

    let avatar_style = if app.menu.open {
        accent.add_modifier(Modifier::REVERSED)
    } else if app.busy.is_busy(&Control::Logout) {
        muted
    } else {
        accent
    };
    f.render_widget(
        Paragraph::new(avatar_text)
            .style(avatar_style)
            .alignment(Alignment::Right),
        chunks[1],
    );
    app.hit_areas.avatar = Some(chunks[1]);
}

fn render_composer(f: &mut Frame, area: Rect, app: &mut App, tokens: &ThemeTokens) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(10), Constraint::Length(ADD_BUTTON_WIDTH)])
        .split(area);

    let focused = app.input_mode == InputMode::Composing;
    let border_color = if focused {
        tokens.ui_accent
    } else if app.composer_dirty {
        tokens.ui_border_active
    } else {
        tokens.ui_border_default
    };
    let title_style = if focused {
        Style::default()
            .fg(tokens.ui_accent)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(tokens.ui_muted)
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(Span::styled(" New task ", title_style));
    app.composer.set_block(block);
    app.composer.set_cursor_line_style(Style::default());
    app.composer
        .set_placeholder_style(Style::default().fg(tokens.ui_muted));
    app.composer.set_cursor_style(if focused {
        Style::default().add_modifier(Modifier::REVERSED)
    } else {
        Style::default()
    });
    f.render_widget(&app.composer, chunks[0]);
    app.hit_areas.composer = Some(chunks[0]);

    let adding = app.busy.is_busy(&Control::AddTask);
    let (label, style) = if adding {
        (format!("{} …", loading_spinner()), Style::default().fg(tokens.ui_muted))
    } else if app.composer_dirty {
        (
            "Add".to_string(),
            Style::default()
                .fg(tokens.ui_border_active)
                .add_modifier(Modifier::BOLD),
        )
    } else {
        ("Add".to_string(), Style::default().fg(tokens.ui_muted))
    };
    let button = Paragraph::new(label)
        .style(style)
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(style),
        );
    f.render_widget(button, chunks[1]);
    app.hit_areas.add_button = Some(chunks[1]);
}

fn render_tasks(f: &mut Frame, area: Rect, app: &mut App, tokens: &ThemeTokens) {
    let mode = app.view.mode();
    let total = app.board.len();
    let open = app.board.open_count();
    let title = truncate_to_width(
        &format!(" Tasks · {} ({open} open / {total}) ", mode.label()),
        area.width.saturating_sub(4) as usize,
    );
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(tokens.ui_border_default))
        .title(Span::styled(title, Style::default().fg(tokens.ui_muted)));
    let mut inner = block.inner(area);
    f.render_widget(block, area);
    if inner.width == 0 || inner.height == 0 {
        return;
    }

    let mut base = Style::default();
    if let Some(transition) = app.view.transition() {
        let offset = slide_offset(inner.width, transition.progress(Local::now()));
        inner.x = inner.x.saturating_add(offset);
        inner.width = inner.width.saturating_sub(offset);
        base = base.add_modifier(Modifier::DIM);
    }

    match mode {
        ViewMode::List => render_list(f, inner, app, tokens, base),
        ViewMode::Matrix => render_matrix(f, inner, app, tokens, base),
    }
}

fn task_style(task: &Task, tokens: &ThemeTokens, base: Style) -> Style {
    if task.completed {
        base.fg(tokens.task_done).add_modifier(Modifier::CROSSED_OUT)
    } else {
        base.fg(tokens.task_open)
    }
}

fn checkbox(task: &Task) -> &'static str {
    if task.completed { "[x] " } else { "[ ] " }
}

fn pending_marker(app: &App, task: &Task) -> Option<String> {
    app.busy
        .is_task_busy(&task.id)
        .then(|| format!(" {}", loading_spinner()))
}

fn score_label(task: &Task) -> Option<String> {
    match (task.urgency, task.importance) {
        (None, None) => None,
        (urgency, importance) => Some(format!(
            " U{} I{}",
            urgency.map_or("-".to_string(), |v| v.to_string()),
            importance.map_or("-".to_string(), |v| v.to_string())
        )),
    }
}

fn render_list(f: &mut Frame, area: Rect, app: &mut App, tokens: &ThemeTokens, base: Style) {
    if app.board.is_empty() {
        let hint = Paragraph::new("No tasks yet. Press i to write one.")
            .style(base.fg(tokens.ui_muted))
            .alignment(Alignment::Center);
        f.render_widget(hint, area);
        return;
    }

    let text_width = area.width.saturating_sub(CHECKBOX_WIDTH) as usize;
    let muted = base.fg(tokens.ui_muted);
    let items: Vec<ListItem> = app
        .board
        .tasks()
        .iter()
        .map(|task| {
            let mut spans = vec![Span::styled(checkbox(task), base.fg(tokens.ui_accent))];
            let mut suffix = String::new();
            if let Some(quadrant) = task.quadrant {
                suffix.push(' ');
                suffix.push_str(quadrant.code());
            }
            if let Some(marker) = pending_marker(app, task) {
                suffix.push_str(&marker);
            }
            let suffix_width = UnicodeWidthStr::width(suffix.as_str());
            let content = truncate_to_width(&task.content, text_width.saturating_sub(suffix_width));
            spans.push(Span::styled(content, task_style(task, tokens, base)));
            spans.push(Span::styled(suffix, muted));
            ListItem::new(Line::from(spans))
        })
        .collect();

    let list = List::new(items).highlight_style(
        Style::default()
            .bg(tokens.ui_highlight)
            .add_modifier(Modifier::BOLD),
    );
    f.render_stateful_widget(list, area, &mut app.list_state);

    let offset = app.list_state.offset();
    let visible = area.height as usize;
    for (row, task) in app.board.tasks().iter().enumerate().skip(offset).take(visible) {
        let rect = Rect::new(area.x, area.y + (row - offset) as u16, area.width, 1);
        app.hit_areas.task_rows.push((rect, task.id.clone()));
    }

    render_inline_editor(f, app);
}

fn render_matrix(f: &mut Frame, area: Rect, app: &mut App, tokens: &ThemeTokens, base: Style) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Ratio(1, 2), Constraint::Ratio(1, 2)])
        .split(area);
    let mut cells = Vec::with_capacity(4);
    for row in rows.iter() {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Ratio(1, 2), Constraint::Ratio(1, 2)])
            .split(*row);
        cells.extend(columns.iter().copied());
    }

    for (quadrant, cell) in Quadrant::all().into_iter().zip(cells) {
        render_quadrant(f, cell, quadrant, app, tokens, base);
    }

    render_inline_editor(f, app);
}

fn render_quadrant(
    f: &mut Frame,
    area: Rect,
    quadrant: Quadrant,
    app: &mut App,
    tokens: &ThemeTokens,
    base: Style,
) {
    let color = tokens.quadrant(quadrant);
    let focused = app.selected_quadrant() == Some(quadrant);
    let bucket = app.board.bucket(quadrant);
    let title = truncate_to_width(
        &format!(" {} · {} ({}) ", quadrant.code(), quadrant.label(), bucket.len()),
        area.width.saturating_sub(2) as usize,
    );
    let mut title_style = base.fg(color).add_modifier(Modifier::BOLD);
    if focused {
        title_style = title_style.add_modifier(Modifier::REVERSED);
    }
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(base.fg(color))
        .title(Span::styled(title, title_style));
    let inner = block.inner(area);
    f.render_widget(block, area);
    if inner.width == 0 || inner.height == 0 {
        return;
    }

    let text_width = inner.width.saturating_sub(CHECKBOX_WIDTH) as usize;
    let cells: Vec<(String, Vec<String>)> = bucket
        .iter()
        .map(|task| (task.id.clone(), wrap_cell(&task.content, text_width, MATRIX_CELL_LINES)))
        .collect();

    // Scroll so the selected task stays inside the cell.
    let selected_idx = app
        .selected
        .as_deref()
        .and_then(|id| cells.iter().position(|(task_id, _)| task_id == id));
    let mut start = 0;
    if let Some(selected_idx) = selected_idx {
        let height_through = |from: usize| -> usize {
            cells[from..=selected_idx]
                .iter()
                .map(|(_, lines)| lines.len().max(1))
                .sum()
        };
        while start < selected_idx && height_through(start) > inner.height as usize {
            start += 1;
        }
    }

    let muted = base.fg(tokens.ui_muted);
    let highlight = Style::default()
        .bg(tokens.ui_highlight)
        .add_modifier(Modifier::BOLD);
    let mut y = inner.y;
    let bottom = inner.y.saturating_add(inner.height);
    let mut rows = Vec::new();
    for (task, (id, wrapped)) in bucket.iter().zip(cells.iter()).skip(start) {
        if y >= bottom {
            break;
        }
        let height = (wrapped.len().max(1) as u16).min(bottom - y);
        let rect = Rect::new(inner.x, y, inner.width, height);
        let selected = app.selected.as_deref() == Some(id.as_str());

        let mut lines = Vec::with_capacity(wrapped.len().max(1));
        for (idx, text) in wrapped.iter().enumerate() {
            let prefix = if idx == 0 { checkbox(task) } else { "    " };
            lines.push(Line::from(vec![
                Span::styled(prefix, base.fg(color)),
                Span::styled(text.clone(), task_style(task, tokens, base)),
            ]));
        }
        let mut extras = String::new();
        if let Some(score) = score_label(task) {
            extras.push_str(&score);
        }
        if let Some(marker) = pending_marker(app, task) {
            extras.push_str(&marker);
        }
        if let Some(last) = lines.last_mut() {
            let used = last.width();
            if used + UnicodeWidthStr::width(extras.as_str()) <= inner.width as usize {
                last.spans.push(Span::styled(extras, muted));
            }
        }

        let mut paragraph = Paragraph::new(lines);
        if selected {
            paragraph = paragraph.style(highlight);
        }
        f.render_widget(paragraph, rect);
        rows.push((rect, id.clone()));
        y = y.saturating_add(height);
    }
    app.hit_areas.task_rows.extend(rows);
}

/// Draws the inline editor over the row of the task being edited.
fn render_inline_editor(f: &mut Frame, app: &mut App) {
    let Some(edit) = app.inline_edit.as_mut() else {
        return;
    };
    let Some(row) = app
        .hit_areas
        .task_rows
        .iter()
        .find(|(_, id)| *id == edit.task_id)
        .map(|(rect, _)| *rect)
    else {
        return;
    };

    let rect = Rect {
        x: row.x.saturating_add(CHECKBOX_WIDTH),
        y: row.y,
        width: row.width.saturating_sub(CHECKBOX_WIDTH),
        height: 1,
    };
    edit.textarea.set_cursor_line_style(Style::default());
    edit.textarea
        .set_cursor_style(Style::default().add_modifier(Modifier::REVERSED));
    f.render_widget(Clear, rect);
    f.render_widget(&edit.textarea, rect);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App, tokens: &ThemeTokens) {
    if area.height == 0 || area.width == 0 {
        return;
    }

    let mode_label = match app.input_mode {
        InputMode::Navigate => "NAV",
        InputMode::Composing => "COMPOSE",
        InputMode::InlineEdit => "EDIT",
    };

    let mut summary = format!(
        "{} · Open {} · Done {}",
        app.view.mode().label(),
        app.board.open_count(),
        app.board.len() - app.board.open_count()
    );
    if app.view.mode() == ViewMode::Matrix {
        let hidden = app.board.tasks().iter().filter(|t| t.quadrant.is_none()).count();
        if hidden > 0 {
            summary.push_str(&format!(" · {hidden} unsorted hidden"));
        }
    }
    if app.busy.any() {
        summary.push_str(&format!(" · {} working", loading_spinner()));
    } else if let Some(synced) = app.last_synced {
        summary.push_str(&format!(" · Synced {}", synced.format("%H:%M")));
    }

    let left_spans = vec![
        Span::styled(
            format!(" {mode_label} "),
            Style::default()
                .fg(tokens.ui_accent)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
        Span::styled(summary, Style::default().fg(tokens.ui_muted)),
    ];

    let toast = app
        .toast_message
        .as_deref()
        .filter(|message| !message.is_empty());
    let Some(message) = toast else {
        f.render_widget(Paragraph::new(Line::from(left_spans)), area);
        return;
    };

    let color = match app.toast_kind {
        ToastKind::Info => tokens.toast_info,
        ToastKind::Success => tokens.toast_success,
        ToastKind::Error => tokens.toast_error,
    };
    let min_left_width = 10u16;
    let max_right = area.width.saturating_sub(min_left_width);
    let message = truncate_to_width(message, max_right.saturating_sub(1) as usize);
    let right_width = (UnicodeWidthStr::width(message.as_str()) as u16 + 1).min(max_right);

    let status_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(0), Constraint::Length(right_width)])
        .split(area);

    f.render_widget(Paragraph::new(Line::from(left_spans)), status_chunks[0]);
    let right = Paragraph::new(Span::styled(
        message,
        Style::default().fg(color).add_modifier(Modifier::BOLD),
    ))
    .alignment(Alignment::Right);
    f.render_widget(right, status_chunks[1]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions;
    use crate::testing::{ScriptedGateway, test_app};
    use ratatui::{Terminal, backend::TestBackend, buffer::Buffer};

    fn draw(app: &mut App) -> Buffer {
        let backend = TestBackend::new(80, 24);
        let mut terminal = Terminal::new(backend).expect("terminal");
        terminal.draw(|f| ui(f, app)).expect("draw");
        terminal.backend().buffer().clone()
    }

    fn buffer_text(buffer: &Buffer) -> String {
        let area = buffer.area;
        let mut out = String::new();
        for y in 0..area.height {
            for x in 0..area.width {
                out.push_str(buffer[(x, y)].symbol());
            }
            out.push('\n');
        }
        out
    }

    fn sample_app() -> App<'static> {
        let (mut app, _) = test_app(ScriptedGateway::default());
        app.board.replace_all(vec![
            Task::new("a", "Pay rent").in_quadrant(Quadrant::Q1),
            Task::new("b", "Plan trip").in_quadrant(Quadrant::Q2),
            Task::new("c", "Inbox zero"),
        ]);
        app.ensure_selection();
        app
    }

    #[test]
    fn list_view_records_rows_and_buttons() {
        let mut app = sample_app();
        let text = buffer_text(&draw(&mut app));

        assert!(text.contains("Task Matrix"));
        assert!(text.contains("[ ] Pay rent"));
        assert!(text.contains("Inbox zero"));
        assert_eq!(app.hit_areas.task_rows.len(), 3);
        assert!(app.hit_areas.add_button.is_some());
        assert!(app.hit_areas.composer.is_some());
        assert!(app.hit_areas.sort_button.is_some());
        assert!(app.hit_areas.sync_button.is_some());
        assert!(app.hit_areas.view_toggle.is_some());
        assert!(app.hit_areas.avatar.is_some());
    }

    #[test]
    fn matrix_view_omits_unsorted_tasks() {
        let mut app = sample_app();
        app.view.mark_sorted();
        actions::toggle_view(&mut app);
        let text = buffer_text(&draw(&mut app));

        assert!(text.contains("Q1"));
        assert!(text.contains("Pay rent"));
        assert!(text.contains("Plan trip"));
        assert!(!text.contains("Inbox zero"));
        let ids: Vec<&str> = app
            .hit_areas
            .task_rows
            .iter()
            .map(|(_, id)| id.as_str())
            .collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn clicking_recorded_row_selects_task() {
        let mut app = sample_app();
        draw(&mut app);
        let (rect, id) = app.hit_areas.task_rows[2].clone();
        assert_eq!(app.hit_areas.task_at(rect.x + 1, rect.y), Some(id.as_str()));
    }

    #[test]
    fn open_menu_records_items() {
        let mut app = sample_app();
        app.toggle_menu();
        let text = buffer_text(&draw(&mut app));

        assert!(text.contains("Log out"));
        assert_eq!(app.hit_areas.menu_items.len(), 2);
        assert!(app.hit_areas.menu.is_some());
    }

    #[test]
    fn toast_is_drawn_in_status_bar() {
        let mut app = sample_app();
        app.toast_error("Network error: offline");
        let text = buffer_text(&draw(&mut app));
        assert!(text.contains("Network error: offline"));
    }
}
