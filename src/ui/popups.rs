use super::components::{centered_rect, dropdown_rect, truncate_to_width};
use crate::app::{App, MenuItem};
use crate::ui::theme::ThemeTokens;
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
};

pub fn render_help_popup(f: &mut Frame, app: &App, tokens: &ThemeTokens) {
    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(tokens.ui_border_default));
    let area = centered_rect(80, 80, f.area());
    f.render_widget(Clear, area);
    f.render_widget(block, area);

    let inner_area = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .margin(2)
        .split(area);

    let content_area = inner_area[0];
    let sections = help_sections(app);
    let column_count = if content_area.width >= 70 { 2 } else { 1 };
    let column_areas = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(vec![
            Constraint::Ratio(1, column_count as u32);
            column_count
        ])
        .split(content_area);

    let per_column = sections.len().div_ceil(column_count);
    for (idx, area) in column_areas.iter().enumerate() {
        let start = idx * per_column;
        let end = (start + per_column).min(sections.len());
        if start < end {
            render_help_column(f, *area, &sections[start..end], tokens);
        }
    }

    f.render_widget(
        Paragraph::new("Esc / ?: close").style(Style::default().fg(tokens.ui_muted)),
        inner_area[1],
    );
}

struct HelpSection {
    title: &'static str,
    entries: Vec<(&'static str, String)>,
}

fn help_sections(app: &App) -> Vec<HelpSection> {
    let kb = &app.config.keybindings;
    vec![
        HelpSection {
            title: "Global",
            entries: vec![
                ("Write a task", fmt_keys(&kb.global.compose)),
                ("Add task", fmt_keys(&kb.global.add)),
                ("Sync", fmt_keys(&kb.global.sync)),
                ("Magic sort", fmt_keys(&kb.global.magic_sort)),
                ("List / Matrix", fmt_keys(&kb.global.toggle_view)),
                ("User menu", fmt_keys(&kb.global.user_menu)),
                ("Help", fmt_keys(&kb.global.help)),
                ("Quit", fmt_keys(&kb.global.quit)),
            ],
        },
        HelpSection {
            title: "Tasks",
            entries: vec![
                ("Up / Down", join_pair(&kb.tasks.up, &kb.tasks.down)),
                ("Left / Right", join_pair(&kb.tasks.left, &kb.tasks.right)),
                ("Toggle done", fmt_keys(&kb.tasks.toggle)),
                ("Edit", fmt_keys(&kb.tasks.edit)),
                ("Delete", fmt_keys(&kb.tasks.delete)),
            ],
        },
        HelpSection {
            title: "Composer",
            entries: vec![
                ("Submit", fmt_keys(&kb.composer.submit)),
                ("Leave", fmt_keys(&kb.composer.cancel)),
                ("Clear", fmt_keys(&kb.composer.clear)),
            ],
        },
        HelpSection {
            title: "Inline edit",
            entries: vec![
                ("Save", fmt_keys(&kb.inline_edit.commit)),
                ("Revert", fmt_keys(&kb.inline_edit.cancel)),
            ],
        },
    ]
}

fn render_help_column(f: &mut Frame, area: Rect, sections: &[HelpSection], tokens: &ThemeTokens) {
    let header_style = Style::default()
        .fg(tokens.ui_accent)
        .add_modifier(Modifier::BOLD);
    let key_style = Style::default()
        .fg(tokens.ui_accent)
        .add_modifier(Modifier::BOLD);

    let key_width = sections
        .iter()
        .flat_map(|section| section.entries.iter())
        .map(|(_, keys)| keys.chars().count())
        .max()
        .unwrap_or(0)
        .clamp(6, 24);

    let mut lines: Vec<Line<'static>> = Vec::new();
    for (idx, section) in sections.iter().enumerate() {
        if idx > 0 {
            lines.push(Line::from(""));
        }
        lines.push(Line::from(Span::styled(section.title, header_style)));
        for (label, keys) in &section.entries {
            lines.push(Line::from(vec![
                Span::styled(format!("  {keys:<key_width$}  "), key_style),
                Span::raw(*label),
            ]));
        }
    }

    f.render_widget(Paragraph::new(lines), area);
}

pub fn render_delete_task_popup(f: &mut Frame, app: &App) {
    let Some(task) = app.delete_target.as_deref().and_then(|id| app.board.get(id)) else {
        return;
    };

    let block = Block::default()
        .title(" Delete this task? ")
        .borders(Borders::ALL)
        .style(Style::default().fg(Color::LightRed));
    let area = centered_rect(50, 20, f.area());
    f.render_widget(Clear, area);
    f.render_widget(block, area);

    let text_area = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(70), Constraint::Percentage(30)])
        .margin(2)
        .split(area);

    let width = text_area[0].width as usize;
    let body = Paragraph::new(truncate_to_width(&task.content, width.saturating_mul(2)))
        .style(Style::default().add_modifier(Modifier::BOLD))
        .wrap(Wrap { trim: true });

    let help_text =
        Paragraph::new("Enter/y: delete  Esc/n: cancel").style(Style::default().fg(Color::DarkGray));

    f.render_widget(body, text_area[0]);
    f.render_widget(help_text, text_area[1]);
}

/// Dropdown under the avatar. Records its own hit areas.
pub fn render_user_menu(f: &mut Frame, app: &mut App, tokens: &ThemeTokens) {
    let Some(anchor) = app.hit_areas.avatar else {
        return;
    };

    let items = MenuItem::all();
    let email = app.config.user.email.trim().to_string();
    let header_rows: u16 = if email.is_empty() { 0 } else { 1 };
    let height = items.len() as u16 + header_rows + 2;
    let area = dropdown_rect(anchor, 24, height, f.area());
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(tokens.ui_border_active));
    let inner = block.inner(area);
    f.render_widget(Clear, area);
    f.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(header_rows), Constraint::Min(0)])
        .split(inner);
    if header_rows > 0 {
        let label = truncate_to_width(&email, chunks[0].width as usize);
        f.render_widget(
            Paragraph::new(label).style(Style::default().fg(tokens.ui_muted)),
            chunks[0],
        );
    }

    let list_area = chunks[1];
    let mut item_rects = Vec::with_capacity(items.len());
    let list_items: Vec<ListItem> = items
        .iter()
        .enumerate()
        .map(|(row, item)| {
            let rect = Rect {
                x: list_area.x,
                y: list_area.y.saturating_add(row as u16),
                width: list_area.width,
                height: 1,
            };
            if rect.y < list_area.y.saturating_add(list_area.height) {
                item_rects.push((rect, *item));
            }
            ListItem::new(item.label())
        })
        .collect();

    let list = List::new(list_items)
        .highlight_symbol("> ")
        .highlight_style(
            Style::default()
                .bg(tokens.ui_highlight)
                .add_modifier(Modifier::BOLD),
        );
    f.render_stateful_widget(list, list_area, &mut app.menu.state);

    app.hit_areas.menu = Some(area);
    app.hit_areas.menu_items = item_rects;
}

fn fmt_keys(keys: &[String]) -> String {
    if keys.is_empty() {
        return "-".to_string();
    }
    keys.join(" / ")
}

fn join_pair(first: &[String], second: &[String]) -> String {
    match (first.first(), second.first()) {
        (Some(a), Some(b)) => format!("{a} / {b}"),
        _ => "-".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ScriptedGateway, test_app};

    #[test]
    fn help_lists_configured_keys() {
        let (mut app, _) = test_app(ScriptedGateway::default());
        app.config.keybindings.global.magic_sort = vec!["ctrl+s".to_string()];
        let sections = help_sections(&app);

        let global = sections
            .iter()
            .find(|section| section.title == "Global")
            .expect("global section");
        assert!(
            global
                .entries
                .iter()
                .any(|(label, keys)| *label == "Magic sort" && keys == "ctrl+s")
        );
    }

    #[test]
    fn fmt_keys_marks_unbound_actions() {
        assert_eq!(fmt_keys(&[]), "-");
        assert_eq!(
            fmt_keys(&["k".to_string(), "up".to_string()]),
            "k / up"
        );
        assert_eq!(join_pair(&["k".to_string()], &[]), "-");
    }
}
