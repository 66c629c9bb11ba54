use crate::{
    actions,
    app::App,
    models::{Direction, InputMode},
};
use crossterm::event::{MouseButton, MouseEvent, MouseEventKind};

pub fn handle_mouse(app: &mut App, event: MouseEvent) {
    match event.kind {
        MouseEventKind::ScrollUp => app.move_selection(Direction::Up),
        MouseEventKind::ScrollDown => app.move_selection(Direction::Down),
        MouseEventKind::Down(MouseButton::Left) => handle_click(app, event.column, event.row),
        _ => {}
    }
}

fn handle_click(app: &mut App, column: u16, row: u16) {
    if app.menu.open {
        if let Some(item) = app.hit_areas.menu_item_at(column, row) {
            actions::activate_menu_item(app, item);
            return;
        }
        if app.hit_areas.hits_menu(column, row) {
            return;
        }
        // Outside click dismisses the menu. The avatar is handled below.
        if !app.hit_areas.hits_avatar(column, row) {
            app.close_menu();
        }
    }

    if app.delete_target.is_some() || app.show_help_popup {
        return;
    }

    let hits = app.hit_areas.clone();

    if hits.hits_avatar(column, row) {
        app.toggle_menu();
        return;
    }

    if hits.hits_add_button(column, row) {
        if app.input_mode == InputMode::InlineEdit {
            actions::commit_inline_edit(app);
        }
        actions::submit_new_task(app);
        return;
    }

    if hits.hits_composer(column, row) {
        if app.input_mode == InputMode::InlineEdit {
            actions::commit_inline_edit(app);
        }
        actions::focus_composer(app);
        return;
    }

    // Any other click takes focus away from the text fields.
    match app.input_mode {
        InputMode::Composing => app.transition_to(InputMode::Navigate),
        InputMode::InlineEdit => {
            let same_row = app
                .inline_edit
                .as_ref()
                .is_some_and(|edit| hits.task_at(column, row) == Some(edit.task_id.as_str()));
            if same_row {
                return;
            }
            actions::commit_inline_edit(app);
        }
        InputMode::Navigate => {}
    }

    if hits.hits_view_toggle(column, row) {
        actions::toggle_view(app);
    } else if hits.hits_sort_button(column, row) {
        actions::magic_sort(app);
    } else if hits.hits_sync_button(column, row) {
        actions::sync_tasks(app);
    } else if let Some(id) = hits.task_at(column, row) {
        app.select(Some(id.to_string()));
    }
}
