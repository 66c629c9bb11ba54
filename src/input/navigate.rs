use crate::{
    actions,
    app::App,
    config::key_match,
    models::Direction,
};
use crossterm::event::KeyEvent;

pub fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    let global = &app.config.keybindings.global;
    let tasks = &app.config.keybindings.tasks;

    if key_match(&key, &global.quit) {
        app.quit();
    } else if key_match(&key, &global.help) {
        app.show_help_popup = true;
    } else if key_match(&key, &global.user_menu) {
        app.toggle_menu();
    } else if key_match(&key, &global.compose) {
        actions::focus_composer(app);
    } else if key_match(&key, &global.add) {
        // Same as pressing the Add button: submits whatever the field holds.
        if app.composer_text().trim().is_empty() {
            actions::focus_composer(app);
        } else {
            actions::submit_new_task(app);
        }
    } else if key_match(&key, &global.sync) {
        actions::sync_tasks(app);
    } else if key_match(&key, &global.magic_sort) {
        actions::magic_sort(app);
    } else if key_match(&key, &global.toggle_view) {
        actions::toggle_view(app);
    } else if key_match(&key, &tasks.up) {
        app.move_selection(Direction::Up);
    } else if key_match(&key, &tasks.down) {
        app.move_selection(Direction::Down);
    } else if key_match(&key, &tasks.left) {
        app.move_selection(Direction::Left);
    } else if key_match(&key, &tasks.right) {
        app.move_selection(Direction::Right);
    } else if key_match(&key, &tasks.toggle) {
        actions::toggle_selected(app);
    } else if key_match(&key, &tasks.edit) {
        actions::begin_inline_edit(app);
    } else if key_match(&key, &tasks.delete) {
        actions::request_delete_selected(app);
    }
}
