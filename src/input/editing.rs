use crate::{actions, app::App, config::key_match, models::InputMode};
use crossterm::event::KeyEvent;
use tui_textarea::TextArea;

pub fn handle_composer(app: &mut App, key: KeyEvent) {
    if key_match(&key, &app.config.keybindings.composer.submit) {
        actions::submit_new_task(app);
        return;
    }

    if key_match(&key, &app.config.keybindings.composer.cancel) {
        // Leaving the field keeps what was typed.
        app.transition_to(InputMode::Navigate);
        return;
    }

    if key_match(&key, &app.config.keybindings.composer.clear) {
        app.composer = TextArea::default();
        app.composer_dirty = false;
        app.transition_to(InputMode::Composing);
        return;
    }

    if app.composer.input(key) {
        app.composer_dirty = !app.composer_text().trim().is_empty();
    }
}

pub fn handle_inline_edit(app: &mut App, key: KeyEvent) {
    if key_match(&key, &app.config.keybindings.inline_edit.commit) {
        actions::commit_inline_edit(app);
        return;
    }

    if key_match(&key, &app.config.keybindings.inline_edit.cancel) {
        actions::cancel_inline_edit(app);
        return;
    }

    if let Some(edit) = app.inline_edit.as_mut() {
        edit.textarea.input(key);
    }
}
