use crate::{
    actions,
    app::{App, MenuItem},
    config::key_match,
};
use crossterm::event::{KeyCode, KeyEvent};

pub fn handle_popup_events(app: &mut App, key: KeyEvent) -> bool {
    if app.show_help_popup {
        if key.code == KeyCode::Esc || key_match(&key, &app.config.keybindings.global.help) {
            app.show_help_popup = false;
        }
        return true;
    }
    if app.delete_target.is_some() {
        handle_delete_popup(app, key);
        return true;
    }
    if app.menu.open {
        handle_user_menu(app, key);
        return true;
    }
    false
}

fn handle_delete_popup(app: &mut App, key: KeyEvent) {
    if key_match(&key, &app.config.keybindings.popup.confirm) {
        actions::confirm_delete(app);
    } else if key_match(&key, &app.config.keybindings.popup.cancel) {
        app.delete_target = None;
    }
}

fn handle_user_menu(app: &mut App, key: KeyEvent) {
    let count = MenuItem::all().len();
    let selected = app.menu.state.selected().unwrap_or(0);

    if key_match(&key, &app.config.keybindings.popup.up) {
        app.menu.state.select(Some(selected.saturating_sub(1)));
    } else if key_match(&key, &app.config.keybindings.popup.down) {
        app.menu.state.select(Some((selected + 1).min(count - 1)));
    } else if key_match(&key, &app.config.keybindings.popup.confirm) {
        actions::activate_selected_menu_item(app);
    } else {
        // Any other key behaves like a click outside the menu.
        app.close_menu();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Task;
    use crate::runtime::{self, dispatch::Request};
    use crate::testing::{ScriptedGateway, test_app};
    use crossterm::event::KeyModifiers;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn delete_popup_cancel_keeps_task() {
        let (mut app, gateway) = test_app(ScriptedGateway::default());
        app.board.replace_all(vec![Task::new("a", "Read")]);
        app.delete_target = Some("a".to_string());

        assert!(handle_popup_events(&mut app, key(KeyCode::Char('n'))));
        assert!(app.delete_target.is_none());
        assert!(gateway.calls().is_empty());
    }

    #[test]
    fn delete_popup_confirm_deletes() {
        let (mut app, gateway) = test_app(ScriptedGateway::default());
        app.board.replace_all(vec![Task::new("a", "Read")]);
        app.delete_target = Some("a".to_string());

        handle_popup_events(&mut app, key(KeyCode::Char('y')));
        runtime::tick(&mut app);
        assert_eq!(gateway.calls(), vec![Request::Delete { id: "a".to_string() }]);
        assert!(app.board.is_empty());
    }

    #[test]
    fn menu_navigates_and_dismisses() {
        let (mut app, gateway) = test_app(ScriptedGateway::default());
        app.toggle_menu();
        handle_popup_events(&mut app, key(KeyCode::Down));
        assert_eq!(app.menu.state.selected(), Some(1));
        handle_popup_events(&mut app, key(KeyCode::Down));
        assert_eq!(app.menu.state.selected(), Some(1));

        handle_popup_events(&mut app, key(KeyCode::Char('z')));
        assert!(!app.menu.open);
        assert!(gateway.calls().is_empty());
        assert!(!handle_popup_events(&mut app, key(KeyCode::Char('z'))));
    }
}
