use crate::{
    app::{App, InlineEdit, MenuItem},
    models::InputMode,
    runtime::dispatch::{Control, Request},
};
use tracing::debug;
use tui_textarea::{CursorMove, TextArea};

/// Shared by the Enter key and the Add button.
pub fn submit_new_task(app: &mut App) {
    let text = app.composer_text();
    let content = text.trim();
    if content.is_empty() {
        return;
    }
    if app.busy.is_busy(&Control::AddTask) {
        return;
    }
    app.dispatch(Request::Create {
        content: content.to_string(),
    });
}

pub fn focus_composer(app: &mut App) {
    app.transition_to(InputMode::Composing);
}

pub fn toggle_selected(app: &mut App) {
    let Some(task) = app.selected_task().cloned() else {
        app.toast("No task selected.");
        return;
    };
    app.dispatch(Request::Update {
        id: task.id,
        content: task.content,
        completed: !task.completed,
    });
}

pub fn begin_inline_edit(app: &mut App) {
    let Some(task) = app.selected_task().cloned() else {
        app.toast("No task selected.");
        return;
    };
    let mut textarea = TextArea::from(vec![task.content.clone()]);
    textarea.move_cursor(CursorMove::End);
    app.inline_edit = Some(InlineEdit {
        task_id: task.id,
        original: task.content,
        textarea,
    });
    app.transition_to(InputMode::InlineEdit);
}

/// Focus left the inline field. Blank or unchanged text is not submitted.
pub fn commit_inline_edit(app: &mut App) {
    let Some(edit) = app.inline_edit.take() else {
        app.transition_to(InputMode::Navigate);
        return;
    };
    app.transition_to(InputMode::Navigate);

    let text = edit.textarea.lines().join(" ");
    let content = text.trim();
    if content.is_empty() {
        debug!(id = %edit.task_id, "blank edit reverted");
        return;
    }
    if content == edit.original {
        return;
    }
    let Some(task) = app.board.get(&edit.task_id).cloned() else {
        return;
    };
    app.dispatch(Request::Update {
        id: task.id,
        content: content.to_string(),
        completed: task.completed,
    });
}

pub fn cancel_inline_edit(app: &mut App) {
    app.inline_edit = None;
    app.transition_to(InputMode::Navigate);
}

pub fn request_delete_selected(app: &mut App) {
    let Some(id) = app.selected.clone() else {
        app.toast("No task selected.");
        return;
    };
    if app.config.ui.confirm_delete {
        app.delete_target = Some(id);
    } else {
        delete_task(app, id);
    }
}

pub fn confirm_delete(app: &mut App) {
    if let Some(id) = app.delete_target.take() {
        delete_task(app, id);
    }
}

pub fn delete_task(app: &mut App, id: String) {
    app.dispatch(Request::Delete { id });
}

pub fn sync_tasks(app: &mut App) {
    if app.dispatch(Request::Sync) {
        app.toast("Syncing tasks...");
    } else {
        app.toast("Sync already running.");
    }
}

pub fn magic_sort(app: &mut App) {
    if app.dispatch(Request::Sort) {
        app.toast("Sorting tasks...");
    } else {
        app.toast("Magic sort already running.");
    }
}

pub fn toggle_view(app: &mut App) {
    match app.view.toggle() {
        Ok(mode) => {
            debug!(mode = mode.label(), "view switched");
            app.ensure_selection();
        }
        Err(err) => app.toast(err.to_string()),
    }
}

pub fn activate_menu_item(app: &mut App, item: MenuItem) {
    app.close_menu();
    match item {
        MenuItem::Sync => sync_tasks(app),
        MenuItem::Logout => {
            if app.dispatch(Request::Logout) {
                app.toast("Logging out...");
            }
        }
    }
}

pub fn activate_selected_menu_item(app: &mut App) {
    let index = app.menu.state.selected().unwrap_or(0);
    if let Some(item) = MenuItem::all().get(index).copied() {
        activate_menu_item(app, item);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integrations::backend::GatewayError;
    use crate::models::{Quadrant, Task};
    use crate::runtime;
    use crate::testing::{ScriptedGateway, test_app};
    use crate::view::ViewMode;

    fn type_into_composer(app: &mut App, text: &str) {
        focus_composer(app);
        app.composer.insert_str(text);
        app.composer_dirty = true;
    }

    #[test]
    fn create_renders_exactly_one_unchecked_row() {
        let (mut app, gateway) = test_app(ScriptedGateway::default());
        type_into_composer(&mut app, "Buy milk");

        submit_new_task(&mut app);
        runtime::tick(&mut app);

        assert_eq!(
            gateway.calls(),
            vec![Request::Create {
                content: "Buy milk".to_string()
            }]
        );
        let rows: Vec<&Task> = app
            .board
            .tasks()
            .iter()
            .filter(|t| t.content == "Buy milk")
            .collect();
        assert_eq!(rows.len(), 1);
        assert!(!rows[0].completed);
        assert_eq!(app.composer_text(), "");
        assert_eq!(app.input_mode, InputMode::Navigate);
        assert!(!app.busy.any());
    }

    #[test]
    fn blank_input_issues_no_request() {
        for input in ["", "   ", "\t \t"] {
            let (mut app, gateway) = test_app(ScriptedGateway::default());
            type_into_composer(&mut app, input);

            submit_new_task(&mut app);
            runtime::tick(&mut app);

            assert!(gateway.calls().is_empty());
            assert!(app.board.is_empty());
            assert!(app.toast_message.is_none());
            assert_eq!(app.input_mode, InputMode::Composing);
        }
    }

    #[test]
    fn failed_create_keeps_input_and_reports() {
        let (mut app, gateway) = test_app(ScriptedGateway::default());
        gateway.fail_next(GatewayError::Application("Task content is required".to_string()));
        type_into_composer(&mut app, "Buy milk");

        submit_new_task(&mut app);
        runtime::tick(&mut app);

        assert!(app.board.is_empty());
        assert_eq!(app.composer_text(), "Buy milk");
        assert_eq!(app.toast_message.as_deref(), Some("Task content is required"));
        assert!(!app.busy.is_busy(&Control::AddTask));
    }

    #[test]
    fn toggle_sends_unchanged_content_and_updates_in_place() {
        let (mut app, gateway) = test_app(ScriptedGateway::default());
        app.board
            .replace_all(vec![Task::new("a", "Read"), Task::new("b", "Write")]);
        app.select(Some("b".to_string()));

        toggle_selected(&mut app);
        runtime::tick(&mut app);

        assert_eq!(
            gateway.calls(),
            vec![Request::Update {
                id: "b".to_string(),
                content: "Write".to_string(),
                completed: true,
            }]
        );
        assert!(app.board.get("b").expect("b").completed);
        assert_eq!(app.board.position("b"), Some(1));
        assert_eq!(app.selected.as_deref(), Some("b"));
    }

    #[test]
    fn blank_inline_edit_reverts_without_request() {
        let (mut app, gateway) = test_app(ScriptedGateway::default());
        app.board.replace_all(vec![Task::new("a", "Read")]);
        app.select(Some("a".to_string()));

        begin_inline_edit(&mut app);
        if let Some(edit) = app.inline_edit.as_mut() {
            edit.textarea = TextArea::from(vec!["   ".to_string()]);
        }
        commit_inline_edit(&mut app);
        runtime::tick(&mut app);

        assert!(gateway.calls().is_empty());
        assert_eq!(app.board.get("a").expect("a").content, "Read");
        assert_eq!(app.input_mode, InputMode::Navigate);
    }

    #[test]
    fn inline_edit_commits_new_text() {
        let (mut app, gateway) = test_app(ScriptedGateway::default());
        let mut task = Task::new("a", "Read");
        task.completed = true;
        app.board.replace_all(vec![task]);
        app.select(Some("a".to_string()));

        begin_inline_edit(&mut app);
        if let Some(edit) = app.inline_edit.as_mut() {
            edit.textarea.insert_str(" book");
        }
        commit_inline_edit(&mut app);
        runtime::tick(&mut app);

        assert_eq!(
            gateway.calls(),
            vec![Request::Update {
                id: "a".to_string(),
                content: "Read book".to_string(),
                completed: true,
            }]
        );
        assert_eq!(app.board.get("a").expect("a").content, "Read book");
    }

    #[test]
    fn unchanged_inline_edit_is_not_sent() {
        let (mut app, gateway) = test_app(ScriptedGateway::default());
        app.board.replace_all(vec![Task::new("a", "Read")]);
        app.select(Some("a".to_string()));

        begin_inline_edit(&mut app);
        commit_inline_edit(&mut app);

        assert!(gateway.calls().is_empty());
    }

    #[test]
    fn delete_removes_row_after_confirmation() {
        let (mut app, gateway) = test_app(ScriptedGateway::default());
        app.board
            .replace_all(vec![Task::new("a", "Read"), Task::new("b", "Write")]);
        app.select(Some("a".to_string()));

        request_delete_selected(&mut app);
        assert_eq!(app.delete_target.as_deref(), Some("a"));
        assert!(gateway.calls().is_empty());

        confirm_delete(&mut app);
        runtime::tick(&mut app);

        assert_eq!(gateway.calls(), vec![Request::Delete { id: "a".to_string() }]);
        assert!(app.board.get("a").is_none());
        assert_eq!(app.selected.as_deref(), Some("b"));
    }

    #[test]
    fn failed_delete_leaves_board_untouched() {
        let (mut app, gateway) = test_app(ScriptedGateway::default());
        app.board.replace_all(vec![Task::new("a", "Read")]);
        gateway.fail_next(GatewayError::Transport("HTTP 502".to_string()));

        delete_task(&mut app, "a".to_string());
        runtime::tick(&mut app);

        assert_eq!(app.board.len(), 1);
        assert_eq!(app.toast_message.as_deref(), Some("Network error: HTTP 502"));
        assert!(!app.busy.is_task_busy("a"));
    }

    #[test]
    fn matrix_is_locked_until_sort_succeeds() {
        let sorted = vec![Task::new("a", "Read").in_quadrant(Quadrant::Q2)];
        let (mut app, gateway) = test_app(ScriptedGateway::with_sort(sorted));

        toggle_view(&mut app);
        assert_eq!(app.view.mode(), ViewMode::List);
        assert!(app.toast_message.is_some());

        gateway.fail_next(GatewayError::Application("No tasks to sort".to_string()));
        magic_sort(&mut app);
        runtime::tick(&mut app);
        toggle_view(&mut app);
        assert_eq!(app.view.mode(), ViewMode::List);

        magic_sort(&mut app);
        runtime::tick(&mut app);
        toggle_view(&mut app);
        assert_eq!(app.view.mode(), ViewMode::Matrix);
        assert_eq!(app.selected.as_deref(), Some("a"));
    }

    #[test]
    fn matrix_toggle_uses_same_task_id() {
        let sorted = vec![
            Task::new("a", "Read").in_quadrant(Quadrant::Q3),
            Task::new("b", "Write"),
        ];
        let (mut app, gateway) = test_app(ScriptedGateway::with_sort(sorted));
        magic_sort(&mut app);
        runtime::tick(&mut app);
        toggle_view(&mut app);

        toggle_selected(&mut app);
        runtime::tick(&mut app);

        assert_eq!(
            gateway.calls().last(),
            Some(&Request::Update {
                id: "a".to_string(),
                content: "Read".to_string(),
                completed: true,
            })
        );
        assert!(app.board.get("a").expect("a").completed);
        assert_eq!(app.board.len(), 2);
    }

    #[test]
    fn sync_replaces_rendered_list() {
        let remote = vec![Task::new("A", "alpha"), Task::new("B", "beta")];
        let (mut app, _) = test_app(ScriptedGateway::with_sync(remote));
        app.board
            .replace_all(vec![Task::new("old", "stale"), Task::new("A", "outdated")]);
        app.select(Some("old".to_string()));

        sync_tasks(&mut app);
        runtime::tick(&mut app);

        let ids: Vec<&str> = app.board.tasks().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["A", "B"]);
        assert_eq!(app.board.get("A").expect("A").content, "alpha");
        assert_eq!(app.selected.as_deref(), Some("A"));
        assert!(app.last_synced.is_some());
    }

    #[test]
    fn logout_menu_item_quits_after_response() {
        let (mut app, gateway) = test_app(ScriptedGateway::default());
        app.toggle_menu();
        activate_menu_item(&mut app, MenuItem::Logout);
        assert!(!app.menu.open);

        runtime::tick(&mut app);
        assert_eq!(gateway.calls(), vec![Request::Logout]);
        assert!(app.should_quit);
    }
}
