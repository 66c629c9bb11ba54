pub(crate) mod editing;
pub(crate) mod mouse;
pub(crate) mod navigate;
pub(crate) mod popups;

use crate::{app::App, models::InputMode};
use crossterm::event::{Event, KeyEventKind};

pub fn handle_event(app: &mut App, event: Event) {
    match event {
        Event::Mouse(mouse_event) => mouse::handle_mouse(app, mouse_event),
        Event::Key(key) if key.kind == KeyEventKind::Press => {
            if popups::handle_popup_events(app, key) {
                return;
            }
            match app.input_mode {
                InputMode::Navigate => navigate::handle_normal_mode(app, key),
                InputMode::Composing => editing::handle_composer(app, key),
                InputMode::InlineEdit => editing::handle_inline_edit(app, key),
            }
        }
        _ => {}
    }
}
