use crate::board::TaskBoard;
use crate::config::Config;
use crate::models::{Direction, InputMode, Quadrant, Task, ToastKind};
use crate::runtime::dispatch::{
    BusyControls, Control, Dispatcher, PendingRequest, Request, RequestLedger,
};
use crate::view::{ViewController, ViewMode};
use chrono::{DateTime, Duration, Local};
use ratatui::layout::{Position, Rect};
use ratatui::widgets::ListState;
use tracing::debug;
use tui_textarea::TextArea;

const PLACEHOLDER_COMPOSE: &str = "Add a new task… (Enter to add, Esc to leave)";
const PLACEHOLDER_IDLE: &str = "Press i to write a task";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MenuItem {
    Sync,
    Logout,
}

impl MenuItem {
    pub fn all() -> [MenuItem; 2] {
        [MenuItem::Sync, MenuItem::Logout]
    }

    pub fn label(&self) -> &'static str {
        match self {
            MenuItem::Sync => "Sync tasks",
            MenuItem::Logout => "Log out",
        }
    }
}

pub struct UserMenu {
    pub open: bool,
    pub state: ListState,
}

/// In-place editor for one task's text. `original` is the last known-good value.
pub struct InlineEdit<'a> {
    pub task_id: String,
    pub original: String,
    pub textarea: TextArea<'a>,
}

/// Screen regions recorded during the last draw, used for mouse hit testing.
#[derive(Default, Debug, Clone)]
pub struct HitAreas {
    pub add_button: Option<Rect>,
    pub composer: Option<Rect>,
    pub avatar: Option<Rect>,
    pub menu: Option<Rect>,
    pub menu_items: Vec<(Rect, MenuItem)>,
    pub view_toggle: Option<Rect>,
    pub sort_button: Option<Rect>,
    pub sync_button: Option<Rect>,
    pub task_rows: Vec<(Rect, String)>,
}

fn contains(area: Option<Rect>, column: u16, row: u16) -> bool {
    area.is_some_and(|rect| rect.contains(Position::new(column, row)))
}

impl HitAreas {
    pub fn clear(&mut self) {
        *self = HitAreas::default();
    }

    pub fn hits_add_button(&self, column: u16, row: u16) -> bool {
        contains(self.add_button, column, row)
    }

    pub fn hits_composer(&self, column: u16, row: u16) -> bool {
        contains(self.composer, column, row)
    }

    pub fn hits_avatar(&self, column: u16, row: u16) -> bool {
        contains(self.avatar, column, row)
    }

    pub fn hits_menu(&self, column: u16, row: u16) -> bool {
        contains(self.menu, column, row)
    }

    pub fn hits_view_toggle(&self, column: u16, row: u16) -> bool {
        contains(self.view_toggle, column, row)
    }

    pub fn hits_sort_button(&self, column: u16, row: u16) -> bool {
        contains(self.sort_button, column, row)
    }

    pub fn hits_sync_button(&self, column: u16, row: u16) -> bool {
        contains(self.sync_button, column, row)
    }

    pub fn menu_item_at(&self, column: u16, row: u16) -> Option<MenuItem> {
        self.menu_items
            .iter()
            .find(|(rect, _)| rect.contains(Position::new(column, row)))
            .map(|(_, item)| *item)
    }

    pub fn task_at(&self, column: u16, row: u16) -> Option<&str> {
        self.task_rows
            .iter()
            .find(|(rect, _)| rect.contains(Position::new(column, row)))
            .map(|(_, id)| id.as_str())
    }
}

pub struct App<'a> {
    pub config: Config,
    pub input_mode: InputMode,
    pub composer: TextArea<'a>,
    /// Drives the "has content" styling of the input area.
    pub composer_dirty: bool,
    pub inline_edit: Option<InlineEdit<'a>>,
    pub board: TaskBoard,
    pub view: ViewController,
    pub selected: Option<String>,
    pub list_state: ListState,
    pub menu: UserMenu,
    pub show_help_popup: bool,
    pub delete_target: Option<String>,
    pub busy: BusyControls,
    pub ledger: RequestLedger,
    pub pending: Vec<PendingRequest>,
    pub dispatcher: Dispatcher,
    pub toast_message: Option<String>,
    pub toast_kind: ToastKind,
    pub toast_expiry: Option<DateTime<Local>>,
    pub last_synced: Option<DateTime<Local>>,
    pub hit_areas: HitAreas,
    pub should_quit: bool,
}

impl<'a> App<'a> {
    pub fn new(config: Config, dispatcher: Dispatcher) -> App<'a> {
        let mut composer = TextArea::default();
        composer.set_placeholder_text(PLACEHOLDER_IDLE);
        let view = ViewController::new(config.ui.transition_ms);

        App {
            config,
            input_mode: InputMode::Navigate,
            composer,
            composer_dirty: false,
            inline_edit: None,
            board: TaskBoard::default(),
            view,
            selected: None,
            list_state: ListState::default(),
            menu: UserMenu {
                open: false,
                state: ListState::default(),
            },
            show_help_popup: false,
            delete_target: None,
            busy: BusyControls::default(),
            ledger: RequestLedger::default(),
            pending: Vec::new(),
            dispatcher,
            toast_message: None,
            toast_kind: ToastKind::Info,
            toast_expiry: None,
            last_synced: None,
            hit_areas: HitAreas::default(),
            should_quit: false,
        }
    }

    pub fn toast(&mut self, message: impl Into<String>) {
        self.toast_with(ToastKind::Info, message);
    }

    pub fn toast_error(&mut self, message: impl Into<String>) {
        self.toast_with(ToastKind::Error, message);
    }

    pub fn toast_success(&mut self, message: impl Into<String>) {
        self.toast_with(ToastKind::Success, message);
    }

    fn toast_with(&mut self, kind: ToastKind, message: impl Into<String>) {
        let seconds = self.config.ui.toast_seconds.max(1) as i64;
        self.toast_message = Some(message.into());
        self.toast_kind = kind;
        self.toast_expiry = Some(Local::now() + Duration::seconds(seconds));
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    pub fn transition_to(&mut self, mode: InputMode) {
        match mode {
            InputMode::Navigate => {
                self.composer.set_placeholder_text(PLACEHOLDER_IDLE);
                self.inline_edit = None;
            }
            InputMode::Composing => {
                self.composer.set_placeholder_text(PLACEHOLDER_COMPOSE);
                self.menu.open = false;
            }
            InputMode::InlineEdit => {
                self.menu.open = false;
            }
        }
        self.input_mode = mode;
    }

    pub fn composer_text(&self) -> String {
        self.composer.lines().join(" ")
    }

    /// Clears the task entry field, drops focus and the "has content" state.
    pub fn reset_input_area(&mut self) {
        self.composer = TextArea::default();
        self.composer_dirty = false;
        if self.input_mode == InputMode::Composing {
            self.transition_to(InputMode::Navigate);
        } else {
            self.composer.set_placeholder_text(PLACEHOLDER_IDLE);
        }
    }

    pub fn toggle_menu(&mut self) {
        self.menu.open = !self.menu.open;
        if self.menu.open {
            self.menu.state.select(Some(0));
        }
    }

    pub fn close_menu(&mut self) {
        self.menu.open = false;
    }

    pub fn selected_task(&self) -> Option<&Task> {
        self.selected.as_deref().and_then(|id| self.board.get(id))
    }

    pub fn select(&mut self, id: Option<String>) {
        self.selected = id;
        self.sync_list_state();
    }

    /// Ids in the order the active view shows them.
    pub fn visible_ids(&self) -> Vec<String> {
        match self.view.mode() {
            ViewMode::List => self.board.tasks().iter().map(|t| t.id.clone()).collect(),
            ViewMode::Matrix => self
                .board
                .quadrant_buckets()
                .iter()
                .flat_map(|bucket| bucket.iter().map(|t| t.id.clone()))
                .collect(),
        }
    }

    /// Keeps the selection on a visible task after the board or view changed.
    pub fn ensure_selection(&mut self) {
        let visible = self.visible_ids();
        let still_visible = self
            .selected
            .as_ref()
            .is_some_and(|id| visible.iter().any(|v| v == id));
        if !still_visible {
            self.selected = visible.first().cloned();
        }
        self.sync_list_state();
    }

    /// Selects the neighbour of a task that is about to disappear.
    pub fn select_neighbour_of(&mut self, id: &str) {
        if self.selected.as_deref() != Some(id) {
            return;
        }
        let visible = self.visible_ids();
        if let Some(i) = visible.iter().position(|v| v == id) {
            let next = visible
                .get(i + 1)
                .or_else(|| i.checked_sub(1).and_then(|p| visible.get(p)))
                .cloned();
            self.selected = next;
        }
    }

    pub fn move_selection(&mut self, direction: Direction) {
        match self.view.mode() {
            ViewMode::List => self.move_in_list(direction),
            ViewMode::Matrix => self.move_in_matrix(direction),
        }
        self.sync_list_state();
    }

    fn move_in_list(&mut self, direction: Direction) {
        let ids = self.visible_ids();
        if ids.is_empty() {
            return;
        }
        let current = self
            .selected
            .as_ref()
            .and_then(|id| ids.iter().position(|v| v == id));
        let next = match (current, direction) {
            (None, _) => 0,
            (Some(i), Direction::Up) => i.saturating_sub(1),
            (Some(i), Direction::Down) => (i + 1).min(ids.len() - 1),
            (Some(i), _) => i,
        };
        self.selected = ids.get(next).cloned();
    }

    fn move_in_matrix(&mut self, direction: Direction) {
        let buckets = self.board.quadrant_buckets();
        let located = self.selected_task().and_then(|task| {
            let quadrant = task.quadrant?;
            let row = buckets[quadrant.index()]
                .iter()
                .position(|t| t.id == task.id)?;
            Some((quadrant, row))
        });

        let Some((quadrant, row)) = located else {
            self.selected = buckets
                .iter()
                .find_map(|bucket| bucket.first().map(|t| t.id.clone()));
            return;
        };

        let bucket = &buckets[quadrant.index()];
        let within = match direction {
            Direction::Up if row > 0 => Some(row - 1),
            Direction::Down if row + 1 < bucket.len() => Some(row + 1),
            _ => None,
        };
        if let Some(next_row) = within {
            self.selected = Some(bucket[next_row].id.clone());
            return;
        }

        let next_quadrant = quadrant.neighbour(direction);
        if next_quadrant == quadrant {
            return;
        }
        // Leaving a quadrant upwards lands on the last row of the one above.
        let next_row = match direction {
            Direction::Up => usize::MAX,
            Direction::Down => 0,
            Direction::Left | Direction::Right => row,
        };

        let next_bucket = &buckets[next_quadrant.index()];
        if next_bucket.is_empty() {
            return;
        }
        let row = next_row.min(next_bucket.len() - 1);
        self.selected = Some(next_bucket[row].id.clone());
    }

    pub fn selected_quadrant(&self) -> Option<Quadrant> {
        self.selected_task().and_then(|task| task.quadrant)
    }

    fn sync_list_state(&mut self) {
        let index = self.selected.as_deref().and_then(|id| self.board.position(id));
        self.list_state.select(index);
    }

    /// Issues a gateway request, marking its control busy until it completes.
    /// Returns false when the control is already busy and refuses overlap.
    pub fn dispatch(&mut self, request: Request) -> bool {
        let control = request.control();
        let exclusive = !matches!(control, Control::Task(_));
        if exclusive && self.busy.is_busy(&control) {
            debug!(?control, "control busy, request dropped");
            return false;
        }

        let token = request.fenced_id().map(|id| self.ledger.issue(id));
        self.busy.mark(control);
        let pending = self.dispatcher.spawn(request, token);
        self.pending.push(pending);
        true
    }
}
