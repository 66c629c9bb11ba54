use chrono::{DateTime, Duration, Local};
use thiserror::Error;

/// Longer swaps are cut to this many milliseconds.
const MAX_TRANSITION_MS: i64 = 10_000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewMode {
    List,
    Matrix,
}

impl ViewMode {
    pub fn label(&self) -> &'static str {
        match self {
            ViewMode::List => "List",
            ViewMode::Matrix => "Matrix",
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ViewError {
    #[error("Run magic sort first to unlock the matrix view.")]
    SortRequired,
}

#[derive(Clone, Copy, Debug)]
pub struct Transition {
    pub from: ViewMode,
    pub to: ViewMode,
    pub started: DateTime<Local>,
    pub until: DateTime<Local>,
}

impl Transition {
    /// 0.0 at the start of the swap, 1.0 once it is over.
    pub fn progress(&self, now: DateTime<Local>) -> f64 {
        let total = (self.until - self.started).num_milliseconds();
        if total <= 0 {
            return 1.0;
        }
        let elapsed = (now - self.started).num_milliseconds();
        (elapsed as f64 / total as f64).clamp(0.0, 1.0)
    }
}

/// List/Matrix state machine. Matrix stays locked until one sort succeeded.
#[derive(Debug)]
pub struct ViewController {
    mode: ViewMode,
    sorted_once: bool,
    transition: Option<Transition>,
    transition_length: Duration,
}

impl ViewController {
    pub fn new(transition_ms: u64) -> Self {
        Self {
            mode: ViewMode::List,
            sorted_once: false,
            transition: None,
            transition_length: Duration::milliseconds(
                i64::try_from(transition_ms)
                    .unwrap_or(i64::MAX)
                    .min(MAX_TRANSITION_MS),
            ),
        }
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn matrix_available(&self) -> bool {
        self.sorted_once
    }

    pub fn transition(&self) -> Option<Transition> {
        self.transition
    }

    pub fn mark_sorted(&mut self) {
        self.sorted_once = true;
    }

    pub fn enter_matrix(&mut self) -> Result<(), ViewError> {
        if !self.sorted_once {
            return Err(ViewError::SortRequired);
        }
        self.switch_to(ViewMode::Matrix);
        Ok(())
    }

    pub fn exit_matrix(&mut self) {
        self.switch_to(ViewMode::List);
    }

    pub fn toggle(&mut self) -> Result<ViewMode, ViewError> {
        match self.mode {
            ViewMode::List => self.enter_matrix()?,
            ViewMode::Matrix => self.exit_matrix(),
        }
        Ok(self.mode)
    }

    /// Ends an expired transition. Returns true when one finished.
    pub fn settle(&mut self, now: DateTime<Local>) -> bool {
        match self.transition {
            Some(transition) if now >= transition.until => {
                self.transition = None;
                true
            }
            _ => false,
        }
    }

    fn switch_to(&mut self, target: ViewMode) {
        if self.mode == target {
            return;
        }
        let from = self.mode;
        self.mode = target;
        if self.transition_length > Duration::zero() {
            let started = Local::now();
            self.transition = Some(Transition {
                from,
                to: target,
                started,
                until: started + self.transition_length,
            });
        }
    }
}
