use crate::integrations::backend::{GatewayError, TaskGateway};
use crate::models::Task;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;
use tracing::debug;

/// One gateway call, captured with its arguments so it can run on a worker.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Request {
    Create { content: String },
    Update { id: String, content: String, completed: bool },
    Delete { id: String },
    Sync,
    Sort,
    Logout,
}

impl Request {
    /// Id whose completions are fenced by the ledger. Only updates race each
    /// other; a confirmed delete is final and always applies.
    pub fn fenced_id(&self) -> Option<&str> {
        match self {
            Request::Update { id, .. } => Some(id.as_str()),
            _ => None,
        }
    }

    pub fn control(&self) -> Control {
        match self {
            Request::Create { .. } => Control::AddTask,
            Request::Update { id, .. } | Request::Delete { id } => Control::Task(id.clone()),
            Request::Sync => Control::Sync,
            Request::Sort => Control::MagicSort,
            Request::Logout => Control::Logout,
        }
    }

    fn run(&self, gateway: &dyn TaskGateway) -> Result<Reply, GatewayError> {
        match self {
            Request::Create { content } => gateway.create_task(content).map(Reply::Created),
            Request::Update {
                id,
                content,
                completed,
            } => gateway
                .update_task(id, content, *completed)
                .map(Reply::Updated),
            Request::Delete { id } => gateway.delete_task(id).map(|_| Reply::Deleted(id.clone())),
            Request::Sync => gateway.sync_tasks().map(Reply::Synced),
            Request::Sort => gateway.sort_tasks().map(Reply::Sorted),
            Request::Logout => gateway.logout().map(|_| Reply::LoggedOut),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Reply {
    Created(Task),
    Updated(Task),
    Deleted(String),
    Synced(Vec<Task>),
    Sorted(Vec<Task>),
    LoggedOut,
}

/// An affordance that is disabled while its request is in flight.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Control {
    AddTask,
    Sync,
    MagicSort,
    Logout,
    Task(String),
}

#[derive(Default, Debug)]
pub struct BusyControls {
    in_flight: HashMap<Control, usize>,
}

impl BusyControls {
    pub fn mark(&mut self, control: Control) {
        *self.in_flight.entry(control).or_insert(0) += 1;
    }

    pub fn release(&mut self, control: &Control) {
        if let Some(count) = self.in_flight.get_mut(control) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                self.in_flight.remove(control);
            }
        }
    }

    pub fn is_busy(&self, control: &Control) -> bool {
        self.in_flight.contains_key(control)
    }

    pub fn is_task_busy(&self, id: &str) -> bool {
        self.in_flight.contains_key(&Control::Task(id.to_string()))
    }

    pub fn any(&self) -> bool {
        !self.in_flight.is_empty()
    }
}

/// Hands out monotonic tokens per task id; only the latest token may apply.
#[derive(Default, Debug)]
pub struct RequestLedger {
    next: u64,
    latest: HashMap<String, u64>,
}

impl RequestLedger {
    pub fn issue(&mut self, id: &str) -> u64 {
        self.next += 1;
        self.latest.insert(id.to_string(), self.next);
        self.next
    }

    pub fn is_current(&self, id: &str, token: u64) -> bool {
        self.latest.get(id).copied() == Some(token)
    }

    pub fn forget(&mut self, id: &str, token: u64) {
        if self.is_current(id, token) {
            self.latest.remove(id);
        }
    }
}

pub struct Completion {
    pub request: Request,
    pub token: Option<u64>,
    pub result: Result<Reply, GatewayError>,
}

pub struct PendingRequest {
    pub request: Request,
    pub token: Option<u64>,
    receiver: Receiver<Result<Reply, GatewayError>>,
}

pub enum Poll {
    Ready(Completion),
    Waiting,
    /// The worker went away without answering.
    Lost(Request, Option<u64>),
}

impl PendingRequest {
    pub fn poll(&self) -> Poll {
        match self.receiver.try_recv() {
            Ok(result) => Poll::Ready(Completion {
                request: self.request.clone(),
                token: self.token,
                result,
            }),
            Err(TryRecvError::Empty) => Poll::Waiting,
            Err(TryRecvError::Disconnected) => Poll::Lost(self.request.clone(), self.token),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Execution {
    /// One worker thread per request.
    Threaded,
    /// Runs the call before returning; completions still arrive through `tick`.
    Inline,
}

#[derive(Clone)]
pub struct Dispatcher {
    gateway: Arc<dyn TaskGateway>,
    execution: Execution,
}

impl Dispatcher {
    pub fn new(gateway: Arc<dyn TaskGateway>, execution: Execution) -> Self {
        Self { gateway, execution }
    }

    pub fn spawn(&self, request: Request, token: Option<u64>) -> PendingRequest {
        let (sender, receiver) = mpsc::channel();
        debug!(?request, ?token, "dispatching request");
        match self.execution {
            Execution::Threaded => {
                let gateway = Arc::clone(&self.gateway);
                let job = request.clone();
                thread::spawn(move || {
                    let result = job.run(gateway.as_ref());
                    let _ = sender.send(result);
                });
            }
            Execution::Inline => {
                let _ = sender.send(request.run(self.gateway.as_ref()));
            }
        }
        PendingRequest {
            request,
            token,
            receiver,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn busy_controls_count_overlapping_requests() {
        let mut busy = BusyControls::default();
        let row = Control::Task("a".to_string());
        busy.mark(row.clone());
        busy.mark(row.clone());
        busy.release(&row);
        assert!(busy.is_task_busy("a"));
        busy.release(&row);
        assert!(!busy.is_task_busy("a"));
        busy.release(&row);
        assert!(!busy.any());
    }

    #[test]
    fn ledger_only_accepts_latest_token() {
        let mut ledger = RequestLedger::default();
        let first = ledger.issue("a");
        let second = ledger.issue("a");
        let other = ledger.issue("b");

        assert!(!ledger.is_current("a", first));
        assert!(ledger.is_current("a", second));
        assert!(ledger.is_current("b", other));

        ledger.forget("a", first);
        assert!(ledger.is_current("a", second));
        ledger.forget("a", second);
        assert!(!ledger.is_current("a", second));
    }

    #[test]
    fn dropped_worker_reports_lost() {
        let (sender, receiver) = mpsc::channel::<Result<Reply, GatewayError>>();
        drop(sender);
        let pending = PendingRequest {
            request: Request::Sync,
            token: None,
            receiver,
        };
        assert!(matches!(pending.poll(), Poll::Lost(Request::Sync, None)));
    }

    #[test]
    fn requests_map_to_controls() {
        let update = Request::Update {
            id: "a".to_string(),
            content: "x".to_string(),
            completed: true,
        };
        assert_eq!(update.control(), Control::Task("a".to_string()));
        assert_eq!(update.fenced_id(), Some("a"));
        assert_eq!(Request::Sort.control(), Control::MagicSort);
        assert_eq!(Request::Sync.fenced_id(), None);

        let delete = Request::Delete {
            id: "a".to_string(),
        };
        assert_eq!(delete.control(), Control::Task("a".to_string()));
        assert_eq!(delete.fenced_id(), None);
    }
}
