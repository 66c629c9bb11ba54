use crate::app::App;
use crate::config::Config;
use crate::integrations::backend::{GatewayError, TaskGateway};
use crate::models::Task;
use crate::runtime::dispatch::{Dispatcher, Execution, Request};
use std::sync::{Arc, Mutex};

/// In-memory gateway that records every call and answers from fixed data.
#[derive(Default)]
pub struct ScriptedGateway {
    pub calls: Mutex<Vec<Request>>,
    pub synced: Mutex<Vec<Task>>,
    pub sorted: Mutex<Vec<Task>>,
    next_failure: Mutex<Option<GatewayError>>,
    created: Mutex<usize>,
}

impl ScriptedGateway {
    pub fn with_sync(tasks: Vec<Task>) -> Self {
        let gateway = ScriptedGateway::default();
        *gateway.synced.lock().expect("lock") = tasks;
        gateway
    }

    pub fn with_sort(tasks: Vec<Task>) -> Self {
        let gateway = ScriptedGateway::default();
        *gateway.sorted.lock().expect("lock") = tasks;
        gateway
    }

    pub fn fail_next(&self, error: GatewayError) {
        *self.next_failure.lock().expect("lock") = Some(error);
    }

    pub fn calls(&self) -> Vec<Request> {
        self.calls.lock().expect("lock").clone()
    }

    fn record(&self, request: Request) -> Result<(), GatewayError> {
        self.calls.lock().expect("lock").push(request);
        match self.next_failure.lock().expect("lock").take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

impl TaskGateway for ScriptedGateway {
    fn create_task(&self, content: &str) -> Result<Task, GatewayError> {
        self.record(Request::Create {
            content: content.to_string(),
        })?;
        let number = {
            let mut created = self.created.lock().expect("lock");
            *created += 1;
            *created
        };
        Ok(Task::new(format!("t{number}"), content.trim()))
    }

    fn update_task(
        &self,
        id: &str,
        content: &str,
        completed: bool,
    ) -> Result<Task, GatewayError> {
        self.record(Request::Update {
            id: id.to_string(),
            content: content.to_string(),
            completed,
        })?;
        let mut task = Task::new(id, content);
        task.completed = completed;
        Ok(task)
    }

    fn delete_task(&self, id: &str) -> Result<(), GatewayError> {
        self.record(Request::Delete { id: id.to_string() })
    }

    fn sync_tasks(&self) -> Result<Vec<Task>, GatewayError> {
        self.record(Request::Sync)?;
        Ok(self.synced.lock().expect("lock").clone())
    }

    fn sort_tasks(&self) -> Result<Vec<Task>, GatewayError> {
        self.record(Request::Sort)?;
        Ok(self.sorted.lock().expect("lock").clone())
    }

    fn logout(&self) -> Result<(), GatewayError> {
        self.record(Request::Logout)
    }
}

/// App wired to `gateway` with inline dispatch and no view animation.
pub fn test_app(gateway: ScriptedGateway) -> (App<'static>, Arc<ScriptedGateway>) {
    let gateway = Arc::new(gateway);
    let mut config = Config::default();
    config.ui.transition_ms = 0;
    config.server.sync_on_start = false;
    let dispatcher = Dispatcher::new(gateway.clone(), Execution::Inline);
    (App::new(config, dispatcher), gateway)
}
