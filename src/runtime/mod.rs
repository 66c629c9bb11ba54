pub mod dispatch;

use crate::app::App;
use crate::integrations::backend::GatewayError;
use chrono::Local;
use dispatch::{Completion, Poll, Reply, Request};
use tracing::{info, warn};

pub fn tick(app: &mut App) {
    collect_completions(app);

    let now = Local::now();
    app.view.settle(now);

    if let Some(expiry) = app.toast_expiry
        && now >= expiry
    {
        app.toast_expiry = None;
        app.toast_message = None;
    }
}

fn collect_completions(app: &mut App) {
    let mut finished = Vec::new();
    let mut lost = Vec::new();

    app.pending.retain(|pending| match pending.poll() {
        Poll::Ready(completion) => {
            finished.push(completion);
            false
        }
        Poll::Waiting => true,
        Poll::Lost(request, token) => {
            lost.push((request, token));
            false
        }
    });

    for (request, token) in lost {
        warn!(?request, "request worker exited without a reply");
        release(app, &request, token);
        app.toast_error("Request aborted.");
    }

    for completion in finished {
        apply_completion(app, completion);
    }
}

fn release(app: &mut App, request: &Request, token: Option<u64>) {
    app.busy.release(&request.control());
    if let (Some(id), Some(token)) = (request.fenced_id(), token) {
        app.ledger.forget(id, token);
    }
}

/// Applies one finished request. Busy flags clear whatever the outcome.
pub fn apply_completion(app: &mut App, completion: Completion) {
    let Completion {
        request,
        token,
        result,
    } = completion;

    let stale = match (request.fenced_id(), token) {
        (Some(id), Some(token)) => !app.ledger.is_current(id, token),
        _ => false,
    };
    release(app, &request, token);

    if stale {
        info!(?request, "discarding superseded response");
        return;
    }

    match result {
        Ok(reply) => apply_reply(app, reply),
        Err(err) => report_failure(app, &request, &err),
    }
}

fn apply_reply(app: &mut App, reply: Reply) {
    match reply {
        Reply::Created(task) => {
            info!(id = %task.id, "task created");
            let id = task.id.clone();
            app.board.insert(task);
            app.reset_input_area();
            app.select(Some(id));
            // Unsorted tasks are not shown in the matrix.
            app.ensure_selection();
        }
        Reply::Updated(task) => {
            let id = task.id.clone();
            if !app.board.apply_update(&id, task) {
                info!(%id, "updated task is no longer loaded");
            }
            if app.inline_edit.is_none() {
                app.ensure_selection();
            }
        }
        Reply::Deleted(id) => {
            info!(%id, "task deleted");
            app.select_neighbour_of(&id);
            app.board.remove(&id);
            if app.inline_edit.as_ref().is_some_and(|edit| edit.task_id == id) {
                crate::actions::cancel_inline_edit(app);
            }
            if app.delete_target.as_deref() == Some(id.as_str()) {
                app.delete_target = None;
            }
            app.ensure_selection();
        }
        Reply::Synced(tasks) => {
            info!(count = tasks.len(), "tasks synced");
            app.board.replace_all(tasks);
            app.last_synced = Some(Local::now());
            drop_vanished_delete_target(app);
            app.ensure_selection();
            app.toast_success("Tasks synced.");
        }
        Reply::Sorted(tasks) => {
            info!(count = tasks.len(), "tasks sorted");
            app.board.replace_all(tasks);
            app.view.mark_sorted();
            drop_vanished_delete_target(app);
            app.ensure_selection();
            app.toast_success("Tasks sorted. Press m for the matrix view.");
        }
        Reply::LoggedOut => {
            info!("logged out");
            app.quit();
        }
    }
}

/// A confirm popup for a task the new board no longer holds would swallow keys.
fn drop_vanished_delete_target(app: &mut App) {
    if let Some(id) = app.delete_target.as_deref()
        && app.board.get(id).is_none()
    {
        info!(%id, "delete target disappeared after reload");
        app.delete_target = None;
    }
}

fn report_failure(app: &mut App, request: &Request, err: &GatewayError) {
    warn!(?request, error = %err, "request failed");
    if let Request::Update { id, .. } = request
        && app.board.get(id).is_none()
    {
        info!(%id, "ignoring failure for a task that is no longer loaded");
        return;
    }
    if let Some(message) = err.user_message() {
        app.toast_error(message);
    }
}
