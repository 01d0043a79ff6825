/*
 * Runs a slow operation (tree scan, folder build) on a worker thread and
 * reports back over a channel. Every call delivers exactly one `TaskOutcome`:
 * the result, the error text, or a failure if the thread could not start or
 * the task panicked. There is no cancellation.
 */
use std::fmt::Display;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver};
use std::thread;

#[derive(Debug, PartialEq, Eq)]
pub enum TaskOutcome<T> {
    Succeeded(T),
    Failed(String),
}

pub fn spawn_task<T, E, F>(label: &str, task: F) -> Receiver<TaskOutcome<T>>
where
    T: Send + 'static,
    E: Display,
    F: FnOnce() -> Result<T, E> + Send + 'static,
{
    let (sender, receiver) = mpsc::channel();
    let worker_sender = sender.clone();
    let worker_label = label.to_string();

    let spawned = thread::Builder::new()
        .name(format!("task-{label}"))
        .spawn(move || {
            log::debug!("Background: Task '{worker_label}' started.");
            let outcome = match panic::catch_unwind(AssertUnwindSafe(task)) {
                Ok(Ok(value)) => TaskOutcome::Succeeded(value),
                Ok(Err(err)) => TaskOutcome::Failed(err.to_string()),
                Err(_) => TaskOutcome::Failed(format!("task '{worker_label}' panicked")),
            };
            if worker_sender.send(outcome).is_err() {
                log::debug!("Background: Receiver for '{worker_label}' is gone; result dropped.");
            }
        });

    if let Err(err) = spawned {
        log::error!("Background: Could not start task '{label}': {err}");
        let _ = sender.send(TaskOutcome::Failed(format!(
            "could not start task '{label}': {err}"
        )));
    }
    receiver
}

/*
 * Blocks until the task reports. A closed channel without an outcome cannot
 * happen with `spawn_task`, but is mapped to a failure all the same.
 */
pub fn wait_for<T>(receiver: &Receiver<TaskOutcome<T>>) -> TaskOutcome<T> {
    receiver
        .recv()
        .unwrap_or_else(|_| TaskOutcome::Failed("task ended without a result".to_string()))
}
