//! Precondition-gated periodic tasks.

use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

/// A periodic background task that only runs while its preconditions hold.
///
/// Callers do not start or stop this directly. They call [`GatedTask::sync`]
/// with the current verdict whenever anything feeding the verdict changes,
/// and the task converges on the right state: spawn when it should run and
/// is not running, abort when it should not. The first tick fires one full
/// period after the task starts.
pub struct GatedTask {
    name: &'static str,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl GatedTask {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            handle: Mutex::new(None),
        }
    }

    /// Reconcile the running state with `should_run`.
    pub fn sync<F, Fut>(&self, should_run: bool, period: Duration, mut tick: F)
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut handle = self.handle.lock().unwrap();

        if !should_run {
            if let Some(task) = handle.take() {
                task.abort();
                debug!(task = self.name, "Stopped periodic task");
            }
            return;
        }

        if handle.is_some() {
            return;
        }

        debug!(task = self.name, period = ?period, "Started periodic task");
        *handle = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // The first tick of an interval completes immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                tick().await;
            }
        }));
    }

    /// Abort the task if it is running.
    pub fn stop(&self) {
        if let Some(task) = self.handle.lock().unwrap().take() {
            task.abort();
            debug!(task = self.name, "Stopped periodic task");
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.lock().unwrap().is_some()
    }
}

impl Drop for GatedTask {
    fn drop(&mut self) {
        if let Some(task) = self.handle.lock().unwrap().take() {
            task.abort();
        }
    }
}
