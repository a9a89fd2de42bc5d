//! Registry of running background tasks, one per source.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use tokio::sync::oneshot;
use tokio::task::JoinHandle;

struct TaskHandle {
    stop: oneshot::Sender<()>,
    join: JoinHandle<()>,
}

#[derive(Default)]
pub struct TaskRegistry {
    tasks: Mutex<HashMap<i64, TaskHandle>>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn tasks(&self) -> MutexGuard<'_, HashMap<i64, TaskHandle>> {
        self.tasks.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Starts a task for `source_id` unless one is already registered.
    ///
    /// `spawn` receives the task's stop signal and is only invoked when the
    /// slot is free; the check and the insert happen under one lock.
    /// Returns whether a new task was started.
    pub fn try_start<F>(&self, source_id: i64, spawn: F) -> bool
    where
        F: FnOnce(oneshot::Receiver<()>) -> JoinHandle<()>,
    {
        let mut tasks = self.tasks();

        if tasks.contains_key(&source_id) {
            return false;
        }

        let (stop, stop_rx) = oneshot::channel();
        let join = spawn(stop_rx);
        tasks.insert(source_id, TaskHandle { stop, join });
        true
    }

    pub fn contains(&self, source_id: i64) -> bool {
        self.tasks().contains_key(&source_id)
    }

    /// Removes the handle and signals its task to stop.
    ///
    /// Returns `None` when no task was registered, in which case nothing is
    /// signalled.
    pub fn stop(&self, source_id: i64) -> Option<JoinHandle<()>> {
        let handle = self.tasks().remove(&source_id)?;
        // The task may already have exited; its receiver is then gone
        let _ = handle.stop.send(());
        Some(handle.join)
    }

    /// Signals every registered task and empties the registry.
    pub fn stop_all(&self) -> Vec<JoinHandle<()>> {
        let drained: Vec<TaskHandle> = self.tasks().drain().map(|(_, handle)| handle).collect();

        drained
            .into_iter()
            .map(|handle| {
                let _ = handle.stop.send(());
                handle.join
            })
            .collect()
    }

    pub fn active_ids(&self) -> Vec<i64> {
        let mut ids: Vec<i64> = self.tasks().keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.tasks().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
