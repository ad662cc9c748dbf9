// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task containers: bulk operations with partial-failure semantics.
//!
//! Per call, member tasks are partitioned into buckets sharing a
//! bulk-capable backing agent, plus the unbound rest. Each bucket becomes
//! one worker, each unbound task becomes one worker; workers run
//! concurrently and failures aggregate without rolling back siblings.

use crate::adaptor::TaskAdaptor;
use crate::task::Task;
use parking_lot::Mutex;
use rj_core::{Method, RjError, TaskState, WaitMode};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Poll slice for ANY-mode waits. Deliberate busy-wait, bounded per slice.
const ANY_POLL_SLICE: Duration = Duration::from_millis(10);

/// Aggregated failure of one or more container workers.
///
/// Carries the originating task labels next to each underlying error; the
/// first underlying error doubles as the `source()`.
#[derive(Debug, Clone)]
pub struct ContainerError {
    failures: Vec<(String, RjError)>,
}

impl ContainerError {
    fn new(failures: Vec<(String, RjError)>) -> Self {
        Self { failures }
    }

    fn single(tasks: String, error: RjError) -> Self {
        Self {
            failures: vec![(tasks, error)],
        }
    }

    /// Task labels and errors, one entry per failed worker.
    pub fn failures(&self) -> &[(String, RjError)] {
        &self.failures
    }
}

impl fmt::Display for ContainerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} container worker(s) failed:", self.failures.len())?;
        for (tasks, error) in &self.failures {
            write!(f, " [{}: {}]", tasks, error)?;
        }
        Ok(())
    }
}

impl std::error::Error for ContainerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.failures
            .first()
            .map(|(_, e)| e as &(dyn std::error::Error + 'static))
    }
}

type Bound = Vec<(Arc<dyn TaskAdaptor>, Vec<Task>)>;

/// Ordered collection of tasks with bulk operations.
#[derive(Default)]
pub struct Container {
    tasks: Mutex<Vec<Task>>,
}

impl Container {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a task; duplicates (same handle) are ignored.
    pub fn add(&self, task: Task) {
        let mut tasks = self.tasks.lock();
        if !tasks.contains(&task) {
            tasks.push(task);
        }
    }

    /// Remove a task by value.
    pub fn remove(&self, task: &Task) {
        self.tasks.lock().retain(|t| t != task);
    }

    pub fn size(&self) -> usize {
        self.tasks.lock().len()
    }

    /// The member tasks, in insertion order.
    pub fn tasks(&self) -> Vec<Task> {
        self.tasks.lock().clone()
    }

    /// Run every member task.
    ///
    /// Any worker failure surfaces as a `ContainerError` naming the
    /// originating tasks; successfully started siblings are not rolled back.
    pub async fn run(&self) -> Result<(), ContainerError> {
        let tasks = self.tasks();
        if tasks.is_empty() {
            return Ok(());
        }

        let (bound, mut unbound) = bucketize(&tasks);
        let mut workers: Vec<JoinHandle<WorkerResult>> = Vec::new();

        for (adaptor, group) in bound {
            // run() dispatches per method; only Run has a bulk entry point
            // here, everything else is demoted to per-task handling
            let (runnable, other): (Vec<Task>, Vec<Task>) = group
                .into_iter()
                .partition(|t| t.method() == Method::Run && supports(&adaptor, Method::Run));
            unbound.extend(other);

            if runnable.is_empty() {
                continue;
            }
            workers.push(tokio::spawn(async move {
                let labels = labels_of(&runnable);
                match adaptor.bulk() {
                    Some(bulk) => bulk
                        .container_run(&runnable)
                        .await
                        .map(|_| None)
                        .map_err(|e| (labels, e)),
                    None => Err((labels, bulk_vanished())),
                }
            }));
        }

        for task in unbound {
            workers.push(tokio::spawn(async move {
                let label = task.label();
                task.run().await.map(|_| None).map_err(|e| (label, e))
            }));
        }

        join_all(workers).await.map(|_| ())
    }

    /// Wait for member tasks.
    ///
    /// `All` joins every worker and returns a representative terminal task.
    /// The timeout is handed to each worker rather than enforced globally,
    /// so the worst-case wall time is the per-worker timeout times the
    /// worker count.
    ///
    /// `Any` polls the workers in short slices and returns the first task
    /// a completed worker yields; losing workers keep running and their
    /// errors are discarded by design.
    pub async fn wait(
        &self,
        mode: WaitMode,
        timeout: Option<Duration>,
    ) -> Result<Option<Task>, ContainerError> {
        let tasks = self.tasks();
        if tasks.is_empty() {
            return Ok(None);
        }

        let (bound, mut unbound) = bucketize(&tasks);
        let mut workers: Vec<JoinHandle<WorkerResult>> = Vec::new();

        let bound = demote_unsupported(bound, Method::Wait, &mut unbound);

        for (adaptor, group) in bound {
            workers.push(tokio::spawn(async move {
                let labels = labels_of(&group);
                match adaptor.bulk() {
                    Some(bulk) => bulk
                        .container_wait(&group, mode, timeout)
                        .await
                        .map_err(|e| (labels, e)),
                    None => Err((labels, bulk_vanished())),
                }
            }));
        }

        for task in unbound {
            workers.push(tokio::spawn(async move {
                let label = task.label();
                match task.wait(timeout).await {
                    Ok(true) => Ok(Some(task)),
                    Ok(false) => Ok(None),
                    Err(e) => Err((label, e)),
                }
            }));
        }

        match mode {
            WaitMode::All => join_all(workers).await,
            WaitMode::Any => poll_any(workers).await,
        }
    }

    /// Best-effort parallel cancel. All workers are joined; one worker's
    /// failure never prevents sibling cancels, but every failure is
    /// reported.
    pub async fn cancel(&self, timeout: Option<Duration>) -> Result<(), ContainerError> {
        let tasks = self.tasks();
        if tasks.is_empty() {
            return Ok(());
        }

        let (bound, mut unbound) = bucketize(&tasks);
        let mut workers: Vec<JoinHandle<WorkerResult>> = Vec::new();

        let bound = demote_unsupported(bound, Method::Cancel, &mut unbound);

        for (adaptor, group) in bound {
            workers.push(tokio::spawn(async move {
                let labels = labels_of(&group);
                match adaptor.bulk() {
                    Some(bulk) => bulk
                        .container_cancel(&group, timeout)
                        .await
                        .map(|_| None)
                        .map_err(|e| (labels, e)),
                    None => Err((labels, bulk_vanished())),
                }
            }));
        }

        for task in unbound {
            workers.push(tokio::spawn(async move {
                let label = task.label();
                task.cancel().await.map(|_| None).map_err(|e| (label, e))
            }));
        }

        join_all(workers).await.map(|_| ())
    }

    /// Collect the states of all member tasks.
    ///
    /// The returned order is unspecified and may differ from `tasks()`.
    pub async fn states(&self) -> Result<Vec<TaskState>, ContainerError> {
        let tasks = self.tasks();
        if tasks.is_empty() {
            return Ok(Vec::new());
        }

        let (bound, mut unbound) = bucketize(&tasks);
        let mut workers: Vec<JoinHandle<Result<Vec<TaskState>, (String, RjError)>>> = Vec::new();

        let bound = demote_unsupported(bound, Method::States, &mut unbound);

        for (adaptor, group) in bound {
            workers.push(tokio::spawn(async move {
                let labels = labels_of(&group);
                match adaptor.bulk() {
                    Some(bulk) => bulk
                        .container_get_states(&group)
                        .await
                        .map_err(|e| (labels, e)),
                    None => Err((labels, bulk_vanished())),
                }
            }));
        }

        for task in unbound {
            workers.push(tokio::spawn(async move { Ok(vec![task.state()]) }));
        }

        let mut states = Vec::new();
        let mut failures = Vec::new();
        for worker in workers {
            match worker.await {
                Ok(Ok(mut chunk)) => states.append(&mut chunk),
                Ok(Err(failure)) => failures.push(failure),
                Err(join) => failures.push(joined_panic(join)),
            }
        }

        if failures.is_empty() {
            Ok(states)
        } else {
            Err(ContainerError::new(failures))
        }
    }
}

type WorkerResult = Result<Option<Task>, (String, RjError)>;

fn supports(adaptor: &Arc<dyn TaskAdaptor>, method: Method) -> bool {
    adaptor.bulk().map(|b| b.supports(method)).unwrap_or(false)
}

fn bulk_vanished() -> RjError {
    RjError::NoSuccess("bulk adaptor no longer available".to_string())
}

fn labels_of(tasks: &[Task]) -> String {
    tasks
        .iter()
        .map(|t| t.label())
        .collect::<Vec<_>>()
        .join(", ")
}

fn joined_panic(join: tokio::task::JoinError) -> (String, RjError) {
    (
        "worker".to_string(),
        RjError::NoSuccess(format!("container worker panicked: {}", join)),
    )
}

/// Partition tasks into per-agent buckets (bound) and the rest (unbound).
fn bucketize(tasks: &[Task]) -> (Bound, Vec<Task>) {
    let mut bound: Bound = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut unbound = Vec::new();

    for task in tasks {
        match task.adaptor() {
            Some(adaptor) if adaptor.bulk().is_some() => {
                let key = adaptor.key().to_string();
                let slot = *index.entry(key).or_insert_with(|| {
                    bound.push((adaptor.clone(), Vec::new()));
                    bound.len() - 1
                });
                bound[slot].1.push(task.clone());
            }
            _ => unbound.push(task.clone()),
        }
    }

    (bound, unbound)
}

/// Drop buckets whose adaptor does not implement the bulk method, demoting
/// their tasks to per-task workers.
fn demote_unsupported(bound: Bound, method: Method, unbound: &mut Vec<Task>) -> Bound {
    bound
        .into_iter()
        .filter_map(|(adaptor, tasks)| {
            if supports(&adaptor, method) {
                Some((adaptor, tasks))
            } else {
                tracing::debug!(agent = adaptor.key(), %method, "no bulk entry point, demoting");
                unbound.extend(tasks);
                None
            }
        })
        .collect()
}

/// Join every worker; aggregate failures, keep the last yielded task as the
/// representative.
async fn join_all(workers: Vec<JoinHandle<WorkerResult>>) -> Result<Option<Task>, ContainerError> {
    let mut representative = None;
    let mut failures = Vec::new();

    for worker in workers {
        match worker.await {
            Ok(Ok(Some(task))) => representative = Some(task),
            Ok(Ok(None)) => {}
            Ok(Err(failure)) => failures.push(failure),
            Err(join) => failures.push(joined_panic(join)),
        }
    }

    if failures.is_empty() {
        Ok(representative)
    } else {
        Err(ContainerError::new(failures))
    }
}

/// Poll workers in bounded slices; the first completed worker decides.
/// Losing workers are left running and their eventual errors dropped.
async fn poll_any(mut workers: Vec<JoinHandle<WorkerResult>>) -> Result<Option<Task>, ContainerError> {
    while !workers.is_empty() {
        let mut slot = 0;
        while slot < workers.len() {
            match tokio::time::timeout(ANY_POLL_SLICE, &mut workers[slot]).await {
                Ok(joined) => {
                    workers.remove(slot);
                    match joined {
                        Ok(Ok(Some(task))) => return Ok(Some(task)),
                        Ok(Ok(None)) => {}
                        Ok(Err((tasks, error))) => {
                            return Err(ContainerError::single(tasks, error))
                        }
                        Err(join) => {
                            let (tasks, error) = joined_panic(join);
                            return Err(ContainerError::single(tasks, error));
                        }
                    }
                }
                Err(_slice_elapsed) => slot += 1,
            }
        }
    }
    Ok(None)
}

#[cfg(test)]
#[path = "container_tests.rs"]
mod tests;
