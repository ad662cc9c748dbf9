// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The asynchronous task handle.
//!
//! A task is a cheap clone over shared internals. State lives in a watch
//! cell so any number of waiters can block on transitions without polling;
//! terminal states are absorbing at this layer no matter what a buggy
//! adaptor reports.

use crate::adaptor::TaskAdaptor;
use parking_lot::Mutex;
use rj_core::{JobId, LaunchMode, Method, RjError, TaskState};
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

static NEXT_UID: AtomicU64 = AtomicU64::new(1);

/// Result value stored by a finished task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskValue {
    None,
    /// Exit code of the remote job (zero for Done tasks)
    ExitCode(i32),
    Text(String),
    Bytes(Vec<u8>),
}

type LocalCallable = Pin<Box<dyn Future<Output = Result<TaskValue, RjError>> + Send>>;

enum Backend {
    Remote {
        adaptor: Arc<dyn TaskAdaptor>,
        command: String,
    },
    Local,
}

struct LocalRun {
    callable: Option<LocalCallable>,
    handle: Option<tokio::task::JoinHandle<()>>,
}

struct TaskInner {
    uid: u64,
    method: Method,
    backend: Backend,
    state_tx: watch::Sender<TaskState>,
    job_id: Mutex<Option<JobId>>,
    result: Mutex<Option<TaskValue>>,
    exception: Mutex<Option<RjError>>,
    local: Mutex<LocalRun>,
}

/// Client-side handle to one remote job or one local callable.
#[derive(Clone)]
pub struct Task {
    inner: Arc<TaskInner>,
}

impl PartialEq for Task {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Task {}

impl std::fmt::Debug for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Task")
            .field("label", &self.label())
            .field("method", &self.inner.method)
            .field("state", &self.state())
            .finish()
    }
}

impl Task {
    fn new(method: Method, backend: Backend, callable: Option<LocalCallable>) -> Self {
        let (state_tx, _) = watch::channel(TaskState::New);
        Self {
            inner: Arc::new(TaskInner {
                uid: NEXT_UID.fetch_add(1, Ordering::Relaxed),
                method,
                backend,
                state_tx,
                job_id: Mutex::new(None),
                result: Mutex::new(None),
                exception: Mutex::new(None),
                local: Mutex::new(LocalRun {
                    callable,
                    handle: None,
                }),
            }),
        }
    }

    /// Construct a task backed by a remote agent adaptor.
    ///
    /// `Sync` runs and waits before returning (terminal state on exit);
    /// `Async` runs and returns Running; `Deferred` only constructs.
    pub async fn remote(
        adaptor: Arc<dyn TaskAdaptor>,
        command: impl Into<String>,
        mode: LaunchMode,
    ) -> Result<Self, RjError> {
        let task = Self::new(
            Method::Run,
            Backend::Remote {
                adaptor,
                command: command.into(),
            },
            None,
        );
        task.launch(mode).await?;
        Ok(task)
    }

    /// Construct a task wrapping a local callable.
    ///
    /// The callable runs on the async runtime; the state machine is the
    /// same as for remote tasks, so containers can mix both kinds.
    pub async fn local<F>(callable: F, mode: LaunchMode) -> Result<Self, RjError>
    where
        F: Future<Output = Result<TaskValue, RjError>> + Send + 'static,
    {
        let task = Self::new(Method::Run, Backend::Local, Some(Box::pin(callable)));
        task.launch(mode).await?;
        Ok(task)
    }

    async fn launch(&self, mode: LaunchMode) -> Result<(), RjError> {
        match mode {
            LaunchMode::Deferred => Ok(()),
            LaunchMode::Async => self.run().await,
            LaunchMode::Sync => {
                self.run().await?;
                self.wait(None).await?;
                Ok(())
            }
        }
    }

    // ----------------------------------------------------------------
    // accessors

    pub fn state(&self) -> TaskState {
        *self.inner.state_tx.borrow()
    }

    pub fn method(&self) -> Method {
        self.inner.method
    }

    pub fn job_id(&self) -> Option<JobId> {
        self.inner.job_id.lock().clone()
    }

    /// The command line a remote task will run, if this is a remote task.
    pub fn command(&self) -> Option<String> {
        match &self.inner.backend {
            Backend::Remote { command, .. } => Some(command.clone()),
            Backend::Local => None,
        }
    }

    /// The backing adaptor, if this is a remote task.
    pub fn adaptor(&self) -> Option<Arc<dyn TaskAdaptor>> {
        match &self.inner.backend {
            Backend::Remote { adaptor, .. } => Some(adaptor.clone()),
            Backend::Local => None,
        }
    }

    /// Identifier for log and error messages: the job id when known, a
    /// locally unique handle id otherwise.
    pub fn label(&self) -> String {
        match self.job_id() {
            Some(id) => format!("job {}", id),
            None => format!("task#{}", self.inner.uid),
        }
    }

    /// The stored exception, if the task failed.
    pub fn exception(&self) -> Option<RjError> {
        self.inner.exception.lock().clone()
    }

    // ----------------------------------------------------------------
    // adaptor-facing mutators

    /// Record the remote job id (adaptor-facing).
    pub fn set_job_id(&self, id: JobId) {
        *self.inner.job_id.lock() = Some(id);
    }

    /// Transition the task state (adaptor-facing). Terminal states are
    /// absorbing; attempts to leave one are ignored.
    pub fn set_state(&self, state: TaskState) {
        self.inner.state_tx.send_if_modified(|current| {
            if current.is_terminal() || *current == state {
                false
            } else {
                *current = state;
                true
            }
        });
    }

    /// Store a result and transition to Done (adaptor-facing).
    pub fn set_result(&self, value: TaskValue) {
        *self.inner.result.lock() = Some(value);
        self.set_state(TaskState::Done);
    }

    /// Store an exception and transition to Failed (adaptor-facing).
    pub fn fail(&self, error: RjError) {
        *self.inner.exception.lock() = Some(error);
        self.set_state(TaskState::Failed);
    }

    // ----------------------------------------------------------------
    // operations

    /// Start the task. A no-op outside New, by contract.
    pub async fn run(&self) -> Result<(), RjError> {
        if self.state() != TaskState::New {
            return Ok(());
        }

        match &self.inner.backend {
            Backend::Remote { adaptor, .. } => adaptor.clone().task_run(self).await,
            Backend::Local => self.run_local(),
        }
    }

    fn run_local(&self) -> Result<(), RjError> {
        let mut local = self.inner.local.lock();
        let Some(callable) = local.callable.take() else {
            return Err(RjError::IncorrectState(
                "local task already consumed its callable".to_string(),
            ));
        };

        self.set_state(TaskState::Running);

        let this = self.clone();
        local.handle = Some(tokio::spawn(async move {
            match callable.await {
                Ok(value) => this.set_result(value),
                Err(error) => this.fail(error),
            }
        }));
        Ok(())
    }

    /// Block until the task is terminal or the timeout elapses. Returns
    /// whether the task is now terminal.
    pub async fn wait(&self, timeout: Option<Duration>) -> Result<bool, RjError> {
        if self.state().is_terminal() {
            return Ok(true);
        }

        match &self.inner.backend {
            Backend::Remote { adaptor, .. } => adaptor.clone().task_wait(self, timeout).await,
            Backend::Local => Ok(self.wait_local(timeout).await),
        }
    }

    async fn wait_local(&self, timeout: Option<Duration>) -> bool {
        let mut rx = self.inner.state_tx.subscribe();
        let terminal = async move {
            loop {
                if rx.borrow_and_update().is_terminal() {
                    return true;
                }
                if rx.changed().await.is_err() {
                    return false;
                }
            }
        };

        match timeout {
            None => terminal.await,
            Some(t) => tokio::time::timeout(t, terminal).await.unwrap_or(false),
        }
    }

    /// Cancel the task. Legal only while it runs; a canceled task is
    /// observably Canceled before this returns.
    pub async fn cancel(&self) -> Result<(), RjError> {
        if self.state() != TaskState::Running {
            return Err(RjError::IncorrectState(format!(
                "cancel of {} in state {}",
                self.label(),
                self.state()
            )));
        }

        match &self.inner.backend {
            Backend::Remote { adaptor, .. } => adaptor.clone().task_cancel(self).await,
            Backend::Local => {
                if let Some(handle) = self.inner.local.lock().handle.take() {
                    handle.abort();
                }
                self.set_state(TaskState::Canceled);
                if self.state() != TaskState::Canceled {
                    // lost the race against natural completion
                    return Err(RjError::IncorrectState(format!(
                        "{} completed before cancel",
                        self.label()
                    )));
                }
                Ok(())
            }
        }
    }

    /// The task's result. Waits first when non-terminal; re-raises the
    /// stored exception for Failed tasks; refuses Canceled ones.
    pub async fn result(&self) -> Result<TaskValue, RjError> {
        if !self.state().is_terminal() {
            self.wait(None).await?;
        }

        match self.state() {
            TaskState::Done => Ok(self
                .inner
                .result
                .lock()
                .clone()
                .unwrap_or(TaskValue::None)),
            TaskState::Failed => Err(self
                .exception()
                .unwrap_or_else(|| RjError::NoSuccess("task failed".to_string()))),
            TaskState::Canceled => Err(RjError::IncorrectState(format!(
                "result() on canceled {}",
                self.label()
            ))),
            other => Err(RjError::NoSuccess(format!(
                "wait returned with {} still not terminal",
                other
            ))),
        }
    }
}

#[cfg(test)]
#[path = "task_tests.rs"]
mod tests;
