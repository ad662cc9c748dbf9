// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scripted adaptor for task and container tests.
#![cfg_attr(coverage_nightly, coverage(off))]

use crate::adaptor::{BulkAdaptor, TaskAdaptor};
use crate::task::{Task, TaskValue};
use async_trait::async_trait;
use parking_lot::Mutex;
use rj_core::{JobId, Method, RjError, TaskState, WaitMode};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// A fake agent whose jobs complete after a fixed duration.
pub struct StubAdaptor {
    key: String,
    bulk_enabled: bool,
    supported: Vec<Method>,
    job_duration: Duration,
    fail_run: bool,
    seq: AtomicU64,
    started: Mutex<HashMap<String, Instant>>,
    calls: Mutex<Vec<String>>,
}

impl StubAdaptor {
    pub fn new(key: &str, job_duration: Duration) -> Arc<Self> {
        Arc::new(Self {
            key: key.to_string(),
            bulk_enabled: true,
            supported: vec![Method::Run, Method::Wait, Method::Cancel, Method::States],
            job_duration,
            fail_run: false,
            seq: AtomicU64::new(1),
            started: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn without_bulk(key: &str, job_duration: Duration) -> Arc<Self> {
        let mut stub = Self::unwrapped(key, job_duration);
        stub.bulk_enabled = false;
        Arc::new(stub)
    }

    pub fn supporting(key: &str, job_duration: Duration, supported: Vec<Method>) -> Arc<Self> {
        let mut stub = Self::unwrapped(key, job_duration);
        stub.supported = supported;
        Arc::new(stub)
    }

    pub fn failing_run(key: &str) -> Arc<Self> {
        let mut stub = Self::unwrapped(key, Duration::ZERO);
        stub.fail_run = true;
        Arc::new(stub)
    }

    fn unwrapped(key: &str, job_duration: Duration) -> Self {
        Self {
            key: key.to_string(),
            bulk_enabled: true,
            supported: vec![Method::Run, Method::Wait, Method::Cancel, Method::States],
            job_duration,
            fail_run: false,
            seq: AtomicU64::new(1),
            started: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    fn record(&self, call: &str) {
        self.calls.lock().push(call.to_string());
    }

    fn remaining(&self, task: &Task) -> Option<Duration> {
        let id = task.job_id()?;
        let started = self.started.lock().get(id.as_str()).copied()?;
        Some(self.job_duration.saturating_sub(started.elapsed()))
    }

    fn finish(&self, task: &Task) {
        task.set_result(TaskValue::ExitCode(0));
    }
}

#[async_trait]
impl TaskAdaptor for StubAdaptor {
    fn key(&self) -> &str {
        &self.key
    }

    fn bulk(&self) -> Option<&dyn BulkAdaptor> {
        if self.bulk_enabled {
            Some(self)
        } else {
            None
        }
    }

    async fn task_run(&self, task: &Task) -> Result<(), RjError> {
        self.record("task_run");
        if self.fail_run {
            return Err(RjError::NoSuccess("stub refused to run".to_string()));
        }
        let id = JobId::new(self.seq.fetch_add(1, Ordering::Relaxed).to_string());
        self.started
            .lock()
            .insert(id.as_str().to_string(), Instant::now());
        task.set_job_id(id);
        task.set_state(TaskState::Running);
        Ok(())
    }

    async fn task_wait(&self, task: &Task, timeout: Option<Duration>) -> Result<bool, RjError> {
        self.record("task_wait");
        let Some(remaining) = self.remaining(task) else {
            return Err(RjError::IncorrectState("task was never run".to_string()));
        };

        match timeout {
            Some(t) if t < remaining => {
                tokio::time::sleep(t).await;
                Ok(false)
            }
            _ => {
                tokio::time::sleep(remaining).await;
                self.finish(task);
                Ok(true)
            }
        }
    }

    async fn task_cancel(&self, task: &Task) -> Result<(), RjError> {
        self.record("task_cancel");
        task.set_state(TaskState::Canceled);
        Ok(())
    }

    async fn task_state(&self, task: &Task) -> Result<TaskState, RjError> {
        self.record("task_state");
        if let Some(remaining) = self.remaining(task) {
            if remaining.is_zero() {
                self.finish(task);
            }
        }
        Ok(task.state())
    }
}

#[async_trait]
impl BulkAdaptor for StubAdaptor {
    fn supports(&self, method: Method) -> bool {
        self.supported.contains(&method)
    }

    async fn container_run(&self, tasks: &[Task]) -> Result<(), RjError> {
        self.record("container_run");
        for task in tasks {
            self.task_run(task).await?;
        }
        Ok(())
    }

    async fn container_wait(
        &self,
        tasks: &[Task],
        mode: WaitMode,
        timeout: Option<Duration>,
    ) -> Result<Option<Task>, RjError> {
        self.record("container_wait");
        match mode {
            WaitMode::All => {
                let mut representative = None;
                for task in tasks {
                    if self.task_wait(task, timeout).await? {
                        representative = Some(task.clone());
                    }
                }
                Ok(representative)
            }
            WaitMode::Any => {
                let deadline = timeout.map(|t| Instant::now() + t);
                loop {
                    for task in tasks {
                        if self.task_state(task).await?.is_terminal() {
                            return Ok(Some(task.clone()));
                        }
                    }
                    if deadline.is_some_and(|d| Instant::now() >= d) {
                        return Ok(None);
                    }
                    tokio::time::sleep(Duration::from_millis(5)).await;
                }
            }
        }
    }

    async fn container_cancel(
        &self,
        tasks: &[Task],
        _timeout: Option<Duration>,
    ) -> Result<(), RjError> {
        self.record("container_cancel");
        for task in tasks {
            self.task_cancel(task).await?;
        }
        Ok(())
    }

    async fn container_get_states(&self, tasks: &[Task]) -> Result<Vec<TaskState>, RjError> {
        self.record("container_get_states");
        let mut states = Vec::with_capacity(tasks.len());
        for task in tasks {
            states.push(self.task_state(task).await?);
        }
        Ok(states)
    }
}
