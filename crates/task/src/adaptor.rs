// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Adaptor seams between tasks and their backing agents.
//!
//! A task adaptor serves single-task operations. Its optional bulk peer is
//! an explicit capability table: an adaptor declares which bulk methods it
//! implements, and containers dispatch by that table. An adaptor without a
//! bulk peer (or one that does not support a given method) leaves its tasks
//! to per-task fallback workers.

use crate::task::Task;
use async_trait::async_trait;
use rj_core::{Method, RjError, TaskState, WaitMode};
use std::time::Duration;

/// Backing adaptor for remote tasks.
#[async_trait]
pub trait TaskAdaptor: Send + Sync {
    /// Stable identity of the backing agent session. Tasks sharing a key
    /// share a session and can be coalesced into one bulk bucket.
    fn key(&self) -> &str;

    /// The bulk-capable peer, when this adaptor has one.
    fn bulk(&self) -> Option<&dyn BulkAdaptor> {
        None
    }

    /// Start the task's job. On success the task is Running and carries
    /// its job id.
    async fn task_run(&self, task: &Task) -> Result<(), RjError>;

    /// Block until the task is terminal or the timeout elapses; returns
    /// whether the task is now terminal. Updates the task's state, result,
    /// and exception slots from the remote job.
    async fn task_wait(&self, task: &Task, timeout: Option<Duration>) -> Result<bool, RjError>;

    /// Cancel the task's job; the task is Canceled observably before return.
    async fn task_cancel(&self, task: &Task) -> Result<(), RjError>;

    /// Query the remote job state and refresh the task's cached state.
    async fn task_state(&self, task: &Task) -> Result<TaskState, RjError>;
}

/// Bulk entry points an adaptor may expose for container dispatch.
#[async_trait]
pub trait BulkAdaptor: Send + Sync {
    /// Capability table; a false here demotes the bucket to per-task workers.
    fn supports(&self, method: Method) -> bool;

    /// Run every task in the bucket.
    async fn container_run(&self, tasks: &[Task]) -> Result<(), RjError>;

    /// Wait on the bucket. The timeout applies per task, not to the bucket
    /// as a whole. Returns a terminal task when one is known.
    async fn container_wait(
        &self,
        tasks: &[Task],
        mode: WaitMode,
        timeout: Option<Duration>,
    ) -> Result<Option<Task>, RjError>;

    /// Best-effort cancel of every task in the bucket.
    async fn container_cancel(
        &self,
        tasks: &[Task],
        timeout: Option<Duration>,
    ) -> Result<(), RjError>;

    /// Collect the current states of the bucket's tasks.
    async fn container_get_states(&self, tasks: &[Task]) -> Result<Vec<TaskState>, RjError>;
}
