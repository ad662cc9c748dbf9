// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task and job state machines.
//!
//! `TaskState` is the client-side lifecycle of a task handle; `JobState` is
//! the remote lifecycle recorded in a job's state file. The two differ in one
//! place: a suspended job is still a running task (suspension is a job-level
//! condition managed through SUSPEND/RESUME verbs, not a task state).

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::RjError;

/// Client-side task lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    /// State not yet established (no agent round-trip has happened)
    Unknown,
    /// Constructed but not started
    New,
    /// Started and not yet terminal
    Running,
    /// Finished with a result
    Done,
    /// Finished with a stored exception
    Failed,
    /// Canceled before natural completion
    Canceled,
}

impl TaskState {
    /// Terminal states are absorbing.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskState::Done | TaskState::Failed | TaskState::Canceled)
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskState::Unknown => write!(f, "unknown"),
            TaskState::New => write!(f, "new"),
            TaskState::Running => write!(f, "running"),
            TaskState::Done => write!(f, "done"),
            TaskState::Failed => write!(f, "failed"),
            TaskState::Canceled => write!(f, "canceled"),
        }
    }
}

/// Remote job state as recorded by the agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    New,
    Running,
    Suspended,
    Done,
    Failed,
    Canceled,
}

impl JobState {
    /// Parse a wire token (`"RUNNING"`, possibly with the trailing marker
    /// space the agent appends to every state line).
    pub fn parse_token(token: &str) -> Result<Self, RjError> {
        match token.trim() {
            "NEW" => Ok(JobState::New),
            "RUNNING" => Ok(JobState::Running),
            "SUSPENDED" => Ok(JobState::Suspended),
            "DONE" => Ok(JobState::Done),
            "FAILED" => Ok(JobState::Failed),
            "CANCELED" => Ok(JobState::Canceled),
            other => Err(RjError::BadParameter(format!(
                "unknown state token '{}'",
                other
            ))),
        }
    }

    /// The wire token for this state (without the trailing marker space).
    pub fn as_token(&self) -> &'static str {
        match self {
            JobState::New => "NEW",
            JobState::Running => "RUNNING",
            JobState::Suspended => "SUSPENDED",
            JobState::Done => "DONE",
            JobState::Failed => "FAILED",
            JobState::Canceled => "CANCELED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Done | JobState::Failed | JobState::Canceled)
    }

    /// Whether `next` may legally be appended after `prev` in a state file.
    ///
    /// Terminal states are absorbing, with one exception: CANCELED may be
    /// layered on top of DONE or FAILED when the monitor observed a cancel
    /// marker at termination time.
    pub fn can_follow(prev: JobState, next: JobState) -> bool {
        use JobState::*;
        match (prev, next) {
            (New, Running) => true,
            (Running, Suspended) => true,
            (Running, Done) => true,
            (Running, Failed) => true,
            (Running, Canceled) => true,
            (Suspended, Running) => true,
            (Done, Canceled) => true,
            (Failed, Canceled) => true,
            _ => false,
        }
    }

    /// Whether a sequence of state tokens is a prefix of a legal path
    /// through the job state machine (it must begin with NEW).
    pub fn is_legal_sequence(states: &[JobState]) -> bool {
        match states.first() {
            None => true,
            Some(JobState::New) => states
                .windows(2)
                .all(|w| JobState::can_follow(w[0], w[1])),
            Some(_) => false,
        }
    }

    /// Project onto the client-side task state.
    pub fn task_state(&self) -> TaskState {
        match self {
            JobState::New => TaskState::New,
            JobState::Running | JobState::Suspended => TaskState::Running,
            JobState::Done => TaskState::Done,
            JobState::Failed => TaskState::Failed,
            JobState::Canceled => TaskState::Canceled,
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_token())
    }
}

/// Container wait mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitMode {
    /// Return as soon as any one task is terminal
    Any,
    /// Return once every task is terminal
    All,
}

/// Task construction mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchMode {
    /// Run and wait before the constructor returns; terminal state on exit
    Sync,
    /// Run before the constructor returns; Running (or New) on exit
    Async,
    /// Construct only; the caller invokes `run()` later
    Deferred,
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
