// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! One live agent session.
//!
//! `JobAgent` installs the agent script on first contact (content-addressed,
//! uploaded through the shell itself), launches it, and then speaks the verb
//! protocol. The channel is behind an async mutex: one in-flight request per
//! session, which is the whole concurrency discipline the wire needs.

use async_trait::async_trait;
use rj_agent::AgentScript;
use rj_channel::{ProcessChannel, ShellChannel};
use rj_core::{JobId, JobState, Method, RjError, TaskState, WaitMode};
use rj_protocol::{encode, uudecode, Verb};
use rj_task::{BulkAdaptor, Task, TaskAdaptor, TaskValue};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::config::Config;

/// Grace added to the read timeout while a server-side WAIT is in flight.
const WAIT_GRACE: Duration = Duration::from_secs(10);

/// Stand-in for "no timeout" on reads backing an unbounded WAIT.
const WAIT_FOREVER: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Poll slice for ANY-mode bulk waits.
const ANY_POLL_SLICE: Duration = Duration::from_millis(10);

/// Client handle for one remote agent session.
pub struct JobAgent {
    key: String,
    channel: Mutex<Box<dyn ShellChannel>>,
    read_timeout: Duration,
}

impl JobAgent {
    /// Open the configured transport and bring up an agent session on it.
    pub async fn connect(config: &Config) -> Result<std::sync::Arc<Self>, RjError> {
        let channel = Box::new(ProcessChannel::open(&config.shell)?);
        Self::connect_over(channel, config).await
    }

    /// Bring up an agent session over an already-open channel.
    ///
    /// Bootstrap: install the script when its content-addressed path is
    /// missing (uploaded as a heredoc through the shell itself), launch it
    /// with our pid, and sync on the first prompt.
    pub async fn connect_over(
        mut channel: Box<dyn ShellChannel>,
        config: &Config,
    ) -> Result<std::sync::Arc<Self>, RjError> {
        let script = AgentScript::new(config.agent_config());
        let stamp = &script.content_hash()[..16];
        let marker = format!("RJ-BOOTSTRAP-{}", stamp);
        let eof = format!("RJ_EOF_{}", stamp);
        let path = script.remote_path();
        let read_timeout = config.read_timeout();

        channel
            .write_line(&format!("mkdir -p \"{}\"", script.config().script_dir))
            .await?;
        channel
            .write_line(&format!(
                "if ! test -f \"{}\"; then cat > \"{}.tmp\" <<'{}'",
                path, path, eof
            ))
            .await?;
        for line in script.text().lines() {
            channel.write_line(line).await?;
        }
        channel.write_line(&eof).await?;
        channel
            .write_line(&format!("mv \"{}.tmp\" \"{}\"; fi; echo {}", path, path, marker))
            .await?;
        channel.read_until(&marker, read_timeout).await?;

        // exec: the transport shell becomes the agent, so agent death is
        // channel death and pending reads fail with ChannelClosed
        channel
            .write_line(&format!("exec {}", script.launch_line(std::process::id())))
            .await?;
        channel.read_prompt(read_timeout).await?;

        let key = format!("rj-agent-{}", uuid::Uuid::new_v4().simple());
        tracing::info!(agent = %key, script = %path, "agent session established");

        Ok(std::sync::Arc::new(Self {
            key,
            channel: Mutex::new(channel),
            read_timeout,
        }))
    }

    /// One verb round-trip; the channel lock serializes concurrent callers.
    async fn request(&self, verb: &Verb, read_timeout: Duration) -> Result<String, RjError> {
        let line = encode(verb)?;
        let mut channel = self.channel.lock().await;
        tracing::debug!(agent = %self.key, verb = line.trim_end(), "request");
        channel.write_line(&line).await?;
        let reply = channel.read_reply(read_timeout).await?;
        reply.into_result()
    }

    // ----------------------------------------------------------------
    // verb surface

    /// RUN: spawn a job, returning its id once the agent saw it RUNNING.
    pub async fn submit(&self, command: &str) -> Result<JobId, RjError> {
        let payload = self
            .request(
                &Verb::Run {
                    command: command.to_string(),
                },
                self.read_timeout,
            )
            .await?;

        let token = payload
            .split_whitespace()
            .next()
            .ok_or_else(|| RjError::NoSuccess("empty RUN reply".to_string()))?;
        let id = JobId::new(token);
        if !id.is_numeric() {
            return Err(RjError::NoSuccess(format!(
                "unexpected RUN reply '{}'",
                payload
            )));
        }
        Ok(id)
    }

    /// STATE: current state token.
    pub async fn state(&self, id: &JobId) -> Result<JobState, RjError> {
        let payload = self
            .request(&Verb::State { id: id.clone() }, self.read_timeout)
            .await?;
        JobState::parse_token(&payload)
    }

    /// WAIT: block server-side until terminal or until the timeout, then
    /// report the state found last.
    pub async fn wait_job(
        &self,
        id: &JobId,
        timeout: Option<Duration>,
    ) -> Result<JobState, RjError> {
        let timeout_secs = timeout.map(|t| t.as_secs().max(1));
        let read_timeout = timeout.map(|t| t + WAIT_GRACE).unwrap_or(WAIT_FOREVER);
        let payload = self
            .request(
                &Verb::Wait {
                    id: id.clone(),
                    timeout_secs,
                },
                read_timeout,
            )
            .await?;
        JobState::parse_token(&payload)
    }

    /// RESULT: exit code of a terminal job.
    pub async fn result(&self, id: &JobId) -> Result<i32, RjError> {
        let payload = self
            .request(&Verb::Result { id: id.clone() }, self.read_timeout)
            .await?;
        payload
            .trim()
            .parse()
            .map_err(|_| RjError::EncodingError(format!("exit code '{}'", payload.trim())))
    }

    pub async fn suspend(&self, id: &JobId) -> Result<(), RjError> {
        self.request(&Verb::Suspend { id: id.clone() }, self.read_timeout)
            .await
            .map(|_| ())
    }

    pub async fn resume(&self, id: &JobId) -> Result<(), RjError> {
        self.request(&Verb::Resume { id: id.clone() }, self.read_timeout)
            .await
            .map(|_| ())
    }

    pub async fn cancel(&self, id: &JobId) -> Result<(), RjError> {
        self.request(&Verb::Cancel { id: id.clone() }, self.read_timeout)
            .await
            .map(|_| ())
    }

    /// STDIN: append one line to the job's input feed.
    pub async fn stdin(&self, id: &JobId, data: &str) -> Result<(), RjError> {
        self.request(
            &Verb::Stdin {
                id: id.clone(),
                data: data.to_string(),
            },
            self.read_timeout,
        )
        .await
        .map(|_| ())
    }

    /// STDOUT: captured standard output, decoded.
    pub async fn stdout(&self, id: &JobId) -> Result<Vec<u8>, RjError> {
        let payload = self
            .request(&Verb::Stdout { id: id.clone() }, self.read_timeout)
            .await?;
        uudecode(&payload)
    }

    /// STDERR: captured standard error, decoded.
    pub async fn stderr(&self, id: &JobId) -> Result<Vec<u8>, RjError> {
        let payload = self
            .request(&Verb::Stderr { id: id.clone() }, self.read_timeout)
            .await?;
        uudecode(&payload)
    }

    /// LIST: ids of every job record in the agent's BASE.
    pub async fn list(&self) -> Result<Vec<JobId>, RjError> {
        let payload = self.request(&Verb::List, self.read_timeout).await?;
        Ok(payload
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(JobId::new)
            .collect())
    }

    /// PURGE: drop one job record, or sweep every terminal one.
    pub async fn purge(&self, id: Option<&JobId>) -> Result<(), RjError> {
        self.request(&Verb::Purge { id: id.cloned() }, self.read_timeout)
            .await
            .map(|_| ())
    }

    /// NOOP keepalive; only the next prompt comes back.
    pub async fn noop(&self) -> Result<(), RjError> {
        let line = encode(&Verb::Noop)?;
        let mut channel = self.channel.lock().await;
        channel.write_line(&line).await?;
        channel.read_prompt(self.read_timeout).await?;
        Ok(())
    }

    /// QUIT and close the transport. The agent exits without a reply frame.
    pub async fn quit(&self) -> Result<(), RjError> {
        let line = encode(&Verb::Quit)?;
        let mut channel = self.channel.lock().await;
        channel.write_line(&line).await?;
        channel.close().await
    }

    /// Reflect a job state observed on the wire into the task handle,
    /// fetching the exit code where the state machine requires one.
    async fn apply_job_state(
        &self,
        task: &Task,
        id: &JobId,
        state: JobState,
    ) -> Result<(), RjError> {
        match state {
            JobState::Done => {
                let code = self.result(id).await?;
                task.set_result(TaskValue::ExitCode(code));
            }
            JobState::Failed => {
                let code = self.result(id).await?;
                task.fail(RjError::NoSuccess(format!(
                    "job {} exited with code {}",
                    id, code
                )));
            }
            JobState::Canceled => task.set_state(TaskState::Canceled),
            other => task.set_state(other.task_state()),
        }
        Ok(())
    }
}

#[async_trait]
impl TaskAdaptor for JobAgent {
    fn key(&self) -> &str {
        &self.key
    }

    fn bulk(&self) -> Option<&dyn BulkAdaptor> {
        Some(self)
    }

    async fn task_run(&self, task: &Task) -> Result<(), RjError> {
        let Some(command) = task.command() else {
            return Err(RjError::BadParameter(
                "remote adaptor cannot run a local callable".to_string(),
            ));
        };
        let id = self.submit(&command).await?;
        task.set_job_id(id);
        task.set_state(TaskState::Running);
        Ok(())
    }

    async fn task_wait(&self, task: &Task, timeout: Option<Duration>) -> Result<bool, RjError> {
        let Some(id) = task.job_id() else {
            return Err(RjError::IncorrectState(format!(
                "{} has not been started",
                task.label()
            )));
        };
        let state = self.wait_job(&id, timeout).await?;
        self.apply_job_state(task, &id, state).await?;
        Ok(task.state().is_terminal())
    }

    async fn task_cancel(&self, task: &Task) -> Result<(), RjError> {
        let Some(id) = task.job_id() else {
            return Err(RjError::IncorrectState(format!(
                "{} has not been started",
                task.label()
            )));
        };
        self.cancel(&id).await?;
        task.set_state(TaskState::Canceled);
        Ok(())
    }

    async fn task_state(&self, task: &Task) -> Result<TaskState, RjError> {
        let Some(id) = task.job_id() else {
            return Ok(task.state());
        };
        let state = self.state(&id).await?;
        self.apply_job_state(task, &id, state).await?;
        Ok(task.state())
    }
}

#[async_trait]
impl BulkAdaptor for JobAgent {
    fn supports(&self, method: Method) -> bool {
        matches!(
            method,
            Method::Run | Method::Wait | Method::Cancel | Method::States
        )
    }

    async fn container_run(&self, tasks: &[Task]) -> Result<(), RjError> {
        for task in tasks {
            self.task_run(task).await?;
        }
        Ok(())
    }

    /// ALL applies the timeout per task, not to the bucket as a whole; ANY
    /// polls states in bounded slices until one task is terminal.
    async fn container_wait(
        &self,
        tasks: &[Task],
        mode: WaitMode,
        timeout: Option<Duration>,
    ) -> Result<Option<Task>, RjError> {
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
                    tokio::time::sleep(ANY_POLL_SLICE).await;
                }
            }
        }
    }

    async fn container_cancel(
        &self,
        tasks: &[Task],
        _timeout: Option<Duration>,
    ) -> Result<(), RjError> {
        let mut first_error = None;
        for task in tasks {
            if let Err(e) = self.task_cancel(task).await {
                tracing::warn!(task = %task.label(), error = %e, "bulk cancel member failed");
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            None => Ok(()),
            Some(e) => Err(e),
        }
    }

    async fn container_get_states(&self, tasks: &[Task]) -> Result<Vec<TaskState>, RjError> {
        let mut states = Vec::with_capacity(tasks.len());
        for task in tasks {
            states.push(self.task_state(task).await?);
        }
        Ok(states)
    }
}

#[cfg(test)]
#[path = "agent_tests.rs"]
mod tests;
