// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Channel over a shell subprocess.
//!
//! The subprocess is the transport: locally `/bin/sh`, in production
//! something like `ssh host /bin/sh`. Its stdin receives command lines, its
//! stdout carries the agent's framed replies. Stdio pipes never echo, so no
//! terminal fiddling is needed on this side; the agent still runs `stty` for
//! transports that do allocate a pty.

use crate::ShellChannel;
use async_trait::async_trait;
use rj_core::RjError;
use rj_protocol::{decode_frame, parse_prompt, Reply};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::time::Instant;

/// Shell channel over a piped subprocess.
pub struct ProcessChannel {
    child: Child,
    stdin: Option<ChildStdin>,
    lines: Lines<BufReader<ChildStdout>>,
}

impl ProcessChannel {
    /// Spawn the transport command (program + args) with piped stdio.
    pub fn open(command: &[String]) -> Result<Self, RjError> {
        let (program, args) = command
            .split_first()
            .ok_or_else(|| RjError::BadParameter("empty channel command".to_string()))?;

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| RjError::ChannelClosed(format!("spawn {}: {}", program, e)))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| RjError::ChannelClosed("no stdin pipe".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| RjError::ChannelClosed("no stdout pipe".to_string()))?;

        tracing::debug!(%program, "channel opened");

        Ok(Self {
            child,
            stdin: Some(stdin),
            lines: BufReader::new(stdout).lines(),
        })
    }

    /// Open a channel to the local `/bin/sh` (the degenerate remote host).
    pub fn open_local_sh() -> Result<Self, RjError> {
        Self::open(&["/bin/sh".to_string()])
    }

    async fn next_line(&mut self, deadline: Instant) -> Result<String, RjError> {
        let read = tokio::time::timeout_at(deadline, self.lines.next_line())
            .await
            .map_err(|_| RjError::Timeout("read timed out waiting for reply".to_string()))?;

        match read {
            Ok(Some(line)) => Ok(line),
            Ok(None) => Err(RjError::ChannelClosed("stream ended".to_string())),
            Err(e) => Err(RjError::ChannelClosed(format!("read failed: {}", e))),
        }
    }
}

#[async_trait]
impl ShellChannel for ProcessChannel {
    async fn write_line(&mut self, line: &str) -> Result<(), RjError> {
        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| RjError::ChannelClosed("channel closed".to_string()))?;

        stdin
            .write_all(line.as_bytes())
            .await
            .map_err(|e| RjError::ChannelClosed(format!("write failed: {}", e)))?;
        if !line.ends_with('\n') {
            stdin
                .write_all(b"\n")
                .await
                .map_err(|e| RjError::ChannelClosed(format!("write failed: {}", e)))?;
        }
        stdin
            .flush()
            .await
            .map_err(|e| RjError::ChannelClosed(format!("flush failed: {}", e)))
    }

    async fn read_reply(&mut self, timeout: Duration) -> Result<Reply, RjError> {
        let deadline = Instant::now() + timeout;
        let mut collected = Vec::new();

        loop {
            let line = self.next_line(deadline).await?;
            if let Some(status) = parse_prompt(&line) {
                tracing::trace!(status, lines = collected.len(), "reply frame");
                return decode_frame(&collected, status);
            }
            collected.push(line);
        }
    }

    async fn read_prompt(&mut self, timeout: Duration) -> Result<i32, RjError> {
        let deadline = Instant::now() + timeout;

        loop {
            let line = self.next_line(deadline).await?;
            if let Some(status) = parse_prompt(&line) {
                return Ok(status);
            }
            tracing::trace!(line = %line, "pre-prompt output");
        }
    }

    async fn read_until(
        &mut self,
        marker: &str,
        timeout: Duration,
    ) -> Result<Vec<String>, RjError> {
        let deadline = Instant::now() + timeout;
        let mut collected = Vec::new();

        loop {
            let line = self.next_line(deadline).await?;
            if line.starts_with(marker) {
                return Ok(collected);
            }
            collected.push(line);
        }
    }

    async fn close(&mut self) -> Result<(), RjError> {
        // Dropping stdin sends EOF; the shell exits on its own. The kill is
        // a backstop for transports that ignore EOF.
        self.stdin = None;
        match tokio::time::timeout(Duration::from_secs(2), self.child.wait()).await {
            Ok(_) => {}
            Err(_) => {
                tracing::warn!("transport ignored EOF, killing");
                let _ = self.child.kill().await;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "process_tests.rs"]
mod tests;
