// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake channel for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use crate::ShellChannel;
use async_trait::async_trait;
use parking_lot::Mutex;
use rj_core::RjError;
use rj_protocol::{decode_frame, parse_prompt, Reply};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

struct FakeChannelState {
    /// The scripted byte stream, one line per entry.
    incoming: VecDeque<String>,
    /// Every line written by the code under test.
    written: Vec<String>,
    closed: bool,
}

/// Scripted channel double.
///
/// Feed it raw lines (or whole OK/ERROR frames) and inspect what was
/// written. Reads past the script behave like a lost transport.
#[derive(Clone)]
pub struct FakeChannel {
    inner: Arc<Mutex<FakeChannelState>>,
}

impl Default for FakeChannel {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeChannelState {
                incoming: VecDeque::new(),
                written: Vec::new(),
                closed: false,
            })),
        }
    }
}

impl FakeChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one raw line to the scripted stream.
    pub fn push_raw(&self, line: impl Into<String>) {
        self.inner.lock().incoming.push_back(line.into());
    }

    /// Append a whole OK frame (payload lines, then the prompt).
    pub fn push_ok(&self, payload: &str) {
        let mut state = self.inner.lock();
        state.incoming.push_back("OK".to_string());
        for line in payload.lines() {
            state.incoming.push_back(line.to_string());
        }
        state.incoming.push_back("PROMPT-0->".to_string());
    }

    /// Append a whole ERROR frame.
    pub fn push_error(&self, message: &str) {
        let mut state = self.inner.lock();
        state.incoming.push_back("ERROR".to_string());
        state.incoming.push_back(message.to_string());
        state.incoming.push_back("PROMPT-1->".to_string());
    }

    /// Append a bare prompt (what a NOOP elicits).
    pub fn push_prompt(&self, status: i32) {
        self.inner
            .lock()
            .incoming
            .push_back(format!("PROMPT-{}->", status));
    }

    /// All lines written so far.
    pub fn written(&self) -> Vec<String> {
        self.inner.lock().written.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.inner.lock().closed
    }

    fn pop_line(&self) -> Result<String, RjError> {
        let mut state = self.inner.lock();
        if state.closed {
            return Err(RjError::ChannelClosed("channel closed".to_string()));
        }
        state
            .incoming
            .pop_front()
            .ok_or_else(|| RjError::ChannelClosed("script exhausted".to_string()))
    }
}

#[async_trait]
impl ShellChannel for FakeChannel {
    async fn write_line(&mut self, line: &str) -> Result<(), RjError> {
        let mut state = self.inner.lock();
        if state.closed {
            return Err(RjError::ChannelClosed("channel closed".to_string()));
        }
        state.written.push(line.trim_end_matches('\n').to_string());
        Ok(())
    }

    async fn read_reply(&mut self, _timeout: Duration) -> Result<Reply, RjError> {
        let mut collected = Vec::new();
        loop {
            let line = self.pop_line()?;
            if let Some(status) = parse_prompt(&line) {
                return decode_frame(&collected, status);
            }
            collected.push(line);
        }
    }

    async fn read_prompt(&mut self, _timeout: Duration) -> Result<i32, RjError> {
        loop {
            let line = self.pop_line()?;
            if let Some(status) = parse_prompt(&line) {
                return Ok(status);
            }
        }
    }

    async fn read_until(
        &mut self,
        marker: &str,
        _timeout: Duration,
    ) -> Result<Vec<String>, RjError> {
        let mut collected = Vec::new();
        loop {
            let line = self.pop_line()?;
            if line.starts_with(marker) {
                return Ok(collected);
            }
            collected.push(line);
        }
    }

    async fn close(&mut self) -> Result<(), RjError> {
        self.inner.lock().closed = true;
        Ok(())
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
