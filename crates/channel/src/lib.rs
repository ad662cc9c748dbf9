// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! rj-channel: the duplex byte stream to the remote host.
//!
//! A channel is dumb on purpose: it writes lines and reads prompt-delimited
//! reply frames. Everything protocol-shaped lives in `rj-protocol`;
//! serialization of concurrent callers lives in the session layer above.

mod process;

pub use process::ProcessChannel;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeChannel;

use async_trait::async_trait;
use rj_core::RjError;
use rj_protocol::Reply;
use std::time::Duration;

/// One duplex line stream to a remote shell.
///
/// A single channel serializes writes; callers that need concurrency must
/// multiplex at a higher layer (a container may open several sessions to the
/// same host). A closed channel fails every pending and future read with
/// `ChannelClosed`.
#[async_trait]
pub trait ShellChannel: Send + Sync {
    /// Send one line; the terminator is appended when missing.
    async fn write_line(&mut self, line: &str) -> Result<(), RjError>;

    /// Consume bytes until a `PROMPT-<n>->` line, classify the preceding
    /// block by its OK/ERROR tag. Timeouts are per-read.
    async fn read_reply(&mut self, timeout: Duration) -> Result<Reply, RjError>;

    /// Consume bytes until a prompt and return only the handler status.
    /// Used for NOOP keepalives and for the session greeting, which carry
    /// no tagged payload.
    async fn read_prompt(&mut self, timeout: Duration) -> Result<i32, RjError>;

    /// Read raw lines until one starts with `marker` (bootstrap phase,
    /// before the agent's framing exists). The marker line is not returned.
    async fn read_until(&mut self, marker: &str, timeout: Duration)
        -> Result<Vec<String>, RjError>;

    /// Close the stream. Pending reads fail with `ChannelClosed`.
    async fn close(&mut self) -> Result<(), RjError>;
}
