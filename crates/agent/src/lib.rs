// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! rj-agent: the remote job agent and its bootstrap metadata.
//!
//! The agent itself is a POSIX shell program, embedded here as a template.
//! It is uploaded to the remote host on first contact at a path derived from
//! a hash of its rendered content, so multiple client versions can coexist
//! and a cached install can be verified without re-reading it.

pub mod script;

pub use script::{AgentConfig, AgentScript};
