// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! rj-adaptors: the agent session client and its wiring.
//!
//! `JobAgent` owns one live agent session: it bootstraps the remote script,
//! serializes verbs over the channel, and backs tasks and containers through
//! the `rj-task` adaptor seams. The registry is an explicit value handed to
//! whoever constructs tasks; there is no process-wide mutable state.

pub mod agent;
pub mod config;
pub mod env;
pub mod registry;

pub use agent::JobAgent;
pub use config::Config;
pub use registry::AdaptorRegistry;
