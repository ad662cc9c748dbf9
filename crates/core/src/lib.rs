// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! rj-core: shared model for the rj remote job toolkit

pub mod error;
pub mod id;
pub mod method;
pub mod state;

pub use error::RjError;
pub use id::JobId;
pub use method::Method;
pub use state::{JobState, LaunchMode, TaskState, WaitMode};
