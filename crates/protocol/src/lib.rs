// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! rj-protocol: line codec for the agent wire protocol.
//!
//! Pure functions, no I/O. Verbs encode to single LF-terminated lines; the
//! agent replies with an `OK`/`ERROR` tag line, a payload, and a
//! `PROMPT-<e>->` sentinel that delimits the frame. STDOUT/STDERR payloads
//! arrive uuencoded.

pub mod frame;
pub mod uu;
pub mod verb;

pub use frame::{decode_frame, map_agent_error, parse_prompt, Reply, ReplyStatus};
pub use uu::{uudecode, uuencode};
pub use verb::{encode, Verb};
