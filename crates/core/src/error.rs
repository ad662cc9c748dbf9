// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error taxonomy shared by every layer of the stack.
//!
//! Agent ERROR frames, codec failures, and channel faults all fold into this
//! one enum so that task exception slots and container aggregation have
//! a single currency. The enum is `Clone` because a stored task exception
//! is re-raised on every `result()` call.

use thiserror::Error;

/// Unified error for remote job operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RjError {
    /// The underlying operation failed on the remote host.
    #[error("operation failed: {0}")]
    NoSuccess(String),

    /// The operation is not legal in the current state.
    #[error("incorrect state: {0}")]
    IncorrectState(String),

    /// Malformed verb or arguments.
    #[error("bad parameter: {0}")]
    BadParameter(String),

    /// The referenced job id has no record.
    #[error("does not exist: {0}")]
    DoesNotExist(String),

    /// A wait elapsed before the condition held.
    #[error("timeout: {0}")]
    Timeout(String),

    /// The transport to the remote host was lost.
    #[error("channel closed: {0}")]
    ChannelClosed(String),

    /// A payload cannot be framed or decoded.
    #[error("encoding error: {0}")]
    EncodingError(String),
}

impl RjError {
    /// True for errors that indicate the session itself is unusable,
    /// as opposed to a single operation failing.
    pub fn is_fatal(&self) -> bool {
        matches!(self, RjError::ChannelClosed(_))
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
