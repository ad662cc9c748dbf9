// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Method descriptors for bulk dispatch.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The semantic operation a task represents, and the key by which containers
/// route buckets of tasks to an adaptor's bulk entry points.
///
/// An adaptor declares which of these it can handle in bulk via
/// `BulkAdaptor::supports`; the container dispatches by this table rather
/// than by reflection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    /// Submit the task's job (`container_run`)
    Run,
    /// Wait for tasks to reach a terminal state (`container_wait`)
    Wait,
    /// Cancel tasks (`container_cancel`)
    Cancel,
    /// Collect task states (`container_get_states`)
    States,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Run => write!(f, "run"),
            Method::Wait => write!(f, "wait"),
            Method::Cancel => write!(f, "cancel"),
            Method::States => write!(f, "states"),
        }
    }
}

#[cfg(test)]
#[path = "method_tests.rs"]
mod tests;
