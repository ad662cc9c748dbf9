// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the adaptors crate.

/// Remote job record root (`RJ_BASE_DIR`).
pub fn base_dir() -> Option<String> {
    std::env::var("RJ_BASE_DIR").ok().filter(|s| !s.is_empty())
}

/// Remote agent install directory (`RJ_SCRIPT_DIR`).
pub fn script_dir() -> Option<String> {
    std::env::var("RJ_SCRIPT_DIR").ok().filter(|s| !s.is_empty())
}

/// Agent idle timeout in seconds (`RJ_IDLE_TIMEOUT_SECS`).
pub fn idle_timeout_secs() -> Option<u64> {
    std::env::var("RJ_IDLE_TIMEOUT_SECS")
        .ok()
        .and_then(|s| s.parse().ok())
}

/// Transport command, whitespace separated (`RJ_SHELL`, e.g. `ssh host sh`).
pub fn shell() -> Option<Vec<String>> {
    std::env::var("RJ_SHELL").ok().and_then(|s| {
        let parts: Vec<String> = s.split_whitespace().map(str::to_string).collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts)
        }
    })
}

/// Per-read reply timeout in milliseconds (`RJ_READ_TIMEOUT_MS`).
pub fn read_timeout_ms() -> Option<u64> {
    std::env::var("RJ_READ_TIMEOUT_MS")
        .ok()
        .and_then(|s| s.parse().ok())
}
