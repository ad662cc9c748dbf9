// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Client configuration.
//!
//! Loaded from `~/.config/rj/config.toml` when present, then overridden by
//! environment variables (see `env.rs`). Everything has a sensible default;
//! a missing file is not an error.

use crate::env;
use rj_agent::AgentConfig;
use rj_core::RjError;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Remote root directory for job records (shell-expanded remotely).
    pub base_dir: String,
    /// Remote directory the agent script is installed into.
    pub script_dir: String,
    /// Seconds of inactivity after which an agent session self-terminates.
    pub idle_timeout_secs: u64,
    /// Transport command; its stdin/stdout are the shell channel.
    pub shell: Vec<String>,
    /// Per-read reply timeout in milliseconds.
    pub read_timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_dir: "$HOME/.rj/jobs".to_string(),
            script_dir: "$HOME/.rj".to_string(),
            idle_timeout_secs: 30,
            shell: vec!["/bin/sh".to_string()],
            read_timeout_ms: 10_000,
        }
    }
}

impl Config {
    /// Load the user config file (when present) and apply env overrides.
    pub fn load() -> Result<Self, RjError> {
        let mut config = match Self::user_config_path() {
            Some(path) if path.exists() => {
                let text = std::fs::read_to_string(&path).map_err(|e| {
                    RjError::BadParameter(format!("cannot read {}: {}", path.display(), e))
                })?;
                Self::from_toml(&text)?
            }
            _ => Self::default(),
        };
        config.apply_env();
        Ok(config)
    }

    /// Parse a config from TOML text.
    pub fn from_toml(text: &str) -> Result<Self, RjError> {
        toml::from_str(text).map_err(|e| RjError::BadParameter(format!("config parse: {}", e)))
    }

    /// Environment variables win over file values.
    pub fn apply_env(&mut self) {
        if let Some(dir) = env::base_dir() {
            self.base_dir = dir;
        }
        if let Some(dir) = env::script_dir() {
            self.script_dir = dir;
        }
        if let Some(secs) = env::idle_timeout_secs() {
            self.idle_timeout_secs = secs;
        }
        if let Some(shell) = env::shell() {
            self.shell = shell;
        }
        if let Some(ms) = env::read_timeout_ms() {
            self.read_timeout_ms = ms;
        }
    }

    fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("rj").join("config.toml"))
    }

    /// The remote-side settings baked into the agent script.
    pub fn agent_config(&self) -> AgentConfig {
        AgentConfig {
            base_dir: self.base_dir.clone(),
            script_dir: self.script_dir.clone(),
            idle_timeout_secs: self.idle_timeout_secs,
        }
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
