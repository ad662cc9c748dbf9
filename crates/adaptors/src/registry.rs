// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Explicit adaptor registry.
//!
//! Constructed at startup and threaded through whoever builds tasks; keeps
//! every live agent session reachable by key without any global state.

use crate::agent::JobAgent;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Default)]
pub struct AdaptorRegistry {
    agents: RwLock<HashMap<String, Arc<JobAgent>>>,
}

impl AdaptorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session under its own key; replaces a stale entry.
    pub fn insert(&self, agent: Arc<JobAgent>) {
        use rj_task::TaskAdaptor;
        self.agents
            .write()
            .insert(agent.key().to_string(), agent.clone());
    }

    pub fn get(&self, key: &str) -> Option<Arc<JobAgent>> {
        self.agents.read().get(key).cloned()
    }

    pub fn remove(&self, key: &str) -> Option<Arc<JobAgent>> {
        self.agents.write().remove(key)
    }

    pub fn keys(&self) -> Vec<String> {
        self.agents.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.agents.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.read().is_empty()
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
