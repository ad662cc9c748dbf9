//! Shared helpers for the behavioral specs.

#![allow(dead_code)]

use rj_adaptors::{Config, JobAgent};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

/// Generous deadline for agent-side waits; individual jobs are much faster.
pub const DEADLINE: Duration = Duration::from_secs(20);

/// Opt-in wire tracing: `RUST_LOG=rj_adaptors=debug cargo test`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// One live agent session rooted in a scratch directory.
pub struct SpecAgent {
    /// Keeps the scratch directory alive for the duration of the test.
    pub scratch: TempDir,
    pub config: Config,
    pub agent: Arc<JobAgent>,
}

impl SpecAgent {
    /// The agent's BASE directory on the (local) remote side.
    pub fn jobs_dir(&self) -> PathBuf {
        PathBuf::from(&self.config.base_dir)
    }

    /// Directory the agent script was installed into.
    pub fn script_dir(&self) -> PathBuf {
        PathBuf::from(&self.config.script_dir)
    }
}

/// Bring up an agent whose idle timeout is long enough to never fire
/// within a test.
pub async fn spawn_agent() -> SpecAgent {
    spawn_agent_with_idle(120).await
}

pub async fn spawn_agent_with_idle(idle_timeout_secs: u64) -> SpecAgent {
    init_tracing();
    let scratch = TempDir::new().unwrap();
    let config = Config {
        base_dir: scratch.path().join("jobs").display().to_string(),
        script_dir: scratch.path().join("bin").display().to_string(),
        idle_timeout_secs,
        shell: vec!["/bin/sh".to_string()],
        read_timeout_ms: 20_000,
    };
    let agent = JobAgent::connect(&config).await.unwrap();
    SpecAgent {
        scratch,
        config,
        agent,
    }
}
