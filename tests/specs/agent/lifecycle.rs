//! Session lifecycle: keepalives, QUIT, idle self-termination.

use crate::prelude::*;
use std::time::Duration;

#[tokio::test]
async fn noop_keeps_the_session_alive() {
    let spec = spawn_agent().await;

    for _ in 0..3 {
        spec.agent.noop().await.unwrap();
    }
    // still serving verbs afterwards
    let id = spec.agent.submit("true").await.unwrap();
    spec.agent.wait_job(&id, Some(DEADLINE)).await.unwrap();

    spec.agent.quit().await.unwrap();
}

#[tokio::test]
async fn quit_tears_down_the_channel() {
    let spec = spawn_agent().await;
    spec.agent.quit().await.unwrap();

    let err = spec.agent.noop().await.unwrap_err();
    assert!(matches!(err, rj_core::RjError::ChannelClosed(_)));
}

#[tokio::test]
async fn idle_session_times_itself_out() {
    let spec = spawn_agent_with_idle(1).await;

    // no verbs at all; the idle checker needs one interval to plant the
    // marker and a second to act on it
    tokio::time::sleep(Duration::from_secs(4)).await;

    let err = spec.agent.noop().await.unwrap_err();
    assert!(
        matches!(err, rj_core::RjError::ChannelClosed(_)),
        "expected channel loss, got {:?}",
        err
    );

    // the agent left its tombstone in BASE
    let tombstones: Vec<_> = std::fs::read_dir(spec.jobs_dir())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().starts_with("timed_out."))
        .collect();
    assert_eq!(tombstones.len(), 1, "tombstones: {:?}", tombstones);
}

#[tokio::test]
async fn activity_defers_the_idle_timeout() {
    let spec = spawn_agent_with_idle(2).await;

    // keep touching the session for well over one idle interval
    for _ in 0..4 {
        tokio::time::sleep(Duration::from_millis(900)).await;
        spec.agent.noop().await.unwrap();
    }

    let id = spec.agent.submit("true").await.unwrap();
    spec.agent.wait_job(&id, Some(DEADLINE)).await.unwrap();
    spec.agent.quit().await.unwrap();
}
