//! RUN / WAIT / RESULT round trips against a live agent.

use crate::prelude::*;
use rj_core::JobState;
use std::time::Duration;

#[tokio::test]
async fn failing_job_reports_its_exit_code() {
    let spec = spawn_agent().await;

    let id = spec.agent.submit("exit 7").await.unwrap();
    assert!(id.is_numeric(), "job id {:?}", id);

    let state = spec.agent.wait_job(&id, Some(DEADLINE)).await.unwrap();
    assert_eq!(state, JobState::Failed);
    assert_eq!(spec.agent.result(&id).await.unwrap(), 7);

    spec.agent.quit().await.unwrap();
}

#[tokio::test]
async fn succeeding_job_is_done_with_exit_zero() {
    let spec = spawn_agent().await;

    let id = spec.agent.submit("true").await.unwrap();
    let state = spec.agent.wait_job(&id, Some(DEADLINE)).await.unwrap();
    assert_eq!(state, JobState::Done);
    assert_eq!(spec.agent.result(&id).await.unwrap(), 0);

    spec.agent.quit().await.unwrap();
}

#[tokio::test]
async fn run_returns_only_after_running() {
    let spec = spawn_agent().await;

    // RUN replies synchronously with a job that has already reached RUNNING,
    // so an immediate STATE can never see NEW
    let id = spec.agent.submit("sleep 3").await.unwrap();
    let state = spec.agent.state(&id).await.unwrap();
    assert!(
        state == JobState::Running || state.is_terminal(),
        "state {:?}",
        state
    );

    spec.agent.cancel(&id).await.unwrap();
    spec.agent.quit().await.unwrap();
}

#[tokio::test]
async fn bounded_wait_on_a_long_job_returns_running() {
    let spec = spawn_agent().await;

    let id = spec.agent.submit("sleep 30").await.unwrap();
    let started = std::time::Instant::now();
    let state = spec
        .agent
        .wait_job(&id, Some(Duration::from_secs(2)))
        .await
        .unwrap();

    assert_eq!(state, JobState::Running);
    assert!(started.elapsed() >= Duration::from_secs(1));
    assert!(started.elapsed() < Duration::from_secs(15));

    spec.agent.cancel(&id).await.unwrap();
    spec.agent.quit().await.unwrap();
}

#[tokio::test]
async fn result_before_terminal_is_incorrect_state() {
    let spec = spawn_agent().await;

    let id = spec.agent.submit("sleep 30").await.unwrap();
    let err = spec.agent.result(&id).await.unwrap_err();
    assert!(matches!(err, rj_core::RjError::IncorrectState(_)));

    spec.agent.cancel(&id).await.unwrap();
    spec.agent.quit().await.unwrap();
}

#[tokio::test]
async fn state_on_unknown_job_is_does_not_exist() {
    let spec = spawn_agent().await;

    let err = spec
        .agent
        .state(&rj_core::JobId::new("999999999"))
        .await
        .unwrap_err();
    assert!(matches!(err, rj_core::RjError::DoesNotExist(_)));

    spec.agent.quit().await.unwrap();
}
