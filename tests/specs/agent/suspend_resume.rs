//! SUSPEND / RESUME marker coordination.

use crate::prelude::*;
use rj_core::JobState;

#[tokio::test]
async fn suspend_then_resume_then_done() {
    let spec = spawn_agent().await;

    let id = spec.agent.submit("sleep 2").await.unwrap();

    spec.agent.suspend(&id).await.unwrap();
    assert_eq!(spec.agent.state(&id).await.unwrap(), JobState::Suspended);

    spec.agent.resume(&id).await.unwrap();
    let state = spec.agent.state(&id).await.unwrap();
    assert!(
        state == JobState::Running || state.is_terminal(),
        "state after resume: {:?}",
        state
    );

    // natural completion with the true exit code, despite the suspend cycle
    let state = spec.agent.wait_job(&id, Some(DEADLINE)).await.unwrap();
    assert_eq!(state, JobState::Done);
    assert_eq!(spec.agent.result(&id).await.unwrap(), 0);

    spec.agent.quit().await.unwrap();
}

#[tokio::test]
async fn suspend_requires_running() {
    let spec = spawn_agent().await;

    let id = spec.agent.submit("true").await.unwrap();
    spec.agent.wait_job(&id, Some(DEADLINE)).await.unwrap();

    let err = spec.agent.suspend(&id).await.unwrap_err();
    assert!(matches!(err, rj_core::RjError::IncorrectState(_)));

    spec.agent.quit().await.unwrap();
}

#[tokio::test]
async fn resume_requires_suspended() {
    let spec = spawn_agent().await;

    let id = spec.agent.submit("sleep 5").await.unwrap();
    let err = spec.agent.resume(&id).await.unwrap_err();
    assert!(matches!(err, rj_core::RjError::IncorrectState(_)));

    spec.agent.cancel(&id).await.unwrap();
    spec.agent.quit().await.unwrap();
}

#[tokio::test]
async fn suspended_job_can_be_canceled() {
    let spec = spawn_agent().await;

    let id = spec.agent.submit("sleep 30").await.unwrap();
    spec.agent.suspend(&id).await.unwrap();
    assert_eq!(spec.agent.state(&id).await.unwrap(), JobState::Suspended);

    spec.agent.cancel(&id).await.unwrap();
    let state = spec.agent.wait_job(&id, Some(DEADLINE)).await.unwrap();
    assert_eq!(state, JobState::Canceled);

    spec.agent.quit().await.unwrap();
}
