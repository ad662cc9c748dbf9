//! STDIN verb: feeding a job's input file.

use crate::prelude::*;
use rj_core::JobState;

#[tokio::test]
async fn stdin_reaches_a_reading_job() {
    let spec = spawn_agent().await;

    // the job sleeps long enough for the feed to land, then drains its input
    let id = spec.agent.submit("sleep 1; cat").await.unwrap();
    spec.agent.stdin(&id, "ping").await.unwrap();

    let state = spec.agent.wait_job(&id, Some(DEADLINE)).await.unwrap();
    assert_eq!(state, JobState::Done);
    assert_eq!(spec.agent.stdout(&id).await.unwrap(), b"ping\n");

    spec.agent.quit().await.unwrap();
}

#[tokio::test]
async fn stdin_on_unknown_job_fails() {
    let spec = spawn_agent().await;

    let err = spec
        .agent
        .stdin(&rj_core::JobId::new("31313131"), "data")
        .await
        .unwrap_err();
    assert!(matches!(err, rj_core::RjError::DoesNotExist(_)));

    spec.agent.quit().await.unwrap();
}
