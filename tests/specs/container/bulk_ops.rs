//! Container bulk operations against one live agent.

use crate::prelude::*;
use rj_core::{LaunchMode, TaskState, WaitMode};
use rj_task::{Container, Task};

#[tokio::test]
async fn run_wait_all_and_states() {
    let spec = spawn_agent().await;

    let container = Container::new();
    for cmd in ["true", "exit 2", "true"] {
        let task = Task::remote(spec.agent.clone(), cmd, LaunchMode::Deferred)
            .await
            .unwrap();
        container.add(task);
    }
    assert_eq!(container.size(), 3);

    container.run().await.unwrap();
    for task in container.tasks() {
        assert_eq!(task.state(), TaskState::Running);
        assert!(task.job_id().is_some());
    }

    let representative = container.wait(WaitMode::All, Some(DEADLINE)).await.unwrap();
    assert!(representative.is_some());

    let mut states = container.states().await.unwrap();
    states.sort_by_key(|s| s.to_string());
    assert_eq!(
        states,
        vec![TaskState::Done, TaskState::Done, TaskState::Failed]
    );

    spec.agent.quit().await.unwrap();
}

#[tokio::test]
async fn bulk_cancel_stops_the_whole_batch() {
    let spec = spawn_agent().await;

    let container = Container::new();
    for _ in 0..3 {
        let task = Task::remote(spec.agent.clone(), "sleep 30", LaunchMode::Deferred)
            .await
            .unwrap();
        container.add(task);
    }
    container.run().await.unwrap();

    container.cancel(Some(DEADLINE)).await.unwrap();
    for task in container.tasks() {
        assert_eq!(task.state(), TaskState::Canceled);
    }

    spec.agent.quit().await.unwrap();
}

#[tokio::test]
async fn mixed_local_and_remote_members() {
    let spec = spawn_agent().await;

    let container = Container::new();
    let remote = Task::remote(spec.agent.clone(), "true", LaunchMode::Deferred)
        .await
        .unwrap();
    let local = Task::local(
        async { Ok(rj_task::TaskValue::Text("local".to_string())) },
        LaunchMode::Deferred,
    )
    .await
    .unwrap();
    container.add(remote.clone());
    container.add(local.clone());

    container.run().await.unwrap();
    container.wait(WaitMode::All, Some(DEADLINE)).await.unwrap();

    assert_eq!(remote.state(), TaskState::Done);
    assert_eq!(local.state(), TaskState::Done);

    spec.agent.quit().await.unwrap();
}
