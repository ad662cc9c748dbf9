//! ANY-mode waits: the first finisher wins, the rest keep running.

use crate::prelude::*;
use rj_core::{LaunchMode, TaskState, WaitMode};
use rj_task::{Container, Task};
use std::time::{Duration, Instant};

#[tokio::test]
async fn any_returns_the_fastest_job() {
    let spec = spawn_agent().await;

    let container = Container::new();
    let fast = Task::remote(spec.agent.clone(), "sleep 1", LaunchMode::Deferred)
        .await
        .unwrap();
    let medium = Task::remote(spec.agent.clone(), "sleep 8", LaunchMode::Deferred)
        .await
        .unwrap();
    let slow = Task::remote(spec.agent.clone(), "sleep 30", LaunchMode::Deferred)
        .await
        .unwrap();
    container.add(fast.clone());
    container.add(medium.clone());
    container.add(slow.clone());
    container.run().await.unwrap();

    let started = Instant::now();
    let winner = container
        .wait(WaitMode::Any, Some(DEADLINE))
        .await
        .unwrap()
        .expect("one task should finish");

    assert_eq!(winner, fast);
    assert!(
        started.elapsed() < Duration::from_secs(6),
        "ANY took {:?}",
        started.elapsed()
    );
    assert_eq!(medium.state(), TaskState::Running);
    assert_eq!(slow.state(), TaskState::Running);

    // the winner is terminal and may not be canceled; drop it first
    container.remove(&winner);
    container.cancel(Some(DEADLINE)).await.unwrap();
    spec.agent.quit().await.unwrap();
}

#[tokio::test]
async fn any_with_no_finisher_returns_empty() {
    let spec = spawn_agent().await;

    let container = Container::new();
    let task = Task::remote(spec.agent.clone(), "sleep 30", LaunchMode::Deferred)
        .await
        .unwrap();
    container.add(task.clone());
    container.run().await.unwrap();

    let winner = container
        .wait(WaitMode::Any, Some(Duration::from_secs(1)))
        .await
        .unwrap();
    assert!(winner.is_none());
    assert_eq!(task.state(), TaskState::Running);

    container.cancel(Some(DEADLINE)).await.unwrap();
    spec.agent.quit().await.unwrap();
}
