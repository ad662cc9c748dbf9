//! LIST and PURGE over the job record directory.

use crate::prelude::*;

#[tokio::test]
async fn run_ids_appear_in_list_until_purged() {
    let spec = spawn_agent().await;

    let a = spec.agent.submit("true").await.unwrap();
    let b = spec.agent.submit("false").await.unwrap();

    let listed = spec.agent.list().await.unwrap();
    assert!(listed.contains(&a), "{:?} missing from {:?}", a, listed);
    assert!(listed.contains(&b), "{:?} missing from {:?}", b, listed);

    spec.agent.wait_job(&a, Some(DEADLINE)).await.unwrap();
    spec.agent.wait_job(&b, Some(DEADLINE)).await.unwrap();

    spec.agent.purge(Some(&a)).await.unwrap();
    let listed = spec.agent.list().await.unwrap();
    assert!(!listed.contains(&a));
    assert!(listed.contains(&b));

    spec.agent.quit().await.unwrap();
}

#[tokio::test]
async fn purge_sweep_removes_only_terminal_jobs() {
    let spec = spawn_agent().await;

    let finished = spec.agent.submit("true").await.unwrap();
    let running = spec.agent.submit("sleep 30").await.unwrap();
    spec.agent.wait_job(&finished, Some(DEADLINE)).await.unwrap();

    spec.agent.purge(None).await.unwrap();

    let listed = spec.agent.list().await.unwrap();
    assert!(!listed.contains(&finished));
    assert!(listed.contains(&running));

    spec.agent.cancel(&running).await.unwrap();
    spec.agent.quit().await.unwrap();
}

#[tokio::test]
async fn purge_of_unknown_id_is_does_not_exist() {
    let spec = spawn_agent().await;

    // never-existing id
    let err = spec
        .agent
        .purge(Some(&rj_core::JobId::new("987654321")))
        .await
        .unwrap_err();
    assert!(matches!(err, rj_core::RjError::DoesNotExist(_)));

    // already-purged id: the second purge errors the same way
    let id = spec.agent.submit("true").await.unwrap();
    spec.agent.wait_job(&id, Some(DEADLINE)).await.unwrap();
    spec.agent.purge(Some(&id)).await.unwrap();

    let err = spec.agent.purge(Some(&id)).await.unwrap_err();
    assert!(matches!(err, rj_core::RjError::DoesNotExist(_)));

    spec.agent.quit().await.unwrap();
}

#[tokio::test]
async fn purged_job_is_gone_for_every_verb() {
    let spec = spawn_agent().await;

    let id = spec.agent.submit("true").await.unwrap();
    spec.agent.wait_job(&id, Some(DEADLINE)).await.unwrap();
    spec.agent.purge(Some(&id)).await.unwrap();

    let err = spec.agent.state(&id).await.unwrap_err();
    assert!(matches!(err, rj_core::RjError::DoesNotExist(_)));
    let err = spec.agent.stdout(&id).await.unwrap_err();
    assert!(matches!(err, rj_core::RjError::DoesNotExist(_)));

    spec.agent.quit().await.unwrap();
}
