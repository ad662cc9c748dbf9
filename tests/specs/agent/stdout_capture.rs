//! Captured stream retrieval and uuencode round trips.

use crate::prelude::*;

#[tokio::test]
async fn stdout_round_trips_through_uuencode() {
    let spec = spawn_agent().await;

    let id = spec.agent.submit("echo hello").await.unwrap();
    spec.agent.wait_job(&id, Some(DEADLINE)).await.unwrap();

    let out = spec.agent.stdout(&id).await.unwrap();
    assert_eq!(out, b"hello\n");

    spec.agent.quit().await.unwrap();
}

#[tokio::test]
async fn stderr_is_captured_separately() {
    let spec = spawn_agent().await;

    let id = spec
        .agent
        .submit("echo to-out; echo to-err 1>&2")
        .await
        .unwrap();
    spec.agent.wait_job(&id, Some(DEADLINE)).await.unwrap();

    assert_eq!(spec.agent.stdout(&id).await.unwrap(), b"to-out\n");
    assert_eq!(spec.agent.stderr(&id).await.unwrap(), b"to-err\n");

    spec.agent.quit().await.unwrap();
}

#[tokio::test]
async fn multi_line_output_survives_the_encoding() {
    let spec = spawn_agent().await;

    // enough bytes to force many 45-byte uuencode lines
    let id = spec.agent.submit("seq 1 500").await.unwrap();
    spec.agent.wait_job(&id, Some(DEADLINE)).await.unwrap();

    let expected: String = (1..=500).map(|n| format!("{}\n", n)).collect();
    let out = spec.agent.stdout(&id).await.unwrap();
    assert_eq!(out, expected.as_bytes());

    spec.agent.quit().await.unwrap();
}

#[tokio::test]
async fn binary_output_round_trips() {
    let spec = spawn_agent().await;

    // a NUL and a 0xff in the middle of the payload
    let id = spec
        .agent
        .submit("printf 'a\\000b\\377c'")
        .await
        .unwrap();
    spec.agent.wait_job(&id, Some(DEADLINE)).await.unwrap();

    let out = spec.agent.stdout(&id).await.unwrap();
    assert_eq!(out, vec![b'a', 0x00, b'b', 0xff, b'c']);

    spec.agent.quit().await.unwrap();
}

#[tokio::test]
async fn empty_output_decodes_to_nothing() {
    let spec = spawn_agent().await;

    let id = spec.agent.submit("true").await.unwrap();
    spec.agent.wait_job(&id, Some(DEADLINE)).await.unwrap();

    assert_eq!(spec.agent.stdout(&id).await.unwrap(), Vec::<u8>::new());

    spec.agent.quit().await.unwrap();
}
