//! Raw wire exchanges with an agent launched by hand.
//!
//! These specs bypass the adaptor layer: the agent script is rendered to a
//! file and run directly as the channel command, so every byte of framing
//! is visible.

use rj_agent::{AgentConfig, AgentScript};
use rj_channel::{ProcessChannel, ShellChannel};
use rj_protocol::{map_agent_error, ReplyStatus};
use std::time::Duration;
use tempfile::TempDir;

const T: Duration = Duration::from_secs(10);

struct RawAgent {
    _scratch: TempDir,
    channel: ProcessChannel,
}

async fn launch_raw() -> RawAgent {
    let scratch = TempDir::new().unwrap();
    let script = AgentScript::new(AgentConfig {
        base_dir: scratch.path().join("jobs").display().to_string(),
        script_dir: scratch.path().join("bin").display().to_string(),
        idle_timeout_secs: 120,
    });
    let path = scratch.path().join("agent.sh");
    std::fs::write(&path, script.text()).unwrap();

    let mut channel = ProcessChannel::open(&[
        "/bin/sh".to_string(),
        path.display().to_string(),
        "7777".to_string(),
    ])
    .unwrap();

    // greeting: PID echo, then the first prompt
    let preamble = channel.read_until("PROMPT-", T).await.unwrap();
    assert_eq!(preamble, vec!["PID: 7777".to_string()]);

    RawAgent {
        _scratch: scratch,
        channel,
    }
}

#[tokio::test]
async fn greeting_reports_the_client_pid() {
    let mut raw = launch_raw().await;
    raw.channel.write_line("QUIT").await.unwrap();
}

#[tokio::test]
async fn unknown_verb_elicits_error_and_keeps_the_session() {
    let mut raw = launch_raw().await;

    raw.channel.write_line("FROB 1 2").await.unwrap();
    let reply = raw.channel.read_reply(T).await.unwrap();
    assert_eq!(reply.status, ReplyStatus::Error);
    assert!(reply.payload.contains("FROB unknown (FROB 1 2)"));
    assert!(reply.handler_status != 0);
    assert!(matches!(
        map_agent_error(&reply.payload),
        rj_core::RjError::BadParameter(_)
    ));

    // the loop prompts again and keeps serving
    raw.channel.write_line("LIST").await.unwrap();
    let reply = raw.channel.read_reply(T).await.unwrap();
    assert_eq!(reply.status, ReplyStatus::Ok);

    raw.channel.write_line("QUIT").await.unwrap();
}

#[tokio::test]
async fn verbs_are_case_insensitive_on_the_wire() {
    let mut raw = launch_raw().await;

    raw.channel.write_line("list").await.unwrap();
    let reply = raw.channel.read_reply(T).await.unwrap();
    assert_eq!(reply.status, ReplyStatus::Ok);

    raw.channel.write_line("QUIT").await.unwrap();
}

#[tokio::test]
async fn noop_and_blank_lines_elicit_only_a_prompt() {
    let mut raw = launch_raw().await;

    raw.channel.write_line("NOOP").await.unwrap();
    assert_eq!(raw.channel.read_prompt(T).await.unwrap(), 0);

    raw.channel.write_line("").await.unwrap();
    assert_eq!(raw.channel.read_prompt(T).await.unwrap(), 0);

    raw.channel.write_line("QUIT").await.unwrap();
}

#[tokio::test]
async fn log_verb_echoes_its_arguments() {
    let mut raw = launch_raw().await;

    raw.channel.write_line("LOG marco polo").await.unwrap();
    let reply = raw.channel.read_reply(T).await.unwrap();
    assert_eq!(reply.status, ReplyStatus::Ok);

    raw.channel.write_line("QUIT").await.unwrap();
}

#[tokio::test]
async fn quit_ends_the_stream() {
    let mut raw = launch_raw().await;

    raw.channel.write_line("QUIT").await.unwrap();
    let err = raw.channel.read_prompt(T).await.unwrap_err();
    assert!(matches!(err, rj_core::RjError::ChannelClosed(_)));
}

#[tokio::test]
async fn missing_argument_is_reported() {
    let mut raw = launch_raw().await;

    raw.channel.write_line("STATE").await.unwrap();
    let reply = raw.channel.read_reply(T).await.unwrap();
    assert_eq!(reply.status, ReplyStatus::Error);
    assert!(reply.payload.contains("no pid given"));

    raw.channel.write_line("QUIT").await.unwrap();
}
