//! Content-addressed install of the agent script.

use crate::prelude::*;
use rj_adaptors::JobAgent;

#[tokio::test]
async fn install_is_reused_across_sessions() {
    let spec = spawn_agent().await;

    // a second session against the same script dir re-uses the install
    let second = JobAgent::connect(&spec.config).await.unwrap();

    let scripts: Vec<_> = std::fs::read_dir(spec.script_dir())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| {
            let name = e.file_name().to_string_lossy().to_string();
            name.starts_with("agent-") && name.ends_with(".sh")
        })
        .collect();
    assert_eq!(scripts.len(), 1, "installs: {:?}", scripts);

    // both sessions serve verbs independently
    let a = spec.agent.submit("true").await.unwrap();
    let b = second.submit("true").await.unwrap();
    spec.agent.wait_job(&a, Some(DEADLINE)).await.unwrap();
    second.wait_job(&b, Some(DEADLINE)).await.unwrap();

    spec.agent.quit().await.unwrap();
    second.quit().await.unwrap();
}

#[tokio::test]
async fn installed_script_matches_rendered_content() {
    let spec = spawn_agent().await;

    let script = rj_agent::AgentScript::new(spec.config.agent_config());
    let installed = spec
        .script_dir()
        .join(format!("agent-{}.sh", &script.content_hash()[..16]));
    let on_disk = std::fs::read_to_string(&installed).unwrap();
    assert_eq!(on_disk.trim_end_matches('\n'), script.text().trim_end_matches('\n'));

    spec.agent.quit().await.unwrap();
}
