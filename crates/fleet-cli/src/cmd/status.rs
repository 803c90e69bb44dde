use crate::output::{print_json, print_table};
use anyhow::Context;
use chrono::{DateTime, Utc};
use fleet_core::config::FleetConfig;
use fleet_core::gate::cooldown_remaining;
use fleet_core::manifest::{AgentRecord, ManifestStore};
use serde::Serialize;

/// Public view of one agent; never carries credentials.
#[derive(Serialize)]
struct AgentStatus {
    index: usize,
    name: String,
    agent_id: String,
    action_count: u64,
    last_action_at: Option<DateTime<Utc>>,
    cooldown_secs: u64,
}

impl AgentStatus {
    fn new(record: &AgentRecord, now: DateTime<Utc>, config: &FleetConfig) -> Self {
        let cooldown = cooldown_remaining(record, now, config.cooldown());
        Self {
            index: record.index,
            name: record.display_name.clone(),
            agent_id: record.agent_id().to_string(),
            action_count: record.action_count(),
            last_action_at: record.last_action_at(),
            cooldown_secs: cooldown.map(|d| d.as_secs()).unwrap_or(0),
        }
    }

    fn cooldown_label(&self) -> String {
        if self.cooldown_secs == 0 {
            "ready".to_string()
        } else {
            format!("{}m left", self.cooldown_secs.div_ceil(60))
        }
    }
}

#[derive(Serialize)]
struct FleetStatus {
    manifest: String,
    target_size: usize,
    agents: Vec<AgentStatus>,
}

pub fn run(config: &FleetConfig, json: bool) -> anyhow::Result<()> {
    let store = ManifestStore::new(&config.manifest_path);
    let manifest = store
        .inspect()
        .with_context(|| format!("cannot read manifest {}", store.path().display()))?;
    let now = Utc::now();

    let status = FleetStatus {
        manifest: store.path().display().to_string(),
        target_size: config.target_size,
        agents: manifest
            .agents()
            .iter()
            .map(|r| AgentStatus::new(r, now, config))
            .collect(),
    };

    if json {
        return print_json(&status);
    }

    println!(
        "Fleet: {}/{} agents ({})",
        status.agents.len(),
        status.target_size,
        status.manifest
    );
    if status.agents.is_empty() {
        println!("No agents registered. Run `fleet register` or `fleet run`.");
        return Ok(());
    }

    let rows = status
        .agents
        .iter()
        .map(|a| {
            vec![
                a.index.to_string(),
                a.name.clone(),
                a.agent_id.clone(),
                a.action_count.to_string(),
                a.last_action_at
                    .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_else(|| "never".to_string()),
                a.cooldown_label(),
            ]
        })
        .collect();
    print_table(
        &["#", "NAME", "AGENT ID", "BATTLES", "LAST BATTLE", "COOLDOWN"],
        rows,
    );
    Ok(())
}
