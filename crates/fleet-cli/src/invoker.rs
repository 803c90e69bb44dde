use std::collections::BTreeMap;
use std::path::PathBuf;

use async_trait::async_trait;
use fleet_agent::{last_chars, RunConfig};
use fleet_core::config::{FleetConfig, ProviderConfig};
use fleet_core::manifest::AgentRecord;
use fleet_core::persona::Persona;
use fleet_core::runner::{ActionInvoker, ActionOutcome};

/// Characters of runtime stdout echoed to the log after a battle.
const LOG_TAIL: usize = 500;

/// Runs one battle by starting the agent runtime with the agent's
/// credentials in its environment.
pub struct RuntimeInvoker {
    program: String,
    workdir: PathBuf,
    api_url: String,
}

impl RuntimeInvoker {
    pub fn new(config: &FleetConfig) -> Self {
        Self {
            program: config.runtime_bin.clone(),
            workdir: config.workdir.clone(),
            api_url: config.base_url().to_string(),
        }
    }

    fn run_config(&self, record: &AgentRecord, provider: &ProviderConfig) -> RunConfig {
        let creds = record.credentials();
        let mut env = BTreeMap::new();
        env.insert("CLAWCOMBAT_AGENT_ID".to_string(), creds.agent_id.clone());
        env.insert("CLAWCOMBAT_API_KEY".to_string(), creds.credential.clone());
        env.insert("CLAWCOMBAT_API_URL".to_string(), self.api_url.clone());
        env.insert("NANOBOT_PROVIDER".to_string(), provider.provider.clone());
        env.insert("NANOBOT_API_KEY".to_string(), provider.api_key.clone());
        env.insert("NANOBOT_MODEL".to_string(), provider.model.clone());

        RunConfig {
            program: self.program.clone(),
            instruction: Persona::for_index(record.index).battle_instruction(),
            env,
            cwd: Some(self.workdir.clone()),
        }
    }
}

#[async_trait]
impl ActionInvoker for RuntimeInvoker {
    async fn invoke(&self, record: &AgentRecord, provider: &ProviderConfig) -> ActionOutcome {
        match fleet_agent::run(self.run_config(record, provider)).await {
            Ok(result) if result.success() => {
                tracing::info!(
                    index = record.index,
                    output = %last_chars(result.stdout_tail.trim(), LOG_TAIL),
                    "runtime finished"
                );
                ActionOutcome::Completed
            }
            Ok(result) => ActionOutcome::Failed {
                reason: result.failure_reason(),
            },
            Err(e) => ActionOutcome::Failed {
                reason: e.to_string(),
            },
        }
    }
}
