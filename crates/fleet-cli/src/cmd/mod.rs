pub mod config;
pub mod register;
pub mod run;
pub mod status;

use anyhow::Context;
use clap::Args;
use fleet_core::config::FleetConfig;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Overrides
// ---------------------------------------------------------------------------

/// Per-setting overrides, applied on top of the config file.
#[derive(Args, Debug, Default)]
pub struct Overrides {
    /// Number of agents to keep registered
    #[arg(long = "bots", global = true, env = "BOT_COUNT", value_name = "N")]
    pub target_size: Option<usize>,

    /// Base URL of the battle service
    #[arg(long, global = true, env = "CLAWCOMBAT_API_URL")]
    pub api_url: Option<String>,

    /// Manifest file
    #[arg(long, global = true, env = "FLEET_MANIFEST")]
    pub manifest: Option<PathBuf>,

    #[arg(long, global = true, env = "FLEET_COOLDOWN_MINUTES", value_name = "MINUTES")]
    pub cooldown_minutes: Option<u64>,

    #[arg(long, global = true, env = "FLEET_CYCLE_INTERVAL_SECS", value_name = "SECS")]
    pub cycle_interval_secs: Option<u64>,

    /// Hard limit on one battle
    #[arg(long, global = true, env = "FLEET_ACTION_TIMEOUT_SECS", value_name = "SECS")]
    pub action_timeout_secs: Option<u64>,

    #[arg(long, global = true, env = "FLEET_AGENT_DELAY_SECS", value_name = "SECS")]
    pub agent_delay_secs: Option<u64>,

    #[arg(long, global = true, env = "FLEET_REGISTRATION_DELAY_SECS", value_name = "SECS")]
    pub registration_delay_secs: Option<u64>,

    /// Agent runtime executable
    #[arg(long, global = true, env = "FLEET_RUNTIME_BIN", value_name = "PATH")]
    pub runtime_bin: Option<String>,

    /// Working directory for the agent runtime
    #[arg(long, global = true, env = "FLEET_WORKDIR", value_name = "DIR")]
    pub workdir: Option<PathBuf>,

    /// Model override for the LLM provider
    #[arg(long, global = true, env = "FLEET_MODEL")]
    pub model: Option<String>,
}

impl Overrides {
    pub fn apply(self, config: &mut FleetConfig) {
        if let Some(v) = self.target_size {
            config.target_size = v;
        }
        if let Some(v) = self.api_url {
            config.api_url = v;
        }
        if let Some(v) = self.manifest {
            config.manifest_path = v;
        }
        if let Some(v) = self.cooldown_minutes {
            config.cooldown_minutes = v;
        }
        if let Some(v) = self.cycle_interval_secs {
            config.cycle_interval_secs = v;
        }
        if let Some(v) = self.action_timeout_secs {
            config.action_timeout_secs = v;
        }
        if let Some(v) = self.agent_delay_secs {
            config.agent_delay_secs = v;
        }
        if let Some(v) = self.registration_delay_secs {
            config.registration_delay_secs = v;
        }
        if let Some(v) = self.runtime_bin {
            config.runtime_bin = v;
        }
        if let Some(v) = self.workdir {
            config.workdir = v;
        }
        if let Some(v) = self.model {
            config.model = Some(v);
        }
    }
}

/// Read the config file, layer the overrides on top and validate the result.
pub fn load_config(path: &Path, overrides: Overrides) -> anyhow::Result<FleetConfig> {
    let mut config = FleetConfig::load(path)
        .with_context(|| format!("failed to load config from {}", path.display()))?;
    overrides.apply(&mut config);
    config.validate().context("invalid configuration")?;
    Ok(config)
}
