use crate::error::{FleetError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_FILE: &str = "fleet.yaml";
pub const MANIFEST_FILE: &str = "data/fleet-manifest.json";

// ---------------------------------------------------------------------------
// FleetConfig
// ---------------------------------------------------------------------------

/// Every tunable of the scheduler, built once at startup and passed down.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FleetConfig {
    /// Number of agents the fleet grows toward.
    #[serde(default = "default_target_size")]
    pub target_size: usize,
    /// Base address of the remote battle service.
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_manifest_path")]
    pub manifest_path: PathBuf,
    /// Minimum time between two successful actions of the same agent.
    #[serde(default = "default_cooldown_minutes")]
    pub cooldown_minutes: u64,
    #[serde(default = "default_cycle_interval_secs")]
    pub cycle_interval_secs: u64,
    #[serde(default = "default_action_timeout_secs")]
    pub action_timeout_secs: u64,
    #[serde(default = "default_agent_delay_secs")]
    pub agent_delay_secs: u64,
    #[serde(default = "default_registration_delay_secs")]
    pub registration_delay_secs: u64,
    /// Executable of the agent runtime that performs one battle.
    #[serde(default = "default_runtime_bin")]
    pub runtime_bin: String,
    /// Working directory the runtime is started in.
    #[serde(default = "default_workdir")]
    pub workdir: PathBuf,
    /// Send a generated name and type when registering.
    #[serde(default = "default_true")]
    pub named_registration: bool,
    /// Retry growth toward `target_size` at the top of every cycle.
    #[serde(default)]
    pub grow_every_cycle: bool,
    /// Model override; the provider's default model otherwise.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

fn default_target_size() -> usize {
    10
}

fn default_api_url() -> String {
    "https://clawcombat.com".to_string()
}

fn default_manifest_path() -> PathBuf {
    PathBuf::from(MANIFEST_FILE)
}

fn default_cooldown_minutes() -> u64 {
    55
}

fn default_cycle_interval_secs() -> u64 {
    600
}

fn default_action_timeout_secs() -> u64 {
    300
}

fn default_agent_delay_secs() -> u64 {
    5
}

fn default_registration_delay_secs() -> u64 {
    1
}

fn default_runtime_bin() -> String {
    "nanobot".to_string()
}

fn default_workdir() -> PathBuf {
    PathBuf::from(".")
}

fn default_true() -> bool {
    true
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            target_size: default_target_size(),
            api_url: default_api_url(),
            manifest_path: default_manifest_path(),
            cooldown_minutes: default_cooldown_minutes(),
            cycle_interval_secs: default_cycle_interval_secs(),
            action_timeout_secs: default_action_timeout_secs(),
            agent_delay_secs: default_agent_delay_secs(),
            registration_delay_secs: default_registration_delay_secs(),
            runtime_bin: default_runtime_bin(),
            workdir: default_workdir(),
            named_registration: true,
            grow_every_cycle: false,
            model: None,
        }
    }
}

impl FleetConfig {
    /// Read the YAML config at `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(path)?;
        if data.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: FleetConfig = serde_yaml::from_str(&data)?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.api_url.trim().is_empty() {
            return Err(FleetError::InvalidConfig("api_url is empty".into()));
        }
        if self.action_timeout_secs == 0 {
            return Err(FleetError::InvalidConfig(
                "action_timeout_secs must be greater than zero".into(),
            ));
        }
        if self.runtime_bin.trim().is_empty() {
            return Err(FleetError::InvalidConfig("runtime_bin is empty".into()));
        }
        Ok(())
    }

    /// Base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.api_url.trim_end_matches('/')
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_minutes.saturating_mul(60))
    }

    pub fn cycle_interval(&self) -> Duration {
        Duration::from_secs(self.cycle_interval_secs)
    }

    pub fn action_timeout(&self) -> Duration {
        Duration::from_secs(self.action_timeout_secs)
    }

    pub fn agent_delay(&self) -> Duration {
        Duration::from_secs(self.agent_delay_secs)
    }

    pub fn registration_delay(&self) -> Duration {
        Duration::from_secs(self.registration_delay_secs)
    }
}

// ---------------------------------------------------------------------------
// ProviderConfig
// ---------------------------------------------------------------------------

/// LLM provider handed to the agent runtime. Resolved once at startup.
#[derive(Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    pub provider: String,
    pub api_key: String,
    pub model: String,
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("provider", &self.provider)
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .finish()
    }
}

impl ProviderConfig {
    pub fn from_env(model_override: Option<&str>) -> Result<Self> {
        Self::from_lookup(|k| std::env::var(k).ok(), model_override)
    }

    /// DeepSeek wins over OpenRouter when both keys are present.
    pub fn from_lookup<F>(lookup: F, model_override: Option<&str>) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let present = |k: &str| lookup(k).filter(|v| !v.trim().is_empty());

        let (provider, api_key, model) = if let Some(key) = present("DEEPSEEK_API_KEY") {
            ("deepseek", key, "deepseek-chat")
        } else if let Some(key) = present("OPENROUTER_API_KEY") {
            ("openrouter", key, "meta-llama/llama-3.3-70b-instruct:free")
        } else {
            return Err(FleetError::NoProvider);
        };

        Ok(Self {
            provider: provider.to_string(),
            api_key,
            model: model_override.unwrap_or(model).to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
