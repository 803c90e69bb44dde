use crate::output::print_json;
use fleet_core::config::{FleetConfig, ProviderConfig};
use serde::Serialize;

#[derive(Serialize)]
struct EffectiveConfig<'a> {
    #[serde(flatten)]
    fleet: &'a FleetConfig,
    /// Provider that `fleet run` would use; the key itself is never shown.
    provider: Option<String>,
}

pub fn run(config: &FleetConfig, json: bool) -> anyhow::Result<()> {
    let provider = ProviderConfig::from_env(config.model.as_deref())
        .ok()
        .map(|p| format!("{} ({})", p.provider, p.model));

    let effective = EffectiveConfig {
        fleet: config,
        provider,
    };

    if json {
        return print_json(&effective);
    }
    print!("{}", serde_yaml::to_string(&effective)?);
    Ok(())
}
