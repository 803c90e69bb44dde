use crate::output::print_json;
use anyhow::Context;
use fleet_core::config::FleetConfig;
use fleet_core::manifest::ManifestStore;
use fleet_core::registration::grow_fleet;
use fleet_core::service::HttpFleetService;
use serde::Serialize;

#[derive(Serialize)]
struct RegisterSummary {
    registered: usize,
    fleet_size: usize,
    target_size: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    stopped_by: Option<String>,
}

pub fn run(config: FleetConfig, json: bool) -> anyhow::Result<()> {
    let store = ManifestStore::new(&config.manifest_path);
    let mut manifest = store.load();
    let service = HttpFleetService::new(&config).context("failed to build HTTP client")?;

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    let report = rt.block_on(grow_fleet(
        &service,
        &mut manifest,
        &store,
        config.target_size,
        config.registration_delay(),
    ))?;

    let summary = RegisterSummary {
        registered: report.registered,
        fleet_size: manifest.len(),
        target_size: config.target_size,
        stopped_by: report.stopped_by.map(|e| e.to_string()),
    };

    if json {
        return print_json(&summary);
    }

    println!(
        "Fleet: {}/{} agents ({} registered now)",
        summary.fleet_size, summary.target_size, summary.registered
    );
    if let Some(reason) = &summary.stopped_by {
        println!("Growth stopped: {reason}");
    }
    Ok(())
}
