use crate::invoker::RuntimeInvoker;
use crate::output::print_json;
use anyhow::Context;
use fleet_core::clock::SystemClock;
use fleet_core::config::{FleetConfig, ProviderConfig};
use fleet_core::manifest::ManifestStore;
use fleet_core::scheduler::Scheduler;
use fleet_core::service::HttpFleetService;

pub fn run(config: FleetConfig, once: bool, json: bool) -> anyhow::Result<()> {
    let provider = ProviderConfig::from_env(config.model.as_deref())?;
    tracing::info!(provider = %provider.provider, model = %provider.model, "using LLM provider");

    match fleet_agent::locate_runtime(&config.runtime_bin) {
        Some(path) => tracing::info!(runtime = %path.display(), "agent runtime found"),
        None => tracing::warn!(
            runtime = %config.runtime_bin,
            "agent runtime not found on PATH; battles will fail until it is installed"
        ),
    }

    let store = ManifestStore::new(&config.manifest_path);
    let manifest = store.load();
    tracing::info!(
        manifest = %store.path().display(),
        agents = manifest.len(),
        target = config.target_size,
        "loaded manifest"
    );
    store
        .ensure_writable()
        .context("refusing to run without a writable manifest")?;

    let service = HttpFleetService::new(&config).context("failed to build HTTP client")?;
    let invoker = RuntimeInvoker::new(&config);
    let mut scheduler = Scheduler::new(
        config,
        store,
        manifest,
        service,
        invoker,
        provider,
        SystemClock,
    );

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    rt.block_on(async move {
        if once {
            let report = tokio::select! {
                res = async {
                    scheduler.bootstrap().await?;
                    scheduler.run_cycle().await
                } => res?,
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("interrupted, stopping");
                    return Ok(());
                }
            };
            if json {
                print_json(&report)?;
            } else {
                println!(
                    "cycle complete: {} attempted, {} succeeded, {} failed, {} timed out, {} skipped",
                    report.attempted,
                    report.succeeded,
                    report.failed,
                    report.timed_out,
                    report.skipped
                );
            }
            return Ok(());
        }

        tokio::select! {
            res = scheduler.run_forever() => res?,
            _ = tokio::signal::ctrl_c() => tracing::info!("interrupted, stopping"),
        }
        Ok(())
    })
}
