//! Fleet growth: register missing agents until the target size is reached.

use crate::error::Result;
use crate::manifest::{Manifest, ManifestStore};
use crate::service::{FleetService, RegistrationError};
use std::time::Duration;

/// What one growth pass did.
#[derive(Debug, Default)]
pub struct GrowthReport {
    pub registered: usize,
    /// The registration that stopped growth for this run, if any.
    pub stopped_by: Option<RegistrationError>,
}

/// Register agents for every missing slot, in index order, persisting after
/// each one. Growth stops at the first failed registration; agents already
/// registered are kept. Consecutive calls are spaced by `pacing`.
///
/// Returns `Err` only when the manifest cannot be saved.
pub async fn grow_fleet<S: FleetService + ?Sized>(
    service: &S,
    manifest: &mut Manifest,
    store: &ManifestStore,
    target: usize,
    pacing: Duration,
) -> Result<GrowthReport> {
    let mut report = GrowthReport::default();
    if manifest.len() >= target {
        return Ok(report);
    }
    // A new agent that cannot be recorded would be lost on the next start.
    store.ensure_writable()?;

    tracing::info!(
        current = manifest.len(),
        target,
        missing = target - manifest.len(),
        "growing fleet"
    );

    while manifest.len() < target {
        if report.registered > 0 {
            tokio::time::sleep(pacing).await;
        }

        let index = manifest.next_index();
        match service.register(index).await {
            Ok(record) => {
                tracing::info!(index, agent = %record.display_name, "registered agent");
                manifest.append(record)?;
                store.save(manifest)?;
                report.registered += 1;
            }
            Err(e) => {
                tracing::warn!(index, error = %e, "registration failed, will retry on next start");
                report.stopped_by = Some(e);
                break;
            }
        }
    }

    tracing::info!(fleet_size = manifest.len(), "fleet growth finished");
    Ok(report)
}
