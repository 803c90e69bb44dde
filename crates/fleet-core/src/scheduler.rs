//! The cycle scheduler.
//!
//! One control flow does everything in sequence: grow the fleet, then visit
//! every agent in manifest order, act for the eligible ones with a pause after
//! each attempt, and sleep until the next cycle. Nothing runs in parallel.
//!
//! ```text
//! Bootstrapping ──► Cycling ──► sleep ──┐
//!                      ▲                │
//!                      └────────────────┘
//! ```

use crate::clock::Clock;
use crate::config::{FleetConfig, ProviderConfig};
use crate::error::Result;
use crate::gate::{Eligibility, RateLimitGate};
use crate::manifest::{Manifest, ManifestStore};
use crate::registration::{grow_fleet, GrowthReport};
use crate::runner::{ActionInvoker, ActionOutcome, ActionRunner};
use crate::service::FleetService;
use serde::Serialize;

/// Tally of one pass over the fleet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub timed_out: usize,
    pub skipped: usize,
}

impl CycleReport {
    fn record(&mut self, outcome: &ActionOutcome) {
        self.attempted += 1;
        match outcome {
            ActionOutcome::Completed => self.succeeded += 1,
            ActionOutcome::Failed { .. } => self.failed += 1,
            ActionOutcome::TimedOut => self.timed_out += 1,
        }
    }
}

pub struct Scheduler<S, I, C> {
    config: FleetConfig,
    store: ManifestStore,
    manifest: Manifest,
    service: S,
    invoker: I,
    provider: ProviderConfig,
    clock: C,
}

impl<S: FleetService, I: ActionInvoker, C: Clock> Scheduler<S, I, C> {
    pub fn new(
        config: FleetConfig,
        store: ManifestStore,
        manifest: Manifest,
        service: S,
        invoker: I,
        provider: ProviderConfig,
        clock: C,
    ) -> Self {
        Self {
            config,
            store,
            manifest,
            service,
            invoker,
            provider,
            clock,
        }
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    /// Grow the fleet toward the configured target.
    pub async fn bootstrap(&mut self) -> Result<GrowthReport> {
        grow_fleet(
            &self.service,
            &mut self.manifest,
            &self.store,
            self.config.target_size,
            self.config.registration_delay(),
        )
        .await
    }

    /// Visit every agent once. Only a manifest save failure is an error.
    pub async fn run_cycle(&mut self) -> Result<CycleReport> {
        if self.config.grow_every_cycle && self.manifest.len() < self.config.target_size {
            self.bootstrap().await?;
        }

        let gate = RateLimitGate::new(&self.service, self.config.cooldown());
        let runner = ActionRunner::new(
            &self.invoker,
            &self.provider,
            self.config.action_timeout(),
            self.clock.clone(),
        );
        let mut report = CycleReport::default();

        for index in 0..self.manifest.len() {
            let Some(record) = self.manifest.get(index) else {
                break;
            };

            match gate.check(record, self.clock.now()).await {
                Eligibility::Eligible { remaining } => {
                    tracing::debug!(index, remaining, "agent eligible");
                }
                Eligibility::CoolingDown { wait } => {
                    tracing::info!(
                        index,
                        agent = %record.display_name,
                        wait_secs = wait.as_secs(),
                        "battled recently, skipping"
                    );
                    report.skipped += 1;
                    continue;
                }
                Eligibility::RateLimited => {
                    tracing::info!(index, agent = %record.display_name, "rate limited, skipping");
                    report.skipped += 1;
                    continue;
                }
                Eligibility::Unknown { reason } => {
                    tracing::warn!(
                        index,
                        agent = %record.display_name,
                        reason = %reason,
                        "rate limit check failed, skipping"
                    );
                    report.skipped += 1;
                    continue;
                }
            }

            let outcome = runner.run(&mut self.manifest, &self.store, index).await?;
            tracing::debug!(index, outcome = outcome.label(), "attempt finished");
            report.record(&outcome);

            tokio::time::sleep(self.config.agent_delay()).await;
        }

        Ok(report)
    }

    /// Bootstrap, then cycle until the process is stopped. Returns only when
    /// the manifest cannot be persisted.
    pub async fn run_forever(&mut self) -> Result<()> {
        let growth = self.bootstrap().await?;
        tracing::info!(
            fleet_size = self.manifest.len(),
            registered = growth.registered,
            "fleet ready"
        );

        loop {
            tracing::info!(agents = self.manifest.len(), "starting battle cycle");
            let report = self.run_cycle().await?;
            tracing::info!(
                attempted = report.attempted,
                succeeded = report.succeeded,
                failed = report.failed,
                timed_out = report.timed_out,
                skipped = report.skipped,
                "cycle complete"
            );
            tracing::info!(
                sleep_secs = self.config.cycle_interval_secs,
                "sleeping until next cycle"
            );
            tokio::time::sleep(self.config.cycle_interval()).await;
        }
    }
}
