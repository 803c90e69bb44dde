//! Runs one agent's battle and advances its record on success.

use crate::clock::Clock;
use crate::config::ProviderConfig;
use crate::error::{FleetError, Result};
use crate::manifest::{AgentRecord, Manifest, ManifestStore};
use async_trait::async_trait;
use std::time::Duration;

/// How a single action ended. Only `Completed` advances the record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    Completed,
    /// Abnormal exit or failure to start.
    Failed { reason: String },
    TimedOut,
}

impl ActionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ActionOutcome::Completed)
    }

    pub fn label(&self) -> &'static str {
        match self {
            ActionOutcome::Completed => "completed",
            ActionOutcome::Failed { .. } => "failed",
            ActionOutcome::TimedOut => "timed_out",
        }
    }
}

/// Performs the opaque remote action for one agent.
///
/// The returned future may be dropped at the deadline; implementations must
/// stop the underlying work when that happens.
#[async_trait]
pub trait ActionInvoker: Send + Sync {
    async fn invoke(&self, record: &AgentRecord, provider: &ProviderConfig) -> ActionOutcome;
}

pub struct ActionRunner<'a, I: ?Sized, C> {
    invoker: &'a I,
    provider: &'a ProviderConfig,
    timeout: Duration,
    clock: C,
}

impl<'a, I: ActionInvoker + ?Sized, C: Clock> ActionRunner<'a, I, C> {
    pub fn new(invoker: &'a I, provider: &'a ProviderConfig, timeout: Duration, clock: C) -> Self {
        Self {
            invoker,
            provider,
            timeout,
            clock,
        }
    }

    /// Run the action for the agent at `index` under the hard timeout.
    ///
    /// On success the record's progress is advanced and the manifest saved
    /// before returning. Failures and timeouts leave the record untouched.
    /// `Err` means the manifest could not be saved.
    pub async fn run(
        &self,
        manifest: &mut Manifest,
        store: &ManifestStore,
        index: usize,
    ) -> Result<ActionOutcome> {
        let record = manifest
            .get(index)
            .ok_or_else(|| FleetError::InvalidManifest(format!("no agent at index {index}")))?;
        tracing::info!(index, agent = %record.display_name, id = %record.agent_id(), "starting battle");

        let outcome =
            match tokio::time::timeout(self.timeout, self.invoker.invoke(record, self.provider))
                .await
            {
                Ok(outcome) => outcome,
                Err(_) => ActionOutcome::TimedOut,
            };

        match &outcome {
            ActionOutcome::Completed => {
                let now = self.clock.now();
                if let Some(record) = manifest.get_mut(index) {
                    record.record_success(now);
                    tracing::info!(
                        index,
                        agent = %record.display_name,
                        actions = record.action_count(),
                        "battle completed"
                    );
                }
                store.save(manifest)?;
            }
            ActionOutcome::Failed { reason } => {
                tracing::error!(index, reason = %reason, "battle failed");
            }
            ActionOutcome::TimedOut => {
                tracing::warn!(index, timeout_secs = self.timeout.as_secs(), "battle timed out");
            }
        }

        Ok(outcome)
    }
}
