//! Per-agent eligibility: the local cool-down AND the remote rate limit.

use crate::manifest::AgentRecord;
use crate::service::FleetService;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Why an agent may or may not act this cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Eligibility {
    Eligible { remaining: u32 },
    /// Last successful action is more recent than the cool-down.
    CoolingDown { wait: Duration },
    /// Remote reports no remaining actions.
    RateLimited,
    /// Status query failed; reconsidered next cycle.
    Unknown { reason: String },
}

impl Eligibility {
    pub fn is_eligible(&self) -> bool {
        matches!(self, Eligibility::Eligible { .. })
    }
}

/// Time left before `record` is out of its cool-down, or `None` when it may
/// act. An agent that never acted is never cooling down.
pub fn cooldown_remaining(
    record: &AgentRecord,
    now: DateTime<Utc>,
    cooldown: Duration,
) -> Option<Duration> {
    let last = record.last_action_at()?;
    let elapsed = (now - last).to_std().unwrap_or(Duration::ZERO);
    cooldown.checked_sub(elapsed).filter(|d| !d.is_zero())
}

pub struct RateLimitGate<'a, S: ?Sized> {
    service: &'a S,
    cooldown: Duration,
}

impl<'a, S: FleetService + ?Sized> RateLimitGate<'a, S> {
    pub fn new(service: &'a S, cooldown: Duration) -> Self {
        Self { service, cooldown }
    }

    /// The cool-down is checked first so a resting agent costs no remote call.
    /// Never mutates the record.
    pub async fn check(&self, record: &AgentRecord, now: DateTime<Utc>) -> Eligibility {
        if let Some(wait) = cooldown_remaining(record, now, self.cooldown) {
            return Eligibility::CoolingDown { wait };
        }

        match self.service.actions_remaining(record.credentials()).await {
            Ok(0) => Eligibility::RateLimited,
            Ok(remaining) => Eligibility::Eligible { remaining },
            Err(e) => Eligibility::Unknown {
                reason: e.to_string(),
            },
        }
    }

    pub async fn may_act(&self, record: &AgentRecord, now: DateTime<Utc>) -> bool {
        self.check(record, now).await.is_eligible()
    }
}
