//! In-memory fakes for the remote service and the agent runtime.

use crate::config::ProviderConfig;
use crate::manifest::{AgentRecord, Credentials};
use crate::runner::{ActionInvoker, ActionOutcome};
use crate::service::{FleetService, RegistrationError, RemoteError};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

pub fn provider() -> ProviderConfig {
    ProviderConfig {
        provider: "deepseek".into(),
        api_key: "sk-test".into(),
        model: "deepseek-chat".into(),
    }
}

fn agent_id(index: usize) -> String {
    format!("ag_{index}")
}

// ---------------------------------------------------------------------------
// FakeService
// ---------------------------------------------------------------------------

#[derive(Default)]
struct ServiceState {
    remaining: HashMap<String, u32>,
    failing_status: HashSet<String>,
    fail_registration_at: Option<usize>,
    registration_calls: Vec<usize>,
    status_calls: Vec<String>,
}

/// Registers `ag_<index>` agents; every agent has 5 remaining actions unless
/// configured otherwise.
#[derive(Default)]
pub struct FakeService {
    state: Mutex<ServiceState>,
}

impl FakeService {
    pub fn with_remaining(self, index: usize, remaining: u32) -> Self {
        self.state
            .lock()
            .unwrap()
            .remaining
            .insert(agent_id(index), remaining);
        self
    }

    pub fn fail_status_for(self, index: usize) -> Self {
        self.state
            .lock()
            .unwrap()
            .failing_status
            .insert(agent_id(index));
        self
    }

    pub fn fail_registration_at(self, index: usize) -> Self {
        self.state.lock().unwrap().fail_registration_at = Some(index);
        self
    }

    pub fn registration_calls(&self) -> Vec<usize> {
        self.state.lock().unwrap().registration_calls.clone()
    }

    pub fn status_calls(&self) -> Vec<String> {
        self.state.lock().unwrap().status_calls.clone()
    }
}

#[async_trait]
impl FleetService for FakeService {
    async fn register(&self, index: usize) -> Result<AgentRecord, RegistrationError> {
        let mut state = self.state.lock().unwrap();
        state.registration_calls.push(index);
        if state.fail_registration_at == Some(index) {
            return Err(RegistrationError {
                index,
                cause: RemoteError::Status(503),
            });
        }
        Ok(AgentRecord::new(
            index,
            Credentials::new(agent_id(index), format!("ck_{index}")),
            format!("Bot-{index}"),
            Utc::now(),
        ))
    }

    async fn actions_remaining(&self, credentials: &Credentials) -> Result<u32, RemoteError> {
        let mut state = self.state.lock().unwrap();
        state.status_calls.push(credentials.agent_id.clone());
        if state.failing_status.contains(&credentials.agent_id) {
            return Err(RemoteError::Status(500));
        }
        Ok(state
            .remaining
            .get(&credentials.agent_id)
            .copied()
            .unwrap_or(5))
    }
}

// ---------------------------------------------------------------------------
// FakeInvoker
// ---------------------------------------------------------------------------

/// Completes every action unless an outcome was scripted for that index.
#[derive(Default)]
pub struct FakeInvoker {
    scripted: Mutex<HashMap<usize, VecDeque<ActionOutcome>>>,
    delay: Duration,
    calls: Mutex<Vec<usize>>,
}

impl FakeInvoker {
    pub fn script(self, index: usize, outcomes: impl IntoIterator<Item = ActionOutcome>) -> Self {
        self.scripted
            .lock()
            .unwrap()
            .entry(index)
            .or_default()
            .extend(outcomes);
        self
    }

    pub fn taking(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> Vec<usize> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ActionInvoker for FakeInvoker {
    async fn invoke(&self, record: &AgentRecord, _provider: &ProviderConfig) -> ActionOutcome {
        self.calls.lock().unwrap().push(record.index);
        let outcome = self
            .scripted
            .lock()
            .unwrap()
            .get_mut(&record.index)
            .and_then(|q| q.pop_front())
            .unwrap_or(ActionOutcome::Completed);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        outcome
    }
}
