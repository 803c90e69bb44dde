//! The fleet manifest: every registered agent and its progress.
//!
//! The manifest is the single source of truth for resuming after a restart.
//! It is owned by exactly one scheduler process; nothing here locks the file,
//! so two schedulers pointed at the same manifest would race each other.

use crate::error::{FleetError, Result};
use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Credentials
// ---------------------------------------------------------------------------

/// Identity issued by the remote service. Both halves arrive together in the
/// registration response and never change afterwards.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub agent_id: String,
    #[serde(alias = "api_key")]
    pub credential: String,
}

impl Credentials {
    pub fn new(agent_id: impl Into<String>, credential: impl Into<String>) -> Self {
        Self {
            agent_id: agent_id.into(),
            credential: credential.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("agent_id", &self.agent_id)
            .field("credential", &"<redacted>")
            .finish()
    }
}

// ---------------------------------------------------------------------------
// AgentRecord
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentRecord {
    pub index: usize,
    #[serde(flatten)]
    credentials: Credentials,
    #[serde(alias = "name")]
    pub display_name: String,
    #[serde(
        alias = "registered",
        default,
        deserialize_with = "lenient_ts_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub registered_at: Option<DateTime<Utc>>,
    #[serde(alias = "last_battle", default, deserialize_with = "lenient_ts_opt")]
    last_action_at: Option<DateTime<Utc>>,
    #[serde(alias = "battles", default)]
    action_count: u64,
}

impl AgentRecord {
    pub fn new(
        index: usize,
        credentials: Credentials,
        display_name: impl Into<String>,
        registered_at: DateTime<Utc>,
    ) -> Self {
        Self {
            index,
            credentials,
            display_name: display_name.into(),
            registered_at: Some(registered_at),
            last_action_at: None,
            action_count: 0,
        }
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn agent_id(&self) -> &str {
        &self.credentials.agent_id
    }

    pub fn last_action_at(&self) -> Option<DateTime<Utc>> {
        self.last_action_at
    }

    pub fn action_count(&self) -> u64 {
        self.action_count
    }

    /// Advance progress after a confirmed successful action.
    pub fn record_success(&mut self, at: DateTime<Utc>) {
        self.last_action_at = Some(at);
        self.action_count += 1;
    }
}

// ---------------------------------------------------------------------------
// Manifest
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(alias = "bots", default)]
    agents: Vec<AgentRecord>,
    #[serde(alias = "created", deserialize_with = "lenient_ts")]
    pub created_at: DateTime<Utc>,
}

impl Manifest {
    pub fn new(created_at: DateTime<Utc>) -> Self {
        Self {
            agents: Vec::new(),
            created_at,
        }
    }

    pub fn agents(&self) -> &[AgentRecord] {
        &self.agents
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Index the next registered agent must carry.
    pub fn next_index(&self) -> usize {
        self.agents.len()
    }

    pub fn get(&self, index: usize) -> Option<&AgentRecord> {
        self.agents.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut AgentRecord> {
        self.agents.get_mut(index)
    }

    /// Append a newly registered agent. Its index must be the next dense slot.
    pub fn append(&mut self, record: AgentRecord) -> Result<()> {
        if record.index != self.next_index() {
            return Err(FleetError::InvalidManifest(format!(
                "agent index {} appended at slot {}",
                record.index,
                self.next_index()
            )));
        }
        self.agents.push(record);
        Ok(())
    }

    /// Check that indices run 0..len with no gaps or duplicates and that
    /// every agent carries credentials.
    pub fn validate(&self) -> Result<()> {
        for (slot, agent) in self.agents.iter().enumerate() {
            if agent.index != slot {
                return Err(FleetError::InvalidManifest(format!(
                    "agent at position {slot} has index {}",
                    agent.index
                )));
            }
            if agent.credentials.agent_id.is_empty() || agent.credentials.credential.is_empty() {
                return Err(FleetError::InvalidManifest(format!(
                    "agent {slot} has no credentials"
                )));
            }
        }
        Ok(())
    }

    pub fn from_json(data: &str) -> Result<Self> {
        let manifest: Manifest = serde_json::from_str(data)?;
        manifest.validate()?;
        Ok(manifest)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

// ---------------------------------------------------------------------------
// ManifestStore
// ---------------------------------------------------------------------------

/// File-backed manifest persistence. Every save is a full atomic rewrite.
///
/// A store whose existing file could neither be read nor moved aside is
/// sealed: every later save fails with [`FleetError::Persist`] so the file,
/// and the credentials in it, survive until an operator intervenes.
#[derive(Debug, Clone)]
pub struct ManifestStore {
    path: PathBuf,
    sealed: OnceLock<String>,
}

impl ManifestStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            sealed: OnceLock::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the manifest, degrading to an empty fleet when the file is
    /// missing, corrupt or unreadable. A corrupt file is moved aside first;
    /// an unreadable one seals the store.
    pub fn load(&self) -> Manifest {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %self.path.display(), "no manifest yet, starting empty fleet");
                return Manifest::new(Utc::now());
            }
            Err(e) => {
                tracing::error!(
                    path = %self.path.display(),
                    error = %e,
                    "manifest unreadable, starting empty fleet with saves disabled"
                );
                self.seal(format!("existing manifest could not be read: {e}"));
                return Manifest::new(Utc::now());
            }
        };

        match decode(&bytes) {
            Ok(manifest) => {
                tracing::info!(agents = manifest.len(), "loaded manifest");
                manifest
            }
            Err(e) => {
                match crate::io::quarantine(&self.path) {
                    Ok(moved) => tracing::error!(
                        error = %e,
                        moved_to = %moved.display(),
                        "manifest corrupt, starting empty fleet"
                    ),
                    Err(qe) => {
                        tracing::error!(
                            error = %e,
                            quarantine_error = %qe,
                            "manifest corrupt and could not be moved aside, saves disabled"
                        );
                        self.seal(format!("corrupt manifest could not be moved aside: {qe}"));
                    }
                }
                Manifest::new(Utc::now())
            }
        }
    }

    /// Read the manifest without side effects. Unlike [`ManifestStore::load`]
    /// a corrupt or unreadable file is an error and stays where it is.
    pub fn inspect(&self) -> Result<Manifest> {
        match std::fs::read(&self.path) {
            Ok(bytes) => decode(&bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Manifest::new(Utc::now())),
            Err(e) => Err(e.into()),
        }
    }

    /// Fails when saves are disabled. Checked before any remote side effect
    /// whose result would have to be persisted.
    pub fn ensure_writable(&self) -> Result<()> {
        match self.sealed.get() {
            Some(reason) => Err(FleetError::Persist {
                path: self.path.clone(),
                reason: reason.clone(),
            }),
            None => Ok(()),
        }
    }

    pub fn save(&self, manifest: &Manifest) -> Result<()> {
        self.ensure_writable()?;
        let persist_err = |reason: String| FleetError::Persist {
            path: self.path.clone(),
            reason,
        };
        let data = manifest.to_json().map_err(|e| persist_err(e.to_string()))?;
        crate::io::atomic_write(&self.path, data.as_bytes()).map_err(|e| persist_err(e.to_string()))
    }

    fn seal(&self, reason: String) {
        let _ = self.sealed.set(reason);
    }
}

fn decode(bytes: &[u8]) -> Result<Manifest> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| FleetError::InvalidManifest(format!("not valid UTF-8: {e}")))?;
    Manifest::from_json(text)
}

// ---------------------------------------------------------------------------
// Timestamp parsing
// ---------------------------------------------------------------------------

/// Accept RFC 3339 as well as the offset-less ISO timestamps of older
/// manifests, which were written in the host's local time.
fn parse_ts(raw: &str) -> Option<DateTime<Utc>> {
    parse_ts_in(raw, &Local)
}

fn parse_ts_in<Tz: TimeZone>(raw: &str, tz: &Tz) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    let naive = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())?;
    // A wall-clock time skipped by a DST jump has no local reading.
    let local = tz
        .from_local_datetime(&naive)
        .earliest()
        .map(|t| t.with_timezone(&Utc));
    Some(local.unwrap_or_else(|| naive.and_utc()))
}

fn lenient_ts<'de, D>(d: D) -> std::result::Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(d)?;
    parse_ts(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw}")))
}

fn lenient_ts_opt<'de, D>(d: D) -> std::result::Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(d)? {
        None => Ok(None),
        Some(raw) => parse_ts(&raw)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw}"))),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
