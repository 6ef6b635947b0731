//! Alert document (spec §3 "Alert").

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::monitor::{MonitorId, Owner};
use crate::model::trigger::TriggerId;
use crate::query::QueryResponse;

/// Unique alert identity, assigned by the store unless the caller presets
/// one (spec §4.5 "re-save path").
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AlertId(pub String);

impl std::fmt::Display for AlertId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AlertSeverity {
    Info,
    Warn,
    Error,
    Critical,
}

/// Correlates every alert and per-trigger result produced by one Monitor
/// Runner invocation (spec §3, §4.6). Not explicit in the distilled spec,
/// but every alert field references it, so something has to mint it — the
/// Runner does, once per `run()` call (see SPEC_FULL.md §10.5).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExecutionId(pub String);

impl ExecutionId {
    pub fn new() -> Self {
        ExecutionId(ulid::Ulid::new().to_string())
    }
}

impl Default for ExecutionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ExecutionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Immutable once written (spec §3). Two storage tiers hold this type: the
/// active collection (routed by monitor id) and the history collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<AlertId>,

    pub monitor_id: MonitorId,
    pub monitor_name: String,
    pub monitor_version: u64,
    pub monitor_user: Owner,

    pub trigger_id: TriggerId,
    pub trigger_name: String,

    /// The original, unrewritten monitor query — never the composed query
    /// the executor actually ran (spec §3).
    pub query: String,
    pub query_results: QueryResponse,

    pub triggered_time: DateTime<Utc>,
    pub expiration_time: DateTime<Utc>,
    pub severity: AlertSeverity,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    pub execution_id: ExecutionId,
}

impl Alert {
    /// Invariant 4 (spec §8): `expirationTime = triggeredTime +
    /// trigger.expireDuration`.
    pub fn is_well_formed(&self) -> bool {
        self.expiration_time > self.triggered_time
    }
}
