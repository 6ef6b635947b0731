//! Persistence traits for alerts and monitors, grounded in the hub's
//! `storage::StorageBackend` trait: a thin, purely async, batch-oriented
//! abstraction so the SQLite implementation can later sit beside other
//! backends without callers changing (spec §4.5, §6).

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::error::StoreResult;
use crate::model::alert::{Alert, AlertId};
use crate::model::monitor::{Monitor, MonitorId};
use crate::model::trigger::TriggerId;

/// The active-alerts collection (spec §4.5): one row per currently open
/// alert, routed and queried by monitor. Writes are expected to retry
/// under backoff on [`super::error::StoreError::Transient`] internally —
/// callers see either success or a non-retryable failure (spec §7,
/// "at-least-once").
#[async_trait]
pub trait AlertStore: Send + Sync {
    /// Persists newly materialized alerts, assigning ids to any that
    /// don't already have one, and returns the stored copies (spec §4.5
    /// "re-save path" — an alert with a preset id is an update, not an
    /// insert).
    async fn save_alerts(&self, alerts: Vec<Alert>) -> StoreResult<Vec<Alert>>;

    /// All currently active alerts for one monitor, newest first.
    async fn active_alerts_for_monitor(&self, monitor_id: &MonitorId) -> StoreResult<Vec<Alert>>;

    /// Every active alert across all monitors (spec §4.7 "Sweeper scans
    /// the whole active collection").
    async fn all_active_alerts(&self) -> StoreResult<Vec<Alert>>;

    /// Moves alerts out of the active collection and into history
    /// (spec §4.7, only called when `historyEnabled` is true). Returns
    /// the number archived.
    async fn archive_alerts(&self, alerts: Vec<Alert>) -> StoreResult<usize>;

    /// Deletes alerts from the active collection outright (spec §4.7,
    /// used when `historyEnabled` is false, or after [`archive_alerts`]
    /// has already copied them). Returns the number deleted.
    ///
    /// [`archive_alerts`]: AlertStore::archive_alerts
    async fn delete_alerts(&self, ids: &[AlertId]) -> StoreResult<usize>;

    /// Deletes history rows older than `before` (spec §6
    /// `historyRetentionPeriod`). Returns the number deleted.
    async fn purge_history_before(&self, before: DateTime<Utc>) -> StoreResult<usize>;
}

/// The scheduled-jobs collection (spec §3 "Monitor", §4.6 step 6):
/// monitor documents themselves, mutated only to persist per-trigger
/// `lastFiredTime` after a run.
#[async_trait]
pub trait MonitorStore: Send + Sync {
    async fn get_monitor(&self, id: &MonitorId) -> StoreResult<Monitor>;

    async fn list_enabled_monitors(&self) -> StoreResult<Vec<Monitor>>;

    /// Persists `monitor.triggers[*].lastFiredTime`, preserving every
    /// trigger and action id exactly as stored (spec §9 "Open question —
    /// id stability": resolved as ids are never regenerated by this
    /// write path).
    async fn update_fired_triggers(&self, monitor_id: &MonitorId, fired_trigger_ids: &[TriggerId], fired_at: DateTime<Utc>) -> StoreResult<()>;
}
