//! Cluster settings (spec §6), all hot-reloadable.
//!
//! The hub's `StorageConfig` plays this role for retention/cleanup knobs
//! (validate-on-load, sane defaults); here the knobs are genuinely mutable
//! at runtime, so they're held behind a `tokio::sync::watch` channel
//! rather than parsed once from a static file.

use std::time::Duration;

use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Settings {
    pub history_enabled: bool,
    pub history_rollover_period: Duration,
    pub history_index_max_age: Duration,
    pub history_max_docs: u64,
    pub history_retention_period: Duration,
    pub query_results_max_datarows: u64,
    pub query_results_max_size_bytes: usize,
    pub per_result_trigger_max_alerts: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            history_enabled: true,
            history_rollover_period: Duration::from_secs(60 * 60 * 24),
            history_index_max_age: Duration::from_secs(60 * 60 * 24 * 30),
            history_max_docs: 1_000_000,
            history_retention_period: Duration::from_secs(60 * 60 * 24 * 60),
            query_results_max_datarows: 10_000,
            query_results_max_size_bytes: 1024 * 1024,
            per_result_trigger_max_alerts: 10,
        }
    }
}

/// Hot-reloadable handle over [`Settings`]. Cloning the handle shares the
/// same underlying channel, mirroring how the hub shares `Arc`-backed
/// config across actors.
#[derive(Debug, Clone)]
pub struct SettingsHandle {
    tx: watch::Sender<Settings>,
}

impl SettingsHandle {
    pub fn new(initial: Settings) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx }
    }

    pub fn current(&self) -> Settings {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<Settings> {
        self.tx.subscribe()
    }

    /// Applies a hot-reload update (e.g. from a cluster settings API).
    pub fn update(&self, f: impl FnOnce(&mut Settings)) {
        self.tx.send_modify(f);
    }
}

impl Default for SettingsHandle {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}
