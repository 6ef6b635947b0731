//! Alert Lifecycle Sweeper (spec §4.7): a leader-gated background actor
//! that periodically expires or archives alerts. Structured after the
//! hub's `StorageActor`/`StorageHandle` split — an actor owning all
//! mutable state plus a cheap, cloneable handle for control commands —
//! with the same `mpsc` command channel and `oneshot` reply pattern.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::time;
use tracing::{debug, error, info, instrument, warn};

use crate::alert_store::{AlertStore, MonitorStore};
use crate::clock::Clock;
use crate::external::LeadershipSource;
use crate::model::alert::{Alert, AlertId};
use crate::settings::SettingsHandle;

/// Sweep cadence (spec §4.7).
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// How often leadership is polled to detect the becoming-leader edge
/// (spec §4.7 "on becoming leader: run one sweep immediately"). Much
/// shorter than [`SWEEP_INTERVAL`] so a freshly elected leader doesn't
/// wait up to a minute for its first sweep.
const LEADERSHIP_POLL_INTERVAL: Duration = Duration::from_secs(2);

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepStats {
    pub scanned: usize,
    pub expired: usize,
    pub archived: usize,
    pub deleted: usize,
}

enum SweeperCommand {
    SweepNow { respond_to: oneshot::Sender<SweepStats> },
    Shutdown,
}

/// Why an alert is swept, independent of `historyEnabled` (which only
/// decides archive-vs-delete).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExpiryReason {
    PastExpirationTime,
    /// The owning monitor is gone, or no longer has a trigger with this
    /// id (spec §4.7 "reshaped" triggers never regain their old alerts).
    Orphaned,
}

pub struct AlertSweeper {
    alert_store: Arc<dyn AlertStore>,
    monitor_store: Arc<dyn MonitorStore>,
    clock: Arc<dyn Clock>,
    leadership: Arc<dyn LeadershipSource>,
    settings: SettingsHandle,
    command_rx: mpsc::Receiver<SweeperCommand>,
}

impl AlertSweeper {
    #[instrument(skip(self))]
    pub async fn run(mut self) {
        info!("alert sweeper started");
        let mut tick = time::interval(SWEEP_INTERVAL);
        let mut leadership_poll = time::interval(LEADERSHIP_POLL_INTERVAL);
        let mut was_leader = false;

        loop {
            tokio::select! {
                _ = leadership_poll.tick() => {
                    let is_leader = self.leadership.is_leader();
                    if is_leader && !was_leader {
                        info!("became cluster leader, running immediate sweep");
                        self.sweep().await;
                        tick.reset();
                    } else if !is_leader && was_leader {
                        debug!("lost cluster leadership, cancelling sweep schedule");
                    }
                    was_leader = is_leader;
                }

                _ = tick.tick() => {
                    if self.leadership.is_leader() {
                        self.sweep().await;
                    } else {
                        debug!("not cluster leader, skipping sweep tick");
                    }
                }

                Some(cmd) = self.command_rx.recv() => {
                    match cmd {
                        SweeperCommand::SweepNow { respond_to } => {
                            let stats = self.sweep().await;
                            let _ = respond_to.send(stats);
                        }
                        SweeperCommand::Shutdown => {
                            debug!("sweeper received shutdown command");
                            break;
                        }
                    }
                }

                else => {
                    warn!("sweeper command channel closed, shutting down");
                    break;
                }
            }
        }

        info!("alert sweeper stopped");
    }

    #[instrument(skip(self))]
    async fn sweep(&self) -> SweepStats {
        let now = self.clock.now();
        let history_enabled = self.settings.current().history_enabled;

        let active = match self.alert_store.all_active_alerts().await {
            Ok(alerts) => alerts,
            Err(err) => {
                error!(error = %err, "sweep failed to load active alerts");
                return SweepStats::default();
            }
        };

        let mut stats = SweepStats { scanned: active.len(), ..Default::default() };
        let mut expired = Vec::new();

        for alert in active {
            if let Some(reason) = self.expiry_reason(&alert, now).await {
                debug!(alert_id = ?alert.id, ?reason, "expiring alert");
                expired.push(alert);
            }
        }

        stats.expired = expired.len();
        if expired.is_empty() {
            return stats;
        }

        if history_enabled {
            match self.alert_store.archive_alerts(expired).await {
                Ok(count) => stats.archived = count,
                Err(err) => error!(error = %err, "failed to archive expired alerts"),
            }
        } else {
            let ids: Vec<AlertId> = expired.iter().filter_map(|a| a.id.clone()).collect();
            match self.alert_store.delete_alerts(&ids).await {
                Ok(count) => stats.deleted = count,
                Err(err) => error!(error = %err, "failed to delete expired alerts"),
            }
        }

        info!(scanned = stats.scanned, expired = stats.expired, archived = stats.archived, deleted = stats.deleted, "sweep complete");
        stats
    }

    async fn expiry_reason(&self, alert: &Alert, now: chrono::DateTime<chrono::Utc>) -> Option<ExpiryReason> {
        if now >= alert.expiration_time {
            return Some(ExpiryReason::PastExpirationTime);
        }

        match self.monitor_store.get_monitor(&alert.monitor_id).await {
            Ok(monitor) => {
                let still_exists = monitor.triggers.iter().any(|t| t.id == alert.trigger_id);
                if still_exists { None } else { Some(ExpiryReason::Orphaned) }
            }
            Err(crate::alert_store::StoreError::NotFound(_)) => Some(ExpiryReason::Orphaned),
            Err(err) => {
                warn!(monitor_id = %alert.monitor_id, error = %err, "failed to look up monitor during sweep, leaving alert active");
                None
            }
        }
    }
}

/// Handle for controlling a spawned [`AlertSweeper`].
#[derive(Clone)]
pub struct SweeperHandle {
    sender: mpsc::Sender<SweeperCommand>,
}

impl SweeperHandle {
    pub fn spawn(
        alert_store: Arc<dyn AlertStore>,
        monitor_store: Arc<dyn MonitorStore>,
        clock: Arc<dyn Clock>,
        leadership: Arc<dyn LeadershipSource>,
        settings: SettingsHandle,
    ) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel(8);

        let sweeper = AlertSweeper { alert_store, monitor_store, clock, leadership, settings, command_rx: cmd_rx };
        tokio::spawn(sweeper.run());

        Self { sender: cmd_tx }
    }

    /// Triggers an out-of-band sweep and waits for its stats, bypassing
    /// the 1-minute cadence — useful for tests and an eventual
    /// operator-triggered "sweep now" admin call.
    pub async fn sweep_now(&self) -> anyhow::Result<SweepStats> {
        let (tx, rx) = oneshot::channel();
        self.sender.send(SweeperCommand::SweepNow { respond_to: tx }).await?;
        Ok(rx.await?)
    }

    pub async fn shutdown(&self) {
        let _ = self.sender.send(SweeperCommand::Shutdown).await;
    }
}
