//! SQLite-backed [`AlertStore`]/[`MonitorStore`] implementation,
//! grounded in the hub's `storage::sqlite::SqliteBackend`: WAL mode,
//! a bounded connection pool, `sqlx::migrate!` for schema versioning,
//! and JSON-blob columns for the nested document shapes (mirroring how
//! the hub serializes `ServerMetrics` into a `metadata` column rather
//! than normalizing it).
//!
//! Bulk writes retry under exponential backoff on
//! [`StoreError::Transient`] (spec §7 "at-least-once"), using the same
//! `tokio-retry` crate the wider example pack reaches for around
//! rate-limited backends.

use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Pool, Row, Sqlite};
use tokio_retry::RetryIf;
use tokio_retry::strategy::{ExponentialBackoff, jitter};
use tracing::{debug, info, instrument, warn};

use super::backend::{AlertStore, MonitorStore};
use super::error::{StoreError, StoreResult};
use crate::model::alert::{Alert, AlertId};
use crate::model::monitor::{Monitor, MonitorId};
use crate::model::trigger::TriggerId;

/// SQLite-backed alert and monitor store.
///
/// Suitable for a single-cluster deployment (spec §1 scope); nothing
/// here assumes multi-writer fan-out beyond what SQLite's WAL mode
/// already buys.
pub struct SqliteAlertStore {
    pool: Pool<Sqlite>,
}

impl SqliteAlertStore {
    #[instrument(skip_all)]
    pub async fn new(db_path: impl AsRef<Path>) -> StoreResult<Self> {
        let db_path_str = db_path.as_ref().to_string_lossy().to_string();

        info!("initializing alert store at: {}", db_path_str);

        let options = SqliteConnectOptions::new()
            .filename(&db_path_str)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(std::time::Duration::from_secs(30));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| StoreError::ConnectionFailed(e.to_string()))?;

        debug!("running alert store migrations");
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    fn retry_strategy() -> impl Iterator<Item = std::time::Duration> {
        ExponentialBackoff::from_millis(50).map(jitter).take(5)
    }

    async fn save_one(&self, alert: Alert) -> StoreResult<Alert> {
        let mut alert = alert;
        if alert.id.is_none() {
            alert.id = Some(AlertId(ulid::Ulid::new().to_string()));
        }
        let id = alert.id.clone().expect("assigned above");
        let document = serde_json::to_string(&alert).map_err(|e| StoreError::SerializationError(e.to_string()))?;

        // Only a 429-equivalent (StoreError::Transient) is worth retrying
        // under backoff (spec §4.5); any other failure aborts immediately
        // with the first failing cause.
        RetryIf::spawn(
            Self::retry_strategy(),
            || async {
                sqlx::query(
                    r#"
                    INSERT INTO active_alerts (id, monitor_id, trigger_id, triggered_time, expiration_time, document)
                    VALUES (?, ?, ?, ?, ?, ?)
                    ON CONFLICT (id) DO UPDATE SET
                        monitor_id = excluded.monitor_id,
                        trigger_id = excluded.trigger_id,
                        triggered_time = excluded.triggered_time,
                        expiration_time = excluded.expiration_time,
                        document = excluded.document
                    "#,
                )
                .bind(&id.0)
                .bind(&alert.monitor_id.0)
                .bind(&alert.trigger_id.0)
                .bind(alert.triggered_time.timestamp_millis())
                .bind(alert.expiration_time.timestamp_millis())
                .bind(&document)
                .execute(&self.pool)
                .await
                .map_err(StoreError::from)
            },
            |err: &StoreError| matches!(err, StoreError::Transient(_)),
        )
        .await?;

        Ok(alert)
    }

    fn row_to_alert(row: &sqlx::sqlite::SqliteRow) -> StoreResult<Alert> {
        let document: String = row.get("document");
        serde_json::from_str(&document).map_err(|e| StoreError::SerializationError(e.to_string()))
    }
}

#[async_trait]
impl AlertStore for SqliteAlertStore {
    #[instrument(skip(self, alerts), fields(count = alerts.len()))]
    async fn save_alerts(&self, alerts: Vec<Alert>) -> StoreResult<Vec<Alert>> {
        let mut saved = Vec::with_capacity(alerts.len());
        for alert in alerts {
            saved.push(self.save_one(alert).await?);
        }
        Ok(saved)
    }

    #[instrument(skip(self))]
    async fn active_alerts_for_monitor(&self, monitor_id: &MonitorId) -> StoreResult<Vec<Alert>> {
        let rows = sqlx::query(
            "SELECT document FROM active_alerts WHERE monitor_id = ? ORDER BY triggered_time DESC",
        )
        .bind(&monitor_id.0)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_alert).collect()
    }

    #[instrument(skip(self))]
    async fn all_active_alerts(&self) -> StoreResult<Vec<Alert>> {
        let rows = sqlx::query("SELECT document FROM active_alerts ORDER BY triggered_time DESC")
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(Self::row_to_alert).collect()
    }

    #[instrument(skip(self, alerts), fields(count = alerts.len()))]
    async fn archive_alerts(&self, alerts: Vec<Alert>) -> StoreResult<usize> {
        if alerts.is_empty() {
            return Ok(0);
        }

        // Each alert is copied and deleted in its own transaction so a
        // failure on one doesn't roll back alerts that already copied
        // successfully (spec §4.7: "skip failed copies so nothing is
        // lost" — a failed alert simply stays active and is retried on
        // the next sweep).
        let mut archived = 0usize;

        for alert in &alerts {
            let id = match &alert.id {
                Some(id) => id.clone(),
                None => {
                    warn!("skipping alert with no id during archive");
                    continue;
                }
            };
            let document = match serde_json::to_string(alert) {
                Ok(document) => document,
                Err(err) => {
                    warn!(alert_id = %id, error = %err, "skipping alert that failed to serialize during archive");
                    continue;
                }
            };

            let result: StoreResult<()> = async {
                let mut tx = self.pool.begin().await.map_err(StoreError::from)?;

                sqlx::query(
                    r#"
                    INSERT INTO alert_history (id, monitor_id, trigger_id, triggered_time, expiration_time, document)
                    VALUES (?, ?, ?, ?, ?, ?)
                    ON CONFLICT (id) DO UPDATE SET document = excluded.document
                    "#,
                )
                .bind(&id.0)
                .bind(&alert.monitor_id.0)
                .bind(&alert.trigger_id.0)
                .bind(alert.triggered_time.timestamp_millis())
                .bind(alert.expiration_time.timestamp_millis())
                .bind(&document)
                .execute(&mut *tx)
                .await
                .map_err(StoreError::from)?;

                sqlx::query("DELETE FROM active_alerts WHERE id = ?")
                    .bind(&id.0)
                    .execute(&mut *tx)
                    .await
                    .map_err(StoreError::from)?;

                tx.commit().await.map_err(StoreError::from)
            }
            .await;

            match result {
                Ok(()) => archived += 1,
                Err(err) => warn!(alert_id = %id, error = %err, "failed to archive alert, leaving it active for the next sweep"),
            }
        }

        debug!("archived {} alerts to history", archived);
        Ok(archived)
    }

    #[instrument(skip(self, ids), fields(count = ids.len()))]
    async fn delete_alerts(&self, ids: &[AlertId]) -> StoreResult<usize> {
        if ids.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await.map_err(StoreError::from)?;
        let mut deleted = 0usize;
        for id in ids {
            let result = sqlx::query("DELETE FROM active_alerts WHERE id = ?")
                .bind(&id.0)
                .execute(&mut *tx)
                .await
                .map_err(StoreError::from)?;
            deleted += result.rows_affected() as usize;
        }
        tx.commit().await.map_err(StoreError::from)?;
        Ok(deleted)
    }

    #[instrument(skip(self), fields(before = %before))]
    async fn purge_history_before(&self, before: DateTime<Utc>) -> StoreResult<usize> {
        let result = sqlx::query("DELETE FROM alert_history WHERE triggered_time < ?")
            .bind(before.timestamp_millis())
            .execute(&self.pool)
            .await
            .map_err(StoreError::from)?;

        let deleted = result.rows_affected() as usize;
        if deleted > 0 {
            info!("purged {} history alerts older than {}", deleted, before);
        }
        Ok(deleted)
    }
}

#[async_trait]
impl MonitorStore for SqliteAlertStore {
    #[instrument(skip(self))]
    async fn get_monitor(&self, id: &MonitorId) -> StoreResult<Monitor> {
        let row = sqlx::query("SELECT document FROM monitors WHERE id = ?")
            .bind(&id.0)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("monitor {id} not found")))?;

        let document: String = row.get("document");
        serde_json::from_str(&document).map_err(|e| StoreError::SerializationError(e.to_string()))
    }

    #[instrument(skip(self))]
    async fn list_enabled_monitors(&self) -> StoreResult<Vec<Monitor>> {
        let rows = sqlx::query("SELECT document FROM monitors WHERE enabled = 1")
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| {
                let document: String = row.get("document");
                serde_json::from_str(&document).map_err(|e| StoreError::SerializationError(e.to_string()))
            })
            .collect()
    }

    #[instrument(skip(self, fired_trigger_ids))]
    async fn update_fired_triggers(&self, monitor_id: &MonitorId, fired_trigger_ids: &[TriggerId], fired_at: DateTime<Utc>) -> StoreResult<()> {
        let mut monitor = self.get_monitor(monitor_id).await?;
        monitor.record_fired_triggers(fired_trigger_ids, fired_at);

        let document = serde_json::to_string(&monitor).map_err(|e| StoreError::SerializationError(e.to_string()))?;

        sqlx::query("UPDATE monitors SET document = ?, version = version + 1 WHERE id = ?")
            .bind(&document)
            .bind(&monitor_id.0)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

/// Test-only helper exposed so integration tests can seed monitors
/// without going through an external create/update RPC (out of scope,
/// spec §1).
#[cfg(any(test, feature = "demo"))]
impl SqliteAlertStore {
    pub async fn put_monitor(&self, monitor: &Monitor) -> StoreResult<()> {
        let document = serde_json::to_string(monitor).map_err(|e| StoreError::SerializationError(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO monitors (id, version, enabled, document)
            VALUES (?, ?, ?, ?)
            ON CONFLICT (id) DO UPDATE SET
                version = excluded.version,
                enabled = excluded.enabled,
                document = excluded.document
            "#,
        )
        .bind(&monitor.id.0)
        .bind(monitor.version as i64)
        .bind(monitor.enabled)
        .bind(&document)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
