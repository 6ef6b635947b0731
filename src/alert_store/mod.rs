//! Persistence for monitors and alerts (spec §4.5, §6), split into two
//! collections the way the teacher splits metrics from service checks:
//! monitors (the scheduled-jobs collection) and alerts, active and
//! historical.

pub mod backend;
pub mod error;

#[cfg(feature = "sqlite-store")]
pub mod sqlite;

pub use backend::{AlertStore, MonitorStore};
pub use error::{StoreError, StoreResult};

#[cfg(feature = "sqlite-store")]
pub use sqlite::SqliteAlertStore;
