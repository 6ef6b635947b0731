//! Cluster-leadership signal (spec §4.7 "runs only on the elected
//! leader node"). Leader election itself is out of scope (§1, "Not in
//! scope: cluster coordination primitives") — this crate only needs to
//! ask "am I the leader right now?" before a sweep tick runs.

use tokio::sync::watch;

pub trait LeadershipSource: Send + Sync {
    fn is_leader(&self) -> bool;
}

/// Watch-backed signal, wired the same way [`crate::settings::SettingsHandle`]
/// hot-reloads settings: some external coordinator (not part of this
/// crate) flips the sender as leadership changes hands.
#[derive(Debug, Clone)]
pub struct WatchLeadership {
    rx: watch::Receiver<bool>,
}

impl WatchLeadership {
    pub fn new(rx: watch::Receiver<bool>) -> Self {
        Self { rx }
    }
}

impl LeadershipSource for WatchLeadership {
    fn is_leader(&self) -> bool {
        *self.rx.borrow()
    }
}

/// Test/demo double: always (or never) the leader.
#[derive(Debug, Clone, Copy)]
pub struct FixedLeadership(pub bool);

impl LeadershipSource for FixedLeadership {
    fn is_leader(&self) -> bool {
        self.0
    }
}
