//! Throttle Gate (spec §4.3).

use chrono::{DateTime, Utc};

use crate::model::trigger::Trigger;

/// Returns `false` unconditionally for a manual (user-requested) run.
/// Otherwise returns `true` iff `throttleDuration` is set *and*
/// `lastFiredTime` is set *and* `lastFiredTime > now − throttleDuration`.
///
/// Throttled triggers record "not fired, not throttled-as-alert" and skip
/// query execution entirely — a deliberate choice to shed load on hot
/// triggers (spec §4.3).
pub fn is_throttled(trigger: &Trigger, now: DateTime<Utc>, manual: bool) -> bool {
    if manual {
        return false;
    }

    let (Some(throttle_minutes), Some(last_fired)) =
        (trigger.throttle_duration_minutes, trigger.last_fired_time)
    else {
        return false;
    };

    let window_start = now - chrono::Duration::minutes(throttle_minutes as i64);
    last_fired > window_start
}
