//! PQL Query Composer (spec §4.1).
//!
//! Rewrites a user query to inject a time window, append a
//! trigger-specific predicate, and cap the result size. Ordering is
//! strict: time-filter first, then custom condition, then cap — the time
//! predicate must constrain scans before aggregations run, and the head
//! must be last so the cap applies to the final output rows.
//!
//! The composer never parses PQL; it only splices text. A malformed
//! custom fragment surfaces later as a failure from the query executor.

use chrono::{DateTime, Utc};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// The half-open-in-spirit (but spec-specified as both-exclusive) window
/// `(lookbackStart, periodEnd)` a lookback-windowed monitor is filtered to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub lookback_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
}

fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Injects `where <ts> > TIMESTAMP('<lower>') and <ts> < TIMESTAMP('<upper>')`
/// as the first pipeline stage after `source = …`, or passes `query`
/// through unchanged if `window` is `None` (monitor has no lookback
/// window configured).
pub fn compose_time_filtered(query: &str, window: Option<TimeWindow>, timestamp_field: &str) -> String {
    let Some(window) = window else {
        return query.to_string();
    };

    let predicate = format!(
        "where {field} > TIMESTAMP('{lower}') and {field} < TIMESTAMP('{upper}')",
        field = timestamp_field,
        lower = format_timestamp(window.lookback_start),
        upper = format_timestamp(window.period_end),
    );

    match query.find('|') {
        Some(pipe_idx) => {
            let (head, tail) = query.split_at(pipe_idx + 1);
            format!("{head} {predicate} |{tail}")
        }
        None => format!("{query} | {predicate}"),
    }
}

/// Appends `| <fragment>` verbatim.
pub fn compose_with_custom_condition(query: &str, fragment: &str) -> String {
    format!("{query} | {fragment}")
}

/// Appends `| head <max_rows>`.
pub fn cap(query: &str, max_rows: u64) -> String {
    format!("{query} | head {max_rows}")
}

/// Convenience wrapper applying all three stages in the mandated order.
/// `custom_fragment` is `Some` only for `CUSTOM`-condition triggers.
pub fn compose(
    query: &str,
    window: Option<TimeWindow>,
    timestamp_field: &str,
    custom_fragment: Option<&str>,
    max_rows: u64,
) -> String {
    let mut composed = compose_time_filtered(query, window, timestamp_field);
    if let Some(fragment) = custom_fragment {
        composed = compose_with_custom_condition(&composed, fragment);
    }
    cap(&composed, max_rows)
}
