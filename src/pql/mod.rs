//! PQL (piped query language) composition. The core never parses PQL —
//! it only splices query text; syntax and semantics are owned by the
//! external executor (spec §6).

pub mod composer;

pub use composer::{cap, compose, compose_time_filtered, compose_with_custom_condition, TimeWindow};
