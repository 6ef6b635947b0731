//! Trigger Evaluator and Throttle Gate (spec §4.2, §4.3).

pub mod evaluator;
pub mod throttle;

pub use evaluator::{custom_condition_column, evaluate, materialize_result_slices, ResultSlice};
pub use throttle::is_throttled;
