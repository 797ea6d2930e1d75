//! Pipeline stages for one polling cycle and the loop that repeats it.
//!
//! - `collect`: fetch the current snapshot
//! - `diff`: compare snapshots and yield notification events
//! - `notify`: dispatch events to the sinks
//! - `cycle`: run one fetch → diff → notify → persist pass
//! - `schedule`: repeat cycles on an interval

pub mod collect;
pub mod cycle;
pub mod diff;
pub mod notify;
pub mod schedule;

pub use collect::SnapshotCollector;
pub use cycle::{CycleDriver, CycleOutcome, CycleReport, CycleState};
pub use diff::{DiffCalculator, calculate_events, crossed_thresholds};
pub use notify::{DispatchReport, Notifier};
pub use schedule::{Clock, Scheduler, SystemClock};
