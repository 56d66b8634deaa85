// Aggregation state.
// Failure counters and timeline data accumulated during a pass.

pub mod tally;
pub mod timeline;

pub use tally::FailureTally;
pub use timeline::{TimelineEntry, TimelineMatrix};
