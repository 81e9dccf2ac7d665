//! Per-frame computational steps.
//!
//! Detection fills an [`InteractionTable`](super::table::InteractionTable) from the
//! candidate pairs of a frame; the remaining tasks are post-processing passes that
//! each run once over the finished table, in the order exclusion, deduplication,
//! bridge filter.

pub mod bridge_filter;
pub mod deduplication;
pub mod detection;
pub mod exclusion;
