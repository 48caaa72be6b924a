//! timeline-sync: data-synchronization and drag-gesture engine for
//! timeline boards backed by a remote GraphQL system of record.
//!
//! The crate keeps a local item store consistent with the remote board,
//! suppresses echoes of its own writes on the change feed and turns pointer
//! gestures on schedule bars into date and group updates.

pub mod api;
pub mod config;
pub mod core;
pub mod error;
pub mod extract;
pub mod interaction;
pub mod remote;
pub mod sync;
pub mod telemetry;

pub use api::{AccessMode, FeedEvent, GestureOutcome, LoadState, TimelineEngine, ViewOptions};
pub use config::TimelineConfig;
pub use error::{TimelineError, TimelineResult};
