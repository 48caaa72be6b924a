//! Host-facing facade tying remote sync, the item store and gestures together.

mod engine;
mod engine_commit;
mod engine_gesture;
mod engine_init;
mod engine_sync;
mod engine_view;

pub use engine::{AccessMode, FeedEvent, LoadState, TimelineEngine, ViewOptions};
pub use engine_gesture::GestureOutcome;
