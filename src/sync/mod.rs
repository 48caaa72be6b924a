//! Optimistic local state and its reconciliation with the remote change feed.

pub mod coordinator;
pub mod store;
pub mod suppress;

pub use coordinator::{ChangeFeedCoordinator, FeedDecision};
pub use store::{ItemPatch, ItemStore, StoreMutation, SyncState};
pub use suppress::{MutationId, SuppressionSet};
