//! Optimistic store for the registry and the checkpoint log

mod optimistic;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use optimistic::{is_provisional, OptimisticStore, PendingOp, PROVISIONAL_PREFIX};
