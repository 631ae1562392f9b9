//! Utility Module
//!
//! - [`ChangeTracker`]: monotonically increasing version counter
//! - [`MutGuard`]: mutable borrow that bumps a version when dropped
//!
//! Skeletons use these to publish layout changes so that bone-index caches
//! can detect that they are stale.

pub mod version_tracker;

pub use version_tracker::{ChangeTracker, MutGuard};
