//! Error Types
//!
//! This module defines the error types used by the animator's non-hot paths.
//!
//! # Overview
//!
//! The main error type [`AnimatorError`] covers:
//! - Clip and track construction (mismatched key arrays, unsorted times)
//! - Track sampling against a non-transform track
//! - Skeleton construction and resolution
//! - Configuration parsing
//!
//! The per-frame path ([`Animator::advance`](crate::Animator::advance)) never
//! returns these; failures there are logged and the offending track or bone
//! is skipped.
//!
//! ```rust,ignore
//! use skeleton_animator::errors::{AnimatorError, Result};
//!
//! fn build() -> Result<()> {
//!     Ok(())
//! }
//! ```

use thiserror::Error;

/// The main error type for the animator crate.
#[derive(Error, Debug)]
pub enum AnimatorError {
    // ========================================================================
    // Clip & Track Errors
    // ========================================================================
    /// The track exists but does not carry transform keys.
    #[error("Track {track} is not a transform track")]
    NotTransformTrack {
        /// Index of the offending track
        track: usize,
    },

    /// Track index out of bounds.
    #[error("Track index out of bounds: {track} (track count: {count})")]
    TrackIndexOutOfBounds {
        /// The invalid index
        track: usize,
        /// Number of tracks in the clip
        count: usize,
    },

    /// Key times and key values have different lengths.
    #[error("Key count mismatch: {times} times but {values} values")]
    KeyCountMismatch {
        /// Number of key times
        times: usize,
        /// Number of key values
        values: usize,
    },

    /// A track was built without any keys.
    #[error("Track has no keys")]
    EmptyTrack,

    /// Key times must be non-decreasing.
    #[error("Key times are not sorted (index {index})")]
    UnsortedKeyTimes {
        /// First index whose time is smaller than its predecessor
        index: usize,
    },

    /// A track path string could not be parsed.
    #[error("Invalid track path: {0:?}")]
    InvalidTrackPath(String),

    // ========================================================================
    // Skeleton Errors
    // ========================================================================
    /// Two bones share the same name.
    #[error("Duplicate bone name: {0}")]
    DuplicateBone(String),

    /// A bone references a parent that does not precede it.
    #[error("Bone {bone} has invalid parent index {parent}")]
    InvalidParent {
        /// Name of the bone being added
        bone: String,
        /// The invalid parent index
        parent: usize,
    },

    /// The host could not resolve a skeleton path.
    #[error("Skeleton not found: {0}")]
    SkeletonNotFound(String),

    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Playback configuration could not be parsed or written.
    #[error("Config error: {0}")]
    Config(#[from] serde_json::Error),
}

/// Alias for `Result<T, AnimatorError>`.
pub type Result<T> = std::result::Result<T, AnimatorError>;
