#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::too_many_arguments)]

//! Runtime skeletal-animation blending.
//!
//! An [`Animator`] samples an [`AnimationClip`] and writes blended bone poses
//! into a skeleton once per frame, with phased playback (start, loop, exit),
//! loop regions authored as markers inside the clip, fades, bone filtering
//! and left/right mirroring.

pub mod animation;
pub mod errors;
pub mod scene;
pub mod utils;

pub use animation::{
    AnimationClip, Animator, AnimatorEvent, ApplyMode, BoneFilter, LoopRegion, Phase,
    PlaybackConfig, Track, TrackPath, TransformKey, TransformTrack,
};
pub use errors::{AnimatorError, Result};
pub use scene::{
    BoneTransform, Skeleton, SkeletonKey, SkeletonPose, SkeletonRegistry, SkeletonResolver,
};
