//! Skeletal animation playback
//!
//! - [`AnimationClip`]: tracks of keyed bone transforms
//! - [`ClipMarkers`]: loop region and bone usage read from a clip
//! - [`PlaybackConfig`] / [`PlaybackState`] / [`playback::step`]: the per-tick state machine
//! - [`blend`]: writing sampled transforms into a skeleton
//! - [`Animator`]: the public playback surface tying it together

mod values;
pub mod animator;
pub mod binding;
pub mod blend;
pub mod clip;
pub mod events;
pub mod filter;
pub mod markers;
pub mod playback;
pub mod tracks;

pub use animator::Animator;
pub use binding::BoneIndexCache;
pub use clip::{AnimationClip, Track, TrackData, TrackPath, TrackType, TransformKey, TransformTrack};
pub use events::{AnimatorEvent, AnimatorSignals, ListenerKey};
pub use filter::{BoneFilter, mirror_bone_name, mirror_rotation};
pub use markers::{CONTROL_TRACK_BONE, ClipMarkers, LoopRegion, MARKER_FPS};
pub use playback::{ApplyMode, Phase, PlaybackConfig, PlaybackState};
pub use tracks::{InterpolationMode, KeyframeCursor, KeyframeTrack};
pub use values::Interpolatable;
