//! Clip scanning done once per `play`.
//!
//! Two things are extracted from a clip before playback starts:
//!
//! - **Bone usage**: how many keys each bone track carries.
//! - **Loop region**: authored in a transform track whose bone is named
//!   [`CONTROL_TRACK_BONE`]. The Y component of that track's location, rounded
//!   to one decimal, encodes markers in key order:
//!   1. a key at `Y = 0` arms the detector,
//!   2. the next key at `Y = 1` marks the loop start,
//!   3. the next key with any other `Y` marks the loop end.
//!
//! Marker times are rounded up to the next 1/24 s frame.

use rustc_hash::FxHashMap;

use crate::animation::clip::{AnimationClip, TrackType};

/// Bone name of the loop-marker track.
pub const CONTROL_TRACK_BONE: &str = "animCtrl";

/// Marker and loop-boundary quantisation rate.
pub const MARKER_FPS: f32 = 24.0;

/// Clip-local loop bounds, `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoopRegion {
    pub start: f32,
    pub end: f32,
}

impl LoopRegion {
    /// Bounds used when a clip carries no control track.
    pub const DEFAULT: Self = Self {
        start: 0.0,
        end: 1.0,
    };

    /// Strictly inside the loop body.
    #[inline]
    #[must_use]
    pub fn contains(&self, position: f32) -> bool {
        position > self.start && position < self.end
    }

    /// Length of one pass through the loop body.
    ///
    /// Written as `length - (start + (length - end))` so that a loop end
    /// past the clip length still yields `end - start`.
    #[must_use]
    pub fn body_length(&self, clip_length: f32) -> f32 {
        clip_length - (self.start + (clip_length - self.end))
    }
}

impl Default for LoopRegion {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Rounds a time up to the next marker frame.
#[inline]
#[must_use]
pub fn quantize_up(time: f32) -> f32 {
    (time * MARKER_FPS).ceil() / MARKER_FPS
}

/// Nearest marker frame number, used for drift-free boundary comparisons.
#[inline]
#[must_use]
pub fn frame_number(time: f32) -> f32 {
    (time * MARKER_FPS).round()
}

#[inline]
fn marker_level(y: f32) -> f32 {
    (y * 10.0).round() / 10.0
}

#[inline]
fn level_is(level: f32, target: f32) -> bool {
    (level - target).abs() < 1e-4
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MarkerStage {
    AwaitReady,
    AwaitStart,
    AwaitEnd,
    Done,
}

/// Result of scanning a clip.
#[derive(Debug, Clone, Default)]
pub struct ClipMarkers {
    pub loop_region: LoopRegion,
    pub bone_uses: FxHashMap<String, usize>,
}

impl ClipMarkers {
    #[must_use]
    pub fn scan(clip: &AnimationClip) -> Self {
        let mut markers = Self::default();

        for (index, track) in clip.tracks.iter().enumerate() {
            let Some(bone) = track.path.bone_name() else {
                continue;
            };
            markers.bone_uses.insert(bone.to_string(), track.key_count());

            if bone == CONTROL_TRACK_BONE && track.track_type() == TrackType::Transform {
                markers.read_control_track(clip, index);
            }
        }

        log::debug!(
            "Clip {:?}: loop region [{}, {}], {} bone tracks",
            clip.name(),
            markers.loop_region.start,
            markers.loop_region.end,
            markers.bone_uses.len()
        );
        markers
    }

    fn read_control_track(&mut self, clip: &AnimationClip, track: usize) {
        let mut keys: Vec<(f32, f32)> = (0..clip.key_count(track))
            .filter_map(|k| {
                let time = clip.key_time(track, k)?;
                let value = clip.key_value(track, k)?;
                Some((time, marker_level(value.location.y)))
            })
            .collect();
        keys.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut stage = MarkerStage::AwaitReady;
        for (time, level) in keys {
            stage = match stage {
                MarkerStage::AwaitReady if level_is(level, 0.0) => MarkerStage::AwaitStart,
                MarkerStage::AwaitStart if level_is(level, 1.0) => {
                    self.loop_region.start = quantize_up(time);
                    MarkerStage::AwaitEnd
                }
                MarkerStage::AwaitEnd if !level_is(level, 1.0) => {
                    self.loop_region.end = quantize_up(time);
                    MarkerStage::Done
                }
                other => other,
            };
            if stage == MarkerStage::Done {
                break;
            }
        }
    }

    #[must_use]
    pub fn bone_uses(&self, bone: &str) -> usize {
        self.bone_uses.get(bone).copied().unwrap_or(0)
    }
}
