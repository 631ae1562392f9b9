//! Playback configuration, live state and the per-tick state machine.
//!
//! [`PlaybackConfig`] holds what the caller sets (blend mode, weights, fade,
//! filter, mirroring). [`PlaybackState`] is what changes every tick.
//! [`step`] is a pure function from `(config, state, clip length, delta)` to
//! the next state plus the side effects the owner has to carry out.
//!
//! # Phases
//!
//! ```text
//! None     --play-->             Starting
//! Starting --past loop start-->  Looping  (Exiting if loop count is 0)
//! Looping  --count hits 0-->     Exiting
//! Exiting  --past clip end-->    Exited
//! ```
//!
//! Loop-end crossings are compared in whole 1/24 s frames so that float
//! drift in the accumulated position cannot trigger early or late.

use serde::{Deserialize, Serialize};

use crate::animation::filter::BoneFilter;
use crate::animation::markers::{LoopRegion, frame_number};
use crate::errors::Result;

/// Loop-start (startup ramp) and tail lengths below this count as absent.
pub const SHORT_SEGMENT: f32 = 0.1;

/// Loop count meaning "loop forever".
pub const INFINITE_LOOPS: i32 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplyMode {
    /// Sampled transform is composed onto the bone's current pose.
    Additive,
    /// Sampled transform replaces the bone's pose.
    #[default]
    Override,
    /// Only the sampled rotation replaces the bone's rotation.
    OverrideRotation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// No clip has been started.
    #[default]
    None,
    Starting,
    Looping,
    Exiting,
    Exited,
}

/// Caller-controlled playback settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    pub apply_mode: ApplyMode,
    /// Pose blend weight before fading.
    pub multiplier: f32,
    pub fade_enabled: bool,
    /// Fade-in / short-tail fade-out duration in seconds, and the fraction of
    /// the clip used for the long-tail fade-out window.
    pub fade_ratio: f32,
    /// Upper bound, in host seconds, on how long a fade may hold the clip
    /// clock. `None` lets a fade hold for as long as it needs.
    pub max_fade_hold: Option<f32>,
    pub mirror: bool,
    pub bone_filter: BoneFilter,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            apply_mode: ApplyMode::Override,
            multiplier: 1.0,
            fade_enabled: false,
            fade_ratio: 0.25,
            max_fade_hold: Some(2.0),
            mirror: false,
            bone_filter: BoneFilter::default(),
        }
    }
}

impl PlaybackConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    #[inline]
    fn effective_fade_ratio(&self) -> f32 {
        self.fade_ratio.max(f32::EPSILON)
    }
}

/// Live playback state, advanced once per tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackState {
    pub phase: Phase,
    /// Clip-local time in seconds.
    pub position: f32,
    /// Remaining loop passes, [`INFINITE_LOOPS`] for endless looping.
    pub loop_count: i32,
    pub speed: f32,
    pub fade_multiplier: f32,
    pub fade_position: f32,
    pub loop_region: LoopRegion,
    /// Host time the current fade has held the clock for.
    pub fade_hold: f32,
    /// Set when playback ran off the end of the clip.
    pub reached_end: bool,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self {
            phase: Phase::None,
            position: 0.0,
            loop_count: INFINITE_LOOPS,
            speed: 1.0,
            fade_multiplier: 1.0,
            fade_position: 0.0,
            loop_region: LoopRegion::DEFAULT,
            fade_hold: 0.0,
            reached_end: false,
        }
    }
}

impl PlaybackState {
    /// Fresh state for a `play` call.
    #[must_use]
    pub fn started(position: f32, loop_count: i32, speed: f32, loop_region: LoopRegion) -> Self {
        Self {
            phase: Phase::Starting,
            position,
            loop_count: loop_count.max(INFINITE_LOOPS),
            speed,
            loop_region,
            ..Self::default()
        }
    }

    #[inline]
    #[must_use]
    pub fn is_infinite(&self) -> bool {
        self.loop_count == INFINITE_LOOPS
    }

    /// Whether `step` does anything in this phase.
    #[inline]
    #[must_use]
    pub fn is_active(&self) -> bool {
        !matches!(self.phase, Phase::None | Phase::Exited)
    }

    fn enter(&mut self, phase: Phase) {
        log::debug!(
            "Playback phase {:?} -> {:?} at {:.3}s (loops left: {})",
            self.phase,
            phase,
            self.position,
            self.loop_count
        );
        self.phase = phase;
        self.fade_hold = 0.0;
    }

    /// Accounts `delta` against the fade-hold budget; false once exhausted.
    fn hold_clock(&mut self, config: &PlaybackConfig, delta: f32) -> bool {
        let Some(limit) = config.max_fade_hold else {
            return true;
        };
        if self.fade_hold >= limit {
            return false;
        }
        self.fade_hold += delta.abs();
        if self.fade_hold >= limit {
            log::warn!(
                "Fade held the clock for {:.3}s in {:?}, releasing it",
                self.fade_hold,
                self.phase
            );
        }
        true
    }
}

/// Where and how strongly to pose the skeleton this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoseRequest {
    pub position: f32,
    pub weight: f32,
}

/// Side effects of one [`step`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StepOutcome {
    /// A phase change the owner should announce.
    pub announce_change: bool,
    /// Playback is over; the owner must perform an immediate stop.
    pub stop_immediately: bool,
    /// Pose to apply, sampled before the position moved.
    pub pose: Option<PoseRequest>,
}

/// Advances playback by `delta` host seconds.
///
/// The returned pose request (if any) refers to the position *before* this
/// tick's advance, matching how a frame shows the state it started in.
#[must_use]
pub fn step(
    config: &PlaybackConfig,
    mut state: PlaybackState,
    clip_length: f32,
    delta: f32,
) -> (PlaybackState, StepOutcome) {
    let mut outcome = StepOutcome::default();
    if !state.is_active() {
        return (state, outcome);
    }

    let mut clip_delta = delta * state.speed;
    if config.fade_enabled {
        clip_delta = apply_fade(config, &mut state, clip_length, delta, clip_delta);
    }

    let region = state.loop_region;
    match state.phase {
        Phase::Starting => {
            if state.position > region.start {
                let next = if state.loop_count == 0 {
                    Phase::Exiting
                } else {
                    Phase::Looping
                };
                state.enter(next);
                outcome.announce_change = true;
            }
        }
        Phase::Looping => {
            if frame_number(state.position + clip_delta) >= frame_number(region.end) {
                let remaining = state.loop_count;
                if remaining > 0 {
                    state.loop_count -= 1;
                }
                if remaining == INFINITE_LOOPS || remaining > 0 {
                    state.position = region.start;
                }
                if state.loop_count == 0 {
                    state.enter(Phase::Exiting);
                }
            }
            if region.start >= clip_length {
                log::warn!(
                    "Loop start {:.3}s is not inside the clip ({:.3}s), stopping",
                    region.start,
                    clip_length
                );
                state.enter(Phase::Exiting);
                outcome.stop_immediately = true;
            }
        }
        Phase::Exiting => {
            if state.position + clip_delta > clip_length {
                state.enter(Phase::Exited);
                state.reached_end = true;
                outcome.stop_immediately = true;
            }
        }
        Phase::None | Phase::Exited => {}
    }

    if outcome.stop_immediately {
        return (state, outcome);
    }

    if state.is_infinite() || state.position < clip_length {
        outcome.pose = Some(PoseRequest {
            position: state.position,
            weight: config.multiplier * state.fade_multiplier,
        });
        state.position += clip_delta;
    }

    (state, outcome)
}

/// Updates the fade envelope and returns the clip delta to use this tick
/// (zero while a fade holds the clock).
fn apply_fade(
    config: &PlaybackConfig,
    state: &mut PlaybackState,
    clip_length: f32,
    delta: f32,
    clip_delta: f32,
) -> f32 {
    let fade_ratio = config.effective_fade_ratio();
    let region = state.loop_region;
    let ramp = clip_delta.abs();

    match state.phase {
        Phase::Starting => {
            let mut clip_delta = clip_delta;
            if region.start < SHORT_SEGMENT {
                // No authored startup: fade in before the clip moves
                state.fade_multiplier = (state.fade_position / fade_ratio).clamp(0.0, 1.0);
                let hold_until = if region.start > 0.0 {
                    region.start
                } else {
                    fade_ratio
                };
                if state.fade_position < hold_until && state.hold_clock(config, delta) {
                    state.fade_position += ramp;
                    clip_delta = 0.0;
                } else {
                    state.fade_multiplier = 1.0;
                }
            }
            if state.position > region.start {
                state.fade_multiplier = 1.0;
                state.fade_position = fade_ratio;
            }
            clip_delta
        }
        Phase::Exiting => {
            let short_tail = clip_length - region.end < SHORT_SEGMENT;
            if short_tail && state.position + clip_delta > clip_length {
                // Short tail: hold on the last frame and fade out in place
                state.fade_position = state.fade_position.min(fade_ratio);
                // Never brighter than the long-tail fade already got to
                state.fade_multiplier = state
                    .fade_multiplier
                    .min((state.fade_position / fade_ratio).clamp(0.0, 1.0));
                if state.fade_position > 0.0 && state.hold_clock(config, delta) {
                    state.fade_position -= ramp;
                    return 0.0;
                }
            } else {
                // Long tail: fade across the last `fade_ratio` of the clip
                let fade_length = clip_length * fade_ratio;
                let into = (state.position - (clip_length - fade_length)) / fade_length;
                state.fade_multiplier = 1.0 - into.clamp(0.0, 1.0);
            }
            clip_delta
        }
        _ => clip_delta,
    }
}
