use std::sync::Arc;

use crate::animation::binding::BoneIndexCache;
use crate::animation::blend;
use crate::animation::clip::AnimationClip;
use crate::animation::events::{AnimatorEvent, AnimatorSignals, ListenerKey};
use crate::animation::filter::BoneFilter;
use crate::animation::markers::{ClipMarkers, LoopRegion};
use crate::animation::playback::{
    self, ApplyMode, INFINITE_LOOPS, Phase, PlaybackConfig, PlaybackState,
};
use crate::animation::tracks::KeyframeCursor;
use crate::scene::SkeletonKey;
use crate::scene::registry::SkeletonResolver;
use crate::scene::skeleton::SkeletonPose;

/// Plays one clip on one skeleton.
///
/// Typical flow:
///
/// ```rust,ignore
/// let mut animator = Animator::new();
/// animator.bind_skeleton(&registry, "Player/Skeleton");
/// animator.set_animation(clip);
/// animator.play(0.0, 2, 1.0);
///
/// // once per frame
/// animator.advance(dt, &mut registry);
/// ```
///
/// Nothing here fails loudly: with no clip, no skeleton, or bones the
/// skeleton does not have, the animator simply does less.
#[derive(Debug, Default)]
pub struct Animator {
    config: PlaybackConfig,
    state: PlaybackState,

    clip: Option<Arc<AnimationClip>>,
    // One cursor per clip track
    cursors: Vec<KeyframeCursor>,
    markers: ClipMarkers,

    skeleton: Option<SkeletonKey>,
    skeleton_path: Option<String>,
    bones: BoneIndexCache,

    signals: AnimatorSignals,
}

impl Animator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_config(config: PlaybackConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    // ========================================================================
    // Skeleton binding
    // ========================================================================

    /// Resolves `path` through the host and rebuilds the bone cache.
    ///
    /// On failure the animator is left detached: playback still advances but
    /// no pose is written.
    pub fn bind_skeleton<R>(&mut self, resolver: &R, path: &str) -> bool
    where
        R: SkeletonResolver + ?Sized,
    {
        self.skeleton_path = Some(path.to_string());
        if let Some(key) = resolver.resolve(path) {
            self.bind_skeleton_key(resolver, key)
        } else {
            log::warn!("Animator: skeleton {path:?} not found, running detached");
            self.unbind_skeleton();
            false
        }
    }

    pub fn bind_skeleton_key<R>(&mut self, resolver: &R, key: SkeletonKey) -> bool
    where
        R: SkeletonResolver + ?Sized,
    {
        let Some(skeleton) = resolver.skeleton(key) else {
            log::warn!("Animator: skeleton {key:?} is gone, running detached");
            self.unbind_skeleton();
            return false;
        };
        self.skeleton = Some(key);
        self.bones.rebuild(skeleton);
        log::debug!("Animator bound to skeleton {key:?} ({} bones)", self.bones.len());
        true
    }

    pub fn unbind_skeleton(&mut self) {
        self.skeleton = None;
        self.bones.invalidate();
    }

    #[must_use]
    pub fn skeleton(&self) -> Option<SkeletonKey> {
        self.skeleton
    }

    #[must_use]
    pub fn skeleton_path(&self) -> Option<&str> {
        self.skeleton_path.as_deref()
    }

    #[must_use]
    pub fn bone_cache(&self) -> &BoneIndexCache {
        &self.bones
    }

    /// Rebuilds the bone cache from the bound skeleton.
    pub fn rebuild_bone_cache<R>(&mut self, resolver: &R) -> bool
    where
        R: SkeletonResolver + ?Sized,
    {
        let skeleton = match self.skeleton {
            Some(key) => resolver.skeleton(key),
            None => None,
        };
        match skeleton {
            Some(skeleton) => {
                self.bones.rebuild(skeleton);
                true
            }
            None => false,
        }
    }

    /// Empties the bone cache; it is rebuilt on the next posed tick.
    pub fn invalidate_bone_cache(&mut self) {
        self.bones.invalidate();
    }

    // ========================================================================
    // Clip
    // ========================================================================

    /// Assigns a clip and resets playback.
    ///
    /// The clip is held behind `Arc`; callers cannot mutate it in place
    /// while it plays.
    pub fn set_animation(&mut self, clip: impl Into<Arc<AnimationClip>>) {
        let clip = clip.into();
        log::debug!("Animator: clip {:?} assigned", clip.name());
        self.cursors = vec![KeyframeCursor::default(); clip.track_count()];
        self.clip = Some(clip);
        self.markers = ClipMarkers::default();
        self.state = PlaybackState::default();
    }

    #[must_use]
    pub fn animation(&self) -> Option<&Arc<AnimationClip>> {
        self.clip.as_ref()
    }

    /// Name of the current clip, empty when none is assigned.
    #[must_use]
    pub fn animation_name(&self) -> &str {
        self.clip.as_deref().map_or("", AnimationClip::name)
    }

    // ========================================================================
    // Playback control
    // ========================================================================

    /// Starts the assigned clip at `time`.
    ///
    /// `loop_count` is the number of extra passes through the loop region,
    /// `-1` to loop until stopped. Scans the clip for loop markers and bone
    /// usage.
    pub fn play(&mut self, time: f32, loop_count: i32, speed: f32) {
        let Some(clip) = self.clip.as_deref() else {
            log::debug!("Animator: play() without a clip");
            return;
        };

        self.markers = ClipMarkers::scan(clip);
        self.state = PlaybackState::started(time, loop_count, speed, self.markers.loop_region);
        self.cursors.fill(KeyframeCursor::default());
        log::debug!(
            "Animator: play {:?} from {time:.3}s, loops {loop_count}, speed {speed}",
            clip.name()
        );

        self.emit_change();
        let name = self.animation_name().to_string();
        self.signals.emit(&AnimatorEvent::Start { name });
    }

    /// Stops playback.
    ///
    /// A soft stop (`immediate == false`) lets the clip play out its exit
    /// section and fade. An immediate stop releases the clip now.
    pub fn stop(&mut self, immediate: bool) {
        if self.clip.is_none() {
            return;
        }

        self.state.loop_count = 0;
        if immediate {
            let name = self.animation_name().to_string();
            log::debug!("Animator: {name:?} stopped");
            self.state.speed = 1.0;
            self.signals.emit(&AnimatorEvent::Change {
                name: String::new(),
                loop_count: 0,
                position: -1.0,
                speed: self.state.speed,
            });
            self.signals.emit(&AnimatorEvent::End { name });
            self.clip = None;
            self.cursors.clear();
            self.state.phase = Phase::Exited;
            self.state.fade_multiplier = 0.0;
            self.state.position = 0.0;
        } else if self.state.phase != Phase::Exiting {
            self.emit_change();
            if self.state.phase != Phase::Exited {
                self.state.phase = Phase::Exiting;
                self.state.fade_hold = 0.0;
            }
        }
    }

    /// Advances playback by `delta` seconds and poses the bound skeleton.
    pub fn advance<R>(&mut self, delta: f32, resolver: &mut R)
    where
        R: SkeletonResolver + ?Sized,
    {
        let skeleton = match self.skeleton {
            Some(key) => resolver.skeleton_mut(key),
            None => None,
        };
        self.advance_pose(delta, skeleton);
    }

    /// Advances playback, posing `skeleton` if given.
    ///
    /// For hosts that own the skeleton directly instead of going through a
    /// [`SkeletonResolver`].
    pub fn advance_pose(&mut self, delta: f32, skeleton: Option<&mut dyn SkeletonPose>) {
        let Some(clip) = self.clip.clone() else {
            return;
        };

        let (state, outcome) = playback::step(&self.config, self.state, clip.length(), delta);
        self.state = state;

        if outcome.announce_change {
            self.emit_change();
        }
        if outcome.stop_immediately {
            self.stop(true);
            return;
        }

        if let (Some(request), Some(skeleton)) = (outcome.pose, skeleton) {
            if self.bones.is_stale(&*skeleton) {
                self.bones.rebuild(&*skeleton);
            }
            blend::apply_pose(
                &clip,
                &mut self.cursors,
                request.position,
                request.weight,
                &self.config,
                &self.bones,
                skeleton,
            );
        }
    }

    /// Poses `skeleton` from the current clip at `position` with `weight`,
    /// without touching playback state. Returns the number of bones written.
    pub fn apply_at(
        &mut self,
        skeleton: &mut dyn SkeletonPose,
        position: f32,
        weight: f32,
    ) -> usize {
        let Some(clip) = self.clip.clone() else {
            return 0;
        };
        if self.bones.is_stale(&*skeleton) {
            self.bones.rebuild(&*skeleton);
        }
        blend::apply_pose(
            &clip,
            &mut self.cursors,
            position,
            weight,
            &self.config,
            &self.bones,
            skeleton,
        )
    }

    // ========================================================================
    // Parameters
    // ========================================================================

    #[must_use]
    pub fn config(&self) -> &PlaybackConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut PlaybackConfig {
        &mut self.config
    }

    #[must_use]
    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    #[must_use]
    pub fn position(&self) -> f32 {
        self.state.position
    }

    pub fn set_position(&mut self, position: f32) {
        self.state.position = position;
    }

    #[must_use]
    pub fn speed(&self) -> f32 {
        self.state.speed
    }

    /// Sets the playback speed and announces it if a clip is assigned.
    pub fn set_speed(&mut self, speed: f32) {
        self.state.speed = speed;
        if self.clip.is_some() {
            self.emit_change();
        }
    }

    #[must_use]
    pub fn multiplier(&self) -> f32 {
        self.config.multiplier
    }

    pub fn set_multiplier(&mut self, multiplier: f32) {
        self.config.multiplier = multiplier;
    }

    #[must_use]
    pub fn is_fade_enabled(&self) -> bool {
        self.config.fade_enabled
    }

    pub fn set_fade_enabled(&mut self, enabled: bool) {
        self.config.fade_enabled = enabled;
    }

    #[must_use]
    pub fn fade_ratio(&self) -> f32 {
        self.config.fade_ratio
    }

    pub fn set_fade_ratio(&mut self, ratio: f32) {
        self.config.fade_ratio = ratio;
    }

    #[must_use]
    pub fn fade_multiplier(&self) -> f32 {
        self.state.fade_multiplier
    }

    #[must_use]
    pub fn loop_count(&self) -> i32 {
        self.state.loop_count
    }

    /// Any negative count means "loop forever".
    pub fn set_loop_count(&mut self, loop_count: i32) {
        self.state.loop_count = loop_count.max(INFINITE_LOOPS);
    }

    #[must_use]
    pub fn loop_region(&self) -> LoopRegion {
        self.state.loop_region
    }

    #[must_use]
    pub fn bone_filter(&self) -> &BoneFilter {
        &self.config.bone_filter
    }

    pub fn set_bone_filter(&mut self, filter: impl Into<BoneFilter>) {
        self.config.bone_filter = filter.into();
    }

    #[must_use]
    pub fn is_mirror(&self) -> bool {
        self.config.mirror
    }

    pub fn set_mirror(&mut self, mirror: bool) {
        self.config.mirror = mirror;
    }

    #[must_use]
    pub fn apply_mode(&self) -> ApplyMode {
        self.config.apply_mode
    }

    pub fn set_apply_mode(&mut self, mode: ApplyMode) {
        self.config.apply_mode = mode;
    }

    // ========================================================================
    // Queries
    // ========================================================================

    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.clip.is_some() && self.state.is_active()
    }

    /// In the loop body of a finite loop, or just playing otherwise.
    #[must_use]
    pub fn is_middle(&self) -> bool {
        if self.clip.is_none() {
            return false;
        }
        if self.state.loop_count > 0 {
            return self.state.phase == Phase::Looping;
        }
        self.is_playing()
    }

    /// Position strictly inside the loop region.
    #[must_use]
    pub fn is_looping(&self) -> bool {
        self.clip.is_some() && self.state.loop_region.contains(self.state.position)
    }

    #[must_use]
    pub fn is_exiting(&self) -> bool {
        self.clip.is_some() && self.state.phase == Phase::Exiting
    }

    /// Playback ran to the end of the clip (as opposed to being cut short).
    #[must_use]
    pub fn has_ended(&self) -> bool {
        self.state.phase == Phase::Exited && self.state.reached_end
    }

    #[must_use]
    pub fn is_using_bone(&self, bone: &str) -> bool {
        self.markers.bone_uses.contains_key(bone)
    }

    /// Keys on `bone`'s track in the last played clip, 0 if none.
    #[must_use]
    pub fn bone_uses(&self, bone: &str) -> usize {
        self.markers.bone_uses(bone)
    }

    /// Projected duration including the remaining loops.
    ///
    /// `-1.0` for endless looping, `0.0` without a clip.
    #[must_use]
    pub fn looped_length(&self) -> f32 {
        let Some(clip) = self.clip.as_deref() else {
            return 0.0;
        };
        if self.state.is_infinite() {
            return -1.0;
        }
        let body = self.state.loop_region.body_length(clip.length()).max(0.0);
        body * (1.0 + self.state.loop_count as f32)
    }

    // ========================================================================
    // Events
    // ========================================================================

    pub fn subscribe(&mut self, listener: impl FnMut(&AnimatorEvent) + 'static) -> ListenerKey {
        self.signals.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, key: ListenerKey) -> bool {
        self.signals.unsubscribe(key)
    }

    fn emit_change(&mut self) {
        let event = AnimatorEvent::Change {
            name: self.animation_name().to_string(),
            loop_count: self.state.loop_count,
            position: self.state.position,
            speed: self.state.speed,
        };
        self.signals.emit(&event);
    }
}
