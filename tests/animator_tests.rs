//! Animator Playback Tests
//!
//! Tests for:
//! - play / stop / advance phase transitions
//! - Loop region detection from the control track
//! - Loop counting, infinite loops, looped length
//! - Fade envelope and bounded fade holds
//! - Event emission
//! - Query surface

use std::cell::RefCell;
use std::rc::Rc;

use glam::Vec3;

use skeleton_animator::animation::{
    AnimationClip, Animator, AnimatorEvent, CONTROL_TRACK_BONE, InterpolationMode, Phase,
    PlaybackConfig, Track, TrackPath, TransformKey, TransformTrack,
};
use skeleton_animator::scene::{Skeleton, SkeletonPose, SkeletonRegistry};

const EPSILON: f32 = 1e-5;
const DT: f32 = 0.25;

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

fn location_track(bone: &str, times: Vec<f32>, locations: Vec<Vec3>) -> Track {
    let keys = locations.into_iter().map(TransformKey::from_location).collect();
    Track::transform(
        TrackPath::bone("Skeleton", bone),
        TransformTrack::new(times, keys, InterpolationMode::Linear),
    )
}

/// Control track with loop markers at `start` and `end`, plus one moving bone.
fn clip_with_loop(name: &str, start: f32, end: f32, length: f32) -> AnimationClip {
    AnimationClip::new(
        name,
        vec![
            location_track(
                CONTROL_TRACK_BONE,
                vec![0.0, start, end],
                vec![Vec3::ZERO, Vec3::Y, Vec3::new(0.0, 0.3, 0.0)],
            ),
            location_track(
                "Hips",
                vec![0.0, length],
                vec![Vec3::ZERO, Vec3::new(length, 0.0, 0.0)],
            ),
        ],
    )
}

/// Loop region [0.5, 2.0] in a 3 second clip.
fn walk_clip() -> AnimationClip {
    clip_with_loop("walk", 0.5, 2.0, 3.0)
}

fn record_events(animator: &mut Animator) -> Rc<RefCell<Vec<AnimatorEvent>>> {
    let log = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&log);
    animator.subscribe(move |event| sink.borrow_mut().push(event.clone()));
    log
}

/// Advances until playback stops or `max_ticks` is reached; returns ticks taken.
fn run_to_end(animator: &mut Animator, max_ticks: usize) -> usize {
    for tick in 0..max_ticks {
        if !animator.is_playing() {
            return tick;
        }
        animator.advance_pose(DT, None);
    }
    max_ticks
}

// ============================================================================
// Play
// ============================================================================

#[test]
fn play_without_clip_is_noop() {
    let mut animator = Animator::new();
    let events = record_events(&mut animator);

    animator.play(0.0, 2, 1.0);

    assert_eq!(animator.phase(), Phase::None);
    assert!(!animator.is_playing());
    assert!(events.borrow().is_empty());
}

#[test]
fn play_resets_position_and_phase() {
    let mut animator = Animator::new();
    animator.set_animation(walk_clip());
    animator.play(0.0, -1, 1.0);
    for _ in 0..7 {
        animator.advance_pose(DT, None);
    }
    assert_eq!(animator.phase(), Phase::Looping);

    animator.play(0.25, 1, 2.0);
    assert_eq!(animator.phase(), Phase::Starting);
    assert!(approx(animator.position(), 0.25));
    assert_eq!(animator.loop_count(), 1);
    assert!(approx(animator.speed(), 2.0));
}

#[test]
fn play_detects_loop_region() {
    let mut animator = Animator::new();
    animator.set_animation(walk_clip());
    animator.play(0.0, 0, 1.0);

    let region = animator.loop_region();
    assert!(approx(region.start, (0.5_f32 * 24.0).ceil() / 24.0));
    assert!(approx(region.end, (2.0_f32 * 24.0).ceil() / 24.0));
}

#[test]
fn loop_markers_round_up_to_frame() {
    let mut animator = Animator::new();
    animator.set_animation(clip_with_loop("odd", 0.51, 2.01, 3.0));
    animator.play(0.0, 0, 1.0);

    let region = animator.loop_region();
    assert!(approx(region.start, 13.0 / 24.0));
    assert!(approx(region.end, 49.0 / 24.0));
}

#[test]
fn clip_without_control_track_uses_default_region() {
    let clip = AnimationClip::new(
        "plain",
        vec![location_track("Hips", vec![0.0, 2.0], vec![Vec3::ZERO, Vec3::X])],
    );
    let mut animator = Animator::new();
    animator.set_animation(clip);
    animator.play(0.0, 0, 1.0);

    assert!(approx(animator.loop_region().start, 0.0));
    assert!(approx(animator.loop_region().end, 1.0));
}

#[test]
fn starting_enters_looping_past_loop_start() {
    let mut animator = Animator::new();
    animator.set_animation(walk_clip());
    animator.play(0.0, 2, 1.0);

    // 0.0 -> 0.25 -> 0.5 -> 0.75: still starting while position <= 0.5
    for _ in 0..3 {
        animator.advance_pose(DT, None);
        assert_eq!(animator.phase(), Phase::Starting);
    }
    animator.advance_pose(DT, None);
    assert_eq!(animator.phase(), Phase::Looping);
    assert!(approx(animator.position(), 1.0));
}

#[test]
fn zero_loops_goes_straight_to_exiting() {
    let mut animator = Animator::new();
    animator.set_animation(walk_clip());
    animator.play(0.75, 0, 1.0);

    animator.advance_pose(DT, None);
    assert_eq!(animator.phase(), Phase::Exiting);
}

// ============================================================================
// Looping
// ============================================================================

#[test]
fn each_crossing_decrements_once_and_wraps() {
    let mut animator = Animator::new();
    animator.set_animation(walk_clip());
    animator.play(0.0, 2, 1.0);

    let mut crossings = 0;
    let mut previous = animator.loop_count();
    for _ in 0..200 {
        if !animator.is_playing() {
            break;
        }
        animator.advance_pose(DT, None);
        let count = animator.loop_count();
        if count < previous {
            crossings += 1;
            assert_eq!(previous - count, 1);
            // Wrapped to loop start, then advanced one tick
            assert!(approx(animator.position(), 0.5 + DT));
            if count == 0 {
                assert_eq!(animator.phase(), Phase::Exiting);
            } else {
                assert_eq!(animator.phase(), Phase::Looping);
            }
        }
        previous = count;
    }

    assert_eq!(crossings, 2);
    assert!(animator.has_ended());
}

#[test]
fn infinite_loop_never_exits() {
    let mut animator = Animator::new();
    animator.set_animation(walk_clip());
    animator.play(0.0, -1, 1.0);

    for _ in 0..500 {
        animator.advance_pose(DT, None);
        assert_ne!(animator.phase(), Phase::Exiting);
        assert_eq!(animator.loop_count(), -1);
        assert!(animator.position() <= 2.0 + EPSILON);
    }
    assert!(animator.is_playing());
}

#[test]
fn finite_playback_reaches_end() {
    let mut animator = Animator::new();
    animator.set_animation(walk_clip());
    animator.play(0.0, 1, 1.0);

    let ticks = run_to_end(&mut animator, 200);
    assert!(ticks < 200, "Playback should terminate");
    assert!(!animator.is_playing());
    assert!(animator.has_ended());
    assert!(animator.animation().is_none());
}

#[test]
fn degenerate_loop_start_terminates() {
    // Loop start marker (0.5s) past the end of the clip
    let clip = AnimationClip::with_length("broken", 0.25, walk_clip().tracks);
    let mut animator = Animator::new();
    animator.set_animation(clip);
    animator.play(0.0, -1, 1.0);

    let ticks = run_to_end(&mut animator, 100);
    assert!(ticks < 100, "Degenerate loop must not loop forever");
    assert!(animator.animation().is_none());
}

#[test]
fn delta_additive_without_boundaries() {
    let mut coarse = Animator::new();
    let mut fine = Animator::new();
    for animator in [&mut coarse, &mut fine] {
        animator.set_animation(walk_clip());
        animator.play(0.75, -1, 1.0);
    }

    coarse.advance_pose(0.5, None);
    for _ in 0..4 {
        fine.advance_pose(0.125, None);
    }

    assert!(approx(coarse.position(), fine.position()));
    assert_eq!(coarse.phase(), fine.phase());
}

#[test]
fn speed_scales_advance() {
    let mut animator = Animator::new();
    animator.set_animation(walk_clip());
    animator.play(0.75, -1, 2.0);

    animator.advance_pose(0.125, None);
    assert!(approx(animator.position(), 1.0));
}

// ============================================================================
// Stop
// ============================================================================

#[test]
fn immediate_stop_releases_clip() {
    let mut animator = Animator::new();
    animator.set_animation(walk_clip());
    animator.play(0.0, -1, 1.0);
    animator.advance_pose(DT, None);
    let events = record_events(&mut animator);

    animator.stop(true);

    assert!(!animator.is_playing());
    assert!(animator.animation().is_none());
    assert_eq!(animator.phase(), Phase::Exited);
    assert!(approx(animator.fade_multiplier(), 0.0));
    assert!(!animator.has_ended(), "Cut short, not played out");

    let events = events.borrow();
    assert_eq!(
        events.as_slice(),
        [
            AnimatorEvent::Change {
                name: String::new(),
                loop_count: 0,
                position: -1.0,
                speed: 1.0,
            },
            AnimatorEvent::End {
                name: "walk".to_string()
            },
        ]
    );
}

#[test]
fn stop_without_clip_is_noop() {
    let mut animator = Animator::new();
    let events = record_events(&mut animator);
    animator.stop(true);
    animator.stop(false);
    assert!(events.borrow().is_empty());
}

#[test]
fn soft_stop_plays_out_exit() {
    let mut animator = Animator::new();
    animator.set_animation(walk_clip());
    animator.play(0.0, -1, 1.0);
    for _ in 0..5 {
        animator.advance_pose(DT, None);
    }
    assert_eq!(animator.phase(), Phase::Looping);

    animator.stop(false);
    assert_eq!(animator.phase(), Phase::Exiting);
    assert_eq!(animator.loop_count(), 0);
    assert!(animator.is_playing());

    // Exiting ignores the loop end and runs to the clip end
    let ticks = run_to_end(&mut animator, 100);
    assert!(ticks < 100);
    assert!(animator.has_ended());
}

#[test]
fn repeated_soft_stop_announces_once() {
    let mut animator = Animator::new();
    animator.set_animation(walk_clip());
    animator.play(0.0, -1, 1.0);
    for _ in 0..5 {
        animator.advance_pose(DT, None);
    }
    let events = record_events(&mut animator);

    animator.stop(false);
    animator.stop(false);

    assert_eq!(events.borrow().len(), 1);
}

#[test]
fn soft_stop_before_play_enters_exiting() {
    let mut animator = Animator::new();
    animator.set_animation(walk_clip());
    let events = record_events(&mut animator);
    assert_eq!(animator.phase(), Phase::None);

    animator.stop(false);

    assert_eq!(animator.phase(), Phase::Exiting);
    assert_eq!(animator.loop_count(), 0);
    assert_eq!(events.borrow().len(), 1);
}

// ============================================================================
// Events
// ============================================================================

#[test]
fn full_playback_event_sequence() {
    let mut animator = Animator::new();
    animator.set_animation(walk_clip());
    let events = record_events(&mut animator);

    animator.play(0.0, 1, 1.0);
    run_to_end(&mut animator, 200);

    let events = events.borrow();
    assert_eq!(events.len(), 5, "{events:?}");
    assert_eq!(
        events[0],
        AnimatorEvent::Change {
            name: "walk".to_string(),
            loop_count: 1,
            position: 0.0,
            speed: 1.0,
        }
    );
    assert_eq!(
        events[1],
        AnimatorEvent::Start {
            name: "walk".to_string()
        }
    );
    // Starting -> Looping
    assert!(matches!(
        &events[2],
        AnimatorEvent::Change { name, loop_count: 1, .. } if name == "walk"
    ));
    assert!(matches!(&events[3], AnimatorEvent::Change { name, .. } if name.is_empty()));
    assert_eq!(
        events[4],
        AnimatorEvent::End {
            name: "walk".to_string()
        }
    );
}

#[test]
fn set_speed_announces_change() {
    let mut animator = Animator::new();
    let events = record_events(&mut animator);

    // No clip, nothing to announce
    animator.set_speed(2.0);
    assert!(events.borrow().is_empty());

    animator.set_animation(walk_clip());
    animator.set_speed(0.5);
    assert!(matches!(
        events.borrow().last(),
        Some(AnimatorEvent::Change { speed, .. }) if approx(*speed, 0.5)
    ));
}

#[test]
fn unsubscribe_stops_delivery() {
    let mut animator = Animator::new();
    let count = Rc::new(RefCell::new(0));
    let sink = Rc::clone(&count);
    let key = animator.subscribe(move |_| *sink.borrow_mut() += 1);

    animator.set_animation(walk_clip());
    animator.play(0.0, 0, 1.0);
    assert_eq!(*count.borrow(), 2);

    assert!(animator.unsubscribe(key));
    assert!(!animator.unsubscribe(key));
    animator.play(0.0, 0, 1.0);
    assert_eq!(*count.borrow(), 2);
}

// ============================================================================
// Queries
// ============================================================================

#[test]
fn looped_length_values() {
    let mut animator = Animator::new();
    assert!(approx(animator.looped_length(), 0.0));

    animator.set_animation(walk_clip());
    animator.play(0.0, -1, 1.0);
    assert!(approx(animator.looped_length(), -1.0));

    // Body is 1.5s: one pass plus two loops
    animator.play(0.0, 2, 1.0);
    assert!(approx(animator.looped_length(), 4.5));
}

#[test]
fn looped_length_monotonic_in_loop_count() {
    let mut animator = Animator::new();
    animator.set_animation(walk_clip());
    animator.play(0.0, 0, 1.0);

    let mut previous = animator.looped_length();
    for count in 1..10 {
        animator.set_loop_count(count);
        let length = animator.looped_length();
        assert!(length >= previous, "count {count}: {length} < {previous}");
        previous = length;
    }

    animator.set_loop_count(-5);
    assert_eq!(animator.loop_count(), -1);
    assert!(approx(animator.looped_length(), -1.0));
}

#[test]
fn looped_length_handles_huge_loop_count() {
    let mut animator = Animator::new();
    animator.set_animation(walk_clip());
    animator.play(0.0, 1, 1.0);
    let single = animator.looped_length();

    animator.set_loop_count(i32::MAX);
    let huge = animator.looped_length();
    assert!(huge.is_finite());
    assert!(huge >= single, "{huge} < {single}");
}

#[test]
fn is_looping_inside_region_only() {
    let mut animator = Animator::new();
    animator.set_animation(walk_clip());
    animator.play(0.0, -1, 1.0);
    assert!(!animator.is_looping());

    animator.set_position(1.0);
    assert!(animator.is_looping());

    animator.set_position(2.0);
    assert!(!animator.is_looping());
}

#[test]
fn is_middle_depends_on_loop_count() {
    let mut animator = Animator::new();
    assert!(!animator.is_middle());

    animator.set_animation(walk_clip());
    animator.play(0.0, 2, 1.0);
    assert!(!animator.is_middle(), "Finite loops: only the loop body counts");
    for _ in 0..4 {
        animator.advance_pose(DT, None);
    }
    assert!(animator.is_middle());

    animator.play(0.0, -1, 1.0);
    assert!(animator.is_middle(), "Endless loop: any active phase counts");
}

#[test]
fn is_exiting_after_soft_stop() {
    let mut animator = Animator::new();
    animator.set_animation(walk_clip());
    animator.play(0.0, -1, 1.0);
    assert!(!animator.is_exiting());

    animator.advance_pose(DT, None);
    animator.stop(false);
    assert!(animator.is_exiting());
}

#[test]
fn bone_usage_queries() {
    let mut animator = Animator::new();
    animator.set_animation(walk_clip());
    assert!(!animator.is_using_bone("Hips"), "Usage is collected on play");

    animator.play(0.0, 0, 1.0);
    assert!(animator.is_using_bone("Hips"));
    assert!(animator.is_using_bone(CONTROL_TRACK_BONE));
    assert!(!animator.is_using_bone("Head"));
    assert_eq!(animator.bone_uses("Hips"), 2);
    assert_eq!(animator.bone_uses(CONTROL_TRACK_BONE), 3);
    assert_eq!(animator.bone_uses("Head"), 0);
}

#[test]
fn set_animation_resets_state() {
    let mut animator = Animator::new();
    animator.set_animation(walk_clip());
    animator.play(1.0, 3, 1.0);

    animator.set_animation(clip_with_loop("run", 0.25, 1.0, 1.5));
    assert_eq!(animator.animation_name(), "run");
    assert_eq!(animator.phase(), Phase::None);
    assert!(approx(animator.position(), 0.0));
    assert_eq!(animator.loop_count(), -1);
    assert!(!animator.is_playing());
}

// ============================================================================
// Fades
// ============================================================================

fn fading_animator(config: PlaybackConfig) -> Animator {
    let clip = AnimationClip::new(
        "idle",
        vec![location_track("Hips", vec![0.0, 2.0], vec![Vec3::ZERO, Vec3::X])],
    );
    let mut animator = Animator::with_config(config);
    animator.set_animation(clip);
    animator.play(0.0, -1, 1.0);
    animator
}

#[test]
fn fade_in_holds_clock_until_faded() {
    let mut animator = fading_animator(PlaybackConfig {
        fade_enabled: true,
        fade_ratio: 0.25,
        ..PlaybackConfig::default()
    });

    animator.advance_pose(0.05, None);
    assert!(approx(animator.position(), 0.0));
    assert!(approx(animator.fade_multiplier(), 0.0));

    let mut previous = animator.fade_multiplier();
    for _ in 0..3 {
        animator.advance_pose(0.05, None);
        assert!(approx(animator.position(), 0.0));
        assert!(animator.fade_multiplier() > previous);
        previous = animator.fade_multiplier();
    }

    for _ in 0..10 {
        animator.advance_pose(0.05, None);
    }
    assert!(animator.position() > 0.0);
    assert!(approx(animator.fade_multiplier(), 1.0));
}

#[test]
fn fade_hold_is_bounded() {
    let config = PlaybackConfig {
        fade_enabled: true,
        fade_ratio: 100.0,
        max_fade_hold: Some(0.5),
        ..PlaybackConfig::default()
    };
    let mut animator = fading_animator(config);
    for _ in 0..10 {
        animator.advance_pose(0.1, None);
    }
    assert!(animator.position() > 0.0, "Hold should release after 0.5s");
}

#[test]
fn unbounded_fade_hold_keeps_clock() {
    let config = PlaybackConfig {
        fade_enabled: true,
        fade_ratio: 100.0,
        max_fade_hold: None,
        ..PlaybackConfig::default()
    };
    let mut animator = fading_animator(config);
    for _ in 0..10 {
        animator.advance_pose(0.1, None);
    }
    assert!(approx(animator.position(), 0.0));
}

#[test]
fn long_tail_fades_over_clip_fraction() {
    let mut animator = Animator::with_config(PlaybackConfig {
        fade_enabled: true,
        fade_ratio: 0.25,
        ..PlaybackConfig::default()
    });
    animator.set_animation(walk_clip());
    animator.play(2.5, 0, 1.0);

    animator.advance_pose(0.125, None);
    assert_eq!(animator.phase(), Phase::Exiting);
    assert!(approx(animator.fade_multiplier(), 1.0));

    // Fade window is the last 0.75s: 2.625 is halfway through
    animator.advance_pose(0.125, None);
    assert!(approx(animator.fade_multiplier(), 0.5));
}

#[test]
fn short_tail_fade_never_brightens() {
    let mut animator = Animator::with_config(PlaybackConfig {
        fade_enabled: true,
        fade_ratio: 0.25,
        ..PlaybackConfig::default()
    });
    // Loop end on the last frame: no authored tail
    animator.set_animation(clip_with_loop("hop", 0.5, 3.0, 3.0));
    animator.play(2.5, 0, 1.0);
    animator.advance_pose(0.125, None);
    assert_eq!(animator.phase(), Phase::Exiting);

    let mut previous = animator.fade_multiplier();
    for _ in 0..50 {
        if !animator.is_playing() {
            break;
        }
        animator.advance_pose(0.125, None);
        assert!(animator.position() <= 3.0 + EPSILON);
        assert!(animator.fade_multiplier() <= previous + EPSILON);
        previous = animator.fade_multiplier();
    }
    assert!(animator.has_ended());
}

// ============================================================================
// Skeleton Binding
// ============================================================================

#[test]
fn advance_poses_bound_skeleton() {
    let mut registry = SkeletonRegistry::new();
    let skeleton = Skeleton::from_bone_names("Skeleton", ["Hips", "Spine"]).unwrap();
    let key = registry.insert("Player/Skeleton", skeleton);

    let mut animator = Animator::new();
    assert!(animator.bind_skeleton(&registry, "Player/Skeleton"));
    assert_eq!(animator.skeleton(), Some(key));
    assert_eq!(animator.bone_cache().len(), 2);

    animator.set_animation(walk_clip());
    animator.play(0.0, -1, 1.0);

    // Pose reflects the position at the start of the tick
    animator.advance(DT, &mut registry);
    animator.advance(DT, &mut registry);

    let hips = registry.get(key).unwrap();
    let pose = hips.bone_local_transform(0).unwrap();
    assert!(pose.translation.abs_diff_eq(Vec3::new(DT, 0.0, 0.0), EPSILON));
}

#[test]
fn unresolved_skeleton_runs_detached() {
    let mut registry = SkeletonRegistry::new();
    let mut animator = Animator::new();

    assert!(!animator.bind_skeleton(&registry, "Missing"));
    assert_eq!(animator.skeleton(), None);
    assert_eq!(animator.skeleton_path(), Some("Missing"));

    animator.set_animation(walk_clip());
    animator.play(0.0, -1, 1.0);
    animator.advance(DT, &mut registry);
    assert!(approx(animator.position(), DT));
}

#[test]
fn finite_playback_past_clip_end_leaves_pose() {
    let mut skel = Skeleton::from_bone_names("Skeleton", ["Hips"]).unwrap();
    let mut animator = Animator::new();
    animator.set_animation(walk_clip());
    animator.play(0.0, 1, 1.0);
    animator.set_position(4.0);

    animator.advance_pose(DT, Some(&mut skel as &mut dyn SkeletonPose));

    let pose = skel.bone_local_transform(0).unwrap();
    assert!(pose.translation.abs_diff_eq(Vec3::ZERO, EPSILON));
    assert!(approx(animator.position(), 4.0), "Position stops advancing too");
}

#[test]
fn infinite_playback_past_clip_end_still_poses() {
    let mut skel = Skeleton::from_bone_names("Skeleton", ["Hips"]).unwrap();
    let mut animator = Animator::new();
    animator.set_animation(walk_clip());
    animator.play(0.0, -1, 1.0);
    animator.set_position(4.0);

    animator.advance_pose(DT, Some(&mut skel as &mut dyn SkeletonPose));

    // Sampling past the last key holds the last key
    let pose = skel.bone_local_transform(0).unwrap();
    assert!(pose.translation.abs_diff_eq(Vec3::new(3.0, 0.0, 0.0), EPSILON));
}
