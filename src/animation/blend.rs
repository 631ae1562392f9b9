use std::borrow::Cow;

use crate::animation::binding::BoneIndexCache;
use crate::animation::clip::{AnimationClip, TransformKey};
use crate::animation::filter::{mirror_bone_name, mirror_rotation};
use crate::animation::playback::{ApplyMode, PlaybackConfig};
use crate::animation::tracks::KeyframeCursor;
use crate::scene::skeleton::SkeletonPose;
use crate::scene::transform::BoneTransform;

/// Blends one sampled transform onto a bone's current pose.
#[must_use]
pub fn blend_bone(
    mode: ApplyMode,
    base: &BoneTransform,
    sample: &TransformKey,
    weight: f32,
) -> BoneTransform {
    match mode {
        ApplyMode::Additive => {
            let target = BoneTransform {
                translation: base.translated_local(sample.location).translation,
                rotation: base.rotation.normalize() * sample.rotation,
                scale: base.scale * sample.scale,
            };
            base.interpolate_with(&target, weight)
        }
        ApplyMode::Override => {
            let target = BoneTransform::new(sample.location, sample.rotation, sample.scale);
            base.interpolate_with(&target, weight)
        }
        ApplyMode::OverrideRotation => BoneTransform {
            rotation: base
                .rotation
                .normalize()
                .slerp(sample.rotation.normalize(), weight),
            ..*base
        },
    }
}

/// Samples every bone track of `clip` at `position` and writes the blended
/// result into `skeleton`. Returns the number of bones written.
///
/// Tracks without a bone target, non-transform tracks, filtered bones and
/// bones the skeleton does not have are skipped.
pub fn apply_pose(
    clip: &AnimationClip,
    cursors: &mut [KeyframeCursor],
    position: f32,
    weight: f32,
    config: &PlaybackConfig,
    cache: &BoneIndexCache,
    skeleton: &mut dyn SkeletonPose,
) -> usize {
    let mut written = 0;
    let mut scratch = KeyframeCursor::default();

    for (index, track) in clip.tracks.iter().enumerate() {
        let Some(source) = track.path.bone_name() else {
            continue;
        };
        if !config.bone_filter.allows(source) {
            continue;
        }

        let cursor = cursors.get_mut(index).unwrap_or(&mut scratch);
        let mut sample = match clip.sample_with_cursor(index, position, cursor) {
            Ok(sample) => sample,
            Err(err) => {
                log::trace!("Skipping track {}: {err}", track.path);
                continue;
            }
        };

        let bone: Cow<'_, str> = if config.mirror {
            sample.rotation = mirror_rotation(sample.rotation);
            Cow::Owned(mirror_bone_name(source))
        } else {
            Cow::Borrowed(source)
        };

        let Some(bone_index) = cache.lookup(&*skeleton, &bone) else {
            log::trace!("Skipping track {}: no bone {bone:?}", track.path);
            continue;
        };
        let Some(base) = skeleton.bone_local_transform(bone_index) else {
            continue;
        };

        let pose = blend_bone(config.apply_mode, &base, &sample, weight);
        skeleton.set_bone_local_transform(bone_index, pose);
        written += 1;
    }

    written
}
