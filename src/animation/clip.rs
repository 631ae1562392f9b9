use std::fmt;
use std::str::FromStr;

use glam::{Quat, Vec3};
use smallvec::SmallVec;

use crate::animation::tracks::{
    InterpolationMode, KeyframeCursor, KeyframeTrack, frame_factor, locate_frame, validate_times,
};
use crate::errors::{AnimatorError, Result};

// ============================================================================
// Track Paths
// ============================================================================

/// Target of a track: a node path plus optional `:`-separated sub-names.
///
/// `"Armature/Skeleton:Arm_L"` addresses bone `Arm_L` of the node
/// `Armature/Skeleton`. Only paths with exactly one sub-name target a bone.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct TrackPath {
    node: String,
    subnames: SmallVec<[String; 1]>,
}

impl TrackPath {
    #[must_use]
    pub fn node(node: &str) -> Self {
        Self {
            node: node.to_string(),
            subnames: SmallVec::new(),
        }
    }

    #[must_use]
    pub fn bone(node: &str, bone: &str) -> Self {
        let mut subnames = SmallVec::new();
        subnames.push(bone.to_string());
        Self {
            node: node.to_string(),
            subnames,
        }
    }

    pub fn parse(path: &str) -> Result<Self> {
        let mut parts = path.split(':');
        let node = parts.next().unwrap_or_default();
        let subnames: SmallVec<[String; 1]> = parts.map(str::to_string).collect();
        if subnames.iter().any(String::is_empty) {
            return Err(AnimatorError::InvalidTrackPath(path.to_string()));
        }
        Ok(Self {
            node: node.to_string(),
            subnames,
        })
    }

    #[inline]
    #[must_use]
    pub fn node_path(&self) -> &str {
        &self.node
    }

    #[inline]
    #[must_use]
    pub fn subnames(&self) -> &[String] {
        &self.subnames
    }

    /// The bone this track drives, if the path has exactly one sub-name.
    #[must_use]
    pub fn bone_name(&self) -> Option<&str> {
        match self.subnames.as_slice() {
            [bone] => Some(bone.as_str()),
            _ => None,
        }
    }
}

impl fmt::Display for TrackPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.node)?;
        for sub in &self.subnames {
            write!(f, ":{sub}")?;
        }
        Ok(())
    }
}

impl FromStr for TrackPath {
    type Err = AnimatorError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

// ============================================================================
// Transform Tracks
// ============================================================================

/// One keyed (or sampled) bone transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformKey {
    pub location: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl TransformKey {
    pub const IDENTITY: Self = Self {
        location: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    #[must_use]
    pub fn from_location(location: Vec3) -> Self {
        Self {
            location,
            ..Self::IDENTITY
        }
    }

    #[must_use]
    pub fn from_rotation(rotation: Quat) -> Self {
        Self {
            rotation,
            ..Self::IDENTITY
        }
    }

    fn interpolate(&self, other: &Self, t: f32) -> Self {
        Self {
            location: self.location.lerp(other.location, t),
            rotation: self.rotation.slerp(other.rotation, t),
            scale: self.scale.lerp(other.scale, t),
        }
    }
}

impl Default for TransformKey {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Location/rotation/scale keys sharing one time array.
#[derive(Debug, Clone)]
pub struct TransformTrack {
    pub times: Vec<f32>,
    pub keys: Vec<TransformKey>,
    pub interpolation: InterpolationMode,
}

impl TransformTrack {
    #[must_use]
    pub fn new(times: Vec<f32>, keys: Vec<TransformKey>, interpolation: InterpolationMode) -> Self {
        Self {
            times,
            keys,
            interpolation,
        }
    }

    pub fn try_new(
        times: Vec<f32>,
        keys: Vec<TransformKey>,
        interpolation: InterpolationMode,
    ) -> Result<Self> {
        validate_times(&times, keys.len())?;
        Ok(Self::new(times, keys, interpolation))
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.times.len().min(self.keys.len())
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn sample_with_cursor(
        &self,
        time: f32,
        cursor: &mut KeyframeCursor,
    ) -> Option<TransformKey> {
        let len = self.len();
        if len == 0 {
            return None;
        }
        let times = &self.times[..len];
        let index = locate_frame(times, time, cursor);
        let k0 = &self.keys[index];

        match (self.interpolation, frame_factor(times, index, time)) {
            (InterpolationMode::Linear, Some(t)) => Some(k0.interpolate(&self.keys[index + 1], t)),
            _ => Some(*k0),
        }
    }
}

// ============================================================================
// Tracks & Clips
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackType {
    Transform,
    Other,
}

#[derive(Debug, Clone)]
pub enum TrackData {
    Transform(TransformTrack),
    Scalar(KeyframeTrack<f32>),
}

/// Complete track definition: target path plus keyframe data.
#[derive(Debug, Clone)]
pub struct Track {
    pub path: TrackPath,
    pub data: TrackData,
}

impl Track {
    #[must_use]
    pub fn transform(path: TrackPath, track: TransformTrack) -> Self {
        Self {
            path,
            data: TrackData::Transform(track),
        }
    }

    #[must_use]
    pub fn scalar(path: TrackPath, track: KeyframeTrack<f32>) -> Self {
        Self {
            path,
            data: TrackData::Scalar(track),
        }
    }

    #[must_use]
    pub fn track_type(&self) -> TrackType {
        match self.data {
            TrackData::Transform(_) => TrackType::Transform,
            TrackData::Scalar(_) => TrackType::Other,
        }
    }

    #[must_use]
    pub fn times(&self) -> &[f32] {
        match &self.data {
            TrackData::Transform(t) => &t.times[..t.len()],
            TrackData::Scalar(t) => &t.times[..t.len()],
        }
    }

    #[inline]
    #[must_use]
    pub fn key_count(&self) -> usize {
        self.times().len()
    }
}

/// An immutable set of tracks with a name and a playback length.
///
/// The animator keeps clips behind `Arc`, so a caller holding the same clip
/// can only change it through copy-on-write (`Arc::make_mut`), which never
/// affects in-flight playback.
#[derive(Debug, Clone)]
pub struct AnimationClip {
    pub name: String,
    pub length: f32,
    pub tracks: Vec<Track>,
}

impl AnimationClip {
    /// Builds a clip whose length is the last key time across all tracks.
    #[must_use]
    pub fn new(name: &str, tracks: Vec<Track>) -> Self {
        let length = tracks
            .iter()
            .map(|t| t.times().last().copied().unwrap_or(0.0))
            .fold(0.0_f32, f32::max);
        Self::with_length(name, length, tracks)
    }

    #[must_use]
    pub fn with_length(name: &str, length: f32, tracks: Vec<Track>) -> Self {
        Self {
            name: name.to_string(),
            length,
            tracks,
        }
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    #[must_use]
    pub fn length(&self) -> f32 {
        self.length
    }

    #[inline]
    #[must_use]
    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    #[must_use]
    pub fn track_path(&self, track: usize) -> Option<&TrackPath> {
        self.tracks.get(track).map(|t| &t.path)
    }

    #[must_use]
    pub fn track_type(&self, track: usize) -> Option<TrackType> {
        self.tracks.get(track).map(Track::track_type)
    }

    /// Number of keys on `track`; zero for a missing track.
    #[must_use]
    pub fn key_count(&self, track: usize) -> usize {
        self.tracks.get(track).map_or(0, Track::key_count)
    }

    #[must_use]
    pub fn key_time(&self, track: usize, key: usize) -> Option<f32> {
        self.tracks.get(track)?.times().get(key).copied()
    }

    /// Keyed transform value; `None` for non-transform tracks.
    #[must_use]
    pub fn key_value(&self, track: usize, key: usize) -> Option<TransformKey> {
        match &self.tracks.get(track)?.data {
            TrackData::Transform(t) => t.keys[..t.len()].get(key).copied(),
            TrackData::Scalar(_) => None,
        }
    }

    /// Index of the first track driving bone `bone`.
    #[must_use]
    pub fn find_bone_track(&self, bone: &str) -> Option<usize> {
        self.tracks
            .iter()
            .position(|t| t.path.bone_name() == Some(bone))
    }

    pub fn sample(&self, track: usize, time: f32) -> Result<TransformKey> {
        self.sample_with_cursor(track, time, &mut KeyframeCursor::default())
    }

    pub fn sample_with_cursor(
        &self,
        track: usize,
        time: f32,
        cursor: &mut KeyframeCursor,
    ) -> Result<TransformKey> {
        let entry = self
            .tracks
            .get(track)
            .ok_or(AnimatorError::TrackIndexOutOfBounds {
                track,
                count: self.tracks.len(),
            })?;

        match &entry.data {
            TrackData::Transform(t) => t
                .sample_with_cursor(time, cursor)
                .ok_or(AnimatorError::EmptyTrack),
            TrackData::Scalar(_) => Err(AnimatorError::NotTransformTrack { track }),
        }
    }

    /// Owned copy; edits to it never reach the source clip.
    #[must_use]
    pub fn duplicate(&self) -> Self {
        self.clone()
    }
}
