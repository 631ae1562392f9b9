use crate::animation::values::Interpolatable;
use crate::errors::{AnimatorError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InterpolationMode {
    #[default]
    Linear,
    Step,
}

const MAX_SCAN_OFFSET: usize = 3;

/// Remembers the last keyframe interval a track was sampled in.
///
/// Playback mostly moves forward by less than a frame, so a short linear
/// scan from the previous interval beats a binary search.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyframeCursor {
    pub last_index: usize,
}

/// Validates a key time array: non-empty, matching value count, sorted.
pub(crate) fn validate_times(times: &[f32], value_count: usize) -> Result<()> {
    if times.is_empty() {
        return Err(AnimatorError::EmptyTrack);
    }
    if times.len() != value_count {
        return Err(AnimatorError::KeyCountMismatch {
            times: times.len(),
            values: value_count,
        });
    }
    if let Some(index) = times.windows(2).position(|w| w[1] < w[0]) {
        return Err(AnimatorError::UnsortedKeyTimes { index: index + 1 });
    }
    Ok(())
}

/// Finds the index `i` with `times[i] <= time < times[i + 1]`, clamped to
/// `[0, len - 1]`, updating `cursor` on the way.
///
/// `times` must be non-empty.
pub(crate) fn locate_frame(times: &[f32], time: f32, cursor: &mut KeyframeCursor) -> usize {
    let len = times.len();
    if len <= 1 {
        return 0;
    }

    // Cursor can be out of range if the track was swapped under it
    let i = cursor.last_index.min(len - 1);

    let local = if time >= times[i] {
        // Forward: check [i, i+1), [i+1, i+2), ...
        (0..=MAX_SCAN_OFFSET)
            .map(|offset| i + offset)
            .take_while(|&idx| idx < len)
            .find(|&idx| idx == len - 1 || time < times[idx + 1])
    } else {
        // Backward: time < times[i], walk left until times[idx] <= time
        (1..=MAX_SCAN_OFFSET)
            .take_while(|&offset| offset <= i)
            .map(|offset| i - offset)
            .find(|&idx| time >= times[idx])
    };

    let index = local.unwrap_or_else(|| {
        // Large jump (scrub / loop wrap): binary search
        times.partition_point(|&t| t <= time).saturating_sub(1)
    });

    cursor.last_index = index;
    index
}

/// Normalised position of `time` between key `index` and `index + 1`,
/// or `None` when `index` is the last key.
pub(crate) fn frame_factor(times: &[f32], index: usize, time: f32) -> Option<f32> {
    let t1 = *times.get(index + 1)?;
    let t0 = times[index];
    let dt = t1 - t0;
    let t = if dt > 1e-6 { (time - t0) / dt } else { 0.0 };
    Some(t.clamp(0.0, 1.0))
}

#[derive(Debug, Clone)]
pub struct KeyframeTrack<T: Interpolatable> {
    pub times: Vec<f32>,
    pub values: Vec<T>,
    pub interpolation: InterpolationMode,
}

impl<T: Interpolatable> KeyframeTrack<T> {
    /// Builds a track without validation; see [`KeyframeTrack::try_new`].
    #[must_use]
    pub fn new(times: Vec<f32>, values: Vec<T>, interpolation: InterpolationMode) -> Self {
        Self {
            times,
            values,
            interpolation,
        }
    }

    pub fn try_new(
        times: Vec<f32>,
        values: Vec<T>,
        interpolation: InterpolationMode,
    ) -> Result<Self> {
        validate_times(&times, values.len())?;
        Ok(Self::new(times, values, interpolation))
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.times.len().min(self.values.len())
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stateless sampling. Returns `None` for an empty track.
    #[must_use]
    pub fn sample(&self, time: f32) -> Option<T> {
        self.sample_with_cursor(time, &mut KeyframeCursor::default())
    }

    /// Sampling with a cursor carried between calls.
    pub fn sample_with_cursor(&self, time: f32, cursor: &mut KeyframeCursor) -> Option<T> {
        let len = self.len();
        if len == 0 {
            return None;
        }
        let times = &self.times[..len];
        let index = locate_frame(times, time, cursor);
        let v0 = &self.values[index];

        match (self.interpolation, frame_factor(times, index, time)) {
            (InterpolationMode::Linear, Some(t)) => {
                Some(T::interpolate_linear(v0, &self.values[index + 1], t))
            }
            _ => Some(*v0),
        }
    }
}
