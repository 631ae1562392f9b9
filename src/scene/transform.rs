use glam::{Affine3A, EulerRot, Quat, Vec3};

/// Local pose of a single bone.
///
/// Stores translation, rotation and scale (TRS) separately so that blending
/// can slerp rotations and lerp the rest, the way two decomposed transforms
/// are interpolated. Convert through [`Affine3A`] when a matrix is needed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoneTransform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl BoneTransform {
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    #[must_use]
    pub fn new(translation: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self {
            translation,
            rotation,
            scale,
        }
    }

    #[must_use]
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
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

    /// Helper: builds a pose from XYZ Euler angles (radians).
    #[must_use]
    pub fn from_euler(translation: Vec3, x: f32, y: f32, z: f32) -> Self {
        Self {
            translation,
            rotation: Quat::from_euler(EulerRot::XYZ, x, y, z),
            scale: Vec3::ONE,
        }
    }

    /// Decomposes an affine matrix.
    ///
    /// Shear is lost in the decomposition.
    #[must_use]
    pub fn from_affine(mat: Affine3A) -> Self {
        let (scale, rotation, translation) = mat.to_scale_rotation_translation();
        Self {
            translation,
            rotation,
            scale,
        }
    }

    #[inline]
    #[must_use]
    pub fn to_affine(&self) -> Affine3A {
        Affine3A::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }

    /// Moves the origin by `offset` expressed in this transform's local frame
    /// (the offset is rotated and scaled by the current basis).
    #[must_use]
    pub fn translated_local(&self, offset: Vec3) -> Self {
        Self {
            translation: self.translation + self.to_affine().transform_vector3(offset),
            ..*self
        }
    }

    /// Interpolates towards `target`: lerp translation and scale, slerp rotation.
    ///
    /// `weight` is not clamped; callers pass the already-faded blend weight.
    #[must_use]
    pub fn interpolate_with(&self, target: &Self, weight: f32) -> Self {
        Self {
            translation: self.translation.lerp(target.translation, weight),
            rotation: self
                .rotation
                .normalize()
                .slerp(target.rotation.normalize(), weight),
            scale: self.scale.lerp(target.scale, weight),
        }
    }

    /// Approximate equality used by tests and change detection.
    #[must_use]
    pub fn abs_diff_eq(&self, other: &Self, max_abs_diff: f32) -> bool {
        self.translation.abs_diff_eq(other.translation, max_abs_diff)
            && self.scale.abs_diff_eq(other.scale, max_abs_diff)
            // q and -q are the same rotation
            && (self.rotation.abs_diff_eq(other.rotation, max_abs_diff)
                || self.rotation.abs_diff_eq(-other.rotation, max_abs_diff))
    }
}

impl Default for BoneTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl From<Affine3A> for BoneTransform {
    fn from(mat: Affine3A) -> Self {
        Self::from_affine(mat)
    }
}
