use rustc_hash::FxHashMap;

use crate::errors::{AnimatorError, Result};
use crate::scene::transform::BoneTransform;
use crate::utils::{ChangeTracker, MutGuard};

/// The skeleton contract consumed by the animator.
///
/// Implemented by [`Skeleton`]; hosts with their own bone storage implement
/// it directly. Index-based accessors return `None` / ignore writes for
/// out-of-range indices rather than panicking.
pub trait SkeletonPose {
    fn bone_count(&self) -> usize;

    fn bone_name(&self, index: usize) -> Option<&str>;

    fn find_bone(&self, name: &str) -> Option<usize>;

    fn bone_local_transform(&self, index: usize) -> Option<BoneTransform>;

    fn set_bone_local_transform(&mut self, index: usize, transform: BoneTransform);

    /// Version of the bone layout (names and order).
    ///
    /// Hosts that never change their layout can keep the default.
    fn layout_version(&self) -> u64 {
        0
    }
}

#[derive(Debug, Clone)]
pub struct Bone {
    pub name: String,
    /// Parent bone index; always smaller than this bone's own index.
    pub parent: Option<usize>,
    /// Bind / rest pose, restored by [`Skeleton::reset_pose`].
    pub rest: BoneTransform,
    /// Current local pose, written every frame by the animator.
    pub pose: BoneTransform,
}

#[derive(Debug, Clone, Default)]
pub struct Skeleton {
    pub name: String,

    // Ordered bone list, parents before children
    bones: Vec<Bone>,

    // Name lookup, rebuilt whenever the layout changes
    name_index: FxHashMap<String, usize>,

    layout: ChangeTracker,
}

impl Skeleton {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    /// Appends a bone and returns its index.
    pub fn add_bone(
        &mut self,
        name: &str,
        parent: Option<usize>,
        rest: BoneTransform,
    ) -> Result<usize> {
        self.ensure_index();
        if self.name_index.contains_key(name) {
            return Err(AnimatorError::DuplicateBone(name.to_string()));
        }
        if let Some(parent) = parent
            && parent >= self.bones.len()
        {
            return Err(AnimatorError::InvalidParent {
                bone: name.to_string(),
                parent,
            });
        }

        let index = self.bones.len();
        self.bones.push(Bone {
            name: name.to_string(),
            parent,
            rest,
            pose: rest,
        });
        self.name_index.insert(name.to_string(), index);
        self.layout.changed();
        Ok(index)
    }

    /// Builder helper used by tests and demos: a flat chain of bones at rest.
    pub fn from_bone_names<'a>(
        name: &str,
        bone_names: impl IntoIterator<Item = &'a str>,
    ) -> Result<Self> {
        let mut skeleton = Self::new(name);
        for bone in bone_names {
            skeleton.add_bone(bone, None, BoneTransform::IDENTITY)?;
        }
        Ok(skeleton)
    }

    #[inline]
    #[must_use]
    pub fn bones(&self) -> &[Bone] {
        &self.bones
    }

    #[inline]
    #[must_use]
    pub fn bone(&self, index: usize) -> Option<&Bone> {
        self.bones.get(index)
    }

    /// Structural access to the bone list.
    ///
    /// The layout version is bumped when the guard is dropped, which marks
    /// every bone-index cache built against this skeleton as stale. Name
    /// lookups scan the bone list until the next structural edit through
    /// [`Skeleton::add_bone`] or [`Skeleton::rename_bone`] rebuilds the index.
    pub fn bones_mut(&mut self) -> MutGuard<'_, Vec<Bone>> {
        self.name_index.clear();
        self.layout.guard(&mut self.bones)
    }

    /// Renames a bone in place.
    pub fn rename_bone(&mut self, index: usize, name: &str) -> Result<()> {
        self.ensure_index();
        if self.name_index.contains_key(name) {
            return Err(AnimatorError::DuplicateBone(name.to_string()));
        }
        if let Some(bone) = self.bones.get_mut(index) {
            bone.name = name.to_string();
            self.reindex();
            self.layout.changed();
        }
        Ok(())
    }

    /// Restores every bone's local pose to its rest pose.
    pub fn reset_pose(&mut self) {
        for bone in &mut self.bones {
            bone.pose = bone.rest;
        }
    }

    fn ensure_index(&mut self) {
        if self.name_index.len() != self.bones.len() {
            self.reindex();
        }
    }

    fn reindex(&mut self) {
        self.name_index.clear();
        for (i, bone) in self.bones.iter().enumerate() {
            self.name_index.insert(bone.name.clone(), i);
        }
    }
}

impl SkeletonPose for Skeleton {
    #[inline]
    fn bone_count(&self) -> usize {
        self.bones.len()
    }

    fn bone_name(&self, index: usize) -> Option<&str> {
        self.bones.get(index).map(|b| b.name.as_str())
    }

    fn find_bone(&self, name: &str) -> Option<usize> {
        if self.name_index.len() == self.bones.len() {
            return self.name_index.get(name).copied();
        }
        // Index was cleared by `bones_mut`; fall back to a scan
        self.bones.iter().position(|b| b.name == name)
    }

    fn bone_local_transform(&self, index: usize) -> Option<BoneTransform> {
        self.bones.get(index).map(|b| b.pose)
    }

    fn set_bone_local_transform(&mut self, index: usize, transform: BoneTransform) {
        if let Some(bone) = self.bones.get_mut(index) {
            bone.pose = transform;
        }
    }

    fn layout_version(&self) -> u64 {
        self.layout.version()
    }
}
