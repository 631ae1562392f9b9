use rustc_hash::FxHashMap;
use slotmap::SlotMap;

use crate::errors::{AnimatorError, Result};
use crate::scene::SkeletonKey;
use crate::scene::skeleton::{Skeleton, SkeletonPose};

/// Host capability: turns a scene path into a skeleton and lends it out.
///
/// The animator depends on this to bind by path and to write poses each
/// frame; it never stores a reference to the skeleton itself, only the key.
pub trait SkeletonResolver {
    fn resolve(&self, path: &str) -> Option<SkeletonKey>;

    fn skeleton(&self, key: SkeletonKey) -> Option<&dyn SkeletonPose>;

    fn skeleton_mut(&mut self, key: SkeletonKey) -> Option<&mut dyn SkeletonPose>;
}

/// Minimal host-side skeleton store keyed by [`SkeletonKey`] with a path table.
#[derive(Debug, Default)]
pub struct SkeletonRegistry {
    skeletons: SlotMap<SkeletonKey, Skeleton>,
    paths: FxHashMap<String, SkeletonKey>,
}

impl SkeletonRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a skeleton under `path`, replacing any previous mapping of that path.
    pub fn insert(&mut self, path: &str, skeleton: Skeleton) -> SkeletonKey {
        let key = self.skeletons.insert(skeleton);
        if let Some(old) = self.paths.insert(path.to_string(), key) {
            log::debug!("SkeletonRegistry: path {path:?} remapped from {old:?} to {key:?}");
        }
        key
    }

    /// Removes a skeleton and every path pointing at it.
    pub fn remove(&mut self, key: SkeletonKey) -> Option<Skeleton> {
        self.paths.retain(|_, k| *k != key);
        self.skeletons.remove(key)
    }

    pub fn try_resolve(&self, path: &str) -> Result<SkeletonKey> {
        self.resolve(path)
            .ok_or_else(|| AnimatorError::SkeletonNotFound(path.to_string()))
    }

    #[must_use]
    pub fn get(&self, key: SkeletonKey) -> Option<&Skeleton> {
        self.skeletons.get(key)
    }

    pub fn get_mut(&mut self, key: SkeletonKey) -> Option<&mut Skeleton> {
        self.skeletons.get_mut(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.skeletons.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.skeletons.is_empty()
    }
}

impl SkeletonResolver for SkeletonRegistry {
    fn resolve(&self, path: &str) -> Option<SkeletonKey> {
        self.paths
            .get(path)
            .copied()
            .filter(|key| self.skeletons.contains_key(*key))
    }

    fn skeleton(&self, key: SkeletonKey) -> Option<&dyn SkeletonPose> {
        self.skeletons.get(key).map(|s| s as &dyn SkeletonPose)
    }

    fn skeleton_mut(&mut self, key: SkeletonKey) -> Option<&mut dyn SkeletonPose> {
        self.skeletons
            .get_mut(key)
            .map(|s| s as &mut dyn SkeletonPose)
    }
}
