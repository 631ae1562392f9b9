use rustc_hash::FxHashMap;

use crate::scene::skeleton::SkeletonPose;

/// Bone-name to bone-index cache for one skeleton.
///
/// Lookups go to the cache first and fall back to
/// [`SkeletonPose::find_bone`], so a skeleton edited after the last rebuild
/// still resolves correctly (just slower). The cache remembers the
/// skeleton's layout version; [`BoneIndexCache::is_stale`] compares it.
#[derive(Debug, Clone, Default)]
pub struct BoneIndexCache {
    indices: FxHashMap<String, usize>,
    layout_version: u64,
    valid: bool,
}

impl BoneIndexCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_skeleton(skeleton: &dyn SkeletonPose) -> Self {
        let mut cache = Self::new();
        cache.rebuild(skeleton);
        cache
    }

    /// Clears and repopulates the cache from every bone of `skeleton`.
    pub fn rebuild(&mut self, skeleton: &dyn SkeletonPose) {
        self.indices.clear();
        for index in 0..skeleton.bone_count() {
            if let Some(name) = skeleton.bone_name(index) {
                self.indices.insert(name.to_string(), index);
            }
        }
        self.layout_version = skeleton.layout_version();
        self.valid = true;
        log::debug!("BoneIndexCache rebuilt: {} bones", self.indices.len());
    }

    /// Drops all entries; lookups fall through to the skeleton until rebuilt.
    pub fn invalidate(&mut self) {
        self.indices.clear();
        self.valid = false;
    }

    #[inline]
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    #[must_use]
    pub fn is_stale(&self, skeleton: &dyn SkeletonPose) -> bool {
        !self.valid || self.layout_version != skeleton.layout_version()
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Cached index only, no fallback.
    #[inline]
    #[must_use]
    pub fn get(&self, bone: &str) -> Option<usize> {
        self.indices.get(bone).copied()
    }

    /// Cached index, falling back to a direct skeleton lookup.
    ///
    /// A cached index is only trusted if the skeleton still names that slot
    /// `bone`; otherwise the direct lookup wins.
    #[must_use]
    pub fn lookup(&self, skeleton: &dyn SkeletonPose, bone: &str) -> Option<usize> {
        match self.get(bone) {
            Some(index) if skeleton.bone_name(index) == Some(bone) => Some(index),
            _ => skeleton.find_bone(bone),
        }
    }
}
