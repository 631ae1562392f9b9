//! Skeleton-side collaborators of the animator
//!
//! - [`BoneTransform`]: local TRS pose of a bone
//! - [`Skeleton`] / [`SkeletonPose`]: bone storage and the contract the animator writes through
//! - [`SkeletonResolver`] / [`SkeletonRegistry`]: path-to-skeleton lookup owned by the host

pub mod registry;
pub mod skeleton;
pub mod transform;

pub use registry::{SkeletonRegistry, SkeletonResolver};
pub use skeleton::{Bone, Skeleton, SkeletonPose};
pub use transform::BoneTransform;

use slotmap::new_key_type;

new_key_type! {
    pub struct SkeletonKey;
}
