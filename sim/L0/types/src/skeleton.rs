//! Skeleton and pose collaborator interfaces.
//!
//! The solver never walks a host engine's skeleton directly. It sees bones
//! through [`Skeleton`] (hierarchy plus bind pose) and [`Pose`] (this frame's
//! component-space transforms). [`SkeletonData`] and [`PoseData`] are plain
//! in-memory implementations.

use std::fmt;

use crate::BoneTransform;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Index of a bone in a skeleton.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BoneIndex(pub usize);

impl BoneIndex {
    /// Create a new bone index.
    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// The raw index.
    #[must_use]
    pub const fn raw(self) -> usize {
        self.0
    }
}

impl fmt::Display for BoneIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Bone({})", self.0)
    }
}

impl From<usize> for BoneIndex {
    fn from(index: usize) -> Self {
        Self(index)
    }
}

/// Bone hierarchy and bind pose.
///
/// Parents always precede their children in index order.
pub trait Skeleton {
    /// Number of bones.
    fn bone_count(&self) -> usize;

    /// Name of a bone, if it exists.
    fn bone_name(&self, bone: BoneIndex) -> Option<&str>;

    /// Look up a bone by name.
    fn find_bone(&self, name: &str) -> Option<BoneIndex>;

    /// Parent of a bone, `None` for roots.
    fn parent(&self, bone: BoneIndex) -> Option<BoneIndex>;

    /// Bind-pose transform in component (reference) space.
    fn reference_transform(&self, bone: BoneIndex) -> Option<BoneTransform>;

    /// Direct children of `bone`, in index order.
    fn children(&self, bone: BoneIndex) -> Vec<BoneIndex> {
        (bone.raw() + 1..self.bone_count())
            .map(BoneIndex)
            .filter(|&child| self.parent(child) == Some(bone))
            .collect()
    }
}

/// This frame's component-space bone transforms.
pub trait Pose {
    /// Component-space transform of `bone`, or `None` when the bone is not
    /// evaluated this frame (for example, removed by LOD).
    fn component_transform(&self, bone: BoneIndex) -> Option<BoneTransform>;
}

/// One bone of a [`SkeletonData`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BoneData {
    /// Bone name.
    pub name: String,
    /// Parent bone.
    pub parent: Option<BoneIndex>,
    /// Bind pose in component space.
    pub reference: BoneTransform,
}

/// In-memory skeleton.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SkeletonData {
    bones: Vec<BoneData>,
}

impl SkeletonData {
    /// Create an empty skeleton.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a bone and return its index.
    ///
    /// `parent` must refer to an already added bone.
    pub fn add_bone(
        &mut self,
        name: impl Into<String>,
        parent: Option<BoneIndex>,
        reference: BoneTransform,
    ) -> BoneIndex {
        debug_assert!(parent.map_or(true, |p| p.raw() < self.bones.len()));
        self.bones.push(BoneData {
            name: name.into(),
            parent,
            reference,
        });
        BoneIndex(self.bones.len() - 1)
    }

    /// All bones.
    #[must_use]
    pub fn bones(&self) -> &[BoneData] {
        &self.bones
    }

    /// The bind pose as a [`PoseData`].
    #[must_use]
    pub fn reference_pose(&self) -> PoseData {
        PoseData {
            transforms: self.bones.iter().map(|b| Some(b.reference)).collect(),
        }
    }
}

impl Skeleton for SkeletonData {
    fn bone_count(&self) -> usize {
        self.bones.len()
    }

    fn bone_name(&self, bone: BoneIndex) -> Option<&str> {
        self.bones.get(bone.raw()).map(|b| b.name.as_str())
    }

    fn find_bone(&self, name: &str) -> Option<BoneIndex> {
        self.bones.iter().position(|b| b.name == name).map(BoneIndex)
    }

    fn parent(&self, bone: BoneIndex) -> Option<BoneIndex> {
        self.bones.get(bone.raw()).and_then(|b| b.parent)
    }

    fn reference_transform(&self, bone: BoneIndex) -> Option<BoneTransform> {
        self.bones.get(bone.raw()).map(|b| b.reference)
    }
}

/// In-memory pose: one optional transform per bone.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PoseData {
    /// Component-space transforms, `None` for bones not evaluated.
    pub transforms: Vec<Option<BoneTransform>>,
}

impl PoseData {
    /// Overwrite one bone's transform.
    pub fn set(&mut self, bone: BoneIndex, transform: BoneTransform) {
        if let Some(slot) = self.transforms.get_mut(bone.raw()) {
            *slot = Some(transform);
        }
    }

    /// Mark a bone as not evaluated this frame.
    pub fn clear(&mut self, bone: BoneIndex) {
        if let Some(slot) = self.transforms.get_mut(bone.raw()) {
            *slot = None;
        }
    }
}

impl Pose for PoseData {
    fn component_transform(&self, bone: BoneIndex) -> Option<BoneTransform> {
        self.transforms.get(bone.raw()).copied().flatten()
    }
}
