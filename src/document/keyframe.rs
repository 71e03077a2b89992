//! Document keyframe types.
//!
//! Document keyframes reuse the motion interpolation encoding and
//! additionally carry previous/next sibling indices within their
//! name-partitioned chain, recomputed at load time so scrubbing can hop
//! neighbors in O(1).

use glam::{Quat, Vec3};

use crate::motion::{BoneInterpolation, CameraInterpolation, KeyframeBase};

/// Sibling indices inside one keyframe chain; -1 terminates the chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyframeLinks {
    pub previous: i32,
    pub next: i32,
}

impl Default for KeyframeLinks {
    fn default() -> Self {
        Self {
            previous: -1,
            next: -1,
        }
    }
}

/// Camera keyframe with document sibling linkage.
#[derive(Clone, Debug)]
pub struct DocumentCameraKeyframe {
    pub base: KeyframeBase,
    pub links: KeyframeLinks,
    pub lookat: Vec3,
    pub angle: Vec3,
    pub distance: f32,
    pub fov: i32,
    pub is_perspective_view: bool,
    pub interpolation: CameraInterpolation,
}

impl DocumentCameraKeyframe {
    pub fn new(frame_index: u32) -> Self {
        Self {
            base: KeyframeBase::at_frame(frame_index),
            links: KeyframeLinks::default(),
            lookat: Vec3::ZERO,
            angle: Vec3::ZERO,
            distance: 45.0,
            fov: 30,
            is_perspective_view: true,
            interpolation: CameraInterpolation::default(),
        }
    }
}

/// Light keyframe with document sibling linkage.
#[derive(Clone, Debug)]
pub struct DocumentLightKeyframe {
    pub base: KeyframeBase,
    pub links: KeyframeLinks,
    pub color: Vec3,
    pub direction: Vec3,
}

impl DocumentLightKeyframe {
    pub fn new(frame_index: u32) -> Self {
        Self {
            base: KeyframeBase::at_frame(frame_index),
            links: KeyframeLinks::default(),
            color: Vec3::splat(0.6),
            direction: Vec3::new(-0.5, -1.0, 0.5),
        }
    }
}

/// Gravity keyframe (physics direction/strength over time).
#[derive(Clone, Debug)]
pub struct DocumentGravityKeyframe {
    pub base: KeyframeBase,
    pub links: KeyframeLinks,
    pub acceleration: f32,
    pub noise: i32,
    pub direction: Vec3,
    pub is_noise_enabled: bool,
}

impl DocumentGravityKeyframe {
    pub fn new(frame_index: u32) -> Self {
        Self {
            base: KeyframeBase::at_frame(frame_index),
            links: KeyframeLinks::default(),
            acceleration: 9.8,
            noise: 0,
            direction: Vec3::new(0.0, -1.0, 0.0),
            is_noise_enabled: false,
        }
    }
}

/// Self-shadow keyframe with document sibling linkage.
#[derive(Clone, Debug)]
pub struct DocumentSelfShadowKeyframe {
    pub base: KeyframeBase,
    pub links: KeyframeLinks,
    pub mode: i32,
    pub distance: f32,
}

impl DocumentSelfShadowKeyframe {
    pub fn new(frame_index: u32) -> Self {
        Self {
            base: KeyframeBase::at_frame(frame_index),
            links: KeyframeLinks::default(),
            mode: 1,
            distance: 8875.0,
        }
    }
}

/// Accessory keyframe with document sibling linkage.
#[derive(Clone, Debug)]
pub struct DocumentAccessoryKeyframe {
    pub base: KeyframeBase,
    pub links: KeyframeLinks,
    pub translation: Vec3,
    pub orientation: Vec3,
    pub scale_factor: f32,
    pub opacity: f32,
    pub visible: bool,
    /// Index of the parent model in the document, -1 for none
    pub parent_model_index: i32,
    pub parent_model_bone_name: String,
}

impl DocumentAccessoryKeyframe {
    pub fn new(frame_index: u32) -> Self {
        Self {
            base: KeyframeBase::at_frame(frame_index),
            links: KeyframeLinks::default(),
            translation: Vec3::ZERO,
            orientation: Vec3::ZERO,
            scale_factor: 1.0,
            opacity: 1.0,
            visible: true,
            parent_model_index: -1,
            parent_model_bone_name: String::new(),
        }
    }
}

/// Bone keyframe of one document model; the bone is addressed by its
/// registry ID.
#[derive(Clone, Debug)]
pub struct DocumentModelBoneKeyframe {
    pub base: KeyframeBase,
    pub links: KeyframeLinks,
    pub bone_id: u32,
    pub translation: Vec3,
    pub orientation: Quat,
    pub interpolation: BoneInterpolation,
}

impl DocumentModelBoneKeyframe {
    pub fn new(bone_id: u32, frame_index: u32) -> Self {
        Self {
            base: KeyframeBase::at_frame(frame_index),
            links: KeyframeLinks::default(),
            bone_id,
            translation: Vec3::ZERO,
            orientation: Quat::IDENTITY,
            interpolation: BoneInterpolation::default(),
        }
    }
}

/// Morph keyframe of one document model.
#[derive(Clone, Debug)]
pub struct DocumentModelMorphKeyframe {
    pub base: KeyframeBase,
    pub links: KeyframeLinks,
    pub morph_id: u32,
    pub weight: f32,
}

impl DocumentModelMorphKeyframe {
    pub fn new(morph_id: u32, frame_index: u32) -> Self {
        Self {
            base: KeyframeBase::at_frame(frame_index),
            links: KeyframeLinks::default(),
            morph_id,
            weight: 0.0,
        }
    }
}

/// Whole-model keyframe of one document model.
#[derive(Clone, Debug)]
pub struct DocumentModelKeyframe {
    pub base: KeyframeBase,
    pub links: KeyframeLinks,
    pub visible: bool,
    /// (bone registry ID, enabled) per IK constraint
    pub constraint_states: Vec<(u32, bool)>,
}

impl DocumentModelKeyframe {
    pub fn new(frame_index: u32) -> Self {
        Self {
            base: KeyframeBase::at_frame(frame_index),
            links: KeyframeLinks::default(),
            visible: true,
            constraint_states: Vec::new(),
        }
    }
}
