//! Per-model snapshot states stored by documents.
//!
//! A snapshot captures the current editing pose of a model independent
//! of its keyframe tracks: bone transforms, morph weights, constraint
//! enable flags, and outside-parent bindings.

use glam::{Quat, Vec3};

/// Current transform of one bone, addressed by registry ID.
#[derive(Clone, Debug)]
pub struct BoneState {
    pub bone_id: u32,
    pub translation: Vec3,
    pub orientation: Quat,
    pub is_physics_simulation_enabled: bool,
}

impl BoneState {
    pub fn new(bone_id: u32) -> Self {
        Self {
            bone_id,
            translation: Vec3::ZERO,
            orientation: Quat::IDENTITY,
            is_physics_simulation_enabled: true,
        }
    }
}

/// Current weight of one morph.
#[derive(Clone, Copy, Debug)]
pub struct MorphState {
    pub morph_id: u32,
    pub weight: f32,
}

/// Current enable flag of one IK constraint, addressed by its bone.
#[derive(Clone, Copy, Debug)]
pub struct ConstraintState {
    pub bone_id: u32,
    pub enabled: bool,
}

/// Time-ranged delegation of a bone's transform to another model's bone.
#[derive(Clone, Debug)]
pub struct OutsideParentState {
    pub begin_frame_index: u32,
    pub end_frame_index: u32,
    /// Bone whose transform is delegated, by registry ID
    pub subject_bone_id: u32,
    /// Target model in the document, -1 for the world
    pub target_model_index: i32,
    pub target_bone_name: String,
}
