//! Keyframe kinds shared by the motion and document codecs.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use glam::{Quat, Vec3, Vec4};

use super::interpolation::{BoneInterpolation, CameraInterpolation};

/// Opaque per-keyframe side data owned by the embedding application.
pub type UserData = Arc<dyn Any + Send + Sync>;

/// Fields shared by every keyframe kind.
#[derive(Clone, Default)]
pub struct KeyframeBase {
    /// Stable index within the owning collection
    pub index: u32,
    pub frame_index: u32,
    pub is_selected: bool,
    /// Free-form key/value annotations
    pub annotations: HashMap<String, String>,
    pub user_data: Option<UserData>,
}

impl KeyframeBase {
    pub fn at_frame(frame_index: u32) -> Self {
        Self {
            frame_index,
            ..Default::default()
        }
    }
}

impl fmt::Debug for KeyframeBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyframeBase")
            .field("index", &self.index)
            .field("frame_index", &self.frame_index)
            .field("is_selected", &self.is_selected)
            .field("annotations", &self.annotations)
            .field("has_user_data", &self.user_data.is_some())
            .finish()
    }
}

/// Delegation of a transform to another model's bone.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OutsideParent {
    pub model_name: String,
    pub bone_name: String,
}

/// A typed effect (shader) parameter carried by accessory and model
/// keyframes.
#[derive(Clone, Debug, PartialEq)]
pub enum EffectParameterValue {
    Bool(bool),
    Int(i32),
    Float(f32),
    Vector4(Vec4),
}

#[derive(Clone, Debug, PartialEq)]
pub struct EffectParameter {
    pub name: String,
    pub value: EffectParameterValue,
}

/// Keyframe of one named bone.
#[derive(Clone, Debug)]
pub struct BoneKeyframe {
    pub base: KeyframeBase,
    pub name: String,
    pub translation: Vec3,
    pub orientation: Quat,
    pub interpolation: BoneInterpolation,
}

impl BoneKeyframe {
    pub fn new(name: impl Into<String>, frame_index: u32) -> Self {
        Self {
            base: KeyframeBase::at_frame(frame_index),
            name: name.into(),
            translation: Vec3::ZERO,
            orientation: Quat::IDENTITY,
            interpolation: BoneInterpolation::default(),
        }
    }
}

/// Keyframe of the scene camera.
#[derive(Clone, Debug)]
pub struct CameraKeyframe {
    pub base: KeyframeBase,
    pub lookat: Vec3,
    pub angle: Vec3,
    pub distance: f32,
    pub fov: i32,
    pub is_perspective_view: bool,
    pub interpolation: CameraInterpolation,
}

impl CameraKeyframe {
    pub fn new(frame_index: u32) -> Self {
        Self {
            base: KeyframeBase::at_frame(frame_index),
            lookat: Vec3::ZERO,
            angle: Vec3::ZERO,
            distance: 0.0,
            fov: 30,
            is_perspective_view: true,
            interpolation: CameraInterpolation::default(),
        }
    }
}

/// Keyframe of the scene light.
#[derive(Clone, Debug)]
pub struct LightKeyframe {
    pub base: KeyframeBase,
    pub color: Vec3,
    pub direction: Vec3,
}

impl LightKeyframe {
    pub fn new(frame_index: u32) -> Self {
        Self {
            base: KeyframeBase::at_frame(frame_index),
            color: Vec3::ZERO,
            direction: Vec3::ZERO,
        }
    }
}

/// Self-shadow rendering mode keyframe.
#[derive(Clone, Debug)]
pub struct SelfShadowKeyframe {
    pub base: KeyframeBase,
    pub distance: f32,
    pub mode: i32,
}

impl SelfShadowKeyframe {
    pub fn new(frame_index: u32) -> Self {
        Self {
            base: KeyframeBase::at_frame(frame_index),
            distance: 0.0,
            mode: 0,
        }
    }
}

/// Keyframe of one named morph.
#[derive(Clone, Debug)]
pub struct MorphKeyframe {
    pub base: KeyframeBase,
    pub name: String,
    pub weight: f32,
}

impl MorphKeyframe {
    pub fn new(name: impl Into<String>, frame_index: u32) -> Self {
        Self {
            base: KeyframeBase::at_frame(frame_index),
            name: name.into(),
            weight: 0.0,
        }
    }
}

/// Enable state of one named IK constraint inside a model keyframe.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModelConstraintState {
    pub bone_name: String,
    pub enabled: bool,
}

/// Whole-model keyframe: visibility plus per-constraint enable states
/// and effect parameters.
#[derive(Clone, Debug)]
pub struct ModelKeyframe {
    pub base: KeyframeBase,
    pub is_visible: bool,
    pub constraint_states: Vec<ModelConstraintState>,
    pub effect_parameters: Vec<EffectParameter>,
}

impl ModelKeyframe {
    pub fn new(frame_index: u32) -> Self {
        Self {
            base: KeyframeBase::at_frame(frame_index),
            is_visible: true,
            constraint_states: Vec::new(),
            effect_parameters: Vec::new(),
        }
    }
}

/// Accessory keyframe, used by document accessory tracks.
#[derive(Clone, Debug)]
pub struct AccessoryKeyframe {
    pub base: KeyframeBase,
    pub translation: Vec3,
    pub orientation: Vec3,
    pub scale_factor: f32,
    pub opacity: f32,
    pub is_add_blending_enabled: bool,
    pub is_shadow_enabled: bool,
    pub visible: bool,
    pub outside_parent: Option<OutsideParent>,
    pub effect_parameters: Vec<EffectParameter>,
}

impl AccessoryKeyframe {
    pub fn new(frame_index: u32) -> Self {
        Self {
            base: KeyframeBase::at_frame(frame_index),
            translation: Vec3::ZERO,
            orientation: Vec3::ZERO,
            scale_factor: 1.0,
            opacity: 1.0,
            is_add_blending_enabled: false,
            is_shadow_enabled: true,
            visible: true,
            outside_parent: None,
            effect_parameters: Vec::new(),
        }
    }
}
