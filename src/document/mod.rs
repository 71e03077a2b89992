//! Document codec: composite scene files.
//!
//! A document embeds model references plus motion-style keyframe tracks
//! for the scene camera, light, gravity and self-shadow, per-model
//! keyframe tracks and snapshot states, and outside-parent bindings.
//! Model payloads are never read from disk here: resolution goes through
//! the injected [`ModelResolver`], so filesystem access stays with the
//! caller.

pub(crate) mod keyframe;
pub(crate) mod model_state;
pub(crate) mod writer;

pub use keyframe::{
    DocumentAccessoryKeyframe, DocumentCameraKeyframe, DocumentGravityKeyframe,
    DocumentLightKeyframe, DocumentModelBoneKeyframe, DocumentModelKeyframe,
    DocumentModelMorphKeyframe, DocumentSelfShadowKeyframe, KeyframeLinks,
};
pub use model_state::{BoneState, ConstraintState, MorphState, OutsideParentState};

use glam::{Quat, Vec3};
use tracing::debug;

use crate::model::Model;
use crate::motion::{BoneInterpolation, CameraInterpolation, Curve, NamedTrackSet, Track};
use crate::util::{Buffer, CodecKind, Result, Status, StringCodec};

/// Current-format signature.
pub const DOCUMENT_SIGNATURE: &[u8] = b"Polygon Movie maker 0002";
/// Legacy signature; legacy documents embed model payloads inline.
pub const DOCUMENT_SIGNATURE_LEGACY: &[u8] = b"Polygon Movie maker 0001";
const SIGNATURE_WIDTH: usize = 30;

/// Document sub-version.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DocumentFormatType {
    /// Models referenced by relative path
    Current,
    /// Models embedded inline
    Legacy,
}

/// Supplies models for the paths (or inline payloads) a document embeds.
///
/// The document codec itself never touches a filesystem; the resolver
/// owns that concern.
pub trait ModelResolver {
    /// Resolve a model from the relative path stored in the document.
    fn resolve(&mut self, path: &str, codec: &dyn StringCodec) -> Result<Model>;

    /// Resolve a model from an inline payload (legacy documents).
    fn resolve_payload(&mut self, payload: &[u8], codec: &dyn StringCodec) -> Result<Model> {
        let mut buffer = Buffer::new(payload.to_vec());
        Model::load(&mut buffer, codec).map_err(|_| Status::DocumentModelResolutionFailed)
    }
}

/// Keyframes that carry document sibling linkage.
pub(crate) trait LinkedKeyframe {
    fn links_mut(&mut self) -> &mut KeyframeLinks;
}

macro_rules! impl_linked_keyframe {
    ($($ty:ty),* $(,)?) => {
        $(impl LinkedKeyframe for $ty {
            fn links_mut(&mut self) -> &mut KeyframeLinks {
                &mut self.links
            }
        })*
    };
}

impl_linked_keyframe!(
    DocumentCameraKeyframe,
    DocumentLightKeyframe,
    DocumentGravityKeyframe,
    DocumentSelfShadowKeyframe,
    DocumentAccessoryKeyframe,
    DocumentModelBoneKeyframe,
    DocumentModelMorphKeyframe,
    DocumentModelKeyframe,
);

/// Recompute sibling linkage for one frame-ordered chain.
pub(crate) fn relink<T: LinkedKeyframe>(keyframes: &mut [T], track: &Track) {
    let ordered: Vec<usize> = track.positions().collect();
    for (chain_position, &keyframe_position) in ordered.iter().enumerate() {
        let previous = if chain_position > 0 {
            ordered[chain_position - 1] as i32
        } else {
            -1
        };
        let next = if chain_position + 1 < ordered.len() {
            ordered[chain_position + 1] as i32
        } else {
            -1
        };
        *keyframes[keyframe_position].links_mut() = KeyframeLinks { previous, next };
    }
}

/// Scene camera: current state plus its keyframe track.
#[derive(Clone, Debug)]
pub struct DocumentCamera {
    pub lookat: Vec3,
    pub angle: Vec3,
    pub distance: f32,
    pub fov: i32,
    pub is_perspective_view: bool,
    pub(crate) keyframes: Vec<DocumentCameraKeyframe>,
    pub(crate) track: Track,
}

impl Default for DocumentCamera {
    fn default() -> Self {
        Self {
            lookat: Vec3::ZERO,
            angle: Vec3::ZERO,
            distance: 45.0,
            fov: 30,
            is_perspective_view: true,
            keyframes: Vec::new(),
            track: Track::default(),
        }
    }
}

impl DocumentCamera {
    pub fn keyframes(&self) -> &[DocumentCameraKeyframe] {
        &self.keyframes
    }

    pub fn find_keyframe(&self, frame_index: u32) -> Option<&DocumentCameraKeyframe> {
        self.track
            .find(frame_index)
            .map(|position| &self.keyframes[position])
    }
}

/// Scene light: current state plus its keyframe track.
#[derive(Clone, Debug)]
pub struct DocumentLight {
    pub color: Vec3,
    pub direction: Vec3,
    pub(crate) keyframes: Vec<DocumentLightKeyframe>,
    pub(crate) track: Track,
}

impl Default for DocumentLight {
    fn default() -> Self {
        Self {
            color: Vec3::splat(0.6),
            direction: Vec3::new(-0.5, -1.0, 0.5),
            keyframes: Vec::new(),
            track: Track::default(),
        }
    }
}

impl DocumentLight {
    pub fn keyframes(&self) -> &[DocumentLightKeyframe] {
        &self.keyframes
    }
}

/// Physics gravity: current state plus its keyframe track.
#[derive(Clone, Debug)]
pub struct DocumentGravity {
    pub acceleration: f32,
    pub noise: i32,
    pub direction: Vec3,
    pub is_noise_enabled: bool,
    pub(crate) keyframes: Vec<DocumentGravityKeyframe>,
    pub(crate) track: Track,
}

impl Default for DocumentGravity {
    fn default() -> Self {
        Self {
            acceleration: 9.8,
            noise: 0,
            direction: Vec3::new(0.0, -1.0, 0.0),
            is_noise_enabled: false,
            keyframes: Vec::new(),
            track: Track::default(),
        }
    }
}

impl DocumentGravity {
    pub fn keyframes(&self) -> &[DocumentGravityKeyframe] {
        &self.keyframes
    }
}

/// Self-shadow settings: current state plus its keyframe track.
#[derive(Clone, Debug)]
pub struct DocumentSelfShadow {
    pub mode: i32,
    pub distance: f32,
    pub(crate) keyframes: Vec<DocumentSelfShadowKeyframe>,
    pub(crate) track: Track,
}

impl Default for DocumentSelfShadow {
    fn default() -> Self {
        Self {
            mode: 1,
            distance: 8875.0,
            keyframes: Vec::new(),
            track: Track::default(),
        }
    }
}

impl DocumentSelfShadow {
    pub fn keyframes(&self) -> &[DocumentSelfShadowKeyframe] {
        &self.keyframes
    }
}

/// An accessory placed in the scene, with its own keyframe track.
#[derive(Clone, Debug)]
pub struct DocumentAccessory {
    pub name: String,
    pub path: String,
    pub translation: Vec3,
    pub orientation: Vec3,
    pub scale_factor: f32,
    pub opacity: f32,
    pub is_add_blending_enabled: bool,
    pub is_shadow_enabled: bool,
    pub visible: bool,
    pub parent_model_index: i32,
    pub parent_model_bone_name: String,
    pub(crate) keyframes: Vec<DocumentAccessoryKeyframe>,
    pub(crate) track: Track,
}

impl DocumentAccessory {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: String::new(),
            translation: Vec3::ZERO,
            orientation: Vec3::ZERO,
            scale_factor: 1.0,
            opacity: 1.0,
            is_add_blending_enabled: false,
            is_shadow_enabled: true,
            visible: true,
            parent_model_index: -1,
            parent_model_bone_name: String::new(),
            keyframes: Vec::new(),
            track: Track::default(),
        }
    }

    pub fn keyframes(&self) -> &[DocumentAccessoryKeyframe] {
        &self.keyframes
    }
}

/// A model participating in the scene: the resolved model graph, the
/// bone/morph name registries, keyframe tracks and snapshot states.
#[derive(Debug)]
pub struct DocumentModel {
    pub name: String,
    pub path: String,
    pub model: Model,
    /// Registry assigning stable IDs to bone names; keyframe and state
    /// records address bones by position in this list
    pub bone_names: Vec<String>,
    pub morph_names: Vec<String>,
    pub(crate) bone_keyframes: Vec<DocumentModelBoneKeyframe>,
    pub(crate) bone_tracks: NamedTrackSet,
    pub(crate) morph_keyframes: Vec<DocumentModelMorphKeyframe>,
    pub(crate) morph_tracks: NamedTrackSet,
    pub(crate) model_keyframes: Vec<DocumentModelKeyframe>,
    pub(crate) model_track: Track,
    pub bone_states: Vec<BoneState>,
    pub morph_states: Vec<MorphState>,
    pub constraint_states: Vec<ConstraintState>,
    pub outside_parent_states: Vec<OutsideParentState>,
}

impl DocumentModel {
    pub fn new(name: impl Into<String>, model: Model) -> Self {
        Self {
            name: name.into(),
            path: String::new(),
            model,
            bone_names: Vec::new(),
            morph_names: Vec::new(),
            bone_keyframes: Vec::new(),
            bone_tracks: NamedTrackSet::default(),
            morph_keyframes: Vec::new(),
            morph_tracks: NamedTrackSet::default(),
            model_keyframes: Vec::new(),
            model_track: Track::default(),
            bone_states: Vec::new(),
            morph_states: Vec::new(),
            constraint_states: Vec::new(),
            outside_parent_states: Vec::new(),
        }
    }

    pub fn bone_keyframes(&self) -> &[DocumentModelBoneKeyframe] {
        &self.bone_keyframes
    }

    pub fn morph_keyframes(&self) -> &[DocumentModelMorphKeyframe] {
        &self.morph_keyframes
    }

    pub fn model_keyframes(&self) -> &[DocumentModelKeyframe] {
        &self.model_keyframes
    }

    /// Registry ID of a bone name, if registered.
    pub fn bone_id(&self, name: &str) -> Option<u32> {
        self.bone_names
            .iter()
            .position(|candidate| candidate == name)
            .map(|position| position as u32)
    }

    pub fn morph_id(&self, name: &str) -> Option<u32> {
        self.morph_names
            .iter()
            .position(|candidate| candidate == name)
            .map(|position| position as u32)
    }

    pub fn find_bone_keyframe(
        &self,
        name: &str,
        frame_index: u32,
    ) -> Option<&DocumentModelBoneKeyframe> {
        self.bone_tracks
            .find(name, frame_index)
            .map(|position| &self.bone_keyframes[position])
    }

    pub fn find_morph_keyframe(
        &self,
        name: &str,
        frame_index: u32,
    ) -> Option<&DocumentModelMorphKeyframe> {
        self.morph_tracks
            .find(name, frame_index)
            .map(|position| &self.morph_keyframes[position])
    }
}

/// An immutable scene document.
#[derive(Debug, Default)]
pub struct Document {
    pub(crate) format_type: Option<DocumentFormatType>,
    pub output_width: u32,
    pub output_height: u32,
    pub timeline_fps: f32,
    pub current_frame_index: u32,
    pub is_loop_enabled: bool,
    pub is_grid_and_axis_shown: bool,
    pub is_information_shown: bool,
    pub is_ground_shadow_shown: bool,
    pub playback_range_begin: u32,
    pub playback_range_end: u32,
    pub(crate) camera: DocumentCamera,
    pub(crate) light: DocumentLight,
    pub(crate) gravity: DocumentGravity,
    pub(crate) self_shadow: DocumentSelfShadow,
    pub(crate) accessories: Vec<DocumentAccessory>,
    pub(crate) models: Vec<DocumentModel>,
}

impl Document {
    /// Parse a document buffer, resolving embedded model references
    /// through `resolver`.
    pub fn load(
        buffer: &mut Buffer,
        codec: &dyn StringCodec,
        resolver: &mut dyn ModelResolver,
    ) -> Result<Self> {
        let signature = buffer.read_bytes(SIGNATURE_WIDTH)?;
        let format_type = if signature.starts_with(DOCUMENT_SIGNATURE) {
            DocumentFormatType::Current
        } else if signature.starts_with(DOCUMENT_SIGNATURE_LEGACY) {
            DocumentFormatType::Legacy
        } else {
            return Err(Status::DocumentFormatInvalid);
        };
        let mut document = Document {
            format_type: Some(format_type),
            ..Default::default()
        };
        document.parse_settings(buffer)?;
        document.parse_camera(buffer)?;
        document.parse_light(buffer)?;
        document.parse_gravity(buffer)?;
        document.parse_self_shadow(buffer)?;
        document.parse_accessories(buffer, codec)?;
        document.parse_models(buffer, codec, resolver)?;
        if !buffer.is_end() {
            return Err(Status::BufferNotEnd);
        }
        debug!(
            models = document.models.len(),
            accessories = document.accessories.len(),
            "loaded document"
        );
        Ok(document)
    }

    fn parse_settings(&mut self, buffer: &mut Buffer) -> Result<()> {
        self.output_width = buffer.read_u32()?;
        self.output_height = buffer.read_u32()?;
        self.timeline_fps = buffer.read_f32()?;
        self.current_frame_index = buffer.read_u32()?;
        let flags = buffer.read_u8()?;
        self.is_loop_enabled = flags & 0x01 != 0;
        self.is_grid_and_axis_shown = flags & 0x02 != 0;
        self.is_information_shown = flags & 0x04 != 0;
        self.is_ground_shadow_shown = flags & 0x08 != 0;
        self.playback_range_begin = buffer.read_u32()?;
        self.playback_range_end = buffer.read_u32()?;
        if self.playback_range_begin > self.playback_range_end {
            return Err(Status::DocumentSettingsCorrupted);
        }
        Ok(())
    }

    fn parse_camera(&mut self, buffer: &mut Buffer) -> Result<()> {
        self.camera.lookat = buffer.read_f32x3()?;
        self.camera.angle = buffer.read_f32x3()?;
        self.camera.distance = buffer.read_f32()?;
        self.camera.fov = buffer.read_i32()?;
        self.camera.is_perspective_view = buffer.read_u8()? != 0;
        let count = buffer.read_len()?;
        for position in 0..count {
            let mut keyframe = DocumentCameraKeyframe::new(buffer.read_u32()?);
            keyframe.base.index = position as u32;
            keyframe.lookat = buffer.read_f32x3()?;
            keyframe.angle = buffer.read_f32x3()?;
            keyframe.distance = buffer.read_f32()?;
            keyframe.fov = buffer.read_i32()?;
            keyframe.is_perspective_view = buffer.read_u8()? != 0;
            keyframe.interpolation = CameraInterpolation::read_vmd(buffer)?;
            keyframe.base.is_selected = buffer.read_u8()? != 0;
            if !self.camera.track.insert(keyframe.base.frame_index, position) {
                return Err(Status::DocumentCameraCorrupted);
            }
            self.camera.keyframes.push(keyframe);
        }
        relink(&mut self.camera.keyframes, &self.camera.track);
        Ok(())
    }

    fn parse_light(&mut self, buffer: &mut Buffer) -> Result<()> {
        self.light.color = buffer.read_f32x3()?;
        self.light.direction = buffer.read_f32x3()?;
        let count = buffer.read_len()?;
        for position in 0..count {
            let mut keyframe = DocumentLightKeyframe::new(buffer.read_u32()?);
            keyframe.base.index = position as u32;
            keyframe.color = buffer.read_f32x3()?;
            keyframe.direction = buffer.read_f32x3()?;
            keyframe.base.is_selected = buffer.read_u8()? != 0;
            if !self.light.track.insert(keyframe.base.frame_index, position) {
                return Err(Status::DocumentLightCorrupted);
            }
            self.light.keyframes.push(keyframe);
        }
        relink(&mut self.light.keyframes, &self.light.track);
        Ok(())
    }

    fn parse_gravity(&mut self, buffer: &mut Buffer) -> Result<()> {
        self.gravity.acceleration = buffer.read_f32()?;
        self.gravity.noise = buffer.read_i32()?;
        self.gravity.direction = buffer.read_f32x3()?;
        self.gravity.is_noise_enabled = buffer.read_u8()? != 0;
        let count = buffer.read_len()?;
        for position in 0..count {
            let mut keyframe = DocumentGravityKeyframe::new(buffer.read_u32()?);
            keyframe.base.index = position as u32;
            keyframe.acceleration = buffer.read_f32()?;
            keyframe.noise = buffer.read_i32()?;
            keyframe.direction = buffer.read_f32x3()?;
            keyframe.is_noise_enabled = buffer.read_u8()? != 0;
            keyframe.base.is_selected = buffer.read_u8()? != 0;
            if !self.gravity.track.insert(keyframe.base.frame_index, position) {
                return Err(Status::DocumentGravityCorrupted);
            }
            self.gravity.keyframes.push(keyframe);
        }
        relink(&mut self.gravity.keyframes, &self.gravity.track);
        Ok(())
    }

    fn parse_self_shadow(&mut self, buffer: &mut Buffer) -> Result<()> {
        self.self_shadow.mode = buffer.read_u8()? as i32;
        self.self_shadow.distance = buffer.read_f32()?;
        let count = buffer.read_len()?;
        for position in 0..count {
            let mut keyframe = DocumentSelfShadowKeyframe::new(buffer.read_u32()?);
            keyframe.base.index = position as u32;
            keyframe.mode = buffer.read_u8()? as i32;
            keyframe.distance = buffer.read_f32()?;
            keyframe.base.is_selected = buffer.read_u8()? != 0;
            if !self
                .self_shadow
                .track
                .insert(keyframe.base.frame_index, position)
            {
                return Err(Status::DocumentSelfShadowCorrupted);
            }
            self.self_shadow.keyframes.push(keyframe);
        }
        relink(&mut self.self_shadow.keyframes, &self.self_shadow.track);
        Ok(())
    }

    fn read_string(buffer: &mut Buffer, codec: &dyn StringCodec) -> Result<String> {
        let length = buffer.read_len()?;
        let bytes = buffer.read_bytes(length)?;
        codec.decode(&bytes, CodecKind::Sjis)
    }

    fn parse_accessories(&mut self, buffer: &mut Buffer, codec: &dyn StringCodec) -> Result<()> {
        let count = buffer.read_len()?;
        for _ in 0..count {
            let mut accessory = DocumentAccessory::new(Self::read_string(buffer, codec)?);
            accessory.path = Self::read_string(buffer, codec)?;
            accessory.translation = buffer.read_f32x3()?;
            accessory.orientation = buffer.read_f32x3()?;
            accessory.scale_factor = buffer.read_f32()?;
            accessory.opacity = buffer.read_f32()?;
            accessory.is_add_blending_enabled = buffer.read_u8()? != 0;
            accessory.is_shadow_enabled = buffer.read_u8()? != 0;
            accessory.visible = buffer.read_u8()? != 0;
            accessory.parent_model_index = buffer.read_i32()?;
            accessory.parent_model_bone_name = Self::read_string(buffer, codec)?;
            let num_keyframes = buffer.read_len()?;
            for position in 0..num_keyframes {
                let mut keyframe = DocumentAccessoryKeyframe::new(buffer.read_u32()?);
                keyframe.base.index = position as u32;
                keyframe.translation = buffer.read_f32x3()?;
                keyframe.orientation = buffer.read_f32x3()?;
                keyframe.scale_factor = buffer.read_f32()?;
                keyframe.opacity = buffer.read_f32()?;
                keyframe.visible = buffer.read_u8()? != 0;
                keyframe.parent_model_index = buffer.read_i32()?;
                keyframe.parent_model_bone_name = Self::read_string(buffer, codec)?;
                keyframe.base.is_selected = buffer.read_u8()? != 0;
                if !accessory.track.insert(keyframe.base.frame_index, position) {
                    return Err(Status::DocumentAccessoryCorrupted);
                }
                accessory.keyframes.push(keyframe);
            }
            relink(&mut accessory.keyframes, &accessory.track);
            self.accessories.push(accessory);
        }
        Ok(())
    }

    fn parse_models(
        &mut self,
        buffer: &mut Buffer,
        codec: &dyn StringCodec,
        resolver: &mut dyn ModelResolver,
    ) -> Result<()> {
        let count = buffer.read_len()?;
        for _ in 0..count {
            let name = Self::read_string(buffer, codec)?;
            let path = Self::read_string(buffer, codec)?;
            let model = if self.format_type == Some(DocumentFormatType::Legacy) {
                let payload_length = buffer.read_len()?;
                let payload = buffer.read_bytes(payload_length)?;
                resolver.resolve_payload(&payload, codec)?
            } else {
                resolver.resolve(&path, codec)?
            };
            let mut document_model = DocumentModel::new(name, model);
            document_model.path = path;

            let num_bone_names = buffer.read_len()?;
            for _ in 0..num_bone_names {
                document_model
                    .bone_names
                    .push(Self::read_string(buffer, codec)?);
            }
            let num_morph_names = buffer.read_len()?;
            for _ in 0..num_morph_names {
                document_model
                    .morph_names
                    .push(Self::read_string(buffer, codec)?);
            }

            let num_bone_keyframes = buffer.read_len()?;
            for position in 0..num_bone_keyframes {
                let bone_id = buffer.read_u32()?;
                let name = document_model
                    .bone_names
                    .get(bone_id as usize)
                    .cloned()
                    .ok_or(Status::DocumentModelCorrupted)?;
                let mut keyframe =
                    DocumentModelBoneKeyframe::new(bone_id, buffer.read_u32()?);
                keyframe.base.index = position as u32;
                keyframe.translation = buffer.read_f32x3()?;
                let orientation = buffer.read_f32x4()?;
                keyframe.orientation =
                    Quat::from_xyzw(orientation.x, orientation.y, orientation.z, orientation.w);
                let mut curves = [Curve::default(); 4];
                for curve in &mut curves {
                    let bytes = buffer.read_bytes(4)?;
                    *curve = Curve::from_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
                }
                keyframe.interpolation = BoneInterpolation {
                    translation_x: curves[0],
                    translation_y: curves[1],
                    translation_z: curves[2],
                    orientation: curves[3],
                };
                keyframe.base.is_selected = buffer.read_u8()? != 0;
                if !document_model
                    .bone_tracks
                    .insert(&name, keyframe.base.frame_index, position)
                {
                    return Err(Status::DocumentModelCorrupted);
                }
                document_model.bone_keyframes.push(keyframe);
            }

            let num_morph_keyframes = buffer.read_len()?;
            for position in 0..num_morph_keyframes {
                let morph_id = buffer.read_u32()?;
                let name = document_model
                    .morph_names
                    .get(morph_id as usize)
                    .cloned()
                    .ok_or(Status::DocumentModelCorrupted)?;
                let mut keyframe =
                    DocumentModelMorphKeyframe::new(morph_id, buffer.read_u32()?);
                keyframe.base.index = position as u32;
                keyframe.weight = buffer.read_f32()?;
                keyframe.base.is_selected = buffer.read_u8()? != 0;
                if !document_model
                    .morph_tracks
                    .insert(&name, keyframe.base.frame_index, position)
                {
                    return Err(Status::DocumentModelCorrupted);
                }
                document_model.morph_keyframes.push(keyframe);
            }

            let num_model_keyframes = buffer.read_len()?;
            for position in 0..num_model_keyframes {
                let mut keyframe = DocumentModelKeyframe::new(buffer.read_u32()?);
                keyframe.base.index = position as u32;
                keyframe.visible = buffer.read_u8()? != 0;
                let num_states = buffer.read_len()?;
                for _ in 0..num_states {
                    let bone_id = buffer.read_u32()?;
                    if bone_id as usize >= document_model.bone_names.len() {
                        return Err(Status::DocumentModelCorrupted);
                    }
                    keyframe
                        .constraint_states
                        .push((bone_id, buffer.read_u8()? != 0));
                }
                keyframe.base.is_selected = buffer.read_u8()? != 0;
                if !document_model
                    .model_track
                    .insert(keyframe.base.frame_index, position)
                {
                    return Err(Status::DocumentModelCorrupted);
                }
                document_model.model_keyframes.push(keyframe);
            }

            let num_bone_states = buffer.read_len()?;
            for _ in 0..num_bone_states {
                let bone_id = buffer.read_u32()?;
                if bone_id as usize >= document_model.bone_names.len() {
                    return Err(Status::DocumentModelCorrupted);
                }
                let mut state = BoneState::new(bone_id);
                state.translation = buffer.read_f32x3()?;
                let orientation = buffer.read_f32x4()?;
                state.orientation =
                    Quat::from_xyzw(orientation.x, orientation.y, orientation.z, orientation.w);
                state.is_physics_simulation_enabled = buffer.read_u8()? != 0;
                document_model.bone_states.push(state);
            }

            let num_morph_states = buffer.read_len()?;
            for _ in 0..num_morph_states {
                let morph_id = buffer.read_u32()?;
                if morph_id as usize >= document_model.morph_names.len() {
                    return Err(Status::DocumentModelCorrupted);
                }
                document_model.morph_states.push(MorphState {
                    morph_id,
                    weight: buffer.read_f32()?,
                });
            }

            let num_constraint_states = buffer.read_len()?;
            for _ in 0..num_constraint_states {
                let bone_id = buffer.read_u32()?;
                if bone_id as usize >= document_model.bone_names.len() {
                    return Err(Status::DocumentModelCorrupted);
                }
                document_model.constraint_states.push(ConstraintState {
                    bone_id,
                    enabled: buffer.read_u8()? != 0,
                });
            }

            let num_outside_parents = buffer.read_len()?;
            for _ in 0..num_outside_parents {
                let begin_frame_index = buffer.read_u32()?;
                let end_frame_index = buffer.read_u32()?;
                if begin_frame_index > end_frame_index {
                    return Err(Status::DocumentOutsideParentCorrupted);
                }
                let subject_bone_id = buffer.read_u32()?;
                if subject_bone_id as usize >= document_model.bone_names.len() {
                    return Err(Status::DocumentOutsideParentCorrupted);
                }
                document_model
                    .outside_parent_states
                    .push(OutsideParentState {
                        begin_frame_index,
                        end_frame_index,
                        subject_bone_id,
                        target_model_index: buffer.read_i32()?,
                        target_bone_name: Self::read_string(buffer, codec)?,
                    });
            }

            relink_model_keyframes(&mut document_model);
            self.models.push(document_model);
        }
        // Accessory and outside-parent records may point at models by
        // index; validate after the whole list is read
        for accessory in &self.accessories {
            if accessory.parent_model_index >= self.models.len() as i32 {
                return Err(Status::DocumentAccessoryCorrupted);
            }
        }
        for model in &self.models {
            for state in &model.outside_parent_states {
                if state.target_model_index >= self.models.len() as i32 {
                    return Err(Status::DocumentOutsideParentCorrupted);
                }
            }
        }
        Ok(())
    }

    // -- Accessors ---------------------------------------------------------

    pub fn format_type(&self) -> Option<DocumentFormatType> {
        self.format_type
    }

    pub fn camera(&self) -> &DocumentCamera {
        &self.camera
    }

    pub fn light(&self) -> &DocumentLight {
        &self.light
    }

    pub fn gravity(&self) -> &DocumentGravity {
        &self.gravity
    }

    pub fn self_shadow(&self) -> &DocumentSelfShadow {
        &self.self_shadow
    }

    pub fn accessories(&self) -> &[DocumentAccessory] {
        &self.accessories
    }

    pub fn models(&self) -> &[DocumentModel] {
        &self.models
    }
}

/// Recompute linkage for every keyframe chain of one document model.
pub(crate) fn relink_model_keyframes(model: &mut DocumentModel) {
    let bone_tracks: Vec<Track> = model.bone_tracks.tracks().cloned().collect();
    for track in &bone_tracks {
        relink(&mut model.bone_keyframes, track);
    }
    let morph_tracks: Vec<Track> = model.morph_tracks.tracks().cloned().collect();
    for track in &morph_tracks {
        relink(&mut model.morph_keyframes, track);
    }
    let model_track = model.model_track.clone();
    relink(&mut model.model_keyframes, &model_track);
}
