//! Motion codec: VMD keyframe clips.
//!
//! [`Motion::load`] parses the `"Vocaloid Motion Data 0002"` container
//! into flat keyframe vectors plus per-name frame-ordered track maps.
//! The maps, not linear scans, back the first-class [`Motion::find_bone_keyframe`]
//! and [`Motion::search_closest_bone_keyframes`] queries animation
//! playback drives while scrubbing.

pub(crate) mod interpolation;
pub(crate) mod keyframe;
pub(crate) mod track;
pub(crate) mod writer;

pub use interpolation::{BoneInterpolation, CameraInterpolation, Curve, LINEAR_CURVE};
pub use keyframe::{
    AccessoryKeyframe, BoneKeyframe, CameraKeyframe, EffectParameter, EffectParameterValue,
    KeyframeBase, LightKeyframe, ModelConstraintState, ModelKeyframe, MorphKeyframe,
    OutsideParent, SelfShadowKeyframe, UserData,
};
pub use track::{NamedTrackSet, Track};

use std::collections::HashMap;

use tracing::debug;

use crate::util::{decode_fixed, Buffer, CodecKind, Result, Status, StringCodec};

/// 30-byte container signature.
pub const VMD_SIGNATURE: &[u8] = b"Vocaloid Motion Data 0002";
const VMD_SIGNATURE_WIDTH: usize = 30;
const TARGET_NAME_WIDTH: usize = 20;
const KEYFRAME_NAME_WIDTH: usize = 15;
const CONSTRAINT_NAME_WIDTH: usize = 20;

/// An immutable motion clip.
///
/// Keyframes live in flat per-kind vectors; the track maps index them by
/// `(name, frame)` and stay frame-ordered under every mutation applied
/// through [`MutableMotion`](crate::mutable::MutableMotion).
#[derive(Debug, Default)]
pub struct Motion {
    pub(crate) target_model_name: String,
    pub(crate) annotations: HashMap<String, String>,
    pub(crate) accessory_keyframes: Vec<AccessoryKeyframe>,
    pub(crate) bone_keyframes: Vec<BoneKeyframe>,
    pub(crate) camera_keyframes: Vec<CameraKeyframe>,
    pub(crate) light_keyframes: Vec<LightKeyframe>,
    pub(crate) model_keyframes: Vec<ModelKeyframe>,
    pub(crate) morph_keyframes: Vec<MorphKeyframe>,
    pub(crate) self_shadow_keyframes: Vec<SelfShadowKeyframe>,
    pub(crate) bone_tracks: NamedTrackSet,
    pub(crate) morph_tracks: NamedTrackSet,
    pub(crate) accessory_track: Track,
    pub(crate) camera_track: Track,
    pub(crate) light_track: Track,
    pub(crate) model_track: Track,
    pub(crate) self_shadow_track: Track,
}

impl Motion {
    /// Parse a VMD buffer.
    ///
    /// Every stored frame index is re-anchored by adding `offset`,
    /// letting a caller graft an imported clip onto an existing timeline.
    pub fn load(buffer: &mut Buffer, offset: u32, codec: &dyn StringCodec) -> Result<Self> {
        let signature = buffer.read_bytes(VMD_SIGNATURE_WIDTH)?;
        if !signature.starts_with(VMD_SIGNATURE) {
            return Err(Status::MotionFormatInvalid);
        }
        let mut motion = Motion::default();
        let name_bytes = buffer.read_bytes(TARGET_NAME_WIDTH)?;
        motion.target_model_name = decode_fixed(codec, &name_bytes, CodecKind::Sjis)
            .map_err(|_| Status::MotionTargetNameCorrupted)?;
        motion.parse_bone_keyframes(buffer, offset, codec)?;
        if !buffer.is_end() {
            motion.parse_morph_keyframes(buffer, offset, codec)?;
        }
        if !buffer.is_end() {
            motion.parse_camera_keyframes(buffer, offset)?;
        }
        if !buffer.is_end() {
            motion.parse_light_keyframes(buffer, offset)?;
        }
        if !buffer.is_end() {
            motion.parse_self_shadow_keyframes(buffer, offset)?;
        }
        if !buffer.is_end() {
            motion.parse_model_keyframes(buffer, offset, codec)?;
        }
        if !buffer.is_end() {
            return Err(Status::BufferNotEnd);
        }
        debug!(
            model = %motion.target_model_name,
            bone = motion.bone_keyframes.len(),
            morph = motion.morph_keyframes.len(),
            camera = motion.camera_keyframes.len(),
            "loaded motion"
        );
        Ok(motion)
    }

    fn parse_bone_keyframes(
        &mut self,
        buffer: &mut Buffer,
        offset: u32,
        codec: &dyn StringCodec,
    ) -> Result<()> {
        let count = buffer.read_len()?;
        self.bone_keyframes.reserve(count);
        for position in 0..count {
            let name_bytes = buffer.read_bytes(KEYFRAME_NAME_WIDTH)?;
            let name = decode_fixed(codec, &name_bytes, CodecKind::Sjis)
                .map_err(|_| Status::MotionBoneKeyframeCorrupted)?;
            let mut keyframe = BoneKeyframe::new(name, buffer.read_u32()?.saturating_add(offset));
            keyframe.base.index = position as u32;
            keyframe.translation = buffer.read_f32x3()?;
            let orientation = buffer.read_f32x4()?;
            keyframe.orientation = glam::Quat::from_xyzw(
                orientation.x,
                orientation.y,
                orientation.z,
                orientation.w,
            );
            keyframe.interpolation = BoneInterpolation::read_vmd(buffer)?;
            // Duplicate (name, frame) records occur in the wild; the
            // track keeps the first and the record stays addressable by
            // its stable index
            self.bone_tracks
                .insert(&keyframe.name, keyframe.base.frame_index, position);
            self.bone_keyframes.push(keyframe);
        }
        Ok(())
    }

    fn parse_morph_keyframes(
        &mut self,
        buffer: &mut Buffer,
        offset: u32,
        codec: &dyn StringCodec,
    ) -> Result<()> {
        let count = buffer.read_len()?;
        self.morph_keyframes.reserve(count);
        for position in 0..count {
            let name_bytes = buffer.read_bytes(KEYFRAME_NAME_WIDTH)?;
            let name = decode_fixed(codec, &name_bytes, CodecKind::Sjis)
                .map_err(|_| Status::MotionMorphKeyframeCorrupted)?;
            let mut keyframe = MorphKeyframe::new(name, buffer.read_u32()?.saturating_add(offset));
            keyframe.base.index = position as u32;
            keyframe.weight = buffer.read_f32()?;
            self.morph_tracks
                .insert(&keyframe.name, keyframe.base.frame_index, position);
            self.morph_keyframes.push(keyframe);
        }
        Ok(())
    }

    fn parse_camera_keyframes(&mut self, buffer: &mut Buffer, offset: u32) -> Result<()> {
        let count = buffer.read_len()?;
        self.camera_keyframes.reserve(count);
        for position in 0..count {
            let mut keyframe = CameraKeyframe::new(buffer.read_u32()?.saturating_add(offset));
            keyframe.base.index = position as u32;
            keyframe.distance = buffer.read_f32()?;
            keyframe.lookat = buffer.read_f32x3()?;
            keyframe.angle = buffer.read_f32x3()?;
            keyframe.interpolation = CameraInterpolation::read_vmd(buffer)?;
            keyframe.fov = buffer.read_i32()?;
            keyframe.is_perspective_view = buffer.read_u8()? == 0;
            self.camera_track.insert(keyframe.base.frame_index, position);
            self.camera_keyframes.push(keyframe);
        }
        Ok(())
    }

    fn parse_light_keyframes(&mut self, buffer: &mut Buffer, offset: u32) -> Result<()> {
        let count = buffer.read_len()?;
        self.light_keyframes.reserve(count);
        for position in 0..count {
            let mut keyframe = LightKeyframe::new(buffer.read_u32()?.saturating_add(offset));
            keyframe.base.index = position as u32;
            keyframe.color = buffer.read_f32x3()?;
            keyframe.direction = buffer.read_f32x3()?;
            self.light_track.insert(keyframe.base.frame_index, position);
            self.light_keyframes.push(keyframe);
        }
        Ok(())
    }

    fn parse_self_shadow_keyframes(&mut self, buffer: &mut Buffer, offset: u32) -> Result<()> {
        let count = buffer.read_len()?;
        self.self_shadow_keyframes.reserve(count);
        for position in 0..count {
            let mut keyframe = SelfShadowKeyframe::new(buffer.read_u32()?.saturating_add(offset));
            keyframe.base.index = position as u32;
            keyframe.mode = buffer.read_u8()? as i32;
            keyframe.distance = buffer.read_f32()?;
            self.self_shadow_track
                .insert(keyframe.base.frame_index, position);
            self.self_shadow_keyframes.push(keyframe);
        }
        Ok(())
    }

    fn parse_model_keyframes(
        &mut self,
        buffer: &mut Buffer,
        offset: u32,
        codec: &dyn StringCodec,
    ) -> Result<()> {
        let count = buffer.read_len()?;
        self.model_keyframes.reserve(count);
        for position in 0..count {
            let mut keyframe = ModelKeyframe::new(buffer.read_u32()?.saturating_add(offset));
            keyframe.base.index = position as u32;
            keyframe.is_visible = buffer.read_u8()? != 0;
            let num_states = buffer.read_len()?;
            keyframe.constraint_states.reserve(num_states);
            for _ in 0..num_states {
                let name_bytes = buffer.read_bytes(CONSTRAINT_NAME_WIDTH)?;
                keyframe.constraint_states.push(ModelConstraintState {
                    bone_name: decode_fixed(codec, &name_bytes, CodecKind::Sjis)
                        .map_err(|_| Status::MotionModelKeyframeCorrupted)?,
                    enabled: buffer.read_u8()? != 0,
                });
            }
            self.model_track.insert(keyframe.base.frame_index, position);
            self.model_keyframes.push(keyframe);
        }
        Ok(())
    }

    // -- Accessors ---------------------------------------------------------

    pub fn target_model_name(&self) -> &str {
        &self.target_model_name
    }

    pub fn annotations(&self) -> &HashMap<String, String> {
        &self.annotations
    }

    pub fn accessory_keyframes(&self) -> &[AccessoryKeyframe] {
        &self.accessory_keyframes
    }

    pub fn bone_keyframes(&self) -> &[BoneKeyframe] {
        &self.bone_keyframes
    }

    pub fn camera_keyframes(&self) -> &[CameraKeyframe] {
        &self.camera_keyframes
    }

    pub fn light_keyframes(&self) -> &[LightKeyframe] {
        &self.light_keyframes
    }

    pub fn model_keyframes(&self) -> &[ModelKeyframe] {
        &self.model_keyframes
    }

    pub fn morph_keyframes(&self) -> &[MorphKeyframe] {
        &self.morph_keyframes
    }

    pub fn self_shadow_keyframes(&self) -> &[SelfShadowKeyframe] {
        &self.self_shadow_keyframes
    }

    /// Largest frame index across every track, 0 for an empty motion.
    pub fn max_frame_index(&self) -> u32 {
        [
            self.bone_tracks.max_frame_index(),
            self.morph_tracks.max_frame_index(),
            self.accessory_track.max_frame_index(),
            self.camera_track.max_frame_index(),
            self.light_track.max_frame_index(),
            self.model_track.max_frame_index(),
            self.self_shadow_track.max_frame_index(),
        ]
        .into_iter()
        .flatten()
        .max()
        .unwrap_or(0)
    }

    // -- Queries -----------------------------------------------------------

    /// Exact-frame lookup in one bone track.
    pub fn find_bone_keyframe(&self, name: &str, frame_index: u32) -> Option<&BoneKeyframe> {
        self.bone_tracks
            .find(name, frame_index)
            .map(|position| &self.bone_keyframes[position])
    }

    pub fn find_morph_keyframe(&self, name: &str, frame_index: u32) -> Option<&MorphKeyframe> {
        self.morph_tracks
            .find(name, frame_index)
            .map(|position| &self.morph_keyframes[position])
    }

    pub fn find_camera_keyframe(&self, frame_index: u32) -> Option<&CameraKeyframe> {
        self.camera_track
            .find(frame_index)
            .map(|position| &self.camera_keyframes[position])
    }

    pub fn find_light_keyframe(&self, frame_index: u32) -> Option<&LightKeyframe> {
        self.light_track
            .find(frame_index)
            .map(|position| &self.light_keyframes[position])
    }

    pub fn find_model_keyframe(&self, frame_index: u32) -> Option<&ModelKeyframe> {
        self.model_track
            .find(frame_index)
            .map(|position| &self.model_keyframes[position])
    }

    pub fn find_self_shadow_keyframe(&self, frame_index: u32) -> Option<&SelfShadowKeyframe> {
        self.self_shadow_track
            .find(frame_index)
            .map(|position| &self.self_shadow_keyframes[position])
    }

    /// Nearest bone keyframes around `frame_index`: the last at or
    /// before it and the first strictly after it.
    pub fn search_closest_bone_keyframes(
        &self,
        name: &str,
        frame_index: u32,
    ) -> (Option<&BoneKeyframe>, Option<&BoneKeyframe>) {
        let (previous, next) = self.bone_tracks.search_closest(name, frame_index);
        (
            previous.map(|position| &self.bone_keyframes[position]),
            next.map(|position| &self.bone_keyframes[position]),
        )
    }

    pub fn search_closest_morph_keyframes(
        &self,
        name: &str,
        frame_index: u32,
    ) -> (Option<&MorphKeyframe>, Option<&MorphKeyframe>) {
        let (previous, next) = self.morph_tracks.search_closest(name, frame_index);
        (
            previous.map(|position| &self.morph_keyframes[position]),
            next.map(|position| &self.morph_keyframes[position]),
        )
    }

    pub fn search_closest_camera_keyframes(
        &self,
        frame_index: u32,
    ) -> (Option<&CameraKeyframe>, Option<&CameraKeyframe>) {
        let (previous, next) = self.camera_track.search_closest(frame_index);
        (
            previous.map(|position| &self.camera_keyframes[position]),
            next.map(|position| &self.camera_keyframes[position]),
        )
    }

    /// All keyframes of one bone track in ascending frame order.
    pub fn extract_bone_track(&self, name: &str) -> Vec<&BoneKeyframe> {
        self.bone_tracks
            .track(name)
            .map(|track| {
                track
                    .positions()
                    .map(|position| &self.bone_keyframes[position])
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn extract_morph_track(&self, name: &str) -> Vec<&MorphKeyframe> {
        self.morph_tracks
            .track(name)
            .map(|track| {
                track
                    .positions()
                    .map(|position| &self.morph_keyframes[position])
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Names of every non-empty bone track.
    pub fn bone_track_names(&self) -> Vec<&str> {
        self.bone_tracks.names().collect()
    }

    pub fn morph_track_names(&self) -> Vec<&str> {
        self.morph_tracks.names().collect()
    }
}
