//! Mutable counterpart of [`Motion`].

use crate::motion::{
    writer, AccessoryKeyframe, BoneKeyframe, CameraKeyframe, LightKeyframe, ModelKeyframe,
    MorphKeyframe, Motion, SelfShadowKeyframe,
};
use crate::util::{MutableBuffer, Result, Status, StringCodec};

/// Owns a motion and maintains its track maps under every mutation.
///
/// Keyframe insertion keys on `(name, frame)` (or the frame alone for
/// singleton tracks) and rejects duplicates; removal of an absent frame
/// is a reported no-op. Tracks therefore stay strictly frame-ordered
/// with no duplicates, whatever order keyframes arrive in.
#[derive(Debug, Default)]
pub struct MutableMotion {
    motion: Motion,
}

impl MutableMotion {
    /// Create an empty motion.
    pub fn new() -> Self {
        Self::default()
    }

    /// Take over a parsed motion for in-place editing.
    pub fn from_motion(motion: Motion) -> Self {
        Self { motion }
    }

    pub fn as_motion(&self) -> &Motion {
        &self.motion
    }

    pub fn into_motion(self) -> Motion {
        self.motion
    }

    pub fn set_target_model_name(&mut self, name: impl Into<String>) {
        self.motion.target_model_name = name.into();
    }

    pub fn set_annotation(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.motion.annotations.insert(key.into(), value.into());
    }

    // -- Named tracks ------------------------------------------------------

    pub fn insert_bone_keyframe(&mut self, mut keyframe: BoneKeyframe) -> Result<()> {
        let position = self.motion.bone_keyframes.len();
        if !self
            .motion
            .bone_tracks
            .insert(&keyframe.name, keyframe.base.frame_index, position)
        {
            return Err(Status::MotionBoneKeyframeAlreadyExists);
        }
        keyframe.base.index = position as u32;
        self.motion.bone_keyframes.push(keyframe);
        Ok(())
    }

    pub fn remove_bone_keyframe(&mut self, name: &str, frame_index: u32) -> Result<BoneKeyframe> {
        let position = self
            .motion
            .bone_tracks
            .remove(name, frame_index)
            .ok_or(Status::MotionBoneKeyframeNotFound)?;
        let keyframe = self.motion.bone_keyframes.remove(position);
        self.motion.bone_tracks.reindex_after_removal(position);
        for shifted in &mut self.motion.bone_keyframes[position..] {
            shifted.base.index -= 1;
        }
        Ok(keyframe)
    }

    pub fn insert_morph_keyframe(&mut self, mut keyframe: MorphKeyframe) -> Result<()> {
        let position = self.motion.morph_keyframes.len();
        if !self
            .motion
            .morph_tracks
            .insert(&keyframe.name, keyframe.base.frame_index, position)
        {
            return Err(Status::MotionMorphKeyframeAlreadyExists);
        }
        keyframe.base.index = position as u32;
        self.motion.morph_keyframes.push(keyframe);
        Ok(())
    }

    pub fn remove_morph_keyframe(&mut self, name: &str, frame_index: u32) -> Result<MorphKeyframe> {
        let position = self
            .motion
            .morph_tracks
            .remove(name, frame_index)
            .ok_or(Status::MotionMorphKeyframeNotFound)?;
        let keyframe = self.motion.morph_keyframes.remove(position);
        self.motion.morph_tracks.reindex_after_removal(position);
        for shifted in &mut self.motion.morph_keyframes[position..] {
            shifted.base.index -= 1;
        }
        Ok(keyframe)
    }

    // -- Singleton tracks --------------------------------------------------

    pub fn insert_accessory_keyframe(&mut self, mut keyframe: AccessoryKeyframe) -> Result<()> {
        let position = self.motion.accessory_keyframes.len();
        if !self
            .motion
            .accessory_track
            .insert(keyframe.base.frame_index, position)
        {
            return Err(Status::MotionAccessoryKeyframeAlreadyExists);
        }
        keyframe.base.index = position as u32;
        self.motion.accessory_keyframes.push(keyframe);
        Ok(())
    }

    pub fn remove_accessory_keyframe(&mut self, frame_index: u32) -> Result<AccessoryKeyframe> {
        let position = self
            .motion
            .accessory_track
            .remove(frame_index)
            .ok_or(Status::MotionAccessoryKeyframeNotFound)?;
        let keyframe = self.motion.accessory_keyframes.remove(position);
        self.motion.accessory_track.reindex_after_removal(position);
        for shifted in &mut self.motion.accessory_keyframes[position..] {
            shifted.base.index -= 1;
        }
        Ok(keyframe)
    }

    pub fn insert_camera_keyframe(&mut self, mut keyframe: CameraKeyframe) -> Result<()> {
        let position = self.motion.camera_keyframes.len();
        if !self
            .motion
            .camera_track
            .insert(keyframe.base.frame_index, position)
        {
            return Err(Status::MotionCameraKeyframeAlreadyExists);
        }
        keyframe.base.index = position as u32;
        self.motion.camera_keyframes.push(keyframe);
        Ok(())
    }

    pub fn remove_camera_keyframe(&mut self, frame_index: u32) -> Result<CameraKeyframe> {
        let position = self
            .motion
            .camera_track
            .remove(frame_index)
            .ok_or(Status::MotionCameraKeyframeNotFound)?;
        let keyframe = self.motion.camera_keyframes.remove(position);
        self.motion.camera_track.reindex_after_removal(position);
        for shifted in &mut self.motion.camera_keyframes[position..] {
            shifted.base.index -= 1;
        }
        Ok(keyframe)
    }

    pub fn insert_light_keyframe(&mut self, mut keyframe: LightKeyframe) -> Result<()> {
        let position = self.motion.light_keyframes.len();
        if !self
            .motion
            .light_track
            .insert(keyframe.base.frame_index, position)
        {
            return Err(Status::MotionLightKeyframeAlreadyExists);
        }
        keyframe.base.index = position as u32;
        self.motion.light_keyframes.push(keyframe);
        Ok(())
    }

    pub fn remove_light_keyframe(&mut self, frame_index: u32) -> Result<LightKeyframe> {
        let position = self
            .motion
            .light_track
            .remove(frame_index)
            .ok_or(Status::MotionLightKeyframeNotFound)?;
        let keyframe = self.motion.light_keyframes.remove(position);
        self.motion.light_track.reindex_after_removal(position);
        for shifted in &mut self.motion.light_keyframes[position..] {
            shifted.base.index -= 1;
        }
        Ok(keyframe)
    }

    pub fn insert_model_keyframe(&mut self, mut keyframe: ModelKeyframe) -> Result<()> {
        let position = self.motion.model_keyframes.len();
        if !self
            .motion
            .model_track
            .insert(keyframe.base.frame_index, position)
        {
            return Err(Status::MotionModelKeyframeAlreadyExists);
        }
        keyframe.base.index = position as u32;
        self.motion.model_keyframes.push(keyframe);
        Ok(())
    }

    pub fn remove_model_keyframe(&mut self, frame_index: u32) -> Result<ModelKeyframe> {
        let position = self
            .motion
            .model_track
            .remove(frame_index)
            .ok_or(Status::MotionModelKeyframeNotFound)?;
        let keyframe = self.motion.model_keyframes.remove(position);
        self.motion.model_track.reindex_after_removal(position);
        for shifted in &mut self.motion.model_keyframes[position..] {
            shifted.base.index -= 1;
        }
        Ok(keyframe)
    }

    pub fn insert_self_shadow_keyframe(&mut self, mut keyframe: SelfShadowKeyframe) -> Result<()> {
        let position = self.motion.self_shadow_keyframes.len();
        if !self
            .motion
            .self_shadow_track
            .insert(keyframe.base.frame_index, position)
        {
            return Err(Status::MotionSelfShadowKeyframeAlreadyExists);
        }
        keyframe.base.index = position as u32;
        self.motion.self_shadow_keyframes.push(keyframe);
        Ok(())
    }

    pub fn remove_self_shadow_keyframe(&mut self, frame_index: u32) -> Result<SelfShadowKeyframe> {
        let position = self
            .motion
            .self_shadow_track
            .remove(frame_index)
            .ok_or(Status::MotionSelfShadowKeyframeNotFound)?;
        let keyframe = self.motion.self_shadow_keyframes.remove(position);
        self.motion.self_shadow_track.reindex_after_removal(position);
        for shifted in &mut self.motion.self_shadow_keyframes[position..] {
            shifted.base.index -= 1;
        }
        Ok(keyframe)
    }

    // -- Bulk copies -------------------------------------------------------

    /// Copy every bone keyframe of `source` into this motion, preserving
    /// frame order per track.
    pub fn copy_all_bone_keyframes(&mut self, source: &Motion) -> Result<()> {
        for name in source.bone_track_names() {
            for keyframe in source.extract_bone_track(name) {
                self.insert_bone_keyframe(keyframe.clone())?;
            }
        }
        Ok(())
    }

    /// Copy every morph keyframe of `source` into this motion.
    pub fn copy_all_morph_keyframes(&mut self, source: &Motion) -> Result<()> {
        for name in source.morph_track_names() {
            for keyframe in source.extract_morph_track(name) {
                self.insert_morph_keyframe(keyframe.clone())?;
            }
        }
        Ok(())
    }

    // -- Serialization -----------------------------------------------------

    /// Serialize as VMD.
    pub fn save(&self, buffer: &mut MutableBuffer, codec: &dyn StringCodec) -> Result<()> {
        writer::save(&self.motion, buffer, codec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_bone_keyframe_is_rejected() {
        let mut builder = MutableMotion::new();
        builder
            .insert_bone_keyframe(BoneKeyframe::new("center", 0))
            .unwrap();
        assert_eq!(
            builder
                .insert_bone_keyframe(BoneKeyframe::new("center", 0))
                .unwrap_err(),
            Status::MotionBoneKeyframeAlreadyExists
        );
        assert_eq!(builder.as_motion().bone_keyframes().len(), 1);
    }

    #[test]
    fn test_remove_absent_keyframe_is_not_found() {
        let mut builder = MutableMotion::new();
        assert_eq!(
            builder.remove_bone_keyframe("center", 3).unwrap_err(),
            Status::MotionBoneKeyframeNotFound
        );
        builder
            .insert_bone_keyframe(BoneKeyframe::new("center", 3))
            .unwrap();
        builder.remove_bone_keyframe("center", 3).unwrap();
        assert_eq!(
            builder.remove_bone_keyframe("center", 3).unwrap_err(),
            Status::MotionBoneKeyframeNotFound
        );
    }

    #[test]
    fn test_out_of_order_insertion_yields_sorted_track() {
        let mut builder = MutableMotion::new();
        for frame in [30u32, 0, 15] {
            builder
                .insert_bone_keyframe(BoneKeyframe::new("arm", frame))
                .unwrap();
        }
        let frames: Vec<u32> = builder
            .as_motion()
            .extract_bone_track("arm")
            .iter()
            .map(|keyframe| keyframe.base.frame_index)
            .collect();
        assert_eq!(frames, vec![0, 15, 30]);
    }

    #[test]
    fn test_stable_indices_follow_removal() {
        let mut builder = MutableMotion::new();
        builder
            .insert_bone_keyframe(BoneKeyframe::new("a", 0))
            .unwrap();
        builder
            .insert_bone_keyframe(BoneKeyframe::new("b", 0))
            .unwrap();
        builder
            .insert_bone_keyframe(BoneKeyframe::new("c", 0))
            .unwrap();
        builder.remove_bone_keyframe("a", 0).unwrap();
        let motion = builder.as_motion();
        assert_eq!(motion.find_bone_keyframe("b", 0).unwrap().base.index, 0);
        assert_eq!(motion.find_bone_keyframe("c", 0).unwrap().base.index, 1);
    }
}
