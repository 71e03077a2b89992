//! Mutable counterpart of [`Document`].

use crate::document::{
    relink, relink_model_keyframes, writer, Document, DocumentAccessory,
    DocumentAccessoryKeyframe, DocumentCameraKeyframe, DocumentGravityKeyframe,
    DocumentLightKeyframe, DocumentModel, DocumentModelBoneKeyframe, DocumentModelKeyframe,
    DocumentModelMorphKeyframe, DocumentSelfShadowKeyframe,
};
use crate::util::{MutableBuffer, Result, Status, StringCodec};

use super::insertion_position;

/// Owns a document and exposes ordered editing of its accessory/model
/// lists and keyframe tracks.
///
/// Removing a model rewrites the model-index references other entries
/// hold: later indices shift down, and references to the removed model
/// become -1.
#[derive(Debug, Default)]
pub struct MutableDocument {
    document: Document,
}

impl MutableDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take over a parsed document for in-place editing.
    pub fn from_document(document: Document) -> Self {
        Self { document }
    }

    pub fn as_document(&self) -> &Document {
        &self.document
    }

    pub fn into_document(self) -> Document {
        self.document
    }

    /// Mutable access to the document's settings fields.
    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    pub fn set_format_type(&mut self, format_type: crate::document::DocumentFormatType) {
        self.document.format_type = Some(format_type);
    }

    /// Mutable access to the camera's current state.
    pub fn camera_mut(&mut self) -> &mut crate::document::DocumentCamera {
        &mut self.document.camera
    }

    pub fn light_mut(&mut self) -> &mut crate::document::DocumentLight {
        &mut self.document.light
    }

    pub fn gravity_mut(&mut self) -> &mut crate::document::DocumentGravity {
        &mut self.document.gravity
    }

    pub fn self_shadow_mut(&mut self) -> &mut crate::document::DocumentSelfShadow {
        &mut self.document.self_shadow
    }

    // -- Accessory list ----------------------------------------------------

    /// Insert an accessory; -1 appends.
    pub fn insert_accessory(&mut self, accessory: DocumentAccessory, index: i32) -> Result<()> {
        let position = insertion_position(index, self.document.accessories.len())?;
        self.document.accessories.insert(position, accessory);
        Ok(())
    }

    /// Remove the accessory with the given name.
    pub fn remove_accessory(&mut self, name: &str) -> Result<DocumentAccessory> {
        let position = self
            .document
            .accessories
            .iter()
            .position(|accessory| accessory.name == name)
            .ok_or(Status::DocumentAccessoryNotFound)?;
        Ok(self.document.accessories.remove(position))
    }

    pub fn accessory_mut(&mut self, index: usize) -> Option<&mut DocumentAccessory> {
        self.document.accessories.get_mut(index)
    }

    // -- Model list --------------------------------------------------------

    /// Insert a model; -1 appends. References other entries hold to
    /// models at or after the insertion point shift up.
    pub fn insert_model(&mut self, model: DocumentModel, index: i32) -> Result<()> {
        let position = insertion_position(index, self.document.models.len())?;
        self.document.models.insert(position, model);
        self.shift_model_references_after_insertion(position);
        Ok(())
    }

    /// Remove the model with the given name, rewriting model-index
    /// references held by accessories and outside-parent states.
    pub fn remove_model(&mut self, name: &str) -> Result<DocumentModel> {
        let position = self
            .document
            .models
            .iter()
            .position(|model| model.name == name)
            .ok_or(Status::DocumentModelNotFound)?;
        let removed = self.document.models.remove(position);
        self.rewrite_model_references_after_removal(position as i32);
        Ok(removed)
    }

    pub fn model_mut(&mut self, index: usize) -> Option<&mut DocumentModel> {
        self.document.models.get_mut(index)
    }

    fn shift_model_references_after_insertion(&mut self, position: usize) {
        let shift = |reference: &mut i32| {
            if *reference >= position as i32 {
                *reference += 1;
            }
        };
        for accessory in &mut self.document.accessories {
            shift(&mut accessory.parent_model_index);
            for keyframe in &mut accessory.keyframes {
                shift(&mut keyframe.parent_model_index);
            }
        }
        for model in &mut self.document.models {
            for state in &mut model.outside_parent_states {
                shift(&mut state.target_model_index);
            }
        }
    }

    fn rewrite_model_references_after_removal(&mut self, removed: i32) {
        let rewrite = |reference: &mut i32| {
            if *reference == removed {
                *reference = -1;
            } else if *reference > removed {
                *reference -= 1;
            }
        };
        for accessory in &mut self.document.accessories {
            rewrite(&mut accessory.parent_model_index);
            for keyframe in &mut accessory.keyframes {
                rewrite(&mut keyframe.parent_model_index);
            }
        }
        for model in &mut self.document.models {
            for state in &mut model.outside_parent_states {
                rewrite(&mut state.target_model_index);
            }
        }
    }

    // -- Scene keyframe tracks ---------------------------------------------

    pub fn insert_camera_keyframe(&mut self, mut keyframe: DocumentCameraKeyframe) -> Result<()> {
        let camera = &mut self.document.camera;
        let position = camera.keyframes.len();
        if !camera.track.insert(keyframe.base.frame_index, position) {
            return Err(Status::DocumentKeyframeAlreadyExists);
        }
        keyframe.base.index = position as u32;
        camera.keyframes.push(keyframe);
        relink(&mut camera.keyframes, &camera.track);
        Ok(())
    }

    pub fn remove_camera_keyframe(&mut self, frame_index: u32) -> Result<DocumentCameraKeyframe> {
        let camera = &mut self.document.camera;
        let position = camera
            .track
            .remove(frame_index)
            .ok_or(Status::DocumentKeyframeNotFound)?;
        let keyframe = camera.keyframes.remove(position);
        camera.track.reindex_after_removal(position);
        for shifted in &mut camera.keyframes[position..] {
            shifted.base.index -= 1;
        }
        relink(&mut camera.keyframes, &camera.track);
        Ok(keyframe)
    }

    pub fn insert_light_keyframe(&mut self, mut keyframe: DocumentLightKeyframe) -> Result<()> {
        let light = &mut self.document.light;
        let position = light.keyframes.len();
        if !light.track.insert(keyframe.base.frame_index, position) {
            return Err(Status::DocumentKeyframeAlreadyExists);
        }
        keyframe.base.index = position as u32;
        light.keyframes.push(keyframe);
        relink(&mut light.keyframes, &light.track);
        Ok(())
    }

    pub fn remove_light_keyframe(&mut self, frame_index: u32) -> Result<DocumentLightKeyframe> {
        let light = &mut self.document.light;
        let position = light
            .track
            .remove(frame_index)
            .ok_or(Status::DocumentKeyframeNotFound)?;
        let keyframe = light.keyframes.remove(position);
        light.track.reindex_after_removal(position);
        for shifted in &mut light.keyframes[position..] {
            shifted.base.index -= 1;
        }
        relink(&mut light.keyframes, &light.track);
        Ok(keyframe)
    }

    pub fn insert_gravity_keyframe(&mut self, mut keyframe: DocumentGravityKeyframe) -> Result<()> {
        let gravity = &mut self.document.gravity;
        let position = gravity.keyframes.len();
        if !gravity.track.insert(keyframe.base.frame_index, position) {
            return Err(Status::DocumentKeyframeAlreadyExists);
        }
        keyframe.base.index = position as u32;
        gravity.keyframes.push(keyframe);
        relink(&mut gravity.keyframes, &gravity.track);
        Ok(())
    }

    pub fn remove_gravity_keyframe(&mut self, frame_index: u32) -> Result<DocumentGravityKeyframe> {
        let gravity = &mut self.document.gravity;
        let position = gravity
            .track
            .remove(frame_index)
            .ok_or(Status::DocumentKeyframeNotFound)?;
        let keyframe = gravity.keyframes.remove(position);
        gravity.track.reindex_after_removal(position);
        for shifted in &mut gravity.keyframes[position..] {
            shifted.base.index -= 1;
        }
        relink(&mut gravity.keyframes, &gravity.track);
        Ok(keyframe)
    }

    pub fn insert_self_shadow_keyframe(
        &mut self,
        mut keyframe: DocumentSelfShadowKeyframe,
    ) -> Result<()> {
        let self_shadow = &mut self.document.self_shadow;
        let position = self_shadow.keyframes.len();
        if !self_shadow.track.insert(keyframe.base.frame_index, position) {
            return Err(Status::DocumentKeyframeAlreadyExists);
        }
        keyframe.base.index = position as u32;
        self_shadow.keyframes.push(keyframe);
        relink(&mut self_shadow.keyframes, &self_shadow.track);
        Ok(())
    }

    pub fn remove_self_shadow_keyframe(
        &mut self,
        frame_index: u32,
    ) -> Result<DocumentSelfShadowKeyframe> {
        let self_shadow = &mut self.document.self_shadow;
        let position = self_shadow
            .track
            .remove(frame_index)
            .ok_or(Status::DocumentKeyframeNotFound)?;
        let keyframe = self_shadow.keyframes.remove(position);
        self_shadow.track.reindex_after_removal(position);
        for shifted in &mut self_shadow.keyframes[position..] {
            shifted.base.index -= 1;
        }
        relink(&mut self_shadow.keyframes, &self_shadow.track);
        Ok(keyframe)
    }

    /// Insert an accessory keyframe into the accessory's own track.
    pub fn insert_accessory_keyframe(
        &mut self,
        accessory_index: usize,
        mut keyframe: DocumentAccessoryKeyframe,
    ) -> Result<()> {
        let accessory = self
            .document
            .accessories
            .get_mut(accessory_index)
            .ok_or(Status::DocumentAccessoryNotFound)?;
        let position = accessory.keyframes.len();
        if !accessory.track.insert(keyframe.base.frame_index, position) {
            return Err(Status::DocumentKeyframeAlreadyExists);
        }
        keyframe.base.index = position as u32;
        accessory.keyframes.push(keyframe);
        relink(&mut accessory.keyframes, &accessory.track);
        Ok(())
    }

    // -- Per-model keyframe tracks -----------------------------------------

    /// Insert a bone keyframe into one model's track; the keyframe's
    /// `bone_id` must be registered in that model's bone-name registry.
    pub fn insert_model_bone_keyframe(
        &mut self,
        model_index: usize,
        mut keyframe: DocumentModelBoneKeyframe,
    ) -> Result<()> {
        let model = self
            .document
            .models
            .get_mut(model_index)
            .ok_or(Status::DocumentModelNotFound)?;
        let name = model
            .bone_names
            .get(keyframe.bone_id as usize)
            .cloned()
            .ok_or(Status::DocumentModelCorrupted)?;
        let position = model.bone_keyframes.len();
        if !model
            .bone_tracks
            .insert(&name, keyframe.base.frame_index, position)
        {
            return Err(Status::DocumentKeyframeAlreadyExists);
        }
        keyframe.base.index = position as u32;
        model.bone_keyframes.push(keyframe);
        relink_model_keyframes(model);
        Ok(())
    }

    pub fn remove_model_bone_keyframe(
        &mut self,
        model_index: usize,
        bone_name: &str,
        frame_index: u32,
    ) -> Result<DocumentModelBoneKeyframe> {
        let model = self
            .document
            .models
            .get_mut(model_index)
            .ok_or(Status::DocumentModelNotFound)?;
        let position = model
            .bone_tracks
            .remove(bone_name, frame_index)
            .ok_or(Status::DocumentKeyframeNotFound)?;
        let keyframe = model.bone_keyframes.remove(position);
        model.bone_tracks.reindex_after_removal(position);
        for shifted in &mut model.bone_keyframes[position..] {
            shifted.base.index -= 1;
        }
        relink_model_keyframes(model);
        Ok(keyframe)
    }

    pub fn insert_model_morph_keyframe(
        &mut self,
        model_index: usize,
        mut keyframe: DocumentModelMorphKeyframe,
    ) -> Result<()> {
        let model = self
            .document
            .models
            .get_mut(model_index)
            .ok_or(Status::DocumentModelNotFound)?;
        let name = model
            .morph_names
            .get(keyframe.morph_id as usize)
            .cloned()
            .ok_or(Status::DocumentModelCorrupted)?;
        let position = model.morph_keyframes.len();
        if !model
            .morph_tracks
            .insert(&name, keyframe.base.frame_index, position)
        {
            return Err(Status::DocumentKeyframeAlreadyExists);
        }
        keyframe.base.index = position as u32;
        model.morph_keyframes.push(keyframe);
        relink_model_keyframes(model);
        Ok(())
    }

    pub fn remove_model_morph_keyframe(
        &mut self,
        model_index: usize,
        morph_name: &str,
        frame_index: u32,
    ) -> Result<DocumentModelMorphKeyframe> {
        let model = self
            .document
            .models
            .get_mut(model_index)
            .ok_or(Status::DocumentModelNotFound)?;
        let position = model
            .morph_tracks
            .remove(morph_name, frame_index)
            .ok_or(Status::DocumentKeyframeNotFound)?;
        let keyframe = model.morph_keyframes.remove(position);
        model.morph_tracks.reindex_after_removal(position);
        for shifted in &mut model.morph_keyframes[position..] {
            shifted.base.index -= 1;
        }
        relink_model_keyframes(model);
        Ok(keyframe)
    }

    pub fn insert_model_keyframe(
        &mut self,
        model_index: usize,
        mut keyframe: DocumentModelKeyframe,
    ) -> Result<()> {
        let model = self
            .document
            .models
            .get_mut(model_index)
            .ok_or(Status::DocumentModelNotFound)?;
        let position = model.model_keyframes.len();
        if !model.model_track.insert(keyframe.base.frame_index, position) {
            return Err(Status::DocumentKeyframeAlreadyExists);
        }
        keyframe.base.index = position as u32;
        model.model_keyframes.push(keyframe);
        relink_model_keyframes(model);
        Ok(())
    }

    pub fn remove_model_keyframe(
        &mut self,
        model_index: usize,
        frame_index: u32,
    ) -> Result<DocumentModelKeyframe> {
        let model = self
            .document
            .models
            .get_mut(model_index)
            .ok_or(Status::DocumentModelNotFound)?;
        let position = model
            .model_track
            .remove(frame_index)
            .ok_or(Status::DocumentKeyframeNotFound)?;
        let keyframe = model.model_keyframes.remove(position);
        model.model_track.reindex_after_removal(position);
        for shifted in &mut model.model_keyframes[position..] {
            shifted.base.index -= 1;
        }
        relink_model_keyframes(model);
        Ok(keyframe)
    }

    // -- Serialization -----------------------------------------------------

    pub fn save(&self, buffer: &mut MutableBuffer, codec: &dyn StringCodec) -> Result<()> {
        writer::save(&self.document, buffer, codec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessory_insertion_order() {
        let mut builder = MutableDocument::new();
        builder
            .insert_accessory(DocumentAccessory::new("first"), -1)
            .unwrap();
        builder
            .insert_accessory(DocumentAccessory::new("second"), 1)
            .unwrap();
        builder
            .insert_accessory(DocumentAccessory::new("third"), 0)
            .unwrap();
        let names: Vec<&str> = builder
            .as_document()
            .accessories()
            .iter()
            .map(|accessory| accessory.name.as_str())
            .collect();
        assert_eq!(names, vec!["third", "first", "second"]);
    }

    #[test]
    fn test_remove_accessory_twice_is_not_found() {
        let mut builder = MutableDocument::new();
        builder
            .insert_accessory(DocumentAccessory::new("first"), -1)
            .unwrap();
        builder.remove_accessory("first").unwrap();
        assert_eq!(
            builder.remove_accessory("first").unwrap_err(),
            Status::DocumentAccessoryNotFound
        );
    }
}
