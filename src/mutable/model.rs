//! Mutable counterpart of [`Model`].

use crate::model::{
    Bone, Constraint, FormatType, Joint, Label, LanguageType, Material, Model, Morph, RigidBody,
    SoftBody, Texture, Vertex,
};
use crate::model::{pmd, writer};
use crate::util::{CodecKind, MutableBuffer, Result, Status, StringCodec};

use super::insertion_position;

/// Owns a model graph and exposes ordered editing operations.
///
/// Insertion order is the source of truth for every reference index the
/// serializer emits. Removal does not rewrite index references held by
/// other entities; keeping those consistent is the editing caller's
/// responsibility, exactly as it is when authoring the file by hand.
#[derive(Debug, Default)]
pub struct MutableModel {
    model: Model,
}

impl MutableModel {
    /// Create an empty PMX 2.0 model.
    pub fn new() -> Self {
        let mut model = Model::default();
        model.format_type = Some(FormatType::Pmx2_0);
        Self { model }
    }

    /// Take over a parsed model for in-place editing.
    pub fn from_model(model: Model) -> Self {
        Self { model }
    }

    /// The wrapped immutable graph.
    pub fn as_model(&self) -> &Model {
        &self.model
    }

    /// Release the wrapped graph.
    pub fn into_model(self) -> Model {
        self.model
    }

    // -- Header setters ----------------------------------------------------

    pub fn set_format_type(&mut self, format_type: FormatType) {
        self.model.format_type = Some(format_type);
    }

    pub fn set_codec_kind(&mut self, codec_kind: CodecKind) {
        self.model.codec_kind = codec_kind;
    }

    pub fn set_additional_uv_size(&mut self, size: u8) {
        self.model.additional_uv_size = size.min(4);
    }

    pub fn set_name(&mut self, language: LanguageType, name: impl Into<String>) {
        match language {
            LanguageType::Japanese => self.model.name_ja = name.into(),
            LanguageType::English => self.model.name_en = name.into(),
        }
    }

    pub fn set_comment(&mut self, language: LanguageType, comment: impl Into<String>) {
        match language {
            LanguageType::Japanese => self.model.comment_ja = comment.into(),
            LanguageType::English => self.model.comment_en = comment.into(),
        }
    }

    /// Replace the shared vertex-index buffer.
    pub fn set_vertex_indices(&mut self, vertex_indices: Vec<u32>) {
        self.model.vertex_indices = vertex_indices;
    }

    pub fn set_toon_texture_paths(&mut self, paths: Vec<String>) {
        self.model.toon_texture_paths = paths;
    }

    // -- Ordered insertion and removal -------------------------------------

    pub fn insert_vertex(&mut self, vertex: Vertex, index: i32) -> Result<()> {
        let position = insertion_position(index, self.model.vertices.len())?;
        self.model.vertices.insert(position, vertex);
        Ok(())
    }

    pub fn remove_vertex(&mut self, index: usize) -> Result<Vertex> {
        if index >= self.model.vertices.len() {
            return Err(Status::ModelVertexNotFound);
        }
        Ok(self.model.vertices.remove(index))
    }

    pub fn insert_texture(&mut self, texture: Texture, index: i32) -> Result<()> {
        let position = insertion_position(index, self.model.textures.len())?;
        self.model.textures.insert(position, texture);
        Ok(())
    }

    pub fn remove_texture(&mut self, index: usize) -> Result<Texture> {
        if index >= self.model.textures.len() {
            return Err(Status::ModelTextureNotFound);
        }
        Ok(self.model.textures.remove(index))
    }

    pub fn insert_material(&mut self, material: Material, index: i32) -> Result<()> {
        let position = insertion_position(index, self.model.materials.len())?;
        self.model.materials.insert(position, material);
        Ok(())
    }

    pub fn remove_material(&mut self, index: usize) -> Result<Material> {
        if index >= self.model.materials.len() {
            return Err(Status::ModelMaterialNotFound);
        }
        Ok(self.model.materials.remove(index))
    }

    pub fn insert_bone(&mut self, bone: Bone, index: i32) -> Result<()> {
        let position = insertion_position(index, self.model.bones.len())?;
        self.model.bones.insert(position, bone);
        Ok(())
    }

    pub fn remove_bone(&mut self, index: usize) -> Result<Bone> {
        if index >= self.model.bones.len() {
            return Err(Status::ModelBoneNotFound);
        }
        Ok(self.model.bones.remove(index))
    }

    pub fn insert_constraint(&mut self, constraint: Constraint, index: i32) -> Result<()> {
        let position = insertion_position(index, self.model.constraints.len())?;
        self.model.constraints.insert(position, constraint);
        Ok(())
    }

    pub fn remove_constraint(&mut self, index: usize) -> Result<Constraint> {
        if index >= self.model.constraints.len() {
            return Err(Status::ModelConstraintNotFound);
        }
        Ok(self.model.constraints.remove(index))
    }

    pub fn insert_morph(&mut self, morph: Morph, index: i32) -> Result<()> {
        let position = insertion_position(index, self.model.morphs.len())?;
        self.model.morphs.insert(position, morph);
        Ok(())
    }

    pub fn remove_morph(&mut self, index: usize) -> Result<Morph> {
        if index >= self.model.morphs.len() {
            return Err(Status::ModelMorphNotFound);
        }
        Ok(self.model.morphs.remove(index))
    }

    pub fn insert_label(&mut self, label: Label, index: i32) -> Result<()> {
        let position = insertion_position(index, self.model.labels.len())?;
        self.model.labels.insert(position, label);
        Ok(())
    }

    pub fn remove_label(&mut self, index: usize) -> Result<Label> {
        if index >= self.model.labels.len() {
            return Err(Status::ModelLabelNotFound);
        }
        Ok(self.model.labels.remove(index))
    }

    pub fn insert_rigid_body(&mut self, rigid_body: RigidBody, index: i32) -> Result<()> {
        let position = insertion_position(index, self.model.rigid_bodies.len())?;
        self.model.rigid_bodies.insert(position, rigid_body);
        Ok(())
    }

    pub fn remove_rigid_body(&mut self, index: usize) -> Result<RigidBody> {
        if index >= self.model.rigid_bodies.len() {
            return Err(Status::ModelRigidBodyNotFound);
        }
        Ok(self.model.rigid_bodies.remove(index))
    }

    pub fn insert_joint(&mut self, joint: Joint, index: i32) -> Result<()> {
        let position = insertion_position(index, self.model.joints.len())?;
        self.model.joints.insert(position, joint);
        Ok(())
    }

    pub fn remove_joint(&mut self, index: usize) -> Result<Joint> {
        if index >= self.model.joints.len() {
            return Err(Status::ModelJointNotFound);
        }
        Ok(self.model.joints.remove(index))
    }

    pub fn insert_soft_body(&mut self, soft_body: SoftBody, index: i32) -> Result<()> {
        let position = insertion_position(index, self.model.soft_bodies.len())?;
        self.model.soft_bodies.insert(position, soft_body);
        Ok(())
    }

    pub fn remove_soft_body(&mut self, index: usize) -> Result<SoftBody> {
        if index >= self.model.soft_bodies.len() {
            return Err(Status::ModelSoftBodyNotFound);
        }
        Ok(self.model.soft_bodies.remove(index))
    }

    /// Mutable access to an already-inserted bone.
    pub fn bone_mut(&mut self, index: usize) -> Option<&mut Bone> {
        self.model.bones.get_mut(index)
    }

    pub fn material_mut(&mut self, index: usize) -> Option<&mut Material> {
        self.model.materials.get_mut(index)
    }

    pub fn morph_mut(&mut self, index: usize) -> Option<&mut Morph> {
        self.model.morphs.get_mut(index)
    }

    pub fn vertex_mut(&mut self, index: usize) -> Option<&mut Vertex> {
        self.model.vertices.get_mut(index)
    }

    // -- Serialization -----------------------------------------------------

    /// Serialize the graph in its current format (PMX 2.0/2.1 or PMD).
    pub fn save(&self, buffer: &mut MutableBuffer, codec: &dyn StringCodec) -> Result<()> {
        match self.model.format_type {
            Some(FormatType::Pmd1_0) => pmd::save(&self.model, buffer, codec),
            Some(_) => writer::save(&self.model, buffer, codec),
            None => Err(Status::ModelVersionIncompatible),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_append_and_positional() {
        let mut builder = MutableModel::new();
        let mut first = Vertex::default();
        first.edge_size = 1.0;
        let mut second = Vertex::default();
        second.edge_size = 2.0;
        let mut third = Vertex::default();
        third.edge_size = 3.0;
        builder.insert_vertex(first, -1).unwrap();
        builder.insert_vertex(second, -1).unwrap();
        builder.insert_vertex(third, 0).unwrap();
        let sizes: Vec<f32> = builder
            .as_model()
            .vertices()
            .iter()
            .map(|vertex| vertex.edge_size)
            .collect();
        assert_eq!(sizes, vec![3.0, 1.0, 2.0]);
    }

    #[test]
    fn test_remove_out_of_range_is_not_found() {
        let mut builder = MutableModel::new();
        assert_eq!(builder.remove_bone(0).unwrap_err(), Status::ModelBoneNotFound);
    }

    #[test]
    fn test_insert_past_end_is_rejected() {
        let mut builder = MutableModel::new();
        assert!(matches!(
            builder.insert_bone(Bone::default(), 1),
            Err(Status::InsertionIndexOutOfBounds { index: 1, count: 0 })
        ));
    }
}
