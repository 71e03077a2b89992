//! Model codec: PMX 2.0/2.1 and PMD 1.0.
//!
//! [`Model::load`] decodes a tightly packed little-endian model file into
//! an immutable object graph. Cross-references between entities are
//! stored as indices into the owning model's tables (-1 for "none") and
//! validated in a second pass after all tables are read, so records may
//! reference entities defined later in the same table. A malformed
//! sub-section aborts the whole load; partial graphs are never exposed.
//!
//! The mirror-image serializers live in [`writer`] (PMX) and [`pmd`]
//! (PMD) and are driven by the mutable layer.

mod bone;
mod joint;
mod label;
mod material;
mod morph;
pub(crate) mod pmd;
mod rigid_body;
mod soft_body;
mod texture;
mod vertex;
pub(crate) mod writer;

pub use bone::{Bone, BoneFlags, BoneType, Constraint, ConstraintJoint};
pub use joint::{Joint, JointType};
pub use label::{Label, LabelItem};
pub use material::{Material, MaterialFlags, SphereMapTextureType};
pub use morph::{
    BoneMorph, FlipMorph, GroupMorph, ImpulseMorph, MaterialMorph, Morph, MorphCategory,
    MorphMaterialOperation, MorphType, MorphUnits, UvMorph, VertexMorph,
};
pub use rigid_body::{RigidBody, RigidBodyShapeType, RigidBodyTransformType};
pub use soft_body::{SoftBody, SoftBodyAeroModelType, SoftBodyAnchor, SoftBodyShapeType};
pub use texture::Texture;
pub use vertex::{Vertex, VertexType};

use tracing::debug;

use crate::util::{Buffer, CodecKind, Result, Status, StringCodec};

/// `"PMX "` signature.
const PMX_SIGNATURE: u32 = u32::from_le_bytes(*b"PMX ");
/// Alternate signature emitted by some tools (`0xA0` in place of the space).
const PMX_SIGNATURE_ALT: u32 = u32::from_le_bytes([b'P', b'M', b'X', 0xa0]);
/// Length of the PMX header info block.
const PMX_INFO_LENGTH: u8 = 8;

/// Model sub-format, discriminated by signature and version.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormatType {
    Pmd1_0,
    Pmx2_0,
    Pmx2_1,
}

impl FormatType {
    /// Version float as stored in the file.
    pub fn version(self) -> f32 {
        match self {
            Self::Pmd1_0 => 1.0,
            Self::Pmx2_0 => 2.0,
            Self::Pmx2_1 => 2.1,
        }
    }
}

/// Language selector for the bilingual name/comment fields.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LanguageType {
    Japanese,
    English,
}

/// PMX header info block: text codec, additional-UV channel count and
/// the byte width of every index kind used by the tables.
#[derive(Clone, Copy, Debug)]
pub(crate) struct ModelInfo {
    pub codec_kind: CodecKind,
    pub additional_uv_size: u8,
    pub vertex_index_size: usize,
    pub texture_index_size: usize,
    pub material_index_size: usize,
    pub bone_index_size: usize,
    pub morph_index_size: usize,
    pub rigid_body_index_size: usize,
}

impl Default for ModelInfo {
    fn default() -> Self {
        Self {
            codec_kind: CodecKind::Utf16,
            additional_uv_size: 0,
            vertex_index_size: 4,
            texture_index_size: 4,
            material_index_size: 4,
            bone_index_size: 4,
            morph_index_size: 4,
            rigid_body_index_size: 4,
        }
    }
}

/// Shared state for the PMX table readers.
pub(crate) struct PmxReadContext<'a> {
    pub info: ModelInfo,
    pub codec: &'a dyn StringCodec,
}

impl PmxReadContext<'_> {
    /// Read a length-prefixed string in the header codec.
    pub fn read_string(&self, buffer: &mut Buffer) -> Result<String> {
        let length = buffer.read_len()?;
        let bytes = buffer.read_bytes(length)?;
        self.codec.decode(&bytes, self.info.codec_kind)
    }
}

/// Shared state for the PMX table writers.
pub(crate) struct PmxWriteContext<'a> {
    pub info: ModelInfo,
    pub codec: &'a dyn StringCodec,
}

impl PmxWriteContext<'_> {
    /// Write a length-prefixed string in the header codec.
    pub fn write_string(
        &self,
        buffer: &mut crate::util::MutableBuffer,
        text: &str,
    ) -> Result<()> {
        let bytes = self.codec.encode(text, self.info.codec_kind)?;
        buffer.write_u32(bytes.len() as u32);
        buffer.write_byte_array(&bytes);
        Ok(())
    }
}

/// An immutable model graph.
///
/// The graph is arena-owned: every entity lives in one of the flat
/// tables below, and all cross-references are table indices validated at
/// load time. Editing goes through
/// [`MutableModel`](crate::mutable::MutableModel).
#[derive(Debug, Default)]
pub struct Model {
    pub(crate) format_type: Option<FormatType>,
    pub(crate) codec_kind: CodecKind,
    pub(crate) additional_uv_size: u8,
    pub(crate) name_ja: String,
    pub(crate) name_en: String,
    pub(crate) comment_ja: String,
    pub(crate) comment_en: String,
    pub(crate) vertices: Vec<Vertex>,
    pub(crate) vertex_indices: Vec<u32>,
    pub(crate) textures: Vec<Texture>,
    pub(crate) materials: Vec<Material>,
    pub(crate) bones: Vec<Bone>,
    /// Stand-alone IK constraints (PMD); PMX stores them inline on bones
    pub(crate) constraints: Vec<Constraint>,
    pub(crate) morphs: Vec<Morph>,
    pub(crate) labels: Vec<Label>,
    pub(crate) rigid_bodies: Vec<RigidBody>,
    pub(crate) joints: Vec<Joint>,
    pub(crate) soft_bodies: Vec<SoftBody>,
    /// Shared toon texture paths (PMD carries ten)
    pub(crate) toon_texture_paths: Vec<String>,
}

impl Model {
    /// Parse a model file, auto-detecting PMX first and falling back to
    /// PMD on a signature mismatch.
    pub fn load(buffer: &mut Buffer, codec: &dyn StringCodec) -> Result<Self> {
        let mut model = Model::default();
        match model.load_pmx(buffer, codec) {
            Err(Status::InvalidSignature) => {
                buffer.seek(0)?;
                model = Model::default();
                pmd::load(&mut model, buffer, codec)?;
            }
            other => other?,
        }
        model.validate_references()?;
        debug!(
            format = ?model.format_type,
            vertices = model.vertices.len(),
            bones = model.bones.len(),
            morphs = model.morphs.len(),
            "loaded model"
        );
        Ok(model)
    }

    fn load_pmx(&mut self, buffer: &mut Buffer, codec: &dyn StringCodec) -> Result<()> {
        let signature = buffer.read_u32()?;
        if signature != PMX_SIGNATURE && signature != PMX_SIGNATURE_ALT {
            return Err(Status::InvalidSignature);
        }
        let version = buffer.read_f32()?;
        self.format_type = Some(match (version * 10.0) as i32 {
            20 => FormatType::Pmx2_0,
            21 => FormatType::Pmx2_1,
            other => return Err(Status::UnsupportedVersion(other as u32)),
        });
        if buffer.read_u8()? != PMX_INFO_LENGTH {
            return Err(Status::InvalidSignature);
        }
        let codec_kind = match buffer.read_u8()? {
            0 => CodecKind::Utf16,
            1 => CodecKind::Utf8,
            _ => return Err(Status::InvalidSignature),
        };
        let additional_uv_size = buffer.read_u8()?;
        if additional_uv_size > 4 {
            return Err(Status::ModelVertexCorrupted);
        }
        let read_index_size = |buffer: &mut Buffer| -> Result<usize> {
            match buffer.read_u8()? {
                size @ (1 | 2 | 4) => Ok(size as usize),
                _ => Err(Status::InvalidSignature),
            }
        };
        let info = ModelInfo {
            codec_kind,
            additional_uv_size,
            vertex_index_size: read_index_size(buffer)?,
            texture_index_size: read_index_size(buffer)?,
            material_index_size: read_index_size(buffer)?,
            bone_index_size: read_index_size(buffer)?,
            morph_index_size: read_index_size(buffer)?,
            rigid_body_index_size: read_index_size(buffer)?,
        };
        self.codec_kind = codec_kind;
        self.additional_uv_size = additional_uv_size;
        let ctx = PmxReadContext { info, codec };
        self.name_ja = ctx.read_string(buffer)?;
        self.name_en = ctx.read_string(buffer)?;
        self.comment_ja = ctx.read_string(buffer)?;
        self.comment_en = ctx.read_string(buffer)?;
        self.parse_pmx_tables(&ctx, buffer)?;
        if buffer.is_end() {
            Ok(())
        } else {
            Err(Status::BufferNotEnd)
        }
    }

    fn parse_pmx_tables(&mut self, ctx: &PmxReadContext, buffer: &mut Buffer) -> Result<()> {
        let num_vertices = buffer.read_len()?;
        self.vertices.reserve(num_vertices);
        for _ in 0..num_vertices {
            self.vertices.push(Vertex::parse_pmx(ctx, buffer)?);
        }

        let num_vertex_indices = buffer.read_len()?;
        if (num_vertex_indices == 0 && !self.vertices.is_empty()) || num_vertex_indices % 3 != 0 {
            return Err(Status::ModelFaceCorrupted);
        }
        self.vertex_indices.reserve(num_vertex_indices);
        for _ in 0..num_vertex_indices {
            self.vertex_indices
                .push(buffer.read_integer(ctx.info.vertex_index_size)? as u32);
        }

        let num_textures = buffer.read_len()?;
        self.textures.reserve(num_textures);
        for _ in 0..num_textures {
            self.textures.push(Texture::parse_pmx(ctx, buffer)?);
        }

        let num_materials = buffer.read_len()?;
        self.materials.reserve(num_materials);
        for _ in 0..num_materials {
            self.materials.push(Material::parse_pmx(ctx, buffer)?);
        }

        let num_bones = buffer.read_len()?;
        self.bones.reserve(num_bones);
        for index in 0..num_bones {
            let mut bone = Bone::parse_pmx(ctx, buffer)?;
            if let Some(constraint) = bone.constraint.as_mut() {
                constraint.target_bone_index = index as i32;
            }
            self.bones.push(bone);
        }

        let num_morphs = buffer.read_len()?;
        self.morphs.reserve(num_morphs);
        for _ in 0..num_morphs {
            self.morphs.push(Morph::parse_pmx(ctx, buffer)?);
        }

        let num_labels = buffer.read_len()?;
        self.labels.reserve(num_labels);
        for _ in 0..num_labels {
            self.labels.push(Label::parse_pmx(ctx, buffer)?);
        }

        let num_rigid_bodies = buffer.read_len()?;
        self.rigid_bodies.reserve(num_rigid_bodies);
        for _ in 0..num_rigid_bodies {
            self.rigid_bodies.push(RigidBody::parse_pmx(ctx, buffer)?);
        }

        let num_joints = buffer.read_len()?;
        self.joints.reserve(num_joints);
        for _ in 0..num_joints {
            self.joints.push(Joint::parse_pmx(ctx, buffer)?);
        }

        if self.format_type == Some(FormatType::Pmx2_1) && !buffer.is_end() {
            let num_soft_bodies = buffer.read_len()?;
            self.soft_bodies.reserve(num_soft_bodies);
            for _ in 0..num_soft_bodies {
                self.soft_bodies.push(SoftBody::parse_pmx(ctx, buffer)?);
            }
        }
        Ok(())
    }

    /// Validate every cross-reference against its target table.
    ///
    /// Runs after all tables are read so forward references (a bone whose
    /// parent appears later in the table) resolve correctly.
    fn validate_references(&self) -> Result<()> {
        let num_vertices = self.vertices.len() as i32;
        let num_textures = self.textures.len() as i32;
        let num_bones = self.bones.len() as i32;
        let num_morphs = self.morphs.len() as i32;
        let num_materials = self.materials.len() as i32;
        let num_rigid_bodies = self.rigid_bodies.len() as i32;

        let check = |index: i32, count: i32, status: Status| {
            if index >= -1 && index < count {
                Ok(())
            } else {
                Err(status)
            }
        };

        for vertex in &self.vertices {
            for slot in 0..vertex.vertex_type.num_bone_weights() {
                check(
                    vertex.bone_indices[slot],
                    num_bones,
                    Status::ModelVertexCorrupted,
                )?;
            }
        }
        for &vertex_index in &self.vertex_indices {
            if vertex_index as i32 >= num_vertices {
                return Err(Status::ModelFaceCorrupted);
            }
        }
        let indexed: usize = self.materials.iter().map(|m| m.num_vertex_indices).sum();
        if !self.materials.is_empty() && indexed != self.vertex_indices.len() {
            return Err(Status::ModelMaterialCorrupted);
        }
        for material in &self.materials {
            check(
                material.diffuse_texture_index,
                num_textures,
                Status::ModelMaterialCorrupted,
            )?;
            check(
                material.sphere_map_texture_index,
                num_textures,
                Status::ModelMaterialCorrupted,
            )?;
            if !material.is_toon_shared {
                check(
                    material.toon_texture_index,
                    num_textures,
                    Status::ModelMaterialCorrupted,
                )?;
            }
        }
        for bone in &self.bones {
            check(bone.parent_bone_index, num_bones, Status::ModelBoneCorrupted)?;
            check(
                bone.parent_inherent_bone_index,
                num_bones,
                Status::ModelBoneCorrupted,
            )?;
            check(bone.target_bone_index, num_bones, Status::ModelBoneCorrupted)?;
            if let Some(constraint) = &bone.constraint {
                self.validate_constraint(constraint, num_bones)?;
            }
        }
        for constraint in &self.constraints {
            self.validate_constraint(constraint, num_bones)?;
        }
        for morph in &self.morphs {
            match &morph.units {
                MorphUnits::Groups(items) => {
                    for item in items {
                        check(item.morph_index, num_morphs, Status::ModelMorphCorrupted)?;
                    }
                }
                MorphUnits::Vertices(items) => {
                    for item in items {
                        check(item.vertex_index, num_vertices, Status::ModelMorphCorrupted)?;
                    }
                }
                MorphUnits::Bones(items) => {
                    for item in items {
                        check(item.bone_index, num_bones, Status::ModelMorphCorrupted)?;
                    }
                }
                MorphUnits::Uvs(items) => {
                    for item in items {
                        check(item.vertex_index, num_vertices, Status::ModelMorphCorrupted)?;
                    }
                }
                MorphUnits::Materials(items) => {
                    for item in items {
                        check(item.material_index, num_materials, Status::ModelMorphCorrupted)?;
                    }
                }
                MorphUnits::Flips(items) => {
                    for item in items {
                        check(item.morph_index, num_morphs, Status::ModelMorphCorrupted)?;
                    }
                }
                MorphUnits::Impulses(items) => {
                    for item in items {
                        check(
                            item.rigid_body_index,
                            num_rigid_bodies,
                            Status::ModelMorphCorrupted,
                        )?;
                    }
                }
            }
        }
        for label in &self.labels {
            for item in &label.items {
                match item {
                    LabelItem::Bone(index) => {
                        check(*index, num_bones, Status::ModelLabelCorrupted)?
                    }
                    LabelItem::Morph(index) => {
                        check(*index, num_morphs, Status::ModelLabelCorrupted)?
                    }
                }
            }
        }
        for rigid_body in &self.rigid_bodies {
            check(
                rigid_body.bone_index,
                num_bones,
                Status::ModelRigidBodyCorrupted,
            )?;
        }
        for joint in &self.joints {
            check(
                joint.rigid_body_a_index,
                num_rigid_bodies,
                Status::ModelJointCorrupted,
            )?;
            check(
                joint.rigid_body_b_index,
                num_rigid_bodies,
                Status::ModelJointCorrupted,
            )?;
        }
        for soft_body in &self.soft_bodies {
            check(
                soft_body.material_index,
                num_materials,
                Status::ModelSoftBodyCorrupted,
            )?;
            for anchor in &soft_body.anchors {
                check(
                    anchor.rigid_body_index,
                    num_rigid_bodies,
                    Status::ModelSoftBodyCorrupted,
                )?;
                check(
                    anchor.vertex_index,
                    num_vertices,
                    Status::ModelSoftBodyCorrupted,
                )?;
            }
            for &pin in &soft_body.pinned_vertex_indices {
                if pin as i32 >= num_vertices {
                    return Err(Status::ModelSoftBodyCorrupted);
                }
            }
        }
        Ok(())
    }

    fn validate_constraint(&self, constraint: &Constraint, num_bones: i32) -> Result<()> {
        let in_range = |index: i32| index >= -1 && index < num_bones;
        if !in_range(constraint.effector_bone_index) || !in_range(constraint.target_bone_index) {
            return Err(Status::ModelConstraintCorrupted);
        }
        for joint in &constraint.joints {
            if !in_range(joint.bone_index) {
                return Err(Status::ModelConstraintCorrupted);
            }
        }
        Ok(())
    }

    // -- Accessors ---------------------------------------------------------

    pub fn format_type(&self) -> Option<FormatType> {
        self.format_type
    }

    pub fn codec_kind(&self) -> CodecKind {
        self.codec_kind
    }

    pub fn additional_uv_size(&self) -> usize {
        self.additional_uv_size as usize
    }

    pub fn name(&self, language: LanguageType) -> &str {
        match language {
            LanguageType::Japanese => &self.name_ja,
            LanguageType::English => &self.name_en,
        }
    }

    pub fn comment(&self, language: LanguageType) -> &str {
        match language {
            LanguageType::Japanese => &self.comment_ja,
            LanguageType::English => &self.comment_en,
        }
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn vertex_indices(&self) -> &[u32] {
        &self.vertex_indices
    }

    pub fn textures(&self) -> &[Texture] {
        &self.textures
    }

    pub fn materials(&self) -> &[Material] {
        &self.materials
    }

    pub fn bones(&self) -> &[Bone] {
        &self.bones
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn morphs(&self) -> &[Morph] {
        &self.morphs
    }

    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    pub fn rigid_bodies(&self) -> &[RigidBody] {
        &self.rigid_bodies
    }

    pub fn joints(&self) -> &[Joint] {
        &self.joints
    }

    pub fn soft_bodies(&self) -> &[SoftBody] {
        &self.soft_bodies
    }

    pub fn toon_texture_paths(&self) -> &[String] {
        &self.toon_texture_paths
    }

    /// Resolve a bone reference; -1 and out-of-range yield `None`.
    pub fn bone(&self, index: i32) -> Option<&Bone> {
        usize::try_from(index).ok().and_then(|i| self.bones.get(i))
    }

    pub fn texture(&self, index: i32) -> Option<&Texture> {
        usize::try_from(index).ok().and_then(|i| self.textures.get(i))
    }

    pub fn material(&self, index: i32) -> Option<&Material> {
        usize::try_from(index).ok().and_then(|i| self.materials.get(i))
    }

    pub fn morph(&self, index: i32) -> Option<&Morph> {
        usize::try_from(index).ok().and_then(|i| self.morphs.get(i))
    }

    pub fn rigid_body(&self, index: i32) -> Option<&RigidBody> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.rigid_bodies.get(i))
    }

    /// Walk a bone's parent chain, starting at the bone itself.
    ///
    /// The walk is capped at `bones().len()` steps: the source formats do
    /// not forbid parent cycles, so an unbounded walk could spin forever.
    pub fn bone_ancestors(&self, index: i32) -> BoneAncestors<'_> {
        BoneAncestors {
            model: self,
            current: index,
            remaining: self.bones.len(),
        }
    }
}

/// Iterator over a bone parent chain; see [`Model::bone_ancestors`].
pub struct BoneAncestors<'a> {
    model: &'a Model,
    current: i32,
    remaining: usize,
}

impl<'a> Iterator for BoneAncestors<'a> {
    type Item = &'a Bone;

    fn next(&mut self) -> Option<&'a Bone> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let bone = self.model.bone(self.current)?;
        self.current = bone.parent_bone_index;
        Some(bone)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::StringFactory;

    #[test]
    fn test_unknown_signature_is_rejected() {
        let factory = StringFactory::new();
        let mut buffer = Buffer::new(b"NOPE\x00\x00\x00\x00".to_vec());
        assert_eq!(
            Model::load(&mut buffer, &factory).unwrap_err(),
            Status::InvalidSignature
        );
    }

    #[test]
    fn test_pmx_with_unsupported_version_is_rejected() {
        let factory = StringFactory::new();
        let mut bytes = b"PMX ".to_vec();
        bytes.extend_from_slice(&3.0f32.to_le_bytes());
        bytes.push(8);
        let mut buffer = Buffer::new(bytes);
        assert_eq!(
            Model::load(&mut buffer, &factory).unwrap_err(),
            Status::UnsupportedVersion(30)
        );
    }

    #[test]
    fn test_truncated_pmx_header_reports_buffer_end() {
        let factory = StringFactory::new();
        let mut bytes = b"PMX ".to_vec();
        bytes.extend_from_slice(&2.0f32.to_le_bytes());
        let mut buffer = Buffer::new(bytes);
        assert_eq!(
            Model::load(&mut buffer, &factory).unwrap_err(),
            Status::BufferEnd
        );
    }

    #[test]
    fn test_bone_ancestors_terminates_on_cycle() {
        let mut model = Model::default();
        model.bones.push(Bone {
            parent_bone_index: 1,
            ..Default::default()
        });
        model.bones.push(Bone {
            parent_bone_index: 0,
            ..Default::default()
        });
        // 2 bones, cyclic chain: the walk must stop after num_bones steps
        assert_eq!(model.bone_ancestors(0).count(), 2);
    }
}
