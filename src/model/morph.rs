//! Model morph records.
//!
//! A morph is a named, weight-scaled edit of other entities. The payload
//! is a typed union: each morph type carries its own delta-record list.

use glam::{Vec3, Vec4};

use crate::util::{Buffer, MutableBuffer, Result, Status};

use super::{PmxReadContext, PmxWriteContext};

/// UI grouping category for a morph.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MorphCategory {
    #[default]
    Base,
    Eyebrow,
    Eye,
    Lip,
    Other,
}

impl MorphCategory {
    pub(super) fn from_raw(value: u8) -> Self {
        match value {
            1 => Self::Eyebrow,
            2 => Self::Eye,
            3 => Self::Lip,
            4 => Self::Other,
            _ => Self::Base,
        }
    }

    pub(super) fn to_raw(self) -> u8 {
        match self {
            Self::Base => 0,
            Self::Eyebrow => 1,
            Self::Eye => 2,
            Self::Lip => 3,
            Self::Other => 4,
        }
    }
}

/// Discriminant of the morph payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MorphType {
    Group,
    Vertex,
    Bone,
    Texture,
    Uva1,
    Uva2,
    Uva3,
    Uva4,
    Material,
    Flip,
    Impulse,
}

impl MorphType {
    fn from_raw(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Group),
            1 => Some(Self::Vertex),
            2 => Some(Self::Bone),
            3 => Some(Self::Texture),
            4 => Some(Self::Uva1),
            5 => Some(Self::Uva2),
            6 => Some(Self::Uva3),
            7 => Some(Self::Uva4),
            8 => Some(Self::Material),
            9 => Some(Self::Flip),
            10 => Some(Self::Impulse),
            _ => None,
        }
    }

    fn to_raw(self) -> u8 {
        match self {
            Self::Group => 0,
            Self::Vertex => 1,
            Self::Bone => 2,
            Self::Texture => 3,
            Self::Uva1 => 4,
            Self::Uva2 => 5,
            Self::Uva3 => 6,
            Self::Uva4 => 7,
            Self::Material => 8,
            Self::Flip => 9,
            Self::Impulse => 10,
        }
    }
}

/// Activates another morph at a scaled weight.
#[derive(Clone, Debug, Default)]
pub struct GroupMorph {
    pub morph_index: i32,
    pub weight: f32,
}

/// Moves one vertex by an offset.
#[derive(Clone, Debug, Default)]
pub struct VertexMorph {
    pub vertex_index: i32,
    /// Raw index relative to the PMD base morph; -1 for PMX morphs
    pub relative_index: i32,
    pub position: Vec3,
}

/// Moves and rotates one bone.
#[derive(Clone, Debug, Default)]
pub struct BoneMorph {
    pub bone_index: i32,
    pub translation: Vec3,
    pub orientation: Vec3,
}

/// Shifts one vertex's UV (or additional UV channel).
#[derive(Clone, Debug, Default)]
pub struct UvMorph {
    pub vertex_index: i32,
    pub position: Vec4,
}

/// How a material morph combines with the base material.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MorphMaterialOperation {
    #[default]
    Multiply,
    Add,
}

/// Scales or offsets one material's colors and texture blends; a -1
/// material index targets every material.
#[derive(Clone, Debug, Default)]
pub struct MaterialMorph {
    pub material_index: i32,
    pub operation: MorphMaterialOperation,
    pub diffuse_color: Vec3,
    pub diffuse_opacity: f32,
    pub specular_color: Vec3,
    pub specular_power: f32,
    pub ambient_color: Vec3,
    pub edge_color: Vec3,
    pub edge_opacity: f32,
    pub edge_size: f32,
    pub diffuse_texture_blend: Vec4,
    pub sphere_map_texture_blend: Vec4,
    pub toon_texture_blend: Vec4,
}

/// Mirrors another morph's weight (one of the pair is active at a time).
#[derive(Clone, Debug, Default)]
pub struct FlipMorph {
    pub morph_index: i32,
    pub weight: f32,
}

/// Applies velocity/torque to a rigid body.
#[derive(Clone, Debug, Default)]
pub struct ImpulseMorph {
    pub rigid_body_index: i32,
    pub is_local: bool,
    pub velocity: Vec3,
    pub torque: Vec3,
}

/// Typed morph payload.
#[derive(Clone, Debug)]
pub enum MorphUnits {
    Groups(Vec<GroupMorph>),
    Vertices(Vec<VertexMorph>),
    Bones(Vec<BoneMorph>),
    Uvs(Vec<UvMorph>),
    Materials(Vec<MaterialMorph>),
    Flips(Vec<FlipMorph>),
    Impulses(Vec<ImpulseMorph>),
}

impl MorphUnits {
    /// Number of delta records in the payload.
    pub fn len(&self) -> usize {
        match self {
            Self::Groups(items) => items.len(),
            Self::Vertices(items) => items.len(),
            Self::Bones(items) => items.len(),
            Self::Uvs(items) => items.len(),
            Self::Materials(items) => items.len(),
            Self::Flips(items) => items.len(),
            Self::Impulses(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A named morph.
#[derive(Clone, Debug)]
pub struct Morph {
    pub name_ja: String,
    pub name_en: String,
    pub category: MorphCategory,
    pub morph_type: MorphType,
    pub units: MorphUnits,
}

impl Default for Morph {
    fn default() -> Self {
        Self {
            name_ja: String::new(),
            name_en: String::new(),
            category: MorphCategory::default(),
            morph_type: MorphType::Vertex,
            units: MorphUnits::Vertices(Vec::new()),
        }
    }
}

impl Morph {
    pub(super) fn parse_pmx(ctx: &PmxReadContext, buffer: &mut Buffer) -> Result<Self> {
        let name_ja = ctx.read_string(buffer)?;
        let name_en = ctx.read_string(buffer)?;
        let category = MorphCategory::from_raw(buffer.read_u8()?);
        let morph_type = MorphType::from_raw(buffer.read_u8()?)
            .ok_or(Status::ModelMorphCorrupted)?;
        let units = Self::parse_units(ctx, buffer, morph_type)?;
        Ok(Self {
            name_ja,
            name_en,
            category,
            morph_type,
            units,
        })
    }

    fn parse_units(
        ctx: &PmxReadContext,
        buffer: &mut Buffer,
        morph_type: MorphType,
    ) -> Result<MorphUnits> {
        let count = buffer.read_len()?;
        match morph_type {
            MorphType::Group => {
                let size = ctx.info.morph_index_size;
                let mut items = Vec::with_capacity(count);
                for _ in 0..count {
                    items.push(GroupMorph {
                        morph_index: buffer.read_integer_nullable(size)?,
                        weight: buffer.read_f32()?,
                    });
                }
                Ok(MorphUnits::Groups(items))
            }
            MorphType::Vertex => {
                let size = ctx.info.vertex_index_size;
                let mut items = Vec::with_capacity(count);
                for _ in 0..count {
                    items.push(VertexMorph {
                        vertex_index: buffer.read_integer(size)?,
                        relative_index: -1,
                        position: buffer.read_f32x3()?,
                    });
                }
                Ok(MorphUnits::Vertices(items))
            }
            MorphType::Bone => {
                let size = ctx.info.bone_index_size;
                let mut items = Vec::with_capacity(count);
                for _ in 0..count {
                    items.push(BoneMorph {
                        bone_index: buffer.read_integer_nullable(size)?,
                        translation: buffer.read_f32x3()?,
                        orientation: buffer.read_f32x3()?,
                    });
                }
                Ok(MorphUnits::Bones(items))
            }
            MorphType::Texture
            | MorphType::Uva1
            | MorphType::Uva2
            | MorphType::Uva3
            | MorphType::Uva4 => {
                let size = ctx.info.vertex_index_size;
                let mut items = Vec::with_capacity(count);
                for _ in 0..count {
                    items.push(UvMorph {
                        vertex_index: buffer.read_integer(size)?,
                        position: buffer.read_f32x4()?,
                    });
                }
                Ok(MorphUnits::Uvs(items))
            }
            MorphType::Material => {
                let size = ctx.info.material_index_size;
                let mut items = Vec::with_capacity(count);
                for _ in 0..count {
                    let material_index = buffer.read_integer_nullable(size)?;
                    let operation = match buffer.read_u8()? {
                        0 => MorphMaterialOperation::Multiply,
                        1 => MorphMaterialOperation::Add,
                        _ => return Err(Status::ModelMorphCorrupted),
                    };
                    items.push(MaterialMorph {
                        material_index,
                        operation,
                        diffuse_color: buffer.read_f32x3()?,
                        diffuse_opacity: buffer.read_f32()?,
                        specular_color: buffer.read_f32x3()?,
                        specular_power: buffer.read_f32()?,
                        ambient_color: buffer.read_f32x3()?,
                        edge_color: buffer.read_f32x3()?,
                        edge_opacity: buffer.read_f32()?,
                        edge_size: buffer.read_f32()?,
                        diffuse_texture_blend: buffer.read_f32x4()?,
                        sphere_map_texture_blend: buffer.read_f32x4()?,
                        toon_texture_blend: buffer.read_f32x4()?,
                    });
                }
                Ok(MorphUnits::Materials(items))
            }
            MorphType::Flip => {
                let size = ctx.info.morph_index_size;
                let mut items = Vec::with_capacity(count);
                for _ in 0..count {
                    items.push(FlipMorph {
                        morph_index: buffer.read_integer_nullable(size)?,
                        weight: buffer.read_f32()?,
                    });
                }
                Ok(MorphUnits::Flips(items))
            }
            MorphType::Impulse => {
                let size = ctx.info.rigid_body_index_size;
                let mut items = Vec::with_capacity(count);
                for _ in 0..count {
                    items.push(ImpulseMorph {
                        rigid_body_index: buffer.read_integer_nullable(size)?,
                        is_local: buffer.read_u8()? != 0,
                        velocity: buffer.read_f32x3()?,
                        torque: buffer.read_f32x3()?,
                    });
                }
                Ok(MorphUnits::Impulses(items))
            }
        }
    }

    pub(super) fn write_pmx(&self, ctx: &PmxWriteContext, buffer: &mut MutableBuffer) -> Result<()> {
        ctx.write_string(buffer, &self.name_ja)?;
        ctx.write_string(buffer, &self.name_en)?;
        buffer.write_u8(self.category.to_raw());
        buffer.write_u8(self.morph_type.to_raw());
        buffer.write_u32(self.units.len() as u32);
        match &self.units {
            MorphUnits::Groups(items) => {
                let size = ctx.info.morph_index_size;
                for item in items {
                    buffer.write_integer(item.morph_index, size);
                    buffer.write_f32(item.weight);
                }
            }
            MorphUnits::Vertices(items) => {
                let size = ctx.info.vertex_index_size;
                for item in items {
                    buffer.write_integer(item.vertex_index, size);
                    buffer.write_f32x3(item.position);
                }
            }
            MorphUnits::Bones(items) => {
                let size = ctx.info.bone_index_size;
                for item in items {
                    buffer.write_integer(item.bone_index, size);
                    buffer.write_f32x3(item.translation);
                    buffer.write_f32x3(item.orientation);
                }
            }
            MorphUnits::Uvs(items) => {
                let size = ctx.info.vertex_index_size;
                for item in items {
                    buffer.write_integer(item.vertex_index, size);
                    buffer.write_f32x4(item.position);
                }
            }
            MorphUnits::Materials(items) => {
                let size = ctx.info.material_index_size;
                for item in items {
                    buffer.write_integer(item.material_index, size);
                    buffer.write_u8(match item.operation {
                        MorphMaterialOperation::Multiply => 0,
                        MorphMaterialOperation::Add => 1,
                    });
                    buffer.write_f32x3(item.diffuse_color);
                    buffer.write_f32(item.diffuse_opacity);
                    buffer.write_f32x3(item.specular_color);
                    buffer.write_f32(item.specular_power);
                    buffer.write_f32x3(item.ambient_color);
                    buffer.write_f32x3(item.edge_color);
                    buffer.write_f32(item.edge_opacity);
                    buffer.write_f32(item.edge_size);
                    buffer.write_f32x4(item.diffuse_texture_blend);
                    buffer.write_f32x4(item.sphere_map_texture_blend);
                    buffer.write_f32x4(item.toon_texture_blend);
                }
            }
            MorphUnits::Flips(items) => {
                let size = ctx.info.morph_index_size;
                for item in items {
                    buffer.write_integer(item.morph_index, size);
                    buffer.write_f32(item.weight);
                }
            }
            MorphUnits::Impulses(items) => {
                let size = ctx.info.rigid_body_index_size;
                for item in items {
                    buffer.write_integer(item.rigid_body_index, size);
                    buffer.write_u8(item.is_local as u8);
                    buffer.write_f32x3(item.velocity);
                    buffer.write_f32x3(item.torque);
                }
            }
        }
        Ok(())
    }

    /// UV channel addressed by a texture/UVA morph, if any.
    pub fn uv_channel(&self) -> Option<usize> {
        match self.morph_type {
            MorphType::Texture => Some(0),
            MorphType::Uva1 => Some(1),
            MorphType::Uva2 => Some(2),
            MorphType::Uva3 => Some(3),
            MorphType::Uva4 => Some(4),
            _ => None,
        }
    }
}
