//! Model vertex records.

use glam::{Vec2, Vec3, Vec4};

use crate::util::{Buffer, MutableBuffer, Result, Status};

use super::{PmxReadContext, PmxWriteContext};

/// Vertex-to-bone weighting scheme. Determines how many (bone, weight)
/// pairs and auxiliary vectors a vertex record carries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VertexType {
    /// Single bone, implicit weight 1.0
    Bdef1,
    /// Two bones, one stored weight
    Bdef2,
    /// Four bones, four stored weights
    Bdef4,
    /// Spherical blend: two bones plus C/R0/R1 vectors
    Sdef,
    /// Quaternion (dual-quaternion) blend, four bones
    Qdef,
}

impl VertexType {
    pub(super) fn from_raw(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Bdef1),
            1 => Some(Self::Bdef2),
            2 => Some(Self::Bdef4),
            3 => Some(Self::Sdef),
            4 => Some(Self::Qdef),
            _ => None,
        }
    }

    pub(super) fn to_raw(self) -> u8 {
        match self {
            Self::Bdef1 => 0,
            Self::Bdef2 => 1,
            Self::Bdef4 => 2,
            Self::Sdef => 3,
            Self::Qdef => 4,
        }
    }

    /// Number of (bone, weight) pairs carried by this scheme.
    pub fn num_bone_weights(self) -> usize {
        match self {
            Self::Bdef1 => 1,
            Self::Bdef2 | Self::Sdef => 2,
            Self::Bdef4 | Self::Qdef => 4,
        }
    }
}

/// A single skinned vertex.
#[derive(Clone, Debug)]
pub struct Vertex {
    pub origin: Vec3,
    pub normal: Vec3,
    pub uv: Vec2,
    /// Up to four extra UV channels, count fixed by the model header
    pub additional_uv: [Vec4; 4],
    pub vertex_type: VertexType,
    /// Bone references, -1 for unused slots
    pub bone_indices: [i32; 4],
    pub bone_weights: Vec4,
    /// Spherical-blend center, only meaningful for [`VertexType::Sdef`]
    pub sdef_c: Vec3,
    pub sdef_r0: Vec3,
    pub sdef_r1: Vec3,
    pub edge_size: f32,
}

impl Default for Vertex {
    fn default() -> Self {
        Self {
            origin: Vec3::ZERO,
            normal: Vec3::ZERO,
            uv: Vec2::ZERO,
            additional_uv: [Vec4::ZERO; 4],
            vertex_type: VertexType::Bdef1,
            bone_indices: [-1; 4],
            bone_weights: Vec4::ZERO,
            sdef_c: Vec3::ZERO,
            sdef_r0: Vec3::ZERO,
            sdef_r1: Vec3::ZERO,
            edge_size: 1.0,
        }
    }
}

impl Vertex {
    pub(super) fn parse_pmx(ctx: &PmxReadContext, buffer: &mut Buffer) -> Result<Self> {
        let mut vertex = Vertex {
            origin: buffer.read_f32x3()?,
            normal: buffer.read_f32x3()?,
            uv: buffer.read_f32x2()?,
            ..Default::default()
        };
        for channel in 0..ctx.info.additional_uv_size as usize {
            vertex.additional_uv[channel] = buffer.read_f32x4()?;
        }
        vertex.vertex_type = VertexType::from_raw(buffer.read_u8()?)
            .ok_or(Status::ModelVertexCorrupted)?;
        let size = ctx.info.bone_index_size;
        match vertex.vertex_type {
            VertexType::Bdef1 => {
                vertex.bone_indices[0] = buffer.read_integer_nullable(size)?;
                vertex.bone_weights.x = 1.0;
            }
            VertexType::Bdef2 => {
                vertex.bone_indices[0] = buffer.read_integer_nullable(size)?;
                vertex.bone_indices[1] = buffer.read_integer_nullable(size)?;
                vertex.bone_weights.x = buffer.read_f32_clamped()?;
                vertex.bone_weights.y = 1.0 - vertex.bone_weights.x;
            }
            VertexType::Bdef4 | VertexType::Qdef => {
                for slot in 0..4 {
                    vertex.bone_indices[slot] = buffer.read_integer_nullable(size)?;
                }
                vertex.bone_weights = buffer.read_f32x4()?;
            }
            VertexType::Sdef => {
                vertex.bone_indices[0] = buffer.read_integer_nullable(size)?;
                vertex.bone_indices[1] = buffer.read_integer_nullable(size)?;
                vertex.bone_weights.x = buffer.read_f32_clamped()?;
                vertex.bone_weights.y = 1.0 - vertex.bone_weights.x;
                vertex.sdef_c = buffer.read_f32x3()?;
                vertex.sdef_r0 = buffer.read_f32x3()?;
                vertex.sdef_r1 = buffer.read_f32x3()?;
            }
        }
        vertex.edge_size = buffer.read_f32()?;
        Ok(vertex)
    }

    pub(super) fn write_pmx(&self, ctx: &PmxWriteContext, buffer: &mut MutableBuffer) {
        buffer.write_f32x3(self.origin);
        buffer.write_f32x3(self.normal);
        buffer.write_f32x2(self.uv);
        for channel in 0..ctx.info.additional_uv_size as usize {
            buffer.write_f32x4(self.additional_uv[channel]);
        }
        buffer.write_u8(self.vertex_type.to_raw());
        let size = ctx.info.bone_index_size;
        match self.vertex_type {
            VertexType::Bdef1 => {
                buffer.write_integer(self.bone_indices[0], size);
            }
            VertexType::Bdef2 => {
                buffer.write_integer(self.bone_indices[0], size);
                buffer.write_integer(self.bone_indices[1], size);
                buffer.write_f32(self.bone_weights.x);
            }
            VertexType::Bdef4 | VertexType::Qdef => {
                for slot in 0..4 {
                    buffer.write_integer(self.bone_indices[slot], size);
                }
                buffer.write_f32x4(self.bone_weights);
            }
            VertexType::Sdef => {
                buffer.write_integer(self.bone_indices[0], size);
                buffer.write_integer(self.bone_indices[1], size);
                buffer.write_f32(self.bone_weights.x);
                buffer.write_f32x3(self.sdef_c);
                buffer.write_f32x3(self.sdef_r0);
                buffer.write_f32x3(self.sdef_r1);
            }
        }
        buffer.write_f32(self.edge_size);
    }
}
