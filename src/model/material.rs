//! Model material records.

use glam::{Vec3, Vec4};

use crate::util::{Buffer, MutableBuffer, Result, Status};

use super::{PmxReadContext, PmxWriteContext};

/// Per-material draw flags, stored as one byte in PMX.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MaterialFlags {
    pub is_culling_disabled: bool,
    pub is_casting_shadow_enabled: bool,
    pub is_casting_shadow_map_enabled: bool,
    pub is_shadow_map_enabled: bool,
    pub is_edge_enabled: bool,
    pub is_vertex_color_enabled: bool,
    pub is_point_draw_enabled: bool,
    pub is_line_draw_enabled: bool,
}

impl MaterialFlags {
    pub(super) fn from_raw(value: u8) -> Self {
        Self {
            is_culling_disabled: value & 0x01 != 0,
            is_casting_shadow_enabled: value & 0x02 != 0,
            is_casting_shadow_map_enabled: value & 0x04 != 0,
            is_shadow_map_enabled: value & 0x08 != 0,
            is_edge_enabled: value & 0x10 != 0,
            is_vertex_color_enabled: value & 0x20 != 0,
            is_point_draw_enabled: value & 0x40 != 0,
            is_line_draw_enabled: value & 0x80 != 0,
        }
    }

    pub(super) fn to_raw(self) -> u8 {
        (self.is_culling_disabled as u8)
            | (self.is_casting_shadow_enabled as u8) << 1
            | (self.is_casting_shadow_map_enabled as u8) << 2
            | (self.is_shadow_map_enabled as u8) << 3
            | (self.is_edge_enabled as u8) << 4
            | (self.is_vertex_color_enabled as u8) << 5
            | (self.is_point_draw_enabled as u8) << 6
            | (self.is_line_draw_enabled as u8) << 7
    }
}

/// How the sphere-map texture combines with the diffuse texture.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SphereMapTextureType {
    #[default]
    None,
    Multiply,
    Add,
    SubTexture,
}

impl SphereMapTextureType {
    fn from_raw(value: u8) -> Option<Self> {
        match value {
            // Some writers emit 0xff for "none"
            0 | 0xff => Some(Self::None),
            1 => Some(Self::Multiply),
            2 => Some(Self::Add),
            3 => Some(Self::SubTexture),
            _ => None,
        }
    }

    fn to_raw(self) -> u8 {
        match self {
            Self::None => 0,
            Self::Multiply => 1,
            Self::Add => 2,
            Self::SubTexture => 3,
        }
    }
}

/// A material: colors, texture references and the length of its run in
/// the shared vertex-index buffer.
#[derive(Clone, Debug)]
pub struct Material {
    pub name_ja: String,
    pub name_en: String,
    pub diffuse_color: Vec3,
    pub diffuse_opacity: f32,
    pub specular_color: Vec3,
    pub specular_power: f32,
    pub ambient_color: Vec3,
    pub flags: MaterialFlags,
    pub edge_color: Vec3,
    pub edge_opacity: f32,
    pub edge_size: f32,
    /// Texture references, -1 for none
    pub diffuse_texture_index: i32,
    pub sphere_map_texture_index: i32,
    pub sphere_map_texture_type: SphereMapTextureType,
    /// When set, `toon_texture_index` selects one of the ten shared toon
    /// textures instead of a model texture
    pub is_toon_shared: bool,
    pub toon_texture_index: i32,
    /// Free-form memo string carried by PMX
    pub clob: String,
    /// Length of this material's run in the shared vertex-index buffer
    pub num_vertex_indices: usize,
    /// Per-texture blend factors applied by material morphs
    pub diffuse_texture_blend: Vec4,
    pub sphere_map_texture_blend: Vec4,
    pub toon_texture_blend: Vec4,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name_ja: String::new(),
            name_en: String::new(),
            diffuse_color: Vec3::ONE,
            diffuse_opacity: 1.0,
            specular_color: Vec3::ZERO,
            specular_power: 0.0,
            ambient_color: Vec3::ZERO,
            flags: MaterialFlags::default(),
            edge_color: Vec3::ZERO,
            edge_opacity: 1.0,
            edge_size: 1.0,
            diffuse_texture_index: -1,
            sphere_map_texture_index: -1,
            sphere_map_texture_type: SphereMapTextureType::None,
            is_toon_shared: false,
            toon_texture_index: -1,
            clob: String::new(),
            num_vertex_indices: 0,
            diffuse_texture_blend: Vec4::ONE,
            sphere_map_texture_blend: Vec4::ONE,
            toon_texture_blend: Vec4::ONE,
        }
    }
}

impl Material {
    pub(super) fn parse_pmx(ctx: &PmxReadContext, buffer: &mut Buffer) -> Result<Self> {
        let texture_index_size = ctx.info.texture_index_size;
        let mut material = Material {
            name_ja: ctx.read_string(buffer)?,
            name_en: ctx.read_string(buffer)?,
            diffuse_color: buffer.read_f32x3()?,
            diffuse_opacity: buffer.read_f32()?,
            specular_color: buffer.read_f32x3()?,
            specular_power: buffer.read_f32()?,
            ambient_color: buffer.read_f32x3()?,
            flags: MaterialFlags::from_raw(buffer.read_u8()?),
            edge_color: buffer.read_f32x3()?,
            edge_opacity: buffer.read_f32()?,
            edge_size: buffer.read_f32()?,
            diffuse_texture_index: buffer.read_integer_nullable(texture_index_size)?,
            sphere_map_texture_index: buffer.read_integer_nullable(texture_index_size)?,
            ..Default::default()
        };
        material.sphere_map_texture_type = SphereMapTextureType::from_raw(buffer.read_u8()?)
            .ok_or(Status::ModelMaterialCorrupted)?;
        material.is_toon_shared = buffer.read_u8()? != 0;
        material.toon_texture_index = if material.is_toon_shared {
            buffer.read_u8()? as i32
        } else {
            buffer.read_integer_nullable(texture_index_size)?
        };
        material.clob = ctx.read_string(buffer)?;
        material.num_vertex_indices = buffer.read_i32()? as usize;
        Ok(material)
    }

    pub(super) fn write_pmx(&self, ctx: &PmxWriteContext, buffer: &mut MutableBuffer) -> Result<()> {
        let texture_index_size = ctx.info.texture_index_size;
        ctx.write_string(buffer, &self.name_ja)?;
        ctx.write_string(buffer, &self.name_en)?;
        buffer.write_f32x3(self.diffuse_color);
        buffer.write_f32(self.diffuse_opacity);
        buffer.write_f32x3(self.specular_color);
        buffer.write_f32(self.specular_power);
        buffer.write_f32x3(self.ambient_color);
        buffer.write_u8(self.flags.to_raw());
        buffer.write_f32x3(self.edge_color);
        buffer.write_f32(self.edge_opacity);
        buffer.write_f32(self.edge_size);
        buffer.write_integer(self.diffuse_texture_index, texture_index_size);
        buffer.write_integer(self.sphere_map_texture_index, texture_index_size);
        buffer.write_u8(self.sphere_map_texture_type.to_raw());
        buffer.write_u8(self.is_toon_shared as u8);
        if self.is_toon_shared {
            buffer.write_u8(self.toon_texture_index as u8);
        } else {
            buffer.write_integer(self.toon_texture_index, texture_index_size);
        }
        ctx.write_string(buffer, &self.clob)?;
        buffer.write_i32(self.num_vertex_indices as i32);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_material_flags_roundtrip() {
        for raw in [0x00u8, 0x01, 0x13, 0x80, 0xff] {
            assert_eq!(MaterialFlags::from_raw(raw).to_raw(), raw);
        }
    }

    #[test]
    fn test_sphere_map_type_none_alias() {
        assert_eq!(
            SphereMapTextureType::from_raw(0xff),
            Some(SphereMapTextureType::None)
        );
        assert_eq!(SphereMapTextureType::from_raw(9), None);
    }
}
