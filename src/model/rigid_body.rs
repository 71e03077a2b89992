//! Rigid-body physics descriptors.

use glam::Vec3;

use crate::util::{Buffer, MutableBuffer, Result, Status};

use super::{PmxReadContext, PmxWriteContext};

/// Collision shape of a rigid body.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RigidBodyShapeType {
    #[default]
    Sphere,
    Box,
    Capsule,
}

impl RigidBodyShapeType {
    pub(super) fn from_raw(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Sphere),
            1 => Some(Self::Box),
            2 => Some(Self::Capsule),
            _ => None,
        }
    }

    pub(super) fn to_raw(self) -> u8 {
        match self {
            Self::Sphere => 0,
            Self::Box => 1,
            Self::Capsule => 2,
        }
    }
}

/// How the simulation result couples back to the bound bone.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RigidBodyTransformType {
    /// Kinematic: the bone drives the body
    #[default]
    FromBoneToSimulation,
    /// Dynamic: the body drives the bone
    FromSimulationToBone,
    /// Dynamic position, bone-driven orientation
    FromBoneOrientationAndSimulationToBone,
}

impl RigidBodyTransformType {
    pub(super) fn from_raw(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::FromBoneToSimulation),
            1 => Some(Self::FromSimulationToBone),
            2 => Some(Self::FromBoneOrientationAndSimulationToBone),
            _ => None,
        }
    }

    pub(super) fn to_raw(self) -> u8 {
        match self {
            Self::FromBoneToSimulation => 0,
            Self::FromSimulationToBone => 1,
            Self::FromBoneOrientationAndSimulationToBone => 2,
        }
    }
}

/// A rigid body bound to a bone.
#[derive(Clone, Debug)]
pub struct RigidBody {
    pub name_ja: String,
    pub name_en: String,
    pub bone_index: i32,
    pub collision_group_id: i32,
    pub collision_mask: i32,
    pub shape_type: RigidBodyShapeType,
    pub size: Vec3,
    pub origin: Vec3,
    pub orientation: Vec3,
    pub mass: f32,
    pub linear_damping: f32,
    pub angular_damping: f32,
    pub restitution: f32,
    pub friction: f32,
    pub transform_type: RigidBodyTransformType,
    /// PMD stores the origin relative to the bound bone
    pub is_bone_relative: bool,
}

impl Default for RigidBody {
    fn default() -> Self {
        Self {
            name_ja: String::new(),
            name_en: String::new(),
            bone_index: -1,
            collision_group_id: 0,
            collision_mask: 0,
            shape_type: RigidBodyShapeType::default(),
            size: Vec3::ZERO,
            origin: Vec3::ZERO,
            orientation: Vec3::ZERO,
            mass: 0.0,
            linear_damping: 0.0,
            angular_damping: 0.0,
            restitution: 0.0,
            friction: 0.0,
            transform_type: RigidBodyTransformType::default(),
            is_bone_relative: false,
        }
    }
}

impl RigidBody {
    pub(super) fn parse_pmx(ctx: &PmxReadContext, buffer: &mut Buffer) -> Result<Self> {
        Ok(Self {
            name_ja: ctx.read_string(buffer)?,
            name_en: ctx.read_string(buffer)?,
            bone_index: buffer.read_integer_nullable(ctx.info.bone_index_size)?,
            collision_group_id: buffer.read_u8()? as i32,
            collision_mask: buffer.read_i16()? as i32,
            shape_type: RigidBodyShapeType::from_raw(buffer.read_u8()?)
                .ok_or(Status::ModelRigidBodyCorrupted)?,
            size: buffer.read_f32x3()?,
            origin: buffer.read_f32x3()?,
            orientation: buffer.read_f32x3()?,
            mass: buffer.read_f32()?,
            linear_damping: buffer.read_f32()?,
            angular_damping: buffer.read_f32()?,
            restitution: buffer.read_f32()?,
            friction: buffer.read_f32()?,
            transform_type: RigidBodyTransformType::from_raw(buffer.read_u8()?)
                .ok_or(Status::ModelRigidBodyCorrupted)?,
            is_bone_relative: false,
        })
    }

    pub(super) fn write_pmx(&self, ctx: &PmxWriteContext, buffer: &mut MutableBuffer) -> Result<()> {
        ctx.write_string(buffer, &self.name_ja)?;
        ctx.write_string(buffer, &self.name_en)?;
        buffer.write_integer(self.bone_index, ctx.info.bone_index_size);
        buffer.write_u8(self.collision_group_id as u8);
        buffer.write_i16(self.collision_mask as i16);
        buffer.write_u8(self.shape_type.to_raw());
        buffer.write_f32x3(self.size);
        buffer.write_f32x3(self.origin);
        buffer.write_f32x3(self.orientation);
        buffer.write_f32(self.mass);
        buffer.write_f32(self.linear_damping);
        buffer.write_f32(self.angular_damping);
        buffer.write_f32(self.restitution);
        buffer.write_f32(self.friction);
        buffer.write_u8(self.transform_type.to_raw());
        Ok(())
    }
}
