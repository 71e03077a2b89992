//! Model bone records and IK constraints.

use glam::Vec3;
use smallvec::SmallVec;

use crate::util::{Buffer, MutableBuffer, Result};

use super::{PmxReadContext, PmxWriteContext};

/// PMX bone flag word.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BoneFlags {
    /// When set, the bone's destination is another bone; otherwise it is
    /// a fixed offset from the origin
    pub has_destination_bone_index: bool,
    pub is_rotatable: bool,
    pub is_movable: bool,
    pub is_visible: bool,
    pub is_user_handleable: bool,
    pub has_constraint: bool,
    pub has_local_inherent: bool,
    pub has_inherent_orientation: bool,
    pub has_inherent_translation: bool,
    pub has_fixed_axis: bool,
    pub has_local_axes: bool,
    pub is_affected_by_physics_simulation: bool,
    pub has_external_parent_bone: bool,
}

impl BoneFlags {
    pub(super) fn from_raw(value: u16) -> Self {
        Self {
            has_destination_bone_index: value & 0x0001 != 0,
            is_rotatable: value & 0x0002 != 0,
            is_movable: value & 0x0004 != 0,
            is_visible: value & 0x0008 != 0,
            is_user_handleable: value & 0x0010 != 0,
            has_constraint: value & 0x0020 != 0,
            has_local_inherent: value & 0x0080 != 0,
            has_inherent_orientation: value & 0x0100 != 0,
            has_inherent_translation: value & 0x0200 != 0,
            has_fixed_axis: value & 0x0400 != 0,
            has_local_axes: value & 0x0800 != 0,
            is_affected_by_physics_simulation: value & 0x1000 != 0,
            has_external_parent_bone: value & 0x2000 != 0,
        }
    }

    pub(super) fn to_raw(self) -> u16 {
        (self.has_destination_bone_index as u16)
            | (self.is_rotatable as u16) << 1
            | (self.is_movable as u16) << 2
            | (self.is_visible as u16) << 3
            | (self.is_user_handleable as u16) << 4
            | (self.has_constraint as u16) << 5
            | (self.has_local_inherent as u16) << 7
            | (self.has_inherent_orientation as u16) << 8
            | (self.has_inherent_translation as u16) << 9
            | (self.has_fixed_axis as u16) << 10
            | (self.has_local_axes as u16) << 11
            | (self.is_affected_by_physics_simulation as u16) << 12
            | (self.has_external_parent_bone as u16) << 13
    }
}

/// Legacy PMD bone classification byte, kept for PMD round-trips.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BoneType {
    #[default]
    Rotatable,
    RotatableAndMovable,
    ConstraintEffector,
    Unknown,
    ConstraintJoint,
    InherentOrientationJoint,
    ConstraintRoot,
    Invisible,
    FixedAxis,
    InherentOrientationEffector,
}

impl BoneType {
    pub(super) fn from_raw(value: u8) -> Self {
        match value {
            0 => Self::Rotatable,
            1 => Self::RotatableAndMovable,
            2 => Self::ConstraintEffector,
            4 => Self::ConstraintJoint,
            5 => Self::InherentOrientationJoint,
            6 => Self::ConstraintRoot,
            7 => Self::Invisible,
            8 => Self::FixedAxis,
            9 => Self::InherentOrientationEffector,
            _ => Self::Unknown,
        }
    }

    pub(super) fn to_raw(self) -> u8 {
        match self {
            Self::Rotatable => 0,
            Self::RotatableAndMovable => 1,
            Self::ConstraintEffector => 2,
            Self::Unknown => 3,
            Self::ConstraintJoint => 4,
            Self::InherentOrientationJoint => 5,
            Self::ConstraintRoot => 6,
            Self::Invisible => 7,
            Self::FixedAxis => 8,
            Self::InherentOrientationEffector => 9,
        }
    }
}

/// One joint in an IK chain, with optional per-axis angle limits.
#[derive(Clone, Debug)]
pub struct ConstraintJoint {
    pub bone_index: i32,
    pub has_angle_limit: bool,
    pub lower_limit: Vec3,
    pub upper_limit: Vec3,
}

impl Default for ConstraintJoint {
    fn default() -> Self {
        Self {
            bone_index: -1,
            has_angle_limit: false,
            lower_limit: Vec3::ZERO,
            upper_limit: Vec3::ZERO,
        }
    }
}

/// An IK constraint: an effector chased by an ordered chain of joints.
#[derive(Clone, Debug)]
pub struct Constraint {
    /// Bone whose position the chain tries to reach
    pub effector_bone_index: i32,
    /// Bone owning this constraint; rewritten by the bone table reader
    pub target_bone_index: i32,
    pub num_iterations: i32,
    pub angle_limit: f32,
    pub joints: SmallVec<[ConstraintJoint; 4]>,
}

impl Default for Constraint {
    fn default() -> Self {
        Self {
            effector_bone_index: -1,
            target_bone_index: -1,
            num_iterations: 0,
            angle_limit: 0.0,
            joints: SmallVec::new(),
        }
    }
}

impl Constraint {
    pub(super) fn parse_pmx(ctx: &PmxReadContext, buffer: &mut Buffer) -> Result<Self> {
        let size = ctx.info.bone_index_size;
        let mut constraint = Constraint {
            effector_bone_index: buffer.read_integer_nullable(size)?,
            target_bone_index: -1,
            num_iterations: buffer.read_i32()?,
            angle_limit: buffer.read_f32()?,
            joints: SmallVec::new(),
        };
        let num_joints = buffer.read_len()?;
        for _ in 0..num_joints {
            let mut joint = ConstraintJoint {
                bone_index: buffer.read_integer_nullable(size)?,
                has_angle_limit: buffer.read_u8()? != 0,
                ..Default::default()
            };
            if joint.has_angle_limit {
                joint.lower_limit = buffer.read_f32x3()?;
                joint.upper_limit = buffer.read_f32x3()?;
            }
            constraint.joints.push(joint);
        }
        Ok(constraint)
    }

    pub(super) fn write_pmx(&self, ctx: &PmxWriteContext, buffer: &mut MutableBuffer) {
        let size = ctx.info.bone_index_size;
        buffer.write_integer(self.effector_bone_index, size);
        buffer.write_i32(self.num_iterations);
        buffer.write_f32(self.angle_limit);
        buffer.write_u32(self.joints.len() as u32);
        for joint in &self.joints {
            buffer.write_integer(joint.bone_index, size);
            buffer.write_u8(joint.has_angle_limit as u8);
            if joint.has_angle_limit {
                buffer.write_f32x3(joint.lower_limit);
                buffer.write_f32x3(joint.upper_limit);
            }
        }
    }
}

/// A skeleton bone.
///
/// All cross-references are indices into the owning model's bone table,
/// -1 for "none". The parent and inherent-parent chains are not
/// guaranteed acyclic by the source formats; traverse them through
/// [`Model::bone_ancestors`](super::Model::bone_ancestors), which bounds
/// the walk.
#[derive(Clone, Debug)]
pub struct Bone {
    pub name_ja: String,
    pub name_en: String,
    pub origin: Vec3,
    /// Destination when `flags.has_destination_bone_index` is clear
    pub destination_origin: Vec3,
    pub fixed_axis: Vec3,
    pub local_x_axis: Vec3,
    pub local_z_axis: Vec3,
    /// Scale applied to the inherited translation/orientation
    pub inherent_coefficient: f32,
    pub parent_bone_index: i32,
    pub parent_inherent_bone_index: i32,
    /// Destination bone when `flags.has_destination_bone_index` is set
    pub target_bone_index: i32,
    /// External-parent key, raw i32 from the file
    pub global_bone_index: i32,
    /// Deformation stage (evaluation layer)
    pub stage_index: i32,
    pub bone_type: BoneType,
    pub flags: BoneFlags,
    pub constraint: Option<Box<Constraint>>,
}

impl Default for Bone {
    fn default() -> Self {
        Self {
            name_ja: String::new(),
            name_en: String::new(),
            origin: Vec3::ZERO,
            destination_origin: Vec3::ZERO,
            fixed_axis: Vec3::ZERO,
            local_x_axis: Vec3::X,
            local_z_axis: Vec3::Z,
            inherent_coefficient: 1.0,
            parent_bone_index: -1,
            parent_inherent_bone_index: -1,
            target_bone_index: -1,
            global_bone_index: -1,
            stage_index: 0,
            bone_type: BoneType::default(),
            flags: BoneFlags::default(),
            constraint: None,
        }
    }
}

impl Bone {
    pub(super) fn parse_pmx(ctx: &PmxReadContext, buffer: &mut Buffer) -> Result<Self> {
        let size = ctx.info.bone_index_size;
        let mut bone = Bone {
            name_ja: ctx.read_string(buffer)?,
            name_en: ctx.read_string(buffer)?,
            origin: buffer.read_f32x3()?,
            ..Default::default()
        };
        bone.parent_bone_index = buffer.read_integer_nullable(size)?;
        bone.stage_index = buffer.read_i32()?;
        bone.flags = BoneFlags::from_raw(buffer.read_u16()?);
        if bone.flags.has_destination_bone_index {
            bone.target_bone_index = buffer.read_integer_nullable(size)?;
        } else {
            bone.destination_origin = buffer.read_f32x3()?;
        }
        if bone.flags.has_inherent_orientation || bone.flags.has_inherent_translation {
            bone.parent_inherent_bone_index = buffer.read_integer_nullable(size)?;
            bone.inherent_coefficient = buffer.read_f32()?;
        }
        if bone.flags.has_fixed_axis {
            bone.fixed_axis = buffer.read_f32x3()?;
        }
        if bone.flags.has_local_axes {
            bone.local_x_axis = buffer.read_f32x3()?;
            bone.local_z_axis = buffer.read_f32x3()?;
        }
        if bone.flags.has_external_parent_bone {
            bone.global_bone_index = buffer.read_i32()?;
        }
        if bone.flags.has_constraint {
            bone.constraint = Some(Box::new(Constraint::parse_pmx(ctx, buffer)?));
        }
        Ok(bone)
    }

    pub(super) fn write_pmx(&self, ctx: &PmxWriteContext, buffer: &mut MutableBuffer) -> Result<()> {
        let size = ctx.info.bone_index_size;
        ctx.write_string(buffer, &self.name_ja)?;
        ctx.write_string(buffer, &self.name_en)?;
        buffer.write_f32x3(self.origin);
        buffer.write_integer(self.parent_bone_index, size);
        buffer.write_i32(self.stage_index);
        buffer.write_u16(self.flags.to_raw());
        if self.flags.has_destination_bone_index {
            buffer.write_integer(self.target_bone_index, size);
        } else {
            buffer.write_f32x3(self.destination_origin);
        }
        if self.flags.has_inherent_orientation || self.flags.has_inherent_translation {
            buffer.write_integer(self.parent_inherent_bone_index, size);
            buffer.write_f32(self.inherent_coefficient);
        }
        if self.flags.has_fixed_axis {
            buffer.write_f32x3(self.fixed_axis);
        }
        if self.flags.has_local_axes {
            buffer.write_f32x3(self.local_x_axis);
            buffer.write_f32x3(self.local_z_axis);
        }
        if self.flags.has_external_parent_bone {
            buffer.write_i32(self.global_bone_index);
        }
        if self.flags.has_constraint {
            if let Some(constraint) = &self.constraint {
                constraint.write_pmx(ctx, buffer);
            } else {
                // Flag without a constraint: write an empty chain
                Constraint::default().write_pmx(ctx, buffer);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bone_flags_skip_padding_bits() {
        let flags = BoneFlags::from_raw(0x0021);
        assert!(flags.has_destination_bone_index);
        assert!(flags.has_constraint);
        assert!(!flags.has_inherent_translation);
        // Bit 6 is format padding and never survives a round-trip
        assert_eq!(BoneFlags::from_raw(0x0040).to_raw(), 0);
    }

    #[test]
    fn test_bone_flags_roundtrip() {
        for raw in [0x0000u16, 0x001f, 0x3fbf, 0x1234] {
            let expected = raw & !0x0040 & 0x3fff;
            assert_eq!(BoneFlags::from_raw(raw).to_raw(), expected);
        }
    }
}
