//! Joint descriptors linking pairs of rigid bodies.

use glam::Vec3;

use crate::util::{Buffer, MutableBuffer, Result, Status};

use super::{PmxReadContext, PmxWriteContext};

/// Constraint solver type of a joint.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum JointType {
    #[default]
    Generic6dofSpringConstraint,
    Generic6dofConstraint,
    Point2pointConstraint,
    ConeTwistConstraint,
    SliderConstraint,
    HingeConstraint,
}

impl JointType {
    pub(super) fn from_raw(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Generic6dofSpringConstraint),
            1 => Some(Self::Generic6dofConstraint),
            2 => Some(Self::Point2pointConstraint),
            3 => Some(Self::ConeTwistConstraint),
            4 => Some(Self::SliderConstraint),
            5 => Some(Self::HingeConstraint),
            _ => None,
        }
    }

    pub(super) fn to_raw(self) -> u8 {
        match self {
            Self::Generic6dofSpringConstraint => 0,
            Self::Generic6dofConstraint => 1,
            Self::Point2pointConstraint => 2,
            Self::ConeTwistConstraint => 3,
            Self::SliderConstraint => 4,
            Self::HingeConstraint => 5,
        }
    }
}

/// A joint between two rigid bodies.
#[derive(Clone, Debug)]
pub struct Joint {
    pub name_ja: String,
    pub name_en: String,
    pub joint_type: JointType,
    pub rigid_body_a_index: i32,
    pub rigid_body_b_index: i32,
    pub origin: Vec3,
    pub orientation: Vec3,
    pub linear_lower_limit: Vec3,
    pub linear_upper_limit: Vec3,
    pub angular_lower_limit: Vec3,
    pub angular_upper_limit: Vec3,
    pub linear_stiffness: Vec3,
    pub angular_stiffness: Vec3,
}

impl Default for Joint {
    fn default() -> Self {
        Self {
            name_ja: String::new(),
            name_en: String::new(),
            joint_type: JointType::default(),
            rigid_body_a_index: -1,
            rigid_body_b_index: -1,
            origin: Vec3::ZERO,
            orientation: Vec3::ZERO,
            linear_lower_limit: Vec3::ZERO,
            linear_upper_limit: Vec3::ZERO,
            angular_lower_limit: Vec3::ZERO,
            angular_upper_limit: Vec3::ZERO,
            linear_stiffness: Vec3::ZERO,
            angular_stiffness: Vec3::ZERO,
        }
    }
}

impl Joint {
    pub(super) fn parse_pmx(ctx: &PmxReadContext, buffer: &mut Buffer) -> Result<Self> {
        let size = ctx.info.rigid_body_index_size;
        Ok(Self {
            name_ja: ctx.read_string(buffer)?,
            name_en: ctx.read_string(buffer)?,
            joint_type: JointType::from_raw(buffer.read_u8()?)
                .ok_or(Status::ModelJointCorrupted)?,
            rigid_body_a_index: buffer.read_integer_nullable(size)?,
            rigid_body_b_index: buffer.read_integer_nullable(size)?,
            origin: buffer.read_f32x3()?,
            orientation: buffer.read_f32x3()?,
            linear_lower_limit: buffer.read_f32x3()?,
            linear_upper_limit: buffer.read_f32x3()?,
            angular_lower_limit: buffer.read_f32x3()?,
            angular_upper_limit: buffer.read_f32x3()?,
            linear_stiffness: buffer.read_f32x3()?,
            angular_stiffness: buffer.read_f32x3()?,
        })
    }

    pub(super) fn write_pmx(&self, ctx: &PmxWriteContext, buffer: &mut MutableBuffer) -> Result<()> {
        let size = ctx.info.rigid_body_index_size;
        ctx.write_string(buffer, &self.name_ja)?;
        ctx.write_string(buffer, &self.name_en)?;
        buffer.write_u8(self.joint_type.to_raw());
        buffer.write_integer(self.rigid_body_a_index, size);
        buffer.write_integer(self.rigid_body_b_index, size);
        buffer.write_f32x3(self.origin);
        buffer.write_f32x3(self.orientation);
        buffer.write_f32x3(self.linear_lower_limit);
        buffer.write_f32x3(self.linear_upper_limit);
        buffer.write_f32x3(self.angular_lower_limit);
        buffer.write_f32x3(self.angular_upper_limit);
        buffer.write_f32x3(self.linear_stiffness);
        buffer.write_f32x3(self.angular_stiffness);
        Ok(())
    }
}
