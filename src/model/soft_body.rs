//! Soft-body physics descriptors (PMX 2.1 only).

use crate::util::{Buffer, MutableBuffer, Result, Status};

use super::{PmxReadContext, PmxWriteContext};

/// Simulation topology of a soft body.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SoftBodyShapeType {
    #[default]
    TriMesh,
    Rope,
}

impl SoftBodyShapeType {
    fn from_raw(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::TriMesh),
            1 => Some(Self::Rope),
            _ => None,
        }
    }

    fn to_raw(self) -> u8 {
        match self {
            Self::TriMesh => 0,
            Self::Rope => 1,
        }
    }
}

/// Aerodynamics model applied to the soft body.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SoftBodyAeroModelType {
    #[default]
    VertexPoint,
    VertexTwoSided,
    VertexOneSided,
    FaceTwoSided,
    FaceOneSided,
}

impl SoftBodyAeroModelType {
    fn from_raw(value: i32) -> Option<Self> {
        match value {
            0 => Some(Self::VertexPoint),
            1 => Some(Self::VertexTwoSided),
            2 => Some(Self::VertexOneSided),
            3 => Some(Self::FaceTwoSided),
            4 => Some(Self::FaceOneSided),
            _ => None,
        }
    }

    fn to_raw(self) -> i32 {
        match self {
            Self::VertexPoint => 0,
            Self::VertexTwoSided => 1,
            Self::VertexOneSided => 2,
            Self::FaceTwoSided => 3,
            Self::FaceOneSided => 4,
        }
    }
}

/// Pins a soft-body vertex to a rigid body.
#[derive(Clone, Copy, Debug, Default)]
pub struct SoftBodyAnchor {
    pub rigid_body_index: i32,
    pub vertex_index: i32,
    pub is_near_enabled: bool,
}

/// A soft body attached to a material's vertex run.
#[derive(Clone, Debug, Default)]
pub struct SoftBody {
    pub name_ja: String,
    pub name_en: String,
    pub shape_type: SoftBodyShapeType,
    pub material_index: i32,
    pub collision_group_id: u8,
    pub collision_mask: u16,
    pub flags: u8,
    pub bending_constraints_distance: i32,
    pub cluster_count: i32,
    pub total_mass: f32,
    pub collision_margin: f32,
    pub aero_model: SoftBodyAeroModelType,
    pub velocity_correction_factor: f32,
    pub damping_coefficient: f32,
    pub drag_coefficient: f32,
    pub lift_coefficient: f32,
    pub pressure_coefficient: f32,
    pub volume_conversation_coefficient: f32,
    pub dynamic_friction_coefficient: f32,
    pub pose_matching_coefficient: f32,
    pub rigid_contact_hardness: f32,
    pub kinetic_contact_hardness: f32,
    pub soft_contact_hardness: f32,
    pub anchor_hardness: f32,
    pub soft_vs_rigid_hardness: f32,
    pub soft_vs_kinetic_hardness: f32,
    pub soft_vs_soft_hardness: f32,
    pub soft_vs_rigid_impulse_split: f32,
    pub soft_vs_kinetic_impulse_split: f32,
    pub soft_vs_soft_impulse_split: f32,
    pub velocity_solver_iterations: i32,
    pub positions_solver_iterations: i32,
    pub drift_solver_iterations: i32,
    pub cluster_solver_iterations: i32,
    pub linear_stiffness_coefficient: f32,
    pub angular_stiffness_coefficient: f32,
    pub volume_stiffness_coefficient: f32,
    pub anchors: Vec<SoftBodyAnchor>,
    pub pinned_vertex_indices: Vec<u32>,
}

impl SoftBody {
    pub(super) fn parse_pmx(ctx: &PmxReadContext, buffer: &mut Buffer) -> Result<Self> {
        let mut soft_body = SoftBody {
            name_ja: ctx.read_string(buffer)?,
            name_en: ctx.read_string(buffer)?,
            shape_type: SoftBodyShapeType::from_raw(buffer.read_u8()?)
                .ok_or(Status::ModelSoftBodyCorrupted)?,
            material_index: buffer.read_integer_nullable(ctx.info.material_index_size)?,
            collision_group_id: buffer.read_u8()?,
            collision_mask: buffer.read_u16()?,
            flags: buffer.read_u8()?,
            bending_constraints_distance: buffer.read_i32()?,
            cluster_count: buffer.read_i32()?,
            total_mass: buffer.read_f32()?,
            collision_margin: buffer.read_f32()?,
            aero_model: SoftBodyAeroModelType::from_raw(buffer.read_i32()?)
                .ok_or(Status::ModelSoftBodyCorrupted)?,
            velocity_correction_factor: buffer.read_f32()?,
            damping_coefficient: buffer.read_f32()?,
            drag_coefficient: buffer.read_f32()?,
            lift_coefficient: buffer.read_f32()?,
            pressure_coefficient: buffer.read_f32()?,
            volume_conversation_coefficient: buffer.read_f32()?,
            dynamic_friction_coefficient: buffer.read_f32()?,
            pose_matching_coefficient: buffer.read_f32()?,
            rigid_contact_hardness: buffer.read_f32()?,
            kinetic_contact_hardness: buffer.read_f32()?,
            soft_contact_hardness: buffer.read_f32()?,
            anchor_hardness: buffer.read_f32()?,
            soft_vs_rigid_hardness: buffer.read_f32()?,
            soft_vs_kinetic_hardness: buffer.read_f32()?,
            soft_vs_soft_hardness: buffer.read_f32()?,
            soft_vs_rigid_impulse_split: buffer.read_f32()?,
            soft_vs_kinetic_impulse_split: buffer.read_f32()?,
            soft_vs_soft_impulse_split: buffer.read_f32()?,
            velocity_solver_iterations: buffer.read_i32()?,
            positions_solver_iterations: buffer.read_i32()?,
            drift_solver_iterations: buffer.read_i32()?,
            cluster_solver_iterations: buffer.read_i32()?,
            linear_stiffness_coefficient: buffer.read_f32()?,
            angular_stiffness_coefficient: buffer.read_f32()?,
            volume_stiffness_coefficient: buffer.read_f32()?,
            anchors: Vec::new(),
            pinned_vertex_indices: Vec::new(),
        };
        let num_anchors = buffer.read_len()?;
        for _ in 0..num_anchors {
            soft_body.anchors.push(SoftBodyAnchor {
                rigid_body_index: buffer.read_integer_nullable(ctx.info.rigid_body_index_size)?,
                vertex_index: buffer.read_integer_nullable(ctx.info.vertex_index_size)?,
                is_near_enabled: buffer.read_u8()? != 0,
            });
        }
        let num_pins = buffer.read_len()?;
        for _ in 0..num_pins {
            soft_body
                .pinned_vertex_indices
                .push(buffer.read_integer(ctx.info.vertex_index_size)? as u32);
        }
        Ok(soft_body)
    }

    pub(super) fn write_pmx(&self, ctx: &PmxWriteContext, buffer: &mut MutableBuffer) -> Result<()> {
        ctx.write_string(buffer, &self.name_ja)?;
        ctx.write_string(buffer, &self.name_en)?;
        buffer.write_u8(self.shape_type.to_raw());
        buffer.write_integer(self.material_index, ctx.info.material_index_size);
        buffer.write_u8(self.collision_group_id);
        buffer.write_u16(self.collision_mask);
        buffer.write_u8(self.flags);
        buffer.write_i32(self.bending_constraints_distance);
        buffer.write_i32(self.cluster_count);
        buffer.write_f32(self.total_mass);
        buffer.write_f32(self.collision_margin);
        buffer.write_i32(self.aero_model.to_raw());
        buffer.write_f32(self.velocity_correction_factor);
        buffer.write_f32(self.damping_coefficient);
        buffer.write_f32(self.drag_coefficient);
        buffer.write_f32(self.lift_coefficient);
        buffer.write_f32(self.pressure_coefficient);
        buffer.write_f32(self.volume_conversation_coefficient);
        buffer.write_f32(self.dynamic_friction_coefficient);
        buffer.write_f32(self.pose_matching_coefficient);
        buffer.write_f32(self.rigid_contact_hardness);
        buffer.write_f32(self.kinetic_contact_hardness);
        buffer.write_f32(self.soft_contact_hardness);
        buffer.write_f32(self.anchor_hardness);
        buffer.write_f32(self.soft_vs_rigid_hardness);
        buffer.write_f32(self.soft_vs_kinetic_hardness);
        buffer.write_f32(self.soft_vs_soft_hardness);
        buffer.write_f32(self.soft_vs_rigid_impulse_split);
        buffer.write_f32(self.soft_vs_kinetic_impulse_split);
        buffer.write_f32(self.soft_vs_soft_impulse_split);
        buffer.write_i32(self.velocity_solver_iterations);
        buffer.write_i32(self.positions_solver_iterations);
        buffer.write_i32(self.drift_solver_iterations);
        buffer.write_i32(self.cluster_solver_iterations);
        buffer.write_f32(self.linear_stiffness_coefficient);
        buffer.write_f32(self.angular_stiffness_coefficient);
        buffer.write_f32(self.volume_stiffness_coefficient);
        buffer.write_u32(self.anchors.len() as u32);
        for anchor in &self.anchors {
            buffer.write_integer(anchor.rigid_body_index, ctx.info.rigid_body_index_size);
            buffer.write_integer(anchor.vertex_index, ctx.info.vertex_index_size);
            buffer.write_u8(anchor.is_near_enabled as u8);
        }
        buffer.write_u32(self.pinned_vertex_indices.len() as u32);
        for index in &self.pinned_vertex_indices {
            buffer.write_integer(*index as i32, ctx.info.vertex_index_size);
        }
        Ok(())
    }
}
