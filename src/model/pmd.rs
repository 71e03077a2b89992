//! PMD 1.0 legacy sub-codec.
//!
//! PMD tables are normalized into the same unified graph the PMX reader
//! produces: bone type bytes map onto flag words, IK blocks become
//! stand-alone constraints, PMD morphs become vertex morphs anchored on
//! the base morph, and the display lists become labels. The writer
//! reconstructs the legacy layout from the normalized graph.

use smallvec::SmallVec;

use crate::util::{
    decode_fixed, encode_fixed, Buffer, CodecKind, MutableBuffer, Result, Status, StringCodec,
};

use super::{
    Bone, BoneType, Constraint, ConstraintJoint, FormatType, Label, LabelItem, Material,
    MaterialFlags, Model, Morph, MorphCategory, MorphType, MorphUnits, RigidBody,
    RigidBodyShapeType, RigidBodyTransformType, SphereMapTextureType, Texture, Vertex, VertexMorph,
    VertexType, Joint, JointType,
};

const PMD_SIGNATURE: &[u8; 3] = b"Pmd";
const NAME_WIDTH: usize = 20;
const COMMENT_WIDTH: usize = 256;
const DISPLAY_NAME_WIDTH: usize = 50;
const TOON_PATH_WIDTH: usize = 100;
const NUM_SHARED_TOON_TEXTURES: usize = 10;

/// Decode a u16 index where 0xffff means "none".
fn nullable_u16(value: u16) -> i32 {
    if value == 0xffff {
        -1
    } else {
        value as i32
    }
}

fn read_fixed_string(
    buffer: &mut Buffer,
    codec: &dyn StringCodec,
    width: usize,
) -> Result<String> {
    let bytes = buffer.read_bytes(width)?;
    decode_fixed(codec, &bytes, CodecKind::Sjis)
}

fn write_fixed_string(
    buffer: &mut MutableBuffer,
    codec: &dyn StringCodec,
    text: &str,
    width: usize,
) -> Result<()> {
    buffer.write_byte_array(&encode_fixed(codec, text, CodecKind::Sjis, width)?);
    Ok(())
}

pub(crate) fn load(model: &mut Model, buffer: &mut Buffer, codec: &dyn StringCodec) -> Result<()> {
    if buffer.read_bytes(3)? != PMD_SIGNATURE {
        return Err(Status::InvalidSignature);
    }
    let version = buffer.read_f32()?;
    if (version * 10.0) as i32 != 10 {
        return Err(Status::UnsupportedVersion((version * 10.0) as u32));
    }
    model.format_type = Some(FormatType::Pmd1_0);
    model.codec_kind = CodecKind::Sjis;
    model.name_ja = read_fixed_string(buffer, codec, NAME_WIDTH)?;
    model.comment_ja = read_fixed_string(buffer, codec, COMMENT_WIDTH)?;

    parse_vertices(model, buffer)?;
    parse_vertex_indices(model, buffer)?;
    parse_materials(model, buffer, codec)?;
    parse_bones(model, buffer, codec)?;
    parse_constraints(model, buffer)?;
    parse_morphs(model, buffer, codec)?;
    parse_labels(model, buffer, codec)?;
    parse_english_block(model, buffer, codec)?;
    parse_toon_textures(model, buffer, codec)?;
    // Oldest files end after the display lists
    if !buffer.is_end() {
        parse_rigid_bodies(model, buffer, codec)?;
        parse_joints(model, buffer, codec)?;
    }
    if buffer.is_end() {
        Ok(())
    } else {
        Err(Status::BufferNotEnd)
    }
}

fn parse_vertices(model: &mut Model, buffer: &mut Buffer) -> Result<()> {
    let num_vertices = buffer.read_len()?;
    model.vertices.reserve(num_vertices);
    for _ in 0..num_vertices {
        let mut vertex = Vertex {
            origin: buffer.read_f32x3()?,
            normal: buffer.read_f32x3()?,
            uv: buffer.read_f32x2()?,
            vertex_type: VertexType::Bdef2,
            ..Default::default()
        };
        vertex.bone_indices[0] = nullable_u16(buffer.read_u16()?);
        vertex.bone_indices[1] = nullable_u16(buffer.read_u16()?);
        let weight = buffer.read_u8()?.min(100) as f32 / 100.0;
        vertex.bone_weights.x = weight;
        vertex.bone_weights.y = 1.0 - weight;
        // PMD stores an edge-invisible flag instead of a scale
        vertex.edge_size = if buffer.read_u8()? != 0 { 0.0 } else { 1.0 };
        model.vertices.push(vertex);
    }
    Ok(())
}

fn parse_vertex_indices(model: &mut Model, buffer: &mut Buffer) -> Result<()> {
    let num_vertex_indices = buffer.read_len()?;
    if (num_vertex_indices == 0 && !model.vertices.is_empty()) || num_vertex_indices % 3 != 0 {
        return Err(Status::ModelFaceCorrupted);
    }
    model.vertex_indices.reserve(num_vertex_indices);
    for _ in 0..num_vertex_indices {
        model.vertex_indices.push(buffer.read_u16()? as u32);
    }
    Ok(())
}

/// Register a texture path, reusing an existing entry when the path
/// repeats across materials.
fn intern_texture(model: &mut Model, path: &str) -> i32 {
    if path.is_empty() {
        return -1;
    }
    if let Some(index) = model.textures.iter().position(|t| t.path == path) {
        return index as i32;
    }
    model.textures.push(Texture::new(path));
    model.textures.len() as i32 - 1
}

fn parse_materials(model: &mut Model, buffer: &mut Buffer, codec: &dyn StringCodec) -> Result<()> {
    let num_materials = buffer.read_len()?;
    model.materials.reserve(num_materials);
    for _ in 0..num_materials {
        let mut material = Material {
            diffuse_color: buffer.read_f32x3()?,
            diffuse_opacity: buffer.read_f32()?,
            specular_power: buffer.read_f32()?,
            specular_color: buffer.read_f32x3()?,
            ambient_color: buffer.read_f32x3()?,
            is_toon_shared: true,
            ..Default::default()
        };
        let toon_id = buffer.read_u8()?;
        material.toon_texture_index = if toon_id == 0xff { -1 } else { toon_id as i32 };
        let edge_flag = buffer.read_u8()?;
        material.flags = MaterialFlags {
            is_edge_enabled: edge_flag != 0,
            is_casting_shadow_enabled: edge_flag != 0,
            is_casting_shadow_map_enabled: true,
            is_shadow_map_enabled: true,
            is_culling_disabled: material.diffuse_opacity < 1.0,
            ..Default::default()
        };
        material.num_vertex_indices = buffer.read_u32()? as usize;
        // The 20-byte path field packs "diffuse*spheremap"
        let path = read_fixed_string(buffer, codec, NAME_WIDTH)?;
        let (diffuse_path, sphere_path) = match path.split_once('*') {
            Some((diffuse, sphere)) => (diffuse.to_string(), sphere.to_string()),
            None => (path, String::new()),
        };
        material.diffuse_texture_index = intern_texture(model, &diffuse_path);
        material.sphere_map_texture_index = intern_texture(model, &sphere_path);
        material.sphere_map_texture_type = if sphere_path.is_empty() {
            SphereMapTextureType::None
        } else if sphere_path.to_ascii_lowercase().ends_with(".spa") {
            SphereMapTextureType::Add
        } else {
            SphereMapTextureType::Multiply
        };
        model.materials.push(material);
    }
    Ok(())
}

fn parse_bones(model: &mut Model, buffer: &mut Buffer, codec: &dyn StringCodec) -> Result<()> {
    let num_bones = buffer.read_u16()? as usize;
    model.bones.reserve(num_bones);
    for _ in 0..num_bones {
        let name_ja = read_fixed_string(buffer, codec, NAME_WIDTH)?;
        let parent_bone_index = nullable_u16(buffer.read_u16()?);
        let tail = buffer.read_u16()?;
        let bone_type = BoneType::from_raw(buffer.read_u8()?);
        let linked = buffer.read_u16()?;
        let origin = buffer.read_f32x3()?;
        let mut bone = Bone {
            name_ja,
            origin,
            parent_bone_index,
            bone_type,
            ..Default::default()
        };
        bone.flags.has_destination_bone_index = true;
        bone.flags.is_rotatable = bone_type != BoneType::Invisible;
        bone.flags.is_movable = matches!(
            bone_type,
            BoneType::RotatableAndMovable | BoneType::ConstraintEffector
        );
        bone.flags.is_visible = bone_type != BoneType::Invisible;
        bone.flags.is_user_handleable = bone.flags.is_visible;
        match bone_type {
            BoneType::InherentOrientationJoint => {
                bone.flags.has_inherent_orientation = true;
                bone.parent_inherent_bone_index = nullable_u16(linked);
                bone.target_bone_index = nullable_u16(tail);
            }
            BoneType::InherentOrientationEffector => {
                // The tail field is reused as an influence percentage
                bone.flags.has_inherent_orientation = true;
                bone.parent_inherent_bone_index = nullable_u16(linked);
                bone.inherent_coefficient = tail as f32 / 100.0;
                bone.target_bone_index = -1;
            }
            BoneType::FixedAxis => {
                bone.flags.has_fixed_axis = true;
                bone.target_bone_index = nullable_u16(tail);
            }
            _ => {
                bone.target_bone_index = nullable_u16(tail);
            }
        }
        model.bones.push(bone);
    }
    Ok(())
}

fn parse_constraints(model: &mut Model, buffer: &mut Buffer) -> Result<()> {
    let num_constraints = buffer.read_u16()? as usize;
    model.constraints.reserve(num_constraints);
    for _ in 0..num_constraints {
        let target_bone_index = nullable_u16(buffer.read_u16()?);
        let effector_bone_index = nullable_u16(buffer.read_u16()?);
        let num_joints = buffer.read_u8()? as usize;
        let num_iterations = buffer.read_u16()? as i32;
        let angle_limit = buffer.read_f32()?;
        let mut joints = SmallVec::with_capacity(num_joints);
        for _ in 0..num_joints {
            joints.push(ConstraintJoint {
                bone_index: nullable_u16(buffer.read_u16()?),
                ..Default::default()
            });
        }
        model.constraints.push(Constraint {
            effector_bone_index,
            target_bone_index,
            num_iterations,
            angle_limit,
            joints,
        });
    }
    Ok(())
}

fn parse_morphs(model: &mut Model, buffer: &mut Buffer, codec: &dyn StringCodec) -> Result<()> {
    let num_morphs = buffer.read_u16()? as usize;
    model.morphs.reserve(num_morphs);
    // The base morph carries the real vertex indices; the other morphs
    // index into the base morph's list
    let mut base_vertex_indices: Vec<i32> = Vec::new();
    for morph_index in 0..num_morphs {
        let name_ja = read_fixed_string(buffer, codec, NAME_WIDTH)?;
        let num_units = buffer.read_u32()? as usize;
        let category = MorphCategory::from_raw(buffer.read_u8()?);
        let mut units = Vec::with_capacity(num_units);
        for _ in 0..num_units {
            let raw_index = buffer.read_i32()?;
            let position = buffer.read_f32x3()?;
            let vertex_index = if category == MorphCategory::Base {
                raw_index
            } else {
                base_vertex_indices
                    .get(raw_index as usize)
                    .copied()
                    .ok_or(Status::ModelMorphCorrupted)?
            };
            units.push(VertexMorph {
                vertex_index,
                relative_index: raw_index,
                position,
            });
        }
        if morph_index == 0 && category == MorphCategory::Base {
            base_vertex_indices = units.iter().map(|unit| unit.vertex_index).collect();
        }
        model.morphs.push(Morph {
            name_ja,
            name_en: String::new(),
            category,
            morph_type: MorphType::Vertex,
            units: MorphUnits::Vertices(units),
        });
    }
    Ok(())
}

fn parse_labels(model: &mut Model, buffer: &mut Buffer, codec: &dyn StringCodec) -> Result<()> {
    // Expression display list: morph indices shown in the face panel
    let num_face_items = buffer.read_u8()? as usize;
    let mut expression_label = Label {
        name_ja: "表情".to_string(),
        name_en: "Expression".to_string(),
        is_special: true,
        items: SmallVec::new(),
    };
    for _ in 0..num_face_items {
        let morph_index = buffer.read_u16()? as i32;
        expression_label.items.push(LabelItem::Morph(morph_index));
    }
    model.labels.push(expression_label);

    let num_display_names = buffer.read_u8()? as usize;
    for _ in 0..num_display_names {
        let raw_name = read_fixed_string(buffer, codec, DISPLAY_NAME_WIDTH)?;
        model.labels.push(Label {
            // Display names end with a stray line feed in most files
            name_ja: raw_name.trim_end_matches('\n').to_string(),
            ..Default::default()
        });
    }

    let num_display_items = buffer.read_len()?;
    for _ in 0..num_display_items {
        let bone_index = nullable_u16(buffer.read_u16()?);
        let frame_index = buffer.read_u8()? as usize;
        // Frame indices are 1-based; 0 is the pinned root frame
        let label = model
            .labels
            .get_mut(frame_index)
            .ok_or(Status::ModelLabelCorrupted)?;
        label.items.push(LabelItem::Bone(bone_index));
    }
    Ok(())
}

fn parse_english_block(
    model: &mut Model,
    buffer: &mut Buffer,
    codec: &dyn StringCodec,
) -> Result<()> {
    if buffer.is_end() || buffer.read_u8()? == 0 {
        return Ok(());
    }
    model.name_en = read_fixed_string(buffer, codec, NAME_WIDTH)?;
    model.comment_en = read_fixed_string(buffer, codec, COMMENT_WIDTH)?;
    for index in 0..model.bones.len() {
        model.bones[index].name_en = read_fixed_string(buffer, codec, NAME_WIDTH)?;
    }
    // The base morph has no English name slot
    for index in 1..model.morphs.len() {
        model.morphs[index].name_en = read_fixed_string(buffer, codec, NAME_WIDTH)?;
    }
    for index in 1..model.labels.len() {
        let name = read_fixed_string(buffer, codec, DISPLAY_NAME_WIDTH)?;
        model.labels[index].name_en = name.trim_end_matches('\n').to_string();
    }
    Ok(())
}

fn parse_toon_textures(
    model: &mut Model,
    buffer: &mut Buffer,
    codec: &dyn StringCodec,
) -> Result<()> {
    if buffer.is_end() {
        return Ok(());
    }
    for _ in 0..NUM_SHARED_TOON_TEXTURES {
        model
            .toon_texture_paths
            .push(read_fixed_string(buffer, codec, TOON_PATH_WIDTH)?);
    }
    Ok(())
}

fn parse_rigid_bodies(
    model: &mut Model,
    buffer: &mut Buffer,
    codec: &dyn StringCodec,
) -> Result<()> {
    let num_rigid_bodies = buffer.read_len()?;
    model.rigid_bodies.reserve(num_rigid_bodies);
    for _ in 0..num_rigid_bodies {
        model.rigid_bodies.push(RigidBody {
            name_ja: read_fixed_string(buffer, codec, NAME_WIDTH)?,
            bone_index: nullable_u16(buffer.read_u16()?),
            collision_group_id: buffer.read_u8()? as i32,
            collision_mask: buffer.read_u16()? as i32,
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
            is_bone_relative: true,
            ..Default::default()
        });
    }
    Ok(())
}

fn parse_joints(model: &mut Model, buffer: &mut Buffer, codec: &dyn StringCodec) -> Result<()> {
    let num_joints = buffer.read_len()?;
    model.joints.reserve(num_joints);
    for _ in 0..num_joints {
        model.joints.push(Joint {
            name_ja: read_fixed_string(buffer, codec, NAME_WIDTH)?,
            joint_type: JointType::Generic6dofSpringConstraint,
            rigid_body_a_index: buffer.read_i32()?,
            rigid_body_b_index: buffer.read_i32()?,
            origin: buffer.read_f32x3()?,
            orientation: buffer.read_f32x3()?,
            linear_lower_limit: buffer.read_f32x3()?,
            linear_upper_limit: buffer.read_f32x3()?,
            angular_lower_limit: buffer.read_f32x3()?,
            angular_upper_limit: buffer.read_f32x3()?,
            linear_stiffness: buffer.read_f32x3()?,
            angular_stiffness: buffer.read_f32x3()?,
            ..Default::default()
        });
    }
    Ok(())
}

// ----------------------------------------------------------------------------
// Serialization
// ----------------------------------------------------------------------------

pub(crate) fn save(model: &Model, buffer: &mut MutableBuffer, codec: &dyn StringCodec) -> Result<()> {
    if !model.soft_bodies.is_empty()
        || model.additional_uv_size > 0
        || model.vertices.len() > 0xffff
        || model.bones.len() > 0xfffe
    {
        return Err(Status::ModelVersionIncompatible);
    }
    buffer.write_byte_array(PMD_SIGNATURE);
    buffer.write_f32(FormatType::Pmd1_0.version());
    write_fixed_string(buffer, codec, &model.name_ja, NAME_WIDTH)?;
    write_fixed_string(buffer, codec, &model.comment_ja, COMMENT_WIDTH)?;

    buffer.write_u32(model.vertices.len() as u32);
    for vertex in &model.vertices {
        buffer.write_f32x3(vertex.origin);
        buffer.write_f32x3(vertex.normal);
        buffer.write_f32x2(vertex.uv);
        buffer.write_u16(vertex.bone_indices[0] as u16);
        buffer.write_u16(vertex.bone_indices[1] as u16);
        buffer.write_u8((vertex.bone_weights.x * 100.0).round() as u8);
        buffer.write_u8((vertex.edge_size == 0.0) as u8);
    }

    buffer.write_u32(model.vertex_indices.len() as u32);
    for &vertex_index in &model.vertex_indices {
        buffer.write_u16(vertex_index as u16);
    }

    buffer.write_u32(model.materials.len() as u32);
    for material in &model.materials {
        buffer.write_f32x3(material.diffuse_color);
        buffer.write_f32(material.diffuse_opacity);
        buffer.write_f32(material.specular_power);
        buffer.write_f32x3(material.specular_color);
        buffer.write_f32x3(material.ambient_color);
        buffer.write_u8(if material.toon_texture_index < 0 {
            0xff
        } else {
            material.toon_texture_index as u8
        });
        buffer.write_u8(material.flags.is_edge_enabled as u8);
        buffer.write_u32(material.num_vertex_indices as u32);
        let diffuse = model
            .texture(material.diffuse_texture_index)
            .map(|t| t.path.as_str())
            .unwrap_or_default();
        let sphere = model
            .texture(material.sphere_map_texture_index)
            .map(|t| t.path.as_str())
            .unwrap_or_default();
        let combined = if sphere.is_empty() {
            diffuse.to_string()
        } else {
            format!("{}*{}", diffuse, sphere)
        };
        write_fixed_string(buffer, codec, &combined, NAME_WIDTH)?;
    }

    buffer.write_u16(model.bones.len() as u16);
    for (bone_index, bone) in model.bones.iter().enumerate() {
        write_fixed_string(buffer, codec, &bone.name_ja, NAME_WIDTH)?;
        buffer.write_u16(bone.parent_bone_index as u16);
        let tail = match bone.bone_type {
            BoneType::InherentOrientationEffector => {
                (bone.inherent_coefficient * 100.0).round() as u16
            }
            _ => bone.target_bone_index as u16,
        };
        buffer.write_u16(tail);
        buffer.write_u8(bone.bone_type.to_raw());
        let linked = match bone.bone_type {
            BoneType::InherentOrientationJoint | BoneType::InherentOrientationEffector => {
                bone.parent_inherent_bone_index
            }
            // IK-chain members point back at the constraint's owning bone
            BoneType::ConstraintJoint | BoneType::ConstraintEffector => model
                .constraints
                .iter()
                .find(|constraint| {
                    constraint
                        .joints
                        .iter()
                        .any(|joint| joint.bone_index == bone_index as i32)
                })
                .map(|constraint| constraint.target_bone_index)
                .filter(|&target| target >= 0)
                .unwrap_or(0),
            _ => 0,
        };
        buffer.write_u16(linked.max(0) as u16);
        buffer.write_f32x3(bone.origin);
    }

    buffer.write_u16(model.constraints.len() as u16);
    for constraint in &model.constraints {
        buffer.write_u16(constraint.target_bone_index as u16);
        buffer.write_u16(constraint.effector_bone_index as u16);
        buffer.write_u8(constraint.joints.len() as u8);
        buffer.write_u16(constraint.num_iterations as u16);
        buffer.write_f32(constraint.angle_limit);
        for joint in &constraint.joints {
            buffer.write_u16(joint.bone_index as u16);
        }
    }

    buffer.write_u16(model.morphs.len() as u16);
    for morph in &model.morphs {
        write_fixed_string(buffer, codec, &morph.name_ja, NAME_WIDTH)?;
        let units = match &morph.units {
            MorphUnits::Vertices(units) => units,
            // PMD has no other morph payloads
            _ => return Err(Status::ModelVersionIncompatible),
        };
        buffer.write_u32(units.len() as u32);
        buffer.write_u8(morph.category.to_raw());
        for unit in units {
            let raw_index = if morph.category == MorphCategory::Base {
                unit.vertex_index
            } else {
                unit.relative_index
            };
            buffer.write_i32(raw_index);
            buffer.write_f32x3(unit.position);
        }
    }

    write_labels(model, buffer, codec)?;
    write_english_block(model, buffer, codec)?;

    for index in 0..NUM_SHARED_TOON_TEXTURES {
        let path = model
            .toon_texture_paths
            .get(index)
            .map(String::as_str)
            .unwrap_or_default();
        write_fixed_string(buffer, codec, path, TOON_PATH_WIDTH)?;
    }

    buffer.write_u32(model.rigid_bodies.len() as u32);
    for rigid_body in &model.rigid_bodies {
        write_fixed_string(buffer, codec, &rigid_body.name_ja, NAME_WIDTH)?;
        buffer.write_u16(rigid_body.bone_index as u16);
        buffer.write_u8(rigid_body.collision_group_id as u8);
        buffer.write_u16(rigid_body.collision_mask as u16);
        buffer.write_u8(rigid_body.shape_type.to_raw());
        buffer.write_f32x3(rigid_body.size);
        buffer.write_f32x3(rigid_body.origin);
        buffer.write_f32x3(rigid_body.orientation);
        buffer.write_f32(rigid_body.mass);
        buffer.write_f32(rigid_body.linear_damping);
        buffer.write_f32(rigid_body.angular_damping);
        buffer.write_f32(rigid_body.restitution);
        buffer.write_f32(rigid_body.friction);
        buffer.write_u8(rigid_body.transform_type.to_raw());
    }

    buffer.write_u32(model.joints.len() as u32);
    for joint in &model.joints {
        write_fixed_string(buffer, codec, &joint.name_ja, NAME_WIDTH)?;
        buffer.write_i32(joint.rigid_body_a_index);
        buffer.write_i32(joint.rigid_body_b_index);
        buffer.write_f32x3(joint.origin);
        buffer.write_f32x3(joint.orientation);
        buffer.write_f32x3(joint.linear_lower_limit);
        buffer.write_f32x3(joint.linear_upper_limit);
        buffer.write_f32x3(joint.angular_lower_limit);
        buffer.write_f32x3(joint.angular_upper_limit);
        buffer.write_f32x3(joint.linear_stiffness);
        buffer.write_f32x3(joint.angular_stiffness);
    }
    Ok(())
}

fn write_labels(model: &Model, buffer: &mut MutableBuffer, codec: &dyn StringCodec) -> Result<()> {
    let expression_items: Vec<i32> = model
        .labels
        .first()
        .filter(|label| label.is_special)
        .map(|label| {
            label
                .items
                .iter()
                .filter_map(|item| match item {
                    LabelItem::Morph(index) => Some(*index),
                    LabelItem::Bone(_) => None,
                })
                .collect()
        })
        .unwrap_or_default();
    buffer.write_u8(expression_items.len() as u8);
    for morph_index in &expression_items {
        buffer.write_u16(*morph_index as u16);
    }

    let display_labels: Vec<&Label> = model
        .labels
        .iter()
        .skip(if model.labels.first().map(|l| l.is_special).unwrap_or(false) {
            1
        } else {
            0
        })
        .collect();
    buffer.write_u8(display_labels.len() as u8);
    for label in &display_labels {
        write_fixed_string(
            buffer,
            codec,
            &format!("{}\n", label.name_ja),
            DISPLAY_NAME_WIDTH,
        )?;
    }
    let mut display_items: Vec<(u16, u8)> = Vec::new();
    for (frame, label) in display_labels.iter().enumerate() {
        for item in &label.items {
            if let LabelItem::Bone(bone_index) = item {
                display_items.push((*bone_index as u16, frame as u8 + 1));
            }
        }
    }
    buffer.write_u32(display_items.len() as u32);
    for (bone_index, frame_index) in display_items {
        buffer.write_u16(bone_index);
        buffer.write_u8(frame_index);
    }
    Ok(())
}

fn write_english_block(
    model: &Model,
    buffer: &mut MutableBuffer,
    codec: &dyn StringCodec,
) -> Result<()> {
    let has_english = !model.name_en.is_empty()
        || model.bones.iter().any(|bone| !bone.name_en.is_empty())
        || model.morphs.iter().any(|morph| !morph.name_en.is_empty());
    buffer.write_u8(has_english as u8);
    if !has_english {
        return Ok(());
    }
    write_fixed_string(buffer, codec, &model.name_en, NAME_WIDTH)?;
    write_fixed_string(buffer, codec, &model.comment_en, COMMENT_WIDTH)?;
    for bone in &model.bones {
        write_fixed_string(buffer, codec, &bone.name_en, NAME_WIDTH)?;
    }
    for morph in model.morphs.iter().skip(1) {
        write_fixed_string(buffer, codec, &morph.name_en, NAME_WIDTH)?;
    }
    let skip_special = model.labels.first().map(|l| l.is_special).unwrap_or(false);
    for label in model.labels.iter().skip(skip_special as usize) {
        write_fixed_string(
            buffer,
            codec,
            &format!("{}\n", label.name_en),
            DISPLAY_NAME_WIDTH,
        )?;
    }
    Ok(())
}
