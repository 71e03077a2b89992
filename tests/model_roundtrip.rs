//! Integration tests for the model codec: PMX and PMD round-trips,
//! reference validation and format auto-detection.

use glam::{Vec2, Vec3, Vec4};

use mmdio::model::{
    Bone, BoneType, Constraint, ConstraintJoint, Joint, Label, LabelItem, Material, Morph,
    MorphCategory, MorphType, MorphUnits, RigidBody, SoftBody, SoftBodyAnchor, Texture, Vertex,
    VertexMorph, VertexType,
};
use mmdio::{
    Buffer, CodecKind, FormatType, LanguageType, Model, MutableBuffer, MutableModel, Status,
    StringFactory,
};

fn build_pmx_model() -> MutableModel {
    let mut builder = MutableModel::new();
    builder.set_format_type(FormatType::Pmx2_0);
    builder.set_codec_kind(CodecKind::Utf16);
    builder.set_additional_uv_size(1);
    builder.set_name(LanguageType::Japanese, "テストモデル");
    builder.set_name(LanguageType::English, "Test Model");
    builder.set_comment(LanguageType::Japanese, "コメント");
    builder.set_comment(LanguageType::English, "comment");

    let mut vertex = Vertex::default();
    vertex.origin = Vec3::new(0.0, 1.0, 0.0);
    vertex.normal = Vec3::new(0.0, 1.0, 0.0);
    vertex.uv = Vec2::new(0.5, 0.5);
    vertex.additional_uv[0] = Vec4::new(0.25, 0.5, 0.75, 1.0);
    vertex.vertex_type = VertexType::Bdef1;
    vertex.bone_indices[0] = 0;
    vertex.bone_weights.x = 1.0;
    builder.insert_vertex(vertex.clone(), -1).unwrap();

    let mut second = vertex.clone();
    second.vertex_type = VertexType::Bdef2;
    second.bone_indices = [0, 1, -1, -1];
    second.bone_weights = Vec4::new(0.25, 0.75, 0.0, 0.0);
    builder.insert_vertex(second, -1).unwrap();

    let mut third = vertex;
    third.vertex_type = VertexType::Sdef;
    third.bone_indices = [0, 1, -1, -1];
    third.bone_weights = Vec4::new(0.5, 0.5, 0.0, 0.0);
    third.sdef_c = Vec3::new(0.0, 0.5, 0.0);
    third.sdef_r0 = Vec3::new(0.0, 1.0, 0.0);
    third.sdef_r1 = Vec3::new(0.0, 0.0, 1.0);
    builder.insert_vertex(third, -1).unwrap();

    builder.set_vertex_indices(vec![0, 1, 2]);

    builder
        .insert_texture(Texture::new("textures/body.png"), -1)
        .unwrap();

    let mut material = Material::default();
    material.name_ja = "体".to_string();
    material.name_en = "body".to_string();
    material.diffuse_color = Vec3::new(1.0, 0.5, 0.25);
    material.diffuse_texture_index = 0;
    material.is_toon_shared = true;
    material.toon_texture_index = 3;
    material.flags.is_edge_enabled = true;
    material.num_vertex_indices = 3;
    builder.insert_material(material, -1).unwrap();

    let mut root = Bone::default();
    root.name_ja = "センター".to_string();
    root.name_en = "center".to_string();
    root.flags.is_rotatable = true;
    root.flags.is_movable = true;
    root.flags.is_visible = true;
    builder.insert_bone(root, -1).unwrap();

    let mut arm = Bone::default();
    arm.name_ja = "右腕".to_string();
    arm.name_en = "arm_r".to_string();
    arm.origin = Vec3::new(1.0, 2.0, 0.0);
    arm.parent_bone_index = 0;
    arm.flags.is_rotatable = true;
    arm.flags.is_visible = true;
    arm.flags.has_destination_bone_index = true;
    arm.target_bone_index = 0;
    arm.flags.has_constraint = true;
    arm.constraint = Some(Box::new(Constraint {
        effector_bone_index: 0,
        target_bone_index: 1,
        num_iterations: 30,
        angle_limit: 1.0,
        joints: [ConstraintJoint {
            bone_index: 0,
            has_angle_limit: true,
            lower_limit: Vec3::new(-1.0, 0.0, 0.0),
            upper_limit: Vec3::new(1.0, 0.0, 0.0),
        }]
        .into_iter()
        .collect(),
    }));
    builder.insert_bone(arm, -1).unwrap();

    let mut morph = Morph::default();
    morph.name_ja = "まばたき".to_string();
    morph.name_en = "blink".to_string();
    morph.category = MorphCategory::Eye;
    morph.morph_type = MorphType::Vertex;
    morph.units = MorphUnits::Vertices(vec![VertexMorph {
        vertex_index: 1,
        relative_index: -1,
        position: Vec3::new(0.0, -0.1, 0.0),
    }]);
    builder.insert_morph(morph, -1).unwrap();

    let mut label = Label::default();
    label.name_ja = "Root".to_string();
    label.name_en = "Root".to_string();
    label.is_special = true;
    label.items.push(LabelItem::Bone(0));
    label.items.push(LabelItem::Morph(0));
    builder.insert_label(label, -1).unwrap();

    let mut rigid_body = RigidBody::default();
    rigid_body.name_ja = "上半身".to_string();
    rigid_body.bone_index = 1;
    rigid_body.mass = 1.0;
    rigid_body.size = Vec3::new(1.0, 1.0, 1.0);
    builder.insert_rigid_body(rigid_body, -1).unwrap();

    let mut joint = Joint::default();
    joint.name_ja = "接続".to_string();
    joint.rigid_body_a_index = 0;
    joint.rigid_body_b_index = -1;
    builder.insert_joint(joint, -1).unwrap();

    builder
}

#[test]
fn test_pmx_roundtrip_is_byte_identical() {
    let factory = StringFactory::new();
    let builder = build_pmx_model();
    let mut first = MutableBuffer::new();
    builder.save(&mut first, &factory).unwrap();
    let first_bytes = first.as_slice().to_vec();

    let mut buffer = first.into_buffer();
    let model = Model::load(&mut buffer, &factory).expect("Failed to reparse");
    let mut second = MutableBuffer::new();
    MutableModel::from_model(model)
        .save(&mut second, &factory)
        .unwrap();

    assert_eq!(first_bytes, second.as_slice());
}

#[test]
fn test_pmx_roundtrip_preserves_graph() {
    let factory = StringFactory::new();
    let builder = build_pmx_model();
    let mut sink = MutableBuffer::new();
    builder.save(&mut sink, &factory).unwrap();

    let mut buffer = sink.into_buffer();
    let model = Model::load(&mut buffer, &factory).unwrap();
    assert_eq!(model.format_type(), Some(FormatType::Pmx2_0));
    assert_eq!(model.name(LanguageType::Japanese), "テストモデル");
    assert_eq!(model.name(LanguageType::English), "Test Model");
    assert_eq!(model.additional_uv_size(), 1);
    assert_eq!(model.vertices().len(), 3);
    assert_eq!(model.vertex_indices(), &[0, 1, 2]);
    assert_eq!(model.materials().len(), 1);
    assert_eq!(model.bones().len(), 2);

    let vertex = &model.vertices()[2];
    assert_eq!(vertex.vertex_type, VertexType::Sdef);
    assert_eq!(vertex.sdef_c, Vec3::new(0.0, 0.5, 0.0));

    let arm = &model.bones()[1];
    assert_eq!(arm.name_ja, "右腕");
    assert_eq!(arm.parent_bone_index, 0);
    let constraint = arm.constraint.as_ref().expect("IK constraint lost");
    // The owning bone index is rewritten during the bone table pass
    assert_eq!(constraint.target_bone_index, 1);
    assert_eq!(constraint.effector_bone_index, 0);
    assert_eq!(constraint.joints.len(), 1);
    assert!(constraint.joints[0].has_angle_limit);

    // Parent chains resolve within the same model and terminate
    let chain: Vec<&str> = model
        .bone_ancestors(1)
        .map(|bone| bone.name_ja.as_str())
        .collect();
    assert_eq!(chain, vec!["右腕", "センター"]);
}

#[test]
fn test_pmx21_soft_body_roundtrip() {
    let factory = StringFactory::new();
    let mut builder = build_pmx_model();
    builder.set_format_type(FormatType::Pmx2_1);

    let mut soft_body = SoftBody::default();
    soft_body.name_ja = "スカート".to_string();
    soft_body.material_index = 0;
    soft_body.total_mass = 1.0;
    soft_body.anchors.push(SoftBodyAnchor {
        rigid_body_index: 0,
        vertex_index: 0,
        is_near_enabled: true,
    });
    soft_body.pinned_vertex_indices = vec![0, 2];
    builder.insert_soft_body(soft_body, -1).unwrap();

    let mut first = MutableBuffer::new();
    builder.save(&mut first, &factory).unwrap();
    let first_bytes = first.as_slice().to_vec();

    let mut buffer = first.into_buffer();
    let model = Model::load(&mut buffer, &factory).unwrap();
    assert_eq!(model.format_type(), Some(FormatType::Pmx2_1));
    assert_eq!(model.soft_bodies().len(), 1);
    assert_eq!(model.soft_bodies()[0].pinned_vertex_indices, vec![0, 2]);

    let mut second = MutableBuffer::new();
    MutableModel::from_model(model)
        .save(&mut second, &factory)
        .unwrap();
    assert_eq!(first_bytes, second.as_slice());
}

#[test]
fn test_soft_body_rejected_for_pmx20() {
    let factory = StringFactory::new();
    let mut builder = build_pmx_model();
    builder.insert_soft_body(SoftBody::default(), -1).unwrap();
    let mut sink = MutableBuffer::new();
    assert_eq!(
        builder.save(&mut sink, &factory).unwrap_err(),
        Status::ModelVersionIncompatible
    );
}

#[test]
fn test_out_of_range_bone_reference_is_corruption() {
    let factory = StringFactory::new();
    let mut builder = MutableModel::new();
    let mut bone = Bone::default();
    bone.name_ja = "a".to_string();
    bone.parent_bone_index = 5;
    builder.insert_bone(bone, -1).unwrap();

    let mut sink = MutableBuffer::new();
    builder.save(&mut sink, &factory).unwrap();
    let mut buffer = sink.into_buffer();
    assert_eq!(
        Model::load(&mut buffer, &factory).unwrap_err(),
        Status::ModelBoneCorrupted
    );
}

fn build_pmd_model() -> MutableModel {
    let mut builder = MutableModel::new();
    builder.set_format_type(FormatType::Pmd1_0);
    builder.set_codec_kind(CodecKind::Sjis);
    builder.set_name(LanguageType::Japanese, "テスト");
    builder.set_name(LanguageType::English, "Test");
    builder.set_comment(LanguageType::Japanese, "コメント");
    builder.set_comment(LanguageType::English, "comment");

    for index in 0..3 {
        let mut vertex = Vertex::default();
        vertex.origin = Vec3::new(index as f32, 0.0, 0.0);
        vertex.normal = Vec3::new(0.0, 1.0, 0.0);
        vertex.uv = Vec2::new(0.25, 0.75);
        vertex.vertex_type = VertexType::Bdef2;
        vertex.bone_indices = [0, 1, -1, -1];
        let weight = 40.0f32 / 100.0;
        vertex.bone_weights = Vec4::new(weight, 1.0 - weight, 0.0, 0.0);
        vertex.edge_size = 1.0;
        builder.insert_vertex(vertex, -1).unwrap();
    }
    builder.set_vertex_indices(vec![0, 1, 2]);

    builder
        .insert_texture(Texture::new("body.bmp"), -1)
        .unwrap();
    builder
        .insert_texture(Texture::new("body.sph"), -1)
        .unwrap();

    let mut material = Material::default();
    material.diffuse_color = Vec3::new(1.0, 1.0, 1.0);
    material.diffuse_opacity = 1.0;
    material.specular_power = 5.0;
    material.specular_color = Vec3::new(0.5, 0.5, 0.5);
    material.ambient_color = Vec3::new(0.25, 0.25, 0.25);
    material.is_toon_shared = true;
    material.toon_texture_index = 2;
    material.flags.is_edge_enabled = true;
    material.num_vertex_indices = 3;
    material.diffuse_texture_index = 0;
    material.sphere_map_texture_index = 1;
    material.sphere_map_texture_type = mmdio::model::SphereMapTextureType::Multiply;
    builder.insert_material(material, -1).unwrap();

    let mut center = Bone::default();
    center.name_ja = "センター".to_string();
    center.name_en = "center".to_string();
    center.bone_type = BoneType::RotatableAndMovable;
    builder.insert_bone(center, -1).unwrap();

    let mut arm = Bone::default();
    arm.name_ja = "右腕".to_string();
    arm.name_en = "arm_r".to_string();
    arm.origin = Vec3::new(1.0, 2.0, 0.0);
    arm.parent_bone_index = 0;
    arm.target_bone_index = 0;
    arm.bone_type = BoneType::Rotatable;
    builder.insert_bone(arm, -1).unwrap();

    builder
        .insert_constraint(
            Constraint {
                effector_bone_index: 0,
                target_bone_index: 1,
                num_iterations: 30,
                angle_limit: 1.0,
                joints: [ConstraintJoint {
                    bone_index: 0,
                    ..Default::default()
                }]
                .into_iter()
                .collect(),
            },
            -1,
        )
        .unwrap();

    let mut base = Morph::default();
    base.name_ja = "base".to_string();
    base.category = MorphCategory::Base;
    base.morph_type = MorphType::Vertex;
    base.units = MorphUnits::Vertices(vec![
        VertexMorph {
            vertex_index: 0,
            relative_index: 0,
            position: Vec3::new(0.0, 0.0, 0.0),
        },
        VertexMorph {
            vertex_index: 2,
            relative_index: 2,
            position: Vec3::new(0.0, 0.0, 0.0),
        },
    ]);
    builder.insert_morph(base, -1).unwrap();

    let mut eye = Morph::default();
    eye.name_ja = "まばたき".to_string();
    eye.name_en = "blink".to_string();
    eye.category = MorphCategory::Eye;
    eye.morph_type = MorphType::Vertex;
    eye.units = MorphUnits::Vertices(vec![VertexMorph {
        vertex_index: 2,
        relative_index: 1,
        position: Vec3::new(0.0, -0.1, 0.0),
    }]);
    builder.insert_morph(eye, -1).unwrap();

    let mut expression = Label::default();
    expression.name_ja = "表情".to_string();
    expression.name_en = "Expression".to_string();
    expression.is_special = true;
    expression.items.push(LabelItem::Morph(1));
    builder.insert_label(expression, -1).unwrap();

    let mut body_label = Label::default();
    body_label.name_ja = "体".to_string();
    body_label.name_en = "Body".to_string();
    body_label.items.push(LabelItem::Bone(0));
    body_label.items.push(LabelItem::Bone(1));
    builder.insert_label(body_label, -1).unwrap();

    let mut rigid_body = RigidBody::default();
    rigid_body.name_ja = "上半身".to_string();
    rigid_body.bone_index = 0;
    rigid_body.mass = 1.0;
    rigid_body.is_bone_relative = true;
    builder.insert_rigid_body(rigid_body, -1).unwrap();

    let mut joint = Joint::default();
    joint.name_ja = "接続".to_string();
    joint.rigid_body_a_index = 0;
    joint.rigid_body_b_index = 0;
    builder.insert_joint(joint, -1).unwrap();

    builder
}

#[test]
fn test_pmd_roundtrip_is_byte_identical() {
    let factory = StringFactory::new();
    let builder = build_pmd_model();
    let mut first = MutableBuffer::new();
    builder.save(&mut first, &factory).unwrap();
    let first_bytes = first.as_slice().to_vec();

    let mut buffer = first.into_buffer();
    let model = Model::load(&mut buffer, &factory).expect("Failed to reparse PMD");
    assert_eq!(model.format_type(), Some(FormatType::Pmd1_0));

    let mut second = MutableBuffer::new();
    MutableModel::from_model(model)
        .save(&mut second, &factory)
        .unwrap();
    assert_eq!(first_bytes, second.as_slice());
}

#[test]
fn test_pmd_normalizes_into_unified_graph() {
    let factory = StringFactory::new();
    let builder = build_pmd_model();
    let mut sink = MutableBuffer::new();
    builder.save(&mut sink, &factory).unwrap();

    let mut buffer = sink.into_buffer();
    // Auto-detection tries PMX first, then falls back to PMD
    let model = Model::load(&mut buffer, &factory).unwrap();
    assert_eq!(model.codec_kind(), CodecKind::Sjis);
    assert_eq!(model.name(LanguageType::Japanese), "テスト");
    assert_eq!(model.name(LanguageType::English), "Test");

    let vertex = &model.vertices()[0];
    assert_eq!(vertex.vertex_type, VertexType::Bdef2);
    assert_eq!(vertex.bone_weights.x, 0.4);
    assert_eq!(vertex.bone_weights.y, 1.0 - 0.4);

    // The packed "diffuse*sphere" texture path splits into two entries
    assert_eq!(model.textures().len(), 2);
    assert_eq!(model.textures()[0].path, "body.bmp");
    assert_eq!(model.textures()[1].path, "body.sph");
    let material = &model.materials()[0];
    assert_eq!(material.diffuse_texture_index, 0);
    assert_eq!(material.sphere_map_texture_index, 1);
    assert!(material.is_toon_shared);

    // Stand-alone IK constraints
    assert_eq!(model.constraints().len(), 1);
    assert_eq!(model.constraints()[0].target_bone_index, 1);

    // PMD morphs become vertex morphs resolved through the base morph
    assert_eq!(model.morphs().len(), 2);
    let eye = &model.morphs()[1];
    match &eye.units {
        MorphUnits::Vertices(units) => {
            assert_eq!(units[0].relative_index, 1);
            assert_eq!(units[0].vertex_index, 2);
        }
        _ => panic!("PMD morph must normalize to a vertex morph"),
    }

    // Display lists become labels: expression first, then bone frames
    assert_eq!(model.labels().len(), 2);
    assert!(model.labels()[0].is_special);
    assert_eq!(model.labels()[1].name_ja, "体");
    assert_eq!(model.labels()[1].name_en, "Body");
    assert_eq!(model.labels()[1].items.len(), 2);

    assert!(model.rigid_bodies()[0].is_bone_relative);
}
