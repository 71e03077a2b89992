//! Integration tests for the VMD motion codec: parsing, queries,
//! mutation protocol and byte-exact round-trips.

use glam::{Quat, Vec3};

use mmdio::motion::{
    BoneKeyframe, CameraKeyframe, Curve, LightKeyframe, ModelConstraintState, ModelKeyframe,
    MorphKeyframe, SelfShadowKeyframe,
};
use mmdio::{Buffer, Motion, MutableBuffer, MutableMotion, Status, StringFactory};

const SIGNATURE: &[u8] = b"Vocaloid Motion Data 0002";

/// Hand-build a minimal VMD header: 30-byte signature + 20-byte target
/// model name.
fn vmd_header(model_name: &str) -> Vec<u8> {
    let mut bytes = vec![0u8; 30];
    bytes[..SIGNATURE.len()].copy_from_slice(SIGNATURE);
    let mut name = [0u8; 20];
    name[..model_name.len()].copy_from_slice(model_name.as_bytes());
    bytes.extend_from_slice(&name);
    bytes
}

#[test]
fn test_load_two_zero_filled_bone_keyframes() {
    let factory = StringFactory::new();
    let mut bytes = vmd_header("test");
    bytes.extend_from_slice(&2u32.to_le_bytes());
    // Two zero-filled 111-byte bone keyframe records
    bytes.extend_from_slice(&[0u8; 222]);

    let mut buffer = Buffer::new(bytes);
    let motion = Motion::load(&mut buffer, 0, &factory).expect("Failed to load motion");
    assert_eq!(motion.target_model_name(), "test");
    assert_eq!(motion.bone_keyframes().len(), 2);

    // Copying every bone keyframe into a fresh motion must succeed and
    // never report a duplicate
    let mut copy = MutableMotion::new();
    copy.copy_all_bone_keyframes(&motion)
        .expect("Copy must not report duplicates");
}

#[test]
fn test_invalid_signature_is_rejected() {
    let factory = StringFactory::new();
    let mut buffer = Buffer::new(vec![0u8; 50]);
    assert_eq!(
        Motion::load(&mut buffer, 0, &factory).unwrap_err(),
        Status::MotionFormatInvalid
    );
}

#[test]
fn test_load_offset_reanchors_frames() {
    let factory = StringFactory::new();
    let mut builder = MutableMotion::new();
    builder.set_target_model_name("test");
    builder
        .insert_bone_keyframe(BoneKeyframe::new("center", 5))
        .unwrap();
    let mut sink = MutableBuffer::new();
    builder.save(&mut sink, &factory).unwrap();

    let mut buffer = sink.into_buffer();
    let motion = Motion::load(&mut buffer, 10, &factory).unwrap();
    assert!(motion.find_bone_keyframe("center", 15).is_some());
    assert!(motion.find_bone_keyframe("center", 5).is_none());
    assert_eq!(motion.max_frame_index(), 15);
}

#[test]
fn test_duplicate_insert_rejected_and_track_unchanged() {
    let mut builder = MutableMotion::new();
    builder
        .insert_bone_keyframe(BoneKeyframe::new("center", 0))
        .unwrap();
    assert_eq!(
        builder
            .insert_bone_keyframe(BoneKeyframe::new("center", 0))
            .unwrap_err(),
        Status::MotionBoneKeyframeAlreadyExists
    );
    assert_eq!(builder.as_motion().extract_bone_track("center").len(), 1);
}

#[test]
fn test_remove_absent_keyframe_is_noop_failure() {
    let mut builder = MutableMotion::new();
    builder
        .insert_bone_keyframe(BoneKeyframe::new("center", 0))
        .unwrap();
    assert_eq!(
        builder.remove_bone_keyframe("center", 1).unwrap_err(),
        Status::MotionBoneKeyframeNotFound
    );
    assert_eq!(builder.as_motion().bone_keyframes().len(), 1);
}

#[test]
fn test_search_closest_queries() {
    let mut builder = MutableMotion::new();
    for frame in [20u32, 0, 10] {
        builder
            .insert_bone_keyframe(BoneKeyframe::new("arm", frame))
            .unwrap();
    }
    let motion = builder.as_motion();
    assert!(motion.find_bone_keyframe("arm", 10).is_some());
    assert!(motion.find_bone_keyframe("arm", 11).is_none());

    let (previous, next) = motion.search_closest_bone_keyframes("arm", 15);
    assert_eq!(previous.unwrap().base.frame_index, 10);
    assert_eq!(next.unwrap().base.frame_index, 20);

    let (previous, next) = motion.search_closest_bone_keyframes("arm", 20);
    assert_eq!(previous.unwrap().base.frame_index, 20);
    assert!(next.is_none());

    let (previous, next) = motion.search_closest_bone_keyframes("leg", 5);
    assert!(previous.is_none());
    assert!(next.is_none());
}

fn build_full_motion() -> MutableMotion {
    let mut builder = MutableMotion::new();
    builder.set_target_model_name("初音ミク");

    let mut bone = BoneKeyframe::new("センター", 0);
    bone.translation = Vec3::new(1.0, 2.0, 3.0);
    bone.orientation = Quat::from_xyzw(0.0, 0.0, 0.0, 1.0);
    bone.interpolation.translation_x = Curve::from_bytes([10, 30, 90, 100]);
    builder.insert_bone_keyframe(bone).unwrap();
    builder
        .insert_bone_keyframe(BoneKeyframe::new("センター", 30))
        .unwrap();
    builder
        .insert_bone_keyframe(BoneKeyframe::new("右腕", 15))
        .unwrap();

    let mut morph = MorphKeyframe::new("まばたき", 5);
    morph.weight = 0.75;
    builder.insert_morph_keyframe(morph).unwrap();

    let mut camera = CameraKeyframe::new(0);
    camera.distance = -45.0;
    camera.lookat = Vec3::new(0.0, 10.0, 0.0);
    camera.fov = 30;
    camera.is_perspective_view = true;
    camera.interpolation.distance = Curve::from_bytes([64, 64, 64, 64]);
    builder.insert_camera_keyframe(camera).unwrap();

    let mut light = LightKeyframe::new(0);
    light.color = Vec3::new(0.6, 0.6, 0.6);
    light.direction = Vec3::new(-0.5, -1.0, 0.5);
    builder.insert_light_keyframe(light).unwrap();

    let mut self_shadow = SelfShadowKeyframe::new(0);
    self_shadow.mode = 1;
    self_shadow.distance = 8875.0;
    builder.insert_self_shadow_keyframe(self_shadow).unwrap();

    let mut model = ModelKeyframe::new(0);
    model.is_visible = true;
    model.constraint_states.push(ModelConstraintState {
        bone_name: "右足ＩＫ".to_string(),
        enabled: true,
    });
    builder.insert_model_keyframe(model).unwrap();

    builder
}

#[test]
fn test_vmd_roundtrip_is_byte_identical() {
    let factory = StringFactory::new();
    let builder = build_full_motion();
    let mut first = MutableBuffer::new();
    builder.save(&mut first, &factory).unwrap();
    let first_bytes = first.as_slice().to_vec();

    let mut buffer = first.into_buffer();
    let motion = Motion::load(&mut buffer, 0, &factory).unwrap();
    let reparsed = MutableMotion::from_motion(motion);
    let mut second = MutableBuffer::new();
    reparsed.save(&mut second, &factory).unwrap();

    assert_eq!(first_bytes, second.as_slice());
}

#[test]
fn test_vmd_roundtrip_preserves_fields() {
    let factory = StringFactory::new();
    let builder = build_full_motion();
    let mut sink = MutableBuffer::new();
    builder.save(&mut sink, &factory).unwrap();

    let mut buffer = sink.into_buffer();
    let motion = Motion::load(&mut buffer, 0, &factory).unwrap();
    assert_eq!(motion.target_model_name(), "初音ミク");
    assert_eq!(motion.bone_keyframes().len(), 3);

    let keyframe = motion.find_bone_keyframe("センター", 0).unwrap();
    assert_eq!(keyframe.translation, Vec3::new(1.0, 2.0, 3.0));
    assert_eq!(
        keyframe.interpolation.translation_x,
        Curve::from_bytes([10, 30, 90, 100])
    );
    assert!(!keyframe.interpolation.translation_x.is_linear());
    assert!(keyframe.interpolation.orientation.is_linear());

    let morph = motion.find_morph_keyframe("まばたき", 5).unwrap();
    assert_eq!(morph.weight, 0.75);

    let camera = motion.find_camera_keyframe(0).unwrap();
    assert_eq!(camera.distance, -45.0);
    assert!(camera.is_perspective_view);

    let model = motion.find_model_keyframe(0).unwrap();
    assert_eq!(model.constraint_states.len(), 1);
    assert_eq!(model.constraint_states[0].bone_name, "右足ＩＫ");
    assert!(model.constraint_states[0].enabled);
}
