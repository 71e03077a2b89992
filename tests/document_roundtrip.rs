//! Integration tests for the document codec: ordered containers,
//! sibling linkage, model resolution and byte-exact round-trips.

use glam::Vec3;

use mmdio::document::{
    DocumentAccessory, DocumentCameraKeyframe, DocumentGravityKeyframe, DocumentLightKeyframe,
    DocumentModel, DocumentModelBoneKeyframe, DocumentModelKeyframe, DocumentModelMorphKeyframe,
    DocumentSelfShadowKeyframe,
};
use mmdio::document::{BoneState, ConstraintState, MorphState, OutsideParentState};
use mmdio::model::{Bone, Vertex};
use mmdio::{
    Buffer, Document, DocumentFormatType, FormatType, Model, ModelResolver, MutableBuffer,
    MutableDocument, MutableModel, Status, StringCodec, StringFactory,
};

/// Resolver stub: documents in the current format reference models by
/// path only, so tests hand back an empty graph.
struct StubResolver;

impl ModelResolver for StubResolver {
    fn resolve(&mut self, _path: &str, _codec: &dyn StringCodec) -> mmdio::Result<Model> {
        Ok(Model::default())
    }
}

/// Resolver that refuses every path.
struct FailingResolver;

impl ModelResolver for FailingResolver {
    fn resolve(&mut self, _path: &str, _codec: &dyn StringCodec) -> mmdio::Result<Model> {
        Err(Status::DocumentModelResolutionFailed)
    }
}

fn build_document() -> MutableDocument {
    let mut builder = MutableDocument::new();
    {
        let document = builder.document_mut();
        document.output_width = 1920;
        document.output_height = 1080;
        document.timeline_fps = 30.0;
        document.current_frame_index = 42;
        document.is_loop_enabled = true;
        document.is_grid_and_axis_shown = true;
        document.playback_range_begin = 0;
        document.playback_range_end = 300;
    }
    builder.camera_mut().distance = 45.0;
    builder.camera_mut().lookat = Vec3::new(0.0, 10.0, 0.0);
    builder.light_mut().color = Vec3::splat(0.6);
    builder.gravity_mut().acceleration = 9.8;
    builder.self_shadow_mut().mode = 1;

    let mut camera_keyframe = DocumentCameraKeyframe::new(0);
    camera_keyframe.distance = 45.0;
    builder.insert_camera_keyframe(camera_keyframe).unwrap();
    builder
        .insert_light_keyframe(DocumentLightKeyframe::new(0))
        .unwrap();
    builder
        .insert_gravity_keyframe(DocumentGravityKeyframe::new(0))
        .unwrap();
    builder
        .insert_self_shadow_keyframe(DocumentSelfShadowKeyframe::new(0))
        .unwrap();

    let mut accessory = DocumentAccessory::new("ステージ");
    accessory.path = "accessories/stage.x".to_string();
    accessory.scale_factor = 1.0;
    builder.insert_accessory(accessory, -1).unwrap();

    let mut model = DocumentModel::new("ミク", Model::default());
    model.path = "models/miku.pmx".to_string();
    model.bone_names = vec!["センター".to_string(), "右腕".to_string()];
    model.morph_names = vec!["まばたき".to_string()];
    model.bone_states.push(BoneState::new(0));
    model.morph_states.push(MorphState {
        morph_id: 0,
        weight: 0.5,
    });
    model.constraint_states.push(ConstraintState {
        bone_id: 1,
        enabled: true,
    });
    model.outside_parent_states.push(OutsideParentState {
        begin_frame_index: 0,
        end_frame_index: 100,
        subject_bone_id: 1,
        target_model_index: -1,
        target_bone_name: String::new(),
    });
    builder.insert_model(model, -1).unwrap();

    builder
        .insert_model_bone_keyframe(0, DocumentModelBoneKeyframe::new(0, 0))
        .unwrap();
    builder
        .insert_model_bone_keyframe(0, DocumentModelBoneKeyframe::new(0, 30))
        .unwrap();
    builder
        .insert_model_bone_keyframe(0, DocumentModelBoneKeyframe::new(1, 15))
        .unwrap();
    builder
        .insert_model_morph_keyframe(0, DocumentModelMorphKeyframe::new(0, 0))
        .unwrap();
    builder
        .insert_model_keyframe(0, DocumentModelKeyframe::new(0))
        .unwrap();

    builder
}

#[test]
fn test_document_roundtrip_is_byte_identical() {
    let factory = StringFactory::new();
    let builder = build_document();
    let mut first = MutableBuffer::new();
    builder.save(&mut first, &factory).unwrap();
    let first_bytes = first.as_slice().to_vec();

    let mut buffer = first.into_buffer();
    let document = Document::load(&mut buffer, &factory, &mut StubResolver)
        .expect("Failed to reparse document");
    assert_eq!(document.format_type(), Some(DocumentFormatType::Current));

    let mut second = MutableBuffer::new();
    MutableDocument::from_document(document)
        .save(&mut second, &factory)
        .unwrap();
    assert_eq!(first_bytes, second.as_slice());
}

#[test]
fn test_document_roundtrip_preserves_scene() {
    let factory = StringFactory::new();
    let builder = build_document();
    let mut sink = MutableBuffer::new();
    builder.save(&mut sink, &factory).unwrap();

    let mut buffer = sink.into_buffer();
    let document = Document::load(&mut buffer, &factory, &mut StubResolver).unwrap();
    assert_eq!(document.output_width, 1920);
    assert_eq!(document.output_height, 1080);
    assert!(document.is_loop_enabled);
    assert!(document.is_grid_and_axis_shown);
    assert!(!document.is_information_shown);
    assert_eq!(document.playback_range_end, 300);
    assert_eq!(document.camera().distance, 45.0);
    assert_eq!(document.accessories().len(), 1);
    assert_eq!(document.accessories()[0].name, "ステージ");

    let model = &document.models()[0];
    assert_eq!(model.name, "ミク");
    assert_eq!(model.bone_names, vec!["センター", "右腕"]);
    assert_eq!(model.bone_keyframes().len(), 3);
    assert_eq!(model.bone_id("右腕"), Some(1));
    assert!(model.find_bone_keyframe("センター", 30).is_some());
    assert_eq!(model.morph_keyframes().len(), 1);
    assert_eq!(model.outside_parent_states.len(), 1);
    assert_eq!(model.outside_parent_states[0].end_frame_index, 100);
}

#[test]
fn test_sibling_linkage_is_consistent() {
    let mut builder = MutableDocument::new();
    for frame in [10u32, 0, 20] {
        builder
            .insert_camera_keyframe(DocumentCameraKeyframe::new(frame))
            .unwrap();
    }
    let keyframes = builder.as_document().camera().keyframes();
    assert_eq!(keyframes.len(), 3);
    for (position, keyframe) in keyframes.iter().enumerate() {
        if keyframe.links.next >= 0 {
            let next = &keyframes[keyframe.links.next as usize];
            assert_eq!(next.links.previous, position as i32);
            assert!(next.base.frame_index > keyframe.base.frame_index);
        }
        if keyframe.links.previous >= 0 {
            let previous = &keyframes[keyframe.links.previous as usize];
            assert_eq!(previous.links.next, position as i32);
        }
    }
    // Chain: frame 0 -> 10 -> 20, terminating both ways
    let first = keyframes
        .iter()
        .find(|keyframe| keyframe.base.frame_index == 0)
        .unwrap();
    assert_eq!(first.links.previous, -1);
    let last = keyframes
        .iter()
        .find(|keyframe| keyframe.base.frame_index == 20)
        .unwrap();
    assert_eq!(last.links.next, -1);
}

#[test]
fn test_accessory_ordering_and_removal() {
    let mut builder = MutableDocument::new();
    builder
        .insert_accessory(DocumentAccessory::new("first"), -1)
        .unwrap();
    builder
        .insert_accessory(DocumentAccessory::new("second"), 1)
        .unwrap();
    builder
        .insert_accessory(DocumentAccessory::new("third"), 0)
        .unwrap();
    let names: Vec<&str> = builder
        .as_document()
        .accessories()
        .iter()
        .map(|accessory| accessory.name.as_str())
        .collect();
    assert_eq!(names, vec!["third", "first", "second"]);

    builder.remove_accessory("first").unwrap();
    assert_eq!(
        builder.remove_accessory("first").unwrap_err(),
        Status::DocumentAccessoryNotFound
    );
    assert_eq!(builder.as_document().accessories().len(), 2);
}

#[test]
fn test_duplicate_document_keyframe_is_rejected() {
    let mut builder = MutableDocument::new();
    builder
        .insert_camera_keyframe(DocumentCameraKeyframe::new(0))
        .unwrap();
    assert_eq!(
        builder
            .insert_camera_keyframe(DocumentCameraKeyframe::new(0))
            .unwrap_err(),
        Status::DocumentKeyframeAlreadyExists
    );
    assert_eq!(
        builder.remove_camera_keyframe(99).unwrap_err(),
        Status::DocumentKeyframeNotFound
    );
}

#[test]
fn test_resolution_failure_aborts_load() {
    let factory = StringFactory::new();
    let builder = build_document();
    let mut sink = MutableBuffer::new();
    builder.save(&mut sink, &factory).unwrap();

    let mut buffer = sink.into_buffer();
    assert_eq!(
        Document::load(&mut buffer, &factory, &mut FailingResolver).unwrap_err(),
        Status::DocumentModelResolutionFailed
    );
}

/// Minimal valid PMX model for the legacy inline-payload test.
fn build_embedded_model() -> Model {
    let mut builder = MutableModel::new();
    builder.set_format_type(FormatType::Pmx2_0);
    let mut bone = Bone::default();
    bone.name_ja = "センター".to_string();
    builder.insert_bone(bone, -1).unwrap();
    for _ in 0..3 {
        let mut vertex = Vertex::default();
        vertex.bone_indices[0] = 0;
        vertex.bone_weights.x = 1.0;
        builder.insert_vertex(vertex, -1).unwrap();
    }
    builder.set_vertex_indices(vec![0, 1, 2]);
    builder.into_model()
}

#[test]
fn test_legacy_document_embeds_model_payload() {
    let factory = StringFactory::new();
    let mut builder = MutableDocument::new();
    builder.set_format_type(DocumentFormatType::Legacy);
    let mut model = DocumentModel::new("ミク", build_embedded_model());
    model.bone_names = vec!["センター".to_string()];
    builder.insert_model(model, -1).unwrap();

    let mut first = MutableBuffer::new();
    builder.save(&mut first, &factory).unwrap();
    let first_bytes = first.as_slice().to_vec();

    // The default payload resolver parses the inline model; no paths are
    // touched
    let mut buffer = first.into_buffer();
    let document = Document::load(&mut buffer, &factory, &mut StubResolver).unwrap();
    assert_eq!(document.format_type(), Some(DocumentFormatType::Legacy));
    let embedded = &document.models()[0].model;
    assert_eq!(embedded.bones().len(), 1);
    assert_eq!(embedded.bones()[0].name_ja, "センター");

    let mut second = MutableBuffer::new();
    MutableDocument::from_document(document)
        .save(&mut second, &factory)
        .unwrap();
    assert_eq!(first_bytes, second.as_slice());
}
