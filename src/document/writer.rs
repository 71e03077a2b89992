//! Document serialization.
//!
//! The mirror image of the loader: sections are written in the same
//! order they are read. Sibling linkage is never serialized; it is
//! derived data recomputed on every load.

use tracing::debug;

use crate::util::{CodecKind, MutableBuffer, Result, StringCodec};

use super::{
    Document, DocumentFormatType, DocumentModel, DOCUMENT_SIGNATURE, DOCUMENT_SIGNATURE_LEGACY,
};

const SIGNATURE_WIDTH: usize = 30;

fn write_string(buffer: &mut MutableBuffer, codec: &dyn StringCodec, text: &str) -> Result<()> {
    let bytes = codec.encode(text, CodecKind::Sjis)?;
    buffer.write_u32(bytes.len() as u32);
    buffer.write_byte_array(&bytes);
    Ok(())
}

pub(crate) fn save(
    document: &Document,
    buffer: &mut MutableBuffer,
    codec: &dyn StringCodec,
) -> Result<()> {
    let format_type = document.format_type.unwrap_or(DocumentFormatType::Current);
    let mut signature = [0u8; SIGNATURE_WIDTH];
    let magic = match format_type {
        DocumentFormatType::Current => DOCUMENT_SIGNATURE,
        DocumentFormatType::Legacy => DOCUMENT_SIGNATURE_LEGACY,
    };
    signature[..magic.len()].copy_from_slice(magic);
    buffer.write_byte_array(&signature);

    buffer.write_u32(document.output_width);
    buffer.write_u32(document.output_height);
    buffer.write_f32(document.timeline_fps);
    buffer.write_u32(document.current_frame_index);
    let flags = (document.is_loop_enabled as u8)
        | (document.is_grid_and_axis_shown as u8) << 1
        | (document.is_information_shown as u8) << 2
        | (document.is_ground_shadow_shown as u8) << 3;
    buffer.write_u8(flags);
    buffer.write_u32(document.playback_range_begin);
    buffer.write_u32(document.playback_range_end);

    let camera = &document.camera;
    buffer.write_f32x3(camera.lookat);
    buffer.write_f32x3(camera.angle);
    buffer.write_f32(camera.distance);
    buffer.write_i32(camera.fov);
    buffer.write_u8(camera.is_perspective_view as u8);
    buffer.write_u32(camera.keyframes.len() as u32);
    for keyframe in &camera.keyframes {
        buffer.write_u32(keyframe.base.frame_index);
        buffer.write_f32x3(keyframe.lookat);
        buffer.write_f32x3(keyframe.angle);
        buffer.write_f32(keyframe.distance);
        buffer.write_i32(keyframe.fov);
        buffer.write_u8(keyframe.is_perspective_view as u8);
        keyframe.interpolation.write_vmd(buffer);
        buffer.write_u8(keyframe.base.is_selected as u8);
    }

    let light = &document.light;
    buffer.write_f32x3(light.color);
    buffer.write_f32x3(light.direction);
    buffer.write_u32(light.keyframes.len() as u32);
    for keyframe in &light.keyframes {
        buffer.write_u32(keyframe.base.frame_index);
        buffer.write_f32x3(keyframe.color);
        buffer.write_f32x3(keyframe.direction);
        buffer.write_u8(keyframe.base.is_selected as u8);
    }

    let gravity = &document.gravity;
    buffer.write_f32(gravity.acceleration);
    buffer.write_i32(gravity.noise);
    buffer.write_f32x3(gravity.direction);
    buffer.write_u8(gravity.is_noise_enabled as u8);
    buffer.write_u32(gravity.keyframes.len() as u32);
    for keyframe in &gravity.keyframes {
        buffer.write_u32(keyframe.base.frame_index);
        buffer.write_f32(keyframe.acceleration);
        buffer.write_i32(keyframe.noise);
        buffer.write_f32x3(keyframe.direction);
        buffer.write_u8(keyframe.is_noise_enabled as u8);
        buffer.write_u8(keyframe.base.is_selected as u8);
    }

    let self_shadow = &document.self_shadow;
    buffer.write_u8(self_shadow.mode as u8);
    buffer.write_f32(self_shadow.distance);
    buffer.write_u32(self_shadow.keyframes.len() as u32);
    for keyframe in &self_shadow.keyframes {
        buffer.write_u32(keyframe.base.frame_index);
        buffer.write_u8(keyframe.mode as u8);
        buffer.write_f32(keyframe.distance);
        buffer.write_u8(keyframe.base.is_selected as u8);
    }

    buffer.write_u32(document.accessories.len() as u32);
    for accessory in &document.accessories {
        write_string(buffer, codec, &accessory.name)?;
        write_string(buffer, codec, &accessory.path)?;
        buffer.write_f32x3(accessory.translation);
        buffer.write_f32x3(accessory.orientation);
        buffer.write_f32(accessory.scale_factor);
        buffer.write_f32(accessory.opacity);
        buffer.write_u8(accessory.is_add_blending_enabled as u8);
        buffer.write_u8(accessory.is_shadow_enabled as u8);
        buffer.write_u8(accessory.visible as u8);
        buffer.write_i32(accessory.parent_model_index);
        write_string(buffer, codec, &accessory.parent_model_bone_name)?;
        buffer.write_u32(accessory.keyframes.len() as u32);
        for keyframe in &accessory.keyframes {
            buffer.write_u32(keyframe.base.frame_index);
            buffer.write_f32x3(keyframe.translation);
            buffer.write_f32x3(keyframe.orientation);
            buffer.write_f32(keyframe.scale_factor);
            buffer.write_f32(keyframe.opacity);
            buffer.write_u8(keyframe.visible as u8);
            buffer.write_i32(keyframe.parent_model_index);
            write_string(buffer, codec, &keyframe.parent_model_bone_name)?;
            buffer.write_u8(keyframe.base.is_selected as u8);
        }
    }

    buffer.write_u32(document.models.len() as u32);
    for model in &document.models {
        write_model(model, format_type, buffer, codec)?;
    }

    debug!(bytes = buffer.len(), "saved document");
    Ok(())
}

fn write_model(
    model: &DocumentModel,
    format_type: DocumentFormatType,
    buffer: &mut MutableBuffer,
    codec: &dyn StringCodec,
) -> Result<()> {
    write_string(buffer, codec, &model.name)?;
    write_string(buffer, codec, &model.path)?;
    if format_type == DocumentFormatType::Legacy {
        // Legacy documents embed the model payload inline
        let mut payload = MutableBuffer::new();
        match model.model.format_type() {
            Some(crate::model::FormatType::Pmd1_0) => {
                crate::model::pmd::save(&model.model, &mut payload, codec)?
            }
            _ => crate::model::writer::save(&model.model, &mut payload, codec)?,
        }
        buffer.write_u32(payload.len() as u32);
        buffer.write_byte_array(payload.as_slice());
    }

    buffer.write_u32(model.bone_names.len() as u32);
    for name in &model.bone_names {
        write_string(buffer, codec, name)?;
    }
    buffer.write_u32(model.morph_names.len() as u32);
    for name in &model.morph_names {
        write_string(buffer, codec, name)?;
    }

    buffer.write_u32(model.bone_keyframes.len() as u32);
    for keyframe in &model.bone_keyframes {
        buffer.write_u32(keyframe.bone_id);
        buffer.write_u32(keyframe.base.frame_index);
        buffer.write_f32x3(keyframe.translation);
        buffer.write_f32(keyframe.orientation.x);
        buffer.write_f32(keyframe.orientation.y);
        buffer.write_f32(keyframe.orientation.z);
        buffer.write_f32(keyframe.orientation.w);
        for curve in [
            keyframe.interpolation.translation_x,
            keyframe.interpolation.translation_y,
            keyframe.interpolation.translation_z,
            keyframe.interpolation.orientation,
        ] {
            buffer.write_byte_array(&curve.to_bytes());
        }
        buffer.write_u8(keyframe.base.is_selected as u8);
    }

    buffer.write_u32(model.morph_keyframes.len() as u32);
    for keyframe in &model.morph_keyframes {
        buffer.write_u32(keyframe.morph_id);
        buffer.write_u32(keyframe.base.frame_index);
        buffer.write_f32(keyframe.weight);
        buffer.write_u8(keyframe.base.is_selected as u8);
    }

    buffer.write_u32(model.model_keyframes.len() as u32);
    for keyframe in &model.model_keyframes {
        buffer.write_u32(keyframe.base.frame_index);
        buffer.write_u8(keyframe.visible as u8);
        buffer.write_u32(keyframe.constraint_states.len() as u32);
        for (bone_id, enabled) in &keyframe.constraint_states {
            buffer.write_u32(*bone_id);
            buffer.write_u8(*enabled as u8);
        }
        buffer.write_u8(keyframe.base.is_selected as u8);
    }

    buffer.write_u32(model.bone_states.len() as u32);
    for state in &model.bone_states {
        buffer.write_u32(state.bone_id);
        buffer.write_f32x3(state.translation);
        buffer.write_f32(state.orientation.x);
        buffer.write_f32(state.orientation.y);
        buffer.write_f32(state.orientation.z);
        buffer.write_f32(state.orientation.w);
        buffer.write_u8(state.is_physics_simulation_enabled as u8);
    }

    buffer.write_u32(model.morph_states.len() as u32);
    for state in &model.morph_states {
        buffer.write_u32(state.morph_id);
        buffer.write_f32(state.weight);
    }

    buffer.write_u32(model.constraint_states.len() as u32);
    for state in &model.constraint_states {
        buffer.write_u32(state.bone_id);
        buffer.write_u8(state.enabled as u8);
    }

    buffer.write_u32(model.outside_parent_states.len() as u32);
    for state in &model.outside_parent_states {
        buffer.write_u32(state.begin_frame_index);
        buffer.write_u32(state.end_frame_index);
        buffer.write_u32(state.subject_bone_id);
        buffer.write_i32(state.target_model_index);
        write_string(buffer, codec, &state.target_bone_name)?;
    }
    Ok(())
}
