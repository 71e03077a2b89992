//! VMD serialization.

use tracing::debug;

use crate::util::{encode_fixed, CodecKind, MutableBuffer, Result, StringCodec};

use super::{Motion, VMD_SIGNATURE};

const VMD_SIGNATURE_WIDTH: usize = 30;
const TARGET_NAME_WIDTH: usize = 20;
const KEYFRAME_NAME_WIDTH: usize = 15;
const CONSTRAINT_NAME_WIDTH: usize = 20;

fn write_fixed(
    buffer: &mut MutableBuffer,
    codec: &dyn StringCodec,
    text: &str,
    width: usize,
) -> Result<()> {
    buffer.write_byte_array(&encode_fixed(codec, text, CodecKind::Sjis, width)?);
    Ok(())
}

pub(crate) fn save(motion: &Motion, buffer: &mut MutableBuffer, codec: &dyn StringCodec) -> Result<()> {
    let mut signature = [0u8; VMD_SIGNATURE_WIDTH];
    signature[..VMD_SIGNATURE.len()].copy_from_slice(VMD_SIGNATURE);
    buffer.write_byte_array(&signature);
    write_fixed(buffer, codec, &motion.target_model_name, TARGET_NAME_WIDTH)?;

    buffer.write_u32(motion.bone_keyframes.len() as u32);
    for keyframe in &motion.bone_keyframes {
        write_fixed(buffer, codec, &keyframe.name, KEYFRAME_NAME_WIDTH)?;
        buffer.write_u32(keyframe.base.frame_index);
        buffer.write_f32x3(keyframe.translation);
        buffer.write_f32(keyframe.orientation.x);
        buffer.write_f32(keyframe.orientation.y);
        buffer.write_f32(keyframe.orientation.z);
        buffer.write_f32(keyframe.orientation.w);
        keyframe.interpolation.write_vmd(buffer);
    }

    buffer.write_u32(motion.morph_keyframes.len() as u32);
    for keyframe in &motion.morph_keyframes {
        write_fixed(buffer, codec, &keyframe.name, KEYFRAME_NAME_WIDTH)?;
        buffer.write_u32(keyframe.base.frame_index);
        buffer.write_f32(keyframe.weight);
    }

    buffer.write_u32(motion.camera_keyframes.len() as u32);
    for keyframe in &motion.camera_keyframes {
        buffer.write_u32(keyframe.base.frame_index);
        buffer.write_f32(keyframe.distance);
        buffer.write_f32x3(keyframe.lookat);
        buffer.write_f32x3(keyframe.angle);
        keyframe.interpolation.write_vmd(buffer);
        buffer.write_i32(keyframe.fov);
        buffer.write_u8(!keyframe.is_perspective_view as u8);
    }

    buffer.write_u32(motion.light_keyframes.len() as u32);
    for keyframe in &motion.light_keyframes {
        buffer.write_u32(keyframe.base.frame_index);
        buffer.write_f32x3(keyframe.color);
        buffer.write_f32x3(keyframe.direction);
    }

    buffer.write_u32(motion.self_shadow_keyframes.len() as u32);
    for keyframe in &motion.self_shadow_keyframes {
        buffer.write_u32(keyframe.base.frame_index);
        buffer.write_u8(keyframe.mode as u8);
        buffer.write_f32(keyframe.distance);
    }

    buffer.write_u32(motion.model_keyframes.len() as u32);
    for keyframe in &motion.model_keyframes {
        buffer.write_u32(keyframe.base.frame_index);
        buffer.write_u8(keyframe.is_visible as u8);
        buffer.write_u32(keyframe.constraint_states.len() as u32);
        for state in &keyframe.constraint_states {
            write_fixed(buffer, codec, &state.bone_name, CONSTRAINT_NAME_WIDTH)?;
            buffer.write_u8(state.enabled as u8);
        }
    }

    debug!(bytes = buffer.len(), "saved VMD motion");
    Ok(())
}
