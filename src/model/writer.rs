//! PMX serialization.
//!
//! The writer re-derives every reference index from the model's current
//! table order and picks the minimal per-table index width the format
//! allows, so an edited graph serializes consistently regardless of how
//! it was built.

use tracing::debug;

use crate::util::{CodecKind, MutableBuffer, Result, Status, StringCodec};

use super::{FormatType, Model, ModelInfo, PmxWriteContext, PMX_INFO_LENGTH, PMX_SIGNATURE};

/// Width of an unsigned index (vertex references).
fn unsigned_index_size(count: usize) -> usize {
    if count <= 0xff {
        1
    } else if count <= 0xffff {
        2
    } else {
        4
    }
}

/// Width of a nullable signed index; the all-ones pattern is reserved
/// for -1, so one byte only covers 127 entries.
fn signed_index_size(count: usize) -> usize {
    if count < 0x80 {
        1
    } else if count < 0x8000 {
        2
    } else {
        4
    }
}

pub(crate) fn save(model: &Model, buffer: &mut MutableBuffer, codec: &dyn StringCodec) -> Result<()> {
    let format_type = match model.format_type {
        Some(FormatType::Pmx2_0) => FormatType::Pmx2_0,
        Some(FormatType::Pmx2_1) => FormatType::Pmx2_1,
        _ => return Err(Status::ModelVersionIncompatible),
    };
    if format_type == FormatType::Pmx2_0 && !model.soft_bodies.is_empty() {
        return Err(Status::ModelVersionIncompatible);
    }
    // PMX carries UTF-8 or UTF-16 text only
    let codec_kind = match model.codec_kind {
        CodecKind::Utf8 => CodecKind::Utf8,
        _ => CodecKind::Utf16,
    };
    let info = ModelInfo {
        codec_kind,
        additional_uv_size: model.additional_uv_size,
        vertex_index_size: unsigned_index_size(model.vertices.len()),
        texture_index_size: signed_index_size(model.textures.len()),
        material_index_size: signed_index_size(model.materials.len()),
        bone_index_size: signed_index_size(model.bones.len()),
        morph_index_size: signed_index_size(model.morphs.len()),
        rigid_body_index_size: signed_index_size(model.rigid_bodies.len()),
    };
    let ctx = PmxWriteContext { info, codec };

    buffer.write_u32(PMX_SIGNATURE);
    buffer.write_f32(format_type.version());
    buffer.write_u8(PMX_INFO_LENGTH);
    buffer.write_u8(match codec_kind {
        CodecKind::Utf8 => 1,
        _ => 0,
    });
    buffer.write_u8(info.additional_uv_size);
    buffer.write_u8(info.vertex_index_size as u8);
    buffer.write_u8(info.texture_index_size as u8);
    buffer.write_u8(info.material_index_size as u8);
    buffer.write_u8(info.bone_index_size as u8);
    buffer.write_u8(info.morph_index_size as u8);
    buffer.write_u8(info.rigid_body_index_size as u8);
    ctx.write_string(buffer, &model.name_ja)?;
    ctx.write_string(buffer, &model.name_en)?;
    ctx.write_string(buffer, &model.comment_ja)?;
    ctx.write_string(buffer, &model.comment_en)?;

    buffer.write_u32(model.vertices.len() as u32);
    for vertex in &model.vertices {
        vertex.write_pmx(&ctx, buffer);
    }

    buffer.write_u32(model.vertex_indices.len() as u32);
    for &vertex_index in &model.vertex_indices {
        buffer.write_integer(vertex_index as i32, info.vertex_index_size);
    }

    buffer.write_u32(model.textures.len() as u32);
    for texture in &model.textures {
        texture.write_pmx(&ctx, buffer)?;
    }

    buffer.write_u32(model.materials.len() as u32);
    for material in &model.materials {
        material.write_pmx(&ctx, buffer)?;
    }

    buffer.write_u32(model.bones.len() as u32);
    for bone in &model.bones {
        bone.write_pmx(&ctx, buffer)?;
    }

    buffer.write_u32(model.morphs.len() as u32);
    for morph in &model.morphs {
        morph.write_pmx(&ctx, buffer)?;
    }

    buffer.write_u32(model.labels.len() as u32);
    for label in &model.labels {
        label.write_pmx(&ctx, buffer)?;
    }

    buffer.write_u32(model.rigid_bodies.len() as u32);
    for rigid_body in &model.rigid_bodies {
        rigid_body.write_pmx(&ctx, buffer)?;
    }

    buffer.write_u32(model.joints.len() as u32);
    for joint in &model.joints {
        joint.write_pmx(&ctx, buffer)?;
    }

    if format_type == FormatType::Pmx2_1 {
        buffer.write_u32(model.soft_bodies.len() as u32);
        for soft_body in &model.soft_bodies {
            soft_body.write_pmx(&ctx, buffer)?;
        }
    }

    debug!(bytes = buffer.len(), "saved PMX model");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_width_derivation() {
        assert_eq!(unsigned_index_size(0xff), 1);
        assert_eq!(unsigned_index_size(0x100), 2);
        assert_eq!(unsigned_index_size(0xffff), 2);
        assert_eq!(unsigned_index_size(0x1_0000), 4);
        assert_eq!(signed_index_size(0x7f), 1);
        assert_eq!(signed_index_size(0x80), 2);
        assert_eq!(signed_index_size(0x8000), 4);
    }
}
