//! Display-frame labels grouping bones and morphs.

use smallvec::SmallVec;

use crate::util::{Buffer, MutableBuffer, Result, Status};

use super::{PmxReadContext, PmxWriteContext};

/// One entry in a label: a reference to a bone or a morph.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LabelItem {
    Bone(i32),
    Morph(i32),
}

/// An ordered display group.
#[derive(Clone, Debug, Default)]
pub struct Label {
    pub name_ja: String,
    pub name_en: String,
    /// Special labels ("Root", the expression panel) are pinned by the
    /// host UI
    pub is_special: bool,
    pub items: SmallVec<[LabelItem; 8]>,
}

impl Label {
    pub(super) fn parse_pmx(ctx: &PmxReadContext, buffer: &mut Buffer) -> Result<Self> {
        let mut label = Label {
            name_ja: ctx.read_string(buffer)?,
            name_en: ctx.read_string(buffer)?,
            is_special: buffer.read_u8()? != 0,
            items: SmallVec::new(),
        };
        let num_items = buffer.read_len()?;
        for _ in 0..num_items {
            let item = match buffer.read_u8()? {
                0 => LabelItem::Bone(buffer.read_integer_nullable(ctx.info.bone_index_size)?),
                1 => LabelItem::Morph(buffer.read_integer_nullable(ctx.info.morph_index_size)?),
                _ => return Err(Status::ModelLabelCorrupted),
            };
            label.items.push(item);
        }
        Ok(label)
    }

    pub(super) fn write_pmx(&self, ctx: &PmxWriteContext, buffer: &mut MutableBuffer) -> Result<()> {
        ctx.write_string(buffer, &self.name_ja)?;
        ctx.write_string(buffer, &self.name_en)?;
        buffer.write_u8(self.is_special as u8);
        buffer.write_u32(self.items.len() as u32);
        for item in &self.items {
            match item {
                LabelItem::Bone(index) => {
                    buffer.write_u8(0);
                    buffer.write_integer(*index, ctx.info.bone_index_size);
                }
                LabelItem::Morph(index) => {
                    buffer.write_u8(1);
                    buffer.write_integer(*index, ctx.info.morph_index_size);
                }
            }
        }
        Ok(())
    }
}
