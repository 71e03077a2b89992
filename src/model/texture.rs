//! Texture path records.

use crate::util::{Buffer, MutableBuffer, Result};

use super::{PmxReadContext, PmxWriteContext};

/// A texture reference: a path relative to the model file.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Texture {
    pub path: String,
}

impl Texture {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    pub(super) fn parse_pmx(ctx: &PmxReadContext, buffer: &mut Buffer) -> Result<Self> {
        Ok(Self {
            path: ctx.read_string(buffer)?,
        })
    }

    pub(super) fn write_pmx(&self, ctx: &PmxWriteContext, buffer: &mut MutableBuffer) -> Result<()> {
        ctx.write_string(buffer, &self.path)
    }
}
