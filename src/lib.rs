//! # mmdio
//!
//! Rust implementation of the MikuMikuDance binary scene-description
//! formats: PMX/PMD models, VMD motions, and the composite scene
//! document embedding both.
//!
//! The original formats and tooling belong to their respective authors.
//! This is an independent implementation aiming at byte-exact
//! round-trips for everything the formats can losslessly represent.
//!
//! ## Modules
//!
//! - [`util`] - buffer I/O, the pluggable string codec, error handling
//! - [`model`] - PMX 2.0/2.1 and PMD 1.0 model codec
//! - [`motion`] - VMD motion codec with frame-ordered keyframe tracks
//! - [`document`] - composite scene documents with injected model resolution
//! - [`mutable`] - owned builders for editing and re-serializing graphs
//!
//! ## Example
//!
//! ```ignore
//! use mmdio::prelude::*;
//!
//! let factory = StringFactory::new();
//! let mut buffer = Buffer::from_file("model.pmx")?;
//! let model = Model::load(&mut buffer, &factory)?;
//!
//! for bone in model.bones() {
//!     println!("{}", bone.name_ja);
//! }
//! ```

pub mod document;
pub mod model;
pub mod motion;
pub mod mutable;
pub mod util;

// Re-export commonly used types
pub use document::{Document, DocumentFormatType, ModelResolver};
pub use model::{FormatType, LanguageType, Model};
pub use motion::Motion;
pub use mutable::{MutableDocument, MutableModel, MutableMotion};
pub use util::{Buffer, CodecKind, MutableBuffer, Result, Status, StringCodec, StringFactory};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::document::{Document, DocumentFormatType, DocumentModel, ModelResolver};
    pub use crate::model::{FormatType, LanguageType, Model};
    pub use crate::motion::{BoneKeyframe, Motion, MorphKeyframe};
    pub use crate::mutable::{MutableDocument, MutableModel, MutableMotion};
    pub use crate::util::{
        Buffer, CodecKind, MutableBuffer, Result, Status, StringCodec, StringFactory,
    };
}
