//! Error types shared by all codecs.

use thiserror::Error;

/// Status code for every fallible codec operation.
///
/// Variants are grouped by subsystem. `Corrupted` statuses are fatal to
/// the current load and guarantee that no partially populated graph is
/// returned; `AlreadyExists`/`NotFound` statuses are local mutation
/// failures the caller can recover from.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    // -- Buffer ------------------------------------------------------------
    /// Read past the end of the input buffer (truncated input)
    #[error("Unexpected end of buffer")]
    BufferEnd,

    /// Input has trailing bytes after the last expected section
    #[error("Buffer not fully consumed")]
    BufferNotEnd,

    /// Seek or skip target outside `[0, len]`
    #[error("Buffer seek out of bounds")]
    BufferSeekOutOfBounds,

    // -- Unicode string service --------------------------------------------
    #[error("Failed to decode string bytes")]
    DecodeUnicodeStringFailed,

    #[error("Failed to encode string")]
    EncodeUnicodeStringFailed,

    // -- Model -------------------------------------------------------------
    /// Magic bytes match no supported model format
    #[error("Invalid model signature")]
    InvalidSignature,

    #[error("Unsupported model version: {0}")]
    UnsupportedVersion(u32),

    /// Target sub-format cannot express a feature present in the graph
    #[error("Model version cannot express this content")]
    ModelVersionIncompatible,

    #[error("Model vertex section corrupted")]
    ModelVertexCorrupted,

    #[error("Model face section corrupted")]
    ModelFaceCorrupted,

    #[error("Model texture section corrupted")]
    ModelTextureCorrupted,

    #[error("Model material section corrupted")]
    ModelMaterialCorrupted,

    #[error("Model bone section corrupted")]
    ModelBoneCorrupted,

    #[error("Model constraint section corrupted")]
    ModelConstraintCorrupted,

    #[error("Model morph section corrupted")]
    ModelMorphCorrupted,

    #[error("Model label section corrupted")]
    ModelLabelCorrupted,

    #[error("Model rigid body section corrupted")]
    ModelRigidBodyCorrupted,

    #[error("Model joint section corrupted")]
    ModelJointCorrupted,

    #[error("Model soft body section corrupted")]
    ModelSoftBodyCorrupted,

    #[error("Model vertex not found")]
    ModelVertexNotFound,

    #[error("Model texture not found")]
    ModelTextureNotFound,

    #[error("Model material not found")]
    ModelMaterialNotFound,

    #[error("Model bone not found")]
    ModelBoneNotFound,

    #[error("Model constraint not found")]
    ModelConstraintNotFound,

    #[error("Model morph not found")]
    ModelMorphNotFound,

    #[error("Model label not found")]
    ModelLabelNotFound,

    #[error("Model rigid body not found")]
    ModelRigidBodyNotFound,

    #[error("Model joint not found")]
    ModelJointNotFound,

    #[error("Model soft body not found")]
    ModelSoftBodyNotFound,

    // -- Motion ------------------------------------------------------------
    /// Signature does not match any supported motion format
    #[error("Invalid motion format")]
    MotionFormatInvalid,

    #[error("Motion target model name corrupted")]
    MotionTargetNameCorrupted,

    #[error("Motion bone keyframe section corrupted")]
    MotionBoneKeyframeCorrupted,

    #[error("Motion camera keyframe section corrupted")]
    MotionCameraKeyframeCorrupted,

    #[error("Motion light keyframe section corrupted")]
    MotionLightKeyframeCorrupted,

    #[error("Motion model keyframe section corrupted")]
    MotionModelKeyframeCorrupted,

    #[error("Motion morph keyframe section corrupted")]
    MotionMorphKeyframeCorrupted,

    #[error("Motion self shadow keyframe section corrupted")]
    MotionSelfShadowKeyframeCorrupted,

    #[error("Motion accessory keyframe already exists")]
    MotionAccessoryKeyframeAlreadyExists,

    #[error("Motion bone keyframe already exists")]
    MotionBoneKeyframeAlreadyExists,

    #[error("Motion camera keyframe already exists")]
    MotionCameraKeyframeAlreadyExists,

    #[error("Motion light keyframe already exists")]
    MotionLightKeyframeAlreadyExists,

    #[error("Motion model keyframe already exists")]
    MotionModelKeyframeAlreadyExists,

    #[error("Motion morph keyframe already exists")]
    MotionMorphKeyframeAlreadyExists,

    #[error("Motion self shadow keyframe already exists")]
    MotionSelfShadowKeyframeAlreadyExists,

    #[error("Motion accessory keyframe not found")]
    MotionAccessoryKeyframeNotFound,

    #[error("Motion bone keyframe not found")]
    MotionBoneKeyframeNotFound,

    #[error("Motion camera keyframe not found")]
    MotionCameraKeyframeNotFound,

    #[error("Motion light keyframe not found")]
    MotionLightKeyframeNotFound,

    #[error("Motion model keyframe not found")]
    MotionModelKeyframeNotFound,

    #[error("Motion morph keyframe not found")]
    MotionMorphKeyframeNotFound,

    #[error("Motion self shadow keyframe not found")]
    MotionSelfShadowKeyframeNotFound,

    // -- Document ----------------------------------------------------------
    /// Signature does not match any supported document sub-version
    #[error("Invalid document format")]
    DocumentFormatInvalid,

    #[error("Document settings section corrupted")]
    DocumentSettingsCorrupted,

    #[error("Document model section corrupted")]
    DocumentModelCorrupted,

    #[error("Document accessory section corrupted")]
    DocumentAccessoryCorrupted,

    #[error("Document camera section corrupted")]
    DocumentCameraCorrupted,

    #[error("Document light section corrupted")]
    DocumentLightCorrupted,

    #[error("Document gravity section corrupted")]
    DocumentGravityCorrupted,

    #[error("Document self shadow section corrupted")]
    DocumentSelfShadowCorrupted,

    #[error("Document outside parent section corrupted")]
    DocumentOutsideParentCorrupted,

    /// The injected model resolver failed for an embedded model path
    #[error("Document model resolution failed")]
    DocumentModelResolutionFailed,

    #[error("Document model not found")]
    DocumentModelNotFound,

    #[error("Document accessory not found")]
    DocumentAccessoryNotFound,

    #[error("Document keyframe already exists")]
    DocumentKeyframeAlreadyExists,

    #[error("Document keyframe not found")]
    DocumentKeyframeNotFound,

    // -- Mutation protocol -------------------------------------------------
    /// Insertion index is outside the container's current bounds
    #[error("Insertion index {index} out of bounds (count: {count})")]
    InsertionIndexOutOfBounds { index: i32, count: usize },
}

impl Status {
    /// Whether this status denotes structural corruption of the input.
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            Self::BufferEnd
                | Self::BufferNotEnd
                | Self::ModelVertexCorrupted
                | Self::ModelFaceCorrupted
                | Self::ModelTextureCorrupted
                | Self::ModelMaterialCorrupted
                | Self::ModelBoneCorrupted
                | Self::ModelConstraintCorrupted
                | Self::ModelMorphCorrupted
                | Self::ModelLabelCorrupted
                | Self::ModelRigidBodyCorrupted
                | Self::ModelJointCorrupted
                | Self::ModelSoftBodyCorrupted
                | Self::MotionTargetNameCorrupted
                | Self::MotionBoneKeyframeCorrupted
                | Self::MotionCameraKeyframeCorrupted
                | Self::MotionLightKeyframeCorrupted
                | Self::MotionModelKeyframeCorrupted
                | Self::MotionMorphKeyframeCorrupted
                | Self::MotionSelfShadowKeyframeCorrupted
                | Self::DocumentSettingsCorrupted
                | Self::DocumentModelCorrupted
                | Self::DocumentAccessoryCorrupted
                | Self::DocumentCameraCorrupted
                | Self::DocumentLightCorrupted
                | Self::DocumentGravityCorrupted
                | Self::DocumentSelfShadowCorrupted
                | Self::DocumentOutsideParentCorrupted
        )
    }
}

/// Result type alias for codec operations.
pub type Result<T> = std::result::Result<T, Status>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_display() {
        assert!(Status::BufferEnd.to_string().contains("end of buffer"));
        let s = Status::InsertionIndexOutOfBounds { index: 7, count: 3 };
        assert!(s.to_string().contains("7"));
        assert!(s.to_string().contains("3"));
    }

    #[test]
    fn test_corruption_classification() {
        assert!(Status::ModelBoneCorrupted.is_corruption());
        assert!(Status::BufferEnd.is_corruption());
        assert!(!Status::MotionBoneKeyframeAlreadyExists.is_corruption());
        assert!(!Status::ModelBoneNotFound.is_corruption());
    }
}
