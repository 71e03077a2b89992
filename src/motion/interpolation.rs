//! Bezier interpolation curves for bone and camera keyframes.
//!
//! The formats store each curve as four packed bytes in `[0, 127]`: the
//! two inner control points of a cubic Bezier whose outer points are
//! pinned at (0, 0) and (127, 127).

use glam::Vec4;

use crate::util::{Buffer, MutableBuffer, Result};

/// Inner control points of the linear (identity) curve.
pub const LINEAR_CURVE: [u8; 4] = [20, 20, 107, 107];

/// One packed interpolation curve: `(x1, y1, x2, y2)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Curve {
    pub x1: u8,
    pub y1: u8,
    pub x2: u8,
    pub y2: u8,
}

impl Default for Curve {
    fn default() -> Self {
        Self::from_bytes(LINEAR_CURVE)
    }
}

impl Curve {
    pub fn from_bytes(bytes: [u8; 4]) -> Self {
        Self {
            x1: bytes[0],
            y1: bytes[1],
            x2: bytes[2],
            y2: bytes[3],
        }
    }

    pub fn to_bytes(self) -> [u8; 4] {
        [self.x1, self.y1, self.x2, self.y2]
    }

    /// Whether the curve degenerates to linear interpolation (both inner
    /// control points sit on the diagonal).
    pub fn is_linear(self) -> bool {
        self.x1 == self.y1 && self.x2 == self.y2
    }

    /// Control points normalized to `[0, 1]`.
    pub fn normalized(self) -> Vec4 {
        Vec4::new(
            self.x1 as f32 / 127.0,
            self.y1 as f32 / 127.0,
            self.x2 as f32 / 127.0,
            self.y2 as f32 / 127.0,
        )
    }
}

/// Per-component curves of a bone keyframe.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BoneInterpolation {
    pub translation_x: Curve,
    pub translation_y: Curve,
    pub translation_z: Curve,
    pub orientation: Curve,
}

impl BoneInterpolation {
    fn components(&self) -> [Curve; 4] {
        [
            self.translation_x,
            self.translation_y,
            self.translation_z,
            self.orientation,
        ]
    }

    /// Read the 64-byte VMD interpolation block.
    ///
    /// The block stores the four curves parameter-major in its first 16
    /// bytes (component `i`, parameter `p` at byte `p * 4 + i`) followed
    /// by three byte-shifted copies of the same data.
    pub(crate) fn read_vmd(buffer: &mut Buffer) -> Result<Self> {
        let block = buffer.read_bytes(64)?;
        let curve = |component: usize| {
            Curve::from_bytes([
                block[component],
                block[component + 4],
                block[component + 8],
                block[component + 12],
            ])
        };
        Ok(Self {
            translation_x: curve(0),
            translation_y: curve(1),
            translation_z: curve(2),
            orientation: curve(3),
        })
    }

    /// Write the 64-byte VMD interpolation block.
    ///
    /// The redundant shifted copies are re-derived from the canonical
    /// first row; zero bytes fill the tail positions the shift vacates.
    pub(crate) fn write_vmd(&self, buffer: &mut MutableBuffer) {
        let mut row = [0u8; 16];
        for (component, curve) in self.components().into_iter().enumerate() {
            let bytes = curve.to_bytes();
            for (parameter, value) in bytes.into_iter().enumerate() {
                row[parameter * 4 + component] = value;
            }
        }
        buffer.write_byte_array(&row);
        for shift in 1..4usize {
            buffer.write_byte_array(&row[shift..]);
            for _ in 0..shift {
                buffer.write_u8(0);
            }
        }
    }
}

/// Per-component curves of a camera keyframe.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CameraInterpolation {
    pub lookat_x: Curve,
    pub lookat_y: Curve,
    pub lookat_z: Curve,
    pub angle: Curve,
    pub fov: Curve,
    pub distance: Curve,
}

impl CameraInterpolation {
    fn components(&self) -> [Curve; 6] {
        [
            self.lookat_x,
            self.lookat_y,
            self.lookat_z,
            self.angle,
            self.fov,
            self.distance,
        ]
    }

    /// Read the 24-byte camera interpolation block: six curves of four
    /// consecutive bytes each.
    pub(crate) fn read_vmd(buffer: &mut Buffer) -> Result<Self> {
        let mut curves = [Curve::default(); 6];
        for curve in &mut curves {
            let bytes = buffer.read_bytes(4)?;
            *curve = Curve::from_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        }
        Ok(Self {
            lookat_x: curves[0],
            lookat_y: curves[1],
            lookat_z: curves[2],
            angle: curves[3],
            fov: curves[4],
            distance: curves[5],
        })
    }

    pub(crate) fn write_vmd(&self, buffer: &mut MutableBuffer) {
        for curve in self.components() {
            buffer.write_byte_array(&curve.to_bytes());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_detection() {
        assert!(Curve::default().is_linear());
        assert!(!Curve::from_bytes([10, 20, 107, 107]).is_linear());
    }

    #[test]
    fn test_bone_block_roundtrip() {
        let interpolation = BoneInterpolation {
            translation_x: Curve::from_bytes([1, 2, 3, 4]),
            translation_y: Curve::from_bytes([5, 6, 7, 8]),
            translation_z: Curve::from_bytes([9, 10, 11, 12]),
            orientation: Curve::from_bytes([13, 14, 15, 16]),
        };
        let mut sink = MutableBuffer::new();
        interpolation.write_vmd(&mut sink);
        assert_eq!(sink.len(), 64);
        let mut buffer = sink.into_buffer();
        assert_eq!(BoneInterpolation::read_vmd(&mut buffer).unwrap(), interpolation);
    }

    #[test]
    fn test_camera_block_roundtrip() {
        let interpolation = CameraInterpolation {
            fov: Curve::from_bytes([40, 50, 60, 70]),
            ..Default::default()
        };
        let mut sink = MutableBuffer::new();
        interpolation.write_vmd(&mut sink);
        assert_eq!(sink.len(), 24);
        let mut buffer = sink.into_buffer();
        assert_eq!(
            CameraInterpolation::read_vmd(&mut buffer).unwrap(),
            interpolation
        );
    }

    #[test]
    fn test_normalized_control_points() {
        let value = Curve::from_bytes([0, 127, 127, 0]).normalized();
        assert_eq!(value, Vec4::new(0.0, 1.0, 1.0, 0.0));
    }
}
