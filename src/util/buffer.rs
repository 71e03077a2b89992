//! Byte-buffer cursor types for the binary codecs.
//!
//! [`Buffer`] is a positioned little-endian reader over an owned byte
//! array; [`MutableBuffer`] is the append-only mirror image used by the
//! serializers. All multi-byte values are little-endian regardless of
//! host byte order.

use std::fs::File;
use std::path::Path;

use byteorder::{LittleEndian, WriteBytesExt};
use glam::{Vec2, Vec3, Vec4};
use memmap2::Mmap;

use super::{Result, Status};

/// Read cursor over an immutable byte array.
pub struct Buffer {
    data: Vec<u8>,
    offset: usize,
}

impl Buffer {
    /// Wrap a byte vector for reading.
    pub fn new(data: Vec<u8>) -> Self {
        Self { data, offset: 0 }
    }

    /// Memory-map a file read-only and copy its contents into a buffer.
    pub fn from_file(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let file = File::open(path)?;
        // Safety: the file is opened read-only and the mapping does not
        // outlive this function.
        let mmap = unsafe { Mmap::map(&file) }?;
        Ok(Self::new(mmap.to_vec()))
    }

    /// Total length in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Current read position.
    #[inline]
    pub fn position(&self) -> usize {
        self.offset
    }

    /// Bytes remaining after the cursor.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.offset
    }

    /// Whether `n` more bytes can be read.
    #[inline]
    pub fn can_read(&self, n: usize) -> bool {
        self.remaining() >= n
    }

    /// Whether the cursor has consumed the whole buffer.
    #[inline]
    pub fn is_end(&self) -> bool {
        self.offset >= self.data.len()
    }

    /// Advance the cursor by `n` bytes without reading.
    pub fn skip(&mut self, n: usize) -> Result<()> {
        if !self.can_read(n) {
            return Err(Status::BufferSeekOutOfBounds);
        }
        self.offset += n;
        Ok(())
    }

    /// Move the cursor to an absolute position within `[0, len]`.
    pub fn seek(&mut self, pos: usize) -> Result<()> {
        if pos > self.data.len() {
            return Err(Status::BufferSeekOutOfBounds);
        }
        self.offset = pos;
        Ok(())
    }

    fn take(&mut self, n: usize) -> Result<&[u8]> {
        if !self.can_read(n) {
            return Err(Status::BufferEnd);
        }
        let slice = &self.data[self.offset..self.offset + n];
        self.offset += n;
        Ok(slice)
    }

    /// Read `n` raw bytes.
    pub fn read_bytes(&mut self, n: usize) -> Result<Vec<u8>> {
        Ok(self.take(n)?.to_vec())
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        let b = self.take(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        Ok(self.read_u16()? as i16)
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(self.read_u32()? as i32)
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        Ok(f32::from_bits(self.read_u32()?))
    }

    /// Read an f32 clamped to `[0, 1]` (bone-weight fields).
    pub fn read_f32_clamped(&mut self) -> Result<f32> {
        Ok(self.read_f32()?.clamp(0.0, 1.0))
    }

    pub fn read_f32x2(&mut self) -> Result<Vec2> {
        Ok(Vec2::new(self.read_f32()?, self.read_f32()?))
    }

    pub fn read_f32x3(&mut self) -> Result<Vec3> {
        Ok(Vec3::new(self.read_f32()?, self.read_f32()?, self.read_f32()?))
    }

    pub fn read_f32x4(&mut self) -> Result<Vec4> {
        Ok(Vec4::new(
            self.read_f32()?,
            self.read_f32()?,
            self.read_f32()?,
            self.read_f32()?,
        ))
    }

    /// Read a u32 element count and validate it against the remaining
    /// length, so corrupt counts fail here instead of after a partial
    /// table read.
    pub fn read_len(&mut self) -> Result<usize> {
        let len = self.read_u32()? as usize;
        if len > self.remaining() {
            return Err(Status::BufferEnd);
        }
        Ok(len)
    }

    /// Read an unsigned index of 1, 2 or 4 bytes, widened to i32.
    pub fn read_integer(&mut self, size: usize) -> Result<i32> {
        match size {
            1 => Ok(self.read_u8()? as i32),
            2 => Ok(self.read_u16()? as i32),
            4 => Ok(self.read_i32()?),
            _ => Err(Status::BufferEnd),
        }
    }

    /// Read a signed index of 1, 2 or 4 bytes where the all-ones bit
    /// pattern decodes to -1 ("no reference").
    pub fn read_integer_nullable(&mut self, size: usize) -> Result<i32> {
        match size {
            1 => Ok(self.read_u8()? as i8 as i32),
            2 => Ok(self.read_u16()? as i16 as i32),
            4 => Ok(self.read_i32()?),
            _ => Err(Status::BufferEnd),
        }
    }
}

/// Append-only little-endian byte sink used by the serializers.
///
/// Growth is geometric through the backing `Vec`. [`MutableBuffer::into_buffer`]
/// finalizes the sink into a read-only [`Buffer`], transferring ownership
/// of the backing bytes.
#[derive(Default)]
pub struct MutableBuffer {
    data: Vec<u8>,
}

impl MutableBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
        }
    }

    /// Bytes written so far.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// View of the bytes written so far.
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Finalize into a read-only buffer positioned at the start.
    pub fn into_buffer(self) -> Buffer {
        Buffer::new(self.data)
    }

    pub fn write_byte_array(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }

    pub fn write_u8(&mut self, value: u8) {
        self.data.push(value);
    }

    pub fn write_u16(&mut self, value: u16) {
        // Vec<u8> sink: byteorder writes cannot fail
        let _ = self.data.write_u16::<LittleEndian>(value);
    }

    pub fn write_i16(&mut self, value: i16) {
        let _ = self.data.write_i16::<LittleEndian>(value);
    }

    pub fn write_u32(&mut self, value: u32) {
        let _ = self.data.write_u32::<LittleEndian>(value);
    }

    pub fn write_i32(&mut self, value: i32) {
        let _ = self.data.write_i32::<LittleEndian>(value);
    }

    pub fn write_f32(&mut self, value: f32) {
        let _ = self.data.write_f32::<LittleEndian>(value);
    }

    pub fn write_f32x2(&mut self, value: Vec2) {
        self.write_f32(value.x);
        self.write_f32(value.y);
    }

    pub fn write_f32x3(&mut self, value: Vec3) {
        self.write_f32(value.x);
        self.write_f32(value.y);
        self.write_f32(value.z);
    }

    pub fn write_f32x4(&mut self, value: Vec4) {
        self.write_f32(value.x);
        self.write_f32(value.y);
        self.write_f32(value.z);
        self.write_f32(value.w);
    }

    /// Write an index of 1, 2 or 4 bytes; -1 encodes as all-ones.
    pub fn write_integer(&mut self, value: i32, size: usize) {
        match size {
            1 => self.write_u8(value as u8),
            2 => self.write_u16(value as u16),
            _ => self.write_i32(value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitive_reads_are_little_endian() {
        let mut buffer = Buffer::new(vec![0x01, 0x02, 0x03, 0x04]);
        assert_eq!(buffer.read_u32().unwrap(), 0x0403_0201);
        assert!(buffer.is_end());
    }

    #[test]
    fn test_read_past_end_fails_without_advancing() {
        let mut buffer = Buffer::new(vec![0xff]);
        assert_eq!(buffer.read_u32(), Err(Status::BufferEnd));
        assert_eq!(buffer.position(), 0);
        assert_eq!(buffer.read_u8().unwrap(), 0xff);
    }

    #[test]
    fn test_seek_and_skip_bounds() {
        let mut buffer = Buffer::new(vec![0; 8]);
        buffer.seek(8).unwrap();
        assert!(buffer.is_end());
        assert_eq!(buffer.seek(9), Err(Status::BufferSeekOutOfBounds));
        buffer.seek(0).unwrap();
        buffer.skip(4).unwrap();
        assert_eq!(buffer.skip(5), Err(Status::BufferSeekOutOfBounds));
    }

    #[test]
    fn test_nullable_integer_widths() {
        let mut buffer = Buffer::new(vec![0xff, 0xff, 0xff, 0x02, 0x00]);
        assert_eq!(buffer.read_integer_nullable(1).unwrap(), -1);
        assert_eq!(buffer.read_integer_nullable(2).unwrap(), -1);
        assert_eq!(buffer.read_integer_nullable(2).unwrap(), 2);
    }

    #[test]
    fn test_read_len_validates_remaining() {
        // Count of 100 with only 2 bytes after it
        let mut buffer = Buffer::new(vec![100, 0, 0, 0, 1, 2]);
        assert_eq!(buffer.read_len(), Err(Status::BufferEnd));
    }

    #[test]
    fn test_roundtrip_through_mutable_buffer() {
        let mut sink = MutableBuffer::new();
        sink.write_u16(0xbeef);
        sink.write_f32(1.5);
        sink.write_integer(-1, 2);
        let mut buffer = sink.into_buffer();
        assert_eq!(buffer.read_u16().unwrap(), 0xbeef);
        assert_eq!(buffer.read_f32().unwrap(), 1.5);
        assert_eq!(buffer.read_integer_nullable(2).unwrap(), -1);
        assert!(buffer.is_end());
    }
}
