//! Utility layer shared by all three codecs.
//!
//! - [`Buffer`] / [`MutableBuffer`] - positioned little-endian byte I/O
//! - [`StringCodec`] / [`StringFactory`] - pluggable text transcoding
//! - [`Status`] / [`Result`] - error handling

mod buffer;
mod error;
mod string;

pub use buffer::{Buffer, MutableBuffer};
pub use error::{Result, Status};
pub use string::{decode_fixed, encode_fixed, CodecKind, StringCodec, StringFactory};
