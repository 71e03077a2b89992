//! Unicode string service.
//!
//! Every text field in the three formats routes through a pluggable
//! [`StringCodec`], so the codecs themselves stay decoupled from any
//! particular text-encoding library. [`StringFactory`] is the default
//! implementation over `encoding_rs` with a small decode cache.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

use parking_lot::Mutex;

use super::{Result, Status};

/// Text encodings used by the file formats.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CodecKind {
    /// Legacy 8-bit encoding (Shift_JIS / CP932)
    Sjis,
    Utf8,
    /// UTF-16 little-endian
    #[default]
    Utf16,
}

/// Pluggable string transcoding, comparison and hashing.
///
/// Equality of decoded strings is defined by [`StringCodec::compare`],
/// not byte identity; tests may install stub implementations.
pub trait StringCodec {
    /// Decode raw bytes in the given encoding.
    fn decode(&self, bytes: &[u8], kind: CodecKind) -> Result<String>;

    /// Encode a string into the given encoding.
    fn encode(&self, text: &str, kind: CodecKind) -> Result<Vec<u8>>;

    /// Three-way comparison in the factory's collation.
    fn compare(&self, a: &str, b: &str) -> Ordering {
        a.cmp(b)
    }

    /// Stable hash of a string.
    fn hash(&self, text: &str) -> i32 {
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        text.hash(&mut hasher);
        hasher.finish() as i32
    }
}

/// Default string factory backed by `encoding_rs`.
///
/// Decoded strings are cached by (byte-hash, codec); model files repeat
/// bone and morph names across labels, keyframes and registries.
pub struct StringFactory {
    cache: Mutex<HashMap<(u64, u8), String>>,
}

impl StringFactory {
    pub fn new() -> Self {
        Self {
            cache: Mutex::new(HashMap::new()),
        }
    }

    fn cache_key(bytes: &[u8], kind: CodecKind) -> (u64, u8) {
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        bytes.hash(&mut hasher);
        (hasher.finish(), kind as u8)
    }

    fn decode_uncached(bytes: &[u8], kind: CodecKind) -> Result<String> {
        let (text, had_errors) = match kind {
            CodecKind::Sjis => {
                let (cow, _, had_errors) = encoding_rs::SHIFT_JIS.decode(bytes);
                (cow.into_owned(), had_errors)
            }
            CodecKind::Utf8 => {
                let (cow, _, had_errors) = encoding_rs::UTF_8.decode(bytes);
                (cow.into_owned(), had_errors)
            }
            CodecKind::Utf16 => {
                let (cow, _, had_errors) = encoding_rs::UTF_16LE.decode(bytes);
                (cow.into_owned(), had_errors)
            }
        };
        if had_errors {
            return Err(Status::DecodeUnicodeStringFailed);
        }
        Ok(text)
    }
}

impl Default for StringFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl StringCodec for StringFactory {
    fn decode(&self, bytes: &[u8], kind: CodecKind) -> Result<String> {
        if bytes.is_empty() {
            return Ok(String::new());
        }
        let key = Self::cache_key(bytes, kind);
        if let Some(cached) = self.cache.lock().get(&key) {
            return Ok(cached.clone());
        }
        let text = Self::decode_uncached(bytes, kind)?;
        self.cache.lock().insert(key, text.clone());
        Ok(text)
    }

    fn encode(&self, text: &str, kind: CodecKind) -> Result<Vec<u8>> {
        match kind {
            CodecKind::Sjis => {
                let (cow, _, had_errors) = encoding_rs::SHIFT_JIS.encode(text);
                if had_errors {
                    return Err(Status::EncodeUnicodeStringFailed);
                }
                Ok(cow.into_owned())
            }
            CodecKind::Utf8 => Ok(text.as_bytes().to_vec()),
            CodecKind::Utf16 => {
                let mut bytes = Vec::with_capacity(text.len() * 2);
                for unit in text.encode_utf16() {
                    bytes.extend_from_slice(&unit.to_le_bytes());
                }
                Ok(bytes)
            }
        }
    }
}

/// Decode a fixed-width legacy field: content runs up to the first NUL,
/// trailing bytes are padding.
pub fn decode_fixed(codec: &dyn StringCodec, bytes: &[u8], kind: CodecKind) -> Result<String> {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    codec.decode(&bytes[..end], kind)
}

/// Encode a string into a fixed-width legacy field, NUL-padded, truncated
/// at the last whole encoded character that fits.
pub fn encode_fixed(
    codec: &dyn StringCodec,
    text: &str,
    kind: CodecKind,
    width: usize,
) -> Result<Vec<u8>> {
    let mut encoded = codec.encode(text, kind)?;
    if encoded.len() > width {
        let mut cut = text;
        while !cut.is_empty() {
            cut = &cut[..cut.len() - cut.chars().next_back().map_or(1, char::len_utf8)];
            encoded = codec.encode(cut, kind)?;
            if encoded.len() <= width {
                break;
            }
        }
        encoded.truncate(width);
    }
    encoded.resize(width, 0);
    Ok(encoded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utf16_roundtrip() {
        let factory = StringFactory::new();
        let bytes = factory.encode("センター", CodecKind::Utf16).unwrap();
        assert_eq!(bytes.len(), 8);
        assert_eq!(
            factory.decode(&bytes, CodecKind::Utf16).unwrap(),
            "センター"
        );
    }

    #[test]
    fn test_sjis_roundtrip() {
        let factory = StringFactory::new();
        let bytes = factory.encode("右腕", CodecKind::Sjis).unwrap();
        assert_eq!(factory.decode(&bytes, CodecKind::Sjis).unwrap(), "右腕");
    }

    #[test]
    fn test_fixed_width_stops_at_nul() {
        let factory = StringFactory::new();
        let field = [b't', b'e', b's', b't', 0, 0xfd, 0xfd, 0xfd];
        assert_eq!(
            decode_fixed(&factory, &field, CodecKind::Sjis).unwrap(),
            "test"
        );
    }

    #[test]
    fn test_fixed_width_encode_pads_and_truncates() {
        let factory = StringFactory::new();
        let padded = encode_fixed(&factory, "abc", CodecKind::Sjis, 6).unwrap();
        assert_eq!(padded, vec![b'a', b'b', b'c', 0, 0, 0]);
        // 2-byte SJIS chars must not be split in half
        let cut = encode_fixed(&factory, "センター", CodecKind::Sjis, 5).unwrap();
        assert_eq!(cut.len(), 5);
        assert_eq!(cut[4], 0);
    }

    #[test]
    fn test_stub_codec_overrides_comparison() {
        struct CaseInsensitive;
        impl StringCodec for CaseInsensitive {
            fn decode(&self, bytes: &[u8], _: CodecKind) -> Result<String> {
                Ok(String::from_utf8_lossy(bytes).into_owned())
            }
            fn encode(&self, text: &str, _: CodecKind) -> Result<Vec<u8>> {
                Ok(text.as_bytes().to_vec())
            }
            fn compare(&self, a: &str, b: &str) -> Ordering {
                a.to_lowercase().cmp(&b.to_lowercase())
            }
        }
        let stub = CaseInsensitive;
        assert_eq!(stub.compare("Bone", "bone"), Ordering::Equal);
    }
}
