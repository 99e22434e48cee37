//! Size-and-buffer framing and canonical record encoding.
//!
//! A frame is a 4-byte little-endian unsigned length followed by exactly
//! that many bytes. Reads validate the declared length against the
//! configured ceiling and the remaining input *before* allocating or
//! slicing, so attacker-controlled prefixes cannot reserve memory.
//!
//! A record is the canonical binary encoding of a typed value (bincode:
//! fixed-width little-endian integers, length-prefixed sequences). When
//! a record is embedded in a byte stream it is wrapped in a frame so the
//! reader knows where it ends.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{ProtocolError, Result};
use crate::limits::{FrameLimits, FRAME_HEADER_LEN, TIMESTAMP_LEN};

/// Canonically encode a record to bytes.
pub fn encode_record<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    bincode::serialize(value).map_err(|e| ProtocolError::Encode(e.to_string()))
}

/// Decode a record from its canonical encoding.
pub fn decode_record<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    bincode::deserialize(bytes).map_err(|e| ProtocolError::Decode(e.to_string()))
}

/// URL-safe unpadded base64 of arbitrary bytes.
pub fn encode_base64url(bytes: &[u8]) -> String {
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine as _;
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Invert [`encode_base64url`].
pub fn decode_base64url(text: &str) -> Result<Vec<u8>> {
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine as _;
    URL_SAFE_NO_PAD
        .decode(text)
        .map_err(|e| ProtocolError::Decode(e.to_string()))
}

/// Writer assembling frames, timestamps and records into a buffer.
#[derive(Debug)]
pub struct FrameWriter {
    buf: Vec<u8>,
    limits: FrameLimits,
}

impl FrameWriter {
    /// Create an empty writer.
    pub fn new(limits: FrameLimits) -> Self {
        Self {
            buf: Vec::new(),
            limits,
        }
    }

    /// Append a size-and-buffer frame.
    ///
    /// # Errors
    ///
    /// Returns `FrameTooLarge` if `bytes` exceeds the ceiling; the
    /// writer enforces the same bound the reader does so every envelope
    /// we produce is one we would accept.
    pub fn write_frame(&mut self, bytes: &[u8]) -> Result<()> {
        if bytes.len() > self.limits.max_frame {
            return Err(ProtocolError::FrameTooLarge {
                declared: bytes.len(),
                max: self.limits.max_frame,
            });
        }
        self.buf.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
        self.buf.extend_from_slice(bytes);
        Ok(())
    }

    /// Append raw bytes without a length prefix.
    pub fn write_raw(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Append an 8-byte little-endian signed integer.
    pub fn write_i64_le(&mut self, value: i64) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Append a framed record.
    pub fn write_record<T: Serialize>(&mut self, value: &T) -> Result<()> {
        let bytes = encode_record(value)?;
        self.write_frame(&bytes)
    }

    /// Consume the writer, returning the assembled bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

/// Cursor reading frames, timestamps and records from untrusted bytes.
///
/// Frames are returned as borrowed subslices of the input; callers copy
/// only what they keep.
#[derive(Debug)]
pub struct FrameReader<'a> {
    buf: &'a [u8],
    pos: usize,
    limits: FrameLimits,
}

impl<'a> FrameReader<'a> {
    /// Create a reader over `buf`.
    pub fn new(buf: &'a [u8], limits: FrameLimits) -> Self {
        Self {
            buf,
            pos: 0,
            limits,
        }
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        if len > self.remaining() {
            return Err(ProtocolError::Truncated {
                needed: len,
                remaining: self.remaining(),
            });
        }
        let slice = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    /// Read one size-and-buffer frame.
    ///
    /// # Errors
    ///
    /// `FrameTooLarge` when the declared length exceeds the ceiling,
    /// `Truncated` when it exceeds the remaining input. Both are checked
    /// before the payload is touched.
    pub fn read_frame(&mut self) -> Result<&'a [u8]> {
        let header = self.take(FRAME_HEADER_LEN)?;
        let mut len = [0u8; FRAME_HEADER_LEN];
        len.copy_from_slice(header);
        let declared = u32::from_le_bytes(len) as usize;
        if declared > self.limits.max_frame {
            return Err(ProtocolError::FrameTooLarge {
                declared,
                max: self.limits.max_frame,
            });
        }
        self.take(declared)
    }

    /// Read an 8-byte little-endian signed integer.
    pub fn read_i64_le(&mut self) -> Result<i64> {
        let bytes = self.take(TIMESTAMP_LEN)?;
        let mut value = [0u8; TIMESTAMP_LEN];
        value.copy_from_slice(bytes);
        Ok(i64::from_le_bytes(value))
    }

    /// Read a framed record.
    pub fn read_record<T: DeserializeOwned>(&mut self) -> Result<T> {
        let bytes = self.read_frame()?;
        decode_record(bytes)
    }

    /// Consume and return everything not yet read.
    pub fn rest(&mut self) -> &'a [u8] {
        let slice = &self.buf[self.pos..];
        self.pos = self.buf.len();
        slice
    }

    /// Fail unless the input is fully consumed.
    pub fn expect_end(&self) -> Result<()> {
        if self.remaining() != 0 {
            return Err(ProtocolError::Decode(format!(
                "{} trailing bytes after last field",
                self.remaining()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits() -> FrameLimits {
        FrameLimits::default()
    }

    #[test]
    fn test_frame_roundtrip() {
        let mut writer = FrameWriter::new(limits());
        writer.write_frame(b"first").unwrap();
        writer.write_frame(b"").unwrap();
        writer.write_frame(b"third frame").unwrap();
        let bytes = writer.into_bytes();

        let mut reader = FrameReader::new(&bytes, limits());
        assert_eq!(reader.read_frame().unwrap(), b"first");
        assert_eq!(reader.read_frame().unwrap(), b"");
        assert_eq!(reader.read_frame().unwrap(), b"third frame");
        reader.expect_end().unwrap();
    }

    #[test]
    fn test_i64_roundtrip() {
        let mut writer = FrameWriter::new(limits());
        writer.write_i64_le(-1234567890123);
        let bytes = writer.into_bytes();
        let mut reader = FrameReader::new(&bytes, limits());
        assert_eq!(reader.read_i64_le().unwrap(), -1234567890123);
    }

    #[test]
    fn test_declared_length_over_ceiling_fails_before_allocation() {
        // Header declares 4 GiB-ish in an 8-byte buffer; the reader must
        // reject on the ceiling check, not attempt the read.
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&u32::MAX.to_le_bytes());
        bytes.extend_from_slice(&[0u8; 4]);
        let mut reader = FrameReader::new(&bytes, limits());
        let result = reader.read_frame();
        assert!(matches!(
            result,
            Err(ProtocolError::FrameTooLarge { declared, max })
                if declared == u32::MAX as usize && max == limits().max_frame
        ));
    }

    #[test]
    fn test_small_ceiling_is_enforced() {
        let mut writer = FrameWriter::new(limits());
        writer.write_frame(&[0u8; 100]).unwrap();
        let bytes = writer.into_bytes();
        let mut reader = FrameReader::new(&bytes, FrameLimits::with_max_frame(64));
        assert!(matches!(
            reader.read_frame(),
            Err(ProtocolError::FrameTooLarge { declared: 100, max: 64 })
        ));
    }

    #[test]
    fn test_writer_enforces_ceiling() {
        let mut writer = FrameWriter::new(FrameLimits::with_max_frame(8));
        assert!(matches!(
            writer.write_frame(&[0u8; 9]),
            Err(ProtocolError::FrameTooLarge { declared: 9, max: 8 })
        ));
    }

    #[test]
    fn test_truncated_frame() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&10u32.to_le_bytes());
        bytes.extend_from_slice(&[0u8; 4]);
        let mut reader = FrameReader::new(&bytes, limits());
        assert!(matches!(
            reader.read_frame(),
            Err(ProtocolError::Truncated {
                needed: 10,
                remaining: 4
            })
        ));
    }

    #[test]
    fn test_truncated_header() {
        let mut reader = FrameReader::new(&[0u8; 3], limits());
        assert!(matches!(
            reader.read_frame(),
            Err(ProtocolError::Truncated { .. })
        ));
    }

    #[test]
    fn test_rest_consumes_remainder() {
        let mut writer = FrameWriter::new(limits());
        writer.write_frame(b"head").unwrap();
        writer.write_raw(b"tail bytes");
        let bytes = writer.into_bytes();

        let mut reader = FrameReader::new(&bytes, limits());
        reader.read_frame().unwrap();
        assert_eq!(reader.rest(), b"tail bytes");
        reader.expect_end().unwrap();
    }

    #[test]
    fn test_expect_end_rejects_trailing() {
        let mut writer = FrameWriter::new(limits());
        writer.write_frame(b"head").unwrap();
        writer.write_raw(b"x");
        let bytes = writer.into_bytes();

        let mut reader = FrameReader::new(&bytes, limits());
        reader.read_frame().unwrap();
        assert!(matches!(
            reader.expect_end(),
            Err(ProtocolError::Decode(_))
        ));
    }

    #[test]
    fn test_record_roundtrip() {
        let mut writer = FrameWriter::new(limits());
        writer.write_record(&(42u32, String::from("record"))).unwrap();
        let bytes = writer.into_bytes();

        let mut reader = FrameReader::new(&bytes, limits());
        let value: (u32, String) = reader.read_record().unwrap();
        assert_eq!(value, (42, String::from("record")));
    }

    #[test]
    fn test_base64url_roundtrip() {
        let bytes = vec![0xFFu8, 0x00, 0x7E, 0x3F, 0xFB];
        let text = encode_base64url(&bytes);
        assert!(!text.contains('='));
        assert_eq!(decode_base64url(&text).unwrap(), bytes);
    }

    #[test]
    fn test_base64url_rejects_garbage() {
        assert!(matches!(
            decode_base64url("not~base64!"),
            Err(ProtocolError::Decode(_))
        ));
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn frame_roundtrip(chunks in proptest::collection::vec(
                proptest::collection::vec(any::<u8>(), 0..256), 0..8)
            ) {
                let mut writer = FrameWriter::new(FrameLimits::default());
                for chunk in &chunks {
                    writer.write_frame(chunk).unwrap();
                }
                let bytes = writer.into_bytes();

                let mut reader = FrameReader::new(&bytes, FrameLimits::default());
                for chunk in &chunks {
                    prop_assert_eq!(reader.read_frame().unwrap(), chunk.as_slice());
                }
                reader.expect_end().unwrap();
            }

            #[test]
            fn base64url_roundtrip(bytes in proptest::collection::vec(any::<u8>(), 0..256)) {
                let text = encode_base64url(&bytes);
                prop_assert_eq!(decode_base64url(&text).unwrap(), bytes);
            }
        }
    }
}
