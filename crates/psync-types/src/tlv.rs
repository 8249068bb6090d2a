//! Minimal NDN-style TLV (Type-Length-Value) primitives.
//!
//! NDN names and payloads are normally encoded through `ndn-cxx`; no Rust
//! crate provides an equivalent, so the subset actually needed here —
//! varnum length encoding, a generic `Tlv` element, and the two wire type
//! codes used in the reply payload — is implemented directly.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use thiserror::Error;

pub const NAME_TLV: u64 = 7;
pub const NAME_COMPONENT_TLV: u64 = 8;
pub const CONTENT_TLV: u64 = 128;
pub const DATABLOCK_TLV: u64 = 129;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TlvError {
    #[error("unexpected end of buffer while decoding TLV")]
    Truncated,
    #[error("TLV-LENGTH {declared} exceeds remaining buffer ({remaining} bytes)")]
    LengthOverrun { declared: u64, remaining: u64 },
    #[error("expected TLV type {expected}, found {found}")]
    UnexpectedType { expected: u64, found: u64 },
}

/// Appends a NDN-style variable-length number (1/3/5/9 byte encoding).
pub fn write_varnumber(buf: &mut BytesMut, value: u64) {
    if value < 253 {
        buf.put_u8(value as u8);
    } else if value <= u16::MAX as u64 {
        buf.put_u8(253);
        buf.put_u16(value as u16);
    } else if value <= u32::MAX as u64 {
        buf.put_u8(254);
        buf.put_u32(value as u32);
    } else {
        buf.put_u8(255);
        buf.put_u64(value);
    }
}

/// Reads a NDN-style variable-length number, advancing `buf`.
pub fn read_varnumber(buf: &mut Bytes) -> Result<u64, TlvError> {
    if !buf.has_remaining() {
        return Err(TlvError::Truncated);
    }
    let first = buf.get_u8();
    match first {
        0..=252 => Ok(first as u64),
        253 => {
            if buf.remaining() < 2 {
                return Err(TlvError::Truncated);
            }
            Ok(buf.get_u16() as u64)
        }
        254 => {
            if buf.remaining() < 4 {
                return Err(TlvError::Truncated);
            }
            Ok(buf.get_u32() as u64)
        }
        _ => {
            if buf.remaining() < 8 {
                return Err(TlvError::Truncated);
            }
            Ok(buf.get_u64())
        }
    }
}

/// A decoded `TYPE LENGTH VALUE` element; `value` borrows nothing and is a
/// zero-copy `Bytes` slice of the original buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlvElement {
    pub typ: u64,
    pub value: Bytes,
}

impl TlvElement {
    pub fn new(typ: u64, value: impl Into<Bytes>) -> Self {
        Self {
            typ,
            value: value.into(),
        }
    }

    pub fn encode(&self, out: &mut BytesMut) {
        write_varnumber(out, self.typ);
        write_varnumber(out, self.value.len() as u64);
        out.put_slice(&self.value);
    }

    pub fn encoded_len(&self) -> usize {
        let mut scratch = BytesMut::new();
        self.encode(&mut scratch);
        scratch.len()
    }

    /// Decodes one element from the front of `buf`, advancing it past the
    /// element's bytes.
    pub fn decode(buf: &mut Bytes) -> Result<Self, TlvError> {
        let typ = read_varnumber(buf)?;
        let len = read_varnumber(buf)?;
        if buf.remaining() < len as usize {
            return Err(TlvError::LengthOverrun {
                declared: len,
                remaining: buf.remaining() as u64,
            });
        }
        let value = buf.copy_to_bytes(len as usize);
        Ok(Self { typ, value })
    }

    pub fn expect_type(self, expected: u64) -> Result<Self, TlvError> {
        if self.typ != expected {
            return Err(TlvError::UnexpectedType {
                expected,
                found: self.typ,
            });
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn varnumber_round_trip() {
        for value in [0u64, 1, 252, 253, 300, u16::MAX as u64, 70000, u32::MAX as u64, u32::MAX as u64 + 1] {
            let mut buf = BytesMut::new();
            write_varnumber(&mut buf, value);
            let mut frozen = buf.freeze();
            assert_eq!(read_varnumber(&mut frozen).unwrap(), value);
            assert!(frozen.is_empty());
        }
    }

    #[test]
    fn element_round_trip() {
        let el = TlvElement::new(CONTENT_TLV, Bytes::from_static(b"hello"));
        let mut out = BytesMut::new();
        el.encode(&mut out);
        let mut frozen = out.freeze();
        let decoded = TlvElement::decode(&mut frozen).unwrap();
        assert_eq!(decoded, el);
    }

    #[test]
    fn truncated_length_is_an_error() {
        let mut buf = BytesMut::new();
        write_varnumber(&mut buf, NAME_COMPONENT_TLV);
        write_varnumber(&mut buf, 10);
        buf.put_slice(b"abc");
        let mut frozen = buf.freeze();
        assert_eq!(
            TlvElement::decode(&mut frozen),
            Err(TlvError::LengthOverrun {
                declared: 10,
                remaining: 3
            })
        );
    }
}
