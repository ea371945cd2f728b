//! Primitive types and their decoding from raw bytes.

use crate::{
    endian::{ByteOrder, swap_bytes},
    errors::ReadError,
    stream::Stream,
    value::Value,
};

/// A fixed-size type read directly from the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Primitive {
    U8,
    U16,
    U32,
    U64,
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
    /// Byte string of the given length. Never byte-swapped.
    Tag(usize),
}

impl Primitive {
    /// Encoded size in bytes.
    pub const fn size(self) -> usize {
        match self {
            Primitive::U8 | Primitive::I8 => 1,
            Primitive::U16 | Primitive::I16 => 2,
            Primitive::U32 | Primitive::I32 | Primitive::F32 => 4,
            Primitive::U64 | Primitive::I64 | Primitive::F64 => 8,
            Primitive::Tag(len) => len,
        }
    }

    /// Decodes exactly [Primitive::size] bytes of host-order data. Callers guarantee the length.
    ///
    /// When `swap` is set, numeric bytes are reversed before they are interpreted.
    pub(crate) fn decode(self, raw: &[u8], swap: bool) -> Value {
        let mut buf = [0u8; 8];
        if !matches!(self, Primitive::Tag(_)) {
            let n = self.size();
            buf[..n].copy_from_slice(&raw[..n]);
            if swap {
                swap_bytes(&mut buf[..n]);
            }
        }

        match self {
            Primitive::U8 => Value::U8(buf[0]),
            Primitive::I8 => Value::I8(i8::from_ne_bytes([buf[0]])),
            Primitive::U16 => Value::U16(u16::from_ne_bytes(take(&buf))),
            Primitive::I16 => Value::I16(i16::from_ne_bytes(take(&buf))),
            Primitive::U32 => Value::U32(u32::from_ne_bytes(take(&buf))),
            Primitive::I32 => Value::I32(i32::from_ne_bytes(take(&buf))),
            Primitive::F32 => Value::F32(f32::from_ne_bytes(take(&buf))),
            Primitive::U64 => Value::U64(u64::from_ne_bytes(buf)),
            Primitive::I64 => Value::I64(i64::from_ne_bytes(buf)),
            Primitive::F64 => Value::F64(f64::from_ne_bytes(buf)),
            Primitive::Tag(_) => Value::Tag(raw.to_vec()),
        }
    }

    /// Reads one value at the stream cursor, swapping bytes as `order` requires.
    pub fn read(self, stream: &mut dyn Stream, order: ByteOrder) -> Result<Value, ReadError> {
        if let Primitive::Tag(len) = self {
            return Ok(Value::Tag(stream.read_bytes(len)?));
        }

        let mut buf = [0u8; 8];
        let n = self.size();
        stream.read_exact_into(&mut buf[..n])?;
        Ok(self.decode(&buf[..n], order.needs_swap()))
    }
}

fn take<const N: usize>(buf: &[u8; 8]) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&buf[..N]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::{ForwardStream, MemoryStream};

    #[test]
    fn test_sizes() {
        assert_eq!(Primitive::U8.size(), 1);
        assert_eq!(Primitive::I16.size(), 2);
        assert_eq!(Primitive::F32.size(), 4);
        assert_eq!(Primitive::U64.size(), 8);
        assert_eq!(Primitive::Tag(4).size(), 4);
    }

    #[test]
    fn test_decode_native() {
        let raw = 0x1234u16.to_ne_bytes();
        assert_eq!(Primitive::U16.decode(&raw, false), Value::U16(0x1234));
    }

    #[test]
    fn test_decode_swapped() {
        let raw = 0x1234_5678u32.to_ne_bytes();
        assert_eq!(Primitive::U32.decode(&raw, true), Value::U32(0x7856_3412));
    }

    #[test]
    fn test_decode_signed_and_float() {
        assert_eq!(Primitive::I8.decode(&[0xFF], false), Value::I8(-1));
        assert_eq!(
            Primitive::I16.decode(&(-2i16).to_be_bytes(), cfg!(target_endian = "little")),
            Value::I16(-2)
        );
        assert_eq!(
            Primitive::F64.decode(&1.5f64.to_ne_bytes(), false),
            Value::F64(1.5)
        );
    }

    #[test]
    fn test_read_big_endian() {
        let mut stream = MemoryStream::new(&[0x00, 0x03, 0xFF]);
        assert_eq!(
            Primitive::U16.read(&mut stream, ByteOrder::Big).unwrap(),
            Value::U16(3)
        );
        assert_eq!(stream.position(), 2);
        assert!(matches!(
            Primitive::U16.read(&mut stream, ByteOrder::Big),
            Err(ReadError::UnexpectedEndOfStream { offset: 2, needed: 2 })
        ));
    }

    #[test]
    fn test_read_little_endian() {
        let mut stream = MemoryStream::new(&[0x03, 0x00, 0x00, 0x00]);
        assert_eq!(
            Primitive::U32.read(&mut stream, ByteOrder::Little).unwrap(),
            Value::U32(3)
        );
    }

    #[test]
    fn test_tag_is_never_swapped() {
        assert_eq!(
            Primitive::Tag(4).decode(b"GSUB", true),
            Value::Tag(b"GSUB".to_vec())
        );
    }

    #[test]
    fn test_oversized_tag_is_end_of_stream() {
        let mut stream = MemoryStream::new(&[1, 2, 3]);
        assert!(matches!(
            Primitive::Tag(usize::MAX).read(&mut stream, ByteOrder::Native),
            Err(ReadError::UnexpectedEndOfStream { offset: 0, .. })
        ));

        let mut forward = ForwardStream::new(&[1u8, 2, 3][..]);
        assert!(matches!(
            Primitive::Tag(usize::MAX).read(&mut forward, ByteOrder::Native),
            Err(ReadError::UnexpectedEndOfStream { offset: 0, .. })
        ));
    }

    #[test]
    fn test_read_tag() {
        let mut stream = MemoryStream::new(b"cmap!");
        assert_eq!(
            Primitive::Tag(4).read(&mut stream, ByteOrder::Swapped).unwrap(),
            Value::Tag(b"cmap".to_vec())
        );
        assert_eq!(stream.position(), 4);
    }
}
