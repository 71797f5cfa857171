//! Field encoding and decoding.
//!
//! Every payload field is one of the primitive [`WireType`]s. Integers are
//! little-endian, addresses are written least-significant octet first, and
//! byte arrays carry a one-byte length prefix.
//!
//! | Wire type    | Size (bytes) | Notes                                      |
//! |--------------|--------------|--------------------------------------------|
//! | `uint8`      | 1            |                                            |
//! | `uint16`     | 2            | little-endian                              |
//! | `uint32`     | 4            | little-endian                              |
//! | `int8`       | 1            | two's complement                           |
//! | `bd_addr`    | 6            | reversed relative to `AA:BB:..` notation   |
//! | `bitmask`    | 1, 2 or 4    | unsigned, little-endian                    |
//! | `enum`       | 1 or 2       | numeric tag                                |
//! | `uint8array` | 1 + n        | count byte followed by `n` bytes           |

use bytes::BufMut;

use crate::constants::*;
use crate::descriptor::FieldSpec;
use crate::error::{CodecError, CodecResult};
use crate::types::{BdAddr, EnumValue, FieldValue, IntWidth, WireType};

// ============================================================================
// Encoding
// ============================================================================

/// Encode one field value into `buf`.
///
/// Fails with [`CodecError::Range`] when the value does not fit the field
/// width; nothing is written in that case.
pub fn encode_field(spec: &FieldSpec, value: &FieldValue, buf: &mut impl BufMut) -> CodecResult<()> {
    match (&spec.wire, value) {
        (WireType::Uint8, FieldValue::Int(v)) => {
            put_uint(buf, IntWidth::U8, checked(spec, *v, 0, IntWidth::U8.max())? as u32);
        }
        (WireType::Uint16, FieldValue::Int(v)) => {
            put_uint(buf, IntWidth::U16, checked(spec, *v, 0, IntWidth::U16.max())? as u32);
        }
        (WireType::Uint32, FieldValue::Int(v)) => {
            put_uint(buf, IntWidth::U32, checked(spec, *v, 0, IntWidth::U32.max())? as u32);
        }
        (WireType::Int8, FieldValue::Int(v)) => {
            let v = checked(spec, *v, i8::MIN as i64, i8::MAX as i64)?;
            buf.put_i8(v as i8);
        }
        (WireType::BdAddr, FieldValue::Address(addr)) => {
            buf.put_slice(&addr.to_wire());
        }
        (WireType::Bitmask(domain), FieldValue::Bitmask(bits)) => {
            let bits = checked(spec, *bits as i64, 0, domain.width.max())?;
            put_uint(buf, domain.width, bits as u32);
        }
        (WireType::Enum(domain), FieldValue::Enum(value)) => {
            let tag = checked(spec, value.tag() as i64, 0, domain.width.max())?;
            put_uint(buf, domain.width, tag as u32);
        }
        (WireType::Bytes, FieldValue::Bytes(data)) => {
            let len = checked(spec, data.len() as i64, 0, MAX_BLOB_SIZE as i64)?;
            buf.put_u8(len as u8);
            buf.put_slice(data);
        }
        (wire, other) => {
            return Err(CodecError::validation(
                &spec.name,
                format!("expected a value for {}, got a {}", wire, other.kind_name()),
            ));
        }
    }
    Ok(())
}

/// Encoded size of a value, without encoding it.
pub fn encoded_size(spec: &FieldSpec, value: &FieldValue) -> usize {
    match (&spec.wire, value) {
        (WireType::Bytes, FieldValue::Bytes(data)) => 1 + data.len(),
        (wire, _) => wire.fixed_size().unwrap_or(1),
    }
}

fn checked(spec: &FieldSpec, value: i64, min: i64, max: i64) -> CodecResult<i64> {
    if value < min || value > max {
        return Err(CodecError::Range {
            field: spec.name.clone(),
            value,
            max,
        });
    }
    Ok(value)
}

fn put_uint(buf: &mut impl BufMut, width: IntWidth, value: u32) {
    match width {
        IntWidth::U8 => buf.put_u8(value as u8),
        IntWidth::U16 => buf.put_u16_le(value as u16),
        IntWidth::U32 => buf.put_u32_le(value),
    }
}

// ============================================================================
// Decoding
// ============================================================================

/// Decode one field starting at `offset`.
///
/// Returns the value and the number of bytes consumed. Never reads past the
/// end of `data`.
pub fn decode_field(data: &[u8], offset: usize, spec: &FieldSpec) -> CodecResult<(FieldValue, usize)> {
    match &spec.wire {
        WireType::Uint8 => Ok((FieldValue::Int(get_uint(data, offset, IntWidth::U8)? as i64), 1)),
        WireType::Uint16 => Ok((FieldValue::Int(get_uint(data, offset, IntWidth::U16)? as i64), 2)),
        WireType::Uint32 => Ok((FieldValue::Int(get_uint(data, offset, IntWidth::U32)? as i64), 4)),
        WireType::Int8 => {
            let raw = get_uint(data, offset, IntWidth::U8)? as u8;
            Ok((FieldValue::Int(raw as i8 as i64), 1))
        }
        WireType::BdAddr => {
            let bytes = take(data, offset, BD_ADDR_SIZE)?;
            let addr = BdAddr::from_wire(bytes).ok_or_else(|| CodecError::truncated(offset + BD_ADDR_SIZE, data.len()))?;
            Ok((FieldValue::Address(addr), BD_ADDR_SIZE))
        }
        WireType::Bitmask(domain) => {
            let bits = get_uint(data, offset, domain.width)?;
            Ok((FieldValue::Bitmask(bits), domain.width.size()))
        }
        WireType::Enum(domain) => {
            let tag = get_uint(data, offset, domain.width)?;
            if !domain.contains(tag) {
                return Err(CodecError::UnknownEnumValue {
                    field: spec.name.clone(),
                    tag,
                });
            }
            Ok((FieldValue::Enum(EnumValue::Known(tag)), domain.width.size()))
        }
        WireType::Bytes => {
            let len = take(data, offset, 1)?[0] as usize;
            let bytes = take(data, offset + 1, len)?;
            Ok((FieldValue::Bytes(bytes.to_vec()), 1 + len))
        }
    }
}

fn take(data: &[u8], offset: usize, len: usize) -> CodecResult<&[u8]> {
    let end = offset + len;
    if end > data.len() {
        return Err(CodecError::truncated(end, data.len()));
    }
    Ok(&data[offset..end])
}

fn get_uint(data: &[u8], offset: usize, width: IntWidth) -> CodecResult<u32> {
    let bytes = take(data, offset, width.size())?;
    Ok(match width {
        IntWidth::U8 => bytes[0] as u32,
        IntWidth::U16 => u16::from_le_bytes([bytes[0], bytes[1]]) as u32,
        IntWidth::U32 => u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
    })
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EnumDomain;

    fn spec(wire: WireType) -> FieldSpec {
        FieldSpec::new("f", wire)
    }

    fn encode(wire: WireType, value: FieldValue) -> CodecResult<Vec<u8>> {
        let mut buf = Vec::new();
        encode_field(&spec(wire), &value, &mut buf)?;
        Ok(buf)
    }

    fn address_type() -> WireType {
        WireType::Enum(
            EnumDomain::new("address_type", IntWidth::U8, 0xFF)
                .variant("public", 0)
                .variant("random", 1),
        )
    }

    #[test]
    fn test_integers_little_endian() {
        assert_eq!(encode(WireType::Uint8, FieldValue::Int(0xAB)).unwrap(), vec![0xAB]);
        assert_eq!(encode(WireType::Uint16, FieldValue::Int(0x1234)).unwrap(), vec![0x34, 0x12]);
        assert_eq!(
            encode(WireType::Uint32, FieldValue::Int(0xDEADBEEF)).unwrap(),
            vec![0xEF, 0xBE, 0xAD, 0xDE]
        );
        assert_eq!(encode(WireType::Int8, FieldValue::Int(-60)).unwrap(), vec![0xC4]);

        let (value, used) = decode_field(&[0x34, 0x12], 0, &spec(WireType::Uint16)).unwrap();
        assert_eq!(value, FieldValue::Int(0x1234));
        assert_eq!(used, 2);

        let (value, _) = decode_field(&[0xC4], 0, &spec(WireType::Int8)).unwrap();
        assert_eq!(value, FieldValue::Int(-60));
    }

    #[test]
    fn test_range_errors() {
        let err = encode(WireType::Uint16, FieldValue::Int(70_000)).unwrap_err();
        assert_eq!(
            err,
            CodecError::Range {
                field: "f".to_string(),
                value: 70_000,
                max: 65_535
            }
        );
        assert!(matches!(
            encode(WireType::Uint8, FieldValue::Int(-1)),
            Err(CodecError::Range { .. })
        ));
        assert!(matches!(
            encode(WireType::Int8, FieldValue::Int(128)),
            Err(CodecError::Range { .. })
        ));
        assert!(matches!(
            encode(WireType::Bytes, FieldValue::Bytes(vec![0; 256])),
            Err(CodecError::Range { .. })
        ));
    }

    #[test]
    fn test_nothing_written_on_range_error() {
        let mut buf = vec![0x01];
        let result = encode_field(&spec(WireType::Uint16), &FieldValue::Int(1 << 20), &mut buf);
        assert!(result.is_err());
        assert_eq!(buf, vec![0x01]);
    }

    #[test]
    fn test_type_mismatch() {
        let err = encode(WireType::BdAddr, FieldValue::Int(1)).unwrap_err();
        assert!(matches!(err, CodecError::Validation { .. }));
    }

    #[test]
    fn test_bd_addr_reversed() {
        let addr: BdAddr = "00:07:80:00:12:34".parse().unwrap();
        let bytes = encode(WireType::BdAddr, FieldValue::Address(addr)).unwrap();
        assert_eq!(bytes, vec![0x34, 0x12, 0x00, 0x80, 0x07, 0x00]);

        let (value, used) = decode_field(&bytes, 0, &spec(WireType::BdAddr)).unwrap();
        assert_eq!(value, FieldValue::Address(addr));
        assert_eq!(used, 6);
    }

    #[test]
    fn test_enum_encode_and_decode() {
        assert_eq!(
            encode(address_type(), FieldValue::Enum(EnumValue::Known(1))).unwrap(),
            vec![0x01]
        );
        // Unrecognized tags pass through.
        assert_eq!(
            encode(address_type(), FieldValue::Enum(EnumValue::Unrecognized(0xFF))).unwrap(),
            vec![0xFF]
        );

        let (value, _) = decode_field(&[0x00], 0, &spec(address_type())).unwrap();
        assert_eq!(value, FieldValue::Enum(EnumValue::Known(0)));

        let err = decode_field(&[0x07], 0, &spec(address_type())).unwrap_err();
        assert_eq!(
            err,
            CodecError::UnknownEnumValue {
                field: "f".to_string(),
                tag: 7
            }
        );
    }

    #[test]
    fn test_bytes_length_prefixed() {
        let bytes = encode(WireType::Bytes, FieldValue::Bytes(vec![0xAA, 0xBB])).unwrap();
        assert_eq!(bytes, vec![0x02, 0xAA, 0xBB]);

        let (value, used) = decode_field(&bytes, 0, &spec(WireType::Bytes)).unwrap();
        assert_eq!(value, FieldValue::Bytes(vec![0xAA, 0xBB]));
        assert_eq!(used, 3);

        let err = decode_field(&[0x05, 0x01, 0x02], 0, &spec(WireType::Bytes)).unwrap_err();
        assert_eq!(err, CodecError::truncated(6, 3));
    }

    #[test]
    fn test_decode_at_offset_and_truncation() {
        let data = [0xFF, 0x28, 0x00];
        let (value, _) = decode_field(&data, 1, &spec(WireType::Uint16)).unwrap();
        assert_eq!(value, FieldValue::Int(40));

        assert!(decode_field(&data, 2, &spec(WireType::Uint16)).unwrap_err().is_truncation());
        assert!(decode_field(&data, 0, &spec(WireType::BdAddr)).unwrap_err().is_truncation());
        assert!(decode_field(&data, 3, &spec(WireType::Uint8)).unwrap_err().is_truncation());
    }

    #[test]
    fn test_encoded_size() {
        assert_eq!(encoded_size(&spec(WireType::Bytes), &FieldValue::Bytes(vec![1, 2, 3])), 4);
        assert_eq!(encoded_size(&spec(WireType::BdAddr), &FieldValue::Address(BdAddr::default())), 6);
        assert_eq!(encoded_size(&spec(WireType::Uint32), &FieldValue::Int(1)), 4);
    }
}
