//! Message serialization.
//!
//! ```text
//! +--------+-------+--------+---------+-----+---------+
//! | length | class | method | field_1 | ... | field_n |
//! +--------+-------+--------+---------+-----+---------+
//! ```
//!
//! `length` counts payload bytes only. Fields are written in the order the
//! descriptor declares them.

use bytes::BufMut;

use crate::codec::{encode_field, encoded_size};
use crate::constants::*;
use crate::error::{CodecError, CodecResult};
use crate::message::MessageValue;

/// Encode a message to bytes.
pub fn serialize(message: &MessageValue) -> CodecResult<Vec<u8>> {
    let mut buf = Vec::with_capacity(HEADER_SIZE + payload_size(message));
    serialize_into(message, &mut buf)?;
    Ok(buf)
}

/// Encode a message, appending to `buf`.
///
/// On error `buf` may hold a partial message; callers that reuse a buffer
/// should truncate it.
pub fn serialize_into(message: &MessageValue, buf: &mut impl BufMut) -> CodecResult<()> {
    let len = payload_size(message);
    if len > MAX_PAYLOAD_SIZE {
        return Err(CodecError::Range {
            field: "length".to_string(),
            value: len as i64,
            max: MAX_PAYLOAD_SIZE as i64,
        });
    }

    let kind = message.kind();
    buf.put_u8(len as u8);
    buf.put_u8(kind.class);
    buf.put_u8(kind.method);

    for (spec, value) in message.descriptor().fields.iter().zip(message.values()) {
        encode_field(spec, value, buf)?;
    }
    Ok(())
}

/// Payload size of a message, excluding the header.
pub fn payload_size(message: &MessageValue) -> usize {
    message
        .descriptor()
        .fields
        .iter()
        .zip(message.values())
        .map(|(spec, value)| encoded_size(spec, value))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::MessageBuilder;
    use crate::descriptor::{Direction, FieldSpec, MessageDescriptor};
    use crate::types::WireType;
    use std::sync::Arc;

    fn descriptor() -> Arc<MessageDescriptor> {
        Arc::new(
            MessageDescriptor::new("write", Direction::Command, 0x04, 0x05)
                .field(FieldSpec::new("connection", WireType::Uint8))
                .field(FieldSpec::new("atthandle", WireType::Uint16))
                .field(FieldSpec::new("data", WireType::Bytes)),
        )
    }

    #[test]
    fn test_header_and_field_order() {
        let msg = MessageBuilder::new(descriptor())
            .with("connection", 1u8)
            .with("atthandle", 0x0025u16)
            .with("data", vec![0x01, 0x00])
            .build()
            .unwrap();

        assert_eq!(payload_size(&msg), 6);
        assert_eq!(
            serialize(&msg).unwrap(),
            vec![0x06, 0x04, 0x05, 0x01, 0x25, 0x00, 0x02, 0x01, 0x00]
        );
    }

    #[test]
    fn test_empty_payload() {
        let desc = Arc::new(MessageDescriptor::new("hello", Direction::Command, 0x00, 0x01));
        let msg = MessageBuilder::new(desc).build().unwrap();
        assert_eq!(serialize(&msg).unwrap(), vec![0x00, 0x00, 0x01]);
    }

    #[test]
    fn test_payload_too_large() {
        let desc = Arc::new(
            MessageDescriptor::new("big", Direction::Command, 0x04, 0x05)
                .field(FieldSpec::new("a", WireType::Bytes))
                .field(FieldSpec::new("b", WireType::Bytes)),
        );
        let msg = MessageBuilder::new(desc)
            .with("a", vec![0u8; 200])
            .with("b", vec![0u8; 200])
            .build()
            .unwrap();

        let err = serialize(&msg).unwrap_err();
        assert!(matches!(err, CodecError::Range { ref field, .. } if field == "length"));
    }

    #[test]
    fn test_value_too_wide_is_range_error() {
        let msg = MessageBuilder::new(descriptor())
            .with("atthandle", 0x1_0000u32)
            .build()
            .unwrap();
        let err = serialize(&msg).unwrap_err();
        assert_eq!(
            err,
            CodecError::Range {
                field: "atthandle".to_string(),
                value: 0x1_0000,
                max: 0xFFFF
            }
        );
    }
}
