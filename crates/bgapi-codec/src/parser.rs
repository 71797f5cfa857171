//! Response and event parsing.
//!
//! Parsing is a single pass: read the header, check the buffer holds the
//! whole payload, look the (class, method) pair up in a [`Catalog`], then
//! decode fields in declared order with a cursor bounded by the payload.
//! Parsed values are not run through builder validation; a device may report
//! values a caller would not be allowed to send.

use std::sync::Arc;

use crate::catalog::Catalog;
use crate::codec::decode_field;
use crate::config::UnknownEnumPolicy;
use crate::constants::*;
use crate::descriptor::{FieldSpec, MessageKind};
use crate::error::{CodecError, CodecResult};
use crate::message::MessageValue;
use crate::types::{EnumValue, FieldValue};

/// Decoded message header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// Payload length in bytes.
    pub payload_len: usize,
    /// Message discriminator.
    pub kind: MessageKind,
}

impl Header {
    /// Read the header at the start of `data`.
    pub fn read(data: &[u8]) -> CodecResult<Self> {
        if data.len() < HEADER_SIZE {
            return Err(CodecError::truncated(HEADER_SIZE, data.len()));
        }
        Ok(Header {
            payload_len: data[0] as usize,
            kind: MessageKind::new(data[1], data[2]),
        })
    }

    /// Header plus payload size.
    pub fn message_len(&self) -> usize {
        HEADER_SIZE + self.payload_len
    }
}

/// Parses messages against a catalog.
#[derive(Debug, Clone, Copy)]
pub struct Parser<'a> {
    catalog: &'a Catalog,
    unknown_enums: UnknownEnumPolicy,
}

impl<'a> Parser<'a> {
    /// Create a parser with the default unknown-enum policy.
    pub fn new(catalog: &'a Catalog) -> Self {
        Parser {
            catalog,
            unknown_enums: UnknownEnumPolicy::default(),
        }
    }

    /// Set the unknown-enum policy.
    pub fn with_unknown_enums(mut self, policy: UnknownEnumPolicy) -> Self {
        self.unknown_enums = policy;
        self
    }

    /// Parse one message occupying the start of `data`.
    ///
    /// Bytes after the message are ignored.
    pub fn parse(&self, data: &[u8]) -> CodecResult<MessageValue> {
        self.parse_prefix(data).map(|(message, _)| message)
    }

    /// Parse one message, returning it with the number of bytes it used.
    pub fn parse_prefix(&self, data: &[u8]) -> CodecResult<(MessageValue, usize)> {
        let header = Header::read(data)?;
        let total = header.message_len();
        if data.len() < total {
            return Err(CodecError::truncated(total, data.len()));
        }

        let descriptor = self.catalog.lookup(header.kind).ok_or(CodecError::UnknownMessageKind {
            class: header.kind.class,
            method: header.kind.method,
        })?;

        let payload = &data[HEADER_SIZE..total];
        let values = self.decode_payload(payload, &descriptor.fields)?;
        Ok((MessageValue::from_parts(Arc::clone(descriptor), values), total))
    }

    fn decode_payload(
        &self,
        payload: &[u8],
        fields: &[FieldSpec],
    ) -> CodecResult<Vec<FieldValue>> {
        let mut values = Vec::with_capacity(fields.len());
        let mut cursor = 0;
        for spec in fields {
            let (value, used) = match decode_field(payload, cursor, spec) {
                Ok(decoded) => decoded,
                Err(CodecError::UnknownEnumValue { tag, .. })
                    if self.unknown_enums == UnknownEnumPolicy::Surface =>
                {
                    let width = spec.wire.fixed_size().unwrap_or(1);
                    (FieldValue::Enum(EnumValue::Unrecognized(tag)), width)
                }
                Err(CodecError::TruncatedMessage { expected, actual }) => {
                    return Err(CodecError::truncated(HEADER_SIZE + expected, HEADER_SIZE + actual));
                }
                Err(e) => return Err(e),
            };
            values.push(value);
            cursor += used;
        }
        Ok(values)
    }
}

/// Parse one message with the default settings.
pub fn parse(catalog: &Catalog, data: &[u8]) -> CodecResult<MessageValue> {
    Parser::new(catalog).parse(data)
}

/// Parse one message with the default settings, returning the bytes used.
pub fn parse_prefix(catalog: &Catalog, data: &[u8]) -> CodecResult<(MessageValue, usize)> {
    Parser::new(catalog).parse_prefix(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{Direction, FieldSpec, MessageDescriptor};
    use crate::types::{EnumDomain, IntWidth, WireType};

    fn catalog() -> Catalog {
        let mut catalog = Catalog::new(Direction::Response);
        catalog
            .register_kind(
                0x06,
                0x03,
                MessageDescriptor::new("connect_direct", Direction::Response, 0x06, 0x03)
                    .field(FieldSpec::new(
                        "result",
                        WireType::Enum(
                            EnumDomain::new("result", IntWidth::U16, 0xFFFF).variant("success", 0),
                        ),
                    ))
                    .field(FieldSpec::new("connection_handle", WireType::Uint8)),
            )
            .unwrap();
        catalog
    }

    #[test]
    fn test_parse_response() {
        let msg = parse(&catalog(), &[0x03, 0x06, 0x03, 0x00, 0x00, 0x02]).unwrap();
        assert_eq!(msg.name(), "connect_direct");
        assert_eq!(msg.get_enum("result"), Some(EnumValue::Known(0)));
        assert_eq!(msg.get_int("connection_handle"), Some(2));
    }

    #[test]
    fn test_short_header() {
        for data in [&[][..], &[0x03][..], &[0x03, 0x06][..]] {
            let err = parse(&catalog(), data).unwrap_err();
            assert_eq!(err, CodecError::truncated(3, data.len()));
        }
    }

    #[test]
    fn test_short_payload() {
        let err = parse(&catalog(), &[0x03, 0x06, 0x03, 0x00, 0x00]).unwrap_err();
        assert_eq!(err, CodecError::truncated(6, 5));
    }

    #[test]
    fn test_declared_length_too_small_for_fields() {
        // Length says 2 but the descriptor needs 3 bytes; the third byte
        // belongs to whatever follows and must not be read.
        let err = parse(&catalog(), &[0x02, 0x06, 0x03, 0x00, 0x00, 0x02]).unwrap_err();
        assert_eq!(err, CodecError::truncated(6, 5));
    }

    #[test]
    fn test_unknown_kind() {
        let err = parse(&catalog(), &[0x00, 0x06, 0x7F]).unwrap_err();
        assert_eq!(err, CodecError::UnknownMessageKind { class: 0x06, method: 0x7F });
    }

    #[test]
    fn test_unknown_enum_policies() {
        let data = [0x03, 0x06, 0x03, 0x86, 0x01, 0x00];
        let msg = parse(&catalog(), &data).unwrap();
        assert_eq!(msg.get_enum("result"), Some(EnumValue::Unrecognized(0x0186)));

        let catalog = catalog();
        let strict = Parser::new(&catalog).with_unknown_enums(UnknownEnumPolicy::Reject);
        let err = strict.parse(&data).unwrap_err();
        assert_eq!(
            err,
            CodecError::UnknownEnumValue {
                field: "result".to_string(),
                tag: 0x0186
            }
        );
    }

    #[test]
    fn test_parse_prefix_and_trailing_bytes() {
        let data = [0x04, 0x06, 0x03, 0x00, 0x00, 0x02, 0xEE, 0x00, 0x00, 0x01];
        let (msg, used) = parse_prefix(&catalog(), &data).unwrap();
        assert_eq!(used, 7);
        assert_eq!(msg.get_int("connection_handle"), Some(2));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use crate::descriptor::Direction;
    use proptest::prelude::*;

    proptest! {
        /// Parsing random bytes never panics.
        #[test]
        fn parse_never_panics(data: Vec<u8>) {
            for direction in [Direction::Command, Direction::Response, Direction::Event] {
                let _ = parse(&Catalog::bluegiga(direction), &data);
            }
        }

        /// A successful parse never claims more bytes than it was given.
        #[test]
        fn parse_prefix_stays_in_bounds(data in proptest::collection::vec(any::<u8>(), 0..64)) {
            let catalog = Catalog::bluegiga(Direction::Response);
            if let Ok((_, used)) = parse_prefix(&catalog, &data) {
                prop_assert!(used <= data.len());
                prop_assert_eq!(used, HEADER_SIZE + data[0] as usize);
            }
        }
    }
}
