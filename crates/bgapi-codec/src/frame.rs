//! Stream framing.
//!
//! Bytes from a serial link arrive in arbitrary chunks. Every message starts
//! with its payload length, so a complete message is available once the
//! buffer holds `HEADER_SIZE + length` bytes.
//!
//! ```text
//! +--------+-------+--------+-------------------+
//! | length | class | method | payload[0..len]   |
//! +--------+-------+--------+-------------------+
//! ```

use std::sync::Arc;

use bytes::{Buf, BytesMut};

use crate::catalog::Catalog;
use crate::config::{CodecConfig, UnknownEnumPolicy};
use crate::constants::*;
use crate::error::CodecResult;
use crate::message::MessageValue;
use crate::parser::Parser;
use crate::serializer::serialize;

/// Splits a byte stream into whole messages.
#[derive(Debug, Default)]
pub struct FrameCodec {
    /// Bytes received but not yet returned as a message.
    buffer: BytesMut,
}

impl FrameCodec {
    /// Create a new frame codec.
    pub fn new() -> Self {
        FrameCodec {
            buffer: BytesMut::with_capacity(MAX_MESSAGE_SIZE),
        }
    }

    /// Add received data to the buffer.
    pub fn push(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Take the next complete message, header included.
    ///
    /// Returns `None` if more data is needed.
    pub fn decode(&mut self) -> Option<Vec<u8>> {
        if self.buffer.len() < HEADER_SIZE {
            return None;
        }
        let total = HEADER_SIZE + self.buffer[0] as usize;
        if self.buffer.len() < total {
            return None;
        }
        let frame = self.buffer.split_to(total).to_vec();
        Some(frame)
    }

    /// Drop `n` buffered bytes, e.g. to skip line noise.
    pub fn skip(&mut self, n: usize) {
        self.buffer.advance(n.min(self.buffer.len()));
    }

    /// Get the number of buffered bytes.
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Clear the buffer.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

/// Encodes outgoing commands and decodes incoming messages for one link.
///
/// The wire header carries no direction, so a session decodes against a
/// single catalog, normally responses or events.
#[derive(Debug)]
pub struct ProtocolSession {
    codec: FrameCodec,
    catalog: Arc<Catalog>,
    unknown_enums: UnknownEnumPolicy,
}

impl ProtocolSession {
    /// Create a session decoding against `catalog`.
    pub fn new(catalog: Arc<Catalog>) -> Self {
        ProtocolSession {
            codec: FrameCodec::new(),
            catalog,
            unknown_enums: UnknownEnumPolicy::default(),
        }
    }

    /// Create a session with settings from a config.
    pub fn with_config(catalog: Arc<Catalog>, config: &CodecConfig) -> Self {
        ProtocolSession {
            unknown_enums: config.unknown_enums,
            ..Self::new(catalog)
        }
    }

    /// Catalog used for incoming messages.
    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    /// Encode a command for transmission.
    pub fn encode_command(&self, command: &MessageValue) -> CodecResult<Vec<u8>> {
        serialize(command)
    }

    /// Feed received data into the decoder.
    pub fn feed(&mut self, data: &[u8]) {
        self.codec.push(data);
    }

    /// Try to decode the next message.
    ///
    /// Returns `Ok(Some(message))` if a complete message was decoded,
    /// `Ok(None)` if more data is needed, or `Err` if decoding failed. A
    /// message that fails to decode is consumed, so the next call moves on.
    pub fn try_decode(&mut self) -> CodecResult<Option<MessageValue>> {
        match self.codec.decode() {
            Some(frame) => {
                let parser = Parser::new(&self.catalog).with_unknown_enums(self.unknown_enums);
                let message = parser.parse(&frame)?;
                Ok(Some(message))
            }
            None => Ok(None),
        }
    }

    /// Bytes buffered but not yet decoded.
    pub fn buffered_len(&self) -> usize {
        self.codec.buffered_len()
    }

    /// Reset the session state.
    pub fn reset(&mut self) {
        self.codec.clear();
    }
}
