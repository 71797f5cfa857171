//! BGAPI Command Protocol Codec
//!
//! This crate encodes and decodes the binary command protocol spoken by
//! BlueGiga BLE112/BLED112 modules over a serial link. Every message is a
//! three byte header followed by a payload of typed fields:
//!
//! ```text
//! +--------+-------+--------+---------+-----+---------+
//! | length | class | method | field_1 | ... | field_n |
//! +--------+-------+--------+---------+-----+---------+
//! ```
//!
//! # Protocol Overview
//!
//! Messages travel in three directions:
//!
//! - **Commands** (host → module)
//! - **Responses** (module → host): one per command, same (class, method)
//! - **Events** (module → host): unsolicited notifications
//!
//! Message shapes are data, not code. A [`MessageDescriptor`] lists the
//! fields of one kind, a [`Catalog`] maps (class, method) pairs to
//! descriptors for one direction, and a single [`MessageValue`] type carries
//! any message. Commands are assembled with a [`MessageBuilder`] which checks
//! every field when the message is built. Parsing goes the other way and
//! reports what the module sent, unknown enum tags included.
//!
//! # Example
//!
//! ```rust,ignore
//! use bgapi_codec::{serialize, parse, Catalog, Direction, ConnectDirect, AddressType};
//!
//! // Build and encode a command
//! let cmd = ConnectDirect::new()
//!     .with_address("00:07:80:00:12:34".parse()?)
//!     .with_addr_type(AddressType::Public)
//!     .with_conn_interval_min(40)
//!     .with_conn_interval_max(80)
//!     .with_timeout(100)
//!     .build()?;
//! let bytes = serialize(&cmd)?;
//!
//! // Parse the response
//! let responses = Catalog::bluegiga(Direction::Response);
//! let rsp = parse(&responses, &received)?;
//! ```

mod bluegiga;
mod builder;
mod catalog;
mod codec;
mod config;
mod constants;
mod descriptor;
mod error;
mod frame;
mod message;
mod parser;
mod serializer;
mod types;

pub use bluegiga::*;
pub use builder::*;
pub use catalog::*;
pub use codec::*;
pub use config::*;
pub use constants::*;
pub use descriptor::*;
pub use error::*;
pub use frame::*;
pub use message::*;
pub use parser::*;
pub use serializer::*;
pub use types::*;
