//! Built-in BlueGiga BLE112/BLED112 message kinds.
//!
//! Covers the commands a host needs to bring up a module, scan, connect and
//! read or write attributes, their responses, and the events those commands
//! provoke. Names are `<class>_<method>`, e.g. `gap_connect_direct`.

use std::sync::Arc;

use crate::builder::MessageBuilder;
use crate::constants::*;
use crate::descriptor::{Direction, FieldSpec, MessageDescriptor};
use crate::error::CodecResult;
use crate::message::MessageValue;
use crate::types::{AddressType, BdAddr, BitmaskDomain, EnumDomain, IntWidth, WireType};

/// Documented BGAPI result and reason codes.
const RESULT_CODES: &[(&str, u32)] = &[
    ("success", RESULT_SUCCESS),
    ("invalid_parameter", 0x0180),
    ("device_in_wrong_state", 0x0181),
    ("out_of_memory", 0x0182),
    ("feature_not_implemented", 0x0183),
    ("command_not_recognized", 0x0184),
    ("timeout", 0x0185),
    ("not_connected", 0x0186),
    ("flow", 0x0187),
    ("user_attribute", 0x0188),
    ("invalid_license_key", 0x0189),
    ("command_too_long", 0x018A),
    ("out_of_bonds", 0x018B),
    ("connection_timeout", 0x0208),
    ("remote_user_terminated_connection", 0x0213),
    ("connection_terminated_by_local_host", 0x0216),
    ("connection_failed_to_be_established", 0x023E),
    ("invalid_handle", 0x0401),
    ("read_not_permitted", 0x0402),
    ("write_not_permitted", 0x0403),
];

/// Bluetooth address type, one byte.
pub fn address_type_domain() -> EnumDomain {
    EnumDomain::new("address_type", IntWidth::U8, ADDRESS_TYPE_UNKNOWN)
        .variant("public", ADDRESS_TYPE_PUBLIC)
        .variant("random", ADDRESS_TYPE_RANDOM)
}

/// GAP discovery mode, one byte.
pub fn discover_mode_domain() -> EnumDomain {
    EnumDomain::new("discover_mode", IntWidth::U8, 0xFF)
        .variant("limited", DISCOVER_LIMITED)
        .variant("generic", DISCOVER_GENERIC)
        .variant("observation", DISCOVER_OBSERVATION)
}

/// Result codes, two bytes.
pub fn result_domain() -> EnumDomain {
    RESULT_CODES
        .iter()
        .fold(EnumDomain::new("result", IntWidth::U16, 0xFFFF), |domain, (name, tag)| {
            domain.variant(*name, *tag)
        })
}

/// Attribute value type reported with `attclient_attribute_value`.
pub fn attribute_value_type_domain() -> EnumDomain {
    EnumDomain::new("attribute_value_type", IntWidth::U8, 0xFF)
        .variant("read", 0)
        .variant("notify", 1)
        .variant("indicate", 2)
        .variant("read_by_type", 3)
        .variant("read_blob", 4)
        .variant("indicate_rsp_req", 5)
}

/// Connection status flags.
pub fn connection_status_domain() -> BitmaskDomain {
    BitmaskDomain::new("connection_status", IntWidth::U8)
        .flag("connected", CONNSTATUS_CONNECTED)
        .flag("encrypted", CONNSTATUS_ENCRYPTED)
        .flag("completed", CONNSTATUS_COMPLETED)
        .flag("parameters_change", CONNSTATUS_PARAMETERS_CHANGE)
}

fn connection() -> FieldSpec {
    FieldSpec::new("connection", WireType::Uint8).with_description("Connection handle")
}

fn result() -> FieldSpec {
    FieldSpec::new("result", WireType::Enum(result_domain()))
}

fn address_type(name: &str) -> FieldSpec {
    FieldSpec::new(name, WireType::Enum(address_type_domain()))
}

/// The `gap_connect_direct` command.
pub fn connect_direct_command() -> MessageDescriptor {
    MessageDescriptor::new("gap_connect_direct", Direction::Command, CLASS_GAP, GAP_CONNECT_DIRECT)
        .field(FieldSpec::new("address", WireType::BdAddr).with_description("Address of the target device"))
        .field(address_type("addr_type"))
        .field(
            FieldSpec::new("conn_interval_min", WireType::Uint16)
                .with_range(CONN_INTERVAL_MIN, CONN_INTERVAL_MAX)
                .with_description("Minimum connection interval, 1.25 ms units"),
        )
        .field(
            FieldSpec::new("conn_interval_max", WireType::Uint16)
                .with_range(CONN_INTERVAL_MIN, CONN_INTERVAL_MAX)
                .with_description("Maximum connection interval, 1.25 ms units"),
        )
        .field(
            FieldSpec::new("timeout", WireType::Uint16)
                .with_range(SUPERVISION_TIMEOUT_MIN, SUPERVISION_TIMEOUT_MAX)
                .with_description("Supervision timeout, 10 ms units"),
        )
        .field(
            FieldSpec::new("latency", WireType::Uint16)
                .with_range(0, SLAVE_LATENCY_MAX)
                .with_description("Connection intervals the slave may skip"),
        )
        .not_less_than("conn_interval_max", "conn_interval_min")
}

fn commands() -> Vec<MessageDescriptor> {
    vec![
        MessageDescriptor::new("system_reset", Direction::Command, CLASS_SYSTEM, SYSTEM_RESET)
            .field(FieldSpec::new("boot_in_dfu", WireType::Uint8).with_range(0, 1)),
        MessageDescriptor::new("system_hello", Direction::Command, CLASS_SYSTEM, SYSTEM_HELLO),
        MessageDescriptor::new(
            "system_address_get",
            Direction::Command,
            CLASS_SYSTEM,
            SYSTEM_ADDRESS_GET,
        ),
        MessageDescriptor::new(
            "connection_disconnect",
            Direction::Command,
            CLASS_CONNECTION,
            CONNECTION_DISCONNECT,
        )
        .field(connection()),
        MessageDescriptor::new(
            "connection_get_status",
            Direction::Command,
            CLASS_CONNECTION,
            CONNECTION_GET_STATUS,
        )
        .field(connection()),
        MessageDescriptor::new(
            "attclient_read_by_handle",
            Direction::Command,
            CLASS_ATTCLIENT,
            ATTCLIENT_READ_BY_HANDLE,
        )
        .field(connection())
        .field(FieldSpec::new("chrhandle", WireType::Uint16)),
        MessageDescriptor::new(
            "attclient_attribute_write",
            Direction::Command,
            CLASS_ATTCLIENT,
            ATTCLIENT_ATTRIBUTE_WRITE,
        )
        .field(connection())
        .field(FieldSpec::new("atthandle", WireType::Uint16))
        .field(FieldSpec::new("data", WireType::Bytes)),
        MessageDescriptor::new("gap_discover", Direction::Command, CLASS_GAP, GAP_DISCOVER)
            .field(FieldSpec::new("mode", WireType::Enum(discover_mode_domain()))),
        connect_direct_command(),
        MessageDescriptor::new(
            "gap_end_procedure",
            Direction::Command,
            CLASS_GAP,
            GAP_END_PROCEDURE,
        ),
        MessageDescriptor::new(
            "gap_set_scan_parameters",
            Direction::Command,
            CLASS_GAP,
            GAP_SET_SCAN_PARAMETERS,
        )
        .field(
            FieldSpec::new("scan_interval", WireType::Uint16)
                .with_range(SCAN_TIMING_MIN, SCAN_TIMING_MAX)
                .with_default(0x4Bu16),
        )
        .field(
            FieldSpec::new("scan_window", WireType::Uint16)
                .with_range(SCAN_TIMING_MIN, SCAN_TIMING_MAX)
                .with_default(0x32u16),
        )
        .field(FieldSpec::new("active", WireType::Uint8).with_range(0, 1))
        .not_less_than("scan_interval", "scan_window"),
    ]
}

fn responses() -> Vec<MessageDescriptor> {
    let result_only = |name: &str, class: u8, method: u8| {
        MessageDescriptor::new(name, Direction::Response, class, method).field(result())
    };

    vec![
        MessageDescriptor::new("system_hello", Direction::Response, CLASS_SYSTEM, SYSTEM_HELLO),
        MessageDescriptor::new(
            "system_address_get",
            Direction::Response,
            CLASS_SYSTEM,
            SYSTEM_ADDRESS_GET,
        )
        .field(FieldSpec::new("address", WireType::BdAddr)),
        MessageDescriptor::new(
            "connection_disconnect",
            Direction::Response,
            CLASS_CONNECTION,
            CONNECTION_DISCONNECT,
        )
        .field(connection())
        .field(result()),
        MessageDescriptor::new(
            "connection_get_status",
            Direction::Response,
            CLASS_CONNECTION,
            CONNECTION_GET_STATUS,
        )
        .field(connection()),
        MessageDescriptor::new(
            "attclient_read_by_handle",
            Direction::Response,
            CLASS_ATTCLIENT,
            ATTCLIENT_READ_BY_HANDLE,
        )
        .field(connection())
        .field(result()),
        MessageDescriptor::new(
            "attclient_attribute_write",
            Direction::Response,
            CLASS_ATTCLIENT,
            ATTCLIENT_ATTRIBUTE_WRITE,
        )
        .field(connection())
        .field(result()),
        result_only("gap_discover", CLASS_GAP, GAP_DISCOVER),
        result_only("gap_connect_direct", CLASS_GAP, GAP_CONNECT_DIRECT)
            .field(FieldSpec::new("connection_handle", WireType::Uint8)),
        result_only("gap_end_procedure", CLASS_GAP, GAP_END_PROCEDURE),
        result_only("gap_set_scan_parameters", CLASS_GAP, GAP_SET_SCAN_PARAMETERS),
    ]
}

fn events() -> Vec<MessageDescriptor> {
    vec![
        MessageDescriptor::new("system_boot", Direction::Event, CLASS_SYSTEM, EVT_SYSTEM_BOOT)
            .field(FieldSpec::new("major", WireType::Uint16))
            .field(FieldSpec::new("minor", WireType::Uint16))
            .field(FieldSpec::new("patch", WireType::Uint16))
            .field(FieldSpec::new("build", WireType::Uint16))
            .field(FieldSpec::new("ll_version", WireType::Uint16))
            .field(FieldSpec::new("protocol_version", WireType::Uint8))
            .field(FieldSpec::new("hw", WireType::Uint8)),
        MessageDescriptor::new(
            "connection_status",
            Direction::Event,
            CLASS_CONNECTION,
            EVT_CONNECTION_STATUS,
        )
        .field(connection())
        .field(FieldSpec::new("flags", WireType::Bitmask(connection_status_domain())))
        .field(FieldSpec::new("address", WireType::BdAddr))
        .field(address_type("address_type"))
        .field(FieldSpec::new("conn_interval", WireType::Uint16))
        .field(FieldSpec::new("timeout", WireType::Uint16))
        .field(FieldSpec::new("latency", WireType::Uint16))
        .field(FieldSpec::new("bonding", WireType::Uint8)),
        MessageDescriptor::new(
            "connection_disconnected",
            Direction::Event,
            CLASS_CONNECTION,
            EVT_CONNECTION_DISCONNECTED,
        )
        .field(connection())
        .field(FieldSpec::new("reason", WireType::Enum(result_domain()))),
        MessageDescriptor::new(
            "attclient_attribute_value",
            Direction::Event,
            CLASS_ATTCLIENT,
            EVT_ATTCLIENT_ATTRIBUTE_VALUE,
        )
        .field(connection())
        .field(FieldSpec::new("atthandle", WireType::Uint16))
        .field(FieldSpec::new("type", WireType::Enum(attribute_value_type_domain())))
        .field(FieldSpec::new("value", WireType::Bytes)),
        MessageDescriptor::new(
            "gap_scan_response",
            Direction::Event,
            CLASS_GAP,
            EVT_GAP_SCAN_RESPONSE,
        )
        .field(FieldSpec::new("rssi", WireType::Int8))
        .field(FieldSpec::new("packet_type", WireType::Uint8))
        .field(FieldSpec::new("sender", WireType::BdAddr))
        .field(address_type("address_type"))
        .field(FieldSpec::new("bond", WireType::Uint8))
        .field(FieldSpec::new("data", WireType::Bytes)),
    ]
}

/// Built-in descriptors for one direction.
pub(crate) fn descriptors(direction: Direction) -> Vec<MessageDescriptor> {
    match direction {
        Direction::Command => commands(),
        Direction::Response => responses(),
        Direction::Event => events(),
    }
}

// ============================================================================
// Typed Connect Direct
// ============================================================================

/// Typed builder for `gap_connect_direct`.
///
/// Starts a direct connection to one device. The module scans for
/// connectable advertisements from `address` and sends a connection request
/// when it sees one; the outcome arrives as a `connection_status` event.
///
/// ```rust,ignore
/// let msg = ConnectDirect::new()
///     .with_address("00:07:80:00:12:34".parse()?)
///     .with_addr_type(AddressType::Public)
///     .with_conn_interval_min(40)
///     .with_conn_interval_max(80)
///     .with_timeout(100)
///     .build()?;
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConnectDirect {
    /// Address of the target device.
    pub address: BdAddr,
    /// Type of `address`.
    pub addr_type: AddressType,
    /// Minimum connection interval, 1.25 ms units, 6..=3200.
    pub conn_interval_min: u16,
    /// Maximum connection interval, 1.25 ms units, 6..=3200, not below the minimum.
    pub conn_interval_max: u16,
    /// Supervision timeout, 10 ms units, 10..=3200.
    pub timeout: u16,
    /// Slave latency, 0..=500.
    pub latency: u16,
}

impl ConnectDirect {
    /// All fields at their defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the target address.
    pub fn with_address(mut self, address: BdAddr) -> Self {
        self.address = address;
        self
    }

    /// Set the target address type.
    pub fn with_addr_type(mut self, addr_type: AddressType) -> Self {
        self.addr_type = addr_type;
        self
    }

    /// Set the minimum connection interval.
    pub fn with_conn_interval_min(mut self, interval: u16) -> Self {
        self.conn_interval_min = interval;
        self
    }

    /// Set the maximum connection interval.
    pub fn with_conn_interval_max(mut self, interval: u16) -> Self {
        self.conn_interval_max = interval;
        self
    }

    /// Set the supervision timeout.
    pub fn with_timeout(mut self, timeout: u16) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the slave latency.
    pub fn with_latency(mut self, latency: u16) -> Self {
        self.latency = latency;
        self
    }

    /// Validate and produce the message.
    pub fn build(&self) -> CodecResult<MessageValue> {
        MessageBuilder::new(Arc::new(connect_direct_command()))
            .with("address", self.address)
            .with("addr_type", self.addr_type)
            .with("conn_interval_min", self.conn_interval_min)
            .with("conn_interval_max", self.conn_interval_max)
            .with("timeout", self.timeout)
            .with("latency", self.latency)
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::error::CodecError;
    use crate::parser::parse;
    use crate::serializer::serialize;
    use crate::types::{EnumValue, FieldValue};

    fn scenario() -> ConnectDirect {
        ConnectDirect::new()
            .with_address("00:07:80:00:12:34".parse().unwrap())
            .with_addr_type(AddressType::Public)
            .with_conn_interval_min(40)
            .with_conn_interval_max(80)
            .with_timeout(100)
            .with_latency(0)
    }

    #[test]
    fn test_connect_direct_bytes() {
        let bytes = serialize(&scenario().build().unwrap()).unwrap();
        assert_eq!(
            bytes,
            vec![
                0x0F, 0x06, 0x03, 0x34, 0x12, 0x00, 0x80, 0x07, 0x00, 0x00, 0x28, 0x00, 0x50,
                0x00, 0x64, 0x00, 0x00, 0x00
            ]
        );
    }

    #[test]
    fn test_connect_direct_matches_generic_builder() {
        let typed = scenario().build().unwrap();
        let generic = Catalog::bluegiga(Direction::Command)
            .builder("gap_connect_direct")
            .unwrap()
            .with("address", "00:07:80:00:12:34".parse::<BdAddr>().unwrap())
            .with_named("addr_type", "public")
            .with("conn_interval_min", 40u16)
            .with("conn_interval_max", 80u16)
            .with("timeout", 100u16)
            .build()
            .unwrap();
        assert_eq!(typed, generic);
    }

    #[test]
    fn test_connect_direct_limits() {
        for min in [6u16, 3200] {
            let msg = scenario()
                .with_conn_interval_min(min)
                .with_conn_interval_max(3200)
                .build();
            assert!(msg.is_ok(), "min {} rejected", min);
        }
        for min in [5u16, 3201] {
            let err = scenario().with_conn_interval_min(min).build().unwrap_err();
            assert_eq!(err.field(), Some("conn_interval_min"));
        }

        let err = scenario().with_conn_interval_max(20).build().unwrap_err();
        assert_eq!(err.field(), Some("conn_interval_max"));
        let err = scenario().with_timeout(9).build().unwrap_err();
        assert_eq!(err.field(), Some("timeout"));
        let err = scenario().with_latency(501).build().unwrap_err();
        assert_eq!(err.field(), Some("latency"));
    }

    #[test]
    fn test_unset_address_type_encodes_sentinel() {
        let msg = scenario().with_addr_type(AddressType::default()).build().unwrap();
        assert_eq!(msg.get_enum("addr_type"), Some(EnumValue::Unrecognized(0xFF)));
        assert_eq!(serialize(&msg).unwrap()[9], 0xFF);

        let msg = scenario().with_addr_type(AddressType::Unknown(1)).build().unwrap();
        assert_eq!(msg.get_enum("addr_type"), Some(EnumValue::Known(1)));
    }

    #[test]
    fn test_builtin_catalogs_are_consistent() {
        for direction in [Direction::Command, Direction::Response, Direction::Event] {
            let mut catalog = Catalog::new(direction);
            for descriptor in descriptors(direction) {
                assert_eq!(descriptor.direction, direction);
                catalog.register(descriptor).unwrap();
            }
            assert_eq!(catalog.len(), Catalog::bluegiga(direction).len());
        }
    }

    #[test]
    fn test_parse_connect_direct_response() {
        let responses = Catalog::bluegiga(Direction::Response);
        let msg = parse(&responses, &[0x03, 0x06, 0x03, 0x00, 0x00, 0x01]).unwrap();
        assert_eq!(msg.name(), "gap_connect_direct");
        assert_eq!(msg.get_enum("result"), Some(EnumValue::Known(RESULT_SUCCESS)));
        assert_eq!(msg.get_int("connection_handle"), Some(1));

        let msg = parse(&responses, &[0x03, 0x06, 0x03, 0x81, 0x01, 0x00]).unwrap();
        assert_eq!(msg.get_enum("result"), Some(EnumValue::Known(0x0181)));
        assert_eq!(msg.to_string(), "gap_connect_direct [result=device_in_wrong_state, connection_handle=0]");
    }

    #[test]
    fn test_parse_scan_response_event() {
        let events = Catalog::bluegiga(Direction::Event);
        let data = [
            0x0E, 0x06, 0x00, 0xC4, 0x00, 0x34, 0x12, 0x00, 0x80, 0x07, 0x00, 0x01, 0xFF,
            0x03, 0x02, 0x01, 0x06,
        ];
        let msg = parse(&events, &data).unwrap();
        assert_eq!(msg.name(), "gap_scan_response");
        assert_eq!(msg.get_int("rssi"), Some(-60));
        assert_eq!(
            msg.get("sender").and_then(FieldValue::as_address).map(|a| a.to_string()),
            Some("00:07:80:00:12:34".to_string())
        );
        assert_eq!(msg.get_enum("address_type"), Some(EnumValue::Known(1)));
        assert_eq!(msg.get("data"), Some(&FieldValue::Bytes(vec![0x02, 0x01, 0x06])));
    }

    #[test]
    fn test_parse_connection_status_event() {
        let events = Catalog::bluegiga(Direction::Event);
        let data = [
            0x10, 0x03, 0x00, 0x00, 0x05, 0x34, 0x12, 0x00, 0x80, 0x07, 0x00, 0x00, 0x3C, 0x00,
            0x64, 0x00, 0x00, 0x00, 0xFF,
        ];
        let msg = parse(&events, &data).unwrap();
        assert_eq!(msg.name(), "connection_status");
        assert_eq!(msg.get("flags"), Some(&FieldValue::Bitmask(0x05)));
        assert!(msg.to_string().contains("flags=0x5 (connected|completed)"));
        assert_eq!(msg.get_int("bonding"), Some(0xFF));
    }

    #[test]
    fn test_response_and_event_share_pair() {
        // connection_disconnect response and connection_status event are both 0x03/0x00.
        let data = [0x03, 0x03, 0x00, 0x01, 0x00, 0x00];
        let response = parse(&Catalog::bluegiga(Direction::Response), &data).unwrap();
        assert_eq!(response.name(), "connection_disconnect");

        let err = parse(&Catalog::bluegiga(Direction::Event), &data).unwrap_err();
        assert!(matches!(err, CodecError::TruncatedMessage { .. }));
    }
}
