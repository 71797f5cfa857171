//! Protocol constants
//!
//! Header layout, message class codes and method codes for the BGAPI
//! messages known to the built-in catalog.

// ============================================================================
// Framing
// ============================================================================

/// Size of the message header: length, class, method.
pub const HEADER_SIZE: usize = 3;
/// Largest payload the one-byte length field can describe.
pub const MAX_PAYLOAD_SIZE: usize = u8::MAX as usize;
/// Largest complete message.
pub const MAX_MESSAGE_SIZE: usize = HEADER_SIZE + MAX_PAYLOAD_SIZE;
/// Size of a Bluetooth device address.
pub const BD_ADDR_SIZE: usize = 6;
/// Largest length-prefixed byte blob.
pub const MAX_BLOB_SIZE: usize = u8::MAX as usize;

// ============================================================================
// Message Classes
// ============================================================================

/// System class (reset, hello, boot).
pub const CLASS_SYSTEM: u8 = 0x00;
/// Connection management class.
pub const CLASS_CONNECTION: u8 = 0x03;
/// Attribute client (GATT client) class.
pub const CLASS_ATTCLIENT: u8 = 0x04;
/// Generic Access Profile class.
pub const CLASS_GAP: u8 = 0x06;

// ============================================================================
// Command / Response Methods
// ============================================================================

/// Reset the module.
pub const SYSTEM_RESET: u8 = 0x00;
/// Liveness check.
pub const SYSTEM_HELLO: u8 = 0x01;
/// Read the module's own address.
pub const SYSTEM_ADDRESS_GET: u8 = 0x02;

/// Disconnect a connection.
pub const CONNECTION_DISCONNECT: u8 = 0x00;
/// Request a status event for a connection.
pub const CONNECTION_GET_STATUS: u8 = 0x07;

/// Read an attribute by handle.
pub const ATTCLIENT_READ_BY_HANDLE: u8 = 0x04;
/// Write an attribute.
pub const ATTCLIENT_ATTRIBUTE_WRITE: u8 = 0x05;

/// Start discovery.
pub const GAP_DISCOVER: u8 = 0x02;
/// Start direct connection establishment.
pub const GAP_CONNECT_DIRECT: u8 = 0x03;
/// End the current GAP procedure.
pub const GAP_END_PROCEDURE: u8 = 0x04;
/// Set scan parameters.
pub const GAP_SET_SCAN_PARAMETERS: u8 = 0x07;

// ============================================================================
// Event Methods
// ============================================================================

/// Module booted.
pub const EVT_SYSTEM_BOOT: u8 = 0x00;
/// Connection status changed.
pub const EVT_CONNECTION_STATUS: u8 = 0x00;
/// Connection closed.
pub const EVT_CONNECTION_DISCONNECTED: u8 = 0x04;
/// Attribute value received.
pub const EVT_ATTCLIENT_ATTRIBUTE_VALUE: u8 = 0x05;
/// Advertisement or scan response received.
pub const EVT_GAP_SCAN_RESPONSE: u8 = 0x00;

// ============================================================================
// Connect Direct Limits
// ============================================================================

/// Smallest connection interval (1.25 ms units).
pub const CONN_INTERVAL_MIN: i64 = 6;
/// Largest connection interval (1.25 ms units).
pub const CONN_INTERVAL_MAX: i64 = 3200;
/// Smallest supervision timeout (10 ms units).
pub const SUPERVISION_TIMEOUT_MIN: i64 = 10;
/// Largest supervision timeout (10 ms units).
pub const SUPERVISION_TIMEOUT_MAX: i64 = 3200;
/// Largest slave latency.
pub const SLAVE_LATENCY_MAX: i64 = 500;
/// Smallest scan interval/window (0.625 ms units).
pub const SCAN_TIMING_MIN: i64 = 4;
/// Largest scan interval/window (0.625 ms units).
pub const SCAN_TIMING_MAX: i64 = 16384;

// ============================================================================
// Enumerations
// ============================================================================

/// Public device address.
pub const ADDRESS_TYPE_PUBLIC: u32 = 0;
/// Random device address.
pub const ADDRESS_TYPE_RANDOM: u32 = 1;
/// Sentinel written when no address type was chosen.
pub const ADDRESS_TYPE_UNKNOWN: u32 = 0xFF;

/// Limited discoverable devices only.
pub const DISCOVER_LIMITED: u32 = 0;
/// Limited and general discoverable devices.
pub const DISCOVER_GENERIC: u32 = 1;
/// All devices, including non-discoverable.
pub const DISCOVER_OBSERVATION: u32 = 2;

/// Connection is up.
pub const CONNSTATUS_CONNECTED: u32 = 0x01;
/// Connection is encrypted.
pub const CONNSTATUS_ENCRYPTED: u32 = 0x02;
/// Connection establishment completed.
pub const CONNSTATUS_COMPLETED: u32 = 0x04;
/// Connection parameters changed.
pub const CONNSTATUS_PARAMETERS_CHANGE: u32 = 0x08;

/// Command succeeded.
pub const RESULT_SUCCESS: u32 = 0x0000;
