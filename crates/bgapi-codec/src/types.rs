//! Wire types and field values.

use std::fmt;
use std::str::FromStr;

use crate::constants::*;

// ============================================================================
// Integer Width
// ============================================================================

/// Width of an unsigned integer on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntWidth {
    /// One byte.
    U8,
    /// Two bytes, little-endian.
    U16,
    /// Four bytes, little-endian.
    U32,
}

impl IntWidth {
    /// Number of bytes on the wire.
    pub const fn size(self) -> usize {
        match self {
            IntWidth::U8 => 1,
            IntWidth::U16 => 2,
            IntWidth::U32 => 4,
        }
    }

    /// Largest encodable value.
    pub const fn max(self) -> i64 {
        match self {
            IntWidth::U8 => u8::MAX as i64,
            IntWidth::U16 => u16::MAX as i64,
            IntWidth::U32 => u32::MAX as i64,
        }
    }

    /// Parse a width from its protocol name (`uint8`, `uint16`, `uint32`).
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "uint8" | "u8" => Some(IntWidth::U8),
            "uint16" | "u16" => Some(IntWidth::U16),
            "uint32" | "u32" => Some(IntWidth::U32),
            _ => None,
        }
    }
}

impl fmt::Display for IntWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntWidth::U8 => write!(f, "uint8"),
            IntWidth::U16 => write!(f, "uint16"),
            IntWidth::U32 => write!(f, "uint32"),
        }
    }
}

// ============================================================================
// Enumeration and Bitmask Domains
// ============================================================================

/// The named variants of an enumerated field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumDomain {
    /// Domain name, e.g. `address_type`.
    pub name: String,
    /// Tag width on the wire.
    pub width: IntWidth,
    /// Known variants as (name, tag).
    pub variants: Vec<(String, u32)>,
    /// Tag used when no variant has been chosen.
    pub unknown: u32,
}

impl EnumDomain {
    /// Create an empty domain with the given sentinel tag.
    pub fn new(name: impl Into<String>, width: IntWidth, unknown: u32) -> Self {
        EnumDomain {
            name: name.into(),
            width,
            variants: Vec::new(),
            unknown,
        }
    }

    /// Add a variant.
    pub fn variant(mut self, name: impl Into<String>, tag: u32) -> Self {
        self.variants.push((name.into(), tag));
        self
    }

    /// Whether `tag` names a known variant.
    pub fn contains(&self, tag: u32) -> bool {
        self.variants.iter().any(|(_, t)| *t == tag)
    }

    /// Name of the variant with this tag.
    pub fn name_of(&self, tag: u32) -> Option<&str> {
        self.variants
            .iter()
            .find(|(_, t)| *t == tag)
            .map(|(name, _)| name.as_str())
    }

    /// Tag of the variant with this name (case-insensitive).
    pub fn tag_of(&self, name: &str) -> Option<u32> {
        self.variants
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, tag)| *tag)
    }

    /// Classify a raw tag against this domain.
    pub fn classify(&self, tag: u32) -> EnumValue {
        if self.contains(tag) {
            EnumValue::Known(tag)
        } else {
            EnumValue::Unrecognized(tag)
        }
    }

    /// The default value of a field of this domain.
    pub fn default_value(&self) -> EnumValue {
        self.classify(self.unknown)
    }
}

/// The named flags of a bitmask field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitmaskDomain {
    /// Domain name, e.g. `connection_status`.
    pub name: String,
    /// Mask width on the wire.
    pub width: IntWidth,
    /// Known flags as (name, bit value).
    pub flags: Vec<(String, u32)>,
}

impl BitmaskDomain {
    /// Create a domain with no flags.
    pub fn new(name: impl Into<String>, width: IntWidth) -> Self {
        BitmaskDomain {
            name: name.into(),
            width,
            flags: Vec::new(),
        }
    }

    /// Add a flag.
    pub fn flag(mut self, name: impl Into<String>, bit: u32) -> Self {
        self.flags.push((name.into(), bit));
        self
    }

    /// Union of all declared flags.
    pub fn declared_bits(&self) -> u32 {
        self.flags.iter().fold(0, |acc, (_, bit)| acc | bit)
    }

    /// Names of the flags set in `bits`.
    pub fn names_of(&self, bits: u32) -> Vec<&str> {
        self.flags
            .iter()
            .filter(|(_, bit)| bits & bit != 0)
            .map(|(name, _)| name.as_str())
            .collect()
    }
}

// ============================================================================
// Wire Type
// ============================================================================

/// The primitive encoding of a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireType {
    /// Unsigned 8-bit integer.
    Uint8,
    /// Unsigned 16-bit integer, little-endian.
    Uint16,
    /// Unsigned 32-bit integer, little-endian.
    Uint32,
    /// Signed 8-bit integer.
    Int8,
    /// Bluetooth device address, 6 bytes, reversed on the wire.
    BdAddr,
    /// Flags packed into an unsigned integer.
    Bitmask(BitmaskDomain),
    /// One-byte count followed by that many bytes.
    Bytes,
    /// Numeric tag of a named enumeration.
    Enum(EnumDomain),
}

impl WireType {
    /// Size on the wire when fixed, `None` for length-prefixed types.
    pub fn fixed_size(&self) -> Option<usize> {
        match self {
            WireType::Uint8 | WireType::Int8 => Some(1),
            WireType::Uint16 => Some(2),
            WireType::Uint32 => Some(4),
            WireType::BdAddr => Some(BD_ADDR_SIZE),
            WireType::Bitmask(domain) => Some(domain.width.size()),
            WireType::Enum(domain) => Some(domain.width.size()),
            WireType::Bytes => None,
        }
    }

    /// Inclusive numeric bounds for integer-like types.
    pub fn bounds(&self) -> Option<(i64, i64)> {
        match self {
            WireType::Uint8 => Some((0, IntWidth::U8.max())),
            WireType::Uint16 => Some((0, IntWidth::U16.max())),
            WireType::Uint32 => Some((0, IntWidth::U32.max())),
            WireType::Int8 => Some((i8::MIN as i64, i8::MAX as i64)),
            WireType::Bitmask(domain) => Some((0, domain.width.max())),
            WireType::Enum(domain) => Some((0, domain.width.max())),
            _ => None,
        }
    }

    /// The value a builder starts with for this type.
    pub fn default_value(&self) -> FieldValue {
        match self {
            WireType::Uint8 | WireType::Uint16 | WireType::Uint32 | WireType::Int8 => {
                FieldValue::Int(0)
            }
            WireType::BdAddr => FieldValue::Address(BdAddr::default()),
            WireType::Bitmask(_) => FieldValue::Bitmask(0),
            WireType::Bytes => FieldValue::Bytes(Vec::new()),
            WireType::Enum(domain) => FieldValue::Enum(domain.default_value()),
        }
    }

    /// Whether `value` has the shape this type encodes.
    pub fn accepts(&self, value: &FieldValue) -> bool {
        matches!(
            (self, value),
            (
                WireType::Uint8 | WireType::Uint16 | WireType::Uint32 | WireType::Int8,
                FieldValue::Int(_)
            ) | (WireType::BdAddr, FieldValue::Address(_))
                | (WireType::Bitmask(_), FieldValue::Bitmask(_))
                | (WireType::Bytes, FieldValue::Bytes(_))
                | (WireType::Enum(_), FieldValue::Enum(_))
        )
    }

    /// Parse a textual value for this type.
    ///
    /// Integers accept decimal or `0x` hex, addresses the colon form, blobs
    /// hex digits, enums a variant name or a number, bitmasks a number or
    /// `|`-separated flag names.
    pub fn parse_value(&self, text: &str) -> Result<FieldValue, String> {
        let text = text.trim();
        match self {
            WireType::Uint8 | WireType::Uint16 | WireType::Uint32 | WireType::Int8 => {
                parse_int(text).map(FieldValue::Int)
            }
            WireType::BdAddr => text.parse::<BdAddr>().map(FieldValue::Address),
            WireType::Bytes => parse_hex(text).map(FieldValue::Bytes),
            WireType::Enum(domain) => match domain.tag_of(text) {
                Some(tag) => Ok(FieldValue::Enum(EnumValue::Known(tag))),
                None => {
                    let tag = parse_int(text)
                        .map_err(|_| format!("`{}` is not a variant of {}", text, domain.name))?;
                    let tag = u32::try_from(tag).map_err(|_| format!("tag {} out of range", tag))?;
                    Ok(FieldValue::Enum(domain.classify(tag)))
                }
            },
            WireType::Bitmask(domain) => {
                if let Ok(bits) = parse_int(text) {
                    let bits = u32::try_from(bits).map_err(|_| format!("mask {} out of range", bits))?;
                    return Ok(FieldValue::Bitmask(bits));
                }
                let mut bits = 0;
                for name in text.split('|').map(str::trim).filter(|n| !n.is_empty()) {
                    let bit = domain
                        .flags
                        .iter()
                        .find(|(n, _)| n.eq_ignore_ascii_case(name))
                        .map(|(_, bit)| *bit)
                        .ok_or_else(|| format!("`{}` is not a flag of {}", name, domain.name))?;
                    bits |= bit;
                }
                Ok(FieldValue::Bitmask(bits))
            }
        }
    }
}

impl fmt::Display for WireType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WireType::Uint8 => write!(f, "uint8"),
            WireType::Uint16 => write!(f, "uint16"),
            WireType::Uint32 => write!(f, "uint32"),
            WireType::Int8 => write!(f, "int8"),
            WireType::BdAddr => write!(f, "bd_addr"),
            WireType::Bitmask(domain) => write!(f, "bitmask {} ({})", domain.name, domain.width),
            WireType::Bytes => write!(f, "uint8array"),
            WireType::Enum(domain) => write!(f, "enum {} ({})", domain.name, domain.width),
        }
    }
}

fn parse_int(text: &str) -> Result<i64, String> {
    let parsed = if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        i64::from_str_radix(hex, 16)
    } else {
        text.parse::<i64>()
    };
    parsed.map_err(|_| format!("`{}` is not an integer", text))
}

fn parse_hex(text: &str) -> Result<Vec<u8>, String> {
    let digits: String = text
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ':' && *c != '-')
        .collect();
    hex::decode(digits).map_err(|e| format!("`{}` is not hex: {}", text, e))
}

// ============================================================================
// Bluetooth Address
// ============================================================================

/// A 6-byte Bluetooth device address, stored most-significant octet first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BdAddr(pub [u8; BD_ADDR_SIZE]);

impl BdAddr {
    /// Create an address from octets in display order.
    pub fn new(octets: [u8; BD_ADDR_SIZE]) -> Self {
        BdAddr(octets)
    }

    /// Octets in display order (most significant first).
    pub fn octets(&self) -> &[u8; BD_ADDR_SIZE] {
        &self.0
    }

    /// Octets in wire order (least significant first).
    pub fn to_wire(&self) -> [u8; BD_ADDR_SIZE] {
        let mut wire = self.0;
        wire.reverse();
        wire
    }

    /// Build from octets in wire order.
    pub fn from_wire(wire: &[u8]) -> Option<Self> {
        if wire.len() != BD_ADDR_SIZE {
            return None;
        }
        let mut octets = [0u8; BD_ADDR_SIZE];
        octets.copy_from_slice(wire);
        octets.reverse();
        Some(BdAddr(octets))
    }
}

impl fmt::Display for BdAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let o = &self.0;
        write!(
            f,
            "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
            o[0], o[1], o[2], o[3], o[4], o[5]
        )
    }
}

impl FromStr for BdAddr {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().split(':').collect();
        if parts.len() != BD_ADDR_SIZE {
            return Err(format!("`{}` is not a Bluetooth address", s));
        }
        let mut octets = [0u8; BD_ADDR_SIZE];
        for (octet, part) in octets.iter_mut().zip(parts) {
            if part.len() != 2 {
                return Err(format!("`{}` is not a Bluetooth address", s));
            }
            *octet = u8::from_str_radix(part, 16)
                .map_err(|_| format!("`{}` is not a Bluetooth address", s))?;
        }
        Ok(BdAddr(octets))
    }
}

// ============================================================================
// Field Values
// ============================================================================

/// Value of an enumerated field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnumValue {
    /// Tag of a variant present in the field's domain.
    Known(u32),
    /// Tag outside the domain, carried through verbatim.
    Unrecognized(u32),
}

impl EnumValue {
    /// The numeric tag.
    pub fn tag(&self) -> u32 {
        match self {
            EnumValue::Known(tag) | EnumValue::Unrecognized(tag) => *tag,
        }
    }

    /// Whether the tag was matched to a variant.
    pub fn is_known(&self) -> bool {
        matches!(self, EnumValue::Known(_))
    }
}

/// A decoded or caller-supplied field value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldValue {
    /// Any integer field (`uint8`, `uint16`, `uint32`, `int8`).
    Int(i64),
    /// Bluetooth address.
    Address(BdAddr),
    /// Length-prefixed byte blob.
    Bytes(Vec<u8>),
    /// Enumerated value.
    Enum(EnumValue),
    /// Bitmask.
    Bitmask(u32),
}

impl FieldValue {
    /// Integer content, if this is an integer.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            FieldValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Address content, if this is an address.
    pub fn as_address(&self) -> Option<&BdAddr> {
        match self {
            FieldValue::Address(addr) => Some(addr),
            _ => None,
        }
    }

    /// Blob content, if this is a blob.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            FieldValue::Bytes(data) => Some(data),
            _ => None,
        }
    }

    /// Enum content, if this is an enum.
    pub fn as_enum(&self) -> Option<EnumValue> {
        match self {
            FieldValue::Enum(value) => Some(*value),
            _ => None,
        }
    }

    /// Bitmask content, if this is a bitmask.
    pub fn as_bitmask(&self) -> Option<u32> {
        match self {
            FieldValue::Bitmask(bits) => Some(*bits),
            _ => None,
        }
    }

    /// Short name of the value's shape, for error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            FieldValue::Int(_) => "integer",
            FieldValue::Address(_) => "address",
            FieldValue::Bytes(_) => "byte array",
            FieldValue::Enum(_) => "enum",
            FieldValue::Bitmask(_) => "bitmask",
        }
    }

    /// Render the value, resolving enum and flag names through `wire`.
    pub fn display_with(&self, wire: &WireType) -> String {
        match (self, wire) {
            (FieldValue::Enum(value), WireType::Enum(domain)) => match value {
                EnumValue::Known(tag) => domain
                    .name_of(*tag)
                    .map(str::to_string)
                    .unwrap_or_else(|| tag.to_string()),
                EnumValue::Unrecognized(tag) => format!("unrecognized(0x{:X})", tag),
            },
            (FieldValue::Bitmask(bits), WireType::Bitmask(domain)) => {
                let names = domain.names_of(*bits);
                if names.is_empty() {
                    format!("0x{:X}", bits)
                } else {
                    format!("0x{:X} ({})", bits, names.join("|"))
                }
            }
            _ => self.to_string(),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Int(v) => write!(f, "{}", v),
            FieldValue::Address(addr) => write!(f, "{}", addr),
            FieldValue::Bytes(data) => write!(f, "[{}]", hex::encode(data)),
            FieldValue::Enum(EnumValue::Known(tag)) => write!(f, "{}", tag),
            FieldValue::Enum(EnumValue::Unrecognized(tag)) => {
                write!(f, "unrecognized(0x{:X})", tag)
            }
            FieldValue::Bitmask(bits) => write!(f, "0x{:X}", bits),
        }
    }
}

impl From<u8> for FieldValue {
    fn from(v: u8) -> Self {
        FieldValue::Int(v as i64)
    }
}

impl From<u16> for FieldValue {
    fn from(v: u16) -> Self {
        FieldValue::Int(v as i64)
    }
}

impl From<u32> for FieldValue {
    fn from(v: u32) -> Self {
        FieldValue::Int(v as i64)
    }
}

impl From<i8> for FieldValue {
    fn from(v: i8) -> Self {
        FieldValue::Int(v as i64)
    }
}

impl From<i32> for FieldValue {
    fn from(v: i32) -> Self {
        FieldValue::Int(v as i64)
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Int(v)
    }
}

impl From<BdAddr> for FieldValue {
    fn from(addr: BdAddr) -> Self {
        FieldValue::Address(addr)
    }
}

impl From<Vec<u8>> for FieldValue {
    fn from(data: Vec<u8>) -> Self {
        FieldValue::Bytes(data)
    }
}

impl From<&[u8]> for FieldValue {
    fn from(data: &[u8]) -> Self {
        FieldValue::Bytes(data.to_vec())
    }
}

impl From<EnumValue> for FieldValue {
    fn from(value: EnumValue) -> Self {
        FieldValue::Enum(value)
    }
}

// ============================================================================
// Address Type
// ============================================================================

/// Bluetooth address type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressType {
    /// Public (IEEE assigned) address.
    Public,
    /// Random address.
    Random,
    /// Anything else, including the unset sentinel.
    Unknown(u8),
}

impl Default for AddressType {
    fn default() -> Self {
        AddressType::Unknown(ADDRESS_TYPE_UNKNOWN as u8)
    }
}

impl From<u8> for AddressType {
    fn from(value: u8) -> Self {
        match value as u32 {
            ADDRESS_TYPE_PUBLIC => AddressType::Public,
            ADDRESS_TYPE_RANDOM => AddressType::Random,
            _ => AddressType::Unknown(value),
        }
    }
}

impl From<AddressType> for u8 {
    fn from(value: AddressType) -> Self {
        match value {
            AddressType::Public => ADDRESS_TYPE_PUBLIC as u8,
            AddressType::Random => ADDRESS_TYPE_RANDOM as u8,
            AddressType::Unknown(v) => v,
        }
    }
}

impl From<AddressType> for FieldValue {
    fn from(value: AddressType) -> Self {
        match value {
            AddressType::Unknown(v) => FieldValue::Enum(EnumValue::Unrecognized(v as u32)),
            known => FieldValue::Enum(EnumValue::Known(u8::from(known) as u32)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bd_addr_display_and_parse() {
        let addr: BdAddr = "00:07:80:00:12:34".parse().unwrap();
        assert_eq!(addr.octets(), &[0x00, 0x07, 0x80, 0x00, 0x12, 0x34]);
        assert_eq!(addr.to_string(), "00:07:80:00:12:34");

        let lower: BdAddr = "aa:bb:cc:dd:ee:ff".parse().unwrap();
        assert_eq!(lower.to_string(), "AA:BB:CC:DD:EE:FF");
    }

    #[test]
    fn test_bd_addr_rejects_malformed() {
        assert!("00:07:80:00:12".parse::<BdAddr>().is_err());
        assert!("00:07:80:00:12:3".parse::<BdAddr>().is_err());
        assert!("00:07:80:00:12:GG".parse::<BdAddr>().is_err());
        assert!("".parse::<BdAddr>().is_err());
    }

    #[test]
    fn test_bd_addr_wire_order() {
        let addr: BdAddr = "00:07:80:00:12:34".parse().unwrap();
        assert_eq!(addr.to_wire(), [0x34, 0x12, 0x00, 0x80, 0x07, 0x00]);
        assert_eq!(BdAddr::from_wire(&addr.to_wire()), Some(addr));
        assert_eq!(BdAddr::from_wire(&[1, 2, 3]), None);
    }

    #[test]
    fn test_enum_domain_lookup() {
        let domain = EnumDomain::new("address_type", IntWidth::U8, 0xFF)
            .variant("public", 0)
            .variant("random", 1);

        assert_eq!(domain.tag_of("PUBLIC"), Some(0));
        assert_eq!(domain.name_of(1), Some("random"));
        assert_eq!(domain.classify(1), EnumValue::Known(1));
        assert_eq!(domain.classify(7), EnumValue::Unrecognized(7));
        assert_eq!(domain.default_value(), EnumValue::Unrecognized(0xFF));
    }

    #[test]
    fn test_parse_value() {
        let domain = EnumDomain::new("address_type", IntWidth::U8, 0xFF)
            .variant("public", 0)
            .variant("random", 1);
        let wire = WireType::Enum(domain);
        assert_eq!(wire.parse_value("random"), Ok(FieldValue::Enum(EnumValue::Known(1))));
        assert_eq!(
            wire.parse_value("9"),
            Ok(FieldValue::Enum(EnumValue::Unrecognized(9)))
        );
        assert!(wire.parse_value("bogus").is_err());

        assert_eq!(WireType::Uint16.parse_value("0x28"), Ok(FieldValue::Int(40)));
        assert_eq!(
            WireType::Bytes.parse_value("01 02 ff"),
            Ok(FieldValue::Bytes(vec![1, 2, 0xFF]))
        );
        assert!(WireType::Bytes.parse_value("abc").is_err());
        assert!(WireType::Bytes.parse_value("aéb").is_err());
        assert!(WireType::Bytes.parse_value("é1").is_err());
        assert!(WireType::BdAddr.parse_value("é0:07:80:00:12:34").is_err());

        let flags = WireType::Bitmask(
            BitmaskDomain::new("status", IntWidth::U8)
                .flag("connected", 1)
                .flag("encrypted", 2),
        );
        assert_eq!(flags.parse_value("connected|encrypted"), Ok(FieldValue::Bitmask(3)));
        assert_eq!(flags.parse_value("4"), Ok(FieldValue::Bitmask(4)));
    }

    #[test]
    fn test_display_with_domain() {
        let wire = WireType::Bitmask(
            BitmaskDomain::new("status", IntWidth::U8)
                .flag("connected", 1)
                .flag("completed", 4),
        );
        assert_eq!(FieldValue::Bitmask(5).display_with(&wire), "0x5 (connected|completed)");
        assert_eq!(FieldValue::Bitmask(0).display_with(&wire), "0x0");
    }

    #[test]
    fn test_address_type_conversions() {
        assert_eq!(AddressType::from(0), AddressType::Public);
        assert_eq!(AddressType::from(1), AddressType::Random);
        assert_eq!(AddressType::from(5), AddressType::Unknown(5));
        assert_eq!(u8::from(AddressType::default()), 0xFF);
        assert_eq!(
            FieldValue::from(AddressType::Public),
            FieldValue::Enum(EnumValue::Known(0))
        );
    }
}
