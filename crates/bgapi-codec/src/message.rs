//! Immutable message values.

use std::fmt;
use std::sync::Arc;

use serde::ser::{Serialize, SerializeMap, SerializeStruct, Serializer};

use crate::descriptor::{Direction, MessageDescriptor, MessageKind};
use crate::types::{EnumValue, FieldValue, WireType};

/// A fully populated message of one kind.
///
/// Values come from [`MessageBuilder::build`](crate::MessageBuilder::build)
/// (validated) or from the parser (as observed on the wire). They cannot be
/// modified after construction.
#[derive(Debug, Clone)]
pub struct MessageValue {
    descriptor: Arc<MessageDescriptor>,
    values: Vec<FieldValue>,
}

impl MessageValue {
    /// Bind values to a descriptor. Callers guarantee one value per field.
    pub(crate) fn from_parts(descriptor: Arc<MessageDescriptor>, values: Vec<FieldValue>) -> Self {
        debug_assert_eq!(descriptor.fields.len(), values.len());
        MessageValue { descriptor, values }
    }

    /// The descriptor this value was built against.
    pub fn descriptor(&self) -> &Arc<MessageDescriptor> {
        &self.descriptor
    }

    /// (class, method) of the message.
    pub fn kind(&self) -> MessageKind {
        self.descriptor.kind
    }

    /// Message name.
    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    /// Which way the message travels.
    pub fn direction(&self) -> Direction {
        self.descriptor.direction
    }

    /// Value of a field by name.
    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.descriptor
            .field_index(field)
            .map(|index| &self.values[index])
    }

    /// Integer value of a field by name.
    pub fn get_int(&self, field: &str) -> Option<i64> {
        self.get(field).and_then(FieldValue::as_int)
    }

    /// Enum value of a field by name.
    pub fn get_enum(&self, field: &str) -> Option<EnumValue> {
        self.get(field).and_then(FieldValue::as_enum)
    }

    /// Field values in wire order.
    pub fn values(&self) -> &[FieldValue] {
        &self.values
    }

    /// (name, value) pairs in wire order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.descriptor
            .fields
            .iter()
            .map(|spec| spec.name.as_str())
            .zip(self.values.iter())
    }
}

impl PartialEq for MessageValue {
    fn eq(&self, other: &Self) -> bool {
        self.descriptor.kind == other.descriptor.kind
            && self.descriptor.direction == other.descriptor.direction
            && self.values == other.values
    }
}

impl Eq for MessageValue {}

impl fmt::Display for MessageValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [", self.descriptor.name)?;
        for (i, (spec, value)) in self.descriptor.fields.iter().zip(&self.values).enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}={}", spec.name, value.display_with(&spec.wire))?;
        }
        write!(f, "]")
    }
}

/// A field value rendered for serde, with enum and flag names resolved.
struct SerializedField<'a> {
    wire: &'a WireType,
    value: &'a FieldValue,
}

impl Serialize for SerializedField<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match (self.value, self.wire) {
            (FieldValue::Int(v), _) => serializer.serialize_i64(*v),
            (FieldValue::Address(addr), _) => serializer.collect_str(addr),
            (FieldValue::Bytes(data), _) => serializer.serialize_str(&hex::encode(data)),
            (FieldValue::Bitmask(bits), _) => serializer.serialize_u32(*bits),
            (FieldValue::Enum(EnumValue::Known(tag)), WireType::Enum(domain)) => {
                match domain.name_of(*tag) {
                    Some(name) => serializer.serialize_str(name),
                    None => serializer.serialize_u32(*tag),
                }
            }
            (FieldValue::Enum(value), _) => serializer.serialize_u32(value.tag()),
        }
    }
}

struct SerializedFields<'a>(&'a MessageValue);

impl Serialize for SerializedFields<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let message = self.0;
        let mut map = serializer.serialize_map(Some(message.values.len()))?;
        for (spec, value) in message.descriptor.fields.iter().zip(&message.values) {
            map.serialize_entry(
                &spec.name,
                &SerializedField {
                    wire: &spec.wire,
                    value,
                },
            )?;
        }
        map.end()
    }
}

impl Serialize for MessageValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("MessageValue", 5)?;
        state.serialize_field("name", &self.descriptor.name)?;
        state.serialize_field("direction", &self.descriptor.direction)?;
        state.serialize_field("class", &self.descriptor.kind.class)?;
        state.serialize_field("method", &self.descriptor.kind.method)?;
        state.serialize_field("fields", &SerializedFields(self))?;
        state.end()
    }
}
