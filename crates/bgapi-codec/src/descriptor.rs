//! Message descriptors.
//!
//! A [`MessageDescriptor`] is the static shape of one message kind: its
//! (class, method) discriminator, the ordered list of [`FieldSpec`]s that
//! make up the payload, and any cross-field [`Rule`]s the builder enforces.
//! The field order is the wire order.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{FieldValue, WireType};

// ============================================================================
// Message Kind
// ============================================================================

/// The (class, method) discriminator of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageKind {
    /// Message class byte.
    pub class: u8,
    /// Message method byte.
    pub method: u8,
}

impl MessageKind {
    /// Create a message kind.
    pub const fn new(class: u8, method: u8) -> Self {
        MessageKind { class, method }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:02X}/0x{:02X}", self.class, self.method)
    }
}

/// Which way a message travels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Host to device.
    Command,
    /// Device reply to a command.
    Response,
    /// Unsolicited device notification.
    Event,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Command => write!(f, "command"),
            Direction::Response => write!(f, "response"),
            Direction::Event => write!(f, "event"),
        }
    }
}

// ============================================================================
// Field Spec
// ============================================================================

/// A value constraint checked by the builder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constraint {
    /// Anything the wire type can carry.
    None,
    /// Integer in `min..=max`.
    Range {
        /// Smallest allowed value.
        min: i64,
        /// Largest allowed value.
        max: i64,
    },
    /// Byte blob no longer than this.
    MaxLen(usize),
}

impl Constraint {
    /// Check a value, returning a description of the violation.
    pub fn check(&self, value: &FieldValue) -> Result<(), String> {
        match (self, value) {
            (Constraint::None, _) => Ok(()),
            (Constraint::Range { min, max }, FieldValue::Int(v)) => {
                if v < min || v > max {
                    Err(format!("{} is outside range {}..={}", v, min, max))
                } else {
                    Ok(())
                }
            }
            (Constraint::MaxLen(max), FieldValue::Bytes(data)) => {
                if data.len() > *max {
                    Err(format!("length {} exceeds maximum {}", data.len(), max))
                } else {
                    Ok(())
                }
            }
            (constraint, other) => Err(format!(
                "constraint {} does not apply to a {}",
                constraint,
                other.kind_name()
            )),
        }
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constraint::None => write!(f, "none"),
            Constraint::Range { min, max } => write!(f, "range {}..={}", min, max),
            Constraint::MaxLen(max) => write!(f, "max length {}", max),
        }
    }
}

/// One field of a message payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    /// Field name, e.g. `conn_interval_min`.
    pub name: String,
    /// Wire encoding.
    pub wire: WireType,
    /// Builder-time constraint.
    pub constraint: Constraint,
    /// Value used when the caller does not set the field.
    pub default: Option<FieldValue>,
    /// Human readable description.
    pub description: String,
}

impl FieldSpec {
    /// Create an unconstrained field.
    pub fn new(name: impl Into<String>, wire: WireType) -> Self {
        FieldSpec {
            name: name.into(),
            wire,
            constraint: Constraint::None,
            default: None,
            description: String::new(),
        }
    }

    /// Restrict an integer field to `min..=max`.
    pub fn with_range(mut self, min: i64, max: i64) -> Self {
        self.constraint = Constraint::Range { min, max };
        self
    }

    /// Restrict a blob field's length.
    pub fn with_max_len(mut self, max: usize) -> Self {
        self.constraint = Constraint::MaxLen(max);
        self
    }

    /// Set an explicit default.
    pub fn with_default(mut self, value: impl Into<FieldValue>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// The value a builder starts with.
    pub fn default_value(&self) -> FieldValue {
        self.default
            .clone()
            .unwrap_or_else(|| self.wire.default_value())
    }
}

// ============================================================================
// Cross-field Rules
// ============================================================================

/// A relation between two fields checked after the per-field constraints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rule {
    /// `field >= other` for integer fields.
    NotLessThan {
        /// Field the error is reported against.
        field: String,
        /// Field it is compared with.
        other: String,
    },
}

impl Rule {
    /// Field the rule reports against.
    pub fn field(&self) -> &str {
        match self {
            Rule::NotLessThan { field, .. } => field,
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rule::NotLessThan { field, other } => write!(f, "{} >= {}", field, other),
        }
    }
}

// ============================================================================
// Message Descriptor
// ============================================================================

/// Static metadata for one message kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageDescriptor {
    /// Discriminator.
    pub kind: MessageKind,
    /// Message name, e.g. `gap_connect_direct`.
    pub name: String,
    /// Which way the message travels.
    pub direction: Direction,
    /// Payload fields in wire order.
    pub fields: Vec<FieldSpec>,
    /// Cross-field rules.
    pub rules: Vec<Rule>,
}

impl MessageDescriptor {
    /// Create a descriptor with no fields.
    pub fn new(name: impl Into<String>, direction: Direction, class: u8, method: u8) -> Self {
        MessageDescriptor {
            kind: MessageKind::new(class, method),
            name: name.into(),
            direction,
            fields: Vec::new(),
            rules: Vec::new(),
        }
    }

    /// Append a field.
    pub fn field(mut self, spec: FieldSpec) -> Self {
        self.fields.push(spec);
        self
    }

    /// Require `field >= other`.
    pub fn not_less_than(mut self, field: impl Into<String>, other: impl Into<String>) -> Self {
        self.rules.push(Rule::NotLessThan {
            field: field.into(),
            other: other.into(),
        });
        self
    }

    /// Index of a field by name.
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Field spec by name.
    pub fn field_spec(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Smallest payload size (all blobs empty).
    pub fn min_payload_size(&self) -> usize {
        self.fields
            .iter()
            .map(|f| f.wire.fixed_size().unwrap_or(1))
            .sum()
    }

    /// Check the descriptor is internally consistent.
    pub(crate) fn check_consistency(&self) -> Result<(), String> {
        for (i, field) in self.fields.iter().enumerate() {
            if self.fields[..i].iter().any(|f| f.name == field.name) {
                return Err(format!("{}: duplicate field `{}`", self.name, field.name));
            }
            if let Some(default) = &field.default {
                if !field.wire.accepts(default) {
                    return Err(format!(
                        "{}: default of `{}` is a {}, field is {}",
                        self.name,
                        field.name,
                        default.kind_name(),
                        field.wire
                    ));
                }
            }
        }
        for rule in &self.rules {
            let Rule::NotLessThan { field, other } = rule;
            for name in [field, other] {
                match self.field_spec(name) {
                    Some(spec) if spec.wire.bounds().is_some() => {}
                    Some(_) => {
                        return Err(format!(
                            "{}: rule `{}` needs integer field `{}`",
                            self.name, rule, name
                        ))
                    }
                    None => {
                        return Err(format!(
                            "{}: rule `{}` names unknown field `{}`",
                            self.name, rule, name
                        ))
                    }
                }
            }
        }
        Ok(())
    }
}

impl fmt::Display for MessageDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.kind, self.direction, self.name)
    }
}
