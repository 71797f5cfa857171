//! Message builders.
//!
//! A [`MessageBuilder`] collects `(field, value)` assignments and checks them
//! all at once in [`MessageBuilder::build`]. Fields that are never assigned
//! keep their defaults: zero, an empty blob, the all-zero address, or the
//! enumeration's "unknown" sentinel.
//!
//! ```rust,ignore
//! let msg = catalog
//!     .builder("gap_connect_direct")?
//!     .with("address", "00:07:80:00:12:34".parse::<BdAddr>()?)
//!     .with_named("addr_type", "public")
//!     .with("conn_interval_min", 40u16)
//!     .build()?;
//! ```

use std::sync::Arc;

use crate::descriptor::{MessageDescriptor, Rule};
use crate::error::{CodecError, CodecResult};
use crate::message::MessageValue;
use crate::types::{EnumValue, FieldValue, WireType};

#[derive(Debug, Clone)]
enum Assignment {
    Value(FieldValue),
    Variant(String),
}

/// Accumulates field values for one message kind.
#[derive(Debug, Clone)]
pub struct MessageBuilder {
    descriptor: Arc<MessageDescriptor>,
    assignments: Vec<(String, Assignment)>,
}

impl MessageBuilder {
    /// Start a builder for a descriptor.
    pub fn new(descriptor: Arc<MessageDescriptor>) -> Self {
        MessageBuilder {
            descriptor,
            assignments: Vec::new(),
        }
    }

    /// The descriptor being built.
    pub fn descriptor(&self) -> &Arc<MessageDescriptor> {
        &self.descriptor
    }

    /// Set a field. Later assignments to the same field win.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.assignments
            .push((field.into(), Assignment::Value(value.into())));
        self
    }

    /// Set an enumerated field by variant name.
    pub fn with_named(mut self, field: impl Into<String>, variant: impl Into<String>) -> Self {
        self.assignments
            .push((field.into(), Assignment::Variant(variant.into())));
        self
    }

    /// Validate every field and produce the message.
    pub fn build(self) -> CodecResult<MessageValue> {
        let desc = &self.descriptor;
        let mut values: Vec<FieldValue> = desc.fields.iter().map(|f| f.default_value()).collect();

        for (name, assignment) in self.assignments {
            let index = desc.field_index(&name).ok_or_else(|| {
                CodecError::validation(&name, format!("{} has no such field", desc.name))
            })?;
            values[index] = match assignment {
                Assignment::Value(value) => value,
                Assignment::Variant(variant) => match &desc.fields[index].wire {
                    WireType::Enum(domain) => {
                        let tag = domain.tag_of(&variant).ok_or_else(|| {
                            CodecError::validation(
                                &name,
                                format!("`{}` is not a variant of {}", variant, domain.name),
                            )
                        })?;
                        FieldValue::Enum(EnumValue::Known(tag))
                    }
                    other => {
                        return Err(CodecError::validation(
                            &name,
                            format!("variant names apply to enums, field is {}", other),
                        ))
                    }
                },
            };
        }

        for (spec, value) in desc.fields.iter().zip(values.iter_mut()) {
            if !spec.wire.accepts(value) {
                return Err(CodecError::validation(
                    &spec.name,
                    format!("expected a value for {}, got a {}", spec.wire, value.kind_name()),
                ));
            }
            match (&spec.wire, &*value) {
                (WireType::Enum(domain), FieldValue::Enum(EnumValue::Known(tag))) => {
                    if !domain.contains(*tag) {
                        return Err(CodecError::validation(
                            &spec.name,
                            format!("{} is not a variant of {}", tag, domain.name),
                        ));
                    }
                }
                (WireType::Enum(domain), FieldValue::Enum(EnumValue::Unrecognized(tag))) => {
                    let normalized = domain.classify(*tag);
                    *value = FieldValue::Enum(normalized);
                }
                (WireType::Bitmask(domain), FieldValue::Bitmask(bits)) => {
                    let undeclared = bits & !domain.declared_bits();
                    if !domain.flags.is_empty() && undeclared != 0 {
                        return Err(CodecError::validation(
                            &spec.name,
                            format!("bits 0x{:X} are not flags of {}", undeclared, domain.name),
                        ));
                    }
                }
                _ => {}
            }
            spec.constraint
                .check(value)
                .map_err(|reason| CodecError::validation(&spec.name, reason))?;
        }

        for rule in &desc.rules {
            check_rule(desc, rule, &values)?;
        }

        Ok(MessageValue::from_parts(self.descriptor.clone(), values))
    }
}

fn check_rule(desc: &MessageDescriptor, rule: &Rule, values: &[FieldValue]) -> CodecResult<()> {
    match rule {
        Rule::NotLessThan { field, other } => {
            let lhs = desc.field_index(field).and_then(|i| values[i].as_int());
            let rhs = desc.field_index(other).and_then(|i| values[i].as_int());
            match (lhs, rhs) {
                (Some(lhs), Some(rhs)) if lhs >= rhs => Ok(()),
                (Some(lhs), Some(rhs)) => Err(CodecError::validation(
                    field,
                    format!("{} must not be less than {} ({})", lhs, other, rhs),
                )),
                _ => Err(CodecError::validation(field, format!("rule `{}` needs integers", rule))),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{Direction, FieldSpec};
    use crate::types::{BdAddr, BitmaskDomain, EnumDomain, IntWidth};

    fn descriptor() -> Arc<MessageDescriptor> {
        Arc::new(
            MessageDescriptor::new("connect", Direction::Command, 0x06, 0x03)
                .field(FieldSpec::new("address", WireType::BdAddr))
                .field(FieldSpec::new(
                    "addr_type",
                    WireType::Enum(
                        EnumDomain::new("address_type", IntWidth::U8, 0xFF)
                            .variant("public", 0)
                            .variant("random", 1),
                    ),
                ))
                .field(FieldSpec::new("min", WireType::Uint16).with_range(6, 3200))
                .field(FieldSpec::new("max", WireType::Uint16).with_range(6, 3200).with_default(3200u16))
                .field(FieldSpec::new(
                    "flags",
                    WireType::Bitmask(BitmaskDomain::new("f", IntWidth::U8).flag("a", 1).flag("b", 2)),
                ))
                .not_less_than("max", "min"),
        )
    }

    #[test]
    fn test_defaults_applied() {
        let msg = MessageBuilder::new(descriptor()).with("min", 6u16).build().unwrap();
        assert_eq!(msg.get("address"), Some(&FieldValue::Address(BdAddr::default())));
        assert_eq!(msg.get_enum("addr_type"), Some(EnumValue::Unrecognized(0xFF)));
        assert_eq!(msg.get_int("max"), Some(3200));
        assert_eq!(msg.get("flags"), Some(&FieldValue::Bitmask(0)));
    }

    #[test]
    fn test_zero_default_violates_range() {
        let err = MessageBuilder::new(descriptor()).build().unwrap_err();
        assert_eq!(err.field(), Some("min"));
    }

    #[test]
    fn test_range_bounds() {
        for ok in [6u16, 3200] {
            assert!(MessageBuilder::new(descriptor()).with("min", ok).build().is_ok());
        }
        for bad in [5u16, 3201] {
            let err = MessageBuilder::new(descriptor())
                .with("min", bad)
                .build()
                .unwrap_err();
            assert!(matches!(err, CodecError::Validation { ref field, .. } if field == "min"));
        }
    }

    #[test]
    fn test_named_variant() {
        let msg = MessageBuilder::new(descriptor())
            .with("min", 40u16)
            .with_named("addr_type", "Random")
            .build()
            .unwrap();
        assert_eq!(msg.get_enum("addr_type"), Some(EnumValue::Known(1)));

        let err = MessageBuilder::new(descriptor())
            .with("min", 40u16)
            .with_named("addr_type", "static")
            .build()
            .unwrap_err();
        assert_eq!(err.field(), Some("addr_type"));

        let err = MessageBuilder::new(descriptor())
            .with("min", 40u16)
            .with_named("min", "public")
            .build()
            .unwrap_err();
        assert_eq!(err.field(), Some("min"));
    }

    #[test]
    fn test_enum_normalization() {
        let msg = MessageBuilder::new(descriptor())
            .with("min", 40u16)
            .with("addr_type", EnumValue::Unrecognized(1))
            .build()
            .unwrap();
        assert_eq!(msg.get_enum("addr_type"), Some(EnumValue::Known(1)));

        let err = MessageBuilder::new(descriptor())
            .with("min", 40u16)
            .with("addr_type", EnumValue::Known(9))
            .build()
            .unwrap_err();
        assert_eq!(err.field(), Some("addr_type"));
    }

    #[test]
    fn test_unknown_field_and_type_mismatch() {
        let err = MessageBuilder::new(descriptor())
            .with("nope", 1u8)
            .build()
            .unwrap_err();
        assert_eq!(err.field(), Some("nope"));

        let err = MessageBuilder::new(descriptor())
            .with("min", 40u16)
            .with("address", 5u8)
            .build()
            .unwrap_err();
        assert_eq!(err.field(), Some("address"));
    }

    #[test]
    fn test_cross_field_rule() {
        let err = MessageBuilder::new(descriptor())
            .with("min", 100u16)
            .with("max", 80u16)
            .build()
            .unwrap_err();
        assert_eq!(err.field(), Some("max"));

        assert!(MessageBuilder::new(descriptor())
            .with("min", 80u16)
            .with("max", 80u16)
            .build()
            .is_ok());
    }

    #[test]
    fn test_undeclared_bitmask_bits() {
        let err = MessageBuilder::new(descriptor())
            .with("min", 40u16)
            .with("flags", FieldValue::Bitmask(0x04))
            .build()
            .unwrap_err();
        assert_eq!(err.field(), Some("flags"));
    }

    #[test]
    fn test_last_assignment_wins() {
        let msg = MessageBuilder::new(descriptor())
            .with("min", 10u16)
            .with("min", 20u16)
            .build()
            .unwrap();
        assert_eq!(msg.get_int("min"), Some(20));
    }
}
