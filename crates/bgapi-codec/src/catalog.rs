//! Message catalogs.
//!
//! A [`Catalog`] maps (class, method) pairs to descriptors for one
//! [`Direction`]. BGAPI reuses the same pair for a command and its response,
//! so each direction gets its own catalog.
//!
//! Kinds can be registered in code or loaded from YAML:
//!
//! ```yaml
//! kinds:
//!   - name: vendor_set_power
//!     class: 16
//!     method: 1
//!     direction: command
//!     fields:
//!       - name: level
//!         type: uint8
//!         min: 0
//!         max: 15
//!       - name: mode
//!         type: enum
//!         width: uint8
//!         variants: { off: 0, low: 1, high: 2 }
//! ```
//!
//! A definition without `direction` is registered in whichever catalog loads it.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Deserialize;

use crate::bluegiga;
use crate::builder::MessageBuilder;
use crate::descriptor::{Direction, FieldSpec, MessageDescriptor, MessageKind};
use crate::error::{CodecError, CodecResult};
use crate::types::{BitmaskDomain, EnumDomain, IntWidth, WireType};

/// Descriptors for one direction, keyed by (class, method).
#[derive(Debug, Clone)]
pub struct Catalog {
    direction: Direction,
    kinds: BTreeMap<MessageKind, Arc<MessageDescriptor>>,
}

impl Catalog {
    /// Create an empty catalog.
    pub fn new(direction: Direction) -> Self {
        Catalog {
            direction,
            kinds: BTreeMap::new(),
        }
    }

    /// The built-in BlueGiga catalog for a direction.
    pub fn bluegiga(direction: Direction) -> Self {
        let mut catalog = Catalog::new(direction);
        for descriptor in bluegiga::descriptors(direction) {
            catalog.kinds.insert(descriptor.kind, Arc::new(descriptor));
        }
        catalog
    }

    /// Parse YAML kind definitions into a new catalog.
    pub fn load_yaml(direction: Direction, text: &str) -> CodecResult<Self> {
        let mut catalog = Catalog::new(direction);
        catalog.extend_from_yaml(text)?;
        Ok(catalog)
    }

    /// Direction of every kind in this catalog.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Register a descriptor under (class, method).
    ///
    /// Fails if the pair or the name is taken, if the descriptor says
    /// otherwise about its own kind or direction, or if its rules and
    /// defaults do not fit its fields.
    pub fn register_kind(
        &mut self,
        class: u8,
        method: u8,
        descriptor: MessageDescriptor,
    ) -> CodecResult<()> {
        let kind = MessageKind::new(class, method);
        if descriptor.kind != kind {
            return Err(CodecError::invalid_catalog(format!(
                "{} declares kind {}, registered as {}",
                descriptor.name, descriptor.kind, kind
            )));
        }
        if descriptor.direction != self.direction {
            return Err(CodecError::invalid_catalog(format!(
                "{} is a {}, catalog holds {}s",
                descriptor.name, descriptor.direction, self.direction
            )));
        }
        descriptor
            .check_consistency()
            .map_err(CodecError::InvalidCatalog)?;
        if let Some(existing) = self.kinds.get(&kind) {
            return Err(CodecError::DuplicateKind {
                class,
                method,
                existing: existing.name.clone(),
            });
        }
        if let Some(existing) = self.find_by_name(&descriptor.name) {
            return Err(CodecError::invalid_catalog(format!(
                "name {} is already registered as {}",
                descriptor.name, existing.kind
            )));
        }

        log::debug!("registered {} {} as {}", self.direction, kind, descriptor.name);
        self.kinds.insert(kind, Arc::new(descriptor));
        Ok(())
    }

    /// Register a descriptor under its own kind.
    pub fn register(&mut self, descriptor: MessageDescriptor) -> CodecResult<()> {
        let MessageKind { class, method } = descriptor.kind;
        self.register_kind(class, method, descriptor)
    }

    /// Register every kind in a YAML definition.
    ///
    /// Either all matching kinds are registered or none are.
    pub fn extend_from_yaml(&mut self, text: &str) -> CodecResult<()> {
        let def: CatalogDef = serde_yaml::from_str(text)
            .map_err(|e| CodecError::invalid_catalog(e.to_string()))?;

        let mut staged = self.clone();
        let mut added = 0;
        for kind in def.kinds {
            if kind.direction.is_some_and(|d| d != self.direction) {
                continue;
            }
            staged.register(kind.into_descriptor(self.direction)?)?;
            added += 1;
        }

        log::debug!("loaded {} {} kinds from definition", added, self.direction);
        *self = staged;
        Ok(())
    }

    /// Descriptor for a (class, method) pair.
    pub fn lookup(&self, kind: MessageKind) -> Option<&Arc<MessageDescriptor>> {
        self.kinds.get(&kind)
    }

    /// Descriptor by message name.
    pub fn find_by_name(&self, name: &str) -> Option<&Arc<MessageDescriptor>> {
        self.kinds.values().find(|d| d.name == name)
    }

    /// Start a builder for the named message.
    pub fn builder(&self, name: &str) -> CodecResult<MessageBuilder> {
        self.find_by_name(name)
            .map(|d| MessageBuilder::new(Arc::clone(d)))
            .ok_or_else(|| CodecError::UnknownMessageName(name.to_string()))
    }

    /// All descriptors, ordered by (class, method).
    pub fn iter(&self) -> impl Iterator<Item = &Arc<MessageDescriptor>> {
        self.kinds.values()
    }

    /// Number of registered kinds.
    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    /// Whether no kinds are registered.
    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}

// ============================================================================
// YAML Definitions
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CatalogDef {
    #[serde(default)]
    kinds: Vec<KindDef>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct KindDef {
    name: String,
    class: u8,
    method: u8,
    #[serde(default)]
    direction: Option<Direction>,
    #[serde(default)]
    fields: Vec<FieldDef>,
    #[serde(default)]
    rules: Vec<RuleDef>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FieldDef {
    name: String,
    #[serde(rename = "type")]
    wire: String,
    #[serde(default)]
    width: Option<String>,
    #[serde(default)]
    domain: Option<String>,
    #[serde(default)]
    min: Option<i64>,
    #[serde(default)]
    max: Option<i64>,
    #[serde(default)]
    max_len: Option<usize>,
    #[serde(default)]
    variants: BTreeMap<String, u32>,
    #[serde(default)]
    flags: BTreeMap<String, u32>,
    #[serde(default)]
    unknown: Option<u32>,
    #[serde(default)]
    default: Option<serde_yaml::Value>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RuleDef {
    field: String,
    not_less_than: String,
}

impl KindDef {
    fn into_descriptor(self, direction: Direction) -> CodecResult<MessageDescriptor> {
        let mut descriptor = MessageDescriptor::new(&self.name, direction, self.class, self.method);
        for field in self.fields {
            let spec = field
                .into_spec()
                .map_err(|e| CodecError::invalid_catalog(format!("{}: {}", self.name, e)))?;
            descriptor = descriptor.field(spec);
        }
        for rule in self.rules {
            descriptor = descriptor.not_less_than(rule.field, rule.not_less_than);
        }
        Ok(descriptor)
    }
}

impl FieldDef {
    fn into_spec(self) -> Result<FieldSpec, String> {
        let wire = self.wire_type()?;
        let mut spec = FieldSpec::new(&self.name, wire);

        if self.min.is_some() || self.max.is_some() {
            let (lo, hi) = spec
                .wire
                .bounds()
                .ok_or_else(|| format!("`{}`: min/max need an integer type", self.name))?;
            let min = self.min.unwrap_or(lo);
            let max = self.max.unwrap_or(hi);
            if min > max {
                return Err(format!("`{}`: min {} is above max {}", self.name, min, max));
            }
            spec = spec.with_range(min, max);
        }
        if let Some(max_len) = self.max_len {
            if spec.wire != WireType::Bytes {
                return Err(format!("`{}`: max_len needs uint8array", self.name));
            }
            spec = spec.with_max_len(max_len);
        }
        if let Some(default) = &self.default {
            let text = scalar_text(default)
                .ok_or_else(|| format!("`{}`: default must be a scalar", self.name))?;
            let value = spec
                .wire
                .parse_value(&text)
                .map_err(|e| format!("`{}`: bad default: {}", self.name, e))?;
            spec = spec.with_default(value);
        }
        if let Some(description) = self.description {
            spec = spec.with_description(description);
        }
        Ok(spec)
    }

    fn wire_type(&self) -> Result<WireType, String> {
        let is_enum = self.wire == "enum";
        let is_bitmask = self.wire == "bitmask";
        let misplaced = [
            ("width", self.width.is_some() && !(is_enum || is_bitmask)),
            ("domain", self.domain.is_some() && !(is_enum || is_bitmask)),
            ("variants", !self.variants.is_empty() && !is_enum),
            ("unknown", self.unknown.is_some() && !is_enum),
            ("flags", !self.flags.is_empty() && !is_bitmask),
        ];
        if let Some((key, _)) = misplaced.iter().find(|(_, bad)| *bad) {
            return Err(format!("`{}`: {} does not apply to {}", self.name, key, self.wire));
        }

        let width = match &self.width {
            Some(name) => IntWidth::from_name(name)
                .ok_or_else(|| format!("`{}`: unknown width `{}`", self.name, name))?,
            None => IntWidth::U8,
        };
        let domain = self.domain.clone().unwrap_or_else(|| self.name.clone());

        match self.wire.as_str() {
            "uint8" => Ok(WireType::Uint8),
            "uint16" => Ok(WireType::Uint16),
            "uint32" => Ok(WireType::Uint32),
            "int8" => Ok(WireType::Int8),
            "bd_addr" => Ok(WireType::BdAddr),
            "uint8array" => Ok(WireType::Bytes),
            "enum" => {
                let unknown = self.unknown.unwrap_or(width.max() as u32);
                let mut enum_domain = EnumDomain::new(domain, width, unknown);
                for (name, tag) in &self.variants {
                    if i64::from(*tag) > width.max() {
                        return Err(format!("`{}`: variant {} does not fit {}", self.name, name, width));
                    }
                    enum_domain = enum_domain.variant(name.clone(), *tag);
                }
                Ok(WireType::Enum(enum_domain))
            }
            "bitmask" => {
                let mut mask_domain = BitmaskDomain::new(domain, width);
                for (name, bit) in &self.flags {
                    mask_domain = mask_domain.flag(name.clone(), *bit);
                }
                Ok(WireType::Bitmask(mask_domain))
            }
            other => Err(format!("`{}`: unknown type `{}`", self.name, other)),
        }
    }
}

fn scalar_text(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Bool(b) => Some(u8::from(*b).to_string()),
        _ => None,
    }
}
