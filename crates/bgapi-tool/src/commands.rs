//! Subcommand implementations.
//!
//! Each command returns data; printing is left to `main`.

use std::fs;
use std::path::Path;

use bgapi_codec::{serialize, Catalog, CodecConfig, Direction, MessageValue, Parser};
use serde::Serialize;

use crate::error::{ToolError, ToolResult};

/// Command, response and event catalogs.
#[derive(Debug, Clone)]
pub struct Catalogs {
    commands: Catalog,
    responses: Catalog,
    events: Catalog,
}

impl Catalogs {
    /// The built-in catalogs only.
    pub fn builtin() -> Self {
        Catalogs {
            commands: Catalog::bluegiga(Direction::Command),
            responses: Catalog::bluegiga(Direction::Response),
            events: Catalog::bluegiga(Direction::Event),
        }
    }

    /// The built-in catalogs extended with the config's catalog files.
    ///
    /// Relative paths are resolved against `base`.
    pub fn from_config(config: &CodecConfig, base: &Path) -> ToolResult<Self> {
        let mut catalogs = Self::builtin();
        for file in &config.catalog_files {
            let path = base.join(file);
            let text = fs::read_to_string(&path).map_err(|source| ToolError::Io {
                path: path.clone(),
                source,
            })?;
            catalogs.extend_from_yaml(&text)?;
            tracing::info!("loaded catalog definitions from {}", path.display());
        }
        Ok(catalogs)
    }

    /// Add YAML kind definitions to every direction.
    pub fn extend_from_yaml(&mut self, text: &str) -> ToolResult<()> {
        self.commands.extend_from_yaml(text)?;
        self.responses.extend_from_yaml(text)?;
        self.events.extend_from_yaml(text)?;
        Ok(())
    }

    /// Catalog for one direction.
    pub fn get(&self, direction: Direction) -> &Catalog {
        match direction {
            Direction::Command => &self.commands,
            Direction::Response => &self.responses,
            Direction::Event => &self.events,
        }
    }
}

/// Load a config file.
pub fn load_config(path: &Path) -> ToolResult<CodecConfig> {
    let text = fs::read_to_string(path).map_err(|source| ToolError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(CodecConfig::from_yaml(&text)?)
}

/// Build a command from `name=value` assignments and encode it.
pub fn encode(
    catalog: &Catalog,
    kind: &str,
    assignments: &[String],
) -> ToolResult<(MessageValue, Vec<u8>)> {
    let mut builder = catalog.builder(kind)?;
    for assignment in assignments {
        let (field, text) = assignment
            .split_once('=')
            .ok_or_else(|| ToolError::Assignment(assignment.clone()))?;
        let field = field.trim();
        let spec = builder
            .descriptor()
            .field_spec(field)
            .ok_or_else(|| ToolError::Field {
                field: field.to_string(),
                reason: format!("{} has no such field", kind),
            })?;
        let value = spec.wire.parse_value(text).map_err(|reason| ToolError::Field {
            field: field.to_string(),
            reason,
        })?;
        builder = builder.with(field, value);
    }

    let message = builder.build()?;
    let bytes = serialize(&message)?;
    tracing::debug!("encoded {} as {} bytes", message.name(), bytes.len());
    Ok((message, bytes))
}

/// Parse hex text into bytes. Whitespace and `:` separators are ignored.
pub fn parse_hex(text: &str) -> ToolResult<Vec<u8>> {
    let digits: String = text
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ':')
        .collect();
    Ok(hex::decode(digits)?)
}

/// Decode every message in `data`.
pub fn decode(catalog: &Catalog, config: &CodecConfig, data: &[u8]) -> ToolResult<Vec<MessageValue>> {
    let parser = Parser::new(catalog).with_unknown_enums(config.unknown_enums);
    let mut messages = Vec::new();
    let mut offset = 0;
    while offset < data.len() {
        let (message, used) = parser.parse_prefix(&data[offset..])?;
        tracing::debug!("decoded {} from {} bytes at offset {}", message.name(), used, offset);
        messages.push(message);
        offset += used;
    }
    Ok(messages)
}

/// One field in a kind listing.
#[derive(Debug, Serialize)]
pub struct FieldSummary {
    pub name: String,
    #[serde(rename = "type")]
    pub wire: String,
    pub constraint: String,
}

/// One kind in a kind listing.
#[derive(Debug, Serialize)]
pub struct KindSummary {
    pub name: String,
    pub class: u8,
    pub method: u8,
    pub fields: Vec<FieldSummary>,
}

/// Describe every kind in a catalog.
pub fn kinds(catalog: &Catalog) -> Vec<KindSummary> {
    catalog
        .iter()
        .map(|d| KindSummary {
            name: d.name.clone(),
            class: d.kind.class,
            method: d.kind.method,
            fields: d
                .fields
                .iter()
                .map(|f| FieldSummary {
                    name: f.name.clone(),
                    wire: f.wire.to_string(),
                    constraint: f.constraint.to_string(),
                })
                .collect(),
        })
        .collect()
}
