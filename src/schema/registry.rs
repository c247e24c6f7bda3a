//! Device schema registry
//!
//! Read-only lookup table of device kinds. Kinds are registered while the
//! registry is built and listed back in registration order.

use std::collections::HashMap;

use super::field::{Cardinality, DeviceSchema, FieldSpec, FieldType};
use crate::error::{EditorError, Result};

/// Registry of available device kinds
#[derive(Debug, Clone, Default)]
pub struct DeviceSchemaRegistry {
    schemas: HashMap<String, DeviceSchema>,
    order: Vec<String>,
}

impl DeviceSchemaRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            schemas: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Create registry with the built-in device kinds
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for (name, schema) in default_schemas() {
            // Built-in tables are known to be well formed
            if let Err(e) = registry.register(name, schema) {
                log::error!("Skipping built-in device kind: {}", e);
            }
        }
        registry
    }

    /// Register a device kind.
    ///
    /// A kind can only be registered once, and field names must be unique
    /// across its required and optional fields.
    pub fn register(&mut self, name: impl Into<String>, schema: DeviceSchema) -> Result<()> {
        let name = name.into();
        if self.schemas.contains_key(&name) {
            return Err(EditorError::InvalidSchema {
                kind: name,
                reason: "kind is already registered".to_string(),
            });
        }
        if schema.has_duplicate_fields() {
            return Err(EditorError::InvalidSchema {
                kind: name,
                reason: "field names must be unique".to_string(),
            });
        }
        self.order.push(name.clone());
        self.schemas.insert(name, schema);
        Ok(())
    }

    /// Check if a device kind is registered
    pub fn kind_exists(&self, name: &str) -> bool {
        self.schemas.contains_key(name)
    }

    /// Get a schema by kind name
    pub fn get_schema(&self, name: &str) -> Result<&DeviceSchema> {
        self.schemas.get(name).ok_or_else(|| EditorError::NotFound {
            kind: name.to_string(),
        })
    }

    /// All kind names in registration order
    pub fn list_kinds(&self) -> Vec<&str> {
        self.order.iter().map(|s| s.as_str()).collect()
    }

    pub fn supports_input(&self, name: &str) -> Result<bool> {
        Ok(self.get_schema(name)?.input_channels.is_some())
    }

    pub fn supports_output(&self, name: &str) -> Result<bool> {
        Ok(self.get_schema(name)?.output_channels.is_some())
    }

    pub fn supports_input_segments(&self, name: &str) -> Result<bool> {
        Ok(self.get_schema(name)?.input_segments.is_some())
    }

    pub fn supports_output_segments(&self, name: &str) -> Result<bool> {
        Ok(self.get_schema(name)?.output_segments.is_some())
    }
}

/// The device kinds the playback engine understands
fn default_schemas() -> Vec<(&'static str, DeviceSchema)> {
    vec![
        (
            "VirtualInstrument",
            DeviceSchema {
                required_fields: vec![
                    FieldSpec::choice("instrument", &["drums1"]),
                    FieldSpec::new("output_channel", FieldType::String),
                ],
                optional_fields: vec![FieldSpec::new("volume", FieldType::Float)],
                input_channels: None,
                output_channels: Some(Cardinality::single()),
                input_segments: None,
                output_segments: Some(Cardinality::any()),
            },
        ),
        (
            "Metronome",
            DeviceSchema {
                required_fields: vec![FieldSpec::new("output_channel", FieldType::String)],
                optional_fields: vec![],
                input_channels: None,
                output_channels: Some(Cardinality::single()),
                input_segments: None,
                output_segments: Some(Cardinality::any()),
            },
        ),
        (
            "AudioOutput",
            DeviceSchema {
                required_fields: vec![
                    FieldSpec::new("device", FieldType::String),
                    FieldSpec::new("input_channel", FieldType::String),
                ],
                optional_fields: vec![],
                input_channels: Some(Cardinality::single()),
                output_channels: None,
                input_segments: Some(Cardinality::any()),
                output_segments: None,
            },
        ),
        (
            "AudioInput",
            DeviceSchema {
                required_fields: vec![
                    FieldSpec::new("Device Name", FieldType::String),
                    FieldSpec::new("output_channel", FieldType::String),
                ],
                optional_fields: vec![],
                input_channels: None,
                output_channels: Some(Cardinality::single()),
                input_segments: None,
                output_segments: Some(Cardinality::any()),
            },
        ),
    ]
}
