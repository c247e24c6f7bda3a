//! Layer settings commit
//!
//! A submission names the layer, picks a device kind and supplies raw text
//! for every field and channel list. The commit either adopts the whole new
//! configuration or leaves the stored block untouched.
//!
//! # Protocol
//! 1. Unknown device kind: reject, nothing else is checked.
//! 2. Coerce required then optional fields into a fresh data map.
//! 3. Validate the input channel list if the kind has inputs.
//! 4. Validate the output channel list if the kind has outputs.
//! 5. Any error from 2-4: report all of them, block unchanged.
//! 6. Otherwise replace name, kind and data in one step.

use std::collections::BTreeMap;

use log::{info, warn};

use crate::error::{EditorError, ValidationErrors};
use crate::model::{Block, BlockStore, FieldData, LayerId};
use crate::schema::{coerce_field, parse_and_validate, DeviceSchemaRegistry, FieldValue};

/// Data key of the committed input channel list
pub const INPUT_CHANNELS_KEY: &str = "input_channels";
/// Data key of the committed output channel list
pub const OUTPUT_CHANNELS_KEY: &str = "output_channels";

/// Raw values from the layer settings dialog
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SettingsForm {
    pub name: String,
    pub device_kind: String,
    /// Raw text per field name
    pub fields: BTreeMap<String, String>,
    pub input_channels: Option<String>,
    pub output_channels: Option<String>,
}

impl SettingsForm {
    pub fn new(name: impl Into<String>, device_kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            device_kind: device_kind.into(),
            ..Default::default()
        }
    }

    pub fn field(mut self, name: impl Into<String>, raw: impl Into<String>) -> Self {
        self.fields.insert(name.into(), raw.into());
        self
    }

    pub fn inputs(mut self, raw: impl Into<String>) -> Self {
        self.input_channels = Some(raw.into());
        self
    }

    pub fn outputs(mut self, raw: impl Into<String>) -> Self {
        self.output_channels = Some(raw.into());
        self
    }
}

/// Build the block a submission would commit, without touching any store.
pub fn build_block(
    registry: &DeviceSchemaRegistry,
    layer: LayerId,
    form: &SettingsForm,
) -> Result<Block, ValidationErrors> {
    let schema = registry
        .get_schema(&form.device_kind)
        .map_err(ValidationErrors::from)?;

    let mut errors = ValidationErrors::new();
    let mut data = FieldData::new();

    for field in &schema.required_fields {
        let raw = form.fields.get(&field.name).map(String::as_str).unwrap_or("");
        match coerce_field(field, raw) {
            Ok(value) => {
                data.insert(field.name.clone(), value);
            }
            Err(e) => errors.push(e),
        }
    }
    for field in &schema.optional_fields {
        let Some(raw) = form.fields.get(&field.name) else {
            continue;
        };
        match coerce_field(field, raw) {
            Ok(value) => {
                data.insert(field.name.clone(), value);
            }
            Err(e) => errors.push(e),
        }
    }

    let directions = [
        (schema.input_channels, &form.input_channels, INPUT_CHANNELS_KEY, "input channels"),
        (schema.output_channels, &form.output_channels, OUTPUT_CHANNELS_KEY, "output channels"),
    ];
    for (cardinality, raw, key, what) in directions {
        let Some(cardinality) = cardinality else {
            continue;
        };
        let raw = raw.as_deref().unwrap_or("");
        match parse_and_validate(raw, &cardinality, what) {
            Ok(channels) => {
                data.insert(key.to_string(), FieldValue::List(channels));
            }
            Err(e) => errors.push(e),
        }
    }

    errors.into_result()?;

    Ok(Block {
        id: layer,
        name: form.name.clone(),
        device_kind: Some(form.device_kind.clone()),
        data,
    })
}

/// Validate a submission and, if it is clean, replace the layer's block.
pub fn commit_settings(
    registry: &DeviceSchemaRegistry,
    blocks: &mut BlockStore,
    layer: LayerId,
    form: &SettingsForm,
) -> Result<(), ValidationErrors> {
    if !blocks.contains(layer) {
        return Err(EditorError::UnknownLayer { layer }.into());
    }

    match build_block(registry, layer, form) {
        Ok(block) => {
            info!(
                "Layer {} configured as '{}' ({})",
                layer, block.name, form.device_kind
            );
            blocks.update_block(block).map_err(ValidationErrors::from)
        }
        Err(errors) => {
            warn!("Rejected settings for layer {}: {}", layer, errors);
            Err(errors)
        }
    }
}
