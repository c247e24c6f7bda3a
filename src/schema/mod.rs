//! Device Schema Module
//!
//! Describes what each device kind can be configured with:
//! - Registry of kinds and their capability blocks
//! - Field types and raw-text coercion
//! - Channel list parsing and count validation

mod channels;
mod field;
mod registry;

pub use channels::{parse_and_validate, parse_channel_list, validate_channel_count};
pub use field::{coerce_field, Cardinality, DeviceSchema, FieldSpec, FieldType, FieldValue};
pub use registry::DeviceSchemaRegistry;
