//! Device schema types and field coercion
//!
//! A [`DeviceSchema`] declares which static fields a device kind takes and
//! which cardinality blocks (channels, segments) it supports. An absent
//! cardinality block means the direction is not supported at all.

use serde::{Deserialize, Serialize};

use crate::error::{EditorError, Result};

/// Value type of a configuration field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Int,
    Float,
    Choice,
}

/// One configuration field of a device kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Allowed values, only meaningful for [`FieldType::Choice`]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub choices: Option<Vec<String>>,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            choices: None,
        }
    }

    pub fn choice(name: impl Into<String>, choices: &[&str]) -> Self {
        Self {
            name: name.into(),
            field_type: FieldType::Choice,
            choices: Some(choices.iter().map(|c| c.to_string()).collect()),
        }
    }
}

/// Bounds on how many channels or segments a direction may have.
///
/// `max_count == -1` means unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cardinality {
    pub min_count: i64,
    pub max_count: i64,
}

impl Cardinality {
    pub const UNBOUNDED: i64 = -1;

    pub fn new(min_count: i64, max_count: i64) -> Self {
        Self {
            min_count,
            max_count,
        }
    }

    /// Exactly one
    pub fn single() -> Self {
        Self::new(1, 1)
    }

    /// Zero or more
    pub fn any() -> Self {
        Self::new(0, Self::UNBOUNDED)
    }

    pub fn is_unbounded(&self) -> bool {
        self.max_count == Self::UNBOUNDED
    }

    /// Whether one more item still fits under `max_count`
    pub fn allows_another(&self, current: usize) -> bool {
        self.is_unbounded() || (current as i64) < self.max_count
    }
}

/// Capability descriptor for one device kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceSchema {
    pub required_fields: Vec<FieldSpec>,
    pub optional_fields: Vec<FieldSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_channels: Option<Cardinality>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_channels: Option<Cardinality>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_segments: Option<Cardinality>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_segments: Option<Cardinality>,
}

impl DeviceSchema {
    /// Required fields followed by optional fields, in declared order
    pub fn fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.required_fields.iter().chain(self.optional_fields.iter())
    }

    /// Whether a field name occurs more than once across required and optional
    pub fn has_duplicate_fields(&self) -> bool {
        let names: Vec<&str> = self.fields().map(|f| f.name.as_str()).collect();
        names
            .iter()
            .enumerate()
            .any(|(i, name)| names[i + 1..].contains(name))
    }
}

/// A committed field value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Int(i64),
    Float(f64),
    Text(String),
    List(Vec<String>),
}

impl FieldValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Float(v) => Some(*v),
            FieldValue::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            FieldValue::List(v) => Some(v),
            _ => None,
        }
    }
}

/// Coerce raw form text into a value of the field's type.
///
/// Numbers use prefix-tolerant parsing: `"12abc"` is 12 and `"1.5x"` is 1.5,
/// while text with no leading number fails with `InvalidNumber`. Floats must
/// be finite, so `"Infinity"` and overflowing values like `"1e400"` fail too.
pub fn coerce_field(field: &FieldSpec, raw: &str) -> Result<FieldValue> {
    let invalid = || EditorError::InvalidNumber {
        field: field.name.clone(),
        value: raw.to_string(),
    };

    match field.field_type {
        FieldType::Int => parse_int_prefix(raw).map(FieldValue::Int).ok_or_else(invalid),
        FieldType::Float => parse_float_prefix(raw)
            .filter(|v| v.is_finite())
            .map(FieldValue::Float)
            .ok_or_else(invalid),
        FieldType::String | FieldType::Choice => Ok(FieldValue::Text(raw.to_string())),
    }
}

/// Number of ASCII digits starting at `from`
fn scan_digits(bytes: &[u8], from: usize) -> usize {
    bytes[from..].iter().take_while(|b| b.is_ascii_digit()).count()
}

fn sign_len(bytes: &[u8]) -> usize {
    match bytes.first() {
        Some(b'+') | Some(b'-') => 1,
        _ => 0,
    }
}

fn parse_int_prefix(raw: &str) -> Option<i64> {
    let s = raw.trim_start();
    let bytes = s.as_bytes();
    let sign = sign_len(bytes);
    let digits = scan_digits(bytes, sign);
    if digits == 0 {
        return None;
    }
    s[..sign + digits].parse().ok()
}

fn parse_float_prefix(raw: &str) -> Option<f64> {
    let s = raw.trim_start();
    let bytes = s.as_bytes();
    let sign = sign_len(bytes);

    let int_digits = scan_digits(bytes, sign);
    let mut end = sign + int_digits;
    let mut frac_digits = 0;
    if bytes.get(end) == Some(&b'.') {
        frac_digits = scan_digits(bytes, end + 1);
        end += 1 + frac_digits;
    }
    if int_digits == 0 && frac_digits == 0 {
        return None;
    }

    // Exponent only counts when digits follow it
    if matches!(bytes.get(end), Some(b'e') | Some(b'E')) {
        let exp_sign = sign_len(&bytes[end + 1..]);
        let exp_digits = scan_digits(bytes, end + 1 + exp_sign);
        if exp_digits > 0 {
            end += 1 + exp_sign + exp_digits;
        }
    }

    s[..end].parse().ok()
}
