//! Parameter schemas: declared field types and constraints for a capability.
//!
//! The executor validates incoming parameters against the schema before the
//! handler ever runs, collecting one message per offending field.

use crate::capability::Parameters;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// The JSON type a field must carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    String,
    Integer,
    Number,
    Boolean,
    Array,
    Object,
    Any,
}

impl FieldKind {
    fn matches(&self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Number => value.is_number(),
            Self::Boolean => value.is_boolean(),
            Self::Array => value.is_array(),
            Self::Object => value.is_object(),
            Self::Any => true,
        }
    }

    fn json_type(&self) -> Option<&'static str> {
        match self {
            Self::String => Some("string"),
            Self::Integer => Some("integer"),
            Self::Number => Some("number"),
            Self::Boolean => Some("boolean"),
            Self::Array => Some("array"),
            Self::Object => Some("object"),
            Self::Any => None,
        }
    }

    fn article(&self) -> &'static str {
        match self {
            Self::Integer | Self::Array | Self::Object | Self::Any => "an",
            _ => "a",
        }
    }
}

/// Constraints on a single named field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub kind: FieldKind,

    #[serde(default)]
    pub required: bool,

    /// Minimum length in characters (strings) or items (arrays)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,

    /// Maximum length in characters (strings) or items (arrays)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl FieldSpec {
    pub fn required(kind: FieldKind) -> Self {
        Self {
            kind,
            required: true,
            min_length: None,
            max_length: None,
            description: None,
        }
    }

    pub fn optional(kind: FieldKind) -> Self {
        Self {
            required: false,
            ..Self::required(kind)
        }
    }

    pub fn min_length(mut self, min: usize) -> Self {
        self.min_length = Some(min);
        self
    }

    pub fn max_length(mut self, max: usize) -> Self {
        self.max_length = Some(max);
        self
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    fn check(&self, name: &str, value: &Value) -> Option<String> {
        if !self.kind.matches(value) {
            let kind = self.kind.json_type().unwrap_or("value");
            return Some(format!("{name} must be {} {kind}", self.kind.article()));
        }

        let (len, unit) = match value {
            Value::String(s) => (s.chars().count(), "characters"),
            Value::Array(items) => (items.len(), "items"),
            _ => return None,
        };

        if let Some(min) = self.min_length {
            if len < min {
                return Some(format!("{name} must be at least {min} {unit}"));
            }
        }
        if let Some(max) = self.max_length {
            if len > max {
                return Some(format!("{name} must be no more than {max} {unit}"));
            }
        }
        None
    }
}

/// Ordered field name → constraint mapping.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterSchema {
    fields: Vec<(String, FieldSpec)>,
}

impl ParameterSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field. Redeclaring a name replaces the earlier spec in place.
    pub fn field(mut self, name: impl Into<String>, spec: FieldSpec) -> Self {
        let name = name.into();
        match self.fields.iter_mut().find(|(existing, _)| *existing == name) {
            Some(slot) => slot.1 = spec,
            None => self.fields.push((name, spec)),
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&FieldSpec> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, spec)| spec)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldSpec)> {
        self.fields.iter().map(|(name, spec)| (name.as_str(), spec))
    }

    pub fn required_fields(&self) -> Vec<&str> {
        self.fields()
            .filter(|(_, spec)| spec.required)
            .map(|(name, _)| name)
            .collect()
    }

    /// Check `parameters` against every declared field.
    ///
    /// Returns per-field failure messages. A `null` value counts as absent.
    /// Fields not declared in the schema are rejected.
    pub fn validate(&self, parameters: &Parameters) -> Result<(), BTreeMap<String, String>> {
        let mut errors = BTreeMap::new();

        for (name, spec) in self.fields() {
            match parameters.get(name) {
                None | Some(Value::Null) => {
                    if spec.required {
                        errors.insert(name.to_string(), format!("{name} is required"));
                    }
                }
                Some(value) => {
                    if let Some(problem) = spec.check(name, value) {
                        errors.insert(name.to_string(), problem);
                    }
                }
            }
        }

        for name in parameters.keys() {
            if !self.contains(name) {
                errors.insert(name.clone(), format!("{name} is not a recognized parameter"));
            }
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }

    /// Render as a JSON Schema object, for introspection.
    pub fn to_json_schema(&self) -> Value {
        let mut properties = serde_json::Map::new();
        for (name, spec) in self.fields() {
            let mut prop = serde_json::Map::new();
            if let Some(kind) = spec.kind.json_type() {
                prop.insert("type".into(), kind.into());
            }
            if let Some(description) = &spec.description {
                prop.insert("description".into(), description.clone().into());
            }
            let (min_key, max_key) = match spec.kind {
                FieldKind::Array => ("minItems", "maxItems"),
                _ => ("minLength", "maxLength"),
            };
            if let Some(min) = spec.min_length {
                prop.insert(min_key.into(), min.into());
            }
            if let Some(max) = spec.max_length {
                prop.insert(max_key.into(), max.into());
            }
            properties.insert(name.to_string(), Value::Object(prop));
        }

        serde_json::json!({
            "type": "object",
            "properties": properties,
            "required": self.required_fields(),
        })
    }
}
