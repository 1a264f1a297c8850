use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::reference::Reference;

/// A schema node: a `$ref` or an inline definition, never both.
///
/// The `$ref` arm is tried first, so a mapping carrying `$ref` always
/// deserializes as a reference even if it carries stray sibling keys.
/// After resolution every schema reachable from the path table is `Inline`,
/// except occurrences truncated by the cycle guard.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Schema {
    Reference {
        #[serde(rename = "$ref")]
        reference: Reference,
    },
    Inline(Box<SchemaObject>),
}

impl Schema {
    pub fn as_inline(&self) -> Option<&SchemaObject> {
        match self {
            Schema::Inline(obj) => Some(obj),
            Schema::Reference { .. } => None,
        }
    }

    pub fn is_reference(&self) -> bool {
        matches!(self, Schema::Reference { .. })
    }

    /// True when this node is inline and matches the canonical error shape.
    pub fn is_error_shape(&self) -> bool {
        self.as_inline().is_some_and(SchemaObject::is_error_shape)
    }
}

/// An inline schema definition.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaObject {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<serde_yaml::Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,

    #[serde(rename = "minLength", skip_serializing_if = "Option::is_none")]
    pub min_length: Option<i64>,

    #[serde(rename = "maxLength", skip_serializing_if = "Option::is_none")]
    pub max_length: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<i64>,

    #[serde(rename = "exclusiveMinimum", skip_serializing_if = "is_false")]
    pub exclusive_minimum: bool,

    #[serde(rename = "exclusiveMaximum", skip_serializing_if = "is_false")]
    pub exclusive_maximum: bool,

    #[serde(rename = "enum", skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_yaml::Value>,

    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub properties: IndexMap<String, Schema>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Schema>>,

    #[serde(
        rename = "additionalProperties",
        skip_serializing_if = "Option::is_none"
    )]
    pub additional_properties: Option<Box<Schema>>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
}

fn is_false(v: &bool) -> bool {
    !*v
}

impl SchemaObject {
    /// Recognizes the canonical error shape: an object with exactly two
    /// properties, `status` (integer) and `message` (string). Responses
    /// carrying this shape are wired into the automatic fault path.
    pub fn is_error_shape(&self) -> bool {
        if self.schema_type.as_deref() != Some("object") || self.properties.len() != 2 {
            return false;
        }
        self.property_has_type("status", "integer") && self.property_has_type("message", "string")
    }

    fn property_has_type(&self, name: &str, expected: &str) -> bool {
        self.properties
            .get(name)
            .and_then(Schema::as_inline)
            .is_some_and(|p| p.schema_type.as_deref() == Some(expected))
    }
}
