use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::reference::Reference;
use crate::schema::Schema;

/// A declared response: a `$ref` or an inline definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Response {
    Reference {
        #[serde(rename = "$ref")]
        reference: Reference,
    },
    Inline(ResponseObject),
}

impl Response {
    pub fn as_inline(&self) -> Option<&ResponseObject> {
        match self {
            Response::Inline(obj) => Some(obj),
            Response::Reference { .. } => None,
        }
    }
}

/// An inline response: a description plus per-content-type entries.
///
/// The content map preserves declaration order; the first entry of the 200
/// response supplies the default success content type.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResponseObject {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub content: IndexMap<String, MediaObject>,
}

/// One content-type entry of a response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MediaObject {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Schema>,
}
