use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::reference::Reference;
use crate::response::Response;
use crate::schema::Schema;

/// The ordered path table. Keys are URL path templates; insertion order is
/// preserved and a duplicate insert replaces the value in place.
pub type PathTable = IndexMap<String, PathItem>;

/// The eight HTTP verbs an operation can be bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
    Trace,
}

impl Verb {
    pub const ALL: [Verb; 8] = [
        Verb::Get,
        Verb::Post,
        Verb::Put,
        Verb::Patch,
        Verb::Delete,
        Verb::Head,
        Verb::Options,
        Verb::Trace,
    ];

    /// Uppercase method name as it appears on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Get => "GET",
            Verb::Post => "POST",
            Verb::Put => "PUT",
            Verb::Patch => "PATCH",
            Verb::Delete => "DELETE",
            Verb::Head => "HEAD",
            Verb::Options => "OPTIONS",
            Verb::Trace => "TRACE",
        }
    }
}

/// One path entry: summary/description plus up to eight verb-bound operations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PathItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub get: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub put: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patch: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub head: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace: Option<Operation>,
}

impl PathItem {
    pub fn operation(&self, verb: Verb) -> Option<&Operation> {
        match verb {
            Verb::Get => self.get.as_ref(),
            Verb::Post => self.post.as_ref(),
            Verb::Put => self.put.as_ref(),
            Verb::Patch => self.patch.as_ref(),
            Verb::Delete => self.delete.as_ref(),
            Verb::Head => self.head.as_ref(),
            Verb::Options => self.options.as_ref(),
            Verb::Trace => self.trace.as_ref(),
        }
    }

    pub fn operation_mut(&mut self, verb: Verb) -> Option<&mut Operation> {
        match verb {
            Verb::Get => self.get.as_mut(),
            Verb::Post => self.post.as_mut(),
            Verb::Put => self.put.as_mut(),
            Verb::Patch => self.patch.as_mut(),
            Verb::Delete => self.delete.as_mut(),
            Verb::Head => self.head.as_mut(),
            Verb::Options => self.options.as_mut(),
            Verb::Trace => self.trace.as_mut(),
        }
    }

    /// Iterate the declared operations in verb order.
    pub fn operations(&self) -> impl Iterator<Item = (Verb, &Operation)> {
        Verb::ALL
            .iter()
            .filter_map(move |v| self.operation(*v).map(|op| (*v, op)))
    }
}

/// One HTTP-verb handler bound to a path.
///
/// Operations without a `handler:` section are description-only and are
/// never routed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Operation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Parameter>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub responses: IndexMap<String, Response>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handler: Option<HandlerConfig>,
}

/// A declared parameter: a `$ref` or an inline definition. After resolution
/// every parameter reachable from the path table is inline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Parameter {
    Reference {
        #[serde(rename = "$ref")]
        reference: Reference,
    },
    Inline(ParameterObject),
}

impl Parameter {
    pub fn as_inline(&self) -> Option<&ParameterObject> {
        match self {
            Parameter::Inline(obj) => Some(obj),
            Parameter::Reference { .. } => None,
        }
    }
}

/// An inline parameter definition.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParameterObject {
    pub name: String,

    /// Source location: `body`, `header`, `path` or `query`.
    #[serde(rename = "in")]
    pub location: String,

    #[serde(default, skip_serializing_if = "is_false")]
    pub required: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Schema>,
}

fn is_false(v: &bool) -> bool {
    !*v
}

/// Backend binding: the non-standard `handler:` extension naming the stored
/// function to call and how to shape the response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HandlerConfig {
    /// Name of the stored function invoked with one positional argument per
    /// declared parameter.
    pub function: String,

    /// Cache directive in seconds: negative means `no-cache`, zero means no
    /// cache header, positive sets `max-age`.
    #[serde(default, rename = "maxAge")]
    pub max_age: i64,

    /// Overrides the success response content type.
    #[serde(
        default,
        rename = "content-type",
        skip_serializing_if = "Option::is_none"
    )]
    pub content_type: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_table_preserves_declaration_order() {
        let yaml = r#"
/zulu:
  get:
    summary: z
/alpha:
  get:
    summary: a
/mike:
  get:
    summary: m
"#;
        let paths: PathTable = serde_yaml::from_str(yaml).expect("should parse");
        let keys: Vec<_> = paths.keys().collect();
        assert_eq!(keys, vec!["/zulu", "/alpha", "/mike"]);
    }

    #[test]
    fn duplicate_path_insert_replaces_value() {
        let mut paths = PathTable::default();
        paths.insert(
            "/a".to_string(),
            PathItem {
                summary: Some("first".into()),
                ..PathItem::default()
            },
        );
        paths.insert(
            "/a".to_string(),
            PathItem {
                summary: Some("second".into()),
                ..PathItem::default()
            },
        );
        assert_eq!(paths.len(), 1);
        assert_eq!(paths["/a"].summary.as_deref(), Some("second"));
    }

    #[test]
    fn parses_operation_with_handler() {
        let yaml = r#"
summary: fetch a user
parameters:
  - name: id
    in: path
    required: true
    schema:
      type: integer
responses:
  "200":
    description: OK
handler:
  function: get_user
  maxAge: 60
  content-type: text/plain
"#;
        let op: Operation = serde_yaml::from_str(yaml).expect("should parse");
        let handler = op.handler.expect("expected handler");
        assert_eq!(handler.function, "get_user");
        assert_eq!(handler.max_age, 60);
        assert_eq!(handler.content_type.as_deref(), Some("text/plain"));

        let param = op.parameters[0].as_inline().expect("expected inline");
        assert_eq!(param.name, "id");
        assert_eq!(param.location, "path");
        assert!(param.required);
    }

    #[test]
    fn parses_parameter_reference() {
        let param: Parameter =
            serde_yaml::from_str("$ref: '#/components/parameters/limit'").expect("should parse");
        assert!(param.as_inline().is_none());
    }

    #[test]
    fn operations_iterate_in_verb_order() {
        let yaml = r#"
delete:
  summary: d
get:
  summary: g
"#;
        let item: PathItem = serde_yaml::from_str(yaml).expect("should parse");
        let verbs: Vec<_> = item.operations().map(|(v, _)| v).collect();
        assert_eq!(verbs, vec![Verb::Get, Verb::Delete]);
    }
}
