use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::LoadError;
use crate::paths::Parameter;
use crate::response::Response;
use crate::schema::Schema;

/// The component set: typed dictionaries for schemas, parameters and
/// responses plus three free-form maps carried through opaquely.
///
/// Keys are case-sensitive and must be unique per kind across every document
/// contributing to a merge; a collision is a fatal configuration error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Components {
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub schemas: IndexMap<String, Schema>,

    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub parameters: IndexMap<String, Parameter>,

    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub responses: IndexMap<String, Response>,

    #[serde(rename = "securitySchemes", skip_serializing_if = "IndexMap::is_empty")]
    pub security_schemes: IndexMap<String, serde_yaml::Value>,

    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub headers: IndexMap<String, serde_yaml::Value>,

    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub examples: IndexMap<String, serde_yaml::Value>,
}

impl Components {
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
            && self.parameters.is_empty()
            && self.responses.is_empty()
            && self.security_schemes.is_empty()
            && self.headers.is_empty()
            && self.examples.is_empty()
    }

    /// Merge another document's components into this set, failing on the
    /// first key that already exists in any kind.
    pub fn merge_from(&mut self, other: Components) -> Result<(), LoadError> {
        merge_unique(&mut self.schemas, other.schemas, "schema")?;
        merge_unique(&mut self.parameters, other.parameters, "parameter")?;
        merge_unique(&mut self.responses, other.responses, "response")?;
        merge_unique(
            &mut self.security_schemes,
            other.security_schemes,
            "security scheme",
        )?;
        merge_unique(&mut self.headers, other.headers, "header")?;
        merge_unique(&mut self.examples, other.examples, "example")?;
        Ok(())
    }
}

fn merge_unique<V>(
    dst: &mut IndexMap<String, V>,
    src: IndexMap<String, V>,
    kind: &'static str,
) -> Result<(), LoadError> {
    for (key, value) in src {
        if dst.contains_key(&key) {
            return Err(LoadError::DuplicateComponent { kind, name: key });
        }
        dst.insert(key, value);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn components(yaml: &str) -> Components {
        serde_yaml::from_str(yaml).expect("components should parse")
    }

    #[test]
    fn merge_disjoint_sets() {
        let mut a = components("schemas:\n  A:\n    type: string");
        let b = components("schemas:\n  B:\n    type: integer\nparameters:\n  p:\n    name: p\n    in: query");
        a.merge_from(b).expect("merge should succeed");
        assert_eq!(a.schemas.len(), 2);
        assert_eq!(a.parameters.len(), 1);
    }

    #[test]
    fn merge_fails_on_duplicate_schema() {
        let mut a = components("schemas:\n  A:\n    type: string");
        let b = components("schemas:\n  A:\n    type: integer");
        let err = a.merge_from(b).expect_err("merge should fail");
        match err {
            LoadError::DuplicateComponent { kind, name } => {
                assert_eq!(kind, "schema");
                assert_eq!(name, "A");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn merge_fails_on_duplicate_opaque_entry() {
        let mut a = components("headers:\n  X-Limit:\n    description: limit");
        let b = components("headers:\n  X-Limit:\n    description: other");
        let err = a.merge_from(b).expect_err("merge should fail");
        match err {
            LoadError::DuplicateComponent { kind, name } => {
                assert_eq!(kind, "header");
                assert_eq!(name, "X-Limit");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn keys_are_case_sensitive() {
        let mut a = components("schemas:\n  user:\n    type: string");
        let b = components("schemas:\n  User:\n    type: string");
        a.merge_from(b).expect("different case is not a collision");
        assert_eq!(a.schemas.len(), 2);
    }
}
