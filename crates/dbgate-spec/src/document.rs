use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::components::Components;
use crate::error::LoadError;
use crate::paths::PathTable;

/// The root of the schema graph: one merged, flat document.
///
/// Constructed once at startup via [`Document::load`], mutated only during
/// merge and resolution, then treated as immutable for the life of the
/// process.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Document {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub openapi: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub info: Option<Info>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub servers: Vec<Server>,

    pub paths: PathTable,

    #[serde(skip_serializing_if = "Components::is_empty")]
    pub components: Components,

    // Non-standard extensions, specific to dbgate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub db: Option<DbConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub webserver: Option<WebserverConfig>,

    #[serde(rename = "import", skip_serializing_if = "IndexMap::is_empty")]
    pub imports: IndexMap<String, String>,
}

/// OpenAPI `info` block.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Info {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "termsOfService", skip_serializing_if = "Option::is_none")]
    pub terms_of_service: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<Contact>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license: Option<License>,
    pub version: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Contact {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct License {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// OpenAPI `servers` entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Server {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub variables: IndexMap<String, ServerVariable>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerVariable {
    #[serde(rename = "enum", skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<String>,
    pub default: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Backend connection settings from the non-standard `db:` extension.
///
/// Mandatory on the root document; children inherit it when they declare
/// none of their own.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DbConfig {
    pub url: String,
    #[serde(default, rename = "maxOpen")]
    pub max_open: i64,
    #[serde(default, rename = "maxIdle")]
    pub max_idle: i64,
    #[serde(default, rename = "maxLifetime")]
    pub max_lifetime: i64,
}

/// Webserver settings from the non-standard `webserver:` extension.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebserverConfig {
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_port() -> u16 {
    8080
}

/// Prepend a path prefix with `/` separators. An empty prefix is a no-op;
/// a prefix beginning with `_` suppresses prefixing so the root can mount
/// an import without namespacing it.
pub fn add_prefix(prefix: &str, path: &str) -> String {
    if prefix.is_empty() || prefix.starts_with('_') {
        return lead_slash(path);
    }
    format!("{}{}", lead_slash(prefix), lead_slash(path))
}

fn lead_slash(p: &str) -> String {
    if p.is_empty() || p.starts_with('/') {
        p.to_string()
    } else {
        format!("/{p}")
    }
}

/// One loaded file plus its recursively loaded imports. Transient: consumed
/// by the merge and discarded afterwards.
struct LoadedFile {
    prefix: String,
    document: Document,
    children: Vec<LoadedFile>,
}

impl LoadedFile {
    fn read(
        path: &Path,
        prefix: String,
        parent_db: Option<&DbConfig>,
    ) -> Result<Self, LoadError> {
        let path = normalize_file_path(path);
        info!(path = %path.display(), "loading document");

        let text = fs::read_to_string(&path).map_err(|source| LoadError::Io {
            path: path.clone(),
            source,
        })?;
        let mut document: Document =
            serde_yaml::from_str(&text).map_err(|source| LoadError::Parse {
                path: path.clone(),
                source,
            })?;

        if document.db.is_none() {
            match parent_db {
                Some(db) => document.db = Some(db.clone()),
                None => return Err(LoadError::MissingDatabase),
            }
        }

        let base = path.parent().map(Path::to_path_buf).unwrap_or_default();
        let mut children = Vec::new();
        for (key, relative) in &document.imports {
            let child_path = base.join(relative);
            let child_prefix = compose_prefix(&prefix, key);
            children.push(LoadedFile::read(
                &child_path,
                child_prefix,
                document.db.as_ref(),
            )?);
        }

        Ok(LoadedFile {
            prefix,
            document,
            children,
        })
    }

    /// Copy this file's paths (prefixed) and components into the
    /// destination, then recurse into the children.
    fn flatten(self, dst: &mut Document) -> Result<(), LoadError> {
        for (key, item) in self.document.paths {
            dst.paths.insert(add_prefix(&self.prefix, &key), item);
        }
        dst.components.merge_from(self.document.components)?;

        for child in self.children {
            child.flatten(dst)?;
        }
        Ok(())
    }
}

/// Effective prefix of an imported document. A key starting with the `_`
/// sentinel becomes the child prefix verbatim, which [`add_prefix`] then
/// treats as "no prefix".
fn compose_prefix(parent: &str, key: &str) -> String {
    if key.starts_with('_') {
        key.to_string()
    } else {
        add_prefix(parent, key)
    }
}

fn normalize_file_path(path: &Path) -> PathBuf {
    // Canonicalize when possible so log lines and errors name real files;
    // fall back to the given path when the file does not exist yet.
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

impl Document {
    /// Load the root document, merge its import tree into a single flat
    /// document, and resolve every reference in it.
    pub fn load(path: &Path) -> Result<Document, LoadError> {
        let root = LoadedFile::read(path, String::new(), None)?;

        let mut merged = Document {
            openapi: root.document.openapi.clone(),
            info: root.document.info.clone(),
            servers: root.document.servers.clone(),
            db: root.document.db.clone(),
            webserver: root.document.webserver.clone(),
            ..Document::default()
        };
        root.flatten(&mut merged)?;

        merged.resolve_references()?;
        Ok(merged)
    }
}
