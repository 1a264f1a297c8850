use std::path::PathBuf;

use thiserror::Error;

/// Errors produced while loading, merging, or resolving a document tree.
///
/// All of these are fatal configuration errors: they abort startup and are
/// never surfaced at request time.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Reading a document file failed.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A document file is not valid YAML for the expected shape.
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// The same component key was contributed by more than one document.
    #[error("{kind} \"{name}\" already exists")]
    DuplicateComponent { kind: &'static str, name: String },

    /// A `$ref` points at a component that does not exist.
    #[error("failed to resolve {0}")]
    DanglingReference(String),

    /// The root document declares no `db:` section.
    #[error("db configuration is mandatory for the root document")]
    MissingDatabase,
}
