//! OpenAPI-shaped document model for dbgate.
//!
//! Loads a root YAML document, recursively merges its `import:` tree into one
//! flat document, and resolves every `$ref` against the merged component set.
//! The resulting [`Document`] is frozen before any request is served.

pub mod components;
pub mod document;
pub mod error;
pub mod paths;
pub mod publish;
pub mod reference;
pub mod resolver;
pub mod response;
pub mod schema;

pub use components::Components;
pub use document::{add_prefix, DbConfig, Document, Info, Server, WebserverConfig};
pub use error::LoadError;
pub use paths::{
    HandlerConfig, Operation, Parameter, ParameterObject, PathItem, PathTable, Verb,
};
pub use reference::Reference;
pub use response::{MediaObject, Response, ResponseObject};
pub use schema::{Schema, SchemaObject};
