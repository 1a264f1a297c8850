//! Compiles routed operations into executable validation-and-dispatch
//! pipelines.
//!
//! For every operation with a backend binding this crate builds, once at
//! startup: the ordered extraction + validation chain for each parameter,
//! the positional SQL call text, the resolved success content type, and the
//! status-routed Error-Shape wiring. The dispatcher interprets the result at
//! request time.

pub mod compile;
pub mod error;
pub mod fault;
pub mod pipeline;

pub use compile::{compile_document, CompiledOperation, ErrorRoute};
pub use error::CompileError;
pub use fault::{is_serializable_content_type, serialize_fault, Fault};
pub use pipeline::{Check, Extract, ParamPipeline, RequestInput};
