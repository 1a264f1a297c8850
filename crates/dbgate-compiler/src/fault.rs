use serde::Serialize;
use thiserror::Error;

/// A classified request-time failure carrying the HTTP status to answer
/// with. Serializes to the canonical Error Shape `{status, message}`.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{message}")]
pub struct Fault {
    pub status: u16,
    pub message: String,
}

impl Fault {
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Fault {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Fault::new(400, message)
    }

    pub fn not_found() -> Self {
        Fault::new(404, "Not found")
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Fault::new(500, message)
    }
}

/// Content types an Error-Shape body can be serialized into.
pub fn is_serializable_content_type(content_type: &str) -> bool {
    matches!(
        content_type,
        "application/json" | "text/json" | "application/yaml" | "text/yaml"
    )
}

/// Serialize a fault as `{status, message}` in the given content type.
pub fn serialize_fault(fault: &Fault, content_type: &str) -> String {
    if content_type.ends_with("yaml") {
        serde_yaml::to_string(fault)
            .unwrap_or_else(|_| format!("status: {}\nmessage: {}\n", fault.status, fault.message))
    } else {
        serde_json::to_string(fault)
            .unwrap_or_else(|_| r#"{"status":500,"message":"internal error"}"#.to_string())
    }
}
