use thiserror::Error;

/// Errors produced while compiling operations.
///
/// All fatal at startup; a document that compiled once never fails at
/// request time for any of these reasons.
#[derive(Debug, Error)]
pub enum CompileError {
    /// A parameter declares an `in:` other than body/header/path/query.
    #[error("parameter \"{name}\" has invalid location \"{location}\"")]
    InvalidLocation { name: String, location: String },

    /// A parameter schema declares a pattern that does not compile.
    #[error("invalid pattern \"{pattern}\" for {name}: {reason}")]
    InvalidPattern {
        name: String,
        pattern: String,
        reason: String,
    },

    /// A response key is not an exact numeric HTTP status code.
    #[error("invalid response code \"{0}\"")]
    InvalidStatusCode(String),

    /// A handler names a function that is not a plain identifier.
    #[error("invalid function name \"{0}\"")]
    InvalidFunction(String),

    /// A parameter is still a reference; resolution did not run or was
    /// truncated where an inline definition is required.
    #[error("unresolved parameter reference {0}")]
    UnresolvedParameter(String),
}
