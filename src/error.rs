//! Control-plane error taxonomy and response error codes.

use thiserror::Error;

/// Numeric codes carried in error responses.
///
/// Boundary codes (request never reached the executor) use the JSON-RPC
/// code space; domain codes use the errno-style negative values the engine
/// reports on its side of the seam.
pub mod codes {
    /// Request body was not a parseable JSON object.
    pub const PARSE_ERROR: i32 = -32700;
    /// Unknown command name.
    pub const METHOD_NOT_FOUND: i32 = -32601;
    /// Required field absent, of the wrong type, or unrecognized.
    pub const MALFORMED_REQUEST: i32 = -32602;
    /// Completion path dropped without reporting an outcome.
    pub const INTERNAL_ERROR: i32 = -32603;
    /// Duplicate device name on create.
    pub const ALREADY_EXISTS: i32 = -17;
    /// Operation on an unknown or torn-down device.
    pub const NOT_FOUND: i32 = -19;
    /// Unrecognized access mode string.
    pub const INVALID_ARGUMENT: i32 = -22;
}

/// Fixed code -> message table for error responses.
///
/// Engine failures bypass this table; their code and message pass through
/// verbatim.
pub fn message_for(code: i32) -> &'static str {
    match code {
        codes::PARSE_ERROR => "parse error",
        codes::METHOD_NOT_FOUND => "method not found",
        codes::MALFORMED_REQUEST => "invalid request parameters",
        codes::INTERNAL_ERROR => "internal error",
        codes::ALREADY_EXISTS => "device already exists",
        codes::NOT_FOUND => "no such device",
        codes::INVALID_ARGUMENT => "invalid argument",
        _ => "engine failure",
    }
}

/// Errors surfaced by the control plane.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ControlError {
    /// Decode-time field validation failure; never reaches the executor.
    #[error("invalid request parameters")]
    MalformedRequest,

    /// Duplicate device name on create.
    #[error("device already exists")]
    AlreadyExists,

    /// Operation on an unknown or torn-down device.
    #[error("no such device")]
    NotFound,

    /// Unrecognized access mode string.
    #[error("invalid argument")]
    InvalidArgument,

    /// Opaque failure surfaced from the block device engine.
    #[error("engine failure {code}: {message}")]
    EngineFailure { code: i32, message: String },
}

impl ControlError {
    /// Numeric code for the error response.
    pub fn code(&self) -> i32 {
        match self {
            Self::MalformedRequest => codes::MALFORMED_REQUEST,
            Self::AlreadyExists => codes::ALREADY_EXISTS,
            Self::NotFound => codes::NOT_FOUND,
            Self::InvalidArgument => codes::INVALID_ARGUMENT,
            Self::EngineFailure { code, .. } => *code,
        }
    }

    /// Message for the error response: the fixed table entry, or the
    /// engine's own message verbatim.
    pub fn response_message(&self) -> String {
        match self {
            Self::EngineFailure { message, .. } => message.clone(),
            other => message_for(other.code()).to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_error_codes() {
        assert_eq!(ControlError::AlreadyExists.code(), codes::ALREADY_EXISTS);
        assert_eq!(ControlError::NotFound.code(), codes::NOT_FOUND);
        assert_eq!(ControlError::InvalidArgument.code(), codes::INVALID_ARGUMENT);
        assert_eq!(ControlError::MalformedRequest.code(), codes::MALFORMED_REQUEST);
    }

    #[test]
    fn test_messages_come_from_fixed_table() {
        let err = ControlError::NotFound;
        assert_eq!(err.response_message(), message_for(codes::NOT_FOUND));
    }

    #[test]
    fn test_engine_failure_passes_through_verbatim() {
        let err = ControlError::EngineFailure {
            code: -5,
            message: "base device on fire".into(),
        };
        assert_eq!(err.code(), -5);
        assert_eq!(err.response_message(), "base device on fire");
    }
}
