//! Error types for collection client operations.
//!
//! Errors never reach callers of the public operations directly: the
//! envelope wrapper in [`crate::envelope`] converts them into response codes
//! using [`CollectionError::status_code`].

use thiserror::Error;

/// Envelope code reported for transport-level failures.
pub const TRANSPORT_FAILURE_CODE: i32 = 400;

/// Envelope code reported for every other local failure.
pub const LOCAL_FAILURE_CODE: i32 = 500;

/// All errors that can occur while building, sending or decoding a request.
#[derive(Debug, Error)]
pub enum CollectionError {
    /// The gRPC call failed or the server signaled a protocol-level error.
    #[error("transport error: {:?} - {}", .0.code(), .0.message())]
    Transport(#[from] tonic::Status),

    /// The channel could not be set up from the given options.
    #[error("connection error: {0}")]
    Connection(String),

    /// Caller-supplied request is malformed.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A tagged value carried a tag with no registered converter.
    #[error("unknown value tag: {0}")]
    UnknownTag(String),

    /// A tagged value or reply could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// The domain model rejected a document.
    #[error("validation error: {0}")]
    Validation(String),

    /// BSON error.
    #[error("bson error: {0}")]
    Bson(String),

    /// An operation panicked.
    #[error("internal error: {0}")]
    Internal(String),
}

impl CollectionError {
    /// Create a connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        CollectionError::Connection(msg.into())
    }

    /// Create an invalid argument error.
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        CollectionError::InvalidArgument(msg.into())
    }

    /// Create a decode error.
    pub fn decode(msg: impl Into<String>) -> Self {
        CollectionError::Decode(msg.into())
    }

    /// Create a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        CollectionError::Validation(msg.into())
    }

    /// Check if this error came from the transport.
    pub fn is_transport_error(&self) -> bool {
        matches!(self, CollectionError::Transport(_))
    }

    /// The envelope code this error is reported with.
    pub fn status_code(&self) -> i32 {
        if self.is_transport_error() {
            TRANSPORT_FAILURE_CODE
        } else {
            LOCAL_FAILURE_CODE
        }
    }

    /// Create an internal error.
    pub fn internal(msg: impl Into<String>) -> Self {
        CollectionError::Internal(msg.into())
    }
}

impl From<bson::ser::Error> for CollectionError {
    fn from(err: bson::ser::Error) -> Self {
        CollectionError::Bson(err.to_string())
    }
}

impl From<bson::de::Error> for CollectionError {
    fn from(err: bson::de::Error) -> Self {
        CollectionError::Bson(err.to_string())
    }
}

/// Result type alias for collection client operations.
pub type Result<T> = std::result::Result<T, CollectionError>;

/// Error kind enumeration for pattern matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Transport failure.
    Transport,
    /// Connection setup failure.
    Connection,
    /// Invalid argument.
    InvalidArgument,
    /// Decode defect (unknown tag, undecodable value, model mismatch).
    Decode,
    /// BSON (de)serialization error.
    Serialization,
    /// Panic inside an operation.
    Internal,
}

impl CollectionError {
    /// Get the error kind.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CollectionError::Transport(_) => ErrorKind::Transport,
            CollectionError::Connection(_) => ErrorKind::Connection,
            CollectionError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            CollectionError::UnknownTag(_)
            | CollectionError::Decode(_)
            | CollectionError::Validation(_) => ErrorKind::Decode,
            CollectionError::Bson(_) => ErrorKind::Serialization,
            CollectionError::Internal(_) => ErrorKind::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tonic::{Code, Status};

    #[test]
    fn test_transport_error_display() {
        let err = CollectionError::from(Status::new(Code::Unavailable, "connection refused"));
        assert_eq!(
            err.to_string(),
            "transport error: Unavailable - connection refused"
        );
    }

    #[test]
    fn test_status_code() {
        let transport = CollectionError::from(Status::internal("boom"));
        assert_eq!(transport.status_code(), 400);
        assert_eq!(CollectionError::invalid_argument("x").status_code(), 500);
        assert_eq!(CollectionError::UnknownTag("uuid".into()).status_code(), 500);
        assert_eq!(CollectionError::validation("missing name").status_code(), 500);
    }

    #[test]
    fn test_error_kind() {
        assert_eq!(
            CollectionError::connection("bad host").kind(),
            ErrorKind::Connection
        );
        assert_eq!(
            CollectionError::UnknownTag("uuid".into()).kind(),
            ErrorKind::Decode
        );
        assert_eq!(
            CollectionError::Bson("oops".into()).kind(),
            ErrorKind::Serialization
        );
    }

    #[test]
    fn test_is_transport_error() {
        assert!(CollectionError::from(Status::unknown("x")).is_transport_error());
        assert!(!CollectionError::decode("x").is_transport_error());
    }

    #[test]
    fn test_invalid_argument() {
        let err = CollectionError::invalid_argument("set, unset or push is required");
        assert_eq!(
            err.to_string(),
            "invalid argument: set, unset or push is required"
        );
    }

    #[test]
    fn test_internal_error() {
        let err = CollectionError::internal("converter table corrupted");
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert_eq!(err.status_code(), 500);
        assert_eq!(err.to_string(), "internal error: converter table corrupted");
    }
}
