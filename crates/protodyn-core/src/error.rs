//! Shared error type across protodyn crates.

use thiserror::Error;

/// Stable error codes (used in logs, test vectors and CLI output).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Descriptor set could not be read or linked.
    SchemaLoad,
    /// No message or enum with the requested name.
    TypeNotFound,
    /// Wire bytes do not follow the protobuf encoding.
    MalformedWireData,
    /// Value does not fit the descriptor it is encoded against.
    Encode,
    /// JSON does not fit the descriptor it is projected from.
    Projection,
    /// Envelope record is malformed or incomplete.
    EnvelopeFormat,
    /// Invalid configuration.
    Config,
    /// Underlying I/O failure.
    Io,
}

impl ErrorCode {
    /// String representation used in logs and vectors.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::SchemaLoad => "SCHEMA_LOAD",
            ErrorCode::TypeNotFound => "TYPE_NOT_FOUND",
            ErrorCode::MalformedWireData => "MALFORMED_WIRE_DATA",
            ErrorCode::Encode => "ENCODE",
            ErrorCode::Projection => "PROJECTION",
            ErrorCode::EnvelopeFormat => "ENVELOPE_FORMAT",
            ErrorCode::Config => "CONFIG",
            ErrorCode::Io => "IO",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, ProtodynError>;

/// Unified error type used by core and cli.
#[derive(Debug, Error)]
pub enum ProtodynError {
    #[error("schema load failed: {0}")]
    SchemaLoad(String),
    #[error("type not found: {0}")]
    TypeNotFound(String),
    #[error("malformed wire data: {0}")]
    MalformedWireData(String),
    #[error("encode failed: {0}")]
    Encode(String),
    #[error("json projection failed: {0}")]
    Projection(String),
    #[error("invalid envelope: {0}")]
    EnvelopeFormat(String),
    #[error("invalid config: {0}")]
    Config(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ProtodynError {
    /// Map the error to its stable code.
    pub fn code(&self) -> ErrorCode {
        match self {
            ProtodynError::SchemaLoad(_) => ErrorCode::SchemaLoad,
            ProtodynError::TypeNotFound(_) => ErrorCode::TypeNotFound,
            ProtodynError::MalformedWireData(_) => ErrorCode::MalformedWireData,
            ProtodynError::Encode(_) => ErrorCode::Encode,
            ProtodynError::Projection(_) => ErrorCode::Projection,
            ProtodynError::EnvelopeFormat(_) => ErrorCode::EnvelopeFormat,
            ProtodynError::Config(_) => ErrorCode::Config,
            ProtodynError::Io(_) => ErrorCode::Io,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_errors_keep_their_source() {
        let err: ProtodynError =
            std::io::Error::new(std::io::ErrorKind::NotFound, "schema.pb").into();
        assert_eq!(err.code().as_str(), "IO");
        assert_eq!(err.to_string(), "schema.pb");
    }
}
