//! Error types shared by the codec, exporter and configuration loader.

use std::io;

/// Errors raised while encoding or decoding the result stream.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The underlying reader or writer failed.
    #[error(transparent)]
    Io(#[from] io::Error),
    /// A field failed to decode. Wrapped once per nesting level.
    #[error("failed to decode {field}: {source}")]
    Field {
        field: String,
        #[source]
        source: Box<CodecError>,
    },
    #[error("invalid bool byte: {0:#04x}")]
    InvalidBool(u8),
    #[error("invalid champion marker: {0:#04x}")]
    InvalidMarker(u8),
    #[error("length {0} does not fit in memory")]
    LengthOverflow(u64),
    #[error("invalid string: {0}")]
    InvalidString(#[from] std::string::FromUtf8Error),
    #[error("invalid timestamp: {secs}s {nanos}ns")]
    InvalidTimestamp { secs: i64, nanos: u32 },
    #[error("genome id mismatch: stored {stored}, parsed {parsed}")]
    GenomeIdMismatch { stored: u64, parsed: u64 },
    #[error("invariant violated: {0}")]
    Invariant(String),
}

impl CodecError {
    /// Wrap this error with the name of the field being decoded.
    pub fn in_field(self, field: impl Into<String>) -> Self {
        CodecError::Field {
            field: field.into(),
            source: Box::new(self),
        }
    }

    /// Names of the fields from the outermost record down to the failure.
    pub fn field_path(&self) -> Vec<&str> {
        let mut path = Vec::new();
        let mut current = self;
        while let CodecError::Field { field, source } = current {
            path.push(field.as_str());
            current = source;
        }
        path
    }

    /// True if the innermost cause is an unexpected end of stream.
    pub fn is_truncated(&self) -> bool {
        match self {
            CodecError::Field { source, .. } => source.is_truncated(),
            CodecError::Io(e) => e.kind() == io::ErrorKind::UnexpectedEof,
            _ => false,
        }
    }
}

/// Errors raised while building or flushing the numeric archive.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("archive too large: {0}")]
    TooLarge(String),
    #[error("array {name} has {len} values but shape {shape:?}")]
    ShapeMismatch {
        name: String,
        len: usize,
        shape: Vec<usize>,
    },
    #[error("duplicate array name: {0}")]
    DuplicateName(String),
}

/// Report configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

pub type CodecResult<T> = std::result::Result<T, CodecError>;
pub type ExportResult<T> = std::result::Result<T, ExportError>;
