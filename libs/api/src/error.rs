use std::fmt;

/// Category of a serializer error. Lets the caller decide between fixing its
/// own input and reporting a broken schema or storage entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Caller passed an unusable argument (e.g. empty lookup name).
    InvalidArgument,
    /// Qualified type name is absent from the schema description.
    SchemaNotFound,
    /// Schema description is malformed or has an unexpected shape.
    Schema,
    /// Schema description could not be read.
    Io,
    /// Value does not fit the schema.
    Encoding,
    /// Bytes are malformed or truncated.
    Decoding,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::InvalidArgument => f.write_str("invalid_argument"),
            ErrorKind::SchemaNotFound => f.write_str("schema_not_found"),
            ErrorKind::Schema => f.write_str("schema"),
            ErrorKind::Io => f.write_str("io"),
            ErrorKind::Encoding => f.write_str("encoding"),
            ErrorKind::Decoding => f.write_str("decoding"),
        }
    }
}

/// Error returned by schema resolution and by every `Serializer` method.
#[derive(Debug, thiserror::Error)]
pub enum SerializerError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("schema not found: {0}")]
    SchemaNotFound(String),

    #[error("invalid schema: {0}")]
    InvalidSchema(String),

    #[error("io error ({path}): {source}")]
    Io { path: String, source: std::io::Error },

    #[error("encoding error: {0}")]
    Encoding(String),

    #[error("decoding error: {0}")]
    Decoding(String),
}

impl SerializerError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn schema_not_found(msg: impl Into<String>) -> Self {
        Self::SchemaNotFound(msg.into())
    }

    pub fn invalid_schema(msg: impl Into<String>) -> Self {
        Self::InvalidSchema(msg.into())
    }

    pub fn encoding(msg: impl Into<String>) -> Self {
        Self::Encoding(msg.into())
    }

    pub fn decoding(msg: impl Into<String>) -> Self {
        Self::Decoding(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            SerializerError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            SerializerError::SchemaNotFound(_) => ErrorKind::SchemaNotFound,
            SerializerError::InvalidSchema(_) => ErrorKind::Schema,
            SerializerError::Io { .. } => ErrorKind::Io,
            SerializerError::Encoding(_) => ErrorKind::Encoding,
            SerializerError::Decoding(_) => ErrorKind::Decoding,
        }
    }

    /// Add context to the error, preserving the variant.
    ///
    /// Produces: `"context: original message"`. For `Io` the context is
    /// prepended to the path.
    pub fn with_context(self, ctx: impl fmt::Display) -> Self {
        match self {
            SerializerError::InvalidArgument(msg) => {
                SerializerError::InvalidArgument(format!("{ctx}: {msg}"))
            }
            SerializerError::SchemaNotFound(msg) => {
                SerializerError::SchemaNotFound(format!("{ctx}: {msg}"))
            }
            SerializerError::InvalidSchema(msg) => {
                SerializerError::InvalidSchema(format!("{ctx}: {msg}"))
            }
            SerializerError::Io { path, source } => SerializerError::Io {
                path: format!("{ctx}: {path}"),
                source,
            },
            SerializerError::Encoding(msg) => SerializerError::Encoding(format!("{ctx}: {msg}")),
            SerializerError::Decoding(msg) => SerializerError::Decoding(format!("{ctx}: {msg}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_keeps_variant() {
        let err = SerializerError::decoding("truncated").with_context("child 'a'");
        assert_eq!(err.kind(), ErrorKind::Decoding);
        assert_eq!(err.to_string(), "decoding error: child 'a': truncated");
    }

    #[test]
    fn io_kind() {
        let err = SerializerError::Io {
            path: "/nope".into(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert_eq!(err.kind(), ErrorKind::Io);
        assert!(err.to_string().starts_with("io error (/nope)"));
    }
}
