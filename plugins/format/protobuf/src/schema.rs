use std::fmt;
use std::path::{Path, PathBuf};

use prost_reflect::{DescriptorPool, MessageDescriptor};
use tree_cache_api::SerializerError;

// ═══════════════════════════════════════════════════════════════
//  SchemaLocation
// ═══════════════════════════════════════════════════════════════

/// Where to find a message schema: a descriptor file plus a qualified name.
///
/// Deserializable so it can live in configuration next to the cache options.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(default)]
pub struct SchemaLocation {
    /// Path to FileDescriptorSet (.bin from `protoc --descriptor_set_out`).
    pub descriptor_path: PathBuf,
    /// Fully-qualified message type name (e.g. "codibre.test_value.Value").
    pub message_type: String,
}

impl SchemaLocation {
    pub fn new(descriptor_path: impl Into<PathBuf>, message_type: impl Into<String>) -> Self {
        Self {
            descriptor_path: descriptor_path.into(),
            message_type: message_type.into(),
        }
    }

    /// Argument checks that must pass before touching the filesystem.
    fn validate(&self) -> Result<(), SerializerError> {
        if self.message_type.is_empty() {
            return Err(SerializerError::invalid_argument("lookup name not informed"));
        }
        if self.descriptor_path.as_os_str().is_empty() {
            return Err(SerializerError::invalid_argument("descriptor_path is required"));
        }
        Ok(())
    }
}

impl fmt::Display for SchemaLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.descriptor_path.display(), self.message_type)
    }
}

// ═══════════════════════════════════════════════════════════════
//  SchemaHandle
// ═══════════════════════════════════════════════════════════════

/// Resolved, immutable message shape. Cloning is cheap (shared descriptor).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaHandle {
    descriptor: MessageDescriptor,
}

impl SchemaHandle {
    /// Read the descriptor set at `location` and look up its message type.
    ///
    /// Every call reads and parses the file again; keep the returned handle
    /// and pass it to `from_handle` constructors to avoid that.
    pub fn resolve(location: &SchemaLocation) -> Result<Self, SerializerError> {
        location.validate()?;
        let pool = load_descriptor_pool(&location.descriptor_path)?;
        let handle = Self::from_pool(&pool, &location.message_type)
            .map_err(|e| e.with_context(location.descriptor_path.display()))?;
        tracing::debug!(
            path = %location.descriptor_path.display(),
            message_type = %handle.full_name(),
            "schema resolved"
        );
        Ok(handle)
    }

    /// Look up a message type in an already loaded pool. No I/O.
    pub fn from_pool(pool: &DescriptorPool, message_type: &str) -> Result<Self, SerializerError> {
        if message_type.is_empty() {
            return Err(SerializerError::invalid_argument("lookup name not informed"));
        }
        let name = message_type.strip_prefix('.').unwrap_or(message_type);
        pool.get_message_by_name(name)
            .map(Self::from)
            .ok_or_else(|| {
                SerializerError::schema_not_found(format!("message type '{message_type}' not found"))
            })
    }

    pub fn descriptor(&self) -> &MessageDescriptor {
        &self.descriptor
    }

    pub fn full_name(&self) -> &str {
        self.descriptor.full_name()
    }
}

impl From<MessageDescriptor> for SchemaHandle {
    fn from(descriptor: MessageDescriptor) -> Self {
        Self { descriptor }
    }
}

/// Load a FileDescriptorSet from file.
pub fn load_descriptor_pool(path: &Path) -> Result<DescriptorPool, SerializerError> {
    let descriptor_bytes = std::fs::read(path).map_err(|source| SerializerError::Io {
        path: path.display().to_string(),
        source,
    })?;

    DescriptorPool::decode(descriptor_bytes.as_slice()).map_err(|e| {
        SerializerError::invalid_schema(format!(
            "failed to parse descriptor set '{}': {e}",
            path.display()
        ))
    })
}
