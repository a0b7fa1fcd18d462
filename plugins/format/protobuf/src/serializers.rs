use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tree_cache_api::{SerializerError, SerializerOptions};

use crate::schema::{SchemaHandle, SchemaLocation};
use crate::tree::ProtobufTreeSerializer;
use crate::value::{FlatValue, ProtobufValueSerializer};

/// Value + tree serializer pair for one value schema.
///
/// The tree serializer always uses the shared process-wide tree schema; only
/// the value schema comes from the caller.
#[derive(Debug, Clone)]
pub struct ProtobufSerializers<V = FlatValue> {
    pub tree_serializer: ProtobufTreeSerializer,
    pub value_serializer: ProtobufValueSerializer<V>,
}

impl<V> ProtobufSerializers<V> {
    /// Resolve the value schema from a descriptor file.
    ///
    /// Resolver errors are returned as-is.
    pub fn from_location(location: &SchemaLocation) -> Result<Self, SerializerError> {
        let value_schema = SchemaHandle::resolve(location)?;
        Self::from_handle(value_schema)
    }

    /// Use an already resolved value schema. No I/O.
    pub fn from_handle(value_schema: SchemaHandle) -> Result<Self, SerializerError> {
        Ok(Self {
            tree_serializer: ProtobufTreeSerializer::new()?,
            value_serializer: ProtobufValueSerializer::from_handle(value_schema),
        })
    }
}

impl<V> ProtobufSerializers<V>
where
    V: Serialize + DeserializeOwned + 'static,
{
    /// Type-erase into the cache's serializer options.
    pub fn into_options(self) -> SerializerOptions<V> {
        SerializerOptions {
            tree_serializer: Arc::new(self.tree_serializer),
            value_serializer: Arc::new(self.value_serializer),
        }
    }
}

impl<V> From<ProtobufSerializers<V>> for SerializerOptions<V>
where
    V: Serialize + DeserializeOwned + 'static,
{
    fn from(serializers: ProtobufSerializers<V>) -> Self {
        serializers.into_options()
    }
}
