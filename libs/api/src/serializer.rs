use std::sync::Arc;

use crate::error::SerializerError;
use crate::tree::Tree;

/// Runtime serializer — performs `T ↔ bytes`.
///
/// The cache hands buffers over verbatim and expects no side effects:
/// implementations must be callable concurrently on a shared instance.
pub trait Serializer<T>: Send + Sync {
    fn serialize(&self, value: &T) -> Result<Vec<u8>, SerializerError>;
    fn deserialize(&self, bytes: &[u8]) -> Result<T, SerializerError>;
}

impl<T, S: Serializer<T> + ?Sized> Serializer<T> for Arc<S> {
    fn serialize(&self, value: &T) -> Result<Vec<u8>, SerializerError> {
        (**self).serialize(value)
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<T, SerializerError> {
        (**self).deserialize(bytes)
    }
}

/// Serializer part of the cache configuration.
///
/// `value_serializer` encodes the payload of a single node, `tree_serializer`
/// encodes a subtree whose payloads were already produced by
/// `value_serializer`.
pub struct SerializerOptions<V> {
    pub tree_serializer: Arc<dyn Serializer<Tree<Vec<u8>>>>,
    pub value_serializer: Arc<dyn Serializer<V>>,
}

impl<V> Clone for SerializerOptions<V> {
    fn clone(&self) -> Self {
        Self {
            tree_serializer: Arc::clone(&self.tree_serializer),
            value_serializer: Arc::clone(&self.value_serializer),
        }
    }
}
