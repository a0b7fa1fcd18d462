use std::marker::PhantomData;

use prost::Message;
use prost_reflect::{DeserializeOptions, DynamicMessage, SerializeOptions};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tree_cache_api::{Serializer, SerializerError};

use crate::schema::{SchemaHandle, SchemaLocation};

/// Open field-name → value mapping in the protobuf JSON mapping.
pub type FlatValue = serde_json::Map<String, serde_json::Value>;

/// Value serializer bound to one caller-supplied message schema.
///
/// `V` travels through its JSON shape: fields unknown to the schema are
/// ignored on encode, default-valued fields are omitted on decode.
pub struct ProtobufValueSerializer<V = FlatValue> {
    schema: SchemaHandle,
    _value: PhantomData<fn() -> V>,
}

impl<V> ProtobufValueSerializer<V> {
    pub fn from_handle(schema: SchemaHandle) -> Self {
        Self { schema, _value: PhantomData }
    }

    /// Resolve `location` and bind to the result.
    pub fn from_location(location: &SchemaLocation) -> Result<Self, SerializerError> {
        SchemaHandle::resolve(location).map(Self::from_handle)
    }

    pub fn schema(&self) -> &SchemaHandle {
        &self.schema
    }
}

impl<V> Clone for ProtobufValueSerializer<V> {
    fn clone(&self) -> Self {
        Self::from_handle(self.schema.clone())
    }
}

impl<V> std::fmt::Debug for ProtobufValueSerializer<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProtobufValueSerializer")
            .field("message_type", &self.schema.full_name())
            .finish()
    }
}

impl<V> Serializer<V> for ProtobufValueSerializer<V>
where
    V: Serialize + DeserializeOwned,
{
    fn serialize(&self, value: &V) -> Result<Vec<u8>, SerializerError> {
        let json = serde_json::to_value(value)
            .map_err(|e| SerializerError::encoding(format!("value→json: {e}")))?;
        let options = DeserializeOptions::new().deny_unknown_fields(false);
        let message =
            DynamicMessage::deserialize_with_options(self.schema.descriptor().clone(), &json, &options)
                .map_err(|e| {
                    SerializerError::encoding(format!("value→{}: {e}", self.schema.full_name()))
                })?;
        Ok(message.encode_to_vec())
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<V, SerializerError> {
        let message = DynamicMessage::decode(self.schema.descriptor().clone(), bytes)
            .map_err(|e| {
                SerializerError::decoding(format!("{} decode: {e}", self.schema.full_name()))
            })?;
        let options = SerializeOptions::new().use_proto_field_name(true);
        let json = message
            .serialize_with_options(serde_json::value::Serializer, &options)
            .map_err(|e| SerializerError::decoding(format!("{}→json: {e}", self.schema.full_name())))?;
        serde_json::from_value(json)
            .map_err(|e| SerializerError::decoding(format!("json→value: {e}")))
    }
}
