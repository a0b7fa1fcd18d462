use std::collections::{BTreeMap, HashMap};
use std::sync::OnceLock;

use prost::Message;
use prost::bytes::Bytes;
use prost_reflect::{DescriptorPool, DynamicMessage, FieldDescriptor, Kind, MapKey, Value};
use prost_types::field_descriptor_proto::{Label, Type};
use prost_types::{
    DescriptorProto, FieldDescriptorProto, FileDescriptorProto, FileDescriptorSet, MessageOptions,
    OneofDescriptorProto,
};
use tree_cache_api::{Serializer, SerializerError, Tree};

use crate::schema::SchemaHandle;

/// Qualified name of the fixed tree message.
pub const TREE_MESSAGE: &str = "codibre.tree_cache.Tree";
/// Field holding the node's own payload.
pub const VALUE_FIELD: &str = "v";
/// Field holding the `label → child` map.
pub const CHILDREN_FIELD: &str = "c";

const TREE_PACKAGE: &str = "codibre.tree_cache";

static TREE_SCHEMA: OnceLock<SchemaHandle> = OnceLock::new();

// ═══════════════════════════════════════════════════════════════
//  Tree schema
// ═══════════════════════════════════════════════════════════════

/// Descriptor of
///
/// ```proto
/// syntax = "proto3";
/// package codibre.tree_cache;
/// message Tree {
///   optional bytes v = 1;
///   map<string, Tree> c = 2;
/// }
/// ```
fn tree_file_descriptor() -> FileDescriptorProto {
    let tree_type = format!(".{TREE_MESSAGE}");

    let entry = DescriptorProto {
        name: Some("CEntry".to_string()),
        field: vec![
            FieldDescriptorProto {
                name: Some("key".to_string()),
                number: Some(1),
                label: Some(Label::Optional as i32),
                r#type: Some(Type::String as i32),
                json_name: Some("key".to_string()),
                ..Default::default()
            },
            FieldDescriptorProto {
                name: Some("value".to_string()),
                number: Some(2),
                label: Some(Label::Optional as i32),
                r#type: Some(Type::Message as i32),
                type_name: Some(tree_type.clone()),
                json_name: Some("value".to_string()),
                ..Default::default()
            },
        ],
        options: Some(MessageOptions {
            map_entry: Some(true),
            ..Default::default()
        }),
        ..Default::default()
    };

    let tree = DescriptorProto {
        name: Some("Tree".to_string()),
        field: vec![
            FieldDescriptorProto {
                name: Some(VALUE_FIELD.to_string()),
                number: Some(1),
                label: Some(Label::Optional as i32),
                r#type: Some(Type::Bytes as i32),
                json_name: Some(VALUE_FIELD.to_string()),
                oneof_index: Some(0),
                proto3_optional: Some(true),
                ..Default::default()
            },
            FieldDescriptorProto {
                name: Some(CHILDREN_FIELD.to_string()),
                number: Some(2),
                label: Some(Label::Repeated as i32),
                r#type: Some(Type::Message as i32),
                type_name: Some(format!("{tree_type}.CEntry")),
                json_name: Some(CHILDREN_FIELD.to_string()),
                ..Default::default()
            },
        ],
        nested_type: vec![entry],
        oneof_decl: vec![OneofDescriptorProto {
            name: Some(format!("_{VALUE_FIELD}")),
            ..Default::default()
        }],
        ..Default::default()
    };

    FileDescriptorProto {
        name: Some("tree_cache.proto".to_string()),
        package: Some(TREE_PACKAGE.to_string()),
        message_type: vec![tree],
        syntax: Some("proto3".to_string()),
        ..Default::default()
    }
}

/// Build the tree schema from scratch. Prefer [`tree_schema`], which does
/// this once per process.
pub fn resolve_tree_schema() -> Result<SchemaHandle, SerializerError> {
    let pool = DescriptorPool::from_file_descriptor_set(FileDescriptorSet {
        file: vec![tree_file_descriptor()],
    })
    .map_err(|e| SerializerError::invalid_schema(format!("tree schema: {e}")))?;
    SchemaHandle::from_pool(&pool, TREE_MESSAGE)
}

/// Process-wide tree schema, built on first use.
///
/// Concurrent first calls may each build a handle; one of them is kept and
/// the others are dropped. All of them are equivalent.
pub fn tree_schema() -> Result<SchemaHandle, SerializerError> {
    if let Some(handle) = TREE_SCHEMA.get() {
        return Ok(handle.clone());
    }
    let handle = resolve_tree_schema()?;
    tracing::trace!(message_type = TREE_MESSAGE, "tree schema initialized");
    Ok(TREE_SCHEMA.get_or_init(|| handle).clone())
}

// ═══════════════════════════════════════════════════════════════
//  ProtobufTreeSerializer
// ═══════════════════════════════════════════════════════════════

/// Tree serializer — performs `Tree<Vec<u8>> ↔ bytes`.
///
/// Field descriptors are looked up once at construction; encode/decode only
/// walk the tree.
#[derive(Debug, Clone)]
pub struct ProtobufTreeSerializer {
    schema: SchemaHandle,
    value_field: FieldDescriptor,
    children_field: FieldDescriptor,
}

impl ProtobufTreeSerializer {
    /// Serializer over the shared process-wide tree schema.
    pub fn new() -> Result<Self, SerializerError> {
        Self::with_schema(tree_schema()?)
    }

    /// Serializer over a caller-supplied schema of the same shape:
    /// `v` is bytes with presence, `c` is `map<string, Self>`.
    pub fn with_schema(schema: SchemaHandle) -> Result<Self, SerializerError> {
        let descriptor = schema.descriptor();
        let shape_err = |what: &str| {
            SerializerError::invalid_schema(format!("{}: {what}", descriptor.full_name()))
        };

        let value_field = descriptor
            .get_field_by_name(VALUE_FIELD)
            .ok_or_else(|| shape_err("missing field 'v'"))?;
        if value_field.kind() != Kind::Bytes || value_field.is_list() || !value_field.supports_presence()
        {
            return Err(shape_err("field 'v' must be an optional bytes field"));
        }

        let children_field = descriptor
            .get_field_by_name(CHILDREN_FIELD)
            .ok_or_else(|| shape_err("missing field 'c'"))?;
        let Kind::Message(entry) = children_field.kind() else {
            return Err(shape_err("field 'c' must be a map"));
        };
        if !children_field.is_map()
            || entry.map_entry_key_field().kind() != Kind::String
            || entry.map_entry_value_field().kind() != Kind::Message(descriptor.clone())
        {
            return Err(shape_err("field 'c' must be map<string, Tree>"));
        }

        Ok(Self { schema, value_field, children_field })
    }

    pub fn schema(&self) -> &SchemaHandle {
        &self.schema
    }

    /// `None` when the node carries nothing, directly or through its
    /// descendants; such nodes are left out of the parent's map.
    fn to_message(&self, node: &Tree<Vec<u8>>) -> Result<Option<DynamicMessage>, SerializerError> {
        let mut message = DynamicMessage::new(self.schema.descriptor().clone());
        let mut blank = true;

        if let Some(value) = &node.value {
            message
                .try_set_field(&self.value_field, Value::Bytes(Bytes::copy_from_slice(value)))
                .map_err(|e| SerializerError::encoding(e.to_string()))?;
            blank = false;
        }

        let mut children = HashMap::new();
        for (label, child) in node.children() {
            if label.is_empty() {
                return Err(SerializerError::encoding("empty child label"));
            }
            let child = self
                .to_message(child)
                .map_err(|e| e.with_context(format!("child '{label}'")))?;
            if let Some(child) = child {
                children.insert(MapKey::String(label.to_string()), Value::Message(child));
            }
        }
        if !children.is_empty() {
            message
                .try_set_field(&self.children_field, Value::Map(children))
                .map_err(|e| SerializerError::encoding(e.to_string()))?;
            blank = false;
        }

        Ok((!blank).then_some(message))
    }

    fn from_message(&self, message: &DynamicMessage) -> Result<Tree<Vec<u8>>, SerializerError> {
        let value = if message.has_field(&self.value_field) {
            let field = message.get_field(&self.value_field);
            let bytes = field
                .as_bytes()
                .ok_or_else(|| SerializerError::decoding("field 'v' is not bytes"))?;
            Some(bytes.to_vec())
        } else {
            None
        };

        let mut children = BTreeMap::new();
        if message.has_field(&self.children_field) {
            let field = message.get_field(&self.children_field);
            let map = field
                .as_map()
                .ok_or_else(|| SerializerError::decoding("field 'c' is not a map"))?;
            for (key, child) in map {
                let MapKey::String(label) = key else {
                    return Err(SerializerError::decoding(format!("non-string label {key:?}")));
                };
                let child = child.as_message().ok_or_else(|| {
                    SerializerError::decoding(format!("child '{label}' is not a message"))
                })?;
                let child = self
                    .from_message(child)
                    .map_err(|e| e.with_context(format!("child '{label}'")))?;
                children.insert(label.clone(), child);
            }
        }

        Ok(Tree {
            value,
            children: (!children.is_empty()).then_some(children),
        })
    }
}

impl Serializer<Tree<Vec<u8>>> for ProtobufTreeSerializer {
    fn serialize(&self, tree: &Tree<Vec<u8>>) -> Result<Vec<u8>, SerializerError> {
        Ok(self
            .to_message(tree)?
            .map(|message| message.encode_to_vec())
            .unwrap_or_default())
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<Tree<Vec<u8>>, SerializerError> {
        let message = DynamicMessage::decode(self.schema.descriptor().clone(), bytes)
            .map_err(|e| SerializerError::decoding(format!("tree decode: {e}")))?;
        self.from_message(&message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn serializer() -> ProtobufTreeSerializer {
        ProtobufTreeSerializer::new().unwrap()
    }

    #[test]
    fn singleton_is_reused() {
        let a = tree_schema().unwrap();
        let b = tree_schema().unwrap();
        assert_eq!(a, b);
        assert_eq!(a.full_name(), TREE_MESSAGE);
    }

    #[test]
    fn empty_node_encodes_to_nothing() {
        let s = serializer();
        assert!(s.serialize(&Tree::new()).unwrap().is_empty());

        let empty_children = Tree { value: None, children: Some(BTreeMap::new()) };
        assert!(s.serialize(&empty_children).unwrap().is_empty());
    }

    #[test]
    fn empty_value_is_kept() {
        let s = serializer();
        let bytes = s.serialize(&Tree::leaf(Vec::new())).unwrap();
        assert_eq!(bytes, vec![0x0a, 0x00]);
        assert_eq!(s.deserialize(&bytes).unwrap(), Tree::leaf(Vec::new()));
    }

    #[test]
    fn leaf_wire_format() {
        // field 1, length-delimited, 2 bytes
        let bytes = serializer().serialize(&Tree::leaf(vec![1, 2])).unwrap();
        assert_eq!(bytes, vec![0x0a, 0x02, 0x01, 0x02]);
    }

    #[test]
    fn empty_children_are_left_out() {
        let s = serializer();
        let tree = Tree::leaf(vec![9])
            .with_child("x", Tree::new())
            .with_child("y", Tree::new().with_child("z", Tree::new()));
        let bytes = s.serialize(&tree).unwrap();
        assert_eq!(bytes, s.serialize(&Tree::leaf(vec![9])).unwrap());

        let decoded = s.deserialize(&bytes).unwrap();
        assert_eq!(decoded.value, Some(vec![9]));
        assert_eq!(decoded.children, None);
    }

    #[test]
    fn empty_child_keeps_its_valued_sibling() {
        let s = serializer();
        let tree = Tree::new()
            .with_child("x", Tree::new())
            .with_child("w", Tree::new().with_value(vec![1]));
        let decoded = s.deserialize(&s.serialize(&tree).unwrap()).unwrap();
        assert_eq!(decoded, Tree::new().with_child("w", Tree::leaf(vec![1])));
    }

    #[test]
    fn empty_label_is_rejected() {
        let tree = Tree::new().with_child("a", Tree::new().with_child("", Tree::leaf(vec![1])));
        let err = serializer().serialize(&tree).unwrap_err();
        assert!(matches!(err, SerializerError::Encoding(_)), "{err}");
        assert!(err.to_string().contains("child 'a'"), "{err}");
    }

    #[test]
    fn truncated_input_fails() {
        let err = serializer().deserialize(&[0x0a, 0x05, 0x01]).unwrap_err();
        assert!(matches!(err, SerializerError::Decoding(_)), "{err}");
    }

    #[test]
    fn rejects_foreign_shape() {
        let other = resolve_tree_schema().unwrap();
        let entry = match other.descriptor().get_field_by_name(CHILDREN_FIELD).unwrap().kind() {
            Kind::Message(entry) => entry,
            _ => unreachable!(),
        };
        let err = ProtobufTreeSerializer::with_schema(SchemaHandle::from(entry)).unwrap_err();
        assert!(matches!(err, SerializerError::InvalidSchema(_)), "{err}");
    }
}
