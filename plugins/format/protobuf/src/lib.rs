//! Protobuf serializers for the tree cache.
//!
//! - [`SchemaHandle`] — resolved message schema (from a FileDescriptorSet
//!   file, a loaded pool, or a ready `MessageDescriptor`).
//! - [`ProtobufValueSerializer`] — single-node payloads against a caller
//!   schema.
//! - [`ProtobufTreeSerializer`] — whole subtrees against the fixed
//!   `codibre.tree_cache.Tree` schema.
//! - [`ProtobufSerializers`] — both of the above, ready to plug into the
//!   cache as [`SerializerOptions`](tree_cache_api::SerializerOptions).

pub mod schema;
pub mod serializers;
pub mod tree;
pub mod value;

pub use schema::{SchemaHandle, SchemaLocation, load_descriptor_pool};
pub use serializers::ProtobufSerializers;
pub use tree::{ProtobufTreeSerializer, TREE_MESSAGE, resolve_tree_schema, tree_schema};
pub use value::{FlatValue, ProtobufValueSerializer};
