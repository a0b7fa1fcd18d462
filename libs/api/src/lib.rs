//! Contract between a hierarchical key/tree cache and its pluggable
//! serializers.
//!
//! The cache stores opaque byte strings under colon-joined keys. Every stored
//! entry is produced by one of two serializers: a value serializer for a
//! single node's payload, and a tree serializer for a whole subtree of
//! already-serialized payloads.

pub mod error;
pub mod serializer;
pub mod tree;

pub use error::{ErrorKind, SerializerError};
pub use serializer::{Serializer, SerializerOptions};
pub use tree::Tree;
