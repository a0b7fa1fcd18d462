#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

use prost::Message;
use prost_types::field_descriptor_proto::{Label, Type};
use prost_types::{DescriptorProto, FieldDescriptorProto, FileDescriptorProto, FileDescriptorSet};
use tree_cache_protobuf::SchemaLocation;

pub const VALUE_MESSAGE: &str = "codibre.test_value.Value";

static NEXT_FILE: AtomicUsize = AtomicUsize::new(0);

fn field(name: &str, number: i32, ty: Type, label: Label) -> FieldDescriptorProto {
    FieldDescriptorProto {
        name: Some(name.to_string()),
        number: Some(number),
        label: Some(label as i32),
        r#type: Some(ty as i32),
        json_name: Some(name.to_string()),
        ..Default::default()
    }
}

/// ```proto
/// syntax = "proto3";
/// package codibre.test_value;
/// message Value {
///   int32 value = 1;
///   string name = 2;
///   bytes payload = 3;
///   repeated string tags = 4;
///   int64 counter = 5;
/// }
/// ```
pub fn value_descriptor_set() -> FileDescriptorSet {
    let value = DescriptorProto {
        name: Some("Value".to_string()),
        field: vec![
            field("value", 1, Type::Int32, Label::Optional),
            field("name", 2, Type::String, Label::Optional),
            field("payload", 3, Type::Bytes, Label::Optional),
            field("tags", 4, Type::String, Label::Repeated),
            field("counter", 5, Type::Int64, Label::Optional),
        ],
        ..Default::default()
    };
    FileDescriptorSet {
        file: vec![FileDescriptorProto {
            name: Some("value.proto".to_string()),
            package: Some("codibre.test_value".to_string()),
            message_type: vec![value],
            syntax: Some("proto3".to_string()),
            ..Default::default()
        }],
    }
}

/// Fresh path in the system temp dir; nothing is created.
pub fn temp_path(stem: &str) -> PathBuf {
    let n = NEXT_FILE.fetch_add(1, Ordering::Relaxed);
    std::env::temp_dir().join(format!("tree-cache-{}-{n}-{stem}.bin", std::process::id()))
}

/// Write `bytes` to a fresh temp file and return its path.
pub fn write_temp(stem: &str, bytes: &[u8]) -> PathBuf {
    let path = temp_path(stem);
    std::fs::write(&path, bytes).unwrap();
    path
}

/// Descriptor file holding [`value_descriptor_set`].
pub fn value_descriptor_file() -> PathBuf {
    write_temp("value", &value_descriptor_set().encode_to_vec())
}

pub fn value_location() -> SchemaLocation {
    SchemaLocation::new(value_descriptor_file(), VALUE_MESSAGE)
}
