// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![allow(clippy::missing_panics_doc)] // Tests panic on failure

//! Loading node configuration and reference tables from YAML files.

use rmw_xrce::{
    ConfigError, DescriptorMode, EncodingError, EntityKind, Error, LoopbackSession, Node,
    QosProfile, RecordedOp, TypeCallbacks, TypeSupportHandle, XrceConfig,
};
use std::io::Write;
use tempfile::NamedTempFile;

fn yaml_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp file");
    file.write_all(contents.as_bytes()).expect("write yaml");
    file
}

#[test]
fn config_file_sets_pools_and_timeout() {
    let file = yaml_file("max_publishers: 2\nmax_subscriptions: 1\ncreation_timeout_ms: 300\n");
    let config = XrceConfig::from_file(file.path()).expect("config");
    assert_eq!(config.max_publishers, 2);
    assert_eq!(config.max_subscriptions, 1);
    assert_eq!(config.max_clients, 4);
    assert_eq!(config.creation_timeout_ms, 300);

    let node = Node::new("n", "/", LoopbackSession::new(), config).expect("node");
    assert_eq!(node.pool(EntityKind::Publisher).capacity(), 2);
    assert_eq!(node.pool(EntityKind::Subscription).capacity(), 1);
}

#[test]
fn missing_config_file_is_io_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let err = XrceConfig::from_file(dir.path().join("absent.yaml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io(_)));
}

#[test]
fn invalid_config_is_refused_by_node() {
    let file = yaml_file("max_clients: 0\n");
    let config = XrceConfig::from_file(file.path()).expect("parses");
    let err = Node::new("n", "/", LoopbackSession::new(), config)
        .err()
        .expect("rejected");
    assert_eq!(
        err,
        Error::Config(ConfigError::ZeroCapacity(EntityKind::Client))
    );
}

#[test]
fn refs_mode_uses_reference_file() {
    let refs = yaml_file("chatter__t: chatter_topic\nchatter__dw: chatter_writer\n");
    let config = XrceConfig {
        descriptor_mode: DescriptorMode::Refs,
        references_file: Some(refs.path().display().to_string()),
        creation_timeout_ms: 10,
        ..XrceConfig::default()
    };
    let mut node = Node::new("n", "/", LoopbackSession::new(), config).expect("node");
    assert_eq!(node.descriptor_strategy().mode_name(), "refs");

    let ts = TypeSupportHandle::xrce_c(TypeCallbacks::message("std_msgs", "String"));
    node.create_entity(EntityKind::Publisher, &ts, "/chatter", &QosProfile::default())
        .expect("publisher by reference");

    let descriptors: Vec<(String, bool)> = node
        .session()
        .creates()
        .filter_map(|op| match op {
            RecordedOp::Create {
                descriptor,
                reference,
                ..
            } => Some((descriptor.clone(), *reference)),
            _ => None,
        })
        .collect();
    assert_eq!(
        descriptors,
        vec![
            (String::new(), false),
            ("chatter_topic".to_string(), true),
            ("chatter_writer".to_string(), true),
        ]
    );

    // no reader reference registered for this topic
    let err = node
        .create_entity(EntityKind::Subscription, &ts, "chatter", &QosProfile::default())
        .unwrap_err();
    assert_eq!(
        err,
        Error::Encoding(EncodingError::UnknownReference("chatter__dr".to_string()))
    );
    assert_eq!(node.pool(EntityKind::Subscription).free_count(), 4);
}

#[test]
fn inline_references_merge_with_file() {
    let refs = yaml_file("add_two_ints__rp: add_two_ints_replier\n");
    let config = XrceConfig::from_yaml_str(&format!(
        "descriptor_mode: refs\nreferences_file: {}\nreferences:\n  add_two_ints__rq: add_two_ints_requester\n",
        refs.path().display()
    ))
    .expect("config");
    let mut node = Node::new("n", "/", LoopbackSession::new(), config).expect("node");
    let ts = TypeSupportHandle::xrce_c(TypeCallbacks::service("example_interfaces", "AddTwoInts"));

    node.create_entity(EntityKind::Client, &ts, "add_two_ints", &QosProfile::default())
        .expect("client by inline reference");
    node.create_entity(EntityKind::Service, &ts, "add_two_ints", &QosProfile::default())
        .expect("service by file reference");
}

#[test]
fn broken_reference_file_fails_node_construction() {
    let refs = yaml_file("- not\n- a\n- map\n");
    let config = XrceConfig {
        descriptor_mode: DescriptorMode::Refs,
        references_file: Some(refs.path().display().to_string()),
        ..XrceConfig::default()
    };
    let err = Node::new("n", "/", LoopbackSession::new(), config)
        .err()
        .expect("rejected");
    assert!(matches!(err, Error::Config(ConfigError::Parse(_))));
}
