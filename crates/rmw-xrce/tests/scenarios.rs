// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![allow(clippy::uninlined_format_args)] // Test/bench code readability over pedantic
#![allow(clippy::missing_panics_doc)] // Tests panic on failure

//! End-to-end client creation through the rmw entry points.
//!
//! Each scenario drives `rmw_create_client` against a loopback session:
//! - A: agent acknowledges, gid exports into a fixed buffer
//! - B: agent rejects, nothing stays allocated
//! - C: agent never answers, handled like a rejection
//! - D: empty name fails before any pool or counter interaction

use rmw_xrce::error_state::{last_error, reset_error};
use rmw_xrce::rmw::{rmw_create_client, rmw_destroy_client};
use rmw_xrce::{
    EntityKind, LoopbackSession, Node, ObjectId, ObjectKind, QosProfile, Reply, RmwRet,
    StatusCode, StreamingState, TypeCallbacks, TypeSupportHandle, XrceConfig, GID_STORAGE_SIZE,
};

fn config() -> XrceConfig {
    XrceConfig {
        creation_timeout_ms: 20,
        ..XrceConfig::default()
    }
}

fn add_two_ints() -> TypeSupportHandle {
    TypeSupportHandle::xrce_c(TypeCallbacks::service("example_interfaces", "AddTwoInts"))
}

#[test]
fn scenario_a_client_acknowledged() {
    reset_error();
    let mut node = Node::new("caller", "/", LoopbackSession::new(), config()).expect("node");
    let handle = rmw_create_client(
        Some(&mut node),
        Some(&add_two_ints()),
        Some("add_two_ints"),
        Some(&QosProfile::default()),
    )
    .expect("client created");

    let record = node.entity(handle).expect("record published");
    assert_eq!(record.kind(), EntityKind::Client);
    assert_eq!(record.name(), "add_two_ints");
    assert_eq!(record.object_id().kind(), ObjectKind::Requester);
    assert!(matches!(record.streaming(), StreamingState::Requested(_)));
    assert_eq!(record.history_write_index, 0);
    assert_eq!(record.history_read_index, 0);

    let mut export = [0xAAu8; GID_STORAGE_SIZE];
    let written = record.object_id().write_to(&mut export).expect("fits");
    assert_eq!(written, ObjectId::ENCODED_LEN);
    assert!(export[written..].iter().all(|b| *b == 0));
    assert_eq!(ObjectId::read_from(&export), Some(record.object_id()));
    assert_eq!(&export, record.gid().as_bytes());

    let mut tiny = [0u8; 1];
    assert!(record.object_id().write_to(&mut tiny).is_err());

    assert_eq!(last_error(), None);
    assert_eq!(
        rmw_destroy_client(Some(&mut node), Some(handle)),
        RmwRet::Ok
    );
}

#[test]
fn scenario_b_agent_rejects() {
    reset_error();
    let mut node = Node::new("caller", "/", LoopbackSession::new(), config()).expect("node");
    node.session_mut()
        .script([Reply::Status(StatusCode::ErrDenied)]);
    let free_before = node.pool(EntityKind::Client).free_count();

    let handle = rmw_create_client(
        Some(&mut node),
        Some(&add_two_ints()),
        Some("add_two_ints"),
        Some(&QosProfile::default()),
    );

    assert!(handle.is_none());
    let message = last_error().expect("error message set");
    assert!(message.contains("ERR_DENIED"), "message: {}", message);
    assert_eq!(node.pool(EntityKind::Client).free_count(), free_before);
    assert_eq!(node.entities(EntityKind::Client).count(), 0);
}

#[test]
fn scenario_c_agent_silent() {
    reset_error();
    let mut node = Node::new(
        "caller",
        "/",
        LoopbackSession::with_default(Reply::Silent),
        config(),
    )
    .expect("node");
    let free_before = node.pool(EntityKind::Client).free_count();

    let handle = rmw_create_client(
        Some(&mut node),
        Some(&add_two_ints()),
        Some("add_two_ints"),
        Some(&QosProfile::default()),
    );

    assert!(handle.is_none());
    assert!(last_error().is_some());
    assert_eq!(node.pool(EntityKind::Client).free_count(), free_before);
    assert_eq!(node.entities(EntityKind::Client).count(), 0);
    assert!(node.registrar().pending().is_empty());
}

#[test]
fn scenario_d_empty_name_touches_nothing() {
    reset_error();
    let mut node = Node::new("caller", "/", LoopbackSession::new(), config()).expect("node");
    let acquisitions = node.pool(EntityKind::Client).stats().acquisitions;
    let next_id = node.id_generator().peek();

    let handle = rmw_create_client(
        Some(&mut node),
        Some(&add_two_ints()),
        Some(""),
        Some(&QosProfile::default()),
    );

    assert!(handle.is_none());
    assert_eq!(
        last_error().as_deref(),
        Some("service name is null or empty string")
    );
    assert_eq!(node.pool(EntityKind::Client).stats().acquisitions, acquisitions);
    assert_eq!(node.id_generator().peek(), next_id);
    assert!(node.session().ops().is_empty());

    // same guarantee when calling the node directly
    let direct = node.create_entity(
        EntityKind::Client,
        &add_two_ints(),
        "",
        &QosProfile::default(),
    );
    assert!(matches!(direct, Err(rmw_xrce::Error::InvalidArgument(_))));
    assert_eq!(node.pool(EntityKind::Client).stats().acquisitions, acquisitions);
    assert_eq!(node.id_generator().peek(), next_id);
}

#[test]
fn null_arguments_are_reported() {
    let mut node = Node::new("caller", "/", LoopbackSession::new(), config()).expect("node");

    reset_error();
    assert!(rmw_create_client(
        Some(&mut node),
        None,
        Some("add_two_ints"),
        Some(&QosProfile::default())
    )
    .is_none());
    assert_eq!(last_error().as_deref(), Some("type support handle is null"));

    reset_error();
    assert!(rmw_create_client(
        Some(&mut node),
        Some(&add_two_ints()),
        None,
        Some(&QosProfile::default())
    )
    .is_none());
    assert_eq!(
        last_error().as_deref(),
        Some("service name is null or empty string")
    );

    reset_error();
    assert!(rmw_create_client(Some(&mut node), Some(&add_two_ints()), Some("x"), None).is_none());
    assert_eq!(last_error().as_deref(), Some("qos profile is null"));

    assert_eq!(
        rmw_destroy_client(Some(&mut node), None),
        RmwRet::InvalidArgument
    );
    assert_eq!(node.pool(EntityKind::Client).stats().acquisitions, 0);
}

#[test]
fn missing_type_support_maps_to_error() {
    reset_error();
    let mut node = Node::new("caller", "/", LoopbackSession::new(), config()).expect("node");
    let message_only = TypeSupportHandle::xrce_c(TypeCallbacks::message("std_msgs", "String"));

    let handle = rmw_create_client(
        Some(&mut node),
        Some(&message_only),
        Some("add_two_ints"),
        Some(&QosProfile::default()),
    );

    assert!(handle.is_none());
    assert!(last_error().is_some());
    assert_eq!(node.pool(EntityKind::Client).free_count(), 4);
    assert!(node.session().ops().is_empty());
}
