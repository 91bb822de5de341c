// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! rmw-shaped entry points.
//!
//! Every handle argument is optional, mirroring nullable pointers at the
//! rmw boundary. Failures never panic: creation returns `None`, destruction
//! returns an [`RmwRet`] code, and both record a message readable through
//! [`crate::error_state::last_error`].

use crate::entity::{EntityHandle, EntityKind};
use crate::error::{Error, ErrorCategory};
use crate::error_state::set_error_msg;
use crate::qos::QosProfile;
use crate::session::XrceSession;
use crate::type_support::TypeSupportHandle;
use crate::{Node, IMPLEMENTATION_IDENTIFIER};
use log::warn;

/// rmw return codes.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RmwRet {
    Ok = 0,
    Error = 1,
    BadAlloc = 10,
    InvalidArgument = 11,
    IncorrectRmwImplementation = 12,
}

impl From<&Error> for RmwRet {
    fn from(err: &Error) -> Self {
        match err.category() {
            ErrorCategory::InvalidArgument => RmwRet::InvalidArgument,
            ErrorCategory::ResourceExhaustion => RmwRet::BadAlloc,
            ErrorCategory::Configuration | ErrorCategory::Protocol => RmwRet::Error,
        }
    }
}

fn checked_node<'a, S: XrceSession>(
    node: Option<&'a mut Node<S>>,
) -> Result<&'a mut Node<S>, RmwRet> {
    let Some(node) = node else {
        set_error_msg("node handle is null");
        return Err(RmwRet::InvalidArgument);
    };
    if node.implementation_identifier() != IMPLEMENTATION_IDENTIFIER {
        set_error_msg("node handle not from this implementation");
        return Err(RmwRet::IncorrectRmwImplementation);
    }
    Ok(node)
}

fn create<S: XrceSession>(
    kind: EntityKind,
    node: Option<&mut Node<S>>,
    type_support: Option<&TypeSupportHandle>,
    name: Option<&str>,
    qos: Option<&QosProfile>,
) -> Option<EntityHandle> {
    let node = checked_node(node).ok()?;
    let Some(type_support) = type_support else {
        set_error_msg("type support handle is null");
        return None;
    };
    let Some(name) = name.filter(|name| !name.is_empty()) else {
        set_error_msg(if kind.is_service_kind() {
            "service name is null or empty string"
        } else {
            "topic name is null or empty string"
        });
        return None;
    };
    let Some(qos) = qos else {
        set_error_msg("qos profile is null");
        return None;
    };

    match node.create_entity(kind, type_support, name, qos) {
        Ok(handle) => Some(handle),
        Err(e) => {
            warn!("[rmw_create_{}] '{}': {}", kind, name, e);
            set_error_msg(e.to_string());
            None
        }
    }
}

fn destroy<S: XrceSession>(
    kind: EntityKind,
    node: Option<&mut Node<S>>,
    handle: Option<EntityHandle>,
) -> RmwRet {
    let node = match checked_node(node) {
        Ok(node) => node,
        Err(ret) => return ret,
    };
    let Some(handle) = handle else {
        set_error_msg(format!("{} handle is null", kind));
        return RmwRet::InvalidArgument;
    };
    if handle.kind() != kind {
        set_error_msg(format!("handle is a {}, not a {}", handle.kind(), kind));
        return RmwRet::InvalidArgument;
    }
    match node.destroy_entity(handle) {
        Ok(()) => RmwRet::Ok,
        Err(e) => {
            set_error_msg(e.to_string());
            RmwRet::from(&e)
        }
    }
}

pub fn rmw_create_client<S: XrceSession>(
    node: Option<&mut Node<S>>,
    type_support: Option<&TypeSupportHandle>,
    service_name: Option<&str>,
    qos: Option<&QosProfile>,
) -> Option<EntityHandle> {
    create(EntityKind::Client, node, type_support, service_name, qos)
}

pub fn rmw_create_service<S: XrceSession>(
    node: Option<&mut Node<S>>,
    type_support: Option<&TypeSupportHandle>,
    service_name: Option<&str>,
    qos: Option<&QosProfile>,
) -> Option<EntityHandle> {
    create(EntityKind::Service, node, type_support, service_name, qos)
}

pub fn rmw_create_publisher<S: XrceSession>(
    node: Option<&mut Node<S>>,
    type_support: Option<&TypeSupportHandle>,
    topic_name: Option<&str>,
    qos: Option<&QosProfile>,
) -> Option<EntityHandle> {
    create(EntityKind::Publisher, node, type_support, topic_name, qos)
}

pub fn rmw_create_subscription<S: XrceSession>(
    node: Option<&mut Node<S>>,
    type_support: Option<&TypeSupportHandle>,
    topic_name: Option<&str>,
    qos: Option<&QosProfile>,
) -> Option<EntityHandle> {
    create(EntityKind::Subscription, node, type_support, topic_name, qos)
}

pub fn rmw_destroy_client<S: XrceSession>(
    node: Option<&mut Node<S>>,
    client: Option<EntityHandle>,
) -> RmwRet {
    destroy(EntityKind::Client, node, client)
}

pub fn rmw_destroy_service<S: XrceSession>(
    node: Option<&mut Node<S>>,
    service: Option<EntityHandle>,
) -> RmwRet {
    destroy(EntityKind::Service, node, service)
}

pub fn rmw_destroy_publisher<S: XrceSession>(
    node: Option<&mut Node<S>>,
    publisher: Option<EntityHandle>,
) -> RmwRet {
    destroy(EntityKind::Publisher, node, publisher)
}

pub fn rmw_destroy_subscription<S: XrceSession>(
    node: Option<&mut Node<S>>,
    subscription: Option<EntityHandle>,
) -> RmwRet {
    destroy(EntityKind::Subscription, node, subscription)
}
