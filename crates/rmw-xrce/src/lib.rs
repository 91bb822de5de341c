// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # rmw-xrce - ROS 2 Entities over a DDS-XRCE Agent
//!
//! Entity lifecycle layer for a ROS 2 middleware adapter whose DDS entities
//! live on a remote XRCE agent. A node creates clients, services,
//! publishers and subscriptions by asking the agent to build the backing
//! objects, then tracks them in fixed-capacity pools.
//!
//! ## Design Constraints
//!
//! - **Bounded memory**: one fixed-size pool per entity kind, sized once
//! - **All-or-nothing creation**: a failed creation leaves no slot taken
//! - **Bounded wait**: creation blocks at most the configured timeout
//! - **No globals**: id counter, pools and session belong to the node
//!
//! ## Architecture
//!
//! ```text
//! +-----------------------------------------+
//! |  rmw entry points (rmw_create_*)        |
//! +-----------------------------------------+
//!           v                    ^
//! +-----------------------------------------+
//! |  Node / SharedNode (lifecycle)          |
//! +-----------------------------------------+
//!      v              v              v
//! +-----------+ +-------------+ +-----------+
//! | EntityPool| | Descriptor  | | Id        |
//! |           | | Strategy    | | Generator |
//! +-----------+ +-------------+ +-----------+
//!           v                    ^
//! +-----------------------------------------+
//! |  SessionRegistrar                       |
//! +-----------------------------------------+
//!           v                    ^
//! +-----------------------------------------+
//! |  XrceSession (agent link / loopback)    |
//! +-----------------------------------------+
//! ```
//!
//! ## Quick Start
//!
//! ```
//! use rmw_xrce::{EntityKind, LoopbackSession, Node, QosProfile};
//! use rmw_xrce::{TypeCallbacks, TypeSupportHandle, XrceConfig};
//!
//! let mut node = Node::new("talker", "/", LoopbackSession::new(), XrceConfig::default())?;
//! let ts = TypeSupportHandle::xrce_c(TypeCallbacks::message("std_msgs", "String"));
//! let publisher = node.create_entity(EntityKind::Publisher, &ts, "chatter", &QosProfile::default())?;
//! node.destroy_entity(publisher)?;
//! # Ok::<(), rmw_xrce::Error>(())
//! ```

#![deny(unsafe_code)]

/// Node configuration (defaults, environment, YAML)
pub mod config;

/// Creation descriptors: inline XML profiles or agent-side references
pub mod descriptor;

/// Entity kinds, handles and records
pub mod entity;

/// Error types
pub mod error;

/// Thread-local last-error message
pub mod error_state;

mod lifecycle;

/// Node owning pools, id counter and session
pub mod node;

/// XRCE object ids and gids
pub mod object_id;

/// Fixed-capacity slot pool
pub mod pool;

/// QoS settings rendered into writer/reader profiles
pub mod qos;

/// Creation/deletion submission and status correlation
pub mod registrar;

/// rmw-shaped entry points
pub mod rmw;

/// Agent session abstraction
pub mod session;

/// Type support lookup
pub mod type_support;

pub use crate::config::{DescriptorMode, XrceConfig};
pub use crate::descriptor::{Descriptor, DescriptorStrategy, ProfileBuilder, ReferenceTable};
pub use crate::entity::{EntityHandle, EntityKind, EntityRecord, StreamingState};
pub use crate::error::{ConfigError, EncodingError, Error, ErrorCategory, Result};
pub use crate::node::{Node, SharedNode};
pub use crate::object_id::{Gid, IdGenerator, ObjectId, ObjectKind};
pub use crate::pool::{EntityPool, SlotHandle};
pub use crate::qos::{Durability, History, QosProfile, Reliability};
pub use crate::rmw::RmwRet;
pub use crate::session::{LoopbackSession, RecordedOp, Reply, StatusCode, XrceSession};
pub use crate::type_support::{TypeCallbacks, TypeSupportHandle};

/// rmw implementation identifier nodes and handles must carry.
pub const IMPLEMENTATION_IDENTIFIER: &str = "rmw_microxrcedds";

/// Size of the gid exposed through the rmw API.
pub const GID_STORAGE_SIZE: usize = 24;

/// Capacity of an inline XML profile.
pub const XML_BUFFER_LENGTH: usize = 600;

/// Capacity of a reference token.
pub const REF_BUFFER_LENGTH: usize = 100;

/// Default bound on the wait for creation status.
pub const DEFAULT_CREATION_TIMEOUT_MS: u64 = 1000;

/// Version of rmw-xrce
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
