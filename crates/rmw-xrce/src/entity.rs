// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Entity records stored in the node pools.

use crate::object_id::{Gid, ObjectId, ObjectKind};
use crate::pool::SlotHandle;
use crate::session::RequestId;
use crate::type_support::TypeCallbacks;
use core::fmt;
use std::sync::Arc;

/// rmw entity kinds a node can create against the agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Client,
    Service,
    Publisher,
    Subscription,
}

impl EntityKind {
    pub const ALL: [EntityKind; 4] = [
        EntityKind::Client,
        EntityKind::Service,
        EntityKind::Publisher,
        EntityKind::Subscription,
    ];

    /// XRCE objects created for one entity, parents first.
    ///
    /// The last object is the entity's primary object: its id becomes the
    /// entity gid.
    pub const fn object_plan(self) -> &'static [ObjectKind] {
        match self {
            EntityKind::Client => &[ObjectKind::Requester],
            EntityKind::Service => &[ObjectKind::Replier],
            EntityKind::Publisher => &[
                ObjectKind::Publisher,
                ObjectKind::Topic,
                ObjectKind::DataWriter,
            ],
            EntityKind::Subscription => &[
                ObjectKind::Subscriber,
                ObjectKind::Topic,
                ObjectKind::DataReader,
            ],
        }
    }

    /// Whether the entity receives samples and needs a data request.
    pub const fn receives_data(self) -> bool {
        !matches!(self, EntityKind::Publisher)
    }

    /// Whether the type support must describe a service (request/reply pair).
    pub const fn is_service_kind(self) -> bool {
        matches!(self, EntityKind::Client | EntityKind::Service)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            EntityKind::Client => "client",
            EntityKind::Service => "service",
            EntityKind::Publisher => "publisher",
            EntityKind::Subscription => "subscription",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Caller-side reference to a live entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityHandle {
    pub(crate) kind: EntityKind,
    pub(crate) slot: SlotHandle,
}

impl EntityHandle {
    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn slot_index(&self) -> usize {
        self.slot.index()
    }
}

/// Outcome of the continuous data request issued after creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamingState {
    /// Entity never receives data (publishers).
    NotApplicable,
    /// Data request queued on the reliable stream.
    Requested(RequestId),
    /// The request could not be queued; retry with `Node::request_data`.
    NotStreaming,
}

/// Local state of an entity acknowledged by the agent.
#[derive(Debug, Clone)]
pub struct EntityRecord {
    pub(crate) owner: ObjectId,
    pub(crate) kind: EntityKind,
    pub(crate) name: String,
    pub(crate) object_id: ObjectId,
    /// Parent objects created with the entity, in creation order.
    pub(crate) parents: heapless::Vec<ObjectId, 2>,
    pub(crate) gid: Gid,
    pub(crate) type_callbacks: Arc<TypeCallbacks>,
    pub(crate) streaming: StreamingState,
    pub history_write_index: usize,
    pub history_read_index: usize,
}

impl EntityRecord {
    /// Participant object of the node that owns this entity.
    pub fn owner(&self) -> ObjectId {
        self.owner
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Topic or service name the entity was created with.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn object_id(&self) -> ObjectId {
        self.object_id
    }

    pub fn gid(&self) -> &Gid {
        &self.gid
    }

    pub fn type_callbacks(&self) -> &Arc<TypeCallbacks> {
        &self.type_callbacks
    }

    pub fn streaming(&self) -> StreamingState {
        self.streaming
    }

    /// Every XRCE object backing the entity, in creation order.
    pub fn objects(&self) -> impl DoubleEndedIterator<Item = ObjectId> + '_ {
        self.parents
            .iter()
            .copied()
            .chain(core::iter::once(self.object_id))
    }
}
