// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Owning node: session, id counter and entity pools of one participant.

use crate::config::XrceConfig;
use crate::descriptor::DescriptorStrategy;
use crate::entity::{EntityHandle, EntityKind, EntityRecord};
use crate::error::Result;
use crate::object_id::{IdGenerator, ObjectId, ObjectKind};
use crate::pool::EntityPool;
use crate::registrar::SessionRegistrar;
use crate::session::{StreamDirection, StreamId, XrceSession};
use crate::IMPLEMENTATION_IDENTIFIER;
use log::debug;
use parking_lot::Mutex;
use std::sync::Arc;

/// One pool per entity kind.
#[derive(Debug)]
pub(crate) struct Pools {
    clients: EntityPool<EntityRecord>,
    services: EntityPool<EntityRecord>,
    publishers: EntityPool<EntityRecord>,
    subscriptions: EntityPool<EntityRecord>,
}

impl Pools {
    fn new(config: &XrceConfig) -> Self {
        Self {
            clients: EntityPool::new(config.max_clients),
            services: EntityPool::new(config.max_services),
            publishers: EntityPool::new(config.max_publishers),
            subscriptions: EntityPool::new(config.max_subscriptions),
        }
    }

    pub(crate) fn get(&self, kind: EntityKind) -> &EntityPool<EntityRecord> {
        match kind {
            EntityKind::Client => &self.clients,
            EntityKind::Service => &self.services,
            EntityKind::Publisher => &self.publishers,
            EntityKind::Subscription => &self.subscriptions,
        }
    }

    pub(crate) fn get_mut(&mut self, kind: EntityKind) -> &mut EntityPool<EntityRecord> {
        match kind {
            EntityKind::Client => &mut self.clients,
            EntityKind::Service => &mut self.services,
            EntityKind::Publisher => &mut self.publishers,
            EntityKind::Subscription => &mut self.subscriptions,
        }
    }
}

/// Middleware participant owning every entity it creates.
///
/// # Design
///
/// - Single thread of control: creation blocks the caller while the agent
///   answers
/// - Fixed number of entities per kind (configured at construction)
/// - No process-wide state: the id counter and pools are node fields
///
/// Wrap the node in a [`SharedNode`] to drive it from several threads.
pub struct Node<S: XrceSession> {
    pub(crate) implementation_identifier: &'static str,
    name: String,
    namespace: String,
    pub(crate) participant_id: ObjectId,
    pub(crate) session: S,
    pub(crate) registrar: SessionRegistrar,
    pub(crate) ids: IdGenerator,
    pub(crate) pools: Pools,
    pub(crate) descriptors: DescriptorStrategy,
    pub(crate) config: XrceConfig,
}

impl<S: XrceSession> Node<S> {
    /// Create a node on an established session.
    ///
    /// Fails with a configuration error when `config` is invalid, including
    /// gid storage too small for an object id.
    pub fn new(name: &str, namespace: &str, session: S, config: XrceConfig) -> Result<Self> {
        config.validate()?;
        let descriptors = config.descriptor_strategy()?;

        let mut ids = IdGenerator::new();
        let participant_id = ids.next(ObjectKind::Participant);

        debug!(
            "[Node::new] {}{} participant={} descriptors={}",
            namespace,
            name,
            participant_id,
            descriptors.mode_name()
        );

        Ok(Self {
            implementation_identifier: IMPLEMENTATION_IDENTIFIER,
            name: name.to_string(),
            namespace: namespace.to_string(),
            participant_id,
            session,
            registrar: SessionRegistrar::new(
                StreamId::reliable(0, StreamDirection::Output),
                StreamId::reliable(0, StreamDirection::Input),
            ),
            ids,
            pools: Pools::new(&config),
            descriptors,
            config,
        })
    }

    /// Create a node configured from `RMW_XRCE_*` environment variables.
    pub fn from_env(name: &str, namespace: &str, session: S) -> Result<Self> {
        let config = XrceConfig::from_env()?;
        config.apply_log_level();
        Self::new(name, namespace, session, config)
    }

    /// Re-tag the node with another rmw implementation identifier.
    ///
    /// rmw entry points refuse nodes whose identifier is not ours.
    #[must_use]
    pub fn with_implementation_identifier(mut self, identifier: &'static str) -> Self {
        self.implementation_identifier = identifier;
        self
    }

    pub fn implementation_identifier(&self) -> &'static str {
        self.implementation_identifier
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn participant_id(&self) -> ObjectId {
        self.participant_id
    }

    pub fn config(&self) -> &XrceConfig {
        &self.config
    }

    pub fn descriptor_strategy(&self) -> &DescriptorStrategy {
        &self.descriptors
    }

    pub fn id_generator(&self) -> &IdGenerator {
        &self.ids
    }

    pub fn registrar(&self) -> &SessionRegistrar {
        &self.registrar
    }

    pub fn pool(&self, kind: EntityKind) -> &EntityPool<EntityRecord> {
        self.pools.get(kind)
    }

    pub fn session(&self) -> &S {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut S {
        &mut self.session
    }

    /// Record of a live entity.
    pub fn entity(&self, handle: EntityHandle) -> Option<&EntityRecord> {
        self.pools.get(handle.kind).get(handle.slot)
    }

    /// Mutable record of a live entity (history cursors).
    pub fn entity_mut(&mut self, handle: EntityHandle) -> Option<&mut EntityRecord> {
        self.pools.get_mut(handle.kind).get_mut(handle.slot)
    }

    /// Live entities of `kind`.
    pub fn entities(&self, kind: EntityKind) -> impl Iterator<Item = (EntityHandle, &EntityRecord)> {
        self.pools
            .get(kind)
            .iter()
            .map(move |(slot, record)| (EntityHandle { kind, slot }, record))
    }

    /// Destroy every entity and hand the session back.
    pub fn shutdown(mut self) -> S {
        for kind in EntityKind::ALL {
            let handles: Vec<_> = self.entities(kind).map(|(handle, _)| handle).collect();
            for handle in handles {
                // handles were just listed, destroy cannot see them stale
                let _ = self.destroy_entity(handle);
            }
        }
        debug!("[Node::shutdown] {}{}", self.namespace, self.name);
        self.session
    }
}

/// Node shared between threads.
///
/// Every operation holds the node lock, which serializes pool access,
/// counter increments and session traffic. Creation holds it for the whole
/// bounded wait.
pub struct SharedNode<S: XrceSession> {
    inner: Arc<Mutex<Node<S>>>,
}

impl<S: XrceSession> SharedNode<S> {
    pub fn new(node: Node<S>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(node)),
        }
    }

    /// Run `f` with exclusive access to the node.
    pub fn with<R>(&self, f: impl FnOnce(&mut Node<S>) -> R) -> R {
        let mut node = self.inner.lock();
        f(&mut node)
    }

    pub fn create_entity(
        &self,
        kind: EntityKind,
        type_support: &crate::TypeSupportHandle,
        name: &str,
        qos: &crate::QosProfile,
    ) -> Result<EntityHandle> {
        self.with(|node| node.create_entity(kind, type_support, name, qos))
    }

    pub fn destroy_entity(&self, handle: EntityHandle) -> Result<()> {
        self.with(|node| node.destroy_entity(handle))
    }
}

impl<S: XrceSession> Clone for SharedNode<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}
