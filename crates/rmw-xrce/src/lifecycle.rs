// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Entity creation and destruction.
//!
//! Creation walks a fixed sequence of stages; any failure unwinds what the
//! earlier stages acquired, in reverse order:
//!
//! ```text
//! Init -> SlotAcquired -> IdsAssigned -> DescriptorsBuilt -> Submitted -> Acknowledged
//!   |           |               |                |               |
//!   +-----------+---------------+----------------+---------------+--> Failed
//! ```
//!
//! | Failure                         | Error                 | Rollback                            |
//! |---------------------------------|-----------------------|-------------------------------------|
//! | empty name                      | `InvalidArgument`     | none                                |
//! | pool exhausted                  | `ResourceExhausted`   | none                                |
//! | type support missing            | `TypeSupportNotFound` | slot                                |
//! | descriptor does not fit         | `Encoding`            | slot                                |
//! | session cannot queue a create   | `NotQueued`           | slot, correlation, queued objects   |
//! | agent status not OK             | `Rejected`            | slot, accepted objects              |
//! | fewer statuses than requests    | `Rejected` (`NONE`)   | slot, every object                  |
//! | no status before the timeout    | `Timeout`             | slot, correlation                   |
//!
//! Objects to roll back on the agent are deleted fire-and-forget, in
//! reverse creation order. The record becomes reachable only after the
//! agent acknowledged every object of the entity.

use crate::descriptor::{Descriptor, DescriptorRequest};
use crate::entity::{EntityHandle, EntityKind, EntityRecord, StreamingState};
use crate::error::{Error, Result};
use crate::object_id::{Gid, ObjectId, ObjectKind};
use crate::pool::{EntityPool, SlotHandle};
use crate::qos::QosProfile;
use crate::registrar::{first_rejection, SessionRegistrar};
use crate::session::{RequestId, StatusCode, XrceSession};
use crate::type_support::TypeSupportHandle;
use crate::Node;
use log::{debug, trace, warn};

/// Most objects backing a single entity.
const MAX_OBJECTS_PER_ENTITY: usize = 3;

/// Progress of one creation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CreationStage {
    Init,
    SlotAcquired,
    IdsAssigned,
    DescriptorsBuilt,
    Submitted,
    Acknowledged,
    Failed,
}

/// Owned slot that returns to its pool unless committed.
struct SlotGuard<'a> {
    pool: &'a mut EntityPool<EntityRecord>,
    handle: SlotHandle,
    armed: bool,
}

impl<'a> SlotGuard<'a> {
    fn acquire(pool: &'a mut EntityPool<EntityRecord>) -> Option<Self> {
        let handle = pool.acquire()?;
        Some(Self {
            pool,
            handle,
            armed: true,
        })
    }

    fn commit(mut self, record: EntityRecord) -> SlotHandle {
        let committed = self.pool.commit(self.handle, record).is_ok();
        debug_assert!(committed, "guarded slot lost ownership");
        self.armed = false;
        self.handle
    }
}

impl Drop for SlotGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            trace!("[SlotGuard::drop] releasing slot {}", self.handle.index());
            self.pool.release(self.handle);
        }
    }
}

fn validate_name(kind: EntityKind, name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::InvalidArgument(if kind.is_service_kind() {
            "service name is null or empty string"
        } else {
            "topic name is null or empty string"
        }));
    }
    let valid = name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '/' | '~' | '{' | '}'));
    if !valid {
        return Err(Error::InvalidArgument("name contains invalid characters"));
    }
    Ok(())
}

/// Queue deletion of every object in `objects`, last first.
fn discard_all<S: XrceSession + ?Sized>(
    registrar: &mut SessionRegistrar,
    session: &mut S,
    objects: &[ObjectId],
) {
    for object_id in objects.iter().rev() {
        registrar.submit_deletion(session, *object_id);
    }
}

/// Parent of object `index` in an entity plan.
fn parent_of(objects: &[ObjectId], index: usize, participant: ObjectId) -> ObjectId {
    match objects[index].kind() {
        ObjectKind::DataWriter | ObjectKind::DataReader => objects[0],
        _ => participant,
    }
}

impl<S: XrceSession> Node<S> {
    /// Create an entity of `kind` on the agent.
    ///
    /// Blocks until the agent acknowledged every object of the entity or the
    /// configured creation timeout elapsed. On error nothing stays
    /// allocated in the node's pools.
    pub fn create_entity(
        &mut self,
        kind: EntityKind,
        type_support: &TypeSupportHandle,
        name: &str,
        qos: &QosProfile,
    ) -> Result<EntityHandle> {
        validate_name(kind, name)?;

        let mut stage = CreationStage::Init;
        let result = self.create_staged(kind, type_support, name, qos, &mut stage);
        if let Err(e) = &result {
            warn!(
                "[create_entity] {} '{}' failed after {:?}: {}",
                kind, name, stage, e
            );
            advance(&mut stage, CreationStage::Failed, kind, name);
        }
        result
    }

    /// Creation body; `stage` is left at the last stage reached.
    pub(crate) fn create_staged(
        &mut self,
        kind: EntityKind,
        type_support: &TypeSupportHandle,
        name: &str,
        qos: &QosProfile,
        stage: &mut CreationStage,
    ) -> Result<EntityHandle> {
        let Node {
            participant_id,
            session,
            registrar,
            ids,
            pools,
            descriptors,
            config,
            ..
        } = self;
        let participant_id = *participant_id;
        let timeout = config.creation_timeout();

        let guard = SlotGuard::acquire(pools.get_mut(kind)).ok_or_else(|| {
            warn!("[create_entity] no free {} slot for '{}'", kind, name);
            Error::ResourceExhausted(kind)
        })?;
        advance(stage, CreationStage::SlotAcquired, kind, name);

        let mut objects = heapless::Vec::<ObjectId, MAX_OBJECTS_PER_ENTITY>::new();
        for object_kind in kind.object_plan() {
            // plans never exceed MAX_OBJECTS_PER_ENTITY
            let _ = objects.push(ids.next(*object_kind));
        }
        advance(stage, CreationStage::IdsAssigned, kind, name);

        let callbacks = type_support.resolve(kind).map_err(|e| {
            warn!("[create_entity] undefined type support for {} '{}'", kind, name);
            e
        })?;

        let mut built = heapless::Vec::<Descriptor, MAX_OBJECTS_PER_ENTITY>::new();
        for object_id in &objects {
            let descriptor = descriptors
                .build(&DescriptorRequest {
                    object_id: *object_id,
                    name,
                    callbacks: &callbacks,
                    qos,
                })
                .map_err(|e| {
                    warn!("[create_entity] {} for '{}': {}", object_id, name, e);
                    e
                })?;
            let _ = built.push(descriptor);
        }
        advance(stage, CreationStage::DescriptorsBuilt, kind, name);

        let mut requests = heapless::Vec::<RequestId, MAX_OBJECTS_PER_ENTITY>::new();
        for (index, (object_id, descriptor)) in objects.iter().zip(&built).enumerate() {
            let parent = parent_of(&objects, index, participant_id);
            match registrar.submit_creation(session, *object_id, descriptor, parent) {
                Ok(request) => {
                    let _ = requests.push(request);
                }
                Err(e) => {
                    registrar.abandon(&requests);
                    discard_all(registrar, session, &objects[..requests.len()]);
                    return Err(e);
                }
            }
        }
        advance(stage, CreationStage::Submitted, kind, name);

        let statuses = match registrar.await_status(session, &requests, timeout) {
            Ok(statuses) => statuses,
            Err(e) => {
                registrar.abandon(&requests);
                return Err(e);
            }
        };
        if statuses.len() != requests.len() {
            warn!(
                "[create_entity] session answered {} of {} requests",
                statuses.len(),
                requests.len()
            );
            discard_all(registrar, session, &objects);
            return Err(Error::Rejected {
                object_id: objects[statuses.len().min(objects.len() - 1)],
                status: StatusCode::None,
            });
        }
        if let Some((object_id, status)) = first_rejection(&objects, &statuses) {
            warn!(
                "[create_entity] agent rejected {} for '{}': {}",
                object_id, name, status
            );
            registrar.discard_partial(session, &objects, &statuses);
            return Err(Error::Rejected { object_id, status });
        }
        advance(stage, CreationStage::Acknowledged, kind, name);

        let Some((&object_id, parent_ids)) = objects.split_last() else {
            return Err(Error::InvalidArgument("entity kind has no objects"));
        };

        let streaming = if kind.receives_data() {
            match registrar.request_data(session, object_id) {
                Some(request) => StreamingState::Requested(request),
                None => {
                    warn!(
                        "[create_entity] {} '{}' created but data request not queued",
                        kind, name
                    );
                    StreamingState::NotStreaming
                }
            }
        } else {
            StreamingState::NotApplicable
        };

        let mut parents = heapless::Vec::new();
        for parent in parent_ids {
            let _ = parents.push(*parent);
        }

        let record = EntityRecord {
            owner: participant_id,
            kind,
            name: name.to_string(),
            object_id,
            parents,
            gid: Gid::from(object_id),
            type_callbacks: callbacks,
            streaming,
            history_write_index: 0,
            history_read_index: 0,
        };
        let slot = guard.commit(record);
        debug!("[create_entity] {} '{}' -> {}", kind, name, object_id);
        Ok(EntityHandle { kind, slot })
    }

    /// Destroy an entity.
    ///
    /// The slot is released immediately. Deletion of the agent objects is
    /// queued without waiting for an answer; a deletion that cannot be
    /// queued is logged and otherwise ignored.
    pub fn destroy_entity(&mut self, handle: EntityHandle) -> Result<()> {
        let record = self
            .pools
            .get_mut(handle.kind)
            .take(handle.slot)
            .ok_or(Error::InvalidArgument("entity handle is not live on this node"))?;

        for object_id in record.objects().rev() {
            self.registrar.submit_deletion(&mut self.session, object_id);
        }
        debug!(
            "[destroy_entity] {} '{}' ({})",
            record.kind, record.name, record.object_id
        );
        Ok(())
    }

    /// Retry the continuous data request of an entity left not streaming.
    pub fn request_data(&mut self, handle: EntityHandle) -> Result<StreamingState> {
        let record = self
            .pools
            .get_mut(handle.kind)
            .get_mut(handle.slot)
            .ok_or(Error::InvalidArgument("entity handle is not live on this node"))?;
        if matches!(record.streaming, StreamingState::NotStreaming) {
            if let Some(request) = self
                .registrar
                .request_data(&mut self.session, record.object_id)
            {
                record.streaming = StreamingState::Requested(request);
            }
        }
        Ok(record.streaming)
    }
}

fn advance(stage: &mut CreationStage, next: CreationStage, kind: EntityKind, name: &str) {
    trace!("[create_entity] {} '{}': {:?} -> {:?}", kind, name, stage, next);
    *stage = next;
}
