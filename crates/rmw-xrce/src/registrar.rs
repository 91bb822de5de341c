// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Submission of entity operations to the agent session.

use crate::descriptor::Descriptor;
use crate::error::{Error, Result};
use crate::object_id::ObjectId;
use crate::session::{
    CreateOperation, CreationFlags, DeliveryControl, RequestId, StatusCode, StatusWait, StreamId,
    XrceSession,
};
use log::{debug, warn};
use std::time::Duration;

/// Tracks creation requests between submission and resolution.
#[derive(Debug)]
pub struct SessionRegistrar {
    output: StreamId,
    input: StreamId,
    pending: Vec<RequestId>,
}

impl SessionRegistrar {
    /// Registrar writing on `output` and receiving samples on `input`.
    pub fn new(output: StreamId, input: StreamId) -> Self {
        Self {
            output,
            input,
            pending: Vec::new(),
        }
    }

    pub fn output_stream(&self) -> StreamId {
        self.output
    }

    pub fn input_stream(&self) -> StreamId {
        self.input
    }

    /// Creation requests submitted but not yet resolved or abandoned.
    pub fn pending(&self) -> &[RequestId] {
        &self.pending
    }

    /// Queue the creation of `object_id` under `parent_id`. Never blocks.
    ///
    /// Fails with [`Error::NotQueued`] when the session cannot buffer the
    /// operation; nothing becomes pending in that case.
    pub fn submit_creation<S: XrceSession + ?Sized>(
        &mut self,
        session: &mut S,
        object_id: ObjectId,
        descriptor: &Descriptor,
        parent_id: ObjectId,
    ) -> Result<RequestId> {
        let request = session.buffer_create(
            self.output,
            CreateOperation {
                object_id,
                parent_id,
                descriptor,
                flags: CreationFlags::REUSE.union(CreationFlags::REPLACE),
            },
        );
        if !request.is_valid() {
            warn!(
                "[SessionRegistrar::submit_creation] could not queue creation of {}",
                object_id
            );
            return Err(Error::NotQueued(object_id));
        }
        debug!(
            "[SessionRegistrar::submit_creation] {} under {} -> request {}",
            object_id, parent_id, request.0
        );
        self.pending.push(request);
        Ok(request)
    }

    /// Block until every request has a status or `timeout` elapses.
    ///
    /// Resolved requests stop being pending. On timeout they stay pending
    /// until the caller abandons them; they must not be waited on again.
    pub fn await_status<S: XrceSession + ?Sized>(
        &mut self,
        session: &mut S,
        requests: &[RequestId],
        timeout: Duration,
    ) -> Result<Vec<StatusCode>> {
        match session.run_until_all_status(timeout, requests) {
            StatusWait::Resolved(statuses) => {
                self.forget(requests);
                Ok(statuses)
            }
            StatusWait::TimedOut => {
                warn!(
                    "[SessionRegistrar::await_status] no status for {} request(s) after {:?}",
                    requests.len(),
                    timeout
                );
                Err(Error::Timeout)
            }
        }
    }

    /// Drop the correlation for requests whose outcome no longer matters.
    ///
    /// The agent may still create the objects; reconciling them is left to
    /// the session.
    pub fn abandon(&mut self, requests: &[RequestId]) {
        self.forget(requests);
    }

    /// Ask the agent to stream samples of `object_id` continuously.
    ///
    /// Returns `None` when the request could not be queued.
    pub fn request_data<S: XrceSession + ?Sized>(
        &mut self,
        session: &mut S,
        object_id: ObjectId,
    ) -> Option<RequestId> {
        let request = session.buffer_request_data(
            self.output,
            object_id,
            self.input,
            DeliveryControl::unlimited(),
        );
        request.is_valid().then_some(request)
    }

    /// Queue deletion of `object_id` without waiting for the agent.
    pub fn submit_deletion<S: XrceSession + ?Sized>(
        &mut self,
        session: &mut S,
        object_id: ObjectId,
    ) -> bool {
        let request = session.buffer_delete(self.output, object_id);
        if !request.is_valid() {
            warn!(
                "[SessionRegistrar::submit_deletion] could not queue deletion of {}",
                object_id
            );
            return false;
        }
        true
    }

    /// Delete the objects of a failed batch that the agent accepted.
    ///
    /// `statuses` pairs with `objects` by position. Deletions are queued in
    /// reverse creation order and not awaited. Returns how many were queued.
    pub fn discard_partial<S: XrceSession + ?Sized>(
        &mut self,
        session: &mut S,
        objects: &[ObjectId],
        statuses: &[StatusCode],
    ) -> usize {
        let mut queued = 0;
        for (object_id, status) in objects.iter().zip(statuses).rev() {
            if status.is_ok() && self.submit_deletion(session, *object_id) {
                queued += 1;
            }
        }
        queued
    }

    fn forget(&mut self, requests: &[RequestId]) {
        self.pending.retain(|request| !requests.contains(request));
    }
}

/// First non-OK status of a batch, with the object it belongs to.
pub(crate) fn first_rejection(
    objects: &[ObjectId],
    statuses: &[StatusCode],
) -> Option<(ObjectId, StatusCode)> {
    objects
        .iter()
        .zip(statuses)
        .find(|(_, status)| !status.is_ok())
        .map(|(object, status)| (*object, *status))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object_id::ObjectKind;
    use crate::session::{LoopbackSession, Reply, StreamDirection};

    fn registrar() -> SessionRegistrar {
        SessionRegistrar::new(
            StreamId::reliable(0, StreamDirection::Output),
            StreamId::reliable(0, StreamDirection::Input),
        )
    }

    fn participant() -> ObjectId {
        ObjectId::new(0, ObjectKind::Participant)
    }

    #[test]
    fn resolved_requests_leave_pending_set() {
        let mut session = LoopbackSession::new();
        let mut registrar = registrar();
        let descriptor = Descriptor::Xml(heapless::String::new());
        let request = registrar.submit_creation(
            &mut session,
            ObjectId::new(1, ObjectKind::Requester),
            &descriptor,
            participant(),
        )
        .expect("queued");
        assert_eq!(registrar.pending(), &[request]);

        let statuses = registrar
            .await_status(&mut session, &[request], Duration::from_millis(5))
            .expect("resolved");
        assert_eq!(statuses, vec![StatusCode::Ok]);
        assert!(registrar.pending().is_empty());
    }

    #[test]
    fn timeout_keeps_request_until_abandoned() {
        let mut session = LoopbackSession::with_default(Reply::Silent);
        let mut registrar = registrar();
        let descriptor = Descriptor::Xml(heapless::String::new());
        let request = registrar.submit_creation(
            &mut session,
            ObjectId::new(1, ObjectKind::Replier),
            &descriptor,
            participant(),
        )
        .expect("queued");

        let result = registrar.await_status(&mut session, &[request], Duration::from_millis(1));
        assert_eq!(result, Err(Error::Timeout));
        assert_eq!(registrar.pending().len(), 1);

        registrar.abandon(&[request]);
        assert!(registrar.pending().is_empty());
    }

    #[test]
    fn first_rejection_points_at_object() {
        let objects = [
            ObjectId::new(1, ObjectKind::Publisher),
            ObjectId::new(2, ObjectKind::Topic),
            ObjectId::new(3, ObjectKind::DataWriter),
        ];
        let statuses = [
            StatusCode::Ok,
            StatusCode::OkMatched,
            StatusCode::ErrIncompatible,
        ];
        assert_eq!(
            first_rejection(&objects, &statuses),
            Some((objects[2], StatusCode::ErrIncompatible))
        );
        assert_eq!(first_rejection(&objects, &statuses[..2]), None);
    }

    #[test]
    fn refused_creation_fails_without_pending() {
        let mut session = LoopbackSession::new();
        session.refuse_creates(true);
        let mut registrar = registrar();
        let descriptor = Descriptor::Xml(heapless::String::new());
        let object_id = ObjectId::new(1, ObjectKind::Requester);
        let result = registrar.submit_creation(&mut session, object_id, &descriptor, participant());
        assert_eq!(result, Err(Error::NotQueued(object_id)));
        assert!(registrar.pending().is_empty());
    }

    #[test]
    fn discard_partial_deletes_accepted_objects_in_reverse() {
        let mut session = LoopbackSession::new();
        let mut registrar = registrar();
        let objects = [
            ObjectId::new(1, ObjectKind::Subscriber),
            ObjectId::new(2, ObjectKind::Topic),
            ObjectId::new(3, ObjectKind::DataReader),
        ];
        let statuses = [
            StatusCode::Ok,
            StatusCode::OkMatched,
            StatusCode::ErrDenied,
        ];
        let queued = registrar.discard_partial(&mut session, &objects, &statuses);
        assert_eq!(queued, 2);
        let deleted: Vec<_> = session.deletes().collect();
        assert_eq!(deleted, vec![objects[1], objects[0]]);
    }

    #[test]
    fn refused_deletion_reports_false() {
        let mut session = LoopbackSession::new();
        session.refuse_deletes(true);
        let mut registrar = registrar();
        assert!(!registrar.submit_deletion(&mut session, ObjectId::new(4, ObjectKind::DataReader)));
    }
}
