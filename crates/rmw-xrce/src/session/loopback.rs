// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! In-process session answering from a script (for testing and host demos).

use super::{
    CreateOperation, DeliveryControl, RequestId, StatusCode, StatusWait, StreamId, XrceSession,
};
use crate::object_id::ObjectId;
use std::collections::VecDeque;
use std::time::Duration;

/// Scripted answer to one create operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    /// Agent answers with this status.
    Status(StatusCode),
    /// Agent never answers; waits on this request time out.
    Silent,
    /// Status is lost; the batch resolves without an entry for it.
    Omitted,
}

/// Operation observed by a [`LoopbackSession`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedOp {
    Create {
        request: RequestId,
        object_id: ObjectId,
        parent_id: ObjectId,
        descriptor: String,
        reference: bool,
    },
    Delete {
        request: RequestId,
        object_id: ObjectId,
    },
    RequestData {
        request: RequestId,
        object_id: ObjectId,
        control: DeliveryControl,
    },
}

/// Session that answers create operations locally.
///
/// Replies are taken from the script queue in submission order, falling
/// back to the default reply once the script is exhausted. Silent requests
/// make `run_until_all_status` sleep for the full timeout before reporting
/// [`StatusWait::TimedOut`], as a real session would.
#[derive(Debug)]
pub struct LoopbackSession {
    next_request: u16,
    default_reply: Reply,
    script: VecDeque<Reply>,
    pending: Vec<(RequestId, Reply)>,
    ops: Vec<RecordedOp>,
    refuse_creates: bool,
    refuse_data_requests: bool,
    refuse_deletes: bool,
}

impl LoopbackSession {
    /// Session acknowledging every creation with `OK`.
    pub fn new() -> Self {
        Self::with_default(Reply::Status(StatusCode::Ok))
    }

    pub fn with_default(default_reply: Reply) -> Self {
        Self {
            next_request: 1,
            default_reply,
            script: VecDeque::new(),
            pending: Vec::new(),
            ops: Vec::new(),
            refuse_creates: false,
            refuse_data_requests: false,
            refuse_deletes: false,
        }
    }

    /// Queue replies for the next create operations.
    pub fn script(&mut self, replies: impl IntoIterator<Item = Reply>) {
        self.script.extend(replies);
    }

    /// Make `buffer_create` fail as if the output buffer were full.
    pub fn refuse_creates(&mut self, refuse: bool) {
        self.refuse_creates = refuse;
    }

    /// Make `buffer_request_data` fail as if the output buffer were full.
    pub fn refuse_data_requests(&mut self, refuse: bool) {
        self.refuse_data_requests = refuse;
    }

    /// Make `buffer_delete` fail as if the output buffer were full.
    pub fn refuse_deletes(&mut self, refuse: bool) {
        self.refuse_deletes = refuse;
    }

    /// Every operation buffered so far.
    pub fn ops(&self) -> &[RecordedOp] {
        &self.ops
    }

    pub fn creates(&self) -> impl Iterator<Item = &RecordedOp> {
        self.ops
            .iter()
            .filter(|op| matches!(op, RecordedOp::Create { .. }))
    }

    pub fn deletes(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.ops.iter().filter_map(|op| match op {
            RecordedOp::Delete { object_id, .. } => Some(*object_id),
            _ => None,
        })
    }

    /// Creations still waiting for a status.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    fn allocate_request(&mut self) -> RequestId {
        let request = RequestId(self.next_request);
        self.next_request = self.next_request.checked_add(1).unwrap_or(1);
        request
    }
}

impl Default for LoopbackSession {
    fn default() -> Self {
        Self::new()
    }
}

impl XrceSession for LoopbackSession {
    fn buffer_create(&mut self, _stream: StreamId, op: CreateOperation<'_>) -> RequestId {
        if self.refuse_creates {
            return RequestId::INVALID;
        }
        let request = self.allocate_request();
        let reply = self.script.pop_front().unwrap_or(self.default_reply);
        self.pending.push((request, reply));
        self.ops.push(RecordedOp::Create {
            request,
            object_id: op.object_id,
            parent_id: op.parent_id,
            descriptor: op.descriptor.as_str().to_string(),
            reference: op.descriptor.is_reference(),
        });
        request
    }

    fn buffer_delete(&mut self, _stream: StreamId, object_id: ObjectId) -> RequestId {
        if self.refuse_deletes {
            return RequestId::INVALID;
        }
        let request = self.allocate_request();
        self.ops.push(RecordedOp::Delete { request, object_id });
        request
    }

    fn buffer_request_data(
        &mut self,
        _stream: StreamId,
        object_id: ObjectId,
        _input: StreamId,
        control: DeliveryControl,
    ) -> RequestId {
        if self.refuse_data_requests {
            return RequestId::INVALID;
        }
        let request = self.allocate_request();
        self.ops.push(RecordedOp::RequestData {
            request,
            object_id,
            control,
        });
        request
    }

    fn run_until_all_status(&mut self, timeout: Duration, requests: &[RequestId]) -> StatusWait {
        let mut statuses = Vec::with_capacity(requests.len());
        for request in requests {
            match self.pending.iter().find(|(id, _)| id == request) {
                Some((_, Reply::Status(status))) => statuses.push(*status),
                Some((_, Reply::Omitted)) => {}
                Some((_, Reply::Silent)) | None => {
                    std::thread::sleep(timeout);
                    return StatusWait::TimedOut;
                }
            }
        }
        self.pending.retain(|(id, _)| !requests.contains(id));
        StatusWait::Resolved(statuses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::Descriptor;
    use crate::object_id::ObjectKind;
    use crate::session::{CreationFlags, StreamDirection};

    fn create(session: &mut LoopbackSession, id: u16) -> RequestId {
        let descriptor = Descriptor::Xml(heapless::String::new());
        session.buffer_create(
            StreamId::reliable(0, StreamDirection::Output),
            CreateOperation {
                object_id: ObjectId::new(id, ObjectKind::Requester),
                parent_id: ObjectId::new(0, ObjectKind::Participant),
                descriptor: &descriptor,
                flags: CreationFlags::REUSE.union(CreationFlags::REPLACE),
            },
        )
    }

    #[test]
    fn script_is_consumed_in_order() {
        let mut session = LoopbackSession::new();
        session.script([Reply::Status(StatusCode::ErrDenied)]);
        let first = create(&mut session, 1);
        let second = create(&mut session, 2);

        let wait = session.run_until_all_status(Duration::from_millis(1), &[first, second]);
        assert_eq!(
            wait,
            StatusWait::Resolved(vec![StatusCode::ErrDenied, StatusCode::Ok])
        );
        assert_eq!(session.pending(), 0);
    }

    #[test]
    fn silent_request_times_out() {
        let mut session = LoopbackSession::with_default(Reply::Silent);
        let request = create(&mut session, 1);
        let wait = session.run_until_all_status(Duration::from_millis(1), &[request]);
        assert_eq!(wait, StatusWait::TimedOut);
        assert_eq!(session.pending(), 1);
    }

    #[test]
    fn omitted_status_shortens_batch() {
        let mut session = LoopbackSession::new();
        session.script([Reply::Omitted]);
        let first = create(&mut session, 1);
        let second = create(&mut session, 2);
        let wait = session.run_until_all_status(Duration::from_millis(1), &[first, second]);
        assert_eq!(wait, StatusWait::Resolved(vec![StatusCode::Ok]));
        assert_eq!(session.pending(), 0);
    }

    #[test]
    fn refused_create_is_not_recorded() {
        let mut session = LoopbackSession::new();
        session.refuse_creates(true);
        let request = create(&mut session, 1);
        assert!(!request.is_valid());
        assert_eq!(session.creates().count(), 0);
        assert_eq!(session.pending(), 0);
    }

    #[test]
    fn refused_data_request_is_invalid() {
        let mut session = LoopbackSession::new();
        session.refuse_data_requests(true);
        let request = session.buffer_request_data(
            StreamId::reliable(0, StreamDirection::Output),
            ObjectId::new(1, ObjectKind::DataReader),
            StreamId::reliable(0, StreamDirection::Input),
            DeliveryControl::unlimited(),
        );
        assert!(!request.is_valid());
        assert!(session.ops().is_empty());
    }
}
