// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Session abstraction over an established DDS-XRCE client session.
//!
//! The entity layer never opens, reconnects or frames anything itself: it
//! buffers operations on a stream and runs the session until the agent has
//! answered. Implementors must handle:
//! - Serializing operations onto the output stream, in submission order
//! - Retransmission on reliable streams
//! - Matching STATUS replies to request ids
//!
//! `buffer_create` returns [`RequestId::INVALID`] when it cannot queue the
//! operation. Objects the agent accepted in a failed batch are deleted again
//! by the registrar, so a session never sees them leak.
//!
//! ## Design Principles
//!
//! - **Non-blocking submission** - `buffer_*` only queue
//! - **Bounded waits** - `run_until_all_status` returns when every request
//!   resolved or the timeout elapsed, whichever comes first

use crate::descriptor::Descriptor;
use crate::object_id::ObjectId;
use core::fmt;
use std::time::Duration;

mod loopback;

pub use loopback::{LoopbackSession, RecordedOp, Reply};

/// Correlation id of a buffered operation. Zero means the operation could
/// not be queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(pub u16);

impl RequestId {
    pub const INVALID: RequestId = RequestId(0);

    pub fn is_valid(self) -> bool {
        self != Self::INVALID
    }
}

/// Direction of a session stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamDirection {
    Input,
    Output,
}

/// XRCE stream identifier (reliable streams have the high bit set).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamId {
    pub raw: u8,
    pub direction: StreamDirection,
}

impl StreamId {
    /// Reliable stream number `index` (0-based).
    pub const fn reliable(index: u8, direction: StreamDirection) -> Self {
        Self {
            raw: 0x80 | (index & 0x7F),
            direction,
        }
    }

    pub const fn is_reliable(&self) -> bool {
        self.raw & 0x80 != 0
    }
}

/// Creation flags: reuse an identical object, replace a different one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreationFlags(pub u8);

impl CreationFlags {
    pub const REUSE: CreationFlags = CreationFlags(0x02);
    pub const REPLACE: CreationFlags = CreationFlags(0x04);

    pub const fn union(self, other: CreationFlags) -> CreationFlags {
        CreationFlags(self.0 | other.0)
    }
}

/// Pacing of a continuous data request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryControl {
    pub max_samples: u16,
    pub max_elapsed_time: u16,
    pub max_bytes_per_second: u16,
    pub min_pace_period: u16,
}

impl DeliveryControl {
    pub const MAX_SAMPLES_UNLIMITED: u16 = 0xFFFF;
    pub const MAX_ELAPSED_TIME_UNLIMITED: u16 = 0;
    pub const MAX_BYTES_PER_SECOND_UNLIMITED: u16 = 0;

    /// Unbounded samples, no pacing, no elapsed-time limit, no bandwidth cap.
    pub const fn unlimited() -> Self {
        Self {
            max_samples: Self::MAX_SAMPLES_UNLIMITED,
            max_elapsed_time: Self::MAX_ELAPSED_TIME_UNLIMITED,
            max_bytes_per_second: Self::MAX_BYTES_PER_SECOND_UNLIMITED,
            min_pace_period: 0,
        }
    }
}

/// A create operation as buffered on the output stream.
#[derive(Debug, Clone, Copy)]
pub struct CreateOperation<'a> {
    pub object_id: ObjectId,
    pub parent_id: ObjectId,
    pub descriptor: &'a Descriptor,
    pub flags: CreationFlags,
}

/// Agent status codes carried by STATUS submessages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusCode {
    Ok,
    OkMatched,
    ErrDdsError,
    ErrMismatch,
    ErrAlreadyExists,
    ErrDenied,
    ErrUnknownReference,
    ErrInvalidData,
    ErrIncompatible,
    ErrResources,
    /// No status received yet
    None,
}

impl StatusCode {
    pub fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            0x00 => Some(Self::Ok),
            0x01 => Some(Self::OkMatched),
            0x80 => Some(Self::ErrDdsError),
            0x81 => Some(Self::ErrMismatch),
            0x82 => Some(Self::ErrAlreadyExists),
            0x83 => Some(Self::ErrDenied),
            0x84 => Some(Self::ErrUnknownReference),
            0x85 => Some(Self::ErrInvalidData),
            0x86 => Some(Self::ErrIncompatible),
            0x87 => Some(Self::ErrResources),
            0xFF => Some(Self::None),
            _ => None,
        }
    }

    pub const fn raw(self) -> u8 {
        match self {
            Self::Ok => 0x00,
            Self::OkMatched => 0x01,
            Self::ErrDdsError => 0x80,
            Self::ErrMismatch => 0x81,
            Self::ErrAlreadyExists => 0x82,
            Self::ErrDenied => 0x83,
            Self::ErrUnknownReference => 0x84,
            Self::ErrInvalidData => 0x85,
            Self::ErrIncompatible => 0x86,
            Self::ErrResources => 0x87,
            Self::None => 0xFF,
        }
    }

    /// `OK_MATCHED` (an identical object already existed) counts as success.
    pub const fn is_ok(self) -> bool {
        matches!(self, Self::Ok | Self::OkMatched)
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Ok => "OK",
            Self::OkMatched => "OK_MATCHED",
            Self::ErrDdsError => "ERR_DDS_ERROR",
            Self::ErrMismatch => "ERR_MISMATCH",
            Self::ErrAlreadyExists => "ERR_ALREADY_EXISTS",
            Self::ErrDenied => "ERR_DENIED",
            Self::ErrUnknownReference => "ERR_UNKNOWN_REFERENCE",
            Self::ErrInvalidData => "ERR_INVALID_DATA",
            Self::ErrIncompatible => "ERR_INCOMPATIBLE",
            Self::ErrResources => "ERR_RESOURCES",
            Self::None => "NONE",
        };
        write!(f, "{} (0x{:02x})", text, self.raw())
    }
}

/// Result of running the session for a batch of requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusWait {
    /// Every request has a status, in request order.
    Resolved(Vec<StatusCode>),
    /// The timeout elapsed first.
    TimedOut,
}

/// Established client session with an XRCE agent.
pub trait XrceSession {
    /// Queue a create operation.
    fn buffer_create(&mut self, stream: StreamId, op: CreateOperation<'_>) -> RequestId;

    /// Queue a delete operation.
    fn buffer_delete(&mut self, stream: StreamId, object_id: ObjectId) -> RequestId;

    /// Queue a continuous read request; samples arrive on `input`.
    fn buffer_request_data(
        &mut self,
        stream: StreamId,
        object_id: ObjectId,
        input: StreamId,
        control: DeliveryControl,
    ) -> RequestId;

    /// Run the session until every request in `requests` has a status or
    /// `timeout` elapses.
    fn run_until_all_status(&mut self, timeout: Duration, requests: &[RequestId]) -> StatusWait;
}

impl<S: XrceSession + ?Sized> XrceSession for Box<S> {
    fn buffer_create(&mut self, stream: StreamId, op: CreateOperation<'_>) -> RequestId {
        (**self).buffer_create(stream, op)
    }

    fn buffer_delete(&mut self, stream: StreamId, object_id: ObjectId) -> RequestId {
        (**self).buffer_delete(stream, object_id)
    }

    fn buffer_request_data(
        &mut self,
        stream: StreamId,
        object_id: ObjectId,
        input: StreamId,
        control: DeliveryControl,
    ) -> RequestId {
        (**self).buffer_request_data(stream, object_id, input, control)
    }

    fn run_until_all_status(&mut self, timeout: Duration, requests: &[RequestId]) -> StatusWait {
        (**self).run_until_all_status(timeout, requests)
    }
}
