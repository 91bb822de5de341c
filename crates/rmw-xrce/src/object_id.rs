// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! XRCE object identifiers and the per-node id generator.
//!
//! An object id is a 12-bit counter value combined with a 4-bit kind tag.
//! On the wire it occupies two bytes:
//!
//! ```text
//! raw[0] = id >> 4
//! raw[1] = (id << 4) | kind
//! ```

use crate::error::{EncodingError, Error, Result};
use crate::GID_STORAGE_SIZE;
use core::fmt;

/// Largest counter value representable in an object id.
pub const OBJECT_ID_MAX: u16 = 0x0FFF;

/// XRCE object kind tags (low nibble of the raw id).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ObjectKind {
    Participant = 0x01,
    Topic = 0x02,
    Publisher = 0x03,
    Subscriber = 0x04,
    DataWriter = 0x05,
    DataReader = 0x06,
    Requester = 0x07,
    Replier = 0x08,
}

impl ObjectKind {
    /// Decode a kind tag.
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0x01 => Some(Self::Participant),
            0x02 => Some(Self::Topic),
            0x03 => Some(Self::Publisher),
            0x04 => Some(Self::Subscriber),
            0x05 => Some(Self::DataWriter),
            0x06 => Some(Self::DataReader),
            0x07 => Some(Self::Requester),
            0x08 => Some(Self::Replier),
            _ => None,
        }
    }

    pub const fn tag(self) -> u8 {
        self as u8
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Participant => "participant",
            Self::Topic => "topic",
            Self::Publisher => "publisher",
            Self::Subscriber => "subscriber",
            Self::DataWriter => "data_writer",
            Self::DataReader => "data_reader",
            Self::Requester => "requester",
            Self::Replier => "replier",
        }
    }
}

/// Wire-level identifier of an agent-side object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectId {
    id: u16,
    kind: ObjectKind,
}

impl ObjectId {
    /// Encoded size on the wire.
    pub const ENCODED_LEN: usize = 2;

    /// Build an object id. Counter bits above 12 are discarded.
    pub const fn new(id: u16, kind: ObjectKind) -> Self {
        Self {
            id: id & OBJECT_ID_MAX,
            kind,
        }
    }

    pub const fn id(&self) -> u16 {
        self.id
    }

    pub const fn kind(&self) -> ObjectKind {
        self.kind
    }

    /// Raw two-byte wire form.
    pub const fn to_raw(&self) -> [u8; 2] {
        [
            (self.id >> 4) as u8,
            (((self.id & 0x0F) as u8) << 4) | self.kind.tag(),
        ]
    }

    /// Decode the raw wire form.
    pub fn from_raw(raw: [u8; 2]) -> Option<Self> {
        let kind = ObjectKind::from_tag(raw[1] & 0x0F)?;
        let id = (u16::from(raw[0]) << 4) | u16::from(raw[1] >> 4);
        Some(Self { id, kind })
    }

    /// Export into a caller-provided opaque buffer.
    ///
    /// The buffer is zero-filled past the encoded bytes. Fails with an
    /// overflow error instead of truncating when the buffer is too small.
    pub fn write_to(&self, buf: &mut [u8]) -> Result<usize> {
        if buf.len() < Self::ENCODED_LEN {
            return Err(Error::Encoding(EncodingError::Overflow {
                capacity: buf.len(),
            }));
        }
        buf.fill(0);
        buf[..Self::ENCODED_LEN].copy_from_slice(&self.to_raw());
        Ok(Self::ENCODED_LEN)
    }

    /// Read back an id exported with [`ObjectId::write_to`].
    pub fn read_from(buf: &[u8]) -> Option<Self> {
        match buf {
            [hi, lo, ..] => Self::from_raw([*hi, *lo]),
            _ => None,
        }
    }

    /// Profile name handed to the agent, e.g. `"7_7"` for requester #7.
    pub fn profile_name(&self) -> heapless::String<20> {
        use core::fmt::Write;
        let mut name = heapless::String::new();
        // "4095_8" always fits in 20 bytes
        let _ = write!(name, "{}_{}", self.id, self.kind.tag());
        name
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.kind.as_str(), self.id)
    }
}

const _: () = assert!(ObjectId::ENCODED_LEN <= GID_STORAGE_SIZE);

/// Fixed-size global identifier exposed through the rmw API.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Gid {
    data: [u8; GID_STORAGE_SIZE],
}

impl Gid {
    pub fn as_bytes(&self) -> &[u8; GID_STORAGE_SIZE] {
        &self.data
    }

    /// Recover the object id stored in this gid.
    pub fn object_id(&self) -> Option<ObjectId> {
        ObjectId::read_from(&self.data)
    }
}

impl From<ObjectId> for Gid {
    fn from(object_id: ObjectId) -> Self {
        let mut data = [0u8; GID_STORAGE_SIZE];
        data[..ObjectId::ENCODED_LEN].copy_from_slice(&object_id.to_raw());
        Self { data }
    }
}

impl fmt::Debug for Gid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Gid({:02x}{:02x})", self.data[0], self.data[1])
    }
}

/// Monotonic object id source owned by a node.
///
/// A single counter is shared by every object kind the node creates. It
/// wraps at [`OBJECT_ID_MAX`]; released ids are not tracked, so a node that
/// creates more than 4096 objects will eventually reuse ids.
#[derive(Debug, Clone)]
pub struct IdGenerator {
    next: u16,
}

impl IdGenerator {
    pub const fn new() -> Self {
        Self { next: 0 }
    }

    /// Start from an arbitrary counter value (used by the participant bootstrap).
    pub const fn starting_at(next: u16) -> Self {
        Self {
            next: next & OBJECT_ID_MAX,
        }
    }

    /// Allocate the next id for `kind`.
    pub fn next(&mut self, kind: ObjectKind) -> ObjectId {
        let id = ObjectId::new(self.next, kind);
        self.next = if self.next == OBJECT_ID_MAX {
            0
        } else {
            self.next + 1
        };
        id
    }

    /// Counter value the next call to [`IdGenerator::next`] will use.
    pub const fn peek(&self) -> u16 {
        self.next
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}
