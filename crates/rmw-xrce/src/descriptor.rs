// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Creation descriptors sent to the agent.
//!
//! Two mutually exclusive strategies exist, picked once per node from its
//! configuration:
//!
//! - **Inline profile**: an XML profile rendered into a fixed buffer.
//! - **Precompiled reference**: a token naming a profile already known to
//!   the agent. QoS is part of that profile and is not encoded.
//!
//! Neither strategy truncates: output that does not fit its buffer is an
//! [`EncodingError::Overflow`].

use crate::error::EncodingError;
use crate::object_id::{ObjectId, ObjectKind};
use crate::qos::{History, QosProfile};
use crate::type_support::TypeCallbacks;
use crate::{REF_BUFFER_LENGTH, XML_BUFFER_LENGTH};
use core::fmt::{self, Write};
use serde::Deserialize;
use std::collections::HashMap;

/// Payload of an XRCE create operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Descriptor {
    Xml(heapless::String<XML_BUFFER_LENGTH>),
    Reference(heapless::String<REF_BUFFER_LENGTH>),
}

impl Descriptor {
    pub fn as_str(&self) -> &str {
        match self {
            Descriptor::Xml(xml) => xml.as_str(),
            Descriptor::Reference(token) => token.as_str(),
        }
    }

    pub fn is_reference(&self) -> bool {
        matches!(self, Descriptor::Reference(_))
    }
}

/// Everything a strategy may need to describe one object.
#[derive(Debug, Clone, Copy)]
pub struct DescriptorRequest<'a> {
    pub object_id: ObjectId,
    pub name: &'a str,
    pub callbacks: &'a TypeCallbacks,
    pub qos: &'a QosProfile,
}

/// Descriptor strategy injected into a node.
#[derive(Debug, Clone)]
pub enum DescriptorStrategy {
    InlineProfile(ProfileBuilder),
    Reference(ReferenceTable),
}

impl DescriptorStrategy {
    pub fn build(&self, request: &DescriptorRequest<'_>) -> Result<Descriptor, EncodingError> {
        match self {
            DescriptorStrategy::InlineProfile(builder) => builder.build(request),
            DescriptorStrategy::Reference(table) => table.build(request),
        }
    }

    pub fn mode_name(&self) -> &'static str {
        match self {
            DescriptorStrategy::InlineProfile(_) => "xml",
            DescriptorStrategy::Reference(_) => "refs",
        }
    }
}

impl Default for DescriptorStrategy {
    fn default() -> Self {
        DescriptorStrategy::InlineProfile(ProfileBuilder::default())
    }
}

/// Renders XML creation profiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProfileBuilder {
    limit: usize,
}

impl ProfileBuilder {
    /// Builder accepting profiles of at most `limit` bytes.
    ///
    /// `limit` is clamped to [`XML_BUFFER_LENGTH`].
    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit: limit.min(XML_BUFFER_LENGTH),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn build(&self, request: &DescriptorRequest<'_>) -> Result<Descriptor, EncodingError> {
        let overflow = EncodingError::Overflow {
            capacity: self.limit,
        };
        let mut xml = heapless::String::<XML_BUFFER_LENGTH>::new();
        render(&mut xml, request).map_err(|_| overflow.clone())?;
        if xml.len() > self.limit {
            return Err(overflow);
        }
        Ok(Descriptor::Xml(xml))
    }
}

/// Length of the smallest profile the builder renders: a topic with a
/// one-character name and empty package and type names.
///
/// A profile limit below this rejects every inline creation.
pub fn min_profile_len() -> usize {
    let callbacks = TypeCallbacks::message("", "");
    let request = DescriptorRequest {
        object_id: ObjectId::new(0, ObjectKind::Topic),
        name: "x",
        callbacks: &callbacks,
        qos: &QosProfile::default(),
    };
    let mut xml = heapless::String::<XML_BUFFER_LENGTH>::new();
    // a bare topic profile is far below the buffer capacity
    let _ = render(&mut xml, &request);
    xml.len()
}

impl Default for ProfileBuilder {
    fn default() -> Self {
        Self {
            limit: XML_BUFFER_LENGTH,
        }
    }
}

/// Text with XML markup characters replaced by entity references.
struct Escaped<'a>(&'a str);

impl fmt::Display for Escaped<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for c in self.0.chars() {
            match c {
                '&' => f.write_str("&amp;")?,
                '<' => f.write_str("&lt;")?,
                '>' => f.write_str("&gt;")?,
                '"' => f.write_str("&quot;")?,
                '\'' => f.write_str("&apos;")?,
                _ => f.write_char(c)?,
            }
        }
        Ok(())
    }
}

fn ros_name(name: &str) -> &str {
    name.strip_prefix('/').unwrap_or(name)
}

fn render(out: &mut impl Write, request: &DescriptorRequest<'_>) -> fmt::Result {
    let name = Escaped(ros_name(request.name));
    match request.object_id.kind() {
        ObjectKind::Requester | ObjectKind::Replier => {
            let tag = request.object_id.kind().as_str();
            write!(
                out,
                "<dds><{tag} profile_name=\"{}\" service_name=\"{name}\" \
                 request_type=\"{}\" reply_type=\"{}\">\
                 <request_topic_name>rq/{name}Request</request_topic_name>\
                 <reply_topic_name>rr/{name}Reply</reply_topic_name>\
                 </{tag}></dds>",
                request.object_id.profile_name(),
                Escaped(&request.callbacks.request_type_name()),
                Escaped(&request.callbacks.reply_type_name()),
            )
        }
        ObjectKind::Topic => write!(
            out,
            "<dds><topic><name>rt/{name}</name><dataType>{}</dataType></topic></dds>",
            Escaped(&request.callbacks.message_type_name()),
        ),
        ObjectKind::DataWriter | ObjectKind::DataReader => {
            let tag = request.object_id.kind().as_str();
            write!(
                out,
                "<dds><{tag}><topic><kind>NO_KEY</kind><name>rt/{name}</name>\
                 <dataType>{}</dataType></topic>",
                Escaped(&request.callbacks.message_type_name()),
            )?;
            render_qos(out, request.qos)?;
            write!(out, "</{tag}></dds>")
        }
        // Publisher/subscriber objects are created with an empty profile.
        ObjectKind::Publisher | ObjectKind::Subscriber | ObjectKind::Participant => Ok(()),
    }
}

fn render_qos(out: &mut impl Write, qos: &QosProfile) -> fmt::Result {
    write!(
        out,
        "<qos><reliability><kind>{}</kind></reliability>\
         <durability><kind>{}</kind></durability></qos>",
        qos.reliability_kind(),
        qos.durability_kind(),
    )?;
    match qos.history {
        History::KeepLast(depth) => write!(
            out,
            "<historyQos><kind>KEEP_LAST</kind><depth>{depth}</depth></historyQos>"
        ),
        History::KeepAll => write!(out, "<historyQos><kind>KEEP_ALL</kind></historyQos>"),
    }
}

/// Precompiled profile references known to the agent.
///
/// Entries are keyed by entity name plus an object suffix: `__t` (topic),
/// `__dw` (data writer), `__dr` (data reader), `__rq` (requester) and
/// `__rp` (replier). Publisher and subscriber objects need no reference.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct ReferenceTable {
    entries: HashMap<String, String>,
}

impl ReferenceTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, token: impl Into<String>) {
        self.entries.insert(key.into(), token.into());
    }

    #[must_use]
    pub fn with(mut self, key: impl Into<String>, token: impl Into<String>) -> Self {
        self.insert(key, token);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn extend(&mut self, other: ReferenceTable) {
        self.entries.extend(other.entries);
    }

    fn suffix(kind: ObjectKind) -> Option<&'static str> {
        match kind {
            ObjectKind::Topic => Some("__t"),
            ObjectKind::DataWriter => Some("__dw"),
            ObjectKind::DataReader => Some("__dr"),
            ObjectKind::Requester => Some("__rq"),
            ObjectKind::Replier => Some("__rp"),
            ObjectKind::Publisher | ObjectKind::Subscriber | ObjectKind::Participant => None,
        }
    }

    pub fn build(&self, request: &DescriptorRequest<'_>) -> Result<Descriptor, EncodingError> {
        let Some(suffix) = Self::suffix(request.object_id.kind()) else {
            return Ok(Descriptor::Xml(heapless::String::new()));
        };
        let key = format!("{}{suffix}", ros_name(request.name));
        let token = self
            .entries
            .get(&key)
            .ok_or(EncodingError::UnknownReference(key))?;
        let mut reference = heapless::String::<REF_BUFFER_LENGTH>::new();
        reference
            .push_str(token)
            .map_err(|_| EncodingError::Overflow {
                capacity: REF_BUFFER_LENGTH,
            })?;
        Ok(Descriptor::Reference(reference))
    }
}
