// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Type support lookup.
//!
//! A ROS 2 type support handle may carry entries for several typesupport
//! implementations. The XRCE layer accepts the C entry first and falls back
//! to the C++ one. The callbacks themselves are opaque to entity creation:
//! only the DDS type names are read, to render creation profiles.

use crate::entity::EntityKind;
use crate::error::{Error, Result};
use std::sync::Arc;

/// Identifier of the C typesupport for XRCE.
pub const TYPESUPPORT_C_IDENTIFIER: &str = "rosidl_typesupport_microxrcedds_c";
/// Identifier of the C++ typesupport for XRCE.
pub const TYPESUPPORT_CPP_IDENTIFIER: &str = "rosidl_typesupport_microxrcedds_cpp";

/// Whether callbacks describe a message or a request/reply pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeShape {
    Message,
    Service,
}

/// Read-only callback bundle produced by a typesupport library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeCallbacks {
    package: String,
    name: String,
    shape: TypeShape,
}

impl TypeCallbacks {
    /// Callbacks for message `package/msg/name`.
    pub fn message(package: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            name: name.into(),
            shape: TypeShape::Message,
        }
    }

    /// Callbacks for service `package/srv/name`.
    pub fn service(package: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            name: name.into(),
            shape: TypeShape::Service,
        }
    }

    pub fn shape(&self) -> TypeShape {
        self.shape
    }

    /// DDS type name of a message, e.g. `std_msgs::msg::dds_::String_`.
    pub fn message_type_name(&self) -> String {
        format!("{}::msg::dds_::{}_", self.package, self.name)
    }

    /// DDS type name of a service request.
    pub fn request_type_name(&self) -> String {
        format!("{}::srv::dds_::{}_Request_", self.package, self.name)
    }

    /// DDS type name of a service reply.
    pub fn reply_type_name(&self) -> String {
        format!("{}::srv::dds_::{}_Response_", self.package, self.name)
    }

    fn fits(&self, kind: EntityKind) -> bool {
        match self.shape {
            TypeShape::Service => kind.is_service_kind(),
            TypeShape::Message => !kind.is_service_kind(),
        }
    }
}

/// Type support handle as handed over by `rosidl`.
#[derive(Debug, Clone, Default)]
pub struct TypeSupportHandle {
    entries: Vec<(String, Option<Arc<TypeCallbacks>>)>,
}

impl TypeSupportHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry for typesupport `identifier`.
    ///
    /// `callbacks` may be `None`, mirroring a typesupport registered without
    /// data.
    #[must_use]
    pub fn with_entry(
        mut self,
        identifier: impl Into<String>,
        callbacks: Option<TypeCallbacks>,
    ) -> Self {
        self.entries
            .push((identifier.into(), callbacks.map(Arc::new)));
        self
    }

    /// Handle exposing `callbacks` through the C typesupport.
    pub fn xrce_c(callbacks: TypeCallbacks) -> Self {
        Self::new().with_entry(TYPESUPPORT_C_IDENTIFIER, Some(callbacks))
    }

    fn lookup(&self, identifier: &str) -> Option<&Option<Arc<TypeCallbacks>>> {
        self.entries
            .iter()
            .find(|(id, _)| id == identifier)
            .map(|(_, callbacks)| callbacks)
    }

    /// Resolve the callbacks usable for an entity of `kind`.
    pub fn resolve(&self, kind: EntityKind) -> Result<Arc<TypeCallbacks>> {
        let entry = self
            .lookup(TYPESUPPORT_C_IDENTIFIER)
            .or_else(|| self.lookup(TYPESUPPORT_CPP_IDENTIFIER))
            .ok_or(Error::TypeSupportNotFound)?;
        let callbacks = entry.as_ref().ok_or(Error::TypeSupportNotFound)?;
        if !callbacks.fits(kind) {
            return Err(Error::TypeSupportNotFound);
        }
        Ok(Arc::clone(callbacks))
    }
}
