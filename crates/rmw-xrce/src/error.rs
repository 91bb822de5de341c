// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error types for the XRCE entity layer.

use crate::object_id::ObjectId;
use crate::session::StatusCode;
use crate::EntityKind;
use thiserror::Error;

/// Result type for entity operations
pub type Result<T> = core::result::Result<T, Error>;

/// Coarse error classes reported to rmw callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Null/empty inputs or foreign handles, rejected before any resource is touched
    InvalidArgument,
    /// No free slot in the entity pool
    ResourceExhaustion,
    /// Missing type support, descriptor overflow, bad configuration
    Configuration,
    /// Agent rejected the creation or the acknowledgment timed out
    Protocol,
}

/// Descriptor rendering failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodingError {
    /// Rendered profile does not fit the fixed buffer
    #[error("rendered descriptor exceeds {capacity} bytes")]
    Overflow { capacity: usize },

    /// No precompiled reference registered for the entity name
    #[error("no reference registered for '{0}'")]
    UnknownReference(String),
}

/// Invalid configuration values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{0} pool capacity must be non-zero")]
    ZeroCapacity(EntityKind),

    #[error("{kind} pool capacity {requested} exceeds the limit of {limit}")]
    CapacityTooLarge {
        kind: EntityKind,
        requested: usize,
        limit: usize,
    },

    #[error("creation timeout must be non-zero")]
    ZeroTimeout,

    #[error("gid storage of {storage} bytes cannot hold a {needed}-byte object id")]
    GidStorageTooSmall { storage: usize, needed: usize },

    #[error("profile limit {requested} exceeds the {limit}-byte descriptor buffer")]
    ProfileLimitTooLarge { requested: usize, limit: usize },

    #[error("profile limit {requested} cannot hold the smallest {minimum}-byte profile")]
    ProfileLimitTooSmall { requested: usize, minimum: usize },

    #[error("unknown descriptor mode '{0}'")]
    UnknownDescriptorMode(String),

    #[error("failed to read config file: {0}")]
    Io(String),

    #[error("failed to parse config: {0}")]
    Parse(String),
}

/// Errors raised by entity creation and destruction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("{0}")]
    InvalidArgument(&'static str),

    #[error("no {0} slot available")]
    ResourceExhausted(EntityKind),

    #[error("undefined type support")]
    TypeSupportNotFound,

    #[error("failed to generate creation descriptor: {0}")]
    Encoding(#[from] EncodingError),

    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("agent rejected {object_id}: {status}")]
    Rejected {
        object_id: ObjectId,
        status: StatusCode,
    },

    #[error("session could not queue creation of {0}")]
    NotQueued(ObjectId),

    #[error("timed out waiting for entity creation status")]
    Timeout,
}

impl Error {
    /// Classify the error for rmw return codes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::InvalidArgument(_) => ErrorCategory::InvalidArgument,
            Error::ResourceExhausted(_) => ErrorCategory::ResourceExhaustion,
            Error::TypeSupportNotFound | Error::Encoding(_) | Error::Config(_) => {
                ErrorCategory::Configuration
            }
            Error::Rejected { .. } | Error::NotQueued(_) | Error::Timeout => {
                ErrorCategory::Protocol
            }
        }
    }
}
