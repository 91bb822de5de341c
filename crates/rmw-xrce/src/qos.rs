// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! rmw QoS profile subset rendered into XRCE creation profiles.

/// Reliability policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Reliability {
    #[default]
    Reliable,
    BestEffort,
}

/// Durability policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Durability {
    #[default]
    Volatile,
    TransientLocal,
}

/// History policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum History {
    KeepLast(u32),
    KeepAll,
}

impl Default for History {
    fn default() -> Self {
        History::KeepLast(10)
    }
}

/// QoS profile passed to entity creation.
///
/// Defaults match `rmw_qos_profile_default`: reliable, volatile, keep last 10.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QosProfile {
    pub reliability: Reliability,
    pub durability: Durability,
    pub history: History,
}

impl QosProfile {
    /// Sensor-data profile (best effort, keep last 5).
    pub fn sensor_data() -> Self {
        Self {
            reliability: Reliability::BestEffort,
            durability: Durability::Volatile,
            history: History::KeepLast(5),
        }
    }

    pub(crate) fn reliability_kind(&self) -> &'static str {
        match self.reliability {
            Reliability::Reliable => "RELIABLE",
            Reliability::BestEffort => "BEST_EFFORT",
        }
    }

    pub(crate) fn durability_kind(&self) -> &'static str {
        match self.durability {
            Durability::Volatile => "VOLATILE",
            Durability::TransientLocal => "TRANSIENT_LOCAL",
        }
    }
}
