// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Node configuration for rmw_xrce.
//!
//! Values come from built-in defaults, an optional YAML file, then
//! environment variables (later sources win):
//!
//! ## Pools
//! - `RMW_XRCE_MAX_CLIENTS`: client slots per node (default: 4)
//! - `RMW_XRCE_MAX_SERVICES`: service slots per node (default: 4)
//! - `RMW_XRCE_MAX_PUBLISHERS`: publisher slots per node (default: 4)
//! - `RMW_XRCE_MAX_SUBSCRIPTIONS`: subscription slots per node (default: 4)
//!
//! ## Agent
//! - `RMW_XRCE_CREATION_TIMEOUT_MS`: bounded wait for creation status (default: 1000)
//! - `RMW_XRCE_DESCRIPTOR_MODE`: `xml` (inline profiles) or `refs` (precompiled references)
//! - `RMW_XRCE_REFS_FILE`: YAML map of reference keys to tokens (refs mode)
//!
//! ## General
//! - `RMW_XRCE_CONFIG_FILE`: YAML file with any of the fields below
//! - `RMW_XRCE_LOG_LEVEL`: logging level (default: "info")
//!
//! # Example
//!
//! ```yaml
//! max_clients: 8
//! creation_timeout_ms: 250
//! descriptor_mode: refs
//! references:
//!   add_two_ints__rq: add_two_ints_requester
//! ```

use crate::descriptor::{min_profile_len, DescriptorStrategy, ProfileBuilder, ReferenceTable};
use crate::entity::EntityKind;
use crate::error::ConfigError;
use crate::object_id::ObjectId;
use crate::pool::MAX_POOL_CAPACITY;
use crate::{DEFAULT_CREATION_TIMEOUT_MS, GID_STORAGE_SIZE, XML_BUFFER_LENGTH};
use log::warn;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

pub const ENV_MAX_CLIENTS: &str = "RMW_XRCE_MAX_CLIENTS";
pub const ENV_MAX_SERVICES: &str = "RMW_XRCE_MAX_SERVICES";
pub const ENV_MAX_PUBLISHERS: &str = "RMW_XRCE_MAX_PUBLISHERS";
pub const ENV_MAX_SUBSCRIPTIONS: &str = "RMW_XRCE_MAX_SUBSCRIPTIONS";
pub const ENV_CREATION_TIMEOUT_MS: &str = "RMW_XRCE_CREATION_TIMEOUT_MS";
pub const ENV_DESCRIPTOR_MODE: &str = "RMW_XRCE_DESCRIPTOR_MODE";
pub const ENV_REFS_FILE: &str = "RMW_XRCE_REFS_FILE";
pub const ENV_CONFIG_FILE: &str = "RMW_XRCE_CONFIG_FILE";
pub const ENV_LOG_LEVEL: &str = "RMW_XRCE_LOG_LEVEL";

/// How creation descriptors are produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DescriptorMode {
    #[default]
    Xml,
    Refs,
}

impl FromStr for DescriptorMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "xml" => Ok(DescriptorMode::Xml),
            "refs" | "ref" => Ok(DescriptorMode::Refs),
            other => Err(ConfigError::UnknownDescriptorMode(other.to_string())),
        }
    }
}

/// Configuration of one node.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct XrceConfig {
    pub max_clients: usize,
    pub max_services: usize,
    pub max_publishers: usize,
    pub max_subscriptions: usize,

    /// Bounded wait for creation acknowledgments
    pub creation_timeout_ms: u64,

    pub descriptor_mode: DescriptorMode,

    /// Largest XML profile accepted (at most the fixed descriptor buffer)
    pub profile_limit: usize,

    /// Bytes available to store an exported object id
    pub gid_storage_size: usize,

    /// Inline references (refs mode)
    pub references: ReferenceTable,

    /// YAML file with more references (refs mode)
    pub references_file: Option<String>,

    /// Logging level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for XrceConfig {
    fn default() -> Self {
        Self {
            max_clients: 4,
            max_services: 4,
            max_publishers: 4,
            max_subscriptions: 4,
            creation_timeout_ms: DEFAULT_CREATION_TIMEOUT_MS,
            descriptor_mode: DescriptorMode::Xml,
            profile_limit: XML_BUFFER_LENGTH,
            gid_storage_size: GID_STORAGE_SIZE,
            references: ReferenceTable::default(),
            references_file: None,
            log_level: "info".to_string(),
        }
    }
}

fn env_number<T: FromStr>(name: &str) -> Option<T> {
    let raw = env::var(name).ok().filter(|s| !s.is_empty())?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("[rmw_xrce] ignoring {}={:?}: not a number", name, raw);
            None
        }
    }
}

impl XrceConfig {
    /// Parse a YAML document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(yaml).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load a YAML config file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;
        Self::from_yaml_str(&text)
    }

    /// Load configuration from `RMW_XRCE_CONFIG_FILE` and environment overrides.
    ///
    /// Unparseable values are logged and ignored; a broken config file is
    /// reported.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = match env::var(ENV_CONFIG_FILE).ok().filter(|s| !s.is_empty()) {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };

        if let Some(v) = env_number(ENV_MAX_CLIENTS) {
            config.max_clients = v;
        }
        if let Some(v) = env_number(ENV_MAX_SERVICES) {
            config.max_services = v;
        }
        if let Some(v) = env_number(ENV_MAX_PUBLISHERS) {
            config.max_publishers = v;
        }
        if let Some(v) = env_number(ENV_MAX_SUBSCRIPTIONS) {
            config.max_subscriptions = v;
        }
        if let Some(v) = env_number(ENV_CREATION_TIMEOUT_MS) {
            config.creation_timeout_ms = v;
        }

        if let Some(mode) = env::var(ENV_DESCRIPTOR_MODE).ok().filter(|s| !s.is_empty()) {
            match mode.parse() {
                Ok(mode) => config.descriptor_mode = mode,
                Err(e) => warn!("[rmw_xrce] {}: {}", ENV_DESCRIPTOR_MODE, e),
            }
        }

        if let Some(path) = env::var(ENV_REFS_FILE).ok().filter(|s| !s.is_empty()) {
            config.references_file = Some(path);
        }

        if let Some(level) = env::var(ENV_LOG_LEVEL).ok().filter(|s| !s.is_empty()) {
            config.log_level = level;
        }

        Ok(config)
    }

    /// Pool capacity for `kind`.
    pub fn capacity(&self, kind: EntityKind) -> usize {
        match kind {
            EntityKind::Client => self.max_clients,
            EntityKind::Service => self.max_services,
            EntityKind::Publisher => self.max_publishers,
            EntityKind::Subscription => self.max_subscriptions,
        }
    }

    pub fn creation_timeout(&self) -> Duration {
        Duration::from_millis(self.creation_timeout_ms)
    }

    /// Reject configurations a node cannot be built from.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for kind in EntityKind::ALL {
            let capacity = self.capacity(kind);
            if capacity == 0 {
                return Err(ConfigError::ZeroCapacity(kind));
            }
            if capacity > MAX_POOL_CAPACITY {
                return Err(ConfigError::CapacityTooLarge {
                    kind,
                    requested: capacity,
                    limit: MAX_POOL_CAPACITY,
                });
            }
        }
        if self.creation_timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        if self.gid_storage_size < ObjectId::ENCODED_LEN {
            return Err(ConfigError::GidStorageTooSmall {
                storage: self.gid_storage_size,
                needed: ObjectId::ENCODED_LEN,
            });
        }
        let minimum = min_profile_len();
        if self.profile_limit < minimum {
            return Err(ConfigError::ProfileLimitTooSmall {
                requested: self.profile_limit,
                minimum,
            });
        }
        if self.profile_limit > XML_BUFFER_LENGTH {
            return Err(ConfigError::ProfileLimitTooLarge {
                requested: self.profile_limit,
                limit: XML_BUFFER_LENGTH,
            });
        }
        Ok(())
    }

    /// Build the descriptor strategy selected by this configuration.
    pub fn descriptor_strategy(&self) -> Result<DescriptorStrategy, ConfigError> {
        match self.descriptor_mode {
            DescriptorMode::Xml => Ok(DescriptorStrategy::InlineProfile(
                ProfileBuilder::with_limit(self.profile_limit),
            )),
            DescriptorMode::Refs => {
                let mut table = self.references.clone();
                if let Some(path) = &self.references_file {
                    let text =
                        fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;
                    let extra: ReferenceTable = serde_yaml::from_str(&text)
                        .map_err(|e| ConfigError::Parse(e.to_string()))?;
                    table.extend(extra);
                }
                if table.is_empty() {
                    warn!("[rmw_xrce] refs mode selected but no references are registered");
                }
                Ok(DescriptorStrategy::Reference(table))
            }
        }
    }

    /// Apply log level to the logging subsystem
    pub fn apply_log_level(&self) {
        if let Err(e) = env::var("RUST_LOG") {
            // Only set if RUST_LOG is not already set
            if e == env::VarError::NotPresent {
                env::set_var("RUST_LOG", &self.log_level);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = XrceConfig::default();
        assert_eq!(config.capacity(EntityKind::Client), 4);
        assert_eq!(config.creation_timeout(), Duration::from_millis(1000));
        assert_eq!(config.descriptor_mode, DescriptorMode::Xml);
        config.validate().expect("defaults are valid");
    }

    #[test]
    fn test_yaml_overrides_defaults() {
        let config = XrceConfig::from_yaml_str(
            "max_services: 2\ncreation_timeout_ms: 250\ndescriptor_mode: refs\n\
             references:\n  add_two_ints__rp: add_two_ints_replier\n",
        )
        .expect("valid yaml");
        assert_eq!(config.max_services, 2);
        assert_eq!(config.max_clients, 4);
        assert_eq!(config.creation_timeout_ms, 250);
        assert_eq!(config.descriptor_mode, DescriptorMode::Refs);
        assert_eq!(config.references.len(), 1);
    }

    #[test]
    fn test_unknown_yaml_field_is_rejected() {
        let err = XrceConfig::from_yaml_str("max_nodes: 3\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_descriptor_mode_parsing() {
        assert_eq!("XML".parse::<DescriptorMode>(), Ok(DescriptorMode::Xml));
        assert_eq!("refs".parse::<DescriptorMode>(), Ok(DescriptorMode::Refs));
        assert_eq!(
            "dds".parse::<DescriptorMode>(),
            Err(ConfigError::UnknownDescriptorMode("dds".to_string()))
        );
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = XrceConfig {
            max_publishers: 0,
            ..XrceConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::ZeroCapacity(EntityKind::Publisher))
        );

        config.max_publishers = 1;
        config.gid_storage_size = 1;
        assert_eq!(
            config.validate(),
            Err(ConfigError::GidStorageTooSmall {
                storage: 1,
                needed: 2
            })
        );

        config.gid_storage_size = GID_STORAGE_SIZE;
        config.creation_timeout_ms = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroTimeout));

        config.creation_timeout_ms = 10;
        config.profile_limit = XML_BUFFER_LENGTH + 1;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ProfileLimitTooLarge { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_profile_limit_below_smallest_profile() {
        let minimum = min_profile_len();
        assert!(minimum > 0);

        let mut config = XrceConfig {
            profile_limit: 0,
            ..XrceConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::ProfileLimitTooSmall {
                requested: 0,
                minimum
            })
        );

        config.profile_limit = minimum - 1;
        assert!(config.validate().is_err());

        config.profile_limit = minimum;
        config.validate().expect("smallest profile fits");
    }

    #[test]
    fn test_from_env_with_capacity_override() {
        let prev = env::var(ENV_MAX_CLIENTS).ok();
        env::set_var(ENV_MAX_CLIENTS, "9");

        let config = XrceConfig::from_env().expect("config");
        assert_eq!(config.max_clients, 9);

        // Restore
        if let Some(v) = prev {
            env::set_var(ENV_MAX_CLIENTS, v);
        } else {
            env::remove_var(ENV_MAX_CLIENTS);
        }
    }

    #[test]
    fn test_from_env_ignores_garbage_numbers() {
        let prev = env::var(ENV_CREATION_TIMEOUT_MS).ok();
        env::set_var(ENV_CREATION_TIMEOUT_MS, "soon");

        let config = XrceConfig::from_env().expect("config");
        assert_eq!(config.creation_timeout_ms, DEFAULT_CREATION_TIMEOUT_MS);

        // Restore
        if let Some(v) = prev {
            env::set_var(ENV_CREATION_TIMEOUT_MS, v);
        } else {
            env::remove_var(ENV_CREATION_TIMEOUT_MS);
        }
    }
}
