// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Registry configuration.
//!
//! Supports both programmatic and file-based configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::accessor::AccessorPolicy;
use crate::error::ConfigError;

/// Layout registry configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Writer variant used by `FieldAccessor::write` and constructors.
    #[serde(default)]
    pub default_policy: AccessorPolicy,

    /// Longest accepted inclusion chain, the declared type included.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Invalidate descendants of a superseded layout.
    #[serde(default = "default_true")]
    pub invalidate_descendants_on_supersede: bool,

    /// Warn when a layout is superseded or clobbered.
    #[serde(default = "default_true")]
    pub log_redefinitions: bool,
}

fn default_max_depth() -> usize {
    64
}

fn default_true() -> bool {
    true
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            default_policy: AccessorPolicy::Safe,
            max_depth: default_max_depth(),
            invalidate_descendants_on_supersede: true,
            log_redefinitions: true,
        }
    }
}

impl RegistryConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_depth == 0 {
            return Err(ConfigError::Invalid(
                "max_depth must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
