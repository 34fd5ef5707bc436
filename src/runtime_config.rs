//! # Runtime Configuration Module
//!
//! Environment and file based configuration for the bridge.
//!
//! ## Environment Variables
//!
//! ### `BRRTR_BRIDGE_BUFFER_SIZE`
//!
//! Maximum size of one body chunk written by the emitter. Accepts decimal
//! (`1048576`) or hexadecimal (`0x100000`). Default: 8 MiB.
//!
//! ### `BRRTR_STACK_SIZE`
//!
//! Stack size for the coroutines serving requests, same formats. Default: `0x4000` (16 KB).
//!
//! ### `BRRTR_BRIDGE_SCRIPT_NAME`
//!
//! Value reported to applications as the `SCRIPT_NAME` server variable. Defaults to the
//! process's invocation name.
//!
//! ## Configuration File
//!
//! ```yaml
//! buffer_size: 1048576
//! stack_size: 32768
//! script_name: /srv/app
//! ```
//!
//! Environment variables override values read from the file.

use crate::server::{DefaultEmitterFactory, EngineRequestFactory, DEFAULT_BUFFER_SIZE};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;
use std::path::Path;

const DEFAULT_STACK_SIZE: usize = 0x4000;

/// Bridge configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Emitter chunk size in bytes (default: 8 MiB)
    pub buffer_size: usize,
    /// Coroutine stack size in bytes (default: 16 KB / 0x4000)
    pub stack_size: usize,
    /// `SCRIPT_NAME` override; `None` uses argv\[0\]
    pub script_name: Option<String>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
            stack_size: DEFAULT_STACK_SIZE,
            script_name: None,
        }
    }
}

impl BridgeConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_overrides(|key| env::var(key).ok());
        config
    }

    /// Load a YAML file, then apply environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid YAML.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read bridge config {}", path.display()))?;
        let mut config: Self = serde_yaml::from_str(&raw)
            .with_context(|| format!("Failed to parse bridge config {}", path.display()))?;
        config.apply_overrides(|key| env::var(key).ok());
        Ok(config)
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(size) = lookup("BRRTR_BRIDGE_BUFFER_SIZE").and_then(|v| parse_size(&v)) {
            self.buffer_size = size;
        }
        if let Some(size) = lookup("BRRTR_STACK_SIZE").and_then(|v| parse_size(&v)) {
            self.stack_size = size;
        }
        if let Some(name) = lookup("BRRTR_BRIDGE_SCRIPT_NAME") {
            self.script_name = Some(name);
        }
    }

    pub fn emitter_factory(&self) -> DefaultEmitterFactory {
        DefaultEmitterFactory::new(self.buffer_size)
    }

    pub fn request_factory(&self) -> EngineRequestFactory {
        match &self.script_name {
            Some(name) => EngineRequestFactory::new(name.as_str()),
            None => EngineRequestFactory::from_process_args(),
        }
    }

    /// Apply the stack size to the `may` runtime. Call before starting a server.
    pub fn apply_runtime(&self) {
        may::config().set_stack_size(self.stack_size);
    }
}

/// Parse a decimal or `0x` hexadecimal size; zero and garbage are rejected.
fn parse_size(val: &str) -> Option<usize> {
    let val = val.trim();
    let parsed = if let Some(hex) = val.strip_prefix("0x") {
        usize::from_str_radix(hex, 16).ok()
    } else {
        val.parse().ok()
    };
    parsed.filter(|size| *size > 0)
}
