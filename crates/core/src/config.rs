//! STM configuration
//!
//! Ring capacity and signature width are fixed when an `Stm` is built and shared
//! by every transaction that runs against it.
//!
//! ```ignore
//! let config = StmConfig::new()
//!     .ring_capacity(256)
//!     .signature_bits(2048)
//!     .spin_limit(1_000_000);
//! config.validate()?;
//! ```
//!
//! The same settings can be loaded from TOML:
//!
//! ```toml
//! ring_capacity = 256
//! signature_bits = 2048
//! spin_limit = 1000000
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default number of ring slots
pub const DEFAULT_RING_CAPACITY: usize = 1024;

/// Default signature width in bits
pub const DEFAULT_SIGNATURE_BITS: usize = 1024;

/// Process-wide STM settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StmConfig {
    /// Number of ring slots; must be a power of two, at least 2
    pub ring_capacity: usize,

    /// Signature width in bits; must be a non-zero multiple of 64
    pub signature_bits: usize,

    /// Upper bound on iterations of any single busy-wait
    ///
    /// `None` spins until the awaited slot is published. Tests set a bound so
    /// that a protocol bug shows up as an abort instead of a hang.
    pub spin_limit: Option<u64>,
}

impl StmConfig {
    /// Create a config with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the ring capacity
    pub fn ring_capacity(mut self, capacity: usize) -> Self {
        self.ring_capacity = capacity;
        self
    }

    /// Set the signature width in bits
    pub fn signature_bits(mut self, bits: usize) -> Self {
        self.signature_bits = bits;
        self
    }

    /// Bound every busy-wait to `limit` iterations
    pub fn spin_limit(mut self, limit: u64) -> Self {
        self.spin_limit = Some(limit);
        self
    }

    /// Check that the settings are usable
    pub fn validate(&self) -> Result<()> {
        if self.ring_capacity < 2 || !self.ring_capacity.is_power_of_two() {
            return Err(Error::InvalidConfig(format!(
                "ring_capacity must be a power of two >= 2, got {}",
                self.ring_capacity
            )));
        }
        if self.signature_bits == 0 || self.signature_bits % 64 != 0 {
            return Err(Error::InvalidConfig(format!(
                "signature_bits must be a non-zero multiple of 64, got {}",
                self.signature_bits
            )));
        }
        if self.spin_limit == Some(0) {
            return Err(Error::InvalidConfig("spin_limit must be positive".into()));
        }
        Ok(())
    }

    /// Parse a TOML document; missing keys keep their defaults
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: StmConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Render as TOML
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string(self)?)
    }
}

impl Default for StmConfig {
    fn default() -> Self {
        Self {
            ring_capacity: DEFAULT_RING_CAPACITY,
            signature_bits: DEFAULT_SIGNATURE_BITS,
            spin_limit: None,
        }
    }
}
