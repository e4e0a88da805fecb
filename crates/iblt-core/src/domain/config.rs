//! IBLT configuration and validation
//!
//! The configuration is a plain settings record supplied by the caller;
//! parsing it from files or environment is left to the host.
//!
//! # Example
//!
//! ```
//! use iblt_core::domain::IbltConfigBuilder;
//!
//! let config = IbltConfigBuilder::new()
//!     .size(200)
//!     .hash_count(3)
//!     .seed(7)
//!     .build()
//!     .expect("valid config");
//! assert_eq!(config.size, 200);
//! ```

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::error::IbltError;

/// IBLT configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IbltConfig {
    /// Number of cells
    pub size: usize,
    /// Number of cells each pair maps to (typically 3-5)
    pub hash_count: usize,
    /// Seed selecting the hash family
    pub seed: u32,
}

impl Default for IbltConfig {
    fn default() -> Self {
        Self {
            size: 100,
            hash_count: 4,
            seed: 0,
        }
    }
}

impl IbltConfig {
    /// Create a new configuration with validation
    pub fn new(size: usize, hash_count: usize, seed: u32) -> Result<Self, IbltError> {
        let config = Self {
            size,
            hash_count,
            seed,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate table dimensions
    ///
    /// Only zero dimensions are rejected. A `hash_count` above `size` is
    /// accepted; keys then map to some cells more than once.
    pub fn validate(&self) -> Result<(), IbltError> {
        if self.size == 0 {
            return Err(IbltError::invalid_config("size must be positive"));
        }

        if self.hash_count == 0 {
            return Err(IbltError::invalid_config("hash_count must be positive"));
        }

        Ok(())
    }

    /// Builder-style method to set the cell count
    pub fn with_size(mut self, size: usize) -> Self {
        self.size = size;
        self
    }

    /// Builder-style method to set the hash count
    pub fn with_hash_count(mut self, hash_count: usize) -> Self {
        self.hash_count = hash_count;
        self
    }

    /// Builder-style method to set the seed
    pub fn with_seed(mut self, seed: u32) -> Self {
        self.seed = seed;
        self
    }
}

/// Builder for IbltConfig with validation
#[derive(Default)]
pub struct IbltConfigBuilder {
    size: Option<usize>,
    hash_count: Option<usize>,
    seed: Option<u32>,
}

impl IbltConfigBuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of cells
    pub fn size(mut self, size: usize) -> Self {
        self.size = Some(size);
        self
    }

    /// Set the number of hash functions
    pub fn hash_count(mut self, hash_count: usize) -> Self {
        self.hash_count = Some(hash_count);
        self
    }

    /// Set an explicit seed
    pub fn seed(mut self, seed: u32) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Derive the seed from the wall clock (seconds since the Unix epoch)
    ///
    /// Tables built this way are not reproducible across runs.
    pub fn seed_from_clock(mut self) -> Self {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        self.seed = Some(secs as u32);
        self
    }

    /// Build the IbltConfig, validating all parameters
    pub fn build(self) -> Result<IbltConfig, IbltError> {
        let config = self.build_unchecked();
        config.validate()?;
        Ok(config)
    }

    /// Build without validation
    pub fn build_unchecked(self) -> IbltConfig {
        let defaults = IbltConfig::default();

        IbltConfig {
            size: self.size.unwrap_or(defaults.size),
            hash_count: self.hash_count.unwrap_or(defaults.hash_count),
            seed: self.seed.unwrap_or(defaults.seed),
        }
    }
}
