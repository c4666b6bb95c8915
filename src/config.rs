//! Scan settings

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::{CarveError, Result};
use crate::signatures::DispatchPolicy;
use crate::types::{DEFAULT_ALIGNMENT, DEFAULT_CHUNK_SIZE, MAX_FILE_SIZE, Variant};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScanConfig {
    /// Candidate starts must be multiples of this (1 = every byte)
    pub alignment: usize,
    /// Ceiling on any carved file
    pub max_file_size: u64,
    /// Enabled variants, in dispatch order
    pub variants: Vec<Variant>,
    pub policy: DispatchPolicy,
    /// Whether to scan chunks in parallel
    pub parallel: bool,
    /// Bytes per chunk when scanning in parallel
    pub chunk_size: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            alignment: DEFAULT_ALIGNMENT,
            max_file_size: MAX_FILE_SIZE,
            variants: Variant::ALL.to_vec(),
            policy: DispatchPolicy::default(),
            parallel: true,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl ScanConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads settings from a JSON file; missing keys keep their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)
            .map_err(|e| CarveError::InvalidConfig(format!("{}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_alignment(mut self, alignment: usize) -> Self {
        self.alignment = alignment;
        self
    }

    pub fn with_max_file_size(mut self, size: u64) -> Self {
        self.max_file_size = size;
        self
    }

    pub fn with_variants(mut self, variants: Vec<Variant>) -> Self {
        self.variants = variants;
        self
    }

    pub fn with_policy(mut self, policy: DispatchPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = size;
        self
    }

    /// Disables parallel scanning
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.alignment == 0 {
            return Err(CarveError::InvalidConfig("alignment must be at least 1".into()));
        }
        if self.chunk_size == 0 {
            return Err(CarveError::InvalidConfig("chunk_size must be at least 1".into()));
        }
        if self.variants.is_empty() {
            return Err(CarveError::InvalidConfig("no variants enabled".into()));
        }
        Ok(())
    }
}
