//! Post-training quantization configuration

use super::granularity::{QuantGranularity, QuantMode};
use crate::nn::Architecture;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// How weights are quantized
///
/// ```yaml
/// bits: 8
/// granularity: PerChannel   # PerTensor | PerChannel | !PerGroup 32
/// mode: Symmetric           # Symmetric | Asymmetric
/// skip_layers: ["layers.2"] # kept in f32
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QuantConfig {
    pub bits: u8,
    pub granularity: QuantGranularity,
    pub mode: QuantMode,
    pub skip_layers: Vec<String>,
}

impl Default for QuantConfig {
    fn default() -> Self {
        Self {
            bits: 8,
            granularity: QuantGranularity::PerChannel,
            mode: QuantMode::Symmetric,
            skip_layers: Vec::new(),
        }
    }
}

impl QuantConfig {
    pub fn new(bits: u8) -> Self {
        Self { bits, ..Self::default() }
    }

    pub fn with_granularity(mut self, granularity: QuantGranularity) -> Self {
        self.granularity = granularity;
        self
    }

    pub fn with_mode(mut self, mode: QuantMode) -> Self {
        self.mode = mode;
        self
    }

    /// Keep `layer` in f32
    pub fn skip(mut self, layer: impl Into<String>) -> Self {
        self.skip_layers.push(layer.into());
        self
    }

    pub fn is_skipped(&self, layer: &str) -> bool {
        self.skip_layers.iter().any(|l| l == layer)
    }

    /// Read and validate a YAML config file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::io(format!("reading {}", path.display()), e))?;
        let config: Self = serde_yaml::from_str(&content)
            .map_err(|e| Error::Serialization(format!("{}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(2..=8).contains(&self.bits) {
            return Err(Error::config("bits", format!("{} is outside 2..=8", self.bits)));
        }
        if self.granularity == QuantGranularity::PerGroup(0) {
            return Err(Error::config("granularity", "group size must be at least 1"));
        }
        Ok(())
    }

    /// Validate, and check that every skipped layer exists in `arch`
    pub fn validate_for(&self, arch: &Architecture) -> Result<()> {
        self.validate()?;
        for skipped in &self.skip_layers {
            if !arch.layers.iter().any(|l| &l.name == skipped) {
                return Err(Error::config("skip_layers", format!("no layer named '{skipped}'")));
            }
        }
        Ok(())
    }
}
