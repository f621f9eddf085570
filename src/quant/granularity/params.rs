//! Quantization parameters and quantized tensors

use serde::{Deserialize, Serialize};

use super::{QuantGranularity, QuantMode};

/// Scales and zero-points for one tensor
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuantParams {
    pub scales: Vec<f32>,
    /// Empty for symmetric quantization
    #[serde(default)]
    pub zero_points: Vec<i32>,
    pub granularity: QuantGranularity,
    pub mode: QuantMode,
    pub bits: u8,
}

impl QuantParams {
    pub fn num_groups(&self) -> usize {
        self.scales.len()
    }

    /// Number of consecutive values covered by one scale for a tensor of `len` values
    pub fn group_len(&self, len: usize) -> usize {
        match self.granularity {
            QuantGranularity::PerTensor => len,
            QuantGranularity::PerChannel => len / self.scales.len().max(1),
            QuantGranularity::PerGroup(size) => size,
        }
        .max(1)
    }

    /// Check that the parameters can decode a row-major tensor of `shape`
    pub fn validate(&self, shape: &[usize]) -> Result<(), String> {
        if !(2..=8).contains(&self.bits) {
            return Err(format!("bit width {} outside 2..=8", self.bits));
        }
        if self.scales.is_empty() {
            return Err("no scales".to_string());
        }
        if self.scales.iter().any(|s| !s.is_finite() || *s <= 0.0) {
            return Err("scales must be finite and positive".to_string());
        }
        if self.mode == QuantMode::Asymmetric {
            if self.zero_points.len() != self.scales.len() {
                return Err(format!(
                    "{} zero-points for {} scales",
                    self.zero_points.len(),
                    self.scales.len()
                ));
            }
            let qmax = (1i32 << self.bits) - 1;
            if let Some(zp) = self.zero_points.iter().find(|zp| !(0..=qmax).contains(*zp)) {
                return Err(format!("zero-point {zp} outside 0..={qmax}"));
            }
        }

        let len: usize = shape.iter().product();
        if len == 0 {
            return Ok(());
        }
        let groups = match self.granularity {
            QuantGranularity::PerChannel => shape.first().copied().unwrap_or(1),
            _ => len.div_ceil(self.group_len(len)),
        };
        if groups != self.scales.len() {
            return Err(format!("{} scales for {groups} groups", self.scales.len()));
        }
        Ok(())
    }
}

/// Integer codes plus the parameters needed to decode them
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuantizedTensor {
    pub data: Vec<i8>,
    pub params: QuantParams,
    pub shape: Vec<usize>,
}

impl QuantizedTensor {
    /// Memory usage in bytes
    pub fn memory_bytes(&self) -> usize {
        self.data.len() + self.params.scales.len() * 4 + self.params.zero_points.len() * 4
    }

    /// Decode to f32
    pub fn dequantize(&self) -> Vec<f32> {
        super::dequantize_with_params(&self.data, &self.params)
    }
}
