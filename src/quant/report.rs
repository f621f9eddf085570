//! Per-layer quantization error and memory summary

use super::granularity::quantization_mse;
use super::qmodel::QuantizedMlp;
use crate::nn::{layer_name, Mlp};
use serde::Serialize;
use std::fmt;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LayerReport {
    pub name: String,
    pub quantized: bool,
    /// Weight MSE between float and decoded weights
    pub weight_mse: f32,
    pub float_bytes: usize,
    pub quantized_bytes: usize,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct QuantizationReport {
    pub layers: Vec<LayerReport>,
}

impl QuantizationReport {
    /// Compare `quantized` against the float model it came from
    pub fn compare(float: &Mlp, quantized: &QuantizedMlp) -> Self {
        let layers = float
            .layers()
            .iter()
            .zip(quantized.layers())
            .enumerate()
            .map(|(i, (f, q))| {
                let original: Vec<f32> = f.weight().iter().copied().collect();
                let decoded: Vec<f32> = q.decoded_weight().iter().copied().collect();
                LayerReport {
                    name: layer_name(i),
                    quantized: q.is_quantized(),
                    weight_mse: quantization_mse(&original, &decoded),
                    float_bytes: (f.weight().len() + f.bias().map_or(0, |b| b.len())) * 4,
                    quantized_bytes: q.memory_bytes(),
                }
            })
            .collect();
        Self { layers }
    }

    pub fn float_bytes(&self) -> usize {
        self.layers.iter().map(|l| l.float_bytes).sum()
    }

    pub fn quantized_bytes(&self) -> usize {
        self.layers.iter().map(|l| l.quantized_bytes).sum()
    }

    /// Float size over quantized size
    pub fn compression_ratio(&self) -> f64 {
        self.float_bytes() as f64 / self.quantized_bytes().max(1) as f64
    }

    pub fn max_weight_mse(&self) -> f32 {
        self.layers.iter().map(|l| l.weight_mse).fold(0.0, f32::max)
    }
}

impl fmt::Display for QuantizationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:<12} {:>6} {:>12} {:>10} {:>10}", "layer", "int", "weight_mse", "f32_B", "quant_B")?;
        for l in &self.layers {
            writeln!(
                f,
                "{:<12} {:>6} {:>12.3e} {:>10} {:>10}",
                l.name,
                if l.quantized { "yes" } else { "no" },
                l.weight_mse,
                l.float_bytes,
                l.quantized_bytes
            )?;
        }
        write!(f, "compression: {:.2}x", self.compression_ratio())
    }
}
