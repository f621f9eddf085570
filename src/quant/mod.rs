//! Quantization toolkit
//!
//! Weight-only post-training quantization for [`Mlp`](crate::nn::Mlp):
//! - Min/max calibration at tensor, channel or group granularity
//! - 2 to 8 bit codes, symmetric or asymmetric
//! - Per-layer f32 fallback via `skip_layers`
//! - SafeTensors + YAML checkpoints with SHA-256 integrity check

mod backend;
pub mod checkpoint;
mod config;
mod granularity;
mod qlinear;
mod qmodel;
mod report;

pub use backend::{PostTrainingQuantizer, QuantizedHandle, Quantizer};
pub use checkpoint::{read_manifest, CheckpointManifest, LayerEntry};
pub use config::QuantConfig;
pub use granularity::{
    calibrate, calibrate_per_channel, calibrate_per_group, calibrate_per_tensor,
    dequantize_with_params, quantization_mse, quantize_tensor, quantize_with_params,
    QuantGranularity, QuantMode, QuantParams, QuantizedTensor,
};
pub use qlinear::{LayerWeight, QuantizedLinear};
pub use qmodel::{QuantizedMlp, QuantizedModel};
pub use report::{LayerReport, QuantizationReport};

use crate::error::LoadError;
use crate::nn::Mlp;
use std::path::Path;

/// Rebuild the quantized network saved at `path`, applied onto `reference`
///
/// Wrap the result in [`QuantizedModel::new`] to get a saveable handle.
pub fn load(path: impl AsRef<Path>, reference: &Mlp) -> Result<QuantizedMlp, LoadError> {
    checkpoint::load(path.as_ref(), reference)
}
