//! Weight codec: per-tensor, per-channel and per-group integer quantization
//!
//! - **Per-tensor**: one scale/zero-point for the whole tensor
//! - **Per-channel**: one scale/zero-point per output row (axis 0)
//! - **Per-group**: one scale/zero-point per run of `n` consecutive values
//!
//! Codes are always stored as `i8`. Asymmetric codes are shifted by -128 so
//! both modes share one storage type.

mod calibrate;
mod metrics;
mod params;
mod quantize;
mod types;

pub use calibrate::{calibrate, calibrate_per_channel, calibrate_per_group, calibrate_per_tensor};
pub use metrics::quantization_mse;
pub use params::{QuantParams, QuantizedTensor};
pub use quantize::{dequantize_with_params, quantize_tensor, quantize_with_params};
pub use types::{QuantGranularity, QuantMode};
