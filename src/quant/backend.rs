//! Toolkit seams: how a quantized handle is produced, persisted and restored
//!
//! The adapter only talks to these traits, so a fake toolkit can stand in
//! for [`PostTrainingQuantizer`] in tests.

use super::checkpoint;
use super::config::QuantConfig;
use super::qmodel::{QuantizedMlp, QuantizedModel};
use super::report::QuantizationReport;
use crate::error::{LoadError, SaveError};
use crate::nn::{Mlp, Module};
use crate::Result;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// A quantized model produced by a toolkit
pub trait QuantizedHandle {
    /// Runnable model the handle wraps
    type Model: Module;

    fn model(&self) -> Arc<Self::Model>;

    /// Persist to `path` in the toolkit's format
    fn save(&self, path: &Path) -> std::result::Result<(), SaveError>;
}

/// A compression toolkit
pub trait Quantizer {
    type Handle: QuantizedHandle;

    /// Quantize a float model
    fn quantize(&self, model: &Mlp) -> Result<Self::Handle>;

    /// Restore a handle saved at `path` onto `reference`'s architecture
    fn load(&self, path: &Path, reference: &Mlp) -> std::result::Result<Self::Handle, LoadError>;
}

/// Weight-only min/max post-training quantization
#[derive(Clone, Debug, Default)]
pub struct PostTrainingQuantizer {
    config: QuantConfig,
}

impl PostTrainingQuantizer {
    pub fn new(config: QuantConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &QuantConfig {
        &self.config
    }

    /// Quantize and report per-layer error
    pub fn quantize_with_report(&self, model: &Mlp) -> Result<(QuantizedModel, QuantizationReport)> {
        let quantized = QuantizedMlp::quantize(model, &self.config)?;
        let report = QuantizationReport::compare(model, &quantized);
        info!(
            "Quantized {} layers to {} bits ({:.2}x smaller, max weight MSE {:.3e})",
            report.layers.len(),
            self.config.bits,
            report.compression_ratio(),
            report.max_weight_mse()
        );
        Ok((QuantizedModel::new(quantized), report))
    }
}

impl Quantizer for PostTrainingQuantizer {
    type Handle = QuantizedModel;

    fn quantize(&self, model: &Mlp) -> Result<QuantizedModel> {
        self.quantize_with_report(model).map(|(handle, _)| handle)
    }

    /// The checkpoint carries its own config, so `self.config` is not consulted
    fn load(&self, path: &Path, reference: &Mlp) -> std::result::Result<QuantizedModel, LoadError> {
        checkpoint::load(path, reference).map(QuantizedModel::new)
    }
}
