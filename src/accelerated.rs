//! Base capability shared by optimized model variants
//!
//! Variants do not inherit from a base model type. They hold an
//! [`AcceleratedModel`] over whatever runnable module they produce and
//! delegate the inference call to it.

use crate::error::SaveError;
use crate::nn::{Device, Module};
use crate::Result;
use ndarray::Array2;
use std::path::Path;
use std::sync::Arc;

/// Inference plumbing over a shared runnable model
pub struct AcceleratedModel<M> {
    model: Arc<M>,
}

impl<M: Module> AcceleratedModel<M> {
    pub fn new(model: Arc<M>) -> Self {
        Self { model }
    }

    /// The model inference is delegated to
    pub fn model(&self) -> &Arc<M> {
        &self.model
    }
}

impl<M> Clone for AcceleratedModel<M> {
    fn clone(&self) -> Self {
        Self { model: Arc::clone(&self.model) }
    }
}

impl<M: Module> Module for AcceleratedModel<M> {
    fn forward(&self, input: &Array2<f32>) -> Result<Array2<f32>> {
        self.model.forward(input)
    }

    fn device(&self) -> Device {
        self.model.device()
    }
}

/// An optimized model variant that can stand in for the original
pub trait Accelerated: Module {
    /// Short variant name, e.g. `"quantized"`
    fn variant(&self) -> &'static str;

    /// Persist the variant to `path`
    fn save_model(&self, path: &Path) -> std::result::Result<(), SaveError>;
}
