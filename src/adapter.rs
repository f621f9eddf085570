//! Quantized model adapter
//!
//! Wraps a quantized handle so it can be used wherever an [`Accelerated`]
//! model is expected.
//!
//! ```no_run
//! use acelerar::nn::{Activation, Mlp, Module};
//! use acelerar::QuantizedModelAdapter;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let reference = Mlp::from_fn(&[4, 8, 2], Activation::Relu, |_, _, _| 0.0)?;
//! let adapter = QuantizedModelAdapter::load("model.q", &reference)?;
//! let _y = adapter.forward(&ndarray::Array2::zeros((1, 4)))?;
//! adapter.save("model-copy.q")?;
//! # Ok(())
//! # }
//! ```

use crate::accelerated::{Accelerated, AcceleratedModel};
use crate::error::{LoadError, SaveError};
use crate::nn::{Device, Mlp, Module};
use crate::quant::{PostTrainingQuantizer, QuantizedHandle, QuantizedModel, Quantizer};
use crate::Result;
use ndarray::Array2;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Accelerated-model view of a quantized handle
///
/// The handle is fixed at construction; there is no way to swap or mutate it
/// through the adapter. Build a new adapter instead.
pub struct QuantizedModelAdapter<H: QuantizedHandle = QuantizedModel> {
    base: AcceleratedModel<H::Model>,
    quantized: H,
}

impl<H: QuantizedHandle> QuantizedModelAdapter<H> {
    /// Wrap an already quantized handle
    pub fn new(quantized: H) -> Self {
        let base = AcceleratedModel::new(quantized.model());
        Self { base, quantized }
    }

    /// Restore a checkpoint through `quantizer` onto `reference`
    pub fn load_with<Q>(
        quantizer: &Q,
        path: impl AsRef<Path>,
        reference: &Mlp,
    ) -> std::result::Result<Self, LoadError>
    where
        Q: Quantizer<Handle = H>,
    {
        quantizer.load(path.as_ref(), reference).map(Self::new)
    }

    /// Persist the wrapped handle; the adapter itself is untouched
    pub fn save(&self, path: impl AsRef<Path>) -> std::result::Result<(), SaveError> {
        self.quantized.save(path.as_ref())
    }

    pub fn quantized(&self) -> &H {
        &self.quantized
    }

    /// Model used for inference
    pub fn model(&self) -> &Arc<H::Model> {
        self.base.model()
    }

    pub fn into_quantized(self) -> H {
        self.quantized
    }
}

impl QuantizedModelAdapter<QuantizedModel> {
    /// Restore a checkpoint written by [`QuantizedModelAdapter::save`]
    ///
    /// `reference` must have the architecture that was quantized.
    pub fn load(path: impl AsRef<Path>, reference: &Mlp) -> std::result::Result<Self, LoadError> {
        Self::load_with(&PostTrainingQuantizer::default(), path, reference)
    }
}

impl<H: QuantizedHandle> Module for QuantizedModelAdapter<H> {
    fn forward(&self, input: &Array2<f32>) -> Result<Array2<f32>> {
        self.base.forward(input)
    }

    fn device(&self) -> Device {
        self.base.device()
    }
}

impl<H: QuantizedHandle> Accelerated for QuantizedModelAdapter<H> {
    fn variant(&self) -> &'static str {
        "quantized"
    }

    fn save_model(&self, path: &Path) -> std::result::Result<(), SaveError> {
        self.save(path)
    }
}

impl<H: QuantizedHandle> fmt::Debug for QuantizedModelAdapter<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuantizedModelAdapter")
            .field("variant", &self.variant())
            .field("device", &self.device())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nn::Activation;
    use crate::Error;
    use ndarray::array;
    use std::cell::RefCell;
    use std::path::PathBuf;

    /// Scales its input; records saves instead of touching the filesystem
    struct FakeModel {
        factor: f32,
    }

    impl Module for FakeModel {
        fn forward(&self, input: &Array2<f32>) -> Result<Array2<f32>> {
            Ok(input * self.factor)
        }
    }

    struct FakeHandle {
        model: Arc<FakeModel>,
        saved_to: RefCell<Vec<PathBuf>>,
        fail_save: bool,
    }

    impl FakeHandle {
        fn new(factor: f32) -> Self {
            Self {
                model: Arc::new(FakeModel { factor }),
                saved_to: RefCell::new(Vec::new()),
                fail_save: false,
            }
        }
    }

    impl QuantizedHandle for FakeHandle {
        type Model = FakeModel;

        fn model(&self) -> Arc<FakeModel> {
            Arc::clone(&self.model)
        }

        fn save(&self, path: &Path) -> std::result::Result<(), SaveError> {
            if self.fail_save {
                return Err(SaveError::Serialization { message: "disk full".to_string() });
            }
            self.saved_to.borrow_mut().push(path.to_path_buf());
            Ok(())
        }
    }

    /// Knows a single checkpoint path
    struct FakeQuantizer {
        known: PathBuf,
    }

    impl Quantizer for FakeQuantizer {
        type Handle = FakeHandle;

        fn quantize(&self, _model: &Mlp) -> Result<FakeHandle> {
            Ok(FakeHandle::new(1.0))
        }

        fn load(&self, path: &Path, reference: &Mlp) -> std::result::Result<FakeHandle, LoadError> {
            if path != self.known {
                return Err(LoadError::NotFound { path: path.to_path_buf() });
            }
            if reference.layers().len() != 2 {
                return Err(LoadError::ArchitectureMismatch { message: "expected 2 layers".to_string() });
            }
            Ok(FakeHandle::new(2.0))
        }
    }

    fn reference(dims: &[usize]) -> Mlp {
        Mlp::from_fn(dims, Activation::Relu, |_, _, _| 0.5).expect("valid mlp")
    }

    #[test]
    fn test_new_shares_handle_model() {
        let handle = FakeHandle::new(3.0);
        let expected = handle.model();
        let adapter = QuantizedModelAdapter::new(handle);

        assert!(Arc::ptr_eq(adapter.model(), &expected));
    }

    #[test]
    fn test_forward_delegates_to_handle_model() {
        let adapter = QuantizedModelAdapter::new(FakeHandle::new(3.0));
        let out = adapter.forward(&array![[1.0, -2.0]]).expect("forward should succeed");
        assert_eq!(out, array![[3.0, -6.0]]);
        assert_eq!(adapter.device(), Device::Cpu);
    }

    #[test]
    fn test_load_with_fake_quantizer() {
        let quantizer = FakeQuantizer { known: PathBuf::from("model.q") };
        let adapter = QuantizedModelAdapter::load_with(&quantizer, "model.q", &reference(&[2, 3, 2]))
            .expect("load should succeed");

        let out = adapter.forward(&array![[1.0, 1.0]]).expect("forward should succeed");
        assert_eq!(out, array![[2.0, 2.0]]);
    }

    #[test]
    fn test_load_errors_pass_through() {
        let quantizer = FakeQuantizer { known: PathBuf::from("model.q") };

        let missing = QuantizedModelAdapter::load_with(&quantizer, "other.q", &reference(&[2, 3, 2]));
        assert!(matches!(missing, Err(LoadError::NotFound { .. })));

        let mismatch = QuantizedModelAdapter::load_with(&quantizer, "model.q", &reference(&[2, 2]));
        assert!(matches!(mismatch, Err(LoadError::ArchitectureMismatch { .. })));
    }

    #[test]
    fn test_save_delegates_to_handle() {
        let adapter = QuantizedModelAdapter::new(FakeHandle::new(1.0));
        adapter.save("out/ckpt").expect("save should succeed");
        adapter.save_model(Path::new("out/ckpt2")).expect("save should succeed");

        let saved = adapter.quantized().saved_to.borrow();
        assert_eq!(*saved, vec![PathBuf::from("out/ckpt"), PathBuf::from("out/ckpt2")]);
    }

    #[test]
    fn test_save_error_leaves_adapter_usable() {
        let mut handle = FakeHandle::new(2.0);
        handle.fail_save = true;
        let adapter = QuantizedModelAdapter::new(handle);

        let err = adapter.save("anywhere").expect_err("save should fail");
        assert!(matches!(err, SaveError::Serialization { .. }));
        assert_eq!(adapter.forward(&array![[1.0]]).ok(), Some(array![[2.0]]));
    }

    #[test]
    fn test_usable_as_trait_object() {
        let boxed: Box<dyn Accelerated> = Box::new(QuantizedModelAdapter::new(FakeHandle::new(1.0)));
        assert_eq!(boxed.variant(), "quantized");
        assert!(boxed.forward(&array![[1.0]]).is_ok());
    }

    #[test]
    fn test_shape_errors_surface() {
        let mlp = reference(&[2, 2]);
        let handle = PostTrainingQuantizer::default().quantize(&mlp).expect("quantize");
        let adapter = QuantizedModelAdapter::new(handle);

        let result = adapter.forward(&array![[1.0, 2.0, 3.0]]);
        assert!(matches!(result, Err(Error::ShapeMismatch { .. })));
    }
}
