//! Quantized network and the handle that owns it

use super::backend::QuantizedHandle;
use super::checkpoint;
use super::config::QuantConfig;
use super::qlinear::QuantizedLinear;
use crate::error::SaveError;
use crate::nn::{layer_name, Activation, Architecture, LayerShape, Mlp, Module};
use crate::{Error, Result};
use ndarray::Array2;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

/// Quantized numeric representation of an [`Mlp`]
#[derive(Clone, Debug, PartialEq)]
pub struct QuantizedMlp {
    layers: Vec<QuantizedLinear>,
    activation: Activation,
    config: QuantConfig,
}

impl QuantizedMlp {
    /// Assemble from layers produced by `config`
    pub fn new(
        layers: Vec<QuantizedLinear>,
        activation: Activation,
        config: QuantConfig,
    ) -> Result<Self> {
        if layers.is_empty() {
            return Err(Error::ShapeMismatch { expected: vec![1], actual: vec![0] });
        }
        for pair in layers.windows(2) {
            if pair[0].out_features() != pair[1].in_features() {
                return Err(Error::ShapeMismatch {
                    expected: vec![pair[0].out_features()],
                    actual: vec![pair[1].in_features()],
                });
            }
        }
        Ok(Self { layers, activation, config })
    }

    /// Quantize every layer of `model` not listed in `config.skip_layers`
    pub fn quantize(model: &Mlp, config: &QuantConfig) -> Result<Self> {
        config.validate_for(&model.architecture())?;

        let layers = model
            .layers()
            .iter()
            .enumerate()
            .map(|(i, layer)| {
                let name = layer_name(i);
                if config.is_skipped(&name) {
                    warn!("{name}: kept in f32");
                    Ok(QuantizedLinear::float(layer))
                } else {
                    debug!(
                        "{name}: quantizing [{} x {}] to {} bits",
                        layer.out_features(),
                        layer.in_features(),
                        config.bits
                    );
                    QuantizedLinear::quantize(layer, config)
                }
            })
            .collect::<Result<Vec<_>>>()?;

        Self::new(layers, model.activation(), config.clone())
    }

    pub fn layers(&self) -> &[QuantizedLinear] {
        &self.layers
    }

    pub fn activation(&self) -> Activation {
        self.activation
    }

    pub fn config(&self) -> &QuantConfig {
        &self.config
    }

    pub fn architecture(&self) -> Architecture {
        Architecture {
            layers: self
                .layers
                .iter()
                .enumerate()
                .map(|(i, l)| LayerShape {
                    name: layer_name(i),
                    in_features: l.in_features(),
                    out_features: l.out_features(),
                })
                .collect(),
        }
    }

    pub fn memory_bytes(&self) -> usize {
        self.layers.iter().map(QuantizedLinear::memory_bytes).sum()
    }
}

impl Module for QuantizedMlp {
    fn forward(&self, input: &Array2<f32>) -> Result<Array2<f32>> {
        let last = self.layers.len() - 1;
        let mut x = input.clone();
        for (i, layer) in self.layers.iter().enumerate() {
            x = layer.forward(&x)?;
            if i < last {
                self.activation.apply(&mut x);
            }
        }
        Ok(x)
    }
}

/// Handle over a [`QuantizedMlp`], the unit that gets saved and wrapped
#[derive(Clone, Debug)]
pub struct QuantizedModel {
    model: Arc<QuantizedMlp>,
}

impl QuantizedModel {
    pub fn new(model: QuantizedMlp) -> Self {
        Self { model: Arc::new(model) }
    }

    pub fn inner(&self) -> &QuantizedMlp {
        &self.model
    }

    pub fn config(&self) -> &QuantConfig {
        self.model.config()
    }

    /// Write a checkpoint directory at `path`
    pub fn save(&self, path: impl AsRef<Path>) -> std::result::Result<(), SaveError> {
        checkpoint::save(&self.model, path.as_ref())
    }
}

impl QuantizedHandle for QuantizedModel {
    type Model = QuantizedMlp;

    fn model(&self) -> Arc<QuantizedMlp> {
        Arc::clone(&self.model)
    }

    fn save(&self, path: &Path) -> std::result::Result<(), SaveError> {
        QuantizedModel::save(self, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn mlp() -> Mlp {
        Mlp::from_fn(&[3, 4, 2], Activation::Relu, |l, r, c| {
            ((l * 7 + r * 3 + c) as f32 * 0.37).sin()
        })
        .expect("valid mlp")
    }

    #[test]
    fn test_quantize_preserves_architecture() {
        let float = mlp();
        let q = QuantizedMlp::quantize(&float, &QuantConfig::default()).expect("quantize");

        assert_eq!(q.architecture(), float.architecture());
        assert_eq!(q.activation(), Activation::Relu);
        assert!(q.layers().iter().all(QuantizedLinear::is_quantized));
    }

    #[test]
    fn test_skip_layers_stay_float() {
        let config = QuantConfig::default().skip("layers.1");
        let q = QuantizedMlp::quantize(&mlp(), &config).expect("quantize");

        assert!(q.layers()[0].is_quantized());
        assert!(!q.layers()[1].is_quantized());
        assert_eq!(q.config(), &config);
    }

    #[test]
    fn test_unknown_skip_layer_rejected() {
        let config = QuantConfig::default().skip("layers.9");
        assert!(QuantizedMlp::quantize(&mlp(), &config).is_err());
    }

    #[test]
    fn test_forward_tracks_float_model() {
        let float = mlp();
        let q = QuantizedMlp::quantize(&float, &QuantConfig::default()).expect("quantize");
        let x = array![[0.5, -1.0, 2.0], [1.0, 1.0, 1.0]];

        let expected = float.forward(&x).expect("forward should succeed");
        let actual = q.forward(&x).expect("forward should succeed");
        for (e, a) in expected.iter().zip(actual.iter()) {
            assert_abs_diff_eq!(e, a, epsilon = 0.1);
        }
    }

    #[test]
    fn test_handle_shares_model() {
        let handle =
            QuantizedModel::new(QuantizedMlp::quantize(&mlp(), &QuantConfig::default()).expect("quantize"));
        let a = handle.model();
        let b = handle.model();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(handle.config().bits, 8);
    }

    #[test]
    fn test_memory_smaller_than_float() {
        let float = mlp();
        let q = QuantizedMlp::quantize(&float, &QuantConfig::default()).expect("quantize");
        let float_bytes = float.architecture().num_parameters() * 4;
        assert!(q.memory_bytes() < float_bytes);
    }
}
