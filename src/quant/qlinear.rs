//! Linear layer with quantized weights

use super::config::QuantConfig;
use super::granularity::{quantize_tensor, QuantizedTensor};
use crate::nn::{affine, Linear, Module};
use crate::{Error, Result};
use ndarray::{Array1, Array2};

/// Stored weight of a [`QuantizedLinear`]
#[derive(Clone, Debug, PartialEq)]
pub enum LayerWeight {
    /// Integer codes, row-major `[out, in]`
    Quantized(QuantizedTensor),
    /// Left in f32 via `skip_layers`
    Float(Array2<f32>),
}

/// Weight-only quantized affine layer
///
/// The decoded weight is computed once at construction; activations stay f32.
#[derive(Clone, Debug, PartialEq)]
pub struct QuantizedLinear {
    weight: LayerWeight,
    bias: Option<Array1<f32>>,
    decoded: Array2<f32>,
}

impl QuantizedLinear {
    /// Quantize `layer` with `config`
    pub fn quantize(layer: &Linear, config: &QuantConfig) -> Result<Self> {
        let w = layer.weight();
        let values: Vec<f32> = w.iter().copied().collect();
        let qt = quantize_tensor(
            &values,
            &[w.nrows(), w.ncols()],
            config.granularity,
            config.mode,
            config.bits,
        );
        let values = qt.dequantize();
        let actual = vec![values.len()];
        let decoded = Array2::from_shape_vec(w.raw_dim(), values)
            .map_err(|_| Error::ShapeMismatch { expected: vec![w.len()], actual })?;

        Ok(Self { weight: LayerWeight::Quantized(qt), bias: layer.bias().cloned(), decoded })
    }

    /// Keep `layer` in f32
    pub fn float(layer: &Linear) -> Self {
        Self {
            weight: LayerWeight::Float(layer.weight().clone()),
            bias: layer.bias().cloned(),
            decoded: layer.weight().clone(),
        }
    }

    /// Rebuild from stored parts, validating shapes and parameters
    pub fn from_parts(weight: LayerWeight, bias: Option<Array1<f32>>) -> Result<Self> {
        let decoded = match &weight {
            LayerWeight::Float(w) => w.clone(),
            LayerWeight::Quantized(qt) => {
                let [rows, cols] = qt.shape[..] else {
                    return Err(Error::ShapeMismatch {
                        expected: vec![0, 0],
                        actual: qt.shape.clone(),
                    });
                };
                if qt.data.len() != rows * cols {
                    return Err(Error::ShapeMismatch {
                        expected: vec![rows * cols],
                        actual: vec![qt.data.len()],
                    });
                }
                qt.params
                    .validate(&qt.shape)
                    .map_err(|msg| Error::Serialization(format!("invalid quant params: {msg}")))?;
                Array2::from_shape_vec((rows, cols), qt.dequantize())
                    .map_err(|e| Error::Serialization(e.to_string()))?
            }
        };

        if let Some(b) = &bias {
            if b.len() != decoded.nrows() {
                return Err(Error::ShapeMismatch {
                    expected: vec![decoded.nrows()],
                    actual: vec![b.len()],
                });
            }
        }

        Ok(Self { weight, bias, decoded })
    }

    pub fn in_features(&self) -> usize {
        self.decoded.ncols()
    }

    pub fn out_features(&self) -> usize {
        self.decoded.nrows()
    }

    pub fn weight(&self) -> &LayerWeight {
        &self.weight
    }

    pub fn bias(&self) -> Option<&Array1<f32>> {
        self.bias.as_ref()
    }

    /// Weight as used by `forward`
    pub fn decoded_weight(&self) -> &Array2<f32> {
        &self.decoded
    }

    pub fn is_quantized(&self) -> bool {
        matches!(self.weight, LayerWeight::Quantized(_))
    }

    /// Bytes held by the stored weight and bias
    pub fn memory_bytes(&self) -> usize {
        let weight = match &self.weight {
            LayerWeight::Quantized(qt) => qt.memory_bytes(),
            LayerWeight::Float(w) => w.len() * 4,
        };
        weight + self.bias.as_ref().map_or(0, |b| b.len() * 4)
    }
}

impl Module for QuantizedLinear {
    fn forward(&self, input: &Array2<f32>) -> Result<Array2<f32>> {
        affine(input, &self.decoded, self.bias.as_ref())
    }
}
