//! Fully connected layer

use super::Module;
use crate::{Error, Result};
use ndarray::{Array1, Array2};

/// Affine layer `y = x · Wᵀ + b` with `W` stored as `[out, in]`
#[derive(Clone, Debug, PartialEq)]
pub struct Linear {
    weight: Array2<f32>,
    bias: Option<Array1<f32>>,
}

impl Linear {
    /// Create a layer, checking the bias length against the output features
    pub fn new(weight: Array2<f32>, bias: Option<Array1<f32>>) -> Result<Self> {
        if let Some(b) = &bias {
            if b.len() != weight.nrows() {
                return Err(Error::ShapeMismatch {
                    expected: vec![weight.nrows()],
                    actual: vec![b.len()],
                });
            }
        }
        Ok(Self { weight, bias })
    }

    pub fn in_features(&self) -> usize {
        self.weight.ncols()
    }

    pub fn out_features(&self) -> usize {
        self.weight.nrows()
    }

    pub fn weight(&self) -> &Array2<f32> {
        &self.weight
    }

    pub fn bias(&self) -> Option<&Array1<f32>> {
        self.bias.as_ref()
    }
}

impl Module for Linear {
    fn forward(&self, input: &Array2<f32>) -> Result<Array2<f32>> {
        affine(input, &self.weight, self.bias.as_ref())
    }
}

/// Shared matmul + bias used by float and quantized layers
pub(crate) fn affine(
    input: &Array2<f32>,
    weight: &Array2<f32>,
    bias: Option<&Array1<f32>>,
) -> Result<Array2<f32>> {
    if input.ncols() != weight.ncols() {
        return Err(Error::ShapeMismatch {
            expected: vec![input.nrows(), weight.ncols()],
            actual: input.shape().to_vec(),
        });
    }

    let mut out = input.dot(&weight.t());
    if let Some(b) = bias {
        out += b;
    }
    Ok(out)
}
