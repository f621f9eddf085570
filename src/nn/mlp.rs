//! Multi-layer perceptron used as the float reference model

use super::{Activation, Linear, Module};
use crate::{Error, Result};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical parameter prefix for layer `index`
pub fn layer_name(index: usize) -> String {
    format!("layers.{index}")
}

/// Shape of one linear layer
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerShape {
    pub name: String,
    pub in_features: usize,
    pub out_features: usize,
}

/// Ordered layer shapes describing a network
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Architecture {
    pub layers: Vec<LayerShape>,
}

impl Architecture {
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Total number of weight and bias values
    pub fn num_parameters(&self) -> usize {
        self.layers.iter().map(|l| l.out_features * (l.in_features + 1)).sum()
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dims: Vec<String> = self
            .layers
            .first()
            .map(|l| l.in_features)
            .into_iter()
            .chain(self.layers.iter().map(|l| l.out_features))
            .map(|d| d.to_string())
            .collect();
        write!(f, "[{}]", dims.join(" → "))
    }
}

/// Stack of [`Linear`] layers with one activation between them
#[derive(Clone, Debug, PartialEq)]
pub struct Mlp {
    layers: Vec<Linear>,
    activation: Activation,
}

impl Mlp {
    /// Build a network, checking that consecutive layers chain
    pub fn new(layers: Vec<Linear>, activation: Activation) -> Result<Self> {
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
        Ok(Self { layers, activation })
    }

    /// Build a biased network over `dims` with weights from `init(layer, row, col)`
    ///
    /// Biases are initialised with `init(layer, row, in_features)`.
    pub fn from_fn(
        dims: &[usize],
        activation: Activation,
        mut init: impl FnMut(usize, usize, usize) -> f32,
    ) -> Result<Self> {
        let layers = dims
            .windows(2)
            .enumerate()
            .map(|(idx, d)| {
                let weight = Array2::from_shape_fn((d[1], d[0]), |(r, c)| init(idx, r, c));
                let bias = (0..d[1]).map(|r| init(idx, r, d[0])).collect();
                Linear::new(weight, Some(bias))
            })
            .collect::<Result<Vec<_>>>()?;
        Self::new(layers, activation)
    }

    pub fn layers(&self) -> &[Linear] {
        &self.layers
    }

    pub fn activation(&self) -> Activation {
        self.activation
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
}

impl Module for Mlp {
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

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_architecture_from_dims() {
        let mlp = Mlp::from_fn(&[4, 8, 2], Activation::Relu, |_, _, _| 0.1).expect("valid mlp");
        let arch = mlp.architecture();

        assert_eq!(arch.len(), 2);
        assert_eq!(arch.layers[0].name, "layers.0");
        assert_eq!(arch.layers[1].in_features, 8);
        assert_eq!(arch.num_parameters(), 8 * 5 + 2 * 9);
        assert_eq!(arch.to_string(), "[4 → 8 → 2]");
    }

    #[test]
    fn test_activation_skipped_after_last_layer() {
        let mlp = Mlp::new(
            vec![
                Linear::new(array![[1.0]], None).expect("valid"),
                Linear::new(array![[-1.0]], None).expect("valid"),
            ],
            Activation::Relu,
        )
        .expect("valid mlp");

        let out = mlp.forward(&array![[2.0]]).expect("forward should succeed");
        assert_eq!(out, array![[-2.0]]);
    }

    #[test]
    fn test_layers_must_chain() {
        let result = Mlp::new(
            vec![
                Linear::new(Array2::zeros((3, 2)), None).expect("valid"),
                Linear::new(Array2::zeros((1, 4)), None).expect("valid"),
            ],
            Activation::Relu,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_network_rejected() {
        assert!(Mlp::new(vec![], Activation::Identity).is_err());
    }
}
