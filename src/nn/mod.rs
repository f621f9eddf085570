//! Runnable model interface and the float reference network
//!
//! Every model variant (float, quantized, accelerated wrappers) implements
//! [`Module`] so host code can call it interchangeably.

mod linear;
mod mlp;

pub(crate) use linear::affine;
pub use linear::Linear;
pub use mlp::{layer_name, Architecture, LayerShape, Mlp};

use crate::Result;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Compute device a model's parameters live on
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum Device {
    /// Host memory
    #[default]
    Cpu,
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cpu => write!(f, "cpu"),
        }
    }
}

/// Runnable model: the inference call signature shared by all variants
pub trait Module {
    /// Run inference on a `[batch, features]` input
    fn forward(&self, input: &Array2<f32>) -> Result<Array2<f32>>;

    /// Device the parameters are placed on
    fn device(&self) -> Device {
        Device::Cpu
    }
}

/// Element-wise activation applied between hidden layers
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
    #[default]
    Relu,
    Tanh,
    Identity,
}

impl Activation {
    /// Apply in place
    pub fn apply(self, x: &mut Array2<f32>) {
        match self {
            Self::Relu => x.mapv_inplace(|v| v.max(0.0)),
            Self::Tanh => x.mapv_inplace(f32::tanh),
            Self::Identity => {}
        }
    }
}

impl fmt::Display for Activation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Relu => "relu",
            Self::Tanh => "tanh",
            Self::Identity => "identity",
        };
        f.write_str(name)
    }
}

impl FromStr for Activation {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "relu" => Ok(Self::Relu),
            "tanh" => Ok(Self::Tanh),
            "identity" | "none" => Ok(Self::Identity),
            other => Err(format!("unknown activation '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_relu_clamps_negatives() {
        let mut x = array![[-1.0, 0.5], [2.0, -0.1]];
        Activation::Relu.apply(&mut x);
        assert_eq!(x, array![[0.0, 0.5], [2.0, 0.0]]);
    }

    #[test]
    fn test_identity_is_noop() {
        let mut x = array![[-1.0, 0.5]];
        Activation::Identity.apply(&mut x);
        assert_eq!(x, array![[-1.0, 0.5]]);
    }

    #[test]
    fn test_activation_parse_and_display() {
        for act in [Activation::Relu, Activation::Tanh, Activation::Identity] {
            assert_eq!(act.to_string().parse::<Activation>(), Ok(act));
        }
        assert_eq!("NONE".parse::<Activation>(), Ok(Activation::Identity));
        assert!("swish".parse::<Activation>().is_err());
    }

    #[test]
    fn test_device_display() {
        assert_eq!(Device::default().to_string(), "cpu");
    }
}
