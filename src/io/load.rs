//! Float model loading

use super::ACTIVATION_KEY;
use crate::nn::{layer_name, Activation, Linear, Mlp};
use crate::{Error, Result};
use ndarray::{Array1, Array2};
use safetensors::tensor::Dtype;
use safetensors::SafeTensors;
use std::path::Path;
use tracing::debug;

/// Load a float model written by [`save_float_model`](super::save_float_model)
///
/// Missing activation metadata defaults to ReLU.
pub fn load_float_model(path: impl AsRef<Path>) -> Result<Mlp> {
    let path = path.as_ref();
    let data = std::fs::read(path).map_err(|e| Error::io(format!("reading {}", path.display()), e))?;

    let (_, header) = SafeTensors::read_metadata(&data)
        .map_err(|e| Error::Serialization(format!("SafeTensors parsing failed: {e}")))?;
    let activation = match header.metadata().as_ref().and_then(|m| m.get(ACTIVATION_KEY)) {
        Some(name) => name.parse::<Activation>().map_err(Error::Serialization)?,
        None => Activation::default(),
    };

    let tensors = SafeTensors::deserialize(&data)
        .map_err(|e| Error::Serialization(format!("SafeTensors parsing failed: {e}")))?;

    let mut layers = Vec::new();
    loop {
        let name = layer_name(layers.len());
        let Ok(weight) = tensors.tensor(&format!("{name}.weight")) else {
            break;
        };
        let &[rows, cols] = weight.shape() else {
            return Err(Error::Serialization(format!(
                "{name}.weight: expected 2-D, got {:?}",
                weight.shape()
            )));
        };
        if weight.dtype() != Dtype::F32 {
            return Err(Error::Serialization(format!("{name}.weight: expected F32")));
        }

        let values: Vec<f32> = bytemuck::pod_collect_to_vec(weight.data());
        let weight = Array2::from_shape_vec((rows, cols), values)
            .map_err(|e| Error::Serialization(format!("{name}.weight: {e}")))?;
        let bias = match tensors.tensor(&format!("{name}.bias")) {
            Ok(view) if view.dtype() == Dtype::F32 => {
                Some(Array1::from(bytemuck::pod_collect_to_vec::<u8, f32>(view.data())))
            }
            Ok(_) => return Err(Error::Serialization(format!("{name}.bias: expected F32"))),
            Err(_) => None,
        };

        debug!("{name}: [{rows} x {cols}]");
        layers.push(Linear::new(weight, bias)?);
    }

    if layers.is_empty() {
        return Err(Error::Serialization(format!(
            "{}: no layers.0.weight tensor",
            path.display()
        )));
    }
    Mlp::new(layers, activation)
}
