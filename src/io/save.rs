//! Float model saving

use super::{ACTIVATION_KEY, FORMAT_KEY, FORMAT_NAME};
use crate::nn::{layer_name, Mlp};
use crate::{Error, Result};
use safetensors::tensor::{Dtype, TensorView};
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

/// Save a float model as a SafeTensors file
///
/// # Example
///
/// ```no_run
/// use acelerar::io::save_float_model;
/// use acelerar::nn::{Activation, Mlp};
///
/// let model = Mlp::from_fn(&[4, 2], Activation::Relu, |_, r, c| (r + c) as f32).unwrap();
/// save_float_model(&model, "reference.safetensors").unwrap();
/// ```
pub fn save_float_model(model: &Mlp, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();

    let mut tensor_data: Vec<(String, Vec<usize>, Vec<u8>)> = Vec::new();
    for (i, layer) in model.layers().iter().enumerate() {
        let name = layer_name(i);
        let weight: Vec<f32> = layer.weight().iter().copied().collect();
        tensor_data.push((
            format!("{name}.weight"),
            vec![layer.out_features(), layer.in_features()],
            bytemuck::cast_slice::<f32, u8>(&weight).to_vec(),
        ));
        if let Some(bias) = layer.bias() {
            let bias: Vec<f32> = bias.to_vec();
            tensor_data.push((
                format!("{name}.bias"),
                vec![bias.len()],
                bytemuck::cast_slice::<f32, u8>(&bias).to_vec(),
            ));
        }
    }

    let views = tensor_data
        .iter()
        .map(|(name, shape, bytes)| {
            TensorView::new(Dtype::F32, shape.clone(), bytes)
                .map(|view| (name.as_str(), view))
                .map_err(|e| Error::Serialization(format!("{name}: {e}")))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut metadata = HashMap::new();
    metadata.insert(FORMAT_KEY.to_string(), FORMAT_NAME.to_string());
    metadata.insert(ACTIVATION_KEY.to_string(), model.activation().to_string());

    let bytes = safetensors::serialize(views, &Some(metadata))
        .map_err(|e| Error::Serialization(format!("SafeTensors serialization failed: {e}")))?;
    std::fs::write(path, bytes).map_err(|e| Error::io(format!("writing {}", path.display()), e))?;

    info!("Saved float model {} to {}", model.architecture(), path.display());
    Ok(())
}
