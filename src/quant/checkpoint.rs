//! Checkpoint directory layout
//!
//! ```text
//! <dir>/quant_config.yaml    manifest: version, config, layer table, weights digest
//! <dir>/weights.safetensors  layers.{i}.weight (I8 codes or F32), layers.{i}.bias (F32)
//! ```

use super::config::QuantConfig;
use super::granularity::{QuantParams, QuantizedTensor};
use super::qlinear::{LayerWeight, QuantizedLinear};
use super::qmodel::QuantizedMlp;
use crate::error::{LoadError, SaveError};
use crate::nn::{layer_name, Activation, Mlp};
use chrono::{DateTime, Utc};
use ndarray::{Array1, Array2};
use safetensors::tensor::{Dtype, TensorView};
use safetensors::SafeTensors;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

pub const FORMAT_VERSION: u32 = 1;
pub const CONFIG_FILE: &str = "quant_config.yaml";
pub const WEIGHTS_FILE: &str = "weights.safetensors";

/// Contents of `quant_config.yaml`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CheckpointManifest {
    pub format_version: u32,
    pub created_at: DateTime<Utc>,
    pub config: QuantConfig,
    pub activation: Activation,
    pub layers: Vec<LayerEntry>,
    pub weights_sha256: String,
}

/// One row of the manifest layer table
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LayerEntry {
    pub name: String,
    pub in_features: usize,
    pub out_features: usize,
    /// `None` for layers kept in f32
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<QuantParams>,
    pub has_bias: bool,
}

fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

fn f32_bytes(values: impl Iterator<Item = f32>) -> Vec<u8> {
    let values: Vec<f32> = values.collect();
    bytemuck::cast_slice::<f32, u8>(&values).to_vec()
}

/// Write `model` as a checkpoint directory, creating it if needed
pub fn save(model: &QuantizedMlp, dir: &Path) -> Result<(), SaveError> {
    std::fs::create_dir_all(dir).map_err(|e| SaveError::io(dir, e))?;

    let mut entries = Vec::with_capacity(model.layers().len());
    // (name, dtype, shape, bytes)
    let mut tensors: Vec<(String, Dtype, Vec<usize>, Vec<u8>)> = Vec::new();

    for (i, layer) in model.layers().iter().enumerate() {
        let name = layer_name(i);
        let shape = vec![layer.out_features(), layer.in_features()];

        let params = match layer.weight() {
            LayerWeight::Quantized(qt) => {
                let bytes = bytemuck::cast_slice::<i8, u8>(&qt.data).to_vec();
                tensors.push((format!("{name}.weight"), Dtype::I8, shape, bytes));
                Some(qt.params.clone())
            }
            LayerWeight::Float(w) => {
                let bytes = f32_bytes(w.iter().copied());
                tensors.push((format!("{name}.weight"), Dtype::F32, shape, bytes));
                None
            }
        };
        if let Some(b) = layer.bias() {
            let bytes = f32_bytes(b.iter().copied());
            tensors.push((format!("{name}.bias"), Dtype::F32, vec![b.len()], bytes));
        }

        entries.push(LayerEntry {
            name,
            in_features: layer.in_features(),
            out_features: layer.out_features(),
            params,
            has_bias: layer.bias().is_some(),
        });
    }

    let views = tensors
        .iter()
        .map(|(name, dtype, shape, bytes)| {
            TensorView::new(*dtype, shape.clone(), bytes)
                .map(|view| (name.as_str(), view))
                .map_err(|e| SaveError::Serialization { message: format!("{name}: {e}") })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut metadata = HashMap::new();
    metadata.insert("format".to_string(), "acelerar-quantized".to_string());
    let weights = safetensors::serialize(views, &Some(metadata))
        .map_err(|e| SaveError::Serialization { message: format!("SafeTensors: {e}") })?;

    let manifest = CheckpointManifest {
        format_version: FORMAT_VERSION,
        created_at: Utc::now(),
        config: model.config().clone(),
        activation: model.activation(),
        layers: entries,
        weights_sha256: sha256_hex(&weights),
    };
    let yaml = serde_yaml::to_string(&manifest)
        .map_err(|e| SaveError::Serialization { message: format!("manifest: {e}") })?;

    let weights_path = dir.join(WEIGHTS_FILE);
    std::fs::write(&weights_path, &weights).map_err(|e| SaveError::io(&weights_path, e))?;
    let config_path = dir.join(CONFIG_FILE);
    std::fs::write(&config_path, yaml).map_err(|e| SaveError::io(&config_path, e))?;

    info!(
        "Saved quantized checkpoint to {} ({} layers, {} bytes)",
        dir.display(),
        manifest.layers.len(),
        weights.len()
    );
    Ok(())
}

/// Read and version-check the manifest of the checkpoint at `dir`
pub fn read_manifest(dir: &Path) -> Result<CheckpointManifest, LoadError> {
    if !dir.exists() {
        return Err(LoadError::NotFound { path: dir.to_path_buf() });
    }

    let path = dir.join(CONFIG_FILE);
    let content = std::fs::read_to_string(&path).map_err(|e| LoadError::io(&path, e))?;
    let manifest: CheckpointManifest =
        serde_yaml::from_str(&content).map_err(|e| LoadError::malformed(&path, e.to_string()))?;

    if manifest.format_version != FORMAT_VERSION {
        return Err(LoadError::UnsupportedVersion {
            found: manifest.format_version,
            supported: FORMAT_VERSION,
        });
    }
    manifest
        .config
        .validate()
        .map_err(|e| LoadError::malformed(&path, e.to_string()))?;
    Ok(manifest)
}

fn check_architecture(manifest: &CheckpointManifest, reference: &Mlp) -> Result<(), LoadError> {
    let arch = reference.architecture();
    if arch.len() != manifest.layers.len() {
        return Err(LoadError::ArchitectureMismatch {
            message: format!(
                "checkpoint has {} layers, reference has {}",
                manifest.layers.len(),
                arch.len()
            ),
        });
    }
    for (entry, shape) in manifest.layers.iter().zip(&arch.layers) {
        if entry.name != shape.name
            || entry.in_features != shape.in_features
            || entry.out_features != shape.out_features
        {
            return Err(LoadError::ArchitectureMismatch {
                message: format!(
                    "{}: checkpoint [{} → {}], reference {} [{} → {}]",
                    entry.name,
                    entry.in_features,
                    entry.out_features,
                    shape.name,
                    shape.in_features,
                    shape.out_features
                ),
            });
        }
    }
    if manifest.activation != reference.activation() {
        return Err(LoadError::ArchitectureMismatch {
            message: format!(
                "checkpoint activation {}, reference {}",
                manifest.activation,
                reference.activation()
            ),
        });
    }
    Ok(())
}

fn read_layer(
    tensors: &SafeTensors<'_>,
    entry: &LayerEntry,
    path: &Path,
) -> Result<QuantizedLinear, LoadError> {
    let weight_name = format!("{}.weight", entry.name);
    let view = tensors
        .tensor(&weight_name)
        .map_err(|e| LoadError::malformed(path, format!("{weight_name}: {e}")))?;

    let shape = vec![entry.out_features, entry.in_features];
    if view.shape() != shape.as_slice() {
        return Err(LoadError::malformed(
            path,
            format!("{weight_name}: shape {:?}, manifest says {shape:?}", view.shape()),
        ));
    }

    let weight = match (&entry.params, view.dtype()) {
        (Some(params), Dtype::I8) => LayerWeight::Quantized(QuantizedTensor {
            data: bytemuck::cast_slice::<u8, i8>(view.data()).to_vec(),
            params: params.clone(),
            shape,
        }),
        (None, Dtype::F32) => {
            let values: Vec<f32> = bytemuck::pod_collect_to_vec(view.data());
            let w = Array2::from_shape_vec((entry.out_features, entry.in_features), values)
                .map_err(|e| LoadError::malformed(path, format!("{weight_name}: {e}")))?;
            LayerWeight::Float(w)
        }
        (params, dtype) => {
            return Err(LoadError::malformed(
                path,
                format!(
                    "{weight_name}: dtype {dtype:?} does not match {} layer",
                    if params.is_some() { "quantized" } else { "float" }
                ),
            ))
        }
    };

    let bias = if entry.has_bias {
        let bias_name = format!("{}.bias", entry.name);
        let view = tensors
            .tensor(&bias_name)
            .map_err(|e| LoadError::malformed(path, format!("{bias_name}: {e}")))?;
        if view.dtype() != Dtype::F32 {
            return Err(LoadError::malformed(path, format!("{bias_name}: expected F32")));
        }
        Some(Array1::from(bytemuck::pod_collect_to_vec::<u8, f32>(view.data())))
    } else {
        None
    };

    QuantizedLinear::from_parts(weight, bias)
        .map_err(|e| LoadError::malformed(path, format!("{}: {e}", entry.name)))
}

/// Rebuild the quantized network stored at `dir` onto `reference`'s skeleton
pub fn load(dir: &Path, reference: &Mlp) -> Result<QuantizedMlp, LoadError> {
    let manifest = read_manifest(dir)?;
    check_architecture(&manifest, reference)?;

    let path = dir.join(WEIGHTS_FILE);
    let bytes = std::fs::read(&path).map_err(|e| LoadError::io(&path, e))?;
    let actual = sha256_hex(&bytes);
    if actual != manifest.weights_sha256 {
        return Err(LoadError::ChecksumMismatch {
            path,
            expected: manifest.weights_sha256,
            actual,
        });
    }

    let tensors =
        SafeTensors::deserialize(&bytes).map_err(|e| LoadError::malformed(&path, e.to_string()))?;

    let layers = manifest
        .layers
        .iter()
        .map(|entry| {
            debug!("{}: restoring ({})", entry.name, if entry.params.is_some() { "int" } else { "f32" });
            read_layer(&tensors, entry, &path)
        })
        .collect::<Result<Vec<_>, _>>()?;

    let model = QuantizedMlp::new(layers, reference.activation(), manifest.config)
        .map_err(|e| LoadError::malformed(&path, e.to_string()))?;

    info!("Loaded quantized checkpoint from {}", dir.display());
    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nn::Module;
    use tempfile::TempDir;

    fn float_model() -> Mlp {
        Mlp::from_fn(&[4, 3, 2], Activation::Relu, |l, r, c| ((l + 2 * r + 3 * c) as f32 * 0.21).cos())
            .expect("valid mlp")
    }

    fn quantized(config: &QuantConfig) -> QuantizedMlp {
        QuantizedMlp::quantize(&float_model(), config).expect("quantize")
    }

    /// Edit the manifest in place; the weights digest stays valid
    fn rewrite_manifest(dir: &Path, edit: impl FnOnce(&mut CheckpointManifest)) {
        let mut manifest = read_manifest(dir).expect("manifest should load");
        edit(&mut manifest);
        let yaml = serde_yaml::to_string(&manifest).expect("manifest should serialize");
        std::fs::write(dir.join(CONFIG_FILE), yaml).expect("write should succeed");
    }

    fn layer_params(manifest: &mut CheckpointManifest, index: usize) -> &mut QuantParams {
        manifest.layers[index].params.as_mut().expect("layer should be quantized")
    }

    #[test]
    fn test_save_writes_both_files() {
        let dir = TempDir::new().expect("temp dir creation should succeed");
        let target = dir.path().join("nested").join("ckpt");

        save(&quantized(&QuantConfig::default()), &target).expect("save should succeed");

        assert!(target.join(CONFIG_FILE).is_file());
        assert!(target.join(WEIGHTS_FILE).is_file());
    }

    #[test]
    fn test_round_trip_is_exact() {
        let dir = TempDir::new().expect("temp dir creation should succeed");
        let original = quantized(&QuantConfig::default());
        save(&original, dir.path()).expect("save should succeed");

        let loaded = load(dir.path(), &float_model()).expect("load should succeed");
        assert_eq!(loaded, original);
    }

    #[test]
    fn test_round_trip_with_float_fallback_and_asymmetric() {
        let dir = TempDir::new().expect("temp dir creation should succeed");
        let config = QuantConfig::new(4)
            .with_mode(crate::quant::QuantMode::Asymmetric)
            .skip("layers.0");
        let original = quantized(&config);
        save(&original, dir.path()).expect("save should succeed");

        let loaded = load(dir.path(), &float_model()).expect("load should succeed");
        assert!(!loaded.layers()[0].is_quantized());
        assert!(loaded.layers()[1].is_quantized());

        let x = ndarray::array![[1.0, -2.0, 0.5, 3.0]];
        assert_eq!(loaded.forward(&x).ok(), original.forward(&x).ok());
    }

    #[test]
    fn test_manifest_contents() {
        let dir = TempDir::new().expect("temp dir creation should succeed");
        save(&quantized(&QuantConfig::default()), dir.path()).expect("save should succeed");

        let manifest = read_manifest(dir.path()).expect("manifest should load");
        assert_eq!(manifest.format_version, FORMAT_VERSION);
        assert_eq!(manifest.layers.len(), 2);
        assert_eq!(manifest.layers[1].in_features, 3);
        assert_eq!(manifest.weights_sha256.len(), 64);
    }

    #[test]
    fn test_missing_dir() {
        let result = load(Path::new("/nonexistent/ckpt"), &float_model());
        assert!(matches!(result, Err(LoadError::NotFound { .. })));
    }

    #[test]
    fn test_missing_weights_file() {
        let dir = TempDir::new().expect("temp dir creation should succeed");
        save(&quantized(&QuantConfig::default()), dir.path()).expect("save should succeed");
        std::fs::remove_file(dir.path().join(WEIGHTS_FILE)).expect("remove should succeed");

        let result = load(dir.path(), &float_model());
        assert!(matches!(result, Err(LoadError::NotFound { .. })));
    }

    #[test]
    fn test_corrupt_weights_fail_checksum() {
        let dir = TempDir::new().expect("temp dir creation should succeed");
        save(&quantized(&QuantConfig::default()), dir.path()).expect("save should succeed");

        let path = dir.path().join(WEIGHTS_FILE);
        let mut bytes = std::fs::read(&path).expect("read should succeed");
        let last = bytes.len() - 1;
        bytes[last] ^= 0xFF;
        std::fs::write(&path, bytes).expect("write should succeed");

        let result = load(dir.path(), &float_model());
        assert!(matches!(result, Err(LoadError::ChecksumMismatch { .. })));
    }

    #[test]
    fn test_garbage_manifest() {
        let dir = TempDir::new().expect("temp dir creation should succeed");
        std::fs::write(dir.path().join(CONFIG_FILE), "layers: [[[").expect("write should succeed");

        let result = load(dir.path(), &float_model());
        assert!(matches!(result, Err(LoadError::Malformed { .. })));
    }

    #[test]
    fn test_future_version_rejected() {
        let dir = TempDir::new().expect("temp dir creation should succeed");
        save(&quantized(&QuantConfig::default()), dir.path()).expect("save should succeed");

        let path = dir.path().join(CONFIG_FILE);
        let yaml = std::fs::read_to_string(&path).expect("read should succeed");
        std::fs::write(&path, yaml.replace("format_version: 1", "format_version: 2"))
            .expect("write should succeed");

        let result = load(dir.path(), &float_model());
        assert!(matches!(result, Err(LoadError::UnsupportedVersion { found: 2, .. })));
    }

    #[test]
    fn test_out_of_range_zero_point_rejected() {
        let dir = TempDir::new().expect("temp dir creation should succeed");
        let config = QuantConfig::default().with_mode(crate::quant::QuantMode::Asymmetric);
        save(&quantized(&config), dir.path()).expect("save should succeed");

        rewrite_manifest(dir.path(), |m| layer_params(m, 0).zero_points[0] = i32::MIN);

        let err = load(dir.path(), &float_model()).expect_err("zero-point out of range");
        assert!(matches!(err, LoadError::Malformed { .. }));
        assert!(err.to_string().contains("zero-point"));
    }

    #[test]
    fn test_per_channel_scale_count_must_match_rows() {
        let dir = TempDir::new().expect("temp dir creation should succeed");
        save(&quantized(&QuantConfig::default()), dir.path()).expect("save should succeed");

        // layers.0 is [3, 4]: four scales still divide its twelve codes evenly
        rewrite_manifest(dir.path(), |m| layer_params(m, 0).scales.push(1.0));

        let err = load(dir.path(), &float_model()).expect_err("extra scale");
        assert!(matches!(err, LoadError::Malformed { .. }));
        assert!(err.to_string().contains("4 scales for 3 groups"));
    }

    #[test]
    fn test_invalid_manifest_config_rejected() {
        let dir = TempDir::new().expect("temp dir creation should succeed");
        save(&quantized(&QuantConfig::default()), dir.path()).expect("save should succeed");

        rewrite_manifest(dir.path(), |m| m.config.bits = 12);

        let result = load(dir.path(), &float_model());
        assert!(matches!(result, Err(LoadError::Malformed { .. })));
        assert!(matches!(read_manifest(dir.path()), Err(LoadError::Malformed { .. })));
    }

    #[test]
    fn test_reference_layer_count_mismatch() {
        let dir = TempDir::new().expect("temp dir creation should succeed");
        save(&quantized(&QuantConfig::default()), dir.path()).expect("save should succeed");

        let deeper = Mlp::from_fn(&[4, 3, 2, 2], Activation::Relu, |_, _, _| 0.1).expect("valid mlp");
        let err = load(dir.path(), &deeper).expect_err("mismatch");
        assert!(matches!(err, LoadError::ArchitectureMismatch { .. }));
        assert!(err.to_string().contains("2 layers"));
    }

    #[test]
    fn test_reference_width_mismatch() {
        let dir = TempDir::new().expect("temp dir creation should succeed");
        save(&quantized(&QuantConfig::default()), dir.path()).expect("save should succeed");

        let wider = Mlp::from_fn(&[4, 5, 2], Activation::Relu, |_, _, _| 0.1).expect("valid mlp");
        let err = load(dir.path(), &wider).expect_err("mismatch");
        assert!(err.to_string().contains("layers.0"));
    }

    #[test]
    fn test_reference_activation_mismatch() {
        let dir = TempDir::new().expect("temp dir creation should succeed");
        save(&quantized(&QuantConfig::default()), dir.path()).expect("save should succeed");

        let tanh = Mlp::from_fn(&[4, 3, 2], Activation::Tanh, |_, _, _| 0.1).expect("valid mlp");
        let result = load(dir.path(), &tanh);
        assert!(matches!(result, Err(LoadError::ArchitectureMismatch { .. })));
    }
}
