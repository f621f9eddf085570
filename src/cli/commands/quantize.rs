//! Quantize command implementation

use crate::cli::args::{GranularityArg, QuantMethod, QuantizeArgs};
use crate::io::load_float_model;
use crate::quant::{PostTrainingQuantizer, QuantConfig, QuantGranularity, QuantMode};
use crate::QuantizedModelAdapter;
use tracing::info;

/// Start from the config file (or defaults) and apply flag overrides
fn resolve_config(args: &QuantizeArgs) -> Result<QuantConfig, String> {
    let mut config = match &args.config {
        Some(path) => QuantConfig::from_yaml_file(path).map_err(|e| e.to_string())?,
        None => QuantConfig::default(),
    };

    if let Some(bits) = args.bits {
        config.bits = bits;
    }
    if let Some(method) = args.method {
        config.mode = match method {
            QuantMethod::Symmetric => QuantMode::Symmetric,
            QuantMethod::Asymmetric => QuantMode::Asymmetric,
        };
    }
    if let Some(granularity) = args.granularity {
        config.granularity = match granularity {
            GranularityArg::Tensor => QuantGranularity::PerTensor,
            GranularityArg::Channel => QuantGranularity::PerChannel,
            GranularityArg::Group => QuantGranularity::PerGroup(args.group_size),
        };
    }
    config.skip_layers.extend(args.skip.iter().cloned());

    config.validate().map_err(|e| e.to_string())?;
    Ok(config)
}

pub fn run_quantize(args: QuantizeArgs) -> Result<(), String> {
    let config = resolve_config(&args)?;
    info!("Quantizing {} to {}-bit", args.model.display(), config.bits);

    let model = load_float_model(&args.model).map_err(|e| e.to_string())?;
    let (handle, report) = PostTrainingQuantizer::new(config)
        .quantize_with_report(&model)
        .map_err(|e| e.to_string())?;

    let adapter = QuantizedModelAdapter::new(handle);
    adapter.save(&args.output).map_err(|e| e.to_string())?;

    if args.json {
        let json = serde_json::to_string_pretty(&report).map_err(|e| e.to_string())?;
        println!("{json}");
    } else {
        println!("{report}");
        println!("Saved to {}", args.output.display());
    }
    Ok(())
}
