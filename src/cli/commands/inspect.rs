//! Inspect command implementation

use crate::cli::args::InspectArgs;
use crate::quant::read_manifest;

pub fn run_inspect(args: InspectArgs) -> Result<(), String> {
    let manifest = read_manifest(&args.checkpoint).map_err(|e| e.to_string())?;

    if args.json {
        let json = serde_json::to_string_pretty(&manifest).map_err(|e| e.to_string())?;
        println!("{json}");
        return Ok(());
    }

    println!("Checkpoint: {}", args.checkpoint.display());
    println!("  Format version: {}", manifest.format_version);
    println!("  Created:        {}", manifest.created_at.to_rfc3339());
    println!(
        "  Scheme:         {}-bit {:?} {:?}",
        manifest.config.bits, manifest.config.mode, manifest.config.granularity
    );
    println!("  Activation:     {}", manifest.activation);
    println!("  Weights SHA256: {}", manifest.weights_sha256);
    println!("  Layers:");
    for layer in &manifest.layers {
        let kind = match &layer.params {
            Some(p) => format!("int{} ({} scales)", p.bits, p.num_groups()),
            None => "f32".to_string(),
        };
        println!(
            "    {:<12} [{} → {}] {}{}",
            layer.name,
            layer.in_features,
            layer.out_features,
            kind,
            if layer.has_bias { " +bias" } else { "" }
        );
    }
    Ok(())
}
