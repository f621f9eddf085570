//! Verify command implementation

use crate::cli::args::VerifyArgs;
use crate::io::load_float_model;
use crate::nn::Module;
use crate::QuantizedModelAdapter;
use ndarray::Array2;
use tracing::debug;

/// Deterministic probe batch in [-1, 1]
pub(super) fn probe_input(rows: usize, cols: usize) -> Array2<f32> {
    Array2::from_shape_fn((rows, cols), |(r, c)| ((r * cols + c) as f32 * 0.37).sin())
}

/// Largest absolute element-wise difference
pub(super) fn max_abs_diff(a: &Array2<f32>, b: &Array2<f32>) -> f32 {
    a.iter().zip(b.iter()).fold(0.0f32, |m, (x, y)| m.max((x - y).abs()))
}

pub fn run_verify(args: VerifyArgs) -> Result<(), String> {
    let reference = load_float_model(&args.reference).map_err(|e| e.to_string())?;
    let adapter =
        QuantizedModelAdapter::load(&args.checkpoint, &reference).map_err(|e| e.to_string())?;

    let in_features = reference.layers().first().map_or(0, |l| l.in_features());
    let x = probe_input(args.batch.max(1), in_features);
    debug!("Probe batch [{} x {in_features}]", x.nrows());

    let expected = reference.forward(&x).map_err(|e| e.to_string())?;
    let actual = adapter.forward(&x).map_err(|e| e.to_string())?;
    let diff = max_abs_diff(&expected, &actual);

    println!("Loaded {} on {}", args.checkpoint.display(), adapter.device());
    println!("Max |float - quantized|: {diff:.6}");

    match args.tolerance {
        Some(tol) if diff > tol => Err(format!("difference {diff:.6} exceeds tolerance {tol}")),
        _ => Ok(()),
    }
}
