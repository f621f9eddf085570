//! Quantization error metrics

/// Mean squared error between original and decoded values
///
/// Returns `f32::MAX` when lengths differ or the input is empty.
pub fn quantization_mse(original: &[f32], dequantized: &[f32]) -> f32 {
    if original.len() != dequantized.len() || original.is_empty() {
        return f32::MAX;
    }

    let sum_sq: f32 = original.iter().zip(dequantized).map(|(a, b)| (a - b).powi(2)).sum();
    sum_sq / original.len() as f32
}
