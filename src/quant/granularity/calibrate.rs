//! Min/max calibration for each granularity

use super::{QuantGranularity, QuantMode, QuantParams};

const MIN_RANGE: f32 = 1e-8;

/// Scale and zero-point covering `values`
fn range_params(values: &[f32], bits: u8, mode: QuantMode) -> (f32, i32) {
    match mode {
        QuantMode::Symmetric => {
            let max_abs = values.iter().fold(0.0f32, |m, v| m.max(v.abs())).max(MIN_RANGE);
            let qmax = ((1i32 << (bits - 1)) - 1) as f32;
            (max_abs / qmax, 0)
        }
        QuantMode::Asymmetric => {
            let (min_val, max_val) = values
                .iter()
                .fold((f32::MAX, f32::MIN), |(lo, hi), &v| (lo.min(v), hi.max(v)));
            // Keep zero exactly representable
            let (min_val, max_val) = (min_val.min(0.0), max_val.max(0.0));

            let qmax = ((1i32 << bits) - 1) as f32;
            let scale = (max_val - min_val).max(MIN_RANGE) / qmax;
            let zero_point = ((-min_val / scale).round() as i32).clamp(0, qmax as i32);
            (scale, zero_point)
        }
    }
}

fn collect_params(
    chunks: impl Iterator<Item = (f32, i32)>,
    granularity: QuantGranularity,
    bits: u8,
    mode: QuantMode,
) -> QuantParams {
    let (scales, zero_points): (Vec<f32>, Vec<i32>) = chunks.unzip();
    QuantParams {
        scales,
        zero_points: if mode == QuantMode::Asymmetric { zero_points } else { vec![] },
        granularity,
        mode,
        bits,
    }
}

/// One scale for the whole tensor
pub fn calibrate_per_tensor(values: &[f32], bits: u8, mode: QuantMode) -> QuantParams {
    collect_params(
        std::iter::once(range_params(values, bits, mode)),
        QuantGranularity::PerTensor,
        bits,
        mode,
    )
}

/// One scale per row of a row-major `[num_channels, features]` tensor
pub fn calibrate_per_channel(
    values: &[f32],
    num_channels: usize,
    bits: u8,
    mode: QuantMode,
) -> QuantParams {
    if num_channels == 0 || values.is_empty() {
        return collect_params(
            std::iter::once((1.0, 0)),
            QuantGranularity::PerChannel,
            bits,
            mode,
        );
    }

    let features = (values.len() / num_channels).max(1);
    collect_params(
        values.chunks(features).map(|row| range_params(row, bits, mode)),
        QuantGranularity::PerChannel,
        bits,
        mode,
    )
}

/// One scale per `group_size` consecutive values; the last group may be short
pub fn calibrate_per_group(
    values: &[f32],
    group_size: usize,
    bits: u8,
    mode: QuantMode,
) -> QuantParams {
    let group_size = group_size.max(1);
    collect_params(
        values.chunks(group_size).map(|g| range_params(g, bits, mode)),
        QuantGranularity::PerGroup(group_size),
        bits,
        mode,
    )
}

/// Dispatch on granularity; `shape[0]` is the channel count
pub fn calibrate(
    values: &[f32],
    shape: &[usize],
    granularity: QuantGranularity,
    mode: QuantMode,
    bits: u8,
) -> QuantParams {
    match granularity {
        QuantGranularity::PerTensor => calibrate_per_tensor(values, bits, mode),
        QuantGranularity::PerChannel => {
            calibrate_per_channel(values, shape.first().copied().unwrap_or(1), bits, mode)
        }
        QuantGranularity::PerGroup(size) => calibrate_per_group(values, size, bits, mode),
    }
}
