//! Encode and decode with calibrated parameters

use super::{calibrate, QuantGranularity, QuantMode, QuantParams, QuantizedTensor};

/// Encode `values` to integer codes
pub fn quantize_with_params(values: &[f32], params: &QuantParams) -> Vec<i8> {
    let qmax_signed = ((1i32 << (params.bits - 1)) - 1) as f32;
    let qmin_signed = -qmax_signed - 1.0;
    let qmax_unsigned = ((1i32 << params.bits) - 1) as f32;
    let group_len = params.group_len(values.len());

    values
        .iter()
        .enumerate()
        .map(|(i, &val)| {
            let group = i / group_len;
            let scale = params.scales.get(group).copied().unwrap_or(1.0);
            match params.mode {
                QuantMode::Symmetric => (val / scale).round().clamp(qmin_signed, qmax_signed) as i8,
                QuantMode::Asymmetric => {
                    let zp = params.zero_points.get(group).copied().unwrap_or(0) as f32;
                    let q = (val / scale + zp).round().clamp(0.0, qmax_unsigned);
                    (q as i32 - 128) as i8
                }
            }
        })
        .collect()
}

/// Decode integer codes back to f32
pub fn dequantize_with_params(codes: &[i8], params: &QuantParams) -> Vec<f32> {
    let group_len = params.group_len(codes.len());

    codes
        .iter()
        .enumerate()
        .map(|(i, &q)| {
            let group = i / group_len;
            let scale = params.scales.get(group).copied().unwrap_or(1.0);
            match params.mode {
                QuantMode::Symmetric => f32::from(q) * scale,
                QuantMode::Asymmetric => {
                    let zp = params.zero_points.get(group).copied().unwrap_or(0);
                    (i64::from(q) + 128 - i64::from(zp)) as f32 * scale
                }
            }
        })
        .collect()
}

/// Calibrate and encode a tensor in one step
pub fn quantize_tensor(
    values: &[f32],
    shape: &[usize],
    granularity: QuantGranularity,
    mode: QuantMode,
    bits: u8,
) -> QuantizedTensor {
    let params = calibrate(values, shape, granularity, mode, bits);
    let data = quantize_with_params(values, &params);

    QuantizedTensor { data, params, shape: shape.to_vec() }
}
