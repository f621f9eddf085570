//! Granularity and mode definitions

use serde::{Deserialize, Serialize};

/// How many scale/zero-point pairs a tensor gets
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum QuantGranularity {
    PerTensor,
    /// One pair per row of a `[out, in]` weight
    #[default]
    PerChannel,
    /// One pair per `n` consecutive values in row-major order
    PerGroup(usize),
}

/// Symmetric (zero-point fixed at 0) or asymmetric (min/max range)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum QuantMode {
    #[default]
    Symmetric,
    Asymmetric,
}
