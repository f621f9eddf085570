//! Float reference model persistence (SafeTensors)
//!
//! Tensors are named `layers.{i}.weight` (`[out, in]`) and `layers.{i}.bias`;
//! the activation is kept in the header metadata.

mod load;
mod save;

pub use load::load_float_model;
pub use save::save_float_model;

const ACTIVATION_KEY: &str = "activation";
const FORMAT_KEY: &str = "format";
const FORMAT_NAME: &str = "acelerar-float";
