//! Acelerar: quantized model adapter
//!
//! Wraps a post-training quantized model behind the same inference call as
//! the float model it came from, and moves it to and from disk.
//!
//! - [`QuantizedModelAdapter`]: wrap a handle, load a checkpoint onto a float
//!   skeleton, save it back
//! - [`accelerated`]: the base capability every optimized variant shares
//! - [`quant`]: the default weight-only quantization toolkit
//! - [`nn`]: runnable model trait and the float reference network
//! - [`io`]: float model persistence

pub mod accelerated;
pub mod adapter;
pub mod cli;
pub mod error;
pub mod io;
pub mod nn;
pub mod quant;

pub use accelerated::{Accelerated, AcceleratedModel};
pub use adapter::QuantizedModelAdapter;
pub use error::{Error, LoadError, Result, SaveError};
