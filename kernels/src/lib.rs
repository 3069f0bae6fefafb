//! Portable reference kernels for the `refnn` inference engine.
//!
//! Everything in this crate is plain, single-purpose CPU code: it is the
//! oracle that accelerated backends (vector/GPU/NPU) are validated against,
//! and the execution path of last resort when no accelerated kernel is
//! registered for an operation. The crate deliberately has no dependency on
//! the engine-facing `refnn` crate, so backends can link it in isolation.

use thiserror::Error;

pub mod accessor;
pub mod descriptor;
pub mod layout;
pub mod pool2d;

pub use accessor::{Decoder, Encoder};
pub use descriptor::{PaddingPolicy, PoolingAlgorithm, PoolingDescriptor};
pub use layout::{DataLayout, TensorShape};
pub use pool2d::{pool2d, pool2d_f32};

#[derive(Error, Debug)]
pub enum KernelError {
    /// The descriptor asks for something this kernel does not implement.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
    /// Tensor shapes or buffer lengths are inconsistent with each other.
    #[error("Shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        got: Vec<usize>,
    },
}

pub type Result<T> = std::result::Result<T, KernelError>;
