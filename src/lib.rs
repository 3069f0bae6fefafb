//! # refnn
//!
//! `refnn` is the portable reference execution path of a neural-network
//! inference engine: plain CPU implementations that accelerated backends
//! (vector/GPU/NPU) are validated against bit-for-bit, and that the engine
//! falls back to when no accelerated kernel is registered.
//!
//! ## Modules
//!
//! - [`mod@tensor`]: engine-boundary tensor metadata ([`TensorInfo`],
//!   [`TensorData`]) and the canonical-float value accessors for each
//!   storage encoding.
//! - [`pooling`]: output-shape inference, descriptor validation and the
//!   engine entry point for 2D spatial pooling.
//! - The kernels themselves live in the dependency-free `refnn-kernels`
//!   crate, re-exported here as [`kernels`].
//!
//! ## Example
//!
//! ```rust
//! use refnn::{
//!     pool2d, pooled_output_shape, DataType, OutputShapeRounding, PoolingAlgorithm,
//!     PoolingDescriptor, TensorData, TensorInfo, TensorShape,
//! };
//!
//! let input_info = TensorInfo::new(TensorShape::new([1, 1, 4, 4]), DataType::F32);
//! let input = TensorData::F32((1..=16).map(|v| v as f32).collect());
//!
//! let desc = PoolingDescriptor {
//!     algorithm: PoolingAlgorithm::Max,
//!     stride_x: 2,
//!     stride_y: 2,
//!     pool_width: 2,
//!     pool_height: 2,
//!     ..Default::default()
//! };
//!
//! let output_shape = pooled_output_shape(&input_info, &desc, OutputShapeRounding::Floor).unwrap();
//! let output_info = TensorInfo::new(output_shape, DataType::F32);
//! let mut output = TensorData::zeroed(&output_info).unwrap();
//!
//! pool2d(&input_info, &input, &output_info, &mut output, &desc).unwrap();
//! assert_eq!(output.as_f32().unwrap(), &[6.0, 8.0, 14.0, 16.0]);
//! ```

pub use refnn_kernels as kernels;

pub mod pooling;
pub mod tensor;

pub use refnn_kernels::{
    DataLayout, Decoder, Encoder, KernelError, PaddingPolicy, PoolingAlgorithm, PoolingDescriptor,
    TensorShape,
};
pub use pooling::{pool2d, pooled_output_shape, validate_pool2d, OutputShapeRounding};
pub use tensor::{
    make_decoder, make_encoder, DataType, QuantizationInfo, TensorData, TensorError, TensorInfo,
};
