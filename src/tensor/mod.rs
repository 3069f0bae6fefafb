//! Tensor metadata at the engine boundary.
//!
//! Kernels operate on shapes and value accessors only; everything the
//! engine knows about a tensor beyond its shape (element data type,
//! quantization parameters) lives here and is consumed when accessors are
//! constructed. A [`TensorInfo`] describes a tensor, a [`TensorData`] holds
//! its untyped storage, and [`encoding`] binds the two together as
//! canonical-float decoders and encoders.

use refnn_kernels::TensorShape;
use thiserror::Error;

pub mod encoding;

pub use encoding::{
    dequantize, make_decoder, make_encoder, quantize, Float32Decoder, Float32Encoder,
    QAsymmU8Decoder, QAsymmU8Encoder, QSymmS16Decoder, QSymmS16Encoder,
};

/// Error type for engine-boundary tensor operations.
#[derive(Error, Debug)]
pub enum TensorError {
    /// Shapes or buffer lengths are inconsistent with each other.
    #[error("Shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        got: Vec<usize>,
    },
    /// A descriptor or quantization parameter set is malformed.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
    /// The requested operation is not supported for this data type or
    /// storage combination.
    #[error("Unsupported operation: {0}")]
    Unsupported(String),
}

pub type Result<T> = std::result::Result<T, TensorError>;

/// Element data types the reference path can decode and encode.
///
/// `#[non_exhaustive]`: the engine grows data types faster than backends
/// implement them, so accessor construction rejects unknown values instead
/// of assuming the set is closed.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DataType {
    /// Canonical 32-bit float.
    F32,
    /// Asymmetric affine-quantized unsigned 8-bit.
    QAsymmU8,
    /// Symmetric (zero-offset) quantized signed 16-bit.
    QSymmS16,
}

/// Affine quantization parameters: `real = scale * (quantized - offset)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct QuantizationInfo {
    pub scale: f32,
    pub offset: i32,
}

impl Default for QuantizationInfo {
    fn default() -> Self {
        Self {
            scale: 1.0,
            offset: 0,
        }
    }
}

/// Shape, element type and quantization parameters of one tensor.
///
/// The pooling kernel reads only the shape; the data type and quantization
/// parameters select and configure the value accessors.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TensorInfo {
    shape: TensorShape,
    data_type: DataType,
    quantization: QuantizationInfo,
}

impl TensorInfo {
    pub fn new(shape: TensorShape, data_type: DataType) -> Self {
        Self {
            shape,
            data_type,
            quantization: QuantizationInfo::default(),
        }
    }

    pub fn quantized(
        shape: TensorShape,
        data_type: DataType,
        quantization: QuantizationInfo,
    ) -> Self {
        Self {
            shape,
            data_type,
            quantization,
        }
    }

    pub fn shape(&self) -> &TensorShape {
        &self.shape
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    pub fn quantization(&self) -> QuantizationInfo {
        self.quantization
    }

    pub fn num_elements(&self) -> usize {
        self.shape.num_elements()
    }
}

/// Untyped tensor storage, one buffer per supported data type.
#[derive(Clone, Debug, PartialEq)]
pub enum TensorData {
    F32(Vec<f32>),
    QAsymmU8(Vec<u8>),
    QSymmS16(Vec<i16>),
}

impl TensorData {
    /// Allocates zero-filled storage matching `info`.
    pub fn zeroed(info: &TensorInfo) -> Result<Self> {
        let len = info.num_elements();
        match info.data_type() {
            DataType::F32 => Ok(TensorData::F32(vec![0.0; len])),
            DataType::QAsymmU8 => Ok(TensorData::QAsymmU8(vec![0; len])),
            DataType::QSymmS16 => Ok(TensorData::QSymmS16(vec![0; len])),
            #[allow(unreachable_patterns)]
            other => Err(TensorError::Unsupported(format!(
                "no storage representation for {other:?}"
            ))),
        }
    }

    /// Number of elements held, independent of the element type.
    pub fn len(&self) -> usize {
        match self {
            TensorData::F32(values) => values.len(),
            TensorData::QAsymmU8(values) => values.len(),
            TensorData::QSymmS16(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_f32(&self) -> Option<&[f32]> {
        match self {
            TensorData::F32(values) => Some(values),
            _ => None,
        }
    }

    pub fn as_f32_mut(&mut self) -> Option<&mut [f32]> {
        match self {
            TensorData::F32(values) => Some(values),
            _ => None,
        }
    }
}
