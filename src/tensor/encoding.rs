//! Conversion between physical storage encodings and canonical `f32`.
//!
//! The pooling kernel (and every other reference kernel) computes in `f32`.
//! Quantized tensors are decoded to canonical floats on read and re-encoded
//! on write; the kernel never sees the integer representation. Each
//! supported encoding gets a small decoder/encoder pair over borrowed
//! storage, and [`make_decoder`]/[`make_encoder`] select the right pair for
//! a [`TensorInfo`]/[`TensorData`] combination.

use num_traits::{Bounded, NumCast};
use refnn_kernels::{Decoder, Encoder};

use super::{DataType, QuantizationInfo, Result, TensorData, TensorError, TensorInfo};

/// Quantizes a canonical float to `Q` with affine parameters, saturating at
/// the representable range of `Q`.
///
/// `scale` must be positive; accessor construction rejects tensors with a
/// non-positive scale before this is ever called.
pub fn quantize<Q: Bounded + NumCast>(value: f32, scale: f32, offset: i32) -> Q {
    debug_assert!(scale > 0.0);
    // `as` on a float saturates toward the integer bounds, which is the
    // behaviour wanted here for overflowing values and NaN (NaN -> 0).
    let quantized = (value / scale).round() as i64 + offset as i64;
    let lo = Q::min_value().to_i64().unwrap_or(i64::MIN);
    let hi = Q::max_value().to_i64().unwrap_or(i64::MAX);
    Q::from(quantized.clamp(lo, hi)).expect("value clamped into the representable range")
}

/// Recovers the canonical float for a quantized value.
pub fn dequantize<Q: Into<i64>>(value: Q, scale: f32, offset: i32) -> f32 {
    debug_assert!(scale > 0.0);
    scale * (value.into() - offset as i64) as f32
}

/// Reads canonical storage as-is.
pub struct Float32Decoder<'a> {
    data: &'a [f32],
}

impl<'a> Float32Decoder<'a> {
    pub fn new(data: &'a [f32]) -> Self {
        Self { data }
    }
}

impl Decoder for Float32Decoder<'_> {
    fn get(&self, offset: usize) -> f32 {
        self.data[offset]
    }
}

pub struct Float32Encoder<'a> {
    data: &'a mut [f32],
}

impl<'a> Float32Encoder<'a> {
    pub fn new(data: &'a mut [f32]) -> Self {
        Self { data }
    }
}

impl Encoder for Float32Encoder<'_> {
    fn set(&mut self, offset: usize, value: f32) {
        self.data[offset] = value;
    }
}

/// Decodes asymmetric affine-quantized `u8` storage.
pub struct QAsymmU8Decoder<'a> {
    data: &'a [u8],
    quantization: QuantizationInfo,
}

impl<'a> QAsymmU8Decoder<'a> {
    pub fn new(data: &'a [u8], quantization: QuantizationInfo) -> Self {
        Self { data, quantization }
    }
}

impl Decoder for QAsymmU8Decoder<'_> {
    fn get(&self, offset: usize) -> f32 {
        dequantize(
            self.data[offset],
            self.quantization.scale,
            self.quantization.offset,
        )
    }
}

pub struct QAsymmU8Encoder<'a> {
    data: &'a mut [u8],
    quantization: QuantizationInfo,
}

impl<'a> QAsymmU8Encoder<'a> {
    pub fn new(data: &'a mut [u8], quantization: QuantizationInfo) -> Self {
        Self { data, quantization }
    }
}

impl Encoder for QAsymmU8Encoder<'_> {
    fn set(&mut self, offset: usize, value: f32) {
        self.data[offset] = quantize(value, self.quantization.scale, self.quantization.offset);
    }
}

/// Decodes symmetric quantized `i16` storage. Symmetric encodings carry no
/// offset, only a scale.
pub struct QSymmS16Decoder<'a> {
    data: &'a [i16],
    scale: f32,
}

impl<'a> QSymmS16Decoder<'a> {
    pub fn new(data: &'a [i16], scale: f32) -> Self {
        Self { data, scale }
    }
}

impl Decoder for QSymmS16Decoder<'_> {
    fn get(&self, offset: usize) -> f32 {
        dequantize(self.data[offset], self.scale, 0)
    }
}

pub struct QSymmS16Encoder<'a> {
    data: &'a mut [i16],
    scale: f32,
}

impl<'a> QSymmS16Encoder<'a> {
    pub fn new(data: &'a mut [i16], scale: f32) -> Self {
        Self { data, scale }
    }
}

impl Encoder for QSymmS16Encoder<'_> {
    fn set(&mut self, offset: usize, value: f32) {
        self.data[offset] = quantize(value, self.scale, 0);
    }
}

fn check_length(info: &TensorInfo, len: usize) -> Result<()> {
    if len != info.num_elements() {
        return Err(TensorError::ShapeMismatch {
            expected: vec![info.num_elements()],
            got: vec![len],
        });
    }
    Ok(())
}

fn check_quantization(info: &TensorInfo, symmetric: bool) -> Result<QuantizationInfo> {
    let quantization = info.quantization();
    if quantization.scale <= 0.0 {
        return Err(TensorError::InvalidConfiguration(format!(
            "quantization scale must be positive, got {}",
            quantization.scale
        )));
    }
    if symmetric && quantization.offset != 0 {
        return Err(TensorError::InvalidConfiguration(format!(
            "symmetric quantization requires a zero offset, got {}",
            quantization.offset
        )));
    }
    Ok(quantization)
}

/// Builds the canonical-float read view for a tensor.
///
/// Fails if the storage variant does not match the declared data type, the
/// buffer length disagrees with the shape, or the quantization parameters
/// are malformed. Unrecognized data types are rejected rather than guessed
/// at.
pub fn make_decoder<'a>(info: &TensorInfo, data: &'a TensorData) -> Result<Box<dyn Decoder + 'a>> {
    check_length(info, data.len())?;
    match (info.data_type(), data) {
        (DataType::F32, TensorData::F32(values)) => Ok(Box::new(Float32Decoder::new(values))),
        (DataType::QAsymmU8, TensorData::QAsymmU8(values)) => {
            let quantization = check_quantization(info, false)?;
            Ok(Box::new(QAsymmU8Decoder::new(values, quantization)))
        }
        (DataType::QSymmS16, TensorData::QSymmS16(values)) => {
            let quantization = check_quantization(info, true)?;
            Ok(Box::new(QSymmS16Decoder::new(values, quantization.scale)))
        }
        (data_type, _) => Err(TensorError::Unsupported(format!(
            "no decoder for {data_type:?} over this storage variant"
        ))),
    }
}

/// Builds the canonical-float write view for a tensor.
pub fn make_encoder<'a>(
    info: &TensorInfo,
    data: &'a mut TensorData,
) -> Result<Box<dyn Encoder + 'a>> {
    check_length(info, data.len())?;
    match (info.data_type(), data) {
        (DataType::F32, TensorData::F32(values)) => Ok(Box::new(Float32Encoder::new(values))),
        (DataType::QAsymmU8, TensorData::QAsymmU8(values)) => {
            let quantization = check_quantization(info, false)?;
            Ok(Box::new(QAsymmU8Encoder::new(values, quantization)))
        }
        (DataType::QSymmS16, TensorData::QSymmS16(values)) => {
            let quantization = check_quantization(info, true)?;
            Ok(Box::new(QSymmS16Encoder::new(values, quantization.scale)))
        }
        (data_type, _) => Err(TensorError::Unsupported(format!(
            "no encoder for {data_type:?} over this storage variant"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use refnn_kernels::TensorShape;

    #[test]
    fn test_quantize_roundtrip_u8() {
        let scale = 0.5;
        let offset = 128;
        for value in [-64.0f32, -0.5, 0.0, 0.5, 63.5] {
            let q: u8 = quantize(value, scale, offset);
            assert_eq!(dequantize(q, scale, offset), value);
        }
    }

    #[test]
    fn test_quantize_saturates() {
        assert_eq!(quantize::<u8>(1000.0, 1.0, 0), 255);
        assert_eq!(quantize::<u8>(-1000.0, 1.0, 0), 0);
        assert_eq!(quantize::<i16>(1.0e9, 1.0, 0), i16::MAX);
        assert_eq!(quantize::<i16>(-1.0e9, 1.0, 0), i16::MIN);
    }

    #[test]
    fn test_quantize_rounds_to_nearest() {
        assert_eq!(quantize::<u8>(1.6, 1.0, 0), 2);
        assert_eq!(quantize::<u8>(1.4, 1.0, 0), 1);
    }

    #[test]
    fn test_symmetric_s16() {
        let scale = 0.25;
        let q: i16 = quantize(-3.75, scale, 0);
        assert_eq!(q, -15);
        assert_eq!(dequantize(q, scale, 0), -3.75);
    }

    #[test]
    fn test_decoder_dequantizes() {
        let quantization = QuantizationInfo {
            scale: 2.0,
            offset: 10,
        };
        let data = vec![10u8, 11, 9];
        let decoder = QAsymmU8Decoder::new(&data, quantization);
        assert_eq!(decoder.get(0), 0.0);
        assert_eq!(decoder.get(1), 2.0);
        assert_eq!(decoder.get(2), -2.0);
    }

    #[test]
    fn test_encoder_quantizes() {
        let quantization = QuantizationInfo {
            scale: 2.0,
            offset: 10,
        };
        let mut data = vec![0u8; 2];
        let mut encoder = QAsymmU8Encoder::new(&mut data, quantization);
        encoder.set(0, 4.0);
        encoder.set(1, -2.0);
        assert_eq!(data, vec![12, 9]);
    }

    #[test]
    fn test_factory_rejects_mismatched_storage() {
        let info = TensorInfo::new(TensorShape::new([1, 1, 1, 2]), DataType::F32);
        let data = TensorData::QAsymmU8(vec![0, 0]);
        assert!(matches!(
            make_decoder(&info, &data),
            Err(TensorError::Unsupported(_))
        ));
    }

    #[test]
    fn test_factory_rejects_bad_scale() {
        let info = TensorInfo::quantized(
            TensorShape::new([1, 1, 1, 2]),
            DataType::QAsymmU8,
            QuantizationInfo {
                scale: 0.0,
                offset: 0,
            },
        );
        let data = TensorData::QAsymmU8(vec![0, 0]);
        assert!(matches!(
            make_decoder(&info, &data),
            Err(TensorError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_factory_rejects_wrong_length() {
        let info = TensorInfo::new(TensorShape::new([1, 1, 1, 3]), DataType::F32);
        let data = TensorData::F32(vec![0.0; 2]);
        assert!(matches!(
            make_decoder(&info, &data),
            Err(TensorError::ShapeMismatch { .. })
        ));
    }
}
