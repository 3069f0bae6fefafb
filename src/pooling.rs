//! Engine-facing 2D pooling.
//!
//! Thin layer over the reference kernel: infers and validates output
//! shapes, constructs the value accessors for the tensors' data types, and
//! dispatches all-`f32` invocations to the batch-parallel slice path.

use refnn_kernels::{KernelError, PoolingDescriptor, TensorShape};

use crate::tensor::{
    make_decoder, make_encoder, DataType, Result, TensorData, TensorError, TensorInfo,
};

/// How a fractional pooled extent is turned into an output dimension.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputShapeRounding {
    /// Discard the final partial window.
    Floor,
    /// Keep the final partial window; it will be clamped at execution time.
    Ceil,
}

fn pooled_extent(
    input: usize,
    pad_before: usize,
    pad_after: usize,
    pool: usize,
    stride: usize,
    rounding: OutputShapeRounding,
) -> Result<usize> {
    let padded = input + pad_before + pad_after;
    if padded < pool {
        return Err(TensorError::InvalidConfiguration(format!(
            "pool extent {pool} exceeds padded input extent {padded}"
        )));
    }
    let span = padded - pool;
    let steps = match rounding {
        OutputShapeRounding::Floor => span / stride,
        OutputShapeRounding::Ceil => span.div_ceil(stride),
    };
    Ok(steps + 1)
}

fn check_descriptor(desc: &PoolingDescriptor) -> Result<()> {
    if desc.stride_x == 0 || desc.stride_y == 0 {
        return Err(TensorError::InvalidConfiguration(format!(
            "strides must be positive, got {}x{}",
            desc.stride_x, desc.stride_y
        )));
    }
    if desc.pool_width == 0 || desc.pool_height == 0 {
        return Err(TensorError::InvalidConfiguration(format!(
            "pool dimensions must be positive, got {}x{}",
            desc.pool_width, desc.pool_height
        )));
    }
    Ok(())
}

/// Computes the output shape of a pooling operation over `input`.
///
/// The batch and channel extents carry over unchanged; the spatial extents
/// follow `round((input + padding - pool) / stride) + 1` with the requested
/// rounding.
pub fn pooled_output_shape(
    input: &TensorInfo,
    desc: &PoolingDescriptor,
    rounding: OutputShapeRounding,
) -> Result<TensorShape> {
    check_descriptor(desc)?;
    let layout = desc.layout;
    let shape = input.shape();

    let out_height = pooled_extent(
        shape.dim(layout.height_index()),
        desc.pad_top,
        desc.pad_bottom,
        desc.pool_height,
        desc.stride_y,
        rounding,
    )?;
    let out_width = pooled_extent(
        shape.dim(layout.width_index()),
        desc.pad_left,
        desc.pad_right,
        desc.pool_width,
        desc.stride_x,
        rounding,
    )?;

    let mut dims = [0; 4];
    dims[0] = shape.dim(0);
    dims[layout.channels_index()] = shape.dim(layout.channels_index());
    dims[layout.height_index()] = out_height;
    dims[layout.width_index()] = out_width;
    Ok(TensorShape::new(dims))
}

/// Caller-side well-formedness checks, run before the kernel is invoked.
///
/// Accepts an output shape produced by either rounding mode, since both
/// occur in practice depending on the source framework.
pub fn validate_pool2d(
    input: &TensorInfo,
    output: &TensorInfo,
    desc: &PoolingDescriptor,
) -> Result<()> {
    let floor = pooled_output_shape(input, desc, OutputShapeRounding::Floor)?;
    if *output.shape() != floor {
        let ceil = pooled_output_shape(input, desc, OutputShapeRounding::Ceil)?;
        if *output.shape() != ceil {
            return Err(TensorError::ShapeMismatch {
                expected: floor.dims().to_vec(),
                got: output.shape().dims().to_vec(),
            });
        }
    }
    Ok(())
}

/// Runs reference 2D pooling from `input` into `output`.
///
/// Validates the descriptor and shapes, constructs decoders/encoders for
/// the tensors' data types and invokes the reference kernel. Nothing is
/// written on a validation failure.
pub fn pool2d(
    input_info: &TensorInfo,
    input: &TensorData,
    output_info: &TensorInfo,
    output: &mut TensorData,
    desc: &PoolingDescriptor,
) -> Result<()> {
    validate_pool2d(input_info, output_info, desc)?;

    // Canonical-float tensors skip accessor construction and pool each
    // batch in parallel.
    if input_info.data_type() == DataType::F32 && output_info.data_type() == DataType::F32 {
        if let (TensorData::F32(in_values), TensorData::F32(out_values)) = (input, &mut *output) {
            return refnn_kernels::pool2d_f32(
                in_values,
                out_values,
                input_info.shape(),
                output_info.shape(),
                desc,
            )
            .map_err(|e| match e {
                KernelError::InvalidConfiguration(msg) => TensorError::InvalidConfiguration(msg),
                KernelError::ShapeMismatch { expected, got } => {
                    TensorError::ShapeMismatch { expected, got }
                }
            });
        }
    }

    let decoder = make_decoder(input_info, input)?;
    let mut encoder = make_encoder(output_info, output)?;
    refnn_kernels::pool2d(
        &*decoder,
        &mut *encoder,
        input_info.shape(),
        output_info.shape(),
        desc,
    )
    .map_err(|e| match e {
        KernelError::InvalidConfiguration(msg) => TensorError::InvalidConfiguration(msg),
        KernelError::ShapeMismatch { expected, got } => {
            TensorError::ShapeMismatch { expected, got }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use refnn_kernels::DataLayout;

    fn info(dims: [usize; 4]) -> TensorInfo {
        TensorInfo::new(TensorShape::new(dims), DataType::F32)
    }

    #[test]
    fn test_pooled_extent_rounding() {
        // (7 - 3) / 2 = 2 exactly: both roundings agree.
        assert_eq!(
            pooled_extent(7, 0, 0, 3, 2, OutputShapeRounding::Floor).unwrap(),
            3
        );
        assert_eq!(
            pooled_extent(7, 0, 0, 3, 2, OutputShapeRounding::Ceil).unwrap(),
            3
        );
        // (8 - 3) / 2 = 2.5: floor discards the partial window, ceil keeps it.
        assert_eq!(
            pooled_extent(8, 0, 0, 3, 2, OutputShapeRounding::Floor).unwrap(),
            3
        );
        assert_eq!(
            pooled_extent(8, 0, 0, 3, 2, OutputShapeRounding::Ceil).unwrap(),
            4
        );
    }

    #[test]
    fn test_pooled_extent_rejects_oversized_pool() {
        assert!(pooled_extent(4, 0, 0, 5, 1, OutputShapeRounding::Floor).is_err());
        // Padding can make up the difference.
        assert_eq!(
            pooled_extent(4, 1, 0, 5, 1, OutputShapeRounding::Floor).unwrap(),
            1
        );
    }

    #[test]
    fn test_pooled_output_shape_per_layout() {
        let desc = PoolingDescriptor {
            stride_x: 2,
            stride_y: 2,
            pool_width: 2,
            pool_height: 2,
            ..Default::default()
        };
        let shape =
            pooled_output_shape(&info([2, 3, 8, 6]), &desc, OutputShapeRounding::Floor).unwrap();
        assert_eq!(shape.dims(), [2, 3, 4, 3]);

        let desc = PoolingDescriptor {
            layout: DataLayout::Nhwc,
            ..desc
        };
        let shape =
            pooled_output_shape(&info([2, 8, 6, 3]), &desc, OutputShapeRounding::Floor).unwrap();
        assert_eq!(shape.dims(), [2, 4, 3, 3]);
    }

    #[test]
    fn test_validate_accepts_both_roundings() {
        let desc = PoolingDescriptor {
            stride_x: 2,
            stride_y: 2,
            pool_width: 3,
            pool_height: 3,
            ..Default::default()
        };
        let input = info([1, 1, 8, 8]);
        assert!(validate_pool2d(&input, &info([1, 1, 3, 3]), &desc).is_ok());
        assert!(validate_pool2d(&input, &info([1, 1, 4, 4]), &desc).is_ok());
        assert!(validate_pool2d(&input, &info([1, 1, 5, 5]), &desc).is_err());
    }

    #[test]
    fn test_validate_rejects_zero_stride() {
        let desc = PoolingDescriptor {
            stride_x: 0,
            ..Default::default()
        };
        let err = validate_pool2d(&info([1, 1, 4, 4]), &info([1, 1, 4, 4]), &desc).unwrap_err();
        assert!(matches!(err, TensorError::InvalidConfiguration(_)));
    }
}
