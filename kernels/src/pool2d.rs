//! Reference 2D spatial pooling.
//!
//! This is the semantics every accelerated pooling implementation must
//! reproduce bit-for-bit: one pass over the output tensor, each element
//! reduced from a window of the input selected by stride and padding, with
//! clamped partial windows at the edges and two conventions for how padding
//! counts toward the averaging divisor.

use rayon::prelude::*;

use crate::accessor::{Decoder, Encoder};
use crate::descriptor::{PaddingPolicy, PoolingAlgorithm, PoolingDescriptor};
use crate::layout::TensorShape;
use crate::{KernelError, Result};

/// Per-algorithm (initial, accumulate, finalize) triple.
///
/// Resolved from the descriptor once per call and dispatched with a plain
/// `match` in the hot loop, so there is no per-pixel indirect call.
#[derive(Clone, Copy, Debug)]
enum PoolStrategy {
    Max,
    Average,
    L2,
}

impl PoolStrategy {
    fn initial(self) -> f32 {
        match self {
            // Most negative representable value, not -inf: any value read
            // from the input replaces it, and windows that clamp to
            // emptiness surface it unchanged.
            PoolStrategy::Max => f32::MIN,
            PoolStrategy::Average | PoolStrategy::L2 => 0.0,
        }
    }

    fn accumulate(self, acc: f32, value: f32) -> f32 {
        match self {
            PoolStrategy::Max => {
                if value > acc {
                    value
                } else {
                    acc
                }
            }
            PoolStrategy::Average => acc + value,
            PoolStrategy::L2 => acc + value * value,
        }
    }

    fn finalize(self, acc: f32, area: f32) -> f32 {
        match self {
            PoolStrategy::Max => acc,
            PoolStrategy::Average => acc / area,
            PoolStrategy::L2 => (acc / area).sqrt(),
        }
    }
}

/// Validates the parts of the descriptor this kernel dispatches on.
///
/// Runs once per call, before any output is written, so a configuration
/// error never leaves a partially written tensor behind.
fn resolve_config(desc: &PoolingDescriptor) -> Result<PoolStrategy> {
    let strategy = match desc.algorithm {
        PoolingAlgorithm::Max => PoolStrategy::Max,
        PoolingAlgorithm::Average => PoolStrategy::Average,
        PoolingAlgorithm::L2 => PoolStrategy::L2,
        #[allow(unreachable_patterns)]
        other => {
            return Err(KernelError::InvalidConfiguration(format!(
                "unsupported pooling algorithm {other:?}"
            )))
        }
    };
    match desc.padding_policy {
        PaddingPolicy::Exclude | PaddingPolicy::IncludeAsZero => {}
        #[allow(unreachable_patterns)]
        other => {
            return Err(KernelError::InvalidConfiguration(format!(
                "unsupported padding policy {other:?}"
            )))
        }
    }
    Ok(strategy)
}

/// The pooling window projected onto one axis, resolved against the input
/// extent: a half-open range `[start, end)` of real input coordinates.
#[derive(Clone, Copy, Debug)]
struct AxisWindow {
    start: usize,
    end: usize,
    /// Window length before clamping to the input (but after capping to the
    /// padding envelope): what the divisor uses when padding counts as
    /// zero-valued samples.
    padded_len: usize,
    /// Whether clamping to `[0, input]` changed either bound.
    clamped: bool,
    /// The window has no overlap with real-or-declared-padding space on
    /// this axis.
    degenerate: bool,
}

fn resolve_axis(
    out_coord: usize,
    stride: usize,
    pad_before: usize,
    pad_after: usize,
    pool: usize,
    input_size: usize,
) -> AxisWindow {
    let input = input_size as i64;
    let start = (out_coord * stride) as i64 - pad_before as i64;
    // The final window in a row/column may overrun the declared padding
    // when the stride does not evenly divide the padded extent; it is
    // bounded by the padding envelope, never by the pool size alone.
    let end = (start + pool as i64).min(input + pad_after as i64);

    // Entirely above/left of the input (end <= 0, non-strict) or entirely
    // below/right of it (start > input, strict). The asymmetry at the exact
    // bounds is intentional: a window starting exactly at `input` still
    // counts as (an empty) overlap.
    if end <= 0 || start > input {
        return AxisWindow {
            start: 0,
            end: 0,
            padded_len: 0,
            clamped: false,
            degenerate: true,
        };
    }

    let padded_len = (end - start) as usize;
    let clamped_start = start.clamp(0, input);
    let clamped_end = end.clamp(0, input);
    AxisWindow {
        start: clamped_start as usize,
        end: clamped_end as usize,
        padded_len,
        clamped: clamped_start != start || clamped_end != end,
        degenerate: false,
    }
}

/// The divisor used by Average and L2 for this window.
fn pool_area(row: &AxisWindow, col: &AxisWindow, policy: PaddingPolicy) -> f32 {
    let area = match policy {
        PaddingPolicy::Exclude if row.clamped || col.clamped => {
            (row.end - row.start) * (col.end - col.start)
        }
        // Unclamped windows have identical real and padded extents.
        PaddingPolicy::Exclude => row.padded_len * col.padded_len,
        PaddingPolicy::IncludeAsZero => row.padded_len * col.padded_len,
    };
    area as f32
}

/// Reference pooling driver.
///
/// Populates every element of the output tensor, in batch, channel, row,
/// column order, reading the input through `decoder` and writing through
/// `encoder` at offsets computed from `desc.layout`. Windows that fall
/// entirely outside both the input and its declared padding produce exactly
/// `0.0`, for every algorithm.
///
/// The kernel holds no state across calls and borrows the accessors only
/// for the call's duration; independent invocations may run concurrently.
///
/// # Errors
///
/// [`KernelError::InvalidConfiguration`] for an algorithm or padding policy
/// the kernel does not implement, and [`KernelError::ShapeMismatch`] when
/// input and output disagree on batch or channel extents. Both are detected
/// before the first write.
pub fn pool2d<D, E>(
    decoder: &D,
    encoder: &mut E,
    input_shape: &TensorShape,
    output_shape: &TensorShape,
    desc: &PoolingDescriptor,
) -> Result<()>
where
    D: Decoder + ?Sized,
    E: Encoder + ?Sized,
{
    let strategy = resolve_config(desc)?;

    let layout = desc.layout;
    let batch = output_shape.dim(0);
    let channels = output_shape.dim(layout.channels_index());
    let out_height = output_shape.dim(layout.height_index());
    let out_width = output_shape.dim(layout.width_index());
    let in_height = input_shape.dim(layout.height_index());
    let in_width = input_shape.dim(layout.width_index());

    if input_shape.dim(0) != batch || input_shape.dim(layout.channels_index()) != channels {
        return Err(KernelError::ShapeMismatch {
            expected: vec![batch, channels],
            got: vec![input_shape.dim(0), input_shape.dim(layout.channels_index())],
        });
    }

    for n in 0..batch {
        // Row geometry does not depend on the channel or column, so it is
        // resolved once per (batch, row) pair.
        let row_windows: Vec<AxisWindow> = (0..out_height)
            .map(|y_out| {
                resolve_axis(
                    y_out,
                    desc.stride_y,
                    desc.pad_top,
                    desc.pad_bottom,
                    desc.pool_height,
                    in_height,
                )
            })
            .collect();

        for c in 0..channels {
            for (y_out, row) in row_windows.iter().enumerate() {
                for x_out in 0..out_width {
                    let col = resolve_axis(
                        x_out,
                        desc.stride_x,
                        desc.pad_left,
                        desc.pad_right,
                        desc.pool_width,
                        in_width,
                    );

                    let out_offset = layout.index(output_shape, n, c, y_out, x_out);

                    // All-padding window: 0 by convention, regardless of
                    // the algorithm. Every value the window covers is
                    // padding, and padding carries no value to pick.
                    if row.degenerate || col.degenerate {
                        encoder.set(out_offset, 0.0);
                        continue;
                    }

                    let area = pool_area(row, &col, desc.padding_policy);

                    let mut acc = strategy.initial();
                    for y_in in row.start..row.end {
                        for x_in in col.start..col.end {
                            let offset = layout.index(input_shape, n, c, y_in, x_in);
                            acc = strategy.accumulate(acc, decoder.get(offset));
                        }
                    }

                    encoder.set(out_offset, strategy.finalize(acc, area));
                }
            }
        }
    }

    Ok(())
}

/// Batch-parallel pooling over canonical `f32` slices.
///
/// Runs the reference driver on each batch independently. The batch
/// dimension is outermost under both layouts, so every worker owns one
/// contiguous block of the output and reads one contiguous block of the
/// input; per-element results are bit-identical to [`pool2d`].
pub fn pool2d_f32(
    input: &[f32],
    output: &mut [f32],
    input_shape: &TensorShape,
    output_shape: &TensorShape,
    desc: &PoolingDescriptor,
) -> Result<()> {
    if input.len() != input_shape.num_elements() {
        return Err(KernelError::ShapeMismatch {
            expected: vec![input_shape.num_elements()],
            got: vec![input.len()],
        });
    }
    if output.len() != output_shape.num_elements() {
        return Err(KernelError::ShapeMismatch {
            expected: vec![output_shape.num_elements()],
            got: vec![output.len()],
        });
    }
    if input_shape.dim(0) != output_shape.dim(0) {
        return Err(KernelError::ShapeMismatch {
            expected: vec![output_shape.dim(0)],
            got: vec![input_shape.dim(0)],
        });
    }

    // Fail on configuration before any batch runs, not inside the fan-out.
    resolve_config(desc)?;

    if output.is_empty() {
        return Ok(());
    }

    let in_sub = input_shape.with_batch(1);
    let out_sub = output_shape.with_batch(1);
    let in_block = in_sub.num_elements();
    let out_block = out_sub.num_elements();

    output
        .par_chunks_mut(out_block)
        .enumerate()
        .try_for_each(|(n, out_chunk)| {
            let in_chunk = &input[n * in_block..(n + 1) * in_block];
            pool2d(in_chunk, out_chunk, &in_sub, &out_sub, desc)
        })
}
