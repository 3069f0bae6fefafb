//! Pooling configuration.

use crate::layout::DataLayout;

/// How a window of input values is reduced to one output value.
///
/// Marked `#[non_exhaustive]`: descriptors originate outside this crate and
/// may grow new algorithms before every backend learns about them, so
/// matches on this enum keep an explicit rejection arm instead of assuming
/// the set is closed.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PoolingAlgorithm {
    Max,
    Average,
    L2,
}

/// Whether padding positions count toward the averaging divisor.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PaddingPolicy {
    /// The divisor counts only real input cells covered by the window.
    Exclude,
    /// The divisor counts padding positions as zero-valued samples.
    IncludeAsZero,
}

/// Configuration for one pooling invocation. Immutable for the duration of
/// the call.
///
/// Basic well-formedness (positive strides and pool dimensions,
/// non-negative padding by construction) is the caller's responsibility;
/// the kernel itself only rejects algorithm and padding-policy values it
/// does not implement.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PoolingDescriptor {
    pub algorithm: PoolingAlgorithm,
    pub pad_left: usize,
    pub pad_right: usize,
    pub pad_top: usize,
    pub pad_bottom: usize,
    pub stride_x: usize,
    pub stride_y: usize,
    pub pool_width: usize,
    pub pool_height: usize,
    pub padding_policy: PaddingPolicy,
    pub layout: DataLayout,
}

impl Default for PoolingDescriptor {
    /// 1x1 max pooling with unit stride and no padding: the identity
    /// configuration, useful as a base to override from.
    fn default() -> Self {
        Self {
            algorithm: PoolingAlgorithm::Max,
            pad_left: 0,
            pad_right: 0,
            pad_top: 0,
            pad_bottom: 0,
            stride_x: 1,
            stride_y: 1,
            pool_width: 1,
            pool_height: 1,
            padding_policy: PaddingPolicy::Exclude,
            layout: DataLayout::Nchw,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_identity_pooling() {
        let desc = PoolingDescriptor::default();
        assert_eq!(desc.algorithm, PoolingAlgorithm::Max);
        assert_eq!(desc.pool_width, 1);
        assert_eq!(desc.pool_height, 1);
        assert_eq!(desc.stride_x, 1);
        assert_eq!(desc.stride_y, 1);
        assert_eq!(
            desc.pad_left + desc.pad_right + desc.pad_top + desc.pad_bottom,
            0
        );
        assert_eq!(desc.layout, DataLayout::Nchw);
    }
}
