//! Tensor shapes and data-layout aware flat indexing.
//!
//! All kernel storage is row-major. Where the channel dimension sits
//! relative to the spatial dimensions is a property of the tensor, not of
//! the kernel, so every coordinate-to-offset conversion goes through
//! [`DataLayout::index`] instead of hand-rolled stride math.

/// The shape of a rank-4 tensor: batch first, then three dimensions whose
/// meaning (channels/height/width) is assigned by a [`DataLayout`].
///
/// Immutable once constructed. Zero-sized dimensions are legal and simply
/// make the tensor empty.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TensorShape {
    dims: [usize; 4],
}

impl TensorShape {
    pub const fn new(dims: [usize; 4]) -> Self {
        Self { dims }
    }

    /// Returns the size of one dimension.
    ///
    /// # Panics
    ///
    /// Panics if `axis >= 4`.
    pub fn dim(&self, axis: usize) -> usize {
        self.dims[axis]
    }

    pub const fn dims(&self) -> [usize; 4] {
        self.dims
    }

    /// Total number of elements held by a tensor of this shape.
    pub fn num_elements(&self) -> usize {
        self.dims.iter().product()
    }

    /// The same shape with the batch dimension replaced.
    pub const fn with_batch(&self, batch: usize) -> Self {
        Self {
            dims: [batch, self.dims[1], self.dims[2], self.dims[3]],
        }
    }
}

impl From<[usize; 4]> for TensorShape {
    fn from(dims: [usize; 4]) -> Self {
        Self::new(dims)
    }
}

/// Which shape positions hold channels, height and width.
///
/// The same layout value must be used for both the input and the output of
/// one kernel invocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DataLayout {
    /// Channel-first: `[batch, channels, height, width]`.
    Nchw,
    /// Channel-last: `[batch, height, width, channels]`.
    Nhwc,
}

impl DataLayout {
    pub const fn channels_index(self) -> usize {
        match self {
            DataLayout::Nchw => 1,
            DataLayout::Nhwc => 3,
        }
    }

    pub const fn height_index(self) -> usize {
        match self {
            DataLayout::Nchw => 2,
            DataLayout::Nhwc => 1,
        }
    }

    pub const fn width_index(self) -> usize {
        match self {
            DataLayout::Nchw => 3,
            DataLayout::Nhwc => 2,
        }
    }

    /// Maps logical coordinates `(n, c, h, w)` to the flat row-major offset
    /// under this layout.
    ///
    /// Coordinates must lie within `shape`. An out-of-bounds coordinate is a
    /// bug in the caller, not a runtime condition; debug builds abort on it,
    /// and in release builds the bounds-checked storage access behind the
    /// offset still panics rather than reading a neighbouring element.
    pub fn index(self, shape: &TensorShape, n: usize, c: usize, h: usize, w: usize) -> usize {
        debug_assert!(n < shape.dim(0));
        debug_assert!(c < shape.dim(self.channels_index()));
        debug_assert!(h < shape.dim(self.height_index()));
        debug_assert!(w < shape.dim(self.width_index()));

        match self {
            DataLayout::Nchw => {
                let channels = shape.dim(1);
                let height = shape.dim(2);
                let width = shape.dim(3);
                ((n * channels + c) * height + h) * width + w
            }
            DataLayout::Nhwc => {
                let height = shape.dim(1);
                let width = shape.dim(2);
                let channels = shape.dim(3);
                ((n * height + h) * width + w) * channels + c
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimension_roles() {
        assert_eq!(DataLayout::Nchw.channels_index(), 1);
        assert_eq!(DataLayout::Nchw.height_index(), 2);
        assert_eq!(DataLayout::Nchw.width_index(), 3);

        assert_eq!(DataLayout::Nhwc.channels_index(), 3);
        assert_eq!(DataLayout::Nhwc.height_index(), 1);
        assert_eq!(DataLayout::Nhwc.width_index(), 2);
    }

    #[test]
    fn test_nchw_index_formula() {
        // [n=2, c=3, h=4, w=5]
        let shape = TensorShape::new([2, 3, 4, 5]);
        assert_eq!(DataLayout::Nchw.index(&shape, 0, 0, 0, 0), 0);
        assert_eq!(DataLayout::Nchw.index(&shape, 0, 0, 0, 4), 4);
        assert_eq!(DataLayout::Nchw.index(&shape, 0, 0, 1, 0), 5);
        assert_eq!(DataLayout::Nchw.index(&shape, 0, 1, 0, 0), 20);
        assert_eq!(DataLayout::Nchw.index(&shape, 1, 0, 0, 0), 60);
        assert_eq!(DataLayout::Nchw.index(&shape, 1, 2, 3, 4), 119);
    }

    #[test]
    fn test_nhwc_index_formula() {
        // [n=2, h=4, w=5, c=3]
        let shape = TensorShape::new([2, 4, 5, 3]);
        assert_eq!(DataLayout::Nhwc.index(&shape, 0, 0, 0, 0), 0);
        assert_eq!(DataLayout::Nhwc.index(&shape, 0, 2, 0, 0), 2);
        assert_eq!(DataLayout::Nhwc.index(&shape, 0, 0, 0, 1), 3);
        assert_eq!(DataLayout::Nhwc.index(&shape, 0, 0, 1, 0), 15);
        assert_eq!(DataLayout::Nhwc.index(&shape, 1, 0, 0, 0), 60);
        assert_eq!(DataLayout::Nhwc.index(&shape, 1, 2, 3, 4), 119);
    }

    #[test]
    fn test_every_coordinate_maps_to_a_unique_offset() {
        for layout in [DataLayout::Nchw, DataLayout::Nhwc] {
            let shape = TensorShape::new([2, 3, 4, 5]);
            let mut seen = vec![false; shape.num_elements()];
            for n in 0..shape.dim(0) {
                for c in 0..shape.dim(layout.channels_index()) {
                    for h in 0..shape.dim(layout.height_index()) {
                        for w in 0..shape.dim(layout.width_index()) {
                            let offset = layout.index(&shape, n, c, h, w);
                            assert!(!seen[offset]);
                            seen[offset] = true;
                        }
                    }
                }
            }
            assert!(seen.iter().all(|&v| v));
        }
    }

    #[test]
    fn test_num_elements() {
        assert_eq!(TensorShape::new([2, 3, 4, 5]).num_elements(), 120);
        assert_eq!(TensorShape::new([2, 0, 4, 5]).num_elements(), 0);
        assert_eq!(TensorShape::new([2, 3, 4, 5]).with_batch(1).num_elements(), 60);
    }
}
