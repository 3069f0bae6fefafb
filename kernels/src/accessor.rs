//! Read/write access to tensor storage in canonical `f32`.
//!
//! Kernels never touch raw tensor bytes. They read input values through a
//! [`Decoder`] and write results through an [`Encoder`], both addressed by
//! flat offset and both speaking `f32`, the canonical representation all
//! storage encodings convert to and from at the tensor boundary. Lossy
//! encodings (quantized integers, half precision) implement these traits in
//! the engine crate; the kernel cannot tell the difference.
//!
//! Both traits take the offset explicitly on every call. There is no
//! positional cursor, so a decoder can be shared across offsets in any
//! order and per-thread encoder instances need no coordination beyond
//! writing disjoint offsets.

/// Randomly addressable read view over a tensor's values.
pub trait Decoder {
    /// Reads the value at `offset` as a canonical float.
    fn get(&self, offset: usize) -> f32;
}

/// Randomly addressable write view over a tensor's values.
pub trait Encoder {
    /// Writes `value` at `offset`, overwriting any previous value.
    fn set(&mut self, offset: usize, value: f32);
}

/// Canonical storage decodes as itself.
impl Decoder for [f32] {
    fn get(&self, offset: usize) -> f32 {
        self[offset]
    }
}

impl Encoder for [f32] {
    fn set(&mut self, offset: usize, value: f32) {
        self[offset] = value;
    }
}

impl<D: Decoder + ?Sized> Decoder for &D {
    fn get(&self, offset: usize) -> f32 {
        (**self).get(offset)
    }
}

impl<E: Encoder + ?Sized> Encoder for &mut E {
    fn set(&mut self, offset: usize, value: f32) {
        (**self).set(offset, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // The slice type has an inherent `get` that would shadow the trait
    // method, so the trait calls are spelled out.
    #[test]
    fn test_f32_slice_roundtrip() {
        let mut data = vec![1.0f32, 2.0, 3.0];
        assert_eq!(Decoder::get(data.as_slice(), 1), 2.0);

        data.as_mut_slice().set(1, 5.0);
        assert_eq!(data, vec![1.0, 5.0, 3.0]);
    }

    #[test]
    fn test_arbitrary_order_access() {
        let data = vec![0.0f32, 1.0, 2.0, 3.0];
        let decoder: &[f32] = &data;
        assert_eq!(Decoder::get(decoder, 3), 3.0);
        assert_eq!(Decoder::get(decoder, 0), 0.0);
        assert_eq!(Decoder::get(decoder, 2), 2.0);
        assert_eq!(Decoder::get(decoder, 2), 2.0);
    }

    #[test]
    #[should_panic]
    fn test_out_of_bounds_read_panics() {
        let data = vec![0.0f32; 4];
        let _ = Decoder::get(data.as_slice(), 4);
    }
}
