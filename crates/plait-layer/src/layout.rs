//! Stripe geometry: how an object maps onto read-ins, layers and blocks.

use plait_types::ObjectMeta;

use crate::error::CodecError;

/// Geometry of one encoded object.
///
/// Each read-in (stripe) covers `layers * k * blocksize` bytes of the object.
/// Layer `i` of a stripe holds the `i`-th run of `k * blocksize` bytes, and
/// fragment `j` stores, per stripe, the concatenation of every layer's block
/// at column `j`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StripeLayout {
    pub k: usize,
    pub m: usize,
    pub layers: usize,
    pub blocksize: usize,
    pub readins: usize,
    pub original_size: u64,
}

fn round_up(value: usize, multiple: usize) -> usize {
    value.div_ceil(multiple) * multiple
}

impl StripeLayout {
    /// Plan the geometry for an object of `size` bytes.
    ///
    /// With `buffersize == 0` the object is encoded as one stripe. Otherwise
    /// the stripe size is `buffersize` rounded up to a multiple of
    /// `layers * k * align`.
    pub fn plan(
        k: usize,
        m: usize,
        layers: usize,
        align: usize,
        buffersize: usize,
        size: u64,
    ) -> Result<Self, CodecError> {
        if k == 0 || m == 0 {
            return Err(CodecError::Config("k and m must be greater than 0".into()));
        }
        if layers == 0 || !layers.is_power_of_two() {
            return Err(CodecError::Config(format!(
                "layer count must be a power of two, got {layers}"
            )));
        }
        if align == 0 {
            return Err(CodecError::Config("block alignment must be non-zero".into()));
        }
        let size_usize = usize::try_from(size)
            .map_err(|_| CodecError::Config(format!("object of {size} bytes is too large")))?;
        let per_stripe = layers * k;

        let (blocksize, readins) = if buffersize == 0 {
            let blocksize = round_up(size_usize.div_ceil(per_stripe).max(1), align);
            (blocksize, 1)
        } else {
            let stripe = round_up(buffersize, per_stripe * align);
            (stripe / per_stripe, size_usize.div_ceil(stripe).max(1))
        };

        Ok(Self {
            k,
            m,
            layers,
            blocksize,
            readins,
            original_size: size,
        })
    }

    /// Geometry recorded in `meta`, checked for consistency.
    pub fn from_meta(meta: &ObjectMeta) -> Result<Self, CodecError> {
        let layout = Self {
            k: meta.k,
            m: meta.m,
            layers: meta.layers,
            blocksize: meta.blocksize,
            readins: meta.readins,
            original_size: meta.original_size,
        };
        if layout.k == 0 || layout.m == 0 || layout.blocksize == 0 || layout.readins == 0 {
            return Err(CodecError::Config("metadata has zero-sized geometry".into()));
        }
        if !layout.layers.is_power_of_two() {
            return Err(CodecError::Config(format!(
                "metadata layer count {} is not a power of two",
                layout.layers
            )));
        }
        if meta.fragments.len() != layout.n() {
            return Err(CodecError::Config(format!(
                "metadata lists {} fragment digests for {} fragments",
                meta.fragments.len(),
                layout.n()
            )));
        }
        if ((layout.stripe_bytes() * layout.readins) as u64) < layout.original_size {
            return Err(CodecError::Config(
                "metadata geometry is smaller than the object".into(),
            ));
        }
        Ok(layout)
    }

    /// Number of fragments, `k + m`.
    pub fn n(&self) -> usize {
        self.k + self.m
    }

    /// Object bytes carried by one stripe.
    pub fn stripe_bytes(&self) -> usize {
        self.layers * self.k * self.blocksize
    }

    /// Bytes one fragment contributes per stripe.
    pub fn segment_len(&self) -> usize {
        self.layers * self.blocksize
    }

    /// Total length of each fragment stream.
    pub fn fragment_len(&self) -> u64 {
        (self.segment_len() * self.readins) as u64
    }

    /// Offset inside a fragment of the block for `(stripe, layer)`.
    pub fn block_offset(&self, stripe: usize, layer: usize) -> u64 {
        (stripe * self.segment_len() + layer * self.blocksize) as u64
    }

    /// Byte range of the object covered by `stripe`, clipped to the
    /// original size.
    pub fn object_range(&self, stripe: usize) -> std::ops::Range<usize> {
        let size = self.original_size as usize;
        let start = (stripe * self.stripe_bytes()).min(size);
        let end = ((stripe + 1) * self.stripe_bytes()).min(size);
        start..end
    }
}
