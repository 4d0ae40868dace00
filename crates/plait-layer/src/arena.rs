//! Block storage for one stripe, addressed by `(layer, column)`.

/// All `layers x columns` blocks of one stripe in a single allocation.
///
/// Blocks are stored layer-major, so the blocks of one layer are contiguous
/// and can be handed to the base code as one stripe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockArena {
    layers: usize,
    columns: usize,
    blocksize: usize,
    buf: Vec<u8>,
}

impl BlockArena {
    /// A zero-filled arena.
    pub fn new(layers: usize, columns: usize, blocksize: usize) -> Self {
        Self {
            layers,
            columns,
            blocksize,
            buf: vec![0u8; layers * columns * blocksize],
        }
    }

    pub fn layers(&self) -> usize {
        self.layers
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn blocksize(&self) -> usize {
        self.blocksize
    }

    fn offset(&self, layer: usize, column: usize) -> usize {
        assert!(
            layer < self.layers && column < self.columns,
            "cell ({layer}, {column}) outside {}x{} arena",
            self.layers,
            self.columns
        );
        (layer * self.columns + column) * self.blocksize
    }

    pub fn cell(&self, layer: usize, column: usize) -> &[u8] {
        let at = self.offset(layer, column);
        &self.buf[at..at + self.blocksize]
    }

    pub fn cell_mut(&mut self, layer: usize, column: usize) -> &mut [u8] {
        let at = self.offset(layer, column);
        &mut self.buf[at..at + self.blocksize]
    }

    /// Mutable access to two distinct cells at once.
    pub fn pair_mut(
        &mut self,
        first: (usize, usize),
        second: (usize, usize),
    ) -> (&mut [u8], &mut [u8]) {
        let a = self.offset(first.0, first.1);
        let b = self.offset(second.0, second.1);
        assert_ne!(a, b, "pair_mut needs two distinct cells");
        let bs = self.blocksize;
        if a < b {
            let (lo, hi) = self.buf.split_at_mut(b);
            (&mut lo[a..a + bs], &mut hi[..bs])
        } else {
            let (lo, hi) = self.buf.split_at_mut(a);
            (&mut hi[..bs], &mut lo[b..b + bs])
        }
    }

    /// The blocks of one layer, mutably, in column order.
    pub fn layer_mut(&mut self, layer: usize) -> Vec<&mut [u8]> {
        let at = self.offset(layer, 0);
        let bs = self.blocksize;
        self.buf[at..at + self.columns * bs]
            .chunks_exact_mut(bs)
            .collect()
    }

    /// Zero every block of `column`.
    pub fn clear_column(&mut self, column: usize) {
        for layer in 0..self.layers {
            self.cell_mut(layer, column).fill(0);
        }
    }

    /// Scatter stripe bytes into the data columns, layer by layer; bytes
    /// past the end of `data` are zero.
    pub fn load_data(&mut self, data_columns: usize, data: &[u8]) {
        let bs = self.blocksize;
        for layer in 0..self.layers {
            for column in 0..data_columns {
                let start = (layer * data_columns + column) * bs;
                let cell = self.cell_mut(layer, column);
                cell.fill(0);
                if start < data.len() {
                    let end = (start + bs).min(data.len());
                    cell[..end - start].copy_from_slice(&data[start..end]);
                }
            }
        }
    }

    /// Append the data columns to `out`, layer by layer, stopping once
    /// `limit` bytes have been written.
    pub fn extract_data(&self, data_columns: usize, limit: usize, out: &mut Vec<u8>) {
        let mut remaining = limit;
        for layer in 0..self.layers {
            for column in 0..data_columns {
                if remaining == 0 {
                    return;
                }
                let cell = self.cell(layer, column);
                let take = remaining.min(cell.len());
                out.extend_from_slice(&cell[..take]);
                remaining -= take;
            }
        }
    }

    /// Copy one column's blocks, in layer order, into `out`.
    pub fn column_into(&self, column: usize, out: &mut [u8]) {
        for (layer, chunk) in out.chunks_exact_mut(self.blocksize).enumerate() {
            chunk.copy_from_slice(self.cell(layer, column));
        }
    }

    /// Fill one column from a fragment segment (`layers * blocksize` bytes).
    pub fn column_from(&mut self, column: usize, segment: &[u8]) {
        for (layer, chunk) in segment.chunks_exact(self.blocksize).enumerate() {
            self.cell_mut(layer, column).copy_from_slice(chunk);
        }
    }
}
