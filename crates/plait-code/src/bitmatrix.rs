//! Bitmatrix codes over packets.
//!
//! A block is cut into super-packets of `w * packetsize` bytes; packet `r`
//! of a super-packet is the `r`-th bit-row of that block. The coding
//! bitmatrix has `m * w` rows and `k * w` columns: output packet row `i`
//! is the XOR of every input packet whose column bit is set.

use plait_gf::{Galois, xor_region};
use tracing::debug;

use crate::error::CodeError;
use crate::{check_blocks, check_erasures};

/// Expand a GF(2^w) coding matrix (`rows x cols`) into a bitmatrix.
///
/// Element `e` becomes a `w x w` block whose column `x` holds the bits of
/// `e * 2^x`.
pub fn matrix_to_bitmatrix(gf: &Galois, mat: &[u32], rows: usize, cols: usize) -> Vec<u8> {
    let w = gf.width() as usize;
    let width = cols * w;
    let mut bits = vec![0u8; rows * w * width];
    for i in 0..rows {
        for j in 0..cols {
            let mut elt = mat[i * cols + j];
            for x in 0..w {
                for l in 0..w {
                    bits[(i * w + l) * width + j * w + x] = ((elt >> l) & 1) as u8;
                }
                elt = gf.mul(elt, 2);
            }
        }
    }
    bits
}

/// Liberation coding bitmatrix for `m = 2` and prime `w`.
pub fn liberation_bitmatrix(k: usize, w: usize) -> Vec<u8> {
    let width = k * w;
    let mut bits = vec![0u8; 2 * w * width];
    for j in 0..k {
        for i in 0..w {
            bits[i * width + j * w + i] = 1;
            bits[(w + i) * width + j * w + (j + i) % w] = 1;
        }
        if j > 0 {
            let i = (j * ((w - 1) / 2)) % w;
            bits[(w + i) * width + j * w + (i + j - 1) % w] = 1;
        }
    }
    bits
}

/// Q blocks of the Liber8tion code for data columns 1..8: each is a
/// permutation (`row -> column`) plus one extra `(row, column)` bit.
/// Column 0 uses the identity.
const LIBER8TION_Q: [([usize; 8], (usize, usize)); 7] = [
    ([1, 5, 6, 4, 2, 3, 7, 0], (2, 0)),
    ([5, 0, 6, 2, 7, 4, 1, 3], (4, 6)),
    ([2, 6, 3, 1, 7, 0, 4, 5], (3, 7)),
    ([4, 3, 5, 7, 1, 6, 0, 2], (0, 3)),
    ([4, 7, 0, 5, 3, 1, 2, 6], (6, 4)),
    ([6, 3, 4, 0, 5, 7, 2, 1], (1, 2)),
    ([3, 4, 7, 1, 6, 2, 5, 0], (7, 1)),
];

/// Liber8tion coding bitmatrix: `m = 2`, `w = 8`, `k <= 8`.
///
/// The Q row carries `k * w + k - 1` ones, the fewest an MDS RAID-6
/// bitmatrix can have.
pub fn liber8tion_bitmatrix(k: usize) -> Vec<u8> {
    const W: usize = 8;
    let width = k * W;
    let mut bits = vec![0u8; 2 * W * width];
    for j in 0..k {
        for i in 0..W {
            bits[i * width + j * W + i] = 1;
        }
        if j == 0 {
            for i in 0..W {
                bits[(W + i) * width + i] = 1;
            }
            continue;
        }
        let (perm, (row, col)) = LIBER8TION_Q[j - 1];
        for (i, &c) in perm.iter().enumerate() {
            bits[(W + i) * width + j * W + c] = 1;
        }
        bits[(W + row) * width + j * W + col] = 1;
    }
    bits
}

/// Blaum-Roth coding bitmatrix for `m = 2` and prime `w + 1`.
pub fn blaum_roth_bitmatrix(k: usize, w: usize) -> Vec<u8> {
    let width = k * w;
    let p = w + 1;
    let mut bits = vec![0u8; 2 * w * width];
    for j in 0..k {
        for l in 0..w {
            bits[l * width + j * w + l] = 1;
        }
        if j == 0 {
            for l in 0..w {
                bits[(w + l) * width + l] = 1;
            }
            continue;
        }
        for l in 1..=w {
            let row = (w + l - 1) * width + j * w;
            if l != p - j {
                let mut mm = l + j;
                if mm >= p {
                    mm -= p;
                }
                bits[row + mm - 1] = 1;
            } else {
                bits[row + j - 1] = 1;
                let mm = if j % 2 == 0 { j / 2 } else { p / 2 + 1 + j / 2 };
                bits[row + mm - 1] = 1;
            }
        }
    }
    bits
}

/// Invert an `n x n` matrix over GF(2).
pub fn invert_bits(mat: &[u8], n: usize) -> Result<Vec<u8>, CodeError> {
    let mut a = mat.to_vec();
    let mut inv = vec![0u8; n * n];
    for i in 0..n {
        inv[i * n + i] = 1;
    }
    for col in 0..n {
        let pivot = (col..n)
            .find(|&r| a[r * n + col] == 1)
            .ok_or_else(|| CodeError::Unrecoverable("decoding bitmatrix is singular".into()))?;
        if pivot != col {
            for c in 0..n {
                a.swap(pivot * n + c, col * n + c);
                inv.swap(pivot * n + c, col * n + c);
            }
        }
        for r in 0..n {
            if r != col && a[r * n + col] == 1 {
                for c in 0..n {
                    a[r * n + c] ^= a[col * n + c];
                    inv[r * n + c] ^= inv[col * n + c];
                }
            }
        }
    }
    Ok(inv)
}

/// Where an XOR operation reads its packet from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketRef {
    /// Packet `packet` of input block `block`.
    Input { block: usize, packet: usize },
    /// Packet `packet` of an already-computed output block.
    Output { block: usize, packet: usize },
}

/// One `dst ^= src` packet operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XorOp {
    pub src: PacketRef,
    pub dst_block: usize,
    pub dst_packet: usize,
}

/// An ordered list of packet XORs computing every output row of a
/// bitmatrix. Outputs are zeroed before the schedule runs.
#[derive(Debug, Clone, Default)]
pub struct Schedule {
    ops: Vec<XorOp>,
    outputs: usize,
}

impl Schedule {
    /// One XOR per set bit.
    pub fn plain(bits: &[u8], out_rows: usize, in_cols: usize, w: usize) -> Self {
        let mut ops = Vec::new();
        for r in 0..out_rows {
            for c in 0..in_cols {
                if bits[r * in_cols + c] == 1 {
                    ops.push(XorOp {
                        src: PacketRef::Input {
                            block: c / w,
                            packet: c % w,
                        },
                        dst_block: r / w,
                        dst_packet: r % w,
                    });
                }
            }
        }
        Self {
            ops,
            outputs: out_rows / w,
        }
    }

    /// Rows may start from a previously computed row when the two differ in
    /// fewer bits than the row has ones.
    pub fn smart(bits: &[u8], out_rows: usize, in_cols: usize, w: usize) -> Self {
        let mut ops = Vec::new();
        let row = |r: usize| &bits[r * in_cols..(r + 1) * in_cols];
        for r in 0..out_rows {
            let ones = row(r).iter().filter(|&&b| b == 1).count();
            let mut best: Option<(usize, usize)> = None;
            for prev in 0..r {
                let diff = row(r)
                    .iter()
                    .zip(row(prev))
                    .filter(|(a, b)| a != b)
                    .count();
                if diff + 1 < ones && best.is_none_or(|(_, d)| diff < d) {
                    best = Some((prev, diff));
                }
            }

            let dst_block = r / w;
            let dst_packet = r % w;
            let push_input = |ops: &mut Vec<XorOp>, c: usize| {
                ops.push(XorOp {
                    src: PacketRef::Input {
                        block: c / w,
                        packet: c % w,
                    },
                    dst_block,
                    dst_packet,
                });
            };
            match best {
                Some((prev, _)) => {
                    ops.push(XorOp {
                        src: PacketRef::Output {
                            block: prev / w,
                            packet: prev % w,
                        },
                        dst_block,
                        dst_packet,
                    });
                    for c in 0..in_cols {
                        if row(r)[c] != row(prev)[c] {
                            push_input(&mut ops, c);
                        }
                    }
                }
                None => {
                    for c in 0..in_cols {
                        if row(r)[c] == 1 {
                            push_input(&mut ops, c);
                        }
                    }
                }
            }
        }
        Self {
            ops,
            outputs: out_rows / w,
        }
    }

    /// Number of packet XORs per super-packet.
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Run the schedule over every super-packet of the blocks.
    pub fn run(
        &self,
        inputs: &[&[u8]],
        outputs: &mut [&mut [u8]],
        w: usize,
        packetsize: usize,
    ) -> Result<(), CodeError> {
        if outputs.len() != self.outputs {
            return Err(CodeError::BlockLayout(format!(
                "schedule computes {} blocks, got {}",
                self.outputs,
                outputs.len()
            )));
        }
        for out in outputs.iter_mut() {
            out.fill(0);
        }
        let Some(first) = outputs.first() else {
            return Ok(());
        };
        let blocksize = first.len();
        let superpacket = w * packetsize;
        let mut scratch = vec![0u8; packetsize];

        for base in (0..blocksize).step_by(superpacket) {
            let at = |packet: usize| base + packet * packetsize..base + (packet + 1) * packetsize;
            for op in &self.ops {
                let dst = at(op.dst_packet);
                match op.src {
                    PacketRef::Input { block, packet } => {
                        xor_region(&mut outputs[op.dst_block][dst], &inputs[block][at(packet)])?;
                    }
                    PacketRef::Output { block, packet } => {
                        scratch.copy_from_slice(&outputs[block][at(packet)]);
                        xor_region(&mut outputs[op.dst_block][dst], &scratch)?;
                    }
                }
            }
        }
        Ok(())
    }
}

/// A bitmatrix code with a precomputed encoding schedule.
#[derive(Debug, Clone)]
pub struct BitmatrixCoder {
    k: usize,
    m: usize,
    w: usize,
    packetsize: usize,
    bits: Vec<u8>,
    encode_schedule: Schedule,
}

impl BitmatrixCoder {
    /// Wrap an `(m * w) x (k * w)` coding bitmatrix.
    pub fn new(k: usize, m: usize, w: usize, packetsize: usize, bits: Vec<u8>) -> Self {
        let encode_schedule = Schedule::smart(&bits, m * w, k * w, w);
        debug!(
            k,
            m,
            w,
            packetsize,
            xors = encode_schedule.len(),
            "built bitmatrix encoding schedule"
        );
        Self {
            k,
            m,
            w,
            packetsize,
            bits,
            encode_schedule,
        }
    }

    fn superpacket(&self) -> usize {
        self.w * self.packetsize
    }

    pub fn encode(&self, data: &[&[u8]], coding: &mut [&mut [u8]]) -> Result<(), CodeError> {
        let lens = data.iter().map(|b| b.len()).chain(coding.iter().map(|b| b.len()));
        check_blocks(lens, self.k + self.m, self.superpacket())?;
        if data.len() != self.k {
            return Err(CodeError::BlockLayout(format!(
                "expected {} data blocks, got {}",
                self.k,
                data.len()
            )));
        }
        self.encode_schedule.run(data, coding, self.w, self.packetsize)
    }

    pub fn decode(&self, blocks: &mut [&mut [u8]], erasures: &[usize]) -> Result<(), CodeError> {
        let (k, m, w) = (self.k, self.m, self.w);
        check_blocks(blocks.iter().map(|b| b.len()), k + m, self.superpacket())?;
        check_erasures(erasures, k, m)?;
        let blocksize = blocks[0].len();

        let lost_data: Vec<usize> = erasures.iter().copied().filter(|&e| e < k).collect();
        if !lost_data.is_empty() {
            let survivors: Vec<usize> = (0..k + m)
                .filter(|i| !erasures.contains(i))
                .take(k)
                .collect();
            let kw = k * w;
            let mut decoding = vec![0u8; kw * kw];
            for (t, &s) in survivors.iter().enumerate() {
                for l in 0..w {
                    let row = &mut decoding[(t * w + l) * kw..(t * w + l + 1) * kw];
                    if s < k {
                        row[s * w + l] = 1;
                    } else {
                        let src = ((s - k) * w + l) * kw;
                        row.copy_from_slice(&self.bits[src..src + kw]);
                    }
                }
            }
            let inverse = invert_bits(&decoding, kw)?;
            let rows: Vec<u8> = lost_data
                .iter()
                .flat_map(|&j| inverse[j * w * kw..(j + 1) * w * kw].iter().copied())
                .collect();
            let schedule = Schedule::plain(&rows, lost_data.len() * w, kw, w);

            let mut restored = vec![vec![0u8; blocksize]; lost_data.len()];
            {
                let inputs: Vec<&[u8]> = survivors.iter().map(|&s| &*blocks[s]).collect();
                let mut outputs: Vec<&mut [u8]> =
                    restored.iter_mut().map(|b| b.as_mut_slice()).collect();
                schedule.run(&inputs, &mut outputs, w, self.packetsize)?;
            }
            for (&j, block) in lost_data.iter().zip(&restored) {
                blocks[j].copy_from_slice(block);
            }
        }

        let lost_coding: Vec<usize> = erasures.iter().copied().filter(|&e| e >= k).collect();
        if !lost_coding.is_empty() {
            let kw = k * w;
            let rows: Vec<u8> = lost_coding
                .iter()
                .flat_map(|&c| self.bits[(c - k) * w * kw..(c - k + 1) * w * kw].iter().copied())
                .collect();
            let schedule = Schedule::plain(&rows, lost_coding.len() * w, kw, w);
            let mut restored = vec![vec![0u8; blocksize]; lost_coding.len()];
            {
                let inputs: Vec<&[u8]> = blocks[..k].iter().map(|b| &**b).collect();
                let mut outputs: Vec<&mut [u8]> =
                    restored.iter_mut().map(|b| b.as_mut_slice()).collect();
                schedule.run(&inputs, &mut outputs, w, self.packetsize)?;
            }
            for (&c, block) in lost_coding.iter().zip(&restored) {
                blocks[c].copy_from_slice(block);
            }
        }
        Ok(())
    }
}
