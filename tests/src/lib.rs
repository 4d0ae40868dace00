//! Shared helpers for Plait integration tests.
//!
//! Parameter builders for every technique, deterministic test data and
//! erasure-set enumeration over in-memory fragments.

use bytes::Bytes;
use plait_layer::{EncodedObject, LayeredCodec, MemoryFragments};
use plait_types::{CodeParams, CodecParams, Technique, default_layers};

/// Generate deterministic, non-repeating test data.
pub fn test_data(size: usize) -> Vec<u8> {
    let mut data = Vec::with_capacity(size);
    let mut state: u32 = 0xDEAD_BEEF;
    for _ in 0..size {
        state = state.wrapping_mul(1103515245).wrapping_add(12345);
        data.push((state >> 16) as u8);
    }
    data
}

/// Codec parameters with the default layer count for `k + m`.
pub fn params(technique: Technique, k: usize, m: usize, w: u32, packetsize: usize) -> CodecParams {
    CodecParams {
        code: CodeParams {
            k,
            m,
            w,
            technique,
            packetsize,
        },
        layers: default_layers(k + m),
        buffersize: 0,
    }
}

/// One valid parameter set per supported technique and word size.
pub fn technique_matrix() -> Vec<CodecParams> {
    vec![
        params(Technique::ReedSolVan, 4, 2, 8, 0),
        params(Technique::ReedSolVan, 4, 2, 16, 0),
        params(Technique::ReedSolVan, 3, 3, 32, 0),
        params(Technique::ReedSolR6Op, 4, 2, 8, 0),
        params(Technique::ReedSolR6Op, 3, 2, 16, 0),
        params(Technique::CauchyOrig, 4, 2, 4, 8),
        params(Technique::CauchyGood, 3, 3, 4, 8),
        params(Technique::Liberation, 5, 2, 5, 8),
        params(Technique::BlaumRoth, 4, 2, 4, 8),
        params(Technique::Liber8tion, 6, 2, 8, 8),
    ]
}

/// Encode `data` with a fresh codec.
pub fn encode(params: CodecParams, name: &str, data: &[u8]) -> (LayeredCodec, EncodedObject) {
    let codec = LayeredCodec::new(params).expect("valid parameters");
    let encoded = codec.encode(name, data).expect("encode");
    (codec, encoded)
}

/// In-memory fragments of `encoded` with `erased` dropped.
pub fn fragments_without(encoded: &EncodedObject, erased: &[usize]) -> MemoryFragments {
    let source = MemoryFragments::new(encoded.fragments.iter().map(Bytes::clone).collect());
    for &index in erased {
        source.erase(index);
    }
    source
}

/// All subsets of `0..n` with exactly `size` elements, in lexicographic order.
pub fn subsets(n: usize, size: usize) -> Vec<Vec<usize>> {
    fn extend(start: usize, n: usize, size: usize, current: &mut Vec<usize>, out: &mut Vec<Vec<usize>>) {
        if current.len() == size {
            out.push(current.clone());
            return;
        }
        for i in start..n {
            current.push(i);
            extend(i + 1, n, size, current, out);
            current.pop();
        }
    }
    let mut out = Vec::new();
    extend(0, n, size, &mut Vec::new(), &mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subsets() {
        assert_eq!(subsets(4, 2).len(), 6);
        assert_eq!(subsets(3, 0), vec![Vec::<usize>::new()]);
        assert_eq!(subsets(3, 3), vec![vec![0, 1, 2]]);
    }

    #[test]
    fn test_data_is_deterministic() {
        assert_eq!(test_data(64), test_data(64));
        assert_ne!(test_data(64)[..32], test_data(64)[32..]);
    }
}
