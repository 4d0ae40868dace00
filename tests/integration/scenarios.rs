//! Reference scenarios for the coupled-layer codec.

use plait_integration_tests::{encode, fragments_without, params, test_data};
use plait_layer::{CodecError, MeteredSource, RepairStrategy};
use plait_types::{CodecParams, Technique};

#[test]
fn test_sparse_object_survives_two_erasures() {
    let mut p = params(Technique::ReedSolVan, 4, 2, 8, 0);
    p.layers = 8;
    let mut data = vec![0u8; 4096];
    data[10] = 0xAB;

    let (codec, encoded) = encode(p, "sparse.bin", &data);
    assert_eq!(encoded.fragments.len(), 6);

    let source = fragments_without(&encoded, &[1, 5]);
    let decoded = codec.decode(&encoded.meta, &source).unwrap();
    assert_eq!(decoded.data, data);
    assert_eq!(decoded.data[10], 0xAB);
}

#[test]
fn test_wide_code_decode_and_repair() {
    let p = params(Technique::ReedSolVan, 10, 4, 8, 0);
    assert_eq!(p.layers, 128);
    let data = test_data(200_000);
    let (codec, encoded) = encode(p, "wide.bin", &data);

    let source = fragments_without(&encoded, &[3]);
    let decoded = codec.decode(&encoded.meta, &source).unwrap();
    assert_eq!(decoded.data, data);

    let metered = MeteredSource::new(&source);
    let repaired = codec.repair(&encoded.meta, &metered, 3).unwrap();
    assert_eq!(repaired.strategy, RepairStrategy::RepairPlanes);
    assert_eq!(repaired.data, encoded.fragments[3]);

    let meta = &encoded.meta;
    let full_read = (meta.k * meta.blocksize * meta.layers * meta.readins) as u64;
    assert!(
        metered.bytes_read() < full_read,
        "repair read {} bytes, a full decode reads {full_read}",
        metered.bytes_read()
    );
}

#[test]
fn test_over_erasure_rejected() {
    let (codec, encoded) = encode(params(Technique::ReedSolVan, 4, 2, 8, 0), "o.bin", &test_data(3000));
    let source = fragments_without(&encoded, &[0, 2, 4]);
    let err = codec.decode(&encoded.meta, &source).unwrap_err();
    assert!(
        matches!(err, CodecError::InsufficientFragments { erased: 3, tolerance: 2 }),
        "unexpected error: {err}"
    );
}

#[test]
fn test_odd_lengths_round_trip() {
    for len in [0, 1, 7, 63, 64, 65, 1000, 4097, 65_537] {
        let (codec, encoded) = encode(params(Technique::ReedSolVan, 4, 2, 8, 0), "len.bin", &test_data(len));
        assert_eq!(encoded.meta.original_size, len as u64);
        let source = fragments_without(&encoded, &[]);
        let decoded = codec.decode(&encoded.meta, &source).unwrap();
        assert_eq!(decoded.data, test_data(len), "len={len}");
    }
}

#[test]
fn test_multi_stripe_objects() {
    let mut p: CodecParams = params(Technique::ReedSolVan, 4, 2, 8, 0);
    p.buffersize = 4096;
    let data = test_data(50_000);
    let (codec, encoded) = encode(p, "striped.bin", &data);
    assert!(encoded.meta.readins > 1);

    for erased in [vec![], vec![0], vec![5], vec![2, 3]] {
        let source = fragments_without(&encoded, &erased);
        let decoded = codec.decode(&encoded.meta, &source).unwrap();
        assert_eq!(decoded.data, data, "erased={erased:?}");
    }
}

#[test]
fn test_reencode_is_identical() {
    let data = test_data(12_345);
    let (_, first) = encode(params(Technique::CauchyGood, 4, 2, 8, 16), "same.bin", &data);
    let (_, second) = encode(params(Technique::CauchyGood, 4, 2, 8, 16), "same.bin", &data);
    assert_eq!(first.fragments, second.fragments);
    assert_eq!(first.meta, second.meta);
}
