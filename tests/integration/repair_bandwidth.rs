//! Helper traffic of single-fragment repair.

use plait_integration_tests::{encode, fragments_without, params, test_data};
use plait_layer::{MeteredSource, RepairStrategy};
use plait_types::Technique;

#[test]
fn test_repair_planes_read_half_of_each_helper() {
    for (k, m) in [(4, 2), (6, 2), (10, 4)] {
        let p = params(Technique::ReedSolVan, k, m, 8, 0);
        let (codec, encoded) = encode(p, "bw.bin", &test_data(40_000));
        let meta = &encoded.meta;
        let fragment_len = meta.fragment_size();
        let n = (k + m) as u64;

        for lost in 0..k + m {
            let source = fragments_without(&encoded, &[lost]);
            let metered = MeteredSource::new(&source);
            let repaired = codec.repair(meta, &metered, lost).unwrap();

            assert_eq!(repaired.data, encoded.fragments[lost]);
            assert_eq!(repaired.strategy, RepairStrategy::RepairPlanes, "k={k} m={m} lost={lost}");
            assert_eq!(metered.bytes_read(), (n - 1) * fragment_len / 2, "k={k} m={m} lost={lost}");
            assert!(metered.bytes_read() < k as u64 * fragment_len);
        }
    }
}

#[test]
fn test_repair_with_extra_loss_falls_back_to_full_decode() {
    let p = params(Technique::ReedSolVan, 6, 3, 8, 0);
    let data = test_data(30_000);
    let (codec, encoded) = encode(p, "fb.bin", &data);

    let source = fragments_without(&encoded, &[2, 7]);
    let metered = MeteredSource::new(&source);
    let repaired = codec.repair(&encoded.meta, &metered, 2).unwrap();
    assert_eq!(repaired.strategy, RepairStrategy::FullDecode);
    assert_eq!(repaired.data, encoded.fragments[2]);
}

#[test]
fn test_uncoupled_trailing_column_uses_full_decode() {
    // n = 9: the last column has no partner and is never coupled.
    let p = params(Technique::ReedSolVan, 6, 3, 8, 0);
    let (codec, encoded) = encode(p, "odd.bin", &test_data(10_000));

    let source = fragments_without(&encoded, &[8]);
    let repaired = codec.repair(&encoded.meta, &source, 8).unwrap();
    assert_eq!(repaired.strategy, RepairStrategy::FullDecode);
    assert_eq!(repaired.data, encoded.fragments[8]);
}

#[test]
fn test_repair_bandwidth_across_stripes() {
    let mut p = params(Technique::ReedSolVan, 4, 2, 8, 0);
    p.buffersize = 2048;
    let (codec, encoded) = encode(p, "ms.bin", &test_data(20_000));
    let meta = &encoded.meta;
    assert!(meta.readins > 1);

    let source = fragments_without(&encoded, &[4]);
    let metered = MeteredSource::new(&source);
    let repaired = codec.repair(meta, &metered, 4).unwrap();
    assert_eq!(repaired.data, encoded.fragments[4]);
    assert_eq!(metered.bytes_read(), 5 * meta.fragment_size() / 2);
}
