//! Every supported technique behind the layer coupling.

use plait_integration_tests::{encode, fragments_without, params, subsets, technique_matrix, test_data};
use plait_layer::{CodecError, LayeredCodec};
use plait_types::Technique;

#[test]
fn test_every_technique_round_trips() {
    let data = test_data(5000);
    for p in technique_matrix() {
        let (codec, encoded) = encode(p, "t.bin", &data);
        assert_eq!(encoded.meta.technique, p.code.technique);
        assert_eq!(encoded.meta.technique_id, p.code.technique.id());

        let source = fragments_without(&encoded, &[]);
        let decoded = codec.decode(&encoded.meta, &source).unwrap();
        assert_eq!(decoded.data, data, "{:?}", p.code);
    }
}

#[test]
fn test_every_technique_survives_single_erasures() {
    let data = test_data(3333);
    for p in technique_matrix() {
        let (codec, encoded) = encode(p, "t.bin", &data);
        for lost in 0..p.code.fragments() {
            let source = fragments_without(&encoded, &[lost]);
            let decoded = codec.decode(&encoded.meta, &source).unwrap();
            assert_eq!(decoded.data, data, "{:?} lost={lost}", p.code);

            let repaired = codec.repair(&encoded.meta, &source, lost).unwrap();
            assert_eq!(repaired.data, encoded.fragments[lost], "{:?} lost={lost}", p.code);
        }
    }
}

#[test]
fn test_every_technique_survives_every_m_subset() {
    let data = test_data(2500);
    for p in technique_matrix() {
        let (codec, encoded) = encode(p, "t.bin", &data);
        for erased in subsets(p.code.fragments(), p.code.m) {
            let source = fragments_without(&encoded, &erased);
            let decoded = codec.decode(&encoded.meta, &source).unwrap();
            assert_eq!(decoded.data, data, "{:?} erased={erased:?}", p.code);
        }
    }
}

#[test]
fn test_wider_cauchy_codes() {
    let data = test_data(4000);
    for technique in [Technique::CauchyOrig, Technique::CauchyGood] {
        let p = params(technique, 5, 3, 8, 8);
        let (codec, encoded) = encode(p, "c.bin", &data);
        for erased in subsets(8, 3) {
            let source = fragments_without(&encoded, &erased);
            let decoded = codec.decode(&encoded.meta, &source).unwrap();
            assert_eq!(decoded.data, data, "{technique} erased={erased:?}");
        }
    }
}

#[test]
fn test_liber8tion_at_full_width() {
    let data = test_data(6000);
    let p = params(Technique::Liber8tion, 8, 2, 8, 8);
    let (codec, encoded) = encode(p, "l8.bin", &data);
    assert_eq!(encoded.meta.technique, Technique::Liber8tion);
    for erased in subsets(10, 2) {
        let source = fragments_without(&encoded, &erased);
        let decoded = codec.decode(&encoded.meta, &source).unwrap();
        assert_eq!(decoded.data, data, "erased={erased:?}");
    }
    for lost in [0, 7, 9] {
        let source = fragments_without(&encoded, &[lost]);
        let repaired = codec.repair(&encoded.meta, &source, lost).unwrap();
        assert_eq!(repaired.data, encoded.fragments[lost], "lost={lost}");
    }
}

#[test]
fn test_invalid_parameters_are_config_errors() {
    let cases = [
        params(Technique::ReedSolVan, 4, 2, 7, 0),
        params(Technique::ReedSolR6Op, 4, 3, 8, 0),
        params(Technique::CauchyOrig, 4, 2, 8, 0),
        params(Technique::Liberation, 4, 2, 6, 8),
        params(Technique::Liberation, 7, 2, 5, 8),
        params(Technique::BlaumRoth, 4, 2, 5, 8),
        params(Technique::BlaumRoth, 4, 2, 4, 12),
        params(Technique::Liber8tion, 4, 2, 8, 0),
        params(Technique::Liber8tion, 4, 2, 16, 8),
        params(Technique::Liber8tion, 4, 3, 8, 8),
        params(Technique::Liber8tion, 9, 2, 8, 8),
    ];
    for p in cases {
        let err = LayeredCodec::new(p).unwrap_err();
        assert!(matches!(err, CodecError::Config(_)), "{:?}: {err}", p.code);
    }
}
