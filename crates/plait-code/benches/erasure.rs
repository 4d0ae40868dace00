//! Benchmarks for base-code stripe encoding and decoding.

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use plait_code::{StripeCoder, build_descriptor};
use plait_types::{CodeParams, Technique};

fn bench_data(size: usize) -> Vec<u8> {
    let mut data = Vec::with_capacity(size);
    let mut state: u32 = 0xDEAD_BEEF;
    for _ in 0..size {
        state = state.wrapping_mul(1103515245).wrapping_add(12345);
        data.push((state >> 16) as u8);
    }
    data
}

fn configs() -> Vec<(&'static str, CodeParams)> {
    let p = |technique, k, m, w, packetsize| CodeParams {
        k,
        m,
        w,
        technique,
        packetsize,
    };
    vec![
        ("rs_van_w8", p(Technique::ReedSolVan, 10, 4, 8, 0)),
        ("rs_van_w16", p(Technique::ReedSolVan, 10, 4, 16, 0)),
        ("rs_van_w32", p(Technique::ReedSolVan, 10, 4, 32, 0)),
        ("cauchy_good", p(Technique::CauchyGood, 10, 4, 8, 64)),
        ("liberation", p(Technique::Liberation, 7, 2, 7, 64)),
    ]
}

fn blocks_for(params: &CodeParams, blocksize: usize) -> Vec<Vec<u8>> {
    let data = bench_data(params.k * blocksize);
    let mut blocks: Vec<Vec<u8>> = data.chunks_exact(blocksize).map(|c| c.to_vec()).collect();
    blocks.resize(params.k + params.m, vec![0u8; blocksize]);
    blocks
}

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("stripe_encode");
    for (label, params) in configs() {
        let coder = build_descriptor(&params).unwrap();
        let blocksize = coder.alignment() * 512;
        let mut blocks = blocks_for(&params, blocksize);
        group.throughput(Throughput::Bytes((params.k * blocksize) as u64));
        group.bench_function(BenchmarkId::new("encode", label), |b| {
            b.iter(|| {
                let (data, coding) = blocks.split_at_mut(params.k);
                let data: Vec<&[u8]> = data.iter().map(|d| d.as_slice()).collect();
                let mut coding: Vec<&mut [u8]> = coding.iter_mut().map(|d| d.as_mut_slice()).collect();
                coder.encode_stripe(&data, &mut coding).unwrap();
            });
        });
    }
    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("stripe_decode");
    for (label, params) in configs() {
        let coder = build_descriptor(&params).unwrap();
        let blocksize = coder.alignment() * 512;
        let mut blocks = blocks_for(&params, blocksize);
        {
            let (data, coding) = blocks.split_at_mut(params.k);
            let data: Vec<&[u8]> = data.iter().map(|d| d.as_slice()).collect();
            let mut coding: Vec<&mut [u8]> = coding.iter_mut().map(|d| d.as_mut_slice()).collect();
            coder.encode_stripe(&data, &mut coding).unwrap();
        }
        // Lose the first m data blocks.
        let erasures: Vec<usize> = (0..params.m).collect();
        group.throughput(Throughput::Bytes((params.k * blocksize) as u64));
        group.bench_function(BenchmarkId::new("decode", label), |b| {
            b.iter(|| {
                let mut refs: Vec<&mut [u8]> = blocks.iter_mut().map(|d| d.as_mut_slice()).collect();
                coder.decode_stripe(&mut refs, &erasures).unwrap();
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_encode, bench_decode);
criterion_main!(benches);
