//! Benchmarks for key wrapping and AEAD
//!
//! Run with: cargo bench --bench key_wrap_benchmark

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;
use tap_crypto::{Crypto, Curve, DefaultCrypto, KeyHandle, KeyTemplate, WrapKeyOptions};

const CURVES: [Curve; 4] = [Curve::P256, Curve::P384, Curve::P521, Curve::X25519];

/// Benchmark wrap + unwrap of a 32-byte CEK per curve, for ECDH-ES and ECDH-1PU
fn bench_wrap_unwrap(c: &mut Criterion) {
    let crypto = DefaultCrypto::new();
    let cek = [0x5au8; 32];

    let mut group = c.benchmark_group("key_wrap");

    for curve in CURVES {
        // Keys are generated once, outside the benchmark loop
        let sender = KeyHandle::generate(KeyTemplate::Ecdh(curve));
        let recipient = KeyHandle::generate(KeyTemplate::Ecdh(curve));
        let recipient_pub = recipient.primary_public_key().unwrap();

        group.bench_function(BenchmarkId::new("ecdh-es", curve.as_str()), |b| {
            let opts = WrapKeyOptions::new();
            b.iter(|| {
                let wrapped = crypto
                    .wrap_key(&cek, b"Alice", b"Bob", Some(&recipient_pub), opts)
                    .unwrap();
                black_box(crypto.unwrap_key(&wrapped, &recipient, opts).unwrap());
            });
        });

        group.bench_function(BenchmarkId::new("ecdh-1pu", curve.as_str()), |b| {
            let opts = WrapKeyOptions::new().with_sender(&sender);
            b.iter(|| {
                let wrapped = crypto
                    .wrap_key(&cek, b"Alice", b"Bob", Some(&recipient_pub), opts)
                    .unwrap();
                black_box(crypto.unwrap_key(&wrapped, &recipient, opts).unwrap());
            });
        });
    }

    group.finish();
}

/// Benchmark AEAD encryption of a 4 KiB message
fn bench_encrypt(c: &mut Criterion) {
    let crypto = DefaultCrypto::new();
    let msg = vec![0u8; 4096];

    let mut group = c.benchmark_group("aead_encrypt");

    for (name, template) in [
        ("A256GCM", KeyTemplate::Aes256Gcm),
        ("XC20P", KeyTemplate::XChaCha20Poly1305),
    ] {
        let kh = KeyHandle::generate(template);
        group.bench_function(BenchmarkId::new("encrypt", name), |b| {
            b.iter(|| black_box(crypto.encrypt(&msg, b"", &kh).unwrap()));
        });
    }

    group.finish();
}

criterion_group!(key_wrap_benches, bench_wrap_unwrap, bench_encrypt);
criterion_main!(key_wrap_benches);
