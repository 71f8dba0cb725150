//! Performance benchmarks for the signature utilities

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use elements_ct::adaptor;
use elements_ct::keys::Privkey;
use elements_ct::schnorr::{self, SchnorrPubkey};
use elements_ct::transaction_signer::{sign_ecdsa, verify_ecdsa_signature};

fn key(byte: u8) -> Privkey {
    Privkey::from_hex(&format!("{:02x}", byte).repeat(32)).unwrap()
}

fn bench_ecdsa(c: &mut Criterion) {
    let mut group = c.benchmark_group("ecdsa");
    let sk = key(0x11);
    let pubkey = sk.pubkey().unwrap();
    let sighash = [0x5a; 32];
    let signature = sign_ecdsa(&sighash, &sk).unwrap();

    group.bench_function("sign", |b| b.iter(|| sign_ecdsa(black_box(&sighash), &sk).unwrap()));
    group.bench_function("verify", |b| {
        b.iter(|| verify_ecdsa_signature(black_box(&sighash), &signature, &pubkey).unwrap())
    });
    group.finish();
}

fn bench_schnorr(c: &mut Criterion) {
    let mut group = c.benchmark_group("schnorr");
    let sk = key(0x22);
    let pubkey = SchnorrPubkey::from_privkey(&sk).unwrap();
    let msg = [0x42; 32];
    let signature = schnorr::sign(&msg, &sk, &[0u8; 32]).unwrap();

    group.bench_function("sign", |b| b.iter(|| schnorr::sign(black_box(&msg), &sk, &[0u8; 32]).unwrap()));
    group.bench_function("verify", |b| {
        b.iter(|| schnorr::verify(&signature, black_box(&msg), &pubkey).unwrap())
    });
    group.bench_function("compute_sig_point", |b| {
        b.iter(|| schnorr::compute_sig_point(black_box(&msg), &signature.nonce(), &pubkey).unwrap())
    });
    group.finish();
}

fn bench_adaptor(c: &mut Criterion) {
    let mut group = c.benchmark_group("adaptor");
    let sk = key(0x33);
    let pubkey = sk.pubkey().unwrap();
    let secret = key(0x44);
    let adaptor_point = secret.pubkey().unwrap();
    let msg = [0x17; 32];
    let pair = adaptor::sign(&msg, &sk, &adaptor_point).unwrap();

    group.bench_function("sign", |b| b.iter(|| adaptor::sign(black_box(&msg), &sk, &adaptor_point).unwrap()));
    group.bench_function("verify", |b| {
        b.iter(|| adaptor::verify(&pair.signature, &pair.proof, &adaptor_point, black_box(&msg), &pubkey).unwrap())
    });
    group.bench_function("adapt", |b| b.iter(|| adaptor::adapt(black_box(&pair.signature), &secret).unwrap()));
    group.finish();
}

criterion_group!(crypto_benches, bench_ecdsa, bench_schnorr, bench_adaptor);
criterion_main!(crypto_benches);
