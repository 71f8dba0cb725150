mod common;

use common::*;
use elements_ct::adaptor::{self, AdaptorSignature};
use elements_ct::schnorr::{self, SchnorrPubkey, SchnorrSignature};
use elements_ct::types::LogLevel;
use elements_ct::{init, CtConfig, CtError};

#[test]
fn test_schnorr_sign_verify_across_keys() {
    let msg = [0x42u8; 32];
    for byte in 1..6u8 {
        let sk = privkey(byte);
        let pubkey = SchnorrPubkey::from_privkey(&sk).unwrap();
        assert_eq!(pubkey, SchnorrPubkey::from_pubkey(&sk.pubkey().unwrap()));

        let sig = schnorr::sign(&msg, &sk, &[byte; 32]).unwrap();
        assert_eq!(sig, schnorr::sign(&msg, &sk, &[byte; 32]).unwrap());
        assert!(schnorr::verify(&sig, &msg, &pubkey).unwrap());

        let other = SchnorrPubkey::from_privkey(&privkey(byte + 10)).unwrap();
        assert!(!schnorr::verify(&sig, &msg, &other).unwrap());

        let point = schnorr::compute_sig_point(&msg, &sig.nonce(), &pubkey).unwrap();
        let scalar = elements_ct::keys::Privkey::from_slice(&sig.scalar()).unwrap();
        assert_eq!(point, scalar.pubkey().unwrap());
    }
}

#[test]
fn test_schnorr_signature_hex() {
    let sig = schnorr::sign(&[1u8; 32], &privkey(3), &[0u8; 32]).unwrap();
    let parsed: SchnorrSignature = sig.to_string().parse().unwrap();
    assert_eq!(parsed, sig);
    assert!(matches!(SchnorrSignature::from_hex(&sig.to_hex()[2..]), Err(CtError::IllegalArgument(_))));
}

#[test]
fn test_adaptor_swap_flow() {
    // Alice encrypts her signature to Bob's adaptor point; Bob publishes the
    // completed signature, which hands Alice his secret.
    let msg = [0x17u8; 32];
    let alice = privkey(0x21);
    let bob_secret = privkey(0x31);
    let adaptor_point = bob_secret.pubkey().unwrap();

    let pair = adaptor::sign(&msg, &alice, &adaptor_point).unwrap();
    assert!(adaptor::verify(&pair.signature, &pair.proof, &adaptor_point, &msg, &alice.pubkey().unwrap()).unwrap());
    assert!(!adaptor::verify(&pair.signature, &pair.proof, &adaptor_point, &[0x18u8; 32], &alice.pubkey().unwrap()).unwrap());

    let completed = adaptor::adapt(&pair.signature, &bob_secret).unwrap();
    assert!(elements_ct::transaction_signer::verify_ecdsa_signature(&msg, &completed, &alice.pubkey().unwrap()).unwrap());
    assert_eq!(adaptor::extract_secret(&pair.signature, &completed, &adaptor_point).unwrap(), bob_secret);

    let other = adaptor::sign(&[0x19u8; 32], &alice, &adaptor_point).unwrap();
    assert!(matches!(
        adaptor::extract_secret(&other.signature, &completed, &adaptor_point),
        Err(CtError::Signature(_))
    ));
}

#[test]
fn test_adaptor_signature_lengths() {
    assert!(matches!(AdaptorSignature::from_hex(&"00".repeat(64)), Err(CtError::IllegalArgument(_))));
    assert!(AdaptorSignature::from_hex(&"00".repeat(65)).is_ok());
}

#[test]
fn test_init_is_repeatable() {
    let config = CtConfig {
        log_level: Some(LogLevel::Debug),
        ..CtConfig::default()
    };
    init(&config).unwrap();
    init(&config).unwrap();
}
