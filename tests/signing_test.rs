mod common;

use common::*;
use elements_ct::primitives::confidential::ConfidentialValue;
use elements_ct::primitives::script::Script;
use elements_ct::sighash::{HashType, SigHashType, SighashKey};
use elements_ct::transaction_signer::{encode_der_signature, sign_ecdsa, verify_ecdsa_signature, MultisigSigner};
use elements_ct::{ConfidentialTransaction, CtError};

fn two_input_tx() -> ConfidentialTransaction {
    build_transaction(
        &[outpoint(1, 0), outpoint(2, 0)],
        &[(asset(0xaa), 40_000, p2wpkh_script(5))],
        (asset(0xaa), 400),
    )
}

#[test]
fn test_p2wpkh_sign_and_verify() {
    let mut tx = two_input_tx();
    let spent = outpoint(1, 0);
    let key = SighashKey::Pubkey(pubkey(1));
    let value = ConfidentialValue::Explicit(20_000);

    let sighash = tx.sighash(&spent, HashType::P2wpkh, &key, &value, SigHashType::All).unwrap();
    let signature = encode_der_signature(&sign_ecdsa(&sighash, &privkey(1)).unwrap(), SigHashType::All).unwrap();
    tx.add_pubkey_hash_sign(&spent, HashType::P2wpkh, &pubkey(1), &signature).unwrap();

    let txin = tx.txin(0).unwrap();
    assert!(txin.script_sig.is_empty());
    assert_eq!(txin.witness.script_witness, vec![signature.clone(), pubkey(1).as_bytes().to_vec()]);
    assert!(tx.info().unwrap().wtxid != tx.txid().unwrap());

    // Witness data does not feed the segwit signature hash.
    assert!(tx
        .verify_signature(&spent, &signature, &pubkey(1), HashType::P2wpkh, &key, &value, SigHashType::All)
        .unwrap());
    assert!(!tx
        .verify_signature(
            &spent,
            &signature,
            &pubkey(1),
            HashType::P2wpkh,
            &key,
            &ConfidentialValue::Explicit(20_001),
            SigHashType::All
        )
        .unwrap());
}

#[test]
fn test_p2sh_p2wpkh_script_sig() {
    let mut tx = two_input_tx();
    let spent = outpoint(2, 0);
    let sighash = tx
        .sighash(
            &spent,
            HashType::P2shP2wpkh,
            &SighashKey::Pubkey(pubkey(2)),
            &ConfidentialValue::Explicit(20_400),
            SigHashType::All,
        )
        .unwrap();
    let signature = encode_der_signature(&sign_ecdsa(&sighash, &privkey(2)).unwrap(), SigHashType::All).unwrap();
    tx.add_pubkey_hash_sign(&spent, HashType::P2shP2wpkh, &pubkey(2), &signature).unwrap();

    let txin = tx.txin(1).unwrap();
    // push of the 22-byte p2wpkh redeem script
    assert_eq!(txin.script_sig.as_bytes()[0], 22);
    assert_eq!(&txin.script_sig.as_bytes()[1..], p2wpkh_script(2).as_bytes());
    assert_eq!(txin.witness.script_witness.len(), 2);
}

#[test]
fn test_pubkey_hash_sign_rejects_script_types() {
    let mut tx = two_input_tx();
    let signature = encode_der_signature(&sign_ecdsa(&[1u8; 32], &privkey(1)).unwrap(), SigHashType::All).unwrap();
    assert!(matches!(
        tx.add_pubkey_hash_sign(&outpoint(1, 0), HashType::P2wsh, &pubkey(1), &signature),
        Err(CtError::IllegalArgument(_))
    ));
    assert!(matches!(
        tx.add_pubkey_hash_sign(&outpoint(1, 0), HashType::P2pkh, &pubkey(1), &[0x30, 0x02]),
        Err(CtError::Signature(_))
    ));
}

fn multisig_signatures(tx: &ConfidentialTransaction, witness_script: &Script, signers: &[u8]) -> Vec<(Vec<u8>, u8)> {
    let sighash = tx
        .sighash(
            &outpoint(1, 0),
            HashType::P2wsh,
            &SighashKey::Script(witness_script.clone()),
            &ConfidentialValue::Explicit(20_000),
            SigHashType::All,
        )
        .unwrap();
    signers
        .iter()
        .map(|byte| {
            let compact = sign_ecdsa(&sighash, &privkey(*byte)).unwrap();
            (compact.to_vec(), *byte)
        })
        .collect()
}

#[test]
fn test_multisig_order_follows_script() {
    let keys = [pubkey(11), pubkey(12), pubkey(13)];
    let witness_script = multisig_script(2, &keys);
    let base = two_input_tx();
    let signatures = multisig_signatures(&base, &witness_script, &[13, 11]);

    let finalize_in_order = |order: &[usize]| {
        let mut tx = base.clone();
        let mut signer = MultisigSigner::new();
        for i in order {
            let (compact, byte) = &signatures[*i];
            signer.add_signature_compact(compact, pubkey(*byte), SigHashType::All).unwrap();
        }
        signer
            .finalize(&mut tx, &outpoint(1, 0), HashType::P2wsh, Some(&witness_script), None)
            .unwrap();
        tx
    };
    let forward = finalize_in_order(&[0, 1]);
    let backward = finalize_in_order(&[1, 0]);
    assert_eq!(forward.hex(), backward.hex());

    let stack = forward.txin(0).unwrap().witness.script_witness;
    assert_eq!(stack.len(), 4);
    assert!(stack[0].is_empty());
    assert_eq!(stack[3], witness_script.as_bytes().to_vec());
    let sighash = base
        .sighash(
            &outpoint(1, 0),
            HashType::P2wsh,
            &SighashKey::Script(witness_script.clone()),
            &ConfidentialValue::Explicit(20_000),
            SigHashType::All,
        )
        .unwrap();
    // key 11 precedes key 13 in the script
    assert!(verify_ecdsa_signature(&sighash, &stack[1], &pubkey(11)).unwrap());
    assert!(verify_ecdsa_signature(&sighash, &stack[2], &pubkey(13)).unwrap());
}

#[test]
fn test_multisig_p2sh_and_nested() {
    let keys = [pubkey(11), pubkey(12)];
    let script = multisig_script(1, &keys);
    let base = two_input_tx();
    let (compact, _) = multisig_signatures(&base, &script, &[12]).remove(0);

    let mut p2sh = base.clone();
    let mut signer = MultisigSigner::new();
    signer.add_signature_compact(&compact, pubkey(12), SigHashType::All).unwrap();
    signer.finalize(&mut p2sh, &outpoint(1, 0), HashType::P2sh, None, Some(&script)).unwrap();
    let script_sig = p2sh.txin(0).unwrap().script_sig;
    assert_eq!(script_sig.as_bytes()[0], 0x00);
    assert!(script_sig.as_bytes().ends_with(script.as_bytes()));

    let mut nested = base.clone();
    let mut signer = MultisigSigner::new();
    signer.add_signature_compact(&compact, pubkey(12), SigHashType::All).unwrap();
    signer
        .finalize(&mut nested, &outpoint(1, 0), HashType::P2shP2wsh, Some(&script), Some(&script.to_p2wsh()))
        .unwrap();
    let txin = nested.txin(0).unwrap();
    assert_eq!(&txin.script_sig.as_bytes()[1..], script.to_p2wsh().as_bytes());
    assert_eq!(txin.witness.script_witness.len(), 3);
}

#[test]
fn test_multisig_rejects_foreign_key() {
    let script = multisig_script(1, &[pubkey(11), pubkey(12)]);
    let mut tx = two_input_tx();
    let (compact, _) = multisig_signatures(&tx, &script, &[14]).remove(0);
    let mut signer = MultisigSigner::new();
    signer.add_signature_compact(&compact, pubkey(14), SigHashType::All).unwrap();
    assert!(matches!(
        signer.finalize(&mut tx, &outpoint(1, 0), HashType::P2wsh, Some(&script), None),
        Err(CtError::IllegalArgument(_))
    ));
    // the signer is spent even though finalize failed
    assert!(matches!(
        signer.finalize(&mut tx, &outpoint(1, 0), HashType::P2wsh, Some(&script), None),
        Err(CtError::ResourceState(_))
    ));
    assert!(tx.txin(0).unwrap().witness.script_witness.is_empty());
}

#[test]
fn test_anyone_can_pay_ignores_other_inputs() {
    let key = SighashKey::Pubkey(pubkey(1));
    let value = ConfidentialValue::Explicit(20_000);
    let acp = SigHashType::from_parts(SigHashType::All, true);

    let tx = two_input_tx();
    let mut extended = tx.clone();
    extended.add_txin(outpoint(3, 0).txid, 0, 0xffff_ffff).unwrap();

    for hash_type in [HashType::P2pkh, HashType::P2wpkh] {
        let before = tx.sighash(&outpoint(1, 0), hash_type, &key, &value, acp).unwrap();
        let after = extended.sighash(&outpoint(1, 0), hash_type, &key, &value, acp).unwrap();
        assert_eq!(before, after);
        let all_before = tx.sighash(&outpoint(1, 0), hash_type, &key, &value, SigHashType::All).unwrap();
        let all_after = extended.sighash(&outpoint(1, 0), hash_type, &key, &value, SigHashType::All).unwrap();
        assert_ne!(all_before, all_after);
    }
}
