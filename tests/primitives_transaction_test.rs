use elements_ct::primitives::confidential::{AssetId, ConfidentialAsset, ConfidentialNonce, ConfidentialValue};
use elements_ct::primitives::encode::{Decodable, Encodable};
use elements_ct::primitives::script::Script;
use elements_ct::primitives::transaction::*;
use std::io::Cursor;

fn explicit_output(value: u64, script: Vec<u8>) -> TxOut {
    TxOut {
        asset: ConfidentialAsset::Explicit(AssetId([0xaa; 32])),
        value: ConfidentialValue::Explicit(value),
        nonce: ConfidentialNonce::Null,
        script_pubkey: Script(script),
        witness: TxOutWitness::default(),
    }
}

#[test]
fn test_transaction_encode_decode_roundtrip() {
    let mut input = TxIn::new(OutPoint::new(Txid([1; 32]), 0), 0xffffffff);
    input.script_sig = Script(vec![0x51]);
    let tx = Transaction {
        version: 2,
        lock_time: 0,
        input: vec![input],
        output: vec![explicit_output(10_000_000, vec![0x00, 0x14])],
    };

    let mut encoded = Vec::new();
    tx.consensus_encode(&mut encoded).unwrap();
    assert!(!encoded.is_empty());
    // no witness flag
    assert_eq!(encoded[4], 0x00);

    let mut cursor = Cursor::new(&encoded);
    let decoded = Transaction::consensus_decode(&mut cursor).unwrap();
    assert_eq!(tx, decoded);
    assert!(!decoded.has_witness());
}

#[test]
fn test_witness_transaction_encode_decode_roundtrip() {
    let mut input = TxIn::new(OutPoint::new(Txid([2; 32]), 1), 0xfffffffe);
    input.witness.script_witness = vec![vec![0x30, 0x44, 0x02, 0x20], vec![0x03, 0x21]];
    let mut output = explicit_output(5_000_000, vec![0x00, 0x14]);
    output.witness.rangeproof = vec![0x60; 8];
    let tx = Transaction {
        version: 2,
        lock_time: 500000,
        input: vec![input],
        output: vec![output, explicit_output(1_000, vec![])],
    };

    let encoded = tx.consensus_encode_to_vec().unwrap();
    assert_eq!(encoded[4], 0x01);
    let decoded = Transaction::consensus_decode_from_slice(&encoded).unwrap();
    assert_eq!(tx, decoded);
    assert!(decoded.has_witness());
    assert_eq!(decoded.input[0].witness.script_witness.len(), 2);
    assert!(decoded.output[1].is_fee());
}

#[test]
fn test_transaction_ids() {
    let mut input = TxIn::new(OutPoint::new(Txid([3; 32]), 0), 0xffffffff);
    input.witness.script_witness = vec![vec![0x01, 0x02, 0x03]];
    let mut tx = Transaction {
        version: 2,
        lock_time: 0,
        input: vec![input],
        output: vec![explicit_output(1_000_000, vec![0x00, 0x14])],
    };

    assert_ne!(tx.txid().unwrap(), tx.wtxid().unwrap());
    assert!(tx.weight().unwrap() < tx.total_size().unwrap() * 4);

    tx.input[0].witness = TxInWitness::default();
    assert_eq!(tx.txid().unwrap(), tx.wtxid().unwrap());
    assert_eq!(tx.weight().unwrap(), tx.base_size().unwrap() * 4);
}

#[test]
fn test_outpoint_display_is_reversed() {
    let mut txid = [0u8; 32];
    txid[0] = 0xab;
    let outpoint = OutPoint::new(Txid(txid), 7);
    assert!(outpoint.to_string().ends_with("ab:7"));
    assert_eq!(&outpoint.to_bytes()[32..], &7u32.to_le_bytes());
}
