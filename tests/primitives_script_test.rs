//! Script templates and parsing

use elements_ct::primitives::script::*;
use elements_ct::CtError;

#[test]
fn test_script_patterns() {
    let hash160 = [0x12; 20];
    let hash256 = [0x34; 32];

    let p2pkh = Script::new_p2pkh(&hash160);
    assert!(p2pkh.is_p2pkh());
    assert!(!p2pkh.is_p2sh());

    let p2sh = Script::new_p2sh(&hash160);
    assert!(p2sh.is_p2sh());
    assert!(!p2sh.is_p2pkh());

    let p2wpkh = Script::new_p2wpkh(&hash160);
    assert!(p2wpkh.is_p2wpkh());
    assert_eq!(p2wpkh.len(), 22);

    let p2wsh = Script::new_p2wsh(&hash256);
    assert!(p2wsh.is_p2wsh());
    assert!(Script::new_op_return().is_op_return());
}

#[test]
fn test_multisig_round_trip() {
    let keys: Vec<Vec<u8>> = (1..=3u8)
        .map(|i| {
            let mut key = vec![0x02];
            key.extend_from_slice(&[i; 32]);
            key
        })
        .collect();
    let script = keys
        .iter()
        .fold(ScriptBuilder::new().push_int(2), |builder, key| builder.push_slice(key))
        .push_int(3)
        .push_opcode(Opcode::OP_CHECKMULTISIG)
        .into_script();

    let (required, parsed) = script.multisig_pubkeys().unwrap();
    assert_eq!(required, 2);
    assert_eq!(parsed, keys);
    assert!(script.to_p2wsh().is_p2wsh());
    assert!(script.to_p2sh().is_p2sh());

    let not_multisig = Script::new_p2pkh(&[0u8; 20]);
    assert!(matches!(not_multisig.multisig_pubkeys(), Err(CtError::IllegalArgument(_))));
}

#[test]
fn test_hex_round_trip() {
    let script: Script = "76a914000000000000000000000000000000000000000088ac".parse().unwrap();
    assert!(script.is_p2pkh());
    assert_eq!(script.to_string(), "76a914000000000000000000000000000000000000000088ac");
}

#[test]
fn test_script_operations() {
    let script = Script::new();
    assert!(script.is_empty());
    assert_eq!(script.len(), 0);

    let script_with_data = Script::from_bytes(vec![0x76, 0xa9, 0x14]);
    assert!(!script_with_data.is_empty());
    assert_eq!(script_with_data.len(), 3);
    assert_eq!(script_with_data.as_bytes(), &[0x76, 0xa9, 0x14]);
    // the push runs past the end
    assert!(matches!(script_with_data.instructions(), Err(CtError::Format(_))));
}
