#![allow(dead_code)]

use elements_ct::keys::{Privkey, Pubkey};
use elements_ct::primitives::confidential::AssetId;
use elements_ct::primitives::hash::hash160;
use elements_ct::primitives::script::{Opcode, Script, ScriptBuilder};
use elements_ct::primitives::transaction::{OutPoint, Txid};
use elements_ct::transaction::SEQUENCE_FINAL;
use elements_ct::ConfidentialTransaction;

pub fn privkey(byte: u8) -> Privkey {
    Privkey::from_hex(&format!("{:02x}", byte).repeat(32)).unwrap()
}

pub fn pubkey(byte: u8) -> Pubkey {
    privkey(byte).pubkey().unwrap()
}

pub fn asset(byte: u8) -> AssetId {
    AssetId([byte; 32])
}

pub fn outpoint(byte: u8, vout: u32) -> OutPoint {
    OutPoint::new(Txid([byte; 32]), vout)
}

pub fn p2wpkh_script(byte: u8) -> Script {
    Script::new_p2wpkh(&hash160(pubkey(byte).as_bytes()))
}

/// `OP_m <keys> OP_n OP_CHECKMULTISIG`
pub fn multisig_script(required: u8, keys: &[Pubkey]) -> Script {
    let builder = keys
        .iter()
        .fold(ScriptBuilder::new().push_opcode(Opcode::OP_N(required)), |builder, key| {
            builder.push_slice(key.as_bytes())
        });
    builder
        .push_opcode(Opcode::OP_N(keys.len() as u8))
        .push_opcode(Opcode::OP_CHECKMULTISIG)
        .into_script()
}

/// Spends `outpoints` into one output per entry of `outputs` plus a fee.
pub fn build_transaction(outpoints: &[OutPoint], outputs: &[(AssetId, u64, Script)], fee: (AssetId, u64)) -> ConfidentialTransaction {
    let mut tx = ConfidentialTransaction::new(2, 0).unwrap();
    for outpoint in outpoints {
        tx.add_txin(outpoint.txid, outpoint.vout, SEQUENCE_FINAL).unwrap();
    }
    for (asset, amount, script) in outputs {
        tx.add_txout(*asset, *amount, script).unwrap();
    }
    tx.add_fee_txout(fee.0, fee.1).unwrap();
    tx
}
