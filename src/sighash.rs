//! Elements signature hashes.
//!
//! Segwit v0 inputs use the BIP143 digest extended with `hashIssuance` and
//! the per-input issuance; values are committed in their confidential
//! serialization. Legacy inputs hash a modified copy of the transaction.

use crate::keys::Pubkey;
use crate::primitives::confidential::{ConfidentialAsset, ConfidentialNonce, ConfidentialValue};
use crate::primitives::encode::Encodable;
use crate::primitives::hash::{hash160, sha256d, Hash256};
use crate::primitives::script::Script;
use crate::primitives::transaction::{OutPoint, Transaction, TxOut, TxOutWitness};
use crate::transaction::{input_index, ConfidentialTransaction};
use crate::{CtError, Result};
use serde::{Deserialize, Serialize};

/// Signature hash types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SigHashType {
    /// Sign all inputs and outputs
    All = 0x01,
    /// Sign all inputs, no outputs
    None = 0x02,
    /// Sign all inputs, only the output with the same index
    Single = 0x03,
    /// Sign all inputs and outputs, anyone can add inputs
    AllPlusAnyoneCanPay = 0x81,
    /// Sign all inputs, no outputs, anyone can add inputs
    NonePlusAnyoneCanPay = 0x82,
    /// Sign all inputs, only matching output, anyone can add inputs
    SinglePlusAnyoneCanPay = 0x83,
}

impl Default for SigHashType {
    fn default() -> Self {
        SigHashType::All
    }
}

impl SigHashType {
    /// Get the byte value of the signature hash type
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn from_u8(value: u8) -> Result<Self> {
        match value {
            0x01 => Ok(SigHashType::All),
            0x02 => Ok(SigHashType::None),
            0x03 => Ok(SigHashType::Single),
            0x81 => Ok(SigHashType::AllPlusAnyoneCanPay),
            0x82 => Ok(SigHashType::NonePlusAnyoneCanPay),
            0x83 => Ok(SigHashType::SinglePlusAnyoneCanPay),
            other => Err(CtError::IllegalArgument(format!("unsupported sighash type 0x{:02x}", other))),
        }
    }

    /// Combines a base type (All, None or Single) with the anyone-can-pay flag.
    pub fn from_parts(base: SigHashType, anyone_can_pay: bool) -> Self {
        match (base.base(), anyone_can_pay) {
            (SigHashType::None, false) => SigHashType::None,
            (SigHashType::Single, false) => SigHashType::Single,
            (_, false) => SigHashType::All,
            (SigHashType::None, true) => SigHashType::NonePlusAnyoneCanPay,
            (SigHashType::Single, true) => SigHashType::SinglePlusAnyoneCanPay,
            (_, true) => SigHashType::AllPlusAnyoneCanPay,
        }
    }

    /// The type without the anyone-can-pay flag.
    pub fn base(self) -> SigHashType {
        match self {
            SigHashType::All | SigHashType::AllPlusAnyoneCanPay => SigHashType::All,
            SigHashType::None | SigHashType::NonePlusAnyoneCanPay => SigHashType::None,
            SigHashType::Single | SigHashType::SinglePlusAnyoneCanPay => SigHashType::Single,
        }
    }

    /// Check if this sighash type uses ANYONECANPAY
    pub fn is_anyone_can_pay(self) -> bool {
        matches!(
            self,
            SigHashType::AllPlusAnyoneCanPay
                | SigHashType::NonePlusAnyoneCanPay
                | SigHashType::SinglePlusAnyoneCanPay
        )
    }
}

/// How the spent output is locked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HashType {
    P2pkh,
    P2sh,
    P2wpkh,
    P2wsh,
    P2shP2wpkh,
    P2shP2wsh,
}

impl HashType {
    pub fn is_segwit(self) -> bool {
        !matches!(self, HashType::P2pkh | HashType::P2sh)
    }

    /// Whether the signing script is derived from a single public key.
    pub fn is_pubkey_hash(self) -> bool {
        matches!(self, HashType::P2pkh | HashType::P2wpkh | HashType::P2shP2wpkh)
    }
}

/// Key material the script code is derived from: a public key for the
/// pubkey-hash types, the redeem or witness script otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SighashKey {
    Pubkey(Pubkey),
    Script(Script),
}

/// Signature hash of the input spending `outpoint`.
pub fn signature_hash(
    tx: &ConfidentialTransaction,
    outpoint: &OutPoint,
    hash_type: HashType,
    key: &SighashKey,
    value: &ConfidentialValue,
    sighash_type: SigHashType,
) -> Result<Hash256> {
    let transaction = tx.transaction()?;
    let index = input_index(&transaction, outpoint)?;
    let script_code = script_code(hash_type, key)?;
    if hash_type.is_segwit() {
        if value.is_null() {
            return Err(CtError::IllegalArgument("segwit signature hash needs the spent value".to_string()));
        }
        signature_hash_segwit_v0(&transaction, index, &script_code, value, sighash_type)
    } else {
        signature_hash_legacy(&transaction, index, &script_code, sighash_type)
    }
}

fn script_code(hash_type: HashType, key: &SighashKey) -> Result<Script> {
    match (hash_type.is_pubkey_hash(), key) {
        (true, SighashKey::Pubkey(pubkey)) => Ok(Script::new_p2pkh(&hash160(pubkey.as_bytes()))),
        (false, SighashKey::Script(script)) if !script.is_empty() => Ok(script.clone()),
        (true, _) => Err(CtError::IllegalArgument(format!("{:?} signature hash needs a public key", hash_type))),
        (false, _) => Err(CtError::IllegalArgument(format!("{:?} signature hash needs a script", hash_type))),
    }
}

/// Create signature hash for legacy (non-SegWit) inputs
fn signature_hash_legacy(
    transaction: &Transaction,
    input_index: usize,
    script_code: &Script,
    sighash_type: SigHashType,
) -> Result<Hash256> {
    let base = sighash_type.base();
    if base == SigHashType::Single && input_index >= transaction.output.len() {
        let mut one = [0u8; 32];
        one[0] = 1;
        return Ok(one);
    }

    let mut tx_copy = transaction.clone();
    for input in &mut tx_copy.input {
        input.script_sig = Script::new();
        input.witness = Default::default();
    }
    tx_copy.input[input_index].script_sig = script_code.without_codeseparators()?;
    for output in &mut tx_copy.output {
        output.witness = TxOutWitness::default();
    }

    match base {
        SigHashType::None => {
            tx_copy.output.clear();
            zero_other_sequences(&mut tx_copy, input_index);
        }
        SigHashType::Single => {
            tx_copy.output.truncate(input_index + 1);
            for output in tx_copy.output.iter_mut().take(input_index) {
                *output = null_output();
            }
            zero_other_sequences(&mut tx_copy, input_index);
        }
        _ => {}
    }

    if sighash_type.is_anyone_can_pay() {
        let input = tx_copy.input[input_index].clone();
        tx_copy.input = vec![input];
    }

    let mut serialized = Vec::new();
    tx_copy.version.consensus_encode(&mut serialized)?;
    tx_copy.input.consensus_encode(&mut serialized)?;
    tx_copy.output.consensus_encode(&mut serialized)?;
    tx_copy.lock_time.consensus_encode(&mut serialized)?;
    serialized.extend_from_slice(&(sighash_type.as_u8() as u32).to_le_bytes());

    Ok(sha256d(&serialized))
}

fn zero_other_sequences(tx: &mut Transaction, input_index: usize) {
    for (i, input) in tx.input.iter_mut().enumerate() {
        if i != input_index {
            input.sequence = 0;
        }
    }
}

fn null_output() -> TxOut {
    TxOut {
        asset: ConfidentialAsset::Null,
        value: ConfidentialValue::Null,
        nonce: ConfidentialNonce::Null,
        script_pubkey: Script::new(),
        witness: TxOutWitness::default(),
    }
}

/// Create signature hash for segwit v0 inputs
fn signature_hash_segwit_v0(
    transaction: &Transaction,
    input_index: usize,
    script_code: &Script,
    value: &ConfidentialValue,
    sighash_type: SigHashType,
) -> Result<Hash256> {
    let base = sighash_type.base();
    let anyone_can_pay = sighash_type.is_anyone_can_pay();
    let mut hasher_data = Vec::new();

    // 1. nVersion
    transaction.version.consensus_encode(&mut hasher_data)?;

    // 2. hashPrevouts
    if !anyone_can_pay {
        let mut prevouts = Vec::new();
        for input in &transaction.input {
            prevouts.extend_from_slice(&input.previous_output.to_bytes());
        }
        hasher_data.extend_from_slice(&sha256d(&prevouts));
    } else {
        hasher_data.extend_from_slice(&[0u8; 32]);
    }

    // 3. hashSequence
    if !anyone_can_pay && base != SigHashType::Single && base != SigHashType::None {
        let mut sequences = Vec::new();
        for input in &transaction.input {
            sequences.extend_from_slice(&input.sequence.to_le_bytes());
        }
        hasher_data.extend_from_slice(&sha256d(&sequences));
    } else {
        hasher_data.extend_from_slice(&[0u8; 32]);
    }

    // 4. hashIssuance
    if !anyone_can_pay {
        let mut issuances = Vec::new();
        for input in &transaction.input {
            match &input.asset_issuance {
                Some(issuance) => {
                    issuance.consensus_encode(&mut issuances)?;
                }
                None => issuances.push(0x00),
            }
        }
        hasher_data.extend_from_slice(&sha256d(&issuances));
    } else {
        hasher_data.extend_from_slice(&[0u8; 32]);
    }

    // 5. outpoint, scriptCode, value, nSequence
    let input = &transaction.input[input_index];
    hasher_data.extend_from_slice(&input.previous_output.to_bytes());
    script_code.consensus_encode(&mut hasher_data)?;
    value.consensus_encode(&mut hasher_data)?;
    input.sequence.consensus_encode(&mut hasher_data)?;

    // 6. issuance of the signed input
    if let Some(issuance) = &input.asset_issuance {
        issuance.consensus_encode(&mut hasher_data)?;
    }

    // 7. hashOutputs
    if base != SigHashType::Single && base != SigHashType::None {
        let mut outputs = Vec::new();
        transaction
            .output
            .iter()
            .try_for_each(|output| output.consensus_encode(&mut outputs).map(|_| ()))?;
        hasher_data.extend_from_slice(&sha256d(&outputs));
    } else if base == SigHashType::Single && input_index < transaction.output.len() {
        let output_data = transaction.output[input_index].consensus_encode_to_vec()?;
        hasher_data.extend_from_slice(&sha256d(&output_data));
    } else {
        hasher_data.extend_from_slice(&[0u8; 32]);
    }

    // 8. nLockTime and sighash type
    transaction.lock_time.consensus_encode(&mut hasher_data)?;
    hasher_data.extend_from_slice(&(sighash_type.as_u8() as u32).to_le_bytes());

    Ok(sha256d(&hasher_data))
}
