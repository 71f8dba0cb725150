//! Confidential transaction container.
//!
//! [`ConfidentialTransaction`] owns the canonical hex serialization of an
//! Elements transaction and a lazily computed cache of its derived fields
//! (ids, witness hash, sizes). Every mutator decodes a working copy,
//! applies the change and only then replaces the stored hex, so a failed
//! call leaves the container untouched.

use crate::blind::TransactionBlinder;
use crate::issuance::{
    calculate_asset, calculate_reissuance_token, generate_asset_entropy, issuance_data, AssetEntropy,
    IssuanceData, IssuanceKeys,
};
use crate::keys::{Privkey, Pubkey};
use crate::primitives::confidential::{
    AssetId, AssetValueData, BlindFactor, ConfidentialAsset, ConfidentialNonce, ConfidentialValue,
};
use crate::primitives::encode::{Decodable, Encodable};
use crate::primitives::hash::Hash256;
use crate::primitives::script::{Script, ScriptBuilder};
use crate::primitives::transaction::{
    AssetIssuance, OutPoint, Transaction, TxIn, TxOut, TxOutWitness, Txid, OUTPOINT_INDEX_MASK,
};
use crate::sighash::{signature_hash, HashType, SigHashType, SighashKey};
use crate::transaction_signer::{apply_pubkey_hash_sign, verify_ecdsa_signature};
use crate::types::BlindOptions;
use crate::unblind::{unblind_issuance, unblind_output};
use crate::{CtError, Result};
use log::trace;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Mutex, MutexGuard};

/// Sequence number that disables both relative and absolute locktime.
pub const SEQUENCE_FINAL: u32 = 0xffff_ffff;
/// Highest sequence number that still enables the absolute locktime.
pub const SEQUENCE_ENABLE_LOCKTIME_MAX: u32 = 0xffff_fffe;

/// Derived fields of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxInfo {
    pub txid: Txid,
    pub wtxid: Txid,
    #[serde(with = "hex::serde")]
    pub witness_hash: Hash256,
    pub size: usize,
    pub vsize: usize,
    pub weight: usize,
    pub version: i32,
    pub locktime: u32,
}

impl TxInfo {
    fn compute(tx: &Transaction) -> Result<Self> {
        Ok(TxInfo {
            txid: tx.txid()?,
            wtxid: tx.wtxid()?,
            witness_hash: tx.witness_hash()?,
            size: tx.total_size()?,
            vsize: tx.vsize()?,
            weight: tx.weight()?,
            version: tx.version,
            locktime: tx.lock_time,
        })
    }
}

struct CachedInfo {
    source: String,
    info: TxInfo,
}

/// An Elements transaction held in canonical serialized form.
pub struct ConfidentialTransaction {
    hex: String,
    cache: Mutex<Option<CachedInfo>>,
}

impl ConfidentialTransaction {
    /// An empty transaction with the given version and locktime.
    pub fn new(version: i32, locktime: u32) -> Result<Self> {
        Self::from_transaction(&Transaction::new(version, locktime))
    }

    /// Parses a transaction. The stored hex is the re-serialization, which
    /// is byte-identical to the input for well-formed data.
    pub fn from_hex(hex: &str) -> Result<Self> {
        let bytes = hex::decode(hex.trim())?;
        let tx = Transaction::consensus_decode_from_slice(&bytes)?;
        Self::from_transaction(&tx)
    }

    pub fn from_transaction(tx: &Transaction) -> Result<Self> {
        Ok(ConfidentialTransaction {
            hex: hex::encode(tx.consensus_encode_to_vec()?),
            cache: Mutex::new(None),
        })
    }

    pub fn hex(&self) -> &str {
        &self.hex
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(hex::decode(&self.hex)?)
    }

    /// Decoded working copy of the transaction.
    pub fn transaction(&self) -> Result<Transaction> {
        Transaction::consensus_decode_from_slice(&self.to_bytes()?)
    }

    /// Runs `f` on a decoded copy and stores the result only if `f` succeeds.
    pub(crate) fn update<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Transaction) -> Result<T>,
    {
        let mut tx = self.transaction()?;
        let value = f(&mut tx)?;
        self.hex = hex::encode(tx.consensus_encode_to_vec()?);
        Ok(value)
    }

    fn lock_cache(&self) -> MutexGuard<'_, Option<CachedInfo>> {
        // The cache is rebuilt from the hex on mismatch, so a poisoned
        // guard holds nothing worth discarding.
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn info(&self) -> Result<TxInfo> {
        let mut cache = self.lock_cache();
        if let Some(cached) = cache.as_ref() {
            if cached.source == self.hex {
                return Ok(cached.info);
            }
        }
        trace!("recomputing derived fields for {} byte transaction", self.hex.len() / 2);
        let info = TxInfo::compute(&self.transaction()?)?;
        *cache = Some(CachedInfo {
            source: self.hex.clone(),
            info,
        });
        Ok(info)
    }

    pub fn txid(&self) -> Result<Txid> {
        Ok(self.info()?.txid)
    }

    pub fn wtxid(&self) -> Result<Txid> {
        Ok(self.info()?.wtxid)
    }

    pub fn witness_hash(&self) -> Result<Hash256> {
        Ok(self.info()?.witness_hash)
    }

    pub fn size(&self) -> Result<usize> {
        Ok(self.info()?.size)
    }

    pub fn vsize(&self) -> Result<usize> {
        Ok(self.info()?.vsize)
    }

    pub fn weight(&self) -> Result<usize> {
        Ok(self.info()?.weight)
    }

    pub fn version(&self) -> Result<i32> {
        Ok(self.info()?.version)
    }

    pub fn locktime(&self) -> Result<u32> {
        Ok(self.info()?.locktime)
    }

    pub fn txin_count(&self) -> Result<usize> {
        Ok(self.transaction()?.input.len())
    }

    pub fn txout_count(&self) -> Result<usize> {
        Ok(self.transaction()?.output.len())
    }

    pub fn txin(&self, index: usize) -> Result<TxIn> {
        self.transaction()?
            .input
            .into_iter()
            .nth(index)
            .ok_or_else(|| CtError::IllegalArgument(format!("input index {} out of range", index)))
    }

    pub fn txout(&self, index: usize) -> Result<TxOut> {
        self.transaction()?
            .output
            .into_iter()
            .nth(index)
            .ok_or_else(|| CtError::IllegalArgument(format!("output index {} out of range", index)))
    }

    /// Position of the input spending `outpoint`.
    pub fn txin_index(&self, outpoint: &OutPoint) -> Result<usize> {
        input_index(&self.transaction()?, outpoint)
    }

    pub fn add_txin(&mut self, txid: Txid, vout: u32, sequence: u32) -> Result<usize> {
        if vout != u32::MAX && vout > OUTPOINT_INDEX_MASK {
            return Err(CtError::IllegalArgument(format!("output index {} collides with outpoint flags", vout)));
        }
        let outpoint = OutPoint::new(txid, vout);
        self.update(|tx| {
            if tx.input.iter().any(|i| i.previous_output == outpoint) {
                return Err(CtError::IllegalArgument(format!("input {} already present", outpoint)));
            }
            tx.input.push(TxIn::new(outpoint, sequence));
            Ok(tx.input.len() - 1)
        })
    }

    /// Appends an output paying an explicit `amount` of `asset`.
    pub fn add_txout(&mut self, asset: AssetId, amount: u64, locking_script: &Script) -> Result<usize> {
        self.add_txout_commitment(
            ConfidentialAsset::Explicit(asset),
            ConfidentialValue::Explicit(amount),
            ConfidentialNonce::Null,
            locking_script,
        )
    }

    /// Appends an output whose asset, value and nonce are given verbatim,
    /// explicit or committed.
    pub fn add_txout_commitment(
        &mut self,
        asset: ConfidentialAsset,
        value: ConfidentialValue,
        nonce: ConfidentialNonce,
        locking_script: &Script,
    ) -> Result<usize> {
        if asset.is_null() || value.is_null() {
            return Err(CtError::IllegalArgument("output asset and value must be set".to_string()));
        }
        let txout = TxOut {
            asset,
            value,
            nonce,
            script_pubkey: locking_script.clone(),
            witness: TxOutWitness::default(),
        };
        self.update(|tx| {
            tx.output.push(txout);
            Ok(tx.output.len() - 1)
        })
    }

    /// Appends the explicit fee output (empty locking script).
    pub fn add_fee_txout(&mut self, asset: AssetId, amount: u64) -> Result<usize> {
        self.add_txout(asset, amount, &Script::new())
    }

    /// Appends a burn output locked by a bare `OP_RETURN`.
    pub fn add_destroy_amount_txout(&mut self, asset: AssetId, amount: u64) -> Result<usize> {
        self.add_txout(asset, amount, &Script::new_op_return())
    }

    /// Entropy, asset and token of the issuance carried by input `index`.
    ///
    /// The token id is read from the current encoding: it uses the
    /// confidential flag only once the issued amount is a commitment. An
    /// issuance set up with `is_blind` therefore reports the explicit token
    /// id until it is blinded, and the id [`set_issue_asset`] returned
    /// afterwards.
    ///
    /// [`set_issue_asset`]: Self::set_issue_asset
    pub fn issuance(&self, index: usize) -> Result<Option<IssuanceData>> {
        Ok(issuance_data(&self.txin(index)?))
    }

    /// Turns the input spending `outpoint` into a new issuance and appends
    /// the asset and token outputs. A zero amount leaves that leg out.
    ///
    /// With `is_blind` the returned token id is the one for a blinded
    /// amount, so the amount must be blinded with an asset issuance key.
    #[allow(clippy::too_many_arguments)]
    pub fn set_issue_asset(
        &mut self,
        outpoint: &OutPoint,
        asset_amount: u64,
        asset_script: &Script,
        token_amount: u64,
        token_script: &Script,
        is_blind: bool,
        contract_hash: Option<[u8; 32]>,
    ) -> Result<IssuanceData> {
        if asset_amount == 0 && token_amount == 0 {
            return Err(CtError::IllegalArgument("issuance needs an asset or token amount".to_string()));
        }
        if (asset_amount > 0 && asset_script.is_empty()) || (token_amount > 0 && token_script.is_empty()) {
            return Err(CtError::IllegalArgument("issuance destination script is empty".to_string()));
        }

        let contract_hash = contract_hash.unwrap_or_default();
        let entropy = generate_asset_entropy(outpoint, &contract_hash);
        let asset = calculate_asset(&entropy);
        // The token id records whether the issued amount is blinded.
        let token = calculate_reissuance_token(&entropy, is_blind && asset_amount > 0);

        self.update(|tx| {
            let index = input_index(tx, outpoint)?;
            let txin = &mut tx.input[index];
            if txin.asset_issuance.is_some() {
                return Err(CtError::IllegalArgument(format!("input {} already carries an issuance", outpoint)));
            }
            txin.asset_issuance = Some(AssetIssuance {
                asset_blinding_nonce: [0u8; 32],
                asset_entropy: contract_hash,
                amount: explicit_or_null(asset_amount),
                inflation_keys: explicit_or_null(token_amount),
            });
            if asset_amount > 0 {
                tx.output.push(explicit_txout(asset, asset_amount, asset_script));
            }
            if token_amount > 0 {
                tx.output.push(explicit_txout(token, token_amount, token_script));
            }
            Ok(())
        })?;

        Ok(IssuanceData {
            entropy,
            asset,
            token: Some(token),
        })
    }

    /// Turns the input spending `outpoint` (a reissuance token output) into
    /// a reissuance of `amount` and appends the asset output.
    pub fn set_reissue_asset(
        &mut self,
        outpoint: &OutPoint,
        amount: u64,
        blinding_nonce: &BlindFactor,
        entropy: &AssetEntropy,
        locking_script: &Script,
    ) -> Result<AssetId> {
        if amount == 0 {
            return Err(CtError::IllegalArgument("reissuance amount must be positive".to_string()));
        }
        if blinding_nonce.is_zero() {
            return Err(CtError::IllegalArgument(
                "reissuance requires the token's asset blinding factor".to_string(),
            ));
        }
        if locking_script.is_empty() {
            return Err(CtError::IllegalArgument("reissuance destination script is empty".to_string()));
        }
        let asset = calculate_asset(entropy);

        self.update(|tx| {
            let index = input_index(tx, outpoint)?;
            let txin = &mut tx.input[index];
            if txin.asset_issuance.is_some() {
                return Err(CtError::IllegalArgument(format!("input {} already carries an issuance", outpoint)));
            }
            txin.asset_issuance = Some(AssetIssuance {
                asset_blinding_nonce: blinding_nonce.0,
                asset_entropy: entropy.0,
                amount: ConfidentialValue::Explicit(amount),
                inflation_keys: ConfidentialValue::Null,
            });
            tx.output.push(explicit_txout(asset, amount, locking_script));
            Ok(())
        })?;
        Ok(asset)
    }

    /// Blinds the transaction in one call through a short-lived
    /// [`TransactionBlinder`] with default range proof options.
    pub fn blind_transaction(
        &mut self,
        inputs: &HashMap<OutPoint, AssetValueData>,
        issuance_keys: &HashMap<OutPoint, IssuanceKeys>,
        output_keys: &BTreeMap<usize, Pubkey>,
    ) -> Result<()> {
        self.blind_transaction_with_options(inputs, issuance_keys, output_keys, &BlindOptions::default())
    }

    /// [`blind_transaction`](Self::blind_transaction) with explicit range
    /// proof options, usually [`CtConfig::blind`](crate::CtConfig).
    pub fn blind_transaction_with_options(
        &mut self,
        inputs: &HashMap<OutPoint, AssetValueData>,
        issuance_keys: &HashMap<OutPoint, IssuanceKeys>,
        output_keys: &BTreeMap<usize, Pubkey>,
        options: &BlindOptions,
    ) -> Result<()> {
        if let Some(orphan) = issuance_keys.keys().find(|o| !inputs.contains_key(o)) {
            return Err(CtError::IllegalArgument(format!("issuance keys given for unregistered input {}", orphan)));
        }
        let mut blinder = TransactionBlinder::from_options(*options);
        for (outpoint, data) in inputs {
            blinder.add_input(*outpoint, *data, issuance_keys.get(outpoint).copied())?;
        }
        for (index, key) in output_keys {
            blinder.add_output(*index, *key)?;
        }
        let blinded = blinder.finalize(self)?;
        self.hex = blinded.hex;
        Ok(())
    }

    pub fn unblind_txout(&self, index: usize, blinding_key: &Privkey) -> Result<AssetValueData> {
        unblind_output(self, index, blinding_key)
    }

    pub fn unblind_issuance(
        &self,
        index: usize,
        asset_key: Option<&Privkey>,
        token_key: Option<&Privkey>,
    ) -> Result<(AssetValueData, Option<AssetValueData>)> {
        unblind_issuance(self, index, asset_key, token_key)
    }

    /// Signature hash of the input spending `outpoint`.
    pub fn sighash(
        &self,
        outpoint: &OutPoint,
        hash_type: HashType,
        key: &SighashKey,
        value: &ConfidentialValue,
        sighash_type: SigHashType,
    ) -> Result<Hash256> {
        signature_hash(self, outpoint, hash_type, key, value, sighash_type)
    }

    /// Pushes raw `data` to the input's witness stack or script sig.
    pub fn add_sign(&mut self, outpoint: &OutPoint, data: &[u8], is_witness: bool, clear_stack: bool) -> Result<()> {
        self.update(|tx| {
            let index = input_index(tx, outpoint)?;
            let txin = &mut tx.input[index];
            if is_witness {
                if clear_stack {
                    txin.witness.script_witness.clear();
                }
                txin.witness.script_witness.push(data.to_vec());
            } else {
                let mut script = if clear_stack {
                    Vec::new()
                } else {
                    txin.script_sig.as_bytes().to_vec()
                };
                script.extend_from_slice(ScriptBuilder::new().push_slice(data).into_script().as_bytes());
                txin.script_sig = Script::from_bytes(script);
            }
            Ok(())
        })
    }

    /// Installs a single-key signature for P2PKH, P2WPKH or P2SH-P2WPKH.
    pub fn add_pubkey_hash_sign(
        &mut self,
        outpoint: &OutPoint,
        hash_type: HashType,
        pubkey: &Pubkey,
        signature: &[u8],
    ) -> Result<()> {
        self.update(|tx| {
            let index = input_index(tx, outpoint)?;
            apply_pubkey_hash_sign(&mut tx.input[index], hash_type, pubkey, signature)
        })
    }

    /// Checks an ECDSA signature (compact or DER, optionally followed by
    /// the sighash byte) against the input's signature hash.
    #[allow(clippy::too_many_arguments)]
    pub fn verify_signature(
        &self,
        outpoint: &OutPoint,
        signature: &[u8],
        pubkey: &Pubkey,
        hash_type: HashType,
        key: &SighashKey,
        value: &ConfidentialValue,
        sighash_type: SigHashType,
    ) -> Result<bool> {
        let sighash = self.sighash(outpoint, hash_type, key, value, sighash_type)?;
        verify_ecdsa_signature(&sighash, signature, pubkey)
    }
}

pub(crate) fn input_index(tx: &Transaction, outpoint: &OutPoint) -> Result<usize> {
    tx.input
        .iter()
        .position(|i| i.previous_output == *outpoint)
        .ok_or_else(|| CtError::IllegalArgument(format!("no input spends {}", outpoint)))
}

fn explicit_or_null(amount: u64) -> ConfidentialValue {
    if amount == 0 {
        ConfidentialValue::Null
    } else {
        ConfidentialValue::Explicit(amount)
    }
}

fn explicit_txout(asset: AssetId, amount: u64, script: &Script) -> TxOut {
    TxOut {
        asset: ConfidentialAsset::Explicit(asset),
        value: ConfidentialValue::Explicit(amount),
        nonce: ConfidentialNonce::Null,
        script_pubkey: script.clone(),
        witness: TxOutWitness::default(),
    }
}

impl Clone for ConfidentialTransaction {
    fn clone(&self) -> Self {
        ConfidentialTransaction {
            hex: self.hex.clone(),
            cache: Mutex::new(None),
        }
    }
}

impl PartialEq for ConfidentialTransaction {
    fn eq(&self, other: &Self) -> bool {
        self.hex == other.hex
    }
}

impl Eq for ConfidentialTransaction {}

impl fmt::Debug for ConfidentialTransaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfidentialTransaction").field("hex", &self.hex).finish()
    }
}

impl fmt::Display for ConfidentialTransaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.hex)
    }
}

impl std::str::FromStr for ConfidentialTransaction {
    type Err = CtError;

    fn from_str(s: &str) -> Result<Self> {
        ConfidentialTransaction::from_hex(s)
    }
}
