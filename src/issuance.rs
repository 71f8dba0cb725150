//! Asset issuance: entropy, asset and token derivation, plus the
//! deterministic blinding keys a wallet derives from its master blinding key.

use crate::keys::Privkey;
use crate::primitives::confidential::AssetId;
use crate::primitives::hash::{fast_merkle_root, hmac_sha256, sha256d};
use crate::primitives::script::{Opcode, Script, ScriptBuilder};
use crate::primitives::transaction::{OutPoint, TxIn, Txid};
use crate::Result;
use serde::{Deserialize, Serialize};
use serde_with::{DeserializeFromStr, SerializeDisplay};

/// Issuance entropy, displayed in reversed byte order like a txid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, SerializeDisplay, DeserializeFromStr)]
pub struct AssetEntropy(pub [u8; 32]);

impl_reversed_hex!(AssetEntropy);

/// Blinding keys for the two legs of an issuance. A missing key leaves
/// that leg explicit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IssuanceKeys {
    pub asset_key: Option<Privkey>,
    pub token_key: Option<Privkey>,
}

impl IssuanceKeys {
    pub fn new(asset_key: Option<Privkey>, token_key: Option<Privkey>) -> Self {
        IssuanceKeys { asset_key, token_key }
    }

    /// Both legs blinded with the same key, as wallets usually do.
    pub fn both(key: Privkey) -> Self {
        IssuanceKeys {
            asset_key: Some(key),
            token_key: Some(key),
        }
    }
}

/// Identifiers produced by an issuance or reissuance input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuanceData {
    pub entropy: AssetEntropy,
    pub asset: AssetId,
    /// Reissuance token; absent for reissuances.
    pub token: Option<AssetId>,
}

pub fn generate_asset_entropy(outpoint: &OutPoint, contract_hash: &[u8; 32]) -> AssetEntropy {
    let prevout = sha256d(&outpoint.to_bytes());
    AssetEntropy(fast_merkle_root(&[prevout, *contract_hash]))
}

pub fn calculate_asset(entropy: &AssetEntropy) -> AssetId {
    AssetId(fast_merkle_root(&[entropy.0, [0u8; 32]]))
}

/// The token id depends on whether the issued amount is confidential.
pub fn calculate_reissuance_token(entropy: &AssetEntropy, confidential: bool) -> AssetId {
    let mut tag = [0u8; 32];
    tag[0] = if confidential { 2 } else { 1 };
    AssetId(fast_merkle_root(&[entropy.0, tag]))
}

/// Issuance identifiers of an input, if it carries an issuance. The token
/// flag follows the amount as currently encoded.
pub fn issuance_data(txin: &TxIn) -> Option<IssuanceData> {
    let issuance = txin.asset_issuance.as_ref()?;
    if issuance.is_reissuance() {
        let entropy = AssetEntropy(issuance.asset_entropy);
        Some(IssuanceData {
            entropy,
            asset: calculate_asset(&entropy),
            token: None,
        })
    } else {
        let entropy = generate_asset_entropy(&txin.previous_output, &issuance.asset_entropy);
        Some(IssuanceData {
            entropy,
            asset: calculate_asset(&entropy),
            token: Some(calculate_reissuance_token(&entropy, issuance.amount.is_confidential())),
        })
    }
}

/// Blinding key for a locking script: HMAC-SHA256 keyed with the master
/// blinding key over the script bytes.
pub fn blinding_key_from_script(master: &Privkey, script: &Script) -> Result<Privkey> {
    let key = hmac_sha256(master.as_bytes(), script.as_bytes())?;
    Privkey::from_slice(&key)
}

/// Blinding key for the issuance spending `txid:vout`.
///
/// The key is derived for the script `OP_RETURN <txid> <vout>`, so the
/// issuer can later unblind the issued amounts from the master key alone.
pub fn issuance_blinding_key(master: &Privkey, txid: &Txid, vout: u32) -> Result<Privkey> {
    let script = ScriptBuilder::new()
        .push_opcode(Opcode::OP_RETURN)
        .push_slice(txid.as_bytes())
        .push_int(vout as i64)
        .into_script();
    blinding_key_from_script(master, &script)
}
