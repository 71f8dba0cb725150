//! Recovering the plaintext behind blinded outputs and issuances.

use crate::blind::{asset_tag, ecdh_shared_secret, to_tweak, tweak_bytes};
use crate::issuance::issuance_data;
use crate::keys::Privkey;
use crate::primitives::confidential::{AssetId, AssetValueData, BlindFactor, ConfidentialValue};
use crate::transaction::ConfidentialTransaction;
use crate::{CtError, Result};
use secp256k1_zkp::{Generator, PedersenCommitment, PublicKey, RangeProof, SECP256K1};

/// Rewinds the range proof of output `index` with the recipient's blinding
/// key and returns the asset, amount and both blinding factors.
pub fn unblind_output(tx: &ConfidentialTransaction, index: usize, blinding_key: &Privkey) -> Result<AssetValueData> {
    let txout = tx.txout(index)?;
    let (generator_bytes, commitment_bytes) = match (txout.asset.commitment(), txout.value.commitment()) {
        (Some(generator), Some(commitment)) => (generator, commitment),
        _ => return Err(CtError::Unblind(format!("output {} is not confidential", index))),
    };
    let nonce = txout
        .nonce
        .commitment()
        .ok_or_else(|| CtError::Unblind(format!("output {} has no nonce", index)))?;

    let nonce = PublicKey::from_slice(&nonce).map_err(|e| CtError::Unblind(format!("invalid nonce: {}", e)))?;
    let generator = Generator::from_slice(&generator_bytes)
        .map_err(|e| CtError::Unblind(format!("invalid asset commitment: {}", e)))?;
    let commitment = PedersenCommitment::from_slice(&commitment_bytes)
        .map_err(|e| CtError::Unblind(format!("invalid value commitment: {}", e)))?;
    let rangeproof = RangeProof::from_slice(&txout.witness.rangeproof)
        .map_err(|e| CtError::Unblind(format!("invalid range proof: {}", e)))?;

    let shared_secret = ecdh_shared_secret(&nonce, &blinding_key.to_secret_key()?)
        .map_err(|e| CtError::Unblind(e.to_string()))?;
    let (opening, _) = rangeproof
        .rewind(
            SECP256K1,
            commitment,
            shared_secret,
            txout.script_pubkey.as_bytes(),
            generator,
        )
        .map_err(|e| CtError::Unblind(format!("range proof rewind failed for output {}: {}", index, e)))?;

    let message = opening.message.as_ref();
    if message.len() < 64 {
        return Err(CtError::Unblind("range proof message too short".to_string()));
    }
    let asset = AssetId::from_slice(&message[..32])?;
    let asset_blind_factor = BlindFactor::from_slice(&message[32..64])?;

    // The rewound asset must open the output's generator.
    let abf = to_tweak(&asset_blind_factor).map_err(|e| CtError::Unblind(e.to_string()))?;
    if Generator::new_blinded(SECP256K1, asset_tag(&asset), abf).serialize() != generator_bytes {
        return Err(CtError::Unblind(format!("asset commitment of output {} does not match", index)));
    }

    Ok(AssetValueData {
        asset,
        satoshi_value: to_satoshi(opening.value)?,
        asset_blind_factor,
        amount_blind_factor: BlindFactor(tweak_bytes(&opening.blinding_factor)),
    })
}

/// Recovers the issued asset and token amounts of input `index`. Explicit
/// legs come back with zero blinding factors. Reissuances carry no token
/// leg and return `None` for it.
pub fn unblind_issuance(
    tx: &ConfidentialTransaction,
    index: usize,
    asset_key: Option<&Privkey>,
    token_key: Option<&Privkey>,
) -> Result<(AssetValueData, Option<AssetValueData>)> {
    let txin = tx.txin(index)?;
    let (issuance, data) = match (txin.asset_issuance.as_ref(), issuance_data(&txin)) {
        (Some(issuance), Some(data)) => (issuance, data),
        _ => return Err(CtError::IllegalArgument(format!("input {} has no issuance", index))),
    };

    let asset = unblind_issuance_leg(
        data.asset,
        &issuance.amount,
        &txin.witness.amount_rangeproof,
        asset_key,
    )?;
    let token = data
        .token
        .map(|token| {
            unblind_issuance_leg(
                token,
                &issuance.inflation_keys,
                &txin.witness.inflation_keys_rangeproof,
                token_key,
            )
        })
        .transpose()?;
    Ok((asset, token))
}

fn unblind_issuance_leg(
    asset: AssetId,
    value: &ConfidentialValue,
    rangeproof: &[u8],
    key: Option<&Privkey>,
) -> Result<AssetValueData> {
    let commitment_bytes = match value {
        ConfidentialValue::Null => return Ok(AssetValueData::explicit(asset, 0)),
        ConfidentialValue::Explicit(amount) => return Ok(AssetValueData::explicit(asset, to_satoshi(*amount)?)),
        ConfidentialValue::Confidential(bytes) => bytes,
    };
    let key = key.ok_or_else(|| {
        CtError::IllegalArgument(format!("blinding key required to unblind issuance of {}", asset))
    })?;

    let commitment = PedersenCommitment::from_slice(commitment_bytes)
        .map_err(|e| CtError::Unblind(format!("invalid issuance commitment: {}", e)))?;
    let rangeproof =
        RangeProof::from_slice(rangeproof).map_err(|e| CtError::Unblind(format!("invalid range proof: {}", e)))?;
    let generator = Generator::new_unblinded(SECP256K1, asset_tag(&asset));
    let (opening, _) = rangeproof
        .rewind(SECP256K1, commitment, key.to_secret_key()?, &[], generator)
        .map_err(|e| CtError::Unblind(format!("issuance range proof rewind failed: {}", e)))?;

    Ok(AssetValueData {
        asset,
        satoshi_value: to_satoshi(opening.value)?,
        asset_blind_factor: BlindFactor::zero(),
        amount_blind_factor: BlindFactor(tweak_bytes(&opening.blinding_factor)),
    })
}

fn to_satoshi(value: u64) -> Result<i64> {
    i64::try_from(value).map_err(|_| CtError::Unblind(format!("amount {} out of range", value)))
}
