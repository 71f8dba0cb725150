//! Blinding engine.
//!
//! A [`TransactionBlinder`] is opened, fed the plaintext data of every
//! input and the blinding pubkey of every output to hide, and finalized
//! once against a transaction. Finalizing produces a new transaction with
//! asset generators, value commitments, ECDH nonces, range proofs and
//! surjection proofs whose commitments balance.

use crate::issuance::{
    calculate_asset, calculate_reissuance_token, generate_asset_entropy, AssetEntropy, IssuanceKeys,
};
use crate::keys::{Privkey, Pubkey};
use crate::primitives::confidential::{
    AssetId, AssetValueData, BlindFactor, ConfidentialAsset, ConfidentialNonce, ConfidentialValue,
};
use crate::primitives::encode::Encodable;
use crate::primitives::hash::{sha256, sha256d};
use crate::primitives::transaction::{OutPoint, Transaction};
use crate::transaction::ConfidentialTransaction;
use crate::types::BlindOptions;
use crate::{CtError, Result};
use log::{debug, info};
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use secp256k1_zkp::{
    compute_adaptive_blinding_factor, verify_commitments_sum_to_equal, All, CommitmentSecrets, Generator,
    PedersenCommitment, PublicKey, RangeProof, Scalar, Secp256k1, SecretKey, SurjectionProof, Tag, Tweak,
    ZERO_TWEAK,
};
use std::collections::{BTreeMap, HashMap};

/// Plaintext secrets of one side of a commitment.
#[derive(Debug, Clone, Copy)]
struct Secrets {
    asset: AssetId,
    value: u64,
    abf: Tweak,
    vbf: Tweak,
}

impl Secrets {
    fn generator(&self, secp: &Secp256k1<All>) -> Generator {
        Generator::new_blinded(secp, asset_tag(&self.asset), self.abf)
    }

    fn commitment(&self, secp: &Secp256k1<All>) -> PedersenCommitment {
        PedersenCommitment::new(secp, self.value, self.vbf, self.generator(secp))
    }

    fn commitment_secrets(&self) -> CommitmentSecrets {
        CommitmentSecrets {
            value: self.value,
            value_blinding_factor: self.vbf,
            generator_blinding_factor: self.abf,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct InputEntry {
    data: AssetValueData,
    issuance_keys: Option<IssuanceKeys>,
}

enum BlinderState {
    Open {
        inputs: BTreeMap<OutPoint, InputEntry>,
        outputs: BTreeMap<usize, Pubkey>,
    },
    Finalized,
}

/// Single-use blinding context.
pub struct TransactionBlinder {
    secp: Secp256k1<All>,
    seed: [u8; 32],
    options: BlindOptions,
    state: BlinderState,
}

impl TransactionBlinder {
    /// Opens a context seeded from the operating system RNG.
    pub fn new() -> Self {
        Self::from_options(BlindOptions::default())
    }

    /// Like [`new`](Self::new), with the given range proof options.
    pub fn from_options(options: BlindOptions) -> Self {
        let mut seed = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut seed);
        Self::with_options(seed, options)
    }

    /// Opens a context whose random choices are fully determined by `seed`
    /// and the data it finalizes.
    pub fn with_seed(seed: [u8; 32]) -> Self {
        Self::with_options(seed, BlindOptions::default())
    }

    pub fn with_options(seed: [u8; 32], options: BlindOptions) -> Self {
        debug!("opening blinding context");
        TransactionBlinder {
            secp: Secp256k1::new(),
            seed,
            options,
            state: BlinderState::Open {
                inputs: BTreeMap::new(),
                outputs: BTreeMap::new(),
            },
        }
    }

    pub fn is_finalized(&self) -> bool {
        matches!(self.state, BlinderState::Finalized)
    }

    /// Registers the plaintext data of the input spending `outpoint`.
    pub fn add_input(
        &mut self,
        outpoint: OutPoint,
        data: AssetValueData,
        issuance_keys: Option<IssuanceKeys>,
    ) -> Result<()> {
        let inputs = match &mut self.state {
            BlinderState::Open { inputs, .. } => inputs,
            BlinderState::Finalized => return Err(finalized_error()),
        };
        if data.satoshi_value < 0 {
            return Err(CtError::IllegalArgument(format!(
                "input {} has negative amount {}",
                outpoint, data.satoshi_value
            )));
        }
        if inputs.contains_key(&outpoint) {
            return Err(CtError::IllegalArgument(format!("input {} registered twice", outpoint)));
        }
        debug!("registered input {} for blinding", outpoint);
        inputs.insert(outpoint, InputEntry { data, issuance_keys });
        Ok(())
    }

    /// Registers the recipient blinding pubkey of output `index`.
    pub fn add_output(&mut self, index: usize, blinding_pubkey: Pubkey) -> Result<()> {
        let outputs = match &mut self.state {
            BlinderState::Open { outputs, .. } => outputs,
            BlinderState::Finalized => return Err(finalized_error()),
        };
        if outputs.contains_key(&index) {
            return Err(CtError::IllegalArgument(format!("output {} registered twice", index)));
        }
        debug!("registered output {} for blinding", index);
        outputs.insert(index, blinding_pubkey);
        Ok(())
    }

    /// Blinds `ctx` and returns the blinded transaction. The context is
    /// spent by this call whether or not it succeeds.
    pub fn finalize(&mut self, ctx: &ConfidentialTransaction) -> Result<ConfidentialTransaction> {
        let (inputs, outputs) = match std::mem::replace(&mut self.state, BlinderState::Finalized) {
            BlinderState::Open { inputs, outputs } => (inputs, outputs),
            BlinderState::Finalized => return Err(finalized_error()),
        };
        let mut tx = ctx.transaction()?;
        let blinded = self.blind(&mut tx, &inputs, &outputs)?;
        info!(
            "blinded {} of {} outputs over {} inputs",
            blinded,
            tx.output.len(),
            tx.input.len()
        );
        ConfidentialTransaction::from_transaction(&tx)
    }

    fn blind(
        &self,
        tx: &mut Transaction,
        inputs: &BTreeMap<OutPoint, InputEntry>,
        outputs: &BTreeMap<usize, Pubkey>,
    ) -> Result<usize> {
        let secp = &self.secp;
        if outputs.is_empty() {
            return Err(CtError::Blinding("no outputs registered for blinding".to_string()));
        }
        self.check_registrations(tx, inputs, outputs)?;

        let mut rng = ChaCha20Rng::from_seed(self.rng_seed(tx, inputs, outputs)?);

        // Inputs in transaction order, followed by their issuance legs.
        let mut input_secrets = Vec::with_capacity(tx.input.len());
        let mut issuance_secrets = Vec::new();
        let mut surjection_domain = Vec::new();
        for txin in tx.input.iter_mut() {
            let entry = inputs
                .get(&txin.previous_output)
                .ok_or_else(|| CtError::Blinding(format!("input {} has no blinding data", txin.previous_output)))?;
            let secrets = input_secrets_of(&entry.data)?;
            surjection_domain.push((secrets.generator(secp), asset_tag(&secrets.asset), secrets.abf));
            input_secrets.push(secrets);

            let issuance = match txin.asset_issuance.as_mut() {
                Some(issuance) => issuance,
                None => continue,
            };
            let keys = entry.issuance_keys.unwrap_or_default();
            let (asset, token) = if issuance.is_reissuance() {
                let entropy = AssetEntropy(issuance.asset_entropy);
                (calculate_asset(&entropy), None)
            } else {
                let entropy = generate_asset_entropy(&txin.previous_output, &issuance.asset_entropy);
                let amount_blinded = issuance.amount.is_confidential()
                    || (issuance.amount.explicit().is_some() && keys.asset_key.is_some());
                (
                    calculate_asset(&entropy),
                    Some(calculate_reissuance_token(&entropy, amount_blinded)),
                )
            };

            let legs = [
                (asset, &mut issuance.amount, &mut txin.witness.amount_rangeproof, keys.asset_key),
            ];
            let token_leg = token.map(|token| {
                (
                    token,
                    &mut issuance.inflation_keys,
                    &mut txin.witness.inflation_keys_rangeproof,
                    keys.token_key,
                )
            });
            for (asset, value, rangeproof, key) in legs.into_iter().chain(token_leg) {
                let amount = match *value {
                    ConfidentialValue::Null => continue,
                    ConfidentialValue::Explicit(amount) => amount,
                    ConfidentialValue::Confidential(_) => {
                        return Err(CtError::Blinding("issuance amount is already blinded".to_string()))
                    }
                };
                let vbf = match key {
                    Some(key) => {
                        let vbf = Tweak::new(&mut rng);
                        let (commitment, proof) = self.blind_issuance_leg(asset, amount, vbf, &key)?;
                        *value = ConfidentialValue::Confidential(commitment.serialize());
                        *rangeproof = proof.serialize();
                        vbf
                    }
                    None => ZERO_TWEAK,
                };
                let secrets = Secrets {
                    asset,
                    value: amount,
                    abf: ZERO_TWEAK,
                    vbf,
                };
                surjection_domain.push((secrets.generator(secp), asset_tag(&asset), ZERO_TWEAK));
                issuance_secrets.push(secrets);
            }
        }
        let all_inputs: Vec<Secrets> = input_secrets.iter().chain(issuance_secrets.iter()).copied().collect();

        check_balance(tx, &all_inputs)?;

        // Draw factors for every blinded output; the last one closes the sum.
        let last_index = outputs.keys().next_back().copied();
        let mut output_secrets: BTreeMap<usize, Secrets> = BTreeMap::new();
        for index in outputs.keys() {
            let txout = &tx.output[*index];
            let asset = explicit_asset(&txout.asset, *index)?;
            let value = explicit_value(&txout.value, *index)?;
            let abf = Tweak::new(&mut rng);
            let vbf = if Some(*index) == last_index {
                let set_a: Vec<CommitmentSecrets> = all_inputs.iter().map(Secrets::commitment_secrets).collect();
                let set_b: Vec<CommitmentSecrets> =
                    output_secrets.values().map(Secrets::commitment_secrets).collect();
                compute_adaptive_blinding_factor(secp, value, abf, &set_a, &set_b)
            } else {
                Tweak::new(&mut rng)
            };
            output_secrets.insert(*index, Secrets { asset, value, abf, vbf });
        }

        for (index, secrets) in &output_secrets {
            let blinding_pubkey = outputs
                .get(index)
                .ok_or_else(|| CtError::Blinding(format!("output {} lost its blinding key", index)))?
                .to_public_key()?;
            let ephemeral_sk = SecretKey::new(&mut rng);
            let shared_secret = ecdh_shared_secret(&blinding_pubkey, &ephemeral_sk)?;

            let txout = &mut tx.output[*index];
            let generator = secrets.generator(secp);
            let commitment = secrets.commitment(secp);

            let mut message = [0u8; 64];
            message[..32].copy_from_slice(secrets.asset.as_bytes());
            message[32..].copy_from_slice(secrets.abf.as_ref());
            let rangeproof = RangeProof::new(
                secp,
                self.options.minimum_range_value,
                commitment,
                secrets.value,
                secrets.vbf,
                &message,
                txout.script_pubkey.as_bytes(),
                shared_secret,
                self.options.exponent,
                self.options.minimum_bits,
                generator,
            )
            .map_err(|e| CtError::Blinding(format!("range proof for output {}: {}", index, e)))?;

            let surjection_proof = SurjectionProof::new(
                secp,
                &mut rng,
                asset_tag(&secrets.asset),
                secrets.abf,
                &surjection_domain,
            )
            .map_err(|e| CtError::Blinding(format!("surjection proof for output {}: {}", index, e)))?;

            txout.asset = ConfidentialAsset::Confidential(generator.serialize());
            txout.value = ConfidentialValue::Confidential(commitment.serialize());
            txout.nonce = ConfidentialNonce::Confidential(PublicKey::from_secret_key(secp, &ephemeral_sk).serialize());
            txout.witness.rangeproof = rangeproof.serialize();
            txout.witness.surjection_proof = surjection_proof.serialize();
        }

        self.verify_balance(tx, &all_inputs, &output_secrets)?;
        Ok(output_secrets.len())
    }

    fn check_registrations(
        &self,
        tx: &Transaction,
        inputs: &BTreeMap<OutPoint, InputEntry>,
        outputs: &BTreeMap<usize, Pubkey>,
    ) -> Result<()> {
        for outpoint in inputs.keys() {
            if !tx.input.iter().any(|i| i.previous_output == *outpoint) {
                return Err(CtError::IllegalArgument(format!("registered input {} is not spent", outpoint)));
            }
        }
        if let Some(missing) = tx.input.iter().find(|i| !inputs.contains_key(&i.previous_output)) {
            return Err(CtError::Blinding(format!(
                "input {} has no blinding data",
                missing.previous_output
            )));
        }
        for index in outputs.keys() {
            let txout = tx
                .output
                .get(*index)
                .ok_or_else(|| CtError::IllegalArgument(format!("output index {} out of range", index)))?;
            if txout.is_fee() {
                return Err(CtError::IllegalArgument(format!("output {} is a fee output", index)));
            }
            if txout.asset.explicit().is_none() || txout.value.explicit().is_none() {
                return Err(CtError::IllegalArgument(format!("output {} is not explicit", index)));
            }
            if txout.value.explicit() == Some(0) {
                return Err(CtError::Blinding(format!("output {} has a zero amount", index)));
            }
        }
        Ok(())
    }

    /// Seed for the blinding RNG, bound to the context seed, the unblinded
    /// transaction and every registration.
    fn rng_seed(
        &self,
        tx: &Transaction,
        inputs: &BTreeMap<OutPoint, InputEntry>,
        outputs: &BTreeMap<usize, Pubkey>,
    ) -> Result<[u8; 32]> {
        let mut data = self.seed.to_vec();
        data.extend(tx.consensus_encode_to_vec()?);
        for (outpoint, entry) in inputs {
            data.extend_from_slice(&outpoint.to_bytes());
            data.extend_from_slice(entry.data.asset.as_bytes());
            data.extend_from_slice(&entry.data.satoshi_value.to_le_bytes());
            data.extend_from_slice(entry.data.asset_blind_factor.as_bytes());
            data.extend_from_slice(entry.data.amount_blind_factor.as_bytes());
            let keys = entry.issuance_keys.unwrap_or_default();
            for key in [keys.asset_key, keys.token_key] {
                match key {
                    Some(key) => {
                        data.push(1);
                        data.extend_from_slice(key.as_bytes());
                    }
                    None => data.push(0),
                }
            }
        }
        for (index, pubkey) in outputs {
            data.extend_from_slice(&(*index as u64).to_le_bytes());
            data.extend_from_slice(pubkey.as_bytes());
        }
        Ok(sha256(&data))
    }

    /// Commits an issuance leg. The issuance key doubles as the range proof
    /// nonce so its holder can rewind the amount.
    fn blind_issuance_leg(
        &self,
        asset: AssetId,
        amount: u64,
        vbf: Tweak,
        key: &Privkey,
    ) -> Result<(PedersenCommitment, RangeProof)> {
        let secp = &self.secp;
        let generator = Generator::new_unblinded(secp, asset_tag(&asset));
        let commitment = PedersenCommitment::new(secp, amount, vbf, generator);
        let mut message = [0u8; 64];
        message[..32].copy_from_slice(asset.as_bytes());
        let proof = RangeProof::new(
            secp,
            self.options.minimum_range_value,
            commitment,
            amount,
            vbf,
            &message,
            &[],
            key.to_secret_key()?,
            self.options.exponent,
            self.options.minimum_bits,
            generator,
        )
        .map_err(|e| CtError::Blinding(format!("issuance range proof: {}", e)))?;
        Ok((commitment, proof))
    }

    fn verify_balance(
        &self,
        tx: &Transaction,
        inputs: &[Secrets],
        blinded: &BTreeMap<usize, Secrets>,
    ) -> Result<()> {
        let secp = &self.secp;
        let input_commitments: Vec<PedersenCommitment> = inputs.iter().map(|s| s.commitment(secp)).collect();
        let mut output_commitments = Vec::with_capacity(tx.output.len());
        for (index, txout) in tx.output.iter().enumerate() {
            let commitment = match blinded.get(&index) {
                Some(secrets) => secrets.commitment(secp),
                None => {
                    let secrets = Secrets {
                        asset: explicit_asset(&txout.asset, index)?,
                        value: explicit_value(&txout.value, index)?,
                        abf: ZERO_TWEAK,
                        vbf: ZERO_TWEAK,
                    };
                    secrets.commitment(secp)
                }
            };
            output_commitments.push(commitment);
        }
        if !verify_commitments_sum_to_equal(secp, &input_commitments, &output_commitments) {
            return Err(CtError::Blinding("input and output commitments do not balance".to_string()));
        }
        Ok(())
    }
}

impl Default for TransactionBlinder {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TransactionBlinder {
    fn drop(&mut self) {
        debug!(
            "releasing blinding context ({})",
            if self.is_finalized() { "finalized" } else { "unused" }
        );
    }
}

fn finalized_error() -> CtError {
    CtError::ResourceState("blinding context already finalized".to_string())
}

pub(crate) fn asset_tag(asset: &AssetId) -> Tag {
    Tag::from(asset.to_bytes())
}

pub(crate) fn to_tweak(factor: &BlindFactor) -> Result<Tweak> {
    Tweak::from_slice(factor.as_bytes())
        .map_err(|e| CtError::IllegalArgument(format!("blinding factor out of range: {}", e)))
}

pub(crate) fn tweak_bytes(tweak: &Tweak) -> [u8; 32] {
    let mut out = [0u8; 32];
    out.copy_from_slice(tweak.as_ref());
    out
}

/// ECDH secret shared between an output's nonce and its blinding key:
/// sha256d of the compressed product point.
pub(crate) fn ecdh_shared_secret(pubkey: &PublicKey, secret: &SecretKey) -> Result<SecretKey> {
    let point = pubkey
        .mul_tweak(secp256k1_zkp::SECP256K1, &Scalar::from(*secret))
        .map_err(|e| CtError::Blinding(format!("ECDH failed: {}", e)))?;
    SecretKey::from_slice(&sha256d(&point.serialize()))
        .map_err(|e| CtError::Blinding(format!("ECDH secret out of range: {}", e)))
}

fn input_secrets_of(data: &AssetValueData) -> Result<Secrets> {
    Ok(Secrets {
        asset: data.asset,
        value: u64::try_from(data.satoshi_value)
            .map_err(|_| CtError::IllegalArgument(format!("negative amount {}", data.satoshi_value)))?,
        abf: to_tweak(&data.asset_blind_factor)?,
        vbf: to_tweak(&data.amount_blind_factor)?,
    })
}

fn explicit_asset(asset: &ConfidentialAsset, index: usize) -> Result<AssetId> {
    asset
        .explicit()
        .ok_or_else(|| CtError::Blinding(format!("output {} is already confidential", index)))
}

fn explicit_value(value: &ConfidentialValue, index: usize) -> Result<u64> {
    value
        .explicit()
        .ok_or_else(|| CtError::Blinding(format!("output {} is already confidential", index)))
}

/// Plaintext per-asset balance: inputs and issuances against outputs.
fn check_balance(tx: &Transaction, inputs: &[Secrets]) -> Result<()> {
    let mut balance: HashMap<AssetId, i128> = HashMap::new();
    for secrets in inputs {
        *balance.entry(secrets.asset).or_default() += secrets.value as i128;
    }
    for (index, txout) in tx.output.iter().enumerate() {
        let asset = explicit_asset(&txout.asset, index)?;
        let value = explicit_value(&txout.value, index)?;
        *balance.entry(asset).or_default() -= value as i128;
    }
    if let Some((asset, diff)) = balance.iter().find(|(_, diff)| **diff != 0) {
        return Err(CtError::Blinding(format!(
            "amounts of asset {} do not balance (inputs exceed outputs by {})",
            asset, diff
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::script::Script;
    use crate::primitives::transaction::Txid;
    use crate::transaction::SEQUENCE_FINAL;

    fn funded_transaction() -> (ConfidentialTransaction, OutPoint) {
        let mut tx = ConfidentialTransaction::new(2, 0).unwrap();
        let outpoint = OutPoint::new(Txid([4u8; 32]), 0);
        tx.add_txin(outpoint.txid, outpoint.vout, SEQUENCE_FINAL).unwrap();
        tx.add_txout(AssetId::LIQUID_BTC, 9_000, &Script::new_p2wpkh(&[0x22; 20])).unwrap();
        tx.add_fee_txout(AssetId::LIQUID_BTC, 1_000).unwrap();
        (tx, outpoint)
    }

    fn blinding_pubkey() -> Pubkey {
        Privkey::from_hex(&"33".repeat(32)).unwrap().pubkey().unwrap()
    }

    #[test]
    fn test_finalize_twice() {
        let (tx, outpoint) = funded_transaction();
        let mut blinder = TransactionBlinder::with_seed([1u8; 32]);
        blinder
            .add_input(outpoint, AssetValueData::explicit(AssetId::LIQUID_BTC, 10_000), None)
            .unwrap();
        blinder.add_output(0, blinding_pubkey()).unwrap();
        assert!(blinder.finalize(&tx).is_ok());
        assert!(blinder.is_finalized());
        assert!(matches!(blinder.finalize(&tx), Err(CtError::ResourceState(_))));
        assert!(matches!(blinder.add_output(0, blinding_pubkey()), Err(CtError::ResourceState(_))));
    }

    #[test]
    fn test_failed_finalize_consumes_context() {
        let (tx, _) = funded_transaction();
        let mut blinder = TransactionBlinder::with_seed([1u8; 32]);
        assert!(matches!(blinder.finalize(&tx), Err(CtError::Blinding(_))));
        assert!(matches!(blinder.finalize(&tx), Err(CtError::ResourceState(_))));
    }

    #[test]
    fn test_duplicate_registration() {
        let mut blinder = TransactionBlinder::with_seed([1u8; 32]);
        let outpoint = OutPoint::new(Txid([4u8; 32]), 0);
        let data = AssetValueData::explicit(AssetId::LIQUID_BTC, 1);
        blinder.add_input(outpoint, data, None).unwrap();
        assert!(matches!(blinder.add_input(outpoint, data, None), Err(CtError::IllegalArgument(_))));
        blinder.add_output(0, blinding_pubkey()).unwrap();
        assert!(matches!(blinder.add_output(0, blinding_pubkey()), Err(CtError::IllegalArgument(_))));
    }

    #[test]
    fn test_negative_amount_rejected() {
        let mut blinder = TransactionBlinder::with_seed([1u8; 32]);
        let data = AssetValueData::explicit(AssetId::LIQUID_BTC, -5);
        assert!(matches!(
            blinder.add_input(OutPoint::new(Txid([4u8; 32]), 0), data, None),
            Err(CtError::IllegalArgument(_))
        ));
    }

    #[test]
    fn test_fee_output_cannot_be_blinded() {
        let (tx, outpoint) = funded_transaction();
        let mut blinder = TransactionBlinder::with_seed([1u8; 32]);
        blinder
            .add_input(outpoint, AssetValueData::explicit(AssetId::LIQUID_BTC, 10_000), None)
            .unwrap();
        blinder.add_output(1, blinding_pubkey()).unwrap();
        assert!(matches!(blinder.finalize(&tx), Err(CtError::IllegalArgument(_))));
    }

    #[test]
    fn test_unbalanced_amounts() {
        let (tx, outpoint) = funded_transaction();
        let mut blinder = TransactionBlinder::with_seed([1u8; 32]);
        blinder
            .add_input(outpoint, AssetValueData::explicit(AssetId::LIQUID_BTC, 10_001), None)
            .unwrap();
        blinder.add_output(0, blinding_pubkey()).unwrap();
        assert!(matches!(blinder.finalize(&tx), Err(CtError::Blinding(_))));
    }

    #[test]
    fn test_partial_input_coverage() {
        let (mut tx, outpoint) = funded_transaction();
        tx.add_txin(Txid([5u8; 32]), 1, SEQUENCE_FINAL).unwrap();
        let mut blinder = TransactionBlinder::with_seed([1u8; 32]);
        blinder
            .add_input(outpoint, AssetValueData::explicit(AssetId::LIQUID_BTC, 10_000), None)
            .unwrap();
        blinder.add_output(0, blinding_pubkey()).unwrap();
        assert!(matches!(blinder.finalize(&tx), Err(CtError::Blinding(_))));
    }

    #[test]
    fn test_seeded_blinding_is_reproducible() {
        let (tx, outpoint) = funded_transaction();
        let run = |seed: [u8; 32]| {
            let mut blinder = TransactionBlinder::with_seed(seed);
            blinder
                .add_input(outpoint, AssetValueData::explicit(AssetId::LIQUID_BTC, 10_000), None)
                .unwrap();
            blinder.add_output(0, blinding_pubkey()).unwrap();
            blinder.finalize(&tx).unwrap()
        };
        assert_eq!(run([7u8; 32]), run([7u8; 32]));
        assert_ne!(run([7u8; 32]), run([8u8; 32]));
    }
}
