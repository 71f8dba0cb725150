//! ECDSA signing helpers and multisig signature aggregation.

use crate::keys::{Privkey, Pubkey};
use crate::primitives::hash::{hash160, Hash256};
use crate::primitives::script::{Script, ScriptBuilder};
use crate::primitives::transaction::{OutPoint, TxIn};
use crate::sighash::{HashType, SigHashType};
use crate::transaction::ConfidentialTransaction;
use crate::{CtError, Result};
use log::{debug, info, warn};
use secp256k1::{ecdsa::Signature, Message, SECP256K1};

/// Signs a 32-byte signature hash (RFC6979 nonce, low-s) and returns the
/// compact 64-byte signature.
pub fn sign_ecdsa(sighash: &Hash256, privkey: &Privkey) -> Result<[u8; 64]> {
    let message = Message::from_digest(*sighash);
    let signature = SECP256K1.sign_ecdsa(&message, &privkey.to_secret_key()?);
    Ok(signature.serialize_compact())
}

/// DER-encodes a compact signature, normalized to low-s, and appends the
/// sighash type byte.
pub fn encode_der_signature(signature: &[u8], sighash_type: SigHashType) -> Result<Vec<u8>> {
    let mut signature = Signature::from_compact(signature)
        .map_err(|e| CtError::Signature(format!("invalid compact signature: {}", e)))?;
    signature.normalize_s();
    let mut sig_with_hashtype = signature.serialize_der().to_vec();
    sig_with_hashtype.push(sighash_type.as_u8());
    Ok(sig_with_hashtype)
}

/// Parses a compact signature or a DER signature with or without the
/// trailing sighash byte.
pub fn parse_signature(bytes: &[u8]) -> Result<Signature> {
    if bytes.len() == 64 {
        return Signature::from_compact(bytes)
            .map_err(|e| CtError::Signature(format!("invalid compact signature: {}", e)));
    }
    Signature::from_der(bytes)
        .or_else(|_| match bytes.split_last() {
            Some((_, der)) => Signature::from_der(der),
            None => Signature::from_der(bytes),
        })
        .map_err(|e| CtError::Signature(format!("invalid DER signature: {}", e)))
}

/// Verify a signature against a signature hash. High-s signatures are
/// normalized before checking.
pub fn verify_ecdsa_signature(sighash: &Hash256, signature: &[u8], pubkey: &Pubkey) -> Result<bool> {
    let mut signature = parse_signature(signature)?;
    signature.normalize_s();
    let message = Message::from_digest(*sighash);
    Ok(SECP256K1.verify_ecdsa(&message, &signature, &pubkey.to_public_key()?).is_ok())
}

fn push_script(items: &[&[u8]]) -> Script {
    items
        .iter()
        .fold(ScriptBuilder::new(), |builder, item| builder.push_slice(item))
        .into_script()
}

/// Installs a single-key signature for a pubkey-hash input.
pub(crate) fn apply_pubkey_hash_sign(
    txin: &mut TxIn,
    hash_type: HashType,
    pubkey: &Pubkey,
    signature: &[u8],
) -> Result<()> {
    parse_signature(signature)?;
    let pubkey = pubkey.as_bytes().to_vec();
    match hash_type {
        HashType::P2pkh => {
            txin.script_sig = push_script(&[signature, &pubkey]);
        }
        HashType::P2wpkh => {
            txin.script_sig = Script::new();
            txin.witness.script_witness = vec![signature.to_vec(), pubkey];
        }
        HashType::P2shP2wpkh => {
            let redeem = Script::new_p2wpkh(&hash160(&pubkey));
            txin.script_sig = push_script(&[redeem.as_bytes()]);
            txin.witness.script_witness = vec![signature.to_vec(), pubkey];
        }
        other => {
            return Err(CtError::IllegalArgument(format!(
                "{:?} is not a pubkey-hash spend",
                other
            )))
        }
    }
    Ok(())
}

enum SignerState {
    Open(Vec<(Vec<u8>, Pubkey)>),
    Finalized,
}

/// Collects signatures for one multisig input and installs them in script
/// order.
pub struct MultisigSigner {
    state: SignerState,
}

impl MultisigSigner {
    pub fn new() -> Self {
        debug!("opening multisig signer");
        MultisigSigner {
            state: SignerState::Open(Vec::new()),
        }
    }

    fn signatures_mut(&mut self) -> Result<&mut Vec<(Vec<u8>, Pubkey)>> {
        match &mut self.state {
            SignerState::Open(signatures) => Ok(signatures),
            SignerState::Finalized => Err(CtError::ResourceState("multisig signer already finalized".to_string())),
        }
    }

    /// Adds a DER signature (with trailing sighash byte) made by `related_pubkey`.
    pub fn add_signature(&mut self, signature: &[u8], related_pubkey: Pubkey) -> Result<()> {
        let signatures = self.signatures_mut()?;
        let (hash_byte, der) = signature
            .split_last()
            .ok_or_else(|| CtError::Signature("empty signature".to_string()))?;
        SigHashType::from_u8(*hash_byte)?;
        Signature::from_der(der).map_err(|e| CtError::Signature(format!("invalid DER signature: {}", e)))?;
        if signatures.iter().any(|(_, pubkey)| *pubkey == related_pubkey) {
            return Err(CtError::IllegalArgument(format!("duplicate signature for {}", related_pubkey)));
        }
        signatures.push((signature.to_vec(), related_pubkey));
        Ok(())
    }

    /// Adds a compact 64-byte signature; it is stored DER-encoded.
    pub fn add_signature_compact(
        &mut self,
        signature: &[u8],
        related_pubkey: Pubkey,
        sighash_type: SigHashType,
    ) -> Result<()> {
        let der = encode_der_signature(signature, sighash_type)?;
        self.add_signature(&der, related_pubkey)
    }

    /// Writes the collected signatures into the input spending `outpoint`.
    pub fn finalize(
        &mut self,
        tx: &mut ConfidentialTransaction,
        outpoint: &OutPoint,
        hash_type: HashType,
        witness_script: Option<&Script>,
        redeem_script: Option<&Script>,
    ) -> Result<()> {
        let signatures = match std::mem::replace(&mut self.state, SignerState::Finalized) {
            SignerState::Open(signatures) => signatures,
            SignerState::Finalized => {
                return Err(CtError::ResourceState("multisig signer already finalized".to_string()))
            }
        };
        if signatures.is_empty() {
            return Err(CtError::IllegalArgument("no signatures to finalize".to_string()));
        }

        let multisig_script = match hash_type {
            HashType::P2sh => redeem_script,
            HashType::P2wsh | HashType::P2shP2wsh => witness_script,
            other => {
                return Err(CtError::IllegalArgument(format!("{:?} is not a multisig spend", other)));
            }
        }
        .ok_or_else(|| CtError::IllegalArgument(format!("{:?} multisig needs its script", hash_type)))?;

        if hash_type == HashType::P2shP2wsh {
            if let Some(redeem) = redeem_script {
                if *redeem != multisig_script.to_p2wsh() {
                    return Err(CtError::IllegalArgument(
                        "redeem script does not commit to the witness script".to_string(),
                    ));
                }
            }
        }

        let ordered = order_signatures(multisig_script, signatures)?;
        let multisig_script = multisig_script.clone();

        tx.update(|transaction| {
            let index = crate::transaction::input_index(transaction, outpoint)?;
            let txin = &mut transaction.input[index];
            match hash_type {
                HashType::P2sh => {
                    let mut builder = ScriptBuilder::new().push_int(0);
                    for signature in &ordered {
                        builder = builder.push_slice(signature);
                    }
                    txin.script_sig = builder.push_slice(multisig_script.as_bytes()).into_script();
                }
                _ => {
                    let mut stack = Vec::with_capacity(ordered.len() + 2);
                    stack.push(Vec::new());
                    stack.extend(ordered.iter().cloned());
                    stack.push(multisig_script.as_bytes().to_vec());
                    txin.witness.script_witness = stack;
                    txin.script_sig = if hash_type == HashType::P2shP2wsh {
                        push_script(&[multisig_script.to_p2wsh().as_bytes()])
                    } else {
                        Script::new()
                    };
                }
            }
            Ok(())
        })?;

        info!("installed {} multisig signatures for {}", ordered.len(), outpoint);
        Ok(())
    }
}

/// Sorts signatures by the position of their pubkey in the multisig script.
fn order_signatures(script: &Script, signatures: Vec<(Vec<u8>, Pubkey)>) -> Result<Vec<Vec<u8>>> {
    let (required, pubkeys) = script.multisig_pubkeys()?;
    let mut positioned = signatures
        .into_iter()
        .map(|(signature, pubkey)| {
            pubkeys
                .iter()
                .position(|candidate| candidate.as_slice() == pubkey.as_bytes())
                .map(|position| (position, signature))
                .ok_or_else(|| CtError::IllegalArgument(format!("pubkey {} is not part of the multisig script", pubkey)))
        })
        .collect::<Result<Vec<_>>>()?;
    if positioned.len() != required {
        warn!("multisig requires {} signatures, {} supplied", required, positioned.len());
    }
    positioned.sort_by_key(|(position, _)| *position);
    Ok(positioned.into_iter().map(|(_, signature)| signature).collect())
}

impl Default for MultisigSigner {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for MultisigSigner {
    fn drop(&mut self) {
        let state = match self.state {
            SignerState::Open(_) => "unused",
            SignerState::Finalized => "finalized",
        };
        debug!("releasing multisig signer ({})", state);
    }
}
