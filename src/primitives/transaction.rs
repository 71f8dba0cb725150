//! Elements transaction data structures.
//!
//! The layout follows Elements consensus encoding: a one-byte witness flag
//! instead of the segwit marker, issuance data carried inline by inputs
//! (flagged in the outpoint index), confidential asset/value/nonce fields in
//! outputs, and a witness section holding issuance rangeproofs, script and
//! pegin witnesses and per-output surjection and range proofs.

use super::confidential::{ConfidentialAsset, ConfidentialNonce, ConfidentialValue};
use super::encode::{read_stack, read_varbytes, write_stack, write_varbytes, Decodable, Encodable};
use super::hash::{fast_merkle_root, sha256d, Hash256};
use super::script::Script;
use crate::{CtError, Result};
use serde_with::{DeserializeFromStr, SerializeDisplay};
use std::io::{Read, Write};

const OUTPOINT_ISSUANCE_FLAG: u32 = 1 << 31;
const OUTPOINT_PEGIN_FLAG: u32 = 1 << 30;
/// Bits of the serialized outpoint index left for the output index.
pub const OUTPOINT_INDEX_MASK: u32 = 0x3fff_ffff;

/// Weight multiplier for non-witness bytes.
pub const WITNESS_SCALE_FACTOR: usize = 4;

/// Transaction id, displayed in reversed byte order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, SerializeDisplay, DeserializeFromStr)]
pub struct Txid(pub [u8; 32]);

impl_reversed_hex!(Txid);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct OutPoint {
    pub txid: Txid,
    pub vout: u32,
}

impl OutPoint {
    pub fn new(txid: Txid, vout: u32) -> Self {
        OutPoint { txid, vout }
    }

    /// Consensus serialization without issuance/pegin flags.
    pub fn to_bytes(&self) -> [u8; 36] {
        let mut out = [0u8; 36];
        out[..32].copy_from_slice(&self.txid.0);
        out[32..].copy_from_slice(&self.vout.to_le_bytes());
        out
    }
}

impl std::fmt::Display for OutPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.txid, self.vout)
    }
}

/// Issuance or reissuance data attached to an input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssetIssuance {
    /// Zero for a new issuance; the token's asset blinding factor for a reissuance.
    pub asset_blinding_nonce: [u8; 32],
    /// Contract hash for a new issuance; the asset entropy for a reissuance.
    pub asset_entropy: [u8; 32],
    pub amount: ConfidentialValue,
    pub inflation_keys: ConfidentialValue,
}

impl AssetIssuance {
    pub fn is_reissuance(&self) -> bool {
        self.asset_blinding_nonce != [0u8; 32]
    }
}

impl Encodable for AssetIssuance {
    fn consensus_encode<W: Write>(&self, writer: &mut W) -> Result<usize> {
        let mut written = self.asset_blinding_nonce.consensus_encode(writer)?;
        written += self.asset_entropy.consensus_encode(writer)?;
        written += self.amount.consensus_encode(writer)?;
        written += self.inflation_keys.consensus_encode(writer)?;
        Ok(written)
    }
}

impl Decodable for AssetIssuance {
    fn consensus_decode<R: Read>(reader: &mut R) -> Result<Self> {
        Ok(AssetIssuance {
            asset_blinding_nonce: Decodable::consensus_decode(reader)?,
            asset_entropy: Decodable::consensus_decode(reader)?,
            amount: Decodable::consensus_decode(reader)?,
            inflation_keys: Decodable::consensus_decode(reader)?,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TxInWitness {
    pub amount_rangeproof: Vec<u8>,
    pub inflation_keys_rangeproof: Vec<u8>,
    pub script_witness: Vec<Vec<u8>>,
    pub pegin_witness: Vec<Vec<u8>>,
}

impl TxInWitness {
    pub fn is_empty(&self) -> bool {
        self.amount_rangeproof.is_empty()
            && self.inflation_keys_rangeproof.is_empty()
            && self.script_witness.is_empty()
            && self.pegin_witness.is_empty()
    }

    /// Leaf of the witness merkle tree for this input.
    pub fn leaf_hash(&self) -> Result<Hash256> {
        let mut buf = Vec::new();
        let mut leaves = Vec::with_capacity(4);

        write_varbytes(&mut buf, &self.amount_rangeproof)?;
        leaves.push(sha256d(&buf));
        buf.clear();
        write_varbytes(&mut buf, &self.inflation_keys_rangeproof)?;
        leaves.push(sha256d(&buf));
        buf.clear();
        write_stack(&mut buf, &self.script_witness)?;
        leaves.push(sha256d(&buf));
        buf.clear();
        write_stack(&mut buf, &self.pegin_witness)?;
        leaves.push(sha256d(&buf));

        Ok(fast_merkle_root(&leaves))
    }
}

impl Encodable for TxInWitness {
    fn consensus_encode<W: Write>(&self, writer: &mut W) -> Result<usize> {
        let mut written = write_varbytes(writer, &self.amount_rangeproof)?;
        written += write_varbytes(writer, &self.inflation_keys_rangeproof)?;
        written += write_stack(writer, &self.script_witness)?;
        written += write_stack(writer, &self.pegin_witness)?;
        Ok(written)
    }
}

impl Decodable for TxInWitness {
    fn consensus_decode<R: Read>(reader: &mut R) -> Result<Self> {
        Ok(TxInWitness {
            amount_rangeproof: read_varbytes(reader)?,
            inflation_keys_rangeproof: read_varbytes(reader)?,
            script_witness: read_stack(reader)?,
            pegin_witness: read_stack(reader)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxIn {
    pub previous_output: OutPoint,
    pub is_pegin: bool,
    pub script_sig: Script,
    pub sequence: u32,
    pub asset_issuance: Option<AssetIssuance>,
    pub witness: TxInWitness,
}

impl TxIn {
    pub fn new(previous_output: OutPoint, sequence: u32) -> Self {
        TxIn {
            previous_output,
            is_pegin: false,
            script_sig: Script::new(),
            sequence,
            asset_issuance: None,
            witness: TxInWitness::default(),
        }
    }

    fn is_coinbase_index(&self) -> bool {
        self.previous_output.vout == u32::MAX
    }
}

impl Encodable for TxIn {
    fn consensus_encode<W: Write>(&self, writer: &mut W) -> Result<usize> {
        let mut vout = self.previous_output.vout;
        if !self.is_coinbase_index() {
            if self.asset_issuance.is_some() {
                vout |= OUTPOINT_ISSUANCE_FLAG;
            }
            if self.is_pegin {
                vout |= OUTPOINT_PEGIN_FLAG;
            }
        }
        let mut written = self.previous_output.txid.0.consensus_encode(writer)?;
        written += vout.consensus_encode(writer)?;
        written += self.script_sig.consensus_encode(writer)?;
        written += self.sequence.consensus_encode(writer)?;
        if let Some(issuance) = &self.asset_issuance {
            written += issuance.consensus_encode(writer)?;
        }
        Ok(written)
    }
}

impl Decodable for TxIn {
    fn consensus_decode<R: Read>(reader: &mut R) -> Result<Self> {
        let txid = Txid(Decodable::consensus_decode(reader)?);
        let raw_vout = u32::consensus_decode(reader)?;
        let (vout, has_issuance, is_pegin) = if raw_vout == u32::MAX {
            (raw_vout, false, false)
        } else {
            (
                raw_vout & OUTPOINT_INDEX_MASK,
                raw_vout & OUTPOINT_ISSUANCE_FLAG != 0,
                raw_vout & OUTPOINT_PEGIN_FLAG != 0,
            )
        };
        let script_sig = Script::consensus_decode(reader)?;
        let sequence = u32::consensus_decode(reader)?;
        let asset_issuance = if has_issuance {
            Some(AssetIssuance::consensus_decode(reader)?)
        } else {
            None
        };

        Ok(TxIn {
            previous_output: OutPoint::new(txid, vout),
            is_pegin,
            script_sig,
            sequence,
            asset_issuance,
            witness: TxInWitness::default(),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TxOutWitness {
    pub surjection_proof: Vec<u8>,
    pub rangeproof: Vec<u8>,
}

impl TxOutWitness {
    pub fn is_empty(&self) -> bool {
        self.surjection_proof.is_empty() && self.rangeproof.is_empty()
    }

    /// Leaf of the witness merkle tree for this output.
    pub fn leaf_hash(&self) -> Result<Hash256> {
        let mut surjection = Vec::new();
        write_varbytes(&mut surjection, &self.surjection_proof)?;
        let mut range = Vec::new();
        write_varbytes(&mut range, &self.rangeproof)?;
        Ok(fast_merkle_root(&[sha256d(&surjection), sha256d(&range)]))
    }
}

impl Encodable for TxOutWitness {
    fn consensus_encode<W: Write>(&self, writer: &mut W) -> Result<usize> {
        let mut written = write_varbytes(writer, &self.surjection_proof)?;
        written += write_varbytes(writer, &self.rangeproof)?;
        Ok(written)
    }
}

impl Decodable for TxOutWitness {
    fn consensus_decode<R: Read>(reader: &mut R) -> Result<Self> {
        Ok(TxOutWitness {
            surjection_proof: read_varbytes(reader)?,
            rangeproof: read_varbytes(reader)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxOut {
    pub asset: ConfidentialAsset,
    pub value: ConfidentialValue,
    pub nonce: ConfidentialNonce,
    pub script_pubkey: Script,
    pub witness: TxOutWitness,
}

impl TxOut {
    /// Fee outputs carry no script.
    pub fn is_fee(&self) -> bool {
        self.script_pubkey.is_empty()
    }
}

impl Encodable for TxOut {
    fn consensus_encode<W: Write>(&self, writer: &mut W) -> Result<usize> {
        let mut written = self.asset.consensus_encode(writer)?;
        written += self.value.consensus_encode(writer)?;
        written += self.nonce.consensus_encode(writer)?;
        written += self.script_pubkey.consensus_encode(writer)?;
        Ok(written)
    }
}

impl Decodable for TxOut {
    fn consensus_decode<R: Read>(reader: &mut R) -> Result<Self> {
        Ok(TxOut {
            asset: Decodable::consensus_decode(reader)?,
            value: Decodable::consensus_decode(reader)?,
            nonce: Decodable::consensus_decode(reader)?,
            script_pubkey: Decodable::consensus_decode(reader)?,
            witness: TxOutWitness::default(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub version: i32,
    pub lock_time: u32,
    pub input: Vec<TxIn>,
    pub output: Vec<TxOut>,
}

impl Transaction {
    pub fn new(version: i32, lock_time: u32) -> Self {
        Transaction {
            version,
            lock_time,
            input: Vec::new(),
            output: Vec::new(),
        }
    }

    pub fn has_witness(&self) -> bool {
        self.input.iter().any(|i| !i.witness.is_empty()) || self.output.iter().any(|o| !o.witness.is_empty())
    }

    /// Serializes the transaction, optionally dropping the witness section.
    pub fn encode_with<W: Write>(&self, writer: &mut W, include_witness: bool) -> Result<usize> {
        let witness = include_witness && self.has_witness();
        let mut written = self.version.consensus_encode(writer)?;
        written += (witness as u8).consensus_encode(writer)?;
        written += self.input.consensus_encode(writer)?;
        written += self.output.consensus_encode(writer)?;
        written += self.lock_time.consensus_encode(writer)?;
        if witness {
            for input in &self.input {
                written += input.witness.consensus_encode(writer)?;
            }
            for output in &self.output {
                written += output.witness.consensus_encode(writer)?;
            }
        }
        Ok(written)
    }

    pub fn serialize_no_witness(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.encode_with(&mut buf, false)?;
        Ok(buf)
    }

    pub fn txid(&self) -> Result<Txid> {
        Ok(Txid(sha256d(&self.serialize_no_witness()?)))
    }

    pub fn wtxid(&self) -> Result<Txid> {
        Ok(Txid(sha256d(&self.consensus_encode_to_vec()?)))
    }

    /// Fast merkle root over per-input and per-output witness leaves.
    pub fn witness_hash(&self) -> Result<Hash256> {
        let inputs = self
            .input
            .iter()
            .map(|i| i.witness.leaf_hash())
            .collect::<Result<Vec<_>>>()?;
        let outputs = self
            .output
            .iter()
            .map(|o| o.witness.leaf_hash())
            .collect::<Result<Vec<_>>>()?;
        Ok(fast_merkle_root(&[fast_merkle_root(&inputs), fast_merkle_root(&outputs)]))
    }

    pub fn base_size(&self) -> Result<usize> {
        self.encode_with(&mut std::io::sink(), false)
    }

    pub fn total_size(&self) -> Result<usize> {
        self.encode_with(&mut std::io::sink(), true)
    }

    pub fn weight(&self) -> Result<usize> {
        Ok(self.base_size()? * (WITNESS_SCALE_FACTOR - 1) + self.total_size()?)
    }

    pub fn vsize(&self) -> Result<usize> {
        Ok((self.weight()? + WITNESS_SCALE_FACTOR - 1) / WITNESS_SCALE_FACTOR)
    }
}

impl Encodable for Transaction {
    fn consensus_encode<W: Write>(&self, writer: &mut W) -> Result<usize> {
        self.encode_with(writer, true)
    }
}

impl Decodable for Transaction {
    fn consensus_decode<R: Read>(reader: &mut R) -> Result<Self> {
        let version = i32::consensus_decode(reader)?;
        let flag = u8::consensus_decode(reader)?;
        if flag > 1 {
            return Err(CtError::Format(format!("unknown transaction flag 0x{:02x}", flag)));
        }

        let mut input: Vec<TxIn> = Decodable::consensus_decode(reader)?;
        let mut output: Vec<TxOut> = Decodable::consensus_decode(reader)?;
        let lock_time = u32::consensus_decode(reader)?;

        if flag == 1 {
            for txin in input.iter_mut() {
                txin.witness = TxInWitness::consensus_decode(reader)?;
            }
            for txout in output.iter_mut() {
                txout.witness = TxOutWitness::consensus_decode(reader)?;
            }
        }

        let tx = Transaction { version, lock_time, input, output };
        if flag == 1 && !tx.has_witness() {
            return Err(CtError::Format("superfluous witness record".to_string()));
        }
        Ok(tx)
    }
}
