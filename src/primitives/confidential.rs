//! Liquid Network confidential value model.
//!
//! Assets, values and nonces of an Elements output are either explicit or
//! replaced by a 33-byte commitment. The enums below keep the exact wire
//! prefix of each commitment so that parsing and serializing is lossless.

use super::encode::{Decodable, Encodable};
use crate::{CtError, Result};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes, DeserializeFromStr, SerializeDisplay};
use std::io::{Read, Write};

/// Liquid asset identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, SerializeDisplay, DeserializeFromStr)]
pub struct AssetId(pub [u8; 32]);

impl_reversed_hex!(AssetId);

impl AssetId {
    /// Liquid Bitcoin (L-BTC), the native asset of the Liquid network.
    pub const LIQUID_BTC: AssetId = AssetId([
        0x6d, 0x52, 0x1c, 0x38, 0xec, 0x1e, 0xa1, 0x57, 0x34, 0xae, 0x22, 0xb7, 0xc4, 0x60, 0x64, 0x41,
        0x28, 0x29, 0xc0, 0xd0, 0x57, 0x9f, 0x0a, 0x71, 0x3d, 0x1c, 0x04, 0xed, 0xe9, 0x79, 0x02, 0x6f,
    ]);
}

/// 32-byte scalar blinding either an asset tag or an amount. All zeros
/// means "unblinded".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, SerializeDisplay, DeserializeFromStr)]
pub struct BlindFactor(pub [u8; 32]);

impl_reversed_hex!(BlindFactor);

impl BlindFactor {
    pub fn zero() -> Self {
        BlindFactor([0u8; 32])
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }
}

/// The plaintext view of an asset/amount commitment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetValueData {
    pub asset: AssetId,
    pub satoshi_value: i64,
    #[serde(default)]
    pub asset_blind_factor: BlindFactor,
    #[serde(default)]
    pub amount_blind_factor: BlindFactor,
}

impl AssetValueData {
    /// An unblinded amount of `asset`.
    pub fn explicit(asset: AssetId, satoshi_value: i64) -> Self {
        AssetValueData {
            asset,
            satoshi_value,
            asset_blind_factor: BlindFactor::zero(),
            amount_blind_factor: BlindFactor::zero(),
        }
    }
}

/// Confidential asset: explicit asset id or a blinded generator.
#[serde_as]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConfidentialAsset {
    Null,
    Explicit(AssetId),
    Confidential(#[serde_as(as = "Bytes")] [u8; 33]),
}

impl ConfidentialAsset {
    pub fn is_null(&self) -> bool {
        matches!(self, ConfidentialAsset::Null)
    }

    pub fn is_confidential(&self) -> bool {
        matches!(self, ConfidentialAsset::Confidential(_))
    }

    pub fn explicit(&self) -> Option<AssetId> {
        match self {
            ConfidentialAsset::Explicit(asset) => Some(*asset),
            _ => None,
        }
    }

    pub fn commitment(&self) -> Option<[u8; 33]> {
        match self {
            ConfidentialAsset::Confidential(c) => Some(*c),
            _ => None,
        }
    }
}

/// Confidential value: explicit amount or a Pedersen commitment.
#[serde_as]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConfidentialValue {
    Null,
    Explicit(u64),
    Confidential(#[serde_as(as = "Bytes")] [u8; 33]),
}

impl ConfidentialValue {
    /// Parses a value commitment, rejecting anything but a 0x08/0x09 point.
    pub fn from_commitment(bytes: &[u8]) -> Result<Self> {
        let commitment: [u8; 33] = bytes
            .try_into()
            .map_err(|_| CtError::IllegalArgument("value commitment must be 33 bytes".to_string()))?;
        if commitment[0] != 0x08 && commitment[0] != 0x09 {
            return Err(CtError::IllegalArgument("invalid value commitment prefix".to_string()));
        }
        Ok(ConfidentialValue::Confidential(commitment))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, ConfidentialValue::Null)
    }

    pub fn is_confidential(&self) -> bool {
        matches!(self, ConfidentialValue::Confidential(_))
    }

    pub fn explicit(&self) -> Option<u64> {
        match self {
            ConfidentialValue::Explicit(value) => Some(*value),
            _ => None,
        }
    }

    pub fn commitment(&self) -> Option<[u8; 33]> {
        match self {
            ConfidentialValue::Confidential(c) => Some(*c),
            _ => None,
        }
    }
}

/// Output nonce: the sender's ephemeral ECDH public key once blinded.
#[serde_as]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConfidentialNonce {
    Null,
    Explicit(#[serde_as(as = "Bytes")] [u8; 32]),
    Confidential(#[serde_as(as = "Bytes")] [u8; 33]),
}

impl ConfidentialNonce {
    pub fn is_null(&self) -> bool {
        matches!(self, ConfidentialNonce::Null)
    }

    pub fn commitment(&self) -> Option<[u8; 33]> {
        match self {
            ConfidentialNonce::Confidential(c) => Some(*c),
            _ => None,
        }
    }
}

fn read_commitment<R: Read>(prefix: u8, reader: &mut R) -> Result<[u8; 33]> {
    let mut buf = [0u8; 33];
    buf[0] = prefix;
    reader.read_exact(&mut buf[1..])?;
    Ok(buf)
}

impl Encodable for ConfidentialAsset {
    fn consensus_encode<W: Write>(&self, writer: &mut W) -> Result<usize> {
        match self {
            ConfidentialAsset::Null => {
                writer.write_all(&[0x00])?;
                Ok(1)
            }
            ConfidentialAsset::Explicit(asset) => {
                writer.write_all(&[0x01])?;
                writer.write_all(&asset.0)?;
                Ok(33)
            }
            ConfidentialAsset::Confidential(c) => {
                writer.write_all(c)?;
                Ok(33)
            }
        }
    }
}

impl Decodable for ConfidentialAsset {
    fn consensus_decode<R: Read>(reader: &mut R) -> Result<Self> {
        match u8::consensus_decode(reader)? {
            0x00 => Ok(ConfidentialAsset::Null),
            0x01 => Ok(ConfidentialAsset::Explicit(AssetId(<[u8; 32]>::consensus_decode(reader)?))),
            p @ (0x0a | 0x0b) => Ok(ConfidentialAsset::Confidential(read_commitment(p, reader)?)),
            p => Err(CtError::Format(format!("invalid confidential asset prefix 0x{:02x}", p))),
        }
    }
}

impl Encodable for ConfidentialValue {
    fn consensus_encode<W: Write>(&self, writer: &mut W) -> Result<usize> {
        match self {
            ConfidentialValue::Null => {
                writer.write_all(&[0x00])?;
                Ok(1)
            }
            ConfidentialValue::Explicit(value) => {
                writer.write_all(&[0x01])?;
                // explicit values are big-endian on the wire
                writer.write_all(&value.to_be_bytes())?;
                Ok(9)
            }
            ConfidentialValue::Confidential(c) => {
                writer.write_all(c)?;
                Ok(33)
            }
        }
    }
}

impl Decodable for ConfidentialValue {
    fn consensus_decode<R: Read>(reader: &mut R) -> Result<Self> {
        match u8::consensus_decode(reader)? {
            0x00 => Ok(ConfidentialValue::Null),
            0x01 => {
                let mut buf = [0u8; 8];
                reader.read_exact(&mut buf)?;
                Ok(ConfidentialValue::Explicit(u64::from_be_bytes(buf)))
            }
            p @ (0x08 | 0x09) => Ok(ConfidentialValue::Confidential(read_commitment(p, reader)?)),
            p => Err(CtError::Format(format!("invalid confidential value prefix 0x{:02x}", p))),
        }
    }
}

impl Encodable for ConfidentialNonce {
    fn consensus_encode<W: Write>(&self, writer: &mut W) -> Result<usize> {
        match self {
            ConfidentialNonce::Null => {
                writer.write_all(&[0x00])?;
                Ok(1)
            }
            ConfidentialNonce::Explicit(nonce) => {
                writer.write_all(&[0x01])?;
                writer.write_all(nonce)?;
                Ok(33)
            }
            ConfidentialNonce::Confidential(c) => {
                writer.write_all(c)?;
                Ok(33)
            }
        }
    }
}

impl Decodable for ConfidentialNonce {
    fn consensus_decode<R: Read>(reader: &mut R) -> Result<Self> {
        match u8::consensus_decode(reader)? {
            0x00 => Ok(ConfidentialNonce::Null),
            0x01 => Ok(ConfidentialNonce::Explicit(<[u8; 32]>::consensus_decode(reader)?)),
            p @ (0x02 | 0x03) => Ok(ConfidentialNonce::Confidential(read_commitment(p, reader)?)),
            p => Err(CtError::Format(format!("invalid confidential nonce prefix 0x{:02x}", p))),
        }
    }
}
