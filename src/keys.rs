//! Raw key types exchanged as hex strings.

use crate::{CtError, Result};
use rand::{CryptoRng, RngCore};
use secp256k1::{PublicKey, SecretKey, SECP256K1};
use serde_with::{DeserializeFromStr, SerializeDisplay};
use std::fmt;
use std::str::FromStr;

/// 32-byte secp256k1 secret scalar (signing key or blinding key).
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Privkey([u8; 32]);

impl Privkey {
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != 32 {
            return Err(CtError::IllegalArgument(format!(
                "private key must be 32 bytes, got {}",
                bytes.len()
            )));
        }
        SecretKey::from_slice(bytes)
            .map_err(|e| CtError::IllegalArgument(format!("invalid private key: {}", e)))?;
        let mut key = [0u8; 32];
        key.copy_from_slice(bytes);
        Ok(Privkey(key))
    }

    pub fn from_hex(s: &str) -> Result<Self> {
        Privkey::from_slice(&hex::decode(s)?)
    }

    pub fn generate<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        loop {
            let mut key = [0u8; 32];
            rng.fill_bytes(&mut key);
            if SecretKey::from_slice(&key).is_ok() {
                return Privkey(key);
            }
        }
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn pubkey(&self) -> Result<Pubkey> {
        let sk = self.to_secret_key()?;
        Ok(Pubkey(PublicKey::from_secret_key(SECP256K1, &sk).serialize()))
    }

    pub(crate) fn to_secret_key(&self) -> Result<SecretKey> {
        SecretKey::from_slice(&self.0).map_err(|e| CtError::IllegalArgument(format!("invalid private key: {}", e)))
    }
}

impl fmt::Debug for Privkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Privkey(..)")
    }
}

impl FromStr for Privkey {
    type Err = CtError;

    fn from_str(s: &str) -> Result<Self> {
        Privkey::from_hex(s)
    }
}

/// Compressed 33-byte secp256k1 public key.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, SerializeDisplay, DeserializeFromStr)]
pub struct Pubkey([u8; 33]);

impl Pubkey {
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != 33 {
            return Err(CtError::IllegalArgument(format!(
                "public key must be 33 bytes, got {}",
                bytes.len()
            )));
        }
        PublicKey::from_slice(bytes)
            .map_err(|e| CtError::IllegalArgument(format!("invalid public key: {}", e)))?;
        let mut key = [0u8; 33];
        key.copy_from_slice(bytes);
        Ok(Pubkey(key))
    }

    pub fn from_hex(s: &str) -> Result<Self> {
        Pubkey::from_slice(&hex::decode(s)?)
    }

    pub fn as_bytes(&self) -> &[u8; 33] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub(crate) fn to_public_key(&self) -> Result<PublicKey> {
        PublicKey::from_slice(&self.0).map_err(|e| CtError::IllegalArgument(format!("invalid public key: {}", e)))
    }
}

impl fmt::Debug for Pubkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pubkey({})", self.to_hex())
    }
}

impl fmt::Display for Pubkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Pubkey {
    type Err = CtError;

    fn from_str(s: &str) -> Result<Self> {
        Pubkey::from_hex(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_privkey_lengths() {
        assert!(Privkey::from_hex(&"11".repeat(32)).is_ok());
        assert!(matches!(Privkey::from_hex(&"11".repeat(31)), Err(CtError::IllegalArgument(_))));
        assert!(matches!(Privkey::from_hex(&"11".repeat(33)), Err(CtError::IllegalArgument(_))));
        assert!(matches!(Privkey::from_hex("xyz"), Err(CtError::Format(_))));
        // zero is outside the scalar range
        assert!(matches!(Privkey::from_hex(&"00".repeat(32)), Err(CtError::IllegalArgument(_))));
    }

    #[test]
    fn test_pubkey_from_privkey() {
        let one = Privkey::from_hex(&format!("{}01", "00".repeat(31))).unwrap();
        assert_eq!(
            one.pubkey().unwrap().to_hex(),
            "0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798"
        );
    }

    #[test]
    fn test_pubkey_validation() {
        assert!(matches!(Pubkey::from_hex(&"02".repeat(32)), Err(CtError::IllegalArgument(_))));
        // x = 0 is not on the curve
        assert!(Pubkey::from_hex(&format!("02{}", "00".repeat(32))).is_err());
    }

    #[test]
    fn test_privkey_debug_hides_secret() {
        let key = Privkey::from_hex(&"22".repeat(32)).unwrap();
        assert_eq!(format!("{:?}", key), "Privkey(..)");
    }
}
