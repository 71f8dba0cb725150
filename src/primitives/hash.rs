//! Bitcoin and Elements hashing utilities.

use crate::{CtError, Result};
use hmac::{Hmac, Mac};
use ripemd::Ripemd160;
use sha2::digest::generic_array::GenericArray;
use sha2::{Digest, Sha256};

pub type Hash160 = [u8; 20];
pub type Hash256 = [u8; 32];

const SHA256_IV: [u32; 8] = [
    0x6a09e667, 0xbb67ae85, 0x3c6ef372, 0xa54ff53a, 0x510e527f, 0x9b05688c, 0x1f83d9ab, 0x5be0cd19,
];

/// A standard Hash160 is RIPEMD160(SHA256(data)).
pub fn hash160(data: &[u8]) -> Hash160 {
    let sha256_hash = Sha256::digest(data);
    let mut ripemd160 = Ripemd160::new();
    ripemd160.update(sha256_hash);
    ripemd160.finalize().into()
}

pub fn sha256(data: &[u8]) -> Hash256 {
    Sha256::digest(data).into()
}

/// A standard Double-SHA256 is SHA256(SHA256(data)).
pub fn sha256d(data: &[u8]) -> Hash256 {
    Sha256::digest(Sha256::digest(data)).into()
}

/// BIP340-style tagged hash: SHA256(SHA256(tag) || SHA256(tag) || data).
pub fn tagged_hash(tag: &str, data: &[u8]) -> Hash256 {
    let tag_hash = Sha256::digest(tag.as_bytes());
    let mut hasher = Sha256::new();
    hasher.update(tag_hash);
    hasher.update(tag_hash);
    hasher.update(data);
    hasher.finalize().into()
}

pub fn hmac_sha256(key: &[u8], data: &[u8]) -> Result<Hash256> {
    let mut mac = Hmac::<Sha256>::new_from_slice(key)
        .map_err(|e| CtError::IllegalArgument(format!("HMAC key error: {}", e)))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().into())
}

/// SHA256 compression of `left || right` without padding, the node hash of
/// the Elements fast merkle tree.
pub fn merkle_midstate(left: &Hash256, right: &Hash256) -> Hash256 {
    let mut block = [0u8; 64];
    block[..32].copy_from_slice(left);
    block[32..].copy_from_slice(right);

    let mut state = SHA256_IV;
    sha2::compress256(&mut state, &[GenericArray::clone_from_slice(&block)]);

    let mut out = [0u8; 32];
    for (chunk, word) in out.chunks_exact_mut(4).zip(state.iter()) {
        chunk.copy_from_slice(&word.to_be_bytes());
    }
    out
}

/// Elements fast merkle root. An odd node at the end of a level is carried
/// up unchanged; an empty list hashes to zero.
pub fn fast_merkle_root(leaves: &[Hash256]) -> Hash256 {
    if leaves.is_empty() {
        return [0u8; 32];
    }

    let mut level: Vec<Hash256> = leaves.to_vec();
    while level.len() > 1 {
        let mut next = Vec::with_capacity((level.len() + 1) / 2);
        for pair in level.chunks(2) {
            match pair {
                [left, right] => next.push(merkle_midstate(left, right)),
                [single] => next.push(*single),
                _ => {}
            }
        }
        level = next;
    }
    level[0]
}
