//! BIP340-draft Schnorr signatures over secp256k1.
//!
//! Public keys are x-only with an implicit even y. The nonce point of a
//! signature has a square y; nonces that land on a non-square y are negated.

use crate::keys::{Privkey, Pubkey};
use crate::primitives::hash::tagged_hash;
use crate::{CtError, Result};
use k256::elliptic_curve::ops::Reduce;
use k256::elliptic_curve::point::AffineCoordinates;
use k256::elliptic_curve::sec1::{FromEncodedPoint, ToEncodedPoint};
use k256::elliptic_curve::PrimeField;
use k256::{AffinePoint, EncodedPoint, FieldBytes, ProjectivePoint, Scalar, U256};
use num_bigint::BigUint;

const FIELD_PRIME: &str = "fffffffffffffffffffffffffffffffffffffffffffffffffffffffefffffc2f";

/// 32-byte x-only public key.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SchnorrPubkey(pub [u8; 32]);

impl_fixed_hex!(SchnorrPubkey, 32);

impl SchnorrPubkey {
    pub fn from_privkey(privkey: &Privkey) -> Result<Self> {
        let (_, pubkey) = signing_key(privkey)?;
        Ok(pubkey)
    }

    /// Drops the parity of a compressed key.
    pub fn from_pubkey(pubkey: &Pubkey) -> Self {
        let mut x = [0u8; 32];
        x.copy_from_slice(&pubkey.as_bytes()[1..]);
        SchnorrPubkey(x)
    }

    fn point(&self) -> Result<ProjectivePoint> {
        lift_x(&self.0, false)
            .map(ProjectivePoint::from)
            .ok_or_else(|| CtError::IllegalArgument(format!("{} is not a curve x coordinate", self)))
    }
}

/// 64-byte signature: nonce x coordinate followed by the scalar.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct SchnorrSignature(pub [u8; 64]);

impl_fixed_hex!(SchnorrSignature, 64);

impl SchnorrSignature {
    pub fn nonce(&self) -> [u8; 32] {
        let mut nonce = [0u8; 32];
        nonce.copy_from_slice(&self.0[..32]);
        nonce
    }

    pub fn scalar(&self) -> [u8; 32] {
        let mut scalar = [0u8; 32];
        scalar.copy_from_slice(&self.0[32..]);
        scalar
    }
}

/// Signs with a nonce derived from the key, the message and `aux_rand`.
pub fn sign(msg: &[u8; 32], privkey: &Privkey, aux_rand: &[u8; 32]) -> Result<SchnorrSignature> {
    let (d, pubkey) = signing_key(privkey)?;
    let aux = tagged_hash("BIP340/aux", aux_rand);
    let mut masked = scalar_to_bytes(&d);
    for (byte, mask) in masked.iter_mut().zip(aux.iter()) {
        *byte ^= mask;
    }
    let rand = tagged_hash("BIP340/nonce", &[&masked[..], &pubkey.0, msg].concat());
    let k = reduce_scalar(&rand);
    if bool::from(k.is_zero()) {
        return Err(CtError::Signature("derived nonce is zero".to_string()));
    }
    sign_inner(msg, &d, &pubkey, k)
}

/// Signs with a caller-chosen nonce. Reusing a nonce across messages
/// leaks the key.
pub fn sign_with_nonce(msg: &[u8; 32], privkey: &Privkey, nonce: &Privkey) -> Result<SchnorrSignature> {
    let (d, pubkey) = signing_key(privkey)?;
    let k = scalar_from_bytes(nonce.as_bytes())
        .ok_or_else(|| CtError::IllegalArgument("nonce is not a valid scalar".to_string()))?;
    sign_inner(msg, &d, &pubkey, k)
}

/// The point `s·G` a signature with public nonce `nonce` must open to:
/// R + e·P.
pub fn compute_sig_point(msg: &[u8; 32], nonce: &[u8; 32], pubkey: &SchnorrPubkey) -> Result<Pubkey> {
    let r = lift_square_x(nonce)
        .ok_or_else(|| CtError::IllegalArgument("nonce is not a curve x coordinate".to_string()))?;
    let e = challenge(nonce, pubkey, msg);
    let point = ProjectivePoint::from(r) + pubkey.point()? * e;
    if point == ProjectivePoint::IDENTITY {
        return Err(CtError::Signature("signature point is at infinity".to_string()));
    }
    Pubkey::from_slice(&compress(&point.to_affine()))
}

pub fn verify(signature: &SchnorrSignature, msg: &[u8; 32], pubkey: &SchnorrPubkey) -> Result<bool> {
    let p = pubkey.point()?;
    let nonce = signature.nonce();
    let s = match scalar_from_bytes(&signature.scalar()) {
        Some(s) => s,
        None => return Ok(false),
    };
    if lift_x(&nonce, false).is_none() {
        return Ok(false);
    }
    let e = challenge(&nonce, pubkey, msg);
    let r = ProjectivePoint::GENERATOR * s - p * e;
    if r == ProjectivePoint::IDENTITY {
        return Ok(false);
    }
    let r = r.to_affine();
    Ok(has_square_y(&r) && field_bytes_to_array(&r.x()) == nonce)
}

fn sign_inner(msg: &[u8; 32], d: &Scalar, pubkey: &SchnorrPubkey, k: Scalar) -> Result<SchnorrSignature> {
    let r = (ProjectivePoint::GENERATOR * k).to_affine();
    let k = if has_square_y(&r) { k } else { -k };
    let nonce = field_bytes_to_array(&r.x());
    let e = challenge(&nonce, pubkey, msg);
    let s = k + e * d;

    let mut signature = [0u8; 64];
    signature[..32].copy_from_slice(&nonce);
    signature[32..].copy_from_slice(&scalar_to_bytes(&s));
    Ok(SchnorrSignature(signature))
}

/// Secret scalar adjusted so its public point has an even y.
fn signing_key(privkey: &Privkey) -> Result<(Scalar, SchnorrPubkey)> {
    let d = scalar_from_bytes(privkey.as_bytes())
        .ok_or_else(|| CtError::IllegalArgument("invalid private key".to_string()))?;
    let p = (ProjectivePoint::GENERATOR * d).to_affine();
    let d = if bool::from(p.y_is_odd()) { -d } else { d };
    Ok((d, SchnorrPubkey(field_bytes_to_array(&p.x()))))
}

fn challenge(nonce: &[u8; 32], pubkey: &SchnorrPubkey, msg: &[u8; 32]) -> Scalar {
    reduce_scalar(&tagged_hash("BIP340/challenge", &[&nonce[..], &pubkey.0, msg].concat()))
}

/// Parses a canonical non-zero scalar.
pub(crate) fn scalar_from_bytes(bytes: &[u8; 32]) -> Option<Scalar> {
    let scalar: Option<Scalar> = Scalar::from_repr(FieldBytes::clone_from_slice(bytes)).into();
    scalar.filter(|s| !bool::from(s.is_zero()))
}

pub(crate) fn reduce_scalar(bytes: &[u8; 32]) -> Scalar {
    <Scalar as Reduce<U256>>::reduce_bytes(&FieldBytes::clone_from_slice(bytes))
}

pub(crate) fn scalar_to_bytes(scalar: &Scalar) -> [u8; 32] {
    field_bytes_to_array(&scalar.to_bytes())
}

pub(crate) fn field_bytes_to_array(bytes: &FieldBytes) -> [u8; 32] {
    let mut out = [0u8; 32];
    out.copy_from_slice(bytes);
    out
}

/// Decodes an SEC1 point (compressed or not).
pub(crate) fn parse_point(bytes: &[u8]) -> Option<AffinePoint> {
    let encoded = EncodedPoint::from_bytes(bytes).ok()?;
    AffinePoint::from_encoded_point(&encoded).into()
}

pub(crate) fn lift_x(x: &[u8; 32], odd: bool) -> Option<AffinePoint> {
    let mut encoded = [0u8; 33];
    encoded[0] = if odd { 0x03 } else { 0x02 };
    encoded[1..].copy_from_slice(x);
    parse_point(&encoded)
}

pub(crate) fn compress(point: &AffinePoint) -> [u8; 33] {
    let mut out = [0u8; 33];
    out.copy_from_slice(point.to_encoded_point(true).as_bytes());
    out
}

fn lift_square_x(x: &[u8; 32]) -> Option<AffinePoint> {
    let point = lift_x(x, false)?;
    if has_square_y(&point) {
        Some(point)
    } else {
        Some(-point)
    }
}

/// Euler's criterion on the y coordinate.
fn has_square_y(point: &AffinePoint) -> bool {
    let encoded = point.to_encoded_point(false);
    let y = match encoded.y() {
        Some(y) => BigUint::from_bytes_be(y),
        None => return false,
    };
    let prime = BigUint::parse_bytes(FIELD_PRIME.as_bytes(), 16).unwrap_or_default();
    let exponent = (&prime - 1u32) >> 1;
    y.modpow(&exponent, &prime) == BigUint::from(1u32)
}
