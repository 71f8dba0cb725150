//! ECDSA adaptor signatures for scriptless atomic swaps.
//!
//! An adaptor signature encrypts an ECDSA signature to an adaptor point
//! Y = y·G. Knowing y turns it into a regular signature, and seeing both
//! halves reveals y.

use crate::keys::{Privkey, Pubkey};
use crate::primitives::hash::{sha256, tagged_hash};
use crate::schnorr::{compress, field_bytes_to_array, lift_x, reduce_scalar, scalar_from_bytes, scalar_to_bytes};
use crate::{CtError, Result};
use k256::elliptic_curve::point::AffineCoordinates;
use k256::elliptic_curve::scalar::IsHigh;
use k256::{AffinePoint, ProjectivePoint, Scalar};

/// `[R parity][R.x][s']` with R = k·Y.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct AdaptorSignature(pub [u8; 65]);

impl_fixed_hex!(AdaptorSignature, 65);

/// `[R' parity][R'.x][s][e]`: DLEQ proof that R' = k·G and R = k·Y share k.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct AdaptorProof(pub [u8; 97]);

impl_fixed_hex!(AdaptorProof, 97);

const NONCE_TAG: &str = "ECDSAAdaptorNon";
const PROOF_TAG: &str = "ECDSAAdaptorSig";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdaptorPair {
    pub signature: AdaptorSignature,
    pub proof: AdaptorProof,
}

struct DecodedSignature {
    nonce: AffinePoint,
    s: Scalar,
}

impl AdaptorSignature {
    fn decode(&self) -> Option<DecodedSignature> {
        let nonce = decode_point(self.0[0], &self.0[1..33])?;
        let s = scalar_from_bytes(&array32(&self.0[33..65]))?;
        Some(DecodedSignature { nonce, s })
    }

    /// ECDSA `r` of the completed signature.
    fn r(&self) -> Scalar {
        reduce_scalar(&array32(&self.0[1..33]))
    }
}

struct DecodedProof {
    nonce: AffinePoint,
    e: Scalar,
    s: Scalar,
}

impl AdaptorProof {
    fn decode(&self) -> Option<DecodedProof> {
        let nonce = decode_point(self.0[0], &self.0[1..33])?;
        let s = scalar_from_bytes(&array32(&self.0[33..65]))?;
        let e = scalar_from_bytes(&array32(&self.0[65..97]))?;
        Some(DecodedProof { nonce, e, s })
    }
}

pub fn sign(msg: &[u8; 32], privkey: &Privkey, adaptor: &Pubkey) -> Result<AdaptorPair> {
    let x = scalar_from_bytes(privkey.as_bytes())
        .ok_or_else(|| CtError::IllegalArgument("invalid private key".to_string()))?;
    let y_point = adaptor_point(adaptor)?;

    let k = reduce_scalar(&tagged_hash(
        NONCE_TAG,
        &[
            &privkey.as_bytes()[..],
            &sha256(&[&msg[..], &encode_point(&y_point.to_affine())].concat()),
        ]
        .concat(),
    ));
    if bool::from(k.is_zero()) {
        return Err(CtError::Signature("derived nonce is zero".to_string()));
    }
    let encrypted_nonce = (y_point * k).to_affine();
    let public_nonce = (ProjectivePoint::GENERATOR * k).to_affine();

    let r = reduce_scalar(&field_bytes_to_array(&encrypted_nonce.x()));
    let m = reduce_scalar(msg);
    let k_inv: Option<Scalar> = k.invert().into();
    let k_inv = k_inv.ok_or_else(|| CtError::Signature("nonce is not invertible".to_string()))?;
    let s = k_inv * (m + r * x);

    let mut signature = [0u8; 65];
    signature[..33].copy_from_slice(&encode_point(&encrypted_nonce));
    signature[33..].copy_from_slice(&scalar_to_bytes(&s));

    let (z, e) = prove_dleq(&k, &y_point, &encrypted_nonce, &public_nonce)?;
    let mut proof = [0u8; 97];
    proof[..33].copy_from_slice(&encode_point(&public_nonce));
    proof[33..65].copy_from_slice(&scalar_to_bytes(&z));
    proof[65..].copy_from_slice(&scalar_to_bytes(&e));

    Ok(AdaptorPair {
        signature: AdaptorSignature(signature),
        proof: AdaptorProof(proof),
    })
}

pub fn verify(
    signature: &AdaptorSignature,
    proof: &AdaptorProof,
    adaptor: &Pubkey,
    msg: &[u8; 32],
    pubkey: &Pubkey,
) -> Result<bool> {
    let y_point = adaptor_point(adaptor)?;
    let p = ProjectivePoint::from(
        crate::schnorr::parse_point(pubkey.as_bytes())
            .ok_or_else(|| CtError::IllegalArgument(format!("invalid pubkey {}", pubkey)))?,
    );
    let (decoded_sig, decoded_proof) = match (signature.decode(), proof.decode()) {
        (Some(sig), Some(proof)) => (sig, proof),
        _ => return Ok(false),
    };
    Ok(verify_dleq(&y_point, &decoded_sig.nonce, &decoded_proof)
        && verify_relation(&decoded_sig, signature.r(), &decoded_proof.nonce, msg, &p))
}

/// Completes an adaptor signature with the adaptor secret. The result is a
/// compact low-s ECDSA signature.
pub fn adapt(signature: &AdaptorSignature, secret: &Privkey) -> Result<[u8; 64]> {
    let decoded = signature
        .decode()
        .ok_or_else(|| CtError::Signature("malformed adaptor signature".to_string()))?;
    let y = scalar_from_bytes(secret.as_bytes())
        .ok_or_else(|| CtError::IllegalArgument("invalid adaptor secret".to_string()))?;
    let y_inv: Option<Scalar> = y.invert().into();
    let y_inv = y_inv.ok_or_else(|| CtError::IllegalArgument("adaptor secret is not invertible".to_string()))?;
    let s = decoded.s * y_inv;
    let s = if bool::from(s.is_high()) { -s } else { s };

    let mut out = [0u8; 64];
    out[..32].copy_from_slice(&scalar_to_bytes(&signature.r()));
    out[32..].copy_from_slice(&scalar_to_bytes(&s));
    Ok(out)
}

/// Recovers the adaptor secret from an adaptor signature and its completed
/// counterpart.
pub fn extract_secret(adaptor_signature: &AdaptorSignature, signature: &[u8; 64], adaptor: &Pubkey) -> Result<Privkey> {
    let y_point = adaptor_point(adaptor)?;
    let decoded = adaptor_signature
        .decode()
        .ok_or_else(|| CtError::Signature("malformed adaptor signature".to_string()))?;
    if scalar_to_bytes(&adaptor_signature.r()) != array32(&signature[..32]) {
        return Err(CtError::Signature("signature does not complete this adaptor signature".to_string()));
    }
    let s = scalar_from_bytes(&array32(&signature[32..]))
        .ok_or_else(|| CtError::Signature("invalid signature scalar".to_string()))?;
    let s_inv: Option<Scalar> = s.invert().into();
    let s_inv = s_inv.ok_or_else(|| CtError::Signature("signature scalar is not invertible".to_string()))?;

    let y = decoded.s * s_inv;
    let y = if ProjectivePoint::GENERATOR * y == y_point {
        y
    } else if ProjectivePoint::GENERATOR * -y == y_point {
        -y
    } else {
        return Err(CtError::Signature("recovered secret does not match the adaptor".to_string()));
    };
    Privkey::from_slice(&scalar_to_bytes(&y))
}

fn adaptor_point(adaptor: &Pubkey) -> Result<ProjectivePoint> {
    crate::schnorr::parse_point(adaptor.as_bytes())
        .map(ProjectivePoint::from)
        .ok_or_else(|| CtError::IllegalArgument(format!("invalid adaptor point {}", adaptor)))
}

/// Returns `(s, e)` with s = a + e·k.
fn prove_dleq(
    k: &Scalar,
    y_point: &ProjectivePoint,
    encrypted_nonce: &AffinePoint,
    public_nonce: &AffinePoint,
) -> Result<(Scalar, Scalar)> {
    let commitment = sha256(
        &[
            encode_point(&y_point.to_affine()),
            encode_point(public_nonce),
            encode_point(encrypted_nonce),
        ]
        .concat(),
    );
    let a = reduce_scalar(&tagged_hash(PROOF_TAG, &[&scalar_to_bytes(k)[..], &commitment].concat()));
    if bool::from(a.is_zero()) {
        return Err(CtError::Signature("derived proof nonce is zero".to_string()));
    }
    let a_g = (ProjectivePoint::GENERATOR * a).to_affine();
    let a_y = (*y_point * a).to_affine();
    let e = dleq_challenge(&y_point.to_affine(), &a_g, &a_y, public_nonce, encrypted_nonce);
    Ok((a + e * k, e))
}

fn verify_dleq(y_point: &ProjectivePoint, encrypted_nonce: &AffinePoint, proof: &DecodedProof) -> bool {
    let a_g = ProjectivePoint::GENERATOR * proof.s - ProjectivePoint::from(proof.nonce) * proof.e;
    let a_y = *y_point * proof.s - ProjectivePoint::from(*encrypted_nonce) * proof.e;
    if a_g == ProjectivePoint::IDENTITY || a_y == ProjectivePoint::IDENTITY {
        return false;
    }
    let e = dleq_challenge(
        &y_point.to_affine(),
        &a_g.to_affine(),
        &a_y.to_affine(),
        &proof.nonce,
        encrypted_nonce,
    );
    e == proof.e
}

fn dleq_challenge(
    y_point: &AffinePoint,
    a_g: &AffinePoint,
    a_y: &AffinePoint,
    public_nonce: &AffinePoint,
    encrypted_nonce: &AffinePoint,
) -> Scalar {
    let data = [y_point, a_g, a_y, public_nonce, encrypted_nonce]
        .iter()
        .flat_map(|point| encode_point(point))
        .collect::<Vec<u8>>();
    reduce_scalar(&tagged_hash(PROOF_TAG, &data))
}

/// s'·R' == m·G + r·P
fn verify_relation(
    signature: &DecodedSignature,
    r: Scalar,
    public_nonce: &AffinePoint,
    msg: &[u8; 32],
    pubkey: &ProjectivePoint,
) -> bool {
    let m = reduce_scalar(msg);
    ProjectivePoint::from(*public_nonce) * signature.s == ProjectivePoint::GENERATOR * m + *pubkey * r
}

fn encode_point(point: &AffinePoint) -> [u8; 33] {
    let mut out = compress(point);
    out[0] -= 0x02;
    out
}

fn decode_point(parity: u8, x: &[u8]) -> Option<AffinePoint> {
    match parity {
        0 | 1 => lift_x(&array32(x), parity == 1),
        _ => None,
    }
}

fn array32(bytes: &[u8]) -> [u8; 32] {
    let mut out = [0u8; 32];
    out.copy_from_slice(bytes);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADAPTOR_SIG: &str = "01099c91aa1fe7f25c41085c1d3c9e73fe04a9d24dac3f9c2172d6198628e57f47\
                               bb90e2ad6630900b69f55674c8ad74a419e6ce113c10a21a79345a6e47bc74c1";
    const SECRET: &str = "475697a71a74ff3f2a8f150534e9b67d4b0b6561fab86fcaa51f8c9d6c9db8c6";
    const ADAPTED: &str = "099c91aa1fe7f25c41085c1d3c9e73fe04a9d24dac3f9c2172d6198628e57f47\
                           4d13456e98d8989043fd4674302ce90c432e2f8bb0269f02c72aafec60b72de1";
    const ADAPTOR: &str = "038d48057fc4ce150482114d43201b333bf3706f3cd527e8767ceb4b443ab5d349";

    const MSG: &str = "024bdd11f2144e825db05759bdd9041367a420fad14b665fd08af5b42056e5e2";
    const SK: &str = "90ac0d5dc0a1a9ab352afb02005a5cc6c4df0da61d8149d729ff50db9b5a5215";
    const PUBKEY: &str = "03490cec9a53cd8f2f664aea61922f26ee920c42d2489778bb7c9d9ece44d149a7";

    fn msg() -> [u8; 32] {
        array32(&hex::decode(MSG).unwrap())
    }

    #[test]
    fn test_adapt_vector() {
        let sig = AdaptorSignature::from_hex(ADAPTOR_SIG).unwrap();
        let secret = Privkey::from_hex(SECRET).unwrap();
        assert_eq!(hex::encode(adapt(&sig, &secret).unwrap()), ADAPTED);
    }

    #[test]
    fn test_extract_vector() {
        let sig = AdaptorSignature::from_hex(ADAPTOR_SIG).unwrap();
        let adapted = array64(&hex::decode(ADAPTED).unwrap());
        let secret = extract_secret(&sig, &adapted, &Pubkey::from_hex(ADAPTOR).unwrap()).unwrap();
        assert_eq!(secret.to_hex(), SECRET);
    }

    const SIGNATURE: &str = "00cbe0859638c3600ea1872ed7a55b8182a251969f59d7d2da6bd4afedf25f5021\
                             a49956234cbbbbede8ca72e0113319c84921bf1224897a6abd89dc96b9c5b208";
    const PROOF: &str = "00b02472be1ba09f5675488e841a10878b38c798ca63eff3650c8e311e3e2ebe2e\
                         3b6fee5654580a91cc5149a71bf25bcbeae63dea3ac5ad157a0ab7373c3011d0\
                         fc2592a07f719c5fc1323f935569ecd010db62f045e965cc1d564eb42cce8d6d";

    #[test]
    fn test_sign_vector() {
        let sk = Privkey::from_hex(SK).unwrap();
        let adaptor = Pubkey::from_hex(ADAPTOR).unwrap();
        let pair = sign(&msg(), &sk, &adaptor).unwrap();
        assert_eq!(pair.signature.to_hex(), SIGNATURE);
        assert_eq!(pair.proof.to_hex(), PROOF);
    }

    #[test]
    fn test_verify_vector() {
        let sig = AdaptorSignature::from_hex(SIGNATURE).unwrap();
        let proof = AdaptorProof::from_hex(PROOF).unwrap();
        let adaptor = Pubkey::from_hex(ADAPTOR).unwrap();
        let pubkey = Pubkey::from_hex(PUBKEY).unwrap();
        assert_eq!(Privkey::from_hex(SK).unwrap().pubkey().unwrap(), pubkey);
        assert!(verify(&sig, &proof, &adaptor, &msg(), &pubkey).unwrap());

        let mut tampered = proof;
        tampered.0[96] ^= 0x01;
        assert!(!verify(&sig, &tampered, &adaptor, &msg(), &pubkey).unwrap());
    }

    #[test]
    fn test_sign_verify_adapt_extract() {
        let sk = Privkey::from_hex(SK).unwrap();
        let pubkey = sk.pubkey().unwrap();
        let secret = Privkey::from_hex(SECRET).unwrap();
        let adaptor = secret.pubkey().unwrap();

        let pair = sign(&msg(), &sk, &adaptor).unwrap();
        assert_eq!(pair, sign(&msg(), &sk, &adaptor).unwrap());
        assert!(verify(&pair.signature, &pair.proof, &adaptor, &msg(), &pubkey).unwrap());

        let other = Privkey::from_hex(&"11".repeat(32)).unwrap().pubkey().unwrap();
        assert!(!verify(&pair.signature, &pair.proof, &adaptor, &msg(), &other).unwrap());
        assert!(!verify(&pair.signature, &pair.proof, &pubkey, &msg(), &pubkey).unwrap());

        let completed = adapt(&pair.signature, &secret).unwrap();
        let sighash = msg();
        assert!(crate::transaction_signer::verify_ecdsa_signature(&sighash, &completed, &pubkey).unwrap());
        assert_eq!(extract_secret(&pair.signature, &completed, &adaptor).unwrap(), secret);
    }

    #[test]
    fn test_extract_rejects_unrelated_signature() {
        let sig = AdaptorSignature::from_hex(ADAPTOR_SIG).unwrap();
        let mut adapted = array64(&hex::decode(ADAPTED).unwrap());
        adapted[0] ^= 0xff;
        assert!(matches!(
            extract_secret(&sig, &adapted, &Pubkey::from_hex(ADAPTOR).unwrap()),
            Err(CtError::Signature(_))
        ));
    }

    fn array64(bytes: &[u8]) -> [u8; 64] {
        let mut out = [0u8; 64];
        out.copy_from_slice(bytes);
        out
    }
}
