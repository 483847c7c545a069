use std::fmt;
use std::sync::OnceLock;

use num_bigint::BigUint;
use num_traits::{Num, Zero};
use poseidon_bn254::{poseidon, Fr, PoseidonError, PoseidonParams};
use rand::{CryptoRng, RngCore};
use sha2::{Digest, Sha512};

use crate::curve::{curve_order, subgroup_order, Point};
use crate::{CurveError, Result};

/// Challenge schedule: `t = 6` over `(R.x, R.y, A.x, A.y, M)`, 6 full and 52 partial rounds.
pub const CHALLENGE_T: usize = 6;
pub const CHALLENGE_FULL_ROUNDS: usize = 6;
pub const CHALLENGE_PARTIAL_ROUNDS: usize = 52;

fn challenge_params() -> Result<&'static PoseidonParams> {
    static PARAMS: OnceLock<std::result::Result<PoseidonParams, PoseidonError>> = OnceLock::new();
    PARAMS
        .get_or_init(|| {
            PoseidonParams::new(
                CHALLENGE_T,
                CHALLENGE_FULL_ROUNDS,
                CHALLENGE_PARTIAL_ROUNDS,
                b"poseidon",
                5,
                Some(128),
            )
        })
        .as_ref()
        .map_err(|e| CurveError::Poseidon(e.clone()))
}

/// `t = Poseidon(R.x, R.y, A.x, A.y, M)`.
pub fn challenge(r: &Point, a: &Point, message: &Fr) -> Result<Fr> {
    let inputs = [
        r.x().clone(),
        r.y().clone(),
        a.x().clone(),
        a.y().clone(),
        message.clone(),
    ];
    Ok(poseidon(&inputs, challenge_params()?)?)
}

/// Baby-Jubjub signing scalar, `0 < k < L`.
#[derive(Clone, PartialEq, Eq)]
pub struct PrivateKey(BigUint);

impl PrivateKey {
    pub fn new(scalar: BigUint) -> Result<Self> {
        if scalar.is_zero() {
            return Err(CurveError::ZeroKey);
        }
        if &scalar >= subgroup_order() {
            return Err(CurveError::KeyOutOfRange);
        }
        Ok(Self(scalar))
    }

    /// Parses a hex scalar, `0x` optional. Short forms (`0x5`) are accepted.
    pub fn from_hex(hex_str: &str) -> Result<Self> {
        let digits = hex_str.strip_prefix("0x").unwrap_or(hex_str);
        let scalar = BigUint::from_str_radix(digits, 16)
            .map_err(|e| CurveError::InvalidKey(format!("{}", e)))?;
        Self::new(scalar)
    }

    pub fn from_dec_str(s: &str) -> Result<Self> {
        let scalar = BigUint::from_str_radix(s, 10)
            .map_err(|e| CurveError::InvalidKey(format!("{}", e)))?;
        Self::new(scalar)
    }

    /// Uniform key below `L` from a cryptographic RNG.
    pub fn random<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        loop {
            let mut bytes = [0u8; 32];
            rng.fill_bytes(&mut bytes);
            let scalar = BigUint::from_bytes_le(&bytes) % subgroup_order();
            if !scalar.is_zero() {
                return Self(scalar);
            }
        }
    }

    pub fn generate() -> Self {
        Self::random(&mut rand::thread_rng())
    }

    pub fn scalar(&self) -> &BigUint {
        &self.0
    }

    pub fn to_bytes_le(&self) -> [u8; 32] {
        let raw = self.0.to_bytes_le();
        let mut out = [0u8; 32];
        out[..raw.len()].copy_from_slice(&raw);
        out
    }

    pub fn public_key(&self) -> PublicKey {
        PublicKey(Point::generator().mul(&self.0))
    }

    /// Deterministic nonce `r = SHA-512(k_le32 || M_le32) mod L`.
    fn nonce(&self, message: &Fr) -> BigUint {
        let mut hasher = Sha512::new();
        hasher.update(self.to_bytes_le());
        hasher.update(message.to_bytes_le());
        BigUint::from_bytes_le(&hasher.finalize()) % subgroup_order()
    }

    /// Signs a field element. Same key and message always give the same signature.
    pub fn sign(&self, message: &Fr) -> Result<Signature> {
        let a = Point::generator().mul(&self.0);
        let r = self.nonce(message);
        let r_point = Point::generator().mul(&r);
        let t = challenge(&r_point, &a, message)?;
        let s = (r + &self.0 * t.as_biguint()) % curve_order();
        Ok(Signature { r: r_point, s })
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateKey(<redacted>)")
    }
}

/// `A = k * B`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublicKey(Point);

impl PublicKey {
    pub fn from_point(point: Point) -> Self {
        Self(point)
    }

    /// Builds a key from affine coordinates, checking curve membership.
    pub fn from_xy(x: Fr, y: Fr) -> Result<Self> {
        Ok(Self(Point::new(x, y)?))
    }

    pub fn point(&self) -> &Point {
        &self.0
    }

    pub fn x(&self) -> &Fr {
        self.0.x()
    }

    pub fn y(&self) -> &Fr {
        self.0.y()
    }

    pub fn compress(&self) -> [u8; 32] {
        self.0.compress()
    }

    pub fn compress_be(&self) -> [u8; 32] {
        self.0.compress_be()
    }

    /// Checks `s * B == R + t * A`.
    pub fn verify(&self, message: &Fr, signature: &Signature) -> Result<bool> {
        if &signature.s >= curve_order() {
            return Ok(false);
        }
        let t = challenge(&signature.r, &self.0, message)?;
        let lhs = Point::generator().mul(&signature.s);
        let rhs = signature.r.add(&self.0.mul(t.as_biguint()));
        Ok(lhs == rhs)
    }
}

/// EdDSA signature `(R, s)`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Signature {
    pub r: Point,
    pub s: BigUint,
}

impl Signature {
    pub fn new(r: Point, s: BigUint) -> Self {
        Self { r, s }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_bounds() {
        assert_eq!(PrivateKey::new(BigUint::zero()), Err(CurveError::ZeroKey));
        assert_eq!(
            PrivateKey::new(subgroup_order().clone()),
            Err(CurveError::KeyOutOfRange)
        );
        let max = subgroup_order() - BigUint::from(1u8);
        assert!(PrivateKey::new(max).is_ok());
        assert!(matches!(PrivateKey::from_hex("0xnothex"), Err(CurveError::InvalidKey(_))));
    }

    #[test]
    fn test_debug_redacts_scalar() {
        let key = PrivateKey::from_hex("0x1234").unwrap();
        assert_eq!(format!("{:?}", key), "PrivateKey(<redacted>)");
    }

    #[test]
    fn test_random_key_in_range() {
        let key = PrivateKey::generate();
        assert!(!key.scalar().is_zero());
        assert!(key.scalar() < subgroup_order());
    }

    #[test]
    fn test_challenge_params_cached() {
        let a = challenge_params().unwrap() as *const PoseidonParams;
        let b = challenge_params().unwrap() as *const PoseidonParams;
        assert_eq!(a, b);
    }

    #[test]
    fn test_sign_verify_small_key() {
        let key = PrivateKey::from_hex("0x5").unwrap();
        let message = Fr::from_u64(360292934);
        let signature = key.sign(&message).unwrap();
        let public = key.public_key();
        assert!(public.verify(&message, &signature).unwrap());
        assert!(!public.verify(&Fr::from_u64(360292935), &signature).unwrap());
    }

    #[test]
    fn test_oversized_s_rejected() {
        let key = PrivateKey::from_hex("0x5").unwrap();
        let message = Fr::from_u64(1);
        let mut signature = key.sign(&message).unwrap();
        signature.s += curve_order();
        assert!(!key.public_key().verify(&message, &signature).unwrap());
    }
}
