use std::fmt;
use std::sync::OnceLock;

use num_bigint::BigUint;
use num_traits::{Num, One, Zero};

use crate::{PoseidonError, Result};

/// BN254 scalar field modulus, big-endian.
const MODULUS_BE: [u8; 32] = [
    0x30, 0x64, 0x4e, 0x72, 0xe1, 0x31, 0xa0, 0x29, 0xb8, 0x50, 0x45, 0xb6, 0x81, 0x81, 0x58, 0x5d,
    0x28, 0x33, 0xe8, 0x48, 0x79, 0xb9, 0x70, 0x91, 0x43, 0xe1, 0xf5, 0x93, 0xf0, 0x00, 0x00, 0x01,
];

/// The BN254 scalar field modulus `p`.
pub fn modulus() -> &'static BigUint {
    static P: OnceLock<BigUint> = OnceLock::new();
    P.get_or_init(|| BigUint::from_bytes_be(&MODULUS_BE))
}

/// Element of the BN254 scalar field, always held in canonical form (`0 <= v < p`).
///
/// Arithmetic is plain `BigUint` modular arithmetic. The hot paths (Poseidon
/// rounds, curve multiplication) are a few thousand multiplications per
/// signature, which is well within budget for request signing.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fr(BigUint);

impl Fr {
    pub fn zero() -> Self {
        Fr(BigUint::zero())
    }

    pub fn one() -> Self {
        Fr(BigUint::one())
    }

    pub fn from_u64(value: u64) -> Self {
        // every u64 is below p
        Fr(BigUint::from(value))
    }

    /// Reduces an arbitrary non-negative integer modulo `p`.
    pub fn reduce(value: &BigUint) -> Self {
        Fr(value % modulus())
    }

    /// Accepts `value` only if it is already below `p`.
    pub fn from_canonical(value: BigUint) -> Result<Self> {
        if &value >= modulus() {
            return Err(PoseidonError::NonCanonical);
        }
        Ok(Fr(value))
    }

    /// Parses big-endian bytes (at most 32) as a canonical element.
    pub fn from_bytes_be(bytes: &[u8]) -> Result<Self> {
        if bytes.len() > 32 {
            return Err(PoseidonError::TooWide(bytes.len()));
        }
        Self::from_canonical(BigUint::from_bytes_be(bytes))
    }

    /// Parses little-endian bytes (at most 32) as a canonical element.
    pub fn from_bytes_le(bytes: &[u8]) -> Result<Self> {
        if bytes.len() > 32 {
            return Err(PoseidonError::TooWide(bytes.len()));
        }
        Self::from_canonical(BigUint::from_bytes_le(bytes))
    }

    /// Parses a hex string, with or without `0x`, as a canonical element.
    pub fn from_hex(s: &str) -> Result<Self> {
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);
        if digits.is_empty() {
            return Err(PoseidonError::InvalidHex(s.to_string()));
        }
        let value = BigUint::from_str_radix(digits, 16)
            .map_err(|e| PoseidonError::InvalidHex(format!("{}: {}", s, e)))?;
        Self::from_canonical(value)
    }

    /// Parses a base-10 string as a canonical element.
    pub fn from_dec_str(s: &str) -> Result<Self> {
        let value = BigUint::from_str_radix(s, 10)
            .map_err(|e| PoseidonError::InvalidDecimal(format!("{}: {}", s, e)))?;
        Self::from_canonical(value)
    }

    pub fn as_biguint(&self) -> &BigUint {
        &self.0
    }

    pub fn into_biguint(self) -> BigUint {
        self.0
    }

    pub fn to_bytes_be(&self) -> [u8; 32] {
        let raw = self.0.to_bytes_be();
        let mut out = [0u8; 32];
        out[32 - raw.len()..].copy_from_slice(&raw);
        out
    }

    pub fn to_bytes_le(&self) -> [u8; 32] {
        let raw = self.0.to_bytes_le();
        let mut out = [0u8; 32];
        out[..raw.len()].copy_from_slice(&raw);
        out
    }

    /// Lower-case `0x` hex, zero-padded to 32 bytes.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.to_bytes_be()))
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn add(&self, rhs: &Fr) -> Fr {
        let sum = &self.0 + &rhs.0;
        if &sum >= modulus() {
            Fr(sum - modulus())
        } else {
            Fr(sum)
        }
    }

    pub fn sub(&self, rhs: &Fr) -> Fr {
        if self.0 >= rhs.0 {
            Fr(&self.0 - &rhs.0)
        } else {
            Fr(modulus() - &rhs.0 + &self.0)
        }
    }

    pub fn neg(&self) -> Fr {
        if self.is_zero() {
            Fr::zero()
        } else {
            Fr(modulus() - &self.0)
        }
    }

    pub fn mul(&self, rhs: &Fr) -> Fr {
        Fr((&self.0 * &rhs.0) % modulus())
    }

    pub fn square(&self) -> Fr {
        self.mul(self)
    }

    pub fn pow(&self, exponent: &BigUint) -> Fr {
        Fr(self.0.modpow(exponent, modulus()))
    }

    /// `x^5`, the Poseidon S-box.
    pub fn pow5(&self) -> Fr {
        let x2 = self.square();
        let x4 = x2.square();
        x4.mul(self)
    }

    /// Multiplicative inverse via Fermat; `None` for zero.
    pub fn inverse(&self) -> Option<Fr> {
        if self.is_zero() {
            return None;
        }
        let exponent = modulus() - BigUint::from(2u8);
        Some(self.pow(&exponent))
    }

    /// Sign convention used for point compression: `x` is negative when
    /// `x > p - x`.
    pub fn is_negative(&self) -> bool {
        self.0 > self.neg().0
    }

    /// Square root by Tonelli-Shanks (`p - 1` has 2-adicity 28).
    ///
    /// Returns `None` for quadratic non-residues. Which of the two roots is
    /// returned is unspecified; callers fix the sign themselves.
    pub fn sqrt(&self) -> Option<Fr> {
        if self.is_zero() {
            return Some(Fr::zero());
        }
        let p = modulus();
        let p_minus_one = p - BigUint::one();
        let legendre_exp = &p_minus_one >> 1;
        if self.pow(&legendre_exp).0 != BigUint::one() {
            return None;
        }

        let mut q = p_minus_one.clone();
        let mut s = 0u32;
        while !q.bit(0) {
            q >>= 1;
            s += 1;
        }

        let mut z = Fr::from_u64(2);
        while z.pow(&legendre_exp).0 != p_minus_one {
            z = z.add(&Fr::one());
        }

        let mut m = s;
        let mut c = z.pow(&q);
        let mut t = self.pow(&q);
        let mut r = self.pow(&((&q + BigUint::one()) >> 1));

        while !t.0.is_one() {
            let mut i = 0u32;
            let mut probe = t.clone();
            while !probe.0.is_one() {
                probe = probe.square();
                i += 1;
                if i == m {
                    return None;
                }
            }
            let mut b = c.clone();
            for _ in 0..(m - i - 1) {
                b = b.square();
            }
            m = i;
            c = b.square();
            t = t.mul(&c);
            r = r.mul(&b);
        }
        Some(r)
    }
}

impl From<u64> for Fr {
    fn from(value: u64) -> Self {
        Fr::from_u64(value)
    }
}

impl fmt::Display for Fr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for Fr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fr({})", self.to_hex())
    }
}

impl fmt::LowerHex for Fr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}
