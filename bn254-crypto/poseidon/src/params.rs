use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use num_bigint::BigUint;

use crate::field::{modulus, Fr};
use crate::{PoseidonError, Result};

// Attack-bound ratios for an x^5 S-box (Grassi et al., eprint 2019/458, figs. 1, 3, 4).
const INTERPOLATION_ATTACK_RATIO: f64 = 0.43;
const GROBNER_ATTACK_RATIO_ROUNDS: f64 = 0.21;
const GROBNER_ATTACK_RATIO_SBOXES: f64 = 0.14;

/// A Poseidon permutation schedule together with its derived constants.
///
/// Built once per schedule and shared; construction derives `F + P` round
/// constants and a `t x t` Cauchy MDS matrix from the seed.
#[derive(Clone, Debug)]
pub struct PoseidonParams {
    t: usize,
    full_rounds: usize,
    partial_rounds: usize,
    seed: Vec<u8>,
    alpha: u64,
    security_target: u32,
    round_constants: Vec<Fr>,
    mds: Vec<Vec<Fr>>,
}

impl PoseidonParams {
    /// Validates the schedule and derives its constants.
    ///
    /// `security_target` defaults to the field bit size (253) when `None`.
    /// Only `alpha = 5` is valid for BN254 since `p mod 5 != 1`.
    pub fn new(
        t: usize,
        full_rounds: usize,
        partial_rounds: usize,
        seed: &[u8],
        alpha: u64,
        security_target: Option<u32>,
    ) -> Result<Self> {
        if full_rounds == 0 || full_rounds % 2 != 0 {
            return Err(PoseidonError::InvalidParams(format!(
                "full rounds must be even and non-zero, got {}",
                full_rounds
            )));
        }
        if partial_rounds == 0 {
            return Err(PoseidonError::InvalidParams(
                "partial rounds must be non-zero".to_string(),
            ));
        }
        if t < 2 {
            return Err(PoseidonError::InvalidParams(format!(
                "state width must be at least 2, got {}",
                t
            )));
        }

        let field_bits = modulus().bits() as u32 - 1;
        let target = security_target.unwrap_or(field_bits);
        if target > field_bits {
            return Err(PoseidonError::InvalidParams(format!(
                "security target {} exceeds field size {} bits",
                target, field_bits
            )));
        }
        if alpha != 5 {
            return Err(PoseidonError::InvalidParams(format!(
                "S-box exponent must be 5 for this field, got {}",
                alpha
            )));
        }

        let rounds = (full_rounds + partial_rounds) as f64;
        let bound = f64::from(target.min(field_bits));
        let interpolation = INTERPOLATION_ATTACK_RATIO * bound + (t as f64).log2();
        if rounds <= interpolation {
            return Err(PoseidonError::InvalidParams(format!(
                "{} rounds do not exceed the interpolation bound {:.2}",
                rounds, interpolation
            )));
        }
        let grobner_rounds = (2.0 + bound) * GROBNER_ATTACK_RATIO_ROUNDS;
        if rounds <= grobner_rounds {
            return Err(PoseidonError::InvalidParams(format!(
                "{} rounds do not exceed the Grobner round bound {:.2}",
                rounds, grobner_rounds
            )));
        }
        let sboxes = (full_rounds + t * partial_rounds) as f64;
        let grobner_sboxes = f64::from(target) * GROBNER_ATTACK_RATIO_SBOXES;
        if sboxes <= grobner_sboxes {
            return Err(PoseidonError::InvalidParams(format!(
                "{} S-boxes do not exceed the Grobner S-box bound {:.2}",
                sboxes, grobner_sboxes
            )));
        }

        let round_constants = derive_constants(&suffixed(seed, b"_constants"), full_rounds + partial_rounds);
        let mds = cauchy_matrix(&suffixed(seed, b"_matrix_0000"), t)?;

        Ok(Self {
            t,
            full_rounds,
            partial_rounds,
            seed: seed.to_vec(),
            alpha,
            security_target: target,
            round_constants,
            mds,
        })
    }

    pub fn t(&self) -> usize {
        self.t
    }

    pub fn full_rounds(&self) -> usize {
        self.full_rounds
    }

    pub fn partial_rounds(&self) -> usize {
        self.partial_rounds
    }

    pub fn seed(&self) -> &[u8] {
        &self.seed
    }

    pub fn alpha(&self) -> u64 {
        self.alpha
    }

    pub fn security_target(&self) -> u32 {
        self.security_target
    }

    pub fn round_constants(&self) -> &[Fr] {
        &self.round_constants
    }

    pub fn mds(&self) -> &[Vec<Fr>] {
        &self.mds
    }
}

fn suffixed(seed: &[u8], suffix: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(seed.len() + suffix.len());
    out.extend_from_slice(seed);
    out.extend_from_slice(suffix);
    out
}

/// BLAKE2b-256 of `data`, read as a little-endian integer.
fn blake2b_le(data: &[u8]) -> BigUint {
    let mut hasher = Blake2b::<U32>::new();
    hasher.update(data);
    BigUint::from_bytes_le(&hasher.finalize())
}

fn to_le_32(value: &BigUint) -> [u8; 32] {
    let raw = value.to_bytes_le();
    let mut out = [0u8; 32];
    out[..raw.len()].copy_from_slice(&raw);
    out
}

/// Hash chain `c_0 = H(seed)`, `c_{i+1} = H(c_i)`; the unreduced value is
/// chained, the reduced value is emitted.
fn derive_constants(seed: &[u8], count: usize) -> Vec<Fr> {
    let mut out = Vec::with_capacity(count);
    let mut state = blake2b_le(seed);
    for i in 0..count {
        if i > 0 {
            state = blake2b_le(&to_le_32(&state));
        }
        out.push(Fr::reduce(&state));
    }
    out
}

fn cauchy_matrix(seed: &[u8], t: usize) -> Result<Vec<Vec<Fr>>> {
    let c = derive_constants(seed, 2 * t);
    let mut rows = Vec::with_capacity(t);
    for i in 0..t {
        let mut row = Vec::with_capacity(t);
        for j in 0..t {
            let entry = c[i].sub(&c[t + j]).inverse().ok_or_else(|| {
                PoseidonError::InvalidParams(format!("degenerate MDS entry at ({}, {})", i, j))
            })?;
            row.push(entry);
        }
        rows.push(row);
    }
    Ok(rows)
}
