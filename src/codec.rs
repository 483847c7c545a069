//! Signature wire formats
//!
//! L1: `0x || r(32) || s(32) || v(1) || signType(1)`, 134 characters.
//! L2: `0x || R.x(32) || R.y(32) || s(32)`, 194 characters.
//!
//! Hardware wallets hand back a bare 65-byte `r || s || v` without the type
//! suffix; [`decode_rsv`] parses that form.

use std::fmt;
use std::str::FromStr;

use babyjubjub_eddsa::{Point, Signature as EddsaSignature};
use ethers::types::{Address, Signature as EcdsaSignature, H256, U256};
use num_bigint::BigUint;
use poseidon_bn254::Fr;

use crate::error::CodecError;
use crate::signer::ecdsa::{recover_digest, recover_personal_message};

pub const L1_SIGNATURE_HEX_LEN: usize = 134;
pub const RSV_SIGNATURE_HEX_LEN: usize = 132;
pub const L2_SIGNATURE_HEX_LEN: usize = 194;

/// How an L1 signature was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EthSignType {
    Illegal,
    Invalid,
    /// Raw EIP-712 digest.
    Eip712,
    /// EIP-191 personal message.
    EthSign,
}

impl EthSignType {
    pub fn code(&self) -> u8 {
        match self {
            EthSignType::Illegal => 0,
            EthSignType::Invalid => 1,
            EthSignType::Eip712 => 2,
            EthSignType::EthSign => 3,
        }
    }

    pub fn from_code(code: u8) -> Result<Self, CodecError> {
        match code {
            0 => Ok(EthSignType::Illegal),
            1 => Ok(EthSignType::Invalid),
            2 => Ok(EthSignType::Eip712),
            3 => Ok(EthSignType::EthSign),
            other => Err(CodecError::UnknownSignType(format!("{:02x}", other))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EthSignType::Illegal => "ILLEGAL",
            EthSignType::Invalid => "INVALID",
            EthSignType::Eip712 => "EIP_712",
            EthSignType::EthSign => "ETH_SIGN",
        }
    }
}

impl fmt::Display for EthSignType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EthSignType {
    type Err = CodecError;

    /// Accepts the names (`EIP_712`) and the two-digit codes (`02`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ILLEGAL" | "00" => Ok(EthSignType::Illegal),
            "INVALID" | "01" => Ok(EthSignType::Invalid),
            "EIP_712" | "EIP712" | "02" => Ok(EthSignType::Eip712),
            "ETH_SIGN" | "ETHSIGN" | "03" => Ok(EthSignType::EthSign),
            other => Err(CodecError::UnknownSignType(other.to_string())),
        }
    }
}

fn malformed(reason: impl Into<String>) -> CodecError {
    CodecError::MalformedSignature(reason.into())
}

/// Strips `0x` and decodes, checking the total length including the prefix.
fn decode_hex(encoded: &str, expected_len: usize) -> Result<Vec<u8>, CodecError> {
    if encoded.len() != expected_len {
        return Err(malformed(format!(
            "expected {} characters, got {}",
            expected_len,
            encoded.len()
        )));
    }
    let digits = encoded
        .strip_prefix("0x")
        .ok_or_else(|| malformed("missing 0x prefix"))?;
    hex::decode(digits).map_err(|e| malformed(e.to_string()))
}

fn word(value: &U256) -> [u8; 32] {
    let mut out = [0u8; 32];
    value.to_big_endian(&mut out);
    out
}

fn v_byte(signature: &EcdsaSignature) -> Result<u8, CodecError> {
    u8::try_from(signature.v).map_err(|_| CodecError::ComponentOutOfRange(format!("v = {}", signature.v)))
}

// =============================================================================
// L1
// =============================================================================

pub fn encode_l1(signature: &EcdsaSignature, sign_type: EthSignType) -> Result<String, CodecError> {
    let mut bytes = Vec::with_capacity(66);
    bytes.extend_from_slice(&word(&signature.r));
    bytes.extend_from_slice(&word(&signature.s));
    bytes.push(v_byte(signature)?);
    bytes.push(sign_type.code());
    Ok(format!("0x{}", hex::encode(bytes)))
}

pub fn decode_l1(encoded: &str) -> Result<(EcdsaSignature, EthSignType), CodecError> {
    let bytes = decode_hex(encoded, L1_SIGNATURE_HEX_LEN)?;
    let sign_type = EthSignType::from_code(bytes[65])?;
    Ok((rsv_from_bytes(&bytes[..65]), sign_type))
}

/// Bare `r || s || v` without a sign-type suffix.
pub fn encode_rsv(signature: &EcdsaSignature) -> Result<String, CodecError> {
    let mut bytes = Vec::with_capacity(65);
    bytes.extend_from_slice(&word(&signature.r));
    bytes.extend_from_slice(&word(&signature.s));
    bytes.push(v_byte(signature)?);
    Ok(format!("0x{}", hex::encode(bytes)))
}

pub fn decode_rsv(encoded: &str) -> Result<EcdsaSignature, CodecError> {
    let bytes = decode_hex(encoded, RSV_SIGNATURE_HEX_LEN)?;
    Ok(rsv_from_bytes(&bytes))
}

fn rsv_from_bytes(bytes: &[u8]) -> EcdsaSignature {
    EcdsaSignature {
        r: U256::from_big_endian(&bytes[..32]),
        s: U256::from_big_endian(&bytes[32..64]),
        v: bytes[64] as u64,
    }
}

/// Address behind an encoded L1 signature over `digest`.
///
/// `EIP_712` signatures are checked against the digest itself, `ETH_SIGN`
/// signatures against the digest wrapped as a personal message.
pub fn recover_signer(encoded: &str, digest: H256) -> Result<Address, CodecError> {
    let (signature, sign_type) = decode_l1(encoded)?;
    match sign_type {
        EthSignType::Eip712 => recover_digest(&signature, digest),
        EthSignType::EthSign => recover_personal_message(&signature, digest.as_bytes()),
        other => Err(CodecError::Recovery(format!("cannot recover a {} signature", other))),
    }
}

// =============================================================================
// L2
// =============================================================================

pub fn encode_l2(signature: &EddsaSignature) -> Result<String, CodecError> {
    if signature.s.bits() > 256 {
        return Err(CodecError::ComponentOutOfRange("s exceeds 32 bytes".into()));
    }
    let s_raw = signature.s.to_bytes_be();
    let mut s_bytes = [0u8; 32];
    s_bytes[32 - s_raw.len()..].copy_from_slice(&s_raw);
    Ok(format!(
        "0x{}{}{}",
        hex::encode(signature.r.x().to_bytes_be()),
        hex::encode(signature.r.y().to_bytes_be()),
        hex::encode(s_bytes)
    ))
}

/// Inverse of [`encode_l2`]. `R` must be a curve point.
pub fn decode_l2(encoded: &str) -> Result<EddsaSignature, CodecError> {
    let bytes = decode_hex(encoded, L2_SIGNATURE_HEX_LEN)?;
    let coord = |name: &str, chunk: &[u8]| {
        Fr::from_bytes_be(chunk).map_err(|_| CodecError::ComponentOutOfRange(name.to_string()))
    };
    let x = coord("R.x", &bytes[..32])?;
    let y = coord("R.y", &bytes[32..64])?;
    let r = Point::new(x, y).map_err(|e| malformed(e.to_string()))?;
    Ok(EddsaSignature::new(r, BigUint::from_bytes_be(&bytes[64..])))
}

/// `R.x,R.y,s` in decimal, the REST `X-API-SIG` header form.
pub fn encode_l2_decimal(signature: &EddsaSignature) -> String {
    format!("{},{},{}", signature.r.x(), signature.r.y(), signature.s)
}
