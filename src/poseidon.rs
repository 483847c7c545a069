//! Poseidon hashing (L2)
//!
//! Message hashes for every L2-signable request type, plus the hash paths
//! that do not go through a schema: signed REST URLs, plain text, generic
//! input vectors and the reductions of a 32-byte L1 digest into the field.
//!
//! All schedules share the BN254 modulus, `alpha = 5`, the seed `"poseidon"`
//! and a 128-bit security target. Parameters are derived once per schedule.

use std::collections::HashMap;
use std::sync::OnceLock;

use ethers::core::utils::keccak256;
use ethers::types::{Address, H256, U256};
use num_bigint::BigUint;
use poseidon_bn254::{poseidon, Fr, PoseidonError, PoseidonParams};
use serde_json::Value;
use sha2::{Digest, Sha256};
use urlencoding::encode;

use crate::canonical::{canonicalize, FieldValue};
use crate::error::{Result, SchemaError};
use crate::schema::{FieldDef, FieldSpec, MessageType, SchemaRegistry, Source};

pub const SEED: &[u8] = b"poseidon";
pub const ALPHA: u64 = 5;
pub const SECURITY_TARGET: u32 = 128;
pub const MESSAGE_FULL_ROUNDS: usize = 6;
pub const MESSAGE_PARTIAL_ROUNDS: usize = 53;

/// Width, full rounds and partial rounds of one Poseidon instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PermutationSchedule {
    pub t: usize,
    pub full_rounds: usize,
    pub partial_rounds: usize,
}

impl PermutationSchedule {
    /// Message-hash schedule of width `t` (6 full, 53 partial rounds).
    pub const fn message(t: usize) -> Self {
        Self {
            t,
            full_rounds: MESSAGE_FULL_ROUNDS,
            partial_rounds: MESSAGE_PARTIAL_ROUNDS,
        }
    }

    /// Largest number of inputs this schedule accepts.
    pub fn capacity(&self) -> usize {
        self.t - 1
    }

    /// Cached parameters for this schedule.
    pub fn params(&self) -> std::result::Result<&'static PoseidonParams, PoseidonError> {
        let cached = schedule_cache().get(self).ok_or_else(|| {
            PoseidonError::InvalidParams(format!(
                "no parameters for t={} F={} P={}",
                self.t, self.full_rounds, self.partial_rounds
            ))
        })?;
        cached.as_ref().map_err(|e| e.clone())
    }
}

pub const GENERIC_SCHEDULE: PermutationSchedule = PermutationSchedule::message(14);

const KNOWN_WIDTHS: [usize; 6] = [2, 9, 10, 12, 13, 14];

type ScheduleCache = HashMap<PermutationSchedule, std::result::Result<PoseidonParams, PoseidonError>>;

fn schedule_cache() -> &'static ScheduleCache {
    static CACHE: OnceLock<ScheduleCache> = OnceLock::new();
    CACHE.get_or_init(|| {
        KNOWN_WIDTHS
            .iter()
            .map(|&t| {
                let schedule = PermutationSchedule::message(t);
                let params = PoseidonParams::new(
                    t,
                    schedule.full_rounds,
                    schedule.partial_rounds,
                    SEED,
                    ALPHA,
                    Some(SECURITY_TARGET),
                );
                (schedule, params)
            })
            .collect()
    })
}

// =============================================================================
// Schema-driven message hashes
// =============================================================================

/// Poseidon hash of canonical input values under `schedule`.
pub fn hash_values(
    schedule: PermutationSchedule,
    fields: &[FieldDef],
    values: &[FieldValue],
) -> Result<Fr> {
    let inputs = fields
        .iter()
        .zip(values)
        .map(|(field, value)| value.to_field_element(field.name))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    hash_inputs(schedule, &inputs)
}

/// Poseidon hash of raw field elements under `schedule`.
pub fn hash_inputs(schedule: PermutationSchedule, inputs: &[Fr]) -> Result<Fr> {
    let params = schedule.params()?;
    Ok(poseidon(inputs, params)?)
}

/// L2 message hash of `request` for `message_type`.
///
/// Withdrawals must already carry `onChainDataHash`; see [`with_onchain_data_hash`].
pub fn hash(message_type: MessageType, request: &Value) -> Result<Fr> {
    let schema = SchemaRegistry::global().poseidon_schema(message_type)?;
    let values = canonicalize(schema.inputs(), request)?;
    let out = hash_values(schema.schedule(), schema.inputs(), &values)?;
    tracing::debug!(message_type = %message_type, hash = %out.to_hex(), "Computed Poseidon message hash");
    Ok(out)
}

/// Hash of up to 13 caller-supplied field elements (t = 14).
pub fn generic_hash(inputs: &[Fr]) -> Result<Fr> {
    if inputs.is_empty() || inputs.len() > GENERIC_SCHEDULE.capacity() {
        return Err(SchemaError::InvalidValue {
            field: "inputs".to_string(),
            reason: format!("expected 1 to {} elements, got {}", GENERIC_SCHEDULE.capacity(), inputs.len()),
        }
        .into());
    }
    hash_inputs(GENERIC_SCHEDULE, inputs)
}

// =============================================================================
// Non-Poseidon message reductions
// =============================================================================

fn sha256_mod_p(data: &[u8]) -> Fr {
    let digest = Sha256::digest(data);
    Fr::reduce(&BigUint::from_bytes_be(&digest))
}

/// `int(digest) >> 3`; always below the modulus. Signed directly by AMM join/exit.
pub fn message_hash_shifted(digest: H256) -> Fr {
    Fr::reduce(&(BigUint::from_bytes_be(digest.as_bytes()) >> 3u32))
}

/// `int(digest) mod p`.
pub fn message_hash_reduced(digest: H256) -> Fr {
    Fr::reduce(&BigUint::from_bytes_be(digest.as_bytes()))
}

/// SHA-256 of a UTF-8 text message, reduced into the field.
pub fn hash_text(message: &str) -> Fr {
    sha256_mod_p(message.as_bytes())
}

/// `METHOD&pct(host+path)&pct(k1=pct(v1)&k2=pct(v2)...)`, parameters in the given order.
///
/// The method is hashed exactly as passed; `get` and `GET` sign differently.
pub fn canonical_url_string<K, V>(method: &str, host: &str, path: &str, params: &[(K, V)]) -> String
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    // `encode` leaves only the RFC 3986 unreserved set
    let url = encode(&format!("{}{}", host, path)).into_owned();
    let joined = params
        .iter()
        .map(|(k, v)| format!("{}={}", k.as_ref(), encode(v.as_ref())))
        .collect::<Vec<_>>()
        .join("&");
    format!("{}&{}&{}", method, url, encode(&joined))
}

/// Message hash of a signed REST request (the `X-API-SIG` payload).
pub fn hash_url<K, V>(method: &str, host: &str, path: &str, params: &[(K, V)]) -> Fr
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let canonical = canonical_url_string(method, host, path, params);
    tracing::debug!(canonical = %canonical, "Canonical URL string");
    sha256_mod_p(canonical.as_bytes())
}

// =============================================================================
// Withdrawal on-chain data
// =============================================================================

const ONCHAIN_DATA_FIELDS: &[FieldDef] = &[
    FieldDef::new("minGas", FieldSpec::Uint(256), Source::Key("minGas")),
    FieldDef::new("to", FieldSpec::Address, Source::Key("to")),
    FieldDef::new("extraData", FieldSpec::Bytes, Source::KeyOr("extraData", "")),
];

/// `keccak256(minGas(32B) || to(20B) || extraData)[..20]`
pub fn onchain_data_hash(min_gas: U256, to: Address, extra_data: &[u8]) -> [u8; 20] {
    let mut data = Vec::with_capacity(52 + extra_data.len());
    let mut word = [0u8; 32];
    min_gas.to_big_endian(&mut word);
    data.extend_from_slice(&word);
    data.extend_from_slice(to.as_bytes());
    data.extend_from_slice(extra_data);
    let hash = keccak256(&data);
    let mut out = [0u8; 20];
    out.copy_from_slice(&hash[..20]);
    out
}

/// Copy of a withdrawal request with `onChainDataHash` filled in from
/// `minGas`, `to` and `extraData`. An existing value is kept.
pub fn with_onchain_data_hash(request: &Value) -> Result<Value> {
    if request.get("onChainDataHash").is_some_and(|v| !v.is_null()) {
        return Ok(request.clone());
    }
    let values = canonicalize(ONCHAIN_DATA_FIELDS, request)?;
    let (min_gas, to, extra) = match values.as_slice() {
        [FieldValue::Uint(g), FieldValue::Address(a), FieldValue::Bytes(b)] => (*g, *a, b.as_slice()),
        _ => {
            return Err(SchemaError::InvalidValue {
                field: "onChainDataHash".into(),
                reason: "unexpected on-chain data layout".into(),
            }
            .into())
        }
    };
    let hash = onchain_data_hash(min_gas, to, extra);
    let mut out = request.clone();
    let map = out.as_object_mut().ok_or_else(|| SchemaError::InvalidValue {
        field: "request".into(),
        reason: "expected a JSON object".into(),
    })?;
    map.insert(
        "onChainDataHash".to_string(),
        Value::String(format!("0x{}", hex::encode(hash))),
    );
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SignerError;
    use serde_json::json;

    const WITHDRAWAL_DIGEST: &str = "0xfae5a78e3d12d2c8b220ab8ae7bf733120285699c2c4441972986044c02cbb06";

    #[test]
    fn test_known_schedules_build() {
        for t in KNOWN_WIDTHS {
            let params = PermutationSchedule::message(t).params().unwrap();
            assert_eq!(params.t(), t);
            assert_eq!(params.round_constants().len(), 59);
        }
    }

    #[test]
    fn test_unknown_schedule_rejected() {
        let odd = PermutationSchedule::message(7);
        assert!(matches!(odd.params(), Err(PoseidonError::InvalidParams(_))));
    }

    #[test]
    fn test_dummy_hash() {
        let out = hash(MessageType::Dummy, &json!({ "data": 5 })).unwrap();
        assert_eq!(
            out.to_hex(),
            "0x24ae3c702dae4fd0428cccab2fdc99e2418a159c64275252ea535f184422c439"
        );
    }

    #[test]
    fn test_pool_types_have_no_poseidon_schema() {
        let err = hash(MessageType::PoolJoin, &json!({})).unwrap_err();
        assert!(matches!(
            err,
            SignerError::Schema(SchemaError::UnsupportedLayer { .. })
        ));
    }

    #[test]
    fn test_input_at_modulus_rejected() {
        let p = "21888242871839275222246405745257275088548364400416034343698204186575808495617";
        let err = hash(MessageType::Dummy, &json!({ "data": p })).unwrap_err();
        assert!(matches!(
            err,
            SignerError::Schema(SchemaError::ValueOutOfRange(ref f)) if f == "data"
        ));
    }

    #[test]
    fn test_message_hash_variants() {
        let digest: H256 = WITHDRAWAL_DIGEST.parse().unwrap();
        assert_eq!(
            message_hash_shifted(digest).to_hex(),
            "0x1f5cb4f1c7a25a59164415715cf7ee6624050ad3385888832e530c0898059760"
        );
        assert_eq!(
            message_hash_reduced(digest).to_hex(),
            "0x08f01f4fd71ab1f8188f4efa6038b95f5724cd2f622511431f2e9461102cbb01"
        );
    }

    #[test]
    fn test_shifted_hash_of_max_digest_is_canonical() {
        let digest = H256::repeat_byte(0xff);
        let shifted = message_hash_shifted(digest);
        assert_eq!(shifted.as_biguint().bits(), 253);
    }

    #[test]
    fn test_canonical_url_string() {
        let s = canonical_url_string(
            "GET",
            "https://api.uat.loopring.pro",
            "/api/v3/apiKey",
            &[("accountId", "10001")],
        );
        assert_eq!(
            s,
            "GET&https%3A%2F%2Fapi.uat.loopring.pro%2Fapi%2Fv3%2FapiKey&accountId%3D10001"
        );
    }

    #[test]
    fn test_url_values_are_double_encoded() {
        let s = canonical_url_string("GET", "h", "/p", &[("a", "x y"), ("b", "1")]);
        assert_eq!(s, "GET&h%2Fp&a%3Dx%2520y%26b%3D1");
        let empty: [(&str, &str); 0] = [];
        assert_eq!(canonical_url_string("DELETE", "h", "/p", &empty), "DELETE&h%2Fp&");
    }

    #[test]
    fn test_url_method_is_not_normalized() {
        let params = [("accountId", "10001")];
        let lower = canonical_url_string("get", "h", "/p", &params);
        assert!(lower.starts_with("get&"));
        assert_ne!(hash_url("get", "h", "/p", &params), hash_url("GET", "h", "/p", &params));
    }

    #[test]
    fn test_url_hash_vector() {
        let h = hash_url(
            "GET",
            "https://api.uat.loopring.pro",
            "/api/v3/apiKey",
            &[("accountId", "10001")],
        );
        assert_eq!(
            h.to_string(),
            "19698114414489121702708585802156165003258239134682045126314396977296950143479"
        );
    }

    #[test]
    fn test_generic_hash_bounds() {
        let inputs: Vec<Fr> = (1..=13).map(Fr::from_u64).collect();
        assert_eq!(
            generic_hash(&inputs).unwrap().to_hex(),
            "0x16c937ec01d8d4721779c83047437adb01c1511851f1698facc809c7c1e6279c"
        );
        let too_many: Vec<Fr> = (1..=14).map(Fr::from_u64).collect();
        assert!(generic_hash(&too_many).is_err());
        assert!(generic_hash(&[]).is_err());
    }

    #[test]
    fn test_onchain_data_hash_vector() {
        let to: Address = "0x23a51c5f860527f971d0587d130c64536256040d".parse().unwrap();
        assert_eq!(
            hex::encode(onchain_data_hash(U256::zero(), to, &[])),
            "09b0a56ec6c45c6f3af2abbdefd66b6e84bce8e4"
        );
    }

    #[test]
    fn test_with_onchain_data_hash_inserts_and_keeps() {
        let request = json!({
            "to": "0x23a51c5f860527f971d0587d130c64536256040d",
            "minGas": 0
        });
        let filled = with_onchain_data_hash(&request).unwrap();
        assert_eq!(
            filled["onChainDataHash"],
            "0x09b0a56ec6c45c6f3af2abbdefd66b6e84bce8e4"
        );

        let preset = json!({ "onChainDataHash": "0x1234" });
        assert_eq!(with_onchain_data_hash(&preset).unwrap(), preset);

        assert!(matches!(
            with_onchain_data_hash(&json!({ "to": "0x0" })),
            Err(SignerError::Schema(SchemaError::FieldMissing(_)))
        ));
    }

    #[test]
    fn test_text_hash_is_sha256_mod_p() {
        let expected = BigUint::from_bytes_be(&Sha256::digest(b"hello"))
            % poseidon_bn254::modulus();
        assert_eq!(hash_text("hello").as_biguint(), &expected);
    }
}
