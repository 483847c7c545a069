//! Request canonicalization
//!
//! Turns a JSON request map into the ordered, typed field values a schema
//! describes. Parsing is strict: values that do not fit their declared width
//! are rejected, never truncated.

use ethers::types::Address;
use num_bigint::BigUint;
use num_traits::{Num, Zero as _};
use poseidon_bn254::Fr;
use primitive_types::U256;
use serde_json::Value;

use babyjubjub_eddsa::Point;

use crate::error::SchemaError;
use crate::schema::{FieldDef, FieldSpec, Source};

/// A canonical value for one schema field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Address(Address),
    Uint(U256),
    Bytes(Vec<u8>),
    Array(Vec<FieldValue>),
}

impl FieldValue {
    /// Integer view of a scalar value as a BN254 field element.
    ///
    /// Values at or above the field modulus are rejected.
    pub fn to_field_element(&self, field: &str) -> Result<Fr, SchemaError> {
        let be: [u8; 32] = match self {
            FieldValue::Address(addr) => {
                let mut out = [0u8; 32];
                out[12..].copy_from_slice(addr.as_bytes());
                out
            }
            FieldValue::Uint(v) => {
                let mut out = [0u8; 32];
                v.to_big_endian(&mut out);
                out
            }
            FieldValue::Bytes(_) | FieldValue::Array(_) => {
                return Err(SchemaError::InvalidValue {
                    field: field.to_string(),
                    reason: "composite values cannot be hashed as a field element".into(),
                })
            }
        };
        Fr::from_bytes_be(&be).map_err(|_| SchemaError::ValueOutOfRange(field.to_string()))
    }
}

/// Resolves and parses every field of `fields` against `request`, in order.
pub fn canonicalize(fields: &[FieldDef], request: &Value) -> Result<Vec<FieldValue>, SchemaError> {
    fields.iter().map(|f| canonicalize_field(f, request)).collect()
}

fn canonicalize_field(field: &FieldDef, request: &Value) -> Result<FieldValue, SchemaError> {
    match field.source {
        Source::Key(path) => {
            let raw = lookup(request, path).ok_or_else(|| SchemaError::FieldMissing(path.to_string()))?;
            parse_value(field.name, &field.spec, raw)
        }
        Source::KeyOr(path, default) => match lookup(request, path) {
            Some(raw) => parse_value(field.name, &field.spec, raw),
            None => parse_value(field.name, &field.spec, &Value::String(default.to_string())),
        },
        Source::Each { array, item } => {
            let FieldSpec::Array(inner) = field.spec else {
                return Err(invalid(field.name, "array source on a scalar field"));
            };
            let raw = lookup(request, array).ok_or_else(|| SchemaError::FieldMissing(array.to_string()))?;
            let elements = raw
                .as_array()
                .ok_or_else(|| invalid(field.name, "expected an array"))?;
            let values = elements
                .iter()
                .enumerate()
                .map(|(i, element)| {
                    let value = match item {
                        Some(sub) => lookup(element, sub)
                            .ok_or_else(|| SchemaError::FieldMissing(format!("{}[{}].{}", array, i, sub)))?,
                        None => element,
                    };
                    parse_value(field.name, inner, value)
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(FieldValue::Array(values))
        }
        Source::CompressedPublicKey(path) => {
            let key = lookup(request, path).ok_or_else(|| SchemaError::FieldMissing(path.to_string()))?;
            compressed_public_key(field.name, path, key)
        }
        Source::Zero => Ok(FieldValue::Uint(U256::zero())),
    }
}

/// Dotted-path lookup; `null` counts as absent.
fn lookup<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = value;
    for key in path.split('.') {
        current = current.as_object()?.get(key)?;
    }
    if current.is_null() {
        None
    } else {
        Some(current)
    }
}

fn invalid(field: &str, reason: &str) -> SchemaError {
    SchemaError::InvalidValue {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_value(name: &str, spec: &FieldSpec, raw: &Value) -> Result<FieldValue, SchemaError> {
    match spec {
        FieldSpec::Address => parse_address(name, raw).map(FieldValue::Address),
        FieldSpec::Uint(bits) => parse_uint(name, raw, *bits as u64).map(FieldValue::Uint),
        FieldSpec::Bytes => parse_bytes(name, raw).map(FieldValue::Bytes),
        FieldSpec::Array(inner) => {
            let elements = raw.as_array().ok_or_else(|| invalid(name, "expected an array"))?;
            elements
                .iter()
                .map(|e| parse_value(name, inner, e))
                .collect::<Result<Vec<_>, _>>()
                .map(FieldValue::Array)
        }
    }
}

/// Parses a JSON scalar into an arbitrary-precision integer.
///
/// `0x`-prefixed strings are hex, other strings decimal, booleans 0/1.
fn parse_integer(name: &str, raw: &Value) -> Result<BigUint, SchemaError> {
    match raw {
        Value::Bool(b) => Ok(BigUint::from(*b as u8)),
        Value::Number(n) => {
            if let Some(v) = n.as_u64() {
                Ok(BigUint::from(v))
            } else if n.as_i64().is_some() {
                Err(SchemaError::ValueOutOfRange(name.to_string()))
            } else {
                Err(invalid(name, "non-integer number"))
            }
        }
        Value::String(s) => {
            let s = s.trim();
            if s.starts_with('-') {
                return Err(SchemaError::ValueOutOfRange(name.to_string()));
            }
            let (digits, radix) = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
                Some(hex) => (hex, 16),
                None => (s, 10),
            };
            if digits.is_empty() {
                return Err(invalid(name, "empty number"));
            }
            BigUint::from_str_radix(digits, radix).map_err(|e| invalid(name, &e.to_string()))
        }
        _ => Err(invalid(name, "expected a number or numeric string")),
    }
}

fn parse_uint(name: &str, raw: &Value, bits: u64) -> Result<U256, SchemaError> {
    let value = parse_integer(name, raw)?;
    if value.bits() > bits {
        return Err(SchemaError::ValueOutOfRange(name.to_string()));
    }
    Ok(biguint_to_u256(&value))
}

fn biguint_to_u256(value: &BigUint) -> U256 {
    // callers have already bounded `value` to 256 bits
    U256::from_big_endian(&value.to_bytes_be())
}

/// Addresses are hex, case-insensitive, `0x` optional; short forms are left-padded to 20 bytes.
fn parse_address(name: &str, raw: &Value) -> Result<Address, SchemaError> {
    let s = raw
        .as_str()
        .ok_or_else(|| invalid(name, "address must be a hex string"))?;
    address_from_str(name, s)
}

/// Same rules as request parsing; used for addresses read from configuration.
pub fn address_from_str(name: &str, s: &str) -> Result<Address, SchemaError> {
    let s = s.trim();
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    if digits.is_empty() {
        return Err(invalid(name, "empty address"));
    }
    let value = BigUint::from_str_radix(digits, 16).map_err(|e| invalid(name, &e.to_string()))?;
    if value.bits() > 160 {
        return Err(SchemaError::ValueOutOfRange(name.to_string()));
    }
    let raw_bytes = if value.is_zero() { Vec::new() } else { value.to_bytes_be() };
    let mut out = [0u8; 20];
    out[20 - raw_bytes.len()..].copy_from_slice(&raw_bytes);
    Ok(Address::from(out))
}

/// Hex byte string, `0x` optional, may be empty.
fn parse_bytes(name: &str, raw: &Value) -> Result<Vec<u8>, SchemaError> {
    let s = raw
        .as_str()
        .ok_or_else(|| invalid(name, "bytes must be a hex string"))?
        .trim();
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    hex::decode(digits).map_err(|e| invalid(name, &e.to_string()))
}

fn compressed_public_key(name: &str, path: &str, key: &Value) -> Result<FieldValue, SchemaError> {
    let coord = |axis: &str| -> Result<Fr, SchemaError> {
        let raw = key
            .get(axis)
            .filter(|v| !v.is_null())
            .ok_or_else(|| SchemaError::FieldMissing(format!("{}.{}", path, axis)))?;
        let value = parse_integer(name, raw)?;
        Fr::from_canonical(value).map_err(|_| SchemaError::ValueOutOfRange(name.to_string()))
    };
    let point = Point::new(coord("x")?, coord("y")?)
        .map_err(|e| invalid(name, &e.to_string()))?;
    Ok(FieldValue::Uint(U256::from_big_endian(&point.compress_be())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{MessageType, SchemaRegistry};
    use proptest::prelude::*;
    use serde_json::json;

    fn field(name: &'static str, spec: FieldSpec, source: Source) -> FieldDef {
        FieldDef::new(name, spec, source)
    }

    #[test]
    fn test_integer_forms() {
        let f = [field("v", FieldSpec::Uint(32), Source::Key("v"))];
        for raw in [json!(10001), json!("10001"), json!("0x2711"), json!("0X2711")] {
            let out = canonicalize(&f, &json!({ "v": raw })).unwrap();
            assert_eq!(out, vec![FieldValue::Uint(U256::from(10001u64))]);
        }
        let out = canonicalize(&f, &json!({ "v": true })).unwrap();
        assert_eq!(out, vec![FieldValue::Uint(U256::one())]);
    }

    #[test]
    fn test_width_enforced_not_truncated() {
        let f = [field("tokenID", FieldSpec::Uint(16), Source::Key("t"))];
        assert!(canonicalize(&f, &json!({ "t": 65535 })).is_ok());
        assert_eq!(
            canonicalize(&f, &json!({ "t": 65536 })),
            Err(SchemaError::ValueOutOfRange("tokenID".into()))
        );
        assert_eq!(
            canonicalize(&f, &json!({ "t": -1 })),
            Err(SchemaError::ValueOutOfRange("tokenID".into()))
        );
        assert_eq!(
            canonicalize(&f, &json!({ "t": "-5" })),
            Err(SchemaError::ValueOutOfRange("tokenID".into()))
        );
    }

    #[test]
    fn test_unparseable_and_missing() {
        let f = [field("amount", FieldSpec::Uint(96), Source::Key("token.volume"))];
        assert!(matches!(
            canonicalize(&f, &json!({ "token": { "volume": "12abc" } })),
            Err(SchemaError::InvalidValue { .. })
        ));
        assert!(matches!(
            canonicalize(&f, &json!({ "token": { "volume": 1.5 } })),
            Err(SchemaError::InvalidValue { .. })
        ));
        assert_eq!(
            canonicalize(&f, &json!({ "token": {} })),
            Err(SchemaError::FieldMissing("token.volume".into()))
        );
        assert_eq!(
            canonicalize(&f, &json!({ "token": { "volume": null } })),
            Err(SchemaError::FieldMissing("token.volume".into()))
        );
    }

    #[test]
    fn test_address_padding_and_case() {
        let f = [field("owner", FieldSpec::Address, Source::Key("a"))];
        let short = canonicalize(&f, &json!({ "a": "0xd95EE4302E49963CB751945c48BD553fd093" })).unwrap();
        assert_eq!(
            short,
            vec![FieldValue::Address(
                "0x0000d95ee4302e49963cb751945c48bd553fd093".parse().unwrap()
            )]
        );
        let zero = canonicalize(&f, &json!({ "a": "0x0" })).unwrap();
        assert_eq!(zero, vec![FieldValue::Address(Address::zero())]);

        let upper = canonicalize(&f, &json!({ "a": "0x611DB73454C27E07281D2317AA088F9918321415" })).unwrap();
        let lower = canonicalize(&f, &json!({ "a": "0x611db73454c27e07281d2317aa088f9918321415" })).unwrap();
        assert_eq!(upper, lower);

        assert_eq!(
            canonicalize(&f, &json!({ "a": "0x01611db73454c27e07281d2317aa088f9918321415" })),
            Err(SchemaError::ValueOutOfRange("owner".into()))
        );
    }

    #[test]
    fn test_bytes_with_and_without_prefix() {
        let f = [field("extraData", FieldSpec::Bytes, Source::KeyOr("d", ""))];
        assert_eq!(
            canonicalize(&f, &json!({ "d": "0xdead" })).unwrap(),
            vec![FieldValue::Bytes(vec![0xde, 0xad])]
        );
        assert_eq!(
            canonicalize(&f, &json!({ "d": "dead" })).unwrap(),
            vec![FieldValue::Bytes(vec![0xde, 0xad])]
        );
        assert_eq!(canonicalize(&f, &json!({})).unwrap(), vec![FieldValue::Bytes(vec![])]);
        assert!(canonicalize(&f, &json!({ "d": "0xabc" })).is_err());
    }

    #[test]
    fn test_pool_join_projection() {
        let schema = SchemaRegistry::global().eip712_schema(MessageType::PoolJoin).unwrap();
        let request = json!({
            "owner": "0x23a51c5f860527f971d0587d130c64536256040d",
            "joinTokens": {
                "pooled": [
                    { "tokenId": 1, "volume": "100000000000000000000" },
                    { "tokenId": 0, "volume": "200" }
                ],
                "minimumLp": { "tokenId": 5, "volume": "100000000000" }
            },
            "storageIds": [1, 2],
            "validUntil": 1700000000
        });
        let values = canonicalize(schema.fields(), &request).unwrap();
        assert_eq!(values.len(), 5);
        assert_eq!(
            values[1],
            FieldValue::Array(vec![
                FieldValue::Uint(U256::from_dec_str("100000000000000000000").unwrap()),
                FieldValue::Uint(U256::from(200u64)),
            ])
        );
        assert_eq!(
            values[2],
            FieldValue::Array(vec![FieldValue::Uint(U256::from(1u64)), FieldValue::Uint(U256::from(2u64))])
        );
    }

    #[test]
    fn test_pool_join_missing_element_volume() {
        let schema = SchemaRegistry::global().eip712_schema(MessageType::PoolJoin).unwrap();
        let request = json!({
            "owner": "0x0",
            "joinTokens": { "pooled": [{ "tokenId": 1 }], "minimumLp": { "volume": "1" } },
            "storageIds": [1],
            "validUntil": 1
        });
        assert_eq!(
            canonicalize(schema.fields(), &request),
            Err(SchemaError::FieldMissing("joinTokens.pooled[0].volume".into()))
        );
    }

    #[test]
    fn test_compressed_public_key() {
        let f = [field("publicKey", FieldSpec::Uint(256), Source::CompressedPublicKey("publicKey"))];
        let request = json!({
            "publicKey": {
                "x": "0x2442c9e22d221abac0582cf764028d21114c9676b743f590741ffdf1f8a735ca",
                "y": "0x08a42c954bc114b967bdd77cf7a1780e07fe10a4ebbef00b567ef2876e997d1a"
            }
        });
        let out = canonicalize(&f, &request).unwrap();
        // x is "negative", so bit 255 is set on top of y
        let expected =
            U256::from_str_radix("88a42c954bc114b967bdd77cf7a1780e07fe10a4ebbef00b567ef2876e997d1a", 16).unwrap();
        assert_eq!(out, vec![FieldValue::Uint(expected)]);

        let off_curve = json!({ "publicKey": { "x": "0x1", "y": "0x1" } });
        assert!(matches!(canonicalize(&f, &off_curve), Err(SchemaError::InvalidValue { .. })));
    }

    #[test]
    fn test_field_element_bound() {
        let p_minus_one = U256::from_dec_str(
            "21888242871839275222246405745257275088548364400416034343698204186575808495616",
        )
        .unwrap();
        assert!(FieldValue::Uint(p_minus_one).to_field_element("x").is_ok());
        assert_eq!(
            FieldValue::Uint(p_minus_one + U256::one()).to_field_element("x"),
            Err(SchemaError::ValueOutOfRange("x".into()))
        );
        assert!(FieldValue::Bytes(vec![1]).to_field_element("x").is_err());
    }

    proptest! {
        #[test]
        fn prop_decimal_and_hex_agree(v in any::<u64>()) {
            let f = [field("v", FieldSpec::Uint(64), Source::Key("v"))];
            let dec = canonicalize(&f, &json!({ "v": v.to_string() })).unwrap();
            let hex = canonicalize(&f, &json!({ "v": format!("0x{:x}", v) })).unwrap();
            let num = canonicalize(&f, &json!({ "v": v })).unwrap();
            prop_assert_eq!(&dec, &hex);
            prop_assert_eq!(&dec, &num);
        }

        #[test]
        fn prop_width_boundary(bits in 1u32..=63, v in any::<u64>()) {
            let spec_bits = ((bits + 7) / 8 * 8) as u16;
            let f = [field("v", FieldSpec::Uint(spec_bits), Source::Key("v"))];
            let result = canonicalize(&f, &json!({ "v": v }));
            let fits = spec_bits >= 64 || v < (1u64 << spec_bits);
            prop_assert_eq!(result.is_ok(), fits);
        }
    }
}
