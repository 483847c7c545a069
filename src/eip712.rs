//! EIP-712 hashing (L1)
//!
//! `structHash = keccak256(abi.encode(typeHash, enc(v1), ..., enc(vn)))` where
//! addresses and integers are 32-byte words, `bytes` are replaced by their
//! keccak hash and arrays by the keccak hash of their concatenated element
//! words. The digest is `keccak256(0x1901 || domainSeparator || structHash)`.

use ethers::abi::{encode, Token};
use ethers::core::utils::keccak256;
use ethers::types::H256;
use sha3::{Digest, Keccak256};

use crate::canonical::FieldValue;
use crate::error::SchemaError;
use crate::schema::MessageSchema;

fn encode_field(name: &str, value: &FieldValue) -> Result<Token, SchemaError> {
    Ok(match value {
        FieldValue::Address(addr) => Token::Address(*addr),
        FieldValue::Uint(v) => Token::Uint(*v),
        FieldValue::Bytes(raw) => Token::FixedBytes(keccak256(raw).to_vec()),
        FieldValue::Array(items) => {
            let mut hasher = Keccak256::new();
            for item in items {
                let word = encode_field(name, item)?;
                if matches!(item, FieldValue::Array(_)) {
                    return Err(SchemaError::InvalidValue {
                        field: name.to_string(),
                        reason: "nested arrays are not supported".into(),
                    });
                }
                hasher.update(encode(&[word]));
            }
            Token::FixedBytes(hasher.finalize().to_vec())
        }
    })
}

/// Struct hash of canonical `values` under `schema`. Values must be in schema order.
pub fn struct_hash(schema: &MessageSchema, values: &[FieldValue]) -> Result<H256, SchemaError> {
    let fields = schema.fields();
    if values.len() != fields.len() {
        return Err(SchemaError::InvalidValue {
            field: schema.primary_type().to_string(),
            reason: format!("expected {} values, got {}", fields.len(), values.len()),
        });
    }
    let mut tokens = Vec::with_capacity(values.len() + 1);
    tokens.push(Token::FixedBytes(schema.type_hash().to_vec()));
    for (field, value) in fields.iter().zip(values) {
        tokens.push(encode_field(field.name, value)?);
    }
    Ok(H256::from(keccak256(encode(&tokens))))
}

/// Final EIP-712 digest.
pub fn digest(domain_separator: H256, struct_hash: H256) -> H256 {
    let mut data = Vec::with_capacity(66);
    data.push(0x19);
    data.push(0x01);
    data.extend_from_slice(domain_separator.as_bytes());
    data.extend_from_slice(struct_hash.as_bytes());
    H256::from(keccak256(&data))
}

/// Struct hash then digest, in one step.
pub fn typed_data_hash(
    schema: &MessageSchema,
    values: &[FieldValue],
    domain_separator: H256,
) -> Result<H256, SchemaError> {
    let hash = struct_hash(schema, values)?;
    let final_hash = digest(domain_separator, hash);
    tracing::debug!(
        primary_type = schema.primary_type(),
        struct_hash = ?hash,
        digest = ?final_hash,
        "Computed EIP-712 digest"
    );
    Ok(final_hash)
}
