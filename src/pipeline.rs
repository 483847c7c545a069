//! Request signing pipeline
//!
//! request map -> canonical values -> EIP-712 digest -> ECDSA
//!             -> Poseidon hash -> EdDSA -> encoded signatures
//!
//! Which layers a message type gets follows the exchange's rules:
//! transfers, withdrawals and account updates carry both signatures; orders,
//! dual-auth transfers and dummies are L2 only; AMM joins and exits are signed
//! with EdDSA over the pool-domain digest shifted into the field, or with
//! ECDSA over the digest itself when asked for `L1Only`.

use std::sync::Arc;

use ethers::types::{Address, H256};
use poseidon_bn254::Fr;
use serde::Serialize;
use serde_json::Value;

use crate::canonical::{address_from_str, canonicalize};
use crate::codec::{encode_l1, encode_l2, encode_l2_decimal, EthSignType};
use crate::config::logging::sanitize_signature;
use crate::domain::DomainRegistry;
use crate::eip712;
use crate::error::{Result, SchemaError};
use crate::poseidon;
use crate::schema::{MessageType, SchemaRegistry};
use crate::signer::SignerPair;

/// Which layers to sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureMode {
    L1Only,
    L2Only,
    Both,
}

impl SignatureMode {
    fn wants_l1(&self) -> bool {
        matches!(self, SignatureMode::L1Only | SignatureMode::Both)
    }

    fn wants_l2(&self) -> bool {
        matches!(self, SignatureMode::L2Only | SignatureMode::Both)
    }

    /// Default mode for a message type.
    pub fn default_for(message_type: MessageType) -> Self {
        match message_type {
            MessageType::Transfer | MessageType::Withdrawal | MessageType::AccountUpdate => {
                SignatureMode::Both
            }
            MessageType::Order
            | MessageType::DualAuthTransfer
            | MessageType::Dummy
            | MessageType::PoolJoin
            | MessageType::PoolExit => SignatureMode::L2Only,
        }
    }
}

/// Output of one signing call. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedMessage {
    pub message_type: String,
    /// The request as signed, including derived fields such as `onChainDataHash`.
    pub payload: Value,
    /// EIP-712 digest. Pool messages carry it even when only L2 is signed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub l1_digest: Option<H256>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub l1_signature: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub l2_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub l2_signature: Option<String>,
}

/// Signed REST request (`X-API-SIG`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedUrl {
    pub canonical: String,
    pub hash: String,
    /// `R.x,R.y,s` in decimal.
    pub api_sig: String,
    /// Same signature, hex encoded.
    pub signature: String,
}

pub struct RequestSigner {
    domains: Arc<DomainRegistry>,
    signers: SignerPair,
    l1_sign_type: EthSignType,
}

impl RequestSigner {
    pub fn new(domains: Arc<DomainRegistry>, signers: SignerPair) -> Self {
        Self {
            domains,
            signers,
            l1_sign_type: EthSignType::Eip712,
        }
    }

    /// Sign L1 digests as EIP-191 personal messages (`ETH_SIGN`) instead of
    /// raw EIP-712 digests. Used with wallets that cannot sign typed data.
    pub fn with_l1_sign_type(mut self, sign_type: EthSignType) -> Self {
        self.l1_sign_type = sign_type;
        self
    }

    pub fn signers(&self) -> &SignerPair {
        &self.signers
    }

    pub fn domains(&self) -> &DomainRegistry {
        &self.domains
    }

    /// EIP-712 digest of `request` under the exchange domain or, for pool
    /// messages, the domain of the pool named by `poolAddress`.
    pub fn l1_digest(&self, message_type: MessageType, request: &Value) -> Result<H256> {
        let schema = SchemaRegistry::global().eip712_schema(message_type)?;
        let pool = if message_type.uses_pool_domain() {
            Some(pool_address(request)?)
        } else {
            None
        };
        let separator = self.domains.domain_hash(pool.as_ref())?;
        let values = canonicalize(schema.fields(), request)?;
        Ok(eip712::typed_data_hash(schema, &values, separator)?)
    }

    /// Signs `request` with the default layers for its type.
    pub fn sign(&self, message_type: MessageType, request: &Value) -> Result<SignedMessage> {
        self.sign_request(message_type, request, SignatureMode::default_for(message_type))
    }

    #[tracing::instrument(skip(self, request), fields(message_type = %message_type))]
    pub fn sign_request(
        &self,
        message_type: MessageType,
        request: &Value,
        mode: SignatureMode,
    ) -> Result<SignedMessage> {
        let registry = SchemaRegistry::global();
        let payload = if message_type == MessageType::Withdrawal {
            poseidon::with_onchain_data_hash(request)?
        } else {
            request.clone()
        };

        let mut signed = SignedMessage {
            message_type: message_type.to_string(),
            payload,
            l1_digest: None,
            l1_signature: None,
            l2_hash: None,
            l2_signature: None,
        };

        if mode.wants_l1() {
            let digest = self.l1_digest(message_type, &signed.payload)?;
            tracing::debug!(digest = ?digest, "L1 digest");
            signed.l1_signature = Some(self.sign_l1_digest(digest)?);
            signed.l1_digest = Some(digest);
        }

        if mode.wants_l2() {
            let hash = if registry.has_poseidon(message_type) {
                poseidon::hash(message_type, &signed.payload)?
            } else if message_type.uses_pool_domain() {
                // pool messages sign the shifted EIP-712 digest directly
                let digest = match signed.l1_digest {
                    Some(digest) => digest,
                    None => self.l1_digest(message_type, &signed.payload)?,
                };
                signed.l1_digest = Some(digest);
                poseidon::message_hash_shifted(digest)
            } else {
                return Err(SchemaError::UnsupportedLayer {
                    message_type: message_type.to_string(),
                    layer: "Poseidon",
                }
                .into());
            };
            tracing::debug!(hash = %hash.to_hex(), "L2 message hash");
            signed.l2_signature = Some(self.sign_l2_hash(&hash)?);
            signed.l2_hash = Some(hash.to_hex());
        }

        tracing::info!(
            l1_signature = ?signed.l1_signature.as_deref().map(sanitize_signature),
            l2_signature = ?signed.l2_signature.as_deref().map(sanitize_signature),
            "Signed request"
        );
        Ok(signed)
    }

    /// ECDSA over `digest`, encoded with this signer's sign type.
    ///
    /// `ETH_SIGN` signs the digest bytes as an EIP-191 personal message, so the
    /// signature recovers through `recover_personal_message`. Some older
    /// clients tag a signature over the bare digest `03`; those do not
    /// recover here.
    pub fn sign_l1_digest(&self, digest: H256) -> Result<String> {
        let l1 = self.signers.l1()?;
        let signature = match self.l1_sign_type {
            EthSignType::EthSign => l1.sign_personal_message(digest.as_bytes())?,
            _ => l1.sign_digest(digest)?,
        };
        Ok(encode_l1(&signature, self.l1_sign_type)?)
    }

    /// EdDSA over a field element, hex encoded.
    pub fn sign_l2_hash(&self, hash: &Fr) -> Result<String> {
        let signature = self.signers.l2()?.sign(hash)?;
        Ok(encode_l2(&signature)?)
    }

    /// Signs a REST request for the `X-API-SIG` header.
    #[tracing::instrument(skip(self, params))]
    pub fn sign_url<K, V>(&self, method: &str, host: &str, path: &str, params: &[(K, V)]) -> Result<SignedUrl>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let canonical = poseidon::canonical_url_string(method, host, path, params);
        let hash = poseidon::hash_url(method, host, path, params);
        let signature = self.signers.l2()?.sign(&hash)?;
        Ok(SignedUrl {
            canonical,
            hash: hash.to_string(),
            api_sig: encode_l2_decimal(&signature),
            signature: encode_l2(&signature)?,
        })
    }

    /// EdDSA over SHA-256 of a text message.
    pub fn sign_text(&self, message: &str) -> Result<String> {
        self.sign_l2_hash(&poseidon::hash_text(message))
    }

    /// EdDSA over the Poseidon hash of up to 13 field elements.
    pub fn sign_generic(&self, inputs: &[Fr]) -> Result<String> {
        self.sign_l2_hash(&poseidon::generic_hash(inputs)?)
    }
}

fn pool_address(request: &Value) -> Result<Address> {
    let raw = request
        .get("poolAddress")
        .and_then(Value::as_str)
        .ok_or_else(|| SchemaError::FieldMissing("poolAddress".into()))?;
    Ok(address_from_str("poolAddress", raw)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{decode_l1, decode_l2, recover_signer};
    use crate::domain::Domain;
    use crate::error::{DomainError, KeyError, SignerError};
    use crate::signer::ecdsa::TEST_L1_PRIVATE_KEY;
    use crate::signer::eddsa::TEST_L2_PRIVATE_KEY;
    use serde_json::json;

    const EXCHANGE: &str = "0x35990C74eB567B3bbEfD2Aa480467b1031b23eD9";
    const POOL: &str = "0xDadF20fc684C11ce9a8713C7fdd496865562764f";

    fn registry() -> Arc<DomainRegistry> {
        let registry = DomainRegistry::new();
        registry
            .register_exchange_domain(Domain::new("Loopring Protocol", "3.6.0", 1, EXCHANGE.parse().unwrap()))
            .unwrap();
        registry
            .register_pool_domain(
                POOL.parse().unwrap(),
                Domain::new("AMM Pool LRC-ETH", "1.0.0", 5, POOL.parse().unwrap()),
            )
            .unwrap();
        registry.mark_ready();
        Arc::new(registry)
    }

    fn signer() -> RequestSigner {
        RequestSigner::new(
            registry(),
            SignerPair::from_hex(Some(TEST_L1_PRIVATE_KEY), Some(TEST_L2_PRIVATE_KEY)).unwrap(),
        )
    }

    fn withdrawal() -> Value {
        json!({
            "exchange": EXCHANGE,
            "owner": "0x611db73454c27e07281d2317aa088f9918321415",
            "accountId": 5,
            "token": { "tokenId": 0, "volume": "1000000000000000000" },
            "maxFee": { "tokenId": 0, "volume": "1000000000000000" },
            "to": "0xc0ff3f78529ab90f765406f7234ce0f2b1ed69ee",
            "extraData": "",
            "minGas": 300000,
            "validUntil": 0xfffffff,
            "storageId": 5
        })
    }

    fn pool_join() -> Value {
        json!({
            "poolAddress": POOL,
            "owner": "0x23a51c5f860527f971d0587d130c64536256040d",
            "joinTokens": {
                "pooled": [
                    { "tokenId": 1, "volume": "100000000000000000000" },
                    { "tokenId": 0, "volume": "100000000000000000000" }
                ],
                "minimumLp": { "tokenId": 5, "volume": "100000000000" }
            },
            "storageIds": [1, 1],
            "validUntil": 1700000000
        })
    }

    #[test]
    fn test_withdrawal_signs_both_layers() {
        let signer = signer();
        let signed = signer.sign(MessageType::Withdrawal, &withdrawal()).unwrap();
        let digest = signed.l1_digest.unwrap();
        assert_eq!(
            format!("{:?}", digest),
            "0xfae5a78e3d12d2c8b220ab8ae7bf733120285699c2c4441972986044c02cbb06"
        );
        let l1 = signed.l1_signature.unwrap();
        assert_eq!(decode_l1(&l1).unwrap().1, EthSignType::Eip712);
        assert_eq!(recover_signer(&l1, digest).unwrap(), signer.signers().l1().unwrap().address());

        assert!(signed.payload["onChainDataHash"].is_string());
        let l2 = decode_l2(&signed.l2_signature.unwrap()).unwrap();
        let hash = Fr::from_hex(&signed.l2_hash.unwrap()).unwrap();
        assert!(signer.signers().l2().unwrap().verify(&hash, &l2).unwrap());
    }

    #[test]
    fn test_order_is_l2_only() {
        let order = json!({
            "exchange": "0x7489DE8c7C1Ee35101196ec650931D7bef9FdAD2",
            "storageId": 0,
            "accountId": 10004,
            "sellToken": { "tokenId": 0, "volume": "90000000000000000000" },
            "buyToken": { "tokenId": 1, "volume": "100000000000000000000" },
            "validUntil": 1700000000,
            "maxFeeBips": 50,
            "fillAmountBOrS": true
        });
        let signed = signer().sign(MessageType::Order, &order).unwrap();
        assert!(signed.l1_signature.is_none());
        assert_eq!(
            signed.l2_hash.as_deref(),
            Some("0x29cd0d0af93db7a54cf0bc593529bab94beef63df236ca6a7ada6aeddc1e4d63")
        );

        let err = signer()
            .sign_request(MessageType::Order, &order, SignatureMode::Both)
            .unwrap_err();
        assert!(matches!(err, SignerError::Schema(SchemaError::UnsupportedLayer { .. })));
    }

    #[test]
    fn test_pool_join_uses_pool_domain() {
        let signed = signer()
            .sign_request(MessageType::PoolJoin, &pool_join(), SignatureMode::L1Only)
            .unwrap();
        assert_eq!(
            format!("{:?}", signed.l1_digest.unwrap()),
            "0x2fbfc763583465648e76c2f7eccbcc8786a49d88ccbf3722ada22754e44d6245"
        );
        assert!(signed.l2_signature.is_none());
    }

    #[test]
    fn test_pool_join_defaults_to_eddsa() {
        assert_eq!(SignatureMode::default_for(MessageType::PoolJoin), SignatureMode::L2Only);
        assert_eq!(SignatureMode::default_for(MessageType::PoolExit), SignatureMode::L2Only);

        let signer = signer();
        let signed = signer.sign(MessageType::PoolJoin, &pool_join()).unwrap();
        assert!(signed.l1_signature.is_none());
        let digest = signed.l1_digest.unwrap();
        let hash = poseidon::message_hash_shifted(digest);
        assert_eq!(signed.l2_hash.as_deref(), Some(hash.to_hex().as_str()));

        let signature = decode_l2(&signed.l2_signature.unwrap()).unwrap();
        assert!(signer.signers().l2().unwrap().verify(&hash, &signature).unwrap());
    }

    #[test]
    fn test_pool_join_eddsa_signs_shifted_digest() {
        let signer = signer();
        let signed = signer
            .sign_request(MessageType::PoolJoin, &pool_join(), SignatureMode::L2Only)
            .unwrap();
        assert!(signed.l1_signature.is_none());
        let digest = signer.l1_digest(MessageType::PoolJoin, &pool_join()).unwrap();
        assert_eq!(
            signed.l2_hash.unwrap(),
            poseidon::message_hash_shifted(digest).to_hex()
        );
    }

    #[test]
    fn test_pool_message_needs_registered_pool() {
        let mut request = pool_join();
        request["poolAddress"] = json!("0x0000000000000000000000000000000000000001");
        let err = signer().sign(MessageType::PoolJoin, &request).unwrap_err();
        assert!(matches!(err, SignerError::Domain(DomainError::NotFound(_))));

        request.as_object_mut().unwrap().remove("poolAddress");
        let err = signer().sign(MessageType::PoolJoin, &request).unwrap_err();
        assert!(matches!(err, SignerError::Schema(SchemaError::FieldMissing(_))));
    }

    #[test]
    fn test_registry_not_ready() {
        let signer = RequestSigner::new(
            Arc::new(DomainRegistry::new()),
            SignerPair::from_hex(Some(TEST_L1_PRIVATE_KEY), None).unwrap(),
        );
        let err = signer.sign(MessageType::Withdrawal, &withdrawal()).unwrap_err();
        assert!(matches!(err, SignerError::Domain(DomainError::NotReady)));
    }

    #[test]
    fn test_missing_key_layer() {
        let signer = RequestSigner::new(registry(), SignerPair::from_hex(None, Some(TEST_L2_PRIVATE_KEY)).unwrap());
        let err = signer.sign(MessageType::Transfer, &json!({})).unwrap_err();
        // canonicalization fails before the key is needed
        assert!(matches!(err, SignerError::Schema(_)));

        let err = signer.sign_l1_digest(H256::zero()).unwrap_err();
        assert!(matches!(err, SignerError::Key(KeyError::Missing("L1"))));
    }

    #[test]
    fn test_eth_sign_mode() {
        let signer = signer().with_l1_sign_type(EthSignType::EthSign);
        let signed = signer
            .sign_request(MessageType::Withdrawal, &withdrawal(), SignatureMode::L1Only)
            .unwrap();
        let l1 = signed.l1_signature.unwrap();
        assert!(l1.ends_with("03"));
        assert_eq!(
            recover_signer(&l1, signed.l1_digest.unwrap()).unwrap(),
            signer.signers().l1().unwrap().address()
        );
    }

    #[test]
    fn test_sign_text_verifies() {
        let signer = signer();
        let signature = decode_l2(&signer.sign_text("hello loopring").unwrap()).unwrap();
        let l2 = signer.signers().l2().unwrap();
        assert!(l2.verify(&poseidon::hash_text("hello loopring"), &signature).unwrap());
        assert!(!l2.verify(&poseidon::hash_text("hello"), &signature).unwrap());
    }

    #[test]
    fn test_sign_generic_input_bounds() {
        let signer = signer();
        let l2 = signer.signers().l2().unwrap();

        let inputs: Vec<Fr> = (1..=13u64).map(Fr::from_u64).collect();
        for len in [1, 5, 13] {
            let signature = decode_l2(&signer.sign_generic(&inputs[..len]).unwrap()).unwrap();
            let hash = poseidon::generic_hash(&inputs[..len]).unwrap();
            assert!(l2.verify(&hash, &signature).unwrap());
        }

        assert!(signer.sign_generic(&[]).is_err());
        let too_many: Vec<Fr> = (1..=14u64).map(Fr::from_u64).collect();
        assert!(signer.sign_generic(&too_many).is_err());
    }

    #[test]
    fn test_sign_url() {
        let signer = RequestSigner::new(registry(), SignerPair::from_hex(None, Some("0x1234")).unwrap());
        let signed = signer
            .sign_url("GET", "https://api.uat.loopring.pro", "/api/v3/apiKey", &[("accountId", "10001")])
            .unwrap();
        assert_eq!(
            signed.hash,
            "19698114414489121702708585802156165003258239134682045126314396977296950143479"
        );
        assert_eq!(
            signed.signature,
            "0x0dfbbcc409fbcdb07dc350b50cf034fa0ebfd259346c81b3fd3bdb8951117a152ccecf37615e470d0038f15fd1c1ea69f212636033d880119b474e1e9e7548131074a9dad709b4e4950a86fea510d9c0b207a66f35aab4fc135e5fe64b9d009b"
        );
        assert_eq!(signed.api_sig.split(',').count(), 3);
    }

    #[test]
    fn test_signed_message_serializes_camel_case() {
        let signed = signer().sign(MessageType::Dummy, &json!({ "data": 5 })).unwrap();
        let out = serde_json::to_value(&signed).unwrap();
        assert_eq!(out["messageType"], "Dummy");
        assert!(out.get("l1Signature").is_none());
        assert_eq!(
            out["l2Hash"],
            "0x24ae3c702dae4fd0428cccab2fdc99e2418a159c64275252ea535f184422c439"
        );
    }
}
