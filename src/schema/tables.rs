//! Normative field tables. Field order is part of the signed message.

use super::{FieldDef, FieldSpec, MessageType, Source};
use crate::poseidon::PermutationSchedule;

use FieldSpec::{Address, Bytes, Uint};
use Source::{CompressedPublicKey, Each, Key, KeyOr, Zero};

const UINT96_ARRAY: FieldSpec = FieldSpec::Array(&FieldSpec::Uint(96));
const UINT32_ARRAY: FieldSpec = FieldSpec::Array(&FieldSpec::Uint(32));

// =============================================================================
// EIP-712 (L1)
// =============================================================================

const ACCOUNT_UPDATE: &[FieldDef] = &[
    FieldDef::new("owner", Address, Key("owner")),
    FieldDef::new("accountID", Uint(32), Key("accountId")),
    FieldDef::new("feeTokenID", Uint(16), Key("maxFee.tokenId")),
    FieldDef::new("maxFee", Uint(96), Key("maxFee.volume")),
    FieldDef::new("publicKey", Uint(256), CompressedPublicKey("publicKey")),
    FieldDef::new("validUntil", Uint(32), Key("validUntil")),
    FieldDef::new("nonce", Uint(32), Key("nonce")),
];

const TRANSFER: &[FieldDef] = &[
    FieldDef::new("from", Address, Key("payerAddr")),
    FieldDef::new("to", Address, Key("payeeAddr")),
    FieldDef::new("tokenID", Uint(16), Key("token.tokenId")),
    FieldDef::new("amount", Uint(96), Key("token.volume")),
    FieldDef::new("feeTokenID", Uint(16), Key("maxFee.tokenId")),
    FieldDef::new("maxFee", Uint(96), Key("maxFee.volume")),
    FieldDef::new("validUntil", Uint(32), Key("validUntil")),
    FieldDef::new("storageID", Uint(32), Key("storageId")),
];

const WITHDRAWAL: &[FieldDef] = &[
    FieldDef::new("owner", Address, Key("owner")),
    FieldDef::new("accountID", Uint(32), Key("accountId")),
    FieldDef::new("tokenID", Uint(16), Key("token.tokenId")),
    FieldDef::new("amount", Uint(96), Key("token.volume")),
    FieldDef::new("feeTokenID", Uint(16), Key("maxFee.tokenId")),
    FieldDef::new("maxFee", Uint(96), Key("maxFee.volume")),
    FieldDef::new("to", Address, Key("to")),
    FieldDef::new("extraData", Bytes, KeyOr("extraData", "")),
    FieldDef::new("minGas", Uint(256), Key("minGas")),
    FieldDef::new("validUntil", Uint(32), Key("validUntil")),
    FieldDef::new("storageID", Uint(32), Key("storageId")),
];

const POOL_JOIN: &[FieldDef] = &[
    FieldDef::new("owner", Address, Key("owner")),
    FieldDef::new(
        "joinAmounts",
        UINT96_ARRAY,
        Each {
            array: "joinTokens.pooled",
            item: Some("volume"),
        },
    ),
    FieldDef::new(
        "joinStorageIDs",
        UINT32_ARRAY,
        Each {
            array: "storageIds",
            item: None,
        },
    ),
    FieldDef::new("mintMinAmount", Uint(96), Key("joinTokens.minimumLp.volume")),
    FieldDef::new("validUntil", Uint(32), Key("validUntil")),
];

const POOL_EXIT: &[FieldDef] = &[
    FieldDef::new("owner", Address, Key("owner")),
    FieldDef::new("burnAmount", Uint(96), Key("exitTokens.burned.volume")),
    FieldDef::new("burnStorageID", Uint(32), Key("storageId")),
    FieldDef::new(
        "exitMinAmounts",
        UINT96_ARRAY,
        Each {
            array: "exitTokens.unPooled",
            item: Some("volume"),
        },
    ),
    FieldDef::new("fee", Uint(96), Key("maxFee")),
    FieldDef::new("validUntil", Uint(32), Key("validUntil")),
];

pub(super) const EIP712_TABLES: &[(MessageType, &str, &[FieldDef])] = &[
    (MessageType::AccountUpdate, "AccountUpdate", ACCOUNT_UPDATE),
    (MessageType::Transfer, "Transfer", TRANSFER),
    (MessageType::Withdrawal, "Withdrawal", WITHDRAWAL),
    (MessageType::PoolJoin, "PoolJoin", POOL_JOIN),
    (MessageType::PoolExit, "PoolExit", POOL_EXIT),
];

// =============================================================================
// Poseidon (L2)
// =============================================================================

const L2_DUMMY: &[FieldDef] = &[FieldDef::new("data", Uint(256), Key("data"))];

const L2_ORDER: &[FieldDef] = &[
    FieldDef::new("exchange", Address, Key("exchange")),
    FieldDef::new("storageId", Uint(32), Key("storageId")),
    FieldDef::new("accountId", Uint(32), Key("accountId")),
    FieldDef::new("sellToken.tokenId", Uint(16), Key("sellToken.tokenId")),
    FieldDef::new("buyToken.tokenId", Uint(16), Key("buyToken.tokenId")),
    FieldDef::new("sellToken.volume", Uint(96), Key("sellToken.volume")),
    FieldDef::new("buyToken.volume", Uint(96), Key("buyToken.volume")),
    FieldDef::new("validUntil", Uint(32), Key("validUntil")),
    FieldDef::new("maxFeeBips", Uint(8), Key("maxFeeBips")),
    FieldDef::new("fillAmountBOrS", Uint(8), Key("fillAmountBOrS")),
    FieldDef::new("taker", Address, KeyOr("taker", "0x0")),
];

const L2_ACCOUNT_UPDATE: &[FieldDef] = &[
    FieldDef::new("exchange", Address, Key("exchange")),
    FieldDef::new("accountId", Uint(32), Key("accountId")),
    FieldDef::new("maxFee.tokenId", Uint(16), Key("maxFee.tokenId")),
    FieldDef::new("maxFee.volume", Uint(96), Key("maxFee.volume")),
    FieldDef::new("publicKey.x", Uint(256), Key("publicKey.x")),
    FieldDef::new("publicKey.y", Uint(256), Key("publicKey.y")),
    FieldDef::new("validUntil", Uint(32), Key("validUntil")),
    FieldDef::new("nonce", Uint(32), Key("nonce")),
];

const L2_TRANSFER: &[FieldDef] = &[
    FieldDef::new("exchange", Address, Key("exchange")),
    FieldDef::new("payerId", Uint(32), Key("payerId")),
    FieldDef::new("payeeId", Uint(32), Key("payeeId")),
    FieldDef::new("token.tokenId", Uint(16), Key("token.tokenId")),
    FieldDef::new("token.volume", Uint(96), Key("token.volume")),
    FieldDef::new("maxFee.tokenId", Uint(16), Key("maxFee.tokenId")),
    FieldDef::new("maxFee.volume", Uint(96), Key("maxFee.volume")),
    FieldDef::new("payeeAddr", Address, Key("payeeAddr")),
    FieldDef::new("dualAuthKeyX", Uint(256), Zero),
    FieldDef::new("dualAuthKeyY", Uint(256), Zero),
    FieldDef::new("validUntil", Uint(32), Key("validUntil")),
    FieldDef::new("storageId", Uint(32), Key("storageId")),
];

const L2_DUAL_AUTH_TRANSFER: &[FieldDef] = &[
    FieldDef::new("exchange", Address, Key("exchange")),
    FieldDef::new("accountId", Uint(32), Key("accountId")),
    FieldDef::new("payee_toAccountID", Uint(32), Key("payee_toAccountID")),
    FieldDef::new("token", Uint(16), Key("token")),
    FieldDef::new("amount", Uint(96), Key("amount")),
    FieldDef::new("feeToken", Uint(16), Key("feeToken")),
    FieldDef::new("maxFeeAmount", Uint(96), Key("maxFeeAmount")),
    FieldDef::new("to", Address, Key("to")),
    FieldDef::new("dualAuthKeyX", Uint(256), KeyOr("dualAuthKeyX", "0x0")),
    FieldDef::new("dualAuthKeyY", Uint(256), KeyOr("dualAuthKeyY", "0x0")),
    FieldDef::new("validUntil", Uint(32), Key("validUntil")),
    FieldDef::new("storageId", Uint(32), Key("storageId")),
];

const L2_WITHDRAWAL: &[FieldDef] = &[
    FieldDef::new("exchange", Address, Key("exchange")),
    FieldDef::new("accountId", Uint(32), Key("accountId")),
    FieldDef::new("token.tokenId", Uint(16), Key("token.tokenId")),
    FieldDef::new("token.volume", Uint(96), Key("token.volume")),
    FieldDef::new("maxFee.tokenId", Uint(16), Key("maxFee.tokenId")),
    FieldDef::new("maxFee.volume", Uint(96), Key("maxFee.volume")),
    FieldDef::new("onChainDataHash", Uint(160), Key("onChainDataHash")),
    FieldDef::new("validUntil", Uint(32), Key("validUntil")),
    FieldDef::new("storageId", Uint(32), Key("storageId")),
];

pub(super) const POSEIDON_TABLES: &[(MessageType, PermutationSchedule, &[FieldDef])] = &[
    (MessageType::Dummy, PermutationSchedule::message(2), L2_DUMMY),
    (MessageType::Order, PermutationSchedule::message(12), L2_ORDER),
    (MessageType::AccountUpdate, PermutationSchedule::message(9), L2_ACCOUNT_UPDATE),
    (MessageType::Transfer, PermutationSchedule::message(13), L2_TRANSFER),
    (MessageType::DualAuthTransfer, PermutationSchedule::message(13), L2_DUAL_AUTH_TRANSFER),
    (MessageType::Withdrawal, PermutationSchedule::message(10), L2_WITHDRAWAL),
];
