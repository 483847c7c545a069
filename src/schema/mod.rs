//! Message schemas
//!
//! Static, ordered field tables for every signable message type: the EIP-712
//! struct layouts (L1) and the Poseidon input vectors (L2). Each field records
//! both its ABI type and where its value lives in the request map, so the
//! canonicalizer can split composite request fields (`token.volume`,
//! `joinTokens.pooled[*].volume`, the compressed public key).
//!
//! The registry is built once per process and never mutated.

mod tables;

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use ethers::core::utils::keccak256;

use crate::error::SchemaError;
use crate::poseidon::PermutationSchedule;

// ============================================================================
// Message types
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageType {
    AccountUpdate,
    Transfer,
    DualAuthTransfer,
    Withdrawal,
    Order,
    PoolJoin,
    PoolExit,
    Dummy,
}

impl MessageType {
    pub const ALL: [MessageType; 8] = [
        MessageType::AccountUpdate,
        MessageType::Transfer,
        MessageType::DualAuthTransfer,
        MessageType::Withdrawal,
        MessageType::Order,
        MessageType::PoolJoin,
        MessageType::PoolExit,
        MessageType::Dummy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::AccountUpdate => "AccountUpdate",
            MessageType::Transfer => "Transfer",
            MessageType::DualAuthTransfer => "DualAuthTransfer",
            MessageType::Withdrawal => "Withdrawal",
            MessageType::Order => "Order",
            MessageType::PoolJoin => "PoolJoin",
            MessageType::PoolExit => "PoolExit",
            MessageType::Dummy => "Dummy",
        }
    }

    /// AMM pool messages hash under the pool's own domain.
    pub fn uses_pool_domain(&self) -> bool {
        matches!(self, MessageType::PoolJoin | MessageType::PoolExit)
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageType {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "AccountUpdate" => Ok(MessageType::AccountUpdate),
            "Transfer" | "OriginTransfer" => Ok(MessageType::Transfer),
            "DualAuthTransfer" => Ok(MessageType::DualAuthTransfer),
            "Withdrawal" => Ok(MessageType::Withdrawal),
            "Order" => Ok(MessageType::Order),
            "PoolJoin" => Ok(MessageType::PoolJoin),
            "PoolExit" => Ok(MessageType::PoolExit),
            "Dummy" => Ok(MessageType::Dummy),
            other => Err(SchemaError::UnknownMessageType(other.to_string())),
        }
    }
}

// ============================================================================
// Field layout
// ============================================================================

/// ABI type of a schema field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldSpec {
    Address,
    /// Unsigned integer of the given width in bits (8..=256, multiple of 8).
    Uint(u16),
    /// Dynamic bytes; keccak-hashed when embedded in a struct.
    Bytes,
    Array(&'static FieldSpec),
}

impl FieldSpec {
    /// Solidity type name as it appears in an EIP-712 type string.
    pub fn type_name(&self) -> String {
        match self {
            FieldSpec::Address => "address".to_string(),
            FieldSpec::Uint(bits) => format!("uint{}", bits),
            FieldSpec::Bytes => "bytes".to_string(),
            FieldSpec::Array(inner) => format!("{}[]", inner.type_name()),
        }
    }
}

/// Where a field's value comes from in the request map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// Required value at a dotted key path, e.g. `maxFee.volume`.
    Key(&'static str),
    /// Optional value with a literal default.
    KeyOr(&'static str, &'static str),
    /// Every element of the array at `array`, optionally projected through `item`.
    Each {
        array: &'static str,
        item: Option<&'static str>,
    },
    /// Baby-Jubjub point `{x, y}` at the path, embedded in compressed form.
    CompressedPublicKey(&'static str),
    /// Fixed zero input.
    Zero,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDef {
    pub name: &'static str,
    pub spec: FieldSpec,
    pub source: Source,
}

impl FieldDef {
    pub const fn new(name: &'static str, spec: FieldSpec, source: Source) -> Self {
        Self { name, spec, source }
    }
}

// ============================================================================
// Schemas
// ============================================================================

/// An EIP-712 struct layout with its cached type hash.
#[derive(Debug, Clone)]
pub struct MessageSchema {
    message_type: MessageType,
    primary_type: &'static str,
    fields: &'static [FieldDef],
    type_string: String,
    type_hash: [u8; 32],
}

impl MessageSchema {
    fn new(message_type: MessageType, primary_type: &'static str, fields: &'static [FieldDef]) -> Self {
        let members: Vec<String> = fields
            .iter()
            .map(|f| format!("{} {}", f.spec.type_name(), f.name))
            .collect();
        let type_string = format!("{}({})", primary_type, members.join(","));
        let type_hash = keccak256(type_string.as_bytes());
        Self {
            message_type,
            primary_type,
            fields,
            type_string,
            type_hash,
        }
    }

    pub fn message_type(&self) -> MessageType {
        self.message_type
    }

    pub fn primary_type(&self) -> &'static str {
        self.primary_type
    }

    pub fn fields(&self) -> &'static [FieldDef] {
        self.fields
    }

    /// `Name(type1 name1,type2 name2,...)`
    pub fn type_string(&self) -> &str {
        &self.type_string
    }

    pub fn type_hash(&self) -> [u8; 32] {
        self.type_hash
    }
}

/// An ordered Poseidon input vector and the permutation schedule it is hashed with.
#[derive(Debug, Clone)]
pub struct PoseidonSchema {
    message_type: MessageType,
    schedule: PermutationSchedule,
    inputs: &'static [FieldDef],
}

impl PoseidonSchema {
    pub fn message_type(&self) -> MessageType {
        self.message_type
    }

    pub fn schedule(&self) -> PermutationSchedule {
        self.schedule
    }

    pub fn inputs(&self) -> &'static [FieldDef] {
        self.inputs
    }
}

// ============================================================================
// Registry
// ============================================================================

pub struct SchemaRegistry {
    eip712: HashMap<MessageType, MessageSchema>,
    poseidon: HashMap<MessageType, PoseidonSchema>,
}

impl SchemaRegistry {
    /// Process-wide registry, built on first use.
    pub fn global() -> &'static SchemaRegistry {
        static REGISTRY: OnceLock<SchemaRegistry> = OnceLock::new();
        REGISTRY.get_or_init(SchemaRegistry::build)
    }

    fn build() -> Self {
        let eip712 = tables::EIP712_TABLES
            .iter()
            .map(|(mt, primary, fields)| (*mt, MessageSchema::new(*mt, primary, fields)))
            .collect();
        let poseidon = tables::POSEIDON_TABLES
            .iter()
            .map(|(mt, schedule, inputs)| {
                (
                    *mt,
                    PoseidonSchema {
                        message_type: *mt,
                        schedule: *schedule,
                        inputs,
                    },
                )
            })
            .collect();
        Self { eip712, poseidon }
    }

    /// EIP-712 schema by message-type name.
    pub fn schema_for(&self, message_type: &str) -> Result<&MessageSchema, SchemaError> {
        self.eip712_schema(message_type.parse()?)
    }

    pub fn eip712_schema(&self, message_type: MessageType) -> Result<&MessageSchema, SchemaError> {
        self.eip712
            .get(&message_type)
            .ok_or(SchemaError::UnsupportedLayer {
                message_type: message_type.to_string(),
                layer: "EIP-712",
            })
    }

    pub fn poseidon_schema(&self, message_type: MessageType) -> Result<&PoseidonSchema, SchemaError> {
        self.poseidon
            .get(&message_type)
            .ok_or(SchemaError::UnsupportedLayer {
                message_type: message_type.to_string(),
                layer: "Poseidon",
            })
    }

    pub fn has_eip712(&self, message_type: MessageType) -> bool {
        self.eip712.contains_key(&message_type)
    }

    pub fn has_poseidon(&self, message_type: MessageType) -> bool {
        self.poseidon.contains_key(&message_type)
    }
}
