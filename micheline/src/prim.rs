// TZINDEX: Contract value transcoding for indexers of Michelson-based chains
//
// SPDX-License-Identifier: Apache-2.0
//
// Copyright (C) 2024-2025 TZINDEX contributors.
// All rights under the above copyrights are reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not use this file except
// in compliance with the License. You may obtain a copy of the License at
//
//        http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software distributed under the License
// is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express
// or implied. See the License for the specific language governing permissions and limitations under
// the License.

use core::str::FromStr;

/// Michelson type primitives.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Display)]
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypePrim {
    #[display("unit")]
    Unit,
    #[display("never")]
    Never,
    #[display("bool")]
    Bool,
    #[display("int")]
    Int,
    #[display("nat")]
    Nat,
    #[display("string")]
    String,
    #[display("chain_id")]
    ChainId,
    #[display("bytes")]
    Bytes,
    #[display("mutez")]
    Mutez,
    #[display("key_hash")]
    KeyHash,
    #[display("key")]
    Key,
    #[display("signature")]
    Signature,
    #[display("timestamp")]
    Timestamp,
    #[display("address")]
    Address,
    #[display("tx_rollup_l2_address")]
    TxRollupL2Address,
    #[display("operation")]
    Operation,
    #[display("bls12_381_g1")]
    #[serde(rename = "bls12_381_g1")]
    Bls12381G1,
    #[display("bls12_381_g2")]
    #[serde(rename = "bls12_381_g2")]
    Bls12381G2,
    #[display("bls12_381_fr")]
    #[serde(rename = "bls12_381_fr")]
    Bls12381Fr,
    #[display("sapling_state")]
    SaplingState,
    #[display("sapling_transaction")]
    SaplingTransaction,
    #[display("sapling_transaction_deprecated")]
    SaplingTransactionDeprecated,
    #[display("chest")]
    Chest,
    #[display("chest_key")]
    ChestKey,
    #[display("ticket")]
    Ticket,
    #[display("option")]
    Option,
    #[display("list")]
    List,
    #[display("set")]
    Set,
    #[display("map")]
    Map,
    #[display("big_map")]
    BigMap,
    #[display("pair")]
    Pair,
    #[display("or")]
    Or,
    #[display("contract")]
    Contract,
    #[display("lambda")]
    Lambda,
}

impl TypePrim {
    pub const ALL: [TypePrim; 34] = [
        TypePrim::Unit,
        TypePrim::Never,
        TypePrim::Bool,
        TypePrim::Int,
        TypePrim::Nat,
        TypePrim::String,
        TypePrim::ChainId,
        TypePrim::Bytes,
        TypePrim::Mutez,
        TypePrim::KeyHash,
        TypePrim::Key,
        TypePrim::Signature,
        TypePrim::Timestamp,
        TypePrim::Address,
        TypePrim::TxRollupL2Address,
        TypePrim::Operation,
        TypePrim::Bls12381G1,
        TypePrim::Bls12381G2,
        TypePrim::Bls12381Fr,
        TypePrim::SaplingState,
        TypePrim::SaplingTransaction,
        TypePrim::SaplingTransactionDeprecated,
        TypePrim::Chest,
        TypePrim::ChestKey,
        TypePrim::Ticket,
        TypePrim::Option,
        TypePrim::List,
        TypePrim::Set,
        TypePrim::Map,
        TypePrim::BigMap,
        TypePrim::Pair,
        TypePrim::Or,
        TypePrim::Contract,
        TypePrim::Lambda,
    ];

    /// Types whose single argument is an opaque type consumed by other tooling, rather than a
    /// part of the value tree.
    pub fn embeds_type(self) -> bool { matches!(self, TypePrim::Contract | TypePrim::Lambda | TypePrim::Ticket) }

    /// Types carrying no type arguments.
    pub fn is_leaf(self) -> bool {
        !matches!(
            self,
            TypePrim::Option
                | TypePrim::List
                | TypePrim::Set
                | TypePrim::Map
                | TypePrim::BigMap
                | TypePrim::Pair
                | TypePrim::Or
                | TypePrim::Contract
                | TypePrim::Lambda
                | TypePrim::Ticket
        )
    }
}

/// Error returned for a primitive name which is not a Michelson type.
#[derive(Clone, Eq, PartialEq, Debug, Display, Error)]
#[display("unknown primitive '{0}'")]
pub struct UnknownPrim(pub String);

impl FromStr for TypePrim {
    type Err = UnknownPrim;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|prim| prim.to_string() == s)
            .ok_or_else(|| UnknownPrim(s.to_owned()))
    }
}

/// Primitive names in the order of their tags in the binary encoding.
pub(crate) const WIRE_PRIMS: [&str; 157] = [
    "parameter", "storage", "code", "False", "Elt", "Left", "None", "Pair", "Right", "Some", // 0x00
    "True", "Unit", "PACK", "UNPACK", "BLAKE2B", "SHA256", "SHA512", "ABS", "ADD", "AMOUNT", // 0x0A
    "AND", "BALANCE", "CAR", "CDR", "CHECK_SIGNATURE", "COMPARE", "CONCAT", "CONS", "CREATE_ACCOUNT",
    "CREATE_CONTRACT", "IMPLICIT_ACCOUNT", "DIP", "DROP", "DUP", "EDIV", "EMPTY_MAP", "EMPTY_SET", "EQ",
    "EXEC", "FAILWITH", "GE", "GET", "GT", "HASH_KEY", "IF", "IF_CONS", "IF_LEFT", "IF_NONE", "INT", "LAMBDA",
    "LE", "LEFT", "LOOP", "LSL", "LSR", "LT", "MAP", "MEM", "MUL", "NEG", "NEQ", "NIL", "NONE", "NOT", "NOW",
    "OR", "PAIR", "PUSH", "RIGHT", "SIZE", "SOME", "SOURCE", "SENDER", "SELF", "STEPS_TO_QUOTA", "SUB", "SWAP",
    "TRANSFER_TOKENS", "SET_DELEGATE", "UNIT", "UPDATE", "XOR", "ITER", "LOOP_LEFT", "ADDRESS", "CONTRACT",
    "ISNAT", "CAST", "RENAME", "bool", "contract", "int", "key", "key_hash", "lambda", "list", "map", "big_map",
    "nat", "option", "or", "pair", "set", "signature", "string", "bytes", "mutez", "timestamp", "unit",
    "operation", "address", "SLICE", "DIG", "DUG", "EMPTY_BIG_MAP", "APPLY", "chain_id", "CHAIN_ID", "LEVEL",
    "SELF_ADDRESS", "never", "NEVER", "UNPAIR", "VOTING_POWER", "TOTAL_VOTING_POWER", "KECCAK", "SHA3",
    "PAIRING_CHECK", "bls12_381_g1", "bls12_381_g2", "bls12_381_fr", "sapling_state",
    "sapling_transaction_deprecated", "SAPLING_EMPTY_STATE", "SAPLING_VERIFY_UPDATE", "ticket",
    "TICKET_DEPRECATED", "READ_TICKET", "SPLIT_TICKET", "JOIN_TICKETS", "GET_AND_UPDATE", "chest", "chest_key",
    "OPEN_CHEST", "VIEW", "view", "constant", "SUB_MUTEZ", "tx_rollup_l2_address", "MIN_BLOCK_TIME",
    "sapling_transaction", "EMIT", "Lambda_rec", "LAMBDA_REC", "TICKET", "BYTES", "NAT",
];

pub(crate) fn wire_prim(tag: u8) -> Option<&'static str> { WIRE_PRIMS.get(tag as usize).copied() }

pub(crate) fn wire_tag(prim: &str) -> Option<u8> {
    WIRE_PRIMS
        .iter()
        .position(|name| *name == prim)
        .and_then(|pos| u8::try_from(pos).ok())
}

#[cfg(test)]
mod test {
    #![cfg_attr(coverage_nightly, coverage(off))]
    use super::*;

    #[test]
    fn names_roundtrip() {
        for prim in TypePrim::ALL {
            assert_eq!(TypePrim::from_str(&prim.to_string()), Ok(prim));
        }
        assert_eq!(TypePrim::from_str("pear"), Err(UnknownPrim(s!("pear"))));
    }

    #[test]
    fn serde_names_match_display() {
        for prim in TypePrim::ALL {
            assert_eq!(serde_json::to_value(prim).unwrap(), serde_json::Value::String(prim.to_string()));
        }
    }

    #[test]
    fn wire_table() {
        assert_eq!(wire_prim(0x07), Some("Pair"));
        assert_eq!(wire_prim(0x65), Some("pair"));
        assert_eq!(wire_prim(0x9C), Some("NAT"));
        assert_eq!(wire_prim(0x9D), None);
        assert_eq!(wire_tag("big_map"), Some(0x61));
        assert_eq!(wire_tag("tx_rollup_l2_address"), Some(0x94));
    }
}
