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

//! Human-readable base58check forms of addresses, keys, signatures and chain ids.
//!
//! Values of these types may arrive either as strings already in the canonical form, or in the
//! optimized binary form (`bytes` node). The [`Base58Codec`] converts the latter into the former
//! and validates user-supplied strings.

use crate::TypePrim;

/// Kinds of base58-encoded literals.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Display)]
#[display(lowercase)]
pub enum Base58Tag {
    Address,
    KeyHash,
    Key,
    Signature,
    ChainId,
    TxRollupL2Address,
}

impl Base58Tag {
    /// Tag used by the values of a given type, if the type has a base58 form.
    pub fn for_prim(prim: TypePrim) -> Option<Self> {
        Some(match prim {
            TypePrim::Address | TypePrim::Contract => Base58Tag::Address,
            TypePrim::KeyHash => Base58Tag::KeyHash,
            TypePrim::Key => Base58Tag::Key,
            TypePrim::Signature => Base58Tag::Signature,
            TypePrim::ChainId => Base58Tag::ChainId,
            TypePrim::TxRollupL2Address => Base58Tag::TxRollupL2Address,
            _ => return None,
        })
    }
}

#[derive(Clone, Eq, PartialEq, Debug, Display, Error)]
pub enum Base58Error {
    #[display("{0} payload of {1} bytes has no known base58 form")]
    UnknownPayload(Base58Tag, usize),

    #[display("'{1}' is not a valid {0}")]
    UnknownPrefix(Base58Tag, String),

    #[display("invalid base58check string '{0}'")]
    InvalidEncoding(String),

    #[display("address entrypoint is not a valid UTF-8 string")]
    InvalidEntrypoint,
}

/// Converter between binary and base58check forms.
pub trait Base58Codec {
    /// Produces the canonical string for a binary-encoded value.
    fn encode(&self, tag: Base58Tag, payload: &[u8]) -> Result<String, Base58Error>;

    /// Checks that a string is a well-formed value of a given kind.
    fn validate(&self, tag: Base58Tag, text: &str) -> Result<(), Base58Error>;
}

/// Base58check codec using Tezos prefixes.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
pub struct TezosBase58;

const TZ1: &[u8] = &[6, 161, 159];
const TZ2: &[u8] = &[6, 161, 161];
const TZ3: &[u8] = &[6, 161, 164];
const TZ4: &[u8] = &[6, 161, 166];
const KT1: &[u8] = &[2, 90, 121];
const TXR1: &[u8] = &[1, 128, 120, 31];
const SR1: &[u8] = &[6, 124, 117];
const EDPK: &[u8] = &[13, 15, 37, 217];
const SPPK: &[u8] = &[3, 254, 226, 86];
const P2PK: &[u8] = &[3, 178, 139, 127];
const BLPK: &[u8] = &[6, 149, 135, 204];
const SIG: &[u8] = &[4, 130, 43];
const EDSIG: &[u8] = &[9, 245, 205, 134, 18];
const SPSIG1: &[u8] = &[13, 115, 101, 19, 63];
const P2SIG: &[u8] = &[54, 240, 44, 52];
const BLSIG: &[u8] = &[40, 171, 64, 207];
const NET: &[u8] = &[87, 82, 0];

const HASH_LEN: usize = 20;

/// Accepted (prefix, payload length) combinations for string literals of each kind.
fn accepted(tag: Base58Tag) -> &'static [(&'static [u8], usize)] {
    match tag {
        Base58Tag::Address => &[
            (TZ1, HASH_LEN),
            (TZ2, HASH_LEN),
            (TZ3, HASH_LEN),
            (TZ4, HASH_LEN),
            (KT1, HASH_LEN),
            (TXR1, HASH_LEN),
            (SR1, HASH_LEN),
        ],
        Base58Tag::KeyHash => &[(TZ1, HASH_LEN), (TZ2, HASH_LEN), (TZ3, HASH_LEN), (TZ4, HASH_LEN)],
        Base58Tag::Key => &[(EDPK, 32), (SPPK, 33), (P2PK, 33), (BLPK, 48)],
        Base58Tag::Signature => &[(SIG, 64), (EDSIG, 64), (SPSIG1, 64), (P2SIG, 64), (BLSIG, 96)],
        Base58Tag::ChainId => &[(NET, 4)],
        Base58Tag::TxRollupL2Address => &[(TZ4, HASH_LEN)],
    }
}

fn check_encode(prefix: &[u8], payload: &[u8]) -> String {
    let mut data = Vec::with_capacity(prefix.len() + payload.len());
    data.extend_from_slice(prefix);
    data.extend_from_slice(payload);
    bs58::encode(data).with_check().into_string()
}

fn implicit_prefix(curve: u8) -> Option<&'static [u8]> {
    Some(match curve {
        0 => TZ1,
        1 => TZ2,
        2 => TZ3,
        3 => TZ4,
        _ => return None,
    })
}

impl Base58Codec for TezosBase58 {
    fn encode(&self, tag: Base58Tag, payload: &[u8]) -> Result<String, Base58Error> {
        let unknown = || Base58Error::UnknownPayload(tag, payload.len());
        match tag {
            Base58Tag::Address => {
                if payload.len() < 22 {
                    return Err(unknown());
                }
                let (addr, entrypoint) = payload.split_at(22);
                let mut s = match addr[0] {
                    0x00 => check_encode(implicit_prefix(addr[1]).ok_or_else(unknown)?, &addr[2..]),
                    0x01 => check_encode(KT1, &addr[1..21]),
                    0x02 => check_encode(TXR1, &addr[1..21]),
                    0x03 => check_encode(SR1, &addr[1..21]),
                    _ => return Err(unknown()),
                };
                if !entrypoint.is_empty() {
                    let entrypoint = core::str::from_utf8(entrypoint).map_err(|_| Base58Error::InvalidEntrypoint)?;
                    s.push('%');
                    s.push_str(entrypoint);
                }
                Ok(s)
            }
            Base58Tag::KeyHash if payload.len() == HASH_LEN + 1 => {
                Ok(check_encode(implicit_prefix(payload[0]).ok_or_else(unknown)?, &payload[1..]))
            }
            Base58Tag::Key if !payload.is_empty() => {
                let (curve, key) = payload.split_at(1);
                let prefix = match (curve[0], key.len()) {
                    (0, 32) => EDPK,
                    (1, 33) => SPPK,
                    (2, 33) => P2PK,
                    (3, 48) => BLPK,
                    _ => return Err(unknown()),
                };
                Ok(check_encode(prefix, key))
            }
            Base58Tag::Signature if payload.len() == 64 => Ok(check_encode(SIG, payload)),
            Base58Tag::Signature if payload.len() == 96 => Ok(check_encode(BLSIG, payload)),
            Base58Tag::ChainId if payload.len() == 4 => Ok(check_encode(NET, payload)),
            Base58Tag::TxRollupL2Address if payload.len() == HASH_LEN => Ok(check_encode(TZ4, payload)),
            _ => Err(unknown()),
        }
    }

    fn validate(&self, tag: Base58Tag, text: &str) -> Result<(), Base58Error> {
        let body = match tag {
            Base58Tag::Address => text.split_once('%').map_or(text, |(addr, _)| addr),
            _ => text,
        };
        let data = bs58::decode(body)
            .with_check(None)
            .into_vec()
            .map_err(|_| Base58Error::InvalidEncoding(text.to_owned()))?;
        accepted(tag)
            .iter()
            .any(|(prefix, len)| data.len() == prefix.len() + len && data.starts_with(prefix))
            .then_some(())
            .ok_or_else(|| Base58Error::UnknownPrefix(tag, text.to_owned()))
    }
}
