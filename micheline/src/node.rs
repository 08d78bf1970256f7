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

use core::fmt::{self, Display, Formatter, Write};
use core::str::FromStr;
use std::borrow::Cow;

use num_bigint::BigInt;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::{data, Annotations};

/// A Micheline tree node.
///
/// The same structure is used for types (`pair nat string`), values (`Pair 12 "a"`) and code.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
#[derive(Deserialize)]
#[serde(try_from = "RawMicheline")]
pub enum Micheline {
    Int(BigInt),
    String(String),
    Bytes(Vec<u8>),
    Prim(PrimNode),
    Seq(Vec<Micheline>),
}

/// Application of a primitive to its arguments.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct PrimNode {
    pub prim: String,
    pub args: Vec<Micheline>,
    pub annots: Vec<String>,
}

impl PrimNode {
    pub fn new(prim: impl Into<String>, args: impl IntoIterator<Item = Micheline>) -> Self {
        Self { prim: prim.into(), args: args.into_iter().collect(), annots: vec![] }
    }

    pub fn with_annots(mut self, annots: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.annots = annots.into_iter().map(Into::into).collect();
        self
    }
}

impl From<PrimNode> for Micheline {
    fn from(prim: PrimNode) -> Self { Micheline::Prim(prim) }
}

impl Micheline {
    pub fn int(val: impl Into<BigInt>) -> Self { Micheline::Int(val.into()) }
    pub fn string(val: impl Into<String>) -> Self { Micheline::String(val.into()) }
    pub fn bytes(val: impl Into<Vec<u8>>) -> Self { Micheline::Bytes(val.into()) }
    pub fn seq(items: impl IntoIterator<Item = Micheline>) -> Self { Micheline::Seq(items.into_iter().collect()) }

    pub fn prim(name: impl Into<String>, args: impl IntoIterator<Item = Micheline>) -> Self {
        Micheline::Prim(PrimNode::new(name, args))
    }

    pub fn unit() -> Self { Self::prim(data::UNIT, []) }
    pub fn none() -> Self { Self::prim(data::NONE, []) }
    pub fn some(val: Micheline) -> Self { Self::prim(data::SOME, [val]) }
    pub fn left(val: Micheline) -> Self { Self::prim(data::LEFT, [val]) }
    pub fn right(val: Micheline) -> Self { Self::prim(data::RIGHT, [val]) }
    pub fn pair(a: Micheline, b: Micheline) -> Self { Self::prim(data::PAIR, [a, b]) }
    pub fn elt(key: Micheline, val: Micheline) -> Self { Self::prim(data::ELT, [key, val]) }
    pub fn bool(val: bool) -> Self { Self::prim(if val { data::TRUE } else { data::FALSE }, []) }

    /// Parses Micheline from its JSON form.
    pub fn from_json_str(s: &str) -> Result<Self, serde_json::Error> { serde_json::from_str(s) }

    /// Converts a generic JSON value into Micheline.
    pub fn from_json(json: serde_json::Value) -> Result<Self, serde_json::Error> { serde_json::from_value(json) }

    /// Produces the JSON form of the tree.
    pub fn to_json(&self) -> serde_json::Value {
        // Serialization into `serde_json::Value` can't fail: all map keys are strings.
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    pub fn prim_name(&self) -> Option<&str> {
        match self {
            Micheline::Prim(prim) => Some(prim.prim.as_str()),
            _ => None,
        }
    }

    pub fn is_prim(&self, name: &str) -> bool { self.prim_name() == Some(name) }

    /// Arguments of a primitive application; empty for all other nodes.
    pub fn args(&self) -> &[Micheline] {
        match self {
            Micheline::Prim(prim) => &prim.args,
            _ => &[],
        }
    }

    pub fn arg(&self, pos: usize) -> Option<&Micheline> { self.args().get(pos) }

    pub fn raw_annots(&self) -> &[String] {
        match self {
            Micheline::Prim(prim) => &prim.annots,
            _ => &[],
        }
    }

    pub fn annotations(&self) -> Annotations { Annotations::parse(self.raw_annots().iter().map(String::as_str)) }

    pub fn as_int(&self) -> Option<&BigInt> {
        match self {
            Micheline::Int(val) => Some(val),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Micheline::String(val) => Some(val.as_str()),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Micheline::Bytes(val) => Some(val.as_slice()),
            _ => None,
        }
    }

    pub fn as_seq(&self) -> Option<&[Micheline]> {
        match self {
            Micheline::Seq(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    /// Splits a pair value into its two branches, normalizing right combs.
    ///
    /// Besides the binary `Pair a b` form, accepts an n-ary `Pair a b c ...` and a sequence
    /// `{a; b; c ...}` of two or more elements, both of which denote a right-nested comb
    /// `Pair a (Pair b (c ...))`. Returns `None` for any other node.
    pub fn unpair(&self) -> Option<(Cow<'_, Micheline>, Cow<'_, Micheline>)> {
        let (first, rest, seq) = match self {
            Micheline::Prim(prim) if prim.prim == data::PAIR && prim.args.len() >= 2 => {
                (&prim.args[0], &prim.args[1..], false)
            }
            Micheline::Seq(items) if items.len() >= 2 => (&items[0], &items[1..], true),
            _ => return None,
        };
        let second = match rest {
            [single] => Cow::Borrowed(single),
            _ if seq => Cow::Owned(Micheline::Seq(rest.to_vec())),
            _ => Cow::Owned(Micheline::prim(data::PAIR, rest.iter().cloned())),
        };
        Some((Cow::Borrowed(first), second))
    }

    /// Counts nodes in the tree.
    pub fn size(&self) -> usize {
        match self {
            Micheline::Prim(prim) => 1 + prim.args.iter().map(Micheline::size).sum::<usize>(),
            Micheline::Seq(items) => 1 + items.iter().map(Micheline::size).sum::<usize>(),
            _ => 1,
        }
    }

    fn fmt_nested(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Micheline::Prim(prim) if !prim.args.is_empty() || !prim.annots.is_empty() => write!(f, "({self})"),
            _ => Display::fmt(self, f),
        }
    }
}

impl Display for Micheline {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Micheline::Int(val) => write!(f, "{val}"),
            Micheline::String(val) => {
                f.write_char('"')?;
                for c in val.chars() {
                    match c {
                        '"' => f.write_str("\\\"")?,
                        '\\' => f.write_str("\\\\")?,
                        '\n' => f.write_str("\\n")?,
                        '\r' => f.write_str("\\r")?,
                        '\t' => f.write_str("\\t")?,
                        c => f.write_char(c)?,
                    }
                }
                f.write_char('"')
            }
            Micheline::Bytes(val) => write!(f, "0x{}", hex::encode(val)),
            Micheline::Prim(prim) => {
                f.write_str(&prim.prim)?;
                for annot in &prim.annots {
                    write!(f, " {annot}")?;
                }
                for arg in &prim.args {
                    f.write_char(' ')?;
                    arg.fmt_nested(f)?;
                }
                Ok(())
            }
            Micheline::Seq(items) if items.is_empty() => f.write_str("{}"),
            Micheline::Seq(items) => {
                f.write_str("{ ")?;
                for (no, item) in items.iter().enumerate() {
                    if no > 0 {
                        f.write_str(" ; ")?;
                    }
                    Display::fmt(item, f)?;
                }
                f.write_str(" }")
            }
        }
    }
}

impl Serialize for Micheline {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Micheline::Int(val) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("int", &val.to_string())?;
                map.end()
            }
            Micheline::String(val) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("string", val)?;
                map.end()
            }
            Micheline::Bytes(val) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("bytes", &hex::encode(val))?;
                map.end()
            }
            Micheline::Prim(prim) => {
                let len = 1 + usize::from(!prim.args.is_empty()) + usize::from(!prim.annots.is_empty());
                let mut map = serializer.serialize_map(Some(len))?;
                map.serialize_entry("prim", &prim.prim)?;
                if !prim.args.is_empty() {
                    map.serialize_entry("args", &prim.args)?;
                }
                if !prim.annots.is_empty() {
                    map.serialize_entry("annots", &prim.annots)?;
                }
                map.end()
            }
            Micheline::Seq(items) => serializer.collect_seq(items),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawMicheline {
    Seq(Vec<Micheline>),
    Int {
        int: String,
    },
    String {
        string: String,
    },
    Bytes {
        bytes: String,
    },
    Prim {
        prim: String,
        #[serde(default)]
        args: Vec<Micheline>,
        #[serde(default)]
        annots: Vec<String>,
    },
}

/// Errors in the JSON form of Micheline which are not detected by the JSON parser itself.
#[derive(Clone, Eq, PartialEq, Debug, Display, Error)]
pub enum JsonError {
    #[display("invalid Micheline integer literal '{0}'")]
    InvalidInt(String),

    #[display("invalid hex in Micheline bytes literal '{0}'")]
    InvalidBytes(String),
}

impl TryFrom<RawMicheline> for Micheline {
    type Error = JsonError;

    fn try_from(raw: RawMicheline) -> Result<Self, Self::Error> {
        Ok(match raw {
            RawMicheline::Seq(items) => Micheline::Seq(items),
            RawMicheline::Int { int } => {
                Micheline::Int(BigInt::from_str(&int).map_err(|_| JsonError::InvalidInt(int.clone()))?)
            }
            RawMicheline::String { string } => Micheline::String(string),
            RawMicheline::Bytes { bytes } => {
                Micheline::Bytes(hex::decode(&bytes).map_err(|_| JsonError::InvalidBytes(bytes.clone()))?)
            }
            RawMicheline::Prim { prim, args, annots } => Micheline::Prim(PrimNode { prim, args, annots }),
        })
    }
}

#[cfg(test)]
mod test {
    #![cfg_attr(coverage_nightly, coverage(off))]
    use serde_json::json;

    use super::*;

    #[test]
    fn json_roundtrip() {
        let json = json!({
            "prim": "Pair",
            "args": [{"int": "-42"}, [{"string": "a"}, {"bytes": "00ff"}]],
            "annots": ["%x"]
        });
        let node = Micheline::from_json(json.clone()).unwrap();
        assert_eq!(node.prim_name(), Some("Pair"));
        assert_eq!(node.arg(0).and_then(Micheline::as_int), Some(&BigInt::from(-42)));
        assert_eq!(node.arg(1).and_then(Micheline::as_seq).map(<[_]>::len), Some(2));
        assert_eq!(node.to_json(), json);
    }

    #[test]
    fn json_rejects_bad_literals() {
        assert!(Micheline::from_json(json!({"int": "12a"})).is_err());
        assert!(Micheline::from_json(json!({"bytes": "zz"})).is_err());
        assert!(Micheline::from_json(json!({"foo": "bar"})).is_err());
    }

    #[test]
    fn unpair_normalizes_combs() {
        let binary = Micheline::pair(Micheline::int(1), Micheline::int(2));
        let (a, b) = binary.unpair().unwrap();
        assert_eq!(*a, Micheline::int(1));
        assert_eq!(*b, Micheline::int(2));

        let nary = Micheline::prim("Pair", [Micheline::int(1), Micheline::int(2), Micheline::int(3)]);
        let (a, b) = nary.unpair().unwrap();
        assert_eq!(*a, Micheline::int(1));
        assert_eq!(*b, Micheline::pair(Micheline::int(2), Micheline::int(3)));

        let seq = Micheline::seq([Micheline::int(1), Micheline::int(2), Micheline::int(3)]);
        let (a, b) = seq.unpair().unwrap();
        assert_eq!(*a, Micheline::int(1));
        let (b, c) = b.unpair().unwrap();
        assert_eq!(*b, Micheline::int(2));
        assert_eq!(*c, Micheline::int(3));

        assert!(Micheline::int(1).unpair().is_none());
        assert!(Micheline::seq([Micheline::int(1)]).unpair().is_none());
    }

    #[test]
    fn display() {
        let node = Micheline::pair(
            Micheline::some(Micheline::string("a\"b")),
            Micheline::seq([Micheline::bytes(vec![0xca, 0xfe]), Micheline::unit()]),
        );
        assert_eq!(node.to_string(), r#"Pair (Some "a\"b") { 0xcafe ; Unit }"#);
    }
}
