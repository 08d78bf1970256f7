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

use chrono::{DateTime, SecondsFormat, Utc};
use micheline::{data, Base58Codec, Base58Tag, BigInt, Micheline, TezosBase58, TypePrim};

use crate::{BinPath, ErrorKind, MetaError, Metadata, Node, NodeMeta, PathStep, Scalar, Shape};

/// Decodes a raw value located at `path` of the metadata type tree.
pub fn decode(raw: &Micheline, path: &BinPath, meta: &Metadata) -> Result<Node, MetaError> { meta.decode_at(raw, path) }

impl Metadata {
    /// Decodes a raw value of the whole type tree.
    pub fn decode(&self, raw: &Micheline) -> Result<Node, MetaError> { Decoder::new(self).decode(raw, &BinPath::root()) }

    /// Decodes a raw value of the subtree at `path`.
    pub fn decode_at(&self, raw: &Micheline, path: &BinPath) -> Result<Node, MetaError> {
        Decoder::new(self).decode(raw, path)
    }
}

/// Metadata-driven converter of raw Micheline values into decoded [`Node`] trees.
#[derive(Clone, Debug)]
pub struct Decoder<'m, C: Base58Codec = TezosBase58> {
    meta: &'m Metadata,
    codec: C,
}

impl<'m> Decoder<'m, TezosBase58> {
    pub fn new(meta: &'m Metadata) -> Self { Decoder { meta, codec: TezosBase58 } }
}

impl<'m, C: Base58Codec> Decoder<'m, C> {
    pub fn with_codec(meta: &'m Metadata, codec: C) -> Self { Decoder { meta, codec } }

    /// Decodes a raw value located at `path`.
    ///
    /// # Errors
    ///
    /// Fails with [`ErrorKind::UnknownPath`] if the path is absent from the metadata, and with
    /// [`ErrorKind::ShapeMismatch`] if the raw value does not fit the type at some path.
    pub fn decode(&self, raw: &Micheline, path: &BinPath) -> Result<Node, MetaError> {
        let meta = self.meta.get(path)?;
        match meta.shape {
            Shape::Tuple | Shape::NamedTuple => self.tuple(raw, path, meta),
            Shape::Enum | Shape::NamedEnum | Shape::Union | Shape::NamedUnion => self.variant(raw, path, meta),
            Shape::List | Shape::Set => self.items(raw, path, meta),
            Shape::Map | Shape::BigMap => self.entries(raw, path, meta),
            Shape::Option => self.option(raw, path, meta),
            Shape::Leaf => self.leaf(raw, path, meta),
        }
    }

    fn tuple(&self, raw: &Micheline, path: &BinPath, meta: &NodeMeta) -> Result<Node, MetaError> {
        let mut node = Node::new(path, meta);
        for child_path in &meta.child_paths {
            let steps = child_path
                .steps_from(path)
                .ok_or_else(|| MetaError::unknown_path(child_path))?;
            let mut child = descend(raw, &steps, path, |sub| self.decode(sub, child_path))?;
            if meta.shape != Shape::NamedTuple {
                child.name = None;
            }
            node.children.push(child);
        }
        Ok(node)
    }

    fn variant(&self, raw: &Micheline, path: &BinPath, meta: &NodeMeta) -> Result<Node, MetaError> {
        let mut node = Node::new(path, meta);
        let mut steps = Vec::<PathStep>::new();
        let mut cur = raw;
        let child_path = loop {
            if let Some(child_path) = meta
                .child_paths
                .iter()
                .find(|p| p.steps_from(path).as_deref() == Some(steps.as_slice()))
            {
                break child_path;
            }
            let step = match (cur.prim_name(), cur.args()) {
                (Some(data::LEFT), [_]) => PathStep::Left,
                (Some(data::RIGHT), [_]) => PathStep::Right,
                _ => return Err(MetaError::mismatch(&path.join_all(steps), "Left or Right", cur)),
            };
            steps.push(step);
            cur = &cur.args()[0];
        };

        let mut child = self.decode(cur, child_path)?;
        if !meta.shape.is_named() {
            let index = steps
                .iter()
                .fold(0u64, |acc, step| (acc << 1) | (*step == PathStep::Right) as u64);
            child.name = Some(format!("value_{index}"));
        }
        if meta.shape.is_enum() {
            node.value = child.name.clone().map(Scalar::Text);
        }
        node.children.push(child);
        Ok(node)
    }

    fn items(&self, raw: &Micheline, path: &BinPath, meta: &NodeMeta) -> Result<Node, MetaError> {
        let mut node = Node::new(path, meta);
        let items = raw
            .as_seq()
            .ok_or_else(|| MetaError::mismatch(path, "sequence", raw))?;
        let child_path = meta
            .child_paths
            .first()
            .ok_or_else(|| MetaError::unknown_path(path))?;
        node.children = items
            .iter()
            .map(|item| self.decode(item, child_path))
            .collect::<Result<_, _>>()?;
        Ok(node)
    }

    fn entries(&self, raw: &Micheline, path: &BinPath, meta: &NodeMeta) -> Result<Node, MetaError> {
        let mut node = Node::new(path, meta);
        if let (Shape::BigMap, Micheline::Int(pointer)) = (meta.shape, raw) {
            node.value = Some(Scalar::Int(pointer.clone()));
            return Ok(node);
        }
        let entries = raw
            .as_seq()
            .ok_or_else(|| MetaError::mismatch(path, "sequence of Elt", raw))?;
        let key_path = path.join(PathStep::Key);
        let value_path = path.join(PathStep::Value);
        for entry in entries {
            let (Some(data::ELT), [key, value]) = (entry.prim_name(), entry.args()) else {
                return Err(MetaError::mismatch(path, "Elt", entry));
            };
            let key = self.decode(key, &key_path)?;
            let mut value = self.decode(value, &value_path)?;
            value.name = Some(key.display());
            value.key = Some(Box::new(key));
            node.children.push(value);
        }
        Ok(node)
    }

    fn option(&self, raw: &Micheline, path: &BinPath, meta: &NodeMeta) -> Result<Node, MetaError> {
        let mut node = Node::new(path, meta);
        match (raw.prim_name(), raw.args()) {
            (Some(data::NONE), []) => {}
            (Some(data::SOME), [payload]) => {
                let child = self.decode(payload, &path.join(PathStep::Some))?;
                node.children.push(child);
            }
            _ => return Err(MetaError::mismatch(path, "Some or None", raw)),
        }
        Ok(node)
    }

    fn leaf(&self, raw: &Micheline, path: &BinPath, meta: &NodeMeta) -> Result<Node, MetaError> {
        let node = Node::new(path, meta);
        let mismatch = || MetaError::mismatch(path, meta.prim, raw);

        if let Some(tag) = Base58Tag::for_prim(meta.prim) {
            let text = match raw {
                Micheline::String(text) => text.clone(),
                Micheline::Bytes(bytes) => self
                    .codec
                    .encode(tag, bytes)
                    .map_err(|err| MetaError::new(ErrorKind::Codec(err), path))?,
                _ => return Err(mismatch()),
            };
            return Ok(node.with_value(Scalar::Text(text)));
        }

        let value = match (meta.prim, raw) {
            (TypePrim::Int | TypePrim::Nat | TypePrim::Mutez, Micheline::Int(val)) => Scalar::Int(val.clone()),
            (TypePrim::Timestamp, Micheline::Int(val)) => timestamp(val),
            (TypePrim::Timestamp | TypePrim::String, Micheline::String(text)) => Scalar::Text(text.clone()),
            (
                TypePrim::Bytes
                | TypePrim::Bls12381G1
                | TypePrim::Bls12381G2
                | TypePrim::Bls12381Fr
                | TypePrim::SaplingTransaction
                | TypePrim::SaplingTransactionDeprecated
                | TypePrim::Chest
                | TypePrim::ChestKey
                | TypePrim::Operation,
                Micheline::Bytes(bytes),
            ) => Scalar::Text(hex::encode(bytes)),
            (TypePrim::Bls12381Fr | TypePrim::SaplingState, Micheline::Int(val)) => Scalar::Int(val.clone()),
            (TypePrim::Bool, _) if raw.is_prim(data::TRUE) => Scalar::Bool(true),
            (TypePrim::Bool, _) if raw.is_prim(data::FALSE) => Scalar::Bool(false),
            (TypePrim::Unit, _) if raw.is_prim(data::UNIT) => Scalar::Unit,
            (TypePrim::Lambda | TypePrim::Ticket | TypePrim::SaplingState, Micheline::Prim(_) | Micheline::Seq(_)) => {
                Scalar::Text(raw.to_string())
            }
            _ => return Err(mismatch()),
        };
        Ok(node.with_value(value))
    }
}

/// Seconds since the Unix epoch rendered as an RFC 3339 UTC timestamp; values outside of the
/// representable range are kept as integers.
fn timestamp(secs: &BigInt) -> Scalar {
    i64::try_from(secs)
        .ok()
        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
        .map(|ts| Scalar::Text(ts.to_rfc3339_opts(SecondsFormat::Secs, true)))
        .unwrap_or_else(|| Scalar::Int(secs.clone()))
}

/// Runs `f` on the sub-value reached by following pair branches from `raw`.
pub(crate) fn descend<R>(
    raw: &Micheline,
    steps: &[PathStep],
    at: &BinPath,
    f: impl FnOnce(&Micheline) -> Result<R, MetaError>,
) -> Result<R, MetaError> {
    let Some((step, rest)) = steps.split_first() else {
        return f(raw);
    };
    let (left, right) = raw
        .unpair()
        .ok_or_else(|| MetaError::mismatch(at, TypePrim::Pair, raw))?;
    let branch = if *step == PathStep::Left { left } else { right };
    descend(&branch, rest, &at.join(*step), f)
}

#[cfg(test)]
mod test {
    #![cfg_attr(coverage_nightly, coverage(off))]
    use serde_json::json;

    use super::*;
    use crate::meta::test::{path, ty};

    fn meta(json: serde_json::Value) -> Metadata { Metadata::build(&ty(json)).unwrap() }

    fn value(json: serde_json::Value) -> Micheline { Micheline::from_json(json).unwrap() }

    fn names(node: &Node) -> Vec<Option<&str>> { node.children.iter().map(|c| c.name.as_deref()).collect() }

    #[test]
    fn named_tuple() {
        let meta = meta(json!({"prim": "pair", "args": [
            {"prim": "address", "annots": ["%owner"]},
            {"prim": "nat", "annots": ["%total"]},
            {"prim": "timestamp", "annots": ["%since"]}
        ]}));
        let burn = vec![0u8; 22];
        let nary = Micheline::prim(data::PAIR, [
            Micheline::bytes(burn.clone()),
            Micheline::int(42),
            Micheline::int(1609459200),
        ]);
        let node = meta.decode(&nary).unwrap();
        assert_eq!(node.shape, Shape::NamedTuple);
        assert_eq!(names(&node), vec![Some("owner"), Some("total"), Some("since")]);
        assert_eq!(
            node.child("owner").unwrap().value,
            Some(Scalar::from("tz1Ke2h7sDdakHJQh8WX4Z372du1KChsksyU"))
        );
        assert_eq!(node.child("total").unwrap().value, Some(Scalar::from(42)));
        assert_eq!(node.child("since").unwrap().value, Some(Scalar::from("2021-01-01T00:00:00Z")));
        assert_eq!(node.child("since").unwrap().path, path("0/1/1"));

        let nested = Micheline::pair(
            Micheline::string("tz1Ke2h7sDdakHJQh8WX4Z372du1KChsksyU"),
            Micheline::pair(Micheline::int(42), Micheline::string("2021-01-01T00:00:00Z")),
        );
        let seq = Micheline::seq([
            Micheline::bytes(burn),
            Micheline::int(42),
            Micheline::string("2021-01-01T00:00:00Z"),
        ]);
        assert_eq!(meta.decode(&nested).unwrap(), node);
        assert_eq!(meta.decode(&seq).unwrap(), node);
    }

    #[test]
    fn anonymous_tuple() {
        let meta = meta(json!({"prim": "pair", "args": [{"prim": "int", "annots": ["%a"]}, {"prim": "bool"}]}));
        let node = meta
            .decode(&Micheline::pair(Micheline::int(-1), Micheline::bool(true)))
            .unwrap();
        assert_eq!(node.shape, Shape::Tuple);
        assert_eq!(names(&node), vec![None, None]);
        assert_eq!(node.children[1].value, Some(Scalar::Bool(true)));
    }

    #[test]
    fn unions() {
        let union = meta(json!({"prim": "or", "args": [
            {"prim": "nat"},
            {"prim": "or", "args": [{"prim": "string"}, {"prim": "bytes"}]}
        ]}));
        let node = union
            .decode(&value(json!({"prim": "Right", "args": [{"prim": "Left", "args": [{"string": "hi"}]}]})))
            .unwrap();
        assert_eq!(node.shape, Shape::Union);
        assert_eq!(node.value, None);
        assert_eq!(names(&node), vec![Some("value_2")]);
        assert_eq!(node.children[0].path, path("0/1/0"));
        assert_eq!(node.children[0].value, Some(Scalar::from("hi")));

        let node = union
            .decode(&value(json!({"prim": "Left", "args": [{"int": "5"}]})))
            .unwrap();
        assert_eq!(names(&node), vec![Some("value_0")]);

        let err = union.decode(&Micheline::int(5)).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::ShapeMismatch { .. }));
        assert_eq!(err.path, BinPath::root());

        let err = union
            .decode(&value(json!({"prim": "Right", "args": [{"int": "5"}]})))
            .unwrap_err();
        assert_eq!(err.path, path("0/1"));
    }

    #[test]
    fn enums() {
        let named = meta(json!({"prim": "or", "args": [
            {"prim": "unit", "annots": ["%open"]},
            {"prim": "or", "args": [{"prim": "unit", "annots": ["%closed"]}, {"prim": "unit", "annots": ["%paused"]}]}
        ]}));
        let node = named
            .decode(&Micheline::right(Micheline::right(Micheline::unit())))
            .unwrap();
        assert_eq!(node.shape, Shape::NamedEnum);
        assert_eq!(node.value, Some(Scalar::from("paused")));
        assert_eq!(node.children[0].value, Some(Scalar::Unit));

        let anonymous = meta(json!({"prim": "or", "args": [{"prim": "unit"}, {"prim": "unit"}]}));
        let node = anonymous
            .decode(&Micheline::right(Micheline::unit()))
            .unwrap();
        assert_eq!(node.value, Some(Scalar::from("value_1")));
    }

    #[test]
    fn maps() {
        let meta = meta(json!({"prim": "map", "args": [
            {"prim": "pair", "args": [{"prim": "string"}, {"prim": "nat"}]},
            {"prim": "bool"}
        ]}));
        let raw = Micheline::seq([
            Micheline::elt(Micheline::pair(Micheline::string("a"), Micheline::int(1)), Micheline::bool(true)),
            Micheline::elt(Micheline::pair(Micheline::string("b"), Micheline::int(2)), Micheline::bool(false)),
        ]);
        let node = meta.decode(&raw).unwrap();
        assert_eq!(names(&node), vec![Some("a@1"), Some("b@2")]);
        assert_eq!(node.children[0].path, path("0/v"));
        assert_eq!(node.children[1].key.as_ref().unwrap().path, path("0/k"));
        assert_eq!(node.leaves().len(), 6);

        let err = meta.decode(&Micheline::seq([Micheline::int(1)])).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::ShapeMismatch { .. }));
    }

    #[test]
    fn big_maps() {
        let meta = meta(json!({"prim": "big_map", "args": [{"prim": "address"}, {"prim": "nat"}]}));
        let node = meta.decode(&Micheline::int(17)).unwrap();
        assert_eq!(node.value, Some(Scalar::from(17)));
        assert!(node.children.is_empty());

        let node = meta
            .decode(&Micheline::seq([Micheline::elt(
                Micheline::string("tz1Ke2h7sDdakHJQh8WX4Z372du1KChsksyU"),
                Micheline::int(100),
            )]))
            .unwrap();
        assert_eq!(names(&node), vec![Some("tz1Ke2h7sDdakHJQh8WX4Z372du1KChsksyU")]);
    }

    #[test]
    fn options_and_lists() {
        let meta = meta(json!({"prim": "list", "args": [{"prim": "option", "args": [{"prim": "int"}]}]}));
        let raw = Micheline::seq([Micheline::none(), Micheline::some(Micheline::int(3))]);
        let node = meta.decode(&raw).unwrap();
        assert_eq!(node.children.len(), 2);
        assert!(node.children[0].children.is_empty());
        assert_eq!(node.children[0].value, None);
        assert_eq!(node.children[1].children[0].path, path("0/l/o"));
        assert_eq!(node.children[1].children[0].value, Some(Scalar::from(3)));
        assert_eq!(meta.decode(&Micheline::seq([])).unwrap().children.len(), 0);
    }

    #[test]
    fn leaves() {
        let meta = meta(json!({"prim": "pair", "args": [
            {"prim": "bytes"},
            {"prim": "lambda", "args": [{"prim": "unit"}, {"prim": "unit"}]},
            {"prim": "timestamp"},
            {"prim": "chain_id"}
        ]}));
        let raw = Micheline::seq([
            Micheline::bytes(vec![0xca, 0xfe]),
            Micheline::seq([Micheline::prim("DROP", []), Micheline::prim("UNIT", [])]),
            Micheline::int(BigInt::from(i64::MAX) * 4),
            Micheline::bytes(vec![0x7a, 0x06, 0xa7, 0x70]),
        ]);
        let node = meta.decode(&raw).unwrap();
        assert_eq!(node.children[0].value, Some(Scalar::from("cafe")));
        assert_eq!(node.children[1].value, Some(Scalar::from("{ DROP ; UNIT }")));
        assert_eq!(node.children[2].value, Some(Scalar::Int(BigInt::from(i64::MAX) * 4)));
        assert_eq!(node.children[3].value, Some(Scalar::from("NetXdQprcVkpaWU")));
    }

    #[test]
    fn codec_failure() {
        let meta = meta(json!({"prim": "key_hash"}));
        let err = meta.decode(&Micheline::bytes(vec![9u8; 21])).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::Codec(_)));
    }

    #[test]
    fn unknown_path() {
        let meta = meta(json!({"prim": "nat"}));
        let err = decode(&Micheline::int(1), &path("0/1"), &meta).unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnknownPath);
    }
}
