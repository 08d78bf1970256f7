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

use micheline::TypePrim;

/// Structural classification of a type node, selecting how values at the node are decoded and
/// encoded.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Display)]
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Shape {
    /// Pair whose flattened children are not all uniquely named.
    #[display("tuple")]
    Tuple,
    /// Pair whose flattened children all carry distinct names.
    #[display("named_tuple")]
    NamedTuple,
    /// Or with all variants being `unit` and some variant lacking a unique name.
    #[display("enum")]
    Enum,
    /// Or with all variants being uniquely named `unit`s.
    #[display("named_enum")]
    NamedEnum,
    #[display("union")]
    Union,
    #[display("named_union")]
    NamedUnion,
    #[display("list")]
    List,
    #[display("set")]
    Set,
    #[display("map")]
    Map,
    #[display("big_map")]
    BigMap,
    #[display("option")]
    Option,
    #[display("leaf")]
    Leaf,
}

impl Shape {
    /// Shape of a node which is neither a pair nor an or.
    pub fn of_prim(prim: TypePrim) -> Self {
        match prim {
            TypePrim::List => Shape::List,
            TypePrim::Set => Shape::Set,
            TypePrim::Map => Shape::Map,
            TypePrim::BigMap => Shape::BigMap,
            TypePrim::Option => Shape::Option,
            _ => Shape::Leaf,
        }
    }

    /// Shape of a pair given the keys of its flattened children.
    pub fn of_pair<'k>(keys: impl IntoIterator<Item = Option<&'k str>>) -> Self {
        if all_named(keys) {
            Shape::NamedTuple
        } else {
            Shape::Tuple
        }
    }

    /// Shape of an or given the keys of its flattened branches and whether all of them are
    /// `unit`.
    pub fn of_or<'k>(keys: impl IntoIterator<Item = Option<&'k str>>, all_unit: bool) -> Self {
        match (all_named(keys), all_unit) {
            (true, true) => Shape::NamedEnum,
            (false, true) => Shape::Enum,
            (true, false) => Shape::NamedUnion,
            (false, false) => Shape::Union,
        }
    }

    pub fn is_tuple(self) -> bool { matches!(self, Shape::Tuple | Shape::NamedTuple) }

    pub fn is_variant(self) -> bool {
        matches!(self, Shape::Enum | Shape::NamedEnum | Shape::Union | Shape::NamedUnion)
    }

    pub fn is_enum(self) -> bool { matches!(self, Shape::Enum | Shape::NamedEnum) }

    /// Whether children of the node carry their own names.
    pub fn is_named(self) -> bool {
        matches!(self, Shape::NamedTuple | Shape::NamedEnum | Shape::NamedUnion)
    }

    pub fn is_collection(self) -> bool { matches!(self, Shape::List | Shape::Set) }

    pub fn is_mapping(self) -> bool { matches!(self, Shape::Map | Shape::BigMap) }
}

fn all_named<'k>(keys: impl IntoIterator<Item = Option<&'k str>>) -> bool {
    let mut seen = Vec::<&str>::new();
    for key in keys {
        match key {
            Some(key) if !seen.contains(&key) => seen.push(key),
            _ => return false,
        }
    }
    !seen.is_empty()
}

#[cfg(test)]
mod test {
    #![cfg_attr(coverage_nightly, coverage(off))]
    use super::*;

    #[test]
    fn pairs() {
        assert_eq!(Shape::of_pair([Some("a"), Some("b")]), Shape::NamedTuple);
        assert_eq!(Shape::of_pair([Some("a"), None]), Shape::Tuple);
        assert_eq!(Shape::of_pair([Some("a"), Some("a")]), Shape::Tuple);
        assert_eq!(Shape::of_pair([]), Shape::Tuple);
    }

    #[test]
    fn ors() {
        assert_eq!(Shape::of_or([Some("a"), Some("b")], true), Shape::NamedEnum);
        assert_eq!(Shape::of_or([Some("a"), None], true), Shape::Enum);
        assert_eq!(Shape::of_or([Some("a"), Some("b")], false), Shape::NamedUnion);
        assert_eq!(Shape::of_or([Some("x"), Some("x")], false), Shape::Union);
    }

    #[test]
    fn prims() {
        assert_eq!(Shape::of_prim(TypePrim::BigMap), Shape::BigMap);
        assert_eq!(Shape::of_prim(TypePrim::Option), Shape::Option);
        assert_eq!(Shape::of_prim(TypePrim::Lambda), Shape::Leaf);
        assert_eq!(Shape::of_prim(TypePrim::Nat), Shape::Leaf);
    }

    #[test]
    fn serde() {
        assert_eq!(serde_json::to_string(&Shape::NamedTuple).unwrap(), "\"named_tuple\"");
        assert_eq!(serde_json::from_str::<Shape>("\"big_map\"").unwrap(), Shape::BigMap);
        assert_eq!(Shape::BigMap.to_string(), "big_map");
    }
}
