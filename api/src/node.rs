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

use core::fmt::{self, Display, Formatter};

use micheline::{BigInt, TypePrim};

use crate::{BinPath, NodeMeta, Shape};

/// Separator joining the parts of a composite map key display.
pub const KEY_SEPARATOR: &str = "@";

/// Primitive value of a decoded leaf.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scalar {
    Int(#[serde(with = "bigint_dec")] BigInt),
    Text(String),
    Bool(bool),
    Unit,
}

impl Display for Scalar {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Int(val) => Display::fmt(val, f),
            Scalar::Text(val) => f.write_str(val),
            Scalar::Bool(val) => Display::fmt(val, f),
            Scalar::Unit => f.write_str("Unit"),
        }
    }
}

impl From<i64> for Scalar {
    fn from(val: i64) -> Self { Scalar::Int(val.into()) }
}

impl From<&str> for Scalar {
    fn from(val: &str) -> Self { Scalar::Text(val.to_owned()) }
}

impl From<bool> for Scalar {
    fn from(val: bool) -> Self { Scalar::Bool(val) }
}

/// Change of a node between two decoded versions of a value.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Display)]
#[derive(Serialize, Deserialize)]
#[display(lowercase)]
#[serde(rename_all = "lowercase")]
pub enum DiffKind {
    Created,
    Updated,
    Deleted,
}

/// Node of a decoded value tree.
#[derive(Clone, Eq, PartialEq, Debug)]
#[derive(Serialize, Deserialize)]
pub struct Node {
    pub prim: TypePrim,
    pub shape: Shape,
    pub path: BinPath,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Scalar>,
    /// Decoded key of a map entry; present only on the value nodes of map and big map entries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<Box<Node>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Node>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diff: Option<DiffKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_value: Option<Scalar>,
}

impl Node {
    pub(crate) fn new(path: &BinPath, meta: &NodeMeta) -> Self {
        Node {
            prim: meta.prim,
            shape: meta.shape,
            path: path.clone(),
            name: meta.display_name.clone(),
            value: None,
            key: None,
            children: vec![],
            diff: None,
            previous_value: None,
        }
    }

    pub(crate) fn with_value(mut self, value: Scalar) -> Self {
        self.value = Some(value);
        self
    }

    pub fn is_leaf(&self) -> bool { self.children.is_empty() && self.value.is_some() }

    /// Text form of the node used as a map key label.
    ///
    /// Composite values join the displays of their children with [`KEY_SEPARATOR`]; distinct
    /// composite keys may therefore share the same display.
    pub fn display(&self) -> String {
        if let Some(value) = &self.value {
            return value.to_string();
        }
        if self.shape == Shape::Option && self.children.is_empty() {
            return s!("None");
        }
        self.children
            .iter()
            .map(Node::display)
            .collect::<Vec<_>>()
            .join(KEY_SEPARATOR)
    }

    /// All scalar leaves of the tree in depth-first order, including map keys.
    pub fn leaves(&self) -> Vec<(&BinPath, &Scalar)> {
        let mut leaves = vec![];
        self.collect_leaves(&mut leaves);
        leaves
    }

    fn collect_leaves<'n>(&'n self, leaves: &mut Vec<(&'n BinPath, &'n Scalar)>) {
        if let Some(key) = &self.key {
            key.collect_leaves(leaves);
        }
        match &self.value {
            Some(value) if self.children.is_empty() => leaves.push((&self.path, value)),
            _ => self.children.iter().for_each(|child| child.collect_leaves(leaves)),
        }
    }

    /// Nodes of the tree located at the given path.
    pub fn find(&self, path: &BinPath) -> Vec<&Node> {
        let mut found = vec![];
        self.visit(&mut |node| {
            if &node.path == path {
                found.push(node)
            }
        });
        found
    }

    /// Child with the given name.
    pub fn child(&self, name: &str) -> Option<&Node> {
        self.children
            .iter()
            .find(|child| child.name.as_deref() == Some(name))
    }

    /// Whether the node or any of its descendants carry a diff mark.
    pub fn has_changes(&self) -> bool {
        self.diff.is_some() || self.children.iter().any(Node::has_changes)
    }

    /// Topmost nodes carrying a diff mark.
    pub fn changes(&self) -> Vec<&Node> {
        if self.diff.is_some() {
            return vec![self];
        }
        self.children.iter().flat_map(Node::changes).collect()
    }

    pub(crate) fn mark(&mut self, kind: DiffKind) {
        self.diff = Some(kind);
        self.previous_value = None;
        self.children.iter_mut().for_each(|child| child.mark(kind));
    }

    fn visit<'n>(&'n self, f: &mut impl FnMut(&'n Node)) {
        f(self);
        if let Some(key) = &self.key {
            key.visit(f);
        }
        self.children.iter().for_each(|child| child.visit(f));
    }
}

mod bigint_dec {
    use std::str::FromStr;

    use micheline::BigInt;
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(val: &BigInt, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(val)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<BigInt, D::Error> {
        let s = String::deserialize(deserializer)?;
        BigInt::from_str(&s).map_err(D::Error::custom)
    }
}
