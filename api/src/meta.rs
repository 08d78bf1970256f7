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

use std::borrow::Cow;
use std::str::FromStr;

use indexmap::IndexMap;
use micheline::{Micheline, TypePrim};

use crate::error::describe;
use crate::{BinPath, ErrorKind, MetaError, PathStep, Shape};

/// Description of a single node of a type tree.
#[derive(Clone, Eq, PartialEq, Debug)]
#[derive(Serialize, Deserialize)]
pub struct NodeMeta {
    pub prim: TypePrim,
    pub shape: Shape,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
    /// Name used to label decoded values of the node.
    ///
    /// Equals to the field annotation, falling back to the type annotation. Unannotated `option`,
    /// `list` and `set` wrappers inherit the name of their payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Flattened children for pairs and ors; key and value for maps; the item for lists and sets.
    /// Options address their payload with the `o` step and list no children.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub child_paths: Vec<BinPath>,
    /// JSON of the parameter type of `contract`, `lambda` and `ticket` nodes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedded_type_json: Option<String>,
}

impl NodeMeta {
    fn new(prim: TypePrim, ty: &Micheline) -> Self {
        let annots = ty.annotations();
        NodeMeta {
            prim,
            shape: Shape::of_prim(prim),
            field_name: annots.field,
            type_name: annots.type_name,
            display_name: None,
            child_paths: vec![],
            embedded_type_json: None,
        }
    }

    pub fn is_annotated(&self) -> bool { self.field_name.is_some() || self.type_name.is_some() }

    /// Name the node carries from its own annotations.
    pub fn annotation(&self) -> Option<&str> { self.type_name.as_deref().or(self.field_name.as_deref()) }

    /// Key distinguishing the node among the flattened branches of its or. Unlike
    /// [`Self::annotation`] this includes the name inherited from an option, list or set payload.
    pub fn key(&self) -> Option<&str> {
        self.type_name
            .as_deref()
            .or(self.field_name.as_deref())
            .or(self.display_name.as_deref())
    }

    pub fn embedded_type(&self) -> Option<Result<Micheline, serde_json::Error>> {
        self.embedded_type_json
            .as_deref()
            .map(Micheline::from_json_str)
    }
}

/// Metadata map of a type tree, keyed by binary path in pre-order.
#[derive(Clone, Eq, PartialEq, Debug, Default)]
#[derive(Serialize, Deserialize)]
#[serde(transparent)]
pub struct Metadata(IndexMap<BinPath, NodeMeta>);

impl Metadata {
    /// Builds metadata for a type tree.
    ///
    /// Right combs are normalized: `pair a b c` and `pair a (pair b c)` produce identical maps.
    ///
    /// # Errors
    ///
    /// Fails on the first node which is not a known type primitive or has a wrong number of
    /// arguments; no partial metadata is returned.
    pub fn build(ty: &Micheline) -> Result<Self, MetaError> {
        let mut meta = Metadata::default();
        meta.add(ty, BinPath::root())?;
        Ok(meta)
    }

    fn add(&mut self, ty: &Micheline, path: BinPath) -> Result<(), MetaError> {
        let name = ty
            .prim_name()
            .ok_or_else(|| MetaError::new(ErrorKind::UnknownPrimitive(describe(ty)), &path))?;
        let prim = TypePrim::from_str(name)
            .map_err(|_| MetaError::new(ErrorKind::UnknownPrimitive(name.to_owned()), &path))?;
        let mut node = NodeMeta::new(prim, ty);
        // reserves the pre-order position of the node
        self.0.insert(path.clone(), node.clone());

        let args = ty.args();
        let mut inherited = None;
        match prim {
            TypePrim::Pair | TypePrim::Or => {
                let Some((first, rest)) = args.split_first().filter(|(_, rest)| !rest.is_empty()) else {
                    return Err(MetaError::mismatch(&path, format!("{prim} of two or more types"), ty));
                };
                let second = match rest {
                    [single] => Cow::Borrowed(single),
                    _ => Cow::Owned(Micheline::prim(name, rest.iter().cloned())),
                };
                let left = path.join(PathStep::Left);
                let right = path.join(PathStep::Right);
                self.add(first, left.clone())?;
                self.add(&second, right.clone())?;

                node.child_paths = self.flatten(prim, &left);
                node.child_paths.extend(self.flatten(prim, &right));
                let children = node
                    .child_paths
                    .iter()
                    .filter_map(|p| self.0.get(p))
                    .collect::<Vec<_>>();
                node.shape = if prim == TypePrim::Pair {
                    Shape::of_pair(children.iter().map(|child| child.annotation()))
                } else {
                    let all_unit = children.iter().all(|child| child.prim == TypePrim::Unit);
                    Shape::of_or(children.iter().map(|child| child.key()), all_unit)
                };
            }
            TypePrim::Option | TypePrim::List | TypePrim::Set => {
                let [payload] = args else {
                    return Err(MetaError::mismatch(&path, format!("{prim} of a single type"), ty));
                };
                let step = match prim {
                    TypePrim::Option => PathStep::Some,
                    TypePrim::List => PathStep::ListItem,
                    _ => PathStep::SetItem,
                };
                let child = path.join(step);
                self.add(payload, child.clone())?;
                inherited = self.0.get(&child).and_then(|meta| meta.display_name.clone());
                if prim != TypePrim::Option {
                    node.child_paths = vec![child];
                }
            }
            TypePrim::Map | TypePrim::BigMap => {
                let [key, value] = args else {
                    return Err(MetaError::mismatch(&path, format!("{prim} of key and value types"), ty));
                };
                let key_path = path.join(PathStep::Key);
                let value_path = path.join(PathStep::Value);
                self.add(key, key_path.clone())?;
                self.add(value, value_path.clone())?;
                node.child_paths = vec![key_path, value_path];
            }
            _ if prim.embeds_type() => {
                let embedded = match args {
                    [single] => single.to_json(),
                    _ => Micheline::seq(args.to_vec()).to_json(),
                };
                node.embedded_type_json = Some(embedded.to_string());
            }
            _ => {}
        }

        node.display_name = node
            .field_name
            .clone()
            .or_else(|| node.type_name.clone())
            .or(inherited);
        self.0.insert(path, node);
        Ok(())
    }

    /// Unannotated children of the same primitive are merged into their parent.
    fn flatten(&self, prim: TypePrim, path: &BinPath) -> Vec<BinPath> {
        match self.0.get(path) {
            Some(child) if child.prim == prim && !child.is_annotated() => child.child_paths.clone(),
            _ => vec![path.clone()],
        }
    }

    pub fn get(&self, path: &BinPath) -> Result<&NodeMeta, MetaError> {
        self.0.get(path).ok_or_else(|| MetaError::unknown_path(path))
    }

    pub fn root(&self) -> Result<&NodeMeta, MetaError> { self.get(&BinPath::root()) }

    pub fn contains(&self, path: &BinPath) -> bool { self.0.contains_key(path) }

    pub fn len(&self) -> usize { self.0.len() }

    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    pub fn iter(&self) -> impl Iterator<Item = (&BinPath, &NodeMeta)> { self.0.iter() }

    pub fn paths(&self) -> impl Iterator<Item = &BinPath> { self.0.keys() }

    /// Paths of all `big_map` nodes in pre-order.
    pub fn big_map_paths(&self) -> impl Iterator<Item = &BinPath> {
        self.0
            .iter()
            .filter(|(_, meta)| meta.shape == Shape::BigMap)
            .map(|(path, _)| path)
    }

    pub fn to_json_string(&self) -> Result<String, serde_json::Error> { serde_json::to_string_pretty(self) }

    pub fn from_json_str(s: &str) -> Result<Self, serde_json::Error> { serde_json::from_str(s) }
}
