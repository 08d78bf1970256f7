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

use std::collections::BTreeMap;

use micheline::{data, Micheline, TypePrim};

use crate::error::describe;
use crate::{BinPath, MetaError, Metadata, Node, PathStep};

/// Big map identifiers found in a storage value, mapped to the binary paths of their types.
pub type PointerMap = BTreeMap<i64, BinPath>;

/// Finds the identifiers of all big maps allocated in a storage value.
///
/// Big maps nested in lists, sets, map values, active `or` branches and `Some` options are all
/// resolved; inactive branches and `None` options are skipped.
///
/// # Errors
///
/// Fails with [`crate::ErrorKind::PointerResolution`] when a big map position holds anything but
/// an integer fitting into 64 bits, or when the storage value does not follow the storage type.
pub fn resolve_pointers(storage: &Micheline, meta: &Metadata) -> Result<PointerMap, MetaError> {
    let mut pointers = PointerMap::new();
    for path in meta.big_map_paths() {
        let steps = path.steps().collect::<Vec<_>>();
        let mut found = vec![];
        locate(storage, &BinPath::root(), &steps, meta, &mut found)?;
        for raw in found {
            let Micheline::Int(id) = &raw else {
                return Err(MetaError::pointer(path, format!("integer identifier expected, found {}", describe(&raw))));
            };
            let id = i64::try_from(id).map_err(|_| MetaError::pointer(path, format!("identifier {id} is out of range")))?;
            pointers.insert(id, path.clone());
        }
    }
    Ok(pointers)
}

fn locate(
    raw: &Micheline,
    at: &BinPath,
    steps: &[PathStep],
    meta: &Metadata,
    found: &mut Vec<Micheline>,
) -> Result<(), MetaError> {
    let Some((step, rest)) = steps.split_first() else {
        found.push(raw.clone());
        return Ok(());
    };
    let next = at.join(*step);
    let unexpected = |expected: &str| MetaError::pointer(at, format!("{expected} expected, found {}", describe(raw)));
    match (meta.get(at)?.prim, step) {
        (TypePrim::Pair, PathStep::Left | PathStep::Right) => {
            let (left, right) = raw.unpair().ok_or_else(|| unexpected("pair"))?;
            let branch = if *step == PathStep::Left { left } else { right };
            locate(&branch, &next, rest, meta, found)
        }
        (TypePrim::Or, PathStep::Left | PathStep::Right) => {
            let ctor = if *step == PathStep::Left { data::LEFT } else { data::RIGHT };
            match (raw.prim_name(), raw.args()) {
                (Some(name), [inner]) if name == ctor => locate(inner, &next, rest, meta, found),
                (Some(data::LEFT | data::RIGHT), [_]) => Ok(()),
                _ => Err(unexpected("Left or Right")),
            }
        }
        (TypePrim::Option, PathStep::Some) => match (raw.prim_name(), raw.args()) {
            (Some(data::SOME), [inner]) => locate(inner, &next, rest, meta, found),
            (Some(data::NONE), []) => Ok(()),
            _ => Err(unexpected("Some or None")),
        },
        (TypePrim::List, PathStep::ListItem) | (TypePrim::Set, PathStep::SetItem) => {
            let items = raw.as_seq().ok_or_else(|| unexpected("sequence"))?;
            items
                .iter()
                .try_for_each(|item| locate(item, &next, rest, meta, found))
        }
        (TypePrim::BigMap, _) if matches!(raw, Micheline::Int(_)) => Ok(()),
        (TypePrim::Map | TypePrim::BigMap, PathStep::Key | PathStep::Value) => {
            let entries = raw.as_seq().ok_or_else(|| unexpected("sequence of Elt"))?;
            entries.iter().try_for_each(|entry| match (entry.prim_name(), entry.args()) {
                (Some(data::ELT), [key, value]) => {
                    let inner = if *step == PathStep::Key { key } else { value };
                    locate(inner, &next, rest, meta, found)
                }
                _ => Err(MetaError::pointer(at, format!("Elt expected, found {}", describe(entry)))),
            })
        }
        _ => Err(MetaError::unknown_path(&next)),
    }
}

/// Single big map update as reported by the node alongside an operation result.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
#[derive(Serialize, Deserialize)]
pub struct BigMapDiff {
    pub pointer: i64,
    pub key_hash: String,
    pub key: Micheline,
    /// New value; absent when the key is removed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Micheline>,
}

/// Big map update decoded against the storage type.
#[derive(Clone, Eq, PartialEq, Debug)]
#[derive(Serialize, Deserialize)]
pub struct BigMapUpdate {
    pub pointer: i64,
    pub path: BinPath,
    pub key_hash: String,
    pub key: Node,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Node>,
}

/// Decodes a big map update using the storage type of the big map it belongs to.
///
/// Returns `None` when the pointer is not among the resolved ones, which is the case for big maps
/// of other contracts and temporary big maps.
pub fn attribute_diff(
    diff: &BigMapDiff,
    pointers: &PointerMap,
    meta: &Metadata,
) -> Result<Option<BigMapUpdate>, MetaError> {
    let Some(path) = pointers.get(&diff.pointer) else {
        return Ok(None);
    };
    let key = meta.decode_at(&diff.key, &path.join(PathStep::Key))?;
    let value = diff
        .value
        .as_ref()
        .map(|value| meta.decode_at(value, &path.join(PathStep::Value)))
        .transpose()?;
    Ok(Some(BigMapUpdate { pointer: diff.pointer, path: path.clone(), key_hash: diff.key_hash.clone(), key, value }))
}
