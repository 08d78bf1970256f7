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

use micheline::Micheline;
use tzindexapi::{attribute_diff, diff, BigMapDiff, BigMapUpdate, MetaError, Node, PointerMap};

use crate::ContractSchema;

/// Storage changes produced by a single operation.
#[derive(Clone, Eq, PartialEq, Debug)]
#[derive(Serialize, Deserialize)]
pub struct StorageChanges {
    /// Decoded new storage with diff marks against the previous storage.
    pub storage: Node,
    /// Big maps allocated in the new and the previous storage.
    pub pointers: PointerMap,
    /// Big map updates belonging to the contract, decoded against the storage type.
    pub big_maps: Vec<BigMapUpdate>,
}

impl StorageChanges {
    pub fn has_changes(&self) -> bool { self.storage.has_changes() || !self.big_maps.is_empty() }
}

impl ContractSchema {
    /// Decodes a storage update.
    ///
    /// Big map updates are attributed using pointers found in both storage versions, so updates of
    /// a big map removed by the operation are still decoded. Updates of foreign big maps are
    /// skipped.
    pub fn storage_changes(
        &self,
        current: &Micheline,
        previous: Option<&Micheline>,
        big_map_diffs: &[BigMapDiff],
    ) -> Result<StorageChanges, MetaError> {
        let tree = self.decode_storage(current)?;
        let mut pointers = PointerMap::new();
        let prev_tree = match previous {
            Some(previous) => {
                pointers = self.big_map_pointers(previous)?;
                Some(self.decode_storage(previous)?)
            }
            None => None,
        };
        pointers.extend(self.big_map_pointers(current)?);
        let storage = diff(&tree, prev_tree.as_ref());

        let mut big_maps = Vec::with_capacity(big_map_diffs.len());
        for big_map_diff in big_map_diffs {
            match attribute_diff(big_map_diff, &pointers, &self.storage)? {
                Some(update) => big_maps.push(update),
                None => debug!(
                    address = %self.address,
                    pointer = big_map_diff.pointer,
                    "skipping update of a big map not owned by the contract"
                ),
            }
        }
        trace!(
            address = %self.address,
            changed = storage.has_changes(),
            big_maps = big_maps.len(),
            "storage update decoded"
        );
        Ok(StorageChanges { storage, pointers, big_maps })
    }
}
