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

use crate::{BinPath, Metadata, PathStep};

/// Name of the entrypoint receiving the whole parameter value.
pub const DEFAULT_ENTRYPOINT: &str = "default";

/// Named entry into a parameter type.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
#[derive(Serialize, Deserialize)]
pub struct Entrypoint {
    pub name: String,
    pub path: BinPath,
    pub prim: TypePrim,
}

impl Metadata {
    /// Entrypoints of a parameter type.
    ///
    /// Every field-annotated node reachable from the root through `or` branches is an entrypoint.
    /// Unless one of them is named `default`, the root is listed first as the `default`
    /// entrypoint.
    pub fn entrypoints(&self) -> Vec<Entrypoint> {
        let mut entrypoints = vec![];
        let mut queue = vec![BinPath::root()];
        while let Some(path) = queue.pop() {
            let Ok(meta) = self.get(&path) else { continue };
            if let Some(name) = &meta.field_name {
                entrypoints.push(Entrypoint { name: name.clone(), path: path.clone(), prim: meta.prim });
            }
            if meta.prim == TypePrim::Or {
                queue.push(path.join(PathStep::Right));
                queue.push(path.join(PathStep::Left));
            }
        }
        if !entrypoints.iter().any(|e| e.name == DEFAULT_ENTRYPOINT) {
            if let Ok(root) = self.root() {
                entrypoints.insert(0, Entrypoint {
                    name: DEFAULT_ENTRYPOINT.to_owned(),
                    path: BinPath::root(),
                    prim: root.prim,
                });
            }
        }
        entrypoints
    }

    pub fn entrypoint(&self, name: &str) -> Option<Entrypoint> {
        self.entrypoints()
            .into_iter()
            .find(|entrypoint| entrypoint.name == name)
    }
}
