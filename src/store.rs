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
use std::convert::Infallible;

use crate::ContractSchema;

/// Identity of a schema: a contract address under a protocol.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Display)]
#[derive(Serialize, Deserialize)]
#[display("{address}@{protocol}")]
pub struct SchemaKey {
    pub address: String,
    pub protocol: String,
}

impl SchemaKey {
    pub fn new(address: impl Into<String>, protocol: impl Into<String>) -> Self {
        SchemaKey { address: address.into(), protocol: protocol.into() }
    }
}

/// Persistence of contract schemas.
///
/// Implementations are not required to be thread-safe; [`crate::Registry`] serializes all access
/// to the store.
pub trait SchemaStore {
    /// Configuration needed to open the store.
    type Conf;
    type Error: core::error::Error;

    /// Opens a store, creating it if needed.
    ///
    /// # Blocking I/O
    ///
    /// This call MAY perform any I/O operations.
    fn open(conf: Self::Conf) -> Result<Self, Self::Error>
    where Self: Sized;

    fn config(&self) -> Self::Conf;

    /// Loads a schema, returning `None` if the store has no schema for the key.
    fn load(&self, key: &SchemaKey) -> Result<Option<ContractSchema>, Self::Error>;

    /// Saves a schema under its key.
    fn save(&mut self, schema: &ContractSchema) -> Result<(), Self::Error>;

    /// Protocols for which the store has schemas of the contract, in lexicographic order.
    fn protocols(&self, address: &str) -> Result<Vec<String>, Self::Error>;

    /// Addresses of all contracts known to the store, in lexicographic order.
    fn addresses(&self) -> Result<Vec<String>, Self::Error>;
}

/// Non-persistent store keeping schemas in memory.
#[derive(Clone, Debug, Default)]
pub struct MemStore(BTreeMap<SchemaKey, ContractSchema>);

impl SchemaStore for MemStore {
    type Conf = ();
    type Error = Infallible;

    fn open(_: ()) -> Result<Self, Infallible> { Ok(none!()) }

    fn config(&self) -> Self::Conf {}

    fn load(&self, key: &SchemaKey) -> Result<Option<ContractSchema>, Infallible> { Ok(self.0.get(key).cloned()) }

    fn save(&mut self, schema: &ContractSchema) -> Result<(), Infallible> {
        self.0.insert(schema.key(), schema.clone());
        Ok(())
    }

    fn protocols(&self, address: &str) -> Result<Vec<String>, Infallible> {
        Ok(self
            .0
            .keys()
            .filter(|key| key.address == address)
            .map(|key| key.protocol.clone())
            .collect())
    }

    fn addresses(&self) -> Result<Vec<String>, Infallible> {
        let mut addresses = self
            .0
            .keys()
            .map(|key| key.address.clone())
            .collect::<Vec<_>>();
        addresses.dedup();
        Ok(addresses)
    }
}
