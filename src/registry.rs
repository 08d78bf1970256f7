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

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use amplify::MultiError;

use crate::{ContractSchema, ContractScript, SchemaError, SchemaKey, SchemaStore};

/// Shared registry of contract schemas backed by a persistent store.
///
/// Each `(address, protocol)` schema is built at most once and, after being published, is never
/// replaced: all readers receive the same immutable instance. Lookups of published schemas take a
/// read lock only; the store is consulted on cache misses.
#[derive(Debug)]
pub struct Registry<S: SchemaStore> {
    store: Mutex<S>,
    published: RwLock<HashMap<SchemaKey, Arc<ContractSchema>>>,
}

impl<S: SchemaStore> Registry<S> {
    pub fn with(store: S) -> Self { Registry { store: Mutex::new(store), published: none!() } }

    /// Opens the underlying store using the provided configuration.
    ///
    /// # Blocking I/O
    ///
    /// This call MAY perform any I/O operations.
    pub fn open(conf: S::Conf) -> Result<Self, S::Error> { S::open(conf).map(Self::with) }

    pub fn config(&self) -> S::Conf { self.store().config() }

    fn store(&self) -> MutexGuard<'_, S> { self.store.lock().unwrap_or_else(PoisonError::into_inner) }

    fn cached(&self, key: &SchemaKey) -> Option<Arc<ContractSchema>> {
        self.published
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// Publishes a schema unless another one is already published under the same key, returning
    /// the published instance.
    fn publish(&self, schema: ContractSchema) -> Arc<ContractSchema> {
        let mut published = self.published.write().unwrap_or_else(PoisonError::into_inner);
        published
            .entry(schema.key())
            .or_insert_with(|| Arc::new(schema))
            .clone()
    }

    /// Returns the schema of a contract under a protocol, loading it from the store if needed.
    pub fn schema(&self, address: &str, protocol: &str) -> Result<Option<Arc<ContractSchema>>, S::Error> {
        let key = SchemaKey::new(address, protocol);
        if let Some(schema) = self.cached(&key) {
            return Ok(Some(schema));
        }
        let Some(schema) = self.store().load(&key)? else {
            trace!(%key, "schema is not known");
            return Ok(None);
        };
        debug!(%key, "schema loaded from the store");
        Ok(Some(self.publish(schema)))
    }

    /// Registers the schema of a newly originated contract.
    ///
    /// If the schema is already known, it is returned without rebuilding.
    pub fn originate(
        &self,
        address: &str,
        protocol: &str,
        script: &ContractScript,
    ) -> Result<Arc<ContractSchema>, MultiError<SchemaError, S::Error>> {
        if let Some(schema) = self.schema(address, protocol).map_err(MultiError::B)? {
            return Ok(schema);
        }
        self.register(address, protocol, script)
    }

    /// Registers the schema of an existing contract under a new protocol.
    ///
    /// Schemas of the previous protocols are kept. Fails if the contract has no schema yet.
    pub fn migrate(
        &self,
        address: &str,
        protocol: &str,
        script: &ContractScript,
    ) -> Result<Arc<ContractSchema>, MultiError<SchemaError, S::Error>> {
        if let Some(schema) = self.schema(address, protocol).map_err(MultiError::B)? {
            return Ok(schema);
        }
        let known = self.protocols(address).map_err(MultiError::B)?;
        if known.is_empty() {
            return Err(MultiError::A(SchemaError::UnknownContract(address.to_owned())));
        }
        info!(address, ?known, to = protocol, "migrating contract schema");
        self.register(address, protocol, script)
    }

    fn register(
        &self,
        address: &str,
        protocol: &str,
        script: &ContractScript,
    ) -> Result<Arc<ContractSchema>, MultiError<SchemaError, S::Error>> {
        let schema = ContractSchema::new(address, protocol, script)
            .map_err(SchemaError::from)
            .map_err(MultiError::A)?;
        let key = schema.key();
        let mut store = self.store();
        // another thread may have registered the schema while it was being built
        if let Some(schema) = self.cached(&key) {
            return Ok(schema);
        }
        store.save(&schema).map_err(MultiError::B)?;
        debug!(%key, parameter = schema.parameter.len(), storage = schema.storage.len(), "schema registered");
        Ok(self.publish(schema))
    }

    pub fn protocols(&self, address: &str) -> Result<Vec<String>, S::Error> { self.store().protocols(address) }

    pub fn addresses(&self) -> Result<Vec<String>, S::Error> { self.store().addresses() }
}
