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

#[macro_use]
extern crate amplify;

use std::collections::BTreeMap;
use std::convert::Infallible;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde_json::json;
use tzindex::micheline::Micheline;
use tzindex::{
    BigMapDiff, ContractSchema, ContractScript, DiffKind, EncodeOpts, FormData, MemStore, Registry, Scalar,
    SchemaKey, SchemaStore,
};

const TOKEN: &str = "KT1TxqZ8QtKvLu3V3JH7Gx58n7Co8pgtpQU5";
const ALICE: &str = "tz1Ke2h7sDdakHJQh8WX4Z372du1KChsksyU";
const BOB: &str = "tz1burnburnburnburnburnburnburjAYjjX";

/// Store which counts its reads and writes.
#[derive(Debug, Default)]
struct CountingStore {
    schemas: BTreeMap<SchemaKey, ContractSchema>,
    loads: Arc<AtomicUsize>,
    saves: Arc<AtomicUsize>,
}

impl SchemaStore for CountingStore {
    type Conf = ();
    type Error = Infallible;

    fn open(_: ()) -> Result<Self, Infallible> { Ok(none!()) }

    fn config(&self) -> Self::Conf {}

    fn load(&self, key: &SchemaKey) -> Result<Option<ContractSchema>, Infallible> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        Ok(self.schemas.get(key).cloned())
    }

    fn save(&mut self, schema: &ContractSchema) -> Result<(), Infallible> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        self.schemas.insert(schema.key(), schema.clone());
        Ok(())
    }

    fn protocols(&self, address: &str) -> Result<Vec<String>, Infallible> {
        Ok(self
            .schemas
            .keys()
            .filter(|key| key.address == address)
            .map(|key| key.protocol.clone())
            .collect())
    }

    fn addresses(&self) -> Result<Vec<String>, Infallible> {
        let mut addresses = self
            .schemas
            .keys()
            .map(|key| key.address.clone())
            .collect::<Vec<_>>();
        addresses.dedup();
        Ok(addresses)
    }
}

fn token_script() -> ContractScript {
    ContractScript::from_json(json!({"code": [
        {"prim": "parameter", "args": [{"prim": "or", "args": [
            {"prim": "pair", "annots": ["%transfer"], "args": [
                {"prim": "address", "annots": [":from"]},
                {"prim": "address", "annots": [":to"]},
                {"prim": "nat", "annots": [":value"]}
            ]},
            {"prim": "or", "args": [
                {"prim": "pair", "annots": ["%approve"], "args": [
                    {"prim": "address", "annots": [":spender"]},
                    {"prim": "nat", "annots": [":value"]}
                ]},
                {"prim": "unit", "annots": ["%pause"]}
            ]}
        ]}]},
        {"prim": "storage", "args": [{"prim": "pair", "args": [
            {"prim": "big_map", "annots": ["%balances"], "args": [{"prim": "address"}, {"prim": "nat"}]},
            {"prim": "nat", "annots": ["%total_supply"]},
            {"prim": "bool", "annots": ["%paused"]}
        ]}]},
        {"prim": "code", "args": [[{"prim": "FAILWITH"}]]}
    ]}))
    .unwrap()
}

fn storage(pointer: i64, supply: i64, paused: bool) -> Micheline {
    Micheline::prim("Pair", [Micheline::int(pointer), Micheline::int(supply), Micheline::bool(paused)])
}

fn balance(pointer: i64, owner: &str, amount: Option<i64>) -> BigMapDiff {
    BigMapDiff {
        pointer,
        key_hash: s!("exprtZBwZUeYYYfUs9B9Rg2ywHezVHnCCnmF9WsDQVrs582dSK63dC"),
        key: Micheline::string(owner),
        value: amount.map(Micheline::int),
    }
}

#[test]
fn cache_miss() {
    let mut store = CountingStore::default();
    let schema = ContractSchema::new(TOKEN, "PtParisB", &token_script()).unwrap();
    store.save(&schema).unwrap();
    let loads = store.loads.clone();
    let saves = store.saves.clone();

    let registry = Registry::with(store);
    let first = registry.schema(TOKEN, "PtParisB").unwrap().unwrap();
    let second = registry.schema(TOKEN, "PtParisB").unwrap().unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(*first, schema);
    assert_eq!(loads.load(Ordering::SeqCst), 1);

    let again = registry
        .originate(TOKEN, "PtParisB", &token_script())
        .unwrap();
    assert!(Arc::ptr_eq(&first, &again));
    assert_eq!(loads.load(Ordering::SeqCst), 1);
    assert_eq!(saves.load(Ordering::SeqCst), 1);

    assert!(registry.schema(TOKEN, "PsQuebec").unwrap().is_none());
    assert_eq!(loads.load(Ordering::SeqCst), 2);
}

#[test]
fn originate_once() {
    let store = CountingStore::default();
    let (loads, saves) = (store.loads.clone(), store.saves.clone());
    let registry = Registry::with(store);
    let schema = registry
        .originate(TOKEN, "PtParisB", &token_script())
        .unwrap();
    registry
        .originate(TOKEN, "PtParisB", &token_script())
        .unwrap();
    registry.schema(TOKEN, "PtParisB").unwrap();
    assert_eq!(loads.load(Ordering::SeqCst), 1);
    assert_eq!(saves.load(Ordering::SeqCst), 1);

    let names = schema
        .entrypoints()
        .into_iter()
        .map(|entrypoint| entrypoint.name)
        .collect::<Vec<_>>();
    assert_eq!(names, vec!["default", "transfer", "approve", "pause"]);
    assert_eq!(registry.addresses().unwrap(), vec![TOKEN]);
}

#[test]
fn migration_keeps_history() {
    let registry = Registry::with(MemStore::default());
    let paris = registry
        .originate(TOKEN, "PtParisB", &token_script())
        .unwrap();
    let quebec = registry
        .migrate(TOKEN, "PsQuebec", &token_script())
        .unwrap();
    assert_eq!(paris.storage, quebec.storage);
    assert_eq!(quebec.protocol, "PsQuebec");
    assert_eq!(registry.protocols(TOKEN).unwrap(), vec!["PsQuebec", "PtParisB"]);
}

#[test]
fn calls() {
    let registry = Registry::with(MemStore::default());
    let schema = registry
        .originate(TOKEN, "PtParisB", &token_script())
        .unwrap();

    let form: FormData = serde_json::from_value(json!({"0/0/0": ALICE, "0/0/1/0": BOB, "0/0/1/1": 25})).unwrap();
    let call = schema
        .build_call("transfer", &form, EncodeOpts { validate: false })
        .unwrap();
    assert_eq!(call.entrypoint, "transfer");
    assert_eq!(call.value.to_string(), format!(r#"Pair "{ALICE}" (Pair "{BOB}" 25)"#));

    let node = schema.decode_call(&call).unwrap();
    assert_eq!(node.name.as_deref(), Some("transfer"));
    assert_eq!(node.child("to").unwrap().value, Some(Scalar::from(BOB)));
    assert_eq!(node.child("value").unwrap().value, Some(Scalar::from(25)));

    let form: FormData = serde_json::from_value(json!({"0": {"schema_key": "0/1/1"}})).unwrap();
    let call = schema
        .build_call("default", &form, EncodeOpts::default())
        .unwrap();
    assert_eq!(call.value.to_string(), "Right (Right Unit)");
    let node = schema.decode_call(&call).unwrap();
    assert_eq!(node.children[0].name.as_deref(), Some("pause"));

    assert!(schema.build_call("mint", &form, none!()).is_err());
}

#[test]
fn storage_feed() {
    let registry = Registry::with(MemStore::default());
    let schema = registry
        .originate(TOKEN, "PtParisB", &token_script())
        .unwrap();

    let genesis = schema
        .storage_changes(&storage(17, 100, false), None, &[balance(17, ALICE, Some(100))])
        .unwrap();
    assert_eq!(genesis.storage.diff, Some(DiffKind::Created));
    assert_eq!(genesis.big_maps.len(), 1);
    assert_eq!(genesis.big_maps[0].path.as_str(), "0/0");

    let transfer = schema
        .storage_changes(&storage(17, 100, false), Some(&storage(17, 100, false)), &[
            balance(17, ALICE, Some(75)),
            balance(17, BOB, Some(25)),
            balance(18, BOB, None),
        ])
        .unwrap();
    assert!(!transfer.storage.has_changes());
    assert!(transfer.has_changes());
    let updates = transfer
        .big_maps
        .iter()
        .map(|update| (update.key.display(), update.value.as_ref().and_then(|v| v.value.clone())))
        .collect::<Vec<_>>();
    assert_eq!(updates, vec![(ALICE.to_owned(), Some(Scalar::from(75))), (BOB.to_owned(), Some(Scalar::from(25)))]);

    let pause = schema
        .storage_changes(&storage(17, 100, true), Some(&storage(17, 100, false)), &[])
        .unwrap();
    let changes = pause.storage.changes();
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].name.as_deref(), Some("paused"));
    assert_eq!(changes[0].previous_value, Some(Scalar::Bool(false)));
}
