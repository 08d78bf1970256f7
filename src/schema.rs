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
use tzindexapi::{
    BinPath, EncodeOpts, Encoder, Entrypoint, Envelope, ErrorKind, FormData, MetaError, Metadata, Node, PointerMap,
    DEFAULT_ENTRYPOINT,
};

use crate::{ContractScript, SchemaKey, ScriptError};

/// Parameter and storage metadata of a contract under a protocol.
///
/// Once built, a schema is immutable and may be shared between threads.
#[derive(Clone, Eq, PartialEq, Debug)]
#[derive(Serialize, Deserialize)]
pub struct ContractSchema {
    pub address: String,
    pub protocol: String,
    pub parameter: Metadata,
    pub storage: Metadata,
}

#[derive(Debug, Display, Error, From)]
pub enum SchemaError {
    #[from]
    #[display(inner)]
    Script(ScriptError),

    #[from]
    #[display(inner)]
    Meta(MetaError),

    #[display("contract {0} has no schema to migrate from")]
    UnknownContract(String),
}

impl ContractSchema {
    /// Builds metadata for both types of a script.
    pub fn new(address: impl Into<String>, protocol: impl Into<String>, script: &ContractScript) -> Result<Self, MetaError> {
        Ok(ContractSchema {
            address: address.into(),
            protocol: protocol.into(),
            parameter: Metadata::build(&script.parameter)?,
            storage: Metadata::build(&script.storage)?,
        })
    }

    pub fn key(&self) -> SchemaKey { SchemaKey::new(&self.address, &self.protocol) }

    pub fn entrypoints(&self) -> Vec<Entrypoint> { self.parameter.entrypoints() }

    pub fn decode_storage(&self, raw: &Micheline) -> Result<Node, MetaError> { self.storage.decode(raw) }

    pub fn big_map_pointers(&self, storage: &Micheline) -> Result<PointerMap, MetaError> {
        tzindexapi::resolve_pointers(storage, &self.storage)
    }

    /// Binary path of the parameter node called by the entrypoint.
    pub fn entrypoint_path(&self, entrypoint: &str) -> Result<BinPath, MetaError> {
        match self.parameter.entrypoint(entrypoint) {
            Some(entrypoint) => Ok(entrypoint.path),
            None => Err(MetaError::new(ErrorKind::UnknownEntrypoint(entrypoint.to_owned()), &BinPath::root())),
        }
    }

    /// Decodes the argument of an entrypoint call.
    pub fn decode_call(&self, call: &Envelope) -> Result<Node, MetaError> {
        let path = self.entrypoint_path(&call.entrypoint)?;
        self.parameter.decode_at(&call.value, &path)
    }

    /// Builds an entrypoint call from form data.
    ///
    /// Form data is keyed by the binary paths of the parameter type, regardless of the entrypoint.
    pub fn build_call(&self, entrypoint: &str, form: &FormData, opts: EncodeOpts) -> Result<Envelope, MetaError> {
        let path = self.entrypoint_path(entrypoint)?;
        let encoder = Encoder::new(&self.parameter).with_opts(opts);
        let value = encoder.build(&path, form)?;
        if entrypoint == DEFAULT_ENTRYPOINT {
            return Ok(Envelope { entrypoint: entrypoint.to_owned(), value });
        }
        encoder.wrap_entrypoint(&path, value)
    }
}

#[cfg(test)]
mod test {
    #![cfg_attr(coverage_nightly, coverage(off))]
    use serde_json::json;

    use super::*;

    pub fn schema() -> ContractSchema {
        let script = ContractScript::from_json(json!([
            {"prim": "parameter", "args": [{"prim": "or", "args": [
                {"prim": "nat", "annots": ["%deposit"]},
                {"prim": "or", "args": [{"prim": "unit", "annots": ["%reset"]}, {"prim": "string"}]}
            ]}]},
            {"prim": "storage", "args": [{"prim": "pair", "args": [
                {"prim": "nat", "annots": ["%total"]},
                {"prim": "big_map", "annots": ["%deposits"], "args": [{"prim": "address"}, {"prim": "nat"}]}
            ]}]}
        ]))
        .unwrap();
        ContractSchema::new("KT1TxqZ8QtKvLu3V3JH7Gx58n7Co8pgtpQU5", "PtParisB", &script).unwrap()
    }

    #[test]
    fn calls() {
        let schema = schema();
        assert_eq!(schema.key().to_string(), "KT1TxqZ8QtKvLu3V3JH7Gx58n7Co8pgtpQU5@PtParisB");

        let form: FormData = serde_json::from_value(json!({"0/0": 12})).unwrap();
        let call = schema.build_call("deposit", &form, none!()).unwrap();
        assert_eq!(call, Envelope { entrypoint: s!("deposit"), value: Micheline::int(12) });
        let node = schema.decode_call(&call).unwrap();
        assert_eq!(node.name.as_deref(), Some("deposit"));

        let form: FormData = serde_json::from_value(json!({"0": {"schema_key": "0/1/1"}, "0/1/1": "hi"})).unwrap();
        let call = schema.build_call("default", &form, none!()).unwrap();
        assert_eq!(call.value.to_string(), r#"Right (Right "hi")"#);
        let node = schema.decode_call(&call).unwrap();
        assert_eq!(node.children[0].name.as_deref(), Some("value_3"));

        let err = schema.build_call("withdraw", &form, none!()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnknownEntrypoint(s!("withdraw")));
    }

    #[test]
    fn json() {
        let schema = schema();
        let json = serde_json::to_string(&schema).unwrap();
        assert_eq!(serde_json::from_str::<ContractSchema>(&json).unwrap(), schema);
    }
}
