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

/// Parameter and storage types of a contract, extracted from its code.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct ContractScript {
    pub parameter: Micheline,
    pub storage: Micheline,
    /// Full code sequence the types were taken from.
    pub code: Micheline,
}

#[derive(Debug, Display, Error, From)]
#[display(doc_comments)]
pub enum ScriptError {
    /// contract code must be a sequence of top-level sections.
    NotSequence,

    /// contract code lacks the `{0}` section.
    MissingSection(&'static str),

    /// contract code contains more than one `{0}` section.
    DuplicateSection(String),

    /// section `{0}` must have exactly one argument.
    InvalidSection(String),

    /// invalid contract script JSON: {0}
    #[from]
    Json(serde_json::Error),
}

impl ContractScript {
    pub const PARAMETER: &'static str = "parameter";
    pub const STORAGE: &'static str = "storage";

    /// Extracts types from a contract code sequence.
    pub fn from_code(code: Micheline) -> Result<Self, ScriptError> {
        let sections = code.as_seq().ok_or(ScriptError::NotSequence)?;
        let mut parameter = None;
        let mut storage = None;
        for section in sections {
            let slot = match section.prim_name() {
                Some(Self::PARAMETER) => &mut parameter,
                Some(Self::STORAGE) => &mut storage,
                _ => continue,
            };
            let name = section.prim_name().unwrap_or_default().to_owned();
            let [ty] = section.args() else {
                return Err(ScriptError::InvalidSection(name));
            };
            if slot.replace(ty.clone()).is_some() {
                return Err(ScriptError::DuplicateSection(name));
            }
        }
        Ok(ContractScript {
            parameter: parameter.ok_or(ScriptError::MissingSection(Self::PARAMETER))?,
            storage: storage.ok_or(ScriptError::MissingSection(Self::STORAGE))?,
            code,
        })
    }

    /// Reads a script from JSON, given either as a bare code sequence or as an object with the
    /// `code` field.
    pub fn from_json(json: serde_json::Value) -> Result<Self, ScriptError> {
        let code = match json {
            serde_json::Value::Object(mut obj) if obj.contains_key("code") => {
                obj.remove("code").unwrap_or_default()
            }
            other => other,
        };
        Self::from_code(Micheline::from_json(code)?)
    }

    pub fn from_json_str(s: &str) -> Result<Self, ScriptError> { Self::from_json(serde_json::from_str(s)?) }
}
