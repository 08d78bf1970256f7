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

use indexmap::IndexMap;

use crate::BinPath;

/// Structured user input for building values, keyed by binary path.
pub type FormData = IndexMap<BinPath, FormValue>;

/// Value of a single form field.
///
/// Serialized untagged, so form data reads as plain JSON: `{"0/0": 5, "0/1/0": {"schema_key":
/// "0/1/0/1"}, "0/1/1": [{"0/1/1/l": "a"}]}`.
///
/// JSON numbers are only exact up to the 64-bit range; integers beyond it (large `nat`, `int` or
/// `mutez` values) must be given as strings.
#[derive(Clone, Eq, PartialEq, Debug)]
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
pub enum FormValue {
    Bool(bool),
    Number(serde_json::Number),
    Text(String),
    /// Selected variant of an or (a child path) or an option (`none` or `some`).
    Variant { schema_key: String },
    /// Entries of a map or big map.
    Entries(Vec<FormEntry>),
    /// Items of a list or set.
    Items(Vec<FormData>),
}

/// Key and value of a single map entry.
#[derive(Clone, Eq, PartialEq, Debug)]
#[derive(Serialize, Deserialize)]
pub struct FormEntry {
    pub key_fields: FormData,
    pub value_fields: FormData,
}

impl FormValue {
    pub const NONE: &'static str = "none";
    pub const SOME: &'static str = "some";

    pub fn variant(schema_key: impl ToString) -> Self { FormValue::Variant { schema_key: schema_key.to_string() } }

    pub fn schema_key(&self) -> Option<&str> {
        match self {
            FormValue::Variant { schema_key } => Some(schema_key.as_str()),
            _ => None,
        }
    }

    /// Text of a textual or numeric literal. Numbers outside the 64-bit range come back in float
    /// notation and fail integer parsing; such values are sent as text instead.
    pub fn literal(&self) -> Option<Cow<'_, str>> {
        match self {
            FormValue::Number(num) => Some(Cow::Owned(num.to_string())),
            FormValue::Text(text) => Some(Cow::Borrowed(text.as_str())),
            _ => None,
        }
    }

    /// Items of a list; an empty array is read as an empty list whichever way it was parsed.
    pub fn as_items(&self) -> Option<&[FormData]> {
        match self {
            FormValue::Items(items) => Some(items.as_slice()),
            FormValue::Entries(entries) if entries.is_empty() => Some(&[]),
            _ => None,
        }
    }

    /// Entries of a map; an empty array is read as an empty map whichever way it was parsed.
    pub fn as_entries(&self) -> Option<&[FormEntry]> {
        match self {
            FormValue::Entries(entries) => Some(entries.as_slice()),
            FormValue::Items(items) if items.is_empty() => Some(&[]),
            _ => None,
        }
    }
}

impl From<bool> for FormValue {
    fn from(val: bool) -> Self { FormValue::Bool(val) }
}

impl From<i64> for FormValue {
    fn from(val: i64) -> Self { FormValue::Number(val.into()) }
}

impl From<&str> for FormValue {
    fn from(val: &str) -> Self { FormValue::Text(val.to_owned()) }
}

impl From<Vec<FormData>> for FormValue {
    fn from(items: Vec<FormData>) -> Self { FormValue::Items(items) }
}

impl From<Vec<FormEntry>> for FormValue {
    fn from(entries: Vec<FormEntry>) -> Self { FormValue::Entries(entries) }
}
