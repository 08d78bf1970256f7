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

use micheline::{Base58Error, Micheline};

use crate::BinPath;

/// Failure of any metadata-driven operation, carrying the binary path at which it happened.
#[derive(Clone, Eq, PartialEq, Debug, Display, Error)]
#[display("{kind} at path {path}")]
pub struct MetaError {
    pub kind: ErrorKind,
    pub path: BinPath,
}

#[derive(Clone, Eq, PartialEq, Debug, Display)]
pub enum ErrorKind {
    /// the path is absent from the metadata map.
    #[display("unknown binary path")]
    UnknownPath,

    /// the raw value does not fit the type expected at the path.
    #[display("value mismatches the type: expected {expected}, found {found}")]
    ShapeMismatch { expected: String, found: String },

    /// the type tree contains a primitive outside of the supported type table.
    #[display("unknown type primitive '{0}'")]
    UnknownPrimitive(String),

    /// form data lacks a value required to build the node.
    #[display("missing required form field")]
    MissingField,

    /// form data or a raw leaf contains a literal which can't be represented in the type.
    #[display("invalid literal: {0}")]
    InvalidLiteral(String),

    /// the position of a big map in the storage does not hold a valid identifier.
    #[display("unable to resolve big map pointer: {0}")]
    PointerResolution(String),

    /// the parameter type has no entrypoint with the given name.
    #[display("unknown entrypoint '{0}'")]
    UnknownEntrypoint(String),

    /// a binary leaf value can't be rendered in its text form.
    #[display("{0}")]
    Codec(Base58Error),
}

impl MetaError {
    pub fn new(kind: ErrorKind, path: &BinPath) -> Self { MetaError { kind, path: path.clone() } }

    pub fn unknown_path(path: &BinPath) -> Self { Self::new(ErrorKind::UnknownPath, path) }

    pub fn mismatch(path: &BinPath, expected: impl ToString, found: &Micheline) -> Self {
        Self::new(
            ErrorKind::ShapeMismatch { expected: expected.to_string(), found: describe(found) },
            path,
        )
    }

    pub fn missing(path: &BinPath) -> Self { Self::new(ErrorKind::MissingField, path) }

    pub fn invalid(path: &BinPath, details: impl ToString) -> Self {
        Self::new(ErrorKind::InvalidLiteral(details.to_string()), path)
    }

    pub fn pointer(path: &BinPath, details: impl ToString) -> Self {
        Self::new(ErrorKind::PointerResolution(details.to_string()), path)
    }
}

/// Short description of a raw value for error reporting.
pub(crate) fn describe(value: &Micheline) -> String {
    match value {
        Micheline::Int(_) => s!("integer"),
        Micheline::String(_) => s!("string"),
        Micheline::Bytes(_) => s!("bytes"),
        Micheline::Prim(prim) => format!("primitive '{}'", prim.prim),
        Micheline::Seq(items) => format!("sequence of {} items", items.len()),
    }
}
