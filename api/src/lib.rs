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

#![deny(
    unsafe_code,
    dead_code,
    unused_variables,
    unused_mut,
    unused_imports,
    non_upper_case_globals,
    non_camel_case_types,
    non_snake_case
)]
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Typed access to Michelson values.
//!
//! A Michelson type tree is flattened into a _metadata map_: every position in the type gets a
//! _binary path_ (`0`, `0/1/0`, `0/k`, ...) and a [`NodeMeta`] record describing the type at that
//! position and its _shape_. All other operations of the crate are driven by this map:
//! - [`Decoder`] turns a raw Micheline value into a structured [`Node`] tree;
//! - [`diff`] compares two decoded trees, marking created, updated and deleted nodes;
//! - [`Encoder`] turns structured form data back into a raw value and wraps it into an
//!   entrypoint [`Envelope`];
//! - [`resolve_pointers`] finds the big-map identifiers inside a storage value.
//!
//! Binary paths are stable for a given type tree: any two components agreeing on a path agree on
//! what lives there.

#[macro_use]
extern crate amplify;
#[macro_use]
extern crate serde;

mod path;
mod shape;
mod error;
mod meta;
mod entrypoints;
mod node;
mod decode;
mod diff;
mod form;
mod encode;
mod pointers;

pub use decode::{decode, Decoder};
pub use diff::diff;
pub use encode::{build, wrap_entrypoint, EncodeOpts, Encoder, Envelope};
pub use entrypoints::{Entrypoint, DEFAULT_ENTRYPOINT};
pub use error::{ErrorKind, MetaError};
pub use form::{FormData, FormEntry, FormValue};
pub use meta::{Metadata, NodeMeta};
pub use node::{DiffKind, Node, Scalar, KEY_SEPARATOR};
pub use path::{BinPath, InvalidPath, PathStep};
pub use pointers::{attribute_diff, resolve_pointers, BigMapDiff, BigMapUpdate, PointerMap};
pub use shape::Shape;
