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

//! _Micheline_ is the tree representation shared by Michelson values, types and code.
//!
//! A tree is built out of four kinds of nodes: integer, string and byte-string literals,
//! primitive applications (a primitive name with arguments and annotations) and sequences.
//! Node RPC returns trees in a JSON form, while the chain itself stores them in a compact binary
//! form; this crate reads and writes both of them.
//!
//! The crate also carries the base58check codec which turns binary-encoded addresses, keys,
//! signatures and chain ids into their canonical human-readable strings.

#[macro_use]
extern crate amplify;
#[macro_use]
extern crate serde;

mod node;
mod annots;
mod prim;
pub mod wire;
pub mod base58;

pub use annots::Annotations;
pub use base58::{Base58Codec, Base58Error, Base58Tag, TezosBase58};
pub use node::{JsonError, Micheline, PrimNode};
pub use num_bigint::BigInt;
pub use prim::{TypePrim, UnknownPrim};
pub use wire::WireError;

/// Names of the value-level primitives used to build Michelson data.
pub mod data {
    pub const PAIR: &str = "Pair";
    pub const LEFT: &str = "Left";
    pub const RIGHT: &str = "Right";
    pub const SOME: &str = "Some";
    pub const NONE: &str = "None";
    pub const ELT: &str = "Elt";
    pub const UNIT: &str = "Unit";
    pub const TRUE: &str = "True";
    pub const FALSE: &str = "False";
}
