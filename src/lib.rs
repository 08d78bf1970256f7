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

//! Contract schemas and change feeds for indexers of Michelson-based chains.
//!
//! A [`ContractSchema`] pairs the parameter and storage metadata of a contract under a given
//! protocol. Schemas are produced once per `(address, protocol)` by a [`Registry`], persisted by a
//! [`SchemaStore`], and then shared read-only by any number of workers decoding storage updates
//! and operation parameters.

#[macro_use]
extern crate amplify;
#[macro_use]
extern crate serde;
#[macro_use]
extern crate tracing;

pub use micheline;
pub use tzindexapi::*;

mod script;
mod schema;
mod store;
mod registry;
mod feed;

pub use feed::StorageChanges;
pub use registry::Registry;
pub use schema::{ContractSchema, SchemaError};
pub use script::{ContractScript, ScriptError};
pub use store::{MemStore, SchemaKey, SchemaStore};
