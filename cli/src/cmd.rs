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

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context};
use clap::{Subcommand, ValueEnum};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tzindex::micheline::{wire, Micheline};
use tzindex::{
    BigMapDiff, ContractSchema, ContractScript, EncodeOpts, Envelope, FormData, Registry, SchemaStore,
    DEFAULT_ENTRYPOINT,
};
use tzindex_persist_fs::SchemaDir;

use crate::config::Config;

/// Address assigned to schemas built from script files.
const LOCAL_ADDRESS: &str = "local";

#[derive(ValueEnum, Copy, Clone, Eq, PartialEq, Debug, Default)]
pub enum Format {
    #[default]
    Yaml,
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Cmd {
    /// Print type metadata of a contract script
    Schema {
        /// Contract script in Micheline JSON
        script: PathBuf,

        /// Print storage metadata instead of parameter metadata
        #[clap(short, long)]
        storage: bool,
    },

    /// List entrypoints of a contract script
    Entrypoints {
        /// Contract script in Micheline JSON
        script: PathBuf,
    },

    /// Decode a storage value or, with an entrypoint, a call argument
    Decode {
        /// Contract script in Micheline JSON
        script: PathBuf,

        /// Value in Micheline JSON
        value: PathBuf,

        /// Entrypoint receiving the value
        #[clap(short, long)]
        entrypoint: Option<String>,
    },

    /// Decode a storage update with the changes against the previous storage
    Diff {
        /// Contract script in Micheline JSON
        script: PathBuf,

        /// New storage value in Micheline JSON
        current: PathBuf,

        /// Previous storage value; the whole storage is reported as created when omitted
        previous: Option<PathBuf>,

        /// Big map updates of the operation in JSON
        #[clap(short, long)]
        big_maps: Option<PathBuf>,
    },

    /// Build an entrypoint call from form data
    Encode {
        /// Contract script in Micheline JSON
        script: PathBuf,

        /// Form data in YAML or JSON keyed by binary paths of the parameter type
        form: PathBuf,

        /// Entrypoint to call
        #[clap(short, long, default_value = DEFAULT_ENTRYPOINT)]
        entrypoint: String,

        /// Check base58 literals for well-formedness
        #[clap(long)]
        validate: bool,
    },

    /// Locate big maps allocated in a storage value
    Pointers {
        /// Contract script in Micheline JSON
        script: PathBuf,

        /// Storage value in Micheline JSON
        storage: PathBuf,
    },

    /// Decode packed binary data
    Unpack {
        /// Hex-encoded data starting with the `05` prefix
        data: String,
    },

    /// Register the schema of a contract in the store
    Register {
        /// Contract address
        address: String,

        /// Contract script in Micheline JSON
        script: PathBuf,

        /// Protocol of the script
        #[clap(short, long)]
        protocol: Option<String>,

        /// Register the script as an upgrade of an already known contract
        #[clap(long)]
        migrate: bool,
    },

    /// Print a schema from the store
    Show {
        /// Contract address; lists known contracts when omitted
        address: Option<String>,

        /// Protocol; the latest known protocol is used when omitted
        #[clap(short, long)]
        protocol: Option<String>,
    },
}

impl Cmd {
    pub fn exec(&self, config: &Config, format: Format) -> anyhow::Result<()> {
        match self {
            Cmd::Schema { script, storage } => {
                let schema = schema(config, script)?;
                let meta = if *storage { &schema.storage } else { &schema.parameter };
                print(format, meta)?;
            }
            Cmd::Entrypoints { script } => print(format, &schema(config, script)?.entrypoints())?,
            Cmd::Decode { script, value, entrypoint } => {
                let schema = schema(config, script)?;
                let value = micheline(value)?;
                let node = match entrypoint {
                    None => schema.decode_storage(&value)?,
                    Some(entrypoint) => schema.decode_call(&Envelope { entrypoint: entrypoint.clone(), value })?,
                };
                print(format, &node)?;
            }
            Cmd::Diff { script, current, previous, big_maps } => {
                let schema = schema(config, script)?;
                let current = micheline(current)?;
                let previous = previous.as_deref().map(micheline).transpose()?;
                let big_maps = match big_maps {
                    Some(path) => read::<Vec<BigMapDiff>>(path)?,
                    None => vec![],
                };
                let changes = schema.storage_changes(&current, previous.as_ref(), &big_maps)?;
                print(format, &changes)?;
            }
            Cmd::Encode { script, form, entrypoint, validate } => {
                let schema = schema(config, script)?;
                let form = read::<FormData>(form)?;
                let opts = EncodeOpts { validate: *validate || config.validate };
                let call = schema.build_call(entrypoint, &form, opts)?;
                print(format, &call)?;
            }
            Cmd::Pointers { script, storage } => {
                let schema = schema(config, script)?;
                print(format, &schema.big_map_pointers(&micheline(storage)?)?)?;
            }
            Cmd::Unpack { data } => {
                let data = data.trim();
                let bytes = hex::decode(data.strip_prefix("0x").unwrap_or(data)).context("invalid hex data")?;
                let value = wire::unpack(&bytes)?;
                match format {
                    Format::Yaml => println!("{value}"),
                    Format::Json => print(format, &value)?,
                }
            }
            Cmd::Register { address, script, protocol, migrate } => {
                let registry = Registry::<SchemaDir>::open(config.data_dir.clone())?;
                let protocol = protocol.as_deref().unwrap_or(&config.protocol);
                let script = self::script(script)?;
                let schema = if *migrate {
                    registry.migrate(address, protocol, &script)
                } else {
                    registry.originate(address, protocol, &script)
                }
                .map_err(|err| anyhow!("{err}"))?;
                info!(key = %schema.key(), "schema registered");
                print(format, &schema.entrypoints())?;
            }
            Cmd::Show { address: None, .. } => {
                let store = SchemaDir::open(config.data_dir.clone())?;
                print(format, &store.addresses()?)?;
            }
            Cmd::Show { address: Some(address), protocol } => {
                let registry = Registry::<SchemaDir>::open(config.data_dir.clone())?;
                let protocol = match protocol {
                    Some(protocol) => protocol.clone(),
                    None => registry
                        .protocols(address)?
                        .pop()
                        .ok_or_else(|| anyhow!("contract {address} is not known"))?,
                };
                let schema = registry
                    .schema(address, &protocol)?
                    .ok_or_else(|| anyhow!("contract {address} has no schema for protocol {protocol}"))?;
                print(format, schema.as_ref())?;
            }
        }
        Ok(())
    }
}

fn script(path: &Path) -> anyhow::Result<ContractScript> {
    let json = fs::read_to_string(path).with_context(|| format!("can't read script '{}'", path.display()))?;
    ContractScript::from_json_str(&json).with_context(|| format!("invalid script '{}'", path.display()))
}

fn schema(config: &Config, path: &Path) -> anyhow::Result<ContractSchema> {
    Ok(ContractSchema::new(LOCAL_ADDRESS, &config.protocol, &script(path)?)?)
}

fn micheline(path: &Path) -> anyhow::Result<Micheline> {
    let json = fs::read_to_string(path).with_context(|| format!("can't read value '{}'", path.display()))?;
    Micheline::from_json_str(&json).with_context(|| format!("invalid Micheline JSON in '{}'", path.display()))
}

/// Reads YAML or JSON data; JSON being a subset of YAML, a single parser serves both.
fn read<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let file = fs::File::open(path).with_context(|| format!("can't open '{}'", path.display()))?;
    serde_yaml::from_reader(file).with_context(|| format!("invalid data in '{}'", path.display()))
}

fn print(format: Format, value: &impl Serialize) -> anyhow::Result<()> {
    let text = match format {
        Format::Yaml => serde_yaml::to_string(value)?,
        Format::Json => serde_json::to_string_pretty(value)?,
    };
    println!("{text}");
    Ok(())
}
