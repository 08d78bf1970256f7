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

use anyhow::Context;

/// Tool configuration read from a TOML file.
#[derive(Clone, Eq, PartialEq, Debug)]
#[derive(Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct Config {
    /// Directory of the schema store.
    pub data_dir: PathBuf,
    /// Protocol under which contracts are registered when none is given.
    pub protocol: String,
    /// Whether base58 literals are checked when building values.
    pub validate: bool,
    /// Log filter used when `RUST_LOG` is not set.
    pub log: String,
}

impl Default for Config {
    fn default() -> Self {
        Config { data_dir: PathBuf::from("schemas"), protocol: s!("PtParisB"), validate: false, log: s!("warn") }
    }
}

impl Config {
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(none!());
        };
        let toml = fs::read_to_string(path).with_context(|| format!("can't read config '{}'", path.display()))?;
        toml::from_str(&toml).with_context(|| format!("invalid config '{}'", path.display()))
    }
}

#[cfg(test)]
mod test {
    #![cfg_attr(coverage_nightly, coverage(off))]
    use super::*;

    #[test]
    fn partial() {
        let config: Config = toml::from_str("data-dir = \"/var/lib/tzix\"\nvalidate = true\n").unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/var/lib/tzix"));
        assert!(config.validate);
        assert_eq!(config.protocol, Config::default().protocol);
        assert!(toml::from_str::<Config>("datadir = \"x\"").is_err());
    }
}
