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

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use tzindex::{ContractSchema, SchemaKey, SchemaStore};

/// Version of the directory layout written by this crate.
pub const STORE_VERSION: u16 = 1;

/// Description of a schema directory, kept in its root.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
#[derive(Serialize, Deserialize)]
pub struct Manifest {
    pub version: u16,
}

/// Schema store keeping one JSON file per contract and protocol.
///
/// Directory layout:
/// ```text
/// <root>/store.toml
/// <root>/<address>/<protocol>.json
/// ```
#[derive(Debug)]
pub struct SchemaDir {
    root: PathBuf,
    manifest: Manifest,
}

impl SchemaDir {
    const FILENAME_MANIFEST: &'static str = "store.toml";
    const EXT_SCHEMA: &'static str = "json";
    const EXT_TEMP: &'static str = "tmp";

    pub fn path(&self) -> &Path { &self.root }

    pub fn manifest(&self) -> Manifest { self.manifest }

    fn schema_path(&self, key: &SchemaKey) -> Result<PathBuf, FsError> {
        Ok(self
            .root
            .join(checked_name(&key.address)?)
            .join(checked_name(&key.protocol)?)
            .with_extension(Self::EXT_SCHEMA))
    }

    fn read_manifest(root: &Path) -> Result<Option<Manifest>, FsError> {
        let path = root.join(Self::FILENAME_MANIFEST);
        if !path.exists() {
            return Ok(None);
        }
        let manifest: Manifest = toml::from_str(&fs::read_to_string(path)?)?;
        if manifest.version != STORE_VERSION {
            return Err(FsError::UnsupportedVersion(manifest.version, STORE_VERSION));
        }
        Ok(Some(manifest))
    }

    fn write_manifest(root: &Path, manifest: &Manifest) -> Result<(), FsError> {
        let toml = toml::to_string(manifest)?;
        let mut file = File::create_new(root.join(Self::FILENAME_MANIFEST))?;
        file.write_all(toml.as_bytes())?;
        Ok(())
    }
}

impl SchemaStore for SchemaDir {
    type Conf = PathBuf;
    type Error = FsError;

    fn open(root: PathBuf) -> Result<Self, FsError> {
        fs::create_dir_all(&root)?;
        let manifest = match Self::read_manifest(&root)? {
            Some(manifest) => manifest,
            None => {
                let manifest = Manifest { version: STORE_VERSION };
                Self::write_manifest(&root, &manifest)?;
                debug!(path = %root.display(), version = STORE_VERSION, "schema directory initialized");
                manifest
            }
        };
        Ok(SchemaDir { root, manifest })
    }

    fn config(&self) -> Self::Conf { self.root.clone() }

    fn load(&self, key: &SchemaKey) -> Result<Option<ContractSchema>, FsError> {
        let path = self.schema_path(key)?;
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let schema: ContractSchema = serde_json::from_reader(BufReader::new(file))?;
        if schema.key() != *key {
            return Err(FsError::KeyMismatch(path, schema.key()));
        }
        trace!(%key, path = %path.display(), "schema read");
        Ok(Some(schema))
    }

    fn save(&mut self, schema: &ContractSchema) -> Result<(), FsError> {
        let key = schema.key();
        let path = self.schema_path(&key)?;
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        // a schema file is either absent or complete
        let temp = path.with_extension(Self::EXT_TEMP);
        let mut writer = BufWriter::new(File::create(&temp)?);
        serde_json::to_writer_pretty(&mut writer, schema)?;
        writer.flush()?;
        fs::rename(&temp, &path)?;
        trace!(%key, path = %path.display(), "schema written");
        Ok(())
    }

    fn protocols(&self, address: &str) -> Result<Vec<String>, FsError> {
        let dir = self.root.join(checked_name(address)?);
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(vec![]),
            Err(err) => return Err(err.into()),
        };
        let mut protocols = vec![];
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(Self::EXT_SCHEMA) {
                continue;
            }
            if let Some(name) = path.file_stem().and_then(|name| name.to_str()) {
                protocols.push(name.to_owned());
            }
        }
        protocols.sort();
        Ok(protocols)
    }

    fn addresses(&self) -> Result<Vec<String>, FsError> {
        let mut addresses = vec![];
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                addresses.push(name.to_owned());
            }
        }
        addresses.sort();
        Ok(addresses)
    }
}

/// Ensures an address or a protocol name maps to a single path component.
fn checked_name(name: &str) -> Result<&str, FsError> {
    let valid = !name.is_empty()
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(name)
    } else {
        Err(FsError::InvalidName(name.to_owned()))
    }
}

#[derive(Debug, Display, Error, From)]
#[display(doc_comments)]
pub enum FsError {
    /// I/O error in the schema directory: {0}
    #[from]
    Io(io::Error),

    /// malformed schema file: {0}
    #[from]
    Json(serde_json::Error),

    /// malformed store manifest: {0}
    #[from]
    TomlDecode(toml::de::Error),

    /// unable to serialize store manifest: {0}
    #[from]
    TomlEncode(toml::ser::Error),

    /// '{0}' is not a valid contract address or protocol name.
    InvalidName(String),

    /// schema directory has version {0}, while only version {1} is supported.
    UnsupportedVersion(u16, u16),

    /// file {0:?} contains the schema of {1}.
    KeyMismatch(PathBuf, SchemaKey),
}

#[cfg(test)]
mod test {
    #![cfg_attr(coverage_nightly, coverage(off))]
    use serde_json::json;
    use tempfile::tempdir;
    use tzindex::{ContractScript, Registry};

    use super::*;

    const ADDR: &str = "KT1TxqZ8QtKvLu3V3JH7Gx58n7Co8pgtpQU5";

    fn schema(protocol: &str) -> ContractSchema {
        let script = ContractScript::from_json(json!([
            {"prim": "parameter", "args": [{"prim": "or", "args": [
                {"prim": "nat", "annots": ["%deposit"]},
                {"prim": "unit", "annots": ["%withdraw"]}
            ]}]},
            {"prim": "storage", "args": [{"prim": "big_map", "args": [{"prim": "address"}, {"prim": "nat"}]}]}
        ]))
        .unwrap();
        ContractSchema::new(ADDR, protocol, &script).unwrap()
    }

    #[test]
    fn save_load() {
        let dir = tempdir().unwrap();
        let mut store = SchemaDir::open(dir.path().to_path_buf()).unwrap();
        assert_eq!(store.manifest().version, STORE_VERSION);
        assert!(store
            .load(&SchemaKey::new(ADDR, "PtParisB"))
            .unwrap()
            .is_none());
        assert!(store.protocols(ADDR).unwrap().is_empty());

        store.save(&schema("PtParisB")).unwrap();
        store.save(&schema("PsQuebec")).unwrap();
        let loaded = store
            .load(&SchemaKey::new(ADDR, "PtParisB"))
            .unwrap()
            .unwrap();
        assert_eq!(loaded, schema("PtParisB"));
        assert_eq!(store.protocols(ADDR).unwrap(), vec!["PsQuebec", "PtParisB"]);
        assert_eq!(store.addresses().unwrap(), vec![ADDR]);

        let reopened = SchemaDir::open(store.config()).unwrap();
        assert_eq!(reopened.protocols(ADDR).unwrap(), vec!["PsQuebec", "PtParisB"]);
    }

    #[test]
    fn names() {
        let dir = tempdir().unwrap();
        let mut store = SchemaDir::open(dir.path().to_path_buf()).unwrap();
        let mut bad = schema("PtParisB");
        bad.protocol = s!("../escape");
        assert!(matches!(store.save(&bad), Err(FsError::InvalidName(_))));
        assert!(matches!(store.protocols(".."), Err(FsError::InvalidName(_))));
        assert!(store.addresses().unwrap().is_empty());
    }

    #[test]
    fn versions() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("store.toml"), "version = 7\n").unwrap();
        let err = SchemaDir::open(dir.path().to_path_buf()).unwrap_err();
        assert!(matches!(err, FsError::UnsupportedVersion(7, STORE_VERSION)));

        fs::write(dir.path().join("store.toml"), "version = \"one\"\n").unwrap();
        let err = SchemaDir::open(dir.path().to_path_buf()).unwrap_err();
        assert!(matches!(err, FsError::TomlDecode(_)));
    }

    #[test]
    fn corrupted() {
        let dir = tempdir().unwrap();
        let mut store = SchemaDir::open(dir.path().to_path_buf()).unwrap();
        store.save(&schema("PtParisB")).unwrap();
        fs::write(dir.path().join(ADDR).join("PtParisB.json"), "{").unwrap();
        let err = store
            .load(&SchemaKey::new(ADDR, "PtParisB"))
            .unwrap_err();
        assert!(matches!(err, FsError::Json(_)));

        store.save(&schema("PtParisB")).unwrap();
        fs::copy(dir.path().join(ADDR).join("PtParisB.json"), dir.path().join(ADDR).join("PsQuebec.json")).unwrap();
        let err = store
            .load(&SchemaKey::new(ADDR, "PsQuebec"))
            .unwrap_err();
        assert!(matches!(err, FsError::KeyMismatch(..)));
    }

    #[test]
    fn registry() {
        let dir = tempdir().unwrap();
        let registry = Registry::<SchemaDir>::open(dir.path().to_path_buf()).unwrap();
        let script = ContractScript::from_json(json!([
            {"prim": "parameter", "args": [{"prim": "unit"}]},
            {"prim": "storage", "args": [{"prim": "nat"}]}
        ]))
        .unwrap();
        let first = registry.originate(ADDR, "PtParisB", &script).unwrap();
        drop(registry);

        let registry = Registry::<SchemaDir>::open(dir.path().to_path_buf()).unwrap();
        assert_eq!(registry.config(), dir.path());
        let loaded = registry.schema(ADDR, "PtParisB").unwrap().unwrap();
        assert_eq!(*loaded, *first);
    }
}
