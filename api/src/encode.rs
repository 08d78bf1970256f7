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

use std::str::FromStr;

use chrono::DateTime;
use micheline::{Base58Codec, Base58Tag, BigInt, Micheline, TezosBase58, TypePrim};
use num_bigint::Sign;

use crate::{BinPath, FormData, FormValue, MetaError, Metadata, NodeMeta, PathStep, Shape, DEFAULT_ENTRYPOINT};

/// Builds a raw value for the node at `path` from form data.
pub fn build(path: &BinPath, form: &FormData, meta: &Metadata) -> Result<Micheline, MetaError> {
    Encoder::new(meta).build(path, form)
}

/// Wraps a value built for the node at `path` into an entrypoint call.
pub fn wrap_entrypoint(path: &BinPath, value: Micheline, meta: &Metadata) -> Result<Envelope, MetaError> {
    Encoder::new(meta).wrap_entrypoint(path, value)
}

/// Options of value construction.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
#[derive(Serialize, Deserialize)]
pub struct EncodeOpts {
    /// Check base58 literals (addresses, keys, signatures, chain ids) for well-formedness.
    #[serde(default)]
    pub validate: bool,
}

/// Entrypoint call: an entrypoint name and the argument value.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
#[derive(Serialize, Deserialize)]
pub struct Envelope {
    pub entrypoint: String,
    pub value: Micheline,
}

/// Metadata-driven builder of raw values from form data.
#[derive(Clone, Debug)]
pub struct Encoder<'m, C: Base58Codec = TezosBase58> {
    meta: &'m Metadata,
    codec: C,
    opts: EncodeOpts,
}

impl<'m> Encoder<'m, TezosBase58> {
    pub fn new(meta: &'m Metadata) -> Self { Encoder { meta, codec: TezosBase58, opts: none!() } }
}

impl<'m, C: Base58Codec> Encoder<'m, C> {
    pub fn with_codec(meta: &'m Metadata, codec: C) -> Self { Encoder { meta, codec, opts: none!() } }

    pub fn with_opts(mut self, opts: EncodeOpts) -> Self {
        self.opts = opts;
        self
    }

    /// Builds a raw value for the node at `path`.
    ///
    /// # Errors
    ///
    /// Fails with [`crate::ErrorKind::MissingField`] when a required leaf or variant selection is
    /// absent from the form, and with [`crate::ErrorKind::InvalidLiteral`] when a present value
    /// can't be represented in the type.
    pub fn build(&self, path: &BinPath, form: &FormData) -> Result<Micheline, MetaError> {
        let meta = self.meta.get(path)?;
        match meta.shape {
            Shape::Tuple | Shape::NamedTuple => Ok(Micheline::pair(
                self.build(&path.join(PathStep::Left), form)?,
                self.build(&path.join(PathStep::Right), form)?,
            )),
            Shape::Enum | Shape::NamedEnum | Shape::Union | Shape::NamedUnion => self.variant(path, meta, form),
            Shape::List | Shape::Set => {
                let items = match form.get(path) {
                    None => &[][..],
                    Some(value) => value
                        .as_items()
                        .ok_or_else(|| MetaError::invalid(path, "a list of items is expected"))?,
                };
                let item_path = meta
                    .child_paths
                    .first()
                    .ok_or_else(|| MetaError::unknown_path(path))?;
                let items = items
                    .iter()
                    .map(|item| self.build(item_path, item))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Micheline::seq(items))
            }
            Shape::Map | Shape::BigMap => {
                let entries = match form.get(path) {
                    None => &[][..],
                    Some(value) => value
                        .as_entries()
                        .ok_or_else(|| MetaError::invalid(path, "a list of map entries is expected"))?,
                };
                let key_path = path.join(PathStep::Key);
                let value_path = path.join(PathStep::Value);
                let entries = entries
                    .iter()
                    .map(|entry| {
                        Ok(Micheline::elt(
                            self.build(&key_path, &entry.key_fields)?,
                            self.build(&value_path, &entry.value_fields)?,
                        ))
                    })
                    .collect::<Result<Vec<_>, MetaError>>()?;
                Ok(Micheline::seq(entries))
            }
            Shape::Option => match form.get(path).map(|value| value.schema_key()) {
                None | Some(Some(FormValue::NONE)) => Ok(Micheline::none()),
                Some(Some(FormValue::SOME)) => Ok(Micheline::some(self.build(&path.join(PathStep::Some), form)?)),
                Some(_) => Err(MetaError::invalid(path, "option selection must be either 'none' or 'some'")),
            },
            Shape::Leaf => self.leaf(path, meta, form.get(path)),
        }
    }

    fn variant(&self, path: &BinPath, meta: &NodeMeta, form: &FormData) -> Result<Micheline, MetaError> {
        let key = form
            .get(path)
            .ok_or_else(|| MetaError::missing(path))?
            .schema_key()
            .ok_or_else(|| MetaError::invalid(path, "variant selection is expected"))?;
        let child_path = BinPath::from_str(key)
            .ok()
            .filter(|p| meta.child_paths.contains(p))
            .ok_or_else(|| MetaError::invalid(path, format!("unknown variant '{key}'")))?;
        let steps = child_path
            .steps_from(path)
            .ok_or_else(|| MetaError::unknown_path(&child_path))?;
        let value = self.build(&child_path, form)?;
        Ok(wrap_branches(value, &steps))
    }

    fn leaf(&self, path: &BinPath, meta: &NodeMeta, value: Option<&FormValue>) -> Result<Micheline, MetaError> {
        let literal = || {
            value
                .map(|value| {
                    value
                        .literal()
                        .ok_or_else(|| MetaError::invalid(path, format!("{} literal is expected", meta.prim)))
                })
                .transpose()
        };

        if let Some(tag) = Base58Tag::for_prim(meta.prim) {
            let text = literal()?.ok_or_else(|| MetaError::missing(path))?;
            if self.opts.validate {
                self.codec
                    .validate(tag, &text)
                    .map_err(|err| MetaError::invalid(path, err))?;
            }
            return Ok(Micheline::string(text.into_owned()));
        }

        Ok(match meta.prim {
            TypePrim::Unit => Micheline::unit(),
            TypePrim::String => Micheline::string(literal()?.unwrap_or_default().into_owned()),
            TypePrim::Bytes => match literal()? {
                None => Micheline::bytes(vec![]),
                Some(text) => Micheline::bytes(parse_hex(path, &text)?),
            },
            TypePrim::Bls12381G1
            | TypePrim::Bls12381G2
            | TypePrim::SaplingTransaction
            | TypePrim::SaplingTransactionDeprecated
            | TypePrim::Chest
            | TypePrim::ChestKey => {
                let text = literal()?.ok_or_else(|| MetaError::missing(path))?;
                Micheline::bytes(parse_hex(path, &text)?)
            }
            TypePrim::Int | TypePrim::Nat | TypePrim::Mutez | TypePrim::Bls12381Fr => {
                let text = literal()?.ok_or_else(|| MetaError::missing(path))?;
                let val = BigInt::from_str(text.trim())
                    .map_err(|_| MetaError::invalid(path, format!("'{text}' is not an integer")))?;
                if matches!(meta.prim, TypePrim::Nat | TypePrim::Mutez) && val.sign() == Sign::Minus {
                    return Err(MetaError::invalid(path, format!("{} can't be negative", meta.prim)));
                }
                Micheline::int(val)
            }
            TypePrim::Timestamp => {
                let text = literal()?.ok_or_else(|| MetaError::missing(path))?;
                let text = text.trim();
                match BigInt::from_str(text) {
                    Ok(secs) => Micheline::int(secs),
                    Err(_) => DateTime::parse_from_rfc3339(text)
                        .map(|ts| Micheline::int(ts.timestamp()))
                        .map_err(|err| MetaError::invalid(path, format!("invalid timestamp '{text}': {err}")))?,
                }
            }
            TypePrim::Bool => match value {
                Some(FormValue::Bool(val)) => Micheline::bool(*val),
                Some(FormValue::Text(text)) if text == "true" || text == "false" => Micheline::bool(text == "true"),
                Some(_) => return Err(MetaError::invalid(path, "bool literal is expected")),
                None => return Err(MetaError::missing(path)),
            },
            TypePrim::Lambda => {
                let text = literal()?.ok_or_else(|| MetaError::missing(path))?;
                Micheline::from_json_str(&text)
                    .map_err(|err| MetaError::invalid(path, format!("lambda must be given as Micheline JSON: {err}")))?
            }
            prim => return Err(MetaError::invalid(path, format!("values of type {prim} can't be constructed"))),
        })
    }

    /// Wraps a value built for the node at `path` into an entrypoint call.
    ///
    /// All ancestors of the node must be `or` types. A node with a field annotation is then called
    /// by its name; otherwise the value is wrapped into the `Left`/`Right` chain leading from the
    /// root to the node and sent to the `default` entrypoint.
    pub fn wrap_entrypoint(&self, path: &BinPath, value: Micheline) -> Result<Envelope, MetaError> {
        let meta = self.meta.get(path)?;
        let mut at = BinPath::root();
        let mut steps = vec![];
        for step in path.steps() {
            if self.meta.get(&at)?.prim != TypePrim::Or {
                return Err(MetaError::invalid(path, "entrypoint must be reachable through or branches only"));
            }
            steps.push(step);
            at = at.join(step);
        }
        if let Some(name) = &meta.field_name {
            return Ok(Envelope { entrypoint: name.clone(), value });
        }
        Ok(Envelope { entrypoint: DEFAULT_ENTRYPOINT.to_owned(), value: wrap_branches(value, &steps) })
    }

    /// Builds the value for the node at `path` and wraps it into an entrypoint call.
    pub fn build_call(&self, path: &BinPath, form: &FormData) -> Result<Envelope, MetaError> {
        let value = self.build(path, form)?;
        self.wrap_entrypoint(path, value)
    }
}

/// Wraps a value into `Left`/`Right` constructors, the last step being applied first.
fn wrap_branches(value: Micheline, steps: &[PathStep]) -> Micheline {
    steps.iter().rev().fold(value, |value, step| match step {
        PathStep::Left => Micheline::left(value),
        _ => Micheline::right(value),
    })
}

fn parse_hex(path: &BinPath, text: &str) -> Result<Vec<u8>, MetaError> {
    let text = text.trim();
    hex::decode(text.strip_prefix("0x").unwrap_or(text))
        .map_err(|err| MetaError::invalid(path, format!("invalid hex string: {err}")))
}
